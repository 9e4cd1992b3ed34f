//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::core::hdl::{Signal, SignalId};
use crate::error::Error;
use std::collections::HashMap;

/// Hierarchical names of the signals in a converted netlist.
///
/// Every path starts with the name of the top-level module followed by the
/// instance names down to the signal name itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NameMap(HashMap<SignalId, Vec<String>>);

impl NameMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, signal: &Signal, path: Vec<String>) -> Option<Vec<String>> {
        self.0.insert(signal.id(), path)
    }

    pub fn get(&self, id: SignalId) -> Option<&Vec<String>> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Joins the path of the signal `id` below the top-level module with
    /// `separator`. `name` identifies the signal when it has no entry.
    pub fn hierarchy(&self, id: SignalId, name: &str, separator: &str) -> Result<String, Error> {
        match self.get(id) {
            Some(path) => Ok(path
                .iter()
                .skip(1)
                .map(|s| s.as_str())
                .collect::<Vec<&str>>()
                .join(separator)),
            None => Err(Error::SignalNotInNameMap(name.to_string(), id)),
        }
    }

    pub fn signal_hierarchy(&self, signal: &Signal, separator: &str) -> Result<String, Error> {
        self.hierarchy(signal.id(), signal.name(), separator)
    }
}
