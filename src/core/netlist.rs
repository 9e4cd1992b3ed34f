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

//! Interface to the backend that turns a prepared design into netlist text.

use crate::core::hdl::{Fragment, Signal};
use crate::core::namemap::NameMap;
use crate::util::anyerror::Fault;

/// The result of converting a design, captured once per build.
#[derive(Debug, Clone, PartialEq)]
pub struct Netlist {
    rtlil: String,
    name_map: NameMap,
}

impl Netlist {
    pub fn new(rtlil: String, name_map: NameMap) -> Self {
        Self { rtlil, name_map }
    }

    pub fn rtlil(&self) -> &str {
        &self.rtlil
    }

    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }
}

/// Converts designs to RTLIL and RTLIL to Verilog.
pub trait Netlister: Send + Sync {
    /// Converts the finalized `fragment` into RTLIL text with `ports` as the
    /// top-level ports of a module called `name`.
    fn convert(&self, fragment: &Fragment, ports: &[Signal], name: &str) -> Result<Netlist, Fault>;

    /// Translates RTLIL text into Verilog.
    ///
    /// Internal attributes are removed when `strip_internal_attrs` is set;
    /// `opts` are passed to the Verilog writer.
    fn to_verilog(
        &self,
        rtlil: &str,
        strip_internal_attrs: bool,
        opts: &[String],
    ) -> Result<String, Fault>;
}
