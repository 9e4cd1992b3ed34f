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

//! Physical resources a platform offers to designs.

use crate::core::hdl::Signal;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    I,
    O,
    Io,
}

/// A periodic clock applied to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Clock {
    /// Frequency in hertz.
    frequency: f64,
}

impl Clock {
    pub fn new(frequency: f64) -> Self {
        Self { frequency }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Period in seconds.
    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }
}

/// Formats the period of a clock at `frequency` hertz in nanoseconds.
pub fn period_ns(frequency: f64) -> String {
    format!("{:?}", 1e9 / frequency)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    name: String,
    #[serde(default)]
    number: u32,
    dir: Dir,
    clock: Option<Clock>,
}

impl Resource {
    pub fn new(name: &str, number: u32, dir: Dir) -> Self {
        Self {
            name: name.to_string(),
            number,
            dir,
            clock: None,
        }
    }

    /// Attaches a clock of `frequency` hertz to the resource.
    pub fn clock(mut self, frequency: f64) -> Self {
        self.clock = Some(Clock::new(frequency));
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_number(&self) -> u32 {
        self.number
    }

    pub fn get_dir(&self) -> Dir {
        self.dir
    }

    pub fn get_clock(&self) -> Option<&Clock> {
        self.clock.as_ref()
    }

    /// Creates the port signals for a request of this resource.
    pub(crate) fn make_pin(&self) -> Pin {
        let base = match self.number {
            0 => self.name.clone(),
            n => format!("{}_{}", self.name, n),
        };
        match self.dir {
            Dir::I => Pin {
                i: Some(Signal::new(&base)),
                o: None,
                oe: None,
            },
            Dir::O => Pin {
                i: None,
                o: Some(Signal::new(&base)),
                oe: None,
            },
            Dir::Io => Pin {
                i: Some(Signal::new(&format!("{}__i", base))),
                o: Some(Signal::new(&format!("{}__o", base))),
                oe: Some(Signal::new(&format!("{}__oe", base))),
            },
        }
    }
}

/// The signals created by requesting a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    i: Option<Signal>,
    o: Option<Signal>,
    oe: Option<Signal>,
}

impl Pin {
    pub fn i(&self) -> Option<&Signal> {
        self.i.as_ref()
    }

    pub fn o(&self) -> Option<&Signal> {
        self.o.as_ref()
    }

    pub fn oe(&self) -> Option<&Signal> {
        self.oe.as_ref()
    }

    /// Iterates over the signals of the pin in `i`, `o`, `oe` order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        [&self.i, &self.o, &self.oe]
            .into_iter()
            .filter_map(|s| s.as_ref())
    }
}

/// A resource requested during elaboration along with its pin.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedPort {
    resource: Resource,
    pin: Pin,
}

impl RequestedPort {
    pub fn new(resource: Resource, pin: Pin) -> Self {
        Self { resource, pin }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }
}
