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

//! Platforms targeting the sky130 standard cell libraries and the state of a
//! single build against them.

use crate::core::hdl::Signal;
use crate::core::netlist::Netlister;
use crate::core::resource::{Clock, Dir, Pin, RequestedPort, Resource};
use crate::core::toolchain::Toolchain;
use crate::error::{Error, Hint};
use serde::de;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The process technology a platform builds for.
pub trait Technology: Send + Sync + fmt::Debug {
    /// Name of the process design kit.
    fn pdk(&self) -> &str;
    /// Name of the standard cell library within the PDK.
    fn cell_library(&self) -> &str;
}

/// The standard cell libraries of the sky130 PDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLibrary {
    HighDensity,
    HighSpeed,
    MediumSpeed,
    LowSpeed,
    HighDensityLowLeakage,
}

// (library, pdk, cell library name)
const CELL_LIBRARIES: [(CellLibrary, &str, &str); 5] = [
    (CellLibrary::HighDensity, "sky130A", "sky130_fd_sc_hd"),
    (CellLibrary::HighSpeed, "sky130A", "sky130_fd_sc_hs"),
    (CellLibrary::MediumSpeed, "sky130A", "sky130_fd_sc_ms"),
    (CellLibrary::LowSpeed, "sky130A", "sky130_fd_sc_ls"),
    (CellLibrary::HighDensityLowLeakage, "sky130A", "sky130_fd_sc_hdll"),
];

impl CellLibrary {
    pub fn all() -> impl Iterator<Item = CellLibrary> {
        CELL_LIBRARIES.iter().map(|(lib, _, _)| *lib)
    }

    fn entry(&self) -> &'static (CellLibrary, &'static str, &'static str) {
        match self {
            Self::HighDensity => &CELL_LIBRARIES[0],
            Self::HighSpeed => &CELL_LIBRARIES[1],
            Self::MediumSpeed => &CELL_LIBRARIES[2],
            Self::LowSpeed => &CELL_LIBRARIES[3],
            Self::HighDensityLowLeakage => &CELL_LIBRARIES[4],
        }
    }
}

impl Technology for CellLibrary {
    fn pdk(&self) -> &str {
        self.entry().1
    }

    fn cell_library(&self) -> &str {
        self.entry().2
    }
}

impl FromStr for CellLibrary {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CELL_LIBRARIES
            .iter()
            .find(|(_, _, name)| *name == s)
            .map(|(lib, _, _)| *lib)
            .ok_or_else(|| Error::UnknownCellLibrary(s.to_string(), Hint::CellLibraryList))
    }
}

impl fmt::Display for CellLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cell_library())
    }
}

impl<'de> de::Deserialize<'de> for CellLibrary {
    fn deserialize<D>(deserializer: D) -> Result<CellLibrary, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct LibraryVisitor;

        impl<'de> de::Visitor<'de> for LibraryVisitor {
            type Value = CellLibrary;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("the name of a sky130 standard cell library")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match CellLibrary::from_str(v) {
                    Ok(v) => Ok(v),
                    Err(e) => Err(de::Error::custom(e)),
                }
            }
        }

        deserializer.deserialize_str(LibraryVisitor)
    }
}

/// An ASIC platform: the technology, the toolchain running the flow and the
/// resources available to designs.
///
/// A platform is never modified by a build, so one instance may serve any
/// number of builds.
pub struct Platform {
    technology: Box<dyn Technology>,
    toolchain: Toolchain,
    backend: Arc<dyn Netlister>,
    openlane_root: String,
    pdk_path: String,
    flow_settings: Vec<(String, Value)>,
    resources: Vec<Resource>,
    default_clk: Option<String>,
    default_rst: Option<String>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("technology", &self.technology)
            .field("toolchain", &self.toolchain)
            .field("openlane_root", &self.openlane_root)
            .field("pdk_path", &self.pdk_path)
            .field("flow_settings", &self.flow_settings)
            .field("resources", &self.resources)
            .field("default_clk", &self.default_clk)
            .field("default_rst", &self.default_rst)
            .finish_non_exhaustive()
    }
}

impl Platform {
    pub fn new<T: Technology + 'static>(
        technology: T,
        toolchain: Toolchain,
        backend: Arc<dyn Netlister>,
    ) -> Self {
        Self {
            technology: Box::new(technology),
            toolchain,
            backend,
            openlane_root: String::new(),
            pdk_path: String::new(),
            flow_settings: Vec::new(),
            resources: Vec::new(),
            default_clk: None,
            default_rst: None,
        }
    }

    pub fn openlane_root(mut self, path: &str) -> Self {
        self.openlane_root = path.to_string();
        self
    }

    pub fn pdk_path(mut self, path: &str) -> Self {
        self.pdk_path = path.to_string();
        self
    }

    /// Sets a flow variable written to `config.tcl`; setting a key again
    /// replaces its value in place.
    pub fn flow_setting(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.flow_settings.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.flow_settings.push((key.to_string(), value)),
        }
        self
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Names the resource clocking the default "sync" domain.
    pub fn default_clk(mut self, name: &str) -> Self {
        self.default_clk = Some(name.to_string());
        self
    }

    /// Names the resource resetting the default "sync" domain.
    pub fn default_rst(mut self, name: &str) -> Self {
        self.default_rst = Some(name.to_string());
        self
    }

    /// Identifies the platform as `<pdk>/<cell library>`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.pdk(), self.cell_library())
    }

    pub fn pdk(&self) -> &str {
        self.technology.pdk()
    }

    pub fn cell_library(&self) -> &str {
        self.technology.cell_library()
    }

    pub fn get_toolchain(&self) -> Toolchain {
        self.toolchain
    }

    pub fn get_backend(&self) -> &Arc<dyn Netlister> {
        &self.backend
    }

    pub fn get_openlane_root(&self) -> &str {
        &self.openlane_root
    }

    pub fn get_pdk_path(&self) -> &str {
        &self.pdk_path
    }

    pub fn get_flow_settings(&self) -> &Vec<(String, Value)> {
        &self.flow_settings
    }

    pub fn get_resources(&self) -> &Vec<Resource> {
        &self.resources
    }

    pub fn get_default_clk(&self) -> Option<&str> {
        self.default_clk.as_deref()
    }

    pub fn get_default_rst(&self) -> Option<&str> {
        self.default_rst.as_deref()
    }

    /// Finds the resource `name` with the given `number`.
    pub fn lookup(&self, name: &str, number: u32) -> Result<&Resource, Error> {
        self.resources
            .iter()
            .find(|r| r.get_name() == name && r.get_number() == number)
            .ok_or_else(|| Error::ResourceNotFound(name.to_string(), number))
    }
}

/// A clock frequency attached to a signal for the timing constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockConstraint {
    net: Signal,
    /// The top-level port name when the signal is a requested pin.
    port: Option<String>,
    frequency: f64,
}

impl ClockConstraint {
    pub fn net(&self) -> &Signal {
        &self.net
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

/// The state of one build on a platform: the requested resources, the clock
/// constraints and the default reset.
#[derive(Debug)]
pub struct Session<'p> {
    platform: &'p Platform,
    ports: Vec<RequestedPort>,
    constraints: Vec<ClockConstraint>,
    default_rst: Option<String>,
}

impl<'p> Session<'p> {
    pub fn new(platform: &'p Platform) -> Self {
        Self {
            platform,
            ports: Vec::new(),
            constraints: Vec::new(),
            default_rst: platform.default_rst.clone(),
        }
    }

    pub fn platform(&self) -> &'p Platform {
        self.platform
    }

    /// Requests the resource `name` with the given `number`, creating its
    /// top-level port signals.
    ///
    /// A resource carrying a clock constrains its input signal.
    pub fn request(&mut self, name: &str, number: u32) -> Result<Pin, Error> {
        let platform: &'p Platform = self.platform;
        let resource = platform.lookup(name, number)?;
        if self
            .ports
            .iter()
            .any(|p| p.resource().get_name() == name && p.resource().get_number() == number)
        {
            return Err(Error::ResourceAlreadyRequested(name.to_string(), number));
        }
        let pin = resource.make_pin();
        if let (Some(clock), Some(i)) = (resource.get_clock(), pin.i()) {
            self.constrain(i.clone(), Some(i.name().to_string()), clock.frequency())?;
        }
        self.ports.push(RequestedPort::new(resource.clone(), pin.clone()));
        Ok(pin)
    }

    /// Constrains an internal net to run at `frequency` hertz.
    pub fn add_clock_constraint(&mut self, signal: &Signal, frequency: f64) -> Result<(), Error> {
        self.constrain(signal.clone(), None, frequency)
    }

    fn constrain(&mut self, net: Signal, port: Option<String>, frequency: f64) -> Result<(), Error> {
        if let Some(existing) = self.constraints.iter().find(|c| c.net.id() == net.id()) {
            return Err(Error::ClockAlreadyConstrained(
                net.name().to_string(),
                existing.frequency,
            ));
        }
        self.constraints.push(ClockConstraint {
            net,
            port,
            frequency,
        });
        Ok(())
    }

    pub fn ports(&self) -> &Vec<RequestedPort> {
        &self.ports
    }

    /// Lists the signals of every requested pin, in request order.
    pub fn port_signals(&self) -> Vec<Signal> {
        self.ports
            .iter()
            .flat_map(|p| p.pin().signals().cloned().collect::<Vec<Signal>>())
            .collect()
    }

    pub fn iter_clock_constraints(&self) -> impl Iterator<Item = &ClockConstraint> {
        self.constraints.iter()
    }

    pub fn default_rst(&self) -> Option<&str> {
        self.default_rst.as_deref()
    }

    pub fn set_default_rst(&mut self, name: &str) {
        self.default_rst = Some(name.to_string());
    }

    fn requested_default_clk(&self) -> Result<&RequestedPort, Error> {
        let name = match self.platform.get_default_clk() {
            Some(n) => n,
            None => return Err(Error::NoDefaultClock(self.platform.name())),
        };
        self.ports
            .iter()
            .find(|p| p.resource().get_name() == name && p.resource().get_number() == 0)
            .ok_or_else(|| {
                Error::DefaultClockNotRequested(self.platform.name(), Hint::RequestDefaultClock)
            })
    }

    /// Names the top-level port carrying the default clock.
    pub fn default_clk_name(&self) -> Result<String, Error> {
        let port = self.requested_default_clk()?;
        let signal = match port.resource().get_dir() {
            Dir::I => port.pin().i(),
            _ => port.pin().o(),
        };
        match signal {
            Some(s) => Ok(s.name().to_string()),
            None => Err(Error::PinHasNoInput(
                port.resource().get_name().to_string(),
                port.resource().get_number(),
            )),
        }
    }

    /// Returns the clock of the default clock resource.
    pub fn default_clk_constraint(&self) -> Result<&'p Clock, Error> {
        let platform: &'p Platform = self.platform;
        let name = match platform.get_default_clk() {
            Some(n) => n,
            None => return Err(Error::NoDefaultClock(platform.name())),
        };
        platform
            .lookup(name, 0)?
            .get_clock()
            .ok_or_else(|| Error::ClockNotConstrained(name.to_string()))
    }
}
