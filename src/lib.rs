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

//! Build plan generation for the OpenLANE ASIC flow.
//!
//! A [Platform](crate::core::platform::Platform) pairs a standard-cell library
//! with a toolchain profile. Preparing a design against it produces a
//! [BuildPlan](crate::core::plan::BuildPlan): the build script, the OpenLANE
//! `config.tcl`, the Verilog netlists and the SDC clock constraints.

pub mod core;
pub mod error;
pub mod util;

pub use crate::core::config::PlatformConfig;
pub use crate::core::hdl::{Elaboratable, Fragment, Signal};
pub use crate::core::netlist::{Netlist, Netlister};
pub use crate::core::plan::BuildPlan;
pub use crate::core::platform::{CellLibrary, Platform, Session, Technology};
pub use crate::core::prepare::BuildOptions;
pub use crate::core::toolchain::Toolchain;
pub use crate::error::Error;
