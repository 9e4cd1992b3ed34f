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

//! Fixtures shared by the unit tests.

use crate::core::hdl::{Assign, Elaboratable, Fragment, Signal, Target};
use crate::core::namemap::NameMap;
use crate::core::netlist::{Netlist, Netlister};
use crate::core::overrides::{Options, Overrides};
use crate::core::platform::{CellLibrary, Platform, Session};
use crate::core::resource::{Dir, Resource};
use crate::core::template::{PlatformView, Renderer, RunContext};
use crate::core::toolchain::Toolchain;
use crate::util::anyerror::Fault;
use crate::util::environment::{EnvVar, Environment};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// An internal net found at `divider/div_clk` in every converted netlist.
pub fn divider_net() -> &'static Signal {
    static NET: OnceLock<Signal> = OnceLock::new();
    NET.get_or_init(|| Signal::new("div_clk"))
}

/// Writes a skeletal netlist naming every port and the divider net.
#[derive(Debug)]
pub struct FakeNetlister;

impl Netlister for FakeNetlister {
    fn convert(&self, _: &Fragment, ports: &[Signal], name: &str) -> Result<Netlist, Fault> {
        let mut map = NameMap::new();
        let mut rtlil = format!("module \\{}\n", name);
        for port in ports {
            map.insert(port, vec![name.to_string(), port.name().to_string()]);
            rtlil.push_str(&format!("  wire \\{}\n", port.name()));
        }
        map.insert(
            divider_net(),
            vec![name.to_string(), "divider".to_string(), "div_clk".to_string()],
        );
        rtlil.push_str("end\n");
        Ok(Netlist::new(rtlil, map))
    }

    fn to_verilog(&self, rtlil: &str, strip_internal_attrs: bool, opts: &[String]) -> Result<String, Fault> {
        let mut out = String::new();
        if opts.is_empty() == false {
            out.push_str(&format!("// opts: {}\n", opts.join(" ")));
        }
        if strip_internal_attrs == false {
            out.push_str("(* generator = \"fake\" *) // attribute\n");
        }
        for line in rtlil.lines() {
            match line.trim().strip_prefix("module \\") {
                Some(name) => out.push_str(&format!("module {};\n", name)),
                None => match line.trim().strip_prefix("wire \\") {
                    Some(wire) => out.push_str(&format!("  wire {};\n", wire)),
                    None => out.push_str("endmodule\n"),
                },
            }
        }
        Ok(out)
    }
}

/// A sky130 high density platform with a 100 MHz default clock.
pub fn platform(toolchain: Toolchain) -> Platform {
    Platform::new(CellLibrary::HighDensity, toolchain, Arc::new(FakeNetlister))
        .openlane_root("/opt/openlane")
        .pdk_path("/opt/pdk")
        .resource(Resource::new("clk", 0, Dir::I).clock(100e6))
        .resource(Resource::new("led", 0, Dir::O))
        .resource(Resource::new("gpio", 1, Dir::Io))
        .default_clk("clk")
}

/// A counter clocked by the undefined "sync" domain.
pub fn counter() -> Fragment {
    let count = Signal::new("count");
    let mut f = Fragment::new();
    f.add_statement(Assign::sync("sync", Target::Signal(count), Signal::new("count_next")));
    f
}

/// Purely combinational logic that uses no clock domain.
pub fn wire() -> Fragment {
    let mut f = Fragment::new();
    f.add_statement(Assign::comb(Target::Signal(Signal::new("y")), Signal::new("a")));
    f
}

/// Routes the default clock resource straight to `led` without any
/// synchronous logic.
pub struct Passthrough;

impl Elaboratable for Passthrough {
    fn elaborate(&self, platform: &mut Session<'_>) -> Result<Fragment, Fault> {
        let clk = platform.request("clk", 0)?;
        let led = platform.request("led", 0)?;
        let mut f = Fragment::new();
        if let (Some(i), Some(o)) = (clk.i(), led.o()) {
            f.add_statement(Assign::comb(Target::Signal(o.clone()), i.clone()));
        }
        Ok(f)
    }
}

/// Blinks the `led` resource from the "sync" domain, optionally constraining
/// the internal divider net.
pub struct Blinky {
    pub divided: bool,
}

impl Elaboratable for Blinky {
    fn elaborate(&self, platform: &mut Session<'_>) -> Result<Fragment, Fault> {
        let led = platform.request("led", 0)?;
        let mut f = counter();
        if let Some(o) = led.o() {
            f.add_statement(Assign::comb(Target::Signal(o.clone()), Signal::new("count_msb")));
        }
        if self.divided == true {
            platform.add_clock_constraint(divider_net(), 25e6)?;
        }
        Ok(f)
    }
}

pub fn environment(vars: &[(&str, &str)]) -> Environment {
    Environment::from_vec(vars.iter().map(|(k, v)| EnvVar::with(k, v)).collect())
}

pub fn options(opts: &[(&str, Value)]) -> Options {
    opts.iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A renderer for design `top` on [platform] with the default clock requested.
pub fn renderer(toolchain: Toolchain, opts: &[(&str, Value)], env: &[(&str, &str)]) -> Renderer {
    let platform = platform(toolchain);
    let mut session = Session::new(&platform);
    session.request("clk", 0).unwrap();
    let ports = session.port_signals();
    let netlist = FakeNetlister.convert(&Fragment::new(), &ports, "top").unwrap();
    let view = PlatformView::new(&platform, &session).unwrap();
    Renderer::new(RunContext::new(
        "top",
        view,
        Overrides::with_env(options(opts), Arc::new(environment(env))),
        netlist,
        platform.get_backend().clone(),
        toolchain.profile(),
        "/tmp/build",
    ))
}
