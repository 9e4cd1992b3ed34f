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

//! Rendering of the file and command templates.
//!
//! Templates use the Tera syntax. Every render starts from a fresh engine with
//! the helper functions and filters bound to the context of a single build,
//! so nothing outlives the call to `prepare` that created it. Referencing an
//! unknown variable or an unresolved option is an error, never a blank.

use crate::core::commands::{self, Syntax};
use crate::core::escape::{self, Markup, TclText};
use crate::core::hdl::SignalId;
use crate::core::netlist::{Netlist, Netlister};
use crate::core::overrides::{Overrides, Resolved};
use crate::core::platform::{Platform, Session};
use crate::core::resource::period_ns;
use crate::core::toolchain::Profile;
use crate::error::{Error, LastError};
use crate::util::{identity, text};
use serde_derive::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tera::{Context, Tera, Value};

type Args = HashMap<String, Value>;

/// Holds the first error raised by a helper during a render.
type Failure = Arc<Mutex<Option<Error>>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SettingView {
    key: String,
    value: Value,
}

/// A net that templates can pass to the `hierarchy` filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct NetView {
    id: SignalId,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ClockView {
    signal: NetView,
    name: String,
    port: Option<String>,
    period: String,
}

/// The platform as seen by templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformView {
    name: String,
    pdk: String,
    cell_library: String,
    openlane_root: String,
    pdk_path: String,
    default_clk: Option<String>,
    default_clk_period: Option<String>,
    default_clk_name: Option<String>,
    flow_settings: Vec<SettingView>,
    clock_constraints: Vec<ClockView>,
}

impl PlatformView {
    /// Captures the platform along with the ports requested during `session`.
    pub fn new(platform: &Platform, session: &Session<'_>) -> Result<Self, Error> {
        let (default_clk_period, default_clk_name) = match platform.get_default_clk() {
            Some(_) => (
                Some(period_ns(session.default_clk_constraint()?.frequency())),
                Some(session.default_clk_name()?),
            ),
            None => (None, None),
        };
        Ok(Self {
            name: platform.name(),
            pdk: platform.pdk().to_string(),
            cell_library: platform.cell_library().to_string(),
            openlane_root: platform.get_openlane_root().to_string(),
            pdk_path: platform.get_pdk_path().to_string(),
            default_clk: platform.get_default_clk().map(|s| s.to_string()),
            default_clk_period,
            default_clk_name,
            flow_settings: platform
                .get_flow_settings()
                .iter()
                .map(|(k, v)| SettingView {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect(),
            clock_constraints: session
                .iter_clock_constraints()
                .map(|c| ClockView {
                    signal: NetView {
                        id: c.net().id(),
                        name: c.net().name().to_string(),
                    },
                    name: c.net().name().to_string(),
                    port: c.port().map(|p| p.to_string()),
                    period: period_ns(c.frequency()),
                })
                .collect(),
        })
    }
}

/// Everything a template may refer to during one build.
pub struct RunContext {
    name: String,
    platform: PlatformView,
    overrides: Overrides,
    netlist: Netlist,
    backend: Arc<dyn Netlister>,
    profile: &'static Profile,
    build_dir: String,
    autogenerated: String,
}

impl RunContext {
    pub fn new(
        name: &str,
        platform: PlatformView,
        overrides: Overrides,
        netlist: Netlist,
        backend: Arc<dyn Netlister>,
        profile: &'static Profile,
        build_dir: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            platform,
            overrides,
            netlist,
            backend,
            profile,
            build_dir: build_dir.to_string(),
            autogenerated: format!(
                "Automatically generated by lanegen {}. Do not edit.",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }

    pub fn profile(&self) -> &'static Profile {
        self.profile
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    fn emit_verilog(&self, args: &Args, strip_internal_attrs: bool) -> Result<String, Error> {
        let opts = match args.get("opts") {
            Some(v) => list_of_text(v),
            None => Vec::new(),
        };
        self.backend
            .to_verilog(self.netlist.rtlil(), strip_internal_attrs, &opts)
            .map_err(|e| Error::NetlistFailed(LastError(e.to_string())))
    }
}

/// Renders templates against a shared [RunContext].
#[derive(Clone)]
pub struct Renderer(Arc<RunContext>);

impl Renderer {
    pub fn new(context: RunContext) -> Self {
        Self(Arc::new(context))
    }

    pub fn context(&self) -> &RunContext {
        &self.0
    }

    /// Renders `source`, reporting problems against `origin`.
    ///
    /// `syntax` selects the script dialect for `invoke_tool`; it is only set
    /// while rendering commands.
    pub fn render(&self, source: &str, origin: &str, syntax: Option<Syntax>) -> Result<String, Error> {
        let source = text::dedent_trim(source);
        let failure: Failure = Arc::new(Mutex::new(None));

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        self.register_filters(&mut tera, &failure);
        self.register_functions(&mut tera, &failure, origin, &source, syntax);

        if let Err(e) = tera.add_raw_template(origin, &source) {
            return Err(syntax_error(&e, origin));
        }

        let mut context = Context::new();
        context.insert("name", &self.0.name);
        context.insert("platform", &self.0.platform);
        context.insert("syntax", &syntax.map(|s| s.to_string()));
        context.insert("build_dir", &self.0.build_dir);
        context.insert("autogenerated", &self.0.autogenerated);

        tera.render(origin, &context).map_err(|e| {
            let recorded = match failure.lock() {
                Ok(mut slot) => slot.take(),
                Err(_) => None,
            };
            match recorded {
                Some(err) => err,
                None => render_error(&e, origin, &source),
            }
        })
    }

    fn register_filters(&self, tera: &mut Tera, failure: &Failure) {
        tera.register_filter("options", |value: &Value, _: &Args| -> tera::Result<Value> {
            match value {
                Value::Array(_) => Ok(Value::String(escape::options(&list_of_text(value)))),
                _ => Ok(Value::String(value_text(value))),
            }
        });

        let ctx = self.clone();
        let fail = failure.clone();
        tera.register_filter("hierarchy", move |value: &Value, args: &Args| -> tera::Result<Value> {
            let separator = match args.get("separator").and_then(|v| v.as_str()) {
                Some(s) => s,
                None => return Err(tera::Error::msg("filter `hierarchy` expects a `separator` argument")),
            };
            let (id, name) = match (value.get("id").and_then(|v| v.as_u64()), value.get("name")) {
                (Some(id), Some(Value::String(name))) => (id, name.as_str()),
                _ => return Err(tera::Error::msg("filter `hierarchy` expects a net with an `id` and a `name`")),
            };
            ctx.0
                .netlist
                .name_map()
                .hierarchy(id, name, separator)
                .map(Value::String)
                .map_err(|e| record(&fail, e))
        });

        tera.register_filter("ascii_escape", |value: &Value, _: &Args| -> tera::Result<Value> {
            Ok(Value::String(escape::ascii_escape(&value_text(value))))
        });

        tera.register_filter("tcl_escape", |value: &Value, _: &Args| -> tera::Result<Value> {
            Ok(Value::String(match Markup::from_value(value) {
                Some(m) => m.tcl_escape(),
                None => value_text(value).tcl_escape(),
            }))
        });

        tera.register_filter("tcl_quote", |value: &Value, _: &Args| -> tera::Result<Value> {
            Ok(Value::String(match Markup::from_value(value) {
                Some(m) => m.tcl_quote(),
                None => value_text(value).tcl_quote(),
            }))
        });

        tera.register_filter("markup", |value: &Value, _: &Args| -> tera::Result<Value> {
            Ok(Markup::new(value_text(value)).into())
        });
    }

    fn register_functions(
        &self,
        tera: &mut Tera,
        failure: &Failure,
        origin: &str,
        source: &str,
        syntax: Option<Syntax>,
    ) {
        let ctx = self.clone();
        tera.register_function("emit_rtlil", move |_: &Args| -> tera::Result<Value> {
            Ok(Value::String(ctx.0.netlist.rtlil().to_string()))
        });

        let (ctx, fail) = (self.clone(), failure.clone());
        tera.register_function("emit_verilog", move |args: &Args| -> tera::Result<Value> {
            ctx.0
                .emit_verilog(args, true)
                .map(Value::String)
                .map_err(|e| record(&fail, e))
        });

        let (ctx, fail) = (self.clone(), failure.clone());
        tera.register_function("emit_debug_verilog", move |args: &Args| -> tera::Result<Value> {
            ctx.0
                .emit_verilog(args, false)
                .map(Value::String)
                .map_err(|e| record(&fail, e))
        });

        let (ctx, fail) = (self.clone(), failure.clone());
        tera.register_function("emit_commands", move |args: &Args| -> tera::Result<Value> {
            let syntax = match args.get("syntax").and_then(|v| v.as_str()) {
                Some(s) => Syntax::from_str(s).map_err(|e| record(&fail, e))?,
                None => return Err(tera::Error::msg("function `emit_commands` expects a `syntax` argument")),
            };
            commands::emit_commands(&ctx, syntax)
                .map(Value::String)
                .map_err(|e| record(&fail, e))
        });

        tera.register_function("invoke_tool", move |args: &Args| -> tera::Result<Value> {
            let name = match args.get("name").and_then(|v| v.as_str()) {
                Some(s) => s,
                None => return Err(tera::Error::msg("function `invoke_tool` expects a `name` argument")),
            };
            match syntax {
                Some(syntax) => Ok(Value::String(escape::invoke_tool(name, syntax))),
                None => Err(tera::Error::msg("function `invoke_tool` is only available in command templates")),
            }
        });

        let (ctx, fail) = (self.clone(), failure.clone());
        let (origin, source) = (origin.to_string(), source.to_string());
        tera.register_function("get_override", move |args: &Args| -> tera::Result<Value> {
            let name = match args.get("name").and_then(|v| v.as_str()) {
                Some(s) => s,
                None => return Err(tera::Error::msg("function `get_override` expects a `name` argument")),
            };
            match (ctx.0.overrides.resolve(name), args.get("default")) {
                (Resolved::Value(v), _) => Ok(v),
                (Resolved::Unresolved(_), Some(default)) => Ok(default.clone()),
                (Resolved::Unresolved(option), None) => Err(record(
                    &fail,
                    Error::MissingOption {
                        line: option_line(&source, &option),
                        name: option,
                        origin: origin.clone(),
                    },
                )),
            }
        });

        let ctx = self.clone();
        tera.register_function("verbose", move |args: &Args| -> tera::Result<Value> {
            match ctx.0.overrides.is_verbose() {
                true => Ok(args.get("text").cloned().unwrap_or(Value::String(String::new()))),
                false => Ok(Value::String(String::new())),
            }
        });

        let ctx = self.clone();
        tera.register_function("quiet", move |args: &Args| -> tera::Result<Value> {
            match ctx.0.overrides.is_verbose() {
                true => Ok(Value::String(String::new())),
                false => Ok(args.get("text").cloned().unwrap_or(Value::String(String::new()))),
            }
        });

        let fail = failure.clone();
        tera.register_function("getuid", move |_: &Args| -> tera::Result<Value> {
            identity::getuid()
                .map(Value::from)
                .map_err(|e| record(&fail, e))
        });

        let fail = failure.clone();
        tera.register_function("getgid", move |_: &Args| -> tera::Result<Value> {
            identity::getgid()
                .map(Value::from)
                .map_err(|e| record(&fail, e))
        });
    }
}

/// Stores `err` as the cause of the current render failure.
fn record(failure: &Failure, err: Error) -> tera::Error {
    let msg = err.to_string();
    if let Ok(mut slot) = failure.lock() {
        if slot.is_none() {
            *slot = Some(err);
        }
    }
    tera::Error::msg(msg)
}

/// Converts a template value into the text it stands for.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        _ => match Markup::from_value(value) {
            Some(m) => m.to_string(),
            None => value.to_string(),
        },
    }
}

fn list_of_text(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        _ => vec![value_text(value)],
    }
}

/// Joins an error with all of its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut cur = err.source();
    while let Some(e) = cur {
        parts.push(e.to_string());
        cur = e.source();
    }
    parts.join(": ")
}

fn syntax_error(err: &tera::Error, origin: &str) -> Error {
    let chain = error_chain(err);
    // parser errors point at the offending position with "--> line:column"
    let line = chain
        .split_once("--> ")
        .and_then(|(_, rest)| rest.split(':').next())
        .and_then(|n| n.trim().parse::<usize>().ok())
        .unwrap_or(1);
    let message = chain
        .lines()
        .map(|l| l.trim())
        .find_map(|l| l.strip_prefix("= "))
        .map(|l| l.to_string())
        .unwrap_or_else(|| chain.lines().next().unwrap_or_default().to_string());
    Error::TemplateSyntax {
        message,
        origin: origin.to_string(),
        line,
    }
}

/// Finds the line of the `get_override` call that names `option`, falling back
/// to the first line quoting it.
fn option_line(source: &str, option: &str) -> Option<usize> {
    let needles = [format!("name=\"{}\"", option), format!("name='{}'", option)];
    source
        .lines()
        .position(|l| {
            let packed: String = l.chars().filter(|c| c.is_whitespace() == false).collect();
            needles.iter().any(|n| packed.contains(n.as_str()))
        })
        .map(|i| i + 1)
        .or_else(|| text::find_line(source, &format!("\"{}\"", option)))
}

fn render_error(err: &tera::Error, origin: &str, source: &str) -> Error {
    let chain = error_chain(err);
    // undefined variables are reported between backticks
    let line = chain
        .split('`')
        .nth(1)
        .and_then(|name| text::find_line(source, name));
    Error::TemplateRender {
        message: chain,
        origin: origin.to_string(),
        line,
    }
}
