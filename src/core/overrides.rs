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

//! Resolution of named build options.
//!
//! Every option is looked up independently, at the point a template asks for
//! it, through a fixed chain: the `LANEGEN_ENV_<OPTION>` environment variable,
//! then the options given to `prepare`, then the default supplied by the
//! template.

use crate::util::environment::{option_env_var, EnvLookup, ProcessEnv};
use crate::util::text;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Options given at call time, keyed by option name.
pub type Options = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(Value),
    /// No source provided the option; carries the option name.
    Unresolved(String),
}

impl Resolved {
    /// Checks if the resolved value counts as true.
    ///
    /// Empty strings, `false`, zero, `null`, empty collections and unresolved
    /// options are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Unresolved(_) => false,
            Self::Value(v) => match v {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
                Value::String(s) => s.is_empty() == false,
                Value::Array(a) => a.is_empty() == false,
                Value::Object(o) => o.is_empty() == false,
            },
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unresolved(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct Overrides {
    env: Arc<dyn EnvLookup>,
    options: Options,
}

impl std::fmt::Debug for Overrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overrides")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Overrides {
    /// Creates a resolver reading the process environment.
    pub fn new(options: Options) -> Self {
        Self::with_env(options, Arc::new(ProcessEnv))
    }

    pub fn with_env(options: Options, env: Arc<dyn EnvLookup>) -> Self {
        Self { env, options }
    }

    /// Resolves `option` from the environment or the call-time options.
    pub fn resolve(&self, option: &str) -> Resolved {
        if let Some(value) = self.env.lookup(&option_env_var(option)) {
            // some shells cannot set a variable to an empty value; accept `""` instead
            let value = match value.as_str() {
                "\"\"" => String::new(),
                _ => value,
            };
            return Resolved::Value(Value::String(value));
        }
        match self.options.get(option) {
            Some(Value::String(s)) => Resolved::Value(Value::String(text::dedent_trim(s))),
            Some(v) => Resolved::Value(v.clone()),
            None => Resolved::Unresolved(option.to_string()),
        }
    }

    /// Resolves `option`, falling back to `default` when no source provides it.
    pub fn resolve_or(&self, option: &str, default: Value) -> Value {
        match self.resolve(option) {
            Resolved::Value(v) => v,
            Resolved::Unresolved(_) => default,
        }
    }

    /// Checks if the `verbose` option is set to a true value.
    pub fn is_verbose(&self) -> bool {
        self.resolve("verbose").is_truthy()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::environment::{EnvVar, Environment};
    use serde_json::json;

    fn options() -> Options {
        Options::from([
            ("openlane_version".to_string(), json!("2023.07.19")),
            (
                "add_constraints".to_string(),
                json!("\n    set_load 0.5 [all_outputs]\n    "),
            ),
            ("verbose".to_string(), json!(false)),
            ("seed".to_string(), json!(7)),
        ])
    }

    fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvLookup> {
        Arc::new(Environment::from_vec(
            vars.iter().map(|(k, v)| EnvVar::with(k, v)).collect(),
        ))
    }

    #[test]
    fn environment_wins_over_options() {
        let ov = Overrides::with_env(
            options(),
            env(&[("LANEGEN_ENV_OPENLANE_VERSION", "latest")]),
        );
        assert_eq!(
            ov.resolve("openlane_version"),
            Resolved::Value(json!("latest"))
        );
        // removing the environment override falls back to the option
        let ov = Overrides::with_env(options(), env(&[]));
        assert_eq!(
            ov.resolve("openlane_version"),
            Resolved::Value(json!("2023.07.19"))
        );
        // removing both leaves the option unresolved
        let ov = Overrides::with_env(Options::new(), env(&[]));
        assert_eq!(
            ov.resolve("openlane_version"),
            Resolved::Unresolved("openlane_version".to_string())
        );
    }

    #[test]
    fn empty_quoted_environment_value() {
        let ov = Overrides::with_env(options(), env(&[("LANEGEN_ENV_SEED", "\"\"")]));
        assert_eq!(ov.resolve("seed"), Resolved::Value(json!("")));
        let ov = Overrides::with_env(options(), env(&[("LANEGEN_ENV_SEED", "\"x\"")]));
        assert_eq!(ov.resolve("seed"), Resolved::Value(json!("\"x\"")));
    }

    #[test]
    fn option_strings_are_dedented() {
        let ov = Overrides::with_env(options(), env(&[]));
        assert_eq!(
            ov.resolve("add_constraints"),
            Resolved::Value(json!("set_load 0.5 [all_outputs]"))
        );
        assert_eq!(ov.resolve("seed"), Resolved::Value(json!(7)));
    }

    #[test]
    fn defaults_apply_last() {
        let ov = Overrides::with_env(options(), env(&[]));
        assert_eq!(ov.resolve_or("tag", json!("latest")), json!("latest"));
        assert_eq!(ov.resolve_or("seed", json!(1)), json!(7));
    }

    #[test]
    fn truthiness() {
        assert_eq!(Resolved::Value(json!("")).is_truthy(), false);
        assert_eq!(Resolved::Value(json!("0")).is_truthy(), true);
        assert_eq!(Resolved::Value(json!(0)).is_truthy(), false);
        assert_eq!(Resolved::Value(json!(true)).is_truthy(), true);
        assert_eq!(Resolved::Value(json!([])).is_truthy(), false);
        assert_eq!(Resolved::Unresolved("x".to_string()).is_truthy(), false);

        let ov = Overrides::with_env(options(), env(&[]));
        assert_eq!(ov.is_verbose(), false);
        let ov = Overrides::with_env(options(), env(&[("LANEGEN_ENV_VERBOSE", "1")]));
        assert_eq!(ov.is_verbose(), true);
    }
}
