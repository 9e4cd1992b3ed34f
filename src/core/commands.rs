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

//! Emission of the command sequence of the entry script.

use crate::core::template::Renderer;
use crate::error::Error;
use crate::util::environment::tool_env_var;
use crate::util::text;
use std::str::FromStr;

/// The script dialects commands can be emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// POSIX shell.
    Sh,
    /// Windows batch.
    Bat,
}

impl Syntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Bat => "bat",
        }
    }

    /// The file extension of scripts in this syntax.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Sh => ".sh",
            Self::Bat => ".bat",
        }
    }
}

impl FromStr for Syntax {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sh" => Ok(Self::Sh),
            "bat" => Ok(Self::Bat),
            _ => Err(Error::UnknownSyntax(s.to_string())),
        }
    }
}

impl std::fmt::Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Defaults the variable holding the path of `tool` to the tool's own name.
pub fn tool_preamble(tool: &str, syntax: Syntax) -> String {
    let env_var = tool_env_var(tool);
    match syntax {
        Syntax::Sh => format!(": ${{{}:={}}}", env_var, tool),
        Syntax::Bat => format!(
            "if [%{0}%] equ [\"\"] (set {0}={1}) else if [%{0}%] equ [] set {0}={1}",
            env_var, tool
        ),
    }
}

/// Renders the tool preambles followed by every command of the toolchain,
/// one per line.
///
/// Each command collapses to a single line; in batch syntax a failing command
/// ends the script.
pub fn emit_commands(renderer: &Renderer, syntax: Syntax) -> Result<String, Error> {
    let profile = renderer.context().profile();
    let mut lines: Vec<String> = profile
        .required_tools()
        .iter()
        .map(|tool| tool_preamble(tool, syntax))
        .collect();

    for (index, template) in profile.command_templates().iter().enumerate() {
        let origin = format!("<command#{}>", index + 1);
        let command = renderer.render(template, &origin, Some(syntax))?;
        let command = text::collapse_whitespace(&command);
        lines.push(match syntax {
            Syntax::Sh => command,
            Syntax::Bat => format!("{} || exit /b", command),
        });
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::testing;
    use crate::core::toolchain::Toolchain;

    #[test]
    fn parse_syntax() {
        assert_eq!(Syntax::from_str("sh").unwrap(), Syntax::Sh);
        assert_eq!(Syntax::from_str("bat").unwrap(), Syntax::Bat);
        assert_eq!(
            Syntax::from_str("ps1").unwrap_err(),
            Error::UnknownSyntax("ps1".to_string())
        );
        assert_eq!(Syntax::Bat.extension(), ".bat");
    }

    #[test]
    fn preambles() {
        assert_eq!(tool_preamble("docker", Syntax::Sh), ": ${DOCKER:=docker}");
        assert_eq!(
            tool_preamble("docker", Syntax::Bat),
            "if [%DOCKER%] equ [\"\"] (set DOCKER=docker) else if [%DOCKER%] equ [] set DOCKER=docker"
        );
    }

    #[test]
    fn docker_commands_sh() {
        let r = testing::renderer(Toolchain::Docker, &[], &[]);
        let out = emit_commands(&r, Syntax::Sh).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], ": ${DOCKER:=docker}");
        assert!(lines[1].starts_with("\"$DOCKER\" run -it --rm -v "));
        assert!(lines[1].contains("efabless/openlane:latest"));
        assert!(lines[1].ends_with("sh -c \"./flow.tcl -design /design_top\""));
    }

    #[test]
    fn docker_commands_bat() {
        let r = testing::renderer(Toolchain::Docker, &[], &[]);
        let out = emit_commands(&r, Syntax::Bat).unwrap();
        assert_eq!(out.lines().count(), 2);
        for line in out.lines().skip(1) {
            assert!(line.starts_with("%DOCKER% run"));
            assert!(line.ends_with(" || exit /b"));
        }
    }

    #[test]
    fn local_commands() {
        let r = testing::renderer(Toolchain::Local, &[], &[("LANEGEN_ENV_OPENLANE", "/opt/ol")]);
        let out = emit_commands(&r, Syntax::Sh).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("/opt/ol/flow.tcl -design /"));
    }
}
