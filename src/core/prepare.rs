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

//! Turning a design into a [BuildPlan] for a platform.

use crate::core::domain;
use crate::core::hdl::{Elaboratable, Signal};
use crate::core::overrides::{Options, Overrides};
use crate::core::plan::BuildPlan;
use crate::core::platform::{Platform, Session};
use crate::core::template::{PlatformView, Renderer, RunContext};
use crate::error::{Error, LastError};
use crate::util::environment::{EnvLookup, ProcessEnv};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_BUILD_DIR: &str = "build";

/// The per-call inputs of [Platform::prepare].
#[derive(Clone)]
pub struct BuildOptions {
    options: Options,
    ports: Vec<Signal>,
    extra_files: Vec<(String, Vec<u8>)>,
    build_dir: String,
    env: Arc<dyn EnvLookup>,
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("options", &self.options)
            .field("ports", &self.ports)
            .field("extra_files", &self.extra_files.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("build_dir", &self.build_dir)
            .finish_non_exhaustive()
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            options: Options::new(),
            ports: Vec::new(),
            extra_files: Vec::new(),
            build_dir: DEFAULT_BUILD_DIR.to_string(),
            env: Arc::new(ProcessEnv),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a build option that templates read through `get_override`.
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Adds top-level ports besides the requested resources.
    pub fn ports(mut self, ports: Vec<Signal>) -> Self {
        self.ports.extend(ports);
        self
    }

    /// Adds a file copied into the plan as-is.
    pub fn extra_file(mut self, filename: &str, content: impl Into<Vec<u8>>) -> Self {
        self.extra_files.push((filename.to_string(), content.into()));
        self
    }

    /// Sets the directory the flow runs in; relative paths are taken from the
    /// current working directory.
    pub fn build_dir(mut self, dir: &str) -> Self {
        self.build_dir = dir.to_string();
        self
    }

    /// Replaces the source of `LANEGEN_ENV_*` overrides.
    pub fn environment(mut self, env: Arc<dyn EnvLookup>) -> Self {
        self.env = env;
        self
    }

    pub fn overrides(&self) -> Overrides {
        Overrides::with_env(self.options.clone(), self.env.clone())
    }

    fn absolute_build_dir(&self) -> Result<String, Error> {
        let dir = PathBuf::from(&self.build_dir);
        let dir = match dir.is_absolute() {
            true => dir,
            false => std::env::current_dir()?.join(dir),
        };
        Ok(dir.display().to_string())
    }
}

/// Checks that `name` only holds characters that are safe in every file the
/// plan writes.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() == true {
        return Err(Error::EmptyDesignName);
    }
    match name.chars().find(|c| c.is_ascii_alphanumeric() == false && *c != '_') {
        Some(c) => Err(Error::InvalidDesignName(name.to_string(), c)),
        None => Ok(()),
    }
}

/// Appends the signals of every pin requested so far that are not yet in
/// `ports`.
fn add_port_signals(ports: &mut Vec<Signal>, session: &Session<'_>) {
    for signal in session.port_signals() {
        if ports.iter().any(|p| p.id() == signal.id()) == false {
            ports.push(signal);
        }
    }
}

impl Platform {
    /// Elaborates `design` and renders every file of the toolchain for it.
    ///
    /// Either the complete plan is returned or nothing is.
    pub fn prepare(
        &self,
        design: &dyn Elaboratable,
        name: &str,
        opts: &BuildOptions,
    ) -> Result<BuildPlan, Error> {
        validate_name(name)?;
        tracing::debug!(
            "preparing design {:?} for {} using the {} toolchain",
            name,
            self.name(),
            self.get_toolchain()
        );

        let mut session = Session::new(self);
        let fragment = design
            .elaborate(&mut session)
            .map_err(|e| Error::ElaborationFailed(LastError(e.to_string())))?;

        // every requested pin is a top-level port
        let mut ports = opts.ports.clone();
        add_port_signals(&mut ports, &session);
        let fragment = domain::fold_default_domain(fragment, &mut session, &mut ports)?;
        add_port_signals(&mut ports, &session);
        let fragment = fragment.prepare()?;

        let netlist = self
            .get_backend()
            .convert(&fragment, &ports, name)
            .map_err(|e| Error::NetlistFailed(LastError(e.to_string())))?;
        tracing::trace!("converted netlist with {} named signals", netlist.name_map().len());

        let profile = self.get_toolchain().profile();
        let renderer = Renderer::new(RunContext::new(
            name,
            PlatformView::new(self, &session)?,
            opts.overrides(),
            netlist,
            self.get_backend().clone(),
            profile,
            &opts.absolute_build_dir()?,
        ));

        let mut plan = BuildPlan::new(&format!("build_{}", name));
        for (filename_template, content_template) in profile.file_templates() {
            let filename = renderer.render(filename_template, filename_template, None)?;
            let mut content = renderer.render(content_template, filename_template, None)?;
            content.push('\n');
            tracing::debug!("rendered {:?} ({} bytes)", filename, content.len());
            plan.add_file(&filename, content)?;
        }
        for (filename, content) in &opts.extra_files {
            plan.add_file(filename, content.clone())?;
        }
        Ok(plan)
    }
}
