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

//! The two ways of invoking the OpenLANE flow.

use serde_derive::{Deserialize, Serialize};

/// Selects how the flow is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// Runs the flow inside the `efabless/openlane` container image.
    #[default]
    Docker,
    /// Runs a locally installed flow.
    Local,
}

impl Toolchain {
    pub fn profile(&self) -> &'static Profile {
        match self {
            Self::Docker => &DOCKER_PROFILE,
            Self::Local => &LOCAL_PROFILE,
        }
    }
}

impl std::fmt::Display for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// The tools, files and commands of a toolchain.
#[derive(Debug, PartialEq)]
pub struct Profile {
    required_tools: &'static [&'static str],
    /// Pairs of (filename template, content template), in output order.
    file_templates: &'static [(&'static str, &'static str)],
    command_templates: &'static [&'static str],
}

impl Profile {
    pub fn required_tools(&self) -> &'static [&'static str] {
        self.required_tools
    }

    pub fn file_templates(&self) -> &'static [(&'static str, &'static str)] {
        self.file_templates
    }

    pub fn command_templates(&self) -> &'static [&'static str] {
        self.command_templates
    }
}

const BUILD_SCRIPT: &str = r#"
    # {{ autogenerated }}
    set -e{{ verbose(text="x") }}
    if [ -z "$BASH" ] ; then exec /bin/bash "$0" "$@"; fi
    {{ emit_commands(syntax="sh") }}
"#;

const CONFIG_TCL: &str = r#"
    # {{ autogenerated }}
    # Design Information
    set ::env(DESIGN_NAME) "{{ name }}"
    set ::env(VERILOG_FILES) "$::env(DESIGN_DIR)/{{ name }}.v"
    set ::env(SDC_FILE) "$::env(DESIGN_DIR)/{{ name }}.sdc"
    {% if platform.default_clk -%}
    # Clock Settings
    set ::env(CLOCK_PERIOD) "{{ platform.default_clk_period }}"
    set ::env(CLOCK_PORT) "{{ platform.default_clk_name }}"
    set ::env(CLOCK_NET) $::env(CLOCK_PORT)
    {% else -%}
    # Disable the clock
    set ::env(CLOCK_TREE_SYNTH) 0
    set ::env(CLOCK_PORT) ""
    {% endif -%}
    # PDK Settings
    set ::env(PDK) "{{ platform.pdk }}"
    set ::env(STD_CELL_LIBRARY) "{{ platform.cell_library }}"
    {% for setting in platform.flow_settings -%}
    set ::env({{ setting.key }}) {{ setting.value | tcl_escape }}
    {% endfor %}
    # Pull in PDK specific settings
    set filename $::env(DESIGN_DIR)/$::env(PDK)_$::env(STD_CELL_LIBRARY)_config.tcl
    if { [file exists $filename] == 1 } {
        source $filename
    }
"#;

const VERILOG: &str = r#"
    /* {{ autogenerated }} */
    {{ emit_verilog() }}
"#;

const DEBUG_VERILOG: &str = r#"
    /* {{ autogenerated }} */
    {{ emit_debug_verilog() }}
"#;

const SDC: &str = r##"
    # {{ autogenerated }}
    {% for clock in platform.clock_constraints -%}
    {% if clock.port -%}
    create_clock -name {{ clock.port | tcl_escape }} -period {{ clock.period }} [get_ports {{ clock.port | tcl_escape }}]
    {% else -%}
    create_clock -name {{ clock.name | tcl_escape }} -period {{ clock.period }} [get_nets {{ clock.signal | hierarchy(separator="/") | tcl_escape }}]
    {% endif -%}
    {% endfor -%}
    {{ get_override(name="add_constraints", default="# (add_constraints placeholder)") }}
"##;

const FILE_TEMPLATES: [(&str, &str); 5] = [
    ("build_{{ name }}.sh", BUILD_SCRIPT),
    ("config.tcl", CONFIG_TCL),
    ("{{ name }}.v", VERILOG),
    ("{{ name }}.debug.v", DEBUG_VERILOG),
    ("{{ name }}.sdc", SDC),
];

const DOCKER_COMMAND: &str = r#"
    {{ invoke_tool(name="docker") }}
        run
        -it
        --rm
        -v {{ get_override(name="OpenLANE", default=platform.openlane_root) }}:/openLANE_flow
        -v {{ get_override(name="PDKPath", default=platform.pdk_path) }}:/PDK
        -v {{ build_dir }}:/design_{{ name }}
        -e PDK_ROOT=/PDK
        -u {{ getuid() }}:{{ getgid() }}
        efabless/openlane:{{ get_override(name="openlane_version", default="latest") }}
        sh -c "./flow.tcl -design /design_{{ name }}"
"#;

const LOCAL_COMMAND: &str = r#"
    {{ get_override(name="OpenLANE", default=platform.openlane_root) }}/flow.tcl
        -design {{ build_dir }}
"#;

static DOCKER_PROFILE: Profile = Profile {
    required_tools: &["docker"],
    file_templates: &FILE_TEMPLATES,
    command_templates: &[DOCKER_COMMAND],
};

static LOCAL_PROFILE: Profile = Profile {
    required_tools: &[],
    file_templates: &FILE_TEMPLATES,
    command_templates: &[LOCAL_COMMAND],
};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn profiles_share_files() {
        let docker = Toolchain::Docker.profile();
        let local = Toolchain::Local.profile();
        assert_eq!(docker.file_templates(), local.file_templates());
        assert_ne!(docker.command_templates(), local.command_templates());
        assert_eq!(docker.required_tools(), &["docker"]);
        assert!(local.required_tools().is_empty());
    }

    #[test]
    fn from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            toolchain: Toolchain,
        }
        let doc: Doc = toml::from_str("toolchain = \"local\"").unwrap();
        assert_eq!(doc.toolchain, Toolchain::Local);
        assert!(toml::from_str::<Doc>("toolchain = \"podman\"").is_err());
        assert_eq!(Toolchain::default(), Toolchain::Docker);
    }
}
