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

//! Platform descriptions loaded from TOML.
//!
//! ```toml
//! cell-library = "sky130_fd_sc_hd"
//! toolchain = "docker"
//! openlane-root = "/opt/openlane"
//! pdk-path = "/opt/pdk"
//! default-clk = "clk"
//!
//! [[resource]]
//! name = "clk"
//! dir = "i"
//! clock = { frequency = 100e6 }
//!
//! [flow-settings]
//! FP_CORE_UTIL = 40
//! ```

use crate::core::netlist::Netlister;
use crate::core::platform::{CellLibrary, Platform};
use crate::core::resource::Resource;
use crate::core::toolchain::Toolchain;
use crate::error::{Error, LastError};
use serde_derive::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PlatformConfig {
    cell_library: CellLibrary,
    #[serde(default)]
    toolchain: Toolchain,
    #[serde(default)]
    openlane_root: String,
    #[serde(default)]
    pdk_path: String,
    default_clk: Option<String>,
    default_rst: Option<String>,
    #[serde(default)]
    resource: Vec<Resource>,
    #[serde(default)]
    flow_settings: toml::Table,
}

impl FromStr for PlatformConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e: toml::de::Error| Error::BadConfig(LastError(e.to_string())))
    }
}

impl PlatformConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        // verify the path exists
        if path.is_file() == false {
            return Err(Error::BadConfig(LastError(format!(
                "failed to locate platform file \"{}\"",
                path.display()
            ))));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_str(&contents).map_err(|e| match e {
            Error::BadConfig(LastError(msg)) => Error::BadConfig(LastError(format!(
                "failed to parse \"{}\": {}",
                path.display(),
                msg
            ))),
            e => e,
        })
    }

    pub fn get_cell_library(&self) -> CellLibrary {
        self.cell_library
    }

    pub fn get_toolchain(&self) -> Toolchain {
        self.toolchain
    }

    /// Builds the described platform, checking that the default clock and
    /// reset name declared resources.
    pub fn into_platform(self, backend: Arc<dyn Netlister>) -> Result<Platform, Error> {
        let mut platform = Platform::new(self.cell_library, self.toolchain, backend)
            .openlane_root(&self.openlane_root)
            .pdk_path(&self.pdk_path);
        for resource in self.resource {
            platform = platform.resource(resource);
        }
        for (key, value) in self.flow_settings {
            let value = serde_json::to_value(value)
                .map_err(|e| Error::BadConfig(LastError(e.to_string())))?;
            platform = platform.flow_setting(&key, value);
        }
        if let Some(clk) = &self.default_clk {
            platform.lookup(clk, 0)?;
            platform = platform.default_clk(clk);
        }
        if let Some(rst) = &self.default_rst {
            platform.lookup(rst, 0)?;
            platform = platform.default_rst(rst);
        }
        Ok(platform)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::resource::Dir;
    use crate::core::testing::FakeNetlister;
    use serde_json::json;

    const PLATFORM: &str = r#"
cell-library = "sky130_fd_sc_hs"
toolchain = "local"
openlane-root = "/opt/openlane"
default-clk = "clk"

[[resource]]
name = "clk"
dir = "i"
clock = { frequency = 50e6 }

[[resource]]
name = "led"
number = 2
dir = "o"

[flow-settings]
PL_TARGET_DENSITY = 0.6
FP_CORE_UTIL = 40
"#;

    #[test]
    fn parse_platform() {
        let cfg = PlatformConfig::from_str(PLATFORM).unwrap();
        assert_eq!(cfg.get_cell_library(), CellLibrary::HighSpeed);
        assert_eq!(cfg.get_toolchain(), Toolchain::Local);

        let p = cfg.into_platform(Arc::new(FakeNetlister)).unwrap();
        assert_eq!(p.name(), "sky130A/sky130_fd_sc_hs");
        assert_eq!(p.get_openlane_root(), "/opt/openlane");
        assert_eq!(p.get_pdk_path(), "");
        assert_eq!(p.get_default_clk(), Some("clk"));
        assert_eq!(p.lookup("led", 2).unwrap().get_dir(), Dir::O);
        let settings: Vec<(&str, &serde_json::Value)> = p
            .get_flow_settings()
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        assert_eq!(
            settings,
            vec![
                ("PL_TARGET_DENSITY", &json!(0.6)),
                ("FP_CORE_UTIL", &json!(40))
            ]
        );
    }

    #[test]
    fn defaults() {
        let cfg = PlatformConfig::from_str("cell-library = \"sky130_fd_sc_hd\"").unwrap();
        assert_eq!(cfg.get_toolchain(), Toolchain::Docker);
        let p = cfg.into_platform(Arc::new(FakeNetlister)).unwrap();
        assert_eq!(p.get_default_clk(), None);
        assert!(p.get_resources().is_empty());
    }

    #[test]
    fn rejects_bad_documents() {
        // unknown key
        assert!(matches!(
            PlatformConfig::from_str("cell-library = \"sky130_fd_sc_hd\"\nclock = 1"),
            Err(Error::BadConfig(_))
        ));
        // unknown toolchain
        assert!(matches!(
            PlatformConfig::from_str("cell-library = \"sky130_fd_sc_hd\"\ntoolchain = \"podman\""),
            Err(Error::BadConfig(_))
        ));
        // unknown library
        match PlatformConfig::from_str("cell-library = \"gf180\"") {
            Err(Error::BadConfig(LastError(msg))) => assert!(msg.contains("unknown cell library")),
            e => panic!("unexpected result {:?}", e),
        }
    }

    #[test]
    fn default_clock_must_exist() {
        let cfg = PlatformConfig::from_str(
            "cell-library = \"sky130_fd_sc_hd\"\ndefault-clk = \"osc\"",
        )
        .unwrap();
        assert_eq!(
            cfg.into_platform(Arc::new(FakeNetlister)).unwrap_err(),
            Error::ResourceNotFound("osc".to_string(), 0)
        );
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform.toml");
        std::fs::write(&path, PLATFORM).unwrap();
        assert!(PlatformConfig::from_file(&path).is_ok());
        assert!(matches!(
            PlatformConfig::from_file(&dir.path().join("missing.toml")),
            Err(Error::BadConfig(_))
        ));
    }
}
