// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! Optional configuration file of the generator.
//!
//! ```toml
//! podman = "/usr/bin/podman"
//! unit_dirs = ["/etc/containers/systemd"]
//! log_level = "debug"
//! ```
use confique::Config;
use log::LevelFilter;
use std::path::Path;
use std::str::FromStr;

/// default configuration path
pub const DEFAULT_CONFIG: &str = "/etc/containers/quadlet.toml";

/// configuration of quadlet
#[allow(missing_docs)]
#[derive(Config, Debug)]
pub struct Conf {
    #[config(default = "/usr/bin/podman")]
    pub podman: String,
    pub unit_dirs: Option<Vec<String>>,
    #[config(default = "info")]
    pub log_level: String,
}

impl Conf {
    /// Load the configuration at `path`. A missing file gives the defaults,
    /// an unreadable one is logged and ignored.
    pub fn load_from(path: &Path) -> Conf {
        match Conf::builder().file(path).load() {
            Ok(conf) => conf,
            Err(e) => {
                log::error!("Failed to load '{}': {}", path.display(), e);
                Conf::default_conf()
            }
        }
    }

    fn default_conf() -> Conf {
        Conf {
            podman: "/usr/bin/podman".to_string(),
            unit_dirs: None,
            log_level: "info".to_string(),
        }
    }

    /// the configured level, info if it can't be parsed
    pub fn level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}
