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

//! Search path of source files.
use crate::kind::UnitKind;
use basic::{QUADLET_ADMIN_DIR, QUADLET_DISTRO_DIR, QUADLET_USERS_DIR};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// environment variable overriding the search path, colon separated
pub const UNIT_DIRS_ENV: &str = "QUADLET_UNIT_DIRS";

fn user_config_dir() -> Option<PathBuf> {
    match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(".config")),
    }
}

/// Default directories, highest priority first.
pub fn default_unit_dirs(is_user: bool) -> Vec<PathBuf> {
    if !is_user {
        return vec![
            PathBuf::from(QUADLET_ADMIN_DIR),
            PathBuf::from(QUADLET_DISTRO_DIR),
        ];
    }

    let mut dirs = Vec::new();
    if let Some(config) = user_config_dir() {
        dirs.push(config.join("containers/systemd"));
    }
    dirs.push(Path::new(QUADLET_USERS_DIR).join(nix::unistd::getuid().to_string()));
    dirs
}

/// The directories to scan: the environment first, then the configured
/// directories, then the defaults.
pub fn unit_search_dirs(is_user: bool, configured: Option<&[String]>) -> Vec<PathBuf> {
    if let Some(value) = env::var_os(UNIT_DIRS_ENV) {
        return env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
    }

    match configured {
        Some(dirs) => dirs.iter().map(PathBuf::from).collect(),
        None => default_unit_dirs(is_user),
    }
}

/// Collect source files of all supported kinds.
///
/// Every directory is read in name order. A file name found in an earlier
/// directory hides files of the same name in later ones.
pub fn find_source_units(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for dir in dirs {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Skipping missing directory {}", dir.display());
                continue;
            }
            Err(e) => {
                log::warn!("Can't read directory {}: {}", dir.display(), e);
                continue;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| UnitKind::from_path(path).is_some())
            .collect();
        paths.sort();

        for path in paths {
            let name = match path.file_name() {
                Some(name) => name.to_os_string(),
                None => continue,
            };
            if seen.insert(name) {
                result.push(path);
            } else {
                log::debug!("{} is shadowed by an earlier directory", path.display());
            }
        }
    }

    result
}
