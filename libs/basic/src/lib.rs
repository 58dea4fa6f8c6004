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

//!
#[cfg(feature = "config")]
pub mod config;
pub mod error;
pub use error::*;
#[cfg(feature = "fs")]
pub mod fs;

/// system unit directory of the admin, highest priority
pub const QUADLET_ADMIN_DIR: &str = "/etc/containers/systemd";
/// system unit directory of the distribution
pub const QUADLET_DISTRO_DIR: &str = "/usr/share/containers/systemd";
/// per-user unit directories managed by the admin live below this
pub const QUADLET_USERS_DIR: &str = "/etc/containers/systemd/users";
