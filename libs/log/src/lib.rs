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

//! Logging backend of the generators.
//! Messages go through the `log` facade and are written to the console
//! (stderr) and/or the kernel log buffer.
pub mod logger;

/// reexport log::Log
pub use log::max_level;
pub use log::set_max_level;
pub use log::Log;
pub use log::{debug, error, info, trace, warn};
pub use log::{Level, LevelFilter};
pub use log::{Metadata, Record};

pub use logger::init_log;
