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

//! the utils can be used to parse unit conf file
use crate::error::*;

/// return true if item is 1, yes, y, true, t or on
/// return false if item is 0, no, n, false, f, or off
pub fn parse_boolean(item: &str) -> Result<bool> {
    match &item.trim().to_lowercase() as &str {
        "1" | "yes" | "y" | "true" | "t" | "on" => Ok(true),
        "0" | "no" | "n" | "false" | "f" | "off" => Ok(false),
        _ => Err(Error::Parse {
            source: format!("wrong boolean value '{}'", item).into(),
        }),
    }
}

/// parse a decimal unsigned 32 bit number, surrounding whitespace is ignored
pub fn parse_u32(item: &str) -> Result<u32> {
    let item = item.trim();
    if item.starts_with('+') {
        return Err(Error::Parse {
            source: format!("invalid number '{}'", item).into(),
        });
    }

    Ok(item.parse::<u32>()?)
}
