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

//! Port specifications of PublishPort and ExposeHostPort.
use crate::error::{Result, ValidationSnafu};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PORT_RANGE: Regex = Regex::new("^[0-9]+(-[0-9]+)?(/udp|/tcp)?$").unwrap();
}

/// true for `N`, `N-M`, optionally followed by `/tcp` or `/udp`
pub(crate) fn is_port_range(port: &str) -> bool {
    PORT_RANGE.is_match(port)
}

/* An IPv6 address is written in brackets and may contain colons,
 * those do not separate fields. */
fn split_ports(spec: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in spec.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                parts.push(&spec[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&spec[start..]);
    parts
}

/// Normalize a published port `[[ip:]host:]container` to the form podman
/// accepts after `-p=`.
pub(crate) fn parse_publish_port(spec: &str) -> Result<String> {
    let spec = spec.trim();
    let parts = split_ports(spec);

    let (ip, host, container) = match parts.as_slice() {
        [container] => ("", "", *container),
        [host, container] => ("", *host, *container),
        [ip, host, container] => (*ip, *host, *container),
        _ => {
            return ValidationSnafu {
                what: format!("invalid published port '{}'", spec),
            }
            .fail()
        }
    };

    let ip = if ip == "0.0.0.0" { "" } else { ip };

    for port in [host, container] {
        if !port.is_empty() && !is_port_range(port) {
            return ValidationSnafu {
                what: format!("invalid port format '{}'", port),
            }
            .fail();
        }
    }

    Ok(match (ip.is_empty(), host.is_empty()) {
        (false, false) => format!("{}:{}:{}", ip, host, container),
        (false, true) => format!("{}::{}", ip, container),
        (true, false) => format!("{}:{}", host, container),
        (true, true) => container.to_string(),
    })
}
