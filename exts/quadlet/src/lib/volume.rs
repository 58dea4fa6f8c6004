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

//! `.volume` files: oneshot services creating a named podman volume.
use crate::cmdline::PodmanCmdline;
use crate::error::{Result, ValidationSnafu};
use crate::generator::{GeneratorContext, SourceUnit};
use crate::kind::base_name;
use crate::{SERVICE_GROUP, UNIT_GROUP};
use unit_parser::UnitFile;

const GROUP: &str = "Volume";

pub(crate) const SUPPORTED_KEYS: &[&str] = &[
    "Copy",
    "Device",
    "GlobalArgs",
    "Group",
    "Label",
    "Options",
    "PodmanArgs",
    "Type",
    "User",
];

/// `o=` mount options: numeric owner and group, then the free-form options
fn mount_options(unit: &UnitFile, has_device: bool) -> Result<Option<String>> {
    let mut opts = Vec::new();

    if let Some(uid) = unit.lookup_u32(GROUP, "User")? {
        opts.push(format!("uid={}", uid));
    }
    if let Some(gid) = unit.lookup_u32(GROUP, "Group")? {
        opts.push(format!("gid={}", gid));
    }

    if let Some(options) = unit.lookup_last(GROUP, "Options").filter(|o| !o.is_empty()) {
        if !has_device {
            return ValidationSnafu {
                what: "key Options can't be used without Device",
            }
            .fail();
        }
        opts.push(options.to_string());
    }

    if opts.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("o={}", opts.join(","))))
}

/// Fill `service` for a `.volume` source and build its podman command.
pub(crate) fn convert(
    source: &SourceUnit,
    service: &mut UnitFile,
    ctx: &GeneratorContext,
) -> Result<()> {
    let unit = &source.unit;
    let volume_name = format!("systemd-{}", base_name(&source.file_name()));

    service.add(UNIT_GROUP, "RequiresMountsFor", "%t/containers");

    let global_args = unit.lookup_all_args(GROUP, "GlobalArgs")?;
    let mut cmd = PodmanCmdline::new(&ctx.podman, global_args, &["volume", "create", "--ignore"]);

    match unit.lookup_bool(GROUP, "Copy")? {
        Some(true) => cmd.extend(["--opt", "copy"]),
        Some(false) => cmd.extend(["--opt", "nocopy"]),
        None => {}
    }

    let device = unit.lookup_last(GROUP, "Device").filter(|d| !d.is_empty());
    if let Some(device) = device {
        cmd.extend(["--opt".to_string(), format!("device={}", device)]);
    }

    if let Some(fs_type) = unit.lookup_last(GROUP, "Type").filter(|t| !t.is_empty()) {
        if device.is_none() {
            return ValidationSnafu {
                what: "key Type can't be used without Device",
            }
            .fail();
        }
        cmd.extend(["--opt".to_string(), format!("type={}", fs_type)]);
    }

    if let Some(opts) = mount_options(unit, device.is_some())? {
        cmd.extend(["--opt".to_string(), opts]);
    }

    cmd.add_key_vals("--label", &unit.lookup_all_key_val(GROUP, "Label")?);
    cmd.extend(unit.lookup_all_args(GROUP, "PodmanArgs")?);
    cmd.add(volume_name);

    service.add_cmdline(SERVICE_GROUP, "ExecStart", cmd.args());

    service.set(SERVICE_GROUP, "Type", "oneshot");
    service.set(SERVICE_GROUP, "RemainAfterExit", "yes");
    service.set(SERVICE_GROUP, "SyslogIdentifier", "%N");

    Ok(())
}
