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

//! `.container` files: services running one container with `podman run`.
use crate::cmdline::PodmanCmdline;
use crate::error::{Result, ValidationSnafu};
use crate::generator::{GeneratorContext, SourceUnit};
use crate::ports::{is_port_range, parse_publish_port};
use crate::remap::{
    handle_user_remap, KEY_REMAP_GID, KEY_REMAP_UID, KEY_REMAP_UID_SIZE, KEY_REMAP_USERS,
};
use crate::{SERVICE_GROUP, UNIT_GROUP};
use std::path::Path;
use unit_parser::{escape_words, UnitFile};

const GROUP: &str = "Container";

/// id file of the running container
const CID_FILE: &str = "%t/%N.cid";
const CIDFILE_ARG: &str = "--cidfile=%t/%N.cid";

pub(crate) const SUPPORTED_KEYS: &[&str] = &[
    "AddCapability",
    "AddDevice",
    "Annotation",
    "ContainerName",
    "DropCapability",
    "Environment",
    "EnvironmentFile",
    "Exec",
    "ExposeHostPort",
    "GlobalArgs",
    "Group",
    "Image",
    "Label",
    "Network",
    "NoNewPrivileges",
    "Notify",
    "PodmanArgs",
    "PublishPort",
    "ReadOnly",
    KEY_REMAP_GID,
    KEY_REMAP_UID,
    KEY_REMAP_UID_SIZE,
    KEY_REMAP_USERS,
    "RunInit",
    "SeccompProfile",
    "SecurityLabelDisable",
    "SecurityLabelType",
    "Timezone",
    "User",
    "VolatileTmp",
    "Volume",
];

/// Only mixed and control-group stop podman and its children properly.
pub(crate) fn set_kill_mode(service: &mut UnitFile) -> Result<()> {
    match service.lookup_last(SERVICE_GROUP, "KillMode") {
        None => service.set(SERVICE_GROUP, "KillMode", "mixed"),
        Some("mixed") | Some("control-group") => {}
        Some(mode) => {
            return ValidationSnafu {
                what: format!("invalid KillMode '{}'", mode),
            }
            .fail()
        }
    }
    Ok(())
}

/// podman reports readiness through sd_notify, from conmon or the container
pub(crate) fn set_notify_service(service: &mut UnitFile) {
    service.set(SERVICE_GROUP, "Type", "notify");
    service.set(SERVICE_GROUP, "NotifyAccess", "all");

    /* the default identifier would be "podman" */
    if !service.has_key(SERVICE_GROUP, "SyslogIdentifier") {
        service.set(SERVICE_GROUP, "SyslogIdentifier", "%N");
    }
}

/// A short name is resolved by podman through the configured registries.
fn is_short_name(image: &str) -> bool {
    match image.split_once('/') {
        None => true,
        Some((domain, _)) => {
            !(domain.contains('.') || domain.contains(':') || domain == "localhost")
        }
    }
}

fn lookup_flag(unit: &UnitFile, key: &str) -> Result<bool> {
    Ok(unit.lookup_bool(GROUP, key)?.unwrap_or(false))
}

fn lookup_non_empty<'a>(unit: &'a UnitFile, key: &str) -> Option<&'a str> {
    unit.lookup_last(GROUP, key).filter(|v| !v.is_empty())
}

fn add_devices(unit: &UnitFile, cmd: &mut PodmanCmdline) -> Result<()> {
    for device in unit.lookup_all_strv(GROUP, "AddDevice")? {
        let device = match device.strip_prefix('-') {
            Some(optional) => {
                let host = optional.split(':').next().unwrap_or_default();
                if !Path::new(host).exists() {
                    log::debug!("Skipping missing optional device {}", host);
                    continue;
                }
                optional.to_string()
            }
            None => device,
        };
        cmd.add(format!("--device={}", device));
    }
    Ok(())
}

fn add_volumes(unit: &UnitFile, service: &mut UnitFile, cmd: &mut PodmanCmdline) {
    for volume in unit.lookup_all(GROUP, "Volume") {
        if volume.is_empty() {
            continue;
        }

        let parts: Vec<&str> = volume.splitn(3, ':').collect();
        let (mut source, dest, options) = match parts.as_slice() {
            [dest] => (String::new(), *dest, None),
            [source, dest] => (source.to_string(), *dest, None),
            [source, dest, options, ..] => (source.to_string(), *dest, Some(*options)),
            [] => continue,
        };

        if source.starts_with('/') {
            service.add(UNIT_GROUP, "RequiresMountsFor", &source);
        } else if let Some(name) = source.strip_suffix(".volume") {
            /* a volume managed by a .volume file of the same name */
            let volume_service = format!("{}-volume.service", name);
            service.add(UNIT_GROUP, "Requires", &volume_service);
            service.add(UNIT_GROUP, "After", &volume_service);
            source = format!("systemd-{}", name);
        }

        cmd.add("-v");
        match (source.is_empty(), options) {
            (true, _) => cmd.add(dest),
            (false, None) => cmd.add(format!("{}:{}", source, dest)),
            (false, Some(options)) => cmd.add(format!("{}:{}:{}", source, dest, options)),
        }
    }
}

fn add_ports(unit: &UnitFile, cmd: &mut PodmanCmdline) -> Result<()> {
    for port in unit.lookup_all(GROUP, "ExposeHostPort") {
        let port = port.trim();
        if !is_port_range(port) {
            return ValidationSnafu {
                what: format!("invalid port format '{}'", port),
            }
            .fail();
        }
        cmd.add(format!("--expose={}", port));
    }

    for spec in unit.lookup_all(GROUP, "PublishPort") {
        cmd.add(format!("-p={}", parse_publish_port(spec)?));
    }
    Ok(())
}

/// Fill `service` for a `.container` source and build its podman commands.
pub(crate) fn convert(
    source: &SourceUnit,
    service: &mut UnitFile,
    ctx: &GeneratorContext,
) -> Result<()> {
    let unit = &source.unit;

    let image = match lookup_non_empty(unit, "Image") {
        Some(image) => image,
        None => {
            return ValidationSnafu {
                what: "no Image key specified",
            }
            .fail()
        }
    };

    /* podman auto-update finds the unit through this */
    service.add(SERVICE_GROUP, "Environment", "PODMAN_SYSTEMD_UNIT=%n");
    set_kill_mode(service)?;
    service.add(UNIT_GROUP, "RequiresMountsFor", "%t/containers");
    set_notify_service(service);

    let global_args = unit.lookup_all_args(GROUP, "GlobalArgs")?;
    let mut cmd = PodmanCmdline::new(&ctx.podman, global_args.clone(), &["run"]);

    let name = lookup_non_empty(unit, "ContainerName").unwrap_or("systemd-%N");
    cmd.add(format!("--name={}", name));
    cmd.extend([CIDFILE_ARG, "--replace", "--rm", "-d", "--log-driver", "passthrough"]);

    if let Some(tz) = lookup_non_empty(unit, "Timezone") {
        cmd.add(format!("--tz={}", tz));
    }

    for network in unit.lookup_all(GROUP, "Network") {
        if !network.is_empty() {
            cmd.add(format!("--network={}", network));
        }
    }

    if lookup_flag(unit, "RunInit")? {
        cmd.add("--init");
    }

    if lookup_flag(unit, "Notify")? {
        cmd.add("--sdnotify=container");
    } else {
        cmd.add("--sdnotify=conmon");
    }

    if lookup_flag(unit, "NoNewPrivileges")? {
        cmd.add("--security-opt=no-new-privileges");
    }

    if let Some(profile) = lookup_non_empty(unit, "SeccompProfile") {
        cmd.extend(["--security-opt".to_string(), format!("seccomp={}", profile)]);
    }

    if lookup_flag(unit, "SecurityLabelDisable")? {
        cmd.extend(["--security-opt", "label=disable"]);
    }
    if let Some(label_type) = lookup_non_empty(unit, "SecurityLabelType") {
        cmd.extend(["--security-opt".to_string(), format!("label=type:{}", label_type)]);
    }

    add_devices(unit, &mut cmd)?;

    for cap in unit.lookup_all_strv(GROUP, "DropCapability")? {
        cmd.add(format!("--cap-drop={}", cap.to_lowercase()));
    }
    for cap in unit.lookup_all_strv(GROUP, "AddCapability")? {
        cmd.add(format!("--cap-add={}", cap.to_lowercase()));
    }

    let read_only = lookup_flag(unit, "ReadOnly")?;
    let volatile_tmp = lookup_flag(unit, "VolatileTmp")?;
    if read_only {
        cmd.add("--read-only");
    }
    match (read_only, volatile_tmp) {
        /* --read-only already mounts a tmpfs on /tmp */
        (false, true) => cmd.extend(["--tmpfs", "/tmp:rw,size=512M,mode=1777"]),
        (true, false) => cmd.add("--read-only-tmpfs=false"),
        _ => {}
    }

    match (lookup_non_empty(unit, "User"), lookup_non_empty(unit, "Group")) {
        (Some(user), Some(group)) => {
            cmd.extend(["--user".to_string(), format!("{}:{}", user, group)])
        }
        (Some(user), None) => cmd.extend(["--user", user]),
        (None, Some(_)) => {
            return ValidationSnafu {
                what: "Group set without User",
            }
            .fail()
        }
        (None, None) => {}
    }

    handle_user_remap(unit, GROUP, &mut cmd, ctx.is_user, true)?;

    add_volumes(unit, service, &mut cmd);
    add_ports(unit, &mut cmd)?;

    cmd.add_key_vals("--env", &unit.lookup_all_key_val(GROUP, "Environment")?);
    for file in unit.lookup_all_args(GROUP, "EnvironmentFile")? {
        cmd.extend(["--env-file".to_string(), file]);
    }
    cmd.add_key_vals("--label", &unit.lookup_all_key_val(GROUP, "Label")?);
    cmd.add_key_vals("--annotation", &unit.lookup_all_key_val(GROUP, "Annotation")?);

    cmd.extend(unit.lookup_all_args(GROUP, "PodmanArgs")?);

    if is_short_name(image) {
        log::warn!(
            "{}: image \"{}\" is a short name, prefer a fully qualified image name",
            source.path.display(),
            image
        );
    }
    cmd.add(image);

    if let Some(exec) = unit.lookup_last_args(GROUP, "Exec")? {
        cmd.extend(exec);
    }

    service.add_cmdline(SERVICE_GROUP, "ExecStart", cmd.args());

    /* -i: a container that is already gone is not an error */
    let mut stop = PodmanCmdline::new(&ctx.podman, global_args, &["rm"]);
    stop.extend(["-f", "-i", CIDFILE_ARG]);
    service.add_cmdline(SERVICE_GROUP, "ExecStop", stop.args());

    /* "-" is read by systemd, it must stay outside of any quoting */
    let stop_post = format!("-{}", escape_words(stop.args()));
    service.add(SERVICE_GROUP, "ExecStopPost", &stop_post);
    let rm_post = format!("-{}", escape_words(&["rm", "-f", CID_FILE]));
    service.add(SERVICE_GROUP, "ExecStopPost", &rm_post);

    Ok(())
}
