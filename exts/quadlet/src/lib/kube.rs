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

//! `.kube` files: services playing a kubernetes yaml with `podman kube play`.
use crate::cmdline::PodmanCmdline;
use crate::container::{set_kill_mode, set_notify_service};
use crate::error::{Result, ValidationSnafu};
use crate::generator::{GeneratorContext, SourceUnit};
use crate::ports::parse_publish_port;
use crate::remap::{
    handle_user_remap, KEY_REMAP_GID, KEY_REMAP_UID, KEY_REMAP_UID_SIZE, KEY_REMAP_USERS,
};
use crate::{SERVICE_GROUP, UNIT_GROUP};
use unit_parser::UnitFile;

const GROUP: &str = "Kube";

pub(crate) const SUPPORTED_KEYS: &[&str] = &[
    "ConfigMap",
    "GlobalArgs",
    "Network",
    "PodmanArgs",
    "PublishPort",
    KEY_REMAP_GID,
    KEY_REMAP_UID,
    KEY_REMAP_UID_SIZE,
    KEY_REMAP_USERS,
    "Yaml",
];

/// Fill `service` for a `.kube` source and build its podman commands.
pub(crate) fn convert(
    source: &SourceUnit,
    service: &mut UnitFile,
    ctx: &GeneratorContext,
) -> Result<()> {
    let unit = &source.unit;

    let yaml = match unit.lookup_last(GROUP, "Yaml").filter(|y| !y.is_empty()) {
        Some(yaml) => source.absolute_path(yaml),
        None => {
            return ValidationSnafu {
                what: "no Yaml key specified",
            }
            .fail()
        }
    };

    set_kill_mode(service)?;
    service.add(SERVICE_GROUP, "Environment", "PODMAN_SYSTEMD_UNIT=%n");
    service.add(UNIT_GROUP, "RequiresMountsFor", "%t/containers");
    set_notify_service(service);

    let global_args = unit.lookup_all_args(GROUP, "GlobalArgs")?;
    let mut cmd = PodmanCmdline::new(&ctx.podman, global_args.clone(), &["kube", "play"]);
    cmd.extend([
        "--replace",
        "--service-container=true",
        "--log-driver",
        "passthrough",
    ]);

    handle_user_remap(unit, GROUP, &mut cmd, ctx.is_user, false)?;

    for network in unit.lookup_all(GROUP, "Network") {
        if !network.is_empty() {
            cmd.add(format!("--network={}", network));
        }
    }

    for config_map in unit.lookup_all_strv(GROUP, "ConfigMap")? {
        cmd.extend(["--configmap".to_string(), source.absolute_path(&config_map)]);
    }

    for spec in unit.lookup_all(GROUP, "PublishPort") {
        cmd.add(format!("--publish={}", parse_publish_port(spec)?));
    }

    cmd.extend(unit.lookup_all_args(GROUP, "PodmanArgs")?);
    cmd.add(yaml.clone());
    service.add_cmdline(SERVICE_GROUP, "ExecStart", cmd.args());

    let mut stop = PodmanCmdline::new(&ctx.podman, global_args, &["kube", "down"]);
    stop.add(yaml);
    service.add_cmdline(SERVICE_GROUP, "ExecStop", stop.args());

    Ok(())
}
