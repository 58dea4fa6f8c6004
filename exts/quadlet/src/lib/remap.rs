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

//! User namespace remapping shared by containers and kube.
use crate::cmdline::PodmanCmdline;
use crate::error::{Result, ValidationSnafu};
use unit_parser::UnitFile;

pub(crate) const KEY_REMAP_USERS: &str = "RemapUsers";
pub(crate) const KEY_REMAP_UID: &str = "RemapUid";
pub(crate) const KEY_REMAP_GID: &str = "RemapGid";
pub(crate) const KEY_REMAP_UID_SIZE: &str = "RemapUidSize";

/// Add the `--userns`/`--uidmap`/`--gidmap` arguments selected by
/// RemapUsers. `manual` mapping is only available where podman takes
/// explicit maps.
pub(crate) fn handle_user_remap(
    unit: &UnitFile,
    group: &str,
    cmd: &mut PodmanCmdline,
    is_user: bool,
    support_manual: bool,
) -> Result<()> {
    let uid_maps = unit.lookup_all_strv(group, KEY_REMAP_UID)?;
    let gid_maps = unit.lookup_all_strv(group, KEY_REMAP_GID)?;
    let remap = unit.lookup_last(group, KEY_REMAP_USERS).unwrap_or_default();

    match remap {
        "" => {
            if !uid_maps.is_empty() {
                return ValidationSnafu {
                    what: "RemapUid set without RemapUsers",
                }
                .fail();
            }
            if !gid_maps.is_empty() {
                return ValidationSnafu {
                    what: "RemapGid set without RemapUsers",
                }
                .fail();
            }
        }
        "manual" => {
            if !support_manual {
                return ValidationSnafu {
                    what: "RemapUsers=manual is not supported",
                }
                .fail();
            }
            for map in uid_maps {
                cmd.add(format!("--uidmap={}", map));
            }
            for map in gid_maps {
                cmd.add(format!("--gidmap={}", map));
            }
        }
        "auto" => {
            let mut opts: Vec<String> = uid_maps
                .iter()
                .map(|m| format!("uidmapping={}", m))
                .chain(gid_maps.iter().map(|m| format!("gidmapping={}", m)))
                .collect();
            if let Some(size) = unit.lookup_u32(group, KEY_REMAP_UID_SIZE)? {
                if size > 0 {
                    opts.push(format!("size={}", size));
                }
            }

            if opts.is_empty() {
                cmd.add("--userns=auto");
            } else {
                cmd.add(format!("--userns=auto:{}", opts.join(",")));
            }
        }
        "keep-id" => {
            if !is_user {
                return ValidationSnafu {
                    what: "RemapUsers=keep-id is unsupported for system units",
                }
                .fail();
            }
            cmd.add("--userns=keep-id");
        }
        other => {
            return ValidationSnafu {
                what: format!("unsupported RemapUsers option '{}'", other),
            }
            .fail()
        }
    }

    Ok(())
}
