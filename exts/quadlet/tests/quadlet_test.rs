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

mod common;

use std::fs;

macro_rules! quadlet_case {
    ($($test:ident => $file:expr,)*) => {
        $(
            #[test]
            fn $test() {
                common::run_case($file);
            }
        )*
    };
}

quadlet_case! {
    container_basic => "basic.container",
    container_annotation => "annotation.container",
    container_basepodman => "basepodman.container",
    container_capabilities => "capabilities.container",
    container_capabilities2 => "capabilities2.container",
    container_devices => "devices.container",
    container_env => "env.container",
    container_envfile => "envfile.container",
    container_escapes => "escapes.container",
    container_exec => "exec.container",
    container_group_nouser => "group-nouser.container",
    container_image => "image.container",
    container_init => "init.container",
    container_install => "install.container",
    container_label => "label.container",
    container_name => "name.container",
    container_network => "network.container",
    container_noimage => "noimage.container",
    container_notify => "notify.container",
    container_other_sections => "other-sections.container",
    container_podmanargs => "podmanargs.container",
    container_ports => "ports.container",
    container_ports_ipv6 => "ports_ipv6.container",
    container_readonly_notmpfs => "readonly-notmpfs.container",
    container_readwrite => "readwrite.container",
    container_readwrite_notmpfs => "readwrite-notmpfs.container",
    container_remap_auto => "remap-auto.container",
    container_remap_auto2 => "remap-auto2.container",
    container_remap_manual => "remap-manual.container",
    container_seccomp => "seccomp.container",
    container_security_label => "security-label.container",
    container_shortname => "shortname.container",
    container_timezone => "timezone.container",
    container_unbalanced => "unbalanced.container",
    container_unbalanced_install => "unbalanced-install.container",
    container_unknown_key => "unknown-key.container",
    container_user => "user.container",
    container_volume => "volume.container",
    volume_basic => "basic.volume",
    volume_device => "device.volume",
    volume_label => "label.volume",
    volume_uid => "uid.volume",
    kube_basic => "basic.kube",
}

/* a broken source unit must not keep the others from being generated */
#[test]
fn batch_failure_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let unit_dir = tmp.path().join("quadlet");
    let out_dir = tmp.path().join("generated");
    fs::create_dir_all(&unit_dir).unwrap();
    fs::create_dir_all(&out_dir).unwrap();
    for name in [
        "basic.container",
        "noimage.container",
        "unbalanced.container",
        "basic.volume",
    ] {
        fs::copy(common::testdata(name), unit_dir.join(name)).unwrap();
    }
    fs::rename(unit_dir.join("basic.volume"), unit_dir.join("data.volume")).unwrap();

    let output = common::run_quadlet(&unit_dir, &out_dir);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("noimage.container"));
    assert!(out_dir.join("basic.service").exists());
    assert!(out_dir.join("data-volume.service").exists());
    assert!(!out_dir.join("noimage.service").exists());
    assert!(stderr.contains("unbalanced.container"));
    assert!(!out_dir.join("unbalanced.service").exists());
}

#[test]
fn missing_output_dir() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_quadlet"))
        .arg("-no-kmsg-log")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
