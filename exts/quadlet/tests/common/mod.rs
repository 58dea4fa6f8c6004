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

use libtests::QuadletTestCase;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(name)
}

/// Run the generator over the source units in `unit_dir`, writing into `out_dir`.
pub fn run_quadlet(unit_dir: &Path, out_dir: &Path) -> Output {
    let config = unit_dir.join("quadlet.toml");
    Command::new(env!("CARGO_BIN_EXE_quadlet"))
        .arg("-no-kmsg-log")
        .arg("--config")
        .arg(&config)
        .arg(out_dir)
        .env("QUADLET_UNIT_DIRS", unit_dir)
        .env_remove("PODMAN")
        .output()
        .expect("failed to execute quadlet!")
}

pub fn run_case(name: &str) {
    let case = QuadletTestCase::load(&testdata(name)).expect("failed to load test case!");

    let tmp = tempfile::tempdir().unwrap();
    let unit_dir = tmp.path().join("quadlet");
    let out_dir = tmp.path().join("generated");
    fs::create_dir_all(&unit_dir).unwrap();
    fs::create_dir_all(&out_dir).unwrap();
    fs::write(unit_dir.join(&case.file_name), &case.data).unwrap();

    let output = run_quadlet(&unit_dir, &out_dir);
    let stderr = String::from_utf8_lossy(&output.stderr);
    println!("[{}]: {}", name, output.status);
    if !stderr.is_empty() {
        println!("[{}]: stderr:\n{}", name, stderr);
    }

    assert_eq!(output.status.success(), !case.expect_fail());
    if let Err(e) = case.check(&out_dir, &stderr) {
        if let Ok(text) = fs::read_to_string(out_dir.join(&case.service_name)) {
            println!("[{}]: generated {}:\n{}", name, case.service_name, text);
        }
        panic!("[{}]: {}", name, e);
    }
}
