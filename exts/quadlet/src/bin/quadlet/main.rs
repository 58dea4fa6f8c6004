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

//! quadlet: systemd generator turning `.container`, `.volume` and `.kube`
//! files into podman services.
use clap::Parser;
use libquadlet::config::{Conf, DEFAULT_CONFIG};
use libquadlet::lookup::{find_source_units, unit_search_dirs};
use libquadlet::{Generator, GeneratorContext};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::exit;

/// parse program arguments
#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// print debug information
    #[clap(short('v'), long, required = false)]
    verbose: bool,

    /// generate units for the user manager
    #[clap(long, required = false)]
    user: bool,

    /// print the generated units instead of writing them
    #[clap(long, required = false)]
    dryrun: bool,

    /// log to stderr instead of the kernel log buffer
    #[clap(long, required = false)]
    no_kmsg_log: bool,

    /// configuration file
    #[clap(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// normal, early and late output directories, only the first is used
    #[clap(max_values = 3)]
    output_dirs: Vec<PathBuf>,
}

/* systemd passes long options with a single dash */
fn normalize_args(args: &[String]) -> Vec<String> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            if i > 0 && arg.len() > 2 && arg.starts_with('-') && !arg.starts_with("--") {
                format!("-{}", arg)
            } else {
                arg.clone()
            }
        })
        .collect()
}

/* installed as the user generator under a name containing "user" */
fn invoked_as_user(argv0: Option<&String>) -> bool {
    argv0
        .and_then(|a| Path::new(a).file_name())
        .map(|name| name.to_string_lossy().contains("user"))
        .unwrap_or(false)
}

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    let args = Args::parse_from(normalize_args(&argv));
    let is_user = args.user || invoked_as_user(argv.first());

    let target = if args.no_kmsg_log || args.dryrun {
        "console"
    } else {
        "kmsg"
    };
    log::init_log("quadlet", LevelFilter::Info, vec![target]);

    let conf = Conf::load_from(&args.config);
    log::set_max_level(if args.verbose {
        LevelFilter::Debug
    } else {
        conf.level()
    });

    let podman = std::env::var("PODMAN")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| conf.podman.clone());

    let output_dir = match (args.dryrun, args.output_dirs.first()) {
        (true, _) => None,
        (false, Some(dir)) => Some(dir.clone()),
        (false, None) => {
            log::error!("Missing output directory argument");
            exit(1);
        }
    };

    if let Some(dir) = &output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::error!("Can't create directory {}: {}", dir.display(), e);
            exit(1);
        }
    }

    let dirs = unit_search_dirs(is_user, conf.unit_dirs.as_deref());
    let sources = find_source_units(&dirs);
    if sources.is_empty() {
        log::debug!("No files to convert in {:?}", dirs);
    }

    let ctx = GeneratorContext { podman, is_user };
    let report = Generator::new(ctx, output_dir).run(&sources);
    log::debug!(
        "Generated {} services, {} failures",
        report.generated.len(),
        report.failed.len()
    );

    exit(if report.success() { 0 } else { 1 });
}
