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

//! Ordered builder of podman command lines.
use std::collections::BTreeMap;

/// A podman invocation. Arguments are kept in the order they were added,
/// later flags may override earlier ones when podman runs the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodmanCmdline {
    args: Vec<String>,
}

impl PodmanCmdline {
    /// Start a command line: the podman binary, the global arguments and the
    /// words of the subcommand.
    pub fn new(podman: &str, global_args: Vec<String>, verb: &[&str]) -> Self {
        let mut cmd = PodmanCmdline {
            args: vec![podman.to_string()],
        };
        cmd.extend(global_args);
        cmd.extend(verb.iter().copied());
        cmd
    }

    /// add one argument
    pub fn add<S: Into<String>>(&mut self, arg: S) {
        self.args.push(arg.into());
    }

    /// add arguments in order
    pub fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    /// add `flag KEY=VALUE` for every entry, sorted by key
    pub fn add_key_vals(&mut self, flag: &str, map: &BTreeMap<String, String>) {
        for (k, v) in map {
            self.add(flag);
            self.add(format!("{}={}", k, v));
        }
    }

    /// the arguments, starting with the podman binary
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmdline_order() {
        let mut cmd = PodmanCmdline::new(
            "/usr/bin/podman",
            vec!["--log-level=debug".to_string()],
            &["volume", "create"],
        );
        cmd.add("--ignore");
        cmd.extend(["--opt", "copy"]);

        let mut labels = BTreeMap::new();
        labels.insert("b".to_string(), "2".to_string());
        labels.insert("a".to_string(), "1 2".to_string());
        cmd.add_key_vals("--label", &labels);

        assert_eq!(
            cmd.args(),
            &[
                "/usr/bin/podman",
                "--log-level=debug",
                "volume",
                "create",
                "--ignore",
                "--opt",
                "copy",
                "--label",
                "a=1 2",
                "--label",
                "b=2"
            ]
        );
    }
}
