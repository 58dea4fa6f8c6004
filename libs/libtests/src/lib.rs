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

//! This crate provides the checks of the quadlet test cases.
//!
//! A test case is a source file carrying its expectations in `##` comment
//! lines, one assertion per line, negated with a leading `!`:
//!
//! ```text
//! ## assert-podman-final-args localhost/imagename
//! ## !assert-key-is Unit RequiresMountsFor /var/lib
//! ```
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use unit_parser::{split_words, UnitFile};

/// A source file with the assertions embedded in it.
#[derive(Debug, Clone)]
pub struct QuadletTestCase {
    /// file name of the source
    pub file_name: String,
    /// content of the source
    pub data: String,
    /// name of the service the source converts to
    pub service_name: String,
    checks: Vec<Vec<String>>,
}

fn service_name(file_name: &str) -> String {
    let (base, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    if ext == "volume" {
        format!("{}-volume.service", base)
    } else {
        format!("{}.service", base)
    }
}

/// true if `sublist` is found in `full` starting at `pos`
fn match_sublist_at(full: &[String], pos: usize, sublist: &[String]) -> bool {
    full.len() >= pos + sublist.len() && full[pos..pos + sublist.len()] == *sublist
}

fn find_sublist(full: &[String], sublist: &[String]) -> Option<usize> {
    if sublist.is_empty() || sublist.len() > full.len() {
        return None;
    }
    (0..=full.len() - sublist.len()).find(|&i| match_sublist_at(full, i, sublist))
}

impl QuadletTestCase {
    /// Read a test case and its assertions.
    pub fn load(path: &Path) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "no file name"))?;

        let mut checks = Vec::new();
        for line in data.lines() {
            if let Some(check) = line.strip_prefix("##") {
                let words = split_words(check)
                    .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
                if !words.is_empty() {
                    checks.push(words);
                }
            }
        }

        Ok(QuadletTestCase {
            service_name: service_name(&file_name),
            file_name,
            data,
            checks,
        })
    }

    /// the conversion of this case is expected to fail
    pub fn expect_fail(&self) -> bool {
        self.checks.iter().any(|c| c[0] == "assert-failed")
    }

    fn podman_args(unit: &UnitFile, key: &str) -> Vec<String> {
        unit.lookup_last_args("Service", key)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn assert_key_is(unit: &UnitFile, args: &[String]) -> bool {
        if args.len() < 2 {
            return false;
        }
        let real = unit.lookup_all(&args[0], &args[1]);
        real.len() == args.len() - 2 && real.iter().zip(&args[2..]).all(|(r, v)| r == v)
    }

    fn assert_key_contains(unit: &UnitFile, args: &[String]) -> bool {
        match args {
            [group, key, value, ..] => unit
                .lookup_last(group, key)
                .map_or(false, |real| real.contains(value.as_str())),
            _ => false,
        }
    }

    fn assert_podman_args(unit: &UnitFile, key: &str, args: &[String]) -> bool {
        find_sublist(&Self::podman_args(unit, key), args).is_some()
    }

    fn assert_podman_final_args(unit: &UnitFile, key: &str, args: &[String]) -> bool {
        let real = Self::podman_args(unit, key);
        real.len() >= args.len() && match_sublist_at(&real, real.len() - args.len(), args)
    }

    fn assert_symlink(dir: &Path, args: &[String]) -> bool {
        match args {
            [link, target, ..] => fs::read_link(dir.join(link))
                .map_or(false, |real| real == PathBuf::from(target)),
            _ => false,
        }
    }

    fn do_assert(
        &self,
        check: &[String],
        unit: Option<&UnitFile>,
        dir: &Path,
        stderr: &str,
    ) -> Result<(), String> {
        /* \n and \t are written escaped in the test cases */
        let args: Vec<String> = check[1..]
            .iter()
            .map(|a| a.replace("\\n", "\n").replace("\\t", "\t"))
            .collect();
        let (invert, op) = match check[0].strip_prefix('!') {
            Some(op) => (true, op),
            None => (false, check[0].as_str()),
        };

        let ok = match (op, unit) {
            ("assert-failed", _) => true,
            ("assert-stderr-contains", _) => args.first().map_or(false, |s| stderr.contains(s.as_str())),
            ("assert-symlink", _) => Self::assert_symlink(dir, &args),
            ("assert-key-is", Some(unit)) => Self::assert_key_is(unit, &args),
            ("assert-key-contains", Some(unit)) => Self::assert_key_contains(unit, &args),
            ("assert-podman-args", Some(unit)) => Self::assert_podman_args(unit, "ExecStart", &args),
            ("assert-podman-final-args", Some(unit)) => {
                Self::assert_podman_final_args(unit, "ExecStart", &args)
            }
            ("assert-podman-stop-args", Some(unit)) => Self::assert_podman_args(unit, "ExecStop", &args),
            ("assert-podman-stop-final-args", Some(unit)) => {
                Self::assert_podman_final_args(unit, "ExecStop", &args)
            }
            (
                "assert-key-is"
                | "assert-key-contains"
                | "assert-podman-args"
                | "assert-podman-final-args"
                | "assert-podman-stop-args"
                | "assert-podman-stop-final-args",
                None,
            ) => false,
            (op, _) => return Err(format!("Unsupported assertion {}", op)),
        };

        if ok != invert {
            return Ok(());
        }

        let content = unit.map_or_else(|| "(nil)".to_string(), |u| u.to_string());
        Err(format!(
            "Failed assertion for {}: {}\n\n{}",
            self.service_name,
            check.join(" "),
            content
        ))
    }

    /// Check the output of a conversion: the service written to `dir` and
    /// what was printed to `stderr`.
    pub fn check(&self, dir: &Path, stderr: &str) -> Result<(), String> {
        let file = dir.join(&self.service_name);

        let unit = if self.expect_fail() {
            if file.exists() {
                return Err(format!("{} exists, but is expected to fail", self.service_name));
            }
            None
        } else {
            Some(UnitFile::load(&file).map_err(|e| e.to_string())?)
        };

        for check in self.checks.iter() {
            self.do_assert(check, unit.as_ref(), dir, stderr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_service_name() {
        assert_eq!(service_name("basic.container"), "basic.service");
        assert_eq!(service_name("basic.kube"), "basic.service");
        assert_eq!(service_name("basic.volume"), "basic-volume.service");
    }

    #[test]
    fn test_sublist() {
        let full = strings(&["podman", "run", "--rm", "image"]);
        assert_eq!(find_sublist(&full, &strings(&["run", "--rm"])), Some(1));
        assert_eq!(find_sublist(&full, &strings(&["--rm", "run"])), None);
        assert_eq!(find_sublist(&full, &[]), None);
        assert!(match_sublist_at(&full, 2, &strings(&["--rm", "image"])));
        assert!(!match_sublist_at(&full, 3, &strings(&["image", "x"])));
    }

    #[test]
    fn test_check() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("basic.container");
        fs::write(
            &path,
            "## assert-podman-final-args image \"a\\tb\"\n## !assert-podman-args --user\n## assert-key-is Unit After a.service b.service\n## assert-key-contains Service ExecStart run\n## assert-stderr-contains warning\n[Container]\nImage=image\n",
        )
        .unwrap();
        fs::write(
            out.path().join("basic.service"),
            "[Unit]\nAfter=a.service\nAfter=b.service\n\n[Service]\nExecStart=podman run image \"a\\tb\"\n",
        )
        .unwrap();

        let case = QuadletTestCase::load(&path).unwrap();
        assert!(!case.expect_fail());
        case.check(out.path(), "a warning").unwrap();
        assert!(case.check(out.path(), "").is_err());
    }

    #[test]
    fn test_check_failed() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("noimage.container");
        fs::write(
            &path,
            "## assert-failed\n## assert-stderr-contains \"no Image\"\n[Container]\n",
        )
        .unwrap();

        let case = QuadletTestCase::load(&path).unwrap();
        assert!(case.expect_fail());
        case.check(out.path(), "noimage.container: no Image key specified")
            .unwrap();

        fs::write(out.path().join("noimage.service"), "[Service]\n").unwrap();
        assert!(case.check(out.path(), "no Image").is_err());
    }

    #[test]
    fn test_unsupported_assertion() {
        let src = tempfile::tempdir().unwrap();
        let path = src.path().join("x.volume");
        fs::write(&path, "## assert-bogus\n[Volume]\n").unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(out.path().join("x-volume.service"), "[Service]\n").unwrap();

        let case = QuadletTestCase::load(&path).unwrap();
        assert_eq!(case.service_name, "x-volume.service");
        assert!(case.check(out.path(), "").is_err());
    }
}
