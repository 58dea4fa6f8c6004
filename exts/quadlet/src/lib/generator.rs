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

//! Conversion of source files into services and the batch that writes
//! them to the generator output directory.
use crate::error::{Result, ValidationSnafu, WriteSnafu};
use crate::kind::UnitKind;
use crate::{container, kube, volume, INSTALL_GROUP, UNIT_GROUP};
use basic::fs::{mkdir_parents, symlink, write_string_file_atomic};
use snafu::ResultExt;
use std::path::{Path, PathBuf};
use unit_parser::UnitFile;

/// first line of every written service
pub const GENERATED_HEADER: &str = "# Automatically generated by quadlet";

/// Settings shared by every conversion of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorContext {
    /// podman binary used in the generated command lines
    pub podman: String,
    /// generating units for a user manager instead of the system
    pub is_user: bool,
}

/// A source file with its parsed content.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// where the file was read from
    pub path: PathBuf,
    /// selected by the extension
    pub kind: UnitKind,
    /// parsed content
    pub unit: UnitFile,
}

impl SourceUnit {
    /// Wrap already parsed content, `path` selects the kind.
    pub fn new(path: &Path, unit: UnitFile) -> Result<Self> {
        let kind = match UnitKind::from_path(path) {
            Some(kind) => kind,
            None => {
                return ValidationSnafu {
                    what: format!("unsupported file type '{}'", path.display()),
                }
                .fail()
            }
        };

        Ok(SourceUnit {
            path: path.to_path_buf(),
            kind,
            unit,
        })
    }

    /// Read and parse a source file.
    pub fn load(path: &Path) -> Result<Self> {
        let unit = UnitFile::load(path)?;
        Self::new(path, unit)
    }

    /// file name without directories
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// name of the generated service
    pub fn service_name(&self) -> String {
        self.kind.service_name(&self.file_name())
    }

    /// relative paths in keys are relative to the directory of the file
    pub(crate) fn absolute_path(&self, path: &str) -> String {
        if Path::new(path).is_absolute() {
            return path.to_string();
        }
        self.path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(path)
            .to_string_lossy()
            .to_string()
    }
}

/// The result of converting one source file.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// file name of the service
    pub name: String,
    /// content of the service
    pub unit: UnitFile,
    /// symlinks to create, relative to the output directory
    pub symlinks: Vec<PathBuf>,
}

impl GeneratedUnit {
    /// the text written to the service file
    pub fn to_text(&self) -> String {
        format!("{}\n{}", GENERATED_HEADER, self.unit)
    }
}

fn check_unknown_keys(unit: &UnitFile, group: &str, supported: &[&str]) -> Result<()> {
    let group_keys = match unit.group(group) {
        Some(g) => g.keys(),
        None => return Ok(()),
    };

    match group_keys.into_iter().find(|k| !supported.contains(k)) {
        Some(key) => ValidationSnafu {
            what: format!("unsupported key '{}' in group '{}'", key, group),
        }
        .fail(),
        None => Ok(()),
    }
}

/* Only unit names are accepted, paths would point out of the output tree. */
fn install_symlinks(service: &UnitFile, name: &str) -> Result<Vec<PathBuf>> {
    let mut symlinks = Vec::new();

    for alias in service.lookup_all_strv(INSTALL_GROUP, "Alias")? {
        if alias.contains('/') {
            log::warn!("Ignoring Alias={} of {}: not a unit name", alias, name);
            continue;
        }
        symlinks.push(PathBuf::from(alias));
    }

    for (key, suffix) in [("WantedBy", "wants"), ("RequiredBy", "requires")] {
        for target in service.lookup_all_strv(INSTALL_GROUP, key)? {
            if target.contains('/') {
                log::warn!("Ignoring {}={} of {}: not a unit name", key, target, name);
                continue;
            }
            symlinks.push(PathBuf::from(format!("{}.{}", target, suffix)).join(name));
        }
    }

    Ok(symlinks)
}

/// Convert one source file into a service.
///
/// Groups other than the kind's own group are copied unchanged, the own
/// group is kept as `X-<group>` so systemd ignores it.
pub fn generate(source: &SourceUnit, ctx: &GeneratorContext) -> Result<GeneratedUnit> {
    let kind = source.kind;
    let supported = match kind {
        UnitKind::Container => container::SUPPORTED_KEYS,
        UnitKind::Volume => volume::SUPPORTED_KEYS,
        UnitKind::Kube => kube::SUPPORTED_KEYS,
    };
    check_unknown_keys(&source.unit, kind.group(), supported)?;

    let mut service = source.unit.clone();
    service.rename_group(kind.group(), kind.x_group());

    match kind {
        UnitKind::Container => {
            service.add(UNIT_GROUP, "SourcePath", &source.path.to_string_lossy());
            container::convert(source, &mut service, ctx)?;
        }
        UnitKind::Volume => volume::convert(source, &mut service, ctx)?,
        UnitKind::Kube => {
            service.add(UNIT_GROUP, "SourcePath", &source.path.to_string_lossy());
            kube::convert(source, &mut service, ctx)?;
        }
    }

    let name = source.service_name();
    let symlinks = install_symlinks(&service, &name)?;

    Ok(GeneratedUnit {
        name,
        unit: service,
        symlinks,
    })
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// names of the written services
    pub generated: Vec<String>,
    /// source files that could not be converted or written
    pub failed: Vec<PathBuf>,
}

impl BatchReport {
    /// true if every file was converted
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Converts source files and writes the services.
#[derive(Debug)]
pub struct Generator {
    ctx: GeneratorContext,
    /// none prints the services to stdout instead
    output_dir: Option<PathBuf>,
}

impl Generator {
    /// create a generator writing to `output_dir`, or printing when none
    pub fn new(ctx: GeneratorContext, output_dir: Option<PathBuf>) -> Self {
        Generator { ctx, output_dir }
    }

    fn write(&self, dir: &Path, generated: &GeneratedUnit) -> Result<()> {
        let path = dir.join(&generated.name);
        log::debug!("Writing {}", path.display());
        write_string_file_atomic(&path, &generated.to_text(), 0o644)
            .context(WriteSnafu { path: &path })?;

        for link in generated.symlinks.iter() {
            let link = dir.join(link);
            mkdir_parents(&link).context(WriteSnafu { path: &link })?;
            symlink(&path, &link, true).context(WriteSnafu { path: &link })?;
        }

        Ok(())
    }

    fn process(&self, path: &Path) -> Result<String> {
        let source = SourceUnit::load(path)?;
        let generated = generate(&source, &self.ctx)?;

        match &self.output_dir {
            Some(dir) => self.write(dir, &generated)?,
            None => print!("---{}---\n{}", generated.name, generated.to_text()),
        }

        Ok(generated.name)
    }

    /// Convert every file independently, a failure is logged with the path
    /// of its source and does not stop the batch.
    pub fn run(&self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();

        for path in paths {
            log::debug!("Loading source unit file {}", path.display());
            match self.process(path) {
                Ok(name) => report.generated.push(name),
                Err(e) => {
                    log::error!("{}: {}", path.display(), e);
                    report.failed.push(path.clone());
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;

    fn ctx() -> GeneratorContext {
        GeneratorContext {
            podman: "/usr/bin/podman".to_string(),
            is_user: false,
        }
    }

    fn source(name: &str, content: &str) -> SourceUnit {
        let path = PathBuf::from("/etc/containers/systemd").join(name);
        SourceUnit::new(&path, UnitFile::parse(content).unwrap()).unwrap()
    }

    fn exec_args(generated: &GeneratedUnit, key: &str) -> Vec<String> {
        generated
            .unit
            .lookup_last_args("Service", key)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_basic_container() {
        let src = source(
            "basic.container",
            "[Unit]\nDescription=test\n[Container]\nImage=localhost/imagename\n",
        );
        let generated = generate(&src, &ctx()).unwrap();
        let unit = &generated.unit;

        assert_eq!(generated.name, "basic.service");
        assert!(generated.symlinks.is_empty());
        assert!(!unit.has_group("Container"));
        assert_eq!(
            unit.lookup_last("X-Container", "Image"),
            Some("localhost/imagename")
        );
        assert_eq!(unit.lookup_last("Unit", "Description"), Some("test"));
        assert_eq!(
            unit.lookup_last("Unit", "SourcePath"),
            Some("/etc/containers/systemd/basic.container")
        );
        assert_eq!(unit.lookup_last("Service", "KillMode"), Some("mixed"));
        assert_eq!(unit.lookup_last("Service", "Type"), Some("notify"));
        assert_eq!(
            unit.lookup_all("Service", "Environment"),
            vec!["PODMAN_SYSTEMD_UNIT=%n"]
        );
        assert_eq!(
            exec_args(&generated, "ExecStart"),
            vec![
                "/usr/bin/podman",
                "run",
                "--name=systemd-%N",
                "--cidfile=%t/%N.cid",
                "--replace",
                "--rm",
                "-d",
                "--log-driver",
                "passthrough",
                "--sdnotify=conmon",
                "localhost/imagename"
            ]
        );
        assert_eq!(
            exec_args(&generated, "ExecStop"),
            vec!["/usr/bin/podman", "rm", "-f", "-i", "--cidfile=%t/%N.cid"]
        );
        assert_eq!(
            unit.lookup_all("Service", "ExecStopPost"),
            vec![
                "-/usr/bin/podman rm -f -i --cidfile=%t/%N.cid",
                "-rm -f %t/%N.cid"
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let content = "[Container]\nImage=localhost/imagename\nEnvironment=B=2 A=1\nLabel=x=y\n";
        let a = generate(&source("a.container", content), &ctx()).unwrap();
        let b = generate(&source("a.container", content), &ctx()).unwrap();
        assert_eq!(a.to_text(), b.to_text());
        assert!(a.to_text().starts_with(GENERATED_HEADER));
    }

    #[test]
    fn test_podman_args_before_image() {
        let src = source(
            "args.container",
            "[Container]\nPodmanArgs=--foo \"--bar baz\"\nImage=localhost/imagename\nExec=/bin/sh -c true\nPublishPort=80\nPodmanArgs=--last\n",
        );
        let args = exec_args(&generate(&src, &ctx()).unwrap(), "ExecStart");
        let tail: Vec<&str> = args[args.len() - 8..].iter().map(|s| s.as_str()).collect();
        assert_eq!(
            tail,
            vec![
                "-p=80",
                "--foo",
                "--bar baz",
                "--last",
                "localhost/imagename",
                "/bin/sh",
                "-c",
                "true"
            ]
        );
    }

    #[test]
    fn test_missing_image() {
        let src = source("noimage.container", "[Container]\nExec=/bin/true\n");
        match generate(&src, &ctx()).unwrap_err() {
            Error::ValidationError { what } => assert_eq!(what, "no Image key specified"),
            e => panic!("unexpected error {}", e),
        }
    }

    #[test]
    fn test_unknown_key() {
        let src = source("x.container", "[Container]\nImage=a/b\nFoo=bar\n");
        assert_eq!(
            generate(&src, &ctx()).unwrap_err().to_string(),
            "unsupported key 'Foo' in group 'Container'"
        );
    }

    #[test]
    fn test_group_without_user() {
        let src = source("nouser.container", "[Container]\nImage=a/b\nGroup=5\n");
        match generate(&src, &ctx()).unwrap_err() {
            Error::ValidationError { what } => assert_eq!(what, "Group set without User"),
            e => panic!("unexpected error {}", e),
        }
    }

    #[test]
    fn test_unbalanced_quoting() {
        for (content, value) in [
            ("[Container]\nImage=a/b\nPodmanArgs=\"open\n", "\"open"),
            ("[Container]\nImage=a/b\nExec='x\n", "'x"),
            ("[Container]\nImage=a/b\n[Install]\nWantedBy=\"x\n", "\"x"),
            ("[Volume]\nPodmanArgs=--opt 'o\n", "--opt 'o"),
        ] {
            let name = if content.starts_with("[Volume]") {
                "quote.volume"
            } else {
                "quote.container"
            };
            match generate(&source(name, content), &ctx()).unwrap_err() {
                Error::QuotingError { value: v } => assert_eq!(v, value),
                e => panic!("unexpected error {}", e),
            }
        }
    }

    #[test]
    fn test_stop_post_prefix_outside_quotes() {
        let ctx = GeneratorContext {
            podman: "/opt/my podman".to_string(),
            is_user: false,
        };
        let src = source("basic.container", "[Container]\nImage=localhost/imagename\n");
        let generated = generate(&src, &ctx).unwrap();
        assert_eq!(
            generated.unit.lookup_all("Service", "ExecStopPost"),
            vec![
                "-\"/opt/my podman\" rm -f -i --cidfile=%t/%N.cid",
                "-rm -f %t/%N.cid"
            ]
        );
        assert_eq!(
            generated.unit.lookup_last("Service", "ExecStop"),
            Some("\"/opt/my podman\" rm -f -i --cidfile=%t/%N.cid")
        );
    }

    #[test]
    fn test_podman_args_volume_kube() {
        let src = source("data.volume", "[Volume]\nPodmanArgs=--driver local\n");
        let args = exec_args(&generate(&src, &ctx()).unwrap(), "ExecStart");
        assert_eq!(args[args.len() - 3..].to_vec(), vec!["--driver", "local", "systemd-data"]);

        let src = source(
            "app.kube",
            "[Kube]\nYaml=/opt/app.yml\nPodmanArgs=--tls-verify=false\n",
        );
        let args = exec_args(&generate(&src, &ctx()).unwrap(), "ExecStart");
        assert_eq!(args[args.len() - 2..].to_vec(), vec!["--tls-verify=false", "/opt/app.yml"]);
    }

    #[test]
    fn test_volume() {
        let src = source(
            "basic.volume",
            "[Volume]\nUser=123\nLabel=org.foo.Arg=value\n[Install]\nWantedBy=multi-user.target\n",
        );
        let generated = generate(&src, &ctx()).unwrap();
        assert_eq!(generated.name, "basic-volume.service");
        assert_eq!(generated.unit.lookup_last("Unit", "SourcePath"), None);
        assert_eq!(
            exec_args(&generated, "ExecStart"),
            vec![
                "/usr/bin/podman",
                "volume",
                "create",
                "--ignore",
                "--opt",
                "o=uid=123",
                "--label",
                "org.foo.Arg=value",
                "systemd-basic"
            ]
        );
        assert_eq!(
            generated.unit.lookup_last("Service", "Type"),
            Some("oneshot")
        );
        assert_eq!(
            generated.symlinks,
            vec![PathBuf::from("multi-user.target.wants/basic-volume.service")]
        );
    }

    #[test]
    fn test_kube() {
        let src = source(
            "basic.kube",
            "[Kube]\nYaml=deployment.yml\nConfigMap=/opt/cm.yml\nPublishPort=0.0.0.0:8000:80\n",
        );
        let generated = generate(&src, &ctx()).unwrap();
        assert_eq!(generated.name, "basic.service");
        assert_eq!(
            exec_args(&generated, "ExecStart"),
            vec![
                "/usr/bin/podman",
                "kube",
                "play",
                "--replace",
                "--service-container=true",
                "--log-driver",
                "passthrough",
                "--configmap",
                "/opt/cm.yml",
                "--publish=8000:80",
                "/etc/containers/systemd/deployment.yml"
            ]
        );
        assert_eq!(
            exec_args(&generated, "ExecStop"),
            vec![
                "/usr/bin/podman",
                "kube",
                "down",
                "/etc/containers/systemd/deployment.yml"
            ]
        );

        let src = source("manual.kube", "[Kube]\nYaml=/a.yml\nRemapUsers=manual\n");
        assert!(generate(&src, &ctx()).is_err());
        let src = source("noyaml.kube", "[Kube]\n");
        assert!(generate(&src, &ctx()).is_err());
    }

    #[test]
    fn test_install_symlinks() {
        let src = source(
            "install.container",
            "[Container]\nImage=localhost/imagename\n[Install]\nWantedBy=default.target other.target\nRequiredBy=a.target\nRequiredBy=/bad/path\nAlias=alias.service\n",
        );
        let generated = generate(&src, &ctx()).unwrap();
        assert_eq!(
            generated.symlinks,
            vec![
                PathBuf::from("alias.service"),
                PathBuf::from("default.target.wants/install.service"),
                PathBuf::from("other.target.wants/install.service"),
                PathBuf::from("a.target.requires/install.service"),
            ]
        );
    }

    #[test]
    fn test_generator_run() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        let good = src_dir.path().join("basic.container");
        fs::write(
            &good,
            "[Container]\nImage=localhost/imagename\n[Install]\nWantedBy=default.target\n",
        )
        .unwrap();
        let bad = src_dir.path().join("noimage.container");
        fs::write(&bad, "[Container]\n").unwrap();
        let broken = src_dir.path().join("broken.volume");
        fs::write(&broken, "Key=value\n").unwrap();

        let generator = Generator::new(ctx(), Some(out_dir.path().to_path_buf()));
        let report = generator.run(&[bad.clone(), good, broken.clone()]);

        assert!(!report.success());
        assert_eq!(report.generated, vec!["basic.service".to_string()]);
        assert_eq!(report.failed, vec![bad, broken]);

        let content = fs::read_to_string(out_dir.path().join("basic.service")).unwrap();
        assert!(content.starts_with(GENERATED_HEADER));
        assert!(!out_dir.path().join("noimage.service").exists());
        assert_eq!(
            fs::read_link(out_dir.path().join("default.target.wants/basic.service")).unwrap(),
            PathBuf::from("../basic.service")
        );
    }

    #[test]
    fn test_generator_dry_run() {
        let src_dir = tempfile::tempdir().unwrap();
        let path = src_dir.path().join("basic.volume");
        fs::write(&path, "[Volume]\n").unwrap();

        let report = Generator::new(ctx(), None).run(&[path]);
        assert!(report.success());
        assert_eq!(report.generated, vec!["basic-volume.service".to_string()]);
    }
}
