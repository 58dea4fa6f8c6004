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

//! The kinds of source files and the names derived from them.
use std::fmt::{self, Display};
use std::path::Path;

/// Kind of a source file, selected by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// `.container`: a single container run by `podman run`
    Container,
    /// `.volume`: a named volume created by `podman volume create`
    Volume,
    /// `.kube`: pods from a kubernetes yaml run by `podman kube play`
    Kube,
}

impl UnitKind {
    /// All kinds, in the order they are documented.
    pub const ALL: [UnitKind; 3] = [UnitKind::Container, UnitKind::Volume, UnitKind::Kube];

    /// the kind of path, none for unsupported extensions
    pub fn from_path(path: &Path) -> Option<UnitKind> {
        let ext = path.extension()?.to_str()?;
        UnitKind::ALL.into_iter().find(|k| k.extension() == ext)
    }

    /// file extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            UnitKind::Container => "container",
            UnitKind::Volume => "volume",
            UnitKind::Kube => "kube",
        }
    }

    /// the group holding the keys of this kind
    pub fn group(&self) -> &'static str {
        match self {
            UnitKind::Container => "Container",
            UnitKind::Volume => "Volume",
            UnitKind::Kube => "Kube",
        }
    }

    /// the owned group is renamed to this in the service, systemd ignores
    /// groups starting with "X-"
    pub fn x_group(&self) -> &'static str {
        match self {
            UnitKind::Container => "X-Container",
            UnitKind::Volume => "X-Volume",
            UnitKind::Kube => "X-Kube",
        }
    }

    /// Name of the service generated from a source file called `file_name`.
    ///
    /// `basic.container` and `basic.kube` become `basic.service`,
    /// `basic.volume` becomes `basic-volume.service`.
    pub fn service_name(&self, file_name: &str) -> String {
        let base = base_name(file_name);
        match self {
            UnitKind::Volume => format!("{}-volume.service", base),
            _ => format!("{}.service", base),
        }
    }
}

impl Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// strip the last extension of a file name
pub(crate) fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}
