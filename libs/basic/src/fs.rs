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

//! the utils of the path operation
use crate::error::*;
use crate::Error;
use nix::{
    fcntl::{renameat, OFlag},
    sys::stat::Mode,
    unistd::{unlinkat, UnlinkatFlags},
};
use pathdiff::diff_paths;
use rand::Rng;
use std::fs::{create_dir_all, remove_file, rename, File, OpenOptions};
use std::io::Write;
use std::os::unix::prelude::{AsRawFd, FromRawFd, OpenOptionsExt};
use std::path::{Path, PathBuf};

fn split_parent(path: &Path) -> Result<(PathBuf, String)> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or(Error::Invalid {
            what: format!("{} has no file name", path.display()),
        })?;

    Ok((parent, name))
}

/// create the parent directories of path
pub fn mkdir_parents(path: &Path) -> Result<()> {
    let (parent, _) = split_parent(path)?;
    create_dir_all(parent).context(IoSnafu)
}

/// create symlink link -> target
/* Please don't use "from/to", use "symlink/target" to name path.
 * Take "A -> B" for example, A is "link", B is "target".
 * With relative, the stored target is the path of target seen from the
 * directory of link. The link is created under a temporary name and renamed
 * over an existing one, so readers never see a missing link. */
pub fn symlink(target: &Path, link: &Path, relative: bool) -> Result<()> {
    let (link_parent, link_name) = split_parent(link)?;

    let target_path = if relative {
        diff_paths(target, &link_parent).ok_or(Error::Invalid {
            what: format!(
                "can't express {} relative to {}",
                target.display(),
                link_parent.display()
            ),
        })?
    } else {
        target.to_path_buf()
    };

    let fd = nix::fcntl::open(
        &link_parent,
        OFlag::O_DIRECTORY | OFlag::O_CLOEXEC,
        Mode::empty(),
    )
    .context(NixSnafu)?;
    let dir = unsafe { File::from_raw_fd(fd) };
    let raw_fd = Some(dir.as_raw_fd());

    let mut rng = rand::thread_rng();
    let tmp_link = format!(".#{}.{}", link_name, rng.gen::<u32>());

    if let Err(e) = nix::unistd::symlinkat(target_path.as_path(), raw_fd, tmp_link.as_str()) {
        log::error!(
            "Failed to create symlink {} -> {}: {}",
            link.display(),
            target_path.display(),
            e
        );
        return Err(Error::Nix { source: e });
    }

    if let Err(e) = renameat(raw_fd, tmp_link.as_str(), raw_fd, link_name.as_str()) {
        log::error!(
            "Failed to rename the temporary path of {}: {}",
            link.display(),
            e
        );
        let _ = unlinkat(raw_fd, tmp_link.as_str(), UnlinkatFlags::NoRemoveDir);
        return Err(Error::Nix { source: e });
    }

    log::debug!(
        "Successfully created symlink: {} -> {}",
        link.display(),
        target_path.display()
    );

    Ok(())
}

/// write content to path through a temporary file in the same directory,
/// the file appears under its final name only once it is complete
pub fn write_string_file_atomic(path: &Path, content: &str, mode: u32) -> Result<()> {
    let (parent, name) = split_parent(path)?;

    let mut rng = rand::thread_rng();
    let tmp_path = parent.join(format!(".#{}.{}", name, rng.gen::<u32>()));

    let result = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(&tmp_path)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .and_then(|_| rename(&tmp_path, path));

    if let Err(e) = result {
        log::debug!("Failed to write {}: {}", path.display(), e);
        let _ = remove_file(&tmp_path);
        return Err(Error::Io { source: e });
    }

    Ok(())
}
