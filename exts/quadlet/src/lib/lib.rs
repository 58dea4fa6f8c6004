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

//! Translate `.container`, `.volume` and `.kube` files into systemd
//! services running podman.
//!
//! [`generator::generate`] converts one source file, [`generator::Generator`]
//! runs a whole batch and writes the results below the generator output
//! directory.

pub mod cmdline;
pub mod config;
mod container;
pub mod error;
pub mod generator;
pub mod kind;
mod kube;
pub mod lookup;
mod ports;
mod remap;
mod volume;

pub use error::{Error, Result};
pub use generator::{generate, BatchReport, GeneratedUnit, Generator, GeneratorContext, SourceUnit};
pub use kind::UnitKind;

/// group names shared by all kinds
pub(crate) const UNIT_GROUP: &str = "Unit";
pub(crate) const SERVICE_GROUP: &str = "Service";
pub(crate) const INSTALL_GROUP: &str = "Install";
