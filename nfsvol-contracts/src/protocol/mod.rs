// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod plugin;

pub use error::{VolumeError, VolumeErrorKind};
