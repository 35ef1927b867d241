// SPDX-License-Identifier: GPL-3.0-only

pub mod mount;
pub mod reconcile;
pub mod resolve;
pub mod store;

pub use mount::{MountBackend, MountParams};
pub use reconcile::{Reconciler, ResetToZero};
pub use resolve::HostResolver;
pub use store::StateStore;
