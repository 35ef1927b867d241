// SPDX-License-Identifier: GPL-3.0-only

//! In-memory implementations of the volume contracts
//!
//! Every fake records what it was asked to do so tests can assert on the
//! exact sequence of backend calls without a kernel or a network.

pub mod backend;
pub mod resolver;
pub mod store;

pub use backend::{BackendCall, RecordingMountBackend};
pub use resolver::StaticResolver;
pub use store::MemoryStateStore;
