//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Logging conventions for the datastore write engine.
//!
//! The crate never installs its own logger (that's the embedding
//! application's call, typically via `env_logger`); it only emits
//! through the `log` facade at the target below, mirroring the
//! `clicon_log()` call sites sprinkled through the original C engine
//! (unknown-element-as-anydata warnings, startup mode transitions,
//! NACM denials).

/// Target used for every `log` call site in this crate.
pub const TARGET: &str = "yangstore::datastore";
