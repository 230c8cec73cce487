// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BAM reporting daemon library
//!
//! Startup, the stdin event feed and shutdown live here so `bamd` stays a
//! thin wrapper around them.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;

pub use lifecycle::{startup, startup_with_clock, Config, Daemon, LifecycleError};
