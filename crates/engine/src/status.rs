// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use parking_lot::Mutex;
use std::sync::Arc;

/// Human-readable description of what a worker is doing; empty when idle.
#[derive(Clone, Default)]
pub struct StatusHandle(Arc<Mutex<String>>);

impl StatusHandle {
    pub fn set(&self, status: impl Into<String>) {
        *self.0.lock() = status.into();
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn get(&self) -> String {
        self.0.lock().clone()
    }
}
