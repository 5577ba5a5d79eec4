// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-lifecycle handling.

pub mod guardian;

pub use guardian::{LifecycleGuardian, LifecyclePhase, PausableWork, SessionController};
