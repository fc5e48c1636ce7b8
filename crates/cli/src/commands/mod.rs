// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod audit;
pub mod record;
pub mod run;
pub mod sync;
