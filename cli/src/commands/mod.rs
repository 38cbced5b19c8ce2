// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Σ-mesh CLI

pub mod config;
pub mod serve;
pub mod status;
pub mod agent;

pub use self::config::ConfigCommand;
