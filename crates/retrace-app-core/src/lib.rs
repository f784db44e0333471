// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for retrace tools (config, prefs).
//! Keeps the CLI and any future viewer thin and storage-agnostic.

pub mod config;
pub mod config_port;
pub mod prefs;
