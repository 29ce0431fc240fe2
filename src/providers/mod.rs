// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! External service integrations.

pub mod oriluxchain;

pub use oriluxchain::{OriluxchainClient, OriluxchainError, SourceLedger, SourceVerification};
