// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the contact relay.
//!
//! Scripted providers stand in for real email services so that every
//! failover path can be driven deterministically.

#![allow(dead_code)]

pub mod fixtures;
pub mod providers;
