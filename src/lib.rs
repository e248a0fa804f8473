/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Cryptographic and data-organization core for an SSB-compatible
//! peer-to-peer social-messaging node: the multi-recipient envelope codec
//! (`box2`), the recipient key store, the live trust graph builder, and the
//! branch-causality sorter for thread replies.

pub mod box2;
pub mod crypto;
pub mod error;
pub mod graph;
pub mod keystore;
pub mod refs;
pub mod sort;

pub use error::{Error, Result};
