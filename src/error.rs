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

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Input-validation
    #[error("box2: won't encrypt empty plaintext")]
    EmptyPlaintext,

    #[error("box2: too many recipients (max 32)")]
    TooManyRecipients,

    #[error("keystore: invalid key scheme `{0}`")]
    InvalidKeyScheme(String),

    #[error("idxkey: buffer too short, need {need} got {got}")]
    BufferTooShort { need: usize, got: usize },

    #[error("idxkey: unrecognized scheme bytes")]
    InvalidSchemeBytes,

    // Cryptographic
    #[error("box2: could not decrypt")]
    CouldNotDecrypt,

    #[error("box2: message is invalid")]
    Invalid,

    // Lookup
    #[error("keystore: no such key for scheme `{scheme}` id `{id:?}`")]
    NoSuchKey { scheme: String, id: Vec<u8> },

    #[error("graph: no such node for given feed ref")]
    NoSuchFrom,

    // Structural
    #[error("box2: precalculated body offset does not match real body offset (this is a bug)")]
    InvalidOffset,

    // Upstream
    #[error("contact log: unexpected value type, expected a message")]
    UnexpectedValueType,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
