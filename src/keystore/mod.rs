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

//! Binary-keyed index mapping `(scheme, id)` to a set of keys.

pub mod memindex;

use async_trait::async_trait;
use log::{debug, warn};

use crate::{
    box2::Recipient,
    error::{Error, Result},
};

/// Closed set of recognized key schemes. Any other string is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScheme {
    LargeSymmetricGroup,
    DiffieStyleConvertedEd25519,
}

impl KeyScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyScheme::LargeSymmetricGroup => "envelope-large-symmetric-group",
            KeyScheme::DiffieStyleConvertedEd25519 => "envelope-id-based-dm-converted-ed25519",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "envelope-large-symmetric-group" => Some(KeyScheme::LargeSymmetricGroup),
            "envelope-id-based-dm-converted-ed25519" => {
                Some(KeyScheme::DiffieStyleConvertedEd25519)
            }
            _ => None,
        }
    }
}

/// Canonical binary encoding of `(scheme, id)`, used as the address into the
/// backing [`SetterIndex`].
pub fn idx_key(scheme: KeyScheme, id: &[u8]) -> Vec<u8> {
    let scheme_bytes = scheme.as_str().as_bytes();
    let mut out = Vec::with_capacity(4 + scheme_bytes.len() + id.len());
    out.extend_from_slice(&(scheme_bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(scheme_bytes);
    out.extend_from_slice(&(id.len() as u16).to_le_bytes());
    out.extend_from_slice(id);
    out
}

/// Decode an index key back into its `(scheme, id)` components. Fails if the
/// buffer is shorter than a declared length, or the scheme bytes aren't one
/// of the two recognized scheme strings.
pub fn decode_idx_key(data: &[u8]) -> Result<(KeyScheme, Vec<u8>)> {
    if data.len() < 2 {
        return Err(Error::BufferTooShort { need: 2, got: data.len() })
    }
    let scheme_len = u16::from_le_bytes([data[0], data[1]]) as usize;
    if data.len() < 2 + scheme_len + 2 {
        return Err(Error::BufferTooShort { need: 2 + scheme_len + 2, got: data.len() })
    }
    let scheme_bytes = &data[2..2 + scheme_len];
    let scheme_str = std::str::from_utf8(scheme_bytes).map_err(|_| Error::InvalidSchemeBytes)?;
    let scheme = KeyScheme::from_str(scheme_str).ok_or(Error::InvalidSchemeBytes)?;

    let id_off = 2 + scheme_len;
    let id_len = u16::from_le_bytes([data[id_off], data[id_off + 1]]) as usize;
    let id_start = id_off + 2;
    if data.len() < id_start + id_len {
        return Err(Error::BufferTooShort { need: id_start + id_len, got: data.len() })
    }

    Ok((scheme, data[id_start..id_start + id_len].to_vec()))
}

/// External key-value backend the key store writes through. In production
/// this is "librarian", an external collaborator; this crate ships exactly
/// one in-memory implementation ([`memindex::MemIndex`]) so the key store is
/// usable and testable standalone.
#[async_trait]
pub trait SetterIndex: Send + Sync {
    async fn get(&self, addr: &[u8]) -> Result<Option<Vec<Vec<u8>>>>;
    async fn set(&self, addr: &[u8], value: Vec<Vec<u8>>) -> Result<()>;
    async fn delete(&self, addr: &[u8]) -> Result<()>;
}

/// The key store: persists and retrieves multi-key recipient sets keyed by
/// `(scheme, id)`, over an arbitrary [`SetterIndex`] backend.
pub struct KeyStore<I: SetterIndex> {
    index: I,
}

impl<I: SetterIndex> KeyStore<I> {
    pub fn new(index: I) -> Self {
        Self { index }
    }

    /// Validates `scheme`, logging a `warn` with `(scheme, id)` context
    /// (never key material) whenever the scheme is not recognized.
    fn validate(scheme: &str, id: &[u8]) -> Result<KeyScheme> {
        KeyScheme::from_str(scheme).ok_or_else(|| {
            warn!(target: "keystore", "invalid key scheme={:?} id={:?}", scheme, id);
            Error::InvalidKeyScheme(scheme.to_string())
        })
    }

    /// Append `key` to the existing set for `(scheme, id)`. Duplicate keys
    /// are *not* deduplicated; that's the caller's responsibility. A "no
    /// such key" read is treated as an empty starting list, not an error.
    /// Fails with `InvalidKeyScheme` if `scheme` is not one of the two
    /// recognized scheme strings.
    pub async fn add_key(&self, scheme: &str, id: &[u8], key: Vec<u8>) -> Result<()> {
        let scheme = Self::validate(scheme, id)?;
        let addr = idx_key(scheme, id);
        let mut keys = self.index.get(&addr).await?.unwrap_or_default();
        keys.push(key);
        debug!(target: "keystore::add_key", "appending key for scheme={:?} id={:?}", scheme, id);
        self.index.set(&addr, keys).await
    }

    /// Unconditionally replace the stored list with `[key]`.
    pub async fn set_key(&self, scheme: &str, id: &[u8], key: Vec<u8>) -> Result<()> {
        let scheme = Self::validate(scheme, id)?;
        let addr = idx_key(scheme, id);
        debug!(target: "keystore::set_key", "replacing keys for scheme={:?} id={:?}", scheme, id);
        self.index.set(&addr, vec![key]).await
    }

    /// Delete the entry for `(scheme, id)`.
    pub async fn rm_keys(&self, scheme: &str, id: &[u8]) -> Result<()> {
        let scheme = Self::validate(scheme, id)?;
        let addr = idx_key(scheme, id);
        debug!(target: "keystore::rm_keys", "removing keys for scheme={:?} id={:?}", scheme, id);
        self.index.delete(&addr).await
    }

    /// Return the stored keys for `(scheme, id)` wrapped as [`Recipient`]s.
    /// Fails with `NoSuchKey` when the entry is unset.
    pub async fn get_keys(&self, scheme: &str, id: &[u8]) -> Result<Vec<Recipient>> {
        let scheme_enum = Self::validate(scheme, id)?;
        let addr = idx_key(scheme_enum, id);
        match self.index.get(&addr).await? {
            Some(keys) => {
                Ok(keys.into_iter().map(|k| Recipient::new(k, scheme_enum)).collect())
            }
            None => Err(Error::NoSuchKey { scheme: scheme.to_string(), id: id.to_vec() }),
        }
    }
}
