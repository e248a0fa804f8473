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

//! Thin wrapper around NaCl-secretbox-compatible authenticated encryption
//! (XSalsa20-Poly1305), adapted from `crypto/saltbox.rs`'s asymmetric
//! `ChaChaBox`/`SalsaBox` seal/open pattern to the symmetric, all-zero-nonce
//! construction box2 relies on.
//!
//! Every box2 message uses a freshly-derived, single-use key with a fixed
//! all-zero 24-byte nonce: reuse is safe only because the key is never
//! reused, which `crypto::ladder` guarantees.

use xsalsa20poly1305::{
    aead::{Aead, KeyInit},
    Nonce, XSalsa20Poly1305,
};

use crate::error::{Error, Result};

fn zero_nonce() -> Nonce {
    *Nonce::from_slice(&[0u8; 24])
}

/// Seal `plaintext` under `key`, appending the authentication tag. Returns
/// `ciphertext || tag`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let cipher = XSalsa20Poly1305::new(key.into());
    // The only failure mode in RustCrypto's AEAD trait is a plaintext longer
    // than the cipher's internal counter space, which is unreachable for
    // message-sized payloads here.
    cipher
        .encrypt(&zero_nonce(), plaintext)
        .expect("secretbox seal cannot fail for bounded inputs")
}

/// Attempt to open `ciphertext` (which must include the trailing tag) under
/// `key`. Returns `CouldNotDecrypt`-shaped failure via `None` so callers can
/// choose the appropriate error kind (`CouldNotDecrypt` vs `Invalid`) for
/// their call site.
pub fn open(key: &[u8; 32], ciphertext: &[u8]) -> Option<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(key.into());
    cipher.decrypt(&zero_nonce(), ciphertext).ok()
}

/// Same as [`open`] but maps failure to the given error, for call sites that
/// know precisely which error kind applies (box2's header vs. body boxes).
pub fn open_or(key: &[u8; 32], ciphertext: &[u8], err: Error) -> Result<Vec<u8>> {
    open(key, ciphertext).ok_or(err)
}
