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

//! Multi-recipient envelope codec ("box2"): encrypts a message once under a
//! fresh per-message key, then fans that key out to every recipient through
//! a per-recipient 32-byte slot.

use log::debug;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::{
    crypto::{ladder, secretbox},
    error::{Error, Result},
    keystore::KeyScheme,
    refs::{FeedRef, MessageRef},
};

/// Maximum number of recipients a single envelope may address.
pub const MAX_SLOTS: usize = 32;

const KEY_SIZE: usize = 32;
const HEADER_BOX_SIZE: usize = 32;
const SLOT_SIZE: usize = 32;

/// A `(key, scheme)` pair identifying one recipient's key material. Slot
/// assignment in the ciphertext follows the order recipients are given in.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub key: Vec<u8>,
    pub scheme: KeyScheme,
}

impl Recipient {
    pub fn new(key: Vec<u8>, scheme: KeyScheme) -> Self {
        Self { key, scheme }
    }
}

/// Suffix marking a message's `content` string as envelope-addressed
/// ciphertext.
const BOXED_CONTENT_SUFFIX: &str = ".box2";

/// Does a message's `content` string carry boxed ciphertext?
pub fn is_boxed_content(content: &str) -> bool {
    content.ends_with(BOXED_CONTENT_SUFFIX)
}

/// Extract and base64-decode (RFC 4648 standard, no padding) the ciphertext
/// out of a `.box2`-suffixed content string. Returns `None` if `content`
/// doesn't carry the suffix or the prefix isn't valid base64.
pub fn decode_boxed_content(content: &str) -> Option<Vec<u8>> {
    use base64::Engine;
    let encoded = content.strip_suffix(BOXED_CONTENT_SUFFIX)?;
    base64::engine::general_purpose::STANDARD_NO_PAD.decode(encoded).ok()
}

/// Base64-encode (RFC 4648 standard, no padding) `ciphertext` and append the
/// `.box2` suffix, producing the on-disk content string form.
pub fn encode_boxed_content(ciphertext: &[u8]) -> String {
    use base64::Engine;
    let mut out = base64::engine::general_purpose::STANDARD_NO_PAD.encode(ciphertext);
    out.push_str(BOXED_CONTENT_SUFFIX);
    out
}

/// Encrypt `plain` for `recipients`, deriving all keys from a fresh
/// per-message key via the HKDF context ladder seeded with `author`/`prev`.
///
/// Uses `OsRng` for the message key. See [`encrypt_with_rng`] to inject a
/// deterministic source for reproducible test vectors.
pub fn encrypt(
    plain: &[u8],
    author: &FeedRef,
    prev: Option<&MessageRef>,
    recipients: &[Recipient],
) -> Result<Vec<u8>> {
    encrypt_with_rng(&mut OsRng, plain, author, prev, recipients)
}

/// Same as [`encrypt`], but with an injectable randomness source for the
/// message key, mirroring the Go `Boxer{rand: rand}` field.
pub fn encrypt_with_rng(
    rng: &mut impl RngCore,
    plain: &[u8],
    author: &FeedRef,
    prev: Option<&MessageRef>,
    recipients: &[Recipient],
) -> Result<Vec<u8>> {
    if plain.is_empty() {
        return Err(Error::EmptyPlaintext)
    }
    if recipients.len() > MAX_SLOTS {
        return Err(Error::TooManyRecipients)
    }

    let body_offset = HEADER_BOX_SIZE + SLOT_SIZE * recipients.len();

    let mut msg_key = Zeroizing::new([0u8; KEY_SIZE]);
    rng.fill_bytes(&mut *msg_key);

    let info = ladder::make_info(author, prev);

    let mut read_key = Zeroizing::new([0u8; KEY_SIZE]);
    ladder::derive(&mut *read_key, &*msg_key, &info.info(&[b"read_key"]));

    // Header plaintext: body offset (u16 LE) followed by 14 reserved zero bytes.
    let mut header_plain = [0u8; 16];
    header_plain[0..2].copy_from_slice(&(body_offset as u16).to_le_bytes());

    let mut header_key = Zeroizing::new([0u8; KEY_SIZE]);
    ladder::derive(&mut *header_key, &*read_key, &info.info(&[b"header_key"]));
    let mut out = secretbox::seal(&header_key, &header_plain);

    for recipient in recipients {
        let mut slot_key = Zeroizing::new([0u8; KEY_SIZE]);
        ladder::derive(
            &mut *slot_key,
            &recipient.key,
            &info.info(&[b"slot_key", recipient.scheme.as_str().as_bytes()]),
        );

        let mut slot = [0u8; SLOT_SIZE];
        for i in 0..SLOT_SIZE {
            slot[i] = slot_key[i] ^ msg_key[i];
        }
        out.extend_from_slice(&slot);
    }

    // Let's not spread broken messages.
    if out.len() != body_offset {
        return Err(Error::InvalidOffset)
    }

    let mut body_key = Zeroizing::new([0u8; KEY_SIZE]);
    ladder::derive(&mut *body_key, &*read_key, &info.info(&[b"body_key"]));
    out.extend_from_slice(&secretbox::seal(&body_key, plain));

    debug!(target: "box2::encrypt", "sealed {} byte envelope for {} recipients", out.len(), recipients.len());

    Ok(out)
}

/// Attempt to decrypt `ciphertext` using one of `candidates`. Scans slots
/// outermost, candidates inner, so that a would-be ambiguous match (which
/// should never occur in a correct deployment) resolves deterministically to
/// the first `(slot, candidate)` pair in scan order.
pub fn decrypt(
    ciphertext: &[u8],
    author: &FeedRef,
    prev: Option<&MessageRef>,
    candidates: &[Recipient],
) -> Result<Vec<u8>> {
    if ciphertext.len() < HEADER_BOX_SIZE {
        return Err(Error::CouldNotDecrypt)
    }

    let info = ladder::make_info(author, prev);

    let slot_keys: Vec<Zeroizing<[u8; KEY_SIZE]>> = candidates
        .iter()
        .map(|c| {
            let mut k = Zeroizing::new([0u8; KEY_SIZE]);
            ladder::derive(&mut *k, &c.key, &info.info(&[b"slot_key", c.scheme.as_str().as_bytes()]));
            k
        })
        .collect();

    let header_box = &ciphertext[0..HEADER_BOX_SIZE];
    let after_header = &ciphertext[HEADER_BOX_SIZE..];

    let mut found: Option<(Zeroizing<[u8; KEY_SIZE]>, Vec<u8>)> = None;

    let slot_count = after_header.len() / SLOT_SIZE;
    'outer: for i in 0..slot_count.min(MAX_SLOTS) {
        let slot = &after_header[i * SLOT_SIZE..(i + 1) * SLOT_SIZE];

        for slot_key in &slot_keys {
            let mut msg_key = Zeroizing::new([0u8; KEY_SIZE]);
            for k in 0..KEY_SIZE {
                msg_key[k] = slot_key[k] ^ slot[k];
            }

            let mut read_key = Zeroizing::new([0u8; KEY_SIZE]);
            ladder::derive(&mut *read_key, &*msg_key, &info.info(&[b"read_key"]));

            let mut header_key = Zeroizing::new([0u8; KEY_SIZE]);
            ladder::derive(&mut *header_key, &*read_key, &info.info(&[b"header_key"]));

            if let Some(hdr) = secretbox::open(&header_key, header_box) {
                found = Some((read_key, hdr));
                break 'outer
            }
        }
    }

    let (read_key, hdr) = found.ok_or(Error::CouldNotDecrypt)?;
    if hdr.len() < 2 {
        return Err(Error::CouldNotDecrypt)
    }
    let body_offset = u16::from_le_bytes([hdr[0], hdr[1]]) as usize;
    if body_offset > ciphertext.len() {
        return Err(Error::Invalid)
    }

    let mut body_key = Zeroizing::new([0u8; KEY_SIZE]);
    ladder::derive(&mut *body_key, &*read_key, &info.info(&[b"body_key"]));

    secretbox::open_or(&body_key, &ciphertext[body_offset..], Error::Invalid)
}
