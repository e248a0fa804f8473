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

//! HKDF-SHA256 context ladder used to derive box2's message/header/body/slot
//! keys from labeled info vectors.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::refs::{encode_feed_ref, encode_message_ref, FeedAlgo, FeedRef, MessageRef};

/// Extract-then-expand `ikm` with the concatenated `info_parts` as context,
/// writing exactly `out.len()` bytes. Panics (via `expect`) only if `out` is
/// longer than HKDF-SHA256's 255*32 byte limit, which never happens for the
/// 32-byte keys used throughout box2.
pub fn derive(out: &mut [u8], ikm: &[u8], info_parts: &[&[u8]]) {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let info: Vec<u8> = info_parts.concat();
    hk.expand(&info, out).expect("hkdf output length is always a 32-byte key here");
}

/// Builder returned by [`make_info`]: given extra labels, produces the
/// ordered context sequence `["envelope", feed(author), msg(prev), labels...]`.
pub struct InfoBuilder {
    author: Vec<u8>,
    prev: Vec<u8>,
}

impl InfoBuilder {
    /// Produce the full labeled info-parts list for this call site, ready to
    /// be passed to [`derive`].
    pub fn info<'a>(&'a self, labels: &[&'a [u8]]) -> Vec<&'a [u8]> {
        let mut out = Vec::with_capacity(3 + labels.len());
        out.push(b"envelope".as_slice());
        out.push(self.author.as_slice());
        out.push(self.prev.as_slice());
        out.extend_from_slice(labels);
        out
    }
}

/// Only the ed25519-based feed scheme is supported by box2. Any other feed
/// algorithm reaching here is a fatal programming error: callers must
/// reject non-ed25519 feeds long before they get to key derivation.
pub fn make_info(author: &FeedRef, prev: Option<&MessageRef>) -> InfoBuilder {
    assert_eq!(author.algo, FeedAlgo::Ed25519, "box2 only supports ed25519 feeds");

    let prev_owned;
    let prev_ref = match prev {
        Some(p) => p,
        None => {
            prev_owned = MessageRef::null();
            &prev_owned
        }
    };

    InfoBuilder { author: encode_feed_ref(author), prev: encode_message_ref(prev_ref) }
}
