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

//! SSB identity/message references and their TFK (type-format-key) binary
//! encoding, as consumed by the HKDF context ladder (`crypto::ladder`) and
//! the graph builder's `StoredAddr` lookup.

use std::fmt;

/// TFK `type` byte for a feed reference.
const TFK_TYPE_FEED: u8 = 0x00;
/// TFK `type` byte for a message reference.
const TFK_TYPE_MESSAGE: u8 = 0x01;
/// TFK `format` byte for the ed25519/ssb1 feed and message formats.
const TFK_FORMAT_SSB1: u8 = 0x00;

/// Signature scheme backing a [`FeedRef`]. Only the ed25519 ("ssb1") feed
/// format is supported by the envelope codec; any other value is accepted
/// for storage/equality but is a fatal programming error if it reaches
/// `crypto::ladder::make_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedAlgo {
    #[default]
    Ed25519,
    Other(u8),
}

impl FeedAlgo {
    fn tfk_format(self) -> u8 {
        match self {
            FeedAlgo::Ed25519 => TFK_FORMAT_SSB1,
            FeedAlgo::Other(b) => b,
        }
    }

    fn from_tfk_format(b: u8) -> Self {
        match b {
            TFK_FORMAT_SSB1 => FeedAlgo::Ed25519,
            other => FeedAlgo::Other(other),
        }
    }
}

/// A public-key-addressed identity for an append-only log: `(algorithm, 32-byte
/// public key)`. Equality is algorithm-and-bytes exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedRef {
    pub algo: FeedAlgo,
    pub id: [u8; 32],
}

impl FeedRef {
    pub fn new(algo: FeedAlgo, id: [u8; 32]) -> Self {
        Self { algo, id }
    }

    pub fn ed25519(id: [u8; 32]) -> Self {
        Self { algo: FeedAlgo::Ed25519, id }
    }

    /// Compact byte form used as a graph lookup key. At most one graph node
    /// exists per `StoredAddr`.
    pub fn stored_addr(&self) -> StoredAddr {
        StoredAddr(encode_tfk(TFK_TYPE_FEED, self.algo.tfk_format(), &self.id))
    }
}

impl fmt::Display for FeedRef {
    /// Classic SSB sigil reference: `@<standard-padded-base64 id>.<algo tag>`.
    /// Round-trips through [`parse_feed_ref`] for the `ed25519` tag.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use base64::Engine;
        let tag = match self.algo {
            FeedAlgo::Ed25519 => "ed25519".to_string(),
            FeedAlgo::Other(b) => format!("unknown{b:02x}"),
        };
        write!(f, "@{}.{}", base64::engine::general_purpose::STANDARD.encode(self.id), tag)
    }
}

/// A content-hash identifier for a single message: `(algorithm, hash-bytes)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub algo: FeedAlgo,
    pub hash: Vec<u8>,
}

impl MessageRef {
    pub fn new(algo: FeedAlgo, hash: Vec<u8>) -> Self {
        Self { algo, hash }
    }

    /// The "null" previous-message reference: default algorithm, 32-byte
    /// zero hash. Substituted whenever `prev` is absent.
    pub fn null() -> Self {
        Self { algo: FeedAlgo::default(), hash: vec![0u8; 32] }
    }
}

/// Compact byte form of a [`FeedRef`], used as a map key by the graph
/// builder. Opaque beyond equality/hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoredAddr(pub Vec<u8>);

/// TFK: two bytes `(type, format)` followed by the raw key/hash bytes.
fn encode_tfk(tipe: u8, format: u8, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + key.len());
    out.push(tipe);
    out.push(format);
    out.extend_from_slice(key);
    out
}

/// Encode a [`FeedRef`] using the SSB TFK layout, for use as HKDF context.
pub fn encode_feed_ref(feed: &FeedRef) -> Vec<u8> {
    encode_tfk(TFK_TYPE_FEED, feed.algo.tfk_format(), &feed.id)
}

/// Encode a [`MessageRef`] using the SSB TFK layout, for use as HKDF context.
pub fn encode_message_ref(msg: &MessageRef) -> Vec<u8> {
    encode_tfk(TFK_TYPE_MESSAGE, msg.algo.tfk_format(), &msg.hash)
}

/// Decode a TFK-encoded feed reference (`type` byte is ignored by the
/// caller; only `format` and the trailing key matter).
pub fn feed_ref_from_tfk(data: &[u8]) -> Option<FeedRef> {
    if data.len() < 2 + 32 {
        return None
    }
    let algo = FeedAlgo::from_tfk_format(data[1]);
    let mut id = [0u8; 32];
    id.copy_from_slice(&data[2..2 + 32]);
    Some(FeedRef { algo, id })
}

/// Decode a TFK-encoded message reference.
pub fn message_ref_from_tfk(data: &[u8]) -> Option<MessageRef> {
    if data.len() < 2 {
        return None
    }
    let algo = FeedAlgo::from_tfk_format(data[1]);
    Some(MessageRef { algo, hash: data[2..].to_vec() })
}

/// Parse the classic SSB sigil-reference format for an ed25519 feed,
/// `@<standard-padded-base64 id>.ed25519`, as found in contact-assertion JSON
/// content. Any other algorithm tag is rejected: this crate only ever needs
/// to resolve ed25519 feeds out of JSON content.
pub fn parse_feed_ref(s: &str) -> Option<FeedRef> {
    use base64::Engine;

    let rest = s.strip_prefix('@')?;
    let (b64, algo_tag) = rest.split_once('.')?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(b64).ok()?;
    let id: [u8; 32] = bytes.try_into().ok()?;
    let algo = match algo_tag {
        "ed25519" => FeedAlgo::Ed25519,
        _ => return None,
    };
    Some(FeedRef { algo, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_ref_tfk_round_trip() {
        let feed = FeedRef::ed25519([7u8; 32]);
        let encoded = encode_feed_ref(&feed);
        assert_eq!(encoded.len(), 34);
        assert_eq!(encoded[0], TFK_TYPE_FEED);
        assert_eq!(encoded[1], TFK_FORMAT_SSB1);
        let decoded = feed_ref_from_tfk(&encoded).unwrap();
        assert_eq!(decoded, feed);
    }

    #[test]
    fn message_ref_tfk_round_trip() {
        let msg = MessageRef::new(FeedAlgo::Ed25519, vec![9u8; 32]);
        let encoded = encode_message_ref(&msg);
        assert_eq!(encoded[0], TFK_TYPE_MESSAGE);
        let decoded = message_ref_from_tfk(&encoded).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn null_message_ref_is_zero_hash() {
        let null = MessageRef::null();
        assert_eq!(null.hash, vec![0u8; 32]);
    }

    #[test]
    fn stored_addr_distinguishes_distinct_feeds() {
        let a = FeedRef::ed25519([1u8; 32]).stored_addr();
        let b = FeedRef::ed25519([2u8; 32]).stored_addr();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_feed_ref_round_trip() {
        use base64::Engine;
        let feed = FeedRef::ed25519([5u8; 32]);
        let sigil = format!("@{}.ed25519", base64::engine::general_purpose::STANDARD.encode(feed.id));
        let parsed = parse_feed_ref(&sigil).unwrap();
        assert_eq!(parsed, feed);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let feed = FeedRef::ed25519([6u8; 32]);
        let parsed = parse_feed_ref(&feed.to_string()).unwrap();
        assert_eq!(parsed, feed);
    }

    #[test]
    fn parse_feed_ref_rejects_garbage() {
        assert!(parse_feed_ref("not a ref").is_none());
        assert!(parse_feed_ref("@short.ed25519").is_none());
    }
}
