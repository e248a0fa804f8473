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

//! Live-updated weighted directed trust graph, built from a stream of
//! contact-assertion records.
//!
//! Nodes are held in a flat arena (`Vec<Node>`) indexed by a plain `usize`;
//! the `StoredAddr -> index` lookup map and the edge lists both refer to
//! nodes by that index, so neither owns the other circularly.

use std::collections::{HashMap, VecDeque};

use serde::Deserialize;
use smol::lock::RwLock;

use crate::{
    error::{Error, Result},
    refs::{parse_feed_ref, FeedRef, StoredAddr},
};

/// Edge weight between two nodes. Follows use `Follow(1)`; blocks use
/// `Blocked`, modeled as the `math.Inf(1)` sentinel in the original
/// gonum-backed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    Follow,
    Blocked,
}

struct Node {
    feed: FeedRef,
}

/// One contact-log record as delivered to the builder, already downcast from
/// whatever transport-level envelope the log collaborator uses.
pub struct ContactMessage {
    pub author: FeedRef,
    pub content: Vec<u8>,
}

/// The value the contact-log source hands the builder for each entry. A real
/// deployment's log can carry non-contact records too (other message types
/// sharing the same feed); anything that isn't a recognized message is
/// surfaced as `Other` and is a hard ingestion error.
pub enum LogValue {
    Message(ContactMessage),
    Other,
}

/// Signals the end of the live contact-log stream.
pub enum LogEvent {
    Value(LogValue),
    EndOfStream,
}

#[derive(Deserialize)]
struct ContactContent {
    contact: String,
    #[serde(default)]
    following: bool,
    #[serde(default)]
    blocking: bool,
}

/// The graph's internal state, protected by a single reader/writer lock
/// owned by the builder.
struct Inner {
    nodes: Vec<Node>,
    lookup: HashMap<StoredAddr, usize>,
    /// `edges[from][to] = weight`, following the flat adjacency-map shape
    /// used for in-process daemon state elsewhere (e.g. `bin/minerd`'s job
    /// table), generalized from a single map to one nested per source node.
    edges: HashMap<usize, HashMap<usize, Weight>>,
}

impl Inner {
    fn new() -> Self {
        Self { nodes: Vec::new(), lookup: HashMap::new(), edges: HashMap::new() }
    }

    fn node_id(&mut self, feed: &FeedRef) -> usize {
        let addr = feed.stored_addr();
        if let Some(&id) = self.lookup.get(&addr) {
            return id
        }
        let id = self.nodes.len();
        self.nodes.push(Node { feed: *feed });
        self.lookup.insert(addr, id);
        id
    }

    fn find(&self, feed: &FeedRef) -> Option<usize> {
        self.lookup.get(&feed.stored_addr()).copied()
    }

    fn set_edge(&mut self, from: usize, to: usize, weight: Weight) {
        self.edges.entry(from).or_default().insert(to, weight);
    }

    fn remove_edge(&mut self, from: usize, to: usize) {
        if let Some(m) = self.edges.get_mut(&from) {
            m.remove(&to);
        }
    }

    fn edge(&self, from: usize, to: usize) -> Option<Weight> {
        self.edges.get(&from)?.get(&to).copied()
    }
}

/// Builds and serves queries against the live trust graph. Owns the
/// ingestion side; cloned handles (`Arc`-wrapped by the caller, the way
/// other long-running daemon subsystems are) share the same lock-protected
/// state for concurrent readers.
pub struct GraphBuilder {
    inner: RwLock<Inner>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Inner::new()) }
    }

    /// Create the ingestion channel the contact-log source feeds and `run`
    /// drains. `capacity: None` gives an unbounded channel, the default for
    /// `smol::channel::unbounded` event subscriptions elsewhere in this
    /// codebase; `Some(n)` bounds it for callers that want backpressure on a
    /// slow builder.
    pub fn channel(
        capacity: Option<usize>,
    ) -> (smol::channel::Sender<LogEvent>, smol::channel::Receiver<LogEvent>) {
        match capacity {
            Some(n) => smol::channel::bounded(n),
            None => smol::channel::unbounded(),
        }
    }

    /// Consume `source` until it signals end-of-stream. Intended to run on
    /// its own dedicated task; the graph remains queryable for the caller's
    /// other tasks throughout.
    pub async fn run(&self, source: smol::channel::Receiver<LogEvent>) -> Result<()> {
        log::info!(target: "graph::builder", "ingestion starting");
        loop {
            match source.recv().await {
                Ok(LogEvent::EndOfStream) | Err(_) => break,
                Ok(LogEvent::Value(LogValue::Other)) => {
                    log::warn!(target: "graph::builder", "unexpected value type, aborting ingestion");
                    return Err(Error::UnexpectedValueType)
                }
                Ok(LogEvent::Value(LogValue::Message(msg))) => {
                    self.ingest(msg).await;
                }
            }
        }
        log::info!(target: "graph::builder", "ingestion stopped");
        Ok(())
    }

    async fn ingest(&self, msg: ContactMessage) {
        let content: ContactContent = match serde_json::from_slice(&msg.content) {
            Ok(c) => c,
            Err(e) => {
                log::warn!(target: "graph::builder", "content did not parse as a contact assertion: {e}");
                return
            }
        };
        let contact = match parse_feed_ref(&content.contact) {
            Some(c) => c,
            None => {
                log::warn!(target: "graph::builder", "contact field is not a recognized feed ref");
                return
            }
        };

        if msg.author == contact {
            return
        }

        let mut inner = self.inner.write().await;
        let from = inner.node_id(&msg.author);
        let to = inner.node_id(&contact);

        if content.following {
            inner.set_edge(from, to, Weight::Follow);
        } else if content.blocking {
            inner.set_edge(from, to, Weight::Blocked);
        } else {
            inner.remove_edge(from, to);
        }

        log::debug!(target: "graph::builder", "processed contact assertion {} -> {}", msg.author, contact);
    }

    /// Returns an immutable snapshot handle. Readers should treat the
    /// snapshot as frozen for the duration of their use.
    pub async fn build(&self) -> Snapshot<'_> {
        Snapshot { inner: self.inner.read().await }
    }

    pub async fn follows(&self, from: &FeedRef) -> Result<Vec<FeedRef>> {
        self.build().await.follows(from)
    }

    pub async fn hops(&self, from: &FeedRef, max: usize) -> Vec<FeedRef> {
        self.build().await.hops(from, max)
    }

    /// Produces a capability object answering "is peer within maxHops of
    /// from?" by consulting [`GraphBuilder::hops`].
    pub fn authorizer<'a>(&'a self, from: FeedRef, max_hops: usize) -> Authorizer<'a> {
        Authorizer { builder: self, from, max_hops }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A read-locked view of the graph, valid for as long as it's held.
pub struct Snapshot<'a> {
    inner: smol::lock::RwLockReadGuard<'a, Inner>,
}

impl Snapshot<'_> {
    pub fn follows(&self, from: &FeedRef) -> Result<Vec<FeedRef>> {
        let from_id = self.inner.find(from).ok_or(Error::NoSuchFrom)?;
        let Some(edges) = self.inner.edges.get(&from_id) else { return Ok(Vec::new()) };
        Ok(edges
            .iter()
            .filter(|(_, w)| **w == Weight::Follow)
            .map(|(to, _)| self.inner.nodes[*to].feed)
            .collect())
    }

    pub fn hops(&self, from: &FeedRef, max: usize) -> Vec<FeedRef> {
        let Some(from_id) = self.inner.find(from) else { return vec![*from] };

        let mut visited = HashMap::new();
        visited.insert(from_id, 0usize);
        let mut queue = VecDeque::new();
        queue.push_back((from_id, 0usize));
        let mut out = vec![self.inner.nodes[from_id].feed];

        while let Some((node, depth)) = queue.pop_front() {
            if depth > max {
                continue
            }
            let Some(edges) = self.inner.edges.get(&node) else { continue };
            for (&to, &w) in edges {
                if w != Weight::Follow {
                    continue
                }
                // Mutual-follow only: the reverse edge must also be a follow.
                if self.inner.edge(to, node) != Some(Weight::Follow) {
                    continue
                }
                if visited.contains_key(&to) {
                    continue
                }
                let next_depth = depth + 1;
                if next_depth > max + 1 {
                    continue
                }
                visited.insert(to, next_depth);
                out.push(self.inner.nodes[to].feed);
                queue.push_back((to, next_depth));
            }
        }

        out
    }
}

/// Capability answering "is `who` within `max_hops` of `from`?".
pub struct Authorizer<'a> {
    builder: &'a GraphBuilder,
    from: FeedRef,
    max_hops: usize,
}

impl Authorizer<'_> {
    pub async fn authorize(&self, who: &FeedRef) -> bool {
        self.builder.hops(&self.from, self.max_hops).await.iter().any(|f| f == who)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(byte: u8) -> FeedRef {
        FeedRef::ed25519([byte; 32])
    }

    fn contact_json(contact: &FeedRef, following: bool, blocking: bool) -> Vec<u8> {
        format!(
            r#"{{"type":"contact","contact":"{}","following":{},"blocking":{}}}"#,
            contact, following, blocking
        )
        .into_bytes()
    }

    fn msg(author: FeedRef, contact: &FeedRef, following: bool, blocking: bool) -> ContactMessage {
        ContactMessage { author, content: contact_json(contact, following, blocking) }
    }

    #[test]
    fn follows_and_hops_scenario_c() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            let bob = feed(2);
            let carol = feed(3);

            builder.ingest(msg(alice, &bob, true, false)).await;
            builder.ingest(msg(bob, &alice, true, false)).await;
            builder.ingest(msg(alice, &carol, true, false)).await;

            let follows = builder.follows(&alice).await.unwrap();
            assert_eq!(follows.len(), 2);
            assert!(follows.contains(&bob));
            assert!(follows.contains(&carol));

            let hops = builder.hops(&alice, 1).await;
            assert!(hops.contains(&alice));
            assert!(hops.contains(&bob));
            assert!(!hops.contains(&carol));
        });
    }

    #[test]
    fn block_edge_excludes_from_follows_scenario_d() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            let bob = feed(2);
            builder.ingest(msg(alice, &bob, false, true)).await;

            let follows = builder.follows(&alice).await.unwrap();
            assert!(!follows.contains(&bob));
        });
    }

    #[test]
    fn last_assertion_wins() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            let bob = feed(2);
            builder.ingest(msg(alice, &bob, true, false)).await;
            builder.ingest(msg(alice, &bob, false, false)).await;

            let follows = builder.follows(&alice).await.unwrap();
            assert!(!follows.contains(&bob));
        });
    }

    #[test]
    fn self_contact_is_ignored() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            builder.ingest(msg(alice, &alice, true, false)).await;
            // No node should be created at all.
            assert!(matches!(builder.follows(&alice).await, Err(Error::NoSuchFrom)));
        });
    }

    #[test]
    fn follows_on_unknown_feed_fails() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let unknown = feed(9);
            assert!(matches!(builder.follows(&unknown).await, Err(Error::NoSuchFrom)));
        });
    }

    #[test]
    fn hops_on_unknown_feed_returns_singleton() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let unknown = feed(9);
            let hops = builder.hops(&unknown, 3).await;
            assert_eq!(hops, vec![unknown]);
        });
    }

    #[test]
    fn non_mutual_follow_excluded_from_hops() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            let bob = feed(2);
            builder.ingest(msg(alice, &bob, true, false)).await;
            // Bob never follows Alice back.
            let hops = builder.hops(&alice, 5).await;
            assert!(!hops.contains(&bob));
        });
    }

    #[test]
    fn malformed_content_is_skipped_not_fatal() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            builder
                .ingest(ContactMessage { author: alice, content: b"not json".to_vec() })
                .await;
            assert!(matches!(builder.follows(&alice).await, Err(Error::NoSuchFrom)));
        });
    }

    #[test]
    fn authorizer_reports_reachability() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let alice = feed(1);
            let bob = feed(2);
            builder.ingest(msg(alice, &bob, true, false)).await;
            builder.ingest(msg(bob, &alice, true, false)).await;

            let auth = builder.authorizer(alice, 1);
            assert!(auth.authorize(&bob).await);
            assert!(!auth.authorize(&feed(99)).await);
        });
    }

    #[test]
    fn end_of_stream_stops_ingestion_cleanly() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let (tx, rx) = GraphBuilder::channel(None);
            let alice = feed(1);
            let bob = feed(2);
            tx.send(LogEvent::Value(LogValue::Message(msg(alice, &bob, true, false))))
                .await
                .unwrap();
            tx.send(LogEvent::EndOfStream).await.unwrap();
            drop(tx);

            builder.run(rx).await.unwrap();
            let follows = builder.follows(&alice).await.unwrap();
            assert!(follows.contains(&bob));
        });
    }

    #[test]
    fn unexpected_value_type_aborts_ingestion() {
        smol::block_on(async {
            let builder = GraphBuilder::new();
            let (tx, rx) = GraphBuilder::channel(None);
            tx.send(LogEvent::Value(LogValue::Other)).await.unwrap();
            drop(tx);

            let err = builder.run(rx).await.unwrap_err();
            assert!(matches!(err, Error::UnexpectedValueType));
        });
    }

    #[test]
    fn bounded_channel_respects_capacity() {
        smol::block_on(async {
            let (tx, rx) = GraphBuilder::channel(Some(1));
            tx.send(LogEvent::EndOfStream).await.unwrap();
            assert!(tx.try_send(LogEvent::EndOfStream).is_err());
            drop(rx);
        });
    }
}
