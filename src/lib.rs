// MIT License

// Copyright (c) 2016 Jerome Froelich

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Consistent hashing with virtual nodes.
//!
//! A [`Ring`] maps string keys onto a set of named nodes. Every node is placed
//! on a 32-bit hash ring at a fixed number of virtual positions (vnodes), and
//! a key belongs to the node owning the first position at or after the key's
//! hash, wrapping around to the smallest position past the end of the ring.
//! Adding a node to a ring of `N` nodes moves roughly `1/(N+1)` of the keys.
//!
//! The ring is safe to share between threads: lookups take a shared lock and
//! run concurrently, while [`Ring::add()`] takes an exclusive lock for the
//! whole insert-and-sort, so a lookup never sees a half-updated ring.
//!
//! ## Example
//!
//! ```rust
//! use vnode_ring::{Error, Ring};
//!
//! let ring = Ring::new(160)?;
//! assert_eq!(ring.node("user:42"), Err(Error::EmptyRing));
//!
//! ring.add(["cache-1", "cache-2", "cache-3"]);
//!
//! let owners = ring.get(["user:42", "user:43"])?;
//! assert_eq!(owners.len(), 2);
//! assert!(ring.contains(&owners[0]));
//!
//! // Lookups are deterministic.
//! assert_eq!(ring.node("user:42")?, owners[0]);
//! # Ok::<(), Error>(())
//! ```
//!
//! The hash function is pluggable: anything implementing [`RingHasher`],
//! including plain closures, can be passed to [`Ring::with_hasher()`].

use {
    index::PositionIndex,
    parking_lot::RwLock,
    std::{collections::HashMap, fmt, sync::Arc},
    tracing::{debug, trace, warn},
};

pub use {
    config::{HasherKind, RingConfig, VnodeKeyFormat, DEFAULT_VNODES},
    hasher::{Crc32, RingHasher, Sip32},
    range::{PositionRange, RING_SIZE},
};

pub mod config;
pub mod hasher;
mod index;
pub mod range;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid vnode count {0}: must be positive")]
    InvalidVnodeCount(u32),

    #[error("Ring is empty")]
    EmptyRing,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Consistent hash ring.
///
/// Nodes are identified by strings. Re-adding a node that is already on the
/// ring is a no-op, so the ring always holds exactly `vnodes` positions per
/// node.
pub struct Ring<H: RingHasher = Crc32> {
    vnodes: u32,
    key_format: VnodeKeyFormat,
    hasher: H,
    index: RwLock<PositionIndex>,
}

impl Ring {
    /// Creates an empty ring placing `vnodes` positions per node, hashed with
    /// CRC-32.
    pub fn new(vnodes: u32) -> Result<Self> {
        Self::with_hasher(vnodes, Crc32)
    }
}

impl Ring<HasherKind> {
    /// Creates an empty ring from configuration.
    pub fn from_config(config: &RingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::with_hasher(config.vnodes, config.hasher)?.with_key_format(config.key_format))
    }
}

impl<H: RingHasher> Ring<H> {
    /// Creates an empty ring which will use the given hasher for both vnode
    /// placement and key lookup.
    pub fn with_hasher(vnodes: u32, hasher: H) -> Result<Self> {
        if vnodes == 0 {
            return Err(Error::InvalidVnodeCount(vnodes));
        }

        Ok(Ring {
            vnodes,
            key_format: VnodeKeyFormat::default(),
            hasher,
            index: RwLock::new(PositionIndex::default()),
        })
    }

    /// Sets the byte layout used to hash vnodes. Nodes already on the ring are
    /// placed again under the new layout.
    pub fn with_key_format(mut self, key_format: VnodeKeyFormat) -> Self {
        if self.key_format != key_format {
            self.key_format = key_format;

            let nodes = std::mem::take(self.index.get_mut()).nodes().to_vec();
            self.add(nodes);
        }

        self
    }

    /// Number of vnode positions placed per node.
    #[inline]
    pub fn vnodes(&self) -> u32 {
        self.vnodes
    }

    #[inline]
    pub fn key_format(&self) -> VnodeKeyFormat {
        self.key_format
    }

    /// Get the number of vnode positions on the ring.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Returns true if no node has been added.
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Get the number of nodes on the ring.
    pub fn node_count(&self) -> usize {
        self.index.read().nodes().len()
    }

    /// Returns the nodes in the order they were added.
    pub fn nodes(&self) -> Vec<Arc<str>> {
        self.index.read().nodes().to_vec()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.index.read().contains(node)
    }

    /// Hashes `key` and returns its position on the ring.
    #[inline]
    pub fn position<K: AsRef<str>>(&self, key: K) -> u32 {
        self.hasher.hash(key.as_ref().as_bytes())
    }

    /// Snapshot of all vnode positions, ascending. Positions shared by
    /// colliding vnodes appear once per vnode.
    pub fn positions(&self) -> Vec<u32> {
        self.index.read().positions().to_vec()
    }

    /// Distinct positions owned by `node`. On a hash collision the node added
    /// later owns the position.
    pub fn positions_of(&self, node: &str) -> Vec<u32> {
        self.index.read().positions_of(node)
    }

    /// Adds nodes to the ring.
    ///
    /// Each new node gets `vnodes` positions, computed by hashing the node id
    /// together with the vnode index. Nodes already on the ring, or repeated
    /// within `nodes`, are skipped.
    ///
    /// Blocks all other readers and writers until the ring is sorted again.
    pub fn add<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = self.index.write();
        let mut buf = Vec::new();
        let mut added = 0usize;

        for node in nodes {
            let node = node.as_ref();

            if index.contains(node) {
                warn!(node, "node is already on the ring, skipping");
                continue;
            }

            let positions: Vec<u32> = (0..self.vnodes)
                .map(|vnode| {
                    self.key_format.encode(node, vnode, &mut buf);
                    self.hasher.hash(&buf)
                })
                .collect();

            index.insert(Arc::from(node), positions);
            added += 1;
        }

        if added > 0 {
            index.sort();
        }

        debug!(
            added,
            vnodes = self.vnodes,
            positions = index.len(),
            "added nodes to ring"
        );
    }

    /// Returns the owner of each key, in the same order as `keys`, or an
    /// error if the ring is empty.
    pub fn get<I, S>(&self, keys: I) -> Result<Vec<Arc<str>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = self.index.read();

        if index.is_empty() {
            trace!("lookup on empty ring");
            return Err(Error::EmptyRing);
        }

        keys.into_iter()
            .map(|key| {
                index
                    .lookup(self.position(key))
                    .cloned()
                    .ok_or(Error::EmptyRing)
            })
            .collect()
    }

    /// Returns the owner of `key`, or an error if the ring is empty.
    pub fn node<K: AsRef<str>>(&self, key: K) -> Result<Arc<str>> {
        let position = self.position(key);

        self.index
            .read()
            .lookup(position)
            .cloned()
            .ok_or(Error::EmptyRing)
    }

    /// Returns the arcs of the ring whose keys resolve to `node`. Adjacent
    /// arcs are merged. Empty if the node is not on the ring or lost all of
    /// its positions to collisions.
    pub fn ranges(&self, node: &str) -> Vec<PositionRange> {
        self.index
            .read()
            .arcs()
            .into_iter()
            .filter(|(_, owner)| owner.as_ref() == node)
            .map(|(range, _)| range)
            .collect()
    }

    /// Number of hash values owned by each node. The values add up to
    /// [`RING_SIZE`] on a non-empty ring.
    pub fn ownership(&self) -> HashMap<Arc<str>, u64> {
        let index = self.index.read();
        let mut ownership: HashMap<Arc<str>, u64> =
            index.nodes().iter().map(|node| (node.clone(), 0)).collect();

        for (range, owner) in index.arcs() {
            *ownership.entry(owner).or_default() += range.size();
        }

        ownership
    }
}

impl<H: RingHasher> fmt::Debug for Ring<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index.read();

        f.debug_struct("Ring")
            .field("vnodes", &self.vnodes)
            .field("key_format", &self.key_format)
            .field("nodes", &index.nodes().len())
            .field("positions", &index.len())
            .finish_non_exhaustive()
    }
}
