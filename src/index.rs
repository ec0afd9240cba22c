use {
    crate::range::PositionRange,
    std::{
        collections::{HashMap, HashSet},
        sync::Arc,
    },
};

/// Sorted vnode positions together with their owners.
///
/// `positions` keeps one entry per generated vnode, so two vnodes hashing to
/// the same value leave a duplicate entry behind. `owners` holds a single
/// owner per distinct position: the node written last.
#[derive(Debug, Default)]
pub(crate) struct PositionIndex {
    positions: Vec<u32>,
    owners: HashMap<u32, Arc<str>>,
    nodes: Vec<Arc<str>>,
    members: HashSet<Arc<str>>,
}

impl PositionIndex {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.members.contains(node)
    }

    pub fn nodes(&self) -> &[Arc<str>] {
        &self.nodes
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Registers `node` at the given positions. The caller is expected to
    /// call [`sort()`](Self::sort) once the batch is complete.
    pub fn insert(&mut self, node: Arc<str>, positions: impl IntoIterator<Item = u32>) {
        for position in positions {
            self.positions.push(position);
            self.owners.insert(position, node.clone());
        }

        self.members.insert(node.clone());
        self.nodes.push(node);
    }

    pub fn sort(&mut self) {
        self.positions.sort_unstable();
    }

    /// Returns the owner of the first position at or after `hash`, wrapping
    /// to the first position past the end of the ring.
    pub fn lookup(&self, hash: u32) -> Option<&Arc<str>> {
        let index = self.positions.partition_point(|position| *position < hash);
        let index = if index == self.positions.len() { 0 } else { index };

        self.positions
            .get(index)
            .and_then(|position| self.owners.get(position))
    }

    /// Distinct positions currently owned by `node`, ascending.
    pub fn positions_of(&self, node: &str) -> Vec<u32> {
        let mut positions: Vec<u32> = self
            .owners
            .iter()
            .filter(|(_, owner)| owner.as_ref() == node)
            .map(|(position, _)| *position)
            .collect();

        positions.sort_unstable();
        positions
    }

    /// Splits the ring into arcs, each tagged with the node its keys resolve
    /// to. Neighbouring arcs with the same owner are merged, including across
    /// the wrap point.
    pub fn arcs(&self) -> Vec<(PositionRange, Arc<str>)> {
        let mut distinct = self.positions.clone();
        distinct.dedup();

        let Some(&last) = distinct.last() else {
            return Vec::new();
        };

        let mut arcs: Vec<(PositionRange, Arc<str>)> = Vec::new();
        let mut prev = last;

        for position in distinct {
            let Some(owner) = self.owners.get(&position) else {
                continue;
            };

            match arcs.last_mut() {
                Some((range, current)) if current.as_ref() == owner.as_ref() => {
                    range.end = position;
                }
                _ => arcs.push((PositionRange::new(prev, position), owner.clone())),
            }

            prev = position;
        }

        if arcs.len() > 1 && arcs[0].1 == arcs[arcs.len() - 1].1 {
            if let Some((tail, _)) = arcs.pop() {
                arcs[0].0.start = tail.start;
            }
        }

        arcs
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::range::RING_SIZE};

    fn index(entries: &[(&str, &[u32])]) -> PositionIndex {
        let mut index = PositionIndex::default();
        for (node, positions) in entries {
            index.insert(Arc::from(*node), positions.iter().copied());
        }
        index.sort();
        index
    }

    fn arc(node: &str) -> Arc<str> {
        Arc::from(node)
    }

    fn owner(index: &PositionIndex, hash: u32) -> &str {
        index.lookup(hash).unwrap()
    }

    #[test]
    fn lookup() {
        let index = index(&[("a", &[100, 300]), ("b", &[200])]);

        assert_eq!(owner(&index, 0), "a");
        assert_eq!(owner(&index, 100), "a");
        assert_eq!(owner(&index, 101), "b");
        assert_eq!(owner(&index, 200), "b");
        assert_eq!(owner(&index, 250), "a");
        assert_eq!(owner(&index, 300), "a");

        // Wraps to the smallest position.
        assert_eq!(owner(&index, 301), "a");
        assert_eq!(owner(&index, u32::MAX), "a");
    }

    #[test]
    fn lookup_empty() {
        let index = PositionIndex::default();
        assert!(index.is_empty());
        assert!(index.lookup(0).is_none());
    }

    #[test]
    fn collisions_keep_last_writer() {
        let index = index(&[("a", &[5, 9]), ("b", &[9, 12])]);

        assert_eq!(index.positions(), &[5, 9, 9, 12]);
        assert_eq!(index.len(), 4);
        assert_eq!(owner(&index, 7), "b");
        assert_eq!(index.positions_of("a"), vec![5]);
        assert_eq!(index.positions_of("b"), vec![9, 12]);
    }

    #[test]
    fn membership() {
        let index = index(&[("a", &[1]), ("b", &[2])]);

        assert!(index.contains("a"));
        assert!(!index.contains("c"));
        assert_eq!(
            index.nodes().iter().map(|n| n.as_ref()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn arcs() {
        let index = index(&[("a", &[100]), ("b", &[200]), ("c", &[300])]);

        assert_eq!(index.arcs(), vec![
            (PositionRange::new(300, 100), arc("a")),
            (PositionRange::new(100, 200), arc("b")),
            (PositionRange::new(200, 300), arc("c")),
        ]);
    }

    #[test]
    fn arcs_merge_neighbours() {
        // 10 -> a, 20 -> a, 30 -> b, 40 -> a: the last arc joins the first.
        let index = index(&[("a", &[10, 20, 40]), ("b", &[30])]);

        assert_eq!(index.arcs(), vec![
            (PositionRange::new(30, 20), arc("a")),
            (PositionRange::new(20, 30), arc("b")),
        ]);
    }

    #[test]
    fn arcs_single_owner_cover_ring() {
        let index = index(&[("a", &[10, 20, 30])]);
        let arcs = index.arcs();

        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].0.size(), RING_SIZE);

        let sizes: u64 = self::index(&[("a", &[7, 7_000]), ("b", &[70, 7_000_000])])
            .arcs()
            .iter()
            .map(|(range, _)| range.size())
            .sum();
        assert_eq!(sizes, RING_SIZE);
    }
}
