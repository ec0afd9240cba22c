use std::fmt;

/// Total number of hash values on the ring.
pub const RING_SIZE: u64 = 1 << 32;

/// An arc of the ring, bounded exclusively below and inclusively above
/// (`(start, end]`).
///
/// Keys hashing into the arc resolve to the vnode at `end`. If `start >= end`
/// the arc is wrapping and covers `(start..)` together with `(..=end)`; when
/// `start == end` that is the whole ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionRange {
    pub start: u32,
    pub end: u32,
}

impl PositionRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns `true` if the arc passes through `u32::MAX` back to zero.
    pub fn is_wrapping(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if `position` lies on the arc.
    pub fn contains(&self, position: u32) -> bool {
        if self.is_wrapping() {
            position > self.start || position <= self.end
        } else {
            position > self.start && position <= self.end
        }
    }

    /// Number of hash values covered by the arc.
    pub fn size(&self) -> u64 {
        let (start, end) = (self.start as u64, self.end as u64);

        if self.is_wrapping() {
            RING_SIZE - (start - end)
        } else {
            end - start
        }
    }
}

impl fmt::Display for PositionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:#010x}, {:#010x}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() {
        let range = PositionRange::new(5, 10);

        assert!(!range.is_wrapping());
        assert!(!range.contains(0));
        assert!(!range.contains(5));
        assert!(range.contains(6));
        assert!(range.contains(10));
        assert!(!range.contains(11));
        assert!(!range.contains(u32::MAX));
        assert_eq!(range.size(), 5);

        let range = PositionRange::new(10, 5);

        assert!(range.is_wrapping());
        assert!(range.contains(0));
        assert!(range.contains(5));
        assert!(!range.contains(6));
        assert!(!range.contains(10));
        assert!(range.contains(11));
        assert!(range.contains(u32::MAX));
        assert_eq!(range.size(), RING_SIZE - 5);
    }

    #[test]
    fn full_ring() {
        let range = PositionRange::new(42, 42);

        assert!(range.is_wrapping());
        assert!(range.contains(0));
        assert!(range.contains(42));
        assert!(range.contains(u32::MAX));
        assert_eq!(range.size(), RING_SIZE);
    }

    #[test]
    fn display() {
        assert_eq!(
            PositionRange::new(1, u32::MAX).to_string(),
            "(0x00000001, 0xffffffff]"
        );
    }
}
