use {
    siphasher::sip::SipHasher,
    std::hash::Hasher,
};

/// Hash capability used to place vnodes and keys on the ring.
///
/// Implementations must be deterministic and should spread inputs evenly
/// over the `u32` range, otherwise vnode placement becomes lopsided.
pub trait RingHasher: Send + Sync {
    fn hash(&self, bytes: &[u8]) -> u32;
}

impl<F> RingHasher for F
where
    F: Fn(&[u8]) -> u32 + Send + Sync,
{
    #[inline]
    fn hash(&self, bytes: &[u8]) -> u32 {
        self(bytes)
    }
}

/// Default hasher. CRC-32 (IEEE polynomial) checksum of the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32;

impl RingHasher for Crc32 {
    #[inline]
    fn hash(&self, bytes: &[u8]) -> u32 {
        crc32fast::hash(bytes)
    }
}

/// SipHash-2-4 folded down to 32 bits.
///
/// Slower than [`Crc32`] but with noticeably better dispersion for short,
/// similar inputs such as `node-1`, `node-2`, ...
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sip32 {
    k0: u64,
    k1: u64,
}

impl Sip32 {
    pub fn with_keys(k0: u64, k1: u64) -> Self {
        Self { k0, k1 }
    }
}

impl RingHasher for Sip32 {
    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut hasher = SipHasher::new_with_keys(self.k0, self.k1);
        hasher.write(bytes);
        let hash = hasher.finish();
        (hash ^ (hash >> 32)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_matches_ieee_checksum() {
        // Reference values for CRC-32/IEEE.
        assert_eq!(Crc32.hash(b""), 0);
        assert_eq!(Crc32.hash(b"123456789"), 0xCBF4_3926);
        assert_eq!(Crc32.hash(b"hello world"), 0x0D4A_1185);
    }

    #[test]
    fn sip32_is_deterministic_and_keyed() {
        let a = Sip32::default();
        let b = Sip32::with_keys(1, 2);

        assert_eq!(a.hash(b"node-1"), a.hash(b"node-1"));
        assert_ne!(a.hash(b"node-1"), a.hash(b"node-2"));
        assert_ne!(a.hash(b"node-1"), b.hash(b"node-1"));
    }

    #[test]
    fn closures_are_hashers() {
        let sum = |bytes: &[u8]| bytes.iter().map(|b| *b as u32).sum::<u32>();
        assert_eq!(sum.hash(b"AB"), 65 + 66);
    }
}
