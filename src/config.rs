use {
    crate::{
        hasher::{Crc32, RingHasher, Sip32},
        Error,
    },
    serde::{Deserialize, Serialize},
};

/// Number of vnodes per node used when none is configured.
pub const DEFAULT_VNODES: u32 = 160;

/// Ring settings, typically deserialized from the application's config.
///
/// ```json
/// { "vnodes": 64, "hasher": "sip32", "key_format": "underscore" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub vnodes: u32,
    pub hasher: HasherKind,
    pub key_format: VnodeKeyFormat,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            vnodes: DEFAULT_VNODES,
            hasher: HasherKind::default(),
            key_format: VnodeKeyFormat::default(),
        }
    }
}

impl RingConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.vnodes == 0 {
            return Err(Error::InvalidVnodeCount(self.vnodes));
        }

        Ok(())
    }
}

/// Built-in hash functions selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasherKind {
    #[default]
    Crc32,
    Sip32,
}

impl RingHasher for HasherKind {
    #[inline]
    fn hash(&self, bytes: &[u8]) -> u32 {
        match self {
            HasherKind::Crc32 => Crc32.hash(bytes),
            HasherKind::Sip32 => Sip32::default().hash(bytes),
        }
    }
}

/// Byte layout of the `(node id, vnode index)` pair that gets hashed into a
/// vnode position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VnodeKeyFormat {
    /// Big-endian `u32` id length, the id bytes, then the big-endian `u32`
    /// index. Distinct pairs always encode to distinct bytes.
    #[default]
    LengthPrefixed,

    /// `"{id}_{index}"`, for rings that must agree with deployments built
    /// on this layout. Still unique per pair, since the index never contains
    /// `_`, but a lookup key such as `"cache_3"` hashes to exactly the
    /// position of vnode 3 of node `"cache"`.
    Underscore,
}

impl VnodeKeyFormat {
    /// Writes the encoded pair into `buf`, replacing its contents.
    pub fn encode(&self, node: &str, index: u32, buf: &mut Vec<u8>) {
        buf.clear();

        match self {
            VnodeKeyFormat::LengthPrefixed => {
                buf.extend_from_slice(&(node.len() as u32).to_be_bytes());
                buf.extend_from_slice(node.as_bytes());
                buf.extend_from_slice(&index.to_be_bytes());
            }
            VnodeKeyFormat::Underscore => {
                buf.extend_from_slice(node.as_bytes());
                buf.push(b'_');
                buf.extend_from_slice(index.to_string().as_bytes());
            }
        }
    }
}
