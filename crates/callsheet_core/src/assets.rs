//! Reference images attached to timeline items.
//!
//! The store is keyed by item id and must never hold a key whose item is gone
//! from the timeline; removal paths in `editing` prune it in the same step.

use crate::config::CompressionSettings;
use crate::error::{CoreError, Result};
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ImageAsset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAsset {
    pub mime: String,
    /// Pixel size, when the codec could decode the image.
    pub dimensions: Option<(u32, u32)>,
    /// False when the payload is the original upload kept after a codec failure.
    pub compressed: bool,
    /// Shared so that document snapshots do not copy the payload.
    #[serde(with = "base64_bytes")]
    pub bytes: Arc<[u8]>,
}

impl ImageAsset {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

mod base64_bytes {
    use super::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<[u8]>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(text).map_err(serde::de::Error::custom)?;
        Ok(bytes.into())
    }
}

// ---------------------------------------------------------------------------
// AssetStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AssetStore {
    entries: BTreeMap<Uuid, ImageAsset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<&ImageAsset> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.entries.keys().copied()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(ImageAsset::size).sum()
    }

    /// Store `asset` under `id`, returning whatever it replaced.
    pub fn insert(&mut self, id: Uuid, asset: ImageAsset) -> Option<ImageAsset> {
        self.entries.insert(id, asset)
    }

    pub fn detach(&mut self, id: Uuid) -> Option<ImageAsset> {
        self.entries.remove(&id)
    }

    /// Move the entry stored under `old_id` to `new_id`. Returns false when
    /// there was nothing under `old_id`.
    pub fn reassociate(&mut self, old_id: Uuid, new_id: Uuid) -> bool {
        match self.entries.remove(&old_id) {
            Some(asset) => {
                self.entries.insert(new_id, asset);
                true
            }
            None => false,
        }
    }

    /// Drop every entry whose key is not in `live`. Returns how many were dropped.
    pub fn prune_orphans(&mut self, live: &HashSet<Uuid>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        before - self.entries.len()
    }

    pub fn merge(&mut self, other: AssetStore) {
        self.entries.extend(other.entries);
    }
}

// ---------------------------------------------------------------------------
// ImageCodec
// ---------------------------------------------------------------------------

/// Image codec collaborator. Implementations decide how images are decoded
/// and re-encoded; the core only relies on this contract.
pub trait ImageCodec: Send + Sync {
    /// MIME type of `raw` if it is an image this codec understands.
    fn sniff(&self, raw: &[u8]) -> Option<String>;

    /// Shrink to the configured bounds and re-encode.
    fn compress(&self, raw: &[u8], settings: &CompressionSettings) -> anyhow::Result<ImageAsset>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetWarning {
    /// Compression failed and the original bytes were stored instead.
    Uncompressed { reason: String, bytes: usize },
}

impl fmt::Display for AssetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetWarning::Uncompressed { reason, bytes } => write!(
                f,
                "image stored uncompressed ({bytes} bytes): {reason}"
            ),
        }
    }
}

/// Turn an upload into a storable asset.
///
/// Unsupported input is rejected. A codec failure on supported input falls
/// back to the raw bytes and reports a warning.
pub fn prepare_image(
    codec: &dyn ImageCodec,
    raw: &[u8],
    settings: &CompressionSettings,
) -> Result<(ImageAsset, Option<AssetWarning>)> {
    if raw.is_empty() {
        return Err(CoreError::UnsupportedImage("empty input".into()));
    }
    let mime = codec
        .sniff(raw)
        .ok_or_else(|| CoreError::UnsupportedImage("unrecognized image format".into()))?;

    match codec.compress(raw, settings) {
        Ok(asset) => {
            tracing::debug!(
                original = raw.len(),
                compressed = asset.size(),
                "image compressed"
            );
            Ok((asset, None))
        }
        Err(e) => {
            let warning = AssetWarning::Uncompressed {
                reason: e.to_string(),
                bytes: raw.len(),
            };
            tracing::warn!("{warning}");
            let asset = ImageAsset {
                mime,
                dimensions: None,
                compressed: false,
                bytes: raw.into(),
            };
            Ok((asset, Some(warning)))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
