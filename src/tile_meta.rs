//! Autotile metadata for tile atlases.
//!
//! A tile atlas ships a JSON sidecar mapping each 9-bit neighbor code to the
//! atlas cell drawn for it:
//!
//! ```json
//! {
//!   "width": 8,
//!   "height": 6,
//!   "groups": [
//!     { "type": "autotile", "bitmasks": [ { "x": 1, "y": 0, "bits": "000010000" } ] }
//!   ]
//! }
//! ```
//!
//! Group types other than `autotile` are skipped when parsing.

use std::collections::BTreeMap;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::TileMetaError;

/// Largest valid neighbor code.
pub const MAX_BITS: u16 = 0x1FF;

/// Atlas size and the autotile lookup table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileMeta {
    pub width: u32,
    pub height: u32,
    bitmasks: BTreeMap<u16, IVec2>,
}

#[derive(Serialize, Deserialize)]
struct RawMeta {
    width: u32,
    height: u32,
    groups: Vec<RawGroup>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawGroup {
    Autotile {
        bitmasks: Vec<RawBitmask>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize)]
struct RawBitmask {
    x: i32,
    y: i32,
    bits: String,
}

impl TileMeta {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bitmasks: BTreeMap::new(),
        }
    }

    /// Parses the JSON form. Later entries win when a code repeats.
    pub fn parse(json: &str) -> Result<Self, TileMetaError> {
        let raw: RawMeta = serde_json::from_str(json)?;
        let mut meta = TileMeta::new(raw.width, raw.height);
        for group in raw.groups {
            let RawGroup::Autotile { bitmasks } = group else {
                continue;
            };
            for bitmask in bitmasks {
                let bits = parse_bits(&bitmask.bits)?;
                meta.bitmasks.insert(bits, IVec2::new(bitmask.x, bitmask.y));
            }
        }
        log::trace!(
            "Parsed tile metadata {}x{} with {} bitmasks",
            meta.width,
            meta.height,
            meta.bitmasks.len()
        );
        Ok(meta)
    }

    /// Writes a single autotile group, entries ordered by code.
    pub fn serialize(&self) -> Result<String, TileMetaError> {
        let bitmasks = self
            .bitmasks
            .iter()
            .map(|(bits, at)| RawBitmask {
                x: at.x,
                y: at.y,
                bits: format!("{bits:09b}"),
            })
            .collect();
        let raw = RawMeta {
            width: self.width,
            height: self.height,
            groups: vec![RawGroup::Autotile { bitmasks }],
        };
        Ok(serde_json::to_string(&raw)?)
    }

    /// The atlas cell for a neighbor code.
    pub fn cell(&self, bits: u16) -> Option<IVec2> {
        self.bitmasks.get(&bits).copied()
    }

    pub fn insert(&mut self, bits: u16, cell: IVec2) -> Result<Option<IVec2>, TileMetaError> {
        if bits > MAX_BITS {
            return Err(TileMetaError::Bits(format!("{bits:b}")));
        }
        Ok(self.bitmasks.insert(bits, cell))
    }

    pub fn bitmasks(&self) -> impl Iterator<Item = (u16, IVec2)> + '_ {
        self.bitmasks.iter().map(|(bits, cell)| (*bits, *cell))
    }

    pub fn len(&self) -> usize {
        self.bitmasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmasks.is_empty()
    }
}

fn parse_bits(bits: &str) -> Result<u16, TileMetaError> {
    if bits.is_empty() || bits.len() > 9 || !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(TileMetaError::Bits(bits.to_owned()));
    }
    u16::from_str_radix(bits, 2).map_err(|_| TileMetaError::Bits(bits.to_owned()))
}
