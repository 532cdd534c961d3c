//! Deterministic terrain generation.
//!
//! RULE: nothing here may touch a platform RNG. Every draw comes from a PCG stream seeded by
//! an FNV-1a hash of the cell's canonical `"x,y"` text, so a coordinate yields the same draws
//! on every host, after every restart, in any call order.
//!
//! Every draw is a single `u32` word, so the stream is consumed the same way whatever the
//! host's pointer width. Draw order is fixed and must never change (changing it reshapes the
//! whole world):
//! 1. base terrain, `word % 6` into `BaseTerrain::ALL`
//! 2. feature chance, top 24 bits as a unit float, `< FEATURE_CHANCE`
//! 3. feature, `word % 4` into `FEATURE_TABLE` (only if step 2 passed)

use driftscape_domain::{BaseTerrain, Feature, GridCell, TerrainDescriptor};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Probability that a cell gets a feature draw at all.
pub const FEATURE_CHANCE: f32 = 0.3;

/// Feature draw table. `None` is a real outcome: a cell can win the feature roll and still
/// get nothing.
const FEATURE_TABLE: [Option<Feature>; 4] = [
    None,
    Some(Feature::Cave),
    Some(Feature::Ruins),
    Some(Feature::Waterfall),
];

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a, 32-bit.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Stable seed for a cell. Order-sensitive: `(1,2)` and `(2,1)` differ.
pub fn cell_seed(cell: GridCell) -> u32 {
    fnv1a32(cell.to_pair_string().as_bytes())
}

/// The cell's own draws, before any neighbour is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainRoll {
    pub base: BaseTerrain,
    pub feature: Option<Feature>,
}

/// Index in `[0, n)` from one 32-bit word.
fn below(rng: &mut Pcg32, n: usize) -> usize {
    (rng.next_u32() % n as u32) as usize
}

/// Float in `[0.0, 1.0)` from one 32-bit word.
fn unit_f32(rng: &mut Pcg32) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

pub fn roll(cell: GridCell) -> TerrainRoll {
    let mut rng = Pcg32::seed_from_u64(u64::from(cell_seed(cell)));

    let base = BaseTerrain::ALL[below(&mut rng, BaseTerrain::ALL.len())];
    let feature = if unit_f32(&mut rng) < FEATURE_CHANCE {
        FEATURE_TABLE[below(&mut rng, FEATURE_TABLE.len())]
    } else {
        None
    };

    TerrainRoll { base, feature }
}

/// Apply the border-consistency rule to a roll.
///
/// Only the southward neighbour is consulted, and only if it was cached before this cell was
/// generated. A river-related feature next to a southern river becomes `RiverContinuation`.
/// Neighbours generated later are never reconciled.
pub fn resolve(roll: TerrainRoll, south: Option<&TerrainDescriptor>) -> TerrainDescriptor {
    let feature = match roll.feature {
        Some(feature)
            if feature.is_river_related()
                && south.is_some_and(TerrainDescriptor::mentions_river) =>
        {
            Some(Feature::RiverContinuation)
        }
        other => other,
    };
    TerrainDescriptor::new(roll.base, feature)
}

/// Terrain for `cell`, given the cached descriptor of the cell directly south (if any).
pub fn generate(cell: GridCell, south: Option<&TerrainDescriptor>) -> TerrainDescriptor {
    resolve(roll(cell), south)
}
