//! Seeded Mulberry32 generator
//!
//! Small-state mixer with bit-exact output on every platform. The simulation
//! reseeds one per frame, so the number and order of draws is part of the
//! replay contract: adding or reordering a draw changes every later frame.

use std::fmt;

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of base-36 digits in an entity id
pub const ID_DIGITS: u32 = 8;

const ID_SPACE: f64 = 2_821_109_907_456.0; // 36^8
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mulberry32 state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Current internal state (for checkpoints and tests)
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Uniform draw in [0, 1)
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Short base-36 identifier from a single draw
    pub fn next_id(&mut self) -> EntityId {
        let mut n = (self.next_f64() * ID_SPACE) as u64;
        let mut digits = [b'0'; ID_DIGITS as usize];
        for slot in digits.iter_mut().rev() {
            *slot = BASE36[(n % 36) as usize];
            n /= 36;
        }
        // Only ASCII digits and lowercase letters were written
        EntityId(digits.iter().map(|&b| b as char).collect())
    }
}

impl RngCore for Mulberry32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Identity key for rendering diffs. Unique among live entities of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the seed for one frame of a run
///
/// Consecutive frames get well-separated seeds, so splits and spawns never
/// visibly repeat even though every frame starts a fresh generator.
pub fn frame_seed(run_seed: u32, frame_index: u64) -> u32 {
    // splitmix64 finalizer over (run seed, frame)
    let mut z = (((run_seed as u64) << 32) | (frame_index & 0xFFFF_FFFF))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z ^ (z >> 32)) as u32
}
