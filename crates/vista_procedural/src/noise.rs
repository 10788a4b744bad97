//! # Noise Fields
//!
//! Deterministic, seeded 2D simplex noise with an octave combination mode.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, a `NoiseField` produces **exactly** the same
//! values on any platform, any time. No global state, no thread-local RNG.
//!
//! ## Field Layout
//!
//! The terrain uses four fields seeded from one base seed with small fixed
//! offsets (see [`NoiseSet`]):
//!
//! ```text
//! height      = seed
//! temperature = seed + 2
//! humidity    = seed + 3
//! extra       = seed + 4   (reserved)
//! ```

use serde::{Deserialize, Serialize};

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the seed shifted by a small fixed offset.
    ///
    /// Used to seed sibling fields (`seed + 2`, `seed + 3`, ...).
    #[inline]
    #[must_use]
    pub const fn offset(self, delta: u64) -> Self {
        Self(self.0.wrapping_add(delta))
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(1000)
    }
}

/// SplitMix64 finalizer.
///
/// Adjacent seeds (`1000`, `1002`) must not produce correlated shuffles, and
/// xorshift alone never leaves a zero state.
#[inline]
const fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient vectors for 2D simplex.
    const GRAD: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle with deterministic xorshift64
        let mut rng_state = splitmix64(seed.value()) | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        // Double the table to avoid index wrapping
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    #[inline]
    fn gradient(hash: u8) -> [i8; 2] {
        Self::GRAD[(hash % 12) as usize]
    }
}

/// One seeded 2D noise field.
///
/// Produces smooth, continuous values in `[-1, 1]`. Pure function of
/// position once constructed.
///
/// # Example
///
/// ```rust
/// use vista_procedural::{NoiseField, WorldSeed};
///
/// let field = NoiseField::new(WorldSeed::new(42));
/// let value = field.octave_noise(100.5, 200.3, 4);
/// assert!((-1.0..=1.0).contains(&value));
/// ```
pub struct NoiseField {
    perm_table: PermutationTable,
}

impl NoiseField {
    /// Skewing factor for 2D simplex grid: (sqrt(3) - 1) / 2.
    const F2: f64 = 0.366_025_403_784_439;
    /// Unskewing factor for 2D simplex grid: (3 - sqrt(3)) / 6.
    const G2: f64 = 0.211_324_865_405_187;

    /// Creates a new noise field from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Skew input coordinates to simplex grid
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        // Unskew to get first corner in simplex
        let unskew = f64::from(i.wrapping_add(j)) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let i1 = i1 as usize;
        let j1 = j1 as usize;

        let perm = &self.perm_table;
        let gi0 = perm.get(ii + perm.get(jj) as usize);
        let gi1 = perm.get(ii + i1 + perm.get(jj + j1) as usize);
        let gi2 = perm.get(ii + 1 + perm.get(jj + 1) as usize);

        let n0 = Self::contribution(x0, y0, gi0);
        let n1 = Self::contribution(x1, y1, gi1);
        let n2 = Self::contribution(x2, y2, gi2);

        // 70.0 normalizes the output to roughly [-1, 1]
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// Contribution from one corner of the simplex.
    #[inline]
    fn contribution(x: f64, y: f64, gradient_index: u8) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = PermutationTable::gradient(gradient_index);
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }

    /// Combines `octave_count` samples of this field.
    ///
    /// Each octave doubles the frequency and halves the amplitude. The sum is
    /// normalized by the total amplitude, so the result stays in `[-1, 1]`.
    /// Zero octaves yields `0.0`.
    #[must_use]
    pub fn octave_noise(&self, x: f64, y: f64, octave_count: u32) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octave_count {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        if max_amplitude == 0.0 {
            return 0.0;
        }
        (total / max_amplitude).clamp(-1.0, 1.0)
    }
}

/// The four terrain noise fields, seeded from one base seed.
pub struct NoiseSet {
    /// Elevation.
    pub height: NoiseField,
    /// Temperature.
    pub temperature: NoiseField,
    /// Humidity.
    pub humidity: NoiseField,
    /// Reserved for terrain detail; sampled by nothing yet.
    pub extra: NoiseField,
}

impl NoiseSet {
    /// Seeds all four fields from `seed` with fixed offsets 0, 2, 3, 4.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            height: NoiseField::new(seed),
            temperature: NoiseField::new(seed.offset(2)),
            humidity: NoiseField::new(seed.offset(3)),
            extra: NoiseField::new(seed.offset(4)),
        }
    }
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}
