//! Deterministic option shuffling
//!
//! Every client shuffles the options of the active question locally instead of
//! receiving a pre-shuffled list. The round carries a seed, and this module
//! turns that seed into a permutation through a fixed linear congruential
//! generator feeding a Fisher-Yates shuffle. The arithmetic is pinned down to
//! 32-bit wrapping operations and exact double-precision division so every
//! platform derives the identical permutation from the same seed.

/// Multiplier of the linear congruential generator
const MULTIPLIER: u32 = 1_664_525;
/// Increment of the linear congruential generator
const INCREMENT: u32 = 1_013_904_223;
/// Divisor mapping generator states onto the unit interval (2^32)
const UNIT_DIVISOR: f64 = 4_294_967_296.0;

/// A linear congruential generator over the full 32-bit state space
///
/// The generator advances with `state = state * 1664525 + 1013904223 (mod 2^32)`
/// and emits each new state scaled into `[0, 1)`. It exists solely to drive
/// [`shuffle_map`]; it makes no claim of statistical quality beyond what a
/// presentation shuffle needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    /// Current generator state
    state: u32,
}

impl Lcg {
    /// Creates a generator from a 32-bit seed
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the generator and returns the new state scaled into `[0, 1)`
    ///
    /// Each 32-bit state is exactly representable as a double, and division
    /// by 2^32 is exact, so the emitted value is identical wherever IEEE 754
    /// doubles are used.
    pub fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        f64::from(self.state) / UNIT_DIVISOR
    }
}

/// Builds the mapping from shuffled position to original option index
///
/// Runs a Fisher-Yates shuffle over `0..len`, drawing swap targets from an
/// [`Lcg`] seeded with `seed`: walking `i` from the last index down,
/// `j = floor(unit * (i + 1))` picks the element swapped into position `i`.
/// The result is a permutation of `0..len` where `map[shuffled] = original`.
///
/// # Arguments
///
/// * `len` - Number of options on the question
/// * `seed` - The round's shuffle seed
///
/// # Returns
///
/// A vector of length `len` mapping each shuffled position to the index the
/// option holds in the question's stored order
pub fn shuffle_map(len: usize, seed: u32) -> Vec<usize> {
    let mut map: Vec<usize> = (0..len).collect();
    let mut rng = Lcg::new(seed);
    for i in (1..len).rev() {
        let j = (rng.next_unit() * (i as f64 + 1.0)).floor() as usize;
        map.swap(i, j);
    }
    map
}

/// Finds the shuffled position holding a given original index
///
/// Clients use this to locate the correct option inside the shuffled layout,
/// for highlighting it on reveal and labeling it with its display letter.
///
/// # Arguments
///
/// * `map` - A mapping produced by [`shuffle_map`]
/// * `original` - The index of the option in the question's stored order
///
/// # Returns
///
/// The shuffled position of that option, or `None` if the index is not part
/// of the permutation
pub fn position_of(map: &[usize], original: usize) -> Option<usize> {
    map.iter().position(|&o| o == original)
}
