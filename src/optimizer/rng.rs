//! Fast PRNG for voyage simulation. SplitMix64: good statistical quality and cheap.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1), 53 bits of precision.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform in [low, high).
    #[inline]
    pub fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Uniform integer in [0, bound). `bound` must be non-zero.
    #[inline]
    pub fn below(&mut self, bound: usize) -> usize {
        ((self.next_u64() as u128 * bound as u128) >> 64) as usize
    }
}

/// Fresh seed from the operating system, for requests that did not pin one.
pub fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(_) => std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(SPLITMIX64_GOLDEN),
    }
}

/// Mix a request seed with an identifier so every lineup gets its own stream.
pub fn stable_seed(seed: u64, identifier: &str) -> u64 {
    let mut acc = seed;
    for b in identifier.bytes() {
        acc = acc.wrapping_mul(37).wrapping_add(u64::from(b));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_deterministic() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn splitmix64_different_seeds_differ() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn floats_and_indices_stay_in_range() {
        let mut rng = Rng::new(99);
        for _ in 0..10_000 {
            let unit = rng.next_f64();
            assert!((0.0..1.0).contains(&unit));
            let ranged = rng.range_f64(-3.0, 5.0);
            assert!((-3.0..5.0).contains(&ranged));
            assert!(rng.below(4) < 4);
        }
    }

    #[test]
    fn stable_seed_separates_identifiers() {
        assert_ne!(stable_seed(7, "100,200"), stable_seed(7, "100,201"));
        assert_eq!(stable_seed(7, "abc"), stable_seed(7, "abc"));
    }
}
