//! RNG trait abstraction for rule resolution and stepping
//!
//! Every stochastic operation takes an explicit `&mut impl SimRng`, so runs
//! are reproducible from a seed:
//! - tests and the headless runner pass a seeded `Xoshiro256StarStar`
//! - parallel stepping seeds one generator per band

/// Random number generator used by the resolver and the grid phases
pub trait SimRng {
    /// Generate random boolean with 50% probability
    fn gen_bool(&mut self) -> bool;

    /// Generate random f32 in [0.0, 1.0)
    fn gen_f32(&mut self) -> f32;

    /// Generate a uniform index in `0..len` (`len` must be non-zero)
    fn gen_index(&mut self, len: usize) -> usize;

    /// Check if random value is less than probability threshold
    fn check_probability(&mut self, probability: f32) -> bool {
        self.gen_f32() < probability
    }
}

// Blanket implementation for any type implementing rand::Rng
impl<T: ?Sized + rand::Rng> SimRng for T {
    fn gen_bool(&mut self) -> bool {
        rand::Rng::r#gen(self)
    }

    fn gen_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }

    fn gen_index(&mut self, len: usize) -> usize {
        rand::Rng::gen_range(self, 0..len)
    }
}

/// Fisher-Yates shuffle driven by a [`SimRng`]
pub fn shuffle<T, R: SimRng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_index(i + 1);
        items.swap(i, j);
    }
}
