#[cfg(test)]
#[path = "../../tests/unit/utils/random_test.rs"]
mod random_test;

use rand::prelude::*;
use rand::rngs::SmallRng;
use std::sync::Mutex;

/// Provides the way to use randomized values in generic way.
pub trait Random: Send + Sync {
    /// Produces integral random value, uniformly distributed on the closed interval [min, max].
    fn uniform_int(&self, min: i32, max: i32) -> i32;

    /// Produces real random value, uniformly distributed on the closed interval [min, max).
    fn uniform_real(&self, min: f64, max: f64) -> f64;

    /// Tests probability value in (0., 1.) range.
    fn is_hit(&self, probability: f64) -> bool;

    /// Shuffles given indices in place.
    fn shuffle(&self, indices: &mut [usize]);
}

/// A default random implementation which can be initialized from entropy or from a fixed seed.
/// The latter makes algorithms driven by it fully repeatable.
pub struct DefaultRandom {
    rng: Mutex<SmallRng>,
}

impl Default for DefaultRandom {
    fn default() -> Self {
        Self { rng: Mutex::new(SmallRng::from_rng(thread_rng()).expect("cannot get RNG from entropy")) }
    }
}

impl DefaultRandom {
    /// Creates a new instance of `DefaultRandom` with repeatable (predictable) random generation.
    pub fn new_repeatable(seed: u64) -> Self {
        Self { rng: Mutex::new(SmallRng::seed_from_u64(seed)) }
    }

    fn locked_rng(&self) -> std::sync::MutexGuard<'_, SmallRng> {
        self.rng.lock().expect("cannot lock RNG")
    }
}

impl Random for DefaultRandom {
    fn uniform_int(&self, min: i32, max: i32) -> i32 {
        if min == max {
            return min;
        }

        assert!(min < max);
        self.locked_rng().gen_range(min..=max)
    }

    fn uniform_real(&self, min: f64, max: f64) -> f64 {
        if (min - max).abs() < f64::EPSILON {
            return min;
        }

        assert!(min < max);
        self.locked_rng().gen_range(min..max)
    }

    fn is_hit(&self, probability: f64) -> bool {
        self.locked_rng().gen_bool(probability.clamp(0., 1.))
    }

    fn shuffle(&self, indices: &mut [usize]) {
        indices.shuffle(&mut *self.locked_rng())
    }
}
