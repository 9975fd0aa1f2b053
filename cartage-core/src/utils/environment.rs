use crate::utils::{DefaultRandom, Random};
use std::sync::Arc;

/// Specifies a type for logging info messages.
pub type InfoLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Keeps track of environment specific information which influences algorithm behavior.
#[derive(Clone)]
pub struct Environment {
    /// A random generator.
    pub random: Arc<dyn Random>,
    /// A logger for info messages.
    pub logger: InfoLogger,
    /// Specifies available degree of parallelism.
    pub parallelism: usize,
}

impl Environment {
    /// Creates an instance of `Environment`.
    pub fn new(random: Arc<dyn Random>, logger: InfoLogger, parallelism: usize) -> Self {
        Self { random, logger, parallelism }
    }

    /// Creates an instance of `Environment` with repeatable random generation.
    pub fn new_with_seed(seed: u64) -> Self {
        Self { random: Arc::new(DefaultRandom::new_repeatable(seed)), ..Self::default() }
    }
}

impl Default for Environment {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism().map(|value| value.get()).unwrap_or(1);
        Self::new(Arc::new(DefaultRandom::default()), Arc::new(|msg: &str| println!("{msg}")), parallelism)
    }
}
