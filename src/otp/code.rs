//! Numeric passcode generation.

use rand::{
    distributions::{Distribution, Uniform},
    rngs::OsRng,
    CryptoRng, RngCore,
};
use std::sync::Mutex;

pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Any cryptographically secure generator that can move between tasks.
pub trait SecureRng: RngCore + CryptoRng + Send {}

impl<T: RngCore + CryptoRng + Send> SecureRng for T {}

/// Produces fixed-length decimal codes from an injected random source.
pub struct CodeGenerator {
    length: usize,
    digits: Uniform<u8>,
    rng: Mutex<Box<dyn SecureRng>>,
}

impl CodeGenerator {
    /// Generator backed by the operating system CSPRNG.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self::with_rng(length, OsRng)
    }

    #[must_use]
    pub fn with_rng<R: SecureRng + 'static>(length: usize, rng: R) -> Self {
        Self {
            length,
            digits: Uniform::new_inclusive(0, 9),
            rng: Mutex::new(Box::new(rng)),
        }
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Draw `length` independent digits.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (0..self.length)
            .map(|_| char::from(b'0' + self.digits.sample(&mut *rng)))
            .collect()
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("length", &self.length)
            .field("rng", &"***")
            .finish()
    }
}
