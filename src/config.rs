//! Session construction parameters.

use zeroize::Zeroizing;

use crate::cipher::MagicCrypt;
use crate::error::Result;
use crate::strength::KeyStrength;

/// Parameters for building a [`MagicCrypt`].
///
/// Defaults: empty secret, 128-bit strength, no IV secret.
#[derive(Clone, Default)]
pub struct MagicCryptConfig {
    secret: Zeroizing<String>,
    strength: KeyStrength,
    iv_secret: Zeroizing<String>,
}

impl MagicCryptConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Zeroizing::new(secret.into());
        self
    }

    pub fn strength(mut self, strength: KeyStrength) -> Self {
        self.strength = strength;
        self
    }

    /// Set the strength from a bit count; anything but 64, 128, 192 or 256
    /// is an invalid configuration.
    pub fn bits(self, bits: u16) -> Result<Self> {
        Ok(self.strength(KeyStrength::try_from(bits)?))
    }

    /// Secret for the IV. Empty selects the all-zero IV.
    pub fn iv_secret(mut self, iv_secret: impl Into<String>) -> Self {
        self.iv_secret = Zeroizing::new(iv_secret.into());
        self
    }

    pub fn build(&self) -> MagicCrypt {
        MagicCrypt::new(&self.secret, self.strength, &self.iv_secret)
    }
}

impl std::fmt::Debug for MagicCryptConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicCryptConfig")
            .field("strength", &self.strength)
            .field("iv_secret_set", &!self.iv_secret.is_empty())
            .finish_non_exhaustive()
    }
}
