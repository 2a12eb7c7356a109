//! Key strength selection.
//!
//! The strength fixes the key length, the IV length and the block cipher.

use std::fmt;
use std::str::FromStr;

use crate::error::{MagicCryptError, Result};

/// Supported key strengths, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyStrength {
    /// DES-CBC keyed by a CRC-64 of the secret.
    Bits64,
    /// AES-128-CBC keyed by MD5.
    #[default]
    Bits128,
    /// AES-192-CBC keyed by Tiger/192.
    Bits192,
    /// AES-256-CBC keyed by SHA-256.
    Bits256,
}

/// Block cipher and mode used for a strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    DesCbc,
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherAlgorithm {
    /// Conventional OpenSSL-style name, e.g. `aes-256-cbc`.
    pub fn name(self) -> &'static str {
        match self {
            CipherAlgorithm::DesCbc => "des-cbc",
            CipherAlgorithm::Aes128Cbc => "aes-128-cbc",
            CipherAlgorithm::Aes192Cbc => "aes-192-cbc",
            CipherAlgorithm::Aes256Cbc => "aes-256-cbc",
        }
    }

    /// Cipher block size in bytes.
    pub fn block_len(self) -> usize {
        match self {
            CipherAlgorithm::DesCbc => 8,
            CipherAlgorithm::Aes128Cbc | CipherAlgorithm::Aes192Cbc | CipherAlgorithm::Aes256Cbc => {
                16
            }
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl KeyStrength {
    pub const ALL: [KeyStrength; 4] = [
        KeyStrength::Bits64,
        KeyStrength::Bits128,
        KeyStrength::Bits192,
        KeyStrength::Bits256,
    ];

    pub fn bits(self) -> u16 {
        match self {
            KeyStrength::Bits64 => 64,
            KeyStrength::Bits128 => 128,
            KeyStrength::Bits192 => 192,
            KeyStrength::Bits256 => 256,
        }
    }

    /// Derived key length in bytes (`bits / 8`).
    pub fn key_len(self) -> usize {
        usize::from(self.bits() / 8)
    }

    /// Derived IV length in bytes: 8 for DES, 16 for every AES variant.
    pub fn iv_len(self) -> usize {
        match self {
            KeyStrength::Bits64 => 8,
            KeyStrength::Bits128 | KeyStrength::Bits192 | KeyStrength::Bits256 => 16,
        }
    }

    pub fn algorithm(self) -> CipherAlgorithm {
        match self {
            KeyStrength::Bits64 => CipherAlgorithm::DesCbc,
            KeyStrength::Bits128 => CipherAlgorithm::Aes128Cbc,
            KeyStrength::Bits192 => CipherAlgorithm::Aes192Cbc,
            KeyStrength::Bits256 => CipherAlgorithm::Aes256Cbc,
        }
    }
}

impl TryFrom<u16> for KeyStrength {
    type Error = MagicCryptError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            64 => Ok(KeyStrength::Bits64),
            128 => Ok(KeyStrength::Bits128),
            192 => Ok(KeyStrength::Bits192),
            256 => Ok(KeyStrength::Bits256),
            other => Err(MagicCryptError::invalid_configuration(format!(
                "unsupported key strength {other}; the key must be 8 bytes (64 bits), \
                 16 bytes (128 bits), 24 bytes (192 bits) or 32 bytes (256 bits)"
            ))),
        }
    }
}

impl FromStr for KeyStrength {
    type Err = MagicCryptError;

    fn from_str(s: &str) -> Result<Self> {
        let bits: u16 = s.trim().parse().map_err(|_| {
            MagicCryptError::invalid_configuration(format!("key strength is not a number: {s:?}"))
        })?;
        KeyStrength::try_from(bits)
    }
}

impl fmt::Display for KeyStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        for strength in KeyStrength::ALL {
            assert_eq!(strength.key_len() * 8, usize::from(strength.bits()));
            assert_eq!(strength.iv_len(), strength.algorithm().block_len());
        }
        assert_eq!(KeyStrength::Bits64.iv_len(), 8);
        assert_eq!(KeyStrength::Bits192.key_len(), 24);
        assert_eq!(KeyStrength::Bits192.iv_len(), 16);
    }

    #[test]
    fn test_default_is_128() {
        assert_eq!(KeyStrength::default(), KeyStrength::Bits128);
    }

    #[test]
    fn test_try_from_rejects_unsupported() {
        for bits in [0u16, 1, 63, 100, 127, 512] {
            let err = KeyStrength::try_from(bits).expect_err("expected rejection");
            assert!(err.is_invalid_configuration(), "bits={bits}");
        }
    }

    #[test]
    fn test_parse_and_display() {
        for strength in KeyStrength::ALL {
            let parsed: KeyStrength = strength.to_string().parse().unwrap();
            assert_eq!(parsed, strength);
        }
        assert_eq!(" 256 ".parse::<KeyStrength>().unwrap(), KeyStrength::Bits256);
        assert!("aes".parse::<KeyStrength>().unwrap_err().is_invalid_configuration());
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(KeyStrength::Bits64.algorithm().name(), "des-cbc");
        assert_eq!(KeyStrength::Bits128.algorithm().to_string(), "aes-128-cbc");
        assert_eq!(KeyStrength::Bits192.algorithm().name(), "aes-192-cbc");
        assert_eq!(KeyStrength::Bits256.algorithm().name(), "aes-256-cbc");
    }
}
