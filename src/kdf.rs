//! Key and IV derivation from secret strings.
//!
//! Each strength maps the UTF-8 bytes of the secret through a fixed digest:
//!
//! | strength | key                  | IV (when an IV secret is given) |
//! |----------|----------------------|---------------------------------|
//! | 64       | CRC-64 (8 bytes)     | CRC-64 (8 bytes)                |
//! | 128      | MD5 (16 bytes)       | MD5 (16 bytes)                  |
//! | 192      | tiger192,3 (24 bytes)| MD5 (16 bytes)                  |
//! | 256      | SHA-256 (32 bytes)   | MD5 (16 bytes)                  |
//!
//! Without an IV secret the IV is all zeros. There is no salt and no
//! stretching: the same inputs always yield the same key material.

use md5::Md5;
use sha2::{Digest, Sha256};
use tiger::Tiger;
use zeroize::Zeroizing;

use crate::crc64;
use crate::strength::KeyStrength;

/// Length of a Tiger/192 digest in bytes.
pub const TIGER_DIGEST_LEN: usize = 24;

/// Key and IV derived for one strength, sized by the variant. Wiped on drop.
#[derive(Clone)]
pub enum KeyMaterial {
    Bits64 {
        key: Zeroizing<[u8; 8]>,
        iv: Zeroizing<[u8; 8]>,
    },
    Bits128 {
        key: Zeroizing<[u8; 16]>,
        iv: Zeroizing<[u8; 16]>,
    },
    Bits192 {
        key: Zeroizing<[u8; 24]>,
        iv: Zeroizing<[u8; 16]>,
    },
    Bits256 {
        key: Zeroizing<[u8; 32]>,
        iv: Zeroizing<[u8; 16]>,
    },
}

impl KeyMaterial {
    pub fn strength(&self) -> KeyStrength {
        match self {
            KeyMaterial::Bits64 { .. } => KeyStrength::Bits64,
            KeyMaterial::Bits128 { .. } => KeyStrength::Bits128,
            KeyMaterial::Bits192 { .. } => KeyStrength::Bits192,
            KeyMaterial::Bits256 { .. } => KeyStrength::Bits256,
        }
    }

    /// Cipher key, `strength().key_len()` bytes.
    pub fn key(&self) -> &[u8] {
        match self {
            KeyMaterial::Bits64 { key, .. } => &key[..],
            KeyMaterial::Bits128 { key, .. } => &key[..],
            KeyMaterial::Bits192 { key, .. } => &key[..],
            KeyMaterial::Bits256 { key, .. } => &key[..],
        }
    }

    /// Cipher IV, `strength().iv_len()` bytes.
    pub fn iv(&self) -> &[u8] {
        match self {
            KeyMaterial::Bits64 { iv, .. } => &iv[..],
            KeyMaterial::Bits128 { iv, .. }
            | KeyMaterial::Bits192 { iv, .. }
            | KeyMaterial::Bits256 { iv, .. } => &iv[..],
        }
    }

    /// Whether the IV is the all-zero default.
    pub fn has_zero_iv(&self) -> bool {
        self.iv().iter().all(|&b| b == 0)
    }
}

// Never print key material.
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("strength", &self.strength())
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.strength() == other.strength() && self.key() == other.key() && self.iv() == other.iv()
    }
}

impl Eq for KeyMaterial {}

/// Derive key and IV for `strength`.
///
/// An empty `iv_secret` selects the all-zero IV.
pub fn derive(strength: KeyStrength, secret: &str, iv_secret: &str) -> KeyMaterial {
    let secret = secret.as_bytes();
    let iv_secret = (!iv_secret.is_empty()).then_some(iv_secret.as_bytes());
    match strength {
        KeyStrength::Bits64 => KeyMaterial::Bits64 {
            key: Zeroizing::new(crc64::checksum(secret)),
            iv: Zeroizing::new(iv_secret.map(crc64::checksum).unwrap_or_default()),
        },
        KeyStrength::Bits128 => KeyMaterial::Bits128 {
            key: Zeroizing::new(md5(secret)),
            iv: md5_iv(iv_secret),
        },
        KeyStrength::Bits192 => KeyMaterial::Bits192 {
            key: Zeroizing::new(tiger192_3(secret)),
            iv: md5_iv(iv_secret),
        },
        KeyStrength::Bits256 => KeyMaterial::Bits256 {
            key: Zeroizing::new(sha256(secret)),
            iv: md5_iv(iv_secret),
        },
    }
}

fn md5_iv(iv_secret: Option<&[u8]>) -> Zeroizing<[u8; 16]> {
    Zeroizing::new(iv_secret.map(md5).unwrap_or_default())
}

fn md5(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(data));
    out
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Reverse the byte order inside each of the three 8-byte groups of a
/// Tiger/192 digest, keeping the groups in place.
///
/// This converts between the legacy "tiger192" serialization and the
/// "tiger192,3" one. Applying it twice returns the input.
pub fn reorder_tiger_groups(digest: &[u8; TIGER_DIGEST_LEN]) -> [u8; TIGER_DIGEST_LEN] {
    let mut out = *digest;
    for group in out.chunks_exact_mut(8) {
        group.reverse();
    }
    out
}

/// Tiger/192 in the legacy "tiger192" serialization, where each 64-bit
/// state word is written most significant byte first.
pub fn legacy_tiger192(data: &[u8]) -> [u8; TIGER_DIGEST_LEN] {
    // The `tiger` crate writes state words little-endian ("tiger192,3").
    let mut reference = [0u8; TIGER_DIGEST_LEN];
    reference.copy_from_slice(&Tiger::digest(data));
    reorder_tiger_groups(&reference)
}

/// The "tiger192,3" digest used as the 192-bit key.
pub fn tiger192_3(data: &[u8]) -> [u8; TIGER_DIGEST_LEN] {
    reorder_tiger_groups(&legacy_tiger192(data))
}
