//! MagicCrypt - DES/AES-CBC encryption keyed by secret strings
//!
//! A secret string and a strength (64, 128, 192 or 256 bits) fix a cipher
//! key; an optional IV secret fixes the IV. Payloads are encrypted with
//! DES-CBC (64) or AES-CBC and text output is base64.
//!
//! ```
//! use magiccrypt::{KeyStrength, MagicCrypt};
//!
//! let mc = MagicCrypt::new("magickey", KeyStrength::Bits256, "");
//! let encrypted = mc.encrypt_str_to_base64("http://magiclen.org");
//! assert_eq!(encrypted, "DS/2U8royDnJDiNY2ps3f6ZoTbpZo8ZtUGYLGEjwLDQ=");
//! assert_eq!(mc.decrypt_base64_to_string(&encrypted).unwrap(), "http://magiclen.org");
//! ```
//!
//! This is not authenticated encryption, and the keys are not stretched.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod config;
pub mod crc64;
pub mod error;
pub mod file_ops;
pub mod kdf;
#[cfg(feature = "cli")]
pub mod secret;
pub mod strength;

pub use cipher::MagicCrypt;
pub use config::MagicCryptConfig;
pub use error::{ErrorCategory, ErrorKind, MagicCryptError, Result};
pub use strength::{CipherAlgorithm, KeyStrength};
