//! Encryption sessions: DES-CBC or AES-CBC with PKCS#7 padding.
//!
//! A [`MagicCrypt`] derives its key and IV once, at construction, and then
//! encrypts and decrypts any number of payloads with them. Text output is
//! standard base64 with padding.
//!
//! The IV is either derived from an IV secret or all zeros. A fixed IV
//! means equal plaintexts encrypt to equal ciphertexts, and nothing
//! authenticates the ciphertext.

use base64::{Engine, engine::general_purpose::STANDARD};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::{debug, warn};

use crate::error::{ErrorCategory, ErrorKind, MagicCryptError, Result};
use crate::kdf::{self, KeyMaterial};
use crate::strength::{CipherAlgorithm, KeyStrength};

type DesCbcEnc = cbc::Encryptor<des::Des>;
type DesCbcDec = cbc::Decryptor<des::Des>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// An immutable encryption session.
///
/// Each call builds a fresh cipher from the stored key and IV, so a session
/// can be shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicCrypt {
    material: KeyMaterial,
}

impl MagicCrypt {
    /// Derive a session from `secret`, `strength` and an optional IV secret
    /// (empty means the all-zero IV).
    pub fn new(secret: &str, strength: KeyStrength, iv_secret: &str) -> Self {
        let material = kdf::derive(strength, secret, iv_secret);
        debug!(
            strength = strength.bits(),
            algorithm = strength.algorithm().name(),
            iv_secret = !iv_secret.is_empty(),
            "derived session key material"
        );
        if iv_secret.is_empty() {
            warn!(
                algorithm = strength.algorithm().name(),
                "no IV secret supplied; using the all-zero IV"
            );
        }
        Self { material }
    }

    /// Like [`MagicCrypt::new`], with the strength given in bits.
    ///
    /// Fails with [`ErrorKind::InvalidConfiguration`] unless `bits` is 64,
    /// 128, 192 or 256.
    pub fn from_bits(secret: &str, bits: u16, iv_secret: &str) -> Result<Self> {
        let strength = KeyStrength::try_from(bits)?;
        Ok(Self::new(secret, strength, iv_secret))
    }

    pub fn strength(&self) -> KeyStrength {
        self.material.strength()
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.strength().algorithm()
    }

    /// Encrypt raw bytes, returning raw ciphertext.
    pub fn encrypt_to_bytes(&self, plaintext: &[u8]) -> Vec<u8> {
        match &self.material {
            KeyMaterial::Bits64 { key, iv } => DesCbcEnc::new(&(**key).into(), &(**iv).into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyMaterial::Bits128 { key, iv } => Aes128CbcEnc::new(&(**key).into(), &(**iv).into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyMaterial::Bits192 { key, iv } => Aes192CbcEnc::new(&(**key).into(), &(**iv).into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyMaterial::Bits256 { key, iv } => Aes256CbcEnc::new(&(**key).into(), &(**iv).into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        }
    }

    /// Decrypt raw ciphertext.
    pub fn decrypt_bytes_to_bytes(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let block_len = self.algorithm().block_len();
        if ciphertext.is_empty() || ciphertext.len() % block_len != 0 {
            debug!(
                len = ciphertext.len(),
                block_len, "ciphertext is not a whole number of blocks"
            );
            return Err(MagicCryptError::decryption(format!(
                "truncated or corrupt input: ciphertext length {} is not a positive multiple of {}",
                ciphertext.len(),
                block_len
            )));
        }

        let unpadded = match &self.material {
            KeyMaterial::Bits64 { key, iv } => DesCbcDec::new(&(**key).into(), &(**iv).into())
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyMaterial::Bits128 { key, iv } => Aes128CbcDec::new(&(**key).into(), &(**iv).into())
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyMaterial::Bits192 { key, iv } => Aes192CbcDec::new(&(**key).into(), &(**iv).into())
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyMaterial::Bits256 { key, iv } => Aes256CbcDec::new(&(**key).into(), &(**iv).into())
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };

        unpadded.map_err(|_| {
            debug!(algorithm = self.algorithm().name(), "padding check failed");
            MagicCryptError::decryption("corrupt input, tampered-with data, or wrong secret")
        })
    }

    /// Encrypt a string, returning base64.
    pub fn encrypt_str_to_base64(&self, plaintext: &str) -> String {
        self.encrypt_bytes_to_base64(plaintext.as_bytes())
    }

    /// Encrypt bytes, returning base64.
    pub fn encrypt_bytes_to_base64(&self, data: &[u8]) -> String {
        STANDARD.encode(self.encrypt_to_bytes(data))
    }

    /// Decrypt base64 ciphertext back to a string.
    ///
    /// Fails with [`ErrorKind::DecryptionFailed`] on bad input and with
    /// [`ErrorKind::Encoding`] if the plaintext is not UTF-8.
    pub fn decrypt_base64_to_string(&self, ciphertext: &str) -> Result<String> {
        let plaintext = self.decrypt_base64_to_bytes(ciphertext)?;
        String::from_utf8(plaintext).map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Encoding,
                "decrypted data is not valid UTF-8",
                e,
            )
        })
    }

    /// Decrypt base64 ciphertext back to bytes.
    pub fn decrypt_base64_to_bytes(&self, ciphertext: &str) -> Result<Vec<u8>> {
        let raw = STANDARD.decode(ciphertext).map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::DecryptionFailed,
                format!("base64 decoding failed: {e}"),
                e,
            )
        })?;
        self.decrypt_bytes_to_bytes(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    const URL: &str = "http://magiclen.org";

    #[test]
    fn test_end_to_end_128() {
        let mc = MagicCrypt::new("hello", KeyStrength::Bits128, "");
        let encrypted = mc.encrypt_str_to_base64("Test");
        assert_eq!(encrypted, "vrFyHb0CWwFcCSBqBsJMig==");
        assert_eq!(mc.decrypt_base64_to_string(&encrypted).unwrap(), "Test");

        let wrong = MagicCrypt::new("hellp", KeyStrength::Bits128, "");
        let err = wrong
            .decrypt_base64_to_string(&encrypted)
            .expect_err("expected decryption failure");
        assert!(err.is_decryption_error());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn warnings_while(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_zero_iv_warning_follows_iv_secret() {
        for strength in KeyStrength::ALL {
            let logs = warnings_while(|| {
                MagicCrypt::new("magickey", strength, "");
            });
            assert!(logs.contains("all-zero IV"), "strength={strength}: {logs}");

            let logs = warnings_while(|| {
                MagicCrypt::new("magickey", strength, "magiciv");
            });
            assert!(logs.is_empty(), "strength={strength}: {logs}");
        }
    }

    #[test]
    fn test_known_ciphertexts() {
        let cases = [
            (KeyStrength::Bits64, "", "nqIQCAbQ0TKs6x6eGRdwrouES803NhvC"),
            (KeyStrength::Bits64, "magiciv", "2cxGzCmDjJympGX1BVnADf3hTCISpK8l"),
            (KeyStrength::Bits128, "", "Pdpj9HqTAN7vY7Z9msMzlIXJcNQ5N+cIJsiQhLqyjVI="),
            (KeyStrength::Bits128, "magiciv", "elBSDtiS2OkvJLM3MzuLALRy6bhwfF/Rv1ei5RdU/+Y="),
            (KeyStrength::Bits192, "", "p0X9IHMqaxA78T0X8Y9DnNeEmVXIgUxrXmeyUEO1Muo="),
            (KeyStrength::Bits192, "magiciv", "MbtUcetuj1whfuUTRdQwLMNjWl6RjnJPkDU/qPBgjg0="),
            (KeyStrength::Bits256, "", "DS/2U8royDnJDiNY2ps3f6ZoTbpZo8ZtUGYLGEjwLDQ="),
            (KeyStrength::Bits256, "magiciv", "yhHjJahN6WBYUjq1stuMnuk/vANFoTex6dnMO82wl84="),
        ];
        for (strength, iv, expected) in cases {
            let mc = MagicCrypt::new("magickey", strength, iv);
            assert_eq!(mc.encrypt_str_to_base64(URL), expected, "{strength} iv={iv:?}");
            assert_eq!(mc.decrypt_base64_to_string(expected).unwrap(), URL);
        }
    }

    #[test]
    fn test_roundtrip_all_strengths() {
        for strength in KeyStrength::ALL {
            for iv in ["", "magiciv"] {
                let mc = MagicCrypt::new("magickey", strength, iv);
                let long = "x".repeat(1000);
                for text in ["", "a", "Test", "中文 and emoji 🦀", long.as_str()] {
                    let encrypted = mc.encrypt_str_to_base64(text);
                    assert_eq!(mc.decrypt_base64_to_string(&encrypted).unwrap(), text);
                }
            }
        }
    }

    #[test]
    fn test_binary_roundtrip() {
        let data: Vec<u8> = (0..=255).collect();
        for strength in KeyStrength::ALL {
            let mc = MagicCrypt::new("magickey", strength, "magiciv");
            let encrypted = mc.encrypt_bytes_to_base64(&data);
            assert_eq!(mc.decrypt_base64_to_bytes(&encrypted).unwrap(), data);
        }
    }

    #[test]
    fn test_raw_ciphertext_is_padded_to_blocks() {
        for strength in KeyStrength::ALL {
            let mc = MagicCrypt::new("magickey", strength, "");
            let block_len = strength.algorithm().block_len();
            assert_eq!(mc.encrypt_to_bytes(b"").len(), block_len);
            assert_eq!(mc.encrypt_to_bytes(&vec![7u8; block_len]).len(), 2 * block_len);
            assert_eq!(mc.encrypt_to_bytes(&vec![7u8; block_len + 1]).len(), 2 * block_len);
        }
    }

    #[test]
    fn test_iv_changes_ciphertext() {
        let plain = MagicCrypt::new("magickey", KeyStrength::Bits192, "");
        let with_iv = MagicCrypt::new("magickey", KeyStrength::Bits192, "magiciv");
        assert_ne!(plain.encrypt_str_to_base64(URL), with_iv.encrypt_str_to_base64(URL));
    }

    #[test]
    fn test_invalid_bits() {
        let err = MagicCrypt::from_bits("magickey", 100, "").expect_err("expected failure");
        assert!(err.is_invalid_configuration());
        assert_eq!(err.category, ErrorCategory::User);

        let mc = MagicCrypt::from_bits("magickey", 192, "").unwrap();
        assert_eq!(mc.strength(), KeyStrength::Bits192);
        assert_eq!(mc.algorithm(), CipherAlgorithm::Aes192Cbc);
    }

    #[test]
    fn test_bad_base64() {
        let mc = MagicCrypt::new("magickey", KeyStrength::Bits128, "");
        let err = mc
            .decrypt_base64_to_string("not-valid-base64!!")
            .expect_err("expected base64 failure");
        assert!(err.is_decryption_error());
        assert!(err.source_error().is_some());
    }

    #[test]
    fn test_truncated_ciphertext() {
        let mc = MagicCrypt::new("magickey", KeyStrength::Bits256, "");
        let mut raw = mc.encrypt_to_bytes(b"some longer plaintext");
        raw.truncate(raw.len() - 3);
        let err = mc.decrypt_bytes_to_bytes(&raw).expect_err("expected failure");
        assert!(err.is_decryption_error());

        let err = mc.decrypt_bytes_to_bytes(&[]).expect_err("expected failure");
        assert!(err.is_decryption_error());
        let err = mc.decrypt_base64_to_bytes("").expect_err("expected failure");
        assert!(err.is_decryption_error());
    }

    #[test]
    fn test_non_utf8_plaintext() {
        let mc = MagicCrypt::new("magickey", KeyStrength::Bits64, "");
        let encrypted = mc.encrypt_bytes_to_base64(&[0xff, 0xfe, 0x00]);
        let err = mc
            .decrypt_base64_to_string(&encrypted)
            .expect_err("expected encoding failure");
        assert!(err.is_encoding_error());
        assert_eq!(mc.decrypt_base64_to_bytes(&encrypted).unwrap(), [0xff, 0xfe, 0x00]);
    }

    #[test]
    fn test_session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MagicCrypt>();

        let mc = Arc::new(MagicCrypt::new("magickey", KeyStrength::Bits128, ""));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mc = mc.clone();
                std::thread::spawn(move || {
                    let text = format!("thread {i}");
                    let encrypted = mc.encrypt_str_to_base64(&text);
                    mc.decrypt_base64_to_string(&encrypted).unwrap() == text
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
