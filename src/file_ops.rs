//! File encryption/decryption operations
//!
//! Encrypted files hold the base64 text produced by
//! [`MagicCrypt::encrypt_bytes_to_base64`], so they can be pasted anywhere
//! text goes and decrypted by any implementation of the same scheme.

use crate::cipher::MagicCrypt;
use crate::error::{ErrorCategory, ErrorKind, MagicCryptError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Encrypt a file
///
/// Reads plaintext bytes from `input_path` and writes the base64 ciphertext
/// to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(input_path: &Path, output_path: &Path, session: &MagicCrypt) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let encoded = session.encrypt_bytes_to_base64(&plaintext);
    debug!(
        input = %input_path.display(),
        plaintext_len = plaintext.len(),
        algorithm = session.algorithm().name(),
        "encrypted file"
    );
    write_file_secure(output_path, encoded.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    Ok(())
}

/// Decrypt a file
///
/// Reads base64 ciphertext from `input_path` and writes the plaintext bytes
/// to `output_path`. ASCII whitespace around the base64 text is ignored, so
/// a trailing newline added by an editor does no harm.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(input_path: &Path, output_path: &Path, session: &MagicCrypt) -> Result<()> {
    let encoded_bytes = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let encoded = String::from_utf8(encoded_bytes).map_err(|e| {
        MagicCryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::DecryptionFailed,
            "input file is not base64 text",
            e,
        )
    })?;
    let plaintext = session
        .decrypt_base64_to_bytes(encoded.trim_ascii())
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(())
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                MagicCryptError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> MagicCryptError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    MagicCryptError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
