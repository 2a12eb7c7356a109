//! Secret reading for the command line tool.
//!
//! Secrets are strings: the key derivation hashes their UTF-8 bytes, so any
//! reader that yields non-UTF-8 data fails with an encoding error.

use crate::error::{ErrorCategory, ErrorKind, MagicCryptError, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Source of a secret string
pub trait SecretReader {
    /// Read a secret, wrapped in `Zeroizing` so it is wiped when dropped.
    fn read_secret(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed secret (for testing)
pub struct ConstantSecretReader {
    secret: Zeroizing<String>,
}

impl ConstantSecretReader {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }
}

impl SecretReader for ConstantSecretReader {
    fn read_secret(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.secret.clone())
    }
}

/// Reads a secret from any io::Read source until EOF.
///
/// A single trailing line ending (`\n` or `\r\n`) is dropped, so
/// `echo secret | magiccrypt --secret-stdin ...` uses `secret`.
pub struct ReaderSecretReader {
    reader: Box<dyn Read>,
}

impl ReaderSecretReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl SecretReader for ReaderSecretReader {
    fn read_secret(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading secret: {}", e),
                e,
            )
        })?;
        if data.ends_with(b"\n") {
            data.pop();
            if data.ends_with(b"\r") {
                data.pop();
            }
        }
        let text = std::str::from_utf8(&data).map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Encoding,
                "secret is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Reads a secret from the terminal with no echo
pub struct TerminalSecretReader {
    prompt: &'static str,
}

impl TerminalSecretReader {
    pub fn new(prompt: &'static str) -> Self {
        Self { prompt }
    }
}

impl Default for TerminalSecretReader {
    fn default() -> Self {
        Self::new("Secret (magiccrypt): ")
    }
}

impl SecretReader for TerminalSecretReader {
    fn read_secret(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(MagicCryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::SecretUnavailable,
                "cannot read secret from terminal - stdin is not a terminal",
            ));
        }

        io::stderr()
            .write_all(self.prompt.as_bytes())
            .and_then(|()| io::stderr().flush())
            .map_err(|e| {
                MagicCryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // Read *without echo*
        let secret = rpassword::read_password().map_err(|e| {
            MagicCryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::SecretUnavailable,
                format!("failure reading secret: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(secret))
    }
}
