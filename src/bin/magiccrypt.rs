//! MagicCrypt CLI - encrypt and decrypt files with a secret string
//!
//! Encrypted files contain base64 text. The secret is read from the terminal
//! (no echo) or from stdin; the IV secret, if any, from a file.

use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use magiccrypt::error::Result;
use magiccrypt::file_ops;
use magiccrypt::secret::{ReaderSecretReader, SecretReader, TerminalSecretReader};
use magiccrypt::{ErrorCategory, ErrorKind, KeyStrength, MagicCrypt, MagicCryptError};

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "MAGICCRYPT_LOG";

#[derive(Parser)]
#[command(name = "magiccrypt")]
#[command(version)]
#[command(about = "Secret-keyed DES/AES-CBC file encryption.", long_about = None)]
struct Cli {
    /// Read the secret from stdin instead of from terminal
    #[arg(long, global = true)]
    secret_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CryptArgs {
    /// Path to the file to read
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Path to the file to write
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Key strength in bits: 64 (DES), 128, 192 or 256 (AES)
    #[arg(short, long, value_name = "BITS", default_value = "128")]
    bits: KeyStrength,

    /// File holding the IV secret; without it the IV is all zeros
    #[arg(long, value_name = "FILE")]
    iv_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file to base64 text
    #[command(alias = "e")]
    Encrypt(CryptArgs),

    /// Decrypt base64 text back to the original file
    #[command(alias = "d")]
    Decrypt(CryptArgs),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Encrypt(args) => open_session(cli.secret_stdin, args)
            .and_then(|session| file_ops::encrypt_file(&args.input, &args.output, &session)),
        Commands::Decrypt(args) => open_session(cli.secret_stdin, args)
            .and_then(|session| file_ops::decrypt_file(&args.input, &args.output, &session)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", anyhow::Error::from(e));
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_session(use_stdin: bool, args: &CryptArgs) -> Result<MagicCrypt> {
    let mut reader = get_secret_reader(use_stdin);
    let secret = reader.read_secret()?;
    let iv_secret = match &args.iv_file {
        Some(path) => read_iv_secret(path)?,
        None => Default::default(),
    };
    Ok(MagicCrypt::new(&secret, args.bits, &iv_secret))
}

fn read_iv_secret(path: &Path) -> Result<zeroize::Zeroizing<String>> {
    let file = File::open(path).map_err(|e| {
        MagicCryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to open IV secret file {}", path.display()),
            e,
        )
    })?;
    ReaderSecretReader::new(Box::new(file))
        .read_secret()
        .map_err(|e| e.with_context(format!("failed to read IV secret from {}", path.display())))
}

fn get_secret_reader(use_stdin: bool) -> Box<dyn SecretReader> {
    if use_stdin {
        Box::new(ReaderSecretReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalSecretReader::default())
    }
}
