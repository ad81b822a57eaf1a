use std::{
    fmt::Display,
    fs::{self, Metadata},
    io,
    path::{Path, PathBuf},
};

use secrecy::{ExposeSecret, SecretBox, SecretSlice, SecretString};

use crate::{
    sink::{OutputSink, SinkError},
    uri_helper::{self, KeyUri},
    OtpError, OtpHashAlgorithm,
};

pub const SECRET_FILE_ENV: &str = "MFA_SECRET_FILE";
pub const DEFAULT_SECRET_DIR: &str = ".mfa";
pub const DEFAULT_SECRET_FILE: &str = "secret";

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Could not determine the home directory for the default secret file")]
    NoHomeDirectory,
    #[error("Could not read secret file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error("Could not report an insecure secret file")]
    Sink(#[from] SinkError),
}

const BASE32_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Unpadded RFC 4648 base32 that ignores non-zero trailing bits in the last
/// symbol, as most authenticator apps do.
fn lenient_base32() -> Result<data_encoding::Encoding, OtpError> {
    let mut spec = data_encoding::Specification::new();
    spec.symbols.push_str(BASE32_SYMBOLS);
    spec.check_trailing_bits = false;

    spec.encoding().map_err(OtpError::SecretEncoding)
}

/// Decodes a secret (given as an RFC4648 base32-encoded ASCII string)
/// into a byte string.
///
/// Whitespace and `=` padding are ignored and lowercase letters accepted.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(OtpError::EmptySecret);
    }

    lenient_base32()?
        .decode(normalized.as_bytes())
        .map_err(OtpError::SecretDecode)
}

/// Where the secret was found.
///
/// Sources are tried in this order: an explicit value, an explicit file
/// (`--secret-file`, or the file named by `MFA_SECRET_FILE`), and finally
/// `$HOME/.mfa/secret`.
#[derive(Debug)]
pub enum SecretSource {
    Value(SecretString),
    File(PathBuf),
    DefaultFile(PathBuf),
}

impl Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(_) => write!(f, "explicit value"),
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::DefaultFile(path) => write!(f, "default file {}", path.display()),
        }
    }
}

/// Decoded secret plus whatever parameters a key URI carried along.
#[derive(Debug)]
pub struct SecretMaterial {
    pub secret: SecretSlice<u8>,
    pub algorithm: Option<OtpHashAlgorithm>,
    pub digits: Option<u32>,
    pub period: Option<u64>,
}

impl SecretSource {
    /// Picks the highest priority source. Empty values count as absent.
    pub fn resolve(
        value: Option<String>,
        file: Option<PathBuf>,
        home_dir: Option<PathBuf>,
    ) -> Result<Self, SecretError> {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            return Ok(Self::Value(SecretString::from(value)));
        }
        if let Some(file) = file.filter(|f| !f.as_os_str().is_empty()) {
            return Ok(Self::File(file));
        }

        let home = home_dir.ok_or(SecretError::NoHomeDirectory)?;
        Ok(Self::DefaultFile(
            home.join(DEFAULT_SECRET_DIR).join(DEFAULT_SECRET_FILE),
        ))
    }

    /// Resolves against the current user's home directory.
    pub fn from_environment(
        value: Option<String>,
        file: Option<PathBuf>,
    ) -> Result<Self, SecretError> {
        let home_dir = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

        Self::resolve(value, file, home_dir)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Value(_) => None,
            Self::File(path) | Self::DefaultFile(path) => Some(path),
        }
    }

    /// Reads and decodes the secret.
    ///
    /// A secret file readable by anyone but its owner is reported once
    /// through `sink.warn` before it is read.
    pub fn load<S: OutputSink + ?Sized>(&self, sink: &mut S) -> Result<SecretMaterial, SecretError> {
        tracing::debug!(source = %self, "loading secret");

        match self {
            Self::Value(value) => parse_secret(value.expose_secret()),
            Self::File(path) | Self::DefaultFile(path) => {
                let text = read_secret_file(path, sink)?;
                parse_secret(text.expose_secret())
            }
        }
    }
}

fn read_secret_file<S: OutputSink + ?Sized>(
    path: &Path,
    sink: &mut S,
) -> Result<SecretString, SecretError> {
    let read_error = |source: io::Error| SecretError::Read {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(read_error)?;
    if is_insecure(&metadata) {
        tracing::debug!(path = %path.display(), "secret file is accessible by group or others");
        sink.warn(&format!(
            "WARNING - secret file {:?} is not secure\n",
            path.display().to_string()
        ))?;
    }

    let text = fs::read_to_string(path).map_err(read_error)?;
    Ok(SecretString::from(text))
}

#[cfg(unix)]
fn is_insecure(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o077 != 0
}

#[cfg(not(unix))]
fn is_insecure(_metadata: &Metadata) -> bool {
    false
}

fn parse_secret(text: &str) -> Result<SecretMaterial, SecretError> {
    if uri_helper::is_key_uri(text) {
        let KeyUri {
            secret,
            algorithm,
            digits,
            period,
        } = uri_helper::parse_key_uri(text)?;

        return Ok(SecretMaterial {
            secret: decode_to_secret(secret.expose_secret())?,
            algorithm,
            digits,
            period,
        });
    }

    Ok(SecretMaterial {
        secret: decode_to_secret(text)?,
        algorithm: None,
        digits: None,
        period: None,
    })
}

fn decode_to_secret(text: &str) -> Result<SecretSlice<u8>, OtpError> {
    Ok(SecretBox::new(decode_secret(text)?.into_boxed_slice()))
}
