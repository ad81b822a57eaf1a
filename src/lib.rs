pub mod config;
pub mod device;
pub mod expiry;
pub mod hotp;
pub mod secret;
pub mod sink;
pub mod totp;
pub(crate) mod uri_helper;

use core::num;
use std::{fmt::Display, str::FromStr};

pub use config::{ConfigError, DeviceConfig, DeviceConfigBuilder};
pub use device::{Clock, Device, DeviceError, OtpSample, SystemClock, TickOutcome};
pub use expiry::{classify, classify_with_threshold, Severity, DEFAULT_WARN_SECONDS};
pub use sink::{OutputSink, SinkError, Terminal, TerminalColor};
pub use totp::{generate, Totp};

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Secret decode error")]
    SecretDecode(data_encoding::DecodeError),
    #[error("Invalid secret encoding")]
    SecretEncoding(data_encoding::SpecificationError),
    #[error("The secret is empty")]
    EmptySecret,
    #[error("Invalid HMAC key length")]
    InvalidKeyLength,
    #[error("Digest of {0} bytes is too short for truncation offset {1}")]
    InvalidDigest(usize, usize),
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256, SHA512 or MD5")]
    InvalidHashingAlgorithm(String),
    #[error("Invalid digit count, found {0}. Expected a value between 1 and 10")]
    InvalidDigits(u32),
    #[error("The period must be at least one second")]
    InvalidPeriod,
    #[error("Timestamp {0} is before the UNIX epoch")]
    TimeBeforeEpoch(i64),
    #[error("The provided URI is not from valid, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(num::ParseIntError, String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
    MD5,
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
            Self::MD5 => write!(f, "MD5"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> std::prelude::v1::Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            "MD5" => Ok(Self::MD5),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{OtpCode, OtpError, OtpHashAlgorithm};

    #[rstest]
    #[case("SHA1", OtpHashAlgorithm::SHA1)]
    #[case("sha256", OtpHashAlgorithm::SHA256)]
    #[case("Sha512", OtpHashAlgorithm::SHA512)]
    #[case("md5", OtpHashAlgorithm::MD5)]
    fn parses_algorithm_names(#[case] name: &str, #[case] expected: OtpHashAlgorithm) {
        assert_eq!(expected, name.parse::<OtpHashAlgorithm>().unwrap());
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        let err = "SHA3".parse::<OtpHashAlgorithm>().unwrap_err();
        assert!(matches!(err, OtpError::InvalidHashingAlgorithm(name) if name == "SHA3"));
    }

    #[test]
    fn code_is_zero_padded() {
        let code = OtpCode { code: 42, digits: 6 };
        assert_eq!("000042", code.to_string());
    }
}
