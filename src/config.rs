use std::time::Duration;

use secrecy::SecretSlice;

use crate::{
    expiry::DEFAULT_WARN_SECONDS,
    hotp::{MAX_DIGITS, MIN_DIGITS},
    totp::{DEFAULT_DIGITS, DEFAULT_PERIOD},
    OtpError, OtpHashAlgorithm, Totp,
};

pub const DEFAULT_UPDATE_FREQUENCY_SECS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No secret was provided")]
    MissingSecret,
    #[error("The secret is empty")]
    EmptySecret,
    #[error("Invalid digit count, found {0}. Expected a value between 1 and 10")]
    InvalidDigits(u32),
    #[error("The refresh period must be at least one second")]
    InvalidPeriod,
    #[error("The update frequency must be at least one second")]
    InvalidUpdateFrequency,
    #[error("Unknown terminal color {0}. Expected one of: red, green, yellow, blue, purple, cyan, gray or white")]
    UnknownColor(String),
    #[error(transparent)]
    Otp(#[from] OtpError),
}

/// Immutable settings of a [`crate::Device`], only obtainable through
/// [`DeviceConfigBuilder::build`].
#[derive(Debug)]
pub struct DeviceConfig {
    totp: Totp,
    update_frequency: Duration,
    warn_seconds: u64,
}

impl DeviceConfig {
    pub fn builder() -> DeviceConfigBuilder {
        DeviceConfigBuilder::default()
    }

    pub fn totp(&self) -> &Totp {
        &self.totp
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.totp.algorithm()
    }

    pub fn digits(&self) -> u32 {
        self.totp.digits()
    }

    pub fn period(&self) -> u64 {
        self.totp.period()
    }

    pub fn update_frequency(&self) -> Duration {
        self.update_frequency
    }

    pub fn warn_seconds(&self) -> u64 {
        self.warn_seconds
    }
}

#[derive(Debug)]
pub struct DeviceConfigBuilder {
    secret: Option<SecretSlice<u8>>,
    algorithm: OtpHashAlgorithm,
    digits: u32,
    period: u64,
    update_frequency: u64,
    warn_seconds: u64,
}

impl Default for DeviceConfigBuilder {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: OtpHashAlgorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            update_frequency: DEFAULT_UPDATE_FREQUENCY_SECS,
            warn_seconds: DEFAULT_WARN_SECONDS,
        }
    }
}

impl DeviceConfigBuilder {
    /// Sets the decoded secret bytes.
    pub fn secret(mut self, secret: SecretSlice<u8>) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn algorithm(mut self, algorithm: OtpHashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the algorithm from its name, e.g. `SHA256`.
    pub fn algorithm_name(self, name: &str) -> Result<Self, ConfigError> {
        Ok(self.algorithm(name.parse()?))
    }

    pub fn digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Sets how many seconds a code stays valid.
    pub fn period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// Sets how many seconds pass between two ticks.
    pub fn update_frequency(mut self, seconds: u64) -> Self {
        self.update_frequency = seconds;
        self
    }

    /// Sets how many seconds before expiry a code is shown as a warning.
    pub fn warn_seconds(mut self, seconds: u64) -> Self {
        self.warn_seconds = seconds;
        self
    }

    pub fn build(self) -> Result<DeviceConfig, ConfigError> {
        let secret = self.secret.ok_or(ConfigError::MissingSecret)?;

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digits) {
            return Err(ConfigError::InvalidDigits(self.digits));
        }
        if self.period == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        if self.update_frequency == 0 {
            return Err(ConfigError::InvalidUpdateFrequency);
        }

        let mut totp = Totp::new(secret);
        if totp.secret_is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        totp.with_algorithm(self.algorithm)
            .with_digits(self.digits)
            .with_period(self.period);

        Ok(DeviceConfig {
            totp,
            update_frequency: Duration::from_secs(self.update_frequency),
            warn_seconds: self.warn_seconds,
        })
    }
}
