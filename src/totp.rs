use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretSlice};

use crate::{hotp, OtpCode, OtpError, OtpHashAlgorithm};

pub const DEFAULT_PERIOD: u64 = 30;
pub const DEFAULT_DIGITS: u32 = 6;

/// Generates the TOTP for `seconds_since_epoch` from a decoded secret.
///
/// The moving factor is `floor(seconds_since_epoch / period)`, so every
/// timestamp inside the same period window yields the same code.
pub fn generate(
    decoded_secret: &[u8],
    seconds_since_epoch: u64,
    algorithm: OtpHashAlgorithm,
    digits: u32,
    period: u64,
) -> Result<OtpCode, OtpError> {
    let counter = seconds_since_epoch
        .checked_div(period)
        .ok_or(OtpError::InvalidPeriod)?;

    hotp::generate(decoded_secret, algorithm, counter, digits)
}

/// Seconds left before the code for `seconds_since_epoch` expires, or `None`
/// for a zero period.
pub fn remaining_seconds(seconds_since_epoch: u64, period: u64) -> Option<u64> {
    seconds_since_epoch
        .checked_rem(period)
        .map(|elapsed| period - elapsed)
}

/// Converts a wall-clock instant into whole seconds since the UNIX epoch.
pub fn unix_seconds(timestamp: &DateTime<Utc>) -> Result<u64, OtpError> {
    let seconds = timestamp.timestamp();
    u64::try_from(seconds).map_err(|_| OtpError::TimeBeforeEpoch(seconds))
}

#[derive(Debug)]
pub struct Totp {
    secret: SecretSlice<u8>,
    pub(crate) algorithm: OtpHashAlgorithm,
    pub(crate) period: u64,
    pub(crate) digits: u32,
}

impl Totp {
    /// Creates the config for the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
    /// (TOTP) given the already decoded secret bytes.
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code and a period of 30 seconds
    pub fn new(secret: SecretSlice<u8>) -> Self {
        Self {
            secret,
            algorithm: OtpHashAlgorithm::SHA1,
            period: DEFAULT_PERIOD,
            digits: DEFAULT_DIGITS,
        }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub(crate) fn secret_is_empty(&self) -> bool {
        self.secret.expose_secret().is_empty()
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    /// truncated to the specified number of digits
    pub fn generate(&self, seconds_since_epoch: u64) -> Result<OtpCode, OtpError> {
        generate(
            self.secret.expose_secret(),
            seconds_since_epoch,
            self.algorithm,
            self.digits,
            self.period,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::{assert_eq, assert_ne};
    use rstest::rstest;
    use secrecy::SecretBox;

    use crate::{
        secret::decode_secret,
        totp::{remaining_seconds, unix_seconds, Totp},
        OtpError, OtpHashAlgorithm,
    };

    fn totp_from_base32(secret: &str) -> Totp {
        let decoded = decode_secret(secret).unwrap();
        Totp::new(SecretBox::new(decoded.into_boxed_slice()))
    }

    const SHA1_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    const SHA256_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA";

    const SHA512_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNA";

    #[rstest]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 59, "94287082")]
    #[case(SHA256_SECRET, OtpHashAlgorithm::SHA256, 59, "46119246")]
    #[case(SHA512_SECRET, OtpHashAlgorithm::SHA512, 59, "90693936")]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 1111111109, "07081804")]
    #[case(SHA256_SECRET, OtpHashAlgorithm::SHA256, 1111111109, "68084774")]
    #[case(SHA512_SECRET, OtpHashAlgorithm::SHA512, 1111111109, "25091201")]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 1111111111, "14050471")]
    #[case(SHA256_SECRET, OtpHashAlgorithm::SHA256, 1111111111, "67062674")]
    #[case(SHA512_SECRET, OtpHashAlgorithm::SHA512, 1111111111, "99943326")]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 1234567890, "89005924")]
    #[case(SHA256_SECRET, OtpHashAlgorithm::SHA256, 1234567890, "91819424")]
    #[case(SHA512_SECRET, OtpHashAlgorithm::SHA512, 1234567890, "93441116")]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 2000000000, "69279037")]
    #[case(SHA256_SECRET, OtpHashAlgorithm::SHA256, 2000000000, "90698825")]
    #[case(SHA512_SECRET, OtpHashAlgorithm::SHA512, 2000000000, "38618901")]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 20000000000, "65353130")]
    #[case(SHA256_SECRET, OtpHashAlgorithm::SHA256, 20000000000, "77737706")]
    #[case(SHA512_SECRET, OtpHashAlgorithm::SHA512, 20000000000, "47863826")]
    #[case(SHA1_SECRET, OtpHashAlgorithm::SHA1, 20000000000, "353130")]
    fn totp_test(
        #[case] secret: &str,
        #[case] hash: OtpHashAlgorithm,
        #[case] timestamp: u64,
        #[case] expected: &str,
    ) {
        let mut totp_base = totp_from_base32(secret);
        totp_base
            .with_algorithm(hash)
            .with_digits(expected.len() as u32);

        let generated_otp = totp_base.generate(timestamp).unwrap();
        assert_eq!(expected, generated_otp.to_string());
    }

    #[rstest]
    #[case(0, "282760")]
    #[case(10, "282760")]
    #[case(29, "282760")]
    #[case(30, "996554")]
    #[case(59, "996554")]
    #[case(60, "602287")]
    #[case(1111111109, "071271")]
    fn well_known_secret(#[case] timestamp: u64, #[case] expected: &str) {
        let totp = totp_from_base32("JBSWY3DPEHPK3PXP");

        assert_eq!(expected, totp.generate(timestamp).unwrap().to_string());
    }

    #[test]
    fn codes_are_stable_within_a_window_and_change_across_windows() {
        let totp = totp_from_base32("JBSWY3DPEHPK3PXP");

        let first = totp.generate(30).unwrap();
        for second in 31..60 {
            assert_eq!(first, totp.generate(second).unwrap());
        }
        assert_ne!(first, totp.generate(60).unwrap());
    }

    #[rstest]
    #[case(1)]
    #[case(6)]
    #[case(8)]
    #[case(10)]
    fn output_is_exactly_digits_long(#[case] digits: u32) {
        let mut totp = totp_from_base32("JBSWY3DPEHPK3PXP");
        totp.with_digits(digits);

        for timestamp in [0, 59, 1111111109, 2000000000] {
            let code = totp.generate(timestamp).unwrap().to_string();
            assert_eq!(code.len(), digits as usize);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn md5_works_until_the_offset_runs_past_the_digest() {
        let mut totp = totp_from_base32("JBSWY3DPEHPK3PXP");
        totp.with_algorithm(OtpHashAlgorithm::MD5);

        assert_eq!("423220", totp.generate(0).unwrap().to_string());
        assert!(matches!(
            totp.generate(180),
            Err(OtpError::InvalidDigest(16, _))
        ));
    }

    #[test]
    fn zero_period_is_an_error() {
        let mut totp = totp_from_base32("JBSWY3DPEHPK3PXP");
        totp.with_period(0);

        assert!(matches!(totp.generate(59), Err(OtpError::InvalidPeriod)));
    }

    #[test]
    fn pre_epoch_times_are_rejected() {
        let before_epoch = Utc.timestamp_opt(-1, 0).unwrap();

        assert!(matches!(
            unix_seconds(&before_epoch),
            Err(OtpError::TimeBeforeEpoch(-1))
        ));
        assert_eq!(59, unix_seconds(&Utc.timestamp_opt(59, 0).unwrap()).unwrap());
    }

    #[rstest]
    #[case(0, 30, Some(30))]
    #[case(29, 30, Some(1))]
    #[case(55, 30, Some(5))]
    #[case(59, 60, Some(1))]
    #[case(59, 0, None)]
    fn seconds_until_expiry(
        #[case] timestamp: u64,
        #[case] period: u64,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(expected, remaining_seconds(timestamp, period));
    }
}
