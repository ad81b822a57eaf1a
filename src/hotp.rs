use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::{OtpCode, OtpError, OtpHashAlgorithm};

pub const MIN_DIGITS: u32 = 1;
pub const MAX_DIGITS: u32 = 10;

macro_rules! hmac_sign {
    ($hash:ty, $key:expr, $data:expr) => {{
        let mut mac =
            <Hmac<$hash> as Mac>::new_from_slice($key).map_err(|_| OtpError::InvalidKeyLength)?;
        mac.update($data);
        mac.finalize().into_bytes().to_vec()
    }};
}

/// Calculates the HMAC digest of the counter (as 8 big-endian bytes)
/// keyed with the decoded secret.
pub fn calc_digest(
    decoded_secret: &[u8],
    algorithm: OtpHashAlgorithm,
    counter: u64,
) -> Result<Vec<u8>, OtpError> {
    let data = counter.to_be_bytes();

    let digest = match algorithm {
        OtpHashAlgorithm::SHA1 => hmac_sign!(Sha1, decoded_secret, &data),
        OtpHashAlgorithm::SHA256 => hmac_sign!(Sha256, decoded_secret, &data),
        OtpHashAlgorithm::SHA512 => hmac_sign!(Sha512, decoded_secret, &data),
        OtpHashAlgorithm::MD5 => hmac_sign!(Md5, decoded_secret, &data),
    };

    Ok(digest)
}

/// Encodes the HMAC digest into a truncated integer.
///
/// A 16-byte MD5 digest cannot always fit the 4 bytes the offset points at,
/// in which case this returns [`OtpError::InvalidDigest`].
pub(crate) fn encode_digest_truncated(digest: &[u8], target_digits_count: u32) -> Result<u32, OtpError> {
    // While sometimes this is a hardcoded 19
    // the last byte tells us the offset for any algorithm
    let offset = match digest.last() {
        Some(x) => *x & 0xf,
        None => return Err(OtpError::InvalidDigest(0, 0)),
    } as usize;

    let code_bytes: [u8; 4] = digest
        .get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(OtpError::InvalidDigest(digest.len(), offset))?;

    let code = u64::from(u32::from_be_bytes(code_bytes) & 0x7fff_ffff);
    let truncation_factor = 10u64
        .checked_pow(target_digits_count)
        .ok_or(OtpError::InvalidDigits(target_digits_count))?;

    // Always below 2^31, so it fits back into a u32
    Ok((code % truncation_factor) as u32)
}

/// Generates an HOTP code for `counter`, truncated to `digits` decimal digits.
pub fn generate(
    decoded_secret: &[u8],
    algorithm: OtpHashAlgorithm,
    counter: u64,
    digits: u32,
) -> Result<OtpCode, OtpError> {
    if decoded_secret.is_empty() {
        return Err(OtpError::EmptySecret);
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(OtpError::InvalidDigits(digits));
    }

    let digest = calc_digest(decoded_secret, algorithm, counter)?;
    let code = encode_digest_truncated(&digest, digits)?;

    Ok(OtpCode { code, digits })
}
