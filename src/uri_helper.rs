use std::{borrow::Cow, str::FromStr};

use secrecy::SecretString;

use crate::{OtpError, OtpHashAlgorithm};

pub(crate) const URI_SCHEME: &str = "otpauth";
const TOTP_TYPE: &str = "totp";

const URI_SECRET_QUERY: &str = "secret";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_DIGITS_QUERY: &str = "digits";

/// Parameters carried by an `otpauth://totp/...` key URI.
///
/// Only the secret is mandatory, the rest is `None` when the URI omits it.
#[derive(Debug)]
pub(crate) struct KeyUri {
    pub(crate) secret: SecretString,
    pub(crate) algorithm: Option<OtpHashAlgorithm>,
    pub(crate) digits: Option<u32>,
    pub(crate) period: Option<u64>,
}

pub(crate) fn is_key_uri(text: &str) -> bool {
    text.trim_start()
        .to_lowercase()
        .starts_with(&format!("{URI_SCHEME}://"))
}

pub(crate) fn parse_key_uri(uri: &str) -> Result<KeyUri, OtpError> {
    let uri = url::Url::parse(uri.trim()).map_err(OtpError::UriParseError)?;

    let domain = uri.domain();
    if domain.is_none() || domain.is_some_and(|d| d != TOTP_TYPE) {
        return Err(OtpError::InvalidUriType(
            domain.unwrap_or("None").into(),
            TOTP_TYPE.into(),
        ));
    }

    let mut secret = String::new();
    let mut algorithm = None;
    let mut period = None;
    let mut digits = None;

    for params in uri.query_pairs() {
        match params.0 {
            Cow::Borrowed(URI_SECRET_QUERY) => secret = params.1.to_string(),
            Cow::Borrowed(URI_HASH_QUERY) => {
                algorithm = Some(OtpHashAlgorithm::from_str(params.1.as_ref())?)
            }
            Cow::Borrowed(URI_PERIOD_QUERY) => {
                period = Some(
                    u64::from_str(params.1.as_ref())
                        .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?,
                )
            }
            Cow::Borrowed(URI_DIGITS_QUERY) => {
                digits = Some(
                    u32::from_str(params.1.as_ref())
                        .map_err(|e| OtpError::IntegerParseError(e, URI_DIGITS_QUERY.into()))?,
                )
            }
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }

    Ok(KeyUri {
        secret: SecretString::from(secret),
        algorithm,
        digits,
        period,
    })
}
