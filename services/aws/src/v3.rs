//! AWS Signature Version 3, as used by Route 53 and SES.
//!
//! Only the request date is signed.

use std::time::Duration;

use awsauth_core::hash::base64_hmac_sha256;
use awsauth_core::time::{format_rfc1123z, now, DateTime};
use awsauth_core::{Body, Error, Result, SignRequest, SigningRequest};
use http::header::{HeaderName, CONTENT_TYPE, DATE};
use http::HeaderValue;
use log::debug;

use crate::constants::{
    DEFAULT_CONTENT_TYPE, HMAC_SHA256, X_AMZN_AUTHORIZATION, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::Credential;

/// RequestSigner that implement AWS SigV3 (`AWS3-HTTPS`).
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for AWS SigV3.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

impl SignRequest for RequestSigner {
    type Credential = Credential;

    fn sign_request(
        &self,
        req: &mut http::Request<Body>,
        credential: &Self::Credential,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        if expires_in.is_some() {
            return Err(Error::request_invalid(
                "aws v3 signer doesn't support query signing",
            ));
        }

        let now = self.time.unwrap_or_else(now);
        let mut signed_req = SigningRequest::build(req)?;
        let signed = sign(&mut signed_req, credential, now);

        // Hand the parts back even if signing failed.
        signed_req.apply(req)?;
        signed
    }
}

fn sign(req: &mut SigningRequest, cred: &Credential, now: DateTime) -> Result<()> {
    if let Some(token) = cred.session_token() {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        req.headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }

    let date = format_rfc1123z(now);
    req.header_insert_if_absent(CONTENT_TYPE, || DEFAULT_CONTENT_TYPE.to_string())?;
    req.header_insert_if_absent(DATE, || date.clone())?;
    req.header_insert_if_absent(HeaderName::from_static(X_AMZ_DATE), || date)?;

    let string_to_sign = req.header_get_or_default(&HeaderName::from_static(X_AMZ_DATE))?;
    debug!("calculated string to sign: {string_to_sign}");
    let signature = base64_hmac_sha256(
        cred.secret_access_key.as_bytes(),
        string_to_sign.as_bytes(),
    );

    let mut authorization = HeaderValue::from_str(&format!(
        "AWS3-HTTPS AWSAccessKeyId={}, Algorithm={}, Signature={}",
        cred.access_key_id, HMAC_SHA256, signature
    ))?;
    authorization.set_sensitive(true);
    req.headers.insert(X_AMZN_AUTHORIZATION, authorization);

    Ok(())
}
