//! AWS S3 REST authentication (the `AWS` scheme).
//!
//! - [Signing and authenticating REST requests](https://docs.aws.amazon.com/AmazonS3/latest/userguide/RESTAuthentication.html)

use std::fmt::Write;
use std::time::Duration;

use awsauth_core::hash::base64_hmac_sha1;
use awsauth_core::time::{format_rfc1123z, now, DateTime};
use awsauth_core::{Body, Error, Result, SignRequest, SigningMethod, SigningRequest};
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::HeaderValue;
use log::debug;
use percent_encoding::utf8_percent_encode;

use crate::constants::{
    AWS_ACCESS_KEY_ID, AWS_QUERY_ENCODE_SET, EXPIRES, S3_SUB_RESOURCES, SIGNATURE, X_AMZ_PREFIX,
    X_AMZ_SECURITY_TOKEN,
};
use crate::endpoint::virtual_hosted_bucket;
use crate::Credential;

/// RequestSigner that implement the S3 `AWS` authentication scheme.
///
/// Supports both header signing and presigned urls.
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for S3.
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
        let now = self.time.unwrap_or_else(now);
        let mut signed_req = SigningRequest::build(req)?;
        if signed_req.path.is_empty() {
            signed_req.path = "/".to_string();
        }

        let signed = match SigningMethod::from(expires_in) {
            SigningMethod::Header => sign_header(&mut signed_req, credential, now),
            SigningMethod::Query(expire) => sign_query(&mut signed_req, credential, now, expire),
        };

        // Hand the parts back even if signing failed.
        signed_req.apply(req)?;
        signed
    }
}

fn sign_header(req: &mut SigningRequest, cred: &Credential, now: DateTime) -> Result<()> {
    // Token must be set before building string to sign.
    if let Some(token) = cred.session_token() {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        req.headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }
    req.header_insert_if_absent(DATE, || format_rfc1123z(now))?;

    let amz_headers = req.header_to_vec_with_prefix(X_AMZ_PREFIX)?;
    let string_to_sign = string_to_sign(
        req,
        req.header_get_or_default(&DATE)?,
        amz_headers,
    )?;
    let signature = base64_hmac_sha1(
        cred.secret_access_key.as_bytes(),
        string_to_sign.as_bytes(),
    );

    let mut authorization =
        HeaderValue::from_str(&format!("AWS {}:{}", cred.access_key_id, signature))?;
    authorization.set_sensitive(true);
    req.headers.insert(AUTHORIZATION, authorization);

    Ok(())
}

fn sign_query(
    req: &mut SigningRequest,
    cred: &Credential,
    now: DateTime,
    expire: Duration,
) -> Result<()> {
    let expire = chrono::TimeDelta::from_std(expire).map_err(|e| {
        Error::request_invalid("expires_in is out of range").with_source(e)
    })?;
    let expires = now
        .checked_add_signed(expire)
        .ok_or_else(|| Error::request_invalid("expires_in is out of range"))?
        .timestamp()
        .to_string();

    let mut amz_headers = req.header_to_vec_with_prefix(X_AMZ_PREFIX)?;
    if let Some(token) = cred.session_token() {
        amz_headers.retain(|(k, _)| k != X_AMZ_SECURITY_TOKEN);
        amz_headers.push((X_AMZ_SECURITY_TOKEN.to_string(), token.to_string()));
    }
    let string_to_sign = string_to_sign(req, &expires, amz_headers)?;
    let signature = base64_hmac_sha1(
        cred.secret_access_key.as_bytes(),
        string_to_sign.as_bytes(),
    );

    // Keep the caller's query as is, only replace auth params from a
    // previous signing.
    let mut query: Vec<String> = req
        .query
        .split('&')
        .filter(|v| {
            let key = v.split('=').next().unwrap_or_default();
            !v.is_empty()
                && ![AWS_ACCESS_KEY_ID, EXPIRES, SIGNATURE, X_AMZ_SECURITY_TOKEN].contains(&key)
        })
        .map(|v| v.to_string())
        .collect();
    let mut push = |k: &str, v: &str| {
        query.push(format!(
            "{k}={}",
            utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET)
        ))
    };
    push(AWS_ACCESS_KEY_ID, &cred.access_key_id);
    push(EXPIRES, &expires);
    push(SIGNATURE, &signature);
    if let Some(token) = cred.session_token() {
        push(X_AMZ_SECURITY_TOKEN, token);
    }
    req.query = query.join("&");

    Ok(())
}

/// Build the string to sign.
///
/// ```text
/// GET
///
///
/// Tue, 27 Mar 2007 19:36:42 +0000
/// x-amz-meta-author:johnsmith
/// /johnsmith/photos/puppy.jpg
/// ```
///
/// The date line carries the expiry as unix seconds for presigned urls.
/// The `Content-MD5` line is always empty.
fn string_to_sign(
    req: &SigningRequest,
    date: &str,
    amz_headers: Vec<(String, String)>,
) -> Result<String> {
    let mut f = String::with_capacity(256);
    writeln!(f, "{}", req.method)?;
    writeln!(f)?;
    writeln!(f, "{}", req.header_get_or_default(&CONTENT_TYPE)?)?;
    writeln!(f, "{date}")?;
    write!(f, "{}", canonical_amz_headers(amz_headers))?;
    write!(f, "{}", canonical_resource(req)?)?;
    debug!("calculated string to sign: {f}");

    Ok(f)
}

/// Join `x-amz-*` headers sorted by name, each line ending with `\n`.
fn canonical_amz_headers(headers: Vec<(String, String)>) -> String {
    let headers = headers
        .into_iter()
        .map(|(k, v)| (k, v.replace('\n', " ")))
        .collect();

    let mut s = SigningRequest::header_to_string(headers, ":", "\n");
    if !s.is_empty() {
        s.push('\n');
    }
    s
}

/// Build the resource part: bucket for virtual-hosted-style requests, path
/// and the sub-resource the query starts with.
fn canonical_resource(req: &SigningRequest) -> Result<String> {
    let host = req.hostname()?;

    let mut s = String::with_capacity(64);
    if let Some(bucket) = virtual_hosted_bucket(&host) {
        s.push('/');
        s.push_str(bucket);
    }
    s.push_str(&req.path);
    for sub_resource in S3_SUB_RESOURCES {
        if req.query.starts_with(sub_resource) {
            s.push('?');
            s.push_str(sub_resource);
        }
    }

    Ok(s)
}
