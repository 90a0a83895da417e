//! AWS Signature Version 4.
//!
//! - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)

use std::fmt::Write;
use std::time::Duration;

use awsauth_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use awsauth_core::time::{format_iso8601, now, DateTime};
use awsauth_core::{Body, Error, Result, SignRequest, SigningRequest};
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use http::header::HeaderName;
use http::HeaderValue;
use log::debug;

use crate::constants::{
    AWS4_HMAC_SHA256, DEFAULT_CONTENT_TYPE, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::endpoint::service_and_region;
use crate::Credential;

/// Headers covered by the signature, in canonical order.
const SIGNED_HEADERS: [&str; 3] = ["content-type", "host", X_AMZ_DATE];

/// RequestSigner that implement AWS SigV4.
///
/// Service and region are derived from the request host, see
/// [`service_and_region`](crate::service_and_region).
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for AWS SigV4.
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
                "aws v4 signer doesn't support query signing",
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

/// Values computed while signing and shared between the steps.
#[derive(Debug, Default)]
struct Metadata {
    algorithm: String,
    credential_scope: String,
    signed_headers: String,
    date: String,
    region: String,
    service: String,
}

fn sign(req: &mut SigningRequest, cred: &Credential, now: DateTime) -> Result<()> {
    // Body is read before any header is touched.
    req.capture_body()?;

    // Security token is not signed, but STS credentials are rejected without it.
    if let Some(token) = cred.session_token() {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        req.headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }

    prepare(req, now)?;

    let mut meta = Metadata::default();
    let hashed_canonical_request = hashed_canonical_request(req, &mut meta)?;
    let string_to_sign = string_to_sign(req, &hashed_canonical_request, &mut meta)?;
    let signing_key = signing_key(
        &cred.secret_access_key,
        &meta.date,
        &meta.region,
        &meta.service,
    );
    let signature = signature(&signing_key, &string_to_sign);

    let mut authorization = HeaderValue::from_str(&build_auth_header(cred, &signature, &meta))?;
    authorization.set_sensitive(true);
    req.headers.insert(AUTHORIZATION, authorization);

    Ok(())
}

fn prepare(req: &mut SigningRequest, now: DateTime) -> Result<()> {
    req.header_insert_if_absent(CONTENT_TYPE, || DEFAULT_CONTENT_TYPE.to_string())?;
    req.header_insert_if_absent(HeaderName::from_static(X_AMZ_DATE), || format_iso8601(now))?;
    if req.path.is_empty() {
        req.path = "/".to_string();
    }

    Ok(())
}

/// Build the canonical request.
///
/// ```text
/// POST
/// /
///
/// content-type:application/x-www-form-urlencoded; charset=utf-8
/// host:iam.amazonaws.com
/// x-amz-date:20110909T233600Z
///
/// content-type;host;x-amz-date
/// b6359072c78d70ebee1e81adcbab4f01bf2c23245fa365ef83fe8f1f955085e2
/// ```
///
/// Path and query are used exactly as they appear in the uri.
fn canonical_request(req: &mut SigningRequest, meta: &mut Metadata) -> Result<String> {
    let payload = req.capture_body()?;

    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);
    writeln!(f, "{}", req.method)?;
    writeln!(f, "{}", req.path)?;
    writeln!(f, "{}", req.query)?;
    writeln!(f, "content-type:{}", req.header_get_or_default(&CONTENT_TYPE)?)?;
    writeln!(f, "{}:{}", HOST, req.host()?)?;
    let date = req.header_get_or_default(&HeaderName::from_static(X_AMZ_DATE))?;
    writeln!(f, "{X_AMZ_DATE}:{date}")?;
    writeln!(f)?;

    meta.signed_headers = SIGNED_HEADERS.join(";");
    writeln!(f, "{}", meta.signed_headers)?;
    write!(f, "{}", hex_sha256(&payload))?;
    debug!("calculated canonical request: {f}");

    Ok(f)
}

fn hashed_canonical_request(req: &mut SigningRequest, meta: &mut Metadata) -> Result<String> {
    let creq = canonical_request(req, meta)?;
    Ok(hex_sha256(creq.as_bytes()))
}

/// Build the string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20110909T233600Z
/// 20110909/us-east-1/iam/aws4_request
/// 3511de7e95d28ecd39e9513b642aee07e54f4941150d8df8bf94b328ef7e55e2
/// ```
fn string_to_sign(
    req: &SigningRequest,
    hashed_canonical_request: &str,
    meta: &mut Metadata,
) -> Result<String> {
    let timestamp = req.header_get_or_default(&HeaderName::from_static(X_AMZ_DATE))?;
    let (service, region) = service_and_region(&req.hostname()?);

    meta.date = timestamp.chars().take(8).collect();
    meta.service = service;
    meta.region = region;
    meta.algorithm = AWS4_HMAC_SHA256.to_string();
    meta.credential_scope = format!(
        "{}/{}/{}/aws4_request",
        meta.date, meta.region, meta.service
    );
    debug!("calculated scope: {}", meta.credential_scope);

    let mut f = String::with_capacity(128);
    writeln!(f, "{}", meta.algorithm)?;
    writeln!(f, "{timestamp}")?;
    writeln!(f, "{}", meta.credential_scope)?;
    write!(f, "{hashed_canonical_request}")?;
    debug!("calculated string to sign: {f}");

    Ok(f)
}

/// Derive the signing key scoped to date, region and service.
fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

fn signature(signing_key: &[u8], string_to_sign: &str) -> String {
    hex_hmac_sha256(signing_key, string_to_sign.as_bytes())
}

fn build_auth_header(cred: &Credential, signature: &str, meta: &Metadata) -> String {
    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        meta.algorithm, cred.access_key_id, meta.credential_scope, meta.signed_headers, signature
    )
}
