// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use awsauth_core::time::{now, DateTime};
use awsauth_core::{Body, Error, Result, SignRequest};
use http::header::HOST;
use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::endpoint::service_and_region;
use crate::{s3, v2, v3, v4, Credential};

/// Signature versions supported by AWS services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureVersion {
    /// Query string HMAC-SHA256.
    V2,
    /// `AWS3-HTTPS` header HMAC-SHA256.
    V3,
    /// `AWS4-HMAC-SHA256` canonical request signing.
    V4,
    /// S3 REST authentication with HMAC-SHA1.
    S3,
}

impl SignatureVersion {
    /// Get the signature version a service expects.
    ///
    /// Returns `None` for services we don't know about.
    pub fn for_service(service: &str) -> Option<SignatureVersion> {
        SERVICES.get(service.to_lowercase().as_str()).copied()
    }
}

impl Display for SignatureVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureVersion::V2 => write!(f, "v2"),
            SignatureVersion::V3 => write!(f, "v3"),
            SignatureVersion::V4 => write!(f, "v4"),
            SignatureVersion::S3 => write!(f, "s3"),
        }
    }
}

static SERVICES: Lazy<HashMap<&'static str, SignatureVersion>> = Lazy::new(|| {
    use SignatureVersion::*;

    HashMap::from([
        ("autoscaling", V4),
        ("cloudfront", V4),
        ("cloudformation", V4),
        ("cloudsearch", V4),
        ("monitoring", V4),
        ("dynamodb", V4),
        ("ec2", V2),
        ("elasticmapreduce", V4),
        ("elastictranscoder", V4),
        ("elasticache", V2),
        ("glacier", V4),
        ("kinesis", V4),
        ("redshift", V4),
        ("rds", V4),
        ("sdb", V2),
        ("sns", V4),
        ("sqs", V4),
        ("s3", S3),
        ("elasticbeanstalk", V4),
        ("importexport", V2),
        ("iam", V4),
        ("route53", V3),
        // Simple Email Service
        ("email", V3),
        ("elasticloadbalancing", V4),
    ])
});

/// Dispatcher picks the signature version from the request host and signs
/// with it.
///
/// Services missing from the registry are signed with the fallback version,
/// [`SignatureVersion::V4`] by default.
#[derive(Debug)]
pub struct Dispatcher {
    fallback: Option<SignatureVersion>,
    time: Option<DateTime>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            fallback: Some(SignatureVersion::V4),
            time: None,
        }
    }
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signature version used for unknown services.
    ///
    /// `None` makes signing requests to unknown services fail.
    pub fn with_fallback(mut self, fallback: Option<SignatureVersion>) -> Self {
        self.fallback = fallback;
        self
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

    /// Resolve the signature version for this request.
    pub fn signature_version(&self, req: &http::Request<Body>) -> Result<SignatureVersion> {
        let host = match req.headers().get(HOST) {
            Some(v) => v.to_str()?,
            None => req.uri().host().unwrap_or_default(),
        };
        let host = host.split(':').next().unwrap_or_default().to_lowercase();
        let (service, _) = service_and_region(&host);

        if let Some(version) = SignatureVersion::for_service(&service) {
            debug!("service {service} uses signature version {version}");
            return Ok(version);
        }

        match self.fallback {
            Some(version) => {
                warn!("service {service} is unknown, falling back to signature version {version}");
                Ok(version)
            }
            None => Err(Error::request_invalid(format!(
                "no signature version known for service {service}"
            ))),
        }
    }
}

impl SignRequest for Dispatcher {
    type Credential = Credential;

    fn sign_request(
        &self,
        req: &mut http::Request<Body>,
        credential: &Self::Credential,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let version = self.signature_version(req)?;
        let now = self.time.unwrap_or_else(now);

        match version {
            SignatureVersion::V2 => v2::RequestSigner::new()
                .with_time(now)
                .sign_request(req, credential, expires_in),
            SignatureVersion::V3 => v3::RequestSigner::new()
                .with_time(now)
                .sign_request(req, credential, expires_in),
            SignatureVersion::V4 => v4::RequestSigner::new()
                .with_time(now)
                .sign_request(req, credential, expires_in),
            SignatureVersion::S3 => s3::RequestSigner::new()
                .with_time(now)
                .sign_request(req, credential, expires_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsauth_core::time::parse_rfc3339;
    use http::header::AUTHORIZATION;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("https://iam.amazonaws.com/", SignatureVersion::V4)]
    #[test_case("https://sqs.us-west-2.amazonaws.com/", SignatureVersion::V4)]
    #[test_case("https://ec2.us-west-1.amazonaws.com/", SignatureVersion::V2)]
    #[test_case("https://sdb.amazonaws.com/", SignatureVersion::V2)]
    #[test_case("https://route53.amazonaws.com/", SignatureVersion::V3)]
    #[test_case("https://email.us-east-1.amazonaws.com/", SignatureVersion::V3)]
    #[test_case("https://johnsmith.s3.amazonaws.com/", SignatureVersion::S3)]
    #[test_case("https://s3-eu-west-1.amazonaws.com/", SignatureVersion::S3)]
    #[test_case("https://IAM.amazonaws.com:443/", SignatureVersion::V4)]
    #[test_case("https://lambda.us-east-1.amazonaws.com/", SignatureVersion::V4; "unknown falls back")]
    fn test_signature_version(uri: &str, expected: SignatureVersion) -> anyhow::Result<()> {
        let req = http::Request::get(uri).body(Body::empty())?;
        assert_eq!(Dispatcher::new().signature_version(&req)?, expected);
        Ok(())
    }

    #[test]
    fn test_signature_version_prefers_host_header() -> anyhow::Result<()> {
        let req = http::Request::get("http://127.0.0.1:9000/")
            .header(HOST, "route53.amazonaws.com")
            .body(Body::empty())?;
        assert_eq!(
            Dispatcher::new().signature_version(&req)?,
            SignatureVersion::V3
        );
        Ok(())
    }

    #[test]
    fn test_unknown_service_without_fallback() -> anyhow::Result<()> {
        let mut req = http::Request::get("https://lambda.us-east-1.amazonaws.com/")
            .body(Body::empty())?;

        let err = Dispatcher::new()
            .with_fallback(None)
            .sign_request(&mut req, &Credential::new("ak", "sk"), None)
            .expect_err("unknown service must fail");
        assert_eq!(err.kind(), awsauth_core::ErrorKind::RequestInvalid);
        assert!(req.headers().get(AUTHORIZATION).is_none());
        Ok(())
    }

    #[test]
    fn test_for_service() {
        assert_eq!(SignatureVersion::for_service("S3"), Some(SignatureVersion::S3));
        assert_eq!(SignatureVersion::for_service("lambda"), None);
    }

    #[test]
    fn test_sign_request_delegates() -> anyhow::Result<()> {
        let now = parse_rfc3339("2011-09-09T23:36:00Z")?;
        let mut req = http::Request::post("https://iam.amazonaws.com/")
            .body(Body::from("Action=ListUsers&Version=2010-05-08"))?;

        Dispatcher::new().with_time(now).sign_request(
            &mut req,
            &Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
            None,
        )?;

        assert_eq!(
            req.headers()[AUTHORIZATION],
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20110909/us-east-1/iam/aws4_request, SignedHeaders=content-type;host;x-amz-date, Signature=ced6826de92d2bdeed8f846f0bf508e8559e98e4b0199114b84c54174deb456c"
        );
        Ok(())
    }
}
