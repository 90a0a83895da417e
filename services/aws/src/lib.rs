//! Sign AWS API requests.
//!
//! AWS services accept different signature versions. This crate implements
//! all of them and picks the right one from the request host:
//!
//! - [`v2`]: query string HMAC-SHA256, used by EC2, SimpleDB and friends
//! - [`v3`]: header HMAC-SHA256 over the date, used by Route 53 and SES
//! - [`v4`]: canonical request signing with a scoped signing key
//! - [`s3`]: the S3 REST scheme with HMAC-SHA1, including presigned urls
//!
//! ## Example
//!
//! ```no_run
//! use awsauth_aws::{Dispatcher, StaticCredentialProvider};
//! use awsauth_core::{Body, Result, Signer};
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(
//!     StaticCredentialProvider::new("access_key_id", "secret_access_key"),
//!     Dispatcher::new(),
//! );
//!
//! let mut req = http::Request::get("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
//!     .body(Body::empty())?;
//! signer.sign(&mut req, None).await?;
//! # Ok(())
//! # }
//! ```

mod constants;

mod credential;
pub use credential::Credential;

mod endpoint;
pub use endpoint::{service_and_region, virtual_hosted_bucket};

mod dispatch;
pub use dispatch::{Dispatcher, SignatureVersion};

mod provide_credential;
pub use provide_credential::*;

pub mod s3;
pub mod v2;
pub mod v3;
pub mod v4;
