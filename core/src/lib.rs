//! Core components for signing AWS API requests.
//!
//! This crate provides the foundational types and traits shared by every
//! signing scheme:
//!
//! - **Body**: a request body that can be read once for hashing and still be sent afterwards
//! - **SigningRequest**: a mutable view over an `http::Request` used while computing a signature
//! - **Traits**: abstract interfaces for credential loading (`ProvideCredential`) and request signing (`SignRequest`)
//! - **Signer**: the orchestrator that resolves and caches credentials, then signs requests
//!
//! ## Example
//!
//! ```no_run
//! use awsauth_core::{Body, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyLoader;
//!
//! #[async_trait]
//! impl ProvideCredential for MyLoader {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self) -> Result<Option<Self::Credential>> {
//!         Ok(Some(MyCredential {
//!             key: "my-access-key".to_string(),
//!         }))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyBuilder;
//!
//! impl SignRequest for MyBuilder {
//!     type Credential = MyCredential;
//!
//!     fn sign_request(
//!         &self,
//!         req: &mut http::Request<Body>,
//!         cred: &Self::Credential,
//!         _: Option<Duration>,
//!     ) -> Result<()> {
//!         req.headers_mut().insert("x-my-key", cred.key.parse()?);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(MyLoader, MyBuilder);
//!
//! let mut req = http::Request::get("https://example.com").body(Body::empty())?;
//! signer.sign(&mut req, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and parsing
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod body;
pub use body::Body;
mod error;
pub use error::{Error, ErrorKind, Result};
mod request;
pub use request::{SigningMethod, SigningRequest};
mod signer;
pub use signer::Signer;
