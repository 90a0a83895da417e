use crate::Body;
use std::fmt::Debug;
use std::time::Duration;

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is valid.
    ///
    /// An invalid credential will be reloaded by the signer before use.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential is the trait used by signer to load the credential.
///
/// Credential discovery (environment, shared files, instance metadata and
/// so on) lives behind this trait. Implementations may perform I/O.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this loader.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load signing credential.
    ///
    /// - If succeed, return `Ok(Some(cred))`
    /// - If not found, return `Ok(None)`
    /// - If unexpected errors happened, return `Err(err)`
    async fn provide_credential(&self) -> crate::Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used by signer to sign the request.
///
/// Signing is pure computation over the request: implementations MUST NOT
/// block on anything other than reading the request body.
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this signer.
    type Credential: Send + Sync + Unpin + 'static;

    /// Sign the request in place.
    ///
    /// The given request instance is mutated and stays the caller's: no copy
    /// is made and nothing is returned besides success or failure.
    ///
    /// ## Expires In
    ///
    /// The `expires_in` parameter asks for a presigned request valid for the
    /// given duration, with the signature carried in the query instead of
    /// headers. If the signer does not support it, it should return an error.
    fn sign_request(
        &self,
        req: &mut http::Request<Body>,
        credential: &Self::Credential,
        expires_in: Option<Duration>,
    ) -> crate::Result<()>;
}
