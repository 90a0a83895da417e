use crate::{Body, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Signer is the main struct used to sign the request.
///
/// It owns a credential provider and a request signer, and caches the
/// credential between calls. A cached credential is reused until it stops
/// being valid, then the provider is asked again.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    loader: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Signing request.
    ///
    /// Fails with a credential error before touching the request if no
    /// valid credential can be resolved.
    pub async fn sign(
        &self,
        req: &mut http::Request<Body>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let cred = self.credential().await?;
        self.builder.sign_request(req, &cred, expires_in)
    }

    /// Get a valid credential, loading it from the provider if needed.
    pub async fn credential(&self) -> Result<K> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        if let Some(cred) = cached.filter(|v| v.is_valid()) {
            return Ok(cred);
        }

        log::debug!("no valid cached credential, loading from {:?}", self.loader);
        let Some(cred) = self.loader.provide_credential().await? else {
            return Err(Error::credential_invalid(
                "no credential found from provider",
            ));
        };
        if !cred.is_valid() {
            return Err(Error::credential_expired(
                "credential from provider is invalid or about to expire",
            ));
        }

        // Concurrent callers may load at the same time, the last one wins.
        *self.credential.lock().expect("lock poisoned") = Some(cred.clone());
        Ok(cred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug)]
    struct TestCredential {
        key: String,
        valid: bool,
    }

    impl SigningCredential for TestCredential {
        fn is_valid(&self) -> bool {
            self.valid && !self.key.is_empty()
        }
    }

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        valid: bool,
        empty: bool,
    }

    #[async_trait]
    impl ProvideCredential for CountingProvider {
        type Credential = TestCredential;

        async fn provide_credential(&self) -> Result<Option<Self::Credential>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.empty {
                return Ok(None);
            }
            Ok(Some(TestCredential {
                key: "key".to_string(),
                valid: self.valid,
            }))
        }
    }

    #[derive(Debug)]
    struct HeaderSigner;

    impl SignRequest for HeaderSigner {
        type Credential = TestCredential;

        fn sign_request(
            &self,
            req: &mut http::Request<Body>,
            credential: &Self::Credential,
            _: Option<Duration>,
        ) -> Result<()> {
            req.headers_mut()
                .insert("x-test-key", credential.key.parse()?);
            Ok(())
        }
    }

    fn request() -> http::Request<Body> {
        http::Request::get("https://example.com/")
            .body(Body::empty())
            .expect("request must be valid")
    }

    #[tokio::test]
    async fn test_signer_caches_credential() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let calls = Arc::new(AtomicUsize::new(0));
        let signer = Signer::new(
            CountingProvider {
                calls: calls.clone(),
                valid: true,
                empty: false,
            },
            HeaderSigner,
        );

        let mut req = request();
        signer.sign(&mut req, None).await?;
        signer.sign(&mut req, None).await?;

        assert_eq!(req.headers()["x-test-key"], "key");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_signer_fails_without_credential() {
        let signer = Signer::new(
            CountingProvider {
                empty: true,
                ..Default::default()
            },
            HeaderSigner,
        );

        let mut req = request();
        let err = signer
            .sign(&mut req, None)
            .await
            .expect_err("sign must fail");
        assert!(err.is_credential_error());
        assert!(req.headers().get("x-test-key").is_none());
    }

    #[tokio::test]
    async fn test_signer_rejects_expiring_credential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let signer = Signer::new(
            CountingProvider {
                calls: calls.clone(),
                valid: false,
                empty: false,
            },
            HeaderSigner,
        );

        let mut req = request();
        let err = signer
            .sign(&mut req, None)
            .await
            .expect_err("sign must fail");
        assert_eq!(err.kind(), crate::ErrorKind::CredentialExpired);

        // Invalid credential is never cached.
        let _ = signer.sign(&mut req, None).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
