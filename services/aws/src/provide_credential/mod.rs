mod chain;
pub use chain::ProvideCredentialChain;

mod r#static;
pub use r#static::StaticCredentialProvider;
