//! Config-driven client construction.

use tracing::info;
use zkguard_acl::{
    AclProvider, CredentialsProvider, DigestCredentialsProvider, DigestRestriction,
    NoCredentials, SaslRestriction, SecurityAware, SecurityClassifier,
};
use zkguard_client::{Connector, ZkClient, ZkClientBuilder};
use zkguard_config::{AclConfig, ProviderKind};

use crate::error::Result;

/// Builds the ACL provider `config` describes.
///
/// The classifier watches the security path with the chroot applied.
pub fn acl_provider(config: &AclConfig) -> Result<AclProvider> {
    config.validate()?;
    let classifier = SecurityClassifier::with_security_path(config.effective_security_path()?);

    let provider = match config.provider {
        ProviderKind::Open => AclProvider::Open,
        ProviderKind::Sasl => {
            let restriction = SaslRestriction::new()
                .with_fallback_principal(config.sasl.fallback_principal.as_str());
            SecurityAware::new(restriction)
                .with_classifier(classifier)
                .into()
        }
        ProviderKind::Digest => {
            let all = DigestCredentialsProvider::new(
                config.digest.username.as_str(),
                config.digest.password.as_str(),
            )?;
            let mut restriction = DigestRestriction::new(&all);
            if config.digest.has_readonly() {
                let readonly = DigestCredentialsProvider::new(
                    config.digest.readonly_username.as_str(),
                    config.digest.readonly_password.as_str(),
                )?;
                restriction = restriction.with_readonly(&readonly);
            }
            SecurityAware::new(restriction)
                .with_classifier(classifier)
                .into()
        }
    };
    Ok(provider)
}

/// Builds the credentials a client presents when it connects.
///
/// Only the digest provider presents credentials: the full-access user's.
/// SASL sessions authenticate through the handshake.
pub fn credentials_provider(config: &AclConfig) -> Result<Box<dyn CredentialsProvider>> {
    match config.provider {
        ProviderKind::Open | ProviderKind::Sasl => Ok(Box::new(NoCredentials)),
        ProviderKind::Digest => Ok(Box::new(DigestCredentialsProvider::new(
            config.digest.username.as_str(),
            config.digest.password.as_str(),
        )?)),
    }
}

/// A client builder configured from `config`.
pub fn client_builder(config: &AclConfig) -> Result<ZkClientBuilder> {
    Ok(ZkClientBuilder::new()
        .with_acl_provider(acl_provider(config)?)
        .with_credentials_provider(credentials_provider(config)?))
}

/// Validates `config`, builds its provider and credentials, and connects.
pub fn connect<C: Connector>(config: &AclConfig, connector: &C) -> Result<ZkClient<C::Session>> {
    let builder = client_builder(config)?;
    info!(
        provider = %config.provider,
        security_path = %config.security_path,
        chroot = %config.chroot,
        "connecting from configuration"
    );
    Ok(builder.connect(connector)?)
}
