//! Service context for dependency injection
//!
//! Holds the stores, repositories and the token authority every service needs.

use std::sync::Arc;

use collab_common::{TokenSigner, VerificationConfig};
use collab_core::{
    AccountRepository, Mailer, MembershipOracle, MessageRepository, RoomEventPublisher, TtlStore,
};

use super::error::{ServiceError, ServiceResult};
use super::token_authority::TokenAuthority;

/// Shared dependencies for the service layer. Cheap to clone.
#[derive(Clone)]
pub struct ServiceContext {
    ttl_store: Arc<dyn TtlStore>,
    membership: Arc<dyn MembershipOracle>,
    message_repo: Arc<dyn MessageRepository>,
    account_repo: Arc<dyn AccountRepository>,
    mailer: Arc<dyn Mailer>,
    room_events: Option<Arc<dyn RoomEventPublisher>>,
    token_authority: TokenAuthority,
    verification: VerificationConfig,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    pub fn ttl_store(&self) -> &dyn TtlStore {
        self.ttl_store.as_ref()
    }

    /// Membership oracle consulted before every join and send
    pub fn membership(&self) -> &dyn MembershipOracle {
        self.membership.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn account_repo(&self) -> &dyn AccountRepository {
        self.account_repo.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    /// Bridge to the gateway, absent in processes that never announce
    pub fn room_events(&self) -> Option<&dyn RoomEventPublisher> {
        self.room_events.as_deref()
    }

    pub fn token_authority(&self) -> &TokenAuthority {
        &self.token_authority
    }

    pub fn verification_config(&self) -> &VerificationConfig {
        &self.verification
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("ttl_store", &"TtlStore")
            .field("repositories", &"...")
            .field("token_authority", &self.token_authority)
            .field("verification", &self.verification)
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    ttl_store: Option<Arc<dyn TtlStore>>,
    membership: Option<Arc<dyn MembershipOracle>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    account_repo: Option<Arc<dyn AccountRepository>>,
    mailer: Option<Arc<dyn Mailer>>,
    room_events: Option<Arc<dyn RoomEventPublisher>>,
    signer: Option<Arc<TokenSigner>>,
    verification: Option<VerificationConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl_store(mut self, store: Arc<dyn TtlStore>) -> Self {
        self.ttl_store = Some(store);
        self
    }

    pub fn membership(mut self, oracle: Arc<dyn MembershipOracle>) -> Self {
        self.membership = Some(oracle);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn account_repo(mut self, repo: Arc<dyn AccountRepository>) -> Self {
        self.account_repo = Some(repo);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn room_events(mut self, publisher: Arc<dyn RoomEventPublisher>) -> Self {
        self.room_events = Some(publisher);
        self
    }

    pub fn signer(mut self, signer: Arc<TokenSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Confirmation-code limits; defaults apply when unset
    pub fn verification(mut self, config: VerificationConfig) -> Self {
        self.verification = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let ttl_store = self
            .ttl_store
            .ok_or_else(|| ServiceError::validation("ttl_store is required"))?;
        let signer = self
            .signer
            .ok_or_else(|| ServiceError::validation("signer is required"))?;

        Ok(ServiceContext {
            token_authority: TokenAuthority::new(signer, Arc::clone(&ttl_store)),
            ttl_store,
            membership: self
                .membership
                .ok_or_else(|| ServiceError::validation("membership is required"))?,
            message_repo: self
                .message_repo
                .ok_or_else(|| ServiceError::validation("message_repo is required"))?,
            account_repo: self
                .account_repo
                .ok_or_else(|| ServiceError::validation("account_repo is required"))?,
            mailer: self
                .mailer
                .ok_or_else(|| ServiceError::validation("mailer is required"))?,
            room_events: self.room_events,
            verification: self.verification.unwrap_or_default(),
        })
    }
}
