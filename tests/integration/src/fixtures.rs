//! Test fixtures
//!
//! In-memory backends, seeded accounts and token shortcuts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use collab_cache::MemoryTtlStore;
use collab_common::{hash_password, TokenKind, TokenSigner};
use collab_core::{AccountCredentials, AccountId, Mailer, RepoResult, RoomId};
use collab_db::{InMemoryAccountRepository, InMemoryMembership, InMemoryMessageRepository};
use collab_service::{ServiceContext, TokenPair};
use parking_lot::Mutex;
use serde::Serialize;

pub const TEST_SECRET: &str = "integration-secret-key-at-least-32-bytes";
pub const ACCESS_TTL_SECS: i64 = 900;
pub const REFRESH_TTL_SECS: i64 = 604_800;
pub const TEST_PASSWORD: &str = "correct horse battery";

static ACCOUNT_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Captures confirmation codes instead of mailing them
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<HashMap<String, String>>,
}

impl RecordingMailer {
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.sent.lock().get(email).cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_confirmation_code(&self, email: &str, code: &str) -> RepoResult<()> {
        self.sent.lock().insert(email.to_string(), code.to_string());
        Ok(())
    }
}

/// A seeded account
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: AccountId,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a TestAccount> for LoginBody<'a> {
    fn from(account: &'a TestAccount) -> Self {
        Self {
            email: &account.email,
            password: &account.password,
        }
    }
}

/// In-memory stores shared by the API and the gateway under test
#[derive(Clone)]
pub struct TestBackend {
    pub store: MemoryTtlStore,
    pub membership: InMemoryMembership,
    pub messages: InMemoryMessageRepository,
    pub accounts: InMemoryAccountRepository,
    pub mailer: Arc<RecordingMailer>,
    pub signer: Arc<TokenSigner>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            store: MemoryTtlStore::new(),
            membership: InMemoryMembership::new(),
            messages: InMemoryMessageRepository::new(),
            accounts: InMemoryAccountRepository::new(),
            mailer: Arc::new(RecordingMailer::default()),
            signer: Arc::new(TokenSigner::new(TEST_SECRET, ACCESS_TTL_SECS, REFRESH_TTL_SECS)),
        }
    }

    pub fn service_context(&self) -> Result<ServiceContext> {
        Ok(ServiceContext::builder()
            .ttl_store(Arc::new(self.store.clone()))
            .membership(Arc::new(self.membership.clone()))
            .message_repo(Arc::new(self.messages.clone()))
            .account_repo(Arc::new(self.accounts.clone()))
            .mailer(self.mailer.clone())
            .signer(self.signer.clone())
            .build()?)
    }

    /// Seed a verified account with [`TEST_PASSWORD`]
    pub fn seed_account(&self) -> Result<TestAccount> {
        self.seed_account_with(true)
    }

    pub fn seed_account_with(&self, email_verified: bool) -> Result<TestAccount> {
        let n = ACCOUNT_COUNTER.fetch_add(1, Ordering::SeqCst);
        let account = TestAccount {
            id: AccountId::new(i64::from(n)),
            email: format!("user{n}@example.com"),
            password: TEST_PASSWORD.to_string(),
        };
        self.accounts.insert(
            &account.email,
            AccountCredentials {
                id: account.id,
                password_hash: hash_password(&account.password)?,
                email_verified,
            },
        );
        Ok(account)
    }

    pub fn add_member(&self, account: AccountId, room: i64) {
        self.membership.add(account, RoomId::new(room));
    }

    /// Signed access token whose lifetime ended a minute ago
    pub fn expired_access_token(&self, account: AccountId) -> Result<String> {
        let issued_at = Utc::now() - Duration::seconds(ACCESS_TTL_SECS + 60);
        Ok(self.signer.sign_at(account, TokenKind::Access, issued_at)?)
    }

    /// Issue a pair directly through the token authority
    pub async fn issue_pair(&self, account: AccountId) -> Result<TokenPair> {
        let ctx = self.service_context()?;
        Ok(ctx.token_authority().issue_pair(account).await?)
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}
