//! # collab-db
//!
//! Relational-store side of the chat core: the membership oracle, message
//! persistence and account credentials, implemented with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations, every query bounded by a timeout
//! - In-memory implementations of the same traits for tests and local runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use collab_db::{create_pool, DatabaseConfig, PgMembershipOracle};
//! use collab_core::MembershipOracle;
//!
//! let pool = create_pool(&DatabaseConfig::from_env()).await?;
//! let oracle = PgMembershipOracle::new(pool, Duration::from_secs(2));
//! let allowed = oracle.is_member(account_id, room_id).await?;
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{InMemoryAccountRepository, InMemoryMembership, InMemoryMessageRepository};
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgAccountRepository, PgMembershipOracle, PgMessageRepository};
