//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: mutex-guarded stores used in tests and when no database is
//!   configured
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **security**: Argon2id password hashing and HS256 bearer tokens
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod security;
