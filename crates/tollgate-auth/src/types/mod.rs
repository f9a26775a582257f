//! Common types used across the token lifecycle modules.
//!
//! ## Domain Types
//!
//! - [`ClientCredential`] - Registered OAuth 2.0 client
//! - [`UserCredential`] - Password-authenticated user
//! - [`TokenRecord`] - Persisted access/refresh pair
//! - [`TokenStats`] - Token store counts

pub mod client;
pub mod token_record;
pub mod user;

pub use client::{ClientCredential, generate_client_secret};
pub use token_record::{
    LOGGED_HANDLE_PREFIX, TokenRecord, TokenStats, redact_handle, window_end,
};
pub use user::UserCredential;
