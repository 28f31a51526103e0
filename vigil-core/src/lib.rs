//! Core functionality for the vigil account-lifecycle library.
//!
//! This crate holds the pieces every vigil deployment shares: the account and
//! token domain types, the error taxonomy, crypto utilities for token values,
//! the repository traits storage backends implement, and the service layer
//! (lockout guard, token store, verification and password-reset flows).
//!
//! Storage backends live in their own crates (e.g. `vigil-storage-sqlite`)
//! and plug in through [`repositories::RepositoryProvider`]. Applications
//! normally consume all of this through the `vigil` facade crate rather than
//! depending on `vigil-core` directly.

pub mod account;
pub mod crypto;
pub mod error;
pub mod lockout;
pub mod repositories;
pub mod services;
pub mod token;

pub use account::{Account, AccountId, NewAccount};
pub use error::Error;
pub use lockout::{AttemptSnapshot, LockoutConfig, LockoutStatus};
pub use repositories::RepositoryProvider;
pub use token::{
    AccountRedemption, SecureToken, TokenConfig, TokenPurpose, TokenRedemption, TokenValidation,
};
