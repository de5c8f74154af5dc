//! User-related types for the ledger

use serde::{Deserialize, Serialize};

/// User identifier, assigned by the persistence layer
pub type UserId = u64;

/// A registered user
///
/// The credential is an opaque salted hash produced by
/// [`credentials::hash_password`](crate::core::credentials::hash_password);
/// the plaintext password is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique id assigned by the store
    pub id: UserId,

    /// Login name, unique across the store
    pub username: String,

    /// Salted credential hash
    pub credential: String,
}
