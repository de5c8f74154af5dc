//! Opaque password credentials
//!
//! Passwords are never stored. A credential is `<salt>$<digest>` where the
//! salt is a random v4 UUID in simple hex form and the digest is the BLAKE3
//! hash of the salt bytes followed by the password.

use uuid::Uuid;

const SEPARATOR: char = '$';

/// Produce a freshly salted credential for `password`
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4();
    let digest = digest(&salt, password);
    format!("{}{}{}", salt.simple(), SEPARATOR, digest.to_hex())
}

/// Check `password` against a stored credential
///
/// Malformed credentials never verify.
pub fn verify_password(password: &str, credential: &str) -> bool {
    let Some((salt, expected)) = credential.split_once(SEPARATOR) else {
        return false;
    };
    let Ok(salt) = Uuid::parse_str(salt) else {
        return false;
    };
    let Ok(expected) = blake3::Hash::from_hex(expected) else {
        return false;
    };

    // blake3::Hash equality is constant-time
    digest(&salt, password) == expected
}

fn digest(salt: &Uuid, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}
