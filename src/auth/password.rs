//! Password strength checks and bcrypt hashing for account credentials.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A plaintext password that passed the strength check and is ready to hash.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Accept `password` if zxcvbn scores it at least three out of four.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with zxcvbn's suggestions otherwise.
    pub fn new(password: &str) -> Result<Self, Error> {
        let estimate = zxcvbn(password, &[]);

        if matches!(estimate.score(), Score::Three | Score::Four) {
            return Ok(Self(password.to_owned()));
        }

        let advice = estimate
            .feedback()
            .map(Feedback::to_string)
            .unwrap_or_default();

        Err(Error::TooWeak(advice))
    }

    /// Skip the strength check, for seeded accounts and tests.
    pub fn new_unchecked(password: &str) -> Self {
        Self(password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A bcrypt hash as stored in the `user.password` column.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds. Tests use a cost of 4.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(stored_hash: &str) -> Self {
        Self(stored_hash.to_owned())
    }

    /// Whether `password` is the one this hash was made from.
    pub fn verify(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
