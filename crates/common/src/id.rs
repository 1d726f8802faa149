//! Entity id generation.

use ulid::Ulid;

/// Mints the string primary keys used by every entity.
///
/// Ids are lowercased ULIDs: ordered by creation time, collision-free
/// within a millisecond, and shorter than a hyphenated UUID in both JSON
/// payloads and index keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Create a new id generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Mint a fresh id.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}
