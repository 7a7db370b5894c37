//! # Topic Validation
//!
//! Consulted once, at request creation. Unsupported identifiers fail with
//! [`crate::OracleError::UnsupportedTopic`].

use std::collections::BTreeSet;

use parking_lot::RwLock;

use optimist_core::Identifier;

/// Decides which identifiers the oracle answers.
pub trait TopicValidator: Send + Sync {
    /// Whether requests on `identifier` are accepted.
    fn is_supported(&self, identifier: &Identifier) -> bool;
}

/// Accepts every identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllTopics;

impl TopicValidator for AllowAllTopics {
    fn is_supported(&self, _identifier: &Identifier) -> bool {
        true
    }
}

/// A mutable identifier whitelist.
#[derive(Debug, Default)]
pub struct IdentifierWhitelist {
    allowed: RwLock<BTreeSet<Identifier>>,
}

impl IdentifierWhitelist {
    /// A whitelist holding `identifiers`.
    pub fn new(identifiers: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            allowed: RwLock::new(identifiers.into_iter().collect()),
        }
    }

    /// Allow `identifier`. Returns `false` if it was already allowed.
    pub fn add(&self, identifier: Identifier) -> bool {
        self.allowed.write().insert(identifier)
    }

    /// Disallow `identifier`. Existing requests are unaffected.
    pub fn remove(&self, identifier: &Identifier) -> bool {
        self.allowed.write().remove(identifier)
    }

    /// Allowed identifiers in order.
    pub fn list(&self) -> Vec<Identifier> {
        self.allowed.read().iter().cloned().collect()
    }
}

impl TopicValidator for IdentifierWhitelist {
    fn is_supported(&self, identifier: &Identifier) -> bool {
        self.allowed.read().contains(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn whitelist_membership() {
        let wl = IdentifierWhitelist::new([id("YES_OR_NO_QUERY")]);
        assert!(wl.is_supported(&id("YES_OR_NO_QUERY")));
        assert!(!wl.is_supported(&id("ETH/USD")));
    }

    #[test]
    fn whitelist_add_and_remove() {
        let wl = IdentifierWhitelist::default();
        assert!(wl.add(id("ETH/USD")));
        assert!(!wl.add(id("ETH/USD")));
        assert!(wl.is_supported(&id("ETH/USD")));
        assert!(wl.remove(&id("ETH/USD")));
        assert!(!wl.is_supported(&id("ETH/USD")));
        assert!(wl.list().is_empty());
    }

    #[test]
    fn allow_all_accepts_anything() {
        assert!(AllowAllTopics.is_supported(&id("ANYTHING")));
    }
}
