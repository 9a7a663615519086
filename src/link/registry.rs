//! Registry of linked modules.
//!
//! Names are unique for the owning process's lifetime. Entries are only ever
//! inserted.

use std::path::{Path, PathBuf};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::link::error::LinkError;

#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: DashMap<String, PathBuf>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `source`.
    ///
    /// The check and the insert happen under one shard lock, so of two
    /// concurrent claims for the same name exactly one wins.
    pub fn insert(&self, name: &str, source: &Path) -> Result<(), LinkError> {
        match self.links.entry(name.to_string()) {
            Entry::Occupied(_) => Err(LinkError::Conflict {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(source.to_path_buf());
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<PathBuf> {
        self.links.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Linked names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.links.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_claim_conflicts() {
        let registry = LinkRegistry::new();
        registry.insert("chat", Path::new("/srv/chat.toml")).unwrap();

        let err = registry.insert("chat", Path::new("/srv/other.toml")).unwrap_err();
        assert!(matches!(err, LinkError::Conflict { .. }));
        assert_eq!(registry.get("chat").unwrap(), PathBuf::from("/srv/chat.toml"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let registry = Arc::new(LinkRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .insert("shared", Path::new(&format!("/srv/{i}.toml")))
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(registry.names(), vec!["shared".to_string()]);
    }
}
