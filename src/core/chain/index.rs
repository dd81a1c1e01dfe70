//! In-memory index over a set of order revisions
//!
//! Revisions only store a back-reference to their predecessor. The index
//! owns the revisions in an arena and adds the forward links needed to find
//! the end of a chain.

use crate::domain::{OrderRevision, RevisionId};
use std::collections::HashMap;

/// Arena of revisions with forward and backward links
///
/// When two revisions claim the same predecessor (two clients revised the
/// same order concurrently) the successor with the later
/// `(date_created, revision_id)` wins; the other branch is unreachable by
/// forward traversal.
#[derive(Debug, Default)]
pub struct ChainIndex {
    revisions: Vec<OrderRevision>,
    by_id: HashMap<RevisionId, usize>,
    successor: HashMap<usize, usize>,
}

impl ChainIndex {
    /// Indexes `revisions`
    pub fn build(revisions: Vec<OrderRevision>) -> Self {
        let by_id: HashMap<RevisionId, usize> = revisions
            .iter()
            .enumerate()
            .map(|(slot, r)| (r.revision_id.clone(), slot))
            .collect();

        let mut successor: HashMap<usize, usize> = HashMap::new();
        for (slot, revision) in revisions.iter().enumerate() {
            let Some(prev) = revision
                .previous_revision
                .as_ref()
                .and_then(|id| by_id.get(id))
            else {
                continue;
            };
            let wins = match successor.get(prev) {
                None => true,
                Some(&current) => {
                    let held = &revisions[current];
                    (&revision.date_created, &revision.revision_id)
                        > (&held.date_created, &held.revision_id)
                }
            };
            if wins {
                successor.insert(*prev, slot);
            }
        }

        Self {
            revisions,
            by_id,
            successor,
        }
    }

    /// Walks back to the first revision of the chain
    ///
    /// A predecessor missing from the index ends the walk.
    pub fn root_of(&self, revision_id: &RevisionId) -> Option<&OrderRevision> {
        let mut slot = *self.by_id.get(revision_id)?;
        // Bounded by the arena size so corrupt data with a cycle cannot hang
        for _ in 0..self.revisions.len() {
            match self.predecessor(slot) {
                Some(prev) => slot = prev,
                None => break,
            }
        }
        Some(&self.revisions[slot])
    }

    /// Walks forward to the current revision of the chain
    pub fn tail_of(&self, revision_id: &RevisionId) -> Option<&OrderRevision> {
        let mut slot = *self.by_id.get(revision_id)?;
        for _ in 0..self.revisions.len() {
            match self.successor.get(&slot) {
                Some(&next) => slot = next,
                None => break,
            }
        }
        Some(&self.revisions[slot])
    }

    /// Every revision whose chain starts at `root_id`, including losing forks
    pub fn members_of(&self, root_id: &RevisionId) -> Vec<&OrderRevision> {
        self.revisions
            .iter()
            .filter(|r| {
                self.root_of(&r.revision_id)
                    .is_some_and(|root| &root.revision_id == root_id)
            })
            .collect()
    }

    /// The current revision of every chain, paired with the chain's root
    pub fn heads(&self) -> Vec<(&OrderRevision, &OrderRevision)> {
        self.revisions
            .iter()
            .enumerate()
            .filter(|(slot, _)| self.predecessor(*slot).is_none())
            .filter_map(|(_, root)| {
                self.tail_of(&root.revision_id).map(|tail| (root, tail))
            })
            .collect()
    }

    fn predecessor(&self, slot: usize) -> Option<usize> {
        self.revisions[slot]
            .previous_revision
            .as_ref()
            .and_then(|id| self.by_id.get(id))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientId, ProviderId};
    use chrono::{TimeZone, Utc};

    fn rev(id: &str, prev: Option<&str>, created_millis: i64) -> OrderRevision {
        OrderRevision::builder()
            .revision_id(RevisionId::new(id).unwrap())
            .previous_revision(prev.map(|p| RevisionId::new(p).unwrap()))
            .patient_id(PatientId::new("p1").unwrap())
            .orderer(ProviderId::new("guest").unwrap())
            .instructions(format!("revision {id}"))
            .created_at(Utc.timestamp_millis_opt(created_millis).unwrap())
            .build()
            .unwrap()
    }

    fn id(s: &str) -> RevisionId {
        RevisionId::new(s).unwrap()
    }

    #[test]
    fn test_root_and_tail_from_any_member() {
        let index = ChainIndex::build(vec![
            rev("c", Some("b"), 3),
            rev("a", None, 1),
            rev("b", Some("a"), 2),
        ]);

        for member in ["a", "b", "c"] {
            assert_eq!(index.root_of(&id(member)).unwrap().revision_id, id("a"));
            assert_eq!(index.tail_of(&id(member)).unwrap().revision_id, id("c"));
        }
        assert!(index.tail_of(&id("zzz")).is_none());
    }

    #[test]
    fn test_fork_resolves_to_later_successor() {
        let index = ChainIndex::build(vec![
            rev("a", None, 1),
            rev("late", Some("a"), 5),
            rev("early", Some("a"), 4),
        ]);
        assert_eq!(index.tail_of(&id("a")).unwrap().revision_id, id("late"));
    }

    #[test]
    fn test_fork_tie_breaks_on_revision_id() {
        let index = ChainIndex::build(vec![
            rev("a", None, 1),
            rev("y", Some("a"), 5),
            rev("x", Some("a"), 5),
        ]);
        assert_eq!(index.tail_of(&id("a")).unwrap().revision_id, id("y"));
        assert_eq!(index.members_of(&id("a")).len(), 3);
    }

    #[test]
    fn test_heads_lists_one_entry_per_chain() {
        let index = ChainIndex::build(vec![
            rev("a", None, 1),
            rev("a2", Some("a"), 2),
            rev("b", None, 1),
        ]);

        let mut heads: Vec<(String, String)> = index
            .heads()
            .into_iter()
            .map(|(root, tail)| (root.revision_id.to_string(), tail.revision_id.to_string()))
            .collect();
        heads.sort();
        assert_eq!(
            heads,
            vec![
                ("a".to_string(), "a2".to_string()),
                ("b".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_cycle_does_not_hang() {
        let index = ChainIndex::build(vec![rev("a", Some("b"), 1), rev("b", Some("a"), 2)]);
        assert!(index.root_of(&id("a")).is_some());
        assert!(index.tail_of(&id("a")).is_some());
        assert!(index.heads().is_empty());
    }
}
