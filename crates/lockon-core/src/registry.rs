//! Session-wide set of targetable candidates.
//!
//! Hosts register a candidate when it becomes targetable and unregister it
//! when it stops being so (destruction, disable). Membership must never
//! outlive the candidate; the registry itself holds ids only.

use crate::types::CandidateId;

/// Insertion-ordered, duplicate-free set of live candidate ids.
///
/// Iteration order is insertion order. Callers must not depend on ordering
/// for correctness; it only makes tie-breaking deterministic.
#[derive(Clone, Debug, Default)]
pub struct CandidateRegistry {
    candidates: Vec<CandidateId>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self {
            candidates: Vec::with_capacity(20),
        }
    }

    /// Adds a candidate if absent. Returns true only if newly added;
    /// re-registering an already-present candidate is a no-op.
    pub fn register(&mut self, candidate: CandidateId) -> bool {
        if self.candidates.contains(&candidate) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    /// Removes a candidate if present. Returns true iff something was
    /// removed; removing a non-member is a harmless no-op.
    pub fn unregister(&mut self, candidate: CandidateId) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|id| *id != candidate);
        self.candidates.len() != before
    }

    pub fn contains(&self, candidate: CandidateId) -> bool {
        self.candidates.contains(&candidate)
    }

    /// The current live set, in insertion order.
    pub fn live_candidates(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.candidates.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
