//! The phrase forwarding graph.
//!
//! A phrase identifies one path through a document's declaration hierarchy,
//! keyed at each step by (subject, clarifier). Phrases are reference-counted
//! by the physical spans that justify them: a span inflates every phrase on
//! its spine, and the phrase is disposed once no span backs it.
//!
//! Disposal is a two-phase commit. Deflating to zero only marks the phrase
//! in a pending queue; the sweep at the end of the edit transaction disposes
//! phrases still at zero. An inflate that lands on a pending phrase cancels
//! the disposal silently, which suppresses declare/undeclare churn when a
//! statement is deleted and an equivalent one re-inserted in the same
//! transaction.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use truth_ir::{ClarifierKey, Name};

use crate::error::ContractError;

/// Stable per-statement identity, assigned by the owning document. Survives
/// line renumbering; a text update produces a fresh one.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct StatementUid(pub(crate) u64);

/// Generational handle into a document's phrase arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PhraseId {
    index: u32,
    generation: u32,
}

impl PhraseId {
    /// Ordering key for deterministic iteration over handle sets.
    pub(crate) fn sort_key(self) -> (u32, u32) {
        (self.index, self.generation)
    }
}

/// One physical backing of a phrase: a declaration span, identified by its
/// statement and position within that statement's declaration list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct SpanKey {
    pub statement: StatementUid,
    pub span: u32,
}

/// One outbound reference group: all same-or-ancestor-scope phrases
/// reachable by a single clarifier term. Consumed by the external
/// inheritance resolver.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Fork {
    pub term: Name,
    pub targets: Vec<PhraseId>,
}

/// Phrase-level event, wrapped into a program event by the owner.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub(crate) enum PhraseEvent {
    Declare {
        subject: Name,
        clarifier: ClarifierKey,
    },
    Undeclare {
        subject: Name,
        clarifier: ClarifierKey,
    },
}

struct PhraseNode {
    subject: Name,
    clarifier: ClarifierKey,
    /// Clarifier terms in source order, kept for fork computation.
    clarifier_terms: Vec<Name>,
    parent: Option<PhraseId>,
    depth: u32,
    forwarding: FxHashMap<(Name, ClarifierKey), PhraseId>,
    inflating: FxHashSet<SpanKey>,
    hypothetical: bool,
    outbounds: Option<OutboundsCache>,
}

struct OutboundsCache {
    version: u64,
    forks: Vec<Fork>,
}

struct Slot {
    generation: u32,
    node: Option<PhraseNode>,
}

/// Arena of phrase nodes for one document, rooted at a synthetic phrase of
/// depth 0.
pub struct PhraseArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: PhraseId,
    pending: Vec<PhraseId>,
    events: Vec<PhraseEvent>,
    /// Phrases inflated since the last drain, for verification marking.
    touched: Vec<PhraseId>,
}

impl PhraseArena {
    pub fn new() -> Self {
        let mut arena = PhraseArena {
            slots: Vec::new(),
            free: Vec::new(),
            root: PhraseId {
                index: 0,
                generation: 0,
            },
            pending: Vec::new(),
            events: Vec::new(),
            touched: Vec::new(),
        };
        arena.root = arena.allocate(PhraseNode {
            subject: Name::EMPTY,
            clarifier: ClarifierKey::NONE,
            clarifier_terms: Vec::new(),
            parent: None,
            depth: 0,
            forwarding: FxHashMap::default(),
            inflating: FxHashSet::default(),
            hypothetical: false,
            outbounds: None,
        });
        arena
    }

    /// The document's root phrase.
    pub fn root(&self) -> PhraseId {
        self.root
    }

    fn allocate(&mut self, node: PhraseNode) -> PhraseId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            PhraseId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            PhraseId {
                index,
                generation: 0,
            }
        }
    }

    fn node(&self, id: PhraseId) -> Option<&PhraseNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: PhraseId) -> Option<&mut PhraseNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// True while the handle refers to a live node.
    pub fn is_live(&self, id: PhraseId) -> bool {
        self.node(id).is_some()
    }

    pub fn subject(&self, id: PhraseId) -> Option<Name> {
        self.node(id).map(|n| n.subject)
    }

    pub fn clarifier(&self, id: PhraseId) -> Option<ClarifierKey> {
        self.node(id).map(|n| n.clarifier)
    }

    pub fn depth(&self, id: PhraseId) -> Option<u32> {
        self.node(id).map(|n| n.depth)
    }

    pub fn parent(&self, id: PhraseId) -> Option<PhraseId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn is_hypothetical(&self, id: PhraseId) -> bool {
        self.node(id).is_some_and(|n| n.hypothetical)
    }

    /// Count of spans currently backing this phrase.
    pub fn inflation_count(&self, id: PhraseId) -> usize {
        self.node(id).map_or(0, |n| n.inflating.len())
    }

    /// All live, registered phrase handles.
    pub fn live_phrases(&self) -> Vec<PhraseId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let node = slot.node.as_ref()?;
                if node.hypothetical || node.depth == 0 {
                    return None;
                }
                Some(PhraseId {
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    generation: slot.generation,
                })
            })
            .collect()
    }

    /// Forwarding-table entries under `id`, sorted by subject then
    /// clarifier for deterministic iteration.
    pub fn children(&self, id: PhraseId) -> Vec<(Name, ClarifierKey, PhraseId)> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut entries: Vec<(Name, ClarifierKey, PhraseId)> = node
            .forwarding
            .iter()
            .map(|(&(name, clarifier), &child)| (name, clarifier, child))
            .collect();
        entries.sort_by_key(|&(name, clarifier, _)| (name.index(), clarifier));
        entries
    }

    /// Exact forwarding-table lookup under `parent`.
    pub fn lookup(
        &self,
        parent: PhraseId,
        subject: Name,
        clarifier: ClarifierKey,
    ) -> Option<PhraseId> {
        self.node(parent)?.forwarding.get(&(subject, clarifier)).copied()
    }

    /// Non-mutating lookup. With a clarifier, at most one exact match; with
    /// none, every homograph sharing the subject.
    pub fn peek(
        &self,
        parent: PhraseId,
        subject: Name,
        clarifier: Option<ClarifierKey>,
    ) -> SmallVec<[PhraseId; 2]> {
        let Some(node) = self.node(parent) else {
            return SmallVec::new();
        };
        match clarifier {
            Some(key) => node
                .forwarding
                .get(&(subject, key))
                .copied()
                .into_iter()
                .collect(),
            None => {
                let mut matches: SmallVec<[PhraseId; 2]> = node
                    .forwarding
                    .iter()
                    .filter(|((name, _), _)| *name == subject)
                    .map(|(_, id)| *id)
                    .collect();
                matches.sort_by_key(|id| id.index);
                matches
            }
        }
    }

    /// Look up or create the child of `parent` keyed by (subject,
    /// clarifier). The registered child appears in the forwarding table.
    pub fn ensure(
        &mut self,
        parent: PhraseId,
        subject: Name,
        clarifier: ClarifierKey,
        clarifier_terms: &[Name],
    ) -> Result<PhraseId, ContractError> {
        if let Some(existing) = self.lookup(parent, subject, clarifier) {
            return Ok(existing);
        }
        let depth = self
            .node(parent)
            .ok_or(ContractError::InternalInvariant("stale parent phrase"))?
            .depth
            + 1;
        let child = self.allocate(PhraseNode {
            subject,
            clarifier,
            clarifier_terms: clarifier_terms.to_vec(),
            parent: Some(parent),
            depth,
            forwarding: FxHashMap::default(),
            inflating: FxHashSet::default(),
            hypothetical: false,
            outbounds: None,
        });
        let parent_node = self
            .node_mut(parent)
            .ok_or(ContractError::InternalInvariant("stale parent phrase"))?;
        parent_node.forwarding.insert((subject, clarifier), child);
        Ok(child)
    }

    /// Create a hypothetical phrase: never registered in a forwarding table
    /// and never reference-counted. Lifecycle operations on it are contract
    /// errors.
    pub fn hypothetical(
        &mut self,
        parent: PhraseId,
        subject: Name,
        clarifier: ClarifierKey,
    ) -> Result<PhraseId, ContractError> {
        let depth = self
            .node(parent)
            .ok_or(ContractError::InternalInvariant("stale parent phrase"))?
            .depth
            + 1;
        Ok(self.allocate(PhraseNode {
            subject,
            clarifier,
            clarifier_terms: Vec::new(),
            parent: Some(parent),
            depth,
            forwarding: FxHashMap::default(),
            inflating: FxHashSet::default(),
            hypothetical: true,
            outbounds: None,
        }))
    }

    /// Add a physical backing. The first backing declares the phrase unless
    /// it was pending disposal, in which case the disposal is cancelled and
    /// no event fires.
    pub fn inflate(&mut self, id: PhraseId, key: SpanKey) -> Result<(), ContractError> {
        let node = self
            .node_mut(id)
            .ok_or(ContractError::InternalInvariant("stale phrase handle"))?;
        if node.hypothetical {
            return Err(ContractError::HypotheticalPhrase);
        }
        let was_empty = node.inflating.is_empty();
        node.inflating.insert(key);
        let subject = node.subject;
        let clarifier = node.clarifier;

        self.touched.push(id);
        if was_empty {
            if let Some(pos) = self.pending.iter().position(|p| *p == id) {
                self.pending.swap_remove(pos);
            } else {
                self.events.push(PhraseEvent::Declare { subject, clarifier });
            }
        }
        Ok(())
    }

    /// Remove a physical backing. Reaching zero marks the phrase pending
    /// disposal; the actual disposal happens in [`sweep`](Self::sweep).
    pub fn deflate(&mut self, id: PhraseId, key: SpanKey) -> Result<(), ContractError> {
        let node = self
            .node_mut(id)
            .ok_or(ContractError::InternalInvariant("stale phrase handle"))?;
        if node.hypothetical {
            return Err(ContractError::HypotheticalPhrase);
        }
        node.inflating.remove(&key);
        if node.inflating.is_empty() && !self.pending.contains(&id) {
            self.pending.push(id);
        }
        Ok(())
    }

    /// End-of-transaction disposal sweep. Phrases still at zero backing are
    /// disposed, children before parents; a depth-1 phrase that is truly
    /// gone from the root's forwarding table emits `Undeclare`.
    pub fn sweep(&mut self) {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|id| std::cmp::Reverse(self.depth(*id).unwrap_or(0)));
        for id in pending {
            let still_zero = self
                .node(id)
                .is_some_and(|n| n.inflating.is_empty());
            if still_zero {
                self.dispose(id);
            }
        }
    }

    fn dispose(&mut self, id: PhraseId) {
        let Some(node) = self.node(id) else { return };
        let subject = node.subject;
        let clarifier = node.clarifier;
        let depth = node.depth;
        let parent = node.parent;

        if let Some(parent) = parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.forwarding.remove(&(subject, clarifier));
            }
        }

        let slot = &mut self.slots[id.index as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        // The deferred check: only a phrase still absent after the whole
        // transaction settles is truly undeclared.
        if depth == 1 && self.lookup(self.root, subject, clarifier).is_none() {
            self.events.push(PhraseEvent::Undeclare { subject, clarifier });
        }
    }

    /// Outbound forks for the inheritance resolver: for each clarifier term
    /// on this phrase, the same-or-ancestor-scope phrases reachable by that
    /// term. Cached until `version` advances.
    pub fn outbounds(&mut self, id: PhraseId, version: u64) -> Vec<Fork> {
        if let Some(node) = self.node(id) {
            if let Some(cache) = &node.outbounds {
                if cache.version == version {
                    return cache.forks.clone();
                }
            }
        }

        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let terms = node.clarifier_terms.clone();
        let mut scopes = Vec::new();
        let mut cursor = node.parent;
        while let Some(scope) = cursor {
            scopes.push(scope);
            cursor = self.parent(scope);
        }

        let forks: Vec<Fork> = terms
            .into_iter()
            .map(|term| {
                let mut targets = Vec::new();
                for &scope in &scopes {
                    targets.extend(self.peek(scope, term, None));
                }
                Fork { term, targets }
            })
            .collect();

        if let Some(node) = self.node_mut(id) {
            node.outbounds = Some(OutboundsCache {
                version,
                forks: forks.clone(),
            });
        }
        forks
    }

    pub(crate) fn take_events(&mut self) -> Vec<PhraseEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn take_touched(&mut self) -> Vec<PhraseId> {
        let mut touched = std::mem::take(&mut self.touched);
        touched.sort_by_key(|id| id.index);
        touched.dedup();
        touched.retain(|id| self.is_live(*id));
        touched
    }
}

impl Default for PhraseArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(statement: u64, span: u32) -> SpanKey {
        SpanKey {
            statement: StatementUid(statement),
            span,
        }
    }

    fn ensure(
        arena: &mut PhraseArena,
        parent: PhraseId,
        subject: Name,
    ) -> PhraseId {
        match arena.ensure(parent, subject, ClarifierKey::NONE, &[]) {
            Ok(id) => id,
            Err(e) => panic!("ensure failed: {e}"),
        }
    }

    #[test]
    fn inflate_declares_once() {
        let mut arena = PhraseArena::new();
        let root = arena.root();
        let a = ensure(&mut arena, root, Name::EMPTY);

        assert!(arena.inflate(a, key(1, 0)).is_ok());
        assert!(arena.inflate(a, key(2, 0)).is_ok());
        assert_eq!(arena.inflation_count(a), 2);

        let events = arena.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PhraseEvent::Declare { .. }));
    }

    #[test]
    fn deflate_to_zero_disposes_on_sweep() {
        let mut arena = PhraseArena::new();
        let root = arena.root();
        let a = ensure(&mut arena, root, Name::EMPTY);
        assert!(arena.inflate(a, key(1, 0)).is_ok());
        let _ = arena.take_events();

        assert!(arena.deflate(a, key(1, 0)).is_ok());
        // Still live until the sweep.
        assert!(arena.is_live(a));

        arena.sweep();
        assert!(!arena.is_live(a));
        assert_eq!(arena.lookup(root, Name::EMPTY, ClarifierKey::NONE), None);

        let events = arena.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PhraseEvent::Undeclare { .. }));
    }

    #[test]
    fn reinflate_cancels_pending_disposal() {
        let mut arena = PhraseArena::new();
        let root = arena.root();
        let a = ensure(&mut arena, root, Name::EMPTY);
        assert!(arena.inflate(a, key(1, 0)).is_ok());
        let _ = arena.take_events();

        // Delete-then-reinsert within one transaction: no churn.
        assert!(arena.deflate(a, key(1, 0)).is_ok());
        assert!(arena.inflate(a, key(2, 0)).is_ok());
        arena.sweep();

        assert!(arena.is_live(a));
        assert!(arena.take_events().is_empty());
    }

    #[test]
    fn hypothetical_rejects_lifecycle() {
        let mut arena = PhraseArena::new();
        let root = arena.root();
        let Ok(h) = arena.hypothetical(root, Name::EMPTY, ClarifierKey::NONE) else {
            panic!("hypothetical creation failed");
        };
        assert!(arena.is_hypothetical(h));
        assert!(matches!(
            arena.inflate(h, key(1, 0)),
            Err(ContractError::HypotheticalPhrase)
        ));
        assert!(matches!(
            arena.deflate(h, key(1, 0)),
            Err(ContractError::HypotheticalPhrase)
        ));
        // Never registered.
        assert_eq!(arena.lookup(root, Name::EMPTY, ClarifierKey::NONE), None);
    }

    #[test]
    fn generational_handles_go_stale() {
        let mut arena = PhraseArena::new();
        let root = arena.root();
        let a = ensure(&mut arena, root, Name::EMPTY);
        assert!(arena.inflate(a, key(1, 0)).is_ok());
        assert!(arena.deflate(a, key(1, 0)).is_ok());
        arena.sweep();

        // The slot may be reused; the old handle must not resolve.
        let b = ensure(&mut arena, root, Name::EMPTY);
        assert!(arena.is_live(b));
        assert!(!arena.is_live(a));
    }

    #[test]
    fn peek_homographs() {
        let mut arena = PhraseArena::new();
        let root = arena.root();
        let subject = Name::EMPTY;
        let plain = ensure(&mut arena, root, subject);
        let clarified = match arena.ensure(root, subject, ClarifierKey::of(&[subject]), &[subject])
        {
            Ok(id) => id,
            Err(e) => panic!("ensure failed: {e}"),
        };

        let all = arena.peek(root, subject, None);
        assert_eq!(all.len(), 2);
        let exact = arena.peek(root, subject, Some(ClarifierKey::NONE));
        assert_eq!(exact.as_slice(), &[plain]);
        let _ = clarified;
    }
}
