//! Documents: ordered statement lists with indent-derived structure and an
//! owned phrase arena.
//!
//! The edit-transaction algorithm lives here. Given a batch of line edits it
//! classifies the batch, takes one of three fast paths when the shape of the
//! batch permits, and otherwise computes a pruned invalidation frontier of
//! parent statements to deflate and re-inflate. The hard requirement is to
//! never under-invalidate; the frontier may be coarser than strictly
//! minimal.

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};
use tracing::debug;
use truth_diagnostic::LocatedFault;
use truth_ir::{ClarifierKey, KnownUri, LineEdit, Name, Subject, TermInterner};
use truth_parse::{parse_statement, Statement};

use crate::error::ContractError;
use crate::event::StatementChange;
use crate::phrase::{PhraseArena, PhraseId, SpanKey, StatementUid};

/// Handle to a document within its program.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DocumentId(pub(crate) u32);

struct Entry {
    uid: StatementUid,
    statement: Statement,
}

/// One source document: 1-based statement list plus its phrase graph.
pub struct Document {
    id: DocumentId,
    uri: Option<KnownUri>,
    entries: Vec<Entry>,
    next_uid: u64,
    pub(crate) arena: PhraseArena,
    version: u64,
    read_only: bool,
    /// Documents this one references.
    pub(crate) dependencies: FxHashSet<DocumentId>,
    /// Documents referencing this one.
    pub(crate) dependents: FxHashSet<DocumentId>,
    /// Reference faults recomputed once per transaction by the program.
    pub(crate) reference_faults: Vec<LocatedFault>,
}

impl Document {
    pub(crate) fn new(id: DocumentId, uri: Option<KnownUri>, read_only: bool) -> Self {
        Document {
            id,
            uri,
            entries: Vec::new(),
            next_uid: 0,
            arena: PhraseArena::new(),
            version: 0,
            read_only,
            dependencies: FxHashSet::default(),
            dependents: FxHashSet::default(),
            reference_faults: Vec::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn uri(&self) -> Option<&KnownUri> {
        self.uri.as_ref()
    }

    pub(crate) fn set_uri(&mut self, uri: Option<KnownUri>) {
        self.uri = uri;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Version stamp, bumped once per edit transaction.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The statement at 1-based `line`.
    pub fn statement(&self, line: usize) -> Result<&Statement, ContractError> {
        self.entry(line).map(|e| &e.statement)
    }

    fn entry(&self, line: usize) -> Result<&Entry, ContractError> {
        if line == 0 || line > self.entries.len() {
            return Err(ContractError::LineOutOfRange {
                line,
                len: self.entries.len(),
            });
        }
        Ok(&self.entries[line - 1])
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.entries.iter().map(|e| &e.statement)
    }

    /// Stable identity of the statement at `line`.
    pub fn uid(&self, line: usize) -> Result<StatementUid, ContractError> {
        self.entry(line).map(|e| e.uid)
    }

    fn line_of_uid(&self, uid: StatementUid) -> Option<usize> {
        self.entries.iter().position(|e| e.uid == uid).map(|i| i + 1)
    }

    fn fresh_uid(&mut self) -> StatementUid {
        self.next_uid += 1;
        StatementUid(self.next_uid)
    }

    /// True for statements that participate in phrase construction.
    fn is_operational(&self, line: usize) -> bool {
        self.entries
            .get(line - 1)
            .is_some_and(|e| !e.statement.is_noop())
    }

    // ----- indent-derived structure -----

    /// Nearest operational statement above `line` with strictly smaller
    /// indent.
    pub fn parent_line(&self, line: usize) -> Result<Option<usize>, ContractError> {
        let indent = self.entry(line)?.statement.indent();
        Ok(self.op_parent_before(line, indent))
    }

    fn op_parent_before(&self, line: usize, indent: u32) -> Option<usize> {
        (1..line)
            .rev()
            .find(|&l| self.is_operational(l) && self.entries[l - 1].statement.indent() < indent)
    }

    /// Lines of the operational ancestors of `line`, outermost first.
    pub fn ancestry(&self, line: usize) -> Result<Vec<usize>, ContractError> {
        let mut chain = Vec::new();
        let mut cursor = self.parent_line(line)?;
        while let Some(l) = cursor {
            chain.push(l);
            cursor = self.parent_line(l)?;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Operational statements sharing the parent of `line`, excluding
    /// `line` itself. Statements with no operational parent are all
    /// siblings of each other.
    pub fn siblings(&self, line: usize) -> Result<Vec<usize>, ContractError> {
        let lines = match self.parent_line(line)? {
            Some(parent) => self.children(parent)?,
            None => self
                .operational_lines()
                .into_iter()
                .filter(|&l| {
                    self.op_parent_before(l, self.entries[l - 1].statement.indent())
                        .is_none()
                })
                .collect(),
        };
        Ok(lines.into_iter().filter(|&l| l != line).collect())
    }

    /// Direct operational children of the statement at `line`.
    pub fn children(&self, line: usize) -> Result<Vec<usize>, ContractError> {
        let base = self.entry(line)?.statement.indent();
        let mut children = Vec::new();
        for l in line + 1..=self.entries.len() {
            if !self.is_operational(l) {
                continue;
            }
            let indent = self.entries[l - 1].statement.indent();
            if indent <= base {
                break;
            }
            if self.op_parent_before(l, indent) == Some(line) {
                children.push(l);
            }
        }
        Ok(children)
    }

    /// All operational descendants of `line`, in document order. No-op
    /// statements never terminate the block.
    pub fn descendants(&self, line: usize) -> Result<Vec<usize>, ContractError> {
        let base = self.entry(line)?.statement.indent();
        let mut lines = Vec::new();
        for l in line + 1..=self.entries.len() {
            if !self.is_operational(l) {
                continue;
            }
            if self.entries[l - 1].statement.indent() <= base {
                break;
            }
            lines.push(l);
        }
        Ok(lines)
    }

    // ----- references -----

    /// All URI statements, in document order, faults included.
    pub fn raw_references(&self) -> Vec<(usize, &KnownUri)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.statement.uri().map(|u| (i + 1, u)))
            .collect()
    }

    /// References that participate in loading: deduplicated, and excluding
    /// statements with error-severity faults.
    pub fn real_references(&self) -> Vec<(usize, &KnownUri)> {
        let mut seen = FxHashSet::default();
        self.raw_references()
            .into_iter()
            .filter(|(line, uri)| {
                let entry = &self.entries[line - 1];
                !entry.statement.has_fault() && seen.insert(uri.raw.clone())
            })
            .collect()
    }

    // ----- phrase plumbing -----

    /// Phrase parents for the statement at `line`: the cartesian walk of
    /// ancestor declarations down from the root. More than one result means
    /// the statement sits under a fragmented (multi-declaration) ancestor.
    fn spine_parents(
        &mut self,
        line: usize,
        create: bool,
    ) -> Result<SmallVec<[PhraseId; 2]>, ContractError> {
        let ancestors = self.ancestry(line)?;
        let steps: Vec<(ClarifierKey, Vec<Name>, Vec<Name>)> = ancestors
            .iter()
            .map(|&l| {
                let stmt = &self.entries[l - 1].statement;
                (stmt.clarifier(), declared_names(stmt), stmt.annotation_names())
            })
            .collect();

        let mut current: SmallVec<[PhraseId; 2]> = smallvec![self.arena.root()];
        for (clarifier, decl_names, terms) in steps {
            let mut next: SmallVec<[PhraseId; 2]> = SmallVec::new();
            for &parent in &current {
                for &name in &decl_names {
                    if create {
                        next.push(self.arena.ensure(parent, name, clarifier, &terms)?);
                    } else if let Some(id) = self.arena.lookup(parent, name, clarifier) {
                        next.push(id);
                    }
                }
            }
            if next.is_empty() {
                return Ok(next);
            }
            current = next;
        }
        Ok(current)
    }

    fn inflate_statement(&mut self, line: usize) -> Result<(), ContractError> {
        if !self.is_operational(line) {
            return Ok(());
        }
        let parents = self.spine_parents(line, true)?;
        let entry = &self.entries[line - 1];
        let uid = entry.uid;
        let clarifier = entry.statement.clarifier();
        let terms = entry.statement.annotation_names();
        let spans: Vec<(u32, Name)> = term_spans(&entry.statement);

        for (span_index, name) in spans {
            for &parent in &parents {
                let phrase = self.arena.ensure(parent, name, clarifier, &terms)?;
                self.arena.inflate(
                    phrase,
                    SpanKey {
                        statement: uid,
                        span: span_index,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn deflate_statement(&mut self, line: usize) -> Result<(), ContractError> {
        if !self.is_operational(line) {
            return Ok(());
        }
        let parents = self.spine_parents(line, false)?;
        if parents.is_empty() {
            return Ok(());
        }
        let entry = &self.entries[line - 1];
        let uid = entry.uid;
        let clarifier = entry.statement.clarifier();
        let spans: Vec<(u32, Name)> = term_spans(&entry.statement);

        for (span_index, name) in spans {
            for &parent in &parents {
                if let Some(phrase) = self.arena.lookup(parent, name, clarifier) {
                    self.arena.deflate(
                        phrase,
                        SpanKey {
                            statement: uid,
                            span: span_index,
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    fn inflate_recursive(&mut self, lines: &[usize]) -> Result<(), ContractError> {
        for &line in &self.with_descendants(lines)? {
            self.inflate_statement(line)?;
        }
        Ok(())
    }

    fn deflate_recursive(&mut self, lines: &[usize]) -> Result<(), ContractError> {
        for &line in &self.with_descendants(lines)? {
            self.deflate_statement(line)?;
        }
        Ok(())
    }

    fn with_descendants(&self, lines: &[usize]) -> Result<Vec<usize>, ContractError> {
        let mut all: Vec<usize> = Vec::new();
        for &line in lines {
            all.push(line);
            all.extend(self.descendants(line)?);
        }
        all.sort_unstable();
        all.dedup();
        Ok(all)
    }

    fn operational_lines(&self) -> Vec<usize> {
        (1..=self.entries.len())
            .filter(|&l| self.is_operational(l))
            .collect()
    }

    // ----- loading -----

    /// Parse `text` into statements and inflate the whole document. Only
    /// valid on an empty document.
    pub(crate) fn load_text(
        &mut self,
        text: &str,
        interner: &TermInterner,
    ) -> Result<(), ContractError> {
        if !self.entries.is_empty() {
            return Err(ContractError::InternalInvariant(
                "load_text on a non-empty document",
            ));
        }
        let mut lines: Vec<&str> = text.split('\n').collect();
        if text.ends_with('\n') {
            lines.pop();
        }
        if text.is_empty() {
            lines.clear();
        }
        for line_text in lines {
            let uid = self.fresh_uid();
            self.entries.push(Entry {
                uid,
                statement: parse_statement(line_text, interner),
            });
        }
        for line in self.operational_lines() {
            self.inflate_statement(line)?;
        }
        self.version += 1;
        Ok(())
    }

    // ----- the edit transaction -----

    /// Apply one batch of line edits. Phrase work is committed through the
    /// arena but disposal is only marked; the caller runs the sweep at the
    /// end of the transaction.
    pub(crate) fn apply_edits(
        &mut self,
        edits: &[LineEdit],
        interner: &TermInterner,
    ) -> Result<Vec<StatementChange>, ContractError> {
        if self.read_only {
            return Err(ContractError::ReadOnlyDocument(self.id));
        }

        let plan = self.validate(edits, interner)?;
        let changes = change_records(edits);

        match self.classify(&plan) {
            BatchKind::PureUpdate => {
                debug!(document = ?self.id, "edit: pure-update fast path");
                self.apply_pure_update(plan)?;
            }
            BatchKind::PureDelete => {
                debug!(document = ?self.id, "edit: pure-delete fast path");
                self.apply_pure_delete(&plan)?;
            }
            BatchKind::NoopInsert => {
                debug!(document = ?self.id, "edit: no-op-insert fast path");
                self.apply_noop_insert(plan);
            }
            BatchKind::General => {
                debug!(document = ?self.id, "edit: general path");
                self.apply_general(plan)?;
            }
        }

        debug_assert!(
            self.entries.iter().all(|e| !e.statement.is_disposed()),
            "disposed statement still reachable after edit"
        );
        self.version += 1;
        Ok(changes)
    }

    fn validate(
        &self,
        edits: &[LineEdit],
        interner: &TermInterner,
    ) -> Result<EditPlan, ContractError> {
        let len = self.entries.len();
        let mut plan = EditPlan::default();

        for edit in edits {
            match edit {
                LineEdit::Insert { line, text } => {
                    let line = *line as usize;
                    if line == 0 || line > len + 1 {
                        return Err(ContractError::LineOutOfRange { line, len });
                    }
                    plan.inserts.push((line, parse_statement(text, interner)));
                }
                LineEdit::Update { line, text } => {
                    let line = *line as usize;
                    if line == 0 || line > len {
                        return Err(ContractError::LineOutOfRange { line, len });
                    }
                    plan.updates.push((line, parse_statement(text, interner)));
                }
                LineEdit::Delete { line, count } => {
                    let (line, count) = (*line as usize, (*count).max(1) as usize);
                    if line == 0 || line + count - 1 > len {
                        return Err(ContractError::LineOutOfRange {
                            line: line + count - 1,
                            len,
                        });
                    }
                    plan.deletes.push((line, count));
                }
            }
        }

        plan.deletes.sort_unstable();
        for pair in plan.deletes.windows(2) {
            if pair[0].0 + pair[0].1 > pair[1].0 {
                return Err(ContractError::OverlappingDeletes);
            }
        }
        for &(line, _) in &plan.updates {
            if plan.is_deleted(line) {
                return Err(ContractError::UpdateOfDeletedLine { line });
            }
        }
        plan.inserts.sort_by_key(|(line, _)| *line);
        Ok(plan)
    }

    fn classify(&self, plan: &EditPlan) -> BatchKind {
        let only_updates = plan.deletes.is_empty() && plan.inserts.is_empty();
        let only_deletes = plan.updates.is_empty() && plan.inserts.is_empty();
        let only_inserts = plan.updates.is_empty() && plan.deletes.is_empty();

        if only_updates {
            let structural_change = plan.updates.iter().any(|(line, new)| {
                let old = &self.entries[line - 1].statement;
                old.indent() != new.indent()
                    || old.is_noop() != new.is_noop()
                    || self.update_rekeys_descendants(*line, old, new)
            });
            if !structural_change {
                return BatchKind::PureUpdate;
            }
        }
        if only_deletes && self.delete_is_self_contained(&plan.deletes) {
            return BatchKind::PureDelete;
        }
        if only_inserts && plan.inserts.iter().all(|(_, s)| s.is_noop()) {
            return BatchKind::NoopInsert;
        }
        BatchKind::General
    }

    /// True when replacing `old` with `new` would re-key forwarding entries
    /// that live statements still resolve through: the declared term names
    /// or the clarifier differ, and the statement has operational
    /// descendants keyed under the old spine.
    fn update_rekeys_descendants(&self, line: usize, old: &Statement, new: &Statement) -> bool {
        if old.clarifier() == new.clarifier() && declared_names(old) == declared_names(new) {
            return false;
        }
        self.descendants(line).map_or(true, |d| !d.is_empty())
    }

    /// True when no deleted statement has operational descendants outside
    /// the union of the deleted ranges.
    fn delete_is_self_contained(&self, deletes: &[(usize, usize)]) -> bool {
        let deleted: FxHashSet<usize> = deletes
            .iter()
            .flat_map(|&(line, count)| line..line + count)
            .collect();
        deleted.iter().all(|&line| {
            if !self.is_operational(line) {
                return true;
            }
            match self.descendants(line) {
                Ok(lines) => lines.iter().all(|l| deleted.contains(l)),
                Err(_) => false,
            }
        })
    }

    fn apply_pure_update(&mut self, plan: EditPlan) -> Result<(), ContractError> {
        for (line, new_statement) in plan.updates {
            self.deflate_statement(line)?;
            let uid = self.fresh_uid();
            self.entries[line - 1] = Entry {
                uid,
                statement: new_statement,
            };
            self.inflate_statement(line)?;
        }
        Ok(())
    }

    fn apply_pure_delete(&mut self, plan: &EditPlan) -> Result<(), ContractError> {
        for &(line, count) in &plan.deletes {
            for l in line..line + count {
                self.deflate_statement(l)?;
            }
        }
        for &(line, count) in plan.deletes.iter().rev() {
            self.entries.drain(line - 1..line - 1 + count);
        }
        Ok(())
    }

    fn apply_noop_insert(&mut self, plan: EditPlan) {
        let mut shifted = 0usize;
        for (line, statement) in plan.inserts {
            let uid = self.fresh_uid();
            self.entries.insert(line - 1 + shifted, Entry { uid, statement });
            shifted += 1;
        }
    }

    fn apply_general(&mut self, plan: EditPlan) -> Result<(), ContractError> {
        // Pre-mutation invalidation frontier.
        let (mut root_frontier, parent_lines) = self.frontier(&plan);
        let parent_lines = self.prune_parents(parent_lines)?;

        if root_frontier {
            debug!(document = ?self.id, "frontier: whole document");
            for line in self.operational_lines() {
                self.deflate_statement(line)?;
            }
        } else {
            debug!(document = ?self.id, parents = ?parent_lines, "frontier: parents");
            self.deflate_recursive(&parent_lines)?;
        }
        let parent_uids: Vec<StatementUid> =
            parent_lines.iter().map(|&l| self.entries[l - 1].uid).collect();

        // Mutate: deletes, then inserts, then updates, all in pre-edit
        // coordinates.
        for &(line, count) in plan.deletes.iter().rev() {
            self.entries.drain(line - 1..line - 1 + count);
        }
        let deleted_before = |l: usize| -> usize {
            plan.deletes
                .iter()
                .map(|&(dl, dc)| if dl < l { dc.min(l - dl) } else { 0 })
                .sum()
        };
        let insert_lines: Vec<usize> = plan.inserts.iter().map(|(l, _)| *l).collect();
        for (applied, (line, statement)) in plan.inserts.into_iter().enumerate() {
            let index = line - deleted_before(line) + applied;
            let uid = self.fresh_uid();
            self.entries.insert(index - 1, Entry { uid, statement });
        }
        for (line, statement) in plan.updates {
            let shifted = insert_lines.iter().filter(|&&il| il <= line).count();
            let index = line - deleted_before(line) + shifted;
            let uid = self.fresh_uid();
            self.entries[index - 1] = Entry { uid, statement };
        }

        // Post-mutation frontier: shifted line numbers, vanished parents
        // widen to the whole document.
        let mut post_parents = Vec::new();
        for uid in parent_uids {
            match self.line_of_uid(uid) {
                Some(line) => post_parents.push(line),
                None => root_frontier = true,
            }
        }
        let post_parents = self.prune_parents(post_parents)?;

        if root_frontier {
            for line in self.operational_lines() {
                self.inflate_statement(line)?;
            }
        } else {
            self.inflate_recursive(&post_parents)?;
        }
        Ok(())
    }

    /// Compute the parent statement of each edit. Edits whose parent search
    /// falls through to the document root widen the frontier to the whole
    /// document.
    fn frontier(&self, plan: &EditPlan) -> (bool, Vec<usize>) {
        let len = self.entries.len();
        let mut root = false;
        let mut parents = Vec::new();

        let mut probe = |pos: usize, indent: u32| {
            if indent == 0 {
                root = true;
                return;
            }
            match self.op_parent_before(pos, indent) {
                Some(p) => parents.push(p),
                None => root = true,
            }
        };

        for &(line, ref statement) in &plan.inserts {
            probe(line.min(len + 1), statement.indent());
        }
        for &(line, ref statement) in &plan.updates {
            let old = self.entries[line - 1].statement.indent();
            probe(line, old.min(statement.indent()));
        }
        for &(line, count) in &plan.deletes {
            let min_indent = (line..line + count)
                .filter(|&l| self.is_operational(l))
                .map(|l| self.entries[l - 1].statement.indent())
                .min();
            if let Some(indent) = min_indent {
                probe(line, indent);
            }
        }
        (root, parents)
    }

    /// Drop any parent whose ancestry contains another parent in the set.
    fn prune_parents(&self, mut parents: Vec<usize>) -> Result<Vec<usize>, ContractError> {
        parents.sort_unstable();
        parents.dedup();
        let chains: Vec<(usize, Vec<usize>)> = parents
            .iter()
            .map(|&l| Ok((l, self.ancestry(l)?)))
            .collect::<Result<_, ContractError>>()?;
        Ok(chains
            .iter()
            .filter(|(line, chain)| {
                !chains
                    .iter()
                    .any(|(other, _)| other != line && chain.contains(other))
            })
            .map(|(line, _)| *line)
            .collect())
    }

    // ----- faults -----

    /// Statement-level faults plus the reference faults of the last
    /// transaction.
    pub fn faults(&self) -> Vec<LocatedFault> {
        let mut all: Vec<LocatedFault> = self
            .entries
            .iter()
            .enumerate()
            .flat_map(|(i, e)| {
                e.statement.faults().iter().map(move |f| LocatedFault {
                    line: u32::try_from(i + 1).unwrap_or(u32::MAX),
                    fault: f.clone(),
                })
            })
            .collect();
        all.extend(self.reference_faults.iter().cloned());
        all.sort_by_key(|lf| (lf.line, lf.fault.code.code()));
        all
    }
}

/// Declared term names, in span order. Pattern, URI and anonymous subjects
/// carry no forwarding identity and are skipped.
fn declared_names(statement: &Statement) -> Vec<Name> {
    statement
        .declarations()
        .iter()
        .filter_map(|s| s.subject.term_name())
        .collect()
}

/// Indexes of declaration spans carrying a plain term subject.
fn term_spans(statement: &Statement) -> Vec<(u32, Name)> {
    statement
        .declarations()
        .iter()
        .enumerate()
        .filter_map(|(i, span)| match &span.subject {
            Subject::Term(term) => Some((u32::try_from(i).unwrap_or(u32::MAX), term.name)),
            _ => None,
        })
        .collect()
}

fn change_records(edits: &[LineEdit]) -> Vec<StatementChange> {
    edits
        .iter()
        .map(|edit| match edit {
            LineEdit::Insert { line, .. } => StatementChange::Insert {
                line: *line as usize,
            },
            LineEdit::Update { line, .. } => StatementChange::Update {
                line: *line as usize,
            },
            LineEdit::Delete { line, count } => StatementChange::Delete {
                line: *line as usize,
                count: *count as usize,
            },
        })
        .collect()
}

#[derive(Default)]
struct EditPlan {
    deletes: Vec<(usize, usize)>,
    inserts: Vec<(usize, Statement)>,
    updates: Vec<(usize, Statement)>,
}

impl EditPlan {
    fn is_deleted(&self, line: usize) -> bool {
        self.deletes
            .iter()
            .any(|&(dl, dc)| line >= dl && line < dl + dc)
    }
}

enum BatchKind {
    PureUpdate,
    PureDelete,
    NoopInsert,
    General,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load(text: &str) -> (Document, TermInterner) {
        let interner = TermInterner::new();
        let mut document = Document::new(DocumentId(0), None, false);
        if let Err(e) = document.load_text(text, &interner) {
            panic!("load failed: {e}");
        }
        document.arena.sweep();
        let _ = document.arena.take_events();
        let _ = document.arena.take_touched();
        (document, interner)
    }

    fn edit(document: &mut Document, interner: &TermInterner, edits: &[LineEdit]) {
        if let Err(e) = document.apply_edits(edits, interner) {
            panic!("edit failed: {e}");
        }
        document.arena.sweep();
    }

    /// Flattened (path, inflation count) view of the phrase graph, for
    /// content equality checks.
    fn snapshot(document: &Document, interner: &TermInterner) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        let mut work = vec![(document.arena.root(), String::new())];
        while let Some((phrase, path)) = work.pop() {
            for (name, _, child) in document.arena.children(phrase) {
                let child_path = if path.is_empty() {
                    interner.resolve(name).to_owned()
                } else {
                    format!("{path}/{}", interner.resolve(name))
                };
                out.push((child_path.clone(), document.arena.inflation_count(child)));
                work.push((child, child_path));
            }
        }
        out.sort();
        out
    }

    #[test]
    fn load_scenario() {
        let (document, _) = load("A\n\tB : A");

        assert_eq!(document.len(), 2);
        let Ok(first) = document.statement(1) else {
            panic!("line 1 missing");
        };
        assert_eq!(first.indent(), 0);
        assert_eq!(first.declarations().len(), 1);
        assert!(first.annotations().is_empty());
        let Ok(second) = document.statement(2) else {
            panic!("line 2 missing");
        };
        assert_eq!(second.indent(), 1);
        assert_eq!(second.declarations().len(), 1);
        assert_eq!(second.annotations().len(), 1);

        assert_eq!(document.children(1), Ok(vec![2]));
        assert!(document.faults().is_empty());
    }

    #[test]
    fn load_builds_nested_phrases() {
        let (document, interner) = load("A\n\tB : A");
        assert_eq!(
            snapshot(&document, &interner),
            vec![("A".to_owned(), 1), ("A/B".to_owned(), 1)]
        );
    }

    #[test]
    fn cruft_creates_no_phrases() {
        let (document, interner) = load(",A");
        let Ok(statement) = document.statement(1) else {
            panic!("line 1 missing");
        };
        assert!(statement.is_noop());
        assert!(snapshot(&document, &interner).is_empty());
    }

    #[test]
    fn unique_top_level_declarations_count() {
        let (mut document, interner) = load("A\nB\nC");
        let phrases = document.arena.live_phrases();
        assert_eq!(phrases.len(), 3);
        for phrase in &phrases {
            assert_eq!(document.arena.depth(*phrase), Some(1));
            assert_eq!(document.arena.inflation_count(*phrase), 1);
        }

        edit(&mut document, &interner, &[LineEdit::delete(1, 3)]);
        assert!(document.arena.live_phrases().is_empty());
        assert!(document.is_empty());
    }

    #[test]
    fn indent_change_is_not_a_pure_update() {
        let (document, interner) = load("A\n\tB");
        let plan = match document.validate(&[LineEdit::update(2, "\t\tB")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::General));
    }

    #[test]
    fn same_indent_update_is_pure() {
        let (document, interner) = load("A\n\tB");
        let plan = match document.validate(&[LineEdit::update(2, "\tC")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::PureUpdate));
    }

    #[test]
    fn renaming_a_parent_is_not_a_pure_update() {
        let (document, interner) = load("A\n\tB");
        let plan = match document.validate(&[LineEdit::update(1, "C")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::General));
    }

    #[test]
    fn reclarifying_a_parent_is_not_a_pure_update() {
        let (document, interner) = load("A : x\n\tB");
        let plan = match document.validate(&[LineEdit::update(1, "A : y")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::General));
    }

    #[test]
    fn renaming_a_leaf_stays_pure() {
        let (document, interner) = load("A\n\tB");
        let plan = match document.validate(&[LineEdit::update(2, "\tC : A, x")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::PureUpdate));
    }

    #[test]
    fn parent_update_keeping_the_spine_stays_pure() {
        let (document, interner) = load("A : x, y\n\tB");
        let plan = match document.validate(&[LineEdit::update(1, "A : y, x")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::PureUpdate));
    }

    #[test]
    fn noop_flip_is_not_a_pure_update() {
        let (document, interner) = load("A\nB");
        let plan = match document.validate(&[LineEdit::update(2, "// gone")], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::General));
    }

    #[test]
    fn delete_with_outside_descendants_is_general() {
        let (document, interner) = load("A\n\tB\nC");
        // Deleting A alone would orphan B.
        let plan = match document.validate(&[LineEdit::delete(1, 1)], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::General));

        // Deleting A together with B is self-contained.
        let plan = match document.validate(&[LineEdit::delete(1, 2)], &interner) {
            Ok(plan) => plan,
            Err(e) => panic!("validate failed: {e}"),
        };
        assert!(matches!(document.classify(&plan), BatchKind::PureDelete));
    }

    #[test]
    fn edit_invalidation_starts_at_the_parent() {
        let (mut document, interner) = load("A\n\tB");
        let _ = document.arena.take_events();

        edit(&mut document, &interner, &[LineEdit::update(2, "\t\tB")]);

        // A was deflated and re-inflated within the transaction, so the
        // pending-disposal cancellation suppresses any A-level churn.
        let a = interner.intern("A");
        let events = document.arena.take_events();
        assert!(
            events.iter().all(|e| !matches!(
                e,
                crate::phrase::PhraseEvent::Undeclare { subject, .. } if *subject == a
            )),
            "parent must not be undeclared: {events:?}"
        );
        assert_eq!(
            snapshot(&document, &interner),
            vec![("A".to_owned(), 1), ("A/B".to_owned(), 1)]
        );
    }

    #[test]
    fn edit_equivalence_with_fresh_reload() {
        let cases: &[(&str, Vec<LineEdit>, &str)] = &[
            (
                "A\n\tB : A",
                vec![LineEdit::update(2, "\tC : A")],
                "A\n\tC : A",
            ),
            (
                "A\n\tB\nC",
                vec![LineEdit::delete(2, 1)],
                "A\nC",
            ),
            (
                "A\nC",
                vec![LineEdit::insert(2, "\tB")],
                "A\n\tB\nC",
            ),
            (
                "A\n\tB\nC\n\tD",
                vec![LineEdit::delete(1, 2), LineEdit::insert(1, "E")],
                "E\nC\n\tD",
            ),
            (
                "A\n\tB",
                vec![LineEdit::update(2, "\t\tB")],
                "A\n\t\tB",
            ),
            (
                "A\n\tB",
                vec![LineEdit::update(1, "C")],
                "C\n\tB",
            ),
            (
                "A : x\n\tB",
                vec![LineEdit::update(1, "A : y")],
                "A : y\n\tB",
            ),
        ];

        for (initial, edits, expected) in cases {
            let (mut document, interner) = load(initial);
            edit(&mut document, &interner, edits);

            let texts: Vec<&str> = document.statements().map(Statement::text).collect();
            assert_eq!(&texts.join("\n"), expected, "text after {edits:?}");

            let fresh_interner = TermInterner::new();
            let mut fresh = Document::new(DocumentId(1), None, false);
            if let Err(e) = fresh.load_text(expected, &fresh_interner) {
                panic!("reload failed: {e}");
            }
            assert_eq!(
                snapshot(&document, &interner),
                snapshot(&fresh, &fresh_interner),
                "phrase graph after {edits:?}"
            );
        }
    }

    #[test]
    fn pure_update_leaves_siblings_untouched() {
        let (mut document, interner) = load("A\n\tB : A\n\tC : A");
        let _ = document.arena.take_events();

        edit(&mut document, &interner, &[LineEdit::update(2, "\tB : A, X")]);

        let a = interner.intern("A");
        let c = interner.intern("C");
        let events = document.arena.take_events();
        for event in &events {
            let subject = match event {
                crate::phrase::PhraseEvent::Declare { subject, .. }
                | crate::phrase::PhraseEvent::Undeclare { subject, .. } => *subject,
            };
            assert_ne!(subject, a, "no churn on the parent: {events:?}");
            assert_ne!(subject, c, "no churn on the sibling: {events:?}");
        }
    }

    #[test]
    fn mixed_indent_ancestry() {
        let (document, _) = load("A\n\tB\n\t\tC\n\tD");
        assert_eq!(document.ancestry(3), Ok(vec![1, 2]));
        assert_eq!(document.parent_line(4), Ok(Some(1)));
        assert_eq!(document.children(1), Ok(vec![2, 4]));
        assert_eq!(document.descendants(1), Ok(vec![2, 3, 4]));
    }

    #[test]
    fn siblings_share_a_parent() {
        let (document, _) = load("A\n\tB\n\t\tC\n\tD\nE");
        assert_eq!(document.siblings(2), Ok(vec![4]));
        assert_eq!(document.siblings(3), Ok(vec![]));
        assert_eq!(document.siblings(1), Ok(vec![5]));
    }

    #[test]
    fn noops_do_not_break_blocks() {
        let (document, _) = load("A\n\n// note\n\tB");
        assert_eq!(document.parent_line(4), Ok(Some(1)));
        assert_eq!(document.descendants(1), Ok(vec![4]));
    }

    #[test]
    fn fragmented_declaration_multi_spine() {
        let (document, interner) = load("a, b\n\tC");
        assert_eq!(
            snapshot(&document, &interner),
            vec![
                ("a".to_owned(), 1),
                ("a/C".to_owned(), 1),
                ("b".to_owned(), 1),
                ("b/C".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn homographs_with_distinct_clarifiers() {
        let (document, interner) = load("A : x\nA : y");
        let snap = snapshot(&document, &interner);
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|(path, count)| path == "A" && *count == 1));
    }

    #[test]
    fn contract_errors() {
        let (mut document, interner) = load("A\nB");

        assert!(matches!(
            document.apply_edits(&[LineEdit::update(3, "X")], &interner),
            Err(ContractError::LineOutOfRange { line: 3, len: 2 })
        ));
        assert!(matches!(
            document.apply_edits(
                &[LineEdit::delete(1, 2), LineEdit::delete(2, 1)],
                &interner
            ),
            Err(ContractError::OverlappingDeletes)
        ));
        assert!(matches!(
            document.apply_edits(
                &[LineEdit::delete(1, 1), LineEdit::update(1, "X")],
                &interner
            ),
            Err(ContractError::UpdateOfDeletedLine { line: 1 })
        ));

        let mut sealed = Document::new(DocumentId(2), None, true);
        if let Err(e) = sealed.load_text("A", &interner) {
            panic!("load failed: {e}");
        }
        assert!(matches!(
            sealed.apply_edits(&[LineEdit::update(1, "B")], &interner),
            Err(ContractError::ReadOnlyDocument(DocumentId(2)))
        ));
    }

    #[test]
    fn version_bumps_once_per_transaction() {
        let (mut document, interner) = load("A\nB");
        let before = document.version();
        edit(
            &mut document,
            &interner,
            &[LineEdit::update(1, "C"), LineEdit::update(2, "D")],
        );
        assert_eq!(document.version(), before + 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn line_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                "[A-E]",
                "\t[A-E]",
                "\t\t[A-E]",
                "[A-E] : [a-e]",
                "\t[A-E] : [a-e]",
                Just("// note".to_owned()),
                Just(String::new()),
            ]
        }

        proptest! {
            /// Whatever path an edit takes, the resulting phrase graph must
            /// match a fresh load of the resulting text.
            #[test]
            fn edited_graph_matches_fresh_reload(
                lines in proptest::collection::vec(line_strategy(), 1..6),
                kind in 0usize..3,
                target in any::<prop::sample::Index>(),
                new_line in line_strategy(),
            ) {
                let (mut document, interner) = load(&lines.join("\n"));
                let len = document.len();
                // A lone empty line loads as an empty document; only an
                // insert is in range there.
                let op = match kind {
                    _ if len == 0 => LineEdit::insert(1, new_line.clone()),
                    0 => LineEdit::update(pick(target, len), new_line.clone()),
                    1 => LineEdit::insert(pick(target, len + 1), new_line.clone()),
                    _ => LineEdit::delete(pick(target, len), 1),
                };
                edit(&mut document, &interner, &[op.clone()]);

                let result: Vec<&str> = document.statements().map(Statement::text).collect();
                let fresh_interner = TermInterner::new();
                let mut fresh = Document::new(DocumentId(9), None, false);
                if let Err(e) = fresh.load_text(&result.join("\n"), &fresh_interner) {
                    panic!("reload failed: {e}");
                }
                prop_assert_eq!(
                    snapshot(&document, &interner),
                    snapshot(&fresh, &fresh_interner),
                    "phrase graph after {:?}",
                    op
                );
            }
        }

        fn pick(index: prop::sample::Index, len: usize) -> u32 {
            u32::try_from(index.index(len) + 1).unwrap_or(u32::MAX)
        }
    }
}
