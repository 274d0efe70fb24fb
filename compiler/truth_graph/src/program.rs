//! The program: document set, events, references and the verification
//! scheduler.
//!
//! All mutation funnels through [`Program::edit`] and
//! [`Program::edit_atomic`]. A transaction cancels any in-flight
//! verification cycle, applies its edits, refreshes reference faults once,
//! sweeps pending phrase disposals, and relaunches verification when
//! auto-verify is on and marked phrases remain. The host drives verification
//! forward by polling [`Program::pump`] and drains host-visible events with
//! [`Program::take_events`].

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use truth_diagnostic::{Fault, FaultCode, FaultConfig, FaultQueue, LocatedFault};
use truth_ir::{ClarifierKey, KnownUri, LineEdit, Name, RangeEdit, Subject, TermInterner, UriProtocol};

use crate::document::{Document, DocumentId};
use crate::error::ContractError;
use crate::event::Event;
use crate::phrase::{Fork, PhraseId};

/// Program-wide knobs.
#[derive(Clone, Debug)]
pub struct ProgramConfig {
    /// Relaunch verification automatically after each edit transaction.
    pub auto_verify: bool,
    /// Phrase constructions per [`Program::pump`] call.
    pub chunk_size: usize,
    /// Fault limiting and deduplication for [`Program::faults`].
    pub faults: FaultConfig,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        ProgramConfig {
            auto_verify: true,
            chunk_size: 32,
            faults: FaultConfig::default(),
        }
    }
}

/// Swappable source of document text. Loading is synchronous; the program
/// guards against cyclic references with an in-progress registry.
pub trait UriReader {
    /// Text of the document at `uri`, or `None` when it cannot be loaded.
    fn read(&mut self, uri: &KnownUri) -> Option<String>;
}

/// Reader that resolves nothing. Every reference becomes unresolved.
#[derive(Default)]
pub struct NullUriReader;

impl UriReader for NullUriReader {
    fn read(&mut self, _uri: &KnownUri) -> Option<String> {
        None
    }
}

/// In-memory reader keyed by raw URI text.
#[derive(Default)]
pub struct MapUriReader {
    texts: FxHashMap<String, String>,
}

impl MapUriReader {
    pub fn with(mut self, uri: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(uri.into(), text.into());
        self
    }
}

impl UriReader for MapUriReader {
    fn read(&mut self, uri: &KnownUri) -> Option<String> {
        self.texts.get(&uri.raw).cloned()
    }
}

/// External collaborator that turns verified phrases into Facts. The
/// compiler core only drives it; resolution semantics live outside.
pub trait FactBuilder {
    fn construct(&mut self, document: DocumentId, subject: Name, clarifier: ClarifierKey);
}

/// Builder that constructs nothing. Ships for tests and the CLI.
#[derive(Default)]
pub struct NullFactBuilder;

impl FactBuilder for NullFactBuilder {
    fn construct(&mut self, _document: DocumentId, _subject: Name, _clarifier: ClarifierKey) {}
}

/// Verification stages, strictly ordered.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VerifyStage {
    Idle,
    Started,
    /// Constructing exactly the directly-marked phrases.
    Marked,
    /// Constructing phrases of documents that transitively depend on a
    /// document containing a marked phrase.
    Affected,
    /// Constructing everything else.
    Included,
}

struct Scheduler {
    stage: VerifyStage,
    marked: FxHashSet<(DocumentId, PhraseId)>,
    queue: VecDeque<(DocumentId, PhraseId)>,
    constructed: FxHashSet<(DocumentId, PhraseId)>,
}

impl Scheduler {
    fn new() -> Self {
        Scheduler {
            stage: VerifyStage::Idle,
            marked: FxHashSet::default(),
            queue: VecDeque::new(),
            constructed: FxHashSet::default(),
        }
    }

    fn launch(&mut self) {
        self.stage = VerifyStage::Started;
        self.queue.clear();
        self.constructed.clear();
    }

    /// Abandon the in-flight cycle. Marked phrases survive; the next cycle
    /// starts its marked stage from scratch.
    fn cancel(&mut self) {
        self.stage = VerifyStage::Idle;
        self.queue.clear();
        self.constructed.clear();
    }
}

/// Zone classification for a (line, column) position.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Zone {
    Whitespace,
    Declaration { index: usize },
    DeclarationCombinator,
    Annotation { index: usize },
    AnnotationCombinator,
    Pattern,
    Joint,
    Void,
}

/// Edit primitives collected inside one transaction.
#[derive(Default)]
pub struct EditBatch {
    edits: Vec<LineEdit>,
}

impl EditBatch {
    /// Insert `text` so that it becomes line `line`.
    pub fn insert(&mut self, line: u32, text: impl Into<String>) {
        self.edits.push(LineEdit::insert(line, text));
    }

    /// Replace the text of line `line`.
    pub fn update(&mut self, line: u32, text: impl Into<String>) {
        self.edits.push(LineEdit::update(line, text));
    }

    /// Delete `count` lines starting at `line`.
    pub fn delete(&mut self, line: u32, count: u32) {
        self.edits.push(LineEdit::delete(line, count));
    }
}

/// Owner of every document, the interner and the verification scheduler.
pub struct Program {
    documents: Vec<Option<Document>>,
    interner: TermInterner,
    config: ProgramConfig,
    events: Vec<Event>,
    version: u64,
    reader: Box<dyn UriReader>,
    builder: Box<dyn FactBuilder>,
    uri_index: FxHashMap<String, DocumentId>,
    loading: FxHashMap<String, DocumentId>,
    scheduler: Scheduler,
}

impl Program {
    pub fn new(config: ProgramConfig) -> Self {
        Self::with_collaborators(
            config,
            Box::new(NullUriReader),
            Box::new(NullFactBuilder),
        )
    }

    pub fn with_collaborators(
        config: ProgramConfig,
        reader: Box<dyn UriReader>,
        builder: Box<dyn FactBuilder>,
    ) -> Self {
        Program {
            documents: Vec::new(),
            interner: TermInterner::new(),
            config,
            events: Vec::new(),
            version: 0,
            reader,
            builder,
            uri_index: FxHashMap::default(),
            loading: FxHashMap::default(),
            scheduler: Scheduler::new(),
        }
    }

    /// The shared term interner.
    pub fn interner(&self) -> &TermInterner {
        &self.interner
    }

    /// Version stamp, bumped once per completed transaction.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn document(&self, id: DocumentId) -> Result<&Document, ContractError> {
        self.documents
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(ContractError::UnknownDocument)
    }

    fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document, ContractError> {
        self.documents
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(ContractError::UnknownDocument)
    }

    // ----- lifecycle -----

    /// Create a document from raw text, with no URI.
    pub fn create_document(&mut self, text: &str) -> Result<DocumentId, ContractError> {
        self.scheduler.cancel();
        let id = self.allocate(None, false);
        let interner = self.interner.clone();
        self.document_mut(id)?.load_text(text, &interner)?;
        self.events.push(Event::DocumentCreate { document: id });
        self.finish_transaction(id)?;
        Ok(id)
    }

    /// Load the document at `uri` through the reader, following its
    /// references recursively. Cyclic references resolve to the in-progress
    /// load instead of duplicating it.
    pub fn load(&mut self, uri: &str) -> Result<DocumentId, ContractError> {
        let uri =
            KnownUri::parse(uri).ok_or_else(|| ContractError::UnrecognizedUri(uri.to_owned()))?;
        self.scheduler.cancel();
        self.ensure_loaded(&uri)?
            .ok_or_else(|| ContractError::UnrecognizedUri(uri.raw.clone()))
    }

    fn ensure_loaded(&mut self, uri: &KnownUri) -> Result<Option<DocumentId>, ContractError> {
        if let Some(&id) = self.uri_index.get(&uri.raw) {
            return Ok(Some(id));
        }
        if let Some(&id) = self.loading.get(&uri.raw) {
            trace!(uri = %uri, "reference cycle: joining in-progress load");
            return Ok(Some(id));
        }
        let Some(text) = self.reader.read(uri) else {
            return Ok(None);
        };

        debug!(uri = %uri, "loading document");
        let id = self.allocate(Some(uri.clone()), false);
        // Registered before following references, so a cyclic reference
        // joins this load instead of starting another.
        self.loading.insert(uri.raw.clone(), id);
        let interner = self.interner.clone();
        let mut outcome = match self.document_mut(id) {
            Ok(d) => d.load_text(&text, &interner),
            Err(e) => Err(e),
        };
        if outcome.is_ok() {
            self.events.push(Event::DocumentCreate { document: id });
            outcome = self.finish_transaction(id);
        }
        self.loading.remove(&uri.raw);
        outcome?;
        self.uri_index.insert(uri.raw.clone(), id);
        Ok(Some(id))
    }

    fn allocate(&mut self, uri: Option<KnownUri>, read_only: bool) -> DocumentId {
        let id = DocumentId(u32::try_from(self.documents.len()).unwrap_or(u32::MAX));
        self.documents.push(Some(Document::new(id, uri, read_only)));
        id
    }

    /// Remove a document. Its phrases vanish without undeclare events; the
    /// delete event stands for all of them.
    pub fn remove_document(&mut self, id: DocumentId) -> Result<(), ContractError> {
        self.scheduler.cancel();
        let document = self
            .documents
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(ContractError::UnknownDocument)?;
        if let Some(uri) = document.uri() {
            self.uri_index.remove(&uri.raw);
        }
        for dep in &document.dependencies {
            if let Some(Some(d)) = self.documents.get_mut(dep.0 as usize) {
                d.dependents.remove(&id);
            }
        }
        for dep in &document.dependents {
            if let Some(Some(d)) = self.documents.get_mut(dep.0 as usize) {
                d.dependencies.remove(&id);
            }
        }
        self.scheduler.marked.retain(|(doc, _)| *doc != id);
        self.events.push(Event::DocumentDelete { document: id });
        self.version += 1;
        Ok(())
    }

    pub fn set_document_uri(
        &mut self,
        id: DocumentId,
        uri: Option<KnownUri>,
    ) -> Result<(), ContractError> {
        let old = self.document(id)?.uri().cloned();
        if let Some(old) = &old {
            self.uri_index.remove(&old.raw);
        }
        if let Some(new) = &uri {
            self.uri_index.insert(new.raw.clone(), id);
        }
        self.document_mut(id)?.set_uri(uri);
        self.events.push(Event::DocumentUriChange { document: id });
        Ok(())
    }

    // ----- mutation -----

    /// Run one edit transaction. The batch is applied atomically: a
    /// contract error leaves the document untouched.
    pub fn edit<F>(&mut self, document: DocumentId, build: F) -> Result<(), ContractError>
    where
        F: FnOnce(&mut EditBatch),
    {
        let mut batch = EditBatch::default();
        build(&mut batch);
        self.apply(document, &batch.edits)
    }

    /// Translate editor-style range edits into primitives and apply them as
    /// one transaction.
    pub fn edit_atomic(
        &mut self,
        document: DocumentId,
        ranges: &[RangeEdit],
    ) -> Result<(), ContractError> {
        let mut edits = Vec::new();
        for range in ranges {
            edits.extend(self.translate_range(document, range)?);
        }
        self.apply(document, &edits)
    }

    fn apply(&mut self, id: DocumentId, edits: &[LineEdit]) -> Result<(), ContractError> {
        self.scheduler.cancel();
        let interner = self.interner.clone();
        let changes = self.document_mut(id)?.apply_edits(edits, &interner)?;
        for change in changes {
            self.events.push(Event::StatementChange {
                document: id,
                change,
            });
        }
        self.finish_transaction(id)
    }

    /// The always-run finalize stage: reference faults once, disposal
    /// sweep, version bump, verification marking and relaunch.
    fn finish_transaction(&mut self, id: DocumentId) -> Result<(), ContractError> {
        self.refresh_references(id)?;

        let document = self.document_mut(id)?;
        document.arena.sweep();
        let phrase_events = document.arena.take_events();
        let touched = document.arena.take_touched();

        for event in phrase_events {
            self.events.push(match event {
                crate::phrase::PhraseEvent::Declare { subject, clarifier } => Event::Declare {
                    document: id,
                    subject,
                    clarifier,
                },
                crate::phrase::PhraseEvent::Undeclare { subject, clarifier } => Event::Undeclare {
                    document: id,
                    subject,
                    clarifier,
                },
            });
        }
        for phrase in touched {
            self.scheduler.marked.insert((id, phrase));
        }

        self.version += 1;
        if self.config.auto_verify && !self.scheduler.marked.is_empty() {
            debug!(document = ?id, marked = self.scheduler.marked.len(), "relaunching verification");
            self.scheduler.launch();
        }
        Ok(())
    }

    // ----- references -----

    fn refresh_references(&mut self, id: DocumentId) -> Result<(), ContractError> {
        let (base, raw_refs, real_refs): (Option<KnownUri>, Vec<(usize, KnownUri)>, Vec<(usize, KnownUri)>) = {
            let document = self.document(id)?;
            (
                document.uri().cloned(),
                document
                    .raw_references()
                    .into_iter()
                    .map(|(l, u)| (l, u.clone()))
                    .collect(),
                document
                    .real_references()
                    .into_iter()
                    .map(|(l, u)| (l, u.clone()))
                    .collect(),
            )
        };

        let mut faults: Vec<LocatedFault> = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for (line, uri) in &raw_refs {
            if !seen.insert(uri.raw.as_str()) {
                faults.push(located(*line, FaultCode::DuplicateReference));
            }
        }

        let mut targets = Vec::new();
        for (line, uri) in &real_refs {
            let resolved = match (&base, uri.protocol.is_relative()) {
                (Some(base), true) => uri.resolve_against(base),
                _ => uri.clone(),
            };
            if base.as_ref().is_some_and(|b| b.protocol.is_secure())
                && resolved.protocol == UriProtocol::Http
            {
                faults.push(located(*line, FaultCode::InsecureReference));
            }
            match self.ensure_loaded(&resolved)? {
                Some(target) if target != id => targets.push(target),
                Some(_) => {}
                None => faults.push(located(*line, FaultCode::UnresolvedReference)),
            }
        }

        let document = self.document_mut(id)?;
        document.reference_faults = faults;
        let old_deps: Vec<DocumentId> = document.dependencies.iter().copied().collect();
        document.dependencies = targets.iter().copied().collect();

        for dep in old_deps {
            if !targets.contains(&dep) {
                if let Some(Some(d)) = self.documents.get_mut(dep.0 as usize) {
                    d.dependents.remove(&id);
                }
            }
        }
        for target in targets {
            if let Some(Some(d)) = self.documents.get_mut(target.0 as usize) {
                d.dependents.insert(id);
            }
        }
        Ok(())
    }

    // ----- verification -----

    /// Current verification stage.
    pub fn stage(&self) -> VerifyStage {
        self.scheduler.stage
    }

    /// Phrases awaiting (re)construction.
    pub fn marked_count(&self) -> usize {
        self.scheduler.marked.len()
    }

    /// Run one chunk of verification work. Returns true while work remains.
    pub fn pump(&mut self) -> bool {
        if self.scheduler.stage == VerifyStage::Idle {
            return false;
        }
        let chunk = self.config.chunk_size.max(1);
        for _ in 0..chunk {
            if let Some((doc, phrase)) = self.scheduler.queue.pop_front() {
                self.construct(doc, phrase);
            } else if !self.advance_stage() {
                return false;
            }
        }
        true
    }

    fn construct(&mut self, doc: DocumentId, phrase: PhraseId) {
        let Ok(document) = self.document(doc) else {
            return;
        };
        let (Some(subject), Some(clarifier)) = (
            document.arena.subject(phrase),
            document.arena.clarifier(phrase),
        ) else {
            return;
        };
        self.builder.construct(doc, subject, clarifier);
        self.scheduler.constructed.insert((doc, phrase));
    }

    fn advance_stage(&mut self) -> bool {
        match self.scheduler.stage {
            VerifyStage::Idle => false,
            VerifyStage::Started => {
                let mut marked: Vec<(DocumentId, PhraseId)> =
                    self.scheduler.marked.iter().copied().collect();
                marked.sort_by_key(|(doc, phrase)| (doc.0, phrase.sort_key()));
                marked.retain(|(doc, phrase)| {
                    self.document(*doc)
                        .is_ok_and(|d| d.arena.is_live(*phrase))
                });
                self.scheduler.queue.extend(marked);
                self.scheduler.stage = VerifyStage::Marked;
                true
            }
            VerifyStage::Marked => {
                let affected = self.affected_documents();
                self.enqueue_documents_set(&affected);
                self.scheduler.stage = VerifyStage::Affected;
                true
            }
            VerifyStage::Affected => {
                let affected = self.affected_documents();
                let rest: Vec<DocumentId> = self
                    .document_ids()
                    .into_iter()
                    .filter(|d| !affected.contains(d))
                    .collect();
                self.enqueue_documents(&rest);
                self.scheduler.stage = VerifyStage::Included;
                true
            }
            VerifyStage::Included => {
                self.scheduler.marked.clear();
                self.scheduler.constructed.clear();
                self.scheduler.stage = VerifyStage::Idle;
                self.events.push(Event::VerificationComplete);
                false
            }
        }
    }

    /// Documents that transitively depend on a document containing a marked
    /// phrase. Cycle-safe: tracked by an explicit visited set.
    fn affected_documents(&self) -> FxHashSet<DocumentId> {
        let mut visited: FxHashSet<DocumentId> = FxHashSet::default();
        let mut worklist: Vec<DocumentId> = self
            .scheduler
            .marked
            .iter()
            .map(|(doc, _)| *doc)
            .collect();
        while let Some(doc) = worklist.pop() {
            if !visited.insert(doc) {
                continue;
            }
            if let Ok(document) = self.document(doc) {
                worklist.extend(document.dependents.iter().copied());
            }
        }
        visited
    }

    fn document_ids(&self) -> Vec<DocumentId> {
        self.documents
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                d.as_ref()
                    .map(|_| DocumentId(u32::try_from(i).unwrap_or(u32::MAX)))
            })
            .collect()
    }

    fn enqueue_documents(&mut self, ids: &[DocumentId]) {
        let mut batch = Vec::new();
        for &id in ids {
            if let Ok(document) = self.document(id) {
                for phrase in document.arena.live_phrases() {
                    if !self.scheduler.constructed.contains(&(id, phrase)) {
                        batch.push((id, phrase));
                    }
                }
            }
        }
        batch.sort_by_key(|(doc, phrase)| (doc.0, phrase.sort_key()));
        self.scheduler.queue.extend(batch);
    }

    fn enqueue_documents_set(&mut self, ids: &FxHashSet<DocumentId>) {
        let mut sorted: Vec<DocumentId> = ids.iter().copied().collect();
        sorted.sort_by_key(|d| d.0);
        self.enqueue_documents(&sorted);
    }

    // ----- events, faults -----

    /// Drain the pending event queue.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// All faults of one document, statement and reference faults merged,
    /// deduplicated and limited per the program's fault configuration.
    pub fn faults(&self, id: DocumentId) -> Result<Vec<LocatedFault>, ContractError> {
        let mut queue = FaultQueue::with_config(self.config.faults.clone());
        for located in self.document(id)?.faults() {
            queue.add(located.line, located.fault);
        }
        Ok(queue.flush())
    }

    // ----- queries -----

    /// Walk `path` from the root phrase, matching every homograph at each
    /// step.
    pub fn query(
        &self,
        document: DocumentId,
        path: &[&str],
    ) -> Result<Vec<PhraseId>, ContractError> {
        self.query_walk(document, path, None)
    }

    /// Like [`query`](Self::query), but the final step must match the exact
    /// clarifier formed by `clarifier_terms`.
    pub fn query_with_clarifier(
        &self,
        document: DocumentId,
        path: &[&str],
        clarifier_terms: &[&str],
    ) -> Result<Vec<PhraseId>, ContractError> {
        let names: Vec<Name> = clarifier_terms
            .iter()
            .map(|t| self.interner.intern(t))
            .collect();
        self.query_walk(document, path, Some(ClarifierKey::of(&names)))
    }

    fn query_walk(
        &self,
        document: DocumentId,
        path: &[&str],
        final_clarifier: Option<ClarifierKey>,
    ) -> Result<Vec<PhraseId>, ContractError> {
        let doc = self.document(document)?;
        let mut current = vec![doc.arena.root()];
        for (i, segment) in path.iter().enumerate() {
            let name = self.interner.intern(segment);
            let clarifier = if i + 1 == path.len() {
                final_clarifier
            } else {
                None
            };
            let mut next = Vec::new();
            for &phrase in &current {
                next.extend(doc.arena.peek(phrase, name, clarifier));
            }
            if next.is_empty() {
                return Ok(next);
            }
            current = next;
        }
        Ok(current)
    }

    /// Outbound forks of a phrase, for the external inheritance resolver.
    pub fn outbounds(
        &mut self,
        document: DocumentId,
        phrase: PhraseId,
    ) -> Result<Vec<Fork>, ContractError> {
        let version = self.version;
        Ok(self.document_mut(document)?.arena.outbounds(phrase, version))
    }

    /// Classify the (line, column) position within a document.
    pub fn inspect(
        &self,
        document: DocumentId,
        line: usize,
        col: u32,
    ) -> Result<Zone, ContractError> {
        let statement = self.document(document)?.statement(line)?;

        if statement.flags().contains(truth_ir::StatementFlags::WHITESPACE) {
            return Ok(Zone::Whitespace);
        }
        if statement.is_noop() {
            return Ok(Zone::Void);
        }
        if col < statement.indent() {
            return Ok(Zone::Whitespace);
        }
        if statement.joint().is_some_and(|j| j == col) {
            return Ok(Zone::Joint);
        }
        for (index, span) in statement.declarations().iter().enumerate() {
            if span.boundary.contains(col) {
                return Ok(match span.subject {
                    Subject::Pattern(_) => Zone::Pattern,
                    _ => Zone::Declaration { index },
                });
            }
        }
        for (index, span) in statement.annotations().iter().enumerate() {
            if span.boundary.contains(col) {
                return Ok(Zone::Annotation { index });
            }
        }

        // Between spans: a combinator position on whichever side of the
        // joint the column falls.
        let declaration_side = statement.joint().map_or(true, |j| col < j);
        let in_declarations = statement
            .declarations()
            .first()
            .zip(statement.declarations().last())
            .is_some_and(|(first, last)| col >= first.boundary.start && col < last.boundary.end);
        if declaration_side && in_declarations {
            return Ok(Zone::DeclarationCombinator);
        }
        let in_annotations = statement
            .annotations()
            .first()
            .zip(statement.annotations().last())
            .is_some_and(|(first, last)| col >= first.boundary.start && col < last.boundary.end);
        if !declaration_side && in_annotations {
            return Ok(Zone::AnnotationCombinator);
        }
        Ok(Zone::Void)
    }

    // ----- range-edit translation -----

    /// Translate one editor range edit into line-edit primitives, with
    /// fast-path detection for pure inserts at a line end and pure deletes
    /// spanning whole lines.
    fn translate_range(
        &self,
        document: DocumentId,
        range: &RangeEdit,
    ) -> Result<Vec<LineEdit>, ContractError> {
        let doc = self.document(document)?;
        let start_line = range.start_line as usize;
        let end_line = range.end_line as usize;

        // Appending to an empty document.
        if doc.is_empty() && start_line == 1 && end_line == 1 {
            return Ok(split_lines(&range.text)
                .into_iter()
                .enumerate()
                .map(|(i, piece)| LineEdit::insert(u32::try_from(i + 1).unwrap_or(u32::MAX), piece))
                .collect());
        }

        let start_text = doc.statement(start_line)?.text().to_owned();
        let end_text = doc.statement(end_line)?.text().to_owned();
        let start_col = (range.start_col as usize).min(start_text.len());
        let end_col = (range.end_col as usize).min(end_text.len());

        // Pure insert without a newline: one in-place update.
        if range.is_pure_insert() && !range.text.contains('\n') {
            let mut updated = start_text;
            updated.insert_str(start_col, &range.text);
            return Ok(vec![LineEdit::update(range.start_line, updated)]);
        }

        // Pure delete spanning whole lines.
        if range.text.is_empty() && start_col == 0 && end_col == 0 && end_line > start_line {
            return Ok(vec![LineEdit::delete(
                range.start_line,
                u32::try_from(end_line - start_line).unwrap_or(u32::MAX),
            )]);
        }

        // Pure insert of whole lines at a line start.
        if range.is_pure_insert() && start_col == 0 && range.text.ends_with('\n') {
            return Ok(split_lines(&range.text[..range.text.len() - 1])
                .into_iter()
                .enumerate()
                .map(|(i, piece)| {
                    LineEdit::insert(
                        range.start_line + u32::try_from(i).unwrap_or(u32::MAX),
                        piece,
                    )
                })
                .collect());
        }

        // General fallback: delete the affected lines and re-insert the
        // recombined text.
        let combined = format!(
            "{}{}{}",
            &start_text[..start_col],
            range.text,
            &end_text[end_col..]
        );
        let pieces = split_lines(&combined);
        if start_line == end_line && pieces.len() == 1 {
            let Some(only) = pieces.into_iter().next() else {
                return Ok(Vec::new());
            };
            return Ok(vec![LineEdit::update(range.start_line, only)]);
        }
        let mut edits = vec![LineEdit::delete(
            range.start_line,
            u32::try_from(end_line - start_line + 1).unwrap_or(u32::MAX),
        )];
        edits.extend(pieces.into_iter().enumerate().map(|(i, piece)| {
            LineEdit::insert(
                range.start_line + u32::try_from(i).unwrap_or(u32::MAX),
                piece,
            )
        }));
        Ok(edits)
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_owned).collect()
}

fn located(line: usize, code: FaultCode) -> LocatedFault {
    LocatedFault {
        line: u32::try_from(line).unwrap_or(u32::MAX),
        fault: Fault::of(code),
    }
}
