//! Fault queue: collect, deduplicate and sort faults for one transaction.

use crate::{Fault, LocatedFault, Severity};

/// Configuration for fault processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FaultConfig {
    /// Maximum number of error-severity faults before further errors are
    /// dropped (0 = unlimited). Advisories are never limited.
    pub error_limit: usize,
    /// Drop exact duplicates on the same line.
    pub deduplicate: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        FaultConfig {
            error_limit: 100,
            deduplicate: true,
        }
    }
}

impl FaultConfig {
    /// A config with no limits (for testing).
    pub const fn unlimited() -> Self {
        FaultConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

/// Collects the faults produced by one edit transaction or document load,
/// then flushes them sorted by (line, boundary start, code).
#[derive(Clone, Debug, Default)]
pub struct FaultQueue {
    faults: Vec<LocatedFault>,
    error_count: usize,
    config: FaultConfig,
}

impl FaultQueue {
    /// Create a queue with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with explicit configuration.
    pub fn with_config(config: FaultConfig) -> Self {
        FaultQueue {
            faults: Vec::new(),
            error_count: 0,
            config,
        }
    }

    /// Add one fault located at a line.
    pub fn add(&mut self, line: u32, fault: Fault) {
        if fault.severity() == Severity::Error {
            if self.config.error_limit != 0 && self.error_count >= self.config.error_limit {
                return;
            }
            self.error_count += 1;
        }

        let located = LocatedFault { line, fault };
        if self.config.deduplicate
            && self
                .faults
                .iter()
                .any(|f| f.line == line && f.fault == located.fault)
        {
            return;
        }
        self.faults.push(located);
    }

    /// Add every fault a statement carries.
    pub fn add_all<'a>(&mut self, line: u32, faults: impl IntoIterator<Item = &'a Fault>) {
        for fault in faults {
            self.add(line, fault.clone());
        }
    }

    /// Number of error-severity faults collected so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// True when nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Drain the queue sorted by position, then code.
    pub fn flush(&mut self) -> Vec<LocatedFault> {
        let mut out = std::mem::take(&mut self.faults);
        self.error_count = 0;
        out.sort_by_key(|f| {
            (
                f.line,
                f.fault.boundary.map_or(0, |b| b.start),
                f.fault.code.code(),
            )
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FaultCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn flush_sorted() {
        let mut queue = FaultQueue::new();
        queue.add(5, Fault::of(FaultCode::EmptyPattern));
        queue.add(1, Fault::of(FaultCode::StatementBeginsWithComma));
        queue.add(3, Fault::of(FaultCode::UnterminatedGroup));

        let lines: Vec<u32> = queue.flush().iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
        assert!(queue.is_empty());
    }

    #[test]
    fn dedup_same_line() {
        let mut queue = FaultQueue::new();
        queue.add(2, Fault::of(FaultCode::EmptyPattern));
        queue.add(2, Fault::of(FaultCode::EmptyPattern));
        assert_eq!(queue.flush().len(), 1);
    }

    #[test]
    fn error_limit() {
        let mut queue = FaultQueue::with_config(FaultConfig {
            error_limit: 2,
            deduplicate: false,
        });
        for line in 1..=5 {
            queue.add(line, Fault::of(FaultCode::EmptyPattern));
        }
        assert_eq!(queue.flush().len(), 2);
    }

    #[test]
    fn advisories_not_limited() {
        let mut queue = FaultQueue::with_config(FaultConfig {
            error_limit: 1,
            deduplicate: false,
        });
        queue.add(1, Fault::of(FaultCode::EmptyPattern));
        queue.add(2, Fault::of(FaultCode::EmptyPattern)); // over the limit
        queue.add(3, Fault::of(FaultCode::MixedIndent)); // advisory
        assert_eq!(queue.flush().len(), 2);
    }
}
