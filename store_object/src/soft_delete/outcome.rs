use crate::errors::StoreError;
use crate::id_type::UniversalId;
use std::fmt;

/// One record, addressed by table and id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub table: &'static str,
    pub id: UniversalId,
}

impl RecordRef {
    pub fn new(table: &'static str, id: UniversalId) -> Self {
        Self { table, id }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.id)
    }
}

/// A dependent whose foreign key was cleared by a set-null relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nullified {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub id: UniversalId,
}

/// A dependent that blocks a delete through a protect relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedDependent {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub id: UniversalId,
    /// The record the dependent points at; the delete root or one of its cascade
    pub protects_table: &'static str,
    pub protects_id: UniversalId,
}

impl fmt::Display for ProtectedDependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ({} -> {}:{})",
            self.table, self.id, self.foreign_key, self.protects_table, self.protects_id
        )
    }
}

/// Everything a committed soft delete changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub root: RecordRef,
    /// Records deactivated by cascade, in discovery order (root excluded)
    pub deactivated: Vec<RecordRef>,
    pub nullified: Vec<Nullified>,
}

impl DeleteOutcome {
    pub fn was_deactivated(&self, table: &str, id: &UniversalId) -> bool {
        (self.root.table == table && &self.root.id == id)
            || self
                .deactivated
                .iter()
                .any(|record| record.table == table && &record.id == id)
    }

    pub fn was_nullified(&self, table: &str, id: &UniversalId) -> bool {
        self.nullified
            .iter()
            .any(|record| record.table == table && &record.id == id)
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    pub id: UniversalId,
    pub error: StoreError,
}

/// Per-record results of a batch; records succeed or fail independently
#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchFailure>,
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, id: UniversalId, result: Result<T, StoreError>) {
        match result {
            Ok(value) => self.succeeded.push(value),
            Err(error) => self.failed.push(BatchFailure { id, error }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failure_for(&self, id: &UniversalId) -> Option<&StoreError> {
        self.failed
            .iter()
            .find(|failure| &failure.id == id)
            .map(|failure| &failure.error)
    }
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_keeps_failures_apart() {
        let mut report = BatchReport::new();
        report.record(UniversalId::Numeric(1), Ok("first"));
        report.record(
            UniversalId::Numeric(2),
            Err(StoreError::not_found("orders", 2)),
        );

        assert_eq!(report.succeeded, vec!["first"]);
        assert!(!report.is_complete());
        assert!(report
            .failure_for(&UniversalId::Numeric(2))
            .is_some_and(StoreError::is_not_found));
        assert!(report.failure_for(&UniversalId::Numeric(1)).is_none());
    }

    #[test]
    fn test_outcome_lookup_includes_root() {
        let outcome = DeleteOutcome {
            root: RecordRef::new("categories", UniversalId::Numeric(1)),
            deactivated: vec![RecordRef::new("categories", UniversalId::Numeric(2))],
            nullified: vec![],
        };

        assert!(outcome.was_deactivated("categories", &UniversalId::Numeric(1)));
        assert!(outcome.was_deactivated("categories", &UniversalId::Numeric(2)));
        assert!(!outcome.was_deactivated("products", &UniversalId::Numeric(2)));
        assert_eq!(outcome.root.to_string(), "categories:1");
    }
}
