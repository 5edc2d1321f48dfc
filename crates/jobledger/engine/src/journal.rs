//! Event Journal: append-only record of everything the ledger emitted
//!
//! Every accepted transition appends one or more [`LedgerEvent`]s. Entries are
//! numbered from zero and never rewritten; a rejected operation leaves the
//! journal untouched.

use jobledger_types::{JobId, JournalEntry, LedgerEvent, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event stamped with the time of the current call.
    pub fn record(&mut self, at: Timestamp, event: LedgerEvent) {
        let sequence = self.entries.len() as u64;
        self.entries.push(JournalEntry {
            sequence,
            at,
            event,
        });
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[JournalEntry] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    pub fn for_job(&self, job_id: JobId) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |e| e.event.job_id() == Some(job_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number the next entry will get.
    pub fn next_sequence(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Drop entries appended since `mark` by a call that was then rejected.
    pub(crate) fn rollback_to(&mut self, mark: u64) {
        let keep = usize::try_from(mark).unwrap_or(usize::MAX);
        self.entries.truncate(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobledger_types::Address;

    #[test]
    fn sequences_are_dense_and_filterable() {
        let mut journal = EventJournal::new();
        let by = Address::from_bytes([1; 20]);
        journal.record(10, LedgerEvent::Paused { by });
        journal.record(
            11,
            LedgerEvent::JobDeleted {
                job_id: JobId(4),
                by,
                released: Default::default(),
            },
        );
        journal.record(12, LedgerEvent::Unpaused { by });

        let seqs: Vec<_> = journal.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(journal.since(1).len(), 2);
        assert!(journal.since(99).is_empty());
        assert_eq!(journal.for_job(JobId(4)).count(), 1);
        assert_eq!(journal.next_sequence(), 3);

        journal.rollback_to(1);
        assert_eq!(journal.next_sequence(), 1);
        journal.record(13, LedgerEvent::Paused { by });
        assert_eq!(journal.entries()[1].sequence, 1);
    }
}
