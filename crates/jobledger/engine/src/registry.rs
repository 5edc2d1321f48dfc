//! Job Registry: the id to slot arena
//!
//! Ids are allocated sequentially from a configurable first id. A deleted job
//! leaves an empty slot behind: the id stays allocated, is never handed out
//! again, and reads of it return [`JobSlot::Empty`] rather than nothing.

use jobledger_types::{Job, JobId, JobStatus, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// What a read of an id finds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobSlot<'a> {
    /// Id not allocated yet, or below the first id
    Unallocated,
    /// Allocated, then deleted
    Empty,
    Occupied(&'a Job),
}

impl<'a> JobSlot<'a> {
    pub fn job(&self) -> Option<&'a Job> {
        match self {
            JobSlot::Occupied(job) => Some(job),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, JobSlot::Empty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRegistry {
    first_id: u64,
    #[serde(with = "stored_slots")]
    slots: Vec<Option<Job>>,
}

/// Slots are written as tagged records (`state = "empty"`) so the snapshot
/// fits formats without a null, TOML among them.
mod stored_slots {
    use jobledger_types::Job;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    #[serde(tag = "state", rename_all = "snake_case")]
    enum SlotRef<'a> {
        Occupied(&'a Job),
        Empty,
    }

    #[derive(Deserialize)]
    #[serde(tag = "state", rename_all = "snake_case")]
    enum Slot {
        Occupied(Box<Job>),
        Empty,
    }

    pub fn serialize<S: Serializer>(slots: &[Option<Job>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(slots.iter().map(|slot| match slot {
            Some(job) => SlotRef::Occupied(job),
            None => SlotRef::Empty,
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Option<Job>>, D::Error> {
        let slots = Vec::<Slot>::deserialize(deserializer)?;
        Ok(slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Occupied(job) => Some(*job),
                Slot::Empty => None,
            })
            .collect())
    }
}

impl JobRegistry {
    pub fn new(first_id: u64) -> Self {
        Self {
            first_id,
            slots: Vec::new(),
        }
    }

    /// Id the next created job will get.
    pub fn next_job_id(&self) -> LedgerResult<JobId> {
        self.first_id
            .checked_add(self.slots.len() as u64)
            .map(JobId)
            .ok_or_else(|| LedgerError::InvalidState("job id space exhausted".into()))
    }

    /// First id this registry allocated (or will allocate).
    pub fn first_id(&self) -> JobId {
        JobId(self.first_id)
    }

    fn index(&self, id: JobId) -> Option<usize> {
        let offset = id.0.checked_sub(self.first_id)?;
        let index = usize::try_from(offset).ok()?;
        (index < self.slots.len()).then_some(index)
    }

    pub fn slot(&self, id: JobId) -> JobSlot<'_> {
        match self.index(id) {
            None => JobSlot::Unallocated,
            Some(index) => match &self.slots[index] {
                Some(job) => JobSlot::Occupied(job),
                None => JobSlot::Empty,
            },
        }
    }

    pub fn get(&self, id: JobId) -> LedgerResult<&Job> {
        self.slot(id).job().ok_or(LedgerError::JobNotFound(id))
    }

    pub fn get_mut(&mut self, id: JobId) -> LedgerResult<&mut Job> {
        self.index(id)
            .and_then(|index| self.slots[index].as_mut())
            .ok_or(LedgerError::JobNotFound(id))
    }

    /// Store a job built for the next id.
    pub fn insert(&mut self, job: Job) -> LedgerResult<JobId> {
        let expected = self.next_job_id()?;
        if job.id != expected {
            return Err(LedgerError::InvalidState(format!(
                "job {} does not match next id {}",
                job.id, expected
            )));
        }
        self.slots.push(Some(job));
        Ok(expected)
    }

    /// Empty the slot and hand back what it held.
    pub fn remove(&mut self, id: JobId) -> LedgerResult<Job> {
        self.index(id)
            .and_then(|index| self.slots[index].take())
            .ok_or(LedgerError::JobNotFound(id))
    }

    /// Populated slots in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    /// Every allocated id with what it holds, empty slots included.
    pub fn slots(&self) -> impl Iterator<Item = (JobId, Option<&Job>)> {
        let first = self.first_id;
        self.slots
            .iter()
            .enumerate()
            .map(move |(i, slot)| (JobId(first + i as u64), slot.as_ref()))
    }

    pub fn open_jobs(&self) -> impl Iterator<Item = &Job> {
        self.iter().filter(|job| job.status() == JobStatus::Open)
    }

    /// Number of allocated ids, empty slots included.
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Number of populated slots.
    pub fn live(&self) -> usize {
        self.iter().count()
    }
}
