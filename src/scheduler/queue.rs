use crate::error::{JobqError, Result};
use crate::scheduler::job::JobRecord;

pub const DEFAULT_CAPACITY: usize = 256;

/// Fixed-capacity FIFO of job records, backed by a ring of preallocated slots.
///
/// The queue owns the records it holds; the scheduler mutates them only
/// through the positional accessors so the bookkeeping stays consistent.
/// A full queue rejects insertion instead of evicting, which is the
/// back-pressure signal surfaced to the operator on `submit`.
#[derive(Debug)]
pub struct BoundedJobQueue {
    slots: Vec<Option<JobRecord>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Default for BoundedJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundedJobQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    /// Append a record at the tail. Returns its logical position on success
    /// and `QueueFull` when every slot is live.
    pub fn insert(&mut self, job: JobRecord) -> Result<usize> {
        if self.is_full() {
            return Err(JobqError::QueueFull {
                capacity: self.capacity(),
            });
        }
        self.slots[self.tail] = Some(job);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        Ok(self.count - 1)
    }

    /// The record at the head, without removing it.
    pub fn peek_head(&self) -> Option<&JobRecord> {
        if self.is_empty() {
            None
        } else {
            self.slots[self.head].as_ref()
        }
    }

    /// Pop the head record. The slot is released and the live count shrinks,
    /// so a drained queue accepts new insertions again.
    pub fn remove_head(&mut self) -> Option<JobRecord> {
        if self.is_empty() {
            return None;
        }
        let job = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        job
    }

    /// Positional access in FIFO order; position 0 is the head.
    pub fn get(&self, pos: usize) -> Option<&JobRecord> {
        if pos >= self.count {
            return None;
        }
        self.slots[(self.head + pos) % self.slots.len()].as_ref()
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut JobRecord> {
        if pos >= self.count {
            return None;
        }
        let idx = (self.head + pos) % self.slots.len();
        self.slots[idx].as_mut()
    }

    /// Find a live record by job id.
    pub fn find_mut(&mut self, id: u64) -> Option<&mut JobRecord> {
        let len = self.slots.len();
        let head = self.head;
        (0..self.count)
            .map(|pos| (head + pos) % len)
            .find(|&idx| self.slots[idx].as_ref().is_some_and(|j| j.id == id))
            .and_then(|idx| self.slots[idx].as_mut())
    }

    /// Iterate live records in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        (0..self.count).filter_map(move |pos| self.get(pos))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn record(id: u64) -> JobRecord {
        JobRecord::new(id, vec!["echo".to_string(), id.to_string()], Path::new("."))
    }

    #[test]
    fn ring_wraps_across_many_cycles() {
        let mut queue = BoundedJobQueue::with_capacity(3);
        for round in 0..10u64 {
            let id = round * 2;
            queue.insert(record(id)).unwrap();
            queue.insert(record(id + 1)).unwrap();
            assert_eq!(queue.peek_head().unwrap().id, id);
            assert_eq!(queue.remove_head().unwrap().id, id);
            assert_eq!(queue.remove_head().unwrap().id, id + 1);
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn remove_head_frees_a_slot() {
        let mut queue = BoundedJobQueue::with_capacity(2);
        queue.insert(record(0)).unwrap();
        queue.insert(record(1)).unwrap();
        assert!(queue.insert(record(2)).is_err());

        queue.remove_head();
        assert_eq!(queue.len(), 1);
        assert!(queue.insert(record(2)).is_ok());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn positional_access_follows_fifo_order() {
        let mut queue = BoundedJobQueue::with_capacity(4);
        // Offset head so positions cross the wrap point.
        queue.insert(record(90)).unwrap();
        queue.insert(record(91)).unwrap();
        queue.remove_head();
        queue.remove_head();

        for id in 0..4 {
            queue.insert(record(id)).unwrap();
        }
        for pos in 0..4 {
            assert_eq!(queue.get(pos).unwrap().id, pos as u64);
        }
        assert!(queue.get(4).is_none());

        let ids: Vec<u64> = queue.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn find_mut_locates_by_id() {
        let mut queue = BoundedJobQueue::with_capacity(4);
        for id in 0..3 {
            queue.insert(record(id)).unwrap();
        }
        assert!(queue.find_mut(1).is_some());
        assert!(queue.find_mut(7).is_none());
    }
}
