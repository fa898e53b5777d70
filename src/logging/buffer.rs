//! In-memory queue of formatted lines awaiting a flush
//!
//! Producers push from any thread; flushes drain the whole queue in one
//! step. The lock is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Unbounded FIFO of formatted log lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Mutex<VecDeque<String>>,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    // Queued lines stay reachable after a poisoned lock
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line to the tail
    pub fn push(&self, line: String) {
        self.lock().push_back(line);
    }

    /// Remove and return every queued line in FIFO order
    pub fn drain_all(&self) -> Vec<String> {
        let drained = std::mem::take(&mut *self.lock());
        drained.into()
    }

    /// Put a batch back at the head, ahead of anything queued since it was drained
    pub fn requeue_front(&self, batch: Vec<String>) {
        if batch.is_empty() {
            return;
        }
        let mut lines = self.lock();
        for line in batch.into_iter().rev() {
            lines.push_front(line);
        }
    }

    /// Number of lines waiting
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_drain_returns_fifo_and_empties() {
        let buffer = LineBuffer::new();
        buffer.push("one".to_string());
        buffer.push("two".to_string());
        buffer.push("three".to_string());

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.drain_all(), vec!["one", "two", "three"]);
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn test_requeue_front_keeps_order() {
        let buffer = LineBuffer::new();
        buffer.push("a".to_string());
        buffer.push("b".to_string());
        let batch = buffer.drain_all();

        buffer.push("c".to_string());
        buffer.requeue_front(batch);

        assert_eq!(buffer.drain_all(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_requeue_empty_batch_is_noop() {
        let buffer = LineBuffer::new();
        buffer.push("x".to_string());
        buffer.requeue_front(Vec::new());
        assert_eq!(buffer.drain_all(), vec!["x"]);
    }

    #[test]
    fn test_concurrent_push_and_drain_loses_nothing() {
        let buffer = Arc::new(LineBuffer::new());
        let producers: Vec<_> = (0..8)
            .map(|p| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        buffer.push(format!("{}-{}", p, i));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        while producers.iter().any(|h| !h.is_finished()) {
            seen.extend(buffer.drain_all());
        }
        for handle in producers {
            handle.join().unwrap();
        }
        seen.extend(buffer.drain_all());

        assert_eq!(seen.len(), 8 * 500);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), seen.len());

        // Per-producer order survives interleaved drains
        for p in 0..8 {
            let prefix = format!("{}-", p);
            let order: Vec<usize> = seen
                .iter()
                .filter_map(|l| l.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(order, (0..500).collect::<Vec<_>>());
        }
    }
}
