// src/results.rs
//! Bounded result windows and the half-open cursors that walk them
use std::fmt;
use std::sync::Arc;

/// A page `[start, start + max)` materialized from an executed search
pub struct ResultSet<T> {
    records: Arc<[T]>,
}

impl<T> ResultSet<T> {
    pub(crate) fn new(records: Vec<T>) -> Self {
        Self {
            records: Arc::from(records),
        }
    }

    /// Number of records actually materialized in the window
    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.records.get(idx)
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Cursor at the first record
    pub fn begin(&self) -> ResultCursor<T> {
        ResultCursor {
            records: Arc::clone(&self.records),
            position: 0,
        }
    }

    /// One-past-the-last cursor
    pub fn end(&self) -> ResultCursor<T> {
        ResultCursor {
            records: Arc::clone(&self.records),
            position: self.records.len(),
        }
    }

    pub fn iter(&self) -> ResultCursor<T> {
        self.begin()
    }
}

impl<T> Clone for ResultSet<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResultSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.records.iter()).finish()
    }
}

/// Forward-only cursor over one result set.
///
/// The cursor shares the records with its set, so it stays readable after the
/// set is dropped. Two cursors are equal only when they walk the same set and
/// sit at the same position.
pub struct ResultCursor<T> {
    records: Arc<[T]>,
    position: usize,
}

impl<T> ResultCursor<T> {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_end(&self) -> bool {
        self.position >= self.records.len()
    }

    /// Step forward; a cursor at the end stays there
    pub fn advance(&mut self) {
        if !self.is_end() {
            self.position += 1;
        }
    }

    /// The record under the cursor, `None` at the end
    pub fn current(&self) -> Option<&T> {
        self.records.get(self.position)
    }
}

impl<T> Clone for ResultCursor<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            position: self.position,
        }
    }
}

impl<T> PartialEq for ResultCursor<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.records, &other.records) && self.position == other.position
    }
}

impl<T> Eq for ResultCursor<T> {}

impl<T> fmt::Debug for ResultCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCursor")
            .field("position", &self.position)
            .field("len", &self.records.len())
            .finish()
    }
}

impl<T: Clone> Iterator for ResultCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let record = self.current().cloned();
        self.advance();
        record
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.records.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

/// Clamp a caller-supplied window to the available matches
pub(crate) fn window(total: usize, start: usize, max: usize) -> std::ops::Range<usize> {
    let begin = start.min(total);
    let end = begin.saturating_add(max).min(total);
    begin..end
}
