use std::collections::BTreeMap;

use thiserror::Error;

/// Tampon de réordonnancement : accepte `(index, item)` dans n'importe quel
/// ordre et ne rend les items que strictement dans l'ordre des index.
///
/// # Example
/// ```
/// use gp_export::reorder::ReorderBuffer;
/// let mut buf = ReorderBuffer::new();
/// buf.push(1, "b").unwrap();
/// assert_eq!(buf.pop_ready(), None);
/// buf.push(0, "a").unwrap();
/// assert_eq!(buf.pop_ready(), Some("a"));
/// assert_eq!(buf.pop_ready(), Some("b"));
/// ```
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

/// Rejected insertion into a [`ReorderBuffer`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderError {
    /// Index already released.
    #[error("Frame {index} déjà émise (prochaine attendue : {next})")]
    Stale { index: usize, next: usize },
    /// Index already waiting in the buffer.
    #[error("Frame {index} reçue deux fois")]
    Duplicate { index: usize },
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    /// Empty buffer expecting index 0 first.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Range un item.
    ///
    /// # Errors
    /// `Stale` if `index` was already released, `Duplicate` if it is already pending.
    pub fn push(&mut self, index: usize, item: T) -> Result<(), ReorderError> {
        if index < self.next {
            return Err(ReorderError::Stale {
                index,
                next: self.next,
            });
        }
        if self.pending.contains_key(&index) {
            return Err(ReorderError::Duplicate { index });
        }
        self.pending.insert(index, item);
        Ok(())
    }

    /// Rend l'item suivant s'il est arrivé.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    /// Index of the next item to release.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Items waiting for an earlier index.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// `true` when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
