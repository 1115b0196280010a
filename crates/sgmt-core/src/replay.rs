//! One-element lookahead over a forward-only producer.
//!
//! A consumer can look at the next element (for example to learn a
//! stream's field list from its first source) and a later iteration of the
//! same stream still starts with that element.

use std::iter::Fuse;

/// Iterator adapter with an explicit single-slot lookahead buffer.
pub struct Replayable<I: Iterator> {
    inner: Fuse<I>,
    lookahead: Option<I::Item>,
}

impl<I: Iterator> Replayable<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner: inner.fuse(),
            lookahead: None,
        }
    }

    /// Next element without advancing the visible cursor.
    ///
    /// Pulls at most one element from the underlying producer; repeated
    /// calls return the same buffered element.
    pub fn peek(&mut self) -> Option<&I::Item> {
        if self.lookahead.is_none() {
            self.lookahead = self.inner.next();
        }
        self.lookahead.as_ref()
    }

    /// Consume the next element only when `accept` holds for it.
    pub fn next_if(&mut self, accept: impl FnOnce(&I::Item) -> bool) -> Option<I::Item> {
        match self.peek() {
            Some(item) if accept(item) => self.lookahead.take(),
            _ => None,
        }
    }
}

impl<I: Iterator> Iterator for Replayable<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.lookahead.take().or_else(|| self.inner.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = usize::from(self.lookahead.is_some());
        let (low, high) = self.inner.size_hint();
        (
            low.saturating_add(buffered),
            high.and_then(|h| h.checked_add(buffered)),
        )
    }
}
