use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use thiserror::Error;

use crate::constants::Word;

/// Returned when popping from a channel with nothing queued.
///
/// This is not a fault: a machine reading from an empty channel suspends until more input is
/// pushed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("channel is empty")]
pub struct Empty;

/// Unbounded FIFO queue of words linking a producer to a consumer.
///
/// Cloning a channel gives another handle to the same queue, which is how both ends of a link
/// get access to it. Handles are not `Send`, so both ends always live on the same thread.
#[derive(Clone, Default)]
pub struct Channel {
    queue: Rc<RefCell<VecDeque<Word>>>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.queue.borrow().iter()).finish()
    }
}

impl FromIterator<Word> for Channel {
    fn from_iter<T: IntoIterator<Item = Word>>(iter: T) -> Self {
        Self {
            queue: Rc::new(RefCell::new(iter.into_iter().collect())),
        }
    }
}

impl Channel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a value at the tail
    pub fn push(&self, value: Word) {
        self.queue.borrow_mut().push_back(value);
    }

    /// Take the value at the head
    ///
    /// # Errors
    ///
    /// Fails if nothing is queued.
    pub fn pop(&self) -> Result<Word, Empty> {
        self.queue.borrow_mut().pop_front().ok_or(Empty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Take every queued value, oldest first
    #[must_use]
    pub fn drain(&self) -> Vec<Word> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
