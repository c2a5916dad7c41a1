// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The [`BufferQueue`] struct and helper types.
//!
//! The queue holds the decoded chunks handed to the tokenizer and keeps a
//! running byte offset of everything consumed so far, which becomes the
//! source span of each token.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tendril::StrTendril;

pub use self::SetResult::{FromSet, NotFromSet};
use crate::util::smallcharset::SmallCharSet;

/// Result from [`BufferQueue::pop_except_from`] containing either a
/// character from a [`SmallCharSet`], or a string buffer of characters not
/// from the set.
#[derive(PartialEq, Eq, Debug)]
pub enum SetResult {
    /// A character from the `SmallCharSet`.
    FromSet(char),
    /// A block of text containing no characters from the `SmallCharSet`.
    NotFromSet(StrTendril),
}

/// A queue of owned string buffers, which supports incrementally consuming
/// characters.
#[derive(Debug)]
pub struct BufferQueue {
    /// Buffers to process.
    buffers: RefCell<VecDeque<StrTendril>>,
    /// Bytes consumed since the start of the stream.
    position: Cell<u64>,
}

impl Default for BufferQueue {
    fn default() -> Self {
        BufferQueue::new()
    }
}

impl BufferQueue {
    /// Create an empty BufferQueue.
    pub fn new() -> BufferQueue {
        BufferQueue::with_position(0)
    }

    /// Create an empty queue whose next byte sits at `position` in the
    /// stream.
    pub fn with_position(position: u64) -> BufferQueue {
        BufferQueue {
            buffers: RefCell::new(VecDeque::with_capacity(16)),
            position: Cell::new(position),
        }
    }

    /// Offset of the next unconsumed byte.
    pub fn position(&self) -> u64 {
        self.position.get()
    }

    fn advance(&self, n: usize) {
        self.position.set(self.position.get() + n as u64);
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.borrow().is_empty()
    }

    /// Add a buffer to the beginning of the queue.
    ///
    /// The text is treated as not yet consumed, so the position moves back
    /// by its length.
    pub fn push_front(&self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        self.position
            .set(self.position.get().saturating_sub(buf.len() as u64));
        self.buffers.borrow_mut().push_front(buf);
    }

    /// Consume everything left in the queue.
    pub fn clear(&self) {
        let n: usize = self.buffers.borrow_mut().drain(..).map(|b| b.len()).sum();
        self.advance(n);
    }

    /// Add a buffer to the end of the queue.
    pub fn push_back(&self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        self.buffers.borrow_mut().push_back(buf);
    }

    /// Look at the next available character, if any.
    pub fn peek(&self) -> Option<char> {
        // Invariant: all buffers in the queue are non-empty.
        self.buffers
            .borrow()
            .front()
            .and_then(|b| b.chars().next())
    }

    /// Get the next character, if one is available.
    pub fn next(&self) -> Option<char> {
        let mut buffers = self.buffers.borrow_mut();
        let (result, now_empty) = match buffers.front_mut() {
            None => (None, false),
            Some(buf) => {
                let c = buf.pop_front_char();
                (c, buf.is_empty())
            },
        };

        if now_empty {
            buffers.pop_front();
        }
        if let Some(c) = result {
            self.advance(c.len_utf8());
        }

        result
    }

    /// Pops and returns either a single character from the given set, or
    /// a `StrTendril` of characters none of which are in the set. The set
    /// is represented as a bitmask and so can only contain the first 64
    /// ASCII characters.
    pub fn pop_except_from(&self, set: SmallCharSet) -> Option<SetResult> {
        let mut buffers = self.buffers.borrow_mut();
        let (result, now_empty) = match buffers.front_mut() {
            None => (None, false),
            Some(buf) => {
                let n = set.nonmember_prefix_len(buf);
                if n > 0 {
                    let out;
                    unsafe {
                        out = buf.unsafe_subtendril(0, n);
                        buf.unsafe_pop_front(n);
                    }
                    self.advance(n as usize);
                    (Some(NotFromSet(out)), buf.is_empty())
                } else {
                    let c = buf.pop_front_char();
                    if let Some(c) = c {
                        self.advance(c.len_utf8());
                    }
                    (c.map(FromSet), buf.is_empty())
                }
            },
        };

        // Unborrow self for this part.
        if now_empty {
            buffers.pop_front();
        }

        result
    }

    /// Check if the next characters match `pat` under `eq`. `pat` must be
    /// non-empty.
    ///
    /// If so, consume them and return Some(true).
    /// If they do not match, return Some(false).
    /// If not enough characters are available to know, return None.
    pub fn eat<F: Fn(&u8, &u8) -> bool>(&self, pat: &str, eq: F) -> Option<bool> {
        let mut buffers = self.buffers.borrow_mut();
        let mut buffers_exhausted = 0;
        let mut consumed_from_last = 0;

        buffers.front()?;

        for pattern_byte in pat.bytes() {
            if buffers_exhausted >= buffers.len() {
                return None;
            }
            let buf = &buffers[buffers_exhausted];

            if !eq(&buf.as_bytes()[consumed_from_last], &pattern_byte) {
                return Some(false);
            }

            consumed_from_last += 1;
            if consumed_from_last >= buf.len() {
                buffers_exhausted += 1;
                consumed_from_last = 0;
            }
        }

        // We have a match. Commit changes to the BufferQueue.
        for _ in 0..buffers_exhausted {
            buffers.pop_front();
        }

        match buffers.front_mut() {
            None => assert_eq!(consumed_from_last, 0),
            Some(ref mut buf) => buf.pop_front(consumed_from_last as u32),
        }
        self.advance(pat.len());

        Some(true)
    }
}
