// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors that abort an operation.
//!
//! Malformed markup is never one of these: it is recovered from and
//! reported through the parse-error callbacks instead.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The tag registry cannot hand out another dynamic id.
    #[error("out of memory: the tag registry is full ({0} dynamic tags)")]
    OutOfMemory(usize),

    /// `chunk` or `end` called on a parser that already finished.
    #[error("the parser has already reached the end of its input")]
    ReusedParser,

    /// The input encoding can only change before the first chunk.
    #[error("the input encoding must be set before the first chunk")]
    EncodingAfterStart,

    /// The node was destroyed and its slot reused or emptied.
    #[error("node {0:?} no longer exists")]
    StaleNode(NodeId),

    /// The node has no parent to be removed from.
    #[error("node {0:?} is not attached to a parent")]
    NotAttached(NodeId),

    /// The parser still holds the node or one of its descendants as an
    /// open element, a formatting element or an element pointer.
    #[error("node {0:?} is still held by the parser")]
    NodeInUse(NodeId),

    /// The node exists but has the wrong kind for the operation, such as
    /// setting attributes on a text node.
    #[error("node {0:?} has the wrong kind for this operation")]
    WrongNodeKind(NodeId),

    /// The node cannot be linked there: it would become its own ancestor,
    /// or the reference node has no parent.
    #[error("node {0:?} cannot be inserted at that position")]
    BadInsertion(NodeId),

    /// A thread of the threaded pipeline terminated unexpectedly.
    #[error("a parser thread terminated unexpectedly")]
    WorkerLost,
}

pub type Result<T> = std::result::Result<T, Error>;
