// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Incremental tokenizer and tree builder for HVML documents.
//!
//! Input arrives as whole buffers or chunks of bytes, is decoded, tokenized,
//! optionally stringified on worker threads, and finally assembled into a
//! [`dom::Document`] by an insertion-mode tree builder.

#[cfg_attr(test, macro_use)]
extern crate mac;

pub use crate::driver::{parse_document, parse_fragment, Callbacks, ParseOpts, Parser};
pub use crate::error::{Error, Result};
pub use crate::tag::{Namespace, TagId, TagRegistry};
pub use crate::threaded::{ThreadedOpts, ThreadedParser};

#[macro_use]
mod macros;

#[macro_use]
mod util {
    #[macro_use]
    pub mod smallcharset;
    pub mod buffer_queue;
    pub mod str;
}

pub mod dom;
pub mod driver;
pub mod error;
pub mod stringify;
pub mod tag;
pub mod threaded;
pub mod tokenizer;
pub mod tree_builder;

pub use crate::util::buffer_queue::BufferQueue;

/// Re-export the tendril crate.
pub mod tendril {
    pub use ::tendril::*;
}

/// Re-export the encoding crate.
pub use encoding_rs as encoding;
