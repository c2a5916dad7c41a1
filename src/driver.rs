// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! High-level interface to the parser.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use encoding_rs::{DecoderResult, Encoding, UTF_8};
use log::debug;

use crate::util::buffer_queue::BufferQueue;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::stringify::stringify;
use crate::tag::{Namespace, TagId, TagRegistry};
use crate::tendril::StrTendril;
use crate::tokenizer::{ParseError, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts};
use crate::tree_builder::{ElemName, TreeBuilder, TreeBuilderOpts};

/// All-encompassing options struct for the parser.
#[derive(Clone, Debug)]
pub struct ParseOpts {
    /// Tokenizer options.
    pub tokenizer: TokenizerOpts,

    /// Tree builder options.
    pub tree_builder: TreeBuilderOpts,

    /// Drop text tokens made only of whitespace before tree construction.
    pub skip_whitespace_tokens: bool,

    /// Build a tree at all? Without one, tokens still reach the token
    /// callbacks. Default: true
    pub build_tree: bool,
}

impl Default for ParseOpts {
    fn default() -> ParseOpts {
        ParseOpts {
            tokenizer: TokenizerOpts::default(),
            tree_builder: TreeBuilderOpts::default(),
            skip_whitespace_tokens: false,
            build_tree: true,
        }
    }
}

type TokenHook = Box<dyn FnMut(&Token)>;

/// Caller hooks into a parse.
///
/// The token hooks see every token that reaches tree construction, in
/// order, after it was stringified. The node hooks fire synchronously as
/// the tree is mutated.
#[derive(Default)]
pub struct Callbacks {
    pub before_token: Option<TokenHook>,
    pub after_token: Option<TokenHook>,
    pub on_parse_error: Option<Box<dyn FnMut(&ParseError)>>,
    pub on_node_insert: Option<Box<dyn FnMut(NodeId)>>,
    pub on_node_remove: Option<Box<dyn FnMut(NodeId)>>,
}

/// Incremental decoder from bytes to the tokenizer's input queue.
///
/// Malformed sequences decode to U+FFFD. A sequence split between two
/// chunks is held back until the rest of it arrives.
pub(crate) struct Decoder {
    inner: encoding_rs::Decoder,
}

impl Decoder {
    pub(crate) fn new(encoding: &'static Encoding) -> Decoder {
        Decoder {
            inner: encoding.new_decoder_without_bom_handling(),
        }
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.inner.encoding()
    }

    /// Decode the given chunk. The result is pushed to the end of `output`.
    pub(crate) fn decode(&mut self, chunk: &[u8], last: bool, output: &BufferQueue) {
        let mut remaining = chunk;
        loop {
            let max_len = self
                .inner
                .max_utf8_buffer_length_without_replacement(remaining.len())
                .unwrap_or(8192)
                .clamp(16, 8192);
            let mut out = String::with_capacity(max_len);

            let (result, bytes_read) =
                self.inner
                    .decode_to_string_without_replacement(remaining, &mut out, last);

            if !out.is_empty() {
                output.push_back(StrTendril::from(out));
            }
            remaining = &remaining[bytes_read..];

            match result {
                DecoderResult::InputEmpty => return,
                DecoderResult::OutputFull => (),
                DecoderResult::Malformed(..) => {
                    output.push_back(StrTendril::from_slice("\u{FFFD}"));
                },
            }
        }
    }
}

/// Sits between the tokenizer and the tree builder: stringifies tokens and
/// runs the token callbacks.
pub(crate) struct ParserSink {
    pub(crate) builder: TreeBuilder<NodeId, Document>,
    skip_whitespace_tokens: bool,
    build_tree: bool,
    before_token: RefCell<Option<TokenHook>>,
    after_token: RefCell<Option<TokenHook>>,
    ended: Cell<bool>,
}

impl ParserSink {
    fn new(
        builder: TreeBuilder<NodeId, Document>,
        opts: &ParseOpts,
        before_token: Option<TokenHook>,
        after_token: Option<TokenHook>,
    ) -> ParserSink {
        ParserSink {
            builder,
            skip_whitespace_tokens: opts.skip_whitespace_tokens,
            build_tree: opts.build_tree,
            before_token: RefCell::new(before_token),
            after_token: RefCell::new(after_token),
            ended: Cell::new(false),
        }
    }

    /// A sink building a whole document. Also used on the caller's thread
    /// of the threaded pipeline.
    pub(crate) fn for_document(
        registry: Arc<TagRegistry>,
        opts: &ParseOpts,
        callbacks: Callbacks,
    ) -> ParserSink {
        let Callbacks {
            before_token,
            after_token,
            on_parse_error,
            on_node_insert,
            on_node_remove,
        } = callbacks;

        let mut document = Document::new(registry);
        document.set_hooks_from(on_node_insert, on_node_remove, on_parse_error);
        let builder = TreeBuilder::new(document, opts.tree_builder);
        ParserSink::new(builder, opts, before_token, after_token)
    }

    pub(crate) fn document(&self) -> &Document {
        &self.builder.sink
    }

    pub(crate) fn into_document(self) -> Document {
        self.builder.sink
    }

    /// Tell the document which nodes the tree builder still points at, so
    /// they cannot be removed from under it between chunks.
    pub(crate) fn publish_held(&self) {
        if self.build_tree && !self.ended.get() {
            self.builder.sink.set_held(self.builder.held_nodes());
        }
    }

    fn after(&self, token: &Token) {
        if let Some(hook) = self.after_token.borrow_mut().as_mut() {
            hook(token);
        }
    }
}

impl TokenSink for ParserSink {
    fn process_token(&self, mut token: Token) -> TokenSinkResult {
        stringify(&mut token);
        if self.skip_whitespace_tokens && token.is_text() && token.is_whitespace() {
            return TokenSinkResult::Continue;
        }

        if let Some(hook) = self.before_token.borrow_mut().as_mut() {
            hook(&token);
        }

        if !self.build_tree {
            self.after(&token);
            return TokenSinkResult::Continue;
        }

        let copy = self.after_token.borrow().is_some().then(|| token.clone());
        let result = self.builder.process_token(token);
        if let Some(token) = copy {
            self.after(&token);
        }
        result
    }

    fn parse_error(&self, error: ParseError) {
        self.builder.parse_error(error);
    }

    fn end(&self) {
        self.ended.set(true);
        if self.build_tree {
            self.builder.end();
            self.builder.sink.set_held(vec![]);
        }
    }

    fn adjusted_current_node_present_but_not_in_primary_namespace(&self) -> bool {
        self.build_tree && self.builder.adjusted_current_node_present_but_not_in_primary_namespace()
    }
}

/// An HVML parser, ready to receive input in chunks.
pub struct Parser {
    tokenizer: Tokenizer<ParserSink>,
    input: BufferQueue,
    decoder: Decoder,
    started: bool,
    ended: bool,
}

impl Parser {
    /// A document parser using the process-wide tag registry.
    pub fn new(opts: ParseOpts, callbacks: Callbacks) -> Parser {
        Parser::with_registry(TagRegistry::shared(), opts, callbacks)
    }

    pub fn with_registry(
        registry: Arc<TagRegistry>,
        opts: ParseOpts,
        callbacks: Callbacks,
    ) -> Parser {
        let sink = ParserSink::for_document(registry.clone(), &opts, callbacks);
        Parser::from_sink(sink, opts.tokenizer, registry)
    }

    /// A parser for a fragment of markup, as if it were the content of an
    /// element named `context`.
    pub fn new_fragment(
        registry: Arc<TagRegistry>,
        context: ElemName,
        opts: ParseOpts,
        callbacks: Callbacks,
    ) -> Parser {
        let Callbacks {
            before_token,
            after_token,
            on_parse_error,
            on_node_insert,
            on_node_remove,
        } = callbacks;

        let mut document = Document::new_fragment(registry.clone());
        document.set_hooks_from(on_node_insert, on_node_remove, on_parse_error);
        let builder = TreeBuilder::new_for_fragment(document, context, opts.tree_builder);

        let mut tok_opts = opts.tokenizer.clone();
        tok_opts.initial_state = Some(builder.tokenizer_state_for_context_elem());
        tok_opts.last_start_tag_name = Some(registry.name(context.tag).into_owned());

        let sink = ParserSink::new(builder, &opts, before_token, after_token);
        Parser::from_sink(sink, tok_opts, registry)
    }

    fn from_sink(sink: ParserSink, opts: TokenizerOpts, registry: Arc<TagRegistry>) -> Parser {
        Parser {
            tokenizer: Tokenizer::new(sink, opts, registry),
            input: BufferQueue::new(),
            decoder: Decoder::new(UTF_8),
            started: false,
            ended: false,
        }
    }

    /// Select the encoding of the input. Only allowed before the first chunk.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) -> Result<()> {
        if self.started {
            return Err(Error::EncodingAfterStart);
        }
        debug!("input encoding set to {}", encoding.name());
        self.decoder = Decoder::new(encoding);
        Ok(())
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    /// Feed the next chunk of input. Tokens complete within the input seen
    /// so far are processed before this returns.
    pub fn chunk(&mut self, buf: &[u8]) -> Result<()> {
        if self.ended {
            return Err(Error::ReusedParser);
        }
        self.started = true;
        self.decoder.decode(buf, false, &self.input);
        let fed = self.tokenizer.feed(&self.input);
        self.tokenizer.sink.publish_held();
        fed
    }

    /// Signal the end of the input and finish the tree.
    pub fn end(&mut self) -> Result<()> {
        if self.ended {
            return Err(Error::ReusedParser);
        }
        self.started = true;
        self.ended = true;
        self.decoder.decode(&[], true, &self.input);
        // The tree is finished even when the tokenizer stopped early.
        let fed = self.tokenizer.feed(&self.input);
        let ended = self.tokenizer.end();
        fed.and(ended)
    }

    /// Parse a whole document in one go.
    pub fn begin(&mut self, buf: &[u8]) -> Result<()> {
        self.chunk(buf)?;
        self.end()
    }

    pub fn document(&self) -> &Document {
        self.tokenizer.sink.document()
    }

    pub fn into_document(self) -> Document {
        self.tokenizer.sink.into_document()
    }

    /// The stack of open elements, outermost first.
    pub fn open_elements(&self) -> Vec<NodeId> {
        self.tokenizer.sink.builder.open_elements()
    }

    /// The tree builder, for inspecting its state between chunks.
    pub fn tree_builder(&self) -> &TreeBuilder<NodeId, Document> {
        &self.tokenizer.sink.builder
    }
}

/// Parse an HVML document with the process-wide tag registry.
pub fn parse_document(input: &[u8], opts: ParseOpts) -> Result<Document> {
    let mut parser = Parser::new(opts, Callbacks::default());
    parser.begin(input)?;
    Ok(parser.into_document())
}

/// Parse a fragment of markup as the content of a `context` element.
pub fn parse_fragment(
    input: &[u8],
    context: TagId,
    ns: Namespace,
    opts: ParseOpts,
) -> Result<Document> {
    let mut parser = Parser::new_fragment(
        TagRegistry::shared(),
        ElemName::new(context, ns),
        opts,
        Callbacks::default(),
    );
    parser.begin(input)?;
    Ok(parser.into_document())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tag::ids;
    use std::rc::Rc;

    fn decode_all(encoding: &'static Encoding, chunks: &[&[u8]]) -> String {
        let mut decoder = Decoder::new(encoding);
        let queue = BufferQueue::new();
        for chunk in chunks {
            decoder.decode(chunk, false, &queue);
        }
        decoder.decode(&[], true, &queue);
        let mut out = String::new();
        while let Some(c) = queue.next() {
            out.push(c);
        }
        out
    }

    #[test]
    fn split_sequences_decode() {
        let bytes = "h\u{e9}llo \u{1F600}".as_bytes();
        for i in 0..bytes.len() {
            let (a, b) = bytes.split_at(i);
            assert_eq!(decode_all(UTF_8, &[a, b]), "h\u{e9}llo \u{1F600}");
        }
    }

    #[test]
    fn malformed_input_is_replaced() {
        assert_eq!(decode_all(UTF_8, &[b"a\xffb"]), "a\u{fffd}b");
        assert_eq!(decode_all(UTF_8, &[b"a\xe2\x82"]), "a\u{fffd}");
    }

    #[test]
    fn legacy_encodings() {
        let latin1 = encoding_rs::WINDOWS_1252;
        assert_eq!(decode_all(latin1, &[b"caf\xe9"]), "caf\u{e9}");
    }

    #[test]
    fn reuse_after_end_is_an_error() {
        let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
        parser.begin(b"<hvml></hvml>").unwrap();
        assert_eq!(parser.chunk(b"x"), Err(Error::ReusedParser));
        assert_eq!(parser.end(), Err(Error::ReusedParser));
    }

    #[test]
    fn encoding_is_fixed_after_the_first_chunk() {
        let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
        parser.set_encoding(encoding_rs::WINDOWS_1252).unwrap();
        parser.chunk(b"<hvml>").unwrap();
        assert_eq!(
            parser.set_encoding(UTF_8),
            Err(Error::EncodingAfterStart)
        );
        assert_eq!(parser.encoding(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn token_callbacks_run_in_order() {
        let seen = Rc::new(RefCell::new(vec![]));
        let before = seen.clone();
        let after = seen.clone();
        let callbacks = Callbacks {
            before_token: Some(Box::new(move |t: &Token| before.borrow_mut().push(("before", t.tag)))),
            after_token: Some(Box::new(move |t: &Token| after.borrow_mut().push(("after", t.tag)))),
            ..Callbacks::default()
        };
        let mut parser = Parser::new(ParseOpts::default(), callbacks);
        parser.begin(b"<p>").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0], ("before", ids::p));
        assert_eq!(seen[1], ("after", ids::p));
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], ("after", ids::_end_of_file));
    }

    #[test]
    fn tokenize_only() {
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        let opts = ParseOpts {
            build_tree: false,
            ..ParseOpts::default()
        };
        let callbacks = Callbacks {
            after_token: Some(Box::new(move |_: &Token| *counter.borrow_mut() += 1)),
            ..Callbacks::default()
        };
        let mut parser = Parser::new(opts, callbacks);
        parser.begin(b"<init>x</init>").unwrap();
        assert_eq!(*count.borrow(), 4);
        assert!(parser.document().hvml().is_none());
    }

    #[test]
    fn whitespace_tokens_can_be_skipped() {
        let opts = ParseOpts {
            skip_whitespace_tokens: true,
            ..ParseOpts::default()
        };
        let doc = parse_document(b"<hvml><body><p>a</p>\n  <p>b</p></body></hvml>", opts).unwrap();
        let body = doc.body().unwrap();
        assert!(doc.children(body).all(|id| doc.tag(id) == Some(ids::p)));
    }
}
