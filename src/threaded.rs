// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing with the tokenizer and the stringifier off the caller's thread.
//!
//! A stream thread decodes input and runs the tokenizer, numbering every
//! token it emits. A pool of workers stringifies the tokens. The caller's
//! thread puts them back in emission order and runs tree construction, so
//! the tree is only ever touched by the thread that owns the parser.
//!
//! The tokenizer needs the tree builder's answer after start tags that may
//! switch it into a raw-text state, and before a `<![CDATA[` section. For
//! those the stream thread sends a request along with the token and blocks
//! until the caller's thread has built the tree up to that token and replied.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, trace, warn};

use crate::dom::{Document, NodeId};
use crate::driver::{Callbacks, Decoder, ParseOpts, ParserSink};
use crate::error::{Error, Result};
use crate::stringify::stringify;
use crate::tag::{ContentModel, TagRegistry};
use crate::tokenizer::{ParseError, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts};
use crate::util::buffer_queue::BufferQueue;

/// Options for the threaded pipeline.
#[derive(Clone, Debug)]
pub struct ThreadedOpts {
    /// Number of stringifier threads. At least one is started.
    pub workers: usize,
}

impl Default for ThreadedOpts {
    fn default() -> ThreadedOpts {
        ThreadedOpts { workers: 2 }
    }
}

enum Input {
    Encoding(&'static Encoding),
    Chunk(Vec<u8>),
    End,
}

enum Item {
    /// A token, and whether the stream thread waits for the content model
    /// the tree builder picks after it.
    Token(Token, bool),
    /// Whether the adjusted current node is foreign, asked before CDATA.
    Query,
    Error(ParseError),
    Fatal(Error),
    End,
}

struct Work {
    seq: u64,
    item: Item,
}

/// The caller's answer to a request from the stream thread.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Reply {
    Model(TokenSinkResult),
    Foreign(bool),
}

/// Numbers tokens and hands them to the workers.
struct StreamSink {
    work: Sender<Work>,
    replies: Receiver<Reply>,
    seq: Cell<u64>,
    build_tree: bool,
}

impl StreamSink {
    fn send(&self, item: Item) {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        // Fails only once every worker is gone; the caller notices that.
        let _ = self.work.send(Work { seq, item });
    }

    // None once the caller has dropped the parser.
    fn wait(&self) -> Option<Reply> {
        self.replies.recv().ok()
    }

    // Only tags with a raw content model in the registry can move the
    // tokenizer out of the data state.
    fn needs_verdict(&self, token: &Token) -> bool {
        self.build_tree &&
            token.is_start_tag() &&
            token.tag.content_model() != ContentModel::Data
    }
}

impl TokenSink for StreamSink {
    fn process_token(&self, token: Token) -> TokenSinkResult {
        if !self.needs_verdict(&token) {
            self.send(Item::Token(token, false));
            return TokenSinkResult::Continue;
        }

        trace!("waiting for the content model after {:?}", token.tag);
        self.send(Item::Token(token, true));
        match self.wait() {
            Some(Reply::Model(result)) => result,
            _ => TokenSinkResult::Continue,
        }
    }

    fn parse_error(&self, error: ParseError) {
        self.send(Item::Error(error));
    }

    fn end(&self) {
        self.send(Item::End);
    }

    fn adjusted_current_node_present_but_not_in_primary_namespace(&self) -> bool {
        if !self.build_tree {
            return false;
        }
        self.send(Item::Query);
        matches!(self.wait(), Some(Reply::Foreign(true)))
    }
}

fn run_stream(
    inputs: Receiver<Input>,
    sink: StreamSink,
    opts: TokenizerOpts,
    registry: Arc<TagRegistry>,
) {
    let tokenizer = Tokenizer::new(sink, opts, registry);
    let queue = BufferQueue::new();
    let mut decoder = Decoder::new(UTF_8);
    let mut failed = false;

    let mut report = |result: Result<()>, tokenizer: &Tokenizer<StreamSink>| {
        if let Err(e) = result {
            if !failed {
                failed = true;
                tokenizer.sink.send(Item::Fatal(e));
            }
        }
    };

    for input in inputs.iter() {
        match input {
            Input::Encoding(encoding) => decoder = Decoder::new(encoding),
            Input::Chunk(buf) => {
                decoder.decode(&buf, false, &queue);
                report(tokenizer.feed(&queue), &tokenizer);
            },
            Input::End => {
                decoder.decode(&[], true, &queue);
                report(tokenizer.feed(&queue), &tokenizer);
                report(tokenizer.end(), &tokenizer);
                break;
            },
        }
    }
    debug!("stream thread done after {} items", tokenizer.sink.seq.get());
}

fn run_worker(work: Arc<Mutex<Receiver<Work>>>, results: Sender<Work>) {
    loop {
        let next = match work.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok(mut work) = next else {
            return;
        };
        if let Item::Token(ref mut token, _) = work.item {
            stringify(token);
        }
        if results.send(work).is_err() {
            return;
        }
    }
}

/// A parser whose tokenizer and stringifier run on their own threads.
///
/// `chunk` and `end` never block. Whatever tokens are ready when they are
/// called go through tree construction right away; `finish` waits for the
/// rest. The stream thread may sit on a pending request until the next of
/// those calls answers it.
pub struct ThreadedParser {
    input: Option<Sender<Input>>,
    results: Receiver<Work>,
    replies: Sender<Reply>,
    pending: BTreeMap<u64, Item>,
    next_seq: u64,
    sink: ParserSink,
    threads: Vec<JoinHandle<()>>,
    fatal: Option<Error>,
    started: bool,
    ended: bool,
    done: bool,
}

impl ThreadedParser {
    pub fn new(opts: ParseOpts, threaded: ThreadedOpts, callbacks: Callbacks) -> ThreadedParser {
        ThreadedParser::with_registry(TagRegistry::shared(), opts, threaded, callbacks)
    }

    pub fn with_registry(
        registry: Arc<TagRegistry>,
        opts: ParseOpts,
        threaded: ThreadedOpts,
        callbacks: Callbacks,
    ) -> ThreadedParser {
        let (input_tx, input_rx) = mpsc::channel();
        let (work_tx, work_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let work_rx = Arc::new(Mutex::new(work_rx));

        let mut threads = Vec::with_capacity(threaded.workers.max(1) + 1);
        let tok_opts = opts.tokenizer.clone();
        let stream_registry = registry.clone();
        let stream = StreamSink {
            work: work_tx,
            replies: reply_rx,
            seq: Cell::new(0),
            build_tree: opts.build_tree,
        };
        threads.push(thread::spawn(move || {
            run_stream(input_rx, stream, tok_opts, stream_registry)
        }));
        for _ in 0..threaded.workers.max(1) {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            threads.push(thread::spawn(move || run_worker(work_rx, result_tx)));
        }
        debug!("started threaded parser with {} workers", threads.len() - 1);

        ThreadedParser {
            input: Some(input_tx),
            results: result_rx,
            replies: reply_tx,
            pending: BTreeMap::new(),
            next_seq: 0,
            sink: ParserSink::for_document(registry, &opts, callbacks),
            threads,
            fatal: None,
            started: false,
            ended: false,
            done: false,
        }
    }

    fn send(&mut self, input: Input) -> Result<()> {
        match self.input {
            Some(ref tx) => tx.send(input).map_err(|_| Error::WorkerLost),
            None => Err(Error::WorkerLost),
        }
    }

    /// Select the encoding of the input. Only allowed before the first chunk.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) -> Result<()> {
        if self.started {
            return Err(Error::EncodingAfterStart);
        }
        self.send(Input::Encoding(encoding))
    }

    pub fn chunk(&mut self, buf: &[u8]) -> Result<()> {
        if self.ended {
            return Err(Error::ReusedParser);
        }
        self.started = true;
        self.send(Input::Chunk(buf.to_vec()))?;
        self.drain()
    }

    pub fn end(&mut self) -> Result<()> {
        if self.ended {
            return Err(Error::ReusedParser);
        }
        self.started = true;
        self.ended = true;
        self.send(Input::End)?;
        self.input = None;
        self.drain()
    }

    /// Wait for the last token and return the finished document.
    pub fn finish(mut self) -> Result<Document> {
        if !self.ended {
            self.end()?;
        }
        while !self.done {
            match self.results.recv() {
                Ok(work) => self.accept(work),
                Err(_) => break,
            }
        }

        let mut lost = !self.done;
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                lost = true;
            }
        }
        if lost {
            warn!("threaded parser lost a thread before the end of input");
            return Err(Error::WorkerLost);
        }
        match self.fatal.take() {
            Some(e) => Err(e),
            None => Ok(self.sink.into_document()),
        }
    }

    /// The tree built so far.
    pub fn document(&self) -> &Document {
        self.sink.document()
    }

    pub fn open_elements(&self) -> Vec<NodeId> {
        self.sink.builder.open_elements()
    }

    // Handle every result that has already arrived.
    fn drain(&mut self) -> Result<()> {
        loop {
            match self.results.try_recv() {
                Ok(work) => self.accept(work),
                Err(mpsc::TryRecvError::Empty) => {
                    self.sink.publish_held();
                    return Ok(());
                },
                Err(mpsc::TryRecvError::Disconnected) if self.done => return Ok(()),
                Err(mpsc::TryRecvError::Disconnected) => return Err(Error::WorkerLost),
            }
        }
    }

    fn accept(&mut self, work: Work) {
        self.pending.insert(work.seq, work.item);
        while let Some(item) = self.pending.remove(&self.next_seq) {
            self.next_seq += 1;
            self.process(item);
        }
    }

    fn process(&mut self, item: Item) {
        match item {
            Item::Token(token, verdict) => {
                let result = self.sink.process_token(token);
                if verdict {
                    self.reply(Reply::Model(result));
                }
            },
            Item::Query => {
                let foreign = self
                    .sink
                    .adjusted_current_node_present_but_not_in_primary_namespace();
                self.reply(Reply::Foreign(foreign));
            },
            Item::Error(error) => self.sink.parse_error(error),
            Item::Fatal(error) => {
                warn!("tokenizer stopped: {error}");
                self.fatal.get_or_insert(error);
            },
            Item::End => {
                self.sink.end();
                self.done = true;
            },
        }
    }

    fn reply(&self, reply: Reply) {
        // The stream thread is gone only after a panic; `finish` reports it.
        let _ = self.replies.send(reply);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tag::ids;
    use crate::tendril::StrTendril;

    // Tokenize `input` on this thread with `replies` already queued.
    fn tokens_of(input: &str, replies: &[Reply]) -> Vec<Item> {
        let (work_tx, work_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        for reply in replies {
            reply_tx.send(*reply).unwrap();
        }
        drop(reply_tx);
        let sink = StreamSink {
            work: work_tx,
            replies: reply_rx,
            seq: Cell::new(0),
            build_tree: true,
        };
        let tokenizer = Tokenizer::new(sink, TokenizerOpts::default(), TagRegistry::shared());
        let queue = BufferQueue::new();
        queue.push_back(StrTendril::from_slice(input));
        tokenizer.feed(&queue).unwrap();
        tokenizer.end().unwrap();
        drop(tokenizer);
        work_rx.iter().map(|w| w.item).collect()
    }

    fn tags(items: &[Item]) -> Vec<(crate::tag::TagId, bool)> {
        items
            .iter()
            .filter_map(|item| match *item {
                Item::Token(ref t, verdict) if t.is_start_tag() => Some((t.tag, verdict)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sequence_numbers_are_dense() {
        let (tx, rx) = mpsc::channel();
        let sink = StreamSink {
            work: tx,
            replies: mpsc::channel().1,
            seq: Cell::new(0),
            build_tree: true,
        };
        sink.send(Item::End);
        sink.send(Item::End);
        drop(sink);
        let seqs: Vec<u64> = rx.iter().map(|w| w.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn only_raw_content_models_wait() {
        let items = tokens_of(
            "<div><style><b></style>",
            &[Reply::Model(TokenSinkResult::RawData(
                crate::tokenizer::states::RawKind::Rawtext,
            ))],
        );
        assert_eq!(tags(&items), vec![(ids::div, false), (ids::style, true)]);
    }

    #[test]
    fn data_verdict_keeps_tags_inside_style() {
        let items = tokens_of(
            "<style><b></style>",
            &[Reply::Model(TokenSinkResult::Data)],
        );
        assert_eq!(tags(&items), vec![(ids::style, true), (ids::b, false)]);
    }

    #[test]
    fn cdata_follows_the_reply() {
        let items = tokens_of("<![CDATA[x<y]]>", &[Reply::Foreign(true)]);
        assert!(matches!(items[0], Item::Query));
        assert!(items
            .iter()
            .any(|i| matches!(*i, Item::Token(ref t, _) if t.is_text() && t.text == "x<y")));

        let items = tokens_of("<![CDATA[x]]>", &[Reply::Foreign(false)]);
        assert!(items
            .iter()
            .any(|i| matches!(*i, Item::Token(ref t, _) if t.is_comment())));
    }

    #[test]
    fn registry_model_applies_once_the_caller_is_gone() {
        let items = tokens_of("<style><b></style>", &[]);
        assert_eq!(tags(&items), vec![(ids::style, true)]);
    }
}
