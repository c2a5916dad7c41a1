// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HVML tokenizer.
//!
//! Tokens leave the tokenizer raw: character references are not decoded
//! and NUL characters are kept, so that decoding can run elsewhere (see
//! [`crate::stringify`]). Consecutive characters are coalesced into one
//! text token whose span covers exactly the source bytes of the run.
//!
//! Every [`State`](states::State) has one handler. The handlers are grouped
//! by what they scan: text content, script data, tags, comments, doctypes,
//! and the end-of-file handlers that flush whatever is half built.

pub use self::interface::{Attribute, Doctype, ParseError, Span, Token, TokenType};
pub use self::interface::{TokenSink, TokenSinkResult};

use self::states::State;
use self::tag::TagBuilder;

use crate::error::{Error, Result};
use crate::tag::TagRegistry;
use crate::tendril::StrTendril;
use crate::util::smallcharset::SmallCharSet;

use log::{debug, trace, warn};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

pub use crate::util::buffer_queue::{BufferQueue, FromSet, NotFromSet, SetResult};

mod comment;
mod doctype;
mod eof;
mod interface;
mod script;
pub mod states;
mod tag;
mod text;

/// Whether a handler can keep going without more input.
enum Flow {
    Continue,
    Suspend,
}

/// The character under the scanner.
#[derive(Copy, Clone, Debug)]
struct Cursor {
    ch: char,
    begin: u64,
    end: u64,
    /// Line of `ch`, starting at 1.
    line: u64,
}

/// A source offset with its line.
#[derive(Copy, Clone, Debug)]
struct Mark {
    offset: u64,
    line: u64,
}

/// Characters waiting to become one text token.
struct TextRun {
    buf: String,
    kind: TokenType,
    /// The end of the previous token.
    from: Mark,
}

#[derive(Default)]
struct Profile {
    states: BTreeMap<State, u64>,
    in_sink: u64,
}

/// Tokenizer options, with an impl for `Default`.
#[derive(Clone, Debug)]
pub struct TokenizerOpts {
    /// Describe every parse error, and report bad characters.
    /// Default: false
    pub exact_errors: bool,

    /// Drop a `U+FEFF BYTE ORDER MARK` at the start of the stream.
    /// Default: true
    pub discard_bom: bool,

    /// Time each state and print the totals from `end()`.
    /// Default: false
    pub profile: bool,

    /// Initial state override. Fragment parsing derives it from the
    /// context element.
    pub initial_state: Option<State>,

    /// Start tag whose end tag closes the initial raw text state.
    pub last_start_tag_name: Option<String>,
}

impl Default for TokenizerOpts {
    fn default() -> TokenizerOpts {
        TokenizerOpts {
            exact_errors: false,
            discard_bom: true,
            profile: false,
            initial_state: None,
            last_start_tag_name: None,
        }
    }
}

/// The HVML tokenizer.
pub struct Tokenizer<Sink> {
    opts: TokenizerOpts,

    /// Receives every token and parse error.
    pub sink: Sink,

    /// Resolves tag names to ids.
    registry: Arc<TagRegistry>,

    state: Cell<State>,

    /// No input will follow what is queued.
    at_eof: Cell<bool>,

    cursor: Cell<Cursor>,

    /// Hand the current character to the next handler again.
    reconsume: Cell<bool>,

    /// The last character was `\r`, so a following `\n` is dropped.
    ignore_lf: Cell<bool>,

    /// Still at the start of the stream, where a BOM may be dropped.
    discard_bom: Cell<bool>,

    tag: RefCell<TagBuilder>,
    comment: RefCell<String>,
    doctype: RefCell<Doctype>,

    /// Name of the last start tag. Only its end tag leaves a raw text state.
    last_start_tag: RefCell<Option<String>>,

    /// Characters a handler needs to look back at: candidate end tag
    /// names, `script` in escaped script data, and lookahead that ran out
    /// of input.
    temp_buf: RefCell<StrTendril>,

    text: RefCell<TextRun>,

    /// Where the markup being scanned starts, at its `<`.
    markup: Cell<Mark>,

    /// Stream offset reached by the last `feed`.
    position: Cell<u64>,

    /// The fatal error that stopped tokenization, if any.
    error: RefCell<Option<Error>>,

    profile: RefCell<Profile>,
}

impl<Sink: TokenSink> Tokenizer<Sink> {
    /// Create a new tokenizer which feeds tokens to a particular `TokenSink`.
    pub fn new(sink: Sink, mut opts: TokenizerOpts, registry: Arc<TagRegistry>) -> Tokenizer<Sink> {
        let last_start_tag = opts
            .last_start_tag_name
            .take()
            .map(|name| name.to_ascii_lowercase());
        let start = Mark { offset: 0, line: 1 };
        Tokenizer {
            state: Cell::new(opts.initial_state.unwrap_or(State::Data)),
            discard_bom: Cell::new(opts.discard_bom),
            opts,
            sink,
            registry,
            at_eof: Cell::new(false),
            cursor: Cell::new(Cursor {
                ch: '\0',
                begin: 0,
                end: 0,
                line: 1,
            }),
            reconsume: Cell::new(false),
            ignore_lf: Cell::new(false),
            tag: RefCell::new(TagBuilder::default()),
            comment: RefCell::new(String::new()),
            doctype: RefCell::new(Doctype::default()),
            last_start_tag: RefCell::new(last_start_tag),
            temp_buf: RefCell::new(StrTendril::new()),
            text: RefCell::new(TextRun {
                buf: String::new(),
                kind: TokenType::DATA,
                from: start,
            }),
            markup: Cell::new(start),
            position: Cell::new(0),
            error: RefCell::new(None),
            profile: RefCell::new(Profile::default()),
        }
    }

    /// Feed an input string into the tokenizer.
    ///
    /// Input that ends in the middle of a token is kept, and scanning
    /// resumes with the next call.
    pub fn feed(&self, input: &BufferQueue) -> Result<()> {
        if input.is_empty() {
            return self.status();
        }

        if self.discard_bom.replace(false) && input.peek() == Some('\u{feff}') {
            input.next();
            self.text.borrow_mut().from.offset = input.position();
        }

        self.run(input);
        self.position.set(input.position());
        self.status()
    }

    /// Indicate that we have reached the end of the input.
    ///
    /// Partial tokens are flushed as best-effort tokens, followed by the
    /// end-of-file token.
    pub fn end(&self) -> Result<()> {
        // Lookahead still waiting in the temporary buffer is settled here.
        let input = BufferQueue::with_position(self.position.get());
        self.at_eof.set(true);
        self.run(&input);

        let end = input.position();
        self.position.set(end);
        let mut cursor = self.cursor.get();
        cursor.begin = end;
        cursor.end = end;
        self.cursor.set(cursor);

        while let Flow::Continue = self.eof_step() {}

        self.sink.end();
        if self.opts.profile {
            self.dump_profile();
        }
        self.status()
    }

    /// Offset of the input consumed so far.
    pub fn position(&self) -> u64 {
        self.position.get()
    }

    pub fn current_line(&self) -> u64 {
        self.cursor.get().line
    }

    fn status(&self) -> Result<()> {
        match *self.error.borrow() {
            Some(ref e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn run(&self, input: &BufferQueue) {
        if !self.opts.profile {
            while let Flow::Continue = self.step(input) {}
            return;
        }

        loop {
            let state = self.state.get();
            let in_sink = self.profile.borrow().in_sink;
            let (flow, dt) = time!(self.step(input));
            let mut profile = self.profile.borrow_mut();
            let spent = dt.saturating_sub(profile.in_sink - in_sink);
            *profile.states.entry(state).or_insert(0) += spent;
            drop(profile);
            if let Flow::Suspend = flow {
                break;
            }
        }
    }

    fn step(&self, input: &BufferQueue) -> Flow {
        trace!("processing in state {:?}", self.state.get());
        match self.state.get() {
            State::Data => self.data(input),
            State::Rcdata => self.raw_text(input, Some(State::RcdataLessThanSign)),
            State::Rawtext => self.raw_text(input, Some(State::RawtextLessThanSign)),
            State::ScriptData => self.raw_text(input, Some(State::ScriptDataLessThanSign)),
            State::Plaintext => self.raw_text(input, None),
            State::TagOpen => self.tag_open(input),
            State::EndTagOpen => self.end_tag_open(input),
            State::TagName => self.tag_name(input),
            State::RcdataLessThanSign => self.raw_less_than_sign(input, &text::RCDATA),
            State::RcdataEndTagOpen => self.raw_end_tag_open(input, &text::RCDATA),
            State::RcdataEndTagName => self.raw_end_tag_name(input, &text::RCDATA),
            State::RawtextLessThanSign => self.raw_less_than_sign(input, &text::RAWTEXT),
            State::RawtextEndTagOpen => self.raw_end_tag_open(input, &text::RAWTEXT),
            State::RawtextEndTagName => self.raw_end_tag_name(input, &text::RAWTEXT),
            State::ScriptDataLessThanSign => self.script_data_less_than_sign(input),
            State::ScriptDataEndTagOpen => self.raw_end_tag_open(input, &text::SCRIPT_DATA),
            State::ScriptDataEndTagName => self.raw_end_tag_name(input, &text::SCRIPT_DATA),
            State::ScriptDataEscapeStart => self.script_data_escape_start(input),
            State::ScriptDataEscapeStartDash => self.script_data_escape_start_dash(input),
            State::ScriptDataEscaped => self.script_escaped(input, &script::ESCAPED),
            State::ScriptDataEscapedDash => self.script_escaped_dash(input, &script::ESCAPED),
            State::ScriptDataEscapedDashDash => {
                self.script_escaped_dash_dash(input, &script::ESCAPED)
            },
            State::ScriptDataEscapedLessThanSign => self.script_escaped_less_than_sign(input),
            State::ScriptDataEscapedEndTagOpen => {
                self.raw_end_tag_open(input, &text::SCRIPT_DATA_ESCAPED)
            },
            State::ScriptDataEscapedEndTagName => {
                self.raw_end_tag_name(input, &text::SCRIPT_DATA_ESCAPED)
            },
            State::ScriptDataDoubleEscapeStart => self.script_double_escape_boundary(
                input,
                State::ScriptDataDoubleEscaped,
                State::ScriptDataEscaped,
            ),
            State::ScriptDataDoubleEscaped => self.script_escaped(input, &script::DOUBLE_ESCAPED),
            State::ScriptDataDoubleEscapedDash => {
                self.script_escaped_dash(input, &script::DOUBLE_ESCAPED)
            },
            State::ScriptDataDoubleEscapedDashDash => {
                self.script_escaped_dash_dash(input, &script::DOUBLE_ESCAPED)
            },
            State::ScriptDataDoubleEscapedLessThanSign => {
                self.script_double_escaped_less_than_sign(input)
            },
            State::ScriptDataDoubleEscapeEnd => self.script_double_escape_boundary(
                input,
                State::ScriptDataEscaped,
                State::ScriptDataDoubleEscaped,
            ),
            State::BeforeAttributeName => self.before_attribute_name(input),
            State::AttributeName => self.attribute_name(input),
            State::AfterAttributeName => self.after_attribute_name(input),
            State::BeforeAttributeValue => self.before_attribute_value(input),
            State::AttributeValueDoubleQuoted => self.attribute_value_quoted(input, '"'),
            State::AttributeValueSingleQuoted => self.attribute_value_quoted(input, '\''),
            State::AttributeValueUnquoted => self.attribute_value_unquoted(input),
            State::AfterAttributeValueQuoted => self.after_attribute_value_quoted(input),
            State::SelfClosingStartTag => self.self_closing_start_tag(input),
            State::BogusComment => self.bogus_comment(input),
            State::MarkupDeclarationOpen => self.markup_declaration_open(input),
            State::CommentStart => self.comment_start(input),
            State::CommentStartDash => self.comment_start_dash(input),
            State::Comment => self.comment(input),
            State::CommentEndDash => self.comment_end_dash(input),
            State::CommentEnd => self.comment_end(input),
            State::CommentEndBang => self.comment_end_bang(input),
            State::Doctype => self.doctype(input),
            State::BeforeDoctypeName => self.before_doctype_name(input),
            State::DoctypeName => self.doctype_name(input),
            State::AfterDoctypeName => self.after_doctype_name(input),
            State::AfterDoctypePublicKeyword => {
                self.after_doctype_keyword(input, doctype::Id::Public)
            },
            State::BeforeDoctypePublicIdentifier => {
                self.before_doctype_identifier(input, doctype::Id::Public)
            },
            State::DoctypePublicIdentifierDoubleQuoted => {
                self.doctype_identifier(input, doctype::Id::Public, '"')
            },
            State::DoctypePublicIdentifierSingleQuoted => {
                self.doctype_identifier(input, doctype::Id::Public, '\'')
            },
            State::AfterDoctypePublicIdentifier => self.after_doctype_public_identifier(input),
            State::BetweenDoctypePublicAndSystemIdentifiers => {
                self.between_doctype_identifiers(input)
            },
            State::AfterDoctypeSystemKeyword => {
                self.after_doctype_keyword(input, doctype::Id::System)
            },
            State::BeforeDoctypeSystemIdentifier => {
                self.before_doctype_identifier(input, doctype::Id::System)
            },
            State::DoctypeSystemIdentifierDoubleQuoted => {
                self.doctype_identifier(input, doctype::Id::System, '"')
            },
            State::DoctypeSystemIdentifierSingleQuoted => {
                self.doctype_identifier(input, doctype::Id::System, '\'')
            },
            State::AfterDoctypeSystemIdentifier => self.after_doctype_system_identifier(input),
            State::BogusDoctype => self.bogus_doctype(input),
            State::CdataSection => self.cdata_section(input),
            State::CdataSectionBracket => self.cdata_section_bracket(input),
            State::CdataSectionEnd => self.cdata_section_end(input),
            State::ParseErrorStop => {
                input.clear();
                Flow::Suspend
            },
        }
    }

    fn switch_to(&self, state: State) -> Flow {
        self.state.set(state);
        Flow::Continue
    }

    fn reconsume_in(&self, state: State) -> Flow {
        self.reconsume.set(true);
        self.switch_to(state)
    }

    /// The next character, with `\r` and `\r\n` read as `\n`.
    fn next_char(&self, input: &BufferQueue) -> Option<char> {
        if self.reconsume.replace(false) {
            return Some(self.cursor.get().ch);
        }
        let c = input.next()?;
        self.accept(c, input)
    }

    /// Make `c`, just taken from `input`, the current character.
    fn accept(&self, mut c: char, input: &BufferQueue) -> Option<char> {
        if self.ignore_lf.replace(false) && c == '\n' {
            c = input.next()?;
        }

        let mut cursor = self.cursor.get();
        cursor.end = input.position();
        cursor.begin = cursor.end - c.len_utf8() as u64;
        if c == '\r' {
            self.ignore_lf.set(true);
            c = '\n';
        }
        if c == '\n' {
            cursor.line += 1;
        }
        cursor.ch = c;
        self.cursor.set(cursor);

        if self.opts.exact_errors && is_bad_char(c) {
            self.error(Cow::Owned(format!("Bad character {c}")));
        }
        trace!("got character {c}");
        Some(c)
    }

    /// Either one character of `stops` or a run of characters outside it.
    ///
    /// The slow path hands out single characters that may be outside
    /// `stops`, so callers treat an unexpected `FromSet` like a run.
    fn next_run(&self, input: &BufferQueue, stops: SmallCharSet) -> Option<SetResult> {
        if self.opts.exact_errors || self.reconsume.get() || self.ignore_lf.get() {
            return self.next_char(input).map(FromSet);
        }

        match input.pop_except_from(stops)? {
            FromSet(c) => self.accept(c, input).map(FromSet),
            // A run never contains a newline, so the cursor can stay.
            run => Some(run),
        }
    }

    /// Consume `pat` if the input starts with it. `None` means the input
    /// ran out first; what was seen waits in the temporary buffer.
    fn lookahead(&self, input: &BufferQueue, pat: &str, fold_case: bool) -> Option<bool> {
        if self.ignore_lf.replace(false) && self.peek_char(input) == Some('\n') {
            self.skip_char(input);
        }

        input.push_front(mem::take(&mut *self.temp_buf.borrow_mut()));
        let eq: fn(&u8, &u8) -> bool = if fold_case {
            u8::eq_ignore_ascii_case
        } else {
            u8::eq
        };
        match input.eat(pat, eq) {
            None if self.at_eof.get() => Some(false),
            None => {
                let mut buf = self.temp_buf.borrow_mut();
                while let Some(c) = input.next() {
                    buf.push_char(c);
                }
                None
            },
            seen => seen,
        }
    }

    fn peek_char(&self, input: &BufferQueue) -> Option<char> {
        if self.reconsume.get() {
            Some(self.cursor.get().ch)
        } else {
            input.peek()
        }
    }

    /// Drop the character `peek_char` returned. Newlines are not folded
    /// here, since the peeked character was raw.
    fn skip_char(&self, input: &BufferQueue) {
        if self.reconsume.replace(false) {
            return;
        }
        if let Some(c) = input.next() {
            let mut cursor = self.cursor.get();
            cursor.end = input.position();
            cursor.begin = cursor.end - c.len_utf8() as u64;
            cursor.ch = c;
            self.cursor.set(cursor);
        }
    }

    fn error(&self, message: Cow<'static, str>) {
        let cursor = self.cursor.get();
        self.sink.parse_error(ParseError {
            message,
            line: cursor.line,
            offset: cursor.begin,
        });
    }

    fn char_error(&self) {
        #[cfg(feature = "trace_tokenizer")]
        trace!("  error");

        let msg = format_if!(
            self.opts.exact_errors,
            "Bad character",
            "Saw {} in state {:?}",
            self.cursor.get().ch,
            self.state.get()
        );
        self.error(msg);
    }

    fn eof_error(&self) {
        #[cfg(feature = "trace_tokenizer")]
        trace!("  error_eof");

        let msg = format_if!(
            self.opts.exact_errors,
            "Unexpected EOF",
            "Saw EOF in state {:?}",
            self.state.get()
        );
        self.error(msg);
    }

    fn send(&self, token: Token) -> TokenSinkResult {
        if !self.opts.profile {
            return self.sink.process_token(token);
        }
        let (result, dt) = time!(self.sink.process_token(token));
        self.profile.borrow_mut().in_sink += dt;
        result
    }

    /// Send a token whose content model choice does not matter.
    fn emit(&self, token: Token) {
        let _ = self.send(token);
    }

    /// Append to the pending text run, splitting it where the text kind
    /// changes.
    fn emit_str(&self, s: &str) {
        let kind = self.state.get().text_kind();
        let split = {
            let run = self.text.borrow();
            run.kind != kind && !run.buf.is_empty()
        };
        if split {
            let cursor = self.cursor.get();
            self.flush_text(Mark {
                offset: cursor.begin,
                line: cursor.line,
            });
        }
        let mut run = self.text.borrow_mut();
        run.kind = kind;
        run.buf.push_str(s);
    }

    fn emit_char(&self, c: char) {
        #[cfg(feature = "trace_tokenizer")]
        trace!("  emit");

        self.emit_str(c.encode_utf8(&mut [0; 4]));
    }

    /// Emit the pending text as a token ending at `to`, where the next
    /// run starts.
    fn flush_text(&self, to: Mark) {
        let token = {
            let mut run = self.text.borrow_mut();
            let from = mem::replace(&mut run.from, to);
            if run.buf.is_empty() {
                None
            } else {
                let span = Span::new(from.offset, to.offset);
                Some(Token::text(run.kind, mem::take(&mut run.buf), span, from.line))
            }
        };
        if let Some(token) = token {
            self.emit(token);
        }
    }

    /// A NUL in the data state is a token of its own.
    fn emit_null(&self) {
        let cursor = self.cursor.get();
        self.flush_text(Mark {
            offset: cursor.begin,
            line: cursor.line,
        });
        let span = Span::new(cursor.begin, cursor.end);
        self.emit(Token::text(TokenType::NULL, "\0".to_owned(), span, cursor.line));
        self.text.borrow_mut().from.offset = cursor.end;
    }

    /// Remember the current `<` as the start of markup.
    fn mark_markup(&self) {
        let cursor = self.cursor.get();
        self.markup.set(Mark {
            offset: cursor.begin,
            line: cursor.line,
        });
    }

    /// Close the text run before the current markup and claim the markup's
    /// bytes, through the current character.
    fn claim_markup(&self) -> (Span, u64) {
        let mark = self.markup.get();
        self.flush_text(mark);
        let cursor = self.cursor.get();
        self.text.borrow_mut().from = Mark {
            offset: cursor.end,
            line: cursor.line,
        };
        (Span::new(mark.offset, cursor.end), mark.line)
    }

    fn emit_eof(&self) -> Flow {
        let cursor = self.cursor.get();
        self.flush_text(Mark {
            offset: cursor.end,
            line: cursor.line,
        });
        self.emit(Token::eof(cursor.end, cursor.line));
        Flow::Suspend
    }

    /// Enter the terminal state after a fatal error.
    fn stop(&self, error: Error) {
        warn!("tokenizer stopped: {error}");
        *self.tag.borrow_mut() = TagBuilder::default();
        self.text.borrow_mut().buf.clear();
        *self.error.borrow_mut() = Some(error);
        self.state.set(State::ParseErrorStop);
    }

    fn dump_profile(&self) {
        let profile = self.profile.borrow();
        let mut states: Vec<(State, u64)> = profile.states.iter().map(|(s, t)| (*s, *t)).collect();
        states.sort_by(|a, b| b.1.cmp(&a.1));
        let total: u64 = states.iter().map(|&(_, t)| t).sum();

        println!("\nTokenizer profile, in nanoseconds");
        println!("\n{:12}         total in token sink", profile.in_sink);
        println!("\n{total:12}         total in tokenizer");
        for (state, t) in states {
            let pct = 100.0 * (t as f64) / (total.max(1) as f64);
            println!("{t:12}  {pct:4.1}%  {state:?}");
        }
        debug!("profiled {total} ns in the tokenizer");
    }
}

/// Controls and noncharacters, reported under `exact_errors`.
fn is_bad_char(c: char) -> bool {
    match c as u32 {
        0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F..=0x9F | 0xFDD0..=0xFDEF => true,
        n => (n & 0xFFFE) == 0xFFFE,
    }
}

#[cfg(test)]
mod test {
    use crate::tendril::StrTendril;

    use super::states::State;
    use super::{BufferQueue, ParseError};
    use super::{Span, Token, TokenSink, TokenSinkResult, TokenType, Tokenizer, TokenizerOpts};

    use crate::error::Error;
    use crate::tag::{ids, TagRegistry};
    use std::cell::{Cell, RefCell};
    use std::sync::Arc;

    // Records every token and error.
    struct Recorder {
        tokens: RefCell<Vec<Token>>,
        errors: RefCell<Vec<ParseError>>,
        foreign: Cell<bool>,
    }

    impl Recorder {
        fn new() -> Recorder {
            Recorder {
                tokens: RefCell::new(vec![]),
                errors: RefCell::new(vec![]),
                foreign: Cell::new(false),
            }
        }
    }

    impl TokenSink for Recorder {
        fn process_token(&self, token: Token) -> TokenSinkResult {
            self.tokens.borrow_mut().push(token);
            TokenSinkResult::Continue
        }

        fn parse_error(&self, error: ParseError) {
            self.errors.borrow_mut().push(error);
        }

        fn adjusted_current_node_present_but_not_in_primary_namespace(&self) -> bool {
            self.foreign.get()
        }
    }

    fn tokenizer(sink: Recorder) -> Tokenizer<Recorder> {
        Tokenizer::new(sink, TokenizerOpts::default(), Arc::new(TagRegistry::new()))
    }

    fn run(tok: &Tokenizer<Recorder>, input: Vec<&str>) -> Vec<Token> {
        let buffer = BufferQueue::default();
        for chunk in input.into_iter() {
            buffer.push_back(StrTendril::from(chunk));
            tok.feed(&buffer).unwrap();
        }
        tok.end().unwrap();
        tok.sink.tokens.take()
    }

    // Take in chunks, process them, and return the tokens
    fn tokenize(input: Vec<&str>) -> Vec<Token> {
        run(&tokenizer(Recorder::new()), input)
    }

    fn names_and_lines(tokens: &[Token]) -> Vec<(u32, TokenType, u64)> {
        tokens
            .iter()
            .filter(|t| !t.is_text() && !t.is_eof())
            .map(|t| (t.tag.as_u32(), t.kind, t.line))
            .collect()
    }

    fn texts(tokens: &[Token]) -> Vec<(&str, TokenType)> {
        tokens
            .iter()
            .filter(|t| t.is_text())
            .map(|t| (&*t.text, t.kind))
            .collect()
    }

    #[test]
    fn check_lines() {
        let results = tokenize(vec!["<a>\n", "<b>\n", "</b>\n", "</a>\n"]);
        let expected = vec![
            (ids::a.as_u32(), TokenType::OPEN, 1),
            (ids::b.as_u32(), TokenType::OPEN, 2),
            (ids::b.as_u32(), TokenType::CLOSE, 3),
            (ids::a.as_u32(), TokenType::CLOSE, 4),
        ];
        assert_eq!(names_and_lines(&results), expected);
    }

    #[test]
    fn check_lines_with_new_line() {
        let results = tokenize(vec!["<a>\r\n", "<b>\r\n", "</b>\r\n", "</a>\r\n"]);
        let expected = vec![
            (ids::a.as_u32(), TokenType::OPEN, 1),
            (ids::b.as_u32(), TokenType::OPEN, 2),
            (ids::b.as_u32(), TokenType::CLOSE, 3),
            (ids::a.as_u32(), TokenType::CLOSE, 4),
        ];
        assert_eq!(names_and_lines(&results), expected);
    }

    #[test]
    fn text_runs_are_coalesced_across_chunks() {
        let results = tokenize(vec!["ab", "c\r", "\nd<p>"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "abc\nd");
        assert_eq!(results[0].kind, TokenType::DATA);
        assert_eq!(results[0].span, Span::new(0, 6));
        assert_eq!(results[1].tag, ids::p);
        assert_eq!(results[1].span, Span::new(6, 9));
        assert!(results[2].is_eof());
        assert_eq!(results[2].span, Span::new(9, 9));
    }

    #[test]
    fn spans_cover_the_source() {
        let input = "x<div id=\"a\">é</div><!--c-->";
        let results = tokenize(vec![input]);
        let slices: Vec<&str> = results
            .iter()
            .map(|t| &input[t.span.begin as usize..t.span.end as usize])
            .collect();
        assert_eq!(
            slices,
            vec!["x", "<div id=\"a\">", "é", "</div>", "<!--c-->", ""]
        );

        let attr = &results[1].attrs[0];
        assert_eq!(&*attr.name, "id");
        assert_eq!(attr.name_span, Span::new(6, 8));
        assert_eq!(attr.value_span, Some(Span::new(10, 11)));
        assert_eq!(results[4].text, "c");
    }

    #[test]
    fn attributes_keep_raw_text() {
        let results = tokenize(vec!["<p Title='a&amp;b' x>"]);
        let attrs = &results[0].attrs;
        assert_eq!(&*attrs[0].name, "Title");
        assert_eq!(attrs[0].value, "a&amp;b");
        assert_eq!(&*attrs[1].name, "x");
        assert_eq!(attrs[1].value_span, None);
    }

    #[test]
    fn unquoted_and_empty_values_have_spans() {
        let input = "<p a=b c= >";
        let results = tokenize(vec![input]);
        let attrs = &results[0].attrs;
        assert_eq!(attrs[0].value, "b");
        assert_eq!(attrs[0].value_span, Some(Span::new(5, 6)));
        assert_eq!(attrs[1].value, "");
        let span = attrs[1].value_span.unwrap();
        assert!(span.is_empty());
    }

    #[test]
    fn duplicate_attributes_ignore_case() {
        let tok = tokenizer(Recorder::new());
        let results = run(&tok, vec!["<p a=1 A=2>"]);
        assert_eq!(results[0].attrs.len(), 1);
        assert_eq!(results[0].attrs[0].value, "1");
        assert_eq!(tok.sink.errors.borrow().len(), 1);
    }

    #[test]
    fn unterminated_start_tag_is_emitted() {
        let tok = tokenizer(Recorder::new());
        let results = run(&tok, vec!["<di"]);
        assert_eq!(results.len(), 2);
        assert_eq!(tok.registry.name(results[0].tag), "di");
        assert!(results[0].is_start_tag());
        assert_eq!(results[0].span, Span::new(0, 3));
        assert!(results[1].is_eof());
    }

    #[test]
    fn unterminated_end_tag_is_emitted() {
        let results = tokenize(vec!["x</b"]);
        assert_eq!(results[1].tag, ids::b);
        assert!(results[1].is_end_tag());
    }

    #[test]
    fn unterminated_attribute_value_is_kept() {
        let results = tokenize(vec!["<p title=\"ab"]);
        assert!(results[0].is_start_tag());
        assert_eq!(results[0].attrs[0].value, "ab");
        assert_eq!(results[0].attrs[0].value_span, Some(Span::new(10, 12)));
    }

    #[test]
    fn tag_split_across_chunks() {
        let results = tokenize(vec!["<d", "iv>x</div>"]);
        assert_eq!(results[0].tag, ids::div);
        assert_eq!(results[0].span, Span::new(0, 5));
        assert_eq!(results[1].text, "x");
        assert_eq!(results[2].tag, ids::div);
        assert!(results[2].is_end_tag());
    }

    #[test]
    fn tag_names_are_case_folded() {
        let results = tokenize(vec!["<DIV></Div>"]);
        assert_eq!(results[0].tag, ids::div);
        assert_eq!(results[1].tag, ids::div);
    }

    #[test]
    fn self_closing_flag_is_kept() {
        let results = tokenize(vec!["<br/><p / >"]);
        assert!(results[0].is_self_closing());
        assert!(!results[1].is_self_closing());
    }

    #[test]
    fn bad_tag_open_is_text() {
        let results = tokenize(vec!["a < b</>c"]);
        assert_eq!(texts(&results), vec![("a < b", TokenType::DATA), ("c", TokenType::DATA)]);
        assert_eq!(results[1].span, Span::new(8, 9));
    }

    #[test]
    fn raw_text_ends_at_recorded_start_tag() {
        let results = tokenize(vec!["<style>a</b>c</style>"]);
        assert_eq!(results[1].text, "a</b>c");
        assert_eq!(results[1].kind, TokenType::RAWTEXT);
        assert_eq!(results[2].tag, ids::style);
        assert!(results[2].is_end_tag());
    }

    #[test]
    fn raw_end_tag_split_across_chunks() {
        let results = tokenize(vec!["<textarea>x</text", "area>y"]);
        assert_eq!(texts(&results), vec![("x", TokenType::RCDATA), ("y", TokenType::DATA)]);
        assert_eq!(results[2].tag, ids::textarea);
        assert_eq!(results[2].span, Span::new(11, 22));
    }

    #[test]
    fn initial_raw_state_uses_given_start_tag() {
        let opts = TokenizerOpts {
            initial_state: Some(State::Rcdata),
            last_start_tag_name: Some("TEXTAREA".to_owned()),
            ..Default::default()
        };
        let tok = Tokenizer::new(Recorder::new(), opts, Arc::new(TagRegistry::new()));
        let results = run(&tok, vec!["<b>&amp;</textarea>"]);
        assert_eq!(results[0].text, "<b>&amp;");
        assert_eq!(results[0].kind, TokenType::RCDATA);
        assert_eq!(results[1].tag, ids::textarea);
    }

    #[test]
    fn escaped_script_keeps_inner_markup() {
        let results = tokenize(vec!["<script><!--<script></script>--></script>"]);
        assert_eq!(
            texts(&results),
            vec![("<!--<script></script>-->", TokenType::SCRIPT)]
        );
        assert_eq!(results[2].tag, ids::script);
        assert!(results[2].is_end_tag());
    }

    #[test]
    fn escaped_script_ends_at_its_end_tag() {
        let results = tokenize(vec!["<script><!--a</script>b"]);
        assert_eq!(
            texts(&results),
            vec![("<!--a", TokenType::SCRIPT), ("b", TokenType::DATA)]
        );
    }

    #[test]
    fn unterminated_escaped_script_reports_eof() {
        let tok = tokenizer(Recorder::new());
        let results = run(&tok, vec!["<script><!--x"]);
        assert_eq!(texts(&results), vec![("<!--x", TokenType::SCRIPT)]);
        assert_eq!(tok.sink.errors.borrow().len(), 1);
    }

    #[test]
    fn nul_in_data_is_its_own_token() {
        let results = tokenize(vec!["a\0b"]);
        let kinds: Vec<TokenType> = results.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenType::DATA, TokenType::NULL, TokenType::DATA, TokenType::DONE]
        );
        assert_eq!(results[1].span, Span::new(1, 2));
        assert_eq!(results[2].span, Span::new(2, 3));
    }

    #[test]
    fn comments_keep_inner_dashes() {
        let results = tokenize(vec!["<!--a-b--c--!><!---><!--<!---->"]);
        assert_eq!(results[0].text, "a-b--c");
        assert!(results[1].is_comment());
        assert_eq!(results[1].text, "");
        assert_eq!(results[2].text, "<!--");
    }

    #[test]
    fn bogus_comments() {
        let results = tokenize(vec!["<?xml x?></ y>"]);
        assert_eq!(results[0].text, "?xml x?");
        assert_eq!(results[1].text, " y");
        assert_eq!(results[1].span, Span::new(9, 14));
    }

    #[test]
    fn cdata_only_in_foreign_content() {
        let results = tokenize(vec!["<![CDATA[x]]>"]);
        assert!(results[0].is_comment());

        let sink = Recorder::new();
        sink.foreign.set(true);
        let results = run(&tokenizer(sink), vec!["a<![CDATA[x<", "y]]>"]);
        assert_eq!(results[0].text, "a");
        assert_eq!(results[1].text, "x<y");
        assert_eq!(results[1].kind, TokenType::CDATA);
        assert_eq!(results[1].span, Span::new(1, 16));
    }

    #[test]
    fn cdata_keeps_lone_brackets() {
        let sink = Recorder::new();
        sink.foreign.set(true);
        let results = run(&tokenizer(sink), vec!["<![CDATA[a]b]]]>"]);
        assert_eq!(results[0].text, "a]b]");
        assert_eq!(results[0].kind, TokenType::CDATA);
    }

    #[test]
    fn bom_is_discarded() {
        let results = tokenize(vec!["\u{feff}hi"]);
        assert_eq!(results[0].text, "hi");
        assert_eq!(results[0].span, Span::new(3, 5));
    }

    #[test]
    fn doctype_is_recorded() {
        let results = tokenize(vec!["<!DOCTYPE hvml SYSTEM \"v: MATH\">"]);
        let doctype = results[0].doctype.as_ref().unwrap();
        assert_eq!(doctype.name.as_deref(), Some("hvml"));
        assert_eq!(doctype.system_id.as_deref(), Some("v: MATH"));
        assert_eq!(doctype.public_id, None);
        assert!(!doctype.force_quirks);
    }

    #[test]
    fn doctype_keyword_split_across_chunks() {
        let results = tokenize(vec!["<!DOCTYPE hvml PUB", "LIC 'p' \"s\">"]);
        let doctype = results[0].doctype.as_ref().unwrap();
        assert_eq!(doctype.public_id.as_deref(), Some("p"));
        assert_eq!(doctype.system_id.as_deref(), Some("s"));
    }

    #[test]
    fn broken_doctypes_force_quirks() {
        for input in ["<!DOCTYPE>", "<!DOCTYPE hvml bogus>", "<!DOCTYPE hvml PUBLIC>"] {
            let results = tokenize(vec![input]);
            let doctype = results[0].doctype.as_ref().unwrap();
            assert!(doctype.force_quirks, "{input}");
        }

        let results = tokenize(vec!["<!DOCTYPE hvml SYSTEM 'x"]);
        assert!(results[0].doctype.as_ref().unwrap().force_quirks);
    }

    #[test]
    fn registry_exhaustion_stops_the_tokenizer() {
        let registry = Arc::new(TagRegistry::with_limit(1));
        let tok = Tokenizer::new(Recorder::new(), TokenizerOpts::default(), registry);
        let buffer = BufferQueue::default();
        buffer.push_back(StrTendril::from("<x-one></x-one><x-two>text<p>"));
        assert_eq!(tok.feed(&buffer), Err(Error::OutOfMemory(1)));
        assert!(buffer.is_empty());
        assert_eq!(tok.end(), Err(Error::OutOfMemory(1)));

        let tokens = tok.sink.tokens.take();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[2].is_eof());
    }
}
