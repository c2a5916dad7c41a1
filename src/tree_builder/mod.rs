// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HVML tree builder.
//!
//! Tokens arrive through [`TokenSink`]. Each one is stringified, turned
//! into the builder's own token type and handed to the handler of the
//! current insertion mode (see `modes`), or to the foreign content rules
//! while the adjusted current node is MathML or SVG. Handlers report a
//! [`Step`](types::Step): finished, reprocess in another mode, or switch
//! the tokenizer to a raw text state.

pub use self::interface::{AppendNode, AppendText, ElemName, NodeOrText, TreeSink};
pub use self::interface::{NoQuirks, Quirks, QuirksMode};

use std::borrow::Cow::{self, Borrowed};
use std::cell::{Cell, RefCell};
use std::fmt;

use log::{debug, log_enabled, trace, Level};

use self::stack::{ActiveFormatting, Open, OpenElems};
use self::types::{Mode, Step, Tag, Token};
use crate::stringify::stringify;
use crate::tag::{ids, Namespace};
use crate::tendril::StrTendril;
use crate::tokenizer::states as tok_state;
use crate::tokenizer::{self, Doctype, ParseError, Span};
use crate::tokenizer::{TokenSink, TokenSinkResult, TokenType};
use crate::util::str::to_escaped_string;

pub mod interface;

mod foreign;
mod insert;
mod modes;
mod stack;
mod types;

/// Tree builder options, with an impl for Default.
#[derive(Copy, Clone, Debug)]
pub struct TreeBuilderOpts {
    /// Format parse error messages with the offending token and mode.
    /// Default: false
    pub exact_errors: bool,

    /// Is scripting enabled? With scripting the content of `<noscript>`
    /// is raw text; without it the content is parsed as elements.
    /// Default: true
    pub scripting_enabled: bool,

    /// Leave the DOCTYPE out of the tree. Default: false
    pub drop_doctype: bool,

    /// Quirks mode before any DOCTYPE is seen. Default: NoQuirks
    pub quirks_mode: QuirksMode,
}

impl Default for TreeBuilderOpts {
    fn default() -> TreeBuilderOpts {
        TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: true,
            drop_doctype: false,
            quirks_mode: NoQuirks,
        }
    }
}

/// The HVML tree builder.
pub struct TreeBuilder<Handle, Sink> {
    opts: TreeBuilderOpts,

    /// Consumer of tree modifications.
    pub sink: Sink,

    mode: Cell<Mode>,

    /// Mode to return to from `Text` and `InTableText`.
    orig_mode: Cell<Option<Mode>>,

    /// Modes of the open templates, innermost last.
    template_modes: RefCell<Vec<Mode>>,

    /// Text seen in `InTableText`, waiting to be placed.
    pending_table_text: RefCell<Vec<StrTendril>>,

    quirks_mode: Cell<QuirksMode>,

    doc_handle: Handle,

    open: RefCell<OpenElems<Handle>>,

    formatting: RefCell<ActiveFormatting<Handle>>,

    head: RefCell<Option<Handle>>,

    form: RefCell<Option<Handle>>,

    frameset_ok: Cell<bool>,

    /// Drop a line feed at the start of the next text token.
    ignore_lf: Cell<bool>,

    /// Insert table content before the table instead of inside it.
    foster_parenting: Cell<bool>,

    /// Context element of a fragment parse. It is never inserted.
    context: Option<Open<Handle>>,

    current_line: Cell<u64>,

    current_span: Cell<Span>,
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    /// Create a tree builder for a whole document.
    pub fn new(sink: Sink, opts: TreeBuilderOpts) -> TreeBuilder<Handle, Sink> {
        TreeBuilder::build(sink, opts, None)
    }

    /// Create a tree builder for a fragment parsed as the content of an
    /// element named `context`.
    ///
    /// The context element is created through the sink but never inserted.
    /// A root element stands in for it on the stack and the insertion mode
    /// follows from its name.
    pub fn new_for_fragment(
        sink: Sink,
        context: ElemName,
        opts: TreeBuilderOpts,
    ) -> TreeBuilder<Handle, Sink> {
        let node = sink.create_element(context, vec![], Span::default());
        let tb = TreeBuilder::build(
            sink,
            opts,
            Some(Open {
                node,
                name: context,
            }),
        );
        if context.is_hvml(ids::template) {
            tb.template_modes.borrow_mut().push(Mode::InTemplate);
        }
        tb.insert_root(Tag::implied(ids::hvml, Span::default()));
        tb.mode.set(tb.reset_mode());
        tb
    }

    fn build(
        sink: Sink,
        opts: TreeBuilderOpts,
        context: Option<Open<Handle>>,
    ) -> TreeBuilder<Handle, Sink> {
        let doc_handle = sink.get_document();
        TreeBuilder {
            opts,
            sink,
            mode: Cell::new(Mode::Initial),
            orig_mode: Cell::new(None),
            template_modes: RefCell::new(vec![]),
            pending_table_text: RefCell::new(vec![]),
            quirks_mode: Cell::new(opts.quirks_mode),
            doc_handle,
            open: RefCell::new(OpenElems::new()),
            formatting: RefCell::new(ActiveFormatting::new()),
            head: RefCell::new(None),
            form: RefCell::new(None),
            frameset_ok: Cell::new(true),
            ignore_lf: Cell::new(false),
            foster_parenting: Cell::new(false),
            context,
            current_line: Cell::new(1),
            current_span: Cell::new(Span::default()),
        }
    }

    /// The tokenizer state a fragment starts in, given its context element.
    pub fn tokenizer_state_for_context_elem(&self) -> tok_state::State {
        match self.context {
            Some(ref ctx) if ctx.name.ns == Namespace::Hvml => match ctx.name.tag {
                ids::noscript if !self.opts.scripting_enabled => tok_state::State::Data,
                tag => tag.content_model().into(),
            },
            _ => tok_state::State::Data,
        }
    }

    /// A snapshot of the stack of open elements, outermost first.
    pub fn open_elements(&self) -> Vec<Handle> {
        self.open.borrow().handles().collect()
    }

    /// Every node the builder may still touch: the open elements, the
    /// active formatting elements, the head and form pointers and the
    /// fragment context.
    pub fn held_nodes(&self) -> Vec<Handle> {
        let mut held: Vec<Handle> = self.open.borrow().handles().collect();
        held.extend(self.formatting.borrow().handles());
        held.extend(self.head.borrow().iter().cloned());
        held.extend(self.form.borrow().iter().cloned());
        held.extend(self.context.iter().map(|ctx| ctx.node.clone()));
        held
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode.get()
    }

    /// Are we parsing a fragment?
    pub fn is_fragment(&self) -> bool {
        self.context.is_some()
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
        self.sink.set_quirks_mode(mode);
    }

    fn error(&self, message: Cow<'static, str>) {
        self.sink.parse_error(ParseError {
            message,
            line: self.current_line.get(),
            offset: self.current_span.get().begin,
        });
    }

    /// Report `thing` as out of place and ignore it.
    fn unexpected<T: fmt::Debug>(&self, thing: &T) -> Step {
        self.error(format_if!(
            self.opts.exact_errors,
            "Unexpected token",
            "Unexpected token {} in insertion mode {:?}",
            to_escaped_string(thing),
            self.mode.get()
        ));
        Step::Done
    }

    fn debug_step(&self, mode: Mode, token: &Token) {
        if log_enabled!(Level::Debug) {
            debug!("processing {} in insertion mode {:?}", to_escaped_string(token), mode);
        }
    }

    fn run(&self, mut token: Token) -> TokenSinkResult {
        loop {
            let self_closing = matches!(
                token,
                Token::Start(Tag {
                    self_closing: true,
                    ..
                })
            );
            let step = if self.is_foreign(&token) {
                self.foreign(token)
            } else {
                self.step(self.mode.get(), token)
            };
            match step {
                Step::Done => {
                    if self_closing {
                        self.error(Borrowed("Unacknowledged self-closing tag"));
                    }
                    return TokenSinkResult::Data;
                },
                Step::Acked => return TokenSinkResult::Data,
                Step::Again(mode, again) => {
                    trace!("reprocessing in {mode:?}");
                    self.mode.set(mode);
                    token = again;
                },
                Step::Plaintext => return TokenSinkResult::Plaintext,
                Step::Raw(kind) => return TokenSinkResult::RawData(kind),
            }
        }
    }

    fn doctype(&self, dt: Doctype) {
        if self.mode.get() != Mode::Initial {
            self.error(format_if!(
                self.opts.exact_errors,
                "DOCTYPE in body",
                "DOCTYPE in insertion mode {:?}",
                self.mode.get()
            ));
            return;
        }

        let named_hvml = dt.name.as_deref() == Some("hvml");
        if !named_hvml {
            self.error(format_if!(self.opts.exact_errors, "Bad DOCTYPE", "Bad DOCTYPE: {:?}", dt));
        }
        let quirks =
            dt.force_quirks || (!named_hvml && (dt.public_id.is_none() || dt.system_id.is_none()));

        if !self.opts.drop_doctype {
            let text = |s: Option<String>| s.map_or_else(StrTendril::new, StrTendril::from);
            self.sink
                .append_doctype_to_document(text(dt.name), text(dt.public_id), text(dt.system_id));
        }
        self.set_quirks_mode(if quirks { Quirks } else { NoQuirks });
        self.mode.set(Mode::BeforeHvml);
    }

    fn to_tag(token: tokenizer::Token) -> Tag {
        Tag {
            id: token.tag,
            self_closing: token.kind.contains(TokenType::CLOSE_SELF),
            attrs: token.attrs,
            span: token.span,
        }
    }
}

impl<Handle, Sink> TokenSink for TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    fn process_token(&self, mut token: tokenizer::Token) -> TokenSinkResult {
        stringify(&mut token);

        if token.line != self.current_line.get() {
            self.current_line.set(token.line);
            self.sink.set_current_line(token.line);
        }
        self.current_span.set(token.span);
        self.sink.set_current_span(token.span);
        let ignore_lf = self.ignore_lf.take();

        let token = if token.is_doctype() {
            self.doctype(token.doctype.unwrap_or_default());
            return TokenSinkResult::Continue;
        } else if token.is_eof() {
            Token::Eof
        } else if token.is_comment() {
            Token::Comment(StrTendril::from(token.text))
        } else if token.kind.contains(TokenType::NULL) {
            Token::Null
        } else if token.is_text() {
            let mut text = StrTendril::from(token.text);
            if ignore_lf && text.starts_with('\n') {
                text.pop_front(1);
            }
            if text.is_empty() {
                return TokenSinkResult::Continue;
            }
            Token::Text(text)
        } else if token.kind.contains(TokenType::CLOSE) {
            Token::End(Self::to_tag(token))
        } else {
            Token::Start(Self::to_tag(token))
        };

        self.run(token)
    }

    fn parse_error(&self, error: ParseError) {
        self.sink.parse_error(error);
    }

    fn end(&self) {
        let all = self.open.borrow_mut().cut(0);
        for elem in all {
            self.sink.pop(&elem.node);
        }
    }

    fn adjusted_current_node_present_but_not_in_primary_namespace(&self) -> bool {
        self.adjusted_current_name()
            .is_some_and(|name| name.ns != Namespace::Hvml)
    }
}
