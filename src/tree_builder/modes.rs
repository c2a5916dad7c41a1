// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The insertion modes.
//!
//! `step` picks the handler of a mode. A handler splits the token by kind
//! and hands tags to `<mode>_start` and `<mode>_end`. A mode that defers
//! to another calls that mode's handler directly, so `in_table_start`
//! running under `InTableBody` sees the builder still in `InTableBody`.

use std::borrow::Cow::Borrowed;

use super::interface::{ElemName, Quirks, TreeSink};
use super::stack::is_heading;
use super::types::{split_leading_ws, Mode, Step, Tag, Token};
use super::TreeBuilder;
use crate::tag::{ids, Categories, Namespace, TagId};
use crate::tendril::StrTendril;
use crate::tokenizer::states::RawKind::{Rawtext, Rcdata, ScriptData};
use crate::tokenizer::Span;
use crate::util::str::{is_all_whitespace, is_ascii_whitespace, to_escaped_string};

/// Start tags the head rules handle wherever they turn up.
fn is_head_content(id: TagId) -> bool {
    matches!(
        id,
        ids::base
            | ids::basefont
            | ids::bgsound
            | ids::link
            | ids::meta
            | ids::noframes
            | ids::script
            | ids::style
            | ids::template
            | ids::title
    )
}

/// Blocks that close an open `<p>` and are closed by their end tag.
fn is_block(id: TagId) -> bool {
    matches!(
        id,
        ids::address
            | ids::article
            | ids::aside
            | ids::blockquote
            | ids::center
            | ids::details
            | ids::dialog
            | ids::dir
            | ids::div
            | ids::dl
            | ids::fieldset
            | ids::figcaption
            | ids::figure
            | ids::footer
            | ids::header
            | ids::hgroup
            | ids::main
            | ids::menu
            | ids::nav
            | ids::ol
            | ids::p
            | ids::search
            | ids::section
            | ids::summary
            | ids::ul
    )
}

fn is_formatting(id: TagId) -> bool {
    ElemName::hvml(id).has(Categories::FORMATTING)
}

fn is_table_section(id: TagId) -> bool {
    matches!(id, ids::tbody | ids::tfoot | ids::thead)
}

fn is_hidden_input(tag: &Tag) -> bool {
    tag.attrs
        .iter()
        .find(|attr| attr.ns == Namespace::Undef && &*attr.name == "type")
        .is_some_and(|attr| attr.value.eq_ignore_ascii_case("hidden"))
}

/// Drop the leading whitespace of `text`, returning what is left.
fn skip_ws(text: StrTendril) -> Option<StrTendril> {
    let (_, rest) = split_leading_ws(text);
    (!rest.is_empty()).then_some(rest)
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    pub(super) fn step(&self, mode: Mode, token: Token) -> Step {
        self.debug_step(mode, &token);
        match mode {
            Mode::Initial => self.initial(token),
            Mode::BeforeHvml => self.before_hvml(token),
            Mode::BeforeHead => self.before_head(token),
            Mode::InHead => self.in_head(token),
            Mode::InHeadNoscript => self.in_head_noscript(token),
            Mode::AfterHead => self.after_head(token),
            Mode::InBody => self.in_body(token),
            Mode::Text => self.text(token),
            Mode::InTable => self.in_table(token),
            Mode::InTableText => self.in_table_text(token),
            Mode::InCaption => self.in_caption(token),
            Mode::InColumnGroup => self.in_column_group(token),
            Mode::InTableBody => self.in_table_body(token),
            Mode::InRow => self.in_row(token),
            Mode::InCell => self.in_cell(token),
            Mode::InSelect => self.in_select(token),
            Mode::InSelectInTable => self.in_select_in_table(token),
            Mode::InTemplate => self.in_template(token),
            Mode::AfterBody => self.after_body(token),
            Mode::InFrameset => self.in_frameset(token),
            Mode::AfterFrameset => self.after_frameset(token),
            Mode::AfterAfterBody => self.after_after_body(token),
            Mode::AfterAfterFrameset => self.after_after_frameset(token),
        }
    }

    /// Insert the leading whitespace of `text`, returning what is left.
    fn insert_ws(&self, text: StrTendril) -> Option<StrTendril> {
        let (ws, rest) = split_leading_ws(text);
        if !ws.is_empty() {
            self.insert_text(ws);
        }
        (!rest.is_empty()).then_some(rest)
    }

    /// Leading whitespace goes through the body rules, the rest to `rest`.
    fn ws_as_body<F>(&self, text: StrTendril, rest: F) -> Step
    where
        F: FnOnce(Token) -> Step,
    {
        let (ws, tail) = split_leading_ws(text);
        if !ws.is_empty() {
            self.in_body_text(ws);
        }
        if tail.is_empty() {
            Step::Done
        } else {
            rest(Token::Text(tail))
        }
    }

    // Initial

    fn initial(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match skip_ws(text) {
                Some(rest) => self.initial_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment_in_doc(text),
            token => self.initial_other(token),
        }
    }

    fn initial_other(&self, token: Token) -> Step {
        self.unexpected(&token);
        self.set_quirks_mode(Quirks);
        Step::Again(Mode::BeforeHvml, token)
    }

    // BeforeHvml

    fn before_hvml(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match skip_ws(text) {
                Some(rest) => self.before_hvml_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment_in_doc(text),
            Token::Start(tag) if tag.id == ids::hvml => {
                self.insert_root(tag);
                self.mode.set(Mode::BeforeHead);
                Step::Done
            },
            Token::End(tag) if !matches!(tag.id, ids::head | ids::body | ids::hvml | ids::br) => {
                self.unexpected(&tag)
            },
            token => self.before_hvml_other(token),
        }
    }

    fn before_hvml_other(&self, token: Token) -> Step {
        let at = self.current_span.get().begin;
        self.insert_root(Tag::implied(ids::hvml, Span::new(at, at)));
        Step::Again(Mode::BeforeHead, token)
    }

    // BeforeHead

    fn before_head(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match skip_ws(text) {
                Some(rest) => self.before_head_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.before_head_start(tag),
            Token::End(tag) => self.before_head_end(tag),
            token => self.before_head_other(token),
        }
    }

    fn before_head_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::head => {
                *self.head.borrow_mut() = Some(self.insert(tag));
                self.mode.set(Mode::InHead);
                Step::Done
            },
            _ => self.before_head_other(Token::Start(tag)),
        }
    }

    fn before_head_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::head | ids::body | ids::hvml | ids::br => self.before_head_other(Token::End(tag)),
            _ => self.unexpected(&tag),
        }
    }

    fn before_head_other(&self, token: Token) -> Step {
        *self.head.borrow_mut() = Some(self.insert_implied(ids::head));
        Step::Again(Mode::InHead, token)
    }

    // InHead

    fn in_head(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match self.insert_ws(text) {
                Some(rest) => self.in_head_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_head_start(tag),
            Token::End(tag) => self.in_head_end(tag),
            token => self.in_head_other(token),
        }
    }

    fn in_head_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::base | ids::basefont | ids::bgsound | ids::link | ids::meta => {
                self.insert_void(tag);
                Step::Acked
            },
            ids::title => self.insert_raw(tag, Rcdata),
            ids::noscript if !self.opts.scripting_enabled => {
                self.insert(tag);
                self.mode.set(Mode::InHeadNoscript);
                Step::Done
            },
            ids::noframes | ids::style | ids::noscript => self.insert_raw(tag, Rawtext),
            ids::script => self.insert_raw(tag, ScriptData),
            ids::template => {
                self.insert(tag);
                self.formatting.borrow_mut().push_marker();
                self.frameset_ok.set(false);
                self.mode.set(Mode::InTemplate);
                self.template_modes.borrow_mut().push(Mode::InTemplate);
                Step::Done
            },
            ids::head => self.unexpected(&tag),
            _ => self.in_head_other(Token::Start(tag)),
        }
    }

    fn in_head_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::head => {
                self.pop();
                self.mode.set(Mode::AfterHead);
                Step::Done
            },
            ids::body | ids::hvml | ids::br => self.in_head_other(Token::End(tag)),
            ids::template => {
                if !self.has_open(ids::template) {
                    return self.unexpected(&tag);
                }
                self.thorough_implied_end_tags();
                self.close(ids::template);
                self.formatting.borrow_mut().clear_to_marker();
                self.template_modes.borrow_mut().pop();
                self.mode.set(self.reset_mode());
                Step::Done
            },
            _ => self.unexpected(&tag),
        }
    }

    fn in_head_other(&self, token: Token) -> Step {
        self.pop();
        Step::Again(Mode::AfterHead, token)
    }

    // InHeadNoscript

    fn in_head_noscript(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match self.insert_ws(text) {
                Some(rest) => self.in_head_noscript_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_head_noscript_start(tag),
            Token::End(tag) => self.in_head_noscript_end(tag),
            token => self.in_head_noscript_other(token),
        }
    }

    fn in_head_noscript_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::basefont
            | ids::bgsound
            | ids::link
            | ids::meta
            | ids::noframes
            | ids::style => self.in_head_start(tag),
            ids::head | ids::noscript => self.unexpected(&tag),
            _ => self.in_head_noscript_other(Token::Start(tag)),
        }
    }

    fn in_head_noscript_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::noscript => {
                self.pop();
                self.mode.set(Mode::InHead);
                Step::Done
            },
            ids::br => self.in_head_noscript_other(Token::End(tag)),
            _ => self.unexpected(&tag),
        }
    }

    fn in_head_noscript_other(&self, token: Token) -> Step {
        self.unexpected(&token);
        self.pop();
        Step::Again(Mode::InHead, token)
    }

    // AfterHead

    fn after_head(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match self.insert_ws(text) {
                Some(rest) => self.after_head_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.after_head_start(tag),
            Token::End(tag) => self.after_head_end(tag),
            token => self.after_head_other(token),
        }
    }

    fn after_head_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::body => {
                self.insert(tag);
                self.frameset_ok.set(false);
                self.mode.set(Mode::InBody);
                Step::Done
            },
            ids::frameset => {
                self.insert(tag);
                self.mode.set(Mode::InFrameset);
                Step::Done
            },
            id if is_head_content(id) => {
                self.unexpected(&tag);
                let head = self.head.borrow().clone();
                let Some(head) = head else {
                    return self.in_head_start(tag);
                };
                self.push(head.clone(), ElemName::hvml(ids::head));
                let step = self.in_head_start(tag);
                self.remove_open(&head);
                step
            },
            ids::head => self.unexpected(&tag),
            _ => self.after_head_other(Token::Start(tag)),
        }
    }

    fn after_head_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::template => self.in_head_end(tag),
            ids::body | ids::hvml | ids::br => self.after_head_other(Token::End(tag)),
            _ => self.unexpected(&tag),
        }
    }

    fn after_head_other(&self, token: Token) -> Step {
        self.insert_implied(ids::body);
        Step::Again(Mode::InBody, token)
    }

    // InBody

    fn in_body(&self, token: Token) -> Step {
        match token {
            Token::Null => self.unexpected(&token),
            Token::Text(text) => self.in_body_text(text),
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_body_start(tag),
            Token::End(tag) => self.in_body_end(tag),
            Token::Eof => self.in_body_eof(),
        }
    }

    fn in_body_text(&self, text: StrTendril) -> Step {
        self.reconstruct_formatting();
        if !is_all_whitespace(&text) {
            self.frameset_ok.set(false);
        }
        self.insert_text(text)
    }

    fn in_body_eof(&self) -> Step {
        if !self.template_modes.borrow().is_empty() {
            return self.in_template(Token::Eof);
        }
        self.check_body_end();
        Step::Done
    }

    fn in_body_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => {
                self.unexpected(&tag);
                if !self.has_open(ids::template) {
                    let root = self.open.borrow().get(0).map(|e| e.node.clone());
                    if let Some(root) = root {
                        self.sink.add_attrs_if_missing(&root, tag.attrs);
                    }
                }
                Step::Done
            },
            id if is_head_content(id) => self.in_head_start(tag),
            ids::body => {
                self.unexpected(&tag);
                if let Some(body) = self.body() {
                    if !self.has_open(ids::template) {
                        self.frameset_ok.set(false);
                        self.sink.add_attrs_if_missing(&body, tag.attrs);
                    }
                }
                Step::Done
            },
            ids::frameset => {
                self.unexpected(&tag);
                if !self.frameset_ok.get() {
                    return Step::Done;
                }
                let Some(body) = self.body() else {
                    return Step::Done;
                };
                self.sink.remove_from_parent(&body);
                self.pop_to(1);
                self.insert(tag);
                self.mode.set(Mode::InFrameset);
                Step::Done
            },
            id if is_block(id) => {
                self.close_p_in_button_scope();
                self.insert(tag);
                Step::Done
            },
            ids::h1 | ids::h2 | ids::h3 | ids::h4 | ids::h5 | ids::h6 => {
                self.close_p_in_button_scope();
                if self.open.borrow().current_name().is_some_and(is_heading) {
                    self.error(Borrowed("nested heading tags"));
                    self.pop();
                }
                self.insert(tag);
                Step::Done
            },
            ids::pre | ids::listing => {
                self.close_p_in_button_scope();
                self.insert(tag);
                self.ignore_lf.set(true);
                self.frameset_ok.set(false);
                Step::Done
            },
            ids::form => {
                let in_template = self.has_open(ids::template);
                if self.form.borrow().is_some() && !in_template {
                    self.error(Borrowed("nested forms"));
                    return Step::Done;
                }
                self.close_p_in_button_scope();
                let form = self.insert(tag);
                if !in_template {
                    *self.form.borrow_mut() = Some(form);
                }
                Step::Done
            },
            ids::li | ids::dd | ids::dt => self.open_list_item(tag),
            ids::plaintext => {
                self.close_p_in_button_scope();
                self.insert(tag);
                Step::Plaintext
            },
            ids::button => {
                if self.in_scope(Categories::SCOPE, ids::button) {
                    self.error(Borrowed("nested buttons"));
                    self.implied_end_tags(None);
                    self.pop_until_named(ids::button);
                }
                self.reconstruct_formatting();
                self.insert(tag);
                self.frameset_ok.set(false);
                Step::Done
            },
            ids::a => {
                self.close_open_anchor(&tag);
                self.reconstruct_formatting();
                self.insert_formatting(tag);
                Step::Done
            },
            ids::nobr => {
                self.reconstruct_formatting();
                if self.in_scope(Categories::SCOPE, ids::nobr) {
                    self.error(Borrowed("Nested <nobr>"));
                    self.adoption_agency(ids::nobr);
                    self.reconstruct_formatting();
                }
                self.insert_formatting(tag);
                Step::Done
            },
            id if is_formatting(id) => {
                self.reconstruct_formatting();
                self.insert_formatting(tag);
                Step::Done
            },
            ids::applet | ids::marquee | ids::object => {
                self.reconstruct_formatting();
                self.insert(tag);
                self.formatting.borrow_mut().push_marker();
                self.frameset_ok.set(false);
                Step::Done
            },
            ids::table => {
                if self.quirks_mode.get() != Quirks {
                    self.close_p_in_button_scope();
                }
                self.insert(tag);
                self.frameset_ok.set(false);
                self.mode.set(Mode::InTable);
                Step::Done
            },
            ids::area | ids::br | ids::embed | ids::img | ids::keygen | ids::wbr | ids::input => {
                let keep_frameset_ok = tag.id == ids::input && is_hidden_input(&tag);
                self.reconstruct_formatting();
                self.insert_void(tag);
                if !keep_frameset_ok {
                    self.frameset_ok.set(false);
                }
                Step::Acked
            },
            ids::param | ids::source | ids::track => {
                self.insert_void(tag);
                Step::Acked
            },
            ids::hr => {
                self.close_p_in_button_scope();
                self.insert_void(tag);
                self.frameset_ok.set(false);
                Step::Acked
            },
            ids::image => {
                self.unexpected(&tag);
                self.in_body_start(Tag { id: ids::img, ..tag })
            },
            ids::textarea => {
                self.ignore_lf.set(true);
                self.frameset_ok.set(false);
                self.insert_raw(tag, Rcdata)
            },
            ids::xmp => {
                self.close_p_in_button_scope();
                self.reconstruct_formatting();
                self.frameset_ok.set(false);
                self.insert_raw(tag, Rawtext)
            },
            ids::iframe => {
                self.frameset_ok.set(false);
                self.insert_raw(tag, Rawtext)
            },
            ids::noembed => self.insert_raw(tag, Rawtext),
            ids::noscript if self.opts.scripting_enabled => self.insert_raw(tag, Rawtext),
            ids::select => {
                self.reconstruct_formatting();
                self.insert(tag);
                self.frameset_ok.set(false);
                // `self.mode` is the mode that delegated here, not `InBody`.
                self.mode.set(if self.mode.get().is_table_part() {
                    Mode::InSelectInTable
                } else {
                    Mode::InSelect
                });
                Step::Done
            },
            ids::optgroup | ids::option => {
                if self.current_is(ids::option) {
                    self.pop();
                }
                self.reconstruct_formatting();
                self.insert(tag);
                Step::Done
            },
            ids::rb | ids::rtc => {
                if self.in_scope(Categories::SCOPE, ids::ruby) {
                    self.implied_end_tags(None);
                }
                if !self.current_is(ids::ruby) {
                    self.unexpected(&tag);
                }
                self.insert(tag);
                Step::Done
            },
            ids::rp | ids::rt => {
                if self.in_scope(Categories::SCOPE, ids::ruby) {
                    self.implied_end_tags(Some(ids::rtc));
                }
                if !self.current_is(ids::rtc) && !self.current_is(ids::ruby) {
                    self.unexpected(&tag);
                }
                self.insert(tag);
                Step::Done
            },
            ids::math => self.enter_foreign(tag, Namespace::MathMl),
            ids::svg => self.enter_foreign(tag, Namespace::Svg),
            ids::caption
            | ids::col
            | ids::colgroup
            | ids::frame
            | ids::head
            | ids::tbody
            | ids::td
            | ids::tfoot
            | ids::th
            | ids::thead
            | ids::tr => self.unexpected(&tag),
            _ => {
                self.reconstruct_formatting();
                self.insert(tag);
                Step::Done
            },
        }
    }

    /// `<li>`, `<dd>` and `<dt>` close the open item of their list.
    fn open_list_item(&self, tag: Tag) -> Step {
        self.frameset_ok.set(false);

        let to_close = {
            let open = self.open.borrow();
            let mut found = None;
            for elem in open.iter().rev() {
                let name = elem.name;
                let closes = name.ns == Namespace::Hvml
                    && match tag.id {
                        ids::li => name.tag == ids::li,
                        _ => matches!(name.tag, ids::dd | ids::dt),
                    };
                if closes {
                    found = Some(name.tag);
                    break;
                }
                let passable = name.ns == Namespace::Hvml
                    && matches!(name.tag, ids::address | ids::div | ids::p);
                if name.has(Categories::SPECIAL) && !passable {
                    break;
                }
            }
            found
        };

        if let Some(id) = to_close {
            self.implied_end_tags(Some(id));
            self.close(id);
        }
        self.close_p_in_button_scope();
        self.insert(tag);
        Step::Done
    }

    fn in_body_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::body => {
                if self.in_scope(Categories::SCOPE, ids::body) {
                    self.check_body_end();
                    self.mode.set(Mode::AfterBody);
                } else {
                    self.error(Borrowed("</body> with no <body> in scope"));
                }
                Step::Done
            },
            ids::hvml => {
                if !self.in_scope(Categories::SCOPE, ids::body) {
                    self.error(Borrowed("</hvml> with no <body> in scope"));
                    return Step::Done;
                }
                self.check_body_end();
                Step::Again(Mode::AfterBody, Token::End(tag))
            },
            ids::p => {
                if !self.in_scope(Categories::SCOPE_BUTTON, ids::p) {
                    self.error(Borrowed("No <p> tag to close"));
                    self.insert_implied(ids::p);
                }
                self.close_p();
                Step::Done
            },
            id if is_block(id)
                || matches!(id, ids::button | ids::listing | ids::pre) =>
            {
                if !self.in_scope(Categories::SCOPE, id) {
                    return self.unexpected(&tag);
                }
                self.implied_end_tags(None);
                self.close(id);
                Step::Done
            },
            ids::form => self.close_form(),
            ids::li | ids::dd | ids::dt => {
                let boundary = match tag.id {
                    ids::li => Categories::SCOPE_LIST_ITEM,
                    _ => Categories::SCOPE,
                };
                if self.in_scope(boundary, tag.id) {
                    self.implied_end_tags(Some(tag.id));
                    self.close(tag.id);
                } else {
                    self.error(Borrowed("No matching tag to close"));
                }
                Step::Done
            },
            ids::h1 | ids::h2 | ids::h3 | ids::h4 | ids::h5 | ids::h6 => {
                let open_heading = self
                    .open
                    .borrow()
                    .in_scope_where(Categories::SCOPE, |e| is_heading(e.name))
                    .is_some();
                if !open_heading {
                    self.error(Borrowed("No heading tag to close"));
                    return Step::Done;
                }
                self.implied_end_tags(None);
                if !self.current_is(tag.id) {
                    self.error(Borrowed("Closing wrong heading tag"));
                }
                self.pop_until(is_heading);
                Step::Done
            },
            ids::applet | ids::marquee | ids::object => {
                if !self.in_scope(Categories::SCOPE, tag.id) {
                    return self.unexpected(&tag);
                }
                self.implied_end_tags(None);
                self.close(tag.id);
                self.formatting.borrow_mut().clear_to_marker();
                Step::Done
            },
            ids::br => {
                self.unexpected(&tag);
                self.in_body_start(Tag {
                    attrs: vec![],
                    ..tag
                })
            },
            ids::template => self.in_head_end(tag),
            id if is_formatting(id) => {
                self.adoption_agency(id);
                Step::Done
            },
            _ => {
                self.any_other_end_tag(tag);
                Step::Done
            },
        }
    }

    fn close_form(&self) -> Step {
        if self.has_open(ids::template) {
            if !self.in_scope(Categories::SCOPE, ids::form) {
                self.error(Borrowed("Form element not in scope on </form>"));
                return Step::Done;
            }
            self.implied_end_tags(None);
            if !self.current_is(ids::form) {
                self.error(Borrowed("Bad open element on </form>"));
            }
            self.pop_until_named(ids::form);
            return Step::Done;
        }

        let Some(form) = self.form.take() else {
            self.error(Borrowed("Null form element pointer on </form>"));
            return Step::Done;
        };
        let in_scope = self
            .open
            .borrow()
            .in_scope_where(Categories::SCOPE, |e| self.sink.same_node(&e.node, &form))
            .is_some();
        if !in_scope {
            self.error(Borrowed("Form element not in scope on </form>"));
            return Step::Done;
        }
        self.implied_end_tags(None);
        let current = self.current_open().node;
        self.remove_open(&form);
        if !self.sink.same_node(&current, &form) {
            self.error(Borrowed("Bad open element on </form>"));
        }
        Step::Done
    }

    // Text

    fn text(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => self.insert_text(text),
            Token::Eof => {
                self.unexpected(&token);
                self.pop();
                let orig = self.orig_mode.take().expect("no original insertion mode");
                Step::Again(orig, token)
            },
            Token::End(_) => {
                self.pop();
                let orig = self.orig_mode.take().expect("no original insertion mode");
                self.mode.set(orig);
                Step::Done
            },
            // Only when raw text came out of a state this mode did not ask for.
            token => self.unexpected(&token),
        }
    }

    // InTable

    fn in_table(&self, token: Token) -> Step {
        match token {
            Token::Null | Token::Text(_) => self.in_table_chars(token),
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_table_start(tag),
            Token::End(tag) => self.in_table_end(tag),
            Token::Eof => self.in_body_eof(),
        }
    }

    fn in_table_chars(&self, token: Token) -> Step {
        let at_table = self.open.borrow().current_name().is_some_and(|n| {
            n.ns == Namespace::Hvml && (n.tag == ids::table || is_table_section(n.tag) || n.tag == ids::tr)
        });
        if at_table {
            debug_assert!(self.pending_table_text.borrow().is_empty());
            self.orig_mode.set(Some(self.mode.get()));
            return Step::Again(Mode::InTableText, token);
        }
        self.error(format_if!(
            self.opts.exact_errors,
            "Unexpected characters in table",
            "Unexpected characters {} in table",
            to_escaped_string(&token)
        ));
        self.fostered(token)
    }

    fn in_table_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::caption => {
                self.clear_to_table_context();
                self.formatting.borrow_mut().push_marker();
                self.insert(tag);
                self.mode.set(Mode::InCaption);
                Step::Done
            },
            ids::colgroup => {
                self.clear_to_table_context();
                self.insert(tag);
                self.mode.set(Mode::InColumnGroup);
                Step::Done
            },
            ids::col => {
                self.clear_to_table_context();
                self.insert_implied(ids::colgroup);
                Step::Again(Mode::InColumnGroup, Token::Start(tag))
            },
            id if is_table_section(id) => {
                self.clear_to_table_context();
                self.insert(tag);
                self.mode.set(Mode::InTableBody);
                Step::Done
            },
            ids::td | ids::th | ids::tr => {
                self.clear_to_table_context();
                self.insert_implied(ids::tbody);
                Step::Again(Mode::InTableBody, Token::Start(tag))
            },
            ids::table => {
                self.unexpected(&tag);
                if !self.in_scope(Categories::SCOPE_TABLE, ids::table) {
                    return Step::Done;
                }
                self.pop_until_named(ids::table);
                Step::Again(self.reset_mode(), Token::Start(tag))
            },
            ids::style | ids::script | ids::template => self.in_head_start(tag),
            ids::input if is_hidden_input(&tag) => {
                self.unexpected(&tag);
                self.insert_void(tag);
                Step::Acked
            },
            ids::form => {
                self.unexpected(&tag);
                if !self.has_open(ids::template) && self.form.borrow().is_none() {
                    let form = self.insert_void(tag);
                    *self.form.borrow_mut() = Some(form);
                }
                Step::Done
            },
            _ => {
                self.unexpected(&tag);
                self.fostered(Token::Start(tag))
            },
        }
    }

    fn in_table_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::table => {
                if self.in_scope(Categories::SCOPE_TABLE, ids::table) {
                    self.pop_until_named(ids::table);
                    self.mode.set(self.reset_mode());
                    Step::Done
                } else {
                    self.unexpected(&tag)
                }
            },
            ids::body
            | ids::caption
            | ids::col
            | ids::colgroup
            | ids::hvml
            | ids::tbody
            | ids::td
            | ids::tfoot
            | ids::th
            | ids::thead
            | ids::tr => self.unexpected(&tag),
            ids::template => self.in_head_end(tag),
            _ => {
                self.unexpected(&tag);
                self.fostered(Token::End(tag))
            },
        }
    }

    /// Run the body rules with table content placed before the table.
    fn fostered(&self, token: Token) -> Step {
        self.foster_parenting.set(true);
        let step = self.in_body(token);
        self.foster_parenting.set(false);
        step
    }

    // InTableText

    fn in_table_text(&self, token: Token) -> Step {
        match token {
            Token::Null => self.unexpected(&token),
            Token::Text(text) => {
                self.pending_table_text.borrow_mut().push(text);
                Step::Done
            },
            token => {
                self.flush_table_text();
                let orig = self.orig_mode.take().expect("no original insertion mode");
                Step::Again(orig, token)
            },
        }
    }

    fn flush_table_text(&self) {
        let pending = self.pending_table_text.take();
        if pending.iter().all(|text| is_all_whitespace(text)) {
            for text in pending {
                self.insert_text(text);
            }
            return;
        }
        self.error(Borrowed("Non-space table text"));
        for text in pending {
            self.fostered(Token::Text(text));
        }
    }

    // InCaption

    fn in_caption(&self, token: Token) -> Step {
        match token {
            Token::Start(tag) => self.in_caption_start(tag),
            Token::End(tag) => self.in_caption_end(tag),
            token => self.in_body(token),
        }
    }

    fn in_caption_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::caption
            | ids::col
            | ids::colgroup
            | ids::tbody
            | ids::td
            | ids::tfoot
            | ids::th
            | ids::thead
            | ids::tr => {
                if !self.close_caption() {
                    return self.unexpected(&tag);
                }
                Step::Again(Mode::InTable, Token::Start(tag))
            },
            _ => self.in_body_start(tag),
        }
    }

    fn in_caption_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::caption => {
                if !self.close_caption() {
                    return self.unexpected(&tag);
                }
                self.mode.set(Mode::InTable);
                Step::Done
            },
            ids::table => {
                if !self.close_caption() {
                    return self.unexpected(&tag);
                }
                Step::Again(Mode::InTable, Token::End(tag))
            },
            ids::body
            | ids::col
            | ids::colgroup
            | ids::hvml
            | ids::tbody
            | ids::td
            | ids::tfoot
            | ids::th
            | ids::thead
            | ids::tr => self.unexpected(&tag),
            _ => self.in_body_end(tag),
        }
    }

    /// Close the open caption. False when none is in table scope.
    fn close_caption(&self) -> bool {
        if !self.in_scope(Categories::SCOPE_TABLE, ids::caption) {
            return false;
        }
        self.implied_end_tags(None);
        self.close(ids::caption);
        self.formatting.borrow_mut().clear_to_marker();
        true
    }

    // InColumnGroup

    fn in_column_group(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => match self.insert_ws(text) {
                Some(rest) => self.in_column_group_other(Token::Text(rest)),
                None => Step::Done,
            },
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_column_group_start(tag),
            Token::End(tag) => self.in_column_group_end(tag),
            Token::Eof => self.in_body_eof(),
            token => self.in_column_group_other(token),
        }
    }

    fn in_column_group_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::col => {
                self.insert_void(tag);
                Step::Acked
            },
            ids::template => self.in_head_start(tag),
            _ => self.in_column_group_other(Token::Start(tag)),
        }
    }

    fn in_column_group_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::colgroup => {
                if !self.current_is(ids::colgroup) {
                    return self.unexpected(&tag);
                }
                self.pop();
                self.mode.set(Mode::InTable);
                Step::Done
            },
            ids::col => self.unexpected(&tag),
            ids::template => self.in_head_end(tag),
            _ => self.in_column_group_other(Token::End(tag)),
        }
    }

    fn in_column_group_other(&self, token: Token) -> Step {
        if !self.current_is(ids::colgroup) {
            return self.unexpected(&token);
        }
        self.pop();
        Step::Again(Mode::InTable, token)
    }

    // InTableBody

    fn in_table_body(&self, token: Token) -> Step {
        match token {
            Token::Start(tag) => self.in_table_body_start(tag),
            Token::End(tag) => self.in_table_body_end(tag),
            token => self.in_table(token),
        }
    }

    fn in_table_body_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::tr => {
                self.clear_to_table_body_context();
                self.insert(tag);
                self.mode.set(Mode::InRow);
                Step::Done
            },
            ids::th | ids::td => {
                self.unexpected(&tag);
                self.clear_to_table_body_context();
                self.insert_implied(ids::tr);
                Step::Again(Mode::InRow, Token::Start(tag))
            },
            ids::caption | ids::col | ids::colgroup | ids::tbody | ids::tfoot | ids::thead => {
                self.leave_table_body(Token::Start(tag))
            },
            _ => self.in_table_start(tag),
        }
    }

    fn in_table_body_end(&self, tag: Tag) -> Step {
        match tag.id {
            id if is_table_section(id) => {
                if !self.in_scope(Categories::SCOPE_TABLE, id) {
                    return self.unexpected(&tag);
                }
                self.clear_to_table_body_context();
                self.pop();
                self.mode.set(Mode::InTable);
                Step::Done
            },
            ids::table => self.leave_table_body(Token::End(tag)),
            ids::body
            | ids::caption
            | ids::col
            | ids::colgroup
            | ids::hvml
            | ids::td
            | ids::th
            | ids::tr => self.unexpected(&tag),
            _ => self.in_table_end(tag),
        }
    }

    /// Close the open table section and let the table rules see `token`.
    fn leave_table_body(&self, token: Token) -> Step {
        let open_section = self
            .open
            .borrow()
            .in_scope_where(Categories::SCOPE_TABLE, |e| {
                e.name.ns == Namespace::Hvml && is_table_section(e.name.tag)
            })
            .is_some();
        if !open_section {
            return self.unexpected(&token);
        }
        self.clear_to_table_body_context();
        self.pop();
        Step::Again(Mode::InTable, token)
    }

    // InRow

    fn in_row(&self, token: Token) -> Step {
        match token {
            Token::Start(tag) => self.in_row_start(tag),
            Token::End(tag) => self.in_row_end(tag),
            token => self.in_table(token),
        }
    }

    fn in_row_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::th | ids::td => {
                self.clear_to_row_context();
                self.insert(tag);
                self.mode.set(Mode::InCell);
                self.formatting.borrow_mut().push_marker();
                Step::Done
            },
            ids::caption
            | ids::col
            | ids::colgroup
            | ids::tbody
            | ids::tfoot
            | ids::thead
            | ids::tr => {
                if !self.close_row() {
                    return self.unexpected(&tag);
                }
                Step::Again(Mode::InTableBody, Token::Start(tag))
            },
            _ => self.in_table_start(tag),
        }
    }

    fn in_row_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::tr => {
                if !self.close_row() {
                    return self.unexpected(&tag);
                }
                self.mode.set(Mode::InTableBody);
                Step::Done
            },
            ids::table => {
                if !self.close_row() {
                    return self.unexpected(&tag);
                }
                Step::Again(Mode::InTableBody, Token::End(tag))
            },
            id if is_table_section(id) => {
                if !self.in_scope(Categories::SCOPE_TABLE, id) {
                    return self.unexpected(&tag);
                }
                if !self.close_row() {
                    return Step::Done;
                }
                Step::Again(Mode::InTableBody, Token::End(tag))
            },
            ids::body | ids::caption | ids::col | ids::colgroup | ids::hvml | ids::td | ids::th => {
                self.unexpected(&tag)
            },
            _ => self.in_table_end(tag),
        }
    }

    /// Close the open row. False when none is in table scope.
    fn close_row(&self) -> bool {
        if !self.in_scope(Categories::SCOPE_TABLE, ids::tr) {
            return false;
        }
        self.clear_to_row_context();
        let row = self.pop();
        debug_assert!(row.name.is_hvml(ids::tr));
        true
    }

    // InCell

    fn in_cell(&self, token: Token) -> Step {
        match token {
            Token::Start(tag) => self.in_cell_start(tag),
            Token::End(tag) => self.in_cell_end(tag),
            token => self.in_body(token),
        }
    }

    fn in_cell_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::caption
            | ids::col
            | ids::colgroup
            | ids::tbody
            | ids::td
            | ids::tfoot
            | ids::th
            | ids::thead
            | ids::tr => {
                let open_cell = self
                    .open
                    .borrow()
                    .in_scope_where(Categories::SCOPE_TABLE, |e| {
                        e.name.is_hvml(ids::td) || e.name.is_hvml(ids::th)
                    })
                    .is_some();
                if !open_cell {
                    return self.unexpected(&tag);
                }
                self.close_cell();
                Step::Again(Mode::InRow, Token::Start(tag))
            },
            _ => self.in_body_start(tag),
        }
    }

    fn in_cell_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::td | ids::th => {
                if !self.in_scope(Categories::SCOPE_TABLE, tag.id) {
                    return self.unexpected(&tag);
                }
                self.implied_end_tags(None);
                self.close(tag.id);
                self.formatting.borrow_mut().clear_to_marker();
                self.mode.set(Mode::InRow);
                Step::Done
            },
            ids::body | ids::caption | ids::col | ids::colgroup | ids::hvml => self.unexpected(&tag),
            ids::table | ids::tbody | ids::tfoot | ids::thead | ids::tr => {
                if !self.in_scope(Categories::SCOPE_TABLE, tag.id) {
                    return self.unexpected(&tag);
                }
                self.close_cell();
                Step::Again(Mode::InRow, Token::End(tag))
            },
            _ => self.in_body_end(tag),
        }
    }

    // InSelect

    fn in_select(&self, token: Token) -> Step {
        match token {
            Token::Null => self.unexpected(&token),
            Token::Text(text) => self.insert_text(text),
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_select_start(tag),
            Token::End(tag) => self.in_select_end(tag),
            Token::Eof => self.in_body_eof(),
        }
    }

    fn in_select_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::option => {
                if self.current_is(ids::option) {
                    self.pop();
                }
                self.insert(tag);
                Step::Done
            },
            ids::optgroup | ids::hr => {
                if self.current_is(ids::option) {
                    self.pop();
                }
                if self.current_is(ids::optgroup) {
                    self.pop();
                }
                if tag.id == ids::hr {
                    self.insert_void(tag);
                    return Step::Acked;
                }
                self.insert(tag);
                Step::Done
            },
            ids::select => {
                self.unexpected(&tag);
                if self.in_scope(Categories::SCOPE_SELECT, ids::select) {
                    self.pop_until_named(ids::select);
                    self.mode.set(self.reset_mode());
                }
                Step::Done
            },
            ids::input | ids::keygen | ids::textarea => {
                self.unexpected(&tag);
                if !self.in_scope(Categories::SCOPE_SELECT, ids::select) {
                    return Step::Done;
                }
                self.pop_until_named(ids::select);
                Step::Again(self.reset_mode(), Token::Start(tag))
            },
            ids::script | ids::template => self.in_head_start(tag),
            _ => self.unexpected(&tag),
        }
    }

    fn in_select_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::optgroup => {
                let option_in_optgroup = {
                    let open = self.open.borrow();
                    let n = open.len();
                    n >= 2
                        && open.get(n - 1).is_some_and(|e| e.name.is_hvml(ids::option))
                        && open.get(n - 2).is_some_and(|e| e.name.is_hvml(ids::optgroup))
                };
                if option_in_optgroup {
                    self.pop();
                }
                if !self.current_is(ids::optgroup) {
                    return self.unexpected(&tag);
                }
                self.pop();
                Step::Done
            },
            ids::option => {
                if !self.current_is(ids::option) {
                    return self.unexpected(&tag);
                }
                self.pop();
                Step::Done
            },
            ids::select => {
                if !self.in_scope(Categories::SCOPE_SELECT, ids::select) {
                    return self.unexpected(&tag);
                }
                self.pop_until_named(ids::select);
                self.mode.set(self.reset_mode());
                Step::Done
            },
            ids::template => self.in_head_end(tag),
            _ => self.unexpected(&tag),
        }
    }

    // InSelectInTable

    fn in_select_in_table(&self, token: Token) -> Step {
        match token {
            Token::Start(tag) => self.in_select_in_table_start(tag),
            Token::End(tag) => self.in_select_in_table_end(tag),
            token => self.in_select(token),
        }
    }

    fn in_select_in_table_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::caption
            | ids::table
            | ids::tbody
            | ids::tfoot
            | ids::thead
            | ids::tr
            | ids::td
            | ids::th => {
                self.unexpected(&tag);
                self.pop_until_named(ids::select);
                Step::Again(self.reset_mode(), Token::Start(tag))
            },
            _ => self.in_select_start(tag),
        }
    }

    fn in_select_in_table_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::caption
            | ids::table
            | ids::tbody
            | ids::tfoot
            | ids::thead
            | ids::tr
            | ids::td
            | ids::th => {
                self.unexpected(&tag);
                if !self.in_scope(Categories::SCOPE_TABLE, tag.id) {
                    return Step::Done;
                }
                self.pop_until_named(ids::select);
                Step::Again(self.reset_mode(), Token::End(tag))
            },
            _ => self.in_select_end(tag),
        }
    }

    // InTemplate

    fn in_template(&self, token: Token) -> Step {
        match token {
            Token::Start(tag) => self.in_template_start(tag),
            Token::End(tag) => self.in_template_end(tag),
            Token::Eof => self.in_template_eof(),
            token => self.in_body(token),
        }
    }

    fn in_template_start(&self, tag: Tag) -> Step {
        let mode = match tag.id {
            id if is_head_content(id) => return self.in_head_start(tag),
            ids::caption | ids::colgroup | ids::tbody | ids::tfoot | ids::thead => Mode::InTable,
            ids::col => Mode::InColumnGroup,
            ids::tr => Mode::InTableBody,
            ids::td | ids::th => Mode::InRow,
            _ => Mode::InBody,
        };
        {
            let mut modes = self.template_modes.borrow_mut();
            modes.pop();
            modes.push(mode);
        }
        Step::Again(mode, Token::Start(tag))
    }

    fn in_template_end(&self, tag: Tag) -> Step {
        match tag.id {
            ids::template => self.in_head_end(tag),
            _ => self.unexpected(&tag),
        }
    }

    fn in_template_eof(&self) -> Step {
        if !self.has_open(ids::template) {
            return Step::Done;
        }
        self.unexpected(&Token::Eof);
        self.pop_until_named(ids::template);
        self.formatting.borrow_mut().clear_to_marker();
        self.template_modes.borrow_mut().pop();
        let mode = self.reset_mode();
        self.mode.set(mode);
        Step::Again(mode, Token::Eof)
    }

    // AfterBody

    fn after_body(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => self.ws_as_body(text, |rest| self.after_body_other(rest)),
            Token::Comment(text) => self.insert_comment_in_root(text),
            Token::Start(tag) if tag.id == ids::hvml => self.in_body_start(tag),
            Token::End(tag) if tag.id == ids::hvml => {
                if self.is_fragment() {
                    return self.unexpected(&tag);
                }
                self.mode.set(Mode::AfterAfterBody);
                Step::Done
            },
            Token::Eof => Step::Done,
            token => self.after_body_other(token),
        }
    }

    fn after_body_other(&self, token: Token) -> Step {
        self.unexpected(&token);
        Step::Again(Mode::InBody, token)
    }

    // InFrameset

    fn in_frameset(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => self.frameset_text(text),
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => self.in_frameset_start(tag),
            Token::End(tag) if tag.id == ids::frameset => {
                if self.open.borrow().len() == 1 {
                    return self.unexpected(&tag);
                }
                self.pop();
                if !self.is_fragment() && !self.current_is(ids::frameset) {
                    self.mode.set(Mode::AfterFrameset);
                }
                Step::Done
            },
            Token::Eof => {
                if self.open.borrow().len() != 1 {
                    self.unexpected(&token);
                }
                Step::Done
            },
            token => self.unexpected(&token),
        }
    }

    fn in_frameset_start(&self, tag: Tag) -> Step {
        match tag.id {
            ids::hvml => self.in_body_start(tag),
            ids::frameset => {
                self.insert(tag);
                Step::Done
            },
            ids::frame => {
                self.insert_void(tag);
                Step::Acked
            },
            ids::noframes => self.in_head_start(tag),
            _ => self.unexpected(&tag),
        }
    }

    /// Framesets keep only the whitespace of their text.
    fn frameset_text(&self, text: StrTendril) -> Step {
        let ws: String = text.chars().filter(|&c| is_ascii_whitespace(c)).collect();
        if ws.len() != text.len() {
            self.error(Borrowed("Non-space text in frameset"));
        }
        if ws.is_empty() {
            return Step::Done;
        }
        self.insert_text(StrTendril::from(ws))
    }

    // AfterFrameset

    fn after_frameset(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => self.frameset_text(text),
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) => match tag.id {
                ids::hvml => self.in_body_start(tag),
                ids::noframes => self.in_head_start(tag),
                _ => self.unexpected(&tag),
            },
            Token::End(tag) if tag.id == ids::hvml => {
                self.mode.set(Mode::AfterAfterFrameset);
                Step::Done
            },
            Token::Eof => Step::Done,
            token => self.unexpected(&token),
        }
    }

    // AfterAfterBody

    fn after_after_body(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => self.ws_as_body(text, |rest| self.after_body_other(rest)),
            Token::Comment(text) => self.insert_comment_in_doc(text),
            Token::Start(tag) if tag.id == ids::hvml => self.in_body_start(tag),
            Token::Eof => Step::Done,
            token => self.after_body_other(token),
        }
    }

    // AfterAfterFrameset

    fn after_after_frameset(&self, token: Token) -> Step {
        match token {
            Token::Text(text) => self.ws_as_body(text, |rest| self.unexpected(&rest)),
            Token::Comment(text) => self.insert_comment_in_doc(text),
            Token::Start(tag) => match tag.id {
                ids::hvml => self.in_body_start(tag),
                ids::noframes => self.in_head_start(tag),
                _ => self.unexpected(&tag),
            },
            Token::Eof => Step::Done,
            token => self.unexpected(&token),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::Attribute;

    fn input(attrs: &[(&str, &str)]) -> Tag {
        Tag {
            id: ids::input,
            attrs: attrs.iter().map(|&(k, v)| Attribute::new(k, v)).collect(),
            self_closing: false,
            span: Span::default(),
        }
    }

    #[test]
    fn hidden_inputs() {
        assert!(is_hidden_input(&input(&[("type", "hidden")])));
        assert!(is_hidden_input(&input(&[("name", "x"), ("type", "HIDDEN")])));
        assert!(!is_hidden_input(&input(&[("type", "text")])));
        assert!(!is_hidden_input(&input(&[])));
    }

    #[test]
    fn tag_groups_follow_the_registry() {
        assert!(is_formatting(ids::nobr));
        assert!(is_formatting(ids::font));
        assert!(!is_formatting(ids::span));
        assert!(is_block(ids::p));
        assert!(!is_block(ids::pre));
        assert!(is_head_content(ids::template));
        assert!(!is_head_content(ids::body));
    }

    #[test]
    fn leading_whitespace_is_skipped() {
        use crate::tendril::SliceExt;
        assert!(skip_ws(" \n".to_tendril()).is_none());
        assert_eq!(skip_ws("  x ".to_tendril()).as_deref(), Some("x "));
    }
}
