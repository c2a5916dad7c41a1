// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Placing nodes, and the stack algorithms the insertion modes share.

use std::borrow::Cow::Borrowed;

use log::trace;

use super::interface::{AppendNode, AppendText, ElemName, NodeOrText, TreeSink};
use super::stack::{has_implied_end, has_thorough_implied_end, Formatting, Open};
use super::types::{Mode, Step, Tag};
use super::TreeBuilder;
use crate::tag::{ids, Categories, Namespace, TagId};
use crate::tendril::StrTendril;
use crate::tokenizer::states::RawKind;
use crate::tokenizer::Span;

// Where a new node goes.
enum Place<Handle> {
    Append(Handle),
    /// Right before `table` when it has a parent, else last in `fallback`.
    BeforeTable { table: Handle, fallback: Handle },
}

// Where the adoption agency puts the new formatting element in the list.
enum Bookmark<Handle> {
    Replace(Handle),
    After(Handle),
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    pub(super) fn current_open(&self) -> Open<Handle> {
        self.open
            .borrow()
            .current()
            .cloned()
            .expect("no current element")
    }

    pub(super) fn current_is(&self, tag: TagId) -> bool {
        self.open.borrow().current_is(tag)
    }

    /// The context element stands in for the root of a fragment.
    pub(super) fn adjusted_current_name(&self) -> Option<ElemName> {
        let open = self.open.borrow();
        match (open.len(), &self.context) {
            (0, _) => None,
            (1, Some(ctx)) => Some(ctx.name),
            _ => open.current_name(),
        }
    }

    pub(super) fn in_scope(&self, boundary: Categories, tag: TagId) -> bool {
        self.open.borrow().in_scope(boundary, tag)
    }

    pub(super) fn has_open(&self, tag: TagId) -> bool {
        self.open.borrow().contains_hvml(tag)
    }

    fn open_index(&self, node: &Handle) -> Option<usize> {
        self.open
            .borrow()
            .rposition(|e| self.sink.same_node(&e.node, node))
    }

    fn formatting_index(&self, node: &Handle) -> Option<usize> {
        self.formatting
            .borrow()
            .position(|n| self.sink.same_node(n, node))
    }

    pub(super) fn push(&self, node: Handle, name: ElemName) {
        self.open.borrow_mut().push(node, name);
    }

    pub(super) fn pop(&self) -> Open<Handle> {
        let elem = self.open.borrow_mut().pop().expect("no current element");
        self.sink.pop(&elem.node);
        elem
    }

    /// Pop everything above the first `len` entries.
    pub(super) fn pop_to(&self, len: usize) {
        let gone = self.open.borrow_mut().cut(len);
        for elem in gone {
            self.sink.pop(&elem.node);
        }
    }

    fn remove_open_at(&self, index: usize) {
        let elem = self.open.borrow_mut().remove(index);
        self.sink.pop(&elem.node);
    }

    pub(super) fn remove_open(&self, node: &Handle) {
        if let Some(index) = self.open_index(node) {
            self.remove_open_at(index);
        }
    }

    /// Pop up to and including the innermost element satisfying `pred`.
    /// Returns how many elements went.
    pub(super) fn pop_until<P>(&self, pred: P) -> usize
    where
        P: Fn(ElemName) -> bool,
    {
        let (len, index) = {
            let open = self.open.borrow();
            (open.len(), open.rposition(|e| pred(e.name)).unwrap_or(0))
        };
        self.pop_to(index);
        len - index
    }

    pub(super) fn pop_until_named(&self, tag: TagId) -> usize {
        self.pop_until(|name| name.is_hvml(tag))
    }

    /// Pop until `tag` is gone, complaining when it was not current.
    pub(super) fn close(&self, tag: TagId) {
        if self.pop_until_named(tag) != 1 {
            self.error(format_if!(
                self.opts.exact_errors,
                "Unexpected open element",
                "Unexpected open element while closing {:?}",
                tag
            ));
        }
    }

    /// Pop until the current node satisfies `pred`.
    fn pop_while_current_not<P>(&self, pred: P)
    where
        P: Fn(ElemName) -> bool,
    {
        while self.open.borrow().current_name().is_some_and(|n| !pred(n)) {
            self.pop();
        }
    }

    pub(super) fn clear_to_table_context(&self) {
        self.pop_while_current_not(|n| n.ns == Namespace::Hvml && n.has(Categories::SCOPE_TABLE));
    }

    pub(super) fn clear_to_table_body_context(&self) {
        self.pop_while_current_not(|n| {
            n.ns == Namespace::Hvml
                && matches!(
                    n.tag,
                    ids::tbody | ids::tfoot | ids::thead | ids::template | ids::hvml
                )
        });
    }

    pub(super) fn clear_to_row_context(&self) {
        self.pop_while_current_not(|n| {
            n.ns == Namespace::Hvml && matches!(n.tag, ids::tr | ids::template | ids::hvml)
        });
    }

    /// Pop elements with optional end tags, keeping `except`.
    pub(super) fn implied_end_tags(&self, except: Option<TagId>) {
        self.pop_while_current_not(|n| {
            !has_implied_end(n) || except.is_some_and(|tag| n.is_hvml(tag))
        });
    }

    pub(super) fn thorough_implied_end_tags(&self) {
        self.pop_while_current_not(|n| !has_thorough_implied_end(n));
    }

    pub(super) fn close_p(&self) {
        self.implied_end_tags(Some(ids::p));
        self.close(ids::p);
    }

    pub(super) fn close_p_in_button_scope(&self) {
        if self.in_scope(Categories::SCOPE_BUTTON, ids::p) {
            self.close_p();
        }
    }

    pub(super) fn close_cell(&self) {
        self.implied_end_tags(None);
        if self.pop_until(|n| n.is_hvml(ids::td) || n.is_hvml(ids::th)) != 1 {
            self.error(Borrowed("expected to close <td> or <th> with cell"));
        }
        self.formatting.borrow_mut().clear_to_marker();
    }

    /// Pick the insertion mode from the stack of open elements.
    pub(super) fn reset_mode(&self) -> Mode {
        let open = self.open.borrow();
        for (i, elem) in open.iter().enumerate().rev() {
            let last = i == 0;
            let name = match self.context {
                Some(ref ctx) if last => ctx.name,
                _ => elem.name,
            };
            if name.ns != Namespace::Hvml {
                continue;
            }
            match name.tag {
                ids::select => {
                    for ancestor in open.iter().take(i).rev() {
                        if ancestor.name.is_hvml(ids::template) {
                            break;
                        }
                        if ancestor.name.is_hvml(ids::table) {
                            return Mode::InSelectInTable;
                        }
                    }
                    return Mode::InSelect;
                },
                ids::td | ids::th if !last => return Mode::InCell,
                ids::tr => return Mode::InRow,
                ids::tbody | ids::thead | ids::tfoot => return Mode::InTableBody,
                ids::caption => return Mode::InCaption,
                ids::colgroup => return Mode::InColumnGroup,
                ids::table => return Mode::InTable,
                ids::template => {
                    let modes = self.template_modes.borrow();
                    return modes.last().copied().unwrap_or(Mode::InTemplate);
                },
                ids::head if !last => return Mode::InHead,
                ids::body => return Mode::InBody,
                ids::frameset => return Mode::InFrameset,
                ids::hvml if self.head.borrow().is_none() => return Mode::BeforeHead,
                ids::hvml => return Mode::AfterHead,
                _ => (),
            }
        }
        Mode::InBody
    }

    fn place(&self, target: Option<Open<Handle>>) -> Place<Handle> {
        let target = target.unwrap_or_else(|| self.current_open());
        let fosters = self.foster_parenting.get()
            && target.name.ns == Namespace::Hvml
            && matches!(
                target.name.tag,
                ids::table | ids::tbody | ids::tfoot | ids::thead | ids::tr
            );
        if !fosters {
            return Place::Append(target.node);
        }

        let open = self.open.borrow();
        for (i, elem) in open.iter().enumerate().rev() {
            if elem.name.is_hvml(ids::template) {
                return Place::Append(elem.node.clone());
            }
            if elem.name.is_hvml(ids::table) {
                return match i.checked_sub(1).and_then(|below| open.get(below)) {
                    Some(below) => Place::BeforeTable {
                        table: elem.node.clone(),
                        fallback: below.node.clone(),
                    },
                    None => Place::Append(elem.node.clone()),
                };
            }
        }
        Place::Append(open.get(0).map_or(target.node, |root| root.node.clone()))
    }

    fn insert_at(&self, place: Place<Handle>, child: NodeOrText<Handle>) {
        match place {
            Place::Append(parent) => self.sink.append(&parent, child),
            Place::BeforeTable { table, fallback } => {
                trace!("foster parenting");
                self.sink.append_based_on_parent_node(&table, &fallback, child)
            },
        }
    }

    pub(super) fn insert_text(&self, text: StrTendril) -> Step {
        let place = self.place(None);
        self.insert_at(place, AppendText(text));
        Step::Done
    }

    pub(super) fn insert_comment(&self, text: StrTendril) -> Step {
        let comment = self.sink.create_comment(text);
        let place = self.place(None);
        self.insert_at(place, AppendNode(comment));
        Step::Done
    }

    pub(super) fn insert_comment_in_doc(&self, text: StrTendril) -> Step {
        let comment = self.sink.create_comment(text);
        self.sink.append(&self.doc_handle, AppendNode(comment));
        Step::Done
    }

    pub(super) fn insert_comment_in_root(&self, text: StrTendril) -> Step {
        let root = self.open.borrow().get(0).map(|e| e.node.clone());
        let comment = self.sink.create_comment(text);
        let parent = root.unwrap_or_else(|| self.doc_handle.clone());
        self.sink.append(&parent, AppendNode(comment));
        Step::Done
    }

    fn create_for(&self, name: ElemName, tag: Tag) -> Handle {
        let node = self.sink.create_element(name, tag.attrs, tag.span);
        if tag.self_closing {
            self.sink.mark_self_closing(&node);
        }
        node
    }

    pub(super) fn insert_root(&self, tag: Tag) {
        let name = ElemName::hvml(ids::hvml);
        let node = self.create_for(name, tag);
        self.push(node.clone(), name);
        self.sink.append(&self.doc_handle, AppendNode(node));
    }

    /// Create an element for `tag` in `ns` and place it. With `push` it
    /// also becomes the current node.
    pub(super) fn insert_element(&self, ns: Namespace, tag: Tag, push: bool) -> Handle {
        let name = ElemName::new(tag.id, ns);
        let node = self.create_for(name, tag);
        let place = self.place(None);
        self.insert_at(place, AppendNode(node.clone()));
        if push {
            self.push(node.clone(), name);
        }
        node
    }

    pub(super) fn insert(&self, tag: Tag) -> Handle {
        self.insert_element(Namespace::Hvml, tag, true)
    }

    /// Insert an element that is closed right away.
    pub(super) fn insert_void(&self, tag: Tag) -> Handle {
        self.insert_element(Namespace::Hvml, tag, false)
    }

    /// Insert an element the markup implies but never wrote. Its span is
    /// empty.
    pub(super) fn insert_implied(&self, id: TagId) -> Handle {
        let at = self.current_span.get().begin;
        self.insert(Tag::implied(id, Span::new(at, at)))
    }

    pub(super) fn enter_text_mode(&self, kind: RawKind) -> Step {
        self.orig_mode.set(Some(self.mode.get()));
        self.mode.set(Mode::Text);
        Step::Raw(kind)
    }

    /// Insert `tag` and read its content as raw text of `kind`.
    pub(super) fn insert_raw(&self, tag: Tag, kind: RawKind) -> Step {
        self.insert(tag);
        self.enter_text_mode(kind)
    }

    pub(super) fn body(&self) -> Option<Handle> {
        let open = self.open.borrow();
        open.get(1)
            .filter(|e| e.name.is_hvml(ids::body))
            .map(|e| e.node.clone())
    }

    /// Complain about elements still open at the end of the body that
    /// should have been closed.
    pub(super) fn check_body_end(&self) {
        let stray = self.open.borrow().iter().map(|e| e.name).find(|&name| {
            let may_stay = name.ns == Namespace::Hvml
                && (matches!(name.tag, ids::body | ids::hvml)
                    || (has_thorough_implied_end(name)
                        && !matches!(name.tag, ids::caption | ids::colgroup)));
            !may_stay
        });
        if let Some(name) = stray {
            self.error(format_if!(
                self.opts.exact_errors,
                "Unexpected open tag at end of body",
                "Unexpected open tag {:?} at end of body",
                name
            ));
        }
    }

    /// Reopen formatting elements that were closed implicitly.
    pub(super) fn reconstruct_formatting(&self) {
        let first = {
            let list = self.formatting.borrow();
            let mut first = list.len();
            while first > 0 {
                match list.get(first - 1) {
                    Some(Formatting::Element(node, _)) if self.open_index(node).is_none() => {
                        first -= 1
                    },
                    _ => break,
                }
            }
            first
        };

        let len = self.formatting.borrow().len();
        for index in first..len {
            let tag = match self.formatting.borrow().get(index) {
                Some(Formatting::Element(_, tag)) => tag.clone(),
                _ => continue,
            };
            let node = self.insert(Tag {
                self_closing: false,
                ..tag.clone()
            });
            self.formatting.borrow_mut().set(index, node, tag);
        }
    }

    pub(super) fn insert_formatting(&self, tag: Tag) {
        self.formatting.borrow_mut().make_room_for(&tag);
        let node = self.insert(tag.clone());
        self.formatting.borrow_mut().push(node, tag);
    }

    /// An `<a>` start tag while another `a` is active closes that one.
    pub(super) fn close_open_anchor(&self, tag: &Tag) {
        let anchor = self
            .formatting
            .borrow()
            .since_marker()
            .find(|(_, _, t)| t.id == ids::a)
            .map(|(_, node, _)| node.clone());
        let Some(anchor) = anchor else {
            return;
        };

        self.unexpected(tag);
        self.adoption_agency(ids::a);
        if let Some(index) = self.formatting_index(&anchor) {
            self.formatting.borrow_mut().remove(index);
        }
        self.remove_open(&anchor);
    }

    /// Close the formatting element `subject`, repairing misnested markup
    /// around it.
    pub(super) fn adoption_agency(&self, subject: TagId) {
        let current = self.current_open();
        if current.name.is_hvml(subject) && self.formatting_index(&current.node).is_none() {
            self.pop();
            return;
        }

        for _ in 0..8 {
            let found = self
                .formatting
                .borrow()
                .since_marker()
                .find(|(_, _, tag)| tag.id == subject)
                .map(|(i, node, tag)| (i, node.clone(), tag.clone()));
            let Some((fmt_index, fmt_node, fmt_tag)) = found else {
                return self.any_other_end_tag(Tag::implied(subject, self.current_span.get()));
            };

            let Some(fmt_depth) = self.open_index(&fmt_node) else {
                self.error(Borrowed("Formatting element not open"));
                self.formatting.borrow_mut().remove(fmt_index);
                return;
            };

            let in_scope = self
                .open
                .borrow()
                .in_scope_where(Categories::SCOPE, |e| self.sink.same_node(&e.node, &fmt_node))
                .is_some();
            if !in_scope {
                self.error(Borrowed("Formatting element not in scope"));
                return;
            }
            if !self.sink.same_node(&self.current_open().node, &fmt_node) {
                self.error(Borrowed("Formatting element not current node"));
            }

            let furthest = self
                .open
                .borrow()
                .iter()
                .enumerate()
                .skip(fmt_depth + 1)
                .find(|(_, e)| e.name.has(Categories::SPECIAL))
                .map(|(i, e)| (i, e.node.clone()));
            let Some((furthest_depth, furthest_block)) = furthest else {
                self.pop_to(fmt_depth);
                self.formatting.borrow_mut().remove(fmt_index);
                return;
            };

            let common_ancestor = self
                .open
                .borrow()
                .get(fmt_depth - 1)
                .cloned()
                .expect("formatting element at the bottom of the stack");

            let mut bookmark = Bookmark::Replace(fmt_node.clone());
            let mut depth = furthest_depth;
            let mut last_node = furthest_block.clone();
            let mut round = 0;
            loop {
                round += 1;
                depth -= 1;
                let node = self
                    .open
                    .borrow()
                    .get(depth)
                    .map(|e| e.node.clone())
                    .expect("adoption walked off the stack");
                if self.sink.same_node(&node, &fmt_node) {
                    break;
                }

                let listed = self.formatting_index(&node);
                if round > 3 {
                    if let Some(index) = listed {
                        self.formatting.borrow_mut().remove(index);
                    }
                    self.remove_open_at(depth);
                    continue;
                }
                let Some(listed) = listed else {
                    self.remove_open_at(depth);
                    continue;
                };

                let tag = match self.formatting.borrow().get(listed) {
                    Some(Formatting::Element(_, tag)) => tag.clone(),
                    _ => panic!("formatting entry is a marker"),
                };
                let copy = self
                    .sink
                    .create_element(ElemName::hvml(tag.id), tag.attrs.clone(), tag.span);
                self.open.borrow_mut().replace(depth, copy.clone());
                self.formatting.borrow_mut().set(listed, copy.clone(), tag);

                if self.sink.same_node(&last_node, &furthest_block) {
                    bookmark = Bookmark::After(copy.clone());
                }
                self.sink.remove_from_parent(&last_node);
                self.sink.append(&copy, AppendNode(last_node.clone()));
                last_node = copy;
            }

            self.sink.remove_from_parent(&last_node);
            let place = self.place(Some(common_ancestor));
            self.insert_at(place, AppendNode(last_node));

            let name = ElemName::hvml(fmt_tag.id);
            let elem = self
                .sink
                .create_element(name, fmt_tag.attrs.clone(), fmt_tag.span);
            self.sink.reparent_children(&furthest_block, &elem);
            self.sink.append(&furthest_block, AppendNode(elem.clone()));

            match bookmark {
                Bookmark::Replace(old) => {
                    let index = self.formatting_index(&old).expect("bookmark left the list");
                    self.formatting.borrow_mut().set(index, elem.clone(), fmt_tag);
                },
                Bookmark::After(prev) => {
                    let index = self.formatting_index(&prev).expect("bookmark left the list");
                    self.formatting
                        .borrow_mut()
                        .insert(index + 1, elem.clone(), fmt_tag);
                    let old = self
                        .formatting_index(&fmt_node)
                        .expect("formatting element left the list");
                    self.formatting.borrow_mut().remove(old);
                },
            }

            self.remove_open(&fmt_node);
            let at = self
                .open_index(&furthest_block)
                .expect("furthest block left the stack");
            self.open.borrow_mut().insert(at + 1, elem, name);
        }
    }

    /// Close the innermost open `tag`, unless a special element comes
    /// first.
    pub(super) fn any_other_end_tag(&self, tag: Tag) {
        let mut target = None;
        for (i, elem) in self.open.borrow().iter().enumerate().rev() {
            if elem.name.is_hvml(tag.id) {
                target = Some(Ok(i));
                break;
            }
            if elem.name.has(Categories::SPECIAL) {
                target = Some(Err(()));
                break;
            }
        }

        let index = match target {
            Some(Ok(index)) => index,
            Some(Err(())) => {
                self.error(Borrowed("Found special tag while closing generic tag"));
                return;
            },
            // The root is special, so this only happens on an empty stack.
            None => {
                self.unexpected(&tag);
                return;
            },
        };

        self.implied_end_tags(Some(tag.id));
        if index + 1 != self.open.borrow().len() {
            self.unexpected(&tag);
        }
        self.pop_to(index);
    }
}
