// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stack of open elements and the list of active formatting elements.
//!
//! Each open element carries its name, so scope walks read the registry
//! categories directly and never ask the sink what a node is.

use std::slice;

use super::interface::ElemName;
use super::types::Tag;
use crate::tag::{ids, Categories, Namespace, TagId};

/// An element on the stack of open elements.
#[derive(Clone, Debug)]
pub(crate) struct Open<Handle> {
    pub node: Handle,
    pub name: ElemName,
}

pub(crate) struct OpenElems<Handle> {
    elems: Vec<Open<Handle>>,
}

impl<Handle: Clone> OpenElems<Handle> {
    pub fn new() -> Self {
        OpenElems { elems: vec![] }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn push(&mut self, node: Handle, name: ElemName) {
        self.elems.push(Open { node, name });
    }

    pub fn pop(&mut self) -> Option<Open<Handle>> {
        self.elems.pop()
    }

    /// Cut the stack down to `len` entries, returning the removed ones
    /// innermost first.
    pub fn cut(&mut self, len: usize) -> Vec<Open<Handle>> {
        let mut gone = self.elems.split_off(len.min(self.elems.len()));
        gone.reverse();
        gone
    }

    pub fn remove(&mut self, index: usize) -> Open<Handle> {
        self.elems.remove(index)
    }

    pub fn insert(&mut self, index: usize, node: Handle, name: ElemName) {
        self.elems.insert(index, Open { node, name });
    }

    /// Put another node in place of the one at `index`, keeping its name.
    pub fn replace(&mut self, index: usize, node: Handle) {
        self.elems[index].node = node;
    }

    pub fn get(&self, index: usize) -> Option<&Open<Handle>> {
        self.elems.get(index)
    }

    pub fn current(&self) -> Option<&Open<Handle>> {
        self.elems.last()
    }

    pub fn current_name(&self) -> Option<ElemName> {
        self.elems.last().map(|e| e.name)
    }

    /// Is the current node the primary namespace element `tag`?
    pub fn current_is(&self, tag: TagId) -> bool {
        self.current_name().is_some_and(|n| n.is_hvml(tag))
    }

    pub fn iter(&self) -> slice::Iter<'_, Open<Handle>> {
        self.elems.iter()
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.elems.iter().map(|e| e.node.clone())
    }

    /// Innermost entry satisfying `pred`.
    pub fn rposition<P>(&self, pred: P) -> Option<usize>
    where
        P: Fn(&Open<Handle>) -> bool,
    {
        self.elems.iter().rposition(pred)
    }

    pub fn rposition_hvml(&self, tag: TagId) -> Option<usize> {
        self.rposition(|e| e.name.is_hvml(tag))
    }

    pub fn contains_hvml(&self, tag: TagId) -> bool {
        self.rposition_hvml(tag).is_some()
    }

    /// Index of the innermost entry satisfying `wanted`, provided no
    /// element in `boundary` sits above it.
    pub fn in_scope_where<P>(&self, boundary: Categories, wanted: P) -> Option<usize>
    where
        P: Fn(&Open<Handle>) -> bool,
    {
        for (i, elem) in self.elems.iter().enumerate().rev() {
            if wanted(elem) {
                return Some(i);
            }
            if elem.name.has(boundary) {
                return None;
            }
        }
        None
    }

    pub fn in_scope(&self, boundary: Categories, tag: TagId) -> bool {
        self.in_scope_where(boundary, |e| e.name.is_hvml(tag)).is_some()
    }
}

/// An entry of the list of active formatting elements.
pub(crate) enum Formatting<Handle> {
    Marker,
    Element(Handle, Tag),
}

pub(crate) struct ActiveFormatting<Handle> {
    entries: Vec<Formatting<Handle>>,
}

impl<Handle: Clone> ActiveFormatting<Handle> {
    pub fn new() -> Self {
        ActiveFormatting { entries: vec![] }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&Formatting<Handle>> {
        self.entries.get(index)
    }

    pub fn push_marker(&mut self) {
        self.entries.push(Formatting::Marker);
    }

    pub fn push(&mut self, node: Handle, tag: Tag) {
        self.entries.push(Formatting::Element(node, tag));
    }

    pub fn insert(&mut self, index: usize, node: Handle, tag: Tag) {
        self.entries.insert(index, Formatting::Element(node, tag));
    }

    pub fn set(&mut self, index: usize, node: Handle, tag: Tag) {
        self.entries[index] = Formatting::Element(node, tag);
    }

    pub fn remove(&mut self, index: usize) {
        self.entries.remove(index);
    }

    /// Drop entries up to and including the last marker.
    pub fn clear_to_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if let Formatting::Marker = entry {
                break;
            }
        }
    }

    /// Elements after the last marker, innermost first, with their index.
    pub fn since_marker(&self) -> impl Iterator<Item = (usize, &Handle, &Tag)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .map_while(|(i, entry)| match entry {
                Formatting::Marker => None,
                Formatting::Element(node, tag) => Some((i, node, tag)),
            })
    }

    pub fn position<P>(&self, is_node: P) -> Option<usize>
    where
        P: Fn(&Handle) -> bool,
    {
        self.entries.iter().position(|entry| match entry {
            Formatting::Marker => false,
            Formatting::Element(node, _) => is_node(node),
        })
    }

    /// Keep at most three entries equal to `tag` after the last marker,
    /// so a fourth can be added.
    pub fn make_room_for(&mut self, tag: &Tag) {
        let same: Vec<usize> = self
            .since_marker()
            .filter(|(_, _, old)| old.same_as(tag))
            .map(|(i, _, _)| i)
            .collect();
        if same.len() >= 3 {
            // `same` runs innermost first; drop the earliest one.
            if let Some(&oldest) = same.last() {
                self.entries.remove(oldest);
            }
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            Formatting::Marker => None,
            Formatting::Element(node, _) => Some(node.clone()),
        })
    }
}

pub(crate) fn is_heading(name: ElemName) -> bool {
    name.ns == Namespace::Hvml
        && matches!(
            name.tag,
            ids::h1 | ids::h2 | ids::h3 | ids::h4 | ids::h5 | ids::h6
        )
}

/// Elements closed by the generic implied end tag step.
pub(crate) fn has_implied_end(name: ElemName) -> bool {
    name.ns == Namespace::Hvml
        && matches!(
            name.tag,
            ids::dd
                | ids::dt
                | ids::li
                | ids::option
                | ids::optgroup
                | ids::p
                | ids::rb
                | ids::rp
                | ids::rt
                | ids::rtc
        )
}

/// Elements closed when a template ends.
pub(crate) fn has_thorough_implied_end(name: ElemName) -> bool {
    has_implied_end(name)
        || (name.ns == Namespace::Hvml
            && matches!(
                name.tag,
                ids::caption
                    | ids::colgroup
                    | ids::tbody
                    | ids::td
                    | ids::tfoot
                    | ids::th
                    | ids::thead
                    | ids::tr
            ))
}

/// MathML elements whose text is parsed as markup text.
pub(crate) fn is_mathml_text_point(name: ElemName) -> bool {
    name.ns == Namespace::MathMl
        && matches!(
            name.tag,
            ids::mi | ids::mo | ids::mn | ids::ms | ids::mtext
        )
}

/// SVG elements whose content is parsed as markup.
pub(crate) fn is_markup_point(name: ElemName) -> bool {
    name.ns == Namespace::Svg && matches!(name.tag, ids::foreignobject | ids::desc | ids::title)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::{Attribute, Span};

    fn stack(tags: &[(TagId, Namespace)]) -> OpenElems<usize> {
        let mut stack = OpenElems::new();
        for (i, &(tag, ns)) in tags.iter().enumerate() {
            stack.push(i, ElemName::new(tag, ns));
        }
        stack
    }

    fn hvml(tags: &[TagId]) -> OpenElems<usize> {
        let tags: Vec<_> = tags.iter().map(|&t| (t, Namespace::Hvml)).collect();
        stack(&tags)
    }

    #[test]
    fn scope_stops_at_boundaries() {
        let s = hvml(&[ids::hvml, ids::body, ids::p, ids::table, ids::tr, ids::td, ids::span]);
        assert!(s.in_scope(Categories::SCOPE, ids::td));
        assert!(!s.in_scope(Categories::SCOPE, ids::p));
        assert!(s.in_scope(Categories::SCOPE_TABLE, ids::tr));
        assert!(!s.in_scope(Categories::SCOPE_TABLE, ids::body));
        assert!(s.contains_hvml(ids::p));
    }

    #[test]
    fn list_and_button_scopes() {
        let s = hvml(&[ids::hvml, ids::body, ids::li, ids::ul, ids::div]);
        assert!(!s.in_scope(Categories::SCOPE_LIST_ITEM, ids::li));
        assert!(s.in_scope(Categories::SCOPE, ids::li));

        let s = hvml(&[ids::hvml, ids::body, ids::p, ids::button, ids::span]);
        assert!(!s.in_scope(Categories::SCOPE_BUTTON, ids::p));
    }

    #[test]
    fn select_scope_passes_options_only() {
        let s = hvml(&[ids::hvml, ids::body, ids::select, ids::optgroup, ids::option]);
        assert!(s.in_scope(Categories::SCOPE_SELECT, ids::select));

        let s = hvml(&[ids::hvml, ids::body, ids::select, ids::div]);
        assert!(!s.in_scope(Categories::SCOPE_SELECT, ids::select));
    }

    #[test]
    fn foreign_scope_boundaries() {
        let s = stack(&[
            (ids::hvml, Namespace::Hvml),
            (ids::p, Namespace::Hvml),
            (ids::svg, Namespace::Svg),
            (ids::foreignobject, Namespace::Svg),
        ]);
        assert!(!s.in_scope(Categories::SCOPE, ids::p));
        assert_eq!(s.current_name(), Some(ElemName::new(ids::foreignobject, Namespace::Svg)));
        assert!(!s.current_is(ids::foreignobject));
    }

    #[test]
    fn cut_returns_innermost_first() {
        let mut s = hvml(&[ids::hvml, ids::body, ids::div, ids::span]);
        let gone: Vec<usize> = s.cut(2).into_iter().map(|e| e.node).collect();
        assert_eq!(gone, vec![3, 2]);
        assert_eq!(s.len(), 2);
    }

    fn tag(id: TagId, value: &str) -> Tag {
        Tag {
            id,
            attrs: vec![Attribute::new("class", value)],
            self_closing: false,
            span: Span::default(),
        }
    }

    #[test]
    fn at_most_three_equal_entries() {
        let mut list = ActiveFormatting::new();
        for node in 0..3 {
            list.make_room_for(&tag(ids::b, "x"));
            list.push(node, tag(ids::b, "x"));
        }
        list.make_room_for(&tag(ids::b, "y"));
        list.push(3, tag(ids::b, "y"));
        list.make_room_for(&tag(ids::b, "x"));
        list.push(4, tag(ids::b, "x"));

        let nodes: Vec<usize> = list.handles().collect();
        assert_eq!(nodes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn markers_fence_the_list() {
        let mut list = ActiveFormatting::new();
        list.push(0, tag(ids::b, "x"));
        list.push_marker();
        list.push(1, tag(ids::i, "x"));
        let seen: Vec<usize> = list.since_marker().map(|(_, n, _)| *n).collect();
        assert_eq!(seen, vec![1]);

        list.clear_to_marker();
        assert_eq!(list.len(), 1);
        assert_eq!(list.position(|&n| n == 0), Some(0));
    }

    #[test]
    fn name_sets() {
        assert!(has_implied_end(ElemName::hvml(ids::p)));
        assert!(!has_implied_end(ElemName::hvml(ids::td)));
        assert!(has_thorough_implied_end(ElemName::hvml(ids::td)));
        assert!(!has_thorough_implied_end(ElemName::new(ids::td, Namespace::Svg)));
        assert!(is_heading(ElemName::hvml(ids::h3)));
        assert!(is_mathml_text_point(ElemName::new(ids::mi, Namespace::MathMl)));
        assert!(!is_mathml_text_point(ElemName::hvml(ids::mi)));
        assert!(is_markup_point(ElemName::new(ids::title, Namespace::Svg)));
        assert!(!is_markup_point(ElemName::hvml(ids::title)));
    }
}
