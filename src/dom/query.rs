// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Collecting nodes by tag or attribute.

use super::{Document, NodeData, NodeId};
use crate::tag::TagId;

/// How an attribute value is compared with a wanted value.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum AttrMatch {
    /// The whole value.
    Eq,
    /// One of the whitespace separated words of the value.
    Whitespace,
    /// A prefix of the value.
    Begin,
    /// A suffix of the value.
    End,
    /// Anywhere in the value.
    Contain,
    /// The whole value, or the part of it before a `-`.
    Hyphen,
}

impl AttrMatch {
    /// Does `value` match `wanted`? With `ignore_case`, ASCII letters
    /// compare case-insensitively.
    pub fn matches(self, value: &str, wanted: &str, ignore_case: bool) -> bool {
        let (v, w) = (value.as_bytes(), wanted.as_bytes());
        let eq = |a: &[u8], b: &[u8]| {
            if ignore_case {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        };

        match self {
            AttrMatch::Eq => eq(v, w),
            AttrMatch::Whitespace => v
                .split(u8::is_ascii_whitespace)
                .any(|word| !word.is_empty() && eq(word, w)),
            AttrMatch::Begin => v.len() >= w.len() && eq(&v[..w.len()], w),
            AttrMatch::End => v.len() >= w.len() && eq(&v[v.len() - w.len()..], w),
            AttrMatch::Contain => w.is_empty() || v.windows(w.len()).any(|part| eq(part, w)),
            AttrMatch::Hyphen => {
                eq(v, w) || (v.len() > w.len() && v[w.len()] == b'-' && eq(&v[..w.len()], w))
            },
        }
    }
}

/// Iterator over a node and everything below it, in document order.
pub struct Descendants<'a> {
    doc: &'a Document,
    scope: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = match self.doc.first_child(cur) {
            Some(child) => Some(child),
            None => {
                let mut node = cur;
                loop {
                    if node == self.scope {
                        break None;
                    }
                    if let Some(sibling) = self.doc.next_sibling(node) {
                        break Some(sibling);
                    }
                    match self.doc.parent(node) {
                        Some(parent) => node = parent,
                        None => break None,
                    }
                }
            },
        };
        Some(cur)
    }
}

impl Document {
    /// `scope` and every node below it, in document order.
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            scope,
            next: Some(scope).filter(|&id| self.is_live(id)),
        }
    }

    // The root element and its subtree, or nothing before there is a root.
    fn whole_tree(&self) -> Descendants<'_> {
        let root = self.hvml();
        Descendants {
            doc: self,
            scope: root.unwrap_or(self.root),
            next: root,
        }
    }

    /// Every element with tag `tag`, in any namespace, starting at the root
    /// element.
    pub fn get_nodes_by_tag_id(&self, tag: TagId) -> Vec<NodeId> {
        self.whole_tree().filter(|&id| self.tag(id) == Some(tag)).collect()
    }

    /// Every element with tag `tag` strictly below `scope`.
    pub fn get_nodes_by_tag_id_in(&self, scope: NodeId, tag: TagId) -> Vec<NodeId> {
        self.descendants(scope)
            .skip(1)
            .filter(|&id| self.tag(id) == Some(tag))
            .collect()
    }

    /// Like [`Document::get_nodes_by_tag_id`] with a tag name. A name the
    /// registry never saw matches nothing.
    pub fn get_nodes_by_name(&self, name: &str) -> Vec<NodeId> {
        match self.registry.get_by_name(name) {
            Some(tag) => self.get_nodes_by_tag_id(tag),
            None => vec![],
        }
    }

    pub fn get_nodes_by_name_in(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        match self.registry.get_by_name(name) {
            Some(tag) => self.get_nodes_by_tag_id_in(scope, tag),
            None => vec![],
        }
    }

    /// Elements in `scope` (the root element by default), `scope` included,
    /// that carry an attribute named `key`. Names compare ignoring ASCII case.
    pub fn get_nodes_by_attribute_key(&self, scope: Option<NodeId>, key: &str) -> Vec<NodeId> {
        self.filter_by_attrs(scope, |name, _| name.eq_ignore_ascii_case(key))
    }

    /// Elements in `scope` (the root element by default), `scope` included,
    /// with an attribute whose value matches `value` as `how` says.
    ///
    /// With a `key`, only attributes of that name are compared; without
    /// one, any attribute may match. Each element is reported once.
    pub fn get_nodes_by_attribute_value(
        &self,
        scope: Option<NodeId>,
        key: Option<&str>,
        value: &str,
        how: AttrMatch,
        ignore_case: bool,
    ) -> Vec<NodeId> {
        self.filter_by_attrs(scope, |name, attr_value| {
            key.map_or(true, |key| name.eq_ignore_ascii_case(key))
                && how.matches(attr_value, value, ignore_case)
        })
    }

    fn filter_by_attrs<F>(&self, scope: Option<NodeId>, pred: F) -> Vec<NodeId>
    where
        F: Fn(&str, &str) -> bool,
    {
        let nodes = match scope {
            Some(scope) => self.descendants(scope),
            None => self.whole_tree(),
        };
        nodes
            .filter(|&id| match self.data(id).as_deref() {
                Some(NodeData::Element { attrs, .. }) => {
                    attrs.iter().any(|attr| pred(&attr.name, &attr.value))
                },
                _ => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::AttrMatch::{self, *};

    fn check(how: AttrMatch, value: &str, wanted: &str) -> (bool, bool) {
        (how.matches(value, wanted, false), how.matches(value, wanted, true))
    }

    #[test]
    fn whole_value() {
        assert_eq!(check(Eq, "main", "main"), (true, true));
        assert_eq!(check(Eq, "Main", "main"), (false, true));
        assert_eq!(check(Eq, "main2", "main"), (false, false));
        assert_eq!(check(Eq, "", ""), (true, true));
    }

    #[test]
    fn words() {
        assert_eq!(check(Whitespace, "a  big\tRed\nbox", "red"), (false, true));
        assert_eq!(check(Whitespace, "a big red box", "red"), (true, true));
        assert_eq!(check(Whitespace, "reddish", "red"), (false, false));
        assert_eq!(check(Whitespace, "  ", ""), (false, false));
    }

    #[test]
    fn prefix_suffix_and_infix() {
        assert_eq!(check(Begin, "user-list", "USER"), (false, true));
        assert_eq!(check(Begin, "us", "user"), (false, false));
        assert_eq!(check(End, "user-list", "list"), (true, true));
        assert_eq!(check(End, "user-list", "LIST"), (false, true));
        assert_eq!(check(Contain, "user-list", "r-l"), (true, true));
        assert_eq!(check(Contain, "user-list", "R-L"), (false, true));
        assert_eq!(check(Contain, "user", "users"), (false, false));
        assert_eq!(check(Contain, "user", ""), (true, true));
    }

    #[test]
    fn hyphen_separated() {
        assert_eq!(check(Hyphen, "en", "en"), (true, true));
        assert_eq!(check(Hyphen, "en-US", "en"), (true, true));
        assert_eq!(check(Hyphen, "EN-us", "en"), (false, true));
        assert_eq!(check(Hyphen, "english", "en"), (false, false));
        assert_eq!(check(Hyphen, "e", "en"), (false, false));
    }

    #[test]
    fn multibyte_values_do_not_split_characters() {
        assert_eq!(check(Begin, "\u{e9}t\u{e9}", "\u{e9}"), (true, true));
        assert_eq!(check(End, "caf\u{e9}", "\u{e9}"), (true, true));
        assert_eq!(check(Contain, "caf\u{e9}", "f\u{e9}"), (true, true));
    }
}
