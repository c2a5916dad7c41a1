// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Building and rewriting a tree by hand.
//!
//! Every operation here checks its node ids first and reports a typed
//! [`Error`] instead of corrupting the links: stale ids, nodes that would
//! become their own ancestor, and nodes a running parse still holds are all
//! refused. Moving an attached node detaches it from its old place first,
//! firing the same hooks as the tree builder does.

use std::sync::Arc;

use log::{debug, trace};

use super::{Arena, Document, Node, NodeData, NodeId};
use crate::error::{Error, Result};
use crate::stringify::decode_char_refs;
use crate::tag::{ids, Namespace, TagId};
use crate::tendril::StrTendril;
use crate::tokenizer::Attribute;

// Where `insert_to_appropriate_place` puts a node.
enum Place {
    Append(NodeId),
    Before(NodeId),
}

impl Document {
    /// Create an unattached element without attributes.
    pub fn create_node(&self, tag: TagId, ns: Namespace) -> NodeId {
        self.alloc(
            NodeData::Element {
                tag,
                ns,
                attrs: vec![],
            },
            None,
        )
    }

    /// Create an unattached text node.
    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(StrTendril::from_slice(text)), None)
    }

    /// Link `node` as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, node: NodeId) -> Result<()> {
        self.check_link(parent, node)?;
        self.move_node(node, |arena| arena.append(parent, node));
        Ok(())
    }

    /// Link `node` as the previous sibling of `target`.
    pub fn insert_before(&self, target: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent_for_sibling(target, node)?;
        self.check_link(parent, node)?;
        self.move_node(node, |arena| arena.insert_before(target, node));
        Ok(())
    }

    /// Link `node` as the next sibling of `target`.
    pub fn insert_after(&self, target: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent_for_sibling(target, node)?;
        self.check_link(parent, node)?;
        self.move_node(node, |arena: &mut Arena| {
            match arena.get(target).and_then(|t| t.next) {
                Some(next) => arena.insert_before(next, node),
                None => arena.append(parent, node),
            }
        });
        Ok(())
    }

    /// Insert `node` where the tree builder would put content meant for
    /// `target`.
    ///
    /// Content aimed at a table part (`table`, `tbody`, `tfoot`, `thead` or
    /// `tr`) is foster parented: it lands right before the nearest enclosing
    /// table, or inside the nearest enclosing `template`. Anything else is
    /// appended to `target`.
    pub fn insert_to_appropriate_place(&self, target: NodeId, node: NodeId) -> Result<()> {
        if !self.is_live(target) {
            return Err(Error::StaleNode(target));
        }
        match self.appropriate_place(target) {
            Place::Append(parent) => self.append_child(parent, node),
            Place::Before(table) => self.insert_before(table, node),
        }
    }

    fn appropriate_place(&self, target: NodeId) -> Place {
        let foster_target = matches!(
            self.hvml_tag(target),
            Some(ids::table | ids::tbody | ids::tfoot | ids::thead | ids::tr)
        );
        if !foster_target {
            return Place::Append(target);
        }

        let mut cur = Some(target);
        while let Some(node) = cur {
            match self.hvml_tag(node) {
                Some(ids::template) => return Place::Append(node),
                Some(ids::table) => {
                    return match self.parent(node) {
                        Some(_) => Place::Before(node),
                        None => Place::Append(node),
                    }
                },
                _ => (),
            }
            cur = self.parent(node);
        }
        Place::Append(target)
    }

    fn hvml_tag(&self, id: NodeId) -> Option<TagId> {
        match *self.data(id)? {
            NodeData::Element {
                tag,
                ns: Namespace::Hvml,
                ..
            } => Some(tag),
            _ => None,
        }
    }

    fn parent_for_sibling(&self, target: NodeId, node: NodeId) -> Result<NodeId> {
        if !self.is_live(target) {
            return Err(Error::StaleNode(target));
        }
        if target == node {
            return Err(Error::BadInsertion(node));
        }
        self.parent(target).ok_or(Error::NotAttached(target))
    }

    // Can `node` become a child of `parent`?
    fn check_link(&self, parent: NodeId, node: NodeId) -> Result<()> {
        if !self.is_live(parent) {
            return Err(Error::StaleNode(parent));
        }
        if !self.is_live(node) {
            return Err(Error::StaleNode(node));
        }
        match self.data(parent).as_deref() {
            Some(NodeData::Document | NodeData::Element { .. }) => (),
            _ => return Err(Error::WrongNodeKind(parent)),
        }
        if node == self.root || matches!(self.data(node).as_deref(), Some(NodeData::Document)) {
            return Err(Error::BadInsertion(node));
        }

        {
            let arena = self.arena.borrow();
            let mut cur = Some(parent);
            while let Some(n) = cur {
                if n == node {
                    return Err(Error::BadInsertion(node));
                }
                cur = arena.parent(n);
            }
        }

        if self.parent(node).is_some() {
            self.check_not_held(node)?;
        }
        Ok(())
    }

    /// Replace the contents of a text or comment node.
    pub fn set_text(&self, id: NodeId, text: &str) -> Result<()> {
        self.replace_text(id, StrTendril::from_slice(text))
    }

    /// Like [`Document::set_text`], but character references in `text` are
    /// resolved first, as in the text of a document.
    pub fn set_text_with_char_refs(&self, id: NodeId, text: &str) -> Result<()> {
        self.replace_text(id, StrTendril::from_slice(&decode_char_refs(text, false)))
    }

    fn replace_text(&self, id: NodeId, text: StrTendril) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        let node = arena.get_mut(id).ok_or(Error::StaleNode(id))?;
        match node.data {
            NodeData::Text(ref mut old) | NodeData::Comment(ref mut old) => *old = text,
            _ => return Err(Error::WrongNodeKind(id)),
        }
        // The text no longer comes from the source.
        node.span = None;
        Ok(())
    }

    fn with_attrs<R>(&self, id: NodeId, f: impl FnOnce(&mut Vec<Attribute>) -> R) -> Result<R> {
        let mut arena = self.arena.borrow_mut();
        match arena.get_mut(id) {
            None => Err(Error::StaleNode(id)),
            Some(Node {
                data: NodeData::Element { attrs, .. },
                ..
            }) => Ok(f(attrs)),
            Some(_) => Err(Error::WrongNodeKind(id)),
        }
    }

    /// Append an attribute to an element. An attribute of the same name is
    /// not replaced.
    pub fn add_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<()> {
        trace!("adding attribute {name:?} to {id:?}");
        self.with_attrs(id, |attrs| attrs.push(Attribute::new(name, value)))
    }

    /// Remove the attribute at `index`, in source order.
    pub fn remove_attribute(&self, id: NodeId, index: usize) -> Result<Option<Attribute>> {
        self.with_attrs(id, |attrs| {
            if index < attrs.len() {
                Some(attrs.remove(index))
            } else {
                None
            }
        })
    }

    /// Remove the first attribute whose name matches `key`, ignoring ASCII
    /// case.
    pub fn remove_attribute_by_key(&self, id: NodeId, key: &str) -> Result<Option<Attribute>> {
        self.with_attrs(id, |attrs| {
            let index = attrs.iter().position(|a| (*a.name).eq_ignore_ascii_case(key))?;
            Some(attrs.remove(index))
        })
    }

    /// Copy a node of this document. The copy is unattached and carries no
    /// annotation. With `deep`, the whole subtree is copied.
    ///
    /// Copying the `Document` node copies its root element.
    pub fn clone_node(&self, id: NodeId, deep: bool) -> Result<NodeId> {
        self.import_node(self, id, deep)
    }

    /// Copy a node of `from` into this document, like
    /// [`Document::clone_node`]. Dynamic tags are registered again in this
    /// document's registry when the two registries differ.
    pub fn import_node(&self, from: &Document, id: NodeId, deep: bool) -> Result<NodeId> {
        let src = if id == from.root {
            from.hvml().ok_or(Error::WrongNodeKind(id))?
        } else {
            id
        };

        let root = self.copy_one(from, src)?;
        if !deep {
            return Ok(root);
        }

        let mut copied = 1;
        let mut pending = vec![(src, root)];
        while let Some((src_parent, parent)) = pending.pop() {
            let children: Vec<NodeId> = from.children(src_parent).collect();
            for child in children {
                let copy = self.copy_one(from, child)?;
                self.arena.borrow_mut().append(parent, copy);
                pending.push((child, copy));
                copied += 1;
            }
        }
        debug!("copied {copied} nodes from {src:?}");
        Ok(root)
    }

    fn copy_one(&self, from: &Document, id: NodeId) -> Result<NodeId> {
        let (mut data, span, self_closing) = {
            let arena = from.arena.borrow();
            let node = arena.get(id).ok_or(Error::StaleNode(id))?;
            (node.data.clone(), node.span, node.self_closing)
        };
        match data {
            NodeData::Document => return Err(Error::WrongNodeKind(id)),
            NodeData::Element { ref mut tag, .. } => *tag = self.translate_tag(from, *tag)?,
            _ => (),
        }

        let mut node = Node::new(data, span);
        node.self_closing = self_closing;
        Ok(self.arena.borrow_mut().alloc(node))
    }

    fn translate_tag(&self, from: &Document, tag: TagId) -> Result<TagId> {
        if tag.is_static() || Arc::ptr_eq(&self.registry, &from.registry) {
            return Ok(tag);
        }
        self.registry.add(&from.registry.name(tag))
    }

    /// Is this an element that never has content, like `<br>`?
    pub fn is_void_element(&self, id: NodeId) -> bool {
        matches!(
            self.hvml_tag(id),
            Some(
                ids::area
                    | ids::base
                    | ids::br
                    | ids::col
                    | ids::embed
                    | ids::hr
                    | ids::img
                    | ids::input
                    | ids::keygen
                    | ids::link
                    | ids::meta
                    | ids::param
                    | ids::source
                    | ids::track
                    | ids::wbr
            )
        )
    }

    /// Was the element written as a self-closing tag, like `<init/>`?
    pub fn is_self_closing(&self, id: NodeId) -> bool {
        self.arena.borrow().get(id).is_some_and(|n| n.self_closing)
    }
}
