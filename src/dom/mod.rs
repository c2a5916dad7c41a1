// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An arena-backed document tree.
//!
//! Every node lives in a slot of one arena owned by the [`Document`] and is
//! addressed by a [`NodeId`]: the slot index plus the generation of the slot
//! when the node was created. Destroying a node bumps the generation, so an
//! id that outlives its node is detected instead of silently aliasing a new
//! one.
//!
//! ```text
//! document
//!  +- hvml
//!      +- head
//!      +- body
//!          +- "text node"
//! ```
//!
//! The document is the default [`TreeSink`] of the tree builder. Links are
//! the usual parent / first child / last child / previous / next sibling
//! quintuple.
//!
//! Besides the read accessors here, [`edit`] holds the operations that build
//! and rewrite a tree by hand and [`query`] the collection lookups.

use std::any::Any;
use std::borrow::Cow;
use std::cell::{Cell, Ref, RefCell};
use std::cmp::{max, min};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::tag::{Namespace, TagId, TagRegistry};
use crate::tendril::StrTendril;
use crate::tokenizer::{Attribute, ParseError, Span};
use crate::tree_builder::{ElemName, NoQuirks, NodeOrText, QuirksMode, TreeSink};

pub mod edit;
pub mod query;

pub use self::query::{AttrMatch, Descendants};

/// A reference to a node of a [`Document`].
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// The different kinds of nodes in the tree.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Document` itself, the root of the tree.
    Document,

    /// A `DOCTYPE` with name, public id, and system id.
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },

    /// A text node.
    Text(StrTendril),

    /// A comment.
    Comment(StrTendril),

    /// An element with attributes.
    Element {
        tag: TagId,
        ns: Namespace,
        attrs: Vec<Attribute>,
    },
}

struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    first: Option<NodeId>,
    last: Option<NodeId>,
    span: Option<Span>,
    self_closing: bool,
    annotation: Option<Rc<dyn Any>>,
}

impl Node {
    fn new(data: NodeData, span: Option<Span>) -> Node {
        Node {
            data,
            parent: None,
            prev: None,
            next: None,
            first: None,
            last: None,
            span,
            self_closing: false,
            annotation: None,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            },
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            },
        }
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Unlink `child` from its parent and siblings. Returns the old parent.
    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let (parent, prev, next) = {
            let node = self.get_mut(child)?;
            (node.parent.take(), node.prev.take(), node.next.take())
        };
        let parent = parent?;

        match prev {
            Some(prev) => {
                if let Some(prev) = self.get_mut(prev) {
                    prev.next = next;
                }
            },
            None => {
                if let Some(parent) = self.get_mut(parent) {
                    parent.first = next;
                }
            },
        }
        match next {
            Some(next) => {
                if let Some(next) = self.get_mut(next) {
                    next.prev = prev;
                }
            },
            None => {
                if let Some(parent) = self.get_mut(parent) {
                    parent.last = prev;
                }
            },
        }
        Some(parent)
    }

    /// Link an unattached `child` as the last child of `parent`.
    fn append(&mut self, parent: NodeId, child: NodeId) {
        let Some(old_last) = self.get_mut(parent).map(|p| p.last.replace(child)) else {
            return;
        };
        match old_last {
            Some(last) => {
                if let Some(last) = self.get_mut(last) {
                    last.next = Some(child);
                }
            },
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first = Some(child);
                }
            },
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev = old_last;
            node.next = None;
        }
    }

    /// Link an unattached `child` right before `sibling`.
    fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        let Some((parent, prev)) = self.get(sibling).and_then(|s| s.parent.map(|p| (p, s.prev)))
        else {
            return;
        };
        match prev {
            Some(prev) => {
                if let Some(prev) = self.get_mut(prev) {
                    prev.next = Some(child);
                }
            },
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first = Some(child);
                }
            },
        }
        if let Some(s) = self.get_mut(sibling) {
            s.prev = Some(child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev = prev;
            node.next = Some(sibling);
        }
    }

    /// Append to the text node `id`, widening its span to cover `span`.
    /// Returns false if `id` is not a text node.
    fn merge_text(&mut self, id: Option<NodeId>, text: &StrTendril, span: Span) -> bool {
        let Some(node) = id.and_then(|id| self.get_mut(id)) else {
            return false;
        };
        match node.data {
            NodeData::Text(ref mut existing) => {
                existing.push_tendril(text);
                node.span = Some(match node.span {
                    Some(old) => Span::new(min(old.begin, span.begin), max(old.end, span.end)),
                    None => span,
                });
                true
            },
            _ => false,
        }
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut child = self.get(id).and_then(|n| n.first);
            while let Some(c) = child {
                stack.push(c);
                child = self.get(c).and_then(|n| n.next);
            }
        }
        out
    }
}

type NodeHook = Box<dyn FnMut(NodeId)>;
type ErrorHook = Box<dyn FnMut(&ParseError)>;

#[derive(Default)]
struct Hooks {
    on_node_insert: Option<NodeHook>,
    on_node_remove: Option<NodeHook>,
    on_parse_error: Option<ErrorHook>,
}

/// The document tree.
pub struct Document {
    arena: RefCell<Arena>,
    root: NodeId,
    registry: Arc<TagRegistry>,
    fragment: bool,
    quirks_mode: Cell<QuirksMode>,
    errors: RefCell<Vec<ParseError>>,
    current_line: Cell<u64>,
    current_span: Cell<Span>,
    hooks: RefCell<Hooks>,
    // Nodes an unfinished parse still points at.
    held: RefCell<Vec<NodeId>>,
}

impl Document {
    /// An empty document whose tag names resolve through `registry`.
    pub fn new(registry: Arc<TagRegistry>) -> Document {
        let mut arena = Arena::default();
        let root = arena.alloc(Node::new(NodeData::Document, None));
        Document {
            arena: RefCell::new(arena),
            root,
            registry,
            fragment: false,
            quirks_mode: Cell::new(NoQuirks),
            errors: RefCell::new(vec![]),
            current_line: Cell::new(1),
            current_span: Cell::new(Span::default()),
            hooks: RefCell::new(Hooks::default()),
            held: RefCell::new(vec![]),
        }
    }

    /// An empty document whose root element will hold a parsed fragment.
    pub fn new_fragment(registry: Arc<TagRegistry>) -> Document {
        Document {
            fragment: true,
            ..Document::new(registry)
        }
    }

    /// Called with every node linked into a parent.
    pub fn set_on_node_insert<F: FnMut(NodeId) + 'static>(&mut self, hook: F) {
        self.hooks.get_mut().on_node_insert = Some(Box::new(hook));
    }

    /// Called with every node unlinked from its parent.
    pub fn set_on_node_remove<F: FnMut(NodeId) + 'static>(&mut self, hook: F) {
        self.hooks.get_mut().on_node_remove = Some(Box::new(hook));
    }

    pub fn set_on_parse_error<F: FnMut(&ParseError) + 'static>(&mut self, hook: F) {
        self.hooks.get_mut().on_parse_error = Some(Box::new(hook));
    }

    pub(crate) fn set_hooks_from(
        &mut self,
        on_node_insert: Option<NodeHook>,
        on_node_remove: Option<NodeHook>,
        on_parse_error: Option<ErrorHook>,
    ) {
        let hooks = self.hooks.get_mut();
        hooks.on_node_insert = on_node_insert;
        hooks.on_node_remove = on_node_remove;
        hooks.on_parse_error = on_parse_error;
    }

    pub fn registry(&self) -> &Arc<TagRegistry> {
        &self.registry
    }

    /// The `Document` node.
    pub fn document(&self) -> NodeId {
        self.root
    }

    /// The root `<hvml>` element.
    pub fn hvml(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.tag(id).is_some())
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_named(self.hvml()?, crate::tag::ids::head)
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_named(self.hvml()?, crate::tag::ids::body)
    }

    /// The element holding the nodes of a parsed fragment.
    pub fn fragment(&self) -> Option<NodeId> {
        if self.fragment {
            self.hvml()
        } else {
            None
        }
    }

    fn child_named(&self, parent: NodeId, tag: TagId) -> Option<NodeId> {
        self.children(parent).find(|&id| {
            matches!(self.data(id).as_deref(), Some(NodeData::Element { tag: t, ns: Namespace::Hvml, .. }) if *t == tag)
        })
    }

    /// Does `id` still refer to a node of this document?
    pub fn is_live(&self, id: NodeId) -> bool {
        self.arena.borrow().get(id).is_some()
    }

    fn link(&self, id: NodeId, f: impl Fn(&Node) -> Option<NodeId>) -> Option<NodeId> {
        self.arena.borrow().get(id).and_then(f)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.first)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.last)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.next)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.prev)
    }

    /// Iterate over the children of `id`, first to last.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// The payload of a node, or `None` for a stale id.
    ///
    /// The returned guard must be dropped before the tree is mutated.
    pub fn data(&self, id: NodeId) -> Option<Ref<'_, NodeData>> {
        Ref::filter_map(self.arena.borrow(), |arena| arena.get(id).map(|n| &n.data)).ok()
    }

    /// The tag of an element.
    pub fn tag(&self, id: NodeId) -> Option<TagId> {
        match *self.data(id)? {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn namespace(&self, id: NodeId) -> Option<Namespace> {
        match *self.data(id)? {
            NodeData::Element { ns, .. } => Some(ns),
            _ => None,
        }
    }

    /// The contents of a text node.
    pub fn text(&self, id: NodeId) -> Option<StrTendril> {
        match *self.data(id)? {
            NodeData::Text(ref text) => Some(text.clone()),
            _ => None,
        }
    }

    /// The attributes of an element, in source order.
    pub fn attrs(&self, id: NodeId) -> Option<Ref<'_, [Attribute]>> {
        Ref::filter_map(self.data(id)?, |data| match data {
            NodeData::Element { attrs, .. } => Some(&attrs[..]),
            _ => None,
        })
        .ok()
    }

    /// The value of the attribute `name` with no namespace.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.attrs(id)?
            .iter()
            .find(|attr| attr.ns == Namespace::Undef && &*attr.name == name)
            .map(|attr| attr.value.clone())
    }

    /// The source of the token that created the node. Implied elements get
    /// an empty span; merged text nodes cover all their tokens.
    pub fn source_span(&self, id: NodeId) -> Option<Span> {
        self.arena.borrow().get(id).and_then(|n| n.span)
    }

    pub fn annotation(&self, id: NodeId) -> Option<Rc<dyn Any>> {
        self.arena.borrow().get(id).and_then(|n| n.annotation.clone())
    }

    /// Attach caller data to a node, replacing any previous annotation.
    pub fn set_annotation(&self, id: NodeId, annotation: Rc<dyn Any>) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        let node = arena.get_mut(id).ok_or(Error::StaleNode(id))?;
        node.annotation = Some(annotation);
        Ok(())
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode.get()
    }

    /// The `DOCTYPE` node, if the document had one.
    pub fn doctype(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| matches!(self.data(id).as_deref(), Some(NodeData::Doctype { .. })))
    }

    /// Every parse error reported so far, in order.
    pub fn errors(&self) -> Ref<'_, [ParseError]> {
        Ref::map(self.errors.borrow(), |errors| &errors[..])
    }

    pub fn tag_name(&self, tag: TagId) -> Cow<'static, str> {
        self.registry.name(tag)
    }

    /// Detach `id` and its subtree from the tree.
    ///
    /// The subtree stays allocated until the returned handle is destroyed.
    /// While a parse is unfinished, nodes the parser still points at (open
    /// elements and their ancestors, formatting elements, the head and form
    /// pointers) cannot be removed.
    pub fn remove(&self, id: NodeId) -> Result<Detached<'_>> {
        if !self.is_live(id) {
            return Err(Error::StaleNode(id));
        }
        if id == self.root || self.parent(id).is_none() {
            return Err(Error::NotAttached(id));
        }
        self.check_not_held(id)?;
        self.arena.borrow_mut().detach(id);
        self.fire_remove(id);
        Ok(Detached { doc: self, id })
    }

    /// Record the nodes an unfinished parse holds. An empty list releases
    /// them all.
    pub(crate) fn set_held(&self, nodes: Vec<NodeId>) {
        *self.held.borrow_mut() = nodes;
    }

    /// Is `id` one of the held nodes or an ancestor of one?
    pub fn is_held(&self, id: NodeId) -> bool {
        let held = self.held.borrow();
        if held.is_empty() {
            return false;
        }
        let arena = self.arena.borrow();
        held.iter().any(|&node| {
            let mut cur = Some(node);
            while let Some(n) = cur {
                if n == id {
                    return true;
                }
                cur = arena.parent(n);
            }
            false
        })
    }

    fn check_not_held(&self, id: NodeId) -> Result<()> {
        if self.is_held(id) {
            debug!("refusing to detach {:?}: the parser still holds it", id);
            return Err(Error::NodeInUse(id));
        }
        Ok(())
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let arena = self.arena.borrow();
        let mut cur = id;
        while let Some(parent) = arena.parent(cur) {
            cur = parent;
        }
        cur == self.root
    }

    fn fire_insert(&self, id: NodeId) {
        trace!("inserted {:?}", id);
        if let Some(hook) = self.hooks.borrow_mut().on_node_insert.as_mut() {
            hook(id);
        }
    }

    fn fire_remove(&self, id: NodeId) {
        trace!("removed {:?}", id);
        if let Some(hook) = self.hooks.borrow_mut().on_node_remove.as_mut() {
            hook(id);
        }
    }

    fn alloc(&self, data: NodeData, span: Option<Span>) -> NodeId {
        self.arena.borrow_mut().alloc(Node::new(data, span))
    }

    fn new_text(&self, text: StrTendril) -> NodeId {
        self.alloc(NodeData::Text(text), Some(self.current_span.get()))
    }

    // Move an existing node under a new parent.
    fn move_node(&self, id: NodeId, link: impl FnOnce(&mut Arena)) {
        let had_parent = self.arena.borrow_mut().detach(id).is_some();
        if had_parent {
            self.fire_remove(id);
        }
        link(&mut self.arena.borrow_mut());
        self.fire_insert(id);
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.borrow().slots.len())
            .field("fragment", &self.fragment)
            .field("quirks_mode", &self.quirks_mode.get())
            .field("errors", &self.errors.borrow().len())
            .finish()
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.next_sibling(id);
        Some(id)
    }
}

/// A subtree detached by [`Document::remove`].
#[must_use = "a detached subtree should be reattached or destroyed"]
pub struct Detached<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl Detached<'_> {
    /// The root of the detached subtree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Append the subtree as the last child of `parent`.
    pub fn reattach(self, parent: NodeId) -> Result<()> {
        if !self.doc.is_live(parent) {
            return Err(Error::StaleNode(parent));
        }
        if !self.doc.is_attached(parent) {
            return Err(Error::NotAttached(parent));
        }
        self.doc.arena.borrow_mut().append(parent, self.id);
        self.doc.fire_insert(self.id);
        Ok(())
    }

    /// Free every node of the subtree. Their ids become stale.
    pub fn destroy(self) {
        let mut arena = self.doc.arena.borrow_mut();
        let nodes = arena.subtree(self.id);
        debug!("destroying {} nodes", nodes.len());
        for id in nodes {
            arena.release(id);
        }
    }
}

impl TreeSink for Document {
    type Handle = NodeId;

    fn parse_error(&self, error: ParseError) {
        debug!("parse error at {}:{}: {}", error.line, error.offset, error.message);
        if let Some(hook) = self.hooks.borrow_mut().on_parse_error.as_mut() {
            hook(&error);
        }
        self.errors.borrow_mut().push(error);
    }

    fn get_document(&self) -> NodeId {
        self.root
    }

    fn create_element(&self, name: ElemName, attrs: Vec<Attribute>, span: Span) -> NodeId {
        self.alloc(
            NodeData::Element {
                tag: name.tag,
                ns: name.ns,
                attrs,
            },
            Some(span),
        )
    }

    fn create_comment(&self, text: StrTendril) -> NodeId {
        self.alloc(NodeData::Comment(text), Some(self.current_span.get()))
    }

    fn append(&self, parent: &NodeId, child: NodeOrText<NodeId>) {
        let parent = *parent;
        let child = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                let span = self.current_span.get();
                let mut arena = self.arena.borrow_mut();
                let last = arena.get(parent).and_then(|p| p.last);
                if arena.merge_text(last, &text, span) {
                    return;
                }
                drop(arena);
                self.new_text(text)
            },
        };
        self.move_node(child, |arena| arena.append(parent, child));
    }

    fn append_based_on_parent_node(
        &self,
        element: &NodeId,
        prev_element: &NodeId,
        child: NodeOrText<NodeId>,
    ) {
        if self.parent(*element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let doctype = self.alloc(
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            },
            Some(self.current_span.get()),
        );
        let root = self.root;
        self.move_node(doctype, |arena| arena.append(root, doctype));
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn append_before_sibling(&self, sibling: &NodeId, child: NodeOrText<NodeId>) {
        let sibling = *sibling;
        let child = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                let span = self.current_span.get();
                let mut arena = self.arena.borrow_mut();
                let prev = arena.get(sibling).and_then(|s| s.prev);
                if arena.merge_text(prev, &text, span) {
                    return;
                }
                drop(arena);
                self.new_text(text)
            },
        };
        self.move_node(child, |arena| arena.insert_before(sibling, child));
    }

    fn add_attrs_if_missing(&self, target: &NodeId, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        let Some(Node {
            data: NodeData::Element {
                attrs: existing,
                ..
            },
            ..
        }) = arena.get_mut(*target)
        else {
            warn!("dropping attributes for {:?}: not an element", target);
            return;
        };

        for attr in attrs {
            let present = existing
                .iter()
                .any(|e| e.ns == attr.ns && e.name == attr.name);
            if !present {
                existing.push(attr);
            }
        }
    }

    fn remove_from_parent(&self, target: &NodeId) {
        if self.arena.borrow_mut().detach(*target).is_some() {
            self.fire_remove(*target);
        }
    }

    fn reparent_children(&self, node: &NodeId, new_parent: &NodeId) {
        let children: Vec<NodeId> = self.children(*node).collect();
        for child in children {
            let new_parent = *new_parent;
            self.move_node(child, |arena| arena.append(new_parent, child));
        }
    }

    fn set_current_line(&self, line_number: u64) {
        self.current_line.set(line_number);
    }

    fn set_current_span(&self, span: Span) {
        self.current_span.set(span);
    }

    fn mark_self_closing(&self, target: &NodeId) {
        if let Some(node) = self.arena.borrow_mut().get_mut(*target) {
            node.self_closing = true;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tag::ids;
    use crate::tree_builder::{AppendNode, AppendText};

    fn doc() -> Document {
        Document::new(TagRegistry::shared())
    }

    fn elem(doc: &Document, tag: TagId) -> NodeId {
        doc.create_element(ElemName::hvml(tag), vec![], Span::new(0, 1))
    }

    fn text(s: &str) -> NodeOrText<NodeId> {
        AppendText(StrTendril::from_slice(s))
    }

    #[test]
    fn anchors() {
        let doc = doc();
        assert!(doc.hvml().is_none());
        let hvml = elem(&doc, ids::hvml);
        doc.append(&doc.document(), AppendNode(hvml));
        let head = elem(&doc, ids::head);
        let body = elem(&doc, ids::body);
        doc.append(&hvml, AppendNode(head));
        doc.append(&hvml, AppendNode(body));

        assert_eq!(doc.hvml(), Some(hvml));
        assert_eq!(doc.head(), Some(head));
        assert_eq!(doc.body(), Some(body));
        assert_eq!(doc.fragment(), None);
        assert_eq!(doc.parent(body), Some(hvml));
        assert_eq!(doc.prev_sibling(body), Some(head));
        assert_eq!(doc.next_sibling(head), Some(body));
        assert_eq!(doc.children(hvml).collect::<Vec<_>>(), vec![head, body]);
    }

    #[test]
    fn adjacent_text_is_merged() {
        let doc = doc();
        let p = elem(&doc, ids::p);
        doc.append(&doc.document(), AppendNode(p));
        doc.set_current_span(Span::new(3, 5));
        doc.append(&p, text("ab"));
        doc.set_current_span(Span::new(5, 6));
        doc.append(&p, text("c"));

        let only = doc.first_child(p).unwrap();
        assert_eq!(doc.last_child(p), Some(only));
        assert_eq!(&*doc.text(only).unwrap(), "abc");
        assert_eq!(doc.source_span(only), Some(Span::new(3, 6)));
    }

    #[test]
    fn text_merges_before_sibling() {
        let doc = doc();
        let p = elem(&doc, ids::p);
        let b = elem(&doc, ids::b);
        doc.append(&doc.document(), AppendNode(p));
        doc.append(&p, text("x"));
        doc.append(&p, AppendNode(b));
        doc.append_before_sibling(&b, text("y"));

        let kids: Vec<_> = doc.children(p).collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(&*doc.text(kids[0]).unwrap(), "xy");
    }

    #[test]
    fn appending_moves_an_attached_node() {
        let doc = doc();
        let a = elem(&doc, ids::div);
        let b = elem(&doc, ids::div);
        let c = elem(&doc, ids::span);
        doc.append(&doc.document(), AppendNode(a));
        doc.append(&a, AppendNode(b));
        doc.append(&a, AppendNode(c));
        doc.append(&b, AppendNode(c));

        assert_eq!(doc.children(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(doc.parent(c), Some(b));
    }

    #[test]
    fn remove_and_reattach() {
        let doc = doc();
        let a = elem(&doc, ids::div);
        let b = elem(&doc, ids::p);
        doc.append(&doc.document(), AppendNode(a));
        doc.append(&a, AppendNode(b));

        let detached = doc.remove(b).unwrap();
        assert_eq!(doc.first_child(a), None);
        assert_eq!(doc.remove(b).err(), Some(Error::NotAttached(b)));
        detached.reattach(doc.document()).unwrap();
        assert_eq!(doc.parent(b), Some(doc.document()));
    }

    #[test]
    fn removing_the_document_fails() {
        let doc = doc();
        assert_eq!(
            doc.remove(doc.document()).err(),
            Some(Error::NotAttached(doc.document()))
        );
    }

    #[test]
    fn reattach_into_detached_subtree_fails() {
        let doc = doc();
        let a = elem(&doc, ids::div);
        let b = elem(&doc, ids::p);
        doc.append(&doc.document(), AppendNode(a));
        doc.append(&a, AppendNode(b));
        let detached = doc.remove(a).unwrap();
        assert_eq!(detached.reattach(b), Err(Error::NotAttached(b)));
    }

    #[test]
    fn destroyed_ids_are_stale() {
        let doc = doc();
        let a = elem(&doc, ids::div);
        let b = elem(&doc, ids::p);
        doc.append(&doc.document(), AppendNode(a));
        doc.append(&a, AppendNode(b));

        doc.remove(a).unwrap().destroy();
        assert!(!doc.is_live(a));
        assert!(!doc.is_live(b));
        assert_eq!(doc.tag(b), None);
        assert_eq!(doc.remove(b).err(), Some(Error::StaleNode(b)));

        // The slot is reused under a new generation.
        let c = elem(&doc, ids::span);
        assert!(doc.is_live(c));
        assert_ne!(c, b);
        assert_eq!(doc.tag(c), Some(ids::span));
    }

    #[test]
    fn hooks_fire_on_link_changes() {
        let inserted = Rc::new(RefCell::new(vec![]));
        let removed = Rc::new(RefCell::new(vec![]));
        let mut doc = doc();
        let log = inserted.clone();
        doc.set_on_node_insert(move |id| log.borrow_mut().push(id));
        let log = removed.clone();
        doc.set_on_node_remove(move |id| log.borrow_mut().push(id));

        let a = elem(&doc, ids::div);
        let b = elem(&doc, ids::div);
        let c = elem(&doc, ids::span);
        doc.append(&doc.document(), AppendNode(a));
        doc.append(&doc.document(), AppendNode(b));
        doc.append(&a, AppendNode(c));
        doc.reparent_children(&a, &b);

        assert_eq!(*inserted.borrow(), vec![a, b, c, c]);
        assert_eq!(*removed.borrow(), vec![c]);
    }

    #[test]
    fn add_attrs_keeps_existing_values() {
        let doc = doc();
        let a = doc.create_element(
            ElemName::hvml(ids::hvml),
            vec![Attribute::new("lang", "en")],
            Span::default(),
        );
        doc.add_attrs_if_missing(
            &a,
            vec![Attribute::new("lang", "fr"), Attribute::new("target", "html")],
        );
        assert_eq!(doc.get_attribute(a, "lang").as_deref(), Some("en"));
        assert_eq!(doc.get_attribute(a, "target").as_deref(), Some("html"));
    }

    #[test]
    fn held_nodes_and_their_ancestors_stay_put() {
        let doc = doc();
        let a = elem(&doc, ids::div);
        let b = elem(&doc, ids::p);
        let c = elem(&doc, ids::span);
        doc.append(&doc.document(), AppendNode(a));
        doc.append(&a, AppendNode(b));
        doc.append(&a, AppendNode(c));
        doc.set_held(vec![b]);

        assert_eq!(doc.remove(a).err(), Some(Error::NodeInUse(a)));
        assert_eq!(doc.remove(b).err(), Some(Error::NodeInUse(b)));
        doc.remove(c).unwrap().destroy();

        doc.set_held(vec![]);
        doc.remove(a).unwrap().destroy();
        assert!(!doc.is_live(b));
    }

    #[test]
    fn attributes_on_a_text_node_are_dropped() {
        let doc = doc();
        let p = elem(&doc, ids::p);
        doc.append(&doc.document(), AppendNode(p));
        doc.append(&p, text("x"));
        let t = doc.first_child(p).unwrap();
        doc.add_attrs_if_missing(&t, vec![Attribute::new("id", "a")]);
        assert_eq!(&*doc.text(t).unwrap(), "x");
    }

    #[test]
    fn annotations() {
        let doc = doc();
        let a = elem(&doc, ids::div);
        doc.set_annotation(a, Rc::new(42u32)).unwrap();
        let note = doc.annotation(a).unwrap();
        assert_eq!(note.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn parse_errors_are_recorded() {
        let seen = Rc::new(Cell::new(0));
        let mut doc = doc();
        let count = seen.clone();
        doc.set_on_parse_error(move |_| count.set(count.get() + 1));
        doc.parse_error(ParseError {
            message: Cow::Borrowed("Unexpected token"),
            line: 2,
            offset: 7,
        });
        assert_eq!(seen.get(), 1);
        assert_eq!(doc.errors().len(), 1);
        assert_eq!(doc.errors()[0].offset, 7);
    }
}
