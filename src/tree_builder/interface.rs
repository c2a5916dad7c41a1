// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The interface for consumers of the tree builder (and thus the
//! parser overall).

use crate::tag::{Categories, Namespace, TagId};
use crate::tendril::StrTendril;
use crate::tokenizer::{Attribute, ParseError, Span};

pub use self::NodeOrText::{AppendNode, AppendText};
pub use self::QuirksMode::{NoQuirks, Quirks};

/// A document's quirks mode.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum QuirksMode {
    Quirks,
    NoQuirks,
}

/// Something which can be inserted into the DOM.
///
/// Adjacent sibling text nodes are merged into a single node, so
/// the sink may not want to allocate a `Handle` for each.
pub enum NodeOrText<Handle> {
    AppendNode(Handle),
    AppendText(StrTendril),
}

/// The name of an element: its tag and the namespace it lives in.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub struct ElemName {
    pub tag: TagId,
    pub ns: Namespace,
}

impl ElemName {
    pub fn new(tag: TagId, ns: Namespace) -> ElemName {
        ElemName { tag, ns }
    }

    /// An element of the primary namespace.
    pub fn hvml(tag: TagId) -> ElemName {
        ElemName::new(tag, Namespace::Hvml)
    }

    pub fn is_hvml(&self, tag: TagId) -> bool {
        self.ns == Namespace::Hvml && self.tag == tag
    }

    /// Does the element belong to any of `categories`?
    pub fn has(&self, categories: Categories) -> bool {
        self.tag.categories_in(self.ns).intersects(categories)
    }
}

/// Types which can process tree modifications from the tree builder.
pub trait TreeSink {
    /// `Handle` is a reference to a DOM node.  The tree builder requires
    /// that a `Handle` implements `Clone` to get another reference to
    /// the same node.
    type Handle: Clone;

    /// Signal a parse error.
    fn parse_error(&self, error: ParseError);

    /// Get a handle to the `Document` node.
    fn get_document(&self) -> Self::Handle;

    /// Create an element.
    ///
    /// `span` is the source of the token the element was created for.
    fn create_element(&self, name: ElemName, attrs: Vec<Attribute>, span: Span) -> Self::Handle;

    /// Create a comment node.
    fn create_comment(&self, text: StrTendril) -> Self::Handle;

    /// Append a node as the last child of the given node.  If this would
    /// produce adjacent sibling text nodes, it should concatenate the text
    /// instead.
    ///
    /// The child node will not already have a parent.
    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>);

    /// When the insertion point is decided by the existence of a parent node of the
    /// element, we consider both possibilities and send the element which will be used
    /// if a parent node exists, along with the element to be used if there isn't one.
    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    );

    /// Append a `DOCTYPE` element to the `Document` node.
    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    );

    /// Do two handles refer to the same node?
    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool;

    /// Set the document's quirks mode.
    fn set_quirks_mode(&self, mode: QuirksMode);

    /// Append a node as the sibling immediately before the given node.
    ///
    /// The tree builder promises that `sibling` is not a text node.  However its
    /// old previous sibling, which would become the new node's previous sibling,
    /// could be a text node.  If the new node is also a text node, the two should
    /// be merged, as in the behavior of `append`.
    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>);

    /// Add each attribute to the given element, if no attribute with that name
    /// already exists.
    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>);

    /// Detach the given node from its parent.
    fn remove_from_parent(&self, target: &Self::Handle);

    /// Remove all the children from node and append them to new_parent.
    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle);

    /// Called whenever the line number changes.
    fn set_current_line(&self, _line_number: u64) {}

    /// Called with the source span of each token before it is processed.
    fn set_current_span(&self, _span: Span) {}

    /// Indicate that a node was popped off the stack of open elements.
    fn pop(&self, _node: &Self::Handle) {}

    /// The element was written as a self-closing tag, like `<init/>`.
    fn mark_self_closing(&self, _target: &Self::Handle) {}
}
