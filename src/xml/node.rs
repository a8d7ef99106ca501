//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The XML instance tree: an arena of [`XmlNode`]s addressed by
//! [`XmlNodeId`] handles (spec §3, §9: "use an arena of nodes with
//! integer handles" in place of the source's cyclic raw pointers).

use bitflags::bitflags;
use indextree::{Arena, NodeId};

use crate::yang::YangNodeId;

/// Handle into an [`XmlTree`]'s arena.
pub type XmlNodeId = NodeId;

/// The three node kinds the source's `cxobj` conflates into one type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Element,
    Attribute,
    Body,
}

bitflags! {
    /// Per-node flags (spec §3 `XmlNode` entity).
    #[derive(Default)]
    pub struct NodeFlags: u8 {
        /// Freshly materialized only to let the tree walk descend;
        /// reaped after `put` if no descendant actually changed.
        const PROVISIONAL = 0b001;
        /// Carries its schema `default` value; stripped before the
        /// tree is written to disk.
        const DEFAULT = 0b010;
        /// Scratch flag cleared at the end of every `put` (parity with
        /// `XML_FLAG_MARK` in the source, used by callers that need to
        /// mark a subtree mid-traversal without borrowing a new field).
        const MARK = 0b100;
    }
}

/// A single node of the XML instance tree.
#[derive(Clone, Debug)]
pub struct XmlNode {
    pub kind: Kind,
    /// Local name. Unused (empty) for `Kind::Body`.
    pub name: Box<str>,
    pub prefix: Option<Box<str>>,
    /// Attribute value or body text. Unused for `Kind::Element`.
    pub value: Option<Box<str>>,
    /// Schema node this element is bound to, if any.
    pub yang: Option<YangNodeId>,
    pub flags: NodeFlags,
}

impl XmlNode {
    fn element(name: impl Into<Box<str>>, prefix: Option<Box<str>>) -> Self {
        Self {
            kind: Kind::Element,
            name: name.into(),
            prefix,
            value: None,
            yang: None,
            flags: NodeFlags::empty(),
        }
    }

    fn attribute(name: impl Into<Box<str>>, prefix: Option<Box<str>>, value: impl Into<Box<str>>) -> Self {
        Self {
            kind: Kind::Attribute,
            name: name.into(),
            prefix,
            value: Some(value.into()),
            yang: None,
            flags: NodeFlags::empty(),
        }
    }

    fn body(text: impl Into<Box<str>>) -> Self {
        Self {
            kind: Kind::Body,
            name: "".into(),
            prefix: None,
            value: Some(text.into()),
            yang: None,
            flags: NodeFlags::empty(),
        }
    }
}

/// An XML instance tree rooted at a `config` element (spec §3
/// invariant: "the top element is named `config`").
///
/// `Clone` deep-copies the whole arena; `Handle::put` uses it to
/// snapshot a datastore's tree before attempting a modification, so it
/// can restore the pre-modification state on any failure (spec §7).
#[derive(Clone, Debug)]
pub struct XmlTree {
    pub(crate) arena: Arena<XmlNode>,
    root: XmlNodeId,
}

impl XmlTree {
    /// A fresh `<config/>` tree with no children.
    pub fn new_config_root() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(XmlNode::element("config", None));
        Self { arena, root }
    }

    pub fn root(&self) -> XmlNodeId {
        self.root
    }

    pub fn get(&self, id: XmlNodeId) -> &XmlNode {
        self.arena[id].get()
    }

    pub fn get_mut(&mut self, id: XmlNodeId) -> &mut XmlNode {
        self.arena[id].get_mut()
    }

    pub fn parent(&self, id: XmlNodeId) -> Option<XmlNodeId> {
        self.arena[id].parent()
    }

    pub fn new_element(&mut self, name: impl Into<Box<str>>, prefix: Option<Box<str>>) -> XmlNodeId {
        self.arena.new_node(XmlNode::element(name, prefix))
    }

    pub fn new_attribute(
        &mut self,
        name: impl Into<Box<str>>,
        prefix: Option<Box<str>>,
        value: impl Into<Box<str>>,
    ) -> XmlNodeId {
        self.arena.new_node(XmlNode::attribute(name, prefix, value))
    }

    pub fn new_body(&mut self, text: impl Into<Box<str>>) -> XmlNodeId {
        self.arena.new_node(XmlNode::body(text))
    }

    pub fn append(&mut self, parent: XmlNodeId, child: XmlNodeId) {
        parent.append(child, &mut self.arena);
    }

    pub fn prepend(&mut self, parent: XmlNodeId, child: XmlNodeId) {
        parent.prepend(child, &mut self.arena);
    }

    pub fn insert_after(&mut self, sibling: XmlNodeId, new: XmlNodeId) {
        sibling.insert_after(new, &mut self.arena);
    }

    pub fn insert_before(&mut self, sibling: XmlNodeId, new: XmlNodeId) {
        sibling.insert_before(new, &mut self.arena);
    }

    pub fn detach(&mut self, id: XmlNodeId) {
        id.detach(&mut self.arena);
    }

    /// Remove a node and its entire subtree.
    pub fn purge(&mut self, id: XmlNodeId) {
        id.remove_subtree(&mut self.arena);
    }

    /// All children, in document order.
    pub fn children(&self, id: XmlNodeId) -> impl Iterator<Item = XmlNodeId> + '_ {
        id.children(&self.arena)
    }

    /// Element children only, in document order.
    pub fn element_children(&self, id: XmlNodeId) -> impl Iterator<Item = XmlNodeId> + '_ {
        self.children(id)
            .filter(move |&c| self.get(c).kind == Kind::Element)
    }

    pub fn element_child_count(&self, id: XmlNodeId) -> usize {
        self.element_children(id).count()
    }

    /// Find an attribute child by local name, regardless of prefix.
    pub fn attribute_by_name(&self, id: XmlNodeId, name: &str) -> Option<XmlNodeId> {
        self.children(id)
            .find(|&c| self.get(c).kind == Kind::Attribute && self.get(c).name.as_ref() == name)
    }

    /// Find an element child by local name (first match).
    pub fn element_by_name(&self, id: XmlNodeId, name: &str) -> Option<XmlNodeId> {
        self.element_children(id).find(|&c| self.get(c).name.as_ref() == name)
    }

    /// This element's body text, if it has a `Kind::Body` child.
    pub fn body_text(&self, id: XmlNodeId) -> Option<&str> {
        self.children(id)
            .find(|&c| self.get(c).kind == Kind::Body)
            .and_then(|c| self.get(c).value.as_deref())
    }

    /// Set (creating if necessary) this element's body text.
    pub fn set_body_text(&mut self, id: XmlNodeId, text: impl Into<Box<str>>) {
        if let Some(body) = self.children(id).find(|&c| self.get(c).kind == Kind::Body) {
            self.get_mut(body).value = Some(text.into());
        } else {
            let body = self.new_body(text);
            self.append(id, body);
        }
    }

    /// Convenience: body text of a named element child.
    pub fn child_body_text(&self, id: XmlNodeId, child_name: &str) -> Option<&str> {
        self.element_by_name(id, child_name)
            .and_then(|c| self.body_text(c))
    }

    pub fn bind_yang(&mut self, id: XmlNodeId, y: YangNodeId) {
        self.get_mut(id).yang = Some(y);
    }

    /// Absolute path of element-local names from the root down to (and
    /// including) `id`, used by the NACM path matcher.
    pub fn element_path(&self, id: XmlNodeId) -> Vec<String> {
        let mut path: Vec<String> = id
            .ancestors(&self.arena)
            .filter(|&n| self.get(n).kind == Kind::Element && n != self.root)
            .map(|n| self.get(n).name.to_string())
            .collect();
        path.reverse();
        path
    }
}

/// Iteration helper used by the namespace resolver: collects every
/// `xmlns`/`xmlns:prefix` attribute visible along `id`'s ancestor
/// chain, innermost binding first.
pub(crate) fn xmlns_attrs<'a>(
    tree: &'a XmlTree,
    id: XmlNodeId,
) -> impl Iterator<Item = XmlNodeId> + 'a {
    id.ancestors(&tree.arena).flat_map(move |ancestor| {
        tree.children(ancestor)
            .filter(move |&c| {
                let n = tree.get(c);
                n.kind == Kind::Attribute
                    && (n.name.as_ref() == "xmlns" || n.prefix.as_deref() == Some("xmlns"))
            })
            .collect::<Vec<_>>()
    })
}
