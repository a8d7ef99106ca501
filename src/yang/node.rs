//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The YANG schema tree: an arena of [`YangNode`]s addressed by
//! [`YangNodeId`] handles, and the [`YangContext`] that owns one such
//! arena per loaded schema.
//!
//! The parser that turns `.yang` source into this tree is out of
//! scope (spec §1): this module only defines the shape the rest of the
//! engine consumes, plus a small builder so tests and embedders can
//! construct a schema tree directly.

use std::collections::HashMap;

use indextree::{Arena, NodeId};

/// Handle into a [`YangContext`]'s arena.
pub type YangNodeId = NodeId;

/// YANG statement keyword, restricted to the data-node-bearing
/// keywords the write engine dispatches on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Keyword {
    Module,
    Container,
    List,
    Leaf,
    LeafList,
    AnyXml,
    AnyData,
    Choice,
    Case,
}

/// `ordered-by` substatement value for a `list` or `leaf-list`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderedBy {
    System,
    User,
}

impl Default for OrderedBy {
    fn default() -> Self {
        OrderedBy::System
    }
}

/// A single schema node.
#[derive(Clone, Debug)]
pub struct YangNode {
    pub keyword: Keyword,
    /// The statement's argument: the data node's local name.
    pub name: Box<str>,
    /// Name of the owning module (not necessarily the module the
    /// *parent* node belongs to, in the presence of augmentations).
    pub module: Box<str>,
    /// The owning module's namespace URI.
    pub namespace: Box<str>,
    /// `revision` substatement of the owning `module` node; `None` if
    /// the module declares none (or the caller never set one).
    pub revision: Option<Box<str>>,
    pub ordered_by: OrderedBy,
    /// `default` substatement, for `leaf`/`leaf-list`.
    pub default: Option<Box<str>>,
    /// Key leaf names, in schema order. Non-empty only for `list`.
    pub keys: Vec<Box<str>>,
    /// Resolved base type name (`string`, `identityref`, `enumeration`,
    /// `bits`, ...), for `leaf`/`leaf-list`.
    pub base_type: Option<Box<str>>,
    /// `true` if this is a `presence` container (or not a container at
    /// all); `false` for a no-presence container.
    pub presence: bool,
    /// `true` if this node was attached on the fly because
    /// `unknown-as-anydata` let an unrecognized element through.
    pub synthetic: bool,
}

impl YangNode {
    fn leaf_like(
        keyword: Keyword,
        name: impl Into<Box<str>>,
        module: impl Into<Box<str>>,
        namespace: impl Into<Box<str>>,
        base_type: impl Into<Box<str>>,
    ) -> Self {
        Self {
            keyword,
            name: name.into(),
            module: module.into(),
            namespace: namespace.into(),
            revision: None,
            ordered_by: OrderedBy::System,
            default: None,
            keys: Vec::new(),
            base_type: Some(base_type.into()),
            presence: true,
            synthetic: false,
        }
    }
}

/// A loaded YANG schema: an arena of [`YangNode`]s plus a namespace →
/// module-name index used to resolve a modification subtree's module
/// by the namespace its root element carries.
#[derive(Debug)]
pub struct YangContext {
    pub(crate) arena: Arena<YangNode>,
    /// One root per loaded, implemented module (the `module`
    /// statement itself is represented as a `Keyword::Module` node
    /// whose children are that module's top-level data nodes).
    pub(crate) module_roots: Vec<YangNodeId>,
    pub(crate) namespace_to_module: HashMap<Box<str>, Box<str>>,
}

impl YangContext {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            module_roots: Vec::new(),
            namespace_to_module: HashMap::new(),
        }
    }

    /// Register a module and return the `YangNodeId` of its synthetic
    /// `Keyword::Module` root, under which top-level data nodes live.
    pub fn add_module(&mut self, name: &str, namespace: &str) -> YangNodeId {
        let node = YangNode {
            keyword: Keyword::Module,
            name: name.into(),
            module: name.into(),
            namespace: namespace.into(),
            revision: None,
            ordered_by: OrderedBy::System,
            default: None,
            keys: Vec::new(),
            base_type: None,
            presence: true,
            synthetic: false,
        };
        let id = self.arena.new_node(node);
        self.module_roots.push(id);
        self.namespace_to_module
            .insert(namespace.into(), name.into());
        id
    }

    /// Record a module's `revision` substatement, for the module-state
    /// annotation written alongside a persisted datastore (spec §4.ADD
    /// item 6). A module with no `revision` statement simply never
    /// calls this, and its module-state entry carries none.
    pub fn set_module_revision(&mut self, module: YangNodeId, revision: &str) {
        self.arena[module].get_mut().revision = Some(revision.into());
    }

    pub fn module_by_namespace(&self, namespace: &str) -> Option<&str> {
        self.namespace_to_module.get(namespace).map(|s| s.as_ref())
    }

    /// The synthetic `Keyword::Module` root registered under `name` by
    /// [`Self::add_module`], used by the top-level driver to resolve a
    /// modification child's schema once its owning module is known.
    pub fn module_root_by_name(&self, name: &str) -> Option<YangNodeId> {
        self.module_roots
            .iter()
            .copied()
            .find(|&id| self.get(id).module.as_ref() == name)
    }

    /// Every registered module's `(name, namespace, revision)`, for the
    /// `ietf-yang-library` module-state annotation written alongside
    /// a persisted datastore (spec §4.ADD item 6).
    pub fn modules(&self) -> impl Iterator<Item = (&str, &str, Option<&str>)> + '_ {
        self.module_roots.iter().map(move |&id| {
            let node = self.get(id);
            (
                node.name.as_ref(),
                node.namespace.as_ref(),
                node.revision.as_deref(),
            )
        })
    }

    /// Append a container/list/anyxml/anydata/choice/case child.
    #[allow(clippy::too_many_arguments)]
    pub fn add_container_like(
        &mut self,
        parent: YangNodeId,
        keyword: Keyword,
        name: &str,
        module: &str,
        namespace: &str,
        presence: bool,
    ) -> YangNodeId {
        let node = YangNode {
            keyword,
            name: name.into(),
            module: module.into(),
            namespace: namespace.into(),
            revision: None,
            ordered_by: OrderedBy::System,
            default: None,
            keys: Vec::new(),
            base_type: None,
            presence,
            synthetic: false,
        };
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    pub fn add_list(
        &mut self,
        parent: YangNodeId,
        name: &str,
        module: &str,
        namespace: &str,
        keys: &[&str],
        ordered_by: OrderedBy,
    ) -> YangNodeId {
        let node = YangNode {
            keyword: Keyword::List,
            name: name.into(),
            module: module.into(),
            namespace: namespace.into(),
            revision: None,
            ordered_by,
            default: None,
            keys: keys.iter().map(|k| (*k).into()).collect(),
            base_type: None,
            presence: true,
            synthetic: false,
        };
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    pub fn add_leaf(
        &mut self,
        parent: YangNodeId,
        name: &str,
        module: &str,
        namespace: &str,
        base_type: &str,
        default: Option<&str>,
    ) -> YangNodeId {
        let mut node = YangNode::leaf_like(Keyword::Leaf, name, module, namespace, base_type);
        node.default = default.map(Into::into);
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    pub fn add_leaf_list(
        &mut self,
        parent: YangNodeId,
        name: &str,
        module: &str,
        namespace: &str,
        base_type: &str,
        ordered_by: OrderedBy,
    ) -> YangNodeId {
        let mut node =
            YangNode::leaf_like(Keyword::LeafList, name, module, namespace, base_type);
        node.ordered_by = ordered_by;
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    /// Attach a synthetic `anydata` node for an element the schema
    /// doesn't otherwise describe (`unknown-as-anydata`, spec §4.3).
    pub fn attach_synthetic_anydata(&mut self, parent: YangNodeId, name: &str) -> YangNodeId {
        let parent_module = self.arena[parent].get().module.clone();
        let parent_ns = self.arena[parent].get().namespace.clone();
        let node = YangNode {
            keyword: Keyword::AnyData,
            name: name.into(),
            module: parent_module,
            namespace: parent_ns,
            revision: None,
            ordered_by: OrderedBy::System,
            default: None,
            keys: Vec::new(),
            base_type: None,
            presence: true,
            synthetic: true,
        };
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    pub fn get(&self, id: YangNodeId) -> &YangNode {
        self.arena[id].get()
    }
}

impl Default for YangContext {
    fn default() -> Self {
        Self::new()
    }
}
