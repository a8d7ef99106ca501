//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG lookup: resolving child schema nodes, key leaves, ordering,
//! and default values (spec §4.3).

use super::node::{Keyword, OrderedBy, YangContext, YangNode, YangNodeId};

impl YangContext {
    /// Resolve a child schema node of `y` by its local name, under
    /// YANG's data-node scoping (i.e. transparent through `choice`/
    /// `case`).
    pub fn child_by_name(&self, y: YangNodeId, local: &str) -> Option<YangNodeId> {
        for child in y.children(&self.arena) {
            let node = self.get(child);
            match node.keyword {
                Keyword::Choice | Keyword::Case => {
                    if let Some(found) = self.child_by_name(child, local) {
                        return Some(found);
                    }
                }
                _ if node.name.as_ref() == local => return Some(child),
                _ => {}
            }
        }
        None
    }

    /// Ordered list of key leaf names for a `list` node.
    pub fn key_leaves(&self, y: YangNodeId) -> &[Box<str>] {
        &self.get(y).keys
    }

    pub fn is_ordered_by_user(&self, y: YangNodeId) -> bool {
        self.get(y).ordered_by == OrderedBy::User
    }

    pub fn default_value(&self, y: YangNodeId) -> Option<&str> {
        self.get(y).default.as_deref()
    }

    /// `true` for a `container` without a `presence` substatement:
    /// mere existence conveys no data and it is stripped on write when
    /// left empty (spec §4.6 step 3).
    pub fn is_no_presence_container(&self, y: YangNodeId) -> bool {
        self.get(y).keyword == Keyword::Container && !self.get(y).presence
    }

    pub fn keyword(&self, y: YangNodeId) -> Keyword {
        self.get(y).keyword
    }

    pub fn base_type(&self, y: YangNodeId) -> Option<&str> {
        self.get(y).base_type.as_deref()
    }

    pub fn node(&self, y: YangNodeId) -> &YangNode {
        self.get(y)
    }
}

#[cfg(test)]
mod tests {
    use super::super::node::YangContext;
    use super::*;

    fn build() -> (YangContext, YangNodeId, YangNodeId) {
        let mut y = YangContext::new();
        let module = y.add_module("ex", "urn:ex");
        let c = y.add_container_like(
            module,
            Keyword::Container,
            "c",
            "ex",
            "urn:ex",
            false, /* no-presence */
        );
        y.add_leaf(c, "a", "ex", "urn:ex", "string", Some("d"));
        y.add_leaf_list(c, "ll", "ex", "urn:ex", "string", OrderedBy::User);
        y.add_list(c, "L", "ex", "urn:ex", &["k"], OrderedBy::System);
        (y, module, c)
    }

    #[test]
    fn resolves_children_by_name() {
        let (y, _module, c) = build();
        let a = y.child_by_name(c, "a").unwrap();
        assert_eq!(y.keyword(a), Keyword::Leaf);
        assert_eq!(y.default_value(a), Some("d"));
        assert!(y.child_by_name(c, "nope").is_none());
    }

    #[test]
    fn no_presence_container_detected() {
        let (y, _module, c) = build();
        assert!(y.is_no_presence_container(c));
    }

    #[test]
    fn leaf_list_is_user_ordered() {
        let (y, _module, c) = build();
        let ll = y.child_by_name(c, "ll").unwrap();
        assert!(y.is_ordered_by_user(ll));
    }

    #[test]
    fn list_exposes_key_leaves() {
        let (y, _module, c) = build();
        let l = y.child_by_name(c, "L").unwrap();
        assert_eq!(y.key_leaves(l), &[Box::from("k")]);
    }

    #[test]
    fn choice_case_lookup_is_transparent() {
        let mut y = YangContext::new();
        let module = y.add_module("ex", "urn:ex");
        let choice = y.add_container_like(
            module,
            Keyword::Choice,
            "ch",
            "ex",
            "urn:ex",
            true,
        );
        let case_a = y.add_container_like(choice, Keyword::Case, "a-case", "ex", "urn:ex", true);
        y.add_leaf(case_a, "a", "ex", "urn:ex", "string", None);
        let found = y.child_by_name(module, "a").unwrap();
        assert_eq!(y.keyword(found), Keyword::Leaf);
    }
}
