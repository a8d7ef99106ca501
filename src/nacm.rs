//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! NACM (Network Configuration Access Control Model) authorization,
//! interleaved with the modification engine (spec §4.4).

use crate::error::{Error, Result};
use crate::xml::{XmlNodeId, XmlTree};

/// The action NACM is asked to authorize for a given target node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Effect {
    Permit,
    Deny,
}

/// One rule from a loaded `nacm` configuration: a path prefix plus the
/// actions and users it governs. The rule list is searched in order
/// and the first matching rule wins, matching NACM's own rule-list
/// semantics.
#[derive(Clone, Debug)]
pub struct NacmRule {
    /// Element-local-name path this rule applies to; an empty path
    /// matches every target (a catch-all rule).
    pub path: Vec<String>,
    pub actions: Vec<Action>,
    /// Users (or group members, already expanded by the loader) this
    /// rule applies to; empty matches any user, mirroring NACM's
    /// `group *` wildcard (spec §4.4, GLOSSARY: "a policy tree granting
    /// or denying create/update/delete on paths per user").
    pub users: Vec<String>,
    effect: Effect,
}

impl NacmRule {
    pub fn permit(path: Vec<String>, actions: Vec<Action>, users: Vec<String>) -> Self {
        Self { path, actions, users, effect: Effect::Permit }
    }

    pub fn deny(path: Vec<String>, actions: Vec<Action>, users: Vec<String>) -> Self {
        Self { path, actions, users, effect: Effect::Deny }
    }

    fn matches(&self, action: Action, path: &[String], user: &str) -> bool {
        self.actions.contains(&action)
            && path.starts_with(&self.path)
            && (self.users.is_empty() || self.users.iter().any(|u| u == user))
    }
}

/// A user's effective rule set. `enabled = false` mirrors
/// `nacm/enable-nacm` and short-circuits every check to `Permit`.
#[derive(Clone, Debug, Default)]
pub struct NacmPolicy {
    pub enabled: bool,
    pub rules: Vec<NacmRule>,
}

impl NacmPolicy {
    pub fn new(enabled: bool, rules: Vec<NacmRule>) -> Self {
        Self { enabled, rules }
    }

    fn effect_for(&self, action: Action, path: &[String], user: &str) -> Effect {
        self.rules
            .iter()
            .find(|r| r.matches(action, path, user))
            .map(|r| r.effect)
            .unwrap_or(Effect::Deny)
    }
}

/// Check whether `user` may perform `action` on `target`, given
/// `policy` and the already-established `request_root` of the
/// in-flight edit (kept for callers that need it in the resulting
/// `access-denied` error's `error-path`; this evaluator doesn't use it
/// beyond that).
///
/// `ancestor_permitted`, when `true`, lets an already-authorized
/// container's descendants be authorized without a further rule
/// lookup (spec §4.4: "a permit decision for a node's ancestor
/// authorizes the node").
pub fn check(
    tree: &XmlTree,
    target: XmlNodeId,
    action: Action,
    user: &str,
    policy: &NacmPolicy,
    ancestor_permitted: bool,
) -> Result<bool> {
    if !policy.enabled || ancestor_permitted {
        return Ok(true);
    }
    let path = tree.element_path(target);
    match policy.effect_for(action, &path, user) {
        Effect::Permit => Ok(true),
        Effect::Deny => Err(Error::access_denied(format!(
            "user \"{user}\" denied {} on /{}",
            action.as_str(),
            path.join("/")
        ))),
    }
}
