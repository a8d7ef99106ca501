//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The recursive modification engine: applying one edit-config
//! modification tree (`x1`) onto a base configuration tree (`x0`)
//! under schema guidance, generalizing `text_modify()`/
//! `text_modify_top()`.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::logging;
use crate::nacm::{self, Action, NacmPolicy};
use crate::utils::trim_body;
use crate::xml::{self, Anchor, EditOp, InsertSpec, Kind, NodeAttrs, NodeFlags, XmlNodeId, XmlTree};
use crate::yang::{Keyword, YangContext, YangNodeId};

/// Whether an `objectcreate` check found its target already present,
/// for callers (the top-level `put` driver) that report it back.
#[derive(Clone, Copy, Debug, Default)]
pub struct PutOutcome {
    pub object_existed: Option<bool>,
}

/// The read-mostly inputs every recursive call needs: the modification
/// tree itself, the acting user, the NACM policy, and whether an
/// unrecognized element should be admitted as `anydata`. `Copy` so it
/// threads through the recursion without fighting the borrow checker.
#[derive(Clone, Copy)]
pub struct Ambient<'a> {
    pub x1: &'a XmlTree,
    pub user: &'a str,
    pub nacm: &'a NacmPolicy,
    pub unknown_as_anydata: bool,
    /// `netconf-default-namespace` (spec §6): the namespace a top-level
    /// modification element falls back to when its own prefix doesn't
    /// resolve to anything, instead of failing outright.
    pub default_namespace: Option<&'a str>,
}

/// Apply every top-level child of `amb.x1`'s `config` root onto `x0`,
/// generalizing `text_modify_top()`.
///
/// Spec §4.6: an empty modification tree is special-cased (`delete`/
/// `remove`/`replace` wipe `x0` outright, anything else is a no-op),
/// and a non-empty tree under ambient `replace`/`delete` first purges
/// every existing child of `x0` (after a root-level NACM `update`
/// check) before descending, so the per-child recursion always sees a
/// freshly additive `x0`.
pub fn modify_top(
    yctx: &mut YangContext,
    x0: &mut XmlTree,
    amb: Ambient<'_>,
    op: EditOp,
    outcome: &mut PutOutcome,
) -> Result<()> {
    let x1_root = amb.x1.root();
    let x0_root = x0.root();
    let x1_children: Vec<XmlNodeId> = amb.x1.element_children(x1_root).collect();

    if x1_children.is_empty() {
        if matches!(op, EditOp::Delete | EditOp::Remove | EditOp::Replace) {
            nacm::check(x0, x0_root, Action::Delete, amb.user, amb.nacm, false)?;
            purge_top_children(x0, x0_root);
        }
        return Ok(());
    }

    if matches!(op, EditOp::Delete | EditOp::Replace) {
        nacm::check(x0, x0_root, Action::Update, amb.user, amb.nacm, false)?;
        purge_top_children(x0, x0_root);
    }

    for x1_child in x1_children {
        let y = resolve_top_schema(
            yctx,
            amb.x1,
            x1_child,
            amb.unknown_as_anydata,
            amb.default_namespace,
        )?;
        let x0_child = find_match(yctx, x0, x0_root, amb.x1, x1_child, y);
        modify(yctx, x0, x0_child, x0_root, amb, x1_child, y, op, false, outcome)?;
    }
    Ok(())
}

fn purge_top_children(x0: &mut XmlTree, x0_root: XmlNodeId) {
    let children: Vec<XmlNodeId> = x0.element_children(x0_root).collect();
    for child in children {
        x0.purge(child);
    }
}

/// Spec §6: if the top-level element's own prefix doesn't resolve to
/// anything, fall back to `netconf-default-namespace` instead of
/// failing outright.
fn resolve_top_schema(
    yctx: &mut YangContext,
    x1: &XmlTree,
    x1_child: XmlNodeId,
    unknown_as_anydata: bool,
    default_namespace: Option<&str>,
) -> Result<YangNodeId> {
    let name = x1.get(x1_child).name.to_string();
    let prefix = x1.get(x1_child).prefix.clone();
    let ns = xml::resolve_namespace(x1, x1_child, prefix.as_deref())
        .or_else(|| default_namespace.map(str::to_string))
        .ok_or_else(|| {
            Error::Schema(format!(
                "unresolved namespace for top-level element \"{name}\""
            ))
        })?;
    let module_name = yctx
        .module_by_namespace(&ns)
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Schema(format!("no module registered for namespace \"{ns}\"")))?;
    let module_root = yctx
        .module_root_by_name(&module_name)
        .ok_or_else(|| Error::Schema(format!("module \"{module_name}\" has no root node")))?;
    child_schema(yctx, module_root, &name, unknown_as_anydata)
}

/// Apply one modification element `x1_id` (already known to be schema
/// node `y`) onto its matched (or absent) counterpart `x0_id`.
/// Generalizes `text_modify()`.
#[allow(clippy::too_many_arguments)]
pub fn modify(
    yctx: &mut YangContext,
    x0: &mut XmlTree,
    x0_id: Option<XmlNodeId>,
    x0_parent: XmlNodeId,
    amb: Ambient<'_>,
    x1_id: XmlNodeId,
    y: YangNodeId,
    op: EditOp,
    permit: bool,
    outcome: &mut PutOutcome,
) -> Result<Option<XmlNodeId>> {
    let attrs = xml::read_attrs(amb.x1, x1_id)?;
    let effective_op = if attrs.operation_explicit {
        attrs.operation
    } else {
        op
    };

    validate_insert_kind(yctx, y, &attrs.insert)?;

    if attrs.objectcreate_explicit
        && matches!(
            effective_op,
            EditOp::Replace | EditOp::Merge | EditOp::Create
        )
    {
        let absent = is_absent_or_default(yctx, x0, x0_id, y);
        outcome.object_existed = Some(!absent);
        if absent && !attrs.objectcreate {
            return Err(Error::data_missing(format!(
                "objectcreate=false on absent node \"{}\"",
                amb.x1.get(x1_id).name
            )));
        }
    }

    match yctx.keyword(y) {
        Keyword::Leaf | Keyword::LeafList => modify_leaf(
            yctx,
            x0,
            x0_id,
            x0_parent,
            amb,
            x1_id,
            y,
            effective_op,
            permit,
            &attrs,
        ),
        Keyword::AnyXml | Keyword::AnyData => {
            modify_anyxml(x0, x0_id, x0_parent, amb, x1_id, y, effective_op, permit)
        }
        _ => modify_container(
            yctx,
            x0,
            x0_id,
            x0_parent,
            amb,
            x1_id,
            y,
            effective_op,
            permit,
            &attrs,
            outcome,
        ),
    }
}

fn validate_insert_kind(
    yctx: &YangContext,
    y: YangNodeId,
    insert: &Option<InsertSpec>,
) -> Result<()> {
    let anchor = match insert {
        None | Some(InsertSpec::First) | Some(InsertSpec::Last) => return Ok(()),
        Some(InsertSpec::Before(a)) | Some(InsertSpec::After(a)) => a,
    };
    match (yctx.keyword(y), anchor) {
        (Keyword::List, Anchor::Key(_)) | (Keyword::LeafList, Anchor::Value(_)) => Ok(()),
        (Keyword::List, Anchor::Value(_)) => Err(Error::missing_attribute(
            "key",
            "a list's insert needs a key anchor, not value",
        )),
        (Keyword::LeafList, Anchor::Key(_)) => Err(Error::missing_attribute(
            "value",
            "a leaf-list's insert needs a value anchor, not key",
        )),
        _ => Ok(()),
    }
}

fn is_absent_or_default(
    yctx: &YangContext,
    x0: &XmlTree,
    x0_id: Option<XmlNodeId>,
    y: YangNodeId,
) -> bool {
    match x0_id {
        None => true,
        Some(id) => yctx.is_no_presence_container(y) && x0.element_child_count(id) == 0,
    }
}

#[allow(clippy::too_many_arguments)]
fn modify_leaf(
    yctx: &YangContext,
    x0: &mut XmlTree,
    x0_id: Option<XmlNodeId>,
    x0_parent: XmlNodeId,
    amb: Ambient<'_>,
    x1_id: XmlNodeId,
    y: YangNodeId,
    op: EditOp,
    permit: bool,
    attrs: &NodeAttrs,
) -> Result<Option<XmlNodeId>> {
    if amb.x1.element_child_count(x1_id) > 0 {
        return Err(Error::unknown_element(&amb.x1.get(x1_id).name));
    }

    match op {
        EditOp::Delete => {
            let Some(id) = x0_id else {
                return Err(Error::data_missing(format!(
                    "no instance of \"{}\" to delete",
                    amb.x1.get(x1_id).name
                )));
            };
            nacm::check(x0, id, Action::Delete, amb.user, amb.nacm, permit)?;
            x0.purge(id);
            Ok(None)
        }
        EditOp::Remove => {
            let Some(id) = x0_id else {
                return Ok(None);
            };
            nacm::check(x0, id, Action::Delete, amb.user, amb.nacm, permit)?;
            match amb.x1.body_text(x1_id) {
                None => {
                    x0.purge(id);
                    Ok(None)
                }
                Some(value) if x0.body_text(id) == Some(value) => {
                    x0.purge(id);
                    Ok(None)
                }
                Some(_) => Ok(Some(id)),
            }
        }
        EditOp::None => {
            if let Some(id) = x0_id {
                return Ok(Some(id));
            }
            let id = materialize_skeleton(x0, x0_parent, amb.x1, x1_id, y)?;
            x0.get_mut(id).flags.insert(NodeFlags::PROVISIONAL);
            Ok(Some(id))
        }
        EditOp::Create | EditOp::Replace | EditOp::Merge => {
            if op == EditOp::Create {
                if let Some(existing) = x0_id {
                    if !x0.get(existing).flags.contains(NodeFlags::PROVISIONAL) {
                        return Err(Error::data_exists(format!(
                            "\"{}\" already exists",
                            amb.x1.get(x1_id).name
                        )));
                    }
                }
            }

            let created = x0_id.is_none();
            let id = match x0_id {
                Some(id) => id,
                None => materialize_skeleton(x0, x0_parent, amb.x1, x1_id, y)?,
            };

            let base_type = yctx.base_type(y);
            if let Some(raw) = amb.x1.body_text(x1_id) {
                let value = normalize_body(base_type, raw);
                let changed = created || x0.body_text(id) != Some(value.as_ref());
                if changed {
                    let action = if created { Action::Create } else { Action::Update };
                    nacm::check(x0, id, action, amb.user, amb.nacm, permit)?;
                    if is_identity_like(base_type) {
                        xml::assign_body(amb.x1, x1_id, value.as_ref(), x0, id)?;
                    }
                    let owned = value.into_owned();
                    x0.set_body_text(id, owned);
                    x0.get_mut(id).flags.remove(NodeFlags::DEFAULT);
                }
            }
            x0.get_mut(id).flags.remove(NodeFlags::PROVISIONAL);

            if created {
                position_new_node(yctx, x0, x0_parent, id, y, &attrs.insert)?;
            }

            Ok(Some(id))
        }
    }
}

fn is_identity_like(base_type: Option<&str>) -> bool {
    matches!(base_type, Some("identityref") | Some("instance-identifier"))
}

fn normalize_body<'a>(base_type: Option<&str>, raw: &'a str) -> Cow<'a, str> {
    match base_type {
        Some("enumeration") | Some("bits") | Some("identityref") => Cow::Borrowed(trim_body(raw)),
        _ => Cow::Borrowed(raw),
    }
}

fn materialize_skeleton(
    x0: &mut XmlTree,
    x0_parent: XmlNodeId,
    x1: &XmlTree,
    x1_id: XmlNodeId,
    y: YangNodeId,
) -> Result<XmlNodeId> {
    let name = x1.get(x1_id).name.clone();
    let prefix = x1.get(x1_id).prefix.clone();
    let id = x0.new_element(name, prefix);
    x0.bind_yang(id, y);
    xml::assign_element(x1, x1_id, x0, id, x0_parent)?;
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
fn modify_container(
    yctx: &mut YangContext,
    x0: &mut XmlTree,
    x0_id: Option<XmlNodeId>,
    x0_parent: XmlNodeId,
    amb: Ambient<'_>,
    x1_id: XmlNodeId,
    y: YangNodeId,
    op: EditOp,
    permit: bool,
    attrs: &NodeAttrs,
    outcome: &mut PutOutcome,
) -> Result<Option<XmlNodeId>> {
    match op {
        EditOp::Delete => {
            let Some(id) = x0_id else {
                return Err(Error::data_missing(format!(
                    "no instance of \"{}\" to delete",
                    amb.x1.get(x1_id).name
                )));
            };
            nacm::check(x0, id, Action::Delete, amb.user, amb.nacm, permit)?;
            x0.purge(id);
            return Ok(None);
        }
        EditOp::Remove => {
            if let Some(id) = x0_id {
                nacm::check(x0, id, Action::Delete, amb.user, amb.nacm, permit)?;
                x0.purge(id);
            }
            return Ok(None);
        }
        EditOp::Create => {
            if let Some(existing) = x0_id {
                if !x0.get(existing).flags.contains(NodeFlags::PROVISIONAL) {
                    return Err(Error::data_exists(format!(
                        "\"{}\" already exists",
                        amb.x1.get(x1_id).name
                    )));
                }
            }
        }
        _ => {}
    }

    let full_replace = matches!(op, EditOp::Replace | EditOp::Create)
        || (op == EditOp::Merge && attrs.insert.is_some());

    let mut permit = permit;
    let id = if full_replace {
        if let Some(existing) = x0_id {
            nacm::check(x0, existing, Action::Update, amb.user, amb.nacm, permit)?;
            permit = true;
            x0.purge(existing);
        }
        let new_id = materialize_skeleton(x0, x0_parent, amb.x1, x1_id, y)?;
        if x0_id.is_none() {
            nacm::check(x0, new_id, Action::Create, amb.user, amb.nacm, permit)?;
            permit = true;
        }
        position_new_node(yctx, x0, x0_parent, new_id, y, &attrs.insert)?;
        new_id
    } else {
        match x0_id {
            Some(existing) => existing,
            None => {
                let new_id = materialize_skeleton(x0, x0_parent, amb.x1, x1_id, y)?;
                if op == EditOp::None {
                    x0.get_mut(new_id).flags.insert(NodeFlags::PROVISIONAL);
                } else {
                    nacm::check(x0, new_id, Action::Create, amb.user, amb.nacm, permit)?;
                    permit = true;
                }
                position_new_node(yctx, x0, x0_parent, new_id, y, &attrs.insert)?;
                new_id
            }
        }
    };

    if op != EditOp::None {
        x0.get_mut(id).flags.remove(NodeFlags::PROVISIONAL);
    }

    for x1_child in amb.x1.element_children(x1_id).collect::<Vec<_>>() {
        let child_name = amb.x1.get(x1_child).name.clone();
        let child_y = child_schema(yctx, y, &child_name, amb.unknown_as_anydata)?;

        if yctx.keyword(child_y) == Keyword::LeafList {
            let child_attrs = xml::read_attrs(amb.x1, x1_child)?;
            let child_op = if child_attrs.operation_explicit {
                child_attrs.operation
            } else {
                op
            };
            if child_op == EditOp::Remove && amb.x1.body_text(x1_child).is_none() {
                purge_all_leaf_list_entries(x0, id, &child_name, amb.user, amb.nacm, permit)?;
                continue;
            }
        }

        let x0_child = find_match(yctx, x0, id, amb.x1, x1_child, child_y);
        modify(
            yctx, x0, x0_child, id, amb, x1_child, child_y, op, permit, outcome,
        )?;
    }

    if op == EditOp::None && has_non_provisional_child(x0, id) {
        x0.get_mut(id).flags.remove(NodeFlags::PROVISIONAL);
    }

    Ok(Some(id))
}

/// A bodyless `<ll operation="remove"/>` on an `ordered-by user`
/// leaf-list means "remove every instance", not "remove the one
/// instance matching an absent value" — `find_match`'s value-equality
/// matching can only ever find (at most) one sibling, which is wrong
/// for this case. Purge every same-named sibling directly instead.
fn purge_all_leaf_list_entries(
    x0: &mut XmlTree,
    parent: XmlNodeId,
    name: &str,
    user: &str,
    nacm: &NacmPolicy,
    permit: bool,
) -> Result<()> {
    let entries: Vec<XmlNodeId> = x0
        .element_children(parent)
        .filter(|&c| x0.get(c).name.as_ref() == name)
        .collect();
    for id in entries {
        nacm::check(x0, id, Action::Delete, user, nacm, permit)?;
        x0.purge(id);
    }
    Ok(())
}

fn has_non_provisional_child(x0: &XmlTree, id: XmlNodeId) -> bool {
    x0.element_children(id)
        .any(|c| !x0.get(c).flags.contains(NodeFlags::PROVISIONAL))
}

#[allow(clippy::too_many_arguments)]
fn modify_anyxml(
    x0: &mut XmlTree,
    x0_id: Option<XmlNodeId>,
    x0_parent: XmlNodeId,
    amb: Ambient<'_>,
    x1_id: XmlNodeId,
    y: YangNodeId,
    op: EditOp,
    permit: bool,
) -> Result<Option<XmlNodeId>> {
    match op {
        EditOp::Delete => {
            let Some(id) = x0_id else {
                return Err(Error::data_missing(format!(
                    "no instance of \"{}\" to delete",
                    amb.x1.get(x1_id).name
                )));
            };
            nacm::check(x0, id, Action::Delete, amb.user, amb.nacm, permit)?;
            x0.purge(id);
            return Ok(None);
        }
        EditOp::Remove => {
            if let Some(id) = x0_id {
                nacm::check(x0, id, Action::Delete, amb.user, amb.nacm, permit)?;
                x0.purge(id);
            }
            return Ok(None);
        }
        EditOp::None => return Ok(x0_id),
        EditOp::Create if x0_id.is_some() => {
            return Err(Error::data_exists(format!(
                "\"{}\" already exists",
                amb.x1.get(x1_id).name
            )));
        }
        _ => {}
    }

    let action = if x0_id.is_some() {
        Action::Update
    } else {
        Action::Create
    };
    if let Some(existing) = x0_id {
        nacm::check(x0, existing, action, amb.user, amb.nacm, permit)?;
        x0.purge(existing);
    }

    let new_id = clone_subtree(amb.x1, x1_id, x0);
    x0.bind_yang(new_id, y);
    xml::assign_element(amb.x1, x1_id, x0, new_id, x0_parent)?;
    if x0_id.is_none() {
        nacm::check(x0, new_id, action, amb.user, amb.nacm, permit)?;
    }
    x0.append(x0_parent, new_id);
    Ok(Some(new_id))
}

/// Deep-copy `src_id` (and its whole subtree) from `src` into `dst`,
/// unlinked. `anyxml`/`anydata` content is opaque to the engine, so
/// this is a literal structural copy with no per-node namespace
/// reprocessing; only the grafted root's own prefix gets resolved, by
/// the caller.
fn clone_subtree(src: &XmlTree, src_id: XmlNodeId, dst: &mut XmlTree) -> XmlNodeId {
    let node = src.get(src_id);
    let new_id = match node.kind {
        Kind::Element => dst.new_element(node.name.clone(), node.prefix.clone()),
        Kind::Attribute => dst.new_attribute(
            node.name.clone(),
            node.prefix.clone(),
            node.value.clone().unwrap_or_default(),
        ),
        Kind::Body => dst.new_body(node.value.clone().unwrap_or_default()),
    };
    for child in src.children(src_id).collect::<Vec<_>>() {
        let child_id = clone_subtree(src, child, dst);
        dst.append(new_id, child_id);
    }
    new_id
}

fn child_schema(
    yctx: &mut YangContext,
    parent_y: YangNodeId,
    name: &str,
    unknown_as_anydata: bool,
) -> Result<YangNodeId> {
    if let Some(y) = yctx.child_by_name(parent_y, name) {
        return Ok(y);
    }
    if unknown_as_anydata {
        log::warn!(
            target: logging::TARGET,
            "unrecognized element \"{name}\" admitted as anydata"
        );
        return Ok(yctx.attach_synthetic_anydata(parent_y, name));
    }
    Err(Error::unknown_element(name))
}

/// Locate `x1_child`'s counterpart among `x0_parent`'s existing
/// children: by key equality for a `list`, by value equality for a
/// `leaf-list`, by name otherwise.
///
/// Spec §4.5 step 1 / §3 invariant: a same-named match whose `.yang`
/// binding disagrees with the freshly resolved `y` (a choice
/// replacement swapped in a different schema node under the same
/// local name) is stale — it is purged and treated as no match at all,
/// rather than handed to `modify` as though it were `y`. A match with
/// no binding yet (loaded from disk, never touched by `modify` since)
/// is bound to `y` in place instead of being rejected.
fn find_match(
    yctx: &YangContext,
    x0: &mut XmlTree,
    x0_parent: XmlNodeId,
    x1: &XmlTree,
    x1_child: XmlNodeId,
    y: YangNodeId,
) -> Option<XmlNodeId> {
    let name = x1.get(x1_child).name.as_ref();
    let found = match yctx.keyword(y) {
        Keyword::List => {
            let keys = yctx.key_leaves(y);
            x0.element_children(x0_parent)
                .filter(|&c| x0.get(c).name.as_ref() == name)
                .find(|&c| {
                    keys.iter()
                        .all(|k| x0.child_body_text(c, k) == x1.child_body_text(x1_child, k))
                })
        }
        Keyword::LeafList => {
            let value = x1.body_text(x1_child);
            x0.element_children(x0_parent)
                .filter(|&c| x0.get(c).name.as_ref() == name)
                .find(|&c| x0.body_text(c) == value)
        }
        _ => x0.element_by_name(x0_parent, name),
    }?;

    match x0.get(found).yang {
        Some(existing) if existing != y => {
            x0.purge(found);
            None
        }
        Some(_) => Some(found),
        None => {
            x0.bind_yang(found, y);
            Some(found)
        }
    }
}

fn position_new_node(
    yctx: &YangContext,
    x0: &mut XmlTree,
    parent: XmlNodeId,
    new_id: XmlNodeId,
    y: YangNodeId,
    insert: &Option<InsertSpec>,
) -> Result<()> {
    if !yctx.is_ordered_by_user(y) {
        x0.append(parent, new_id);
        return Ok(());
    }

    let name = x0.get(new_id).name.clone();
    let siblings: Vec<XmlNodeId> = x0
        .element_children(parent)
        .filter(|&c| c != new_id && x0.get(c).name == name)
        .collect();

    match insert.as_ref().unwrap_or(&InsertSpec::Last) {
        InsertSpec::First => match siblings.first() {
            Some(&first) => x0.insert_before(first, new_id),
            None => x0.append(parent, new_id),
        },
        InsertSpec::Last => match siblings.last() {
            Some(&last) => x0.insert_after(last, new_id),
            None => x0.append(parent, new_id),
        },
        InsertSpec::Before(anchor) => {
            let target =
                find_anchor(x0, &siblings, anchor).ok_or_else(|| Error::bad_attribute("key"))?;
            x0.insert_before(target, new_id);
        }
        InsertSpec::After(anchor) => {
            let target =
                find_anchor(x0, &siblings, anchor).ok_or_else(|| Error::bad_attribute("key"))?;
            x0.insert_after(target, new_id);
        }
    }
    Ok(())
}

fn find_anchor(x0: &XmlTree, siblings: &[XmlNodeId], anchor: &Anchor) -> Option<XmlNodeId> {
    match anchor {
        Anchor::Value(v) => siblings
            .iter()
            .copied()
            .find(|&c| x0.body_text(c) == Some(v.as_ref())),
        Anchor::Key(predicate) => {
            let preds = parse_key_predicate(predicate);
            siblings
                .iter()
                .copied()
                .find(|&c| matches_key_predicate(x0, c, &preds))
        }
    }
}

/// Parse a `key="[k='1'][k2='2']"` predicate string into
/// `(leaf-name, value)` pairs.
fn parse_key_predicate(s: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for part in s.split(']') {
        let part = part.trim_start_matches('[').trim();
        if part.is_empty() {
            continue;
        }
        if let Some((name, value)) = part.split_once('=') {
            let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
            out.push((name.trim().to_string(), value.to_string()));
        }
    }
    out
}

fn matches_key_predicate(x0: &XmlTree, candidate: XmlNodeId, preds: &[(String, String)]) -> bool {
    preds
        .iter()
        .all(|(name, value)| x0.child_body_text(candidate, name) == Some(value.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nacm::NacmPolicy;
    use crate::yang::OrderedBy;

    struct Fixture {
        yctx: YangContext,
        c: YangNodeId,
        nacm: NacmPolicy,
    }

    fn build() -> Fixture {
        let mut yctx = YangContext::new();
        let module = yctx.add_module("ex", "urn:ex");
        let c = yctx.add_container_like(module, Keyword::Container, "c", "ex", "urn:ex", false);
        yctx.add_leaf(c, "a", "ex", "urn:ex", "string", Some("d"));
        yctx.add_leaf_list(c, "ll", "ex", "urn:ex", "string", OrderedBy::User);
        yctx.add_list(c, "L", "ex", "urn:ex", &["k"], OrderedBy::System);
        Fixture {
            yctx,
            c,
            nacm: NacmPolicy::new(false, vec![]),
        }
    }

    fn config_with(x1_body: &str) -> (XmlTree, XmlNodeId) {
        let mut x1 = XmlTree::new_config_root();
        let c = x1.new_element("c", None);
        x1.append(x1.root(), c);
        let a = x1.new_element("a", None);
        x1.append(c, a);
        x1.set_body_text(a, x1_body);
        (x1, c)
    }

    #[test]
    fn create_strips_default_valued_leaf() {
        let mut f = build();
        let (x1, c1) = config_with("d");
        let mut x0 = XmlTree::new_config_root();
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        let x0_root = x0.root();
        modify(
            &mut f.yctx,
            &mut x0,
            None,
            x0_root,
            amb,
            c1,
            f.c,
            EditOp::Create,
            false,
            &mut outcome,
        )
        .unwrap();
        let c0 = x0.element_by_name(x0_root, "c").unwrap();
        let a0 = x0.element_by_name(c0, "a").unwrap();
        assert_eq!(x0.body_text(a0), Some("d"));
    }

    #[test]
    fn delete_of_absent_leaf_is_data_missing() {
        let mut f = build();
        let mut x1 = XmlTree::new_config_root();
        let a = x1.new_element("a", None);
        x1.append(x1.root(), a);
        let mut x0 = XmlTree::new_config_root();
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        let a_y = f.yctx.child_by_name(f.c, "a").unwrap();
        let x0_root = x0.root();
        let err = modify(
            &mut f.yctx,
            &mut x0,
            None,
            x0_root,
            amb,
            a,
            a_y,
            EditOp::Delete,
            false,
            &mut outcome,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Protocol(ref e) if e.error_tag == "data-missing"));
    }

    #[test]
    fn create_over_existing_is_data_exists() {
        let mut f = build();
        let (x1, c1) = config_with("x");
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let existing = x0.new_element("c", None);
        x0.bind_yang(existing, f.c);
        x0.append(x0_root, existing);
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        let err = modify(
            &mut f.yctx,
            &mut x0,
            Some(existing),
            x0_root,
            amb,
            c1,
            f.c,
            EditOp::Create,
            false,
            &mut outcome,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Protocol(ref e) if e.error_tag == "data-exists"));
    }

    #[test]
    fn none_op_skeleton_is_pruned_without_real_descendant_change() {
        let mut f = build();
        let mut x1 = XmlTree::new_config_root();
        let c = x1.new_element("c", None);
        x1.append(x1.root(), c);
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        let id = modify(
            &mut f.yctx,
            &mut x0,
            None,
            x0_root,
            amb,
            c,
            f.c,
            EditOp::None,
            false,
            &mut outcome,
        )
        .unwrap()
        .unwrap();
        assert!(x0.get(id).flags.contains(NodeFlags::PROVISIONAL));
    }

    #[test]
    fn nacm_deny_blocks_update() {
        let mut f = build();
        f.nacm = NacmPolicy::new(true, vec![]);
        let (x1, c1) = config_with("x");
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let existing = x0.new_element("c", None);
        x0.bind_yang(existing, f.c);
        x0.append(x0_root, existing);
        let a_existing = x0.new_element("a", None);
        x0.bind_yang(a_existing, f.yctx.child_by_name(f.c, "a").unwrap());
        x0.set_body_text(a_existing, "old");
        x0.append(existing, a_existing);
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "bob",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        let err = modify(
            &mut f.yctx,
            &mut x0,
            Some(existing),
            x0_root,
            amb,
            c1,
            f.c,
            EditOp::Merge,
            false,
            &mut outcome,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Access(_)));
    }

    #[test]
    fn empty_modification_tree_with_delete_wipes_everything() {
        let mut f = build();
        let x1 = XmlTree::new_config_root();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let existing = x0.new_element("c", None);
        x0.bind_yang(existing, f.c);
        x0.append(x0_root, existing);
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        modify_top(&mut f.yctx, &mut x0, amb, EditOp::Delete, &mut outcome).unwrap();
        assert_eq!(x0.element_child_count(x0_root), 0);
    }

    #[test]
    fn empty_modification_tree_with_merge_is_a_noop() {
        let mut f = build();
        let x1 = XmlTree::new_config_root();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let existing = x0.new_element("c", None);
        x0.bind_yang(existing, f.c);
        x0.append(x0_root, existing);
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        modify_top(&mut f.yctx, &mut x0, amb, EditOp::Merge, &mut outcome).unwrap();
        assert_eq!(x0.element_child_count(x0_root), 1);
    }

    #[test]
    fn empty_modification_tree_with_replace_checks_nacm_before_wiping() {
        let mut f = build();
        f.nacm = NacmPolicy::new(true, vec![]);
        let x1 = XmlTree::new_config_root();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let existing = x0.new_element("c", None);
        x0.bind_yang(existing, f.c);
        x0.append(x0_root, existing);
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "bob",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        let err = modify_top(&mut f.yctx, &mut x0, amb, EditOp::Replace, &mut outcome).unwrap_err();
        assert!(matches!(err, Error::Access(_)));
        assert_eq!(x0.element_child_count(x0_root), 1, "unauthorized wipe must not happen");
    }

    #[test]
    fn bodyless_leaf_list_remove_purges_every_instance() {
        let mut f = build();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let c0 = x0.new_element("c", None);
        x0.bind_yang(c0, f.c);
        x0.append(x0_root, c0);
        let ll_y = f.yctx.child_by_name(f.c, "ll").unwrap();
        for v in ["x", "y", "z"] {
            let ll = x0.new_element("ll", None);
            x0.bind_yang(ll, ll_y);
            x0.set_body_text(ll, v);
            x0.append(c0, ll);
        }

        let mut x1 = XmlTree::new_config_root();
        let c1 = x1.new_element("c", None);
        x1.append(x1.root(), c1);
        let ll1 = x1.new_element("ll", None);
        let xmlns_nc =
            x1.new_attribute("nc", Some("xmlns".into()), crate::xml::NETCONF_BASE_NS);
        let op_attr = x1.new_attribute("operation", Some("nc".into()), "remove");
        x1.append(ll1, xmlns_nc);
        x1.append(ll1, op_attr);
        x1.append(c1, ll1);

        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        modify_top(&mut f.yctx, &mut x0, amb, EditOp::Merge, &mut outcome).unwrap();

        let c0_after = x0.element_by_name(x0_root, "c").unwrap();
        assert_eq!(
            x0.element_children(c0_after)
                .filter(|&n| x0.get(n).name.as_ref() == "ll")
                .count(),
            0,
            "bodyless remove must purge every leaf-list instance"
        );
    }

    #[test]
    fn top_level_replace_purges_unmentioned_siblings_before_descending() {
        let mut f = build();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        let stale = x0.new_element("stale", None);
        x0.append(x0_root, stale);

        let (x1, _c1) = config_with("x");
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        modify_top(&mut f.yctx, &mut x0, amb, EditOp::Replace, &mut outcome).unwrap();
        assert!(x0.element_by_name(x0_root, "stale").is_none());
        let c0 = x0.element_by_name(x0_root, "c").unwrap();
        assert_eq!(x0.child_body_text(c0, "a"), Some("x"));
    }

    #[test]
    fn find_match_purges_node_bound_to_a_different_schema_node() {
        let mut f = build();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        // A same-named "c" element that is actually bound to the "a"
        // leaf's schema node, as a choice replacement might leave
        // behind.
        let stale = x0.new_element("c", None);
        let a_y = f.yctx.child_by_name(f.c, "a").unwrap();
        x0.bind_yang(stale, a_y);
        x0.append(x0_root, stale);

        let (x1, _c1) = config_with("x");
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        modify_top(&mut f.yctx, &mut x0, amb, EditOp::Merge, &mut outcome).unwrap();

        assert_eq!(x0.element_child_count(x0_root), 1);
        let c0 = x0.element_by_name(x0_root, "c").unwrap();
        assert_eq!(x0.get(c0).yang, Some(f.c));
        assert_eq!(x0.child_body_text(c0, "a"), Some("x"));
    }

    #[test]
    fn find_match_binds_an_unbound_existing_match_instead_of_rejecting() {
        let mut f = build();
        let mut x0 = XmlTree::new_config_root();
        let x0_root = x0.root();
        // Unbound, as data freshly read off disk would be before this
        // engine touches it.
        let existing = x0.new_element("c", None);
        x0.append(x0_root, existing);
        let a_existing = x0.new_element("a", None);
        x0.set_body_text(a_existing, "orig");
        x0.append(existing, a_existing);

        let (x1, _c1) = config_with("x");
        let mut outcome = PutOutcome::default();
        let amb = Ambient {
            x1: &x1,
            user: "alice",
            nacm: &f.nacm,
            unknown_as_anydata: false,
            default_namespace: None,
        };
        modify_top(&mut f.yctx, &mut x0, amb, EditOp::Merge, &mut outcome).unwrap();

        assert_eq!(x0.element_child_count(x0_root), 1);
        let c0 = x0.element_by_name(x0_root, "c").unwrap();
        assert_eq!(x0.get(c0).yang, Some(f.c));
        assert_eq!(x0.child_body_text(c0, "a"), Some("x"));
    }
}
