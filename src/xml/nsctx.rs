//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Namespace resolution and propagation for grafted subtrees
//! (spec §4.2), generalizing `clixon_xml_nsctx.c`.

use crate::error::{Error, Result};
use crate::utils::nodeid_split;

use super::node::{xmlns_attrs, XmlNodeId, XmlTree};

/// Walk from `node` toward the root examining `xmlns`/`xmlns:prefix`
/// attributes, returning the nearest binding for `prefix` (`None` for
/// the default namespace).
pub fn resolve(tree: &XmlTree, node: XmlNodeId, prefix: Option<&str>) -> Option<String> {
    for attr in xmlns_attrs(tree, node) {
        let n = tree.get(attr);
        let bound_prefix = if n.prefix.is_none() {
            None
        } else {
            Some(n.name.as_ref())
        };
        if bound_prefix == prefix {
            return n.value.as_ref().map(|s| s.to_string());
        }
    }
    None
}

fn add_xmlns_attr(tree: &mut XmlTree, node: XmlNodeId, prefix: Option<&str>, uri: &str) {
    let attr = match prefix {
        None => tree.new_attribute("xmlns", None, uri),
        Some(p) => tree.new_attribute(p, Some("xmlns"), uri),
    };
    // Keep namespace declarations first, matching `xml_sort` in the
    // source ("Ensure attr is first").
    tree.prepend(node, attr);
}

/// For each prefix used by `dst`'s own element name, ensure it
/// resolves the same way it did under `src`'s context. `dst_parent`
/// is consulted (not `dst` itself, which may not be linked into the
/// tree yet) to decide whether a binding already covers `dst`.
pub fn assign_element(
    src: &XmlTree,
    src_node: XmlNodeId,
    dst: &mut XmlTree,
    dst_node: XmlNodeId,
    dst_parent: XmlNodeId,
) -> Result<()> {
    let prefix = dst.get(dst_node).prefix.clone();
    let prefix = prefix.as_deref();
    propagate_prefix(src, src_node, dst, dst_node, dst_parent, prefix)
}

/// If `body_text` has the `prefix:local` shape of an identityref-like
/// value, ensure `prefix` resolves in `dst`'s own context, copying the
/// binding from `src` if `dst` doesn't have it yet.
pub fn assign_body(
    src: &XmlTree,
    src_node: XmlNodeId,
    body_text: &str,
    dst: &mut XmlTree,
    dst_node: XmlNodeId,
) -> Result<()> {
    let (prefix, _local) = nodeid_split(body_text);
    let Some(prefix) = prefix else {
        return Ok(());
    };
    propagate_prefix(src, src_node, dst, dst_node, dst_node, Some(prefix))
}

/// Shared collision/propagation logic: `check_node` is where we look
/// for a binding that might already cover `dst_node`; the new
/// attribute, if any, is always attached directly to `dst_node`.
fn propagate_prefix(
    src: &XmlTree,
    src_node: XmlNodeId,
    dst: &mut XmlTree,
    dst_node: XmlNodeId,
    check_node: XmlNodeId,
    prefix: Option<&str>,
) -> Result<()> {
    let Some(src_uri) = resolve(src, src_node, prefix) else {
        // The source itself doesn't know this prefix either; nothing
        // to propagate (mirrors `ns0 == NULL` in the source).
        return Ok(());
    };
    match resolve(dst, check_node, prefix) {
        Some(existing) if existing == src_uri => Ok(()),
        Some(existing) => Err(Error::Schema(format!(
            "namespace collision for prefix {:?}: {} vs {}",
            prefix, existing, src_uri
        ))),
        None => {
            add_xmlns_attr(dst, dst_node, prefix, &src_uri);
            Ok(())
        }
    }
}
