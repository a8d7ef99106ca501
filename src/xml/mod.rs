//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The XML instance tree and everything read off it during a write:
//! structure ([`node`]), namespace propagation ([`nsctx`]), and
//! edit-config attributes ([`attr`]).

mod attr;
mod node;
mod nsctx;

pub use attr::{read as read_attrs, Anchor, EditOp, InsertSpec, NodeAttrs, NETCONF_BASE_NS, YANG_XML_NS};
pub use node::{Kind, NodeFlags, XmlNode, XmlNodeId, XmlTree};
pub use nsctx::{assign_body, assign_element, resolve as resolve_namespace};
