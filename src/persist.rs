//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Serializing and re-reading the datastore's own persisted files
//! (spec §4.6).
//!
//! This is not a general-purpose NETCONF/YANG XML or RFC 7951 JSON
//! parser — that surface is out of scope, since the modification
//! engine only ever consumes already-parsed trees. It only has to
//! round-trip what this crate itself wrote under `xmldb-format`.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::options::StoreFormat;
use crate::xml::{Kind, XmlNode, XmlNodeId, XmlTree};

pub(crate) fn write(tree: &XmlTree, format: StoreFormat, pretty: bool) -> String {
    match format {
        StoreFormat::Xml => write_xml(tree, pretty),
        StoreFormat::Json => write_json(tree),
    }
}

pub(crate) fn read(data: &str, format: StoreFormat) -> Result<XmlTree> {
    match format {
        StoreFormat::Xml => read_xml(data),
        StoreFormat::Json => read_json(data),
    }
}

fn qualified(node: &XmlNode) -> String {
    match &node.prefix {
        Some(p) => format!("{p}:{}", node.name),
        None => node.name.to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn write_xml(tree: &XmlTree, pretty: bool) -> String {
    let mut out = String::new();
    for child in tree.element_children(tree.root()) {
        write_element(tree, child, &mut out, 0, pretty);
    }
    out
}

fn write_element(tree: &XmlTree, id: XmlNodeId, out: &mut String, depth: usize, pretty: bool) {
    let indent = if pretty { "  ".repeat(depth) } else { String::new() };
    let nl = if pretty { "\n" } else { "" };
    let node = tree.get(id);
    let _ = write!(out, "{indent}<{}", qualified(node));
    for attr in tree
        .children(id)
        .filter(|&c| tree.get(c).kind == Kind::Attribute)
    {
        let a = tree.get(attr);
        let val = escape(a.value.as_deref().unwrap_or(""));
        let _ = write!(out, " {}=\"{val}\"", qualified(a));
    }

    let body = tree.body_text(id);
    let children: Vec<XmlNodeId> = tree.element_children(id).collect();
    if body.is_none() && children.is_empty() {
        out.push_str("/>");
        out.push_str(nl);
        return;
    }

    out.push('>');
    if let Some(text) = body {
        out.push_str(&escape(text));
    } else {
        out.push_str(nl);
        for child in children {
            write_element(tree, child, out, depth + 1, pretty);
        }
        out.push_str(&indent);
    }
    let _ = write!(out, "</{}>{nl}", qualified(node));
}

fn write_json(tree: &XmlTree) -> String {
    let mut map = serde_json::Map::new();
    for child in tree.element_children(tree.root()) {
        insert_json(tree, child, &mut map);
    }
    serde_json::to_string_pretty(&serde_json::Value::Object(map)).unwrap_or_default()
}

fn insert_json(tree: &XmlTree, id: XmlNodeId, map: &mut serde_json::Map<String, serde_json::Value>) {
    let key = qualified(tree.get(id));
    let value = element_to_json(tree, id);
    match map.get_mut(&key) {
        Some(serde_json::Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let prev = existing.take();
            *existing = serde_json::Value::Array(vec![prev, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

fn element_to_json(tree: &XmlTree, id: XmlNodeId) -> serde_json::Value {
    if let Some(text) = tree.body_text(id) {
        return serde_json::Value::String(text.to_string());
    }
    let mut map = serde_json::Map::new();
    for child in tree.element_children(id) {
        insert_json(tree, child, &mut map);
    }
    serde_json::Value::Object(map)
}

fn read_json(data: &str) -> Result<XmlTree> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| Error::Schema(format!("invalid datastore JSON: {e}")))?;
    let mut tree = XmlTree::new_config_root();
    let root = tree.root();
    if let serde_json::Value::Object(map) = value {
        for (key, val) in map {
            json_to_elements(&mut tree, root, &key, &val);
        }
    }
    Ok(tree)
}

fn json_to_elements(tree: &mut XmlTree, parent: XmlNodeId, key: &str, val: &serde_json::Value) {
    match val {
        serde_json::Value::Array(items) => {
            for item in items {
                json_to_elements(tree, parent, key, item);
            }
        }
        serde_json::Value::Object(map) => {
            let (prefix, name) = crate::utils::nodeid_split(key);
            let id = tree.new_element(name, prefix.map(Into::into));
            tree.append(parent, id);
            for (k, v) in map {
                json_to_elements(tree, id, k, v);
            }
        }
        serde_json::Value::String(s) => {
            let (prefix, name) = crate::utils::nodeid_split(key);
            let id = tree.new_element(name, prefix.map(Into::into));
            tree.append(parent, id);
            tree.set_body_text(id, s.clone());
        }
        other => {
            let (prefix, name) = crate::utils::nodeid_split(key);
            let id = tree.new_element(name, prefix.map(Into::into));
            tree.append(parent, id);
            tree.set_body_text(id, other.to_string());
        }
    }
}

/// A minimal recursive-descent reader for exactly the shape
/// [`write_xml`] produces: elements with optional attributes, and
/// either element children or a single text body, never both.
struct Parser<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn skip_ws(&mut self) {
        while self.pos < self.s.len() && self.s.as_bytes()[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(Error::Schema(format!(
                "malformed datastore XML: expected '{c}' at byte {}",
                self.pos
            )))
        }
    }

    fn parse_name(&mut self) -> Result<(Option<String>, String)> {
        let start = self.pos;
        while self.pos < self.s.len() {
            let c = self.rest().chars().next().unwrap();
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == ':' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(Error::Schema(format!(
                "malformed datastore XML: expected name at byte {start}"
            )));
        }
        let raw = &self.s[start..self.pos];
        Ok(match raw.split_once(':') {
            Some((p, l)) => (Some(p.to_string()), l.to_string()),
            None => (None, raw.to_string()),
        })
    }

    fn parse_element(&mut self, tree: &mut XmlTree) -> Result<XmlNodeId> {
        self.expect('<')?;
        let (prefix, name) = self.parse_name()?;
        let id = tree.new_element(name, prefix.map(Into::into));
        self.skip_ws();
        while self.rest().starts_with(|c: char| c.is_alphabetic()) {
            let (aprefix, aname) = self.parse_name()?;
            self.skip_ws();
            self.expect('=')?;
            self.skip_ws();
            let quote = if self.rest().starts_with('"') { '"' } else { '\'' };
            self.expect(quote)?;
            let vstart = self.pos;
            while self.pos < self.s.len() && !self.rest().starts_with(quote) {
                self.pos += 1;
            }
            let value = unescape(&self.s[vstart..self.pos]);
            self.expect(quote)?;
            let attr = tree.new_attribute(aname, aprefix.map(Into::into), value);
            tree.append(id, attr);
            self.skip_ws();
        }
        if self.rest().starts_with("/>") {
            self.pos += 2;
            return Ok(id);
        }
        self.expect('>')?;
        self.skip_ws();
        if self.rest().starts_with('<') && !self.rest().starts_with("</") {
            while self.rest().starts_with('<') && !self.rest().starts_with("</") {
                let child = self.parse_element(tree)?;
                tree.append(id, child);
                self.skip_ws();
            }
        } else if !self.rest().starts_with("</") {
            let tstart = self.pos;
            while self.pos < self.s.len() && !self.rest().starts_with('<') {
                self.pos += 1;
            }
            let text = unescape(&self.s[tstart..self.pos]);
            if !text.is_empty() {
                let body = tree.new_body(text);
                tree.append(id, body);
            }
        }
        self.expect('<')?;
        self.expect('/')?;
        self.parse_name()?;
        self.skip_ws();
        self.expect('>')?;
        Ok(id)
    }
}

fn read_xml(data: &str) -> Result<XmlTree> {
    let mut tree = XmlTree::new_config_root();
    let root = tree.root();
    let mut p = Parser { s: data, pos: 0 };
    p.skip_ws();
    while p.pos < p.s.len() {
        let id = p.parse_element(&mut tree)?;
        tree.append(root, id);
        p.skip_ws();
    }
    Ok(tree)
}
