//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The datastore cache and top-level `put` driver (spec §4.6),
//! generalizing `xmldb_put()`/`xmldb_dump()`.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::modify::{self, Ambient, PutOutcome};
use crate::nacm::NacmPolicy;
use crate::options::{CacheMode, Options};
use crate::persist;
use crate::xml::{EditOp, NodeFlags, XmlNodeId, XmlTree};
use crate::yang::{Keyword, YangContext};

struct DatastoreEntry {
    tree: XmlTree,
}

/// Owns the loaded schema, NACM policy, write options, and the set of
/// datastore files `put` reads and writes.
pub struct Handle {
    pub options: Options,
    pub yctx: YangContext,
    pub nacm: NacmPolicy,
    dir: PathBuf,
    entries: HashMap<String, DatastoreEntry>,
}

impl Handle {
    pub fn new(
        dir: impl Into<PathBuf>,
        options: Options,
        yctx: YangContext,
        nacm: NacmPolicy,
    ) -> Self {
        Self {
            options,
            yctx,
            nacm,
            dir: dir.into(),
            entries: HashMap::new(),
        }
    }

    fn file_path(&self, db: &str) -> PathBuf {
        self.dir.join(db)
    }

    pub fn datastore_path(&self, db: &str) -> PathBuf {
        self.file_path(db)
    }

    fn load(&mut self, db: &str) -> Result<()> {
        if self.entries.contains_key(db) {
            return Ok(());
        }
        let tree = self.read_datastore(db)?;
        self.entries.insert(db.to_string(), DatastoreEntry { tree });
        Ok(())
    }

    /// Read a datastore's persisted tree without registering it in the
    /// write cache, for callers (the startup coordinator) that treat it
    /// as a one-shot modification source rather than a `put` target.
    pub fn read_datastore(&self, db: &str) -> Result<XmlTree> {
        let path = self.file_path(db);
        if !path.exists() {
            return Ok(XmlTree::new_config_root());
        }
        let data = fs::read_to_string(&path)?;
        persist::read(&data, self.options.xmldb_format)
    }

    fn evict_if_uncached(&mut self, db: &str) {
        if self.options.datastore_cache == CacheMode::NoCache {
            self.entries.remove(db);
        }
    }

    /// Apply one edit-config modification tree to `db`, matching
    /// `xmldb_put()`'s cache/merge/prune/persist sequence.
    ///
    /// Spec §7: a failure partway through (a rejected edit, a pruning
    /// bug, an I/O error writing the file) must never leave the cached
    /// base tree in a partially-mutated state. A snapshot is taken
    /// before touching `entry.tree` and restored verbatim on any `Err`
    /// from either the modify or the persist step.
    pub fn put(&mut self, db: &str, op: EditOp, x1: &XmlTree, user: &str) -> Result<PutOutcome> {
        self.load(db)?;
        let entry = self.entries.get_mut(db).expect("just loaded");
        let snapshot = entry.tree.clone();
        let x0_root = entry.tree.root();

        let amb = Ambient {
            x1,
            user,
            nacm: &self.nacm,
            unknown_as_anydata: self.options.unknown_as_anydata,
            default_namespace: self.options.netconf_default_namespace.as_deref(),
        };
        let mut outcome = PutOutcome::default();
        if let Err(e) = modify::modify_top(&mut self.yctx, &mut entry.tree, amb, op, &mut outcome) {
            self.entries.get_mut(db).expect("just loaded").tree = snapshot;
            return Err(e);
        }

        let entry = self.entries.get_mut(db).expect("just loaded");
        prune_none_flagged(&mut entry.tree, x0_root);
        mark_and_prune_defaults(&self.yctx, &mut entry.tree, x0_root);

        if let Err(e) = self.persist(db) {
            self.entries.get_mut(db).expect("just loaded").tree = snapshot;
            return Err(e);
        }
        self.evict_if_uncached(db);
        Ok(outcome)
    }

    /// Merge `x1` into `db` without the edit-config-specific
    /// pruning/default bookkeeping (the startup coordinator's internal
    /// merges, spec §4.ADD item 3).
    pub fn db_merge(&mut self, db: &str, x1: &XmlTree, user: &str) -> Result<()> {
        self.load(db)?;
        let entry = self.entries.get_mut(db).expect("just loaded");
        let snapshot = entry.tree.clone();
        let amb = Ambient {
            x1,
            user,
            nacm: &self.nacm,
            unknown_as_anydata: self.options.unknown_as_anydata,
            default_namespace: self.options.netconf_default_namespace.as_deref(),
        };
        let mut outcome = PutOutcome::default();
        if let Err(e) = modify::modify_top(&mut self.yctx, &mut entry.tree, amb, EditOp::Merge, &mut outcome) {
            self.entries.get_mut(db).expect("just loaded").tree = snapshot;
            return Err(e);
        }
        if let Err(e) = self.persist(db) {
            self.entries.get_mut(db).expect("just loaded").tree = snapshot;
            return Err(e);
        }
        Ok(())
    }

    /// Replace `db`'s content with an empty `<config/>`.
    pub fn reset(&mut self, db: &str) -> Result<()> {
        self.entries
            .insert(db.to_string(), DatastoreEntry { tree: XmlTree::new_config_root() });
        self.persist(db)
    }

    fn persist(&mut self, db: &str) -> Result<()> {
        let modstate_id = if self.options.xmldb_modstate {
            let entry = self.entries.get_mut(db).expect("loaded");
            Some(annotate_module_state(&self.yctx, &mut entry.tree))
        } else {
            None
        };

        let entry = self.entries.get(db).expect("loaded");
        let text = persist::write(&entry.tree, self.options.xmldb_format, self.options.xmldb_pretty);
        write_atomic(&self.file_path(db), &text)?;

        if let Some(id) = modstate_id {
            self.entries.get_mut(db).expect("loaded").tree.purge(id);
        }
        Ok(())
    }
}

/// Splice a `<modules-state>` subtree listing every loaded module onto
/// `tree`, for the write in [`Handle::persist`]; removed again right
/// after (spec §4.ADD item 6). Every registered module is treated as
/// `conformance-type = implement`: this engine has no separate
/// import-only module registry to distinguish the two.
fn annotate_module_state(yctx: &YangContext, tree: &mut XmlTree) -> XmlNodeId {
    let root = tree.root();
    let state = tree.new_element("modules-state", Some("ietf-yang-library".into()));
    tree.append(root, state);
    for (name, namespace, revision) in yctx.modules() {
        let module = tree.new_element("module", None);
        tree.append(state, module);

        let name_el = tree.new_element("name", None);
        tree.set_body_text(name_el, name.to_string());
        tree.append(module, name_el);

        if let Some(revision) = revision {
            let rev_el = tree.new_element("revision", None);
            tree.set_body_text(rev_el, revision.to_string());
            tree.append(module, rev_el);
        }

        let ns_el = tree.new_element("namespace", None);
        tree.set_body_text(ns_el, namespace.to_string());
        tree.append(module, ns_el);

        let conf_el = tree.new_element("conformance-type", None);
        tree.set_body_text(conf_el, "implement");
        tree.append(module, conf_el);
    }
    state
}

/// Top-down purge of any subtree still tagged `PROVISIONAL`: nothing
/// real ever happened under it (spec §4.6 step 2).
fn prune_none_flagged(tree: &mut XmlTree, root: XmlNodeId) {
    let top: Vec<XmlNodeId> = tree.element_children(root).collect();
    for id in top {
        prune_subtree(tree, id);
    }
}

fn prune_subtree(tree: &mut XmlTree, id: XmlNodeId) {
    if tree.get(id).flags.contains(NodeFlags::PROVISIONAL) {
        tree.purge(id);
        return;
    }
    let children: Vec<XmlNodeId> = tree.element_children(id).collect();
    for child in children {
        prune_subtree(tree, child);
    }
}

/// Bottom-up: prune a leaf whose body equals its schema default, then
/// prune a no-presence container once it has been emptied out this
/// way (spec §4.6 step 3).
fn mark_and_prune_defaults(yctx: &YangContext, tree: &mut XmlTree, root: XmlNodeId) {
    let top: Vec<XmlNodeId> = tree.element_children(root).collect();
    for id in top {
        mark_and_prune_subtree(yctx, tree, id);
    }
}

fn mark_and_prune_subtree(yctx: &YangContext, tree: &mut XmlTree, id: XmlNodeId) -> bool {
    let Some(y) = tree.get(id).yang else {
        return false;
    };

    let children: Vec<XmlNodeId> = tree.element_children(id).collect();
    for child in children {
        mark_and_prune_subtree(yctx, tree, child);
    }

    match yctx.keyword(y) {
        Keyword::Leaf => {
            let is_default = match (yctx.default_value(y), tree.body_text(id)) {
                (Some(default), Some(body)) => body == default,
                _ => false,
            };
            if is_default {
                tree.get_mut(id).flags.insert(NodeFlags::DEFAULT);
                tree.purge(id);
                return true;
            }
            false
        }
        _ => {
            if yctx.is_no_presence_container(y) && tree.element_child_count(id) == 0 {
                tree.get_mut(id).flags.insert(NodeFlags::DEFAULT);
                tree.purge(id);
                return true;
            }
            false
        }
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("datastore")
    ));
    {
        let mut f = fs::File::create(&tmp_path)?;
        f.write_all(contents.as_bytes())?;
        f.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
