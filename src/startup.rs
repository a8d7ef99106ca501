//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Startup coordination: choosing which datastore feeds the initial
//! `running` configuration, with rollback to a `failsafe` datastore on
//! error (spec §4.ADD item 3), generalizing `backend_startup.c`.

use std::fs;
use std::path::Path;

use crate::datastore::Handle;
use crate::error::Result;
use crate::logging;
use crate::xml::XmlTree;

/// Which datastore source ended up feeding `running`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartupMode {
    /// A pending `rollback` datastore from a confirmed-commit in
    /// progress was committed cleanly; `rollback` has been deleted.
    Rollback,
    /// Loaded from `startup` and committed cleanly.
    Startup,
    /// The preferred source (`rollback`, or `startup` when no rollback
    /// was pending) was rejected; rolled back to `failsafe`.
    Failsafe,
    /// Neither the preferred source nor `failsafe` could be applied;
    /// `running` is whatever `reset` left it as.
    None,
}

/// A plugin's hook to reset its own state when the extra-XML merge
/// path resets the target datastore first (spec §4.ADD item 4).
pub trait ResetCallback {
    fn reset(&mut self, db: &str);
}

/// Run the startup/rollback/failsafe sequence (spec §4.7): reset
/// `running`, then pick a source. If `confirmed_commit` is enabled and
/// a `rollback` datastore file exists (a confirmed-commit was
/// interrupted before it could be confirmed or cancelled), commit
/// `rollback` into `running` and delete it on success, or rename it
/// aside and fall back to `failsafe` on validation failure. Otherwise
/// commit `startup` into `running`, with the same `startup`-rejected
/// fallback to `failsafe`. If `extra_xml` is given and the preferred
/// source was accepted, reset every registered callback and merge it
/// in too.
pub fn coordinate(
    handle: &mut Handle,
    confirmed_commit: bool,
    extra_xml: Option<&XmlTree>,
    resets: &mut [Box<dyn ResetCallback>],
    user: &str,
) -> Result<StartupMode> {
    handle.reset("running")?;

    let rollback_path = handle.datastore_path("rollback");
    if confirmed_commit && rollback_path.exists() {
        return match db_merge_from(handle, "rollback", "running", user) {
            Ok(()) => {
                fs::remove_file(&rollback_path)?;
                if let Some(extra) = extra_xml {
                    for reset in resets.iter_mut() {
                        reset.reset("running");
                    }
                    handle.db_merge("running", extra, user)?;
                }
                Ok(StartupMode::Rollback)
            }
            Err(e) => {
                log::warn!(
                    target: logging::TARGET,
                    "rollback datastore rejected, renaming aside: {e}"
                );
                rename_errored(&rollback_path)?;
                Ok(fall_back_to_failsafe(handle, user))
            }
        };
    }

    let mode = match db_merge_from(handle, "startup", "running", user) {
        Ok(()) => {
            if let Some(extra) = extra_xml {
                for reset in resets.iter_mut() {
                    reset.reset("running");
                }
                handle.db_merge("running", extra, user)?;
            }
            StartupMode::Startup
        }
        Err(e) => {
            log::warn!(
                target: logging::TARGET,
                "startup datastore rejected, renaming aside: {e}"
            );
            rename_errored(&handle.datastore_path("startup"))?;
            fall_back_to_failsafe(handle, user)
        }
    };

    Ok(mode)
}

fn fall_back_to_failsafe(handle: &mut Handle, user: &str) -> StartupMode {
    match db_merge_from(handle, "failsafe", "running", user) {
        Ok(()) => StartupMode::Failsafe,
        Err(e) => {
            log::warn!(
                target: logging::TARGET,
                "failsafe datastore also rejected: {e}"
            );
            StartupMode::None
        }
    }
}

fn db_merge_from(handle: &mut Handle, source_db: &str, target_db: &str, user: &str) -> Result<()> {
    let source_tree = handle.read_datastore(source_db)?;
    handle.db_merge(target_db, &source_tree, user)
}

/// Rename a rejected datastore file aside as `.error`, `.error.1`,
/// `.error.2`, ... so it never collides with a previous failure left
/// on disk.
fn rename_errored(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let base = path.file_name().and_then(|n| n.to_str()).unwrap_or("datastore");
    let mut candidate = path.with_file_name(format!("{base}.error"));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{base}.error.{n}"));
        n += 1;
    }
    fs::rename(path, candidate)?;
    Ok(())
}

/// Parse an extra-XML file supplied out-of-band (e.g. via a `-c`-style
/// flag) for the extra-XML merge path (spec §4.ADD item 4). Always
/// plain XML, independent of `xmldb-format`, matching the source's own
/// convention for this one file.
pub fn load_extra_xml(path: &Path) -> Result<XmlTree> {
    let data = fs::read_to_string(path)?;
    crate::persist::read(&data, crate::options::StoreFormat::Xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nacm::NacmPolicy;
    use crate::options::Options;
    use crate::yang::{Keyword, YangContext};

    fn fixture_yctx() -> YangContext {
        let mut yctx = YangContext::new();
        let module = yctx.add_module("ex", "urn:ex");
        let c = yctx.add_container_like(module, Keyword::Container, "c", "ex", "urn:ex", false);
        yctx.add_leaf(c, "a", "ex", "urn:ex", "string", Some("d"));
        yctx
    }

    fn write_datastore(dir: &Path, db: &str, body: &str) {
        fs::write(dir.join(db), body).unwrap();
    }

    #[test]
    fn startup_datastore_feeds_running_when_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        write_datastore(
            dir.path(),
            "startup",
            "<c xmlns=\"urn:ex\"><a>custom</a></c>",
        );
        let mut handle = Handle::new(
            dir.path(),
            Options::default(),
            fixture_yctx(),
            NacmPolicy::new(false, vec![]),
        );
        let mode = coordinate(&mut handle, false, None, &mut [], "alice").unwrap();
        assert_eq!(mode, StartupMode::Startup);
        let running = handle.read_datastore("running").unwrap();
        let c = running.element_by_name(running.root(), "c").unwrap();
        assert_eq!(running.child_body_text(c, "a"), Some("custom"));
    }

    #[test]
    fn malformed_startup_falls_back_to_failsafe_and_is_renamed_aside() {
        let dir = tempfile::tempdir().unwrap();
        write_datastore(dir.path(), "startup", "<c xmlns=\"urn:ex\"><unrecognized/></c>");
        write_datastore(
            dir.path(),
            "failsafe",
            "<c xmlns=\"urn:ex\"><a>safe</a></c>",
        );
        let mut handle = Handle::new(
            dir.path(),
            Options::default(),
            fixture_yctx(),
            NacmPolicy::new(false, vec![]),
        );
        let mode = coordinate(&mut handle, false, None, &mut [], "alice").unwrap();
        assert_eq!(mode, StartupMode::Failsafe);
        assert!(dir.path().join("startup.error").exists());
        let running = handle.read_datastore("running").unwrap();
        let c = running.element_by_name(running.root(), "c").unwrap();
        assert_eq!(running.child_body_text(c, "a"), Some("safe"));
    }

    #[test]
    fn pending_rollback_is_committed_and_then_deleted() {
        let dir = tempfile::tempdir().unwrap();
        write_datastore(dir.path(), "startup", "<c xmlns=\"urn:ex\"><a>stale</a></c>");
        write_datastore(
            dir.path(),
            "rollback",
            "<c xmlns=\"urn:ex\"><a>pending</a></c>",
        );
        let mut handle = Handle::new(
            dir.path(),
            Options::default(),
            fixture_yctx(),
            NacmPolicy::new(false, vec![]),
        );
        let mode = coordinate(&mut handle, true, None, &mut [], "alice").unwrap();
        assert_eq!(mode, StartupMode::Rollback);
        assert!(!dir.path().join("rollback").exists());
        let running = handle.read_datastore("running").unwrap();
        let c = running.element_by_name(running.root(), "c").unwrap();
        assert_eq!(running.child_body_text(c, "a"), Some("pending"));
    }

    #[test]
    fn rollback_ignored_when_confirmed_commit_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_datastore(dir.path(), "startup", "<c xmlns=\"urn:ex\"><a>fromstartup</a></c>");
        write_datastore(
            dir.path(),
            "rollback",
            "<c xmlns=\"urn:ex\"><a>pending</a></c>",
        );
        let mut handle = Handle::new(
            dir.path(),
            Options::default(),
            fixture_yctx(),
            NacmPolicy::new(false, vec![]),
        );
        let mode = coordinate(&mut handle, false, None, &mut [], "alice").unwrap();
        assert_eq!(mode, StartupMode::Startup);
        assert!(dir.path().join("rollback").exists());
        let running = handle.read_datastore("running").unwrap();
        let c = running.element_by_name(running.root(), "c").unwrap();
        assert_eq!(running.child_body_text(c, "a"), Some("fromstartup"));
    }

    #[test]
    fn malformed_rollback_falls_back_to_failsafe_and_is_renamed_aside() {
        let dir = tempfile::tempdir().unwrap();
        write_datastore(dir.path(), "startup", "<c xmlns=\"urn:ex\"><a>unused</a></c>");
        write_datastore(dir.path(), "rollback", "<c xmlns=\"urn:ex\"><unrecognized/></c>");
        write_datastore(dir.path(), "failsafe", "<c xmlns=\"urn:ex\"><a>safe</a></c>");
        let mut handle = Handle::new(
            dir.path(),
            Options::default(),
            fixture_yctx(),
            NacmPolicy::new(false, vec![]),
        );
        let mode = coordinate(&mut handle, true, None, &mut [], "alice").unwrap();
        assert_eq!(mode, StartupMode::Failsafe);
        assert!(dir.path().join("rollback.error").exists());
        assert!(!dir.path().join("rollback").exists());
        let running = handle.read_datastore("running").unwrap();
        let c = running.element_by_name(running.root(), "c").unwrap();
        assert_eq!(running.child_body_text(c, "a"), Some("safe"));
    }
}
