//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Configuration options consumed by the datastore write engine.
//!
//! The command shell, socket server, and plugin loader all have their
//! own configuration surfaces; this is just the subset of
//! `CLICON_*`-style options (see spec §6) that `Handle`/`modify`
//! actually branch on.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `datastore-cache`: whether a datastore's base tree is held in memory
/// across calls to `put`, or re-read from disk every time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Cache,
    NoCache,
}

impl Default for CacheMode {
    fn default() -> Self {
        CacheMode::Cache
    }
}

/// `xmldb-format`: on-disk serialization used for datastore files.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    Xml,
    Json,
}

impl Default for StoreFormat {
    fn default() -> Self {
        StoreFormat::Xml
    }
}

/// Options consumed by the core write engine (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Options {
    /// `datastore-cache`
    pub datastore_cache: CacheMode,
    /// `xmldb-format`
    pub xmldb_format: StoreFormat,
    /// `xmldb-pretty`
    pub xmldb_pretty: bool,
    /// `xmldb-modstate`
    pub xmldb_modstate: bool,
    /// `unknown-as-anydata`
    pub unknown_as_anydata: bool,
    /// `netconf-default-namespace`
    pub netconf_default_namespace: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            datastore_cache: CacheMode::default(),
            xmldb_format: StoreFormat::default(),
            xmldb_pretty: false,
            xmldb_modstate: true,
            unknown_as_anydata: false,
            netconf_default_namespace: None,
        }
    }
}

impl Options {
    /// Parse options from a TOML document. The command shell's own
    /// configuration file is out of this crate's scope; this exists so
    /// an embedder can keep the same `[datastore]`-style table this
    /// crate's options reflect, without hand-rolling a parser.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read and parse a TOML options file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml_str(&data)
            .map_err(|e| Error::Schema(format!("invalid options file: {e}")))
    }
}
