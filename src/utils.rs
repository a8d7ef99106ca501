//
// Copyright (c) The yang-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Small string helpers shared by the attribute reader, namespace
//! resolver, and modification engine.

/// Trim leading/trailing whitespace, matching `clixon_trim2(s, " \t\n")`.
///
/// Used for `enumeration`/`bits`/`identityref` leaf bodies, which the
/// original engine normalizes before comparison or namespace lookup.
pub(crate) fn trim_body(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '\t' || c == '\n')
}

/// Split a `nodeid`-shaped string (`prefix:local` or bare `local`) into
/// its optional prefix and local part, mirroring `nodeid_split()`.
pub(crate) fn nodeid_split(s: &str) -> (Option<&str>, &str) {
    match s.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, s),
    }
}
