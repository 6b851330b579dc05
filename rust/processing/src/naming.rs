// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Name extraction for matching elements against material tables.
//!
//! Product names usually look like `Family:Type:12345`, `Wall_Ext_01` or
//! `Floor 250mm`. The display name strips the instance suffix so every
//! instance of a type maps to the same table row.

use regex::Regex;
use std::sync::LazyLock;

static SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(.*)_|\s+[0-9]+ ?mm").ok());
static REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\((.*)(\.|:).*\)\+?").ok());

/// Type-level name of an element.
///
/// Keeps the first two `:` separated parts, then cuts everything from the
/// last `_` or from a thickness suffix such as ` 200mm`.
pub fn display_name(name: &str) -> String {
    let name = if name.contains(':') {
        name.splitn(3, ':').take(2).collect::<Vec<_>>().join(":")
    } else {
        name.to_string()
    };

    let stripped = SUFFIX
        .as_ref()
        .and_then(|re| re.captures(&name))
        .map(|caps| match caps.get(1) {
            Some(prefix) => prefix.as_str().to_string(),
            // Thickness suffix: keep what precedes it
            None => name[..caps.get(0).map_or(name.len(), |m| m.start())].to_string(),
        });
    stripped.unwrap_or(name)
}

/// Reference code inside parentheses, e.g. `"Screed (B.12.3)"` gives `"B.12"`
pub fn reference(text: &str) -> Option<String> {
    REFERENCE
        .as_ref()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
