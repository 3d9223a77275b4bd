// Identity service
//
// Every named entity gets a stable numeric id derived from its canonical
// qualified name. Two entities with the same canonical name share an id;
// that is the design contract (ids index across a diagram). Distinct names
// hashing to the same id is a fatal model error, detected at merge time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Stable 61-bit identifier of a diagram element
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct DiagramId(pub u64);

impl DiagramId {
    /// Derive the id of a canonical qualified name
    ///
    /// The low 64 bits of SHA-256 are shifted right by 3; the shift is part
    /// of the persisted-diagram contract and must not change.
    pub fn of(name: &str) -> Self {
        let canonical = canonicalize(name);
        let digest = Sha256::digest(canonical.as_bytes());
        let word = u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"));
        DiagramId(word >> 3)
    }

    /// Derive the id of a file node in an include diagram
    pub fn of_path(path: &Path) -> Self {
        Self::of(&path.to_string_lossy())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a qualified name before hashing
///
/// Collapses the `::::` runs produced when anonymous namespaces are
/// stripped, normalizes template argument whitespace, and folds the
/// pre-C++11 `> >` spelling.
pub fn canonicalize(name: &str) -> String {
    let mut result = name.replace("(anonymous namespace)", "");
    while result.contains("::::") {
        result = result.replace("::::", "::");
    }
    result = result.replace(", ", ",");
    while result.contains("> >") {
        result = result.replace("> >", ">>");
    }
    result.trim().trim_start_matches("::").to_string()
}
