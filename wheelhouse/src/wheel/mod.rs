//! Wheel filename inspection.
//!
//! A wheel filename encodes interpreter, ABI, and platform tags, e.g.
//! `cryptography-42.0.5-cp39-abi3-macosx_10_12_universal2.whl`. This
//! module extracts the interpreter/ABI tags with a small fixed grammar
//! rather than a full filename parse; the tags appear as `cp312`,
//! `cp38-abi3`, `py3`, or `py2.py3` and are parsed once into
//! [`PythonTag`] values, then evaluated against a target.

mod compat;

pub use compat::is_compatible;

use std::sync::OnceLock;

use regex::Regex;

use crate::target::TargetEnvironment;

/// Filename extension of a binary wheel artifact.
pub const WHEEL_EXT: &str = ".whl";

/// Filename extension of a source distribution artifact.
pub const SDIST_EXT: &str = ".tar.gz";

/// An interpreter/ABI tag extracted from a wheel filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonTag {
    /// `py3` or `py2.py3`: pure-python build, runs on any interpreter.
    Universal,
    /// `cp312`: CPython build for exactly this minor version.
    Exact { major: u32, minor: u32 },
    /// `cp38-abi3`: stable ABI build, runs on this minor version and any
    /// later one in the same major line.
    StableAbi { major: u32, minor: u32 },
}

impl PythonTag {
    /// Whether an artifact carrying this tag can run on `target`.
    pub fn matches(&self, target: &TargetEnvironment) -> bool {
        match *self {
            PythonTag::Universal => true,
            PythonTag::Exact { major, minor } => {
                major == target.python_major && minor == target.python_minor
            }
            // The stable ABI is forward-compatible only: a cp38-abi3
            // build runs on 3.8 and later, never on 3.7.
            PythonTag::StableAbi { major, minor } => {
                major == target.python_major && minor <= target.python_minor
            }
        }
    }
}

/// Tag grammar: `cp<digits>` with an optional `-abi<digits>` qualifier,
/// or `py<digits>` optionally doubled as `py2.py3`.
fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"cp\d+(?:-abi\d+)?|py\d+(?:\.py\d+)?").unwrap())
}

/// Extract all interpreter/ABI tags from a wheel filename.
///
/// Unparseable version digits (a bare `cp3` with no minor) are skipped
/// rather than guessed at; absence of tags is meaningful to callers and
/// treated permissively.
pub fn python_tags(filename: &str) -> Vec<PythonTag> {
    tag_pattern()
        .find_iter(filename)
        .filter_map(|m| parse_tag(m.as_str()))
        .collect()
}

/// Parse a single matched token into a tag.
fn parse_tag(token: &str) -> Option<PythonTag> {
    if token.starts_with("py") {
        return Some(PythonTag::Universal);
    }

    let stable_abi = token.contains("-abi");
    let digits = token
        .trim_start_matches("cp")
        .split('-')
        .next()
        .unwrap_or("");

    // cp312 encodes major 3, minor 12: one digit of major, the rest minor.
    let mut chars = digits.chars();
    let major = chars.next()?.to_digit(10)?;
    let rest: String = chars.collect();
    if rest.is_empty() {
        return None;
    }
    let minor = rest.parse::<u32>().ok()?;

    if stable_abi {
        Some(PythonTag::StableAbi { major, minor })
    } else {
        Some(PythonTag::Exact { major, minor })
    }
}

/// Whether a filename names a binary wheel.
pub fn is_wheel(filename: &str) -> bool {
    filename.ends_with(WHEEL_EXT)
}

/// Whether a filename names a source distribution.
pub fn is_sdist(filename: &str) -> bool {
    filename.ends_with(SDIST_EXT)
}
