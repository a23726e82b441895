//! Wheel compatibility classification.
//!
//! Decides whether an artifact filename is usable under a target
//! interpreter and platform. The check is deliberately biased toward
//! keeping artifacts: anything it cannot classify with confidence is
//! reported compatible, so a pruning pass never deletes something that
//! might still install.

use crate::target::{OsFamily, TargetEnvironment};

use super::{python_tags, PythonTag};

/// macOS fat-binary platform marker; such wheels run on either CPU.
const UMBRELLA_TAG: &str = "universal2";

/// Whether the wheel named by `filename` can run on `target`.
///
/// The evaluation order matters and is part of the contract:
/// a wheel built for the other CPU architecture is rejected before any
/// interpreter tag is consulted, so a `cp312` wheel for the wrong CPU
/// never survives on an otherwise matching interpreter.
pub fn is_compatible(filename: &str, target: &TargetEnvironment) -> bool {
    // Pure-python wheels carry no interpreter or platform dependency.
    if filename.contains("none-any") {
        return true;
    }

    let umbrella = filename.contains(UMBRELLA_TAG);
    if umbrella && target.os == OsFamily::MacOs {
        return true;
    }

    // Built for the other CPU of this OS family: can never load.
    if !umbrella {
        for foreign in target.foreign_arch_tags() {
            if filename.contains(foreign) {
                return false;
            }
        }
    }

    let tags = python_tags(filename);
    if tags.is_empty() {
        // Nothing to judge by; keep rather than delete.
        return true;
    }

    if tags.iter().any(|tag| tag.matches(target)) {
        return true;
    }

    // Nothing matched. An unqualified build for some other minor
    // version is a hard mismatch, and so is a stable-ABI floor above
    // the target: abi3 is forward-compatible only, never backward.
    if tags
        .iter()
        .any(|tag| matches!(tag, PythonTag::Exact { .. }))
    {
        return false;
    }
    if tags.iter().any(
        |tag| matches!(tag, PythonTag::StableAbi { major, .. } if *major == target.python_major),
    ) {
        return false;
    }

    true
}
