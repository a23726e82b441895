//! Release version resolution and artifact selection.
//!
//! The registry occasionally lists a release under a slightly different
//! version string than the one pinned in a requirements file (most often
//! a `.post0` re-release). [`resolve_version`] papers over that, and
//! [`select_artifact`] picks the best artifact for a target platform
//! from the resolved file list.

use tracing::warn;

use crate::target::TargetEnvironment;
use crate::wheel::{self, PythonTag};

use super::{DistKind, PackageInfo, ReleaseFile};
use crate::error::RegistryError;

/// Resolve a requested version against the registry's release map.
///
/// Resolution order: the exact string; with a trailing `.post` suffix
/// stripped; with `.post0` appended; finally the newest known version
/// that extends the requested base. Requested strings are trimmed of
/// stray whitespace and trailing dots first, since failure records can
/// carry them.
///
/// Returns the version string actually found together with its files.
pub fn resolve_version<'a>(
    info: &'a PackageInfo,
    requested: Option<&str>,
) -> Result<(String, &'a [ReleaseFile]), RegistryError> {
    let requested = match requested {
        Some(v) => v.trim().trim_end_matches('.').to_string(),
        None => info.latest_version().to_string(),
    };

    if let Some(files) = release_files(info, &requested) {
        return Ok((requested, files));
    }

    // A pinned version and its .post re-release are used
    // interchangeably on the registry; try the other spelling.
    if requested.contains(".post") {
        let base = requested
            .split(".post")
            .next()
            .unwrap_or(&requested)
            .to_string();
        if let Some(files) = release_files(info, &base) {
            return Ok((base, files));
        }
    } else {
        let post = format!("{}.post0", requested);
        if let Some(files) = release_files(info, &post) {
            return Ok((post, files));
        }
    }

    // Fuzzy match: the first known version that extends the requested
    // base, highest spelling first.
    let base = requested.split(".post").next().unwrap_or(&requested);
    let mut versions: Vec<&String> = info.releases.keys().collect();
    versions.sort_unstable_by(|a, b| b.cmp(a));
    for version in versions {
        if version.starts_with(base) {
            if let Some(files) = release_files(info, version) {
                return Ok((version.clone(), files));
            }
        }
    }

    Err(RegistryError::VersionNotFound {
        name: info.info.name.clone(),
        version: requested,
    })
}

fn release_files<'a>(info: &'a PackageInfo, version: &str) -> Option<&'a [ReleaseFile]> {
    info.releases
        .get(version)
        .filter(|files| !files.is_empty())
        .map(|files| files.as_slice())
}

/// Select the best artifact for `target` from a release's file list.
///
/// Strict priority cascade, first match wins:
/// 1. wheel tagged for exactly this interpreter and platform
/// 2. wheel tagged for this interpreter under an equivalent legacy
///    platform spelling
/// 3. pure-python wheel
/// 4. any wheel the classifier accepts that carries no unqualified tag
///    for a different interpreter minor
/// 5. the first wheel at all (logged; compatibility uncertain)
/// 6. the first source distribution (caller must compile locally)
pub fn select_artifact<'a>(
    files: &'a [ReleaseFile],
    target: &TargetEnvironment,
) -> Option<&'a ReleaseFile> {
    let wheels: Vec<&ReleaseFile> = files
        .iter()
        .filter(|f| f.packagetype == DistKind::BdistWheel)
        .collect();

    let cp_tag = target.cp_tag();
    let platform_tag = target.platform_tag();

    if let Some(wheel) = wheels
        .iter()
        .copied()
        .find(|w| w.filename.contains(&cp_tag) && w.filename.contains(&platform_tag))
    {
        return Some(wheel);
    }

    for alt in target.alt_platform_tags() {
        if let Some(wheel) = wheels
            .iter()
            .copied()
            .find(|w| w.filename.contains(&cp_tag) && w.filename.contains(alt))
        {
            return Some(wheel);
        }
    }

    if let Some(wheel) = wheels.iter().copied().find(|w| {
        w.filename.contains("none-any")
            && (w.filename.contains("py3") || w.filename.contains("py2.py3"))
    }) {
        return Some(wheel);
    }

    if let Some(wheel) = wheels.iter().copied().find(|w| {
        wheel::is_compatible(&w.filename, target) && !has_conflicting_exact_tag(&w.filename, target)
    }) {
        return Some(wheel);
    }

    if let Some(wheel) = wheels.first().copied() {
        warn!(
            filename = %wheel.filename,
            "no confident interpreter match, using first available wheel"
        );
        return Some(wheel);
    }

    if let Some(sdist) = files.iter().find(|f| f.packagetype == DistKind::Sdist) {
        warn!(
            filename = %sdist.filename,
            "no wheel available, falling back to source distribution"
        );
        return Some(sdist);
    }

    None
}

/// An unqualified exact tag naming some other interpreter minor makes a
/// wheel too risky for the classifier tier of the cascade.
fn has_conflicting_exact_tag(filename: &str, target: &TargetEnvironment) -> bool {
    wheel::python_tags(filename).iter().any(|tag| match *tag {
        PythonTag::Exact { major, minor } => {
            major != target.python_major || minor != target.python_minor
        }
        _ => false,
    })
}
