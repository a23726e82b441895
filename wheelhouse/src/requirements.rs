//! Dependency list resolution.
//!
//! Wheelhouse does not resolve dependency graphs itself. It asks pip
//! for the full install set and falls back to parsing the requirements
//! file directly when pip is unavailable or uncooperative. Providers
//! are tried in a fixed order; the first one that yields packages wins:
//!
//! 1. `pip install --dry-run --report` (structured JSON, pip 22.2+)
//! 2. `pip install --dry-run` stdout scraping
//! 3. direct requirements-file parsing
//!
//! The interpreter defaults to `python3` and can be overridden with the
//! `WHEELHOUSE_PYTHON` environment variable.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::ResolveError;

/// One package to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// Pinned version; `None` means "latest the registry offers".
    pub version: Option<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// A way of turning a requirements file into a package list.
pub trait DependencyProvider {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Resolve the requirements file into packages, or explain why not.
    fn resolve(&self, requirements: &Path) -> Result<Vec<Requirement>, ResolveError>;
}

/// The Python interpreter used to invoke pip.
pub fn python_interpreter() -> String {
    std::env::var("WHEELHOUSE_PYTHON").unwrap_or_else(|_| "python3".to_string())
}

/// Resolve a requirements file into the full package list.
///
/// Providers are tried in order; a provider that errors or returns an
/// empty set falls through to the next. The direct file parse is also
/// the final fallback, so its result (and its errors, e.g. a missing
/// file) decide the outcome when pip cannot help.
pub fn resolve_dependencies(requirements: &Path) -> Result<Vec<Requirement>, ResolveError> {
    let providers: [&dyn DependencyProvider; 3] = [
        &PipReportProvider,
        &PipDryRunProvider,
        &RequirementsFileProvider,
    ];

    for provider in providers {
        match provider.resolve(requirements) {
            Ok(packages) if !packages.is_empty() => {
                debug!(
                    provider = provider.name(),
                    count = packages.len(),
                    "resolved dependency set"
                );
                return Ok(packages);
            }
            Ok(_) => {
                warn!(provider = provider.name(), "provider returned no packages");
            }
            Err(e) => {
                warn!(provider = provider.name(), "provider failed: {}", e);
            }
        }
    }

    RequirementsFileProvider.resolve(requirements)
}

/// Structured resolution via `pip install --dry-run --report -`.
pub struct PipReportProvider;

impl DependencyProvider for PipReportProvider {
    fn name(&self) -> &'static str {
        "pip-report"
    }

    fn resolve(&self, requirements: &Path) -> Result<Vec<Requirement>, ResolveError> {
        let output = Command::new(python_interpreter())
            .args(["-m", "pip", "install", "--dry-run", "--quiet", "--report", "-", "-r"])
            .arg(requirements)
            .output()
            .map_err(|e| ResolveError::PipFailed {
                reason: format!("could not run pip: {}", e),
            })?;

        if !output.status.success() {
            return Err(ResolveError::PipFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).map_err(|e| ResolveError::PipFailed {
                reason: format!("unreadable report: {}", e),
            })?;

        Ok(parse_pip_report(&report))
    }
}

/// Extract name/version pairs from a pip installation report.
fn parse_pip_report(report: &serde_json::Value) -> Vec<Requirement> {
    report
        .get("install")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let metadata = item.get("metadata")?;
                    let name = metadata.get("name")?.as_str()?;
                    let version = metadata.get("version")?.as_str()?;
                    Some(Requirement::new(name, Some(version.to_string())))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fallback resolution by scraping `pip install --dry-run` stdout.
pub struct PipDryRunProvider;

impl DependencyProvider for PipDryRunProvider {
    fn name(&self) -> &'static str {
        "pip-dry-run"
    }

    fn resolve(&self, requirements: &Path) -> Result<Vec<Requirement>, ResolveError> {
        let output = Command::new(python_interpreter())
            .args(["-m", "pip", "install", "--dry-run", "-r"])
            .arg(requirements)
            .output()
            .map_err(|e| ResolveError::PipFailed {
                reason: format!("could not run pip: {}", e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let packages = parse_dry_run_output(&stdout);

        if packages.is_empty() {
            return Err(ResolveError::PipFailed {
                reason: "no packages parsed from pip output".to_string(),
            });
        }

        Ok(packages)
    }
}

/// pip reports planned work as `Would install name-version ...` lines.
fn parse_dry_run_output(stdout: &str) -> Vec<Requirement> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z0-9_.-]+?)-([0-9][0-9.]*)").unwrap());

    let mut packages = Vec::new();

    for line in stdout.lines() {
        if !line.contains("Would install") && !line.contains("Would download") {
            continue;
        }

        for token in line.split_whitespace() {
            let token = token.strip_suffix(".whl").unwrap_or(token);
            if let Some(captures) = pattern.captures(token) {
                let name = captures[1].replace('_', "-");
                let version = captures[2].trim_end_matches('.').to_string();
                packages.push(Requirement::new(name, Some(version)));
            }
        }
    }

    packages
}

/// Direct requirements-file parsing; the lowest common denominator.
pub struct RequirementsFileProvider;

impl DependencyProvider for RequirementsFileProvider {
    fn name(&self) -> &'static str {
        "requirements-file"
    }

    fn resolve(&self, requirements: &Path) -> Result<Vec<Requirement>, ResolveError> {
        if !requirements.exists() {
            return Err(ResolveError::FileNotFound {
                path: requirements.to_path_buf(),
            });
        }

        let content = fs::read_to_string(requirements).map_err(|e| ResolveError::ReadFailed {
            path: requirements.to_path_buf(),
            source: e,
        })?;

        Ok(parse_requirements(&content))
    }
}

/// Parse requirements lines.
///
/// Only `==` pins carry a version through; every other constraint form
/// (`>=`, `~=`, ranges) resolves to "latest", which mirrors how the
/// download drivers treat an unpinned requirement.
fn parse_requirements(content: &str) -> Vec<Requirement> {
    let mut packages = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((name, version)) = line.split_once("==") {
            packages.push(Requirement::new(
                name.trim(),
                Some(version.trim().to_string()),
            ));
        } else {
            let name = line
                .split(|c: char| matches!(c, '>' | '<' | '~' | '!' | '=' | ';' | '[' | ' '))
                .next()
                .unwrap_or(line)
                .trim();
            if !name.is_empty() {
                packages.push(Requirement::new(name, None));
            }
        }
    }

    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirements_pinned() {
        let packages = parse_requirements("requests==2.31.0\nnumpy==1.26.4\n");
        assert_eq!(
            packages,
            vec![
                Requirement::new("requests", Some("2.31.0".to_string())),
                Requirement::new("numpy", Some("1.26.4".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_requirements_constraints_become_latest() {
        let packages = parse_requirements("requests>=2.0\nscipy~=1.11\npandas<3.0,>=2.0\nflask\n");
        assert_eq!(
            packages,
            vec![
                Requirement::new("requests", None),
                Requirement::new("scipy", None),
                Requirement::new("pandas", None),
                Requirement::new("flask", None),
            ]
        );
    }

    #[test]
    fn test_parse_requirements_skips_comments_and_blanks() {
        let packages = parse_requirements("# comment\n\nrequests==2.31.0\n  # indented comment\n");
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "requests");
    }

    #[test]
    fn test_parse_requirements_extras_marker() {
        let packages = parse_requirements("uvicorn[standard]\n");
        assert_eq!(packages, vec![Requirement::new("uvicorn", None)]);
    }

    #[test]
    fn test_parse_dry_run_output() {
        let stdout = "Collecting requests\nWould install requests-2.31.0 urllib3-2.2.1\n";
        let packages = parse_dry_run_output(stdout);
        assert_eq!(
            packages,
            vec![
                Requirement::new("requests", Some("2.31.0".to_string())),
                Requirement::new("urllib3", Some("2.2.1".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_dry_run_normalizes_underscores() {
        let stdout = "Would install typing_extensions-4.11.0\n";
        let packages = parse_dry_run_output(stdout);
        assert_eq!(packages[0].name, "typing-extensions");
    }

    #[test]
    fn test_parse_dry_run_ignores_other_lines() {
        let stdout = "Collecting requests\nDownloading requests-2.31.0.whl\n";
        assert!(parse_dry_run_output(stdout).is_empty());
    }

    #[test]
    fn test_parse_pip_report() {
        let report = serde_json::json!({
            "install": [
                {"metadata": {"name": "requests", "version": "2.31.0"}},
                {"metadata": {"name": "idna", "version": "3.7"}}
            ]
        });
        let packages = parse_pip_report(&report);
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "requests");
        assert_eq!(packages[1].version.as_deref(), Some("3.7"));
    }

    #[test]
    fn test_parse_pip_report_empty() {
        assert!(parse_pip_report(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn test_file_provider_missing_file() {
        let result =
            RequirementsFileProvider.resolve(Path::new("/nonexistent/requirements.txt"));
        assert!(matches!(result, Err(ResolveError::FileNotFound { .. })));
    }

    #[test]
    fn test_file_provider_reads_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("requirements.txt");
        std::fs::write(&path, "requests==2.31.0\n").unwrap();

        let packages = RequirementsFileProvider.resolve(&path).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version.as_deref(), Some("2.31.0"));
    }
}
