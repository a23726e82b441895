//! Target interpreter and platform description.
//!
//! Every compatibility decision in this crate is made against a
//! [`TargetEnvironment`] built once per run, either detected from the host
//! or supplied explicitly. The environment derives the filename tags a
//! matching wheel would carry:
//!
//! - the exact interpreter tag (e.g. `cp312`)
//! - the primary platform tag (e.g. `macosx_11_0_arm64`)
//! - a small allowlist of historically-equivalent platform tags
//! - the architecture substrings that mark a wheel as built for the
//!   other CPU of the same OS family

use std::fmt;

/// Operating system family of a download target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    /// Anything else; no platform-based filtering is applied.
    Other,
}

impl OsFamily {
    /// Detect the OS family of the machine this process runs on.
    pub fn from_host() -> Self {
        match std::env::consts::OS {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            _ => OsFamily::Other,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
            OsFamily::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// CPU architecture of a download target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuArch {
    X86_64,
    Arm64,
}

impl CpuArch {
    /// Detect the architecture of the machine this process runs on.
    ///
    /// Unknown architectures default to x86_64, the permissive choice for
    /// a tool that prefers keeping artifacts over discarding them.
    pub fn from_host() -> Self {
        match std::env::consts::ARCH {
            "aarch64" | "arm" => CpuArch::Arm64,
            _ => CpuArch::X86_64,
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuArch::X86_64 => "x86_64",
            CpuArch::Arm64 => "arm64",
        };
        write!(f, "{}", name)
    }
}

/// The interpreter version and platform that downloads must match.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnvironment {
    pub python_major: u32,
    pub python_minor: u32,
    pub os: OsFamily,
    pub arch: CpuArch,
}

impl TargetEnvironment {
    /// Create an explicit target environment.
    pub fn new(python_major: u32, python_minor: u32, os: OsFamily, arch: CpuArch) -> Self {
        Self {
            python_major,
            python_minor,
            os,
            arch,
        }
    }

    /// Build a target for the host platform and the given interpreter
    /// version.
    pub fn detect(python_major: u32, python_minor: u32) -> Self {
        Self::new(
            python_major,
            python_minor,
            OsFamily::from_host(),
            CpuArch::from_host(),
        )
    }

    /// The exact interpreter tag, e.g. `cp312` for Python 3.12.
    pub fn cp_tag(&self) -> String {
        format!("cp{}{}", self.python_major, self.python_minor)
    }

    /// The primary platform tag a native wheel for this target carries.
    pub fn platform_tag(&self) -> String {
        match (self.os, self.arch) {
            (OsFamily::MacOs, CpuArch::Arm64) => "macosx_11_0_arm64".to_string(),
            (OsFamily::MacOs, CpuArch::X86_64) => "macosx_10_13_x86_64".to_string(),
            (OsFamily::Linux, CpuArch::Arm64) => "linux_aarch64".to_string(),
            (OsFamily::Linux, CpuArch::X86_64) => "linux_x86_64".to_string(),
            (OsFamily::Windows, CpuArch::Arm64) => "win_arm64".to_string(),
            (OsFamily::Windows, CpuArch::X86_64) => "win_amd64".to_string(),
            (OsFamily::Other, _) => "any".to_string(),
        }
    }

    /// Historically-equivalent platform tags that are also acceptable.
    ///
    /// Only macOS publishes wheels under several interchangeable platform
    /// spellings; other targets have none.
    pub fn alt_platform_tags(&self) -> &'static [&'static str] {
        match (self.os, self.arch) {
            (OsFamily::MacOs, CpuArch::Arm64) => {
                &["macosx_10_15_universal2", "macosx_11_0_universal2"]
            }
            (OsFamily::MacOs, CpuArch::X86_64) => {
                &["macosx_10_12_x86_64", "macosx_10_13_universal2"]
            }
            _ => &[],
        }
    }

    /// Substrings that identify a wheel built for the other CPU of this
    /// OS family.
    ///
    /// Windows and unknown targets get no platform-based rejection; the
    /// interpreter tags still apply there.
    pub fn foreign_arch_tags(&self) -> &'static [&'static str] {
        match (self.os, self.arch) {
            (OsFamily::MacOs, CpuArch::Arm64) => &["x86_64", "amd64"],
            (OsFamily::MacOs, CpuArch::X86_64) => &["arm64", "aarch64"],
            (OsFamily::Linux, CpuArch::X86_64) => &["arm64", "aarch64"],
            (OsFamily::Linux, CpuArch::Arm64) => &["x86_64", "amd64"],
            _ => &[],
        }
    }
}

impl fmt::Display for TargetEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "python {}.{} on {} {}",
            self.python_major, self.python_minor, self.os, self.arch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cp_tag() {
        let target = TargetEnvironment::new(3, 9, OsFamily::Linux, CpuArch::X86_64);
        assert_eq!(target.cp_tag(), "cp39");

        let target = TargetEnvironment::new(3, 12, OsFamily::Linux, CpuArch::X86_64);
        assert_eq!(target.cp_tag(), "cp312");
    }

    #[test]
    fn test_platform_tag_macos_arm() {
        let target = TargetEnvironment::new(3, 12, OsFamily::MacOs, CpuArch::Arm64);
        assert_eq!(target.platform_tag(), "macosx_11_0_arm64");
        assert_eq!(
            target.alt_platform_tags(),
            &["macosx_10_15_universal2", "macosx_11_0_universal2"]
        );
        assert_eq!(target.foreign_arch_tags(), &["x86_64", "amd64"]);
    }

    #[test]
    fn test_platform_tag_macos_intel() {
        let target = TargetEnvironment::new(3, 12, OsFamily::MacOs, CpuArch::X86_64);
        assert_eq!(target.platform_tag(), "macosx_10_13_x86_64");
        assert_eq!(
            target.alt_platform_tags(),
            &["macosx_10_12_x86_64", "macosx_10_13_universal2"]
        );
        assert_eq!(target.foreign_arch_tags(), &["arm64", "aarch64"]);
    }

    #[test]
    fn test_platform_tag_linux() {
        let target = TargetEnvironment::new(3, 11, OsFamily::Linux, CpuArch::X86_64);
        assert_eq!(target.platform_tag(), "linux_x86_64");
        assert!(target.alt_platform_tags().is_empty());
        assert_eq!(target.foreign_arch_tags(), &["arm64", "aarch64"]);

        let target = TargetEnvironment::new(3, 11, OsFamily::Linux, CpuArch::Arm64);
        assert_eq!(target.platform_tag(), "linux_aarch64");
        assert_eq!(target.foreign_arch_tags(), &["x86_64", "amd64"]);
    }

    #[test]
    fn test_platform_tag_windows_no_rejection() {
        let target = TargetEnvironment::new(3, 10, OsFamily::Windows, CpuArch::X86_64);
        assert_eq!(target.platform_tag(), "win_amd64");
        assert!(target.alt_platform_tags().is_empty());
        assert!(target.foreign_arch_tags().is_empty());
    }

    #[test]
    fn test_detect_uses_host() {
        let target = TargetEnvironment::detect(3, 12);
        assert_eq!(target.python_major, 3);
        assert_eq!(target.python_minor, 12);
        assert_eq!(target.os, OsFamily::from_host());
        assert_eq!(target.arch, CpuArch::from_host());
    }

    #[test]
    fn test_display() {
        let target = TargetEnvironment::new(3, 12, OsFamily::Linux, CpuArch::X86_64);
        assert_eq!(target.to_string(), "python 3.12 on linux x86_64");
    }
}
