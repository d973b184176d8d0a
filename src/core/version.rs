//! Version handling
//!
//! Published units (NPM libraries, Helm charts) get a patch bump before every
//! publish so the registry never sees the same version twice.

use semver::Version;
use thiserror::Error;

/// Current geppetto version from Cargo.toml
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors related to version handling
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// Invalid version format
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
}

/// Parse and validate a semver version string
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    Version::parse(version.trim()).map_err(|e| VersionError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Increment the patch component, dropping pre-release and build metadata
///
/// # Examples
/// ```
/// use geppetto::core::version::bump_patch;
///
/// assert_eq!(bump_patch("1.2.3").unwrap(), "1.2.4");
/// ```
pub fn bump_patch(version: &str) -> Result<String, VersionError> {
    let current = parse_version(version)?;
    let next = Version::new(current.major, current.minor, current.patch + 1);
    Ok(next.to_string())
}

/// Version string shown by `geppetto --version`
pub fn long_version() -> String {
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) => format!("{CURRENT_VERSION} ({sha})"),
        None => CURRENT_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_patch() {
        assert_eq!(bump_patch("0.1.0").unwrap(), "0.1.1");
        assert_eq!(bump_patch("2.9.19").unwrap(), "2.9.20");
    }

    #[test]
    fn test_bump_patch_drops_prerelease() {
        assert_eq!(bump_patch("1.0.0-beta.1").unwrap(), "1.0.1");
        assert_eq!(bump_patch("1.0.0+build.5").unwrap(), "1.0.1");
    }

    #[test]
    fn test_bump_patch_rejects_invalid() {
        assert!(matches!(
            bump_patch("1.0"),
            Err(VersionError::InvalidVersion { .. })
        ));
        assert!(bump_patch("latest").is_err());
    }

    #[test]
    fn test_long_version_starts_with_package_version() {
        assert!(long_version().starts_with(CURRENT_VERSION));
    }
}
