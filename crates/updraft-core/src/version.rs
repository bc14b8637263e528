//! Version rules applied when a manifest is generated

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

/// How the `breaking` flag is derived from a version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakingRule {
    /// `x.0.y` releases are breaking
    #[default]
    MinorZero,
    /// Never flag a release as breaking
    Never,
}

/// Parse a `major.minor.patch` version string
pub fn parse_version(version: &str) -> Result<Version> {
    Version::parse(version.trim())
        .map_err(|e| Error::input(format!("Invalid version '{}': {}", version, e)))
}

/// Lowest client version that can apply an update to `version`
pub fn min_compatible_version(version: &Version) -> String {
    format!("{}.0.0", version.major)
}

/// Whether `version` is a breaking release under `rule`
pub fn is_breaking(version: &Version, rule: BreakingRule) -> bool {
    match rule {
        BreakingRule::MinorZero => version.minor == 0,
        BreakingRule::Never => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_compatible_version() {
        let v = parse_version("3.5.1").unwrap();
        assert_eq!(min_compatible_version(&v), "3.0.0");

        let v = parse_version("0.9.4").unwrap();
        assert_eq!(min_compatible_version(&v), "0.0.0");
    }

    #[test]
    fn test_breaking_minor_zero() {
        let rule = BreakingRule::MinorZero;
        assert!(is_breaking(&parse_version("3.0.1").unwrap(), rule));
        assert!(!is_breaking(&parse_version("3.5.1").unwrap(), rule));
    }

    #[test]
    fn test_breaking_never() {
        assert!(!is_breaking(
            &parse_version("4.0.0").unwrap(),
            BreakingRule::Never
        ));
    }

    #[test]
    fn test_invalid_version_is_input_error() {
        for bad in ["", "3.5", "v3.5.1", "three"] {
            assert!(
                matches!(parse_version(bad), Err(Error::Input { .. })),
                "expected input error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_prerelease_versions_allowed() {
        let v = parse_version("4.1.0-beta.2").unwrap();
        assert_eq!(min_compatible_version(&v), "4.0.0");
    }
}
