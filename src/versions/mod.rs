//! Version parsing and the label vocabulary shared by nodes and pods
//!
//! Nodes report their container runtime as `containerd://1.5.10` and their
//! kubelet as `v1.22.7`. Only the major and minor components matter for
//! scheduling, so everything past them (patch, pre-release, build metadata)
//! is parsed for validity and then dropped.

use std::fmt;

use thiserror::Error;

/// Node label holding the containerd major version
pub const CONTAINERD_MAJOR_KEY: &str = "mwam.com/containerd-major-version";

/// Node label holding the containerd minor version
pub const CONTAINERD_MINOR_KEY: &str = "mwam.com/containerd-minor-version";

/// Node label holding the kubelet major version
pub const KUBELET_MAJOR_KEY: &str = "mwam.com/kubelet-major-version";

/// Node label holding the kubelet minor version
pub const KUBELET_MINOR_KEY: &str = "mwam.com/kubelet-minor-version";

/// Pod label declaring the lowest acceptable containerd version
pub const MIN_CONTAINERD_VERSION_LABEL: &str = "mwam.com/min-containerd-version";

/// Pod label declaring the lowest acceptable kubelet version
pub const MIN_KUBELET_VERSION_LABEL: &str = "mwam.com/min-kubelet-version";

/// Scheme tag the kubelet puts in front of the containerd version
pub const CONTAINERD_PREFIX: &str = "containerd://";

/// Errors produced while turning version strings into numbers
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("failed to parse version '{input}': {source}")]
    MalformedVersion {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("version string '{0}' does not match expected format 'containerd://1.2.3'")]
    UnexpectedFormat(String),
}

/// Major and minor components of a semantic version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse a semantic version such as `1.5.10` or `v1.22.7`.
///
/// A single leading `v` is accepted. The remainder must be a complete
/// `MAJOR.MINOR.PATCH` version; pre-release and build suffixes are allowed
/// but ignored.
pub fn parse_version(raw: &str) -> Result<Version, VersionError> {
    let trimmed = raw.strip_prefix('v').unwrap_or(raw);
    let parsed = semver::Version::parse(trimmed).map_err(|source| {
        VersionError::MalformedVersion {
            input: raw.to_string(),
            source,
        }
    })?;
    Ok(Version::new(parsed.major, parsed.minor))
}

/// Parse the runtime version a node reports, e.g. `containerd://1.5.10`.
///
/// The `containerd://` scheme tag is checked before any version parsing.
pub fn parse_runtime_reported(raw: &str) -> Result<Version, VersionError> {
    let version = raw
        .strip_prefix(CONTAINERD_PREFIX)
        .ok_or_else(|| VersionError::UnexpectedFormat(raw.to_string()))?;
    parse_version(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_leading_v() {
        assert_eq!(parse_version("v1.22.7").unwrap(), Version::new(1, 22));
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_version("1.5.10").unwrap(), Version::new(1, 5));
    }

    #[test]
    fn test_parse_ignores_prerelease_and_build() {
        assert_eq!(
            parse_version("v1.24.3-eks-1+abc123").unwrap(),
            Version::new(1, 24)
        );
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_version("not-a-version").unwrap_err();
        assert!(matches!(err, VersionError::MalformedVersion { .. }));
    }

    #[test]
    fn test_parse_words_before_numbers() {
        let err = parse_version("some_words.1.5.10").unwrap_err();
        assert!(matches!(err, VersionError::MalformedVersion { .. }));
    }

    #[test]
    fn test_parse_missing_components() {
        assert!(matches!(
            parse_version("1.5"),
            Err(VersionError::MalformedVersion { .. })
        ));
        assert!(matches!(
            parse_version(""),
            Err(VersionError::MalformedVersion { .. })
        ));
    }

    #[test]
    fn test_parse_runtime_reported() {
        assert_eq!(
            parse_runtime_reported("containerd://1.5.10").unwrap(),
            Version::new(1, 5)
        );
    }

    #[test]
    fn test_parse_runtime_reported_too_short() {
        let err = parse_runtime_reported("1.5.10").unwrap_err();
        assert!(matches!(err, VersionError::UnexpectedFormat(_)));
    }

    #[test]
    fn test_parse_runtime_reported_wrong_scheme() {
        let err = parse_runtime_reported("cri-o://1.25.1234").unwrap_err();
        assert!(matches!(err, VersionError::UnexpectedFormat(_)));
    }

    #[test]
    fn test_parse_runtime_reported_bad_version() {
        let err = parse_runtime_reported("containerd://latest").unwrap_err();
        assert!(matches!(err, VersionError::MalformedVersion { .. }));
    }

    #[test]
    fn test_error_messages_name_input() {
        let err = parse_runtime_reported("docker://20.10.7").unwrap_err();
        assert!(err.to_string().contains("docker://20.10.7"));

        let err = parse_version("abc").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse version 'abc'"));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(1, 22).to_string(), "1.22");
    }
}
