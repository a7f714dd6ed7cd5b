//! Semver parsing and range satisfaction (spec §6.2).

use semver::{Version, VersionReq};

#[derive(Debug, Clone, thiserror::Error)]
pub enum VersionError {
    #[error("'{0}' is not strict MAJOR.MINOR.PATCH semver: {1}")]
    InvalidVersion(String, String),
    #[error("'{0}' is not a valid semver range: {1}")]
    InvalidRange(String, String),
}

pub fn parse_strict(raw: &str) -> Result<Version, VersionError> {
    Version::parse(raw).map_err(|e| VersionError::InvalidVersion(raw.to_string(), e.to_string()))
}

pub fn parse_range(raw: &str) -> Result<VersionReq, VersionError> {
    VersionReq::parse(raw).map_err(|e| VersionError::InvalidRange(raw.to_string(), e.to_string()))
}

#[must_use]
pub fn satisfies(range: &VersionReq, version: &Version) -> bool {
    range.matches(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_semver_required() {
        assert!(parse_strict("1.2.3").is_ok());
        assert!(parse_strict("1.2").is_err());
        assert!(parse_strict("latest").is_err());
    }

    #[test]
    fn caret_and_tilde_ranges() {
        let caret = parse_range("^1.2.3").unwrap();
        assert!(satisfies(&caret, &parse_strict("1.9.0").unwrap()));
        assert!(!satisfies(&caret, &parse_strict("2.0.0").unwrap()));

        let tilde = parse_range("~1.2.3").unwrap();
        assert!(satisfies(&tilde, &parse_strict("1.2.9").unwrap()));
        assert!(!satisfies(&tilde, &parse_strict("1.3.0").unwrap()));
    }

    #[test]
    fn comparator_ranges() {
        let range = parse_range(">=1.0.0, <2.0.0").unwrap();
        assert!(satisfies(&range, &parse_strict("1.9.9").unwrap()));
        assert!(!satisfies(&range, &parse_strict("2.0.0").unwrap()));
    }
}
