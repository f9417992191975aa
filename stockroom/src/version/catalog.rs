//! Artifact filename parsing and version ordering rules.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::DateTime;
use regex::Regex;
use semver::Version;
use thiserror::Error;

/// Errors raised by the strict artifact-ordering paths.
#[derive(Debug, Error)]
pub enum VersionError {
    /// No version could be extracted from an artifact filename.
    #[error("no version found in artifact filename '{0}'")]
    Unversioned(String),

    /// An extracted version string failed strict parsing.
    #[error("invalid version '{version}' in artifact filename '{filename}': {source}")]
    Invalid {
        filename: String,
        version: String,
        source: semver::Error,
    },
}

/// Pattern for versioned artifact filenames: `<name>-<version>.tgz`.
///
/// The version must start with `major.minor.patch`; any pre-release or
/// build suffix is captured along with it. The name part is greedy, so a
/// dash inside the package name (`left-pad`) stays with the name.
fn artifact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(.+)-(\d+\.\d+\.\d+.*)\.tgz").unwrap())
}

/// Extract the version substring from an artifact filename.
///
/// Returns `None` when the filename does not follow the
/// `<name>-<version>.tgz` convention. A miss is data, not an error: the
/// caller decides whether an unversioned artifact matters.
pub fn extract_version(filename: &str) -> Option<String> {
    artifact_pattern()
        .captures(filename)
        .map(|caps| caps[2].to_string())
}

fn parse_artifact_version(filename: &str) -> Result<Version, VersionError> {
    let version = extract_version(filename)
        .ok_or_else(|| VersionError::Unversioned(filename.to_string()))?;
    Version::parse(&version).map_err(|source| VersionError::Invalid {
        filename: filename.to_string(),
        version,
        source,
    })
}

/// Sort artifact filenames newest-first by their embedded version.
///
/// Strict path: every filename must parse, otherwise the whole ordering
/// fails with the offending filename.
pub fn sort_dists_by_recency(dists: &[String]) -> Result<Vec<String>, VersionError> {
    let mut parsed: Vec<(Version, String)> = dists
        .iter()
        .map(|dist| parse_artifact_version(dist).map(|version| (version, dist.clone())))
        .collect::<Result<_, _>>()?;
    parsed.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(parsed.into_iter().map(|(_, dist)| dist).collect())
}

/// The artifact filename with the newest embedded version.
///
/// `None` for an empty input.
pub fn latest_dist(dists: &[String]) -> Result<Option<String>, VersionError> {
    Ok(sort_dists_by_recency(dists)?.into_iter().next())
}

/// Sort the keys of a version-to-timestamp map newest-first.
///
/// When every key parses as a semantic version the order is semver
/// precedence. When any key does not, the whole ordering falls back to the
/// RFC 3339 timestamps in the map's values; a pair with an unparsable
/// timestamp compares equal and keeps its prior relative order.
pub fn sort_versions_by_recency(times: &BTreeMap<String, String>) -> Vec<String> {
    let keys: Vec<String> = times.keys().cloned().collect();

    let parsed: Option<Vec<Version>> = keys.iter().map(|key| Version::parse(key).ok()).collect();
    match parsed {
        Some(versions) => {
            let mut pairs: Vec<(Version, String)> = versions.into_iter().zip(keys).collect();
            pairs.sort_by(|a, b| b.0.cmp(&a.0));
            pairs.into_iter().map(|(_, key)| key).collect()
        }
        None => {
            let mut keys = keys;
            keys.sort_by(|a, b| {
                match (
                    DateTime::parse_from_rfc3339(&times[a]),
                    DateTime::parse_from_rfc3339(&times[b]),
                ) {
                    (Ok(a_time), Ok(b_time)) => b_time.cmp(&a_time),
                    _ => Ordering::Equal,
                }
            });
            keys
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dists(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_extract_version_plain() {
        assert_eq!(extract_version("foo-1.2.3.tgz"), Some("1.2.3".to_string()));
    }

    #[test]
    fn test_extract_version_dashed_name() {
        assert_eq!(
            extract_version("left-pad-1.0.0.tgz"),
            Some("1.0.0".to_string())
        );
    }

    #[test]
    fn test_extract_version_prerelease() {
        assert_eq!(
            extract_version("foo-1.2.3-beta.1.tgz"),
            Some("1.2.3-beta.1".to_string())
        );
    }

    #[test]
    fn test_extract_version_no_match() {
        assert_eq!(extract_version("package.json"), None);
        assert_eq!(extract_version("foo.tgz"), None);
        assert_eq!(extract_version("foo-1.2.tgz"), None);
    }

    #[test]
    fn test_sort_dists_newest_first() {
        let sorted = sort_dists_by_recency(&dists(&[
            "pkg-1.0.0.tgz",
            "pkg-2.1.0.tgz",
            "pkg-0.9.9.tgz",
            "pkg-2.0.0.tgz",
        ]))
        .unwrap();
        assert_eq!(
            sorted,
            dists(&[
                "pkg-2.1.0.tgz",
                "pkg-2.0.0.tgz",
                "pkg-1.0.0.tgz",
                "pkg-0.9.9.tgz",
            ])
        );
    }

    #[test]
    fn test_sort_dists_prerelease_before_release() {
        let sorted =
            sort_dists_by_recency(&dists(&["pkg-1.0.0-rc.1.tgz", "pkg-1.0.0.tgz"])).unwrap();
        assert_eq!(sorted, dists(&["pkg-1.0.0.tgz", "pkg-1.0.0-rc.1.tgz"]));
    }

    #[test]
    fn test_sort_dists_rejects_unversioned() {
        let result = sort_dists_by_recency(&dists(&["pkg-1.0.0.tgz", "notes.tgz"]));
        assert!(matches!(result, Err(VersionError::Unversioned(name)) if name == "notes.tgz"));
    }

    #[test]
    fn test_latest_dist() {
        let latest = latest_dist(&dists(&["pkg-1.0.0.tgz", "pkg-1.1.0.tgz"])).unwrap();
        assert_eq!(latest, Some("pkg-1.1.0.tgz".to_string()));
    }

    #[test]
    fn test_latest_dist_empty() {
        assert_eq!(latest_dist(&[]).unwrap(), None);
    }

    #[test]
    fn test_sort_versions_semver_order() {
        let mut times = BTreeMap::new();
        times.insert("1.0.0".to_string(), "2023-01-01T00:00:00.000Z".to_string());
        times.insert("1.10.0".to_string(), "2023-02-01T00:00:00.000Z".to_string());
        times.insert("1.2.0".to_string(), "2023-03-01T00:00:00.000Z".to_string());

        // 1.10.0 > 1.2.0 numerically even though the newest timestamp is
        // on 1.2.0; semver precedence wins while every key parses.
        assert_eq!(
            sort_versions_by_recency(&times),
            vec!["1.10.0", "1.2.0", "1.0.0"]
        );
    }

    #[test]
    fn test_sort_versions_timestamp_fallback() {
        let mut times = BTreeMap::new();
        times.insert("1.0.0".to_string(), "2023-01-01T00:00:00.000Z".to_string());
        times.insert("2.0.0".to_string(), "2023-02-01T00:00:00.000Z".to_string());
        times.insert("nightly".to_string(), "2023-03-01T00:00:00.000Z".to_string());

        // One unparsable key and the whole ordering is by timestamp.
        assert_eq!(
            sort_versions_by_recency(&times),
            vec!["nightly", "2.0.0", "1.0.0"]
        );
    }

    #[test]
    fn test_sort_versions_degenerate_timestamps_keep_order() {
        let mut times = BTreeMap::new();
        times.insert("alpha".to_string(), "not a timestamp".to_string());
        times.insert("beta".to_string(), "also not one".to_string());

        // Neither semver nor timestamps parse; the prior (key) order holds.
        assert_eq!(sort_versions_by_recency(&times), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_sort_versions_empty() {
        assert!(sort_versions_by_recency(&BTreeMap::new()).is_empty());
    }
}
