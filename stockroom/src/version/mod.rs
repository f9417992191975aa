//! Version catalog: artifact filename parsing and recency ordering.
//!
//! Registry artifacts embed their version in the filename
//! (`left-pad-1.0.0.tgz`). This module is the single source of truth for
//! getting versions back out of those names and for ordering artifacts and
//! version maps by recency.
//!
//! Two ordering policies coexist deliberately:
//!
//! - [`sort_dists_by_recency`] is strict: every filename must carry a
//!   parsable version, and one that does not fails the whole ordering.
//! - [`sort_versions_by_recency`] is graceful: one unparsable key switches
//!   the whole ordering to a timestamp fallback.

mod catalog;

pub use catalog::{
    extract_version, latest_dist, sort_dists_by_recency, sort_versions_by_recency, VersionError,
};
