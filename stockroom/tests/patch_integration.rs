//! End-to-end patch runs over real staging and storage trees.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use stockroom::archive::extract_archive;
use stockroom::chunk::{file_checksum, ChunkStore};
use stockroom::patch::{run_patch, PatchOutcome};
use stockroom::registry::PackageMetadata;

fn make_package(
    dir: &Path,
    name: &str,
    versions: &[(&str, &str)],
    dist_tags: &[(&str, &str)],
    artifacts: &[&str],
) {
    fs::create_dir_all(dir).unwrap();
    let meta = PackageMetadata {
        name: name.to_string(),
        versions: versions
            .iter()
            .map(|(v, _)| (v.to_string(), json!({ "name": name, "version": v })))
            .collect(),
        time: versions
            .iter()
            .map(|(v, t)| (v.to_string(), t.to_string()))
            .collect(),
        dist_tags: dist_tags
            .iter()
            .map(|(tag, v)| (tag.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    };
    meta.store(dir).unwrap();
    for artifact in artifacts {
        fs::write(dir.join(artifact), format!("tarball:{}", artifact)).unwrap();
    }
}

async fn drain(staging: &Path, live: &Path) -> Vec<(String, PatchOutcome)> {
    let mut rx = run_patch(staging, live).unwrap();
    let mut outcomes = Vec::new();
    while let Some(event) = rx.recv().await {
        outcomes.push((event.package, event.outcome));
    }
    outcomes
}

#[tokio::test]
async fn new_package_is_copied_verbatim_and_reconciled() {
    let staging = TempDir::new().unwrap();
    let live = TempDir::new().unwrap();
    make_package(
        &staging.path().join("left-pad"),
        "left-pad",
        &[("1.0.0", "2023-01-01T00:00:00.000Z")],
        &[("latest", "1.0.0")],
        &["left-pad-1.0.0.tgz"],
    );

    let outcomes = drain(staging.path(), live.path()).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1, PatchOutcome::Success);

    let live_pkg = live.path().join("left-pad");
    let meta = PackageMetadata::load(&live_pkg).unwrap();
    assert_eq!(meta.name, "left-pad");
    assert_eq!(meta.versions.keys().collect::<Vec<_>>(), vec!["1.0.0"]);
    assert_eq!(meta.dist_tags["latest"], "1.0.0");
    assert_eq!(
        fs::read(live_pkg.join("left-pad-1.0.0.tgz")).unwrap(),
        b"tarball:left-pad-1.0.0.tgz"
    );
}

#[tokio::test]
async fn stale_staged_claims_lose_to_artifacts_on_disk() {
    let staging = TempDir::new().unwrap();
    let live = TempDir::new().unwrap();

    // Live package already carries 1.0.0 and 1.1.0 with latest -> 1.1.0.
    make_package(
        &live.path().join("left-pad"),
        "left-pad",
        &[
            ("1.0.0", "2023-01-01T00:00:00.000Z"),
            ("1.1.0", "2023-02-01T00:00:00.000Z"),
        ],
        &[("latest", "1.1.0")],
        &["left-pad-1.0.0.tgz", "left-pad-1.1.0.tgz"],
    );

    // Staged update re-adds only the 1.0.0 artifact, claims latest ->
    // 1.0.0, and declares a 0.9.0 that has no artifact at all.
    make_package(
        &staging.path().join("left-pad"),
        "left-pad",
        &[
            ("1.0.0", "2023-01-01T00:00:00.000Z"),
            ("0.9.0", "2022-12-01T00:00:00.000Z"),
        ],
        &[("latest", "1.0.0")],
        &["left-pad-1.0.0.tgz"],
    );

    let outcomes = drain(staging.path(), live.path()).await;
    assert_eq!(outcomes, vec![("left-pad".to_string(), PatchOutcome::Success)]);

    let meta = PackageMetadata::load(&live.path().join("left-pad")).unwrap();
    // 0.9.0 was pruned (no backing artifact) and the staged latest claim
    // was recomputed away from the artifacts actually present.
    assert_eq!(
        meta.versions.keys().collect::<Vec<_>>(),
        vec!["1.0.0", "1.1.0"]
    );
    assert_eq!(meta.dist_tags["latest"], "1.1.0");
    assert!(!meta.time.contains_key("0.9.0"));
}

#[tokio::test]
async fn disjoint_version_sets_union_on_merge() {
    let staging = TempDir::new().unwrap();
    let live = TempDir::new().unwrap();
    make_package(
        &live.path().join("lodash"),
        "lodash",
        &[("4.17.20", "2020-08-13T00:00:00.000Z")],
        &[("latest", "4.17.20")],
        &["lodash-4.17.20.tgz"],
    );
    make_package(
        &staging.path().join("lodash"),
        "lodash",
        &[("4.17.21", "2021-02-20T00:00:00.000Z")],
        &[("latest", "4.17.21")],
        &["lodash-4.17.21.tgz"],
    );

    let outcomes = drain(staging.path(), live.path()).await;
    assert_eq!(outcomes.len(), 1);

    let live_pkg = live.path().join("lodash");
    let meta = PackageMetadata::load(&live_pkg).unwrap();
    assert_eq!(
        meta.versions.keys().collect::<Vec<_>>(),
        vec!["4.17.20", "4.17.21"]
    );
    assert!(live_pkg.join("lodash-4.17.20.tgz").exists());
    assert!(live_pkg.join("lodash-4.17.21.tgz").exists());
    assert_eq!(meta.dist_tags["latest"], "4.17.21");
}

#[tokio::test]
async fn scoped_packages_merge_under_their_namespace() {
    let staging = TempDir::new().unwrap();
    let live = TempDir::new().unwrap();
    make_package(
        &staging.path().join("@types/node"),
        "@types/node",
        &[("20.1.0", "2023-05-01T00:00:00.000Z")],
        &[("latest", "20.1.0")],
        &["node-20.1.0.tgz"],
    );

    let outcomes = drain(staging.path(), live.path()).await;
    assert_eq!(outcomes, vec![("@types".to_string(), PatchOutcome::Success)]);

    let meta = PackageMetadata::load(&live.path().join("@types/node")).unwrap();
    assert_eq!(meta.dist_tags["latest"], "20.1.0");
    assert!(live.path().join("@types/node/node-20.1.0.tgz").exists());
}

#[tokio::test]
async fn mixed_outcomes_are_reported_per_package() {
    let staging = TempDir::new().unwrap();
    let live = TempDir::new().unwrap();

    for name in ["alpha", "beta"] {
        let artifact = format!("{}-1.0.0.tgz", name);
        make_package(
            &staging.path().join(name),
            name,
            &[("1.0.0", "2023-01-01T00:00:00.000Z")],
            &[("latest", "1.0.0")],
            &[artifact.as_str()],
        );
    }
    // This one collides with a live package whose document is corrupt.
    make_package(
        &staging.path().join("broken"),
        "broken",
        &[("1.0.0", "2023-01-01T00:00:00.000Z")],
        &[("latest", "1.0.0")],
        &["broken-1.0.0.tgz"],
    );
    fs::create_dir_all(live.path().join("broken")).unwrap();
    fs::write(live.path().join("broken/package.json"), b"{invalid").unwrap();

    let mut rx = run_patch(staging.path(), live.path()).unwrap();
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    let progresses: Vec<u64> = {
        let mut p: Vec<u64> = events.iter().map(|e| e.progress).collect();
        p.sort();
        p
    };
    assert_eq!(progresses, vec![1, 2, 3]);

    let by_name: BTreeMap<&str, &PatchOutcome> = events
        .iter()
        .map(|e| (e.package.as_str(), &e.outcome))
        .collect();
    assert_eq!(by_name["alpha"], &PatchOutcome::Success);
    assert_eq!(by_name["beta"], &PatchOutcome::Success);
    assert!(matches!(by_name["broken"], PatchOutcome::Failed { .. }));

    // The failure did not keep the healthy packages from landing.
    assert!(live.path().join("alpha/alpha-1.0.0.tgz").exists());
    assert!(live.path().join("beta/beta-1.0.0.tgz").exists());
}

/// The full transport-to-storage pipeline: fragments are reassembled and
/// verified, the archive extracted, and the staged tree patched in.
#[tokio::test]
async fn fragments_to_patched_storage() {
    let temp = TempDir::new().unwrap();
    let live = TempDir::new().unwrap();

    // Build the patch archive a client would upload.
    let source = temp.path().join("source");
    make_package(
        &source.join("storage-patch/left-pad"),
        "left-pad",
        &[("1.0.0", "2023-01-01T00:00:00.000Z")],
        &[("latest", "1.0.0")],
        &["left-pad-1.0.0.tgz"],
    );
    let archive_path = temp.path().join("patch.zip");
    write_zip_of_tree(&archive_path, &source);

    // Split it into fragments the way the uploader does, indices unpadded
    // and deliberately submitted out of order.
    let chunk_dir = temp.path().join("chunk");
    fs::create_dir(&chunk_dir).unwrap();
    let bytes = fs::read(&archive_path).unwrap();
    let checksum = file_checksum(&archive_path).unwrap();
    let mut names = Vec::new();
    for (index, part) in bytes.chunks(64).enumerate() {
        let name = format!("e29b41d4-{}", index);
        fs::write(chunk_dir.join(&name), part).unwrap();
        names.push(name);
    }
    names.reverse();

    // Reassemble, verify, extract, patch.
    let store = ChunkStore::new(&chunk_dir);
    let rebuilt = temp.path().join("rebuilt.zip");
    store.reassemble(&names, &rebuilt, &checksum).unwrap();

    let staging = temp.path().join("staging");
    extract_archive(&rebuilt, &staging).unwrap();

    let outcomes = drain(&staging.join("storage-patch"), live.path()).await;
    assert_eq!(outcomes, vec![("left-pad".to_string(), PatchOutcome::Success)]);

    let meta = PackageMetadata::load(&live.path().join("left-pad")).unwrap();
    assert_eq!(meta.dist_tags["latest"], "1.0.0");
}

fn write_zip_of_tree(archive: &Path, root: &Path) {
    let file = fs::File::create(archive).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    add_dir_to_zip(&mut writer, root, root);
    writer.finish().unwrap();
}

fn add_dir_to_zip(writer: &mut zip::ZipWriter<fs::File>, root: &Path, dir: &Path) {
    for entry in fs::read_dir(dir).unwrap().filter_map(Result::ok) {
        let path = entry.path();
        let name = path
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .into_owned();
        if path.is_dir() {
            add_dir_to_zip(writer, root, &path);
        } else {
            writer
                .start_file(name, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(&fs::read(&path).unwrap()).unwrap();
        }
    }
}
