//! Artifact resolution against real staging directories

mod fixtures;

use std::fs;

use fixtures::{archive_entries, as_refs, fake_unzip, runner, FakeProject};
use repack_tools::ToolPaths;
use xcode_repack::config::CleanupPolicy;
use xcode_repack::resolve::ArtifactSource;
use xcode_repack::{ArtifactResolver, Diagnostics, FailureKind, RepackError};

fn resolver<'a>(
    runner: &'a repack_tools::mock::ScriptedRunner,
    tools: &'a ToolPaths,
    cleanup: CleanupPolicy,
) -> ArtifactResolver<'a> {
    ArtifactResolver::new(runner, tools, cleanup)
}

#[test]
fn test_single_app_resolves_without_extraction() {
    let project = FakeProject::new();
    project.stage_app("Vendor.app", "Vendor");
    let runner = runner();
    let tools = ToolPaths::default();

    let artifact = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap();

    assert_eq!(artifact.bundle_name, "Vendor.app");
    assert_eq!(artifact.source, ArtifactSource::Bundle);
    assert!(runner.calls_to("unzip").is_empty());
}

#[test]
fn test_archive_is_extracted_and_removed() {
    let project = FakeProject::new();
    let archive = project.stage_archive("Vendor.ipa");
    let entries = archive_entries("Vendor.app", "Vendor");
    let runner = runner().on("unzip", fake_unzip(&as_refs(&entries)));
    let tools = ToolPaths::default();
    let mut diag = Diagnostics::silent();

    let artifact = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut diag)
        .unwrap();

    assert_eq!(artifact.bundle_name, "Vendor.app");
    assert_eq!(
        artifact.source,
        ArtifactSource::Archive {
            archive: "Vendor.ipa".to_string()
        }
    );
    assert!(project.staging().join("Vendor.app/Vendor").is_file());
    assert!(!archive.exists());
    assert!(!project.staging().join("Payload").exists());
    assert!(diag.is_empty());

    let unzip = runner.calls_to("unzip");
    assert_eq!(unzip.len(), 1);
    assert_eq!(
        unzip[0].argv(),
        vec![
            "-o".to_string(),
            archive.display().to_string(),
            "-d".to_string(),
            project.staging().display().to_string(),
        ]
    );
}

#[test]
fn test_archive_cleanup_flags() {
    let entries = archive_entries("Vendor.app", "Vendor");
    let tools = ToolPaths::default();

    let keep = CleanupPolicy {
        keep_archive: true,
        skip_all: false,
    };
    let project = FakeProject::new();
    let archive = project.stage_archive("Vendor.ipa");
    let runner = runner().on("unzip", fake_unzip(&as_refs(&entries)));
    resolver(&runner, &tools, keep)
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap();
    assert!(archive.exists());
    assert!(!project.staging().join("Payload").exists());

    let skip = CleanupPolicy {
        keep_archive: false,
        skip_all: true,
    };
    let project = FakeProject::new();
    let archive = project.stage_archive("Vendor.ipa");
    let runner = fixtures::runner().on("unzip", fake_unzip(&as_refs(&entries)));
    resolver(&runner, &tools, skip)
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap();
    assert!(archive.exists());
    assert!(project.staging().join("Payload").is_dir());
}

#[test]
fn test_extracted_bundle_replaces_stale_copy() {
    let project = FakeProject::new();
    project.stage_archive("Vendor.ipa");
    let entries = archive_entries("Vendor.app", "Vendor");
    let runner = runner().on("unzip", fake_unzip(&as_refs(&entries)));
    let tools = ToolPaths::default();

    // A bundle of the same name already sits in the staging directory as a
    // file, so it is not counted as a candidate but is in the way.
    fs::write(project.staging().join("Vendor.app"), "stale").unwrap();

    resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap();
    assert!(project.staging().join("Vendor.app").is_dir());
}

#[test]
fn test_app_wins_over_archive() {
    let project = FakeProject::new();
    project.stage_app("Vendor.app", "Vendor");
    let archive = project.stage_archive("Other.ipa");
    let runner = runner();
    let tools = ToolPaths::default();

    let artifact = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap();

    assert_eq!(artifact.bundle_name, "Vendor.app");
    assert!(archive.exists());
    assert!(runner.calls().is_empty());
}

#[test]
fn test_multiple_candidates_fail_before_extraction() {
    let tools = ToolPaths::default();

    let project = FakeProject::new();
    project.stage_app("A.app", "A");
    project.stage_app("B.app", "B");
    let runner = runner();
    let err = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap_err();
    assert!(matches!(err, RepackError::AmbiguousArtifacts { apps: 2, .. }));
    assert_eq!(err.kind(), FailureKind::Layout);

    let project = FakeProject::new();
    project.stage_archive("A.ipa");
    project.stage_archive("B.ipa");
    let runner = fixtures::runner();
    let err = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap_err();
    assert!(matches!(err, RepackError::AmbiguousArtifacts { archives: 2, .. }));
    assert!(runner.calls_to("unzip").is_empty());
}

#[test]
fn test_missing_and_empty_staging() {
    let tools = ToolPaths::default();
    let runner = runner();

    let project = FakeProject::new();
    fs::remove_dir_all(project.staging()).unwrap();
    let err = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap_err();
    assert!(matches!(err, RepackError::StagingMissing(_)));
    assert!(err.to_string().contains("Do not delete the folder"));

    let project = FakeProject::new();
    fs::write(project.staging().join("notes.txt"), "drop the app here").unwrap();
    let err = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap_err();
    assert!(matches!(err, RepackError::NoArtifact(_)));
}

#[test]
fn test_malformed_archives() {
    let tools = ToolPaths::default();

    let cases: [(Vec<(&str, &str)>, fn(&RepackError) -> bool); 3] = [
        (
            vec![("Vendor.app/Info.plist", "CFBundleExecutable=Vendor")],
            |e| matches!(e, RepackError::MissingPayload(_)),
        ),
        (
            vec![("Payload/README", "no bundle")],
            |e| matches!(e, RepackError::EmptyPayload(_)),
        ),
        (
            vec![("Payload/A.app/", ""), ("Payload/B.app/", "")],
            |e| matches!(e, RepackError::AmbiguousPayload { count: 2, .. }),
        ),
    ];

    for (entries, expected) in cases {
        let project = FakeProject::new();
        let archive = project.stage_archive("Vendor.ipa");
        let runner = runner().on("unzip", fake_unzip(&entries));

        let err = resolver(&runner, &tools, CleanupPolicy::default())
            .resolve(&project.staging(), &mut Diagnostics::silent())
            .unwrap_err();

        assert!(expected(&err), "unexpected error: {err}");
        assert_eq!(err.kind(), FailureKind::ArchiveFormat);
        assert!(archive.exists(), "archive kept on failure");
    }
}

#[test]
fn test_unzip_failure() {
    let project = FakeProject::new();
    project.stage_archive("Vendor.ipa");
    let runner = runner().fail("unzip", 3);
    let tools = ToolPaths::default();

    let err = resolver(&runner, &tools, CleanupPolicy::default())
        .resolve(&project.staging(), &mut Diagnostics::silent())
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Extraction);
    assert_eq!(err.exit_code(), 12);
}
