// tests/resolve.rs

//! Integration tests for dependency closure resolution.

mod common;

use common::{StubRepo, stub_session};
use plugdeps::resolver::REQUESTED_BY;
use plugdeps::{Error, PluginRef};
use tempfile::TempDir;

fn refs(tokens: &[&str]) -> Vec<PluginRef> {
    tokens.iter().map(|t| PluginRef::parse(t).unwrap()).collect()
}

#[test]
fn test_optional_edges_ignored_and_higher_version_wins() {
    let repo = StubRepo::new();
    repo.publish("p", "1.0", &[]);
    repo.publish("p", "3.0", &[("q", "1.0", true), ("r", "1.5", false)]);
    repo.publish("q", "1.0", &[]);
    repo.publish("r", "1.5", &[]);
    repo.publish("r", "2.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["p", "r:2.0"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["p:3.0", "r:2.0"]);
    assert!(resolution.overrides().is_empty());
    // r:1.5 lost to r:2.0 and was never downloaded; q is optional
    assert_eq!(repo.download_count(), 2);
}

#[test]
fn test_unpinned_request_resolves_latest_and_skips_optional() {
    let repo = StubRepo::new();
    repo.publish("p", "2.0", &[("r", "1.0", false)]);
    repo.publish("p", "3.0", &[("q", "1.5", true), ("r", "2.0", false)]);
    repo.publish("r", "1.0", &[]);
    repo.publish("r", "2.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["p"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["p:3.0", "r:2.0"]);
    assert_eq!(resolution.get("q"), None);
}

#[test]
fn test_transitive_upgrade_rescans_winner() {
    let repo = StubRepo::new();
    repo.publish("a", "1.0", &[("b", "1.0", false)]);
    repo.publish("c", "1.0", &[("b", "2.0", false)]);
    repo.publish("b", "1.0", &[("d", "1.0", false)]);
    repo.publish("b", "2.0", &[("d", "2.0", false)]);
    repo.publish("d", "1.0", &[]);
    repo.publish("d", "2.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["a:1.0", "c:1.0"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["a:1.0", "b:2.0", "c:1.0", "d:2.0"]);
    assert!(!cache.path().join("b").join("1.0").exists());
    assert!(cache.path().join("b").join("2.0").join("b.hpi").is_file());
}

#[test]
fn test_dependency_cycle_terminates() {
    let repo = StubRepo::new();
    repo.publish("a", "1.0", &[("b", "1.0", false)]);
    repo.publish("b", "1.0", &[("a", "1.0", false)]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["a"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["a:1.0", "b:1.0"]);
    assert_eq!(resolution.scanned(), 2);
}

#[test]
fn test_cycle_through_upgraded_version() {
    let repo = StubRepo::new();
    repo.publish("a", "1.0", &[("b", "1.0", false)]);
    repo.publish("a", "2.0", &[("b", "1.0", false)]);
    repo.publish("b", "1.0", &[("a", "2.0", false)]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["a:1.0"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["a:2.0", "b:1.0"]);
    assert_eq!(resolution.scanned(), 3);
}

#[test]
fn test_pin_conflict_is_fatal_without_fix() {
    let repo = StubRepo::new();
    repo.publish("p", "1.0", &[("x", "2.0", false)]);
    repo.publish("x", "1.0", &[]);
    repo.publish("x", "2.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let err = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["p:1.0", "x:1.0"]))
        .unwrap_err();

    match err {
        Error::PinConflict {
            name,
            pinned,
            required,
            required_by,
        } => {
            assert_eq!(name, "x");
            assert_eq!(pinned, "1.0");
            assert_eq!(required, "2.0");
            assert_eq!(required_by, "p:1.0");
        }
        other => panic!("expected pin conflict, got {other:?}"),
    }
}

#[test]
fn test_pin_conflict_overridden_with_fix() {
    let repo = StubRepo::new();
    repo.publish("p", "1.0", &[("x", "2.0", false)]);
    repo.publish("x", "1.0", &[]);
    repo.publish("x", "2.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(true)
        .unwrap()
        .resolve(&refs(&["p:1.0", "x:1.0"]))
        .unwrap();

    assert_eq!(resolution.get("x"), Some("2.0"));
    assert_eq!(resolution.overrides().len(), 1);
    assert_eq!(resolution.overrides()[0].required_by, "p:1.0");
}

#[test]
fn test_bare_request_cannot_exceed_pin_of_same_name() {
    let repo = StubRepo::new();
    repo.publish("x", "1.0", &[]);
    repo.publish("x", "3.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let err = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["x:1.0", "x"]))
        .unwrap_err();

    match err {
        Error::PinConflict {
            name,
            pinned,
            required,
            required_by,
        } => {
            assert_eq!(name, "x");
            assert_eq!(pinned, "1.0");
            assert_eq!(required, "3.0");
            assert_eq!(required_by, REQUESTED_BY);
        }
        other => panic!("expected pin conflict, got {other:?}"),
    }
    assert_eq!(repo.download_count(), 0);
}

#[test]
fn test_second_pin_for_same_name_is_reported_with_fix() {
    let repo = StubRepo::new();
    repo.publish("x", "1.0", &[]);
    repo.publish("x", "2.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(true)
        .unwrap()
        .resolve(&refs(&["x:1.0", "x:2.0"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["x:2.0"]);
    assert_eq!(resolution.overrides().len(), 1);
    assert_eq!(resolution.overrides()[0].pinned, "1.0");
    assert_eq!(resolution.overrides()[0].required, "2.0");
    // Only the winning version is downloaded
    assert_eq!(repo.download_count(), 1);
}

#[test]
fn test_malformed_dependency_version_fails_run() {
    let repo = StubRepo::new();
    repo.publish("a", "1.0", &[("x", "1.2-beta", false)]);
    repo.publish("b", "1.0", &[("x", "1.0", false)]);
    repo.publish("x", "1.0", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolver = session.resolver(false).unwrap();

    assert!(matches!(
        resolver.resolve(&refs(&["a:1.0"])),
        Err(Error::ParseError(_))
    ));
    assert!(matches!(
        resolver.resolve(&refs(&["a:1.0", "b:1.0"])),
        Err(Error::ParseError(_))
    ));
    assert!(!cache.path().join("x").join("1.2-beta").exists());
}

#[test]
fn test_dependency_at_pin_is_not_a_conflict() {
    let repo = StubRepo::new();
    repo.publish("p", "1.0", &[("x", "1.0", false)]);
    repo.publish("x", "1.0", &[]);
    repo.publish("x", "1.1", &[]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["p:1.0", "x:1.1"]))
        .unwrap();

    assert_eq!(resolution.lines(), vec!["p:1.0", "x:1.1"]);
}

#[test]
fn test_warm_cache_skips_downloads() {
    let repo = StubRepo::new();
    repo.publish("a", "1.0", &[("b", "1.0", false)]);
    repo.publish("b", "1.0", &[]);

    let cache = TempDir::new().unwrap();
    let first = stub_session(&repo, cache.path())
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["a:1.0"]))
        .unwrap();
    let downloads = repo.download_count();
    assert_eq!(downloads, 2);

    let second = stub_session(&repo, cache.path())
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["a:1.0"]))
        .unwrap();

    assert_eq!(first.lines(), second.lines());
    assert_eq!(repo.download_count(), downloads);
}

#[test]
fn test_unknown_artifact_is_not_found() {
    let repo = StubRepo::new();
    repo.publish("a", "1.0", &[("ghost", "1.0", false)]);

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolver = session.resolver(false).unwrap();

    assert!(matches!(
        resolver.resolve(&refs(&["ghost"])),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        resolver.resolve(&refs(&["a:1.0"])),
        Err(Error::NotFound(_))
    ));
    assert!(!cache.path().join("ghost").join("1.0").join("ghost.hpi").exists());
}

#[test]
fn test_long_dependency_list_survives_line_folding() {
    let deps: Vec<(String, String)> = (0..12)
        .map(|i| (format!("dependency-number-{i}"), format!("1.{i}")))
        .collect();
    let edges: Vec<(&str, &str, bool)> = deps
        .iter()
        .map(|(name, version)| (name.as_str(), version.as_str(), false))
        .collect();

    let repo = StubRepo::new();
    repo.publish("root", "1.0", &edges);
    for (name, version) in &deps {
        repo.publish(name, version, &[]);
    }

    let cache = TempDir::new().unwrap();
    let session = stub_session(&repo, cache.path());
    let resolution = session
        .resolver(false)
        .unwrap()
        .resolve(&refs(&["root:1.0"]))
        .unwrap();

    assert_eq!(resolution.len(), 13);
    assert_eq!(resolution.get("dependency-number-11"), Some("1.11"));
}
