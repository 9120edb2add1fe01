use depgraph_cli::version::{MavenVersion, VersionComparator};
use std::cmp::Ordering;

#[test]
fn test_ordering_used_by_conflict_resolution() {
    let ascending = [
        "1.0-alpha1",
        "1.0-beta2",
        "1.0-M3",
        "1.0-rc1",
        "1.0-SNAPSHOT",
        "1.0",
        "1.0-sp1",
        "1.0.1",
        "1.2",
        "1.10",
        "2.0.0-RC",
        "2.0",
    ];
    for pair in ascending.windows(2) {
        assert_eq!(
            VersionComparator::compare(pair[0], pair[1]),
            Ordering::Less,
            "{} should sort before {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_equivalent_spellings_get_a_stable_winner() {
    assert_eq!(VersionComparator::compare("1.0", "1.0.0"), Ordering::Equal);
    assert_eq!(VersionComparator::compare("1.0-final", "1.0"), Ordering::Equal);
    assert_ne!(VersionComparator::compare_strict("1.0", "1.0.0"), Ordering::Equal);

    let forward = VersionComparator::get_latest(["1.0", "1.0.0"]);
    let backward = VersionComparator::get_latest(["1.0.0", "1.0"]);
    assert_eq!(forward, backward);
}

#[test]
fn test_latest_and_newer() {
    assert_eq!(VersionComparator::get_latest(["3.9.0", "3.10.0", "3.9.1"]), Some("3.10.0"));
    assert_eq!(VersionComparator::get_latest(std::iter::empty()), None);
    assert!(VersionComparator::has_newer_version("1.9", ["1.2", "1.10"]));
    assert!(!VersionComparator::has_newer_version("2.0", ["2.0-rc1", "1.99"]));
}

#[test]
fn test_parsed_version_keeps_its_text() {
    let version = MavenVersion::parse("2.1.20-Beta1");
    assert_eq!(version.as_str(), "2.1.20-Beta1");
    assert!(version < MavenVersion::parse("2.1.20"));
}
