use depgraph_cli::core::DrError;
use depgraph_cli::models::{Coordinates, DependencyKey};

#[test]
fn test_parse_and_display() {
    let coordinates: Coordinates = "org.jetbrains.kotlin:kotlin-stdlib:2.1.20".parse().unwrap();
    assert_eq!(coordinates.group, "org.jetbrains.kotlin");
    assert_eq!(coordinates.module, "kotlin-stdlib");
    assert_eq!(coordinates.version.as_deref(), Some("2.1.20"));
    assert_eq!(coordinates.to_string(), "org.jetbrains.kotlin:kotlin-stdlib:2.1.20");
    assert_eq!(coordinates.key(), DependencyKey::new("org.jetbrains.kotlin", "kotlin-stdlib"));
}

#[test]
fn test_unversioned_coordinates() {
    let coordinates: Coordinates = "g:lib".parse().unwrap();
    assert_eq!(coordinates.version, None);
    assert_eq!(coordinates.version_or_unspecified(), "unspecified");
    assert_eq!(coordinates.with_version("1.5").to_string(), "g:lib:1.5");
    assert!(coordinates.matches("g", "lib"));
}

#[test]
fn test_malformed_coordinates() {
    for input in ["", "g", "g:m:1:extra", ":m:1", "g::1", "g:m:", "g m:x:1"] {
        let result: Result<Coordinates, DrError> = input.parse();
        assert!(
            matches!(result, Err(DrError::InvalidCoordinates { .. })),
            "'{input}' should be rejected"
        );
    }
}
