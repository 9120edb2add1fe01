//! End-to-end runs of the `depgraph` binary against on-disk repositories.

use crate::common::depgraph;
use anyhow::Result;
use depgraph_cli::metadata::{ArtifactMetadata, MetadataDependency};
use depgraph_cli::test_utils::{RepositoryFixture, coords};
use predicates::prelude::*;

const BOM_REQUEST: &str = r#"repositories = ["repo"]

[[modules]]
name = "app"

[[modules.fragments]]
name = "jvm"
dependencies = [
    { bom = "g:bom:1.0" },
    "g:lib-a:1.0",
    "g:lib-b:1.0",
]
"#;

/// On-disk copy of the BOM conflict scenario plus `request.toml`.
fn bom_project() -> Result<RepositoryFixture> {
    let fixture = RepositoryFixture::new()?;
    fixture.publish(
        "g:bom:1.0",
        &ArtifactMetadata::default()
            .with_packaging("bom")
            .with_constraint(coords("g:lib-x:1.5")),
    )?;
    fixture.publish(
        "g:lib-a:1.0",
        &ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:lib-x"))),
    )?;
    fixture.publish(
        "g:lib-b:1.0",
        &ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:lib-x:2.0"))),
    )?;
    fixture.publish("g:lib-x:1.5", &ArtifactMetadata::default())?;
    fixture.publish_with_jar("g:lib-x:2.0", &ArtifactMetadata::default())?;
    fixture.write_request("request.toml", BOM_REQUEST)?;
    Ok(fixture)
}

#[test]
fn test_tree_prints_resolved_versions() -> Result<()> {
    let project = bom_project()?;

    depgraph(project.path())
        .args(["tree", "request.toml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("root\n"))
        .stdout(predicate::str::contains("╰─── module:app"))
        .stdout(predicate::str::contains("app:jvm:g:bom:1.0"))
        .stdout(predicate::str::contains("g:lib-x:unspecified -> 2.0"))
        // The BOM constraint lost to 2.0 and is not shown.
        .stdout(predicate::str::contains("g:lib-x:1.5").not());
    Ok(())
}

#[test]
fn test_tree_of_one_fragment() -> Result<()> {
    let project = bom_project()?;

    depgraph(project.path())
        .args(["tree", "request.toml", "--module", "app", "--fragment", "jvm"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("app:jvm\n"))
        .stdout(predicate::str::contains("module:app").not());
    Ok(())
}

#[test]
fn test_unknown_module_fails_with_message() -> Result<()> {
    let project = bom_project()?;

    depgraph(project.path())
        .args(["tree", "request.toml", "--module", "ap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module 'ap' is not part of the dependency graph"))
        .stderr(predicate::str::contains("app"));
    Ok(())
}

#[test]
fn test_insight_shows_only_paths_to_the_library() -> Result<()> {
    let project = bom_project()?;

    depgraph(project.path())
        .args(["insight", "request.toml", "g:lib-x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app:jvm:g:lib-b:1.0"))
        .stdout(predicate::str::contains("g:lib-x:2.0"))
        .stdout(predicate::str::contains("app:jvm:g:bom:1.0").not());
    Ok(())
}

#[test]
fn test_problems_point_at_declarations() -> Result<()> {
    let project = bom_project()?;

    depgraph(project.path())
        .args(["problems", "request.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning: request.toml:10:5:"))
        .stdout(predicate::str::contains(
            "version 1.5 taken from BOM is overridden, the actual version is 2.0.",
        ))
        .stdout(predicate::str::contains("1 problem(s)"));
    Ok(())
}

#[test]
fn test_deny_errors_fails_on_unresolved_dependency() -> Result<()> {
    let project = bom_project()?;
    project.write_request(
        "broken.toml",
        "repositories = [\"repo\"]\n\n[[modules]]\nname = \"app\"\n\n[[modules.fragments]]\nname = \"jvm\"\ndependencies = [\"g:missing:1.0\"]\n",
    )?;

    depgraph(project.path())
        .args(["problems", "broken.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("error: broken.toml:8:17:"));

    depgraph(project.path())
        .args(["problems", "broken.toml", "--deny-errors"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 error(s) reported"));
    Ok(())
}

#[test]
fn test_export_then_show() -> Result<()> {
    let project = bom_project()?;

    let tree = depgraph(project.path())
        .args(["tree", "request.toml"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    depgraph(project.path())
        .args(["export", "request.toml", "out/graph.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("out/graph.json"));
    assert!(project.path().join("out/graph.json").is_file());

    depgraph(project.path())
        .args(["show", "out/graph.json"])
        .assert()
        .success()
        .stdout(tree);
    Ok(())
}

#[test]
fn test_repo_flag_and_files() -> Result<()> {
    let project = bom_project()?;
    project.write_request(
        "elsewhere.toml",
        "[[modules]]\nname = \"app\"\n\n[[modules.fragments]]\nname = \"jvm\"\ndependencies = [\"g:lib-x:2.0\"]\n",
    )?;

    depgraph(project.path())
        .args(["tree", "elsewhere.toml", "--files", "--repo", "repo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files:"))
        .stdout(predicate::str::contains("lib-x-2.0.jar"));
    Ok(())
}

#[test]
fn test_invalid_request_file() -> Result<()> {
    let project = RepositoryFixture::new()?;
    project.write_request("bad.toml", "[[modules]]\nname = 3\n")?;

    depgraph(project.path())
        .args(["tree", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.toml"));

    depgraph(project.path())
        .args(["tree", "absent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.toml"));
    Ok(())
}
