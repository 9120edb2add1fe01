//! Build problems as reported after a resolution run.

use crate::common::resolver;
use anyhow::Result;
use depgraph_cli::diagnostics::ids;
use depgraph_cli::graph::Severity;
use depgraph_cli::metadata::{ArtifactMetadata, InMemoryRepository, MetadataDependency};
use depgraph_cli::models::{DeclaredDependency, ResolutionRequest, SourceLocation};
use depgraph_cli::test_utils::{coords, fixtures};
use std::sync::Arc;

fn pinned_conflict() -> InMemoryRepository {
    InMemoryRepository::new()
        .with_artifact(coords("g:x:1.0"), ArtifactMetadata::default())
        .with_artifact(coords("g:x:2.0"), ArtifactMetadata::default())
        .with_artifact(
            coords("g:b:1.0"),
            ArtifactMetadata::default().with_dependency(MetadataDependency::compile(coords("g:x:2.0"))),
        )
}

fn at(line: u32) -> SourceLocation {
    SourceLocation {
        file: "request.toml".into(),
        line,
        column: 5,
    }
}

#[tokio::test]
async fn test_bom_override_reported_through_declared_dependency() -> Result<()> {
    let resolved = resolver(Arc::new(fixtures::bom_conflict_repository()))
        .resolve(&fixtures::bom_conflict_request())
        .await?;

    let problems = resolved.problems(Severity::Warning);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].id, ids::BOM_VERSION_OVERRIDDEN);
    assert_eq!(
        problems[0].text,
        "version 1.5 taken from BOM is overridden, the actual version is 2.0."
    );
    assert_eq!(problems[0].causes.len(), 1);

    let reported = resolved.reported_problems(Severity::Warning);
    assert_eq!(reported.len(), 1);
    assert_eq!(
        reported[0].text,
        "Dependency g:lib-a:1.0 has a transitive dependency g:lib-x:unspecified -> 2.0 with a problem: \
         version 1.5 taken from BOM is overridden, the actual version is 2.0."
    );
    assert_eq!(reported[0].module.as_deref(), Some("app"));
    assert_eq!(reported[0].fragment.as_deref(), Some("jvm"));
    Ok(())
}

#[tokio::test]
async fn test_shared_node_is_one_problem_projected_per_site() -> Result<()> {
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:x:1.0")).at(at(3)))
        .with("lib", "jvm", DeclaredDependency::maven(coords("g:x:1.0")).at(at(9)))
        .with("lib", "jvm", DeclaredDependency::maven(coords("g:b:1.0")));

    let resolved = resolver(Arc::new(pinned_conflict())).resolve(&request).await?;

    let problems = resolved.problems(Severity::Warning);
    assert_eq!(problems.len(), 1, "{problems:?}");
    assert_eq!(problems[0].id, ids::VERSION_OVERRIDDEN);
    assert_eq!(problems[0].sites.len(), 2);

    let reported = resolved.reported_problems(Severity::Warning);
    let lines: Vec<u32> = reported.iter().filter_map(|p| p.location.as_ref()).map(|l| l.line).collect();
    assert_eq!(lines, vec![3, 9]);
    for problem in &reported {
        assert_eq!(problem.text, "version 1.0 is overridden, the actual version is 2.0.");
        assert_eq!(problem.severity, Severity::Warning);
    }
    assert_eq!(
        reported[0].to_string(),
        "WARNING: request.toml:3:5: [app:jvm] version 1.0 is overridden, the actual version is 2.0."
    );
    Ok(())
}

#[tokio::test]
async fn test_error_in_one_module_does_not_stop_others() -> Result<()> {
    let request = ResolutionRequest::default()
        .with("broken", "jvm", DeclaredDependency::maven(coords("g:nowhere:1.0")))
        .with("healthy", "jvm", DeclaredDependency::maven(coords("g:b:1.0")));

    let resolved = resolver(Arc::new(pinned_conflict())).resolve(&request).await?;

    let errors = resolved.reported_problems(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, ids::UNRESOLVED);
    assert_eq!(errors[0].module.as_deref(), Some("broken"));

    let healthy = resolved.fragment_deps("healthy", "jvm")?;
    assert_eq!(healthy.view(resolved.graph()).nodes().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_severity_filter() -> Result<()> {
    let request = ResolutionRequest::default()
        .with("app", "jvm", DeclaredDependency::maven(coords("g:x:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:b:1.0")))
        .with("app", "jvm", DeclaredDependency::maven(coords("g:nowhere:1.0")));

    let resolved = resolver(Arc::new(pinned_conflict())).resolve(&request).await?;
    assert_eq!(resolved.problems(Severity::Info).len(), 2);
    assert_eq!(resolved.problems(Severity::Warning).len(), 2);
    assert_eq!(resolved.problems(Severity::Error).len(), 1);
    Ok(())
}
