//! Many tasks sharing one resolver and one resolved graph.

use crate::common::resolver;
use anyhow::Result;
use depgraph_cli::test_utils::{coords, fixtures};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_insight_queries() -> Result<()> {
    let resolved = Arc::new(
        resolver(Arc::new(fixtures::layered_repository(4, 12)))
            .resolve(&fixtures::layered_request(12, 3))
            .await?,
    );

    let start = Instant::now();
    let mut tasks = Vec::new();
    for task in 0..64 {
        let resolved = Arc::clone(&resolved);
        tasks.push(tokio::spawn(async move {
            let module = format!("lib-{}-{}", task % 4, task % 12);
            resolved.dependency_insight("g", &module)
        }));
    }
    for task in tasks {
        assert!(!task.await?.is_empty());
    }
    println!("64 insight queries in {:?}", start.elapsed());

    // 12 distinct keys, each walked exactly once.
    assert_eq!(resolved.insight_walks(), 12);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_resolutions_with_latency() -> Result<()> {
    let repository = Arc::new(fixtures::layered_repository(3, 8).with_latency(Duration::from_millis(2)));
    let resolver = resolver(repository.clone());
    let request = fixtures::layered_request(8, 2);

    let start = Instant::now();
    let runs = join_all((0..10).map(|_| resolver.resolve(&request))).await;
    println!("10 concurrent resolutions in {:?}", start.elapsed());

    let mut trees = Vec::new();
    for run in runs {
        trees.push(run?.pretty_print());
    }
    assert!(trees.windows(2).all(|pair| pair[0] == pair[1]));
    // One fetch per coordinates and run.
    assert_eq!(repository.metadata_fetches(&coords("g:lib-2-7:1.0")), 10);
    Ok(())
}

#[tokio::test]
async fn test_downloads_from_many_graphs() -> Result<()> {
    let (layers, width) = (3, 10);
    let mut repository = fixtures::layered_repository(layers, width);
    for layer in 0..layers {
        for i in 0..width {
            let name = format!("g:lib-{layer}-{i}:1.0");
            repository = repository.with_files(coords(&name), vec![PathBuf::from(format!("lib-{layer}-{i}.jar"))]);
        }
    }
    repository = repository
        .with_files(coords("g:leaf:1.0"), vec![PathBuf::from("leaf-1.0.jar")])
        .with_latency(Duration::from_millis(1));
    let repository = Arc::new(repository);
    let resolver = resolver(repository.clone());

    let request = fixtures::layered_request(width, 2);
    let graphs = join_all((0..4).map(|_| resolver.resolve(&request))).await;
    let graphs: Vec<_> = graphs.into_iter().collect::<Result<_, _>>()?;

    let start = Instant::now();
    let reports = join_all(graphs.iter().map(|graph| resolver.download_files(graph))).await;
    println!("downloads for {} graphs in {:?}", graphs.len(), start.elapsed());

    for report in &reports {
        assert!(report.is_complete());
        assert_eq!(report.files.len(), layers * width + 1);
    }
    assert_eq!(repository.file_fetches(&coords("g:leaf:1.0")), 1);
    assert_eq!(repository.file_fetches(&coords("g:lib-0-0:1.0")), 1);
    Ok(())
}
