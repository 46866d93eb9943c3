//! Offline runs of the `resolve` command.

use sectorlens_cli::args::ResolveArgs;
use sectorlens_cli::commands::resolve;
use sectorlens_core::AppConfig;
use std::fs;
use tempfile::TempDir;

fn setup(tmp: &TempDir) -> (AppConfig, ResolveArgs) {
    fs::write(
        tmp.path().join("emails.csv"),
        "email\n\
         jane@acme.com\n\
         # contractors\n\
         bob@globex.com\n\
         sam@qqqvvvxxx.org\n\
         jane.doe@acme.com\n",
    )
    .expect("write input");
    fs::write(
        tmp.path().join("reference.csv"),
        "domain,company,sector\n\
         acme.com,Acme Corp,Manufacturing\n\
         globex.com,Globex,Energy\n",
    )
    .expect("write reference");

    let mut config = AppConfig::default();
    config.cache.database_path = Some(tmp.path().join("cache").join("search_cache.db"));
    config.cache.mirror_path = Some(tmp.path().join("cache").join("search_cache.csv"));

    let args = ResolveArgs {
        input: tmp.path().join("emails.csv"),
        output: Some(tmp.path().join("out").join("results.csv")),
        reference: Some(tmp.path().join("reference.csv")),
        no_web: true,
        workers: Some(2),
        min_delay: None,
        threshold: None,
        no_knowledge_graph: false,
        metrics_out: Some(tmp.path().join("metrics.json")),
    };
    args.apply_to(&mut config);
    (config, args)
}

#[tokio::test]
async fn test_resolve_without_web() {
    let tmp = TempDir::new().expect("create temp dir");
    let (config, args) = setup(&tmp);

    let summary = resolve::run(&config, &args).await.expect("resolve");
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.unique_domains, 3);

    let output = fs::read_to_string(tmp.path().join("out").join("results.csv")).expect("read");
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "input,domain,company,sector,source");
    assert_eq!(lines[1], "jane@acme.com,acme,Acme Corp,Manufacturing,local_match");
    assert_eq!(lines[2], "bob@globex.com,globex,Globex,Energy,local_match");
    assert_eq!(lines[3], "sam@qqqvvvxxx.org,qqqvvvxxx,Qqqvvvxxx,Unknown,fallback");
    assert_eq!(lines[4], "jane.doe@acme.com,acme,Acme Corp,Manufacturing,local_match");

    let metrics = fs::read_to_string(tmp.path().join("metrics.json")).expect("read metrics");
    assert!(metrics.contains("\"cache_misses\": 3"));
}

#[tokio::test]
async fn test_missing_input_is_an_error() {
    let tmp = TempDir::new().expect("create temp dir");
    let (config, mut args) = setup(&tmp);
    args.input = tmp.path().join("missing.csv");

    let err = resolve::run(&config, &args).await.expect_err("missing input");
    assert!(err.to_string().contains("failed to read input file"));
}
