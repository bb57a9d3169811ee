//! End-to-end query runs over record files on disk.

use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};
use tempfile::TempDir;

use ffr_cli::config::{OptionOverrides, load_options};
use ffr_cli::query::{QueryPlan, run_plan};
use ffr_cli::source::{Record, load_records};
use ffr_model::{FetchOptions, FetchStatus, SortSpec};
use ffr_store::Completion;

fn write_records(dir: &TempDir, count: u32) -> PathBuf {
    let records: Vec<Value> = (1..=count)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("pod-{id:02}"),
                "ns": if id % 3 == 0 { "kube-system" } else { "default" },
            })
        })
        .collect();
    let path = dir.path().join("pods.json");
    fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
    path
}

fn records(count: u32) -> Vec<Record> {
    let dir = TempDir::new().unwrap();
    load_records(&write_records(&dir, count)).unwrap()
}

fn ids(records: &[Record]) -> Vec<Value> {
    records.iter().map(|r| r.id.clone()).collect()
}

#[tokio::test]
async fn test_server_side_filter_sort_and_page() {
    let mut plan = QueryPlan {
        sort: Some(SortSpec::desc("id")),
        page: 2,
        page_size: 3,
        ..QueryPlan::default()
    };
    plan.filter.insert("ns".into(), "default".into());

    let report = run_plan(records(12), &plan).await.unwrap();
    let model = &report.model;
    // default namespace, descending: 11 10 8 | 7 5 4 | 2 1
    assert_eq!(ids(&model.visible_records()), vec![json!(7), json!(5), json!(4)]);
    assert_eq!(model.record_count(), 8);
    assert_eq!(report.fetches, 1);
    assert_eq!(model.list.status, FetchStatus::Ready);
}

#[tokio::test]
async fn test_fetch_all_searches_locally() {
    let plan = QueryPlan {
        search: Some("pod-1".into()),
        search_fields: vec!["name".into()],
        page_size: 4,
        options: FetchOptions::default().with_fetch_all(true),
        ..QueryPlan::default()
    };
    let report = run_plan(records(15), &plan).await.unwrap();
    let model = &report.model;

    assert_eq!(model.records().len(), 15);
    // pod-10 .. pod-15
    assert_eq!(model.visible_count(), 6);
    assert_eq!(
        ids(&model.visible_records()),
        vec![json!(10), json!(11), json!(12), json!(13)]
    );
}

#[tokio::test]
async fn test_fetch_all_search_defaults_to_every_field() {
    let plan = QueryPlan {
        search: Some("kube".into()),
        options: FetchOptions::default().with_fetch_all(true),
        ..QueryPlan::default()
    };
    let report = run_plan(records(9), &plan).await.unwrap();

    assert_eq!(
        ids(&report.model.visible_records()),
        vec![json!(3), json!(6), json!(9)]
    );
}

#[tokio::test]
async fn test_incremental_accumulates_pages() {
    let plan = QueryPlan {
        page_size: 5,
        through_page: Some(3),
        options: FetchOptions::default().with_incremental(true),
        ..QueryPlan::default()
    };
    let report = run_plan(records(20), &plan).await.unwrap();

    assert_eq!(report.fetches, 3);
    assert_eq!(report.model.records().len(), 15);
    assert_eq!(report.model.record_count(), 20);
    assert_eq!(report.model.query.paging.page_index(), 3);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let plan = QueryPlan {
        simulated_failures: 1,
        options: FetchOptions::default().with_max_fetch_times(2),
        ..QueryPlan::default()
    };
    let report = run_plan(records(3), &plan).await.unwrap();

    assert!(!report.failed());
    assert_eq!(report.fetches, 2);
    assert!(matches!(
        report.completions.as_slice(),
        [Completion::Retrying(_), Completion::Applied(_)]
    ));
}

#[tokio::test]
async fn test_failure_without_budget_is_reported() {
    let plan = QueryPlan {
        simulated_failures: 1,
        ..QueryPlan::default()
    };
    let report = run_plan(records(3), &plan).await.unwrap();

    assert!(report.failed());
    assert_eq!(report.model.list.status, FetchStatus::Failed);
    assert!(report.model.records().is_empty());
}

#[tokio::test]
async fn test_select_applies_to_first_page() {
    let plan = QueryPlan {
        select: Some(json!(2)),
        ..QueryPlan::default()
    };
    let report = run_plan(records(3), &plan).await.unwrap();
    let selected = report.model.selection.as_ref().map(|r| r.id.clone());
    assert_eq!(selected, Some(json!(2)));
}

#[tokio::test]
async fn test_invalid_page_is_rejected() {
    let plan = QueryPlan {
        page: 0,
        ..QueryPlan::default()
    };
    let err = run_plan(records(3), &plan).await.unwrap_err();
    assert!(err.to_string().contains("invalid paging"));
}

#[test]
fn test_options_file_and_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("options.toml");
    fs::write(&path, "fetchAll = true\nmaxFetchTimes = 2\n").unwrap();

    let loaded = load_options(Some(&path)).unwrap();
    assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    let options = OptionOverrides {
        no_cache: true,
        max_fetch_times: Some(5),
        ..OptionOverrides::default()
    }
    .apply(loaded.options);

    assert!(options.fetch_all);
    assert!(options.no_cache);
    assert_eq!(options.max_fetch_times, 5);
}

#[test]
fn test_malformed_options_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("options.toml");
    fs::write(&path, "fetchAll = \"sometimes\"\n").unwrap();

    let err = load_options(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("parse config"));
}
