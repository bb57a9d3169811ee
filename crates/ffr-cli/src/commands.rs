//! Subcommand handlers for `ffr`.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::{info, warn};

use ffr_cli::config::{OptionOverrides, load_options};
use ffr_cli::query::{QueryPlan, QueryReport, run_plan};
use ffr_cli::source::{field_names, load_records};
use ffr_cli::table::{page_summary, records_table};
use ffr_model::{canonical_string, fingerprint, fingerprint_str};

use crate::cli::{FingerprintArgs, QueryArgs};

/// Run a query and print the resulting page. Returns false if the fetch failed.
pub fn run_query(args: &QueryArgs, config: Option<&Path>) -> Result<bool> {
    let loaded = load_options(config)?;
    let overrides = OptionOverrides {
        no_cache: args.no_cache,
        fetch_all: args.fetch_all,
        incremental: args.incremental,
        max_fetch_times: args.max_fetch_times,
        data: args
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("parse --data")?,
    };
    let plan = QueryPlan {
        filter: args.filters.iter().cloned().collect(),
        search: args.search.clone(),
        search_fields: args.search_fields.clone(),
        sort: args.sort.clone(),
        page: args.page,
        page_size: args.page_size,
        through_page: args.through_page,
        select: args.select.as_deref().map(parse_id),
        options: overrides.apply(loaded.options),
        simulated_failures: args.simulate_failures,
    };

    let records = load_records(&args.records)?;
    info!(path = %args.records.display(), records = records.len(), "records loaded");
    let columns = if args.columns.is_empty() {
        field_names(&records)
    } else {
        args.columns.clone()
    };

    let runtime = Builder::new_current_thread()
        .build()
        .context("start runtime")?;
    let report = runtime.block_on(run_plan(records, &plan))?;
    print_report(&report, &columns);
    Ok(!report.failed())
}

pub fn run_fingerprint(args: &FingerprintArgs) -> Result<()> {
    if args.raw {
        println!("{}", fingerprint_str(&args.value));
        return Ok(());
    }
    let value: Value = serde_json::from_str(&args.value).context("parse JSON argument")?;
    let digest = fingerprint(&value)?;
    println!("{digest}  {}", canonical_string(&value)?);
    Ok(())
}

pub fn run_options(config: Option<&Path>) -> Result<()> {
    let loaded = load_options(config)?;
    match &loaded.source {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults"),
    }
    print!(
        "{}",
        toml::to_string_pretty(&loaded.options).context("serialize options")?
    );
    Ok(())
}

// Ids are JSON when they parse as JSON (`7`, `"a"`), plain strings otherwise.
fn parse_id(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn print_report(report: &QueryReport, columns: &[String]) {
    let model = &report.model;
    if let Some(error) = model.error() {
        warn!(%error, "last fetch failed");
        eprintln!("error: {}", error.user_message());
    }
    let visible = model.visible_records();
    let selected = model.selection.as_ref().map(|record| &record.id);
    println!("{}", records_table(&visible, columns, selected));
    println!("{}", page_summary(model, report.fetches));
    if let Some(record) = &model.selection {
        println!("selected: {}", record.id);
    }
}
