//! CLI argument definitions for `ffr`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use ffr_model::{DEFAULT_PAGE_SIZE, SortSpec};

#[derive(Parser)]
#[command(
    name = "ffr",
    version,
    about = "Query JSON record collections through a fetched list model",
    long_about = "Query JSON record collections through a fetched list model.\n\n\
                  Records are served page by page like a list endpoint would; \
                  fetch options come from options.toml and the flags below."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Fetch options file (default: the platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a page of records from a JSON file.
    Query(QueryArgs),

    /// Print the fingerprint of a JSON value.
    Fingerprint(FingerprintArgs),

    /// Print the effective fetch options.
    Options,
}

#[derive(Args)]
pub struct QueryArgs {
    /// JSON file holding an array of records or a `{recordCount, records}` object.
    #[arg(value_name = "RECORDS_JSON")]
    pub records: PathBuf,

    /// Keep records whose field equals the value (repeatable).
    #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Case-sensitive substring search.
    #[arg(long = "search", value_name = "TERM")]
    pub search: Option<String>,

    /// Field to search in (repeatable, default: all fields).
    #[arg(long = "field", value_name = "FIELD")]
    pub search_fields: Vec<String>,

    /// Sort by a field, optionally `:desc`.
    #[arg(long = "sort", value_name = "FIELD[:asc|:desc]", value_parser = parse_sort)]
    pub sort: Option<SortSpec>,

    /// 1-based page to load.
    #[arg(long = "page", default_value_t = 1)]
    pub page: usize,

    #[arg(long = "page-size", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Keep loading pages up to this one (combine with --incremental to accumulate).
    #[arg(long = "through-page", value_name = "PAGE")]
    pub through_page: Option<usize>,

    /// Select the record with this id once the first page arrives.
    #[arg(long = "select", value_name = "ID")]
    pub select: Option<String>,

    /// Columns to show (repeatable, default: all fields).
    #[arg(long = "column", value_name = "FIELD")]
    pub columns: Vec<String>,

    /// Fetch the whole collection once and page locally.
    #[arg(long = "fetch-all")]
    pub fetch_all: bool,

    /// Never reuse cached or in-flight results.
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Append every page to the records already loaded.
    #[arg(long = "incremental")]
    pub incremental: bool,

    /// Attempts per query before a failure is reported.
    #[arg(long = "max-fetch-times", value_name = "N")]
    pub max_fetch_times: Option<u32>,

    /// Extra JSON payload sent with each request.
    #[arg(long = "data", value_name = "JSON")]
    pub data: Option<String>,

    /// Make the source fail this many fetches before answering.
    #[arg(long = "simulate-failures", value_name = "N", default_value_t = 0)]
    pub simulate_failures: u32,
}

#[derive(Args)]
pub struct FingerprintArgs {
    /// JSON text to fingerprint.
    #[arg(value_name = "JSON")]
    pub value: String,

    /// Hash the argument as a plain string instead of parsing it.
    #[arg(long = "raw")]
    pub raw: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_filter(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((field, expected)) if !field.is_empty() => {
            Ok((field.to_string(), expected.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got `{value}`")),
    }
}

fn parse_sort(value: &str) -> Result<SortSpec, String> {
    let (field, direction) = value.split_once(':').unwrap_or((value, "asc"));
    if field.is_empty() {
        return Err("sort field is empty".to_string());
    }
    match direction {
        "asc" => Ok(SortSpec::asc(field)),
        "desc" => Ok(SortSpec::desc(field)),
        other => Err(format!("unknown sort direction `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("ns=kube-system"),
            Ok(("ns".to_string(), "kube-system".to_string()))
        );
        assert_eq!(parse_filter("label=a=b").unwrap().1, "a=b");
        assert!(parse_filter("=x").is_err());
        assert!(parse_filter("missing").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("name"), Ok(SortSpec::asc("name")));
        assert_eq!(parse_sort("age:desc"), Ok(SortSpec::desc("age")));
        assert!(parse_sort("age:sideways").is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
