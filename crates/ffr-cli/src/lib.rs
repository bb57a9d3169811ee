//! Library side of the `ffr` command: config loading, logging, the JSON
//! record source and query execution.

pub mod config;
pub mod logging;
pub mod query;
pub mod source;
pub mod table;
