//! Export an RSS feed to CSV, optionally translating each item through the
//! Azure Translator text API.
//!
//! The run is a single pass: [`feed::fetch_feed`] → [`feed::parse_feed`] →
//! [`report::print_feed`] → [`export::export_feed`], driven end to end by
//! [`export::run_export`] with an [`config::ExportConfig`] built once at
//! startup.

pub mod config;
pub mod export;
pub mod feed;
pub mod report;
pub mod translate;
