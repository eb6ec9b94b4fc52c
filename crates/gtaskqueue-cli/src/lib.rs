#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for Cloud Tasks pull queues.
//!
//! Layout:
//! - `cli.rs`: argument parsing, configuration and the top-level runner
//! - `commands/`: one command per verb plus the verb registry
//! - `client.rs`: error type and construction of the API handle
//! - `output.rs`: JSON printing and payload elision
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;

pub use cli::run;
