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
#![allow(clippy::module_name_repetitions)]

//! Client for the Cloud Tasks pull-queue REST surface.
//!
//! Layout:
//! - `names.rs`: canonical resource paths for queues and tasks
//! - `models.rs`: wire DTOs (tasks, list/lease payloads, error bodies)
//! - `client.rs`: the [`TasksApi`] seam and its reqwest implementation
//! - `auth.rs`: bearer token sources (static or service-account grant)
//! - `layers.rs`: request middleware (developer key, request dumps)
//! - `json.rs`: sorted-key JSON rendering
//! - `error.rs`: [`ApiError`]

pub mod auth;
pub mod client;
pub mod error;
pub mod json;
pub mod layers;
pub mod models;
pub mod names;

pub use auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource, TokenSource};
pub use client::{ApiEndpoint, RestTasksApi, TasksApi};
pub use error::{ApiError, ApiResult};
pub use layers::{DeveloperKeyLayer, DumpRequestLayer, RequestLayer};
pub use models::{
    LeaseTasksRequest, LeaseTasksResponse, ListOptions, ListTasksResponse, PullMessage,
    ResponseView, Task,
};
pub use names::QueueRef;
