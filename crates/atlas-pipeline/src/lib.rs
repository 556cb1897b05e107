//! Acquisition pipeline for the atlas viewer.
//!
//! Two entry points move assets from a URL into the scene registry:
//!
//! - [`AcquisitionPipeline::acquire`] fetches one asset, decodes it, and
//!   registers it under a caller-chosen id.
//! - [`AcquisitionPipeline::acquire_batch`] fetches a model bundle, scopes its
//!   entries with the embedded manifest, colors each asset from the bundle's
//!   color table, and registers them one by one.
//!
//! Every job is recorded in the [`LoadQueue`]. Download progress is published
//! on the [`ProgressBus`].
//!
//! # Modules
//!
//! - [`config`]: [`PipelineConfig`]
//! - [`error`]: [`AcquireError`], [`FetchError`], [`QueueError`]
//! - [`fetch`]: The [`Fetcher`] seam with HTTP and file implementations
//! - [`progress`]: [`ProgressBus`] and per-model subscriptions
//! - [`queue`]: [`LoadQueue`] job history
//! - [`pipeline`]: [`AcquisitionPipeline`] and [`BatchReport`]

pub mod config;
pub mod error;
pub mod fetch;
mod inflight;
pub mod pipeline;
pub mod progress;
pub mod queue;

pub use config::PipelineConfig;
pub use error::{AcquireError, AcquireResult, FetchError, FetchResult, QueueError, QueueResult};
pub use fetch::{DefaultFetcher, Fetcher, FileFetcher, HttpFetcher, ProgressFn};
pub use pipeline::{AcquisitionPipeline, BatchEntry, BatchOutcome, BatchReport};
pub use progress::{ProgressBus, ProgressEvent, ProgressSubscription, ProgressUpdate};
pub use queue::{LoadQueue, QueueTicket};
