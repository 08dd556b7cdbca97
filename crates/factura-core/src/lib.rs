//! Core library for invoice line-item extraction orchestration.
//!
//! This crate provides:
//! - ZIP archive inspection and bounded work-queue construction
//! - A per-cycle rate limiter with a timed lockout/cooldown
//! - The strictly sequential processing loop with per-item failure isolation
//! - Normalization of raw service output into the canonical row schema

pub mod archive;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod queue;
pub mod ratelimit;

pub use error::{AdmissionError, ArchiveError, FacturaError, NormalizeError, Result};
pub use models::config::{COOLDOWN, CYCLE_LIMIT, SUPPORTED_EXTENSIONS};
pub use models::row::ExtractedRow;
pub use normalize::normalize;
pub use pipeline::{EventSink, NullSink, Pipeline, PipelineEvent, ProcessingResult};
pub use queue::{SourceFile, WorkItem, build_queue};
pub use ratelimit::{CycleState, RateLimiter};

/// Re-export extraction boundary types.
pub use factura_extract::{
    DocumentExtractor, ExtractError, GeminiExtractor, LINE_ITEM_FIELDS, MediaType,
};
