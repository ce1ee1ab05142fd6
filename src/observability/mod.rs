//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch produces:
//!     → logging.rs (structured events via tracing)
//!     → metrics.rs (request counters and latency histograms)
//! ```
//!
//! # Design Decisions
//! - Structured logging via the tracing facade
//! - A per-request UUID correlates all events for one dispatch
//! - Metrics go through the metrics facade; the embedder picks the
//!   exporter

pub mod logging;
pub mod metrics;
