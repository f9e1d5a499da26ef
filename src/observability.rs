//! Structured events emitted while planning and streaming a query.
//!
//! Everything goes through `tracing` under the `geoplaces` target, so
//! `RUST_LOG=geoplaces=debug` surfaces a query's full lifecycle without
//! touching arrow or object_store noise. Installing a subscriber is left to
//! the application.
//!
//! Each event names itself in a snake_case `event` field and its origin in a
//! `component` field. Paths and errors are recorded with `%`, counts as plain
//! integers.
//!
//! | event | component | level | fields |
//! |-------|-----------|-------|--------|
//! | `scan_open` | scan | info | `path`, `objects` |
//! | `scan_file` | scan | debug | `object`, `rows` |
//! | `scan_complete` | scan | info | `path`, `batches`, `rows` |
//! | `geo_metadata_unreadable` | scan | warn | `error` |
//! | `geocode` | geocode | debug | `query`, `outline` |
//! | `place_clip` | query | debug | `before`, `after` |
//! | `release_rejected` | query | warn | `dataset`, `release` |

/// Target for all geoplaces log events.
pub(crate) const GEOPLACES_TARGET: &str = "geoplaces";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "scan",
///     event = "scan_open",
///     path = %location,
///     objects = objects.len(),
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::GEOPLACES_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::GEOPLACES_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::GEOPLACES_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
