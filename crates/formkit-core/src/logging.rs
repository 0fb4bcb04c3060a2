//! Logging for formkit.
//!
//! The lookup cache reports loads, joined requests, evictions and failures,
//! and the model reports validation outcomes and async operations. All of
//! it goes through [`tracing`]; [`setup_logging`] installs a subscriber from
//! [`Settings`](crate::settings::Settings), and [`model_span`] groups the
//! events of one read, save, delete or search.
//!
//! Targets follow the crate names, so a filter such as
//! `"warn,formkit_lookup=debug"` narrows output to the cache.

use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// The filter used when `log_level` is not a valid directive.
pub const DEFAULT_FILTER: &str = "warn,formkit_lookup=info,formkit_model=info";

/// Parses `log_level` as a filter directive, falling back to
/// [`DEFAULT_FILTER`].
pub fn log_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global tracing subscriber.
///
/// Debug settings get pretty output with source locations. Otherwise each
/// event is one JSON line carrying the enclosing model span, so a failed
/// save can be traced back to its object.
///
/// A subscriber that is already installed stays in place.
pub fn setup_logging(settings: &Settings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(&settings.log_level))
        .with_target(true);

    let installed = if settings.debug {
        builder.with_file(true).with_line_number(true).pretty().try_init()
    } else {
        builder.json().with_current_span(true).with_span_list(false).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Creates a tracing span for an operation on a data object.
///
/// # Examples
///
/// ```
/// use formkit_core::logging::model_span;
///
/// let span = model_span("save", "Customer");
/// let _guard = span.enter();
/// tracing::info!("saving");
/// ```
pub fn model_span(operation: &str, object: &str) -> tracing::Span {
    tracing::debug_span!("model", op = operation, object = object)
}
