use axum::{body::Body, http::Request};
use tracing::{level_filters::LevelFilter, Level, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber, printing events at `level`
/// and above to stdout.
pub fn init_tracing_subscriber(level: Level) {
	tracing_subscriber::registry()
		.with(LevelFilter::from_level(level))
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.init();
}

/// Creates the span for a single request, tagged with its request id.
pub fn make_span(request: &Request<Body>) -> Span {
	let request_id = request
		.headers()
		.get("x-request-id")
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default();

	tracing::info_span!(
		"request",
		method = %request.method(),
		uri = %request.uri(),
		request_id,
	)
}
