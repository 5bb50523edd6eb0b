/// Errors raised while loading, parsing or persisting mind maps.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The document was not valid JSON or did not have the node shape.
	#[error("failed to process JSON: {0}")]
	Json(#[from] serde_json::Error),
	/// The browser storage backend threw.
	#[error("storage error: {0}")]
	Storage(String),
	/// No storage backend is available (private mode, no window).
	#[error("browser storage is unavailable")]
	StorageUnavailable,
	/// The document parsed, but no node in it had an id.
	#[error("the document has no node with an id")]
	EmptyDocument,
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
