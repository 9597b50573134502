//! Errors raised while loading navigation data from disk
//!

/// Failure to build a [crate::prelude::NavGrid] from an external source
#[derive(Debug, thiserror::Error)]
pub enum NavError {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[cfg(feature = "ron")]
	#[error(transparent)]
	Ron(#[from] ron::error::SpannedError),
	#[cfg(feature = "csv")]
	#[error(transparent)]
	Csv(#[from] csv::Error),
	/// Loaded data doesn't match the shape described by the map resolution
	#[error("expected {expected} {what}, found {found}")]
	Dimensions {
		/// What was being counted
		what: &'static str,
		/// Count required by the map resolution
		expected: usize,
		/// Count found in the data
		found: usize,
	},
	/// A cost value that is not a valid `u8`
	#[error("invalid cost `{value}` at row {row}, column {column}")]
	InvalidCost {
		/// The raw text of the value
		value: String,
		/// Absolute tile row
		row: usize,
		/// Absolute tile column
		column: usize,
	},
}
