//! Error types for the store components.
//!
//! None of these cross a component boundary as control flow; engine
//! operations return them as values and the command layer renders them as
//! user-displayable messages.

use crate::model::ProductId;

/// Collection graph validation and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
  /// The requested name was empty or whitespace only.
  #[error("Enter a name.")]
  EmptyName,
  /// A collection with this exact name already exists.
  #[error("A collection with this name already exists.")]
  DuplicateName {
    /// The rejected name.
    name: String,
  },
  /// No collection carries this name.
  #[error("Collection not found.")]
  NotFound {
    /// The name that was looked up.
    name: String,
  },
}

/// Product lookups against the loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
  #[error("Product not found: {0}")]
  NotFound(ProductId),
}

/// Price filter input problems.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
  #[error("Min price must be less than Max price.")]
  InvertedRange { min_price: f64, max_price: f64 },
  #[error("Unknown price preset: {0}")]
  UnknownPreset(String),
}

/// Catalog fetch and decode failures.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
  #[error("catalog request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("catalog request failed with status {0}")]
  Status(reqwest::StatusCode),
  #[error("catalog read failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("catalog payload is not a product list: {0}")]
  Decode(#[from] serde_json::Error),
}

/// Key/value tier failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("storage database error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("storage directory error: {0}")]
  Io(#[from] std::io::Error),
  #[error("stored value could not be encoded: {0}")]
  Encode(#[from] serde_json::Error),
}

/// Failures surfaced by session-level operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShopError {
  #[error(transparent)]
  Collection(#[from] CollectionError),
  #[error(transparent)]
  Product(#[from] ProductError),
  #[error(transparent)]
  Filter(#[from] FilterError),
}
