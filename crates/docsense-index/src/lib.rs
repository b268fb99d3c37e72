//! docsense-index: in-memory vector index for document chunk embeddings
//!
//! Stores embeddings grouped by document so that a whole document's chunk set
//! is inserted and removed as one unit. Readers never observe a partial batch:
//! either every chunk of a document is searchable or none of it is.

pub mod distance;
pub mod error;
pub mod index;
pub mod types;

pub use distance::DistanceMetric;
pub use error::{IndexError, Result};
pub use index::VectorIndex;
pub use types::{IndexEntry, SearchHit};
