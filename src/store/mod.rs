//! Append-only recipe metadata store
//!
//! A store is a directory holding two files:
//!
//! - `offsets.sdb`: `u32` record count, then `count` pairs of
//!   (`u64` recipe id, `u32` byte offset into the data file), in insertion order
//! - `data.sdb`: encoded records laid end to end
//!
//! [`StoreWriter`] builds a store in a single pass. [`StoreReader`] loads the
//! offsets into memory and maps the data file, serving lookups without copying.

mod codec;
mod offsets;
mod reader;
mod record;
mod writer;

pub use codec::{encode, RecipeView, StrList, HEADER_LEN};
pub use offsets::{OffsetIndex, INDEX_ENTRY_LEN, INDEX_HEADER_LEN};
pub use reader::StoreReader;
pub use record::{RecipeId, RecipeMetadata, RecipeRecord};
pub use writer::{OpenMode, StoreWriter};

/// Index file name inside a store directory
pub const FILE_OFFSETS: &str = "offsets.sdb";
/// Data file name inside a store directory
pub const FILE_DATA: &str = "data.sdb";
