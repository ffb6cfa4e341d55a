//! Read-only store backed by a memory-mapped data file
//!
//! The whole offset index is loaded at open time; lookups are a hash probe
//! followed by a view into the mapping. Nothing is mutated after `open`, so a
//! reader can be shared across threads without locking.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::info;

use super::codec::RecipeView;
use super::offsets::{read_header, OffsetIndex};
use super::record::RecipeId;
use super::{FILE_DATA, FILE_OFFSETS};
use crate::error::LarderError;
use crate::Result;

/// Data file contents; an empty file cannot be mapped
enum DataRegion {
    Empty,
    Mapped(Mmap),
}

impl DataRegion {
    #[inline]
    fn as_slice(&self) -> &[u8] {
        match self {
            DataRegion::Empty => &[],
            DataRegion::Mapped(mmap) => &mmap[..],
        }
    }
}

/// Read-only, memory-mapped lookup service over a closed store
pub struct StoreReader {
    base_dir: PathBuf,
    index: OffsetIndex,
    record_count: u32,
    data: DataRegion,
}

impl StoreReader {
    /// Open the store in `base_dir`
    ///
    /// Fails fast when the index is truncated, has trailing bytes, or points
    /// past the end of the data file. Individual records are validated when
    /// they are looked up.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if !base_dir.exists() {
            return Err(LarderError::PathNotFound(base_dir));
        }
        if !base_dir.is_dir() {
            return Err(LarderError::NotADirectory(base_dir));
        }

        let offsets_path = base_dir.join(FILE_OFFSETS);
        let data_path = base_dir.join(FILE_DATA);
        for path in [&offsets_path, &data_path] {
            if !path.is_file() {
                return Err(LarderError::PathNotFound(path.clone()));
            }
        }

        let index_bytes = fs::read(&offsets_path)?;
        let record_count = read_header(&index_bytes)?;
        let index = OffsetIndex::from_bytes(&index_bytes)?;

        let file = File::open(&data_path)?;
        let data_len = file.metadata()?.len();
        let data = if data_len == 0 {
            DataRegion::Empty
        } else {
            // SAFETY: the store is immutable while being served; the build and
            // serve phases never overlap on the same directory.
            DataRegion::Mapped(unsafe { Mmap::map(&file)? })
        };

        if let Some(last) = index.last_offset() {
            if last as u64 >= data_len {
                return Err(LarderError::CorruptStore(format!(
                    "index points at offset {} but data file holds {} bytes",
                    last, data_len
                )));
            }
        }

        info!(
            path = %base_dir.display(),
            records = record_count,
            data_bytes = data_len,
            "opened store for reading"
        );

        Ok(Self {
            base_dir,
            index,
            record_count,
            data,
        })
    }

    /// Look up a recipe by id; a miss is `Ok(None)`
    pub fn find_by_id(&self, recipe_id: RecipeId) -> Result<Option<RecipeView<'_>>> {
        match self.index.get(recipe_id) {
            Some(offset) => RecipeView::decode(self.data.as_slice(), offset).map(Some),
            None => Ok(None),
        }
    }

    /// Look up several recipes
    ///
    /// Found records come back in the order their ids were given; ids that
    /// are not in the store are left out. A record that fails to decode fails
    /// the whole call.
    pub fn find_all_by_id<I>(&self, recipe_ids: I) -> Result<Vec<RecipeView<'_>>>
    where
        I: IntoIterator<Item = RecipeId>,
    {
        let mut found = Vec::new();
        for recipe_id in recipe_ids {
            if let Some(view) = self.find_by_id(recipe_id)? {
                found.push(view);
            }
        }
        Ok(found)
    }

    /// Iterate every record in insertion order
    pub fn iter(&self) -> impl Iterator<Item = Result<RecipeView<'_>>> + '_ {
        self.index
            .entries()
            .map(move |(_, offset)| RecipeView::decode(self.data.as_slice(), offset))
    }

    pub fn contains(&self, recipe_id: RecipeId) -> bool {
        self.index.contains(recipe_id)
    }

    /// Record count from the index header
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Number of distinct ids
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = RecipeId> + '_ {
        self.index.ids()
    }

    /// Size of the data file in bytes
    pub fn data_len(&self) -> usize {
        self.data.as_slice().len()
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }
}
