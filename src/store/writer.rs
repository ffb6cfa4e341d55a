use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::codec::encode;
use super::offsets::{encode_entry, read_header, INDEX_ENTRY_LEN, INDEX_HEADER_LEN};
use super::record::RecipeMetadata;
use super::{FILE_DATA, FILE_OFFSETS};
use crate::config::StoreConfig;
use crate::error::LarderError;
use crate::Result;

/// How [`StoreWriter::open_with`] treats an existing store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Fail with `AlreadyExists` if either store file is present
    #[default]
    CreateNew,
    /// Start a fresh store, discarding any existing one
    Create,
    /// Continue an existing store; fail if there is none
    Append,
    /// Append when a store exists, create it otherwise
    CreateOrAppend,
}

struct OpenFiles {
    data: BufWriter<File>,
    offsets: BufWriter<File>,
}

/// Single-writer builder of an on-disk store
///
/// Records go to the end of `data.sdb`; their (id, offset) pairs go to
/// `offsets.sdb`, whose record-count header is only finalized by [`close`].
/// Until then the header disagrees with the entries that follow it, and
/// [`StoreReader::open`](super::StoreReader::open) rejects the store as corrupt.
///
/// A failed write leaves the two files out of step, so the writer gives up
/// on the first I/O error: later appends fail with `Closed` and `close`
/// reports the store as unfinished.
///
/// [`close`]: StoreWriter::close
pub struct StoreWriter {
    base_dir: PathBuf,
    files: Option<OpenFiles>,
    poisoned: bool,
    num_records: u32,
    data_len: u64,
    config: StoreConfig,
}

impl StoreWriter {
    /// Create a new store at `base_dir`, failing if one already exists
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::open_with(base_dir, OpenMode::CreateNew, StoreConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(base_dir: P, mode: OpenMode, config: StoreConfig) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let data_path = base_dir.join(FILE_DATA);
        let offsets_path = base_dir.join(FILE_OFFSETS);
        let exists = data_path.exists() || offsets_path.exists();

        let mode = match mode {
            OpenMode::CreateOrAppend if exists => OpenMode::Append,
            OpenMode::CreateOrAppend => OpenMode::Create,
            other => other,
        };

        let writer = match mode {
            OpenMode::CreateNew if exists => return Err(LarderError::AlreadyExists(base_dir)),
            OpenMode::Append => Self::open_existing(base_dir, config)?,
            _ => Self::create(base_dir, config)?,
        };

        info!(
            path = %writer.base_dir.display(),
            ?mode,
            records = writer.num_records,
            "opened store for writing"
        );
        Ok(writer)
    }

    fn create(base_dir: PathBuf, config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;

        let data = File::create(base_dir.join(FILE_DATA))?;
        let mut offsets = File::create(base_dir.join(FILE_OFFSETS))?;
        offsets.write_all(&0u32.to_le_bytes())?;

        Ok(Self {
            base_dir,
            files: Some(OpenFiles {
                data: BufWriter::new(data),
                offsets: BufWriter::new(offsets),
            }),
            poisoned: false,
            num_records: 0,
            data_len: 0,
            config,
        })
    }

    fn open_existing(base_dir: PathBuf, config: StoreConfig) -> Result<Self> {
        let data_path = base_dir.join(FILE_DATA);
        let offsets_path = base_dir.join(FILE_OFFSETS);
        for path in [&data_path, &offsets_path] {
            if !path.is_file() {
                return Err(LarderError::PathNotFound(path.clone()));
            }
        }

        let mut offsets = OpenOptions::new().read(true).write(true).open(&offsets_path)?;
        let index_len = offsets.metadata()?.len();
        let mut header = [0u8; INDEX_HEADER_LEN];
        offsets.read_exact(&mut header).map_err(|_| {
            LarderError::CorruptStore(format!("index file too short for header ({} bytes)", index_len))
        })?;
        let num_records = read_header(&header)?;

        let expected = INDEX_HEADER_LEN as u64 + num_records as u64 * INDEX_ENTRY_LEN as u64;
        if index_len != expected {
            return Err(LarderError::CorruptStore(format!(
                "cannot append: index declares {} records but holds {} bytes",
                num_records, index_len
            )));
        }
        offsets.seek(SeekFrom::End(0))?;

        let data = OpenOptions::new().append(true).open(&data_path)?;
        let data_len = data.metadata()?.len();

        Ok(Self {
            base_dir,
            files: Some(OpenFiles {
                data: BufWriter::new(data),
                offsets: BufWriter::new(offsets),
            }),
            poisoned: false,
            num_records,
            data_len,
            config,
        })
    }

    /// Append a record at the end of the data file
    pub fn append<R: RecipeMetadata + ?Sized>(&mut self, record: &R) -> Result<()> {
        let files = self.files.as_mut().ok_or(LarderError::Closed)?;

        let payload = encode(record)?;
        let limit = self.config.capacity();
        let required = self.data_len + payload.len() as u64;
        if required > limit {
            return Err(LarderError::CapacityExceeded { required, limit });
        }
        // `limit` never exceeds u32::MAX, so the start offset fits.
        let offset = self.data_len as u32;

        let entry = encode_entry(record.recipe_id(), offset);
        if let Err(err) = write_entry(&mut files.data, &mut files.offsets, &payload, &entry) {
            return Err(self.poison(err));
        }

        self.data_len = required;
        self.num_records += 1;
        debug!(recipe_id = record.recipe_id(), offset, len = payload.len(), "appended record");
        Ok(())
    }

    /// Flush everything, write the final record count and release the files
    ///
    /// Returns the number of records in the store. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<u32> {
        if self.poisoned {
            return Err(LarderError::CorruptStore(format!(
                "store at {} was abandoned after a failed write",
                self.base_dir.display()
            )));
        }
        let Some(files) = self.files.take() else {
            return Ok(self.num_records);
        };

        if let Err(err) = self.finish(files) {
            return Err(self.poison(err));
        }

        info!(
            path = %self.base_dir.display(),
            records = self.num_records,
            data_bytes = self.data_len,
            "closed store writer"
        );
        Ok(self.num_records)
    }

    fn finish(&self, files: OpenFiles) -> io::Result<()> {
        let mut data = files.data.into_inner().map_err(|e| e.into_error())?;
        let mut offsets = files.offsets.into_inner().map_err(|e| e.into_error())?;
        data.flush()?;

        offsets.seek(SeekFrom::Start(0))?;
        offsets.write_all(&self.num_records.to_le_bytes())?;
        offsets.flush()?;

        if self.config.sync_on_close {
            data.sync_all()?;
            offsets.sync_all()?;
        }
        Ok(())
    }

    /// Drop the files after an I/O error; the header is never finalized
    fn poison(&mut self, err: io::Error) -> LarderError {
        warn!(
            path = %self.base_dir.display(),
            records = self.num_records,
            error = %err,
            "store write failed, writer disabled"
        );
        self.files = None;
        self.poisoned = true;
        LarderError::Io(err)
    }

    /// Records written so far, including those from a previous session in append mode
    pub fn len(&self) -> u32 {
        self.num_records
    }

    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }

    /// Current size of the data file in bytes
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    pub fn is_closed(&self) -> bool {
        self.files.is_none()
    }

    /// Whether a failed write disabled this writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }
}

/// Write one record and its index entry
fn write_entry<D: Write, O: Write>(data: &mut D, offsets: &mut O, payload: &[u8], entry: &[u8]) -> io::Result<()> {
    data.write_all(payload)?;
    offsets.write_all(entry)
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        if self.files.is_some() {
            if let Err(e) = self.close() {
                warn!(path = %self.base_dir.display(), error = %e, "failed to close dropped store writer");
            }
        }
    }
}
