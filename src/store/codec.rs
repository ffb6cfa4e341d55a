//! Record encoding
//!
//! Layout (little endian, offsets relative to the record start):
//!
//! ```text
//! 0   u32  total_len        whole record, header included
//! 4   u32  crc32            over bytes [8, total_len)
//! 8   u64  recipe_id
//! 16  u32  num_ingredients
//! 20  u32  total_time       valid when flags & FLAG_TOTAL_TIME
//! 24  u32  calories         valid when flags & FLAG_CALORIES
//! 28  u32  flags
//! 32  6 x (u32 offset, u32 len)   name, slug, crawl_url, site_name,
//!                                 instructions, ingredients
//! 80  payload
//! ```
//!
//! String slots point at UTF-8 bytes. List slots point at a block made of a
//! `u32` item count, one `u32` byte length per item, then the item bytes.

use crc32fast::Hasher;

use super::record::{RecipeId, RecipeMetadata};
use crate::error::LarderError;
use crate::Result;

/// Size of the fixed part of every record
pub const HEADER_LEN: usize = 80;

const FLAG_TOTAL_TIME: u32 = 0x1;
const FLAG_CALORIES: u32 = 0x2;
const KNOWN_FLAGS: u32 = FLAG_TOTAL_TIME | FLAG_CALORIES;

const SLOT_TABLE: usize = 32;
const SLOT_COUNT: usize = 6;

const SLOT_NAME: usize = 0;
const SLOT_SLUG: usize = 1;
const SLOT_CRAWL_URL: usize = 2;
const SLOT_SITE_NAME: usize = 3;
const SLOT_INSTRUCTIONS: usize = 4;
const SLOT_INGREDIENTS: usize = 5;

/// Encode a record into its self-delimiting binary form
pub fn encode<R: RecipeMetadata + ?Sized>(record: &R) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut slots = [(0u32, 0u32); SLOT_COUNT];

    let strings = [
        (SLOT_NAME, record.name()),
        (SLOT_SLUG, record.slug()),
        (SLOT_CRAWL_URL, record.crawl_url()),
        (SLOT_SITE_NAME, record.site_name()),
    ];
    for (slot, value) in strings {
        let start = HEADER_LEN + payload.len();
        payload.extend_from_slice(value.as_bytes());
        slots[slot] = (to_u32(start)?, to_u32(value.len())?);
    }

    let lists = [
        (SLOT_INSTRUCTIONS, record.instructions()),
        (SLOT_INGREDIENTS, record.ingredients()),
    ];
    for (slot, items) in lists {
        let start = HEADER_LEN + payload.len();
        payload.extend_from_slice(&to_u32(items.len())?.to_le_bytes());
        for item in &items {
            payload.extend_from_slice(&to_u32(item.len())?.to_le_bytes());
        }
        for item in &items {
            payload.extend_from_slice(item.as_bytes());
        }
        slots[slot] = (to_u32(start)?, to_u32(HEADER_LEN + payload.len() - start)?);
    }

    let total_len = to_u32(HEADER_LEN + payload.len())?;

    let mut flags = 0u32;
    if record.total_time().is_some() {
        flags |= FLAG_TOTAL_TIME;
    }
    if record.calories().is_some() {
        flags |= FLAG_CALORIES;
    }

    let mut out = Vec::with_capacity(total_len as usize);
    out.extend_from_slice(&total_len.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // crc placeholder
    out.extend_from_slice(&record.recipe_id().to_le_bytes());
    out.extend_from_slice(&record.num_ingredients().to_le_bytes());
    out.extend_from_slice(&record.total_time().unwrap_or(0).to_le_bytes());
    out.extend_from_slice(&record.calories().unwrap_or(0).to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    for (offset, len) in slots {
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
    }
    debug_assert_eq!(out.len(), HEADER_LEN);
    out.extend_from_slice(&payload);

    let mut hasher = Hasher::new();
    hasher.update(&out[8..]);
    out[4..8].copy_from_slice(&hasher.finalize().to_le_bytes());

    Ok(out)
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| LarderError::CapacityExceeded {
        required: len as u64,
        limit: u32::MAX as u64,
    })
}

#[inline]
fn read_u32(buf: &[u8], pos: usize) -> Option<u32> {
    let bytes = buf.get(pos..pos + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
fn read_u64(buf: &[u8], pos: usize) -> Option<u64> {
    let bytes = buf.get(pos..pos + 8)?;
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    Some(u64::from_le_bytes(out))
}

/// Read-only view of a record inside a shared buffer
///
/// Framing, checksum, slot bounds and UTF-8 are checked once by
/// [`RecipeView::decode`]; afterwards every accessor borrows from the buffer.
#[derive(Clone, Copy, Debug)]
pub struct RecipeView<'a> {
    bytes: &'a [u8],
    offset: u32,
    recipe_id: RecipeId,
    num_ingredients: u32,
    total_time: Option<u32>,
    calories: Option<u32>,
    name: &'a str,
    slug: &'a str,
    crawl_url: &'a str,
    site_name: &'a str,
    instructions: StrList<'a>,
    ingredients: StrList<'a>,
}

impl<'a> RecipeView<'a> {
    /// Decode the record starting at `offset` in `buf`
    pub fn decode(buf: &'a [u8], offset: u32) -> Result<Self> {
        let fail = |reason: &str| LarderError::Decode {
            offset,
            reason: reason.to_string(),
        };

        let start = offset as usize;
        let total_len = read_u32(buf, start).ok_or_else(|| fail("truncated record header"))? as usize;
        if total_len < HEADER_LEN {
            return Err(fail("record length smaller than header"));
        }
        let bytes = start
            .checked_add(total_len)
            .and_then(|end| buf.get(start..end))
            .ok_or_else(|| fail("record extends past end of data"))?;

        let stored_crc = read_u32(bytes, 4).ok_or_else(|| fail("truncated record header"))?;
        let mut hasher = Hasher::new();
        hasher.update(&bytes[8..]);
        if hasher.finalize() != stored_crc {
            return Err(fail("checksum mismatch"));
        }

        // The header is in bounds from here on.
        let header = |pos| read_u32(bytes, pos).unwrap_or_default();
        let recipe_id = read_u64(bytes, 8).unwrap_or_default();
        let flags = header(28);
        if flags & !KNOWN_FLAGS != 0 {
            return Err(fail("unknown flag bits"));
        }

        let mut slots = [&bytes[0..0]; SLOT_COUNT];
        for (i, slot) in slots.iter_mut().enumerate() {
            let slot_offset = header(SLOT_TABLE + i * 8) as usize;
            let slot_len = header(SLOT_TABLE + i * 8 + 4) as usize;
            if slot_offset < HEADER_LEN {
                return Err(fail("field slot points into header"));
            }
            *slot = slot_offset
                .checked_add(slot_len)
                .and_then(|end| bytes.get(slot_offset..end))
                .ok_or_else(|| fail("field slot out of bounds"))?;
        }

        let text = |slot: usize| {
            std::str::from_utf8(slots[slot]).map_err(|_| fail("field is not valid UTF-8"))
        };

        Ok(Self {
            bytes,
            offset,
            recipe_id,
            num_ingredients: header(16),
            total_time: (flags & FLAG_TOTAL_TIME != 0).then(|| header(20)),
            calories: (flags & FLAG_CALORIES != 0).then(|| header(24)),
            name: text(SLOT_NAME)?,
            slug: text(SLOT_SLUG)?,
            crawl_url: text(SLOT_CRAWL_URL)?,
            site_name: text(SLOT_SITE_NAME)?,
            instructions: StrList::parse(slots[SLOT_INSTRUCTIONS]).map_err(|r| fail(r))?,
            ingredients: StrList::parse(slots[SLOT_INGREDIENTS]).map_err(|r| fail(r))?,
        })
    }

    /// Byte offset of this record in the data file
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Raw encoded bytes of this record
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Instruction steps, materialized one at a time
    pub fn instruction_list(&self) -> StrList<'a> {
        self.instructions
    }

    /// Ingredient lines, materialized one at a time
    pub fn ingredient_list(&self) -> StrList<'a> {
        self.ingredients
    }
}

impl RecipeMetadata for RecipeView<'_> {
    fn recipe_id(&self) -> RecipeId {
        self.recipe_id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn slug(&self) -> &str {
        self.slug
    }

    fn crawl_url(&self) -> &str {
        self.crawl_url
    }

    fn site_name(&self) -> &str {
        self.site_name
    }

    fn instructions(&self) -> Vec<&str> {
        self.instructions.iter().collect()
    }

    fn ingredients(&self) -> Vec<&str> {
        self.ingredients.iter().collect()
    }

    fn num_ingredients(&self) -> u32 {
        self.num_ingredients
    }

    fn total_time(&self) -> Option<u32> {
        self.total_time
    }

    fn calories(&self) -> Option<u32> {
        self.calories
    }
}

/// Encoded list of strings borrowed from a record
#[derive(Clone, Copy, Debug)]
pub struct StrList<'a> {
    lens: &'a [u8],
    text: &'a str,
}

impl<'a> StrList<'a> {
    fn parse(block: &'a [u8]) -> std::result::Result<Self, &'static str> {
        let count = read_u32(block, 0).ok_or("truncated list header")? as usize;
        let lens_end = count
            .checked_mul(4)
            .and_then(|n| n.checked_add(4))
            .filter(|&end| end <= block.len())
            .ok_or("list length table out of bounds")?;
        let lens = &block[4..lens_end];
        let text = std::str::from_utf8(&block[lens_end..]).map_err(|_| "list item is not valid UTF-8")?;

        let mut pos = 0usize;
        for chunk in lens.chunks_exact(4) {
            pos += u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
            if pos > text.len() || !text.is_char_boundary(pos) {
                return Err("list item out of bounds");
            }
        }
        if pos != text.len() {
            return Err("list has trailing bytes");
        }

        Ok(Self { lens, text })
    }

    pub fn len(&self) -> usize {
        self.lens.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.lens.is_empty()
    }

    pub fn iter(&self) -> StrListIter<'a> {
        StrListIter {
            lens: self.lens,
            text: self.text,
        }
    }
}

impl<'a> IntoIterator for StrList<'a> {
    type Item = &'a str;
    type IntoIter = StrListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the items of a [`StrList`]
pub struct StrListIter<'a> {
    lens: &'a [u8],
    text: &'a str,
}

impl<'a> Iterator for StrListIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let (len, rest) = self.lens.split_first_chunk::<4>()?;
        self.lens = rest;
        // Boundaries were checked in `StrList::parse`.
        let (item, tail) = self.text.split_at(u32::from_le_bytes(*len) as usize);
        self.text = tail;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.lens.len() / 4;
        (n, Some(n))
    }
}

impl ExactSizeIterator for StrListIter<'_> {}
