//! Model files.
//!
//! Two layouts are supported:
//!
//! - **legacy**: the tables of every pass in order, each as `totals` then
//!   `sums`, native-endian `u64`, with no header. The file size is exactly
//!   `passes * 2 * 2^24 * 8` bytes and the pass count must be known by the
//!   reader. Not portable across byte orders.
//! - **portable**: magic `LUTDNZ01`, `u32` LE pass count, `u32` LE key bits
//!   (24), then the same tables in little-endian.
//!
//! Readers tell the two apart by the magic prefix. A legacy file would need a
//! first-bin count of about 3.5e18 to collide with it.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use strum_macros::{Display, EnumString};

use super::Cascade;
use crate::codec::Codec;
use crate::context::KEY_SPACE;
use crate::error::{Error, Result};
use crate::table::{ByteOrder, LutTable};

pub const PORTABLE_MAGIC: [u8; 8] = *b"LUTDNZ01";

const KEY_BITS: u32 = KEY_SPACE.trailing_zeros();

/// Buffer size for model streaming; tables are hundreds of megabytes.
const MODEL_BUF_SIZE: usize = 1 << 20;

/// On-disk layout of a trained cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ModelFormat {
    #[default]
    Legacy,
    Portable,
}

/// Exact size in bytes of a legacy model with `passes` passes.
pub const fn legacy_model_len(passes: usize) -> u64 {
    (passes * LutTable::byte_len(KEY_SPACE)) as u64
}

impl Cascade {
    pub fn write<W: Write>(&self, writer: &mut W, format: ModelFormat) -> Result<()> {
        match format {
            ModelFormat::Legacy => {
                for codec in &self.codecs {
                    codec.table().write_raw(writer)?;
                }
            }
            ModelFormat::Portable => {
                writer.write_all(&PORTABLE_MAGIC)?;
                writer.write_all(&(self.passes() as u32).to_le_bytes())?;
                writer.write_all(&KEY_BITS.to_le_bytes())?;
                for codec in &self.codecs {
                    codec.table().write_to(writer, ByteOrder::Little)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path, format: ModelFormat) -> Result<()> {
        tracing::info!(path = %path.display(), %format, passes = self.passes(), "Writing model");
        let mut writer = BufWriter::with_capacity(MODEL_BUF_SIZE, File::create(path)?);
        self.write(&mut writer, format)
    }

    /// Reads a headerless legacy model holding exactly `passes` tables.
    pub fn read_legacy<R: Read>(reader: &mut R, passes: usize) -> Result<Self> {
        if passes == 0 {
            return Err(Error::Config("a cascade needs at least one pass".to_string()));
        }
        let cascade = read_tables(reader, passes, ByteOrder::Native)?;
        ensure_exhausted(reader)?;
        cascade.validate()?;
        Ok(cascade)
    }

    /// Reads a portable model; the pass count comes from the header.
    pub fn read_portable<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(Error::from_model_read)?;
        if magic != PORTABLE_MAGIC {
            return Err(Error::MalformedModel("missing portable model header".to_string()));
        }
        let passes = read_u32_le(reader)? as usize;
        let key_bits = read_u32_le(reader)?;
        if key_bits != KEY_BITS {
            return Err(Error::MalformedModel(format!(
                "model uses {key_bits}-bit contexts, expected {KEY_BITS}"
            )));
        }
        if passes == 0 {
            return Err(Error::MalformedModel("model has no passes".to_string()));
        }

        let cascade = read_tables(reader, passes, ByteOrder::Little)?;
        ensure_exhausted(reader)?;
        cascade.validate()?;
        Ok(cascade)
    }

    /// Reads either layout. `passes` is required for legacy data; a portable
    /// header wins over it.
    pub fn read<R: Read>(reader: &mut R, passes: usize) -> Result<Self> {
        let mut prefix = [0u8; PORTABLE_MAGIC.len()];
        let filled = read_prefix(reader, &mut prefix)?;
        let mut stream = (&prefix[..filled]).chain(reader);
        if prefix[..filled] == PORTABLE_MAGIC {
            let cascade = Self::read_portable(&mut stream)?;
            if cascade.passes() != passes {
                tracing::warn!(
                    configured = passes,
                    stored = cascade.passes(),
                    "Model pass count differs from configuration, using the model's"
                );
            }
            Ok(cascade)
        } else {
            Self::read_legacy(&mut stream, passes)
        }
    }

    pub fn load(path: &Path, passes: usize) -> Result<Self> {
        tracing::info!(path = %path.display(), "Reading model");
        let file = File::open(path).map_err(|source| Error::OpenModel {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::with_capacity(MODEL_BUF_SIZE, file);
        Self::read(&mut reader, passes)
    }

    /// Every bin must have been observed at least once (the prior guarantees
    /// it for models written by this crate).
    fn validate(&self) -> Result<()> {
        for (pass, codec) in self.codecs.iter().enumerate() {
            if let Some(index) = codec.table().first_unobserved() {
                return Err(Error::MalformedModel(format!(
                    "pass {pass} has a zero count for context {index:#08x}"
                )));
            }
        }
        Ok(())
    }
}

/// Fills the tables one pass at a time so a header or pass count larger than
/// the data fails at the first missing table instead of allocating them all.
fn read_tables<R: Read>(reader: &mut R, passes: usize, order: ByteOrder) -> Result<Cascade> {
    let mut codecs = Vec::new();
    for pass in 0..passes {
        let codec = Codec::unseeded(pass);
        codec
            .table()
            .read_from(reader, order)
            .map_err(Error::from_model_read)?;
        codecs.push(codec);
    }
    Ok(Cascade::from_codecs(codecs))
}

/// Reads until `buf` is full or the stream ends; returns the bytes read.
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes).map_err(Error::from_model_read)?;
    Ok(u32::from_le_bytes(bytes))
}

fn ensure_exhausted<R: Read>(reader: &mut R) -> Result<()> {
    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        return Err(Error::MalformedModel(
            "trailing bytes after the last table".to_string(),
        ));
    }
    Ok(())
}
