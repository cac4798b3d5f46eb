//! `.texture` container: a chain of ETC1-compressed mipmaps
//!
//! ```text
//! data section
//! ├── TextureRecord   flags, bytes per pixel, mipmap count, table offset
//! ├── MipmapRecord[n] size, width, height, data offset   (largest first)
//! └── payload[n]      raw ETC1 blocks, same order
//! ```

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use runner_core::{Error, Result};
use serde::Serialize;
use tracing::debug;

use crate::header::{read_container, write_container, TEXTURE_MAGIC};
use crate::table::Table;
use crate::traits::{decode_records, slice_at, Parser, Record};

/// Texture flag: payloads are ETC1 blocks without a PKM header
pub const FLAG_ETC1: u32 = 1;

/// Texture record (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRecord {
    pub flags: u32,
    pub bytes_per_pixel: u32,
    pub mipmap_count: u32,
    pub mipmaps_offset: u32,
}

impl Record for TextureRecord {
    const SIZE: usize = 16;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.flags)?;
        writer.write_u32::<LittleEndian>(self.bytes_per_pixel)?;
        writer.write_u32::<LittleEndian>(self.mipmap_count)?;
        writer.write_u32::<LittleEndian>(self.mipmaps_offset)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            flags: reader.read_u32::<LittleEndian>()?,
            bytes_per_pixel: reader.read_u32::<LittleEndian>()?,
            mipmap_count: reader.read_u32::<LittleEndian>()?,
            mipmaps_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Mipmap record (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipmapRecord {
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub data_offset: u32,
}

impl Record for MipmapRecord {
    const SIZE: usize = 16;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(self.width)?;
        writer.write_u32::<LittleEndian>(self.height)?;
        writer.write_u32::<LittleEndian>(self.data_offset)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            size: reader.read_u32::<LittleEndian>()?,
            width: reader.read_u32::<LittleEndian>()?,
            height: reader.read_u32::<LittleEndian>()?,
            data_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// One compressed mip level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mipmap {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// A decoded `.texture` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureFile {
    pub flags: u32,
    pub bytes_per_pixel: u32,
    /// Largest level first
    pub mipmaps: Vec<Mipmap>,
}

impl TextureFile {
    /// Empty ETC1 texture
    pub fn new(bytes_per_pixel: u32) -> Self {
        Self {
            flags: FLAG_ETC1,
            bytes_per_pixel,
            mipmaps: Vec::new(),
        }
    }

    /// Total compressed payload size
    pub fn data_size(&self) -> usize {
        self.mipmaps.iter().map(|m| m.data.len()).sum()
    }

    /// Encode the data section (offsets start at 0)
    pub fn encode_data(&self) -> Result<Vec<u8>> {
        let mipmaps_offset = TextureRecord::SIZE as u32;
        let record = TextureRecord {
            flags: self.flags,
            bytes_per_pixel: self.bytes_per_pixel,
            mipmap_count: self.mipmaps.len() as u32,
            mipmaps_offset,
        };

        let mut table = Table::<MipmapRecord>::new(mipmaps_offset, self.mipmaps.len())?;
        for mipmap in &self.mipmaps {
            table.push(|data_offset| {
                let record = MipmapRecord {
                    size: mipmap.data.len() as u32,
                    width: mipmap.width,
                    height: mipmap.height,
                    data_offset,
                };
                Ok((record, mipmap.data.clone()))
            })?;
        }

        let mut data = Vec::new();
        record.write_to(&mut data)?;
        data.extend(table.finish()?);
        Ok(data)
    }

    /// Encode the complete container, header included
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        write_container(TEXTURE_MAGIC, &self.encode_data()?)
    }
}

/// Reader for `.texture` containers
#[derive(Debug, Default)]
pub struct TextureParser;

impl TextureParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode a data section
    pub fn parse_data(&self, data: &[u8]) -> Result<TextureFile> {
        let record = TextureRecord::read_from(&mut slice_at(data, 0, TextureRecord::SIZE as u64, "texture record")?)?;
        let records: Vec<MipmapRecord> =
            decode_records(data, record.mipmaps_offset, record.mipmap_count, "mipmap table")?;

        let mut mipmaps = Vec::with_capacity(records.len());
        for (level, mip) in records.iter().enumerate() {
            debug!(
                level,
                width = mip.width,
                height = mip.height,
                size = mip.size,
                offset = mip.data_offset,
                "Mipmap"
            );
            if mip.width == 0 || mip.height == 0 {
                return Err(Error::invalid_data(format!("mipmap {level} has zero size")));
            }
            let bytes = slice_at(data, mip.data_offset, u64::from(mip.size), &format!("mipmap {level} data"))?;
            mipmaps.push(Mipmap {
                width: mip.width,
                height: mip.height,
                data: bytes.to_vec(),
            });
        }

        Ok(TextureFile {
            flags: record.flags,
            bytes_per_pixel: record.bytes_per_pixel,
            mipmaps,
        })
    }
}

impl Parser for TextureParser {
    type Output = TextureFile;

    fn name(&self) -> &str {
        "Runner Texture"
    }

    fn extensions(&self) -> &[&str] {
        &["texture"]
    }

    fn magic_bytes(&self) -> &[u8] {
        &TEXTURE_MAGIC
    }

    fn parse_bytes(&self, bytes: &[u8]) -> Result<TextureFile> {
        let (_, data) = read_container(TEXTURE_MAGIC, bytes)?;
        self.parse_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TextureFile {
        let mut texture = TextureFile::new(3);
        texture.mipmaps = vec![
            Mipmap { width: 4, height: 4, data: vec![0xAA; 8] },
            Mipmap { width: 2, height: 2, data: vec![0xBB; 8] },
            Mipmap { width: 1, height: 1, data: vec![0xCC; 8] },
        ];
        texture
    }

    #[test]
    fn test_data_section_layout() {
        let data = sample().encode_data().unwrap();

        // record + 3 mipmap records + 3 payloads
        assert_eq!(data.len(), 16 + 3 * 16 + 24);
        assert_eq!(&data[0..4], &FLAG_ETC1.to_le_bytes());
        assert_eq!(&data[4..8], &3u32.to_le_bytes());
        assert_eq!(&data[8..12], &3u32.to_le_bytes());
        assert_eq!(&data[12..16], &16u32.to_le_bytes());

        let first = MipmapRecord::read_from(&mut &data[16..32]).unwrap();
        let last = MipmapRecord::read_from(&mut &data[48..64]).unwrap();
        assert_eq!(first, MipmapRecord { size: 8, width: 4, height: 4, data_offset: 64 });
        assert_eq!(last, MipmapRecord { size: 8, width: 1, height: 1, data_offset: 80 });
        assert!(data[64..72].iter().all(|&b| b == 0xAA));
        assert!(data[80..88].iter().all(|&b| b == 0xCC));
    }

    #[test]
    fn test_parser_reads_back_container() {
        let texture = sample();
        let bytes = texture.to_bytes().unwrap();
        let parsed = TextureParser::new().parse_bytes(&bytes).unwrap();
        assert_eq!(parsed, texture);
    }

    #[test]
    fn test_parser_rejects_dangling_payload() {
        let mut data = sample().encode_data().unwrap();
        // point the last mipmap past the end of the section
        data[60..64].copy_from_slice(&1000u32.to_le_bytes());
        let err = TextureParser::new().parse_data(&data).unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfBounds { .. }));
    }
}
