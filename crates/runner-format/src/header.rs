//! File header shared by both containers

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use runner_core::{Error, Result};

use crate::traits::Record;

/// Magic of `.texture` files
pub const TEXTURE_MAGIC: [u8; 8] = *b"RNNRTXTR";

/// Magic of `.runner` world files
pub const WORLD_MAGIC: [u8; 8] = *b"RNNRWRLD";

/// The only container version the runtime understands
pub const FORMAT_VERSION: u32 = 1;

/// File header (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 8],
    pub version: u32,
    /// Start of the data section, from the start of the file
    pub data_offset: u32,
    /// Length of the data section
    pub data_size: u32,
}

impl FileHeader {
    /// Header for a data section that immediately follows it
    pub fn new(magic: [u8; 8], data_size: u32) -> Self {
        Self {
            magic,
            version: FORMAT_VERSION,
            data_offset: Self::SIZE as u32,
            data_size,
        }
    }
}

impl Record for FileHeader {
    const SIZE: usize = 20;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.data_offset)?;
        writer.write_u32::<LittleEndian>(self.data_size)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        Ok(Self {
            magic,
            version: reader.read_u32::<LittleEndian>()?,
            data_offset: reader.read_u32::<LittleEndian>()?,
            data_size: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Prefix `data` with a file header
pub fn write_container(magic: [u8; 8], data: &[u8]) -> Result<Vec<u8>> {
    let data_size = u32::try_from(data.len())
        .map_err(|_| Error::invalid_data(format!("data section of {} bytes exceeds 4 GiB", data.len())))?;

    let header = FileHeader::new(magic, data_size);
    let mut out = Vec::with_capacity(FileHeader::SIZE + data.len());
    header.write_to(&mut out)?;
    out.extend_from_slice(data);
    Ok(out)
}

/// Check the header of `bytes` and return its data section
pub fn read_container(magic: [u8; 8], bytes: &[u8]) -> Result<(FileHeader, &[u8])> {
    if bytes.len() < FileHeader::SIZE {
        return Err(Error::UnexpectedEof {
            offset: bytes.len() as u64,
        });
    }

    let header = FileHeader::read_from(&mut &bytes[..FileHeader::SIZE])?;
    if header.magic != magic {
        return Err(Error::InvalidMagic {
            expected: magic.to_vec(),
            found: header.magic.to_vec(),
        });
    }
    if header.version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion {
            version: header.version,
            supported: FORMAT_VERSION,
        });
    }

    let start = u64::from(header.data_offset);
    let end = start + u64::from(header.data_size);
    if start < FileHeader::SIZE as u64 || end > bytes.len() as u64 {
        return Err(Error::OffsetOutOfBounds {
            what: "data section".to_string(),
            offset: start,
            len: u64::from(header.data_size),
            available: bytes.len() as u64,
        });
    }

    Ok((header, &bytes[start as usize..end as usize]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bytes = write_container(WORLD_MAGIC, &[1, 2, 3]).unwrap();

        assert_eq!(&bytes[..8], b"RNNRWRLD");
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &20u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &3u32.to_le_bytes());
        assert_eq!(&bytes[20..], &[1, 2, 3]);
    }

    #[test]
    fn test_read_container_returns_data() {
        let bytes = write_container(TEXTURE_MAGIC, b"payload").unwrap();
        let (header, data) = read_container(TEXTURE_MAGIC, &bytes).unwrap();

        assert_eq!(&header.magic, b"RNNRTXTR");
        assert_eq!(data, b"payload");
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let bytes = write_container(TEXTURE_MAGIC, b"payload").unwrap();
        let err = read_container(WORLD_MAGIC, &bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_truncated_data_rejected() {
        let mut bytes = write_container(WORLD_MAGIC, &[0; 32]).unwrap();
        bytes.truncate(40);
        let err = read_container(WORLD_MAGIC, &bytes).unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfBounds { .. }));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut bytes = write_container(WORLD_MAGIC, &[]).unwrap();
        bytes[8] = 2;
        let err = read_container(WORLD_MAGIC, &bytes).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { version: 2, supported: 1 }));
    }
}
