// runner-format/src/traits.rs
//! Core traits shared by the container formats.
//!
//! [`Record`] is implemented by every fixed-size structure in the data
//! section; [`Parser`] by the two container readers. The free functions at
//! the bottom encode the field types the records are built from.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use runner_core::{Error, Mat4x4, Result, Vec2, Vec3};

/// Width of every fixed string field (names, paths)
pub const NAME_LEN: usize = 64;

/// A fixed-size, little-endian record of the data section
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Encode this record, writing exactly `SIZE` bytes
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()>;

    /// Decode one record, consuming exactly `SIZE` bytes
    fn read_from<R: Read>(reader: &mut R) -> Result<Self>;
}

/// Reader for one container format
pub trait Parser {
    /// The parsed output type
    type Output;

    /// Returns a human-readable name for this parser
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles (e.g., ["runner"])
    fn extensions(&self) -> &[&str];

    /// Returns the magic bytes that identify this file type
    fn magic_bytes(&self) -> &[u8];

    /// Parse a complete container held in memory
    fn parse_bytes(&self, bytes: &[u8]) -> Result<Self::Output>;

    /// Parse from a file path
    fn parse_file(&self, path: &Path) -> Result<Self::Output> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes)
    }

    /// Check if this parser can handle the given file
    fn can_parse(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if self.extensions().iter().any(|e| e.to_lowercase() == ext_str) {
                return true;
            }
        }

        let magic = self.magic_bytes();
        if let Ok(file) = std::fs::File::open(path) {
            let mut reader = std::io::BufReader::new(file);
            let mut buffer = vec![0u8; magic.len()];
            if reader.read_exact(&mut buffer).is_ok() {
                return buffer == magic;
            }
        }

        false
    }
}

/// Write a NUL-padded name, truncated on a char boundary to `NAME_LEN - 1` bytes
pub fn write_name<W: Write>(writer: &mut W, name: &str) -> Result<()> {
    let mut end = name.len().min(NAME_LEN - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    let mut buf = [0u8; NAME_LEN];
    buf[..end].copy_from_slice(&name.as_bytes()[..end]);
    writer.write_all(&buf)?;
    Ok(())
}

/// Read a NUL-padded name
pub fn read_name<R: Read>(reader: &mut R) -> Result<String> {
    let mut buf = [0u8; NAME_LEN];
    reader.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

pub fn write_vec2<W: Write>(writer: &mut W, v: Vec2) -> Result<()> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    Ok(())
}

pub fn read_vec2<R: Read>(reader: &mut R) -> Result<Vec2> {
    let x = reader.read_f32::<LittleEndian>()?;
    let y = reader.read_f32::<LittleEndian>()?;
    Ok(Vec2::new(x, y))
}

pub fn write_vec3<W: Write>(writer: &mut W, v: Vec3) -> Result<()> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    writer.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

pub fn read_vec3<R: Read>(reader: &mut R) -> Result<Vec3> {
    let x = reader.read_f32::<LittleEndian>()?;
    let y = reader.read_f32::<LittleEndian>()?;
    let z = reader.read_f32::<LittleEndian>()?;
    Ok(Vec3::new(x, y, z))
}

pub fn write_mat4<W: Write>(writer: &mut W, m: &Mat4x4) -> Result<()> {
    for value in m.to_flat() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    Ok(())
}

pub fn read_mat4<R: Read>(reader: &mut R) -> Result<Mat4x4> {
    let mut flat = [0f32; 16];
    reader.read_f32_into::<LittleEndian>(&mut flat)?;
    Ok(Mat4x4::from_flat(&flat))
}

/// Encode a slice of records back to back
pub fn encode_records<T: Record>(records: &[T]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(records.len() * T::SIZE);
    for record in records {
        record.write_to(&mut out)?;
    }
    Ok(out)
}

/// Borrow `len` bytes at `offset`, failing if the range leaves `data`
pub fn slice_at<'a>(data: &'a [u8], offset: u32, len: u64, what: &str) -> Result<&'a [u8]> {
    let start = u64::from(offset);
    let end = start + len;
    if end > data.len() as u64 {
        return Err(Error::OffsetOutOfBounds {
            what: what.to_string(),
            offset: start,
            len,
            available: data.len() as u64,
        });
    }
    Ok(&data[start as usize..end as usize])
}

/// Decode `count` records stored at `offset`
pub fn decode_records<T: Record>(data: &[u8], offset: u32, count: u32, what: &str) -> Result<Vec<T>> {
    let bytes = slice_at(data, offset, u64::from(count) * T::SIZE as u64, what)?;
    let mut cursor = Cursor::new(bytes);
    (0..count).map(|_| T::read_from(&mut cursor)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_nul_padded() {
        let mut out = Vec::new();
        write_name(&mut out, "Cube").unwrap();

        assert_eq!(out.len(), NAME_LEN);
        assert_eq!(&out[..4], b"Cube");
        assert!(out[4..].iter().all(|&b| b == 0));
        assert_eq!(read_name(&mut Cursor::new(&out)).unwrap(), "Cube");
    }

    #[test]
    fn test_long_name_keeps_terminator() {
        let name = "x".repeat(100);
        let mut out = Vec::new();
        write_name(&mut out, &name).unwrap();

        assert_eq!(out.len(), NAME_LEN);
        assert_eq!(out[NAME_LEN - 1], 0);
        assert_eq!(read_name(&mut Cursor::new(&out)).unwrap().len(), NAME_LEN - 1);
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        // 62 ASCII bytes followed by a 2-byte char straddling the limit
        let name = format!("{}é", "a".repeat(62));
        let mut out = Vec::new();
        write_name(&mut out, &name).unwrap();

        let back = read_name(&mut Cursor::new(&out)).unwrap();
        assert_eq!(back, "a".repeat(62));
    }

    #[test]
    fn test_slice_at_bounds() {
        let data = [0u8; 16];
        assert_eq!(slice_at(&data, 8, 8, "tail").unwrap().len(), 8);
        assert_eq!(slice_at(&data, 16, 0, "empty table").unwrap().len(), 0);

        let err = slice_at(&data, 12, 8, "vertices").unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfBounds { offset: 12, len: 8, .. }));
    }
}
