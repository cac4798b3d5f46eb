//! Offset-table writer
//!
//! Every repeated entity with a variable-length payload is laid out as a
//! table: `count` fixed-size records first, then the payloads in the same
//! order. Offsets are absolute from the data section start, so a table has to
//! know where it will land (`base`) before anything is encoded. Nested tables
//! (a mesh's UV maps and submeshes) are built from inside the parent's
//! [`Table::push`] closure, based at the offset that closure receives.

use std::marker::PhantomData;

use runner_core::{Error, Result};

use crate::traits::Record;

/// Absolute offset of the byte following `len` bytes placed at `base`
pub fn offset_after(base: u32, len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .and_then(|len| base.checked_add(len))
        .ok_or_else(|| Error::invalid_data(format!("data section overflows 4 GiB ({base} + {len})")))
}

/// Header records followed by their payloads
pub struct Table<T: Record> {
    reserved: usize,
    cursor: u32,
    records: Vec<u8>,
    payload: Vec<u8>,
    count: usize,
    _record: PhantomData<T>,
}

impl<T: Record> Table<T> {
    /// Reserve `count` records at absolute offset `base`
    pub fn new(base: u32, count: usize) -> Result<Self> {
        let cursor = offset_after(base, count * T::SIZE)?;
        Ok(Self {
            reserved: count,
            cursor,
            records: Vec::with_capacity(count * T::SIZE),
            payload: Vec::new(),
            count: 0,
            _record: PhantomData,
        })
    }

    /// Absolute offset the next payload will be written at
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Add one entry. `build` receives the absolute offset of its payload and
    /// returns the record pointing at it together with the payload bytes.
    pub fn push<F>(&mut self, build: F) -> Result<()>
    where
        F: FnOnce(u32) -> Result<(T, Vec<u8>)>,
    {
        if self.count == self.reserved {
            return Err(Error::invalid_data(format!(
                "table reserved for {} records received one more",
                self.reserved
            )));
        }

        let (record, payload) = build(self.cursor)?;
        record.write_to(&mut self.records)?;
        self.cursor = offset_after(self.cursor, payload.len())?;
        self.payload.extend_from_slice(&payload);
        self.count += 1;
        Ok(())
    }

    /// Concatenate records and payloads
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.count != self.reserved {
            return Err(Error::invalid_data(format!(
                "table reserved {} records but {} were written",
                self.reserved, self.count
            )));
        }
        self.records.append(&mut self.payload);
        Ok(self.records)
    }
}

/// Sequential placement of blocks whose offsets are recorded by a parent
/// record (world sections, mesh payloads).
pub struct Layout {
    cursor: u32,
    bytes: Vec<u8>,
}

impl Layout {
    /// Start placing blocks at absolute offset `start`
    pub fn new(start: u32) -> Self {
        Self {
            cursor: start,
            bytes: Vec::new(),
        }
    }

    /// Absolute offset of the next block
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Append `block` and return the offset it was placed at
    pub fn place(&mut self, block: Vec<u8>) -> Result<u32> {
        let offset = self.cursor;
        self.cursor = offset_after(offset, block.len())?;
        self.bytes.extend_from_slice(&block);
        Ok(offset)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
    use std::io::{Read, Write};

    /// (len, offset) pair, like a submesh header without the name
    #[derive(Debug, PartialEq)]
    struct Span(u32, u32);

    impl Record for Span {
        const SIZE: usize = 8;

        fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
            writer.write_u32::<LittleEndian>(self.0)?;
            writer.write_u32::<LittleEndian>(self.1)?;
            Ok(())
        }

        fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
            Ok(Span(reader.read_u32::<LittleEndian>()?, reader.read_u32::<LittleEndian>()?))
        }
    }

    #[test]
    fn test_records_precede_payloads() {
        let mut table = Table::<Span>::new(100, 2).unwrap();
        assert_eq!(table.cursor(), 116);

        table.push(|offset| Ok((Span(3, offset), vec![1, 2, 3]))).unwrap();
        table.push(|offset| Ok((Span(2, offset), vec![4, 5]))).unwrap();
        let bytes = table.finish().unwrap();

        assert_eq!(bytes.len(), 16 + 5);
        let first = Span::read_from(&mut &bytes[0..8]).unwrap();
        let second = Span::read_from(&mut &bytes[8..16]).unwrap();
        assert_eq!(first, Span(3, 116));
        assert_eq!(second, Span(2, 119));
        assert_eq!(&bytes[16..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_count_mismatch_is_an_error() {
        let table = Table::<Span>::new(0, 1).unwrap();
        assert!(table.finish().is_err());

        let mut table = Table::<Span>::new(0, 0).unwrap();
        assert!(table.push(|offset| Ok((Span(0, offset), vec![]))).is_err());
    }

    #[test]
    fn test_layout_places_blocks_in_order() {
        let mut layout = Layout::new(20);
        assert_eq!(layout.place(vec![0; 4]).unwrap(), 20);
        assert_eq!(layout.place(vec![]).unwrap(), 24);
        assert_eq!(layout.place(vec![0; 2]).unwrap(), 24);
        assert_eq!(layout.cursor(), 26);
        assert_eq!(layout.into_bytes().len(), 6);
    }

    #[test]
    fn test_offset_overflow_detected() {
        assert!(offset_after(u32::MAX - 1, 4).is_err());
    }
}
