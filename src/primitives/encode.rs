//! Consensus-critical serialization and deserialization.

use crate::{CtError, Result};
use std::io::{Read, Write};

/// Upper bound on a single length-prefixed item, matching the consensus
/// MAX_SIZE of 32 MiB.
pub const MAX_VEC_SIZE: u64 = 0x0200_0000;

pub trait Encodable {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize>;

    fn consensus_encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.consensus_encode(&mut buf)?;
        Ok(buf)
    }
}

pub trait Decodable: Sized {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self>;

    /// Decodes a value that must consume the whole slice.
    fn consensus_decode_from_slice(data: &[u8]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(data);
        let value = Self::consensus_decode(&mut cursor)?;
        if cursor.position() as usize != data.len() {
            return Err(CtError::Format(format!(
                "{} trailing bytes after data",
                data.len() - cursor.position() as usize
            )));
        }
        Ok(value)
    }
}

// Helper for writing a variable-length integer (CompactSize).
pub fn write_varint<W: Write>(writer: &mut W, n: u64) -> Result<usize> {
    if n < 0xfd {
        writer.write_all(&[n as u8])?;
        Ok(1)
    } else if n <= 0xffff {
        writer.write_all(&[0xfd])?;
        writer.write_all(&(n as u16).to_le_bytes())?;
        Ok(3)
    } else if n <= 0xffffffff {
        writer.write_all(&[0xfe])?;
        writer.write_all(&(n as u32).to_le_bytes())?;
        Ok(5)
    } else {
        writer.write_all(&[0xff])?;
        writer.write_all(&n.to_le_bytes())?;
        Ok(9)
    }
}

// Helper for reading a variable-length integer (CompactSize). Non-minimal
// encodings are rejected so that decoding stays lossless.
pub fn read_varint<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;

    let (value, minimum) = match buf[0] {
        0xfd => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            (u16::from_le_bytes(buf) as u64, 0xfd)
        }
        0xfe => {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            (u32::from_le_bytes(buf) as u64, 0x10000)
        }
        0xff => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            (u64::from_le_bytes(buf), 0x100000000)
        }
        n => return Ok(n as u64),
    };

    if value < minimum {
        return Err(CtError::Format("non-canonical CompactSize".to_string()));
    }
    Ok(value)
}

pub fn varint_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffffffff => 5,
        _ => 9,
    }
}

/// Writes `data` prefixed with its CompactSize length.
pub fn write_varbytes<W: Write>(writer: &mut W, data: &[u8]) -> Result<usize> {
    let written = write_varint(writer, data.len() as u64)?;
    writer.write_all(data)?;
    Ok(written + data.len())
}

/// Reads a CompactSize length followed by that many bytes.
pub fn read_varbytes<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_varint(reader)?;
    if len > MAX_VEC_SIZE {
        return Err(CtError::Format(format!("length {} exceeds maximum", len)));
    }
    let mut buf = Vec::with_capacity((len as usize).min(4096));
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(CtError::Format("data truncated".to_string()));
    }
    Ok(buf)
}

impl Encodable for u8 {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(&[*self])?;
        Ok(1)
    }
}

impl Decodable for u8 {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

impl Encodable for u32 {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(&self.to_le_bytes())?;
        Ok(4)
    }
}

impl Decodable for u32 {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl Encodable for i32 {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(&self.to_le_bytes())?;
        Ok(4)
    }
}

impl Decodable for i32 {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }
}

impl Encodable for [u8; 32] {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(self)?;
        Ok(32)
    }
}

impl Decodable for [u8; 32] {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = write_varint(writer, self.len() as u64)?;
        for item in self {
            written += item.consensus_encode(writer)?;
        }
        Ok(written)
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        let len = read_varint(reader)?;
        if len > MAX_VEC_SIZE {
            return Err(CtError::Format(format!("vector length {} exceeds maximum", len)));
        }
        // capacity is capped; a lying length fails on the first short read
        let mut vec = Vec::with_capacity((len as usize).min(1024));
        for _ in 0..len {
            vec.push(T::consensus_decode(reader)?);
        }
        Ok(vec)
    }
}

/// A witness stack: a vector of byte vectors.
pub fn write_stack<W: Write>(writer: &mut W, stack: &[Vec<u8>]) -> Result<usize> {
    let mut written = write_varint(writer, stack.len() as u64)?;
    for item in stack {
        written += write_varbytes(writer, item)?;
    }
    Ok(written)
}

pub fn read_stack<R: Read>(reader: &mut R) -> Result<Vec<Vec<u8>>> {
    let len = read_varint(reader)?;
    if len > MAX_VEC_SIZE {
        return Err(CtError::Format(format!("witness stack length {} exceeds maximum", len)));
    }
    let mut stack = Vec::with_capacity((len as usize).min(1024));
    for _ in 0..len {
        stack.push(read_varbytes(reader)?);
    }
    Ok(stack)
}
