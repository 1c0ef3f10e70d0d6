//! Little-endian field I/O for ZIP records.
//!
//! All multi-byte ZIP fields are little-endian. Readers work on any
//! `io::Read` (usually a `Cursor` over a record buffer); writers on any
//! `io::Write`.

use std::io::{self, Read, Write};

/// Reads a single byte.
pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Reads an unsigned 16-bit little-endian integer.
pub fn read_u16_le<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads an unsigned 32-bit little-endian integer.
pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads an unsigned 64-bit little-endian integer.
pub fn read_u64_le<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Reads exact number of bytes into a new vector.
pub fn read_bytes<R: Read>(r: &mut R, count: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Writes an unsigned 16-bit little-endian integer.
pub fn write_u16_le<W: Write>(w: &mut W, value: u16) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Writes an unsigned 32-bit little-endian integer.
pub fn write_u32_le<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Writes an unsigned 64-bit little-endian integer.
pub fn write_u64_le<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Returns the value to store in a 32-bit field, or the ZIP64 marker.
pub fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value)
        .ok()
        .filter(|&v| v != u32::MAX)
        .unwrap_or(u32::MAX)
}

/// Returns the value to store in a 16-bit field, or the ZIP64 marker.
pub fn clamp_u16(value: u64) -> u16 {
    u16::try_from(value)
        .ok()
        .filter(|&v| v != u16::MAX)
        .unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_u16_le() {
        let data = [0x01, 0x02];
        let mut cursor = Cursor::new(&data);
        assert_eq!(read_u16_le(&mut cursor).unwrap(), 0x0201);
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut cursor = Cursor::new(&data);
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 0x04030201);
    }

    #[test]
    fn test_read_u64_le() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut cursor = Cursor::new(&data);
        assert_eq!(read_u64_le(&mut cursor).unwrap(), 0x0807060504030201);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x01u8];
        let mut cursor = Cursor::new(&data);
        assert!(read_u16_le(&mut cursor).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let mut buf = Vec::new();
        write_u16_le(&mut buf, 0xBEEF).unwrap();
        write_u32_le(&mut buf, 0xDEAD_BEEF).unwrap();
        write_u64_le(&mut buf, 1 << 40).unwrap();
        assert_eq!(buf.len(), 14);

        let mut cursor = Cursor::new(&buf);
        assert_eq!(read_u16_le(&mut cursor).unwrap(), 0xBEEF);
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 0xDEAD_BEEF);
        assert_eq!(read_u64_le(&mut cursor).unwrap(), 1 << 40);
    }

    #[test]
    fn test_read_bytes() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut cursor = Cursor::new(&data);
        let result = read_bytes(&mut cursor, 3).unwrap();
        assert_eq!(result, vec![0x01, 0x02, 0x03]);
        assert_eq!(read_u8(&mut cursor).unwrap(), 0x04);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_u32(5), 5);
        assert_eq!(clamp_u32(u64::from(u32::MAX)), u32::MAX);
        assert_eq!(clamp_u32(1 << 33), u32::MAX);
        assert_eq!(clamp_u16(70_000), u16::MAX);
        assert_eq!(clamp_u16(12), 12);
    }
}
