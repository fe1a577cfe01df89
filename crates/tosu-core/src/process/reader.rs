use std::sync::Arc;

use crate::error::Result;

/// Trait for reading memory from a process or buffer
///
/// This trait enables mocking for tests and abstracts over different memory sources.
/// All reads are little-endian and all-or-nothing: a short read is an error.
pub trait ReadMemory {
    /// Read raw bytes from memory at the given address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_u8(&self, address: u64) -> Result<u8> {
        let bytes = self.read_bytes(address, 1)?;
        Ok(bytes[0])
    }

    /// Read a signed 16-bit integer from memory
    fn read_i16(&self, address: u64) -> Result<i16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read an unsigned 16-bit integer from memory
    fn read_u16(&self, address: u64) -> Result<u16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a signed 32-bit integer from memory
    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read an unsigned 32-bit integer from memory
    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a signed 64-bit integer from memory
    fn read_i64(&self, address: u64) -> Result<i64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read an unsigned 64-bit integer from memory
    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a 32-bit float from memory
    fn read_f32(&self, address: u64) -> Result<f32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a 64-bit float from memory
    fn read_f64(&self, address: u64) -> Result<f64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_bool(&self, address: u64) -> Result<bool> {
        Ok(self.read_u8(address)? != 0)
    }
}

impl<R: ReadMemory + ?Sized> ReadMemory for &R {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

impl<R: ReadMemory + ?Sized> ReadMemory for Box<R> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

impl<R: ReadMemory + ?Sized> ReadMemory for Arc<R> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockMemoryReader;

    #[test]
    fn test_read_i32() {
        let data = vec![0x78, 0x56, 0x34, 0x12]; // Little-endian 0x12345678
        let reader = MockMemoryReader::new(data);

        let value = reader.read_i32(0x1000).unwrap();
        assert_eq!(value, 0x12345678);
    }

    #[test]
    fn test_read_i32_negative() {
        let data = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let reader = MockMemoryReader::new(data);

        assert_eq!(reader.read_i32(0x1000).unwrap(), -1);
    }

    #[test]
    fn test_read_i16_and_u16() {
        let data = vec![0xFE, 0xFF, 0x34, 0x12];
        let reader = MockMemoryReader::new(data);

        assert_eq!(reader.read_i16(0x1000).unwrap(), -2);
        assert_eq!(reader.read_u16(0x1002).unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u64() {
        let data = vec![0xFF; 8];
        let reader = MockMemoryReader::new(data);

        assert_eq!(reader.read_u64(0x1000).unwrap(), u64::MAX);
    }

    #[test]
    fn test_read_floats() {
        let mut data = 1.5f32.to_le_bytes().to_vec();
        data.extend_from_slice(&(-2.25f64).to_le_bytes());
        let reader = MockMemoryReader::new(data);

        assert_eq!(reader.read_f32(0x1000).unwrap(), 1.5);
        assert_eq!(reader.read_f64(0x1004).unwrap(), -2.25);
    }

    #[test]
    fn test_read_u8_and_bool() {
        let reader = MockMemoryReader::new(vec![0x00, 0x01, 0x7F]);

        assert_eq!(reader.read_u8(0x1002).unwrap(), 0x7F);
        assert!(!reader.read_bool(0x1000).unwrap());
        assert!(reader.read_bool(0x1001).unwrap());
    }

    #[test]
    fn test_read_out_of_bounds() {
        let data = vec![0x01, 0x02];
        let reader = MockMemoryReader::new(data);

        assert!(reader.read_u32(0x1000).is_err());
    }

    #[test]
    fn test_read_through_reference() {
        let reader = MockMemoryReader::new(vec![0x2A, 0, 0, 0]);
        let by_ref = &reader;

        assert_eq!(by_ref.read_i32(0x1000).unwrap(), 42);
    }
}
