//! Instruction data deserialization helpers
//!
//! Safe little-endian parsing of instruction payloads. All functions
//! bounds-check and return `InvalidInstruction` on truncated input.

use crate::error::ParasolError;
use pinocchio::pubkey::Pubkey;

/// Read a u8 from instruction data
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, ParasolError> {
    if offset >= data.len() {
        return Err(ParasolError::InvalidInstruction);
    }
    Ok(data[offset])
}

/// Read a u32 (little-endian) from instruction data
#[inline]
pub fn read_u32(data: &[u8], offset: usize) -> Result<u32, ParasolError> {
    if offset + 4 > data.len() {
        return Err(ParasolError::InvalidInstruction);
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    Ok(u32::from_le_bytes(bytes))
}

/// Read a u64 (little-endian) from instruction data
#[inline]
pub fn read_u64(data: &[u8], offset: usize) -> Result<u64, ParasolError> {
    if offset + 8 > data.len() {
        return Err(ParasolError::InvalidInstruction);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    Ok(u64::from_le_bytes(bytes))
}

/// Read a u128 (little-endian) from instruction data
#[inline]
pub fn read_u128(data: &[u8], offset: usize) -> Result<u128, ParasolError> {
    if offset + 16 > data.len() {
        return Err(ParasolError::InvalidInstruction);
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&data[offset..offset + 16]);
    Ok(u128::from_le_bytes(bytes))
}

/// Read a fixed-size byte array from instruction data
#[inline]
pub fn read_bytes<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], ParasolError> {
    if offset + N > data.len() {
        return Err(ParasolError::InvalidInstruction);
    }
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&data[offset..offset + N]);
    Ok(bytes)
}

/// Read a pubkey (32 raw bytes) from instruction data
#[inline]
pub fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, ParasolError> {
    let bytes: [u8; 32] = read_bytes(data, offset)?;
    Ok(Pubkey::from(bytes))
}

/// Instruction data reader with tracked offset
///
/// Sequentially reads fields from an instruction payload while tracking
/// the current offset.
pub struct InstructionReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> InstructionReader<'a> {
    /// Create a new instruction reader
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Get the current offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Get remaining bytes
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Read a u8 and advance offset
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, ParasolError> {
        let val = read_u8(self.data, self.offset)?;
        self.offset += 1;
        Ok(val)
    }

    /// Read a u32 and advance offset
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, ParasolError> {
        let val = read_u32(self.data, self.offset)?;
        self.offset += 4;
        Ok(val)
    }

    /// Read a u64 and advance offset
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, ParasolError> {
        let val = read_u64(self.data, self.offset)?;
        self.offset += 8;
        Ok(val)
    }

    /// Read a u128 and advance offset
    #[inline]
    pub fn read_u128(&mut self) -> Result<u128, ParasolError> {
        let val = read_u128(self.data, self.offset)?;
        self.offset += 16;
        Ok(val)
    }

    /// Read a fixed-size byte array and advance offset
    #[inline]
    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ParasolError> {
        let val = read_bytes(self.data, self.offset)?;
        self.offset += N;
        Ok(val)
    }

    /// Read a pubkey and advance offset
    #[inline]
    pub fn read_pubkey(&mut self) -> Result<Pubkey, ParasolError> {
        let val = read_pubkey(self.data, self.offset)?;
        self.offset += 32;
        Ok(val)
    }
}
