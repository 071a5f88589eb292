//! # Encoding Module
//!
//! This module provides the low-level encoding utilities shared by row
//! bodies and file headers:
//!
//! - **Value packing**: [`ValueConf`] maps bounded scores to 16-bit codes
//! - **Little-endian readers**: fixed-offset scalar reads over row bytes
//!
//! The readers index the buffer directly and panic on out-of-bounds offsets,
//! like slice indexing. Callers validate buffer lengths once, when a row view
//! is constructed, and then read positionally without further checks.

pub mod value;

pub use value::ValueConf;

#[inline]
pub fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[inline]
pub fn read_i32_le(buf: &[u8], offset: usize) -> i32 {
    read_u32_le(buf, offset) as i32
}

#[inline]
pub fn read_i16_le(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}
