// src/endian.rs
//! Endian-normalized scalar reads/writes (C1). All multi-byte fields in a finalized buffer
//! are little-endian on the wire; these helpers byte-swap transparently on big-endian hosts
//! so the rest of the crate never has to think about host byte order.

use byteorder::{ByteOrder, LittleEndian};

pub fn read_u16(bytes: &[u8]) -> u16 {
    LittleEndian::read_u16(bytes)
}

pub fn write_u16(bytes: &mut [u8], value: u16) {
    LittleEndian::write_u16(bytes, value);
}

pub fn read_u32(bytes: &[u8]) -> u32 {
    LittleEndian::read_u32(bytes)
}

pub fn write_u32(bytes: &mut [u8], value: u32) {
    LittleEndian::write_u32(bytes, value);
}

pub fn read_u64(bytes: &[u8]) -> u64 {
    LittleEndian::read_u64(bytes)
}

pub fn write_u64(bytes: &mut [u8], value: u64) {
    LittleEndian::write_u64(bytes, value);
}

pub fn read_i16(bytes: &[u8]) -> i16 {
    LittleEndian::read_i16(bytes)
}

pub fn write_i16(bytes: &mut [u8], value: i16) {
    LittleEndian::write_i16(bytes, value);
}

pub fn read_i32(bytes: &[u8]) -> i32 {
    LittleEndian::read_i32(bytes)
}

pub fn write_i32(bytes: &mut [u8], value: i32) {
    LittleEndian::write_i32(bytes, value);
}

pub fn read_i64(bytes: &[u8]) -> i64 {
    LittleEndian::read_i64(bytes)
}

pub fn write_i64(bytes: &mut [u8], value: i64) {
    LittleEndian::write_i64(bytes, value);
}

pub fn read_f32(bytes: &[u8]) -> f32 {
    LittleEndian::read_f32(bytes)
}

pub fn write_f32(bytes: &mut [u8], value: f32) {
    LittleEndian::write_f32(bytes, value);
}

pub fn read_f64(bytes: &[u8]) -> f64 {
    LittleEndian::read_f64(bytes)
}

pub fn write_f64(bytes: &mut [u8], value: f64) {
    LittleEndian::write_f64(bytes, value);
}
