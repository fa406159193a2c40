//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Byte-exact wire encoding primitives: little-endian integers, CompactSize lengths and script
//! push operations.

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;

/// Types with a canonical wire serialization.
pub trait Encode {
    fn encode(&self, buf: &mut Vec<u8>);
}

/// A trait mostly for convenience, as we often end up serializing to a fresh vector. Encoding into
/// a vector cannot fail.
pub trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

impl<T: Encode + ?Sized> ToBytes for T {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.encode(&mut bytes);
        bytes
    }
}

pub fn write_u32(buf: &mut Vec<u8>, n: u32) {
    buf.extend_from_slice(&n.to_le_bytes());
}

pub fn write_u64(buf: &mut Vec<u8>, n: u64) {
    buf.extend_from_slice(&n.to_le_bytes());
}

/// Write a CompactSize unsigned integer: 1, 3, 5 or 9 bytes depending on magnitude.
pub fn write_compact_size(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Write a length-prefixed byte string.
pub fn write_var_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Append the smallest push operation placing `data` on the stack.
pub fn push_data(buf: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    match len {
        0 => buf.push(OP_0),
        1..=0x4b => buf.push(len as u8),
        0x4c..=0xff => {
            buf.push(OP_PUSHDATA1);
            buf.push(len as u8);
        }
        0x100..=0xffff => {
            buf.push(OP_PUSHDATA2);
            buf.extend_from_slice(&(len as u16).to_le_bytes());
        }
        _ => {
            buf.push(OP_PUSHDATA4);
            buf.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    buf.extend_from_slice(data);
}

/// Append the smallest push operation placing the script number `n` on the stack.
pub fn push_int(buf: &mut Vec<u8>, n: i64) {
    match n {
        0 => buf.push(OP_0),
        -1 => buf.push(OP_1NEGATE),
        1..=16 => buf.push(OP_1 + (n as u8) - 1),
        _ => push_data(buf, &script_number(n)),
    }
}

/// Minimally-encoded script number: little-endian magnitude with the sign carried by the most
/// significant bit of the last byte.
pub fn script_number(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let negative = n < 0;
    let mut magnitude = n.unsigned_abs();
    let mut bytes = Vec::new();
    while magnitude > 0 {
        bytes.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }

    match bytes.last_mut() {
        Some(last) if *last & 0x80 != 0 => bytes.push(if negative { 0x80 } else { 0x00 }),
        Some(last) if negative => *last |= 0x80,
        _ => (),
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact_size(n: u64) -> String {
        let mut buf = Vec::new();
        write_compact_size(&mut buf, n);
        hex::encode(buf)
    }

    #[test]
    fn compact_size_boundaries() {
        assert_eq!(compact_size(0), "00");
        assert_eq!(compact_size(0xfc), "fc");
        assert_eq!(compact_size(0xfd), "fdfd00");
        assert_eq!(compact_size(0xffff), "fdffff");
        assert_eq!(compact_size(0x1_0000), "fe00000100");
        assert_eq!(compact_size(0x1_0000_0000), "ff0000000001000000");
    }

    #[test]
    fn push_small_integers_use_dedicated_opcodes() {
        let mut buf = Vec::new();
        push_int(&mut buf, 0);
        push_int(&mut buf, -1);
        push_int(&mut buf, 1);
        push_int(&mut buf, 16);
        assert_eq!(hex::encode(buf), "004f5160");
    }

    #[test]
    fn push_larger_integers_as_script_numbers() {
        let mut buf = Vec::new();
        push_int(&mut buf, 17);
        push_int(&mut buf, 128);
        push_int(&mut buf, -128);
        push_int(&mut buf, 100_000);
        assert_eq!(hex::encode(buf), "011102800002808003a08601");
    }

    #[test]
    fn push_data_prefixes() {
        let mut buf = Vec::new();
        push_data(&mut buf, &[0xaa; 75]);
        assert_eq!(buf[0], 75);

        let mut buf = Vec::new();
        push_data(&mut buf, &[0xaa; 76]);
        assert_eq!(&buf[..2], &[OP_PUSHDATA1, 76]);

        let mut buf = Vec::new();
        push_data(&mut buf, &[0xaa; 256]);
        assert_eq!(&buf[..3], &[OP_PUSHDATA2, 0x00, 0x01]);
    }
}
