//! Variable-length integer codec for instruction streams.
//!
//! Unsigned values below 128 take one byte. Larger values are emitted as
//! big-endian 7-bit groups with the continuation bit set on every byte but
//! the last: `0 → 00`, `127 → 7F`, `128 → 81 00`, `16384 → 81 80 00`.
//! Signed values are zig-zag mapped first (`v ≥ 0 → v << 1`,
//! `v < 0 → (!v << 1) | 1`) so small magnitudes stay short.

/// Append the unsigned varint encoding of `value` to `out`.
pub fn write_uvar(out: &mut Vec<u8>, value: u64) {
    if value < 128 {
        out.push(value as u8);
        return;
    }

    // Split into 7-bit groups, least significant first; every group except
    // the first stored (which ends up emitted last) gets the continuation
    // bit; then emit in reverse.
    let mut scratch = [0u8; 10];
    let mut count = 0;
    let mut v = value;
    loop {
        let mut group = (v & 0x7F) as u8;
        if count != 0 {
            group |= 0x80;
        }
        scratch[count] = group;
        count += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }

    for index in (0..count).rev() {
        out.push(scratch[index]);
    }
}

/// Append the zig-zag signed varint encoding of `value` to `out`.
pub fn write_svar(out: &mut Vec<u8>, value: i64) {
    let unsigned = if value < 0 {
        (!(value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    write_uvar(out, unsigned);
}

/// Decode one unsigned varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// input ends inside a varint.
pub fn read_uvar(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (index, &byte) in bytes.iter().enumerate() {
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Some((value, index + 1));
        }
    }
    None
}

/// Decode one zig-zag signed varint from the front of `bytes`.
pub fn read_svar(bytes: &[u8]) -> Option<(i64, usize)> {
    let (unsigned, used) = read_uvar(bytes)?;
    let value = if unsigned & 1 == 1 {
        !((unsigned >> 1) as i64)
    } else {
        (unsigned >> 1) as i64
    };
    Some((value, used))
}
