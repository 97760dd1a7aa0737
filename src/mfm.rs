/*
    amiflux
    https://github.com/amiflux/amiflux

    Copyright 2025 The amiflux contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/mfm.rs

    Bitcell-level MFM conversions shared by all track handlers.
*/

//! MFM decoding and encoding at the bitcell level.
//!
//! An MFM data bit occupies two cells: a clock cell followed by a data cell.
//! The clock cell is set only when both neighboring data bits are zero.
//! Handlers move between cells and bytes in one of four layouts:
//!
//! * [CellEncoding::Raw] - cells pass through untouched. Used for sync words
//!   and deliberately clock-violating header marks.
//! * [CellEncoding::Mfm] - in-place encoding; `N` decoded bytes occupy `2N`
//!   cell bytes with no reordering.
//! * [CellEncoding::MfmOddEven] - the odd data bits of the whole block come
//!   first, then the even data bits. Decoded byte `i` interleaves bit `i` of
//!   the odd half (bit positions 7,5,3,1) with bit `i` of the even half
//!   (positions 6,4,2,0).
//! * [CellEncoding::MfmEvenOdd] - the mirror ordering, even bits first, as
//!   used by the AmigaDOS trackdisk schema.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellEncoding {
    Raw,
    Mfm,
    MfmEvenOdd,
    MfmOddEven,
}

/// Encode a 16-bit data word into its 32-cell MFM pattern.
///
/// The clock-fill rule assumes the data bit preceding the word is zero, so
/// the result is exact when the word follows a gap or another zero byte.
pub fn encode_word(w: u16) -> u32 {
    let mut out = 0u32;
    let mut prev = false;
    for i in (0..16).rev() {
        let data = (w >> i) & 1 != 0;
        let clock = !prev && !data;
        out = (out << 2) | ((clock as u32) << 1) | data as u32;
        prev = data;
    }
    out
}

/// Decode a cell window held in a shift register. For [CellEncoding::Mfm] a
/// 32-cell window yields 16 data bits; narrower windows decode in the low
/// bits. The split encodings treat the window as one 16-bit value, halves in
/// transmission order.
pub fn decode_bits(enc: CellEncoding, x: u32) -> u32 {
    match enc {
        CellEncoding::Raw => x,
        CellEncoding::Mfm => {
            let mut out = 0u32;
            for i in 0..16 {
                out |= ((x >> (2 * i)) & 1) << i;
            }
            out
        }
        CellEncoding::MfmEvenOdd | CellEncoding::MfmOddEven => {
            let first = decode_bits(CellEncoding::Mfm, x >> 16);
            let second = decode_bits(CellEncoding::Mfm, x & 0xFFFF);
            let (odd, even) = match enc {
                CellEncoding::MfmOddEven => (first, second),
                _ => (second, first),
            };
            let mut out = 0u32;
            for i in 0..8 {
                out |= ((odd >> i) & 1) << (2 * i + 1);
                out |= ((even >> i) & 1) << (2 * i);
            }
            out
        }
    }
}

/// Decode `2 * dst.len()` raw cell bytes from `src` into `dst`.
///
/// For the split encodings the split is block-level: the first half of `src`
/// carries one 4-bit half of every output byte, in order.
pub fn decode_bytes(enc: CellEncoding, src: &[u8], dst: &mut [u8]) {
    match enc {
        CellEncoding::Raw => {
            dst.copy_from_slice(&src[..dst.len()]);
        }
        CellEncoding::Mfm => {
            debug_assert!(src.len() >= dst.len() * 2);
            for (i, b) in dst.iter_mut().enumerate() {
                *b = (data_nibble(src[2 * i]) << 4) | data_nibble(src[2 * i + 1]);
            }
        }
        CellEncoding::MfmEvenOdd | CellEncoding::MfmOddEven => {
            let n = dst.len();
            debug_assert!(src.len() >= n * 2);
            for (i, b) in dst.iter_mut().enumerate() {
                let first = data_nibble(src[i]);
                let second = data_nibble(src[n + i]);
                let (odd, even) = match enc {
                    CellEncoding::MfmOddEven => (first, second),
                    _ => (second, first),
                };
                *b = interleave(odd, even);
            }
        }
    }
}

/// Extract the four data bits of one raw cell byte. The MSB of a clocked
/// cell byte is always a clock cell, leaving data at bits 6, 4, 2 and 0.
fn data_nibble(b: u8) -> u8 {
    ((b >> 3) & 0x8) | ((b >> 2) & 0x4) | ((b >> 1) & 0x2) | (b & 0x1)
}

fn interleave(odd: u8, even: u8) -> u8 {
    (spread_nibble(odd) << 1) | spread_nibble(even)
}

/// Spread nibble bits 3..0 to byte bits 6, 4, 2, 0.
fn spread_nibble(x: u8) -> u8 {
    ((x & 0x8) << 3) | ((x & 0x4) << 2) | ((x & 0x2) << 1) | (x & 0x1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_word_clock_fill() {
        // A zero word after a zero bit is all clock cells.
        assert_eq!(encode_word(0x0000), 0xAAAA_AAAA);
        // A one bit suppresses both surrounding clocks.
        assert_eq!(encode_word(0x00B0), 0xAAAA_452A);
        assert_eq!(encode_word(0x00A0), 0xAAAA_44AA);
        assert_eq!(encode_word(0xFFFF), 0x5555_5555);
    }

    #[test]
    fn test_decode_bits_inverts_encode_word() {
        for w in [0x0000u16, 0x00A5, 0x1234, 0xA0A0, 0xFFFF, 0x8001] {
            assert_eq!(decode_bits(CellEncoding::Mfm, encode_word(w)), w as u32);
        }
    }

    #[test]
    fn test_decode_bits_ignores_clock_cells() {
        // Forcing a clock cell (the old CopyLock bit-13 trick) must not
        // change the decoded value.
        let poked = encode_word(0x00B3) | (1 << 13);
        assert_eq!(decode_bits(CellEncoding::Mfm, poked), 0x00B3);
    }

    #[test]
    fn test_decode_bytes_mfm() {
        let src = [0x44, 0xAA, 0xAA, 0xAA];
        let mut dst = [0u8; 2];
        decode_bytes(CellEncoding::Mfm, &src, &mut dst);
        assert_eq!(dst, [0xA0, 0x00]);
    }

    #[test]
    fn test_split_halves_interleave() {
        // Odd half 0b1111 nibbles, even half zero: every odd bit set.
        let src = [0x55, 0x00];
        let mut dst = [0u8; 1];
        decode_bytes(CellEncoding::MfmOddEven, &src, &mut dst);
        assert_eq!(dst, [0xAA]);
        decode_bytes(CellEncoding::MfmEvenOdd, &src, &mut dst);
        assert_eq!(dst, [0x55]);
    }
}
