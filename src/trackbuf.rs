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

    src/trackbuf.rs

    The append-only cell buffer that track encoders drive.
*/

//! Synthesized track output: an append-only cell buffer with a per-cell
//! speed value.
//!
//! Encoders emit data bits under a [CellEncoding]; the buffer performs the
//! clock fill, tracking the last emitted cell so the fill stays correct
//! across raw sync words and encoding changes. Speed is a parts-per-100000
//! scale ([SPEED_AVG] = nominal 2 us cells) carried per cell so protection
//! tracks can stretch or shrink whole sectors.

use bit_vec::BitVec;

use crate::mfm::CellEncoding;

/// Nominal cell speed, 100% in parts-per-100000.
pub const SPEED_AVG: u32 = 100_000;

pub struct TrackBuffer {
    cells: BitVec,
    speeds: Vec<u32>,
    last_cell: bool,
    auto_sector_split: bool,
}

impl Default for TrackBuffer {
    fn default() -> TrackBuffer {
        TrackBuffer::new()
    }
}

impl TrackBuffer {
    pub fn new() -> TrackBuffer {
        TrackBuffer {
            cells: BitVec::new(),
            speeds: Vec::new(),
            last_cell: false,
            auto_sector_split: true,
        }
    }

    fn push_cell(&mut self, speed: u32, bit: bool) {
        self.cells.push(bit);
        self.speeds.push(speed);
        self.last_cell = bit;
    }

    fn push_data_bit(&mut self, speed: u32, bit: bool) {
        let clock = !self.last_cell && !bit;
        self.push_cell(speed, clock);
        self.push_cell(speed, bit);
    }

    /// Append `nbits` bits taken from the low bits of `value`, MSB first,
    /// under the given encoding. Raw bits land as cells unchanged; all other
    /// encodings emit two cells per data bit.
    pub fn bits(&mut self, speed: u32, enc: CellEncoding, nbits: usize, value: u32) {
        match enc {
            CellEncoding::Raw => {
                for i in (0..nbits).rev() {
                    self.push_cell(speed, (value >> i) & 1 != 0);
                }
            }
            CellEncoding::Mfm => {
                for i in (0..nbits).rev() {
                    self.push_data_bit(speed, (value >> i) & 1 != 0);
                }
            }
            CellEncoding::MfmOddEven => {
                debug_assert_eq!(nbits % 2, 0);
                for i in (1..nbits).rev().step_by(2) {
                    self.push_data_bit(speed, (value >> i) & 1 != 0);
                }
                for i in (0..nbits - 1).rev().step_by(2) {
                    self.push_data_bit(speed, (value >> i) & 1 != 0);
                }
            }
            CellEncoding::MfmEvenOdd => {
                debug_assert_eq!(nbits % 2, 0);
                for i in (0..nbits - 1).rev().step_by(2) {
                    self.push_data_bit(speed, (value >> i) & 1 != 0);
                }
                for i in (1..nbits).rev().step_by(2) {
                    self.push_data_bit(speed, (value >> i) & 1 != 0);
                }
            }
        }
    }

    /// Append a byte block. For the split encodings the split is block-level:
    /// the odd (or even) halves of every byte are emitted first, in order,
    /// matching the AmigaDOS label and data areas.
    pub fn bytes(&mut self, speed: u32, enc: CellEncoding, dat: &[u8]) {
        match enc {
            CellEncoding::Raw | CellEncoding::Mfm => {
                for &b in dat {
                    self.bits(speed, enc, 8, b as u32);
                }
            }
            CellEncoding::MfmOddEven => {
                for &b in dat {
                    for i in [7, 5, 3, 1] {
                        self.push_data_bit(speed, (b >> i) & 1 != 0);
                    }
                }
                for &b in dat {
                    for i in [6, 4, 2, 0] {
                        self.push_data_bit(speed, (b >> i) & 1 != 0);
                    }
                }
            }
            CellEncoding::MfmEvenOdd => {
                for &b in dat {
                    for i in [6, 4, 2, 0] {
                        self.push_data_bit(speed, (b >> i) & 1 != 0);
                    }
                }
                for &b in dat {
                    for i in [7, 5, 3, 1] {
                        self.push_data_bit(speed, (b >> i) & 1 != 0);
                    }
                }
            }
        }
    }

    /// Append `nbits` zero data bits (2 * nbits cells of clocked filler).
    pub fn gap(&mut self, speed: u32, nbits: usize) {
        for _ in 0..nbits {
            self.push_data_bit(speed, false);
        }
    }

    /// Mark the track as one logical sector even though it contains multiple
    /// sync words.
    pub fn disable_auto_sector_split(&mut self) {
        self.auto_sector_split = false;
    }

    pub fn auto_sector_split(&self) -> bool {
        self.auto_sector_split
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &BitVec {
        &self.cells
    }

    pub fn speeds(&self) -> &[u32] {
        &self.speeds
    }

    /// Pad with gap filler, or truncate, until the buffer holds exactly
    /// `total_bits` cells.
    pub fn pad_to(&mut self, total_bits: usize) {
        while self.cells.len() < total_bits {
            self.push_data_bit(SPEED_AVG, false);
        }
        self.cells.truncate(total_bits);
        self.speeds.truncate(total_bits);
    }

    pub fn into_parts(self) -> (BitVec, Vec<u32>) {
        (self.cells, self.speeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mfm;

    fn cell_bytes(tbuf: &TrackBuffer) -> Vec<u8> {
        tbuf.cells().to_bytes()
    }

    #[test]
    fn test_mfm_bits_match_encode_word() {
        let mut tbuf = TrackBuffer::new();
        tbuf.bits(SPEED_AVG, CellEncoding::Mfm, 16, 0x00B0);
        assert_eq!(
            cell_bytes(&tbuf),
            mfm::encode_word(0x00B0).to_be_bytes().to_vec()
        );
    }

    #[test]
    fn test_raw_bits_pass_through() {
        let mut tbuf = TrackBuffer::new();
        tbuf.bits(SPEED_AVG, CellEncoding::Raw, 16, 0x8912);
        assert_eq!(cell_bytes(&tbuf), vec![0x89, 0x12]);
    }

    #[test]
    fn test_bytes_roundtrip_all_encodings() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x42, 0xA5, 0x5A];
        for enc in [
            CellEncoding::Mfm,
            CellEncoding::MfmOddEven,
            CellEncoding::MfmEvenOdd,
        ] {
            let mut tbuf = TrackBuffer::new();
            tbuf.bytes(SPEED_AVG, enc, &payload);
            let raw = cell_bytes(&tbuf);
            let mut decoded = [0u8; 8];
            mfm::decode_bytes(enc, &raw, &mut decoded);
            assert_eq!(decoded, payload, "{enc:?}");
        }
    }

    #[test]
    fn test_odd_even_bits_equal_block_bytes() {
        let word = 0x1234_ABCDu32;
        let mut a = TrackBuffer::new();
        a.bits(SPEED_AVG, CellEncoding::MfmOddEven, 32, word);
        let mut b = TrackBuffer::new();
        b.bytes(SPEED_AVG, CellEncoding::MfmOddEven, &word.to_be_bytes());
        assert_eq!(cell_bytes(&a), cell_bytes(&b));
    }

    #[test]
    fn test_gap_emits_clocked_filler() {
        let mut tbuf = TrackBuffer::new();
        tbuf.gap(SPEED_AVG, 16);
        assert_eq!(tbuf.len(), 32);
        assert_eq!(cell_bytes(&tbuf), vec![0xAA, 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn test_pad_to_exact_length() {
        let mut tbuf = TrackBuffer::new();
        tbuf.bits(SPEED_AVG, CellEncoding::Raw, 16, 0x4489);
        tbuf.pad_to(101);
        assert_eq!(tbuf.len(), 101);
        assert_eq!(tbuf.speeds().len(), 101);
    }
}
