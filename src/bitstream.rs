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

    src/bitstream.rs

    The rewindable cell stream that track decoders consume.
*/

//! A captured track presented as a single-consumer, rewindable sequence of
//! bit cells.
//!
//! Decoders scan by pulling one cell at a time and watching `word`, a 32-cell
//! sliding shift register, for sync patterns. The stream also keeps two
//! bookkeeping values handlers rely on: the cell index since the physical
//! index mark, and a resettable nanosecond `latency` integrator used to
//! validate non-uniform protection timings.

use bit_vec::BitVec;

use crate::trackbuf::{TrackBuffer, SPEED_AVG};

/// Nominal double-density cell time in nanoseconds.
pub const CELL_NS: u32 = 2000;

pub struct BitStream {
    cells: BitVec,
    speeds: Vec<u32>,
    pos: usize,
    word: u32,
    latency: u32,
}

impl BitStream {
    /// Wrap a cell vector captured at uniform nominal speed.
    pub fn new(cells: BitVec) -> BitStream {
        let len = cells.len();
        BitStream::with_speeds(cells, vec![SPEED_AVG; len])
    }

    pub fn from_bytes(bytes: &[u8]) -> BitStream {
        BitStream::new(BitVec::from_bytes(bytes))
    }

    /// Wrap a cell vector with a per-cell speed value (100000 = nominal).
    pub fn with_speeds(cells: BitVec, speeds: Vec<u32>) -> BitStream {
        assert_eq!(cells.len(), speeds.len());
        BitStream {
            cells,
            speeds,
            pos: 0,
            word: 0,
            latency: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Advance one cell, or `None` at end of stream.
    pub fn next_bit(&mut self) -> Option<bool> {
        let bit = self.cells.get(self.pos)?;
        self.latency += CELL_NS * self.speeds[self.pos] / SPEED_AVG;
        self.word = (self.word << 1) | bit as u32;
        self.pos += 1;
        Some(bit)
    }

    /// Advance `n` cells; afterwards the low `n` bits of `word` are the last
    /// `n` cells read.
    pub fn next_bits(&mut self, n: usize) -> Option<u32> {
        for _ in 0..n {
            self.next_bit()?;
        }
        Some(self.word)
    }

    /// Fill `buf` with raw cell bytes, eight cells per byte, MSB first.
    pub fn next_bytes(&mut self, buf: &mut [u8]) -> Option<()> {
        for b in buf.iter_mut() {
            let mut v = 0u8;
            for _ in 0..8 {
                v = (v << 1) | self.next_bit()? as u8;
            }
            *b = v;
        }
        Some(())
    }

    /// Rewind to the start of the capture, clearing `word` and `latency`.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.word = 0;
        self.latency = 0;
    }

    /// Sliding window of the most recent 32 cells.
    pub fn word(&self) -> u32 {
        self.word
    }

    /// Cell index of the most recently read cell, relative to the index mark.
    pub fn index_offset(&self) -> u32 {
        self.pos.saturating_sub(1) as u32
    }

    /// Same as [BitStream::index_offset], in bitcell units. Identical for an
    /// in-memory capture, kept distinct to match the reader contract.
    pub fn index_offset_bc(&self) -> u32 {
        self.index_offset()
    }

    /// Nanoseconds accumulated since the last [BitStream::reset_latency],
    /// scaled by each cell's speed value.
    pub fn latency(&self) -> u32 {
        self.latency
    }

    pub fn reset_latency(&mut self) {
        self.latency = 0;
    }
}

impl From<TrackBuffer> for BitStream {
    fn from(tbuf: TrackBuffer) -> BitStream {
        let (cells, speeds) = tbuf.into_parts();
        BitStream::with_speeds(cells, speeds)
    }
}
