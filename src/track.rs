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

    src/track.rs

    Decoded per-track state.
*/

use bit_vec::BitVec;

use crate::format::TrackFormat;

/// Cell count of a standard double-density track. Formats that carry a
/// bit-length protection override this after decode.
pub const DEFAULT_TOTAL_BITS: u32 = 100_150;

/// One valid/invalid flag per sector of a track.
pub struct SectorBitmap {
    bits: BitVec,
}

impl SectorBitmap {
    pub fn new(nr_sectors: usize) -> SectorBitmap {
        SectorBitmap {
            bits: BitVec::from_elem(nr_sectors, false),
        }
    }

    pub fn set(&mut self, sec: usize) {
        self.bits.set(sec, true);
    }

    pub fn is_set(&self, sec: usize) -> bool {
        self.bits.get(sec).unwrap_or(false)
    }

    pub fn set_all(&mut self) {
        for i in 0..self.bits.len() {
            self.bits.set(i, true);
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| *b).count()
    }

    pub fn all_set(&self) -> bool {
        self.bits.iter().all(|b| b)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// The decoded record for one side of one cylinder: the logical payload plus
/// the physical metadata needed to re-encode the track bit-exact.
pub struct TrackInfo {
    pub format: TrackFormat,
    pub bytes_per_sector: usize,
    pub nr_sectors: usize,
    /// Decoded payload. Its meaning is format-specific; CopyLock tracks, for
    /// instance, reduce to a four byte LFSR seed.
    pub data: Vec<u8>,
    pub valid_sectors: SectorBitmap,
    /// Cell position of the first sector's sync within the track.
    pub data_bitoff: i32,
    /// Exact cell count the physical track must occupy when re-encoded.
    pub total_bits: u32,
}

impl TrackInfo {
    pub fn new(format: TrackFormat) -> TrackInfo {
        let handler = format.handler();
        TrackInfo {
            format,
            bytes_per_sector: handler.bytes_per_sector,
            nr_sectors: handler.nr_sectors,
            data: Vec::new(),
            valid_sectors: SectorBitmap::new(handler.nr_sectors),
            data_bitoff: 0,
            total_bits: DEFAULT_TOTAL_BITS,
        }
    }

    /// Re-seat this record on a different format, as when a boot-track
    /// handler delegates to the stock AmigaDOS decoder.
    pub(crate) fn reinit(&mut self, format: TrackFormat) {
        *self = TrackInfo::new(format);
    }

    /// A track is valid when every sector of it is.
    pub fn is_valid(&self) -> bool {
        self.valid_sectors.all_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_counts() {
        let mut map = SectorBitmap::new(11);
        assert_eq!(map.count(), 0);
        assert!(!map.all_set());
        map.set(3);
        map.set(3);
        map.set(7);
        assert_eq!(map.count(), 2);
        assert!(map.is_set(3));
        assert!(!map.is_set(4));
        map.set_all();
        assert_eq!(map.count(), 11);
        assert!(map.all_set());
    }

    #[test]
    fn test_track_info_geometry_follows_handler() {
        let ti = TrackInfo::new(TrackFormat::Copylock);
        assert_eq!(ti.nr_sectors, 11);
        assert_eq!(ti.bytes_per_sector, 512);
        assert_eq!(ti.total_bits, DEFAULT_TOTAL_BITS);
        assert!(!ti.is_valid());
    }
}
