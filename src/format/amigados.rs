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
*/

//! The stock AmigaDOS trackdisk format: eleven back-to-back sectors of 512
//! bytes, each led by a `0x4489 0x4489` sync, an even/odd-split info
//! longword, a 16-byte label and two checksums. Many custom boot tracks are
//! plain AmigaDOS with meaning hidden in the sector data, so other handlers
//! delegate here.

use crate::{
    bitstream::BitStream,
    disk::Disk,
    mfm::{self, CellEncoding},
    track::TrackInfo,
    trackbuf::{TrackBuffer, SPEED_AVG},
    TrackError,
};

const SYNC: u32 = 0x4489_4489;
const SECTOR_BYTES: usize = 512;
/// Decoded byte-times per sector including the header areas.
const SECTOR_PITCH_BYTES: usize = 544;

/// XOR of the big-endian longwords of a decoded region, folded to the data
/// bit positions.
fn checksum(dat: &[u8]) -> u32 {
    let mut csum = 0u32;
    for chunk in dat.chunks_exact(4) {
        csum ^= u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    (csum ^ (csum >> 1)) & 0x5555_5555
}

pub(super) fn decode(
    _disk: &mut Disk,
    tracknr: usize,
    ti: &mut TrackInfo,
    s: &mut BitStream,
) -> Result<Vec<u8>, TrackError> {
    let mut block = vec![0u8; ti.bytes_per_sector * ti.nr_sectors];
    let mut least_sec = ti.nr_sectors;

    loop {
        if ti.valid_sectors.count() == ti.nr_sectors {
            break;
        }
        if s.next_bit().is_none() {
            break;
        }
        if s.word() != SYNC {
            continue;
        }
        let idx_off = s.index_offset_bc() as i32 - 31;

        let mut raw8 = [0u8; 8];
        let mut raw32 = [0u8; 32];
        let mut raw_dat = [0u8; 2 * SECTOR_BYTES];

        let mut info = [0u8; 4];
        if s.next_bytes(&mut raw8).is_none() {
            break;
        }
        mfm::decode_bytes(CellEncoding::MfmEvenOdd, &raw8, &mut info);

        let mut label = [0u8; 16];
        if s.next_bytes(&mut raw32).is_none() {
            break;
        }
        mfm::decode_bytes(CellEncoding::MfmEvenOdd, &raw32, &mut label);

        let mut hsum = [0u8; 4];
        if s.next_bytes(&mut raw8).is_none() {
            break;
        }
        mfm::decode_bytes(CellEncoding::MfmEvenOdd, &raw8, &mut hsum);

        let mut dsum = [0u8; 4];
        if s.next_bytes(&mut raw8).is_none() {
            break;
        }
        mfm::decode_bytes(CellEncoding::MfmEvenOdd, &raw8, &mut dsum);

        let mut dat = [0u8; SECTOR_BYTES];
        if s.next_bytes(&mut raw_dat).is_none() {
            break;
        }
        mfm::decode_bytes(CellEncoding::MfmEvenOdd, &raw_dat, &mut dat);

        let sec = info[2] as usize;
        if info[0] != 0xFF || info[1] as usize != tracknr || sec >= ti.nr_sectors {
            log::trace!("T{}: amigados header {:02X?} rejected", tracknr, info);
            continue;
        }
        if ti.valid_sectors.is_set(sec) {
            continue;
        }

        let mut hdr = [0u8; 20];
        hdr[..4].copy_from_slice(&info);
        hdr[4..].copy_from_slice(&label);
        if checksum(&hdr) != u32::from_be_bytes(hsum) {
            log::debug!("T{}: amigados sector {} header checksum bad", tracknr, sec);
            continue;
        }
        if checksum(&dat) != u32::from_be_bytes(dsum) {
            log::debug!("T{}: amigados sector {} data checksum bad", tracknr, sec);
            continue;
        }

        block[sec * SECTOR_BYTES..(sec + 1) * SECTOR_BYTES].copy_from_slice(&dat);
        ti.valid_sectors.set(sec);
        if least_sec > sec {
            ti.data_bitoff = idx_off;
            least_sec = sec;
        }
    }

    if ti.valid_sectors.count() == 0 {
        return Err(TrackError::NoMatch);
    }

    // Project back from the earliest recovered sector to sector 0, then
    // across the two zero bytes leading the sync.
    ti.data_bitoff -= (least_sec * SECTOR_PITCH_BYTES * 8 * 2) as i32;
    ti.data_bitoff -= 2 * 8 * 2;

    Ok(block)
}

pub(super) fn encode(
    tracknr: usize,
    ti: &TrackInfo,
    tbuf: &mut TrackBuffer,
) -> Result<(), TrackError> {
    if ti.data.len() != ti.bytes_per_sector * ti.nr_sectors {
        return Err(TrackError::CorruptSector);
    }

    for sec in 0..ti.nr_sectors {
        tbuf.bits(SPEED_AVG, CellEncoding::Mfm, 16, 0);
        tbuf.bits(SPEED_AVG, CellEncoding::Raw, 32, SYNC);

        let info = [0xFF, tracknr as u8, sec as u8, (ti.nr_sectors - sec) as u8];
        tbuf.bytes(SPEED_AVG, CellEncoding::MfmEvenOdd, &info);

        let label = [0u8; 16];
        tbuf.bytes(SPEED_AVG, CellEncoding::MfmEvenOdd, &label);

        let mut hdr = [0u8; 20];
        hdr[..4].copy_from_slice(&info);
        hdr[4..].copy_from_slice(&label);
        tbuf.bytes(
            SPEED_AVG,
            CellEncoding::MfmEvenOdd,
            &checksum(&hdr).to_be_bytes(),
        );

        let dat = &ti.data[sec * SECTOR_BYTES..(sec + 1) * SECTOR_BYTES];
        tbuf.bytes(
            SPEED_AVG,
            CellEncoding::MfmEvenOdd,
            &checksum(dat).to_be_bytes(),
        );
        tbuf.bytes(SPEED_AVG, CellEncoding::MfmEvenOdd, dat);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_masks_to_data_bits() {
        assert_eq!(checksum(&[0; 8]), 0);
        let sum = checksum(&0xFFFF_FFFFu32.to_be_bytes());
        assert_eq!(sum & !0x5555_5555, 0);
        // One set bit lands either directly or via the fold.
        assert_eq!(checksum(&0x0000_0001u32.to_be_bytes()), 0x0000_0001);
        assert_eq!(checksum(&0x0000_0002u32.to_be_bytes()), 0x0000_0001);
    }
}
