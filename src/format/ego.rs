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

//! The single-sector format shared by Behind the Iron Gate, Za Zelazna
//! Brama, ABC Chemii and Inferior.
//!
//! A track is one sync word, `len/4` odd/even-split data longwords and a
//! trailing checksum longword, where the checksum folds `ror1(sum ^ word)`
//! over the big-endian data.
//!
//! Beyond the payload, most variants are protected by exact per-track bit
//! lengths. Za Zelazna Brama carries the expected lengths in sector data on
//! its boot track, published to the rest of the disk as a tag by
//! [decode_boot]; the ABC Chemii and Inferior releases check against the
//! fixed tables at the bottom of this file.

use crate::{
    bitstream::BitStream,
    disk::{Disk, DiskTag},
    mfm::{self, CellEncoding},
    track::TrackInfo,
    trackbuf::{TrackBuffer, SPEED_AVG},
    TrackError,
};

use super::{amigados, FormatParams, TrackFormat};

/// One fold of the track checksum: `EOR.L` then `ROR.L #1`.
fn checksum_step(w: u32, sum: u32) -> u32 {
    (sum ^ w).rotate_right(1)
}

pub(super) fn decode(
    disk: &mut Disk,
    tracknr: usize,
    ti: &mut TrackInfo,
    s: &mut BitStream,
) -> Result<Vec<u8>, TrackError> {
    let FormatParams::EgoSync(sync) = ti.format.handler().params else {
        return Err(TrackError::NoMatch);
    };
    let len = ti.bytes_per_sector * ti.nr_sectors;

    while s.next_bit().is_some() {
        if s.word() as u16 != sync {
            continue;
        }
        ti.data_bitoff = s.index_offset_bc() as i32 - 15;

        let mut dat = vec![0u8; len];
        let mut raw = [0u8; 8];
        let mut word = [0u8; 4];
        let mut sum: u32 = 0;

        for chunk in dat.chunks_exact_mut(4) {
            if s.next_bytes(&mut raw).is_none() {
                return Err(TrackError::StreamEnd);
            }
            mfm::decode_bytes(CellEncoding::MfmOddEven, &raw, &mut word);
            chunk.copy_from_slice(&word);
            sum = checksum_step(u32::from_be_bytes(word), sum);
        }

        if s.next_bytes(&mut raw).is_none() {
            return Err(TrackError::StreamEnd);
        }
        mfm::decode_bytes(CellEncoding::MfmOddEven, &raw, &mut word);
        if sum != u32::from_be_bytes(word) {
            log::debug!("T{}: checksum mismatch, resuming scan", tracknr);
            continue;
        }

        // The protected variants pin the exact bit length of each track.
        match ti.format {
            TrackFormat::ZaZelaznaBrama => {
                // The expected lengths live on track 0.0 of disk 2; without
                // that boot tag the default length stands.
                if let Some(protection) = disk.za_zelazna_brama_protection() {
                    if let Some(&p) = protection.get(tracknr) {
                        ti.total_bits = (100_900 + (p as i32 - 0x720) + 46) as u32;
                    }
                }
            }
            TrackFormat::AbcChemiiA | TrackFormat::AbcChemiiB => {
                if let Some(&p) = ABC_CHEM_PROTECTION.get(tracknr) {
                    ti.total_bits = (100_900 + (p as i32 - 0xA15)) as u32;
                }
                // data_bitoff must be forced to 100900 or the protection
                // checks randomly fail.
                ti.data_bitoff = 100_900;
            }
            TrackFormat::AbcChemiiTimsoftA | TrackFormat::AbcChemiiTimsoftB => {
                if let Some(&p) = ABC_CHEM_TIMSOFT_PROTECTION.get(tracknr) {
                    ti.total_bits = (100_900 + (p as i32 - 0xA15)) as u32;
                }
                ti.data_bitoff = 100_900;
            }
            TrackFormat::Inferior => {
                if let Some(&p) = INFERIOR_PROTECTION.get(tracknr) {
                    ti.total_bits = (100_900 + (p as i32 - 0xA15)) as u32;
                }
                ti.data_bitoff = 100_900;
            }
            _ => {}
        }

        ti.valid_sectors.set_all();
        return Ok(dat);
    }

    Err(TrackError::NoMatch)
}

pub(super) fn encode(
    _tracknr: usize,
    ti: &TrackInfo,
    tbuf: &mut TrackBuffer,
) -> Result<(), TrackError> {
    let FormatParams::EgoSync(sync) = ti.format.handler().params else {
        return Err(TrackError::NoMatch);
    };

    tbuf.bits(SPEED_AVG, CellEncoding::Raw, 16, sync as u32);

    let mut sum: u32 = 0;
    for chunk in ti.data.chunks_exact(4) {
        let w = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        tbuf.bits(SPEED_AVG, CellEncoding::MfmOddEven, 32, w);
        sum = checksum_step(w, sum);
    }
    tbuf.bits(SPEED_AVG, CellEncoding::MfmOddEven, 32, sum);

    Ok(())
}

/// The Za Zelazna Brama boot track is stock AmigaDOS; what makes it special
/// is that its sector data carries the bit-length table for the whole of
/// disk 2. Decode it with the AmigaDOS handler, then lift 152 big-endian
/// words from bytes 4..308 and publish them as the protection tag.
pub(super) fn decode_boot(
    disk: &mut Disk,
    tracknr: usize,
    ti: &mut TrackInfo,
    s: &mut BitStream,
) -> Result<Vec<u8>, TrackError> {
    ti.reinit(TrackFormat::AmigaDos);
    let dat = amigados::decode(disk, tracknr, ti, s)?;
    s.reset();

    let mut protection = Vec::with_capacity(152);
    for pair in dat[4..308].chunks_exact(2) {
        protection.push(u16::from_be_bytes([pair[0], pair[1]]));
    }
    disk.set_tag(DiskTag::ZaZelaznaBramaProtection(protection));

    Ok(dat)
}

// TODO: read the ABC Chemii offsets out of the sector data on track 67.0
// instead of baking them in; the EADF release uses a different table and is
// not covered by this one.
static ABC_CHEM_PROTECTION: [u16; 160] = [
    0x2001, 0x7401, 0x0A57, 0x0A58, 0x0A56, 0x0A59, 0x0A58, 0x0A58,
    0x0A57, 0x0A59, 0x0A57, 0x0A58, 0x0A57, 0x0A57, 0x0A58, 0x0A58,
    0x0A57, 0x0A57, 0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A57, 0x0A58,
    0x0A56, 0x0A58, 0x0A57, 0x0A58, 0x0A55, 0x0A58, 0x0A57, 0x0A59,
    0x0A55, 0x0A58, 0x0A56, 0x0A58, 0x0A56, 0x0A58, 0x0A56, 0x0A59,
    0x0A57, 0x0A58, 0x0A58, 0x0A59, 0x0A57, 0x0A58, 0x0A58, 0x0A59,
    0x0A57, 0x0A58, 0x0A57, 0x0A58, 0x0A56, 0x0A57, 0x0A56, 0x0A59,
    0x0A57, 0x0A56, 0x0A57, 0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A58,
    0x0A58, 0x0A58, 0x0A57, 0x0A57, 0x0A59, 0x0A58, 0x0A57, 0x0A58,
    0x0A58, 0x0A58, 0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A55, 0x0A57,
    0x0A57, 0x0A58, 0x0A56, 0x0A57, 0x0A57, 0x0A58, 0x0A57, 0x0A58,
    0x0A57, 0x0A59, 0x0A58, 0x0A58, 0x0A57, 0x0A59, 0x0A57, 0x0A59,
    0x0A56, 0x0A59, 0x0A57, 0x0A59, 0x0A58, 0x0A58, 0x0A58, 0x0A58,
    0x0A58, 0x0A58, 0x0A59, 0x0A58, 0x0A58, 0x0A58, 0x0A59, 0x0A57,
    0x0A58, 0x0A58, 0x0A57, 0x0A58, 0x0A57, 0x0A58, 0x0A59, 0x0A57,
    0x0A55, 0x0A56, 0x0A55, 0x0A56, 0x0A55, 0x0A56, 0x0A55, 0x0A57,
    0x0A55, 0x0A56, 0x0A55, 0x0A55, 0x0A55, 0x0A55, 0x0A56, 0x0A55,
    0x0A56, 0x0A56, 0x0A56, 0x0A56, 0x0A55, 0x0A56, 0x0A55, 0x0A56,
    0x0A54, 0x0A56, 0x0A55, 0x0A56, 0x0A56, 0x0A56, 0x0A56, 0x0A56,
    0x0A55, 0x0A56, 0x0A57, 0x0A56, 0x0A57, 0x0A56, 0x0A57, 0x0A56,
];

static ABC_CHEM_TIMSOFT_PROTECTION: [u16; 160] = [
    0x0200, 0xFFFF, 0x0BB3, 0x0B98, 0x0BC8, 0x0B9A, 0x0BBA, 0x0B9B,
    0x0BC7, 0x0BA8, 0x0BBE, 0x0BA0, 0x0BA8, 0x0BA1, 0x0BB1, 0x0BA6,
    0x0BC1, 0x0B9D, 0x0BBE, 0x0BB3, 0x0BAF, 0x0BA8, 0x0BA1, 0x0B9D,
    0x0BAF, 0x0B95, 0x0BAD, 0x0BA8, 0x0BBF, 0x0BB0, 0x0B9F, 0x0BA7,
    0x0BC0, 0x0B9C, 0x0BB1, 0x0B9A, 0x0BB7, 0x0B98, 0x0BAB, 0x0B9E,
    0x0BB7, 0x0BA6, 0x0BB8, 0x0B9B, 0x0BB3, 0x0BA4, 0x0BA5, 0x0B95,
    0x0BB7, 0x0BA5, 0x0BB2, 0x0BA3, 0x0BA8, 0x0BA0, 0x0B9F, 0x0BA8,
    0x0BAA, 0x0BA8, 0x0BB9, 0x0BA3, 0x0BA6, 0x0B9C, 0x0BA9, 0x0BA7,
    0x0BA3, 0x0B9A, 0x0BBD, 0x0B9D, 0x0BB0, 0x0B97, 0x0BAE, 0x0BA1,
    0x0B9E, 0x0BA5, 0x0BA1, 0x0BA2, 0x0B9C, 0x0B9B, 0x0BA8, 0x0BB4,
    0x0BAF, 0x0B9A, 0x0BA1, 0x0B9A, 0x0BA4, 0x0B9F, 0x0BAF, 0x0BAC,
    0x0BA3, 0x0BA1, 0x0BA4, 0x0BA2, 0x0BAF, 0x0BA6, 0x0BA0, 0x0BAE,
    0x0BB7, 0x0BA7, 0x0BA4, 0x0BAA, 0x0BA1, 0x0B9E, 0x0BAD, 0x0BA1,
    0x0BA7, 0x0BAC, 0x0BB2, 0x0BA7, 0x0BB7, 0x0BA5, 0x0BB3, 0x0BAA,
    0x0BAA, 0x0BA4, 0x0BA3, 0x0B9D, 0x0BB0, 0x0BA7, 0x0BA6, 0x0BA3,
    0x0BB6, 0x0BAB, 0x0BAE, 0x0BA9, 0x0BA0, 0x0BAE, 0x0BA8, 0x0BA1,
    0x0BAD, 0x0BA6, 0x0B87, 0x0B8B, 0x0BA8, 0x0B9B, 0x0BA3, 0x0BAD,
    0x0BBB, 0x0B9C, 0x0BAB, 0x0BA8, 0x0BBC, 0x0B9C, 0x0BA4, 0x0BAA,
    0x0BB0, 0x0B9F, 0x0B9C, 0x0BA0, 0x0BB0, 0x0BA7, 0x0BA3, 0x0B9A,
    0x0BB2, 0x0BAC, 0x0B8D, 0x0BA8, 0x0BB5, 0x0BA2, 0x0BAE, 0x0BA7,
];

static INFERIOR_PROTECTION: [u16; 160] = [
    0x0A32, 0x0A34, 0x0A30, 0x0A31, 0x0A2E, 0x0A36, 0x0A2D, 0x0A33,
    0x0A25, 0x0A34, 0x0A2D, 0x0A33, 0x0A2F, 0x0A32, 0x0A32, 0x0A32,
    0x0A35, 0x0A32, 0x0A31, 0x0A32, 0x0A2F, 0x0A34, 0x0A2D, 0x0A30,
    0x0A2E, 0x0A33, 0x0A2B, 0x0A31, 0x0A2F, 0x0A33, 0x0A2E, 0x0A33,
    0x0A2F, 0x0A33, 0x0A2E, 0x0A32, 0x0A2E, 0x0A31, 0x0A2E, 0x0A32,
    0x0A2D, 0x0A33, 0x0A2E, 0x0A34, 0x0A2D, 0x0A34, 0x0A2D, 0x0A31,
    0x0A2F, 0x0A31, 0x0A2F, 0x0A30, 0x0A2F, 0x0A32, 0x0A30, 0x0A31,
    0x0A2D, 0x0A34, 0x0A30, 0x0A31, 0x0A2E, 0x0A32, 0x0A2B, 0x0A30,
    0x0A2E, 0x0A32, 0x0A2E, 0x0A31, 0x0A30, 0x0A33, 0x0A2D, 0x0A32,
    0x0A2E, 0x0A32, 0x0A2E, 0x0A32, 0x0A2C, 0x0A33, 0x0A2F, 0x0A31,
    0x0A2E, 0x0A34, 0x0A2D, 0x0A33, 0x0A2E, 0x0A32, 0x0A2D, 0x0A31,
    0x0A31, 0x0A31, 0x0A30, 0x0A32, 0x0A2F, 0x0A31, 0x0A31, 0x0A32,
    0x0A2F, 0x0A32, 0x0A34, 0x0A2E, 0x0A30, 0x0A32, 0x0A2E, 0x0A31,
    0x0A2F, 0x0A33, 0x0A2F, 0x0A33, 0x0A30, 0x0A33, 0x0A2D, 0x0A34,
    0x0A2F, 0x0A31, 0x0A2E, 0x0A32, 0x0A31, 0x0A32, 0x0A2F, 0x0A32,
    0x0A30, 0x0A34, 0x0A2D, 0x0A31, 0x0A2E, 0x0A32, 0x0A2E, 0x0A30,
    0x0A2F, 0x0A30, 0x0A30, 0x0A31, 0x0A2D, 0x0A30, 0x0A32, 0x0A31,
    0x0A2D, 0x0A32, 0x0A2E, 0x0A32, 0x0A2B, 0x0A33, 0x0A2C, 0x0A33,
    0x0A2B, 0x0A34, 0x0A2A, 0x0A34, 0x0A2E, 0x0A31, 0x0A2C, 0x0A31,
    0x0A28, 0x0A33, 0x0A2A, 0x0A32, 0x0A26, 0x0A35, 0x0A29, 0x0000,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_fold() {
        // EOR.L then ROR.L #1, starting from zero.
        assert_eq!(checksum_step(0x0000_0001, 0), 0x8000_0000);
        assert_eq!(checksum_step(0x8000_0000, 0), 0x4000_0000);
        let sum = checksum_step(0x2222_2222, checksum_step(0x1111_1111, 0));
        assert_eq!(sum, ((0x1111_1111u32.rotate_right(1)) ^ 0x2222_2222).rotate_right(1));
    }

    #[test]
    fn test_protection_tables_shape() {
        assert_eq!(ABC_CHEM_PROTECTION.len(), 160);
        assert_eq!(ABC_CHEM_TIMSOFT_PROTECTION.len(), 160);
        assert_eq!(INFERIOR_PROTECTION.len(), 160);
        // Spot anchors at both ends of each listing.
        assert_eq!(ABC_CHEM_PROTECTION[0], 0x2001);
        assert_eq!(ABC_CHEM_PROTECTION[159], 0x0A56);
        assert_eq!(ABC_CHEM_TIMSOFT_PROTECTION[1], 0xFFFF);
        assert_eq!(ABC_CHEM_TIMSOFT_PROTECTION[159], 0x0BA7);
        assert_eq!(INFERIOR_PROTECTION[0], 0x0A32);
        assert_eq!(INFERIOR_PROTECTION[159], 0x0000);
    }
}
