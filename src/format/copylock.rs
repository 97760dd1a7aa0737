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

//! The Rob Northen CopyLock protection track.
//!
//! Eleven sectors of 518 decoded bytes each, separated by 44 bytes of zero
//! gap. A sector is a header mark, a per-sector sync, the sector index, 512
//! data bytes and a trailing zero. The data bytes are one continuous 23-bit
//! LFSR byte stream running across all eleven sectors, so the whole track
//! reduces to a single seed and any damaged sector can be regenerated from
//! an undamaged one.
//!
//! Sector 6 opens with the literal signature `Rob Northen Comp`. On the
//! newer variant the LFSR stream pauses under the signature; on the old
//! variant it keeps stepping through those sixteen positions.
//!
//! The physical check is in the timing: the sector behind sync `0x8912` is
//! written 5% fast and the one behind `0x8914` 5% slow, with speed changing
//! at the start of the preceding gap. The short and long sectors balance, so
//! the total track length stays stock.
//!
//! The old variant has no sync table; its header marks are MFM words with a
//! forced clock cell (bit 13), which is what the decoder scans for.

use crate::{
    bitstream::BitStream,
    disk::Disk,
    lfsr::Lfsr,
    mfm::{self, CellEncoding},
    track::TrackInfo,
    trackbuf::{TrackBuffer, SPEED_AVG},
    TrackError,
};

use super::TrackFormat;

const SECTOR_DATA_BYTES: usize = 512;

const SYNC_LIST: [u16; 11] = [
    0x8A91, 0x8A44, 0x8A45, 0x8A51, 0x8912, 0x8911, 0x8914, 0x8915, 0x8944, 0x8945, 0x8951,
];

const SEC6_SIG: [u8; 16] = *b"Rob Northen Comp";

/// Walk an LFSR state from the start of sector `from` to the start of sector
/// `to`, in either direction. Sector 6 contributes 16 fewer steps than its
/// size because the signature pauses the stream; on the old variant those 16
/// steps happen anyway and are accounted against sector 5.
fn lfsr_seek(old: bool, mut x: Lfsr, mut from: usize, to: usize) -> Lfsr {
    while from != to {
        if from > to {
            from -= 1;
        }
        let mut sz = SECTOR_DATA_BYTES;
        if from == 6 {
            sz -= SEC6_SIG.len();
        }
        if old && from == 5 {
            sz += SEC6_SIG.len();
        }
        for _ in 0..sz {
            if from < to {
                x.step();
            } else {
                x.step_back();
            }
        }
        if from < to {
            from += 1;
        }
    }
    x
}

/// Match the cell window against a sector start: one of the eleven syncs
/// (new variant), or the clock-violating `0xB0+sec` header word (old).
fn identify_sector(old: bool, word: u32) -> Option<usize> {
    if !old {
        return SYNC_LIST.iter().position(|&sync| sync == word as u16);
    }
    if word & 0xFF00 != 0x6500 {
        return None;
    }
    let sec = (mfm::decode_bits(CellEncoding::Mfm, word) & 0xF) as usize;
    if word != (mfm::encode_word(0xB0 + sec as u16) | (1 << 13)) {
        return None;
    }
    Some(sec)
}

/// Check a sector body against the LFSR stream. Returns the track seed,
/// recovering it from the sector data when it is not yet known.
fn check_sector(old: bool, seed: u32, sec: usize, dat: &[u8]) -> Result<u32, TrackError> {
    let mut i = 0;
    if sec == 6 {
        if dat[..SEC6_SIG.len()] != SEC6_SIG {
            return Err(TrackError::CorruptSector);
        }
        i = SEC6_SIG.len();
    }

    // Either seek the known seed forward to this sector, or rebuild the
    // sector's start state from three byte windows on it. The window at
    // offsets 0, 8 and 16 is the closed-form inverse of three forward steps.
    let start = if seed != 0 {
        lfsr_seek(old, Lfsr::new(seed), 0, sec)
    } else {
        Lfsr::new(((dat[i] as u32) << 15) | ((dat[i + 8] as u32) << 7) | ((dat[i + 16] as u32) >> 1))
    };

    let mut lfsr = start;
    for &b in &dat[i..] {
        if b != lfsr.byte() {
            return Err(TrackError::CorruptSector);
        }
        lfsr.step();
    }

    if seed != 0 {
        return Ok(seed);
    }
    let recovered = lfsr_seek(old, start, sec, 0).state();
    if recovered == 0 {
        // An all-zero stream passes the byte check but regenerates nothing.
        return Err(TrackError::DegenerateSeed);
    }
    Ok(recovered)
}

pub(super) fn decode(
    disk: &mut Disk,
    tracknr: usize,
    ti: &mut TrackInfo,
    s: &mut BitStream,
) -> Result<Vec<u8>, TrackError> {
    let old = ti.format == TrackFormat::CopylockOld;
    let mut lfsr_seed: u32 = 0;
    let mut latency = [0u32; 11];
    let mut least_sec = ti.nr_sectors;

    loop {
        if ti.valid_sectors.count() == ti.nr_sectors {
            break;
        }
        if s.next_bit().is_none() {
            break;
        }

        let sec = match identify_sector(old, s.word()) {
            Some(sec) => sec,
            None => continue,
        };
        if sec >= ti.nr_sectors || ti.valid_sectors.is_set(sec) {
            continue;
        }
        let idx_off = s.index_offset() as i32 - 15;

        // The sector index byte follows the sync.
        let Some(w) = s.next_bits(16) else { break };
        if mfm::decode_bits(CellEncoding::Mfm, w & 0xFFFF) != sec as u32 {
            continue;
        }

        // Body: 512 data bytes, timed from here.
        s.reset_latency();
        let mut raw = [0u8; 2 * SECTOR_DATA_BYTES];
        if s.next_bytes(&mut raw).is_none() {
            break;
        }
        let mut dat = [0u8; SECTOR_DATA_BYTES];
        mfm::decode_bytes(CellEncoding::Mfm, &raw, &mut dat);

        match check_sector(old, lfsr_seed, sec, &dat) {
            Ok(seed) => lfsr_seed = seed,
            Err(TrackError::CorruptSector | TrackError::DegenerateSeed) => continue,
            Err(e) => return Err(e),
        }

        latency[sec] = s.latency();
        ti.valid_sectors.set(sec);
        log::trace!("T{}: copylock sector {} valid", tracknr, sec);
        if least_sec > sec {
            ti.data_bitoff = idx_off;
            least_sec = sec;
        }
    }

    if ti.valid_sectors.count() == 0 {
        return Err(TrackError::NoMatch);
    }

    // Sanity-check the non-uniform timings against the reference sector 5.
    if !ti.valid_sectors.is_set(5) {
        latency[5] = 514 * 8 * 2 * 2000; // bodge a nominal value
    }
    for sec in 0..ti.nr_sectors {
        if !ti.valid_sectors.is_set(sec) {
            continue;
        }
        let d = 100.0 * (latency[sec] as f64 - latency[5] as f64) / latency[5] as f64;
        match sec {
            4 => {
                if d > -4.0 {
                    disk.warn(tracknr, format!("Short sector is only {:.2}% different", d));
                }
            }
            6 => {
                if d < 4.0 {
                    disk.warn(tracknr, format!("Long sector is only {:.2}% different", d));
                }
            }
            _ => {
                if !(-2.0..=2.0).contains(&d) {
                    disk.warn(tracknr, format!("Normal sector is {:.2}% different", d));
                }
            }
        }
    }

    // Project the track offset back across any missing initial sectors,
    // then back from the sync to the start of the header mark.
    let first_valid = (0..ti.nr_sectors)
        .find(|&sec| ti.valid_sectors.is_set(sec))
        .unwrap_or(0);
    ti.data_bitoff -= (first_valid * (514 + 48) * 8 * 2) as i32;
    ti.data_bitoff -= 3 * 8 * 2;

    // The seed regenerates everything, so a partial read still yields a
    // complete track.
    if ti.valid_sectors.count() != ti.nr_sectors {
        disk.warn(
            tracknr,
            format!("Reconstructed damaged track ({})", ti.valid_sectors.count()),
        );
        ti.valid_sectors.set_all();
    }

    Ok(lfsr_seed.to_be_bytes().to_vec())
}

pub(super) fn encode(
    _tracknr: usize,
    ti: &TrackInfo,
    tbuf: &mut TrackBuffer,
) -> Result<(), TrackError> {
    let old = ti.format == TrackFormat::CopylockOld;
    let seed = match ti.data.get(..4) {
        Some(b) => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        None => return Err(TrackError::CorruptSector),
    };

    tbuf.disable_auto_sector_split();

    let mut speed = SPEED_AVG;
    for sec in 0..ti.nr_sectors {
        // Header
        if !old {
            tbuf.bits(speed, CellEncoding::Mfm, 8, 0xA0 + sec as u32);
            tbuf.bits(speed, CellEncoding::Mfm, 16, 0);
            tbuf.bits(speed, CellEncoding::Raw, 16, SYNC_LIST[sec] as u32);
        } else {
            tbuf.bits(
                speed,
                CellEncoding::Raw,
                16,
                mfm::encode_word(0xA0 + sec as u16) | (1 << 13),
            );
            tbuf.bits(speed, CellEncoding::Mfm, 16, 0);
            tbuf.bits(
                speed,
                CellEncoding::Raw,
                16,
                mfm::encode_word(0xB0 + sec as u16) | (1 << 13),
            );
        }
        tbuf.bits(speed, CellEncoding::Mfm, 8, sec as u32);

        // Data
        let mut lfsr = lfsr_seek(old, Lfsr::new(seed), 0, sec);
        let mut i = 0;
        while i < SECTOR_DATA_BYTES {
            if sec == 6 && i == 0 {
                for &b in SEC6_SIG.iter() {
                    tbuf.bits(speed, CellEncoding::Mfm, 8, b as u32);
                }
                i = SEC6_SIG.len();
            }
            tbuf.bits(speed, CellEncoding::Mfm, 8, lfsr.byte() as u32);
            lfsr.step();
            i += 1;
        }

        // Footer
        tbuf.bits(speed, CellEncoding::Mfm, 8, 0);

        // The gap already runs at the next sector's speed, giving the
        // controller time to lock on before the short or long sector.
        speed = match sec + 1 {
            4 => SPEED_AVG * 95 / 100,
            6 => SPEED_AVG * 105 / 100,
            _ => SPEED_AVG,
        };
        tbuf.gap(speed, 44 * 8);
    }

    Ok(())
}
