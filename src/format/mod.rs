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

//! The track-format handler table.
//!
//! Every supported format is one [TrackFormat] tag resolving to a static
//! [TrackHandler]: the sector geometry, a per-format constant block, and the
//! decode/encode callbacks. The table is fixed at compile time; nothing
//! registers at runtime.
//!
//! [decode_track] and [encode_track] are the two entry points the image
//! pipeline calls per track. A decoder that finds nothing returns
//! [TrackError::NoMatch](crate::TrackError::NoMatch) so the caller can try
//! the next candidate format.

mod amigados;
mod copylock;
mod ego;

use std::fmt::{self, Display, Formatter};

use strum::EnumIter;

use crate::{
    bitstream::BitStream, disk::Disk, track::TrackInfo, trackbuf::TrackBuffer, TrackError,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum TrackFormat {
    AmigaDos,
    Copylock,
    CopylockOld,
    BehindTheIronGate,
    ZaZelaznaBrama,
    ZaZelaznaBramaBoot,
    AbcChemiiA,
    AbcChemiiB,
    AbcChemiiTimsoftA,
    AbcChemiiTimsoftB,
    Inferior,
}

impl Display for TrackFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TrackFormat::AmigaDos => write!(f, "AmigaDOS"),
            TrackFormat::Copylock => write!(f, "CopyLock"),
            TrackFormat::CopylockOld => write!(f, "CopyLock (old)"),
            TrackFormat::BehindTheIronGate => write!(f, "Behind the Iron Gate"),
            TrackFormat::ZaZelaznaBrama => write!(f, "Za Zelazna Brama"),
            TrackFormat::ZaZelaznaBramaBoot => write!(f, "Za Zelazna Brama (boot)"),
            TrackFormat::AbcChemiiA => write!(f, "ABC Chemii (A)"),
            TrackFormat::AbcChemiiB => write!(f, "ABC Chemii (B)"),
            TrackFormat::AbcChemiiTimsoftA => write!(f, "ABC Chemii Timsoft (A)"),
            TrackFormat::AbcChemiiTimsoftB => write!(f, "ABC Chemii Timsoft (B)"),
            TrackFormat::Inferior => write!(f, "Inferior"),
        }
    }
}

pub type DecodeFn =
    fn(&mut Disk, usize, &mut TrackInfo, &mut BitStream) -> Result<Vec<u8>, TrackError>;
pub type EncodeFn = fn(usize, &TrackInfo, &mut TrackBuffer) -> Result<(), TrackError>;

/// Per-format constants beyond the common geometry.
#[derive(Copy, Clone, Debug)]
pub enum FormatParams {
    None,
    /// The sync word an ego-family variant scans for.
    EgoSync(u16),
}

pub struct TrackHandler {
    pub bytes_per_sector: usize,
    pub nr_sectors: usize,
    pub params: FormatParams,
    pub decode: DecodeFn,
    /// `None` for decode-only tags. The za-zelazna-brama boot tag re-seats
    /// its track as AmigaDOS during decode, so nothing ever encodes under it.
    pub encode: Option<EncodeFn>,
}

static AMIGADOS: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    params: FormatParams::None,
    decode: amigados::decode,
    encode: Some(amigados::encode),
};

static COPYLOCK: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    params: FormatParams::None,
    decode: copylock::decode,
    encode: Some(copylock::encode),
};

static COPYLOCK_OLD: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    params: FormatParams::None,
    decode: copylock::decode,
    encode: Some(copylock::encode),
};

static BEHIND_THE_IRON_GATE: TrackHandler = TrackHandler {
    bytes_per_sector: 6144,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x8951),
    decode: ego::decode,
    encode: Some(ego::encode),
};

static ZA_ZELAZNA_BRAMA: TrackHandler = TrackHandler {
    bytes_per_sector: 6144,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x8951),
    decode: ego::decode,
    encode: Some(ego::encode),
};

static ZA_ZELAZNA_BRAMA_BOOT: TrackHandler = TrackHandler {
    bytes_per_sector: 512,
    nr_sectors: 11,
    params: FormatParams::None,
    decode: ego::decode_boot,
    encode: None,
};

static ABC_CHEMII_A: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x8951),
    decode: ego::decode,
    encode: Some(ego::encode),
};

static ABC_CHEMII_B: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x4489),
    decode: ego::decode,
    encode: Some(ego::encode),
};

static ABC_CHEMII_TIMSOFT_A: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x8951),
    decode: ego::decode,
    encode: Some(ego::encode),
};

static ABC_CHEMII_TIMSOFT_B: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x4489),
    decode: ego::decode,
    encode: Some(ego::encode),
};

static INFERIOR: TrackHandler = TrackHandler {
    bytes_per_sector: 5632,
    nr_sectors: 1,
    params: FormatParams::EgoSync(0x8951),
    decode: ego::decode,
    encode: Some(ego::encode),
};

impl TrackFormat {
    pub fn handler(self) -> &'static TrackHandler {
        match self {
            TrackFormat::AmigaDos => &AMIGADOS,
            TrackFormat::Copylock => &COPYLOCK,
            TrackFormat::CopylockOld => &COPYLOCK_OLD,
            TrackFormat::BehindTheIronGate => &BEHIND_THE_IRON_GATE,
            TrackFormat::ZaZelaznaBrama => &ZA_ZELAZNA_BRAMA,
            TrackFormat::ZaZelaznaBramaBoot => &ZA_ZELAZNA_BRAMA_BOOT,
            TrackFormat::AbcChemiiA => &ABC_CHEMII_A,
            TrackFormat::AbcChemiiB => &ABC_CHEMII_B,
            TrackFormat::AbcChemiiTimsoftA => &ABC_CHEMII_TIMSOFT_A,
            TrackFormat::AbcChemiiTimsoftB => &ABC_CHEMII_TIMSOFT_B,
            TrackFormat::Inferior => &INFERIOR,
        }
    }
}

/// Try to decode one track of `stream` as `format`.
///
/// On success the returned [TrackInfo] owns the payload and carries the
/// physical metadata the handler recovered. The format tag of the result may
/// differ from the requested one when a handler delegates (the
/// za-zelazna-brama boot track registers as AmigaDOS).
pub fn decode_track(
    disk: &mut Disk,
    tracknr: usize,
    format: TrackFormat,
    stream: &mut BitStream,
) -> Result<TrackInfo, TrackError> {
    let mut ti = TrackInfo::new(format);
    log::debug!("T{}.{}: decoding as {}", tracknr / 2, tracknr & 1, format);
    let data = (format.handler().decode)(disk, tracknr, &mut ti, stream)?;
    ti.data = data;
    Ok(ti)
}

/// Re-encode a decoded track into a cell buffer of exactly `ti.total_bits`
/// cells.
///
/// Decode-only tags carry no encoder and return
/// [TrackError::NoMatch](crate::TrackError::NoMatch); their decoders re-seat
/// the track on the delegate format, which is the tag to encode under.
pub fn encode_track(tracknr: usize, ti: &TrackInfo) -> Result<TrackBuffer, TrackError> {
    let Some(encode) = ti.format.handler().encode else {
        log::debug!("{} is decode-only, nothing to encode", ti.format);
        return Err(TrackError::NoMatch);
    };
    let mut tbuf = TrackBuffer::new();
    encode(tracknr, ti, &mut tbuf)?;
    tbuf.pad_to(ti.total_bits as usize);
    Ok(tbuf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_registry_geometry() {
        for format in TrackFormat::iter() {
            let handler = format.handler();
            assert!(handler.nr_sectors > 0, "{format}");
            assert!(handler.bytes_per_sector > 0, "{format}");
            if handler.nr_sectors == 1 {
                // Single-sector formats declare their whole payload as one
                // sector.
                assert_eq!(
                    handler.bytes_per_sector * handler.nr_sectors,
                    handler.bytes_per_sector,
                    "{format}"
                );
                assert!(matches!(handler.params, FormatParams::EgoSync(_)), "{format}");
            }
        }
    }

    #[test]
    fn test_boot_tag_is_decode_only() {
        for format in TrackFormat::iter() {
            let has_encoder = format.handler().encode.is_some();
            assert_eq!(
                has_encoder,
                format != TrackFormat::ZaZelaznaBramaBoot,
                "{format}"
            );
        }
    }

    #[test]
    fn test_ego_sync_words() {
        for (format, sync) in [
            (TrackFormat::BehindTheIronGate, 0x8951),
            (TrackFormat::ZaZelaznaBrama, 0x8951),
            (TrackFormat::AbcChemiiA, 0x8951),
            (TrackFormat::AbcChemiiB, 0x4489),
            (TrackFormat::AbcChemiiTimsoftA, 0x8951),
            (TrackFormat::AbcChemiiTimsoftB, 0x4489),
            (TrackFormat::Inferior, 0x8951),
        ] {
            match format.handler().params {
                FormatParams::EgoSync(s) => assert_eq!(s, sync, "{format}"),
                _ => panic!("{format} should carry a sync word"),
            }
        }
    }
}
