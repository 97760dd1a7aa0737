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

//! A codec library for Amiga floppy track formats at the bitcell level.
//!
//! An `amiflux` track handler consumes a [BitStream] of raw MFM cells captured
//! from one track and recovers the logical payload plus the physical metadata
//! (bit offset, total bit length, per-sector validity) needed to write the
//! track back bit-exact. The reverse direction drives a [TrackBuffer],
//! synthesizing cells with per-cell speed so that non-uniform protection
//! timings survive a roundtrip.
//!
//! Container file formats, hardware flux devices and any CLI live outside
//! this crate; everything here operates on pre-materialized cell streams.

pub mod bitstream;
mod disk;
pub mod format;
pub mod lfsr;
pub mod mfm;
mod track;
pub mod trackbuf;

use thiserror::Error;

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("No recognizable track data found in the stream")]
    NoMatch,
    #[error("A sector candidate failed validation")]
    CorruptSector,
    #[error("The stream ended in the middle of a structure")]
    StreamEnd,
    #[error("Recovered a degenerate (zero) LFSR seed")]
    DegenerateSeed,
    #[error("A required disk tag is not present")]
    MissingTag,
}

pub use bitstream::BitStream;
pub use disk::{Disk, DiskTag, DiskTagId, TrackWarning};
pub use format::{decode_track, encode_track, FormatParams, TrackFormat, TrackHandler};
pub use mfm::CellEncoding;
pub use track::{SectorBitmap, TrackInfo, DEFAULT_TOTAL_BITS};
pub use trackbuf::{TrackBuffer, SPEED_AVG};
