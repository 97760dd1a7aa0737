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

    src/disk.rs

    Cross-track decode state: disk tags and collected warnings.
*/

//! State shared between the tracks of one disk image.
//!
//! Some protections spread their metadata across tracks: a boot track holds
//! the offsets that size every other track of the disk. Handlers publish
//! such blobs as disk tags. A tag has one writer; the first handler to set a
//! tag wins and later writes are ignored, so readers observe either absence
//! or a fully-initialized value.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::TrackError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiskTagId {
    ZaZelaznaBramaProtection,
}

#[derive(Clone, Debug)]
pub enum DiskTag {
    /// 152 big-endian words lifted from the boot track, one track-length
    /// offset per protected track.
    ZaZelaznaBramaProtection(Vec<u16>),
}

impl DiskTag {
    pub fn id(&self) -> DiskTagId {
        match self {
            DiskTag::ZaZelaznaBramaProtection(_) => DiskTagId::ZaZelaznaBramaProtection,
        }
    }
}

/// A non-fatal observation made while decoding one track.
#[derive(Clone, Debug)]
pub struct TrackWarning {
    pub tracknr: usize,
    pub msg: String,
}

impl Display for TrackWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "T{}.{}: {}", self.tracknr / 2, self.tracknr & 1, self.msg)
    }
}

#[derive(Default)]
pub struct Disk {
    tags: HashMap<DiskTagId, DiskTag>,
    warnings: Vec<TrackWarning>,
}

impl Disk {
    pub fn new() -> Disk {
        Disk::default()
    }

    /// Publish a tag. The first writer wins; an existing tag is returned
    /// unchanged.
    pub fn set_tag(&mut self, tag: DiskTag) -> &DiskTag {
        self.tags.entry(tag.id()).or_insert(tag)
    }

    pub fn tag(&self, id: DiskTagId) -> Option<&DiskTag> {
        self.tags.get(&id)
    }

    /// Like [Disk::tag], for callers that cannot proceed without the tag.
    pub fn require_tag(&self, id: DiskTagId) -> Result<&DiskTag, TrackError> {
        self.tag(id).ok_or(TrackError::MissingTag)
    }

    pub fn za_zelazna_brama_protection(&self) -> Option<&[u16]> {
        match self.tags.get(&DiskTagId::ZaZelaznaBramaProtection) {
            Some(DiskTag::ZaZelaznaBramaProtection(words)) => Some(words),
            None => None,
        }
    }

    pub(crate) fn warn(&mut self, tracknr: usize, msg: String) {
        let warning = TrackWarning { tracknr, msg };
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[TrackWarning] {
        &self.warnings
    }
}
