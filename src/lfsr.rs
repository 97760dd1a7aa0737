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

    src/lfsr.rs

    The 23-bit LFSR that generates CopyLock sector data.
*/

//! A 23-bit linear feedback shift register with taps at bits 0 and 22.
//!
//! The generated byte stream is an 8-bit window on the state, emitted once
//! per forward step. Stepping is exactly invertible, which is what lets a
//! decoder walk a recovered mid-track state back to the track seed.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Lfsr {
    state: u32,
}

impl Lfsr {
    pub const MASK: u32 = (1 << 23) - 1;

    pub fn new(state: u32) -> Lfsr {
        Lfsr {
            state: state & Lfsr::MASK,
        }
    }

    pub fn state(self) -> u32 {
        self.state
    }

    /// The byte window on the current state, bits [22:15].
    pub fn byte(self) -> u8 {
        (self.state >> 15) as u8
    }

    /// Step forward: shift left, new LSB = bit22 ^ bit0.
    pub fn step(&mut self) {
        let x = self.state;
        self.state = ((x << 1) & Lfsr::MASK) | (((x >> 22) ^ x) & 1);
    }

    /// Step backward: shift right, new MSB = bit0 ^ bit1.
    pub fn step_back(&mut self) {
        let x = self.state;
        self.state = (x >> 1) | ((((x >> 1) ^ x) & 1) << 22);
    }
}
