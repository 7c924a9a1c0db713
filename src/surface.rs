// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The stock `FrameSink`: a row-major surface of packed RGB pixels
//! behind a lock.  Each column write takes the lock only for the copy,
//! so a reader (a display refresh, say) never sees half a column.

use log::info;
use std::sync::{Mutex, MutexGuard};

use crate::errors::SinkError;
use crate::planes::RenderConfig;
use crate::tiles::{ColumnUpdate, FrameSink, RenderSummary};

/// A `width` x `height` grid of `0x00RRGGBB` pixels.
#[derive(Debug)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    pixels: Mutex<Vec<u32>>,
}

impl PixelSurface {
    /// An all-black surface.
    pub fn new(width: usize, height: usize) -> Self {
        PixelSurface {
            width,
            height,
            pixels: Mutex::new(vec![0; width * height]),
        }
    }

    /// Surface width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Surface height.
    pub fn height(&self) -> usize {
        self.height
    }

    fn lock(&self) -> Result<MutexGuard<Vec<u32>>, SinkError> {
        self.pixels.lock().map_err(|_| SinkError::Poisoned)
    }

    /// Copies a vertical run of pixels starting at `x, y`.  The whole
    /// run must fit; nothing is written otherwise.
    pub fn write_column(&self, x: usize, y: usize, colors: &[u32]) -> Result<(), SinkError> {
        if x >= self.width || y + colors.len() > self.height {
            return Err(SinkError::OutOfBounds {
                x,
                y,
                len: colors.len(),
                width: self.width,
                height: self.height,
            });
        }
        let mut pixels = self.lock()?;
        for (row, color) in colors.iter().enumerate() {
            pixels[(y + row) * self.width + x] = *color;
        }
        Ok(())
    }

    /// One pixel, or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.lock().ok().map(|pixels| pixels[y * self.width + x])
    }

    /// A copy of the whole surface, row-major.
    pub fn pixels(&self) -> Result<Vec<u32>, SinkError> {
        Ok(self.lock()?.clone())
    }

    /// The surface as tightly packed `R, G, B` bytes, row-major.
    pub fn to_rgb_bytes(&self) -> Result<Vec<u8>, SinkError> {
        let pixels = self.lock()?;
        let mut bytes = Vec::with_capacity(pixels.len() * 3);
        for p in pixels.iter() {
            bytes.push((p >> 16) as u8);
            bytes.push((p >> 8) as u8);
            bytes.push(*p as u8);
        }
        Ok(bytes)
    }

    /// Blacks out the whole surface.
    pub fn clear(&self) -> Result<(), SinkError> {
        for p in self.lock()?.iter_mut() {
            *p = 0;
        }
        Ok(())
    }
}

impl FrameSink for PixelSurface {
    /// Starts every render from black, so a tile that never arrives
    /// shows up as a hole rather than as the previous frame.
    fn on_render_start(&self, _config: &RenderConfig) -> Result<(), SinkError> {
        self.clear()
    }

    fn on_partial_update(&self, update: &ColumnUpdate) -> Result<(), SinkError> {
        self.write_column(update.x, update.y, update.colors)
    }

    fn on_render_complete(&self, summary: &RenderSummary) {
        info!(
            "surface {}x{} received {} of {} tiles",
            self.width, self.height, summary.completed, summary.tiles
        );
    }
}

#[cfg(test)]
impl PixelSurface {
    /// Leaves the surface lock poisoned, as a writer panicking mid-copy
    /// would.
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pixels = self.pixels.lock();
            panic!("poisoning surface");
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_land_in_row_major_order() {
        let s = PixelSurface::new(3, 4);
        s.write_column(1, 1, &[0x11, 0x22, 0x33]).unwrap();
        assert_eq!(
            s.pixels().unwrap(),
            vec![0, 0, 0, 0, 0x11, 0, 0, 0x22, 0, 0, 0x33, 0]
        );
        assert_eq!(s.pixel(1, 3), Some(0x33));
        assert_eq!(s.pixel(3, 0), None);
    }

    #[test]
    fn rejects_columns_outside_the_surface() {
        let s = PixelSurface::new(3, 4);
        assert_eq!(
            s.write_column(3, 0, &[1]),
            Err(SinkError::OutOfBounds {
                x: 3,
                y: 0,
                len: 1,
                width: 3,
                height: 4
            })
        );
        assert!(s.write_column(0, 2, &[1, 2, 3]).is_err());
        assert!(s.pixels().unwrap().iter().all(|&p| p == 0));
    }

    #[test]
    fn unpacks_to_rgb_bytes() {
        let s = PixelSurface::new(2, 1);
        s.write_column(0, 0, &[0x00ff_8001]).unwrap();
        s.write_column(1, 0, &[0x0001_0203]).unwrap();
        assert_eq!(s.to_rgb_bytes().unwrap(), vec![0xff, 0x80, 0x01, 1, 2, 3]);
    }

    #[test]
    fn poisoned_surface_refuses_reads() {
        let s = PixelSurface::new(2, 2);
        s.poison();
        assert_eq!(s.pixels(), Err(SinkError::Poisoned));
        assert_eq!(s.write_column(0, 0, &[1]), Err(SinkError::Poisoned));
    }

    #[test]
    fn clear_blacks_out() {
        let s = PixelSurface::new(2, 2);
        s.write_column(1, 0, &[7, 7]).unwrap();
        s.clear().unwrap();
        assert_eq!(s.pixels().unwrap(), vec![0; 4]);
    }
}
