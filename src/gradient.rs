// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Piecewise-linear color tables.
//!
//! A Gradient is a list of stops, each pinning a color to an offset in
//! the unit interval.  Looking up an offset between two stops blends
//! their colors channel by channel; looking up an offset beyond the
//! outermost stops returns the outermost color.  A Gradient is built
//! once and never changes afterwards, so it can be shared between
//! render workers behind an `Arc` without any locking.

use std::cmp::Ordering;

use crate::errors::GradientError;
use crate::escape::IterationResult;

/// A color with normalized channels, each nominally in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

/// The color of interior points.
pub const BLACK: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

fn channel_to_byte(c: f64) -> u8 {
    (num::clamp(c, 0.0, 1.0) * 255.0).round() as u8
}

impl Color {
    /// Builds a color from normalized channels.
    pub fn new(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// Builds a color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Color {
        Color::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }

    /// The 8-bit channels, clamped and rounded.
    pub fn to_rgb8(&self) -> [u8; 3] {
        [
            channel_to_byte(self.r),
            channel_to_byte(self.g),
            channel_to_byte(self.b),
        ]
    }

    /// Packs the color as `0x00RRGGBB`.
    pub fn packed(&self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
    }
}

/// An anchor in a gradient.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorStop {
    /// Position in `[0, 1]`.
    pub offset: f64,
    /// Color at that position.
    pub color: Color,
}

impl ColorStop {
    /// Pins `color` to `offset`.
    pub fn new(offset: f64, color: Color) -> ColorStop {
        ColorStop { offset, color }
    }
}

/// An immutable, offset-sorted table of color stops.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Validates and sorts the stops.  Offsets must be unique and lie in
    /// the unit interval; there must be at least one stop.
    pub fn new(mut stops: Vec<ColorStop>) -> Result<Gradient, GradientError> {
        if stops.is_empty() {
            return Err(GradientError::NoStops);
        }
        if let Some(stop) = stops
            .iter()
            .find(|s| !(s.offset >= 0.0 && s.offset <= 1.0))
        {
            return Err(GradientError::OffsetOutOfRange(stop.offset));
        }
        // Offsets are known to be finite here.
        stops.sort_by(|a, b| a.offset.partial_cmp(&b.offset).unwrap_or(Ordering::Equal));
        if let Some(pair) = stops.windows(2).find(|w| w[0].offset == w[1].offset) {
            return Err(GradientError::DuplicateOffset(pair[0].offset));
        }
        Ok(Gradient { stops })
    }

    /// The default eleven-stop table, running red through orange,
    /// yellow, green, teal, blue and violet to dark magenta.
    pub fn spectrum() -> Gradient {
        let table: [(f64, [u8; 3]); 11] = [
            (0.0, [255, 0, 0]),
            (0.1, [255, 69, 0]),
            (0.2, [255, 165, 0]),
            (0.3, [255, 255, 0]),
            (0.4, [154, 205, 50]),
            (0.5, [0, 128, 0]),
            (0.6, [0, 128, 128]),
            (0.7, [0, 0, 255]),
            (0.8, [138, 43, 226]),
            (0.9, [148, 0, 211]),
            (1.0, [139, 0, 139]),
        ];
        Gradient {
            stops: table
                .iter()
                .map(|&(offset, [r, g, b])| ColorStop::new(offset, Color::from_rgb8(r, g, b)))
                .collect(),
        }
    }

    /// The stops, sorted by offset.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Looks up the color at `offset`, blending the two stops that
    /// bracket it.  Offsets outside the covered range clamp to the
    /// nearest end stop.
    pub fn color_at(&self, offset: f64) -> Color {
        // Index of the first stop strictly past `offset`.
        let split = self.stops.iter().take_while(|s| s.offset <= offset).count();
        if split > 0 && self.stops[split - 1].offset == offset {
            return self.stops[split - 1].color;
        }
        let last = self.stops.len() - 1;
        let before = if split > 0 {
            &self.stops[split - 1]
        } else {
            &self.stops[0]
        };
        let after = if split <= last {
            &self.stops[split]
        } else {
            &self.stops[last]
        };
        let span = after.offset - before.offset;
        if span == 0.0 {
            return before.color;
        }
        let t = (offset - before.offset) / span;
        Color::new(
            before.color.r + t * (after.color.r - before.color.r),
            before.color.g + t * (after.color.g - before.color.g),
            before.color.b + t * (after.color.b - before.color.b),
        )
    }

    /// Colors one evaluated point.  Interior points are black; escaped
    /// points look up `1 - n / max_iterations`, so fast escapes land at
    /// the top of the table and slow ones at the bottom.
    pub fn color_for_iteration(&self, result: IterationResult, max_iterations: usize) -> Color {
        match result {
            IterationResult::Interior => BLACK,
            IterationResult::Escaped(n) => self.color_at(1.0 - n / (max_iterations as f64)),
        }
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Gradient::spectrum()
    }
}
