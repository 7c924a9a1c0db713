// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types for every fallible boundary of the renderer.  The
//! per-pixel math never fails; everything here happens at construction
//! time, at the sink, or at export.

use failure::Fail;
use std::io;

/// Rejected viewport or render parameters.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum ViewportError {
    /// The zoom span must be finite and strictly positive.
    #[fail(display = "zoom must be a positive, finite number, got {}", _0)]
    BadZoom(f64),
    /// The center must be a finite point.
    #[fail(display = "center must be finite, got ({}, {})", _0, _1)]
    BadCenter(f64, f64),
    /// Both pixel dimensions must be at least one.
    #[fail(display = "image dimensions must be non-zero, got {}x{}", _0, _1)]
    EmptyImage(usize, usize),
    /// At least one iteration is needed to classify a point.
    #[fail(display = "maximum iterations must be at least 1")]
    NoIterations,
}

/// Rejected gradient tables.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum GradientError {
    /// A gradient needs at least one stop.
    #[fail(display = "a gradient needs at least one color stop")]
    NoStops,
    /// Offsets live in the closed unit interval.
    #[fail(display = "color stop offset {} is outside [0, 1]", _0)]
    OffsetOutOfRange(f64),
    /// Two stops may not share an offset.
    #[fail(display = "duplicate color stop offset {}", _0)]
    DuplicateOffset(f64),
}

/// A sink refused or failed a column write.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum SinkError {
    /// The column does not fit inside the destination surface.
    #[fail(
        display = "column of {} pixels at ({}, {}) falls outside the {}x{} surface",
        len, x, y, width, height
    )]
    OutOfBounds {
        /// Absolute column of the write.
        x: usize,
        /// Absolute top row of the write.
        y: usize,
        /// Number of pixels in the column.
        len: usize,
        /// Surface width.
        width: usize,
        /// Surface height.
        height: usize,
    },
    /// A writer panicked while holding the surface lock.
    #[fail(display = "pixel surface lock is poisoned")]
    Poisoned,
    /// Any other refusal, described by the sink.
    #[fail(display = "sink rejected write: {}", _0)]
    Rejected(String),
}

/// Why a render did not run, or did not finish cleanly.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The scheduler is already busy with another render.
    #[fail(display = "a render is already in progress")]
    AlreadyRendering,
    /// The sink failed a write; the render was stopped.
    #[fail(display = "sink write failed: {}", _0)]
    Sink(#[cause] SinkError),
    /// A worker thread died outside of tile fault isolation.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,
    /// The background render thread could not be started.
    #[fail(display = "could not start render thread: {}", _0)]
    Spawn(#[cause] io::Error),
}

/// Failures while encoding a finished surface to disk.
#[derive(Debug, Fail)]
pub enum ExportError {
    /// The file could not be created or written.
    #[fail(display = "could not write image: {}", _0)]
    Io(#[cause] io::Error),
    /// The surface could not be read.
    #[fail(display = "could not read surface: {}", _0)]
    Surface(#[cause] SinkError),
    /// The surface does not hold the number of pixels its size promises.
    #[fail(display = "surface holds {} pixels, expected {}", _0, _1)]
    SurfaceIncomplete(usize, usize),
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<SinkError> for ExportError {
    fn from(err: SinkError) -> Self {
        ExportError::Surface(err)
    }
}

impl From<SinkError> for RenderError {
    fn from(err: SinkError) -> Self {
        RenderError::Sink(err)
    }
}
