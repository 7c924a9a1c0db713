#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring `z` and adding `c`, starting from
//! zero, never runs off to infinity.  Points outside the set do run
//! off, some quickly and some slowly, and how quickly they go (their
//! "velocity") is what gets painted.
//!
//! This crate renders a square window onto the plane.  The window is
//! cut into an 8x8 grid of tiles, a small pool of workers renders the
//! tiles in parallel, and each finished column of each tile is pushed
//! to a `FrameSink` as soon as it is ready, so a display can fill in
//! progressively.  Velocities are smoothed into a continuous value and
//! looked up in a piecewise-linear `Gradient`; points that never escape
//! are painted black.
//!
//! ```no_run
//! use mandelbrot::{Gradient, PixelSurface, RenderConfig, TileScheduler, Viewport};
//! use std::sync::Arc;
//!
//! let viewport = Viewport::with_defaults(1024, 1024).unwrap();
//! let config = RenderConfig::new(viewport, 1000).unwrap();
//! let surface = PixelSurface::new(1024, 1024);
//! let scheduler = TileScheduler::new(Arc::new(Gradient::spectrum()));
//! scheduler.render(config, &surface).unwrap();
//! ```

pub mod errors;
pub mod escape;
pub mod export;
pub mod gradient;
pub mod planes;
pub mod surface;
pub mod tiles;

pub use crate::errors::{ExportError, GradientError, RenderError, SinkError, ViewportError};
pub use crate::escape::{evaluate, IterationResult};
pub use crate::gradient::{Color, ColorStop, Gradient};
pub use crate::planes::{RenderConfig, Viewport};
pub use crate::surface::PixelSurface;
pub use crate::tiles::{
    render_with, CallbackSink, CancelToken, ColumnUpdate, FrameSink, RenderHandle,
    RenderSummary, Tile, TileScheduler,
};
