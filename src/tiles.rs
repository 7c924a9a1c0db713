// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tile-parallel rendering.
//!
//! The image is cut into a fixed 8x8 grid of tiles.  A small pool of
//! workers pulls tiles off a shared list, and for every tile walks it
//! column by column: each pixel is mapped onto the complex plane,
//! iterated, and colored, and every finished column is handed to a
//! `FrameSink`.  Since the tiles are disjoint and cover the image, every
//! pixel is written exactly once, by exactly one worker, and the sink
//! never needs more than a short lock around each column copy.
//!
//! The order in which tiles finish is not deterministic; the finished
//! image is.

use itertools::iproduct;
use log::{debug, error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::errors::{RenderError, SinkError};
use crate::escape::evaluate;
use crate::gradient::Gradient;
use crate::planes::RenderConfig;

/// Tiles per side of the grid.
pub const TILE_GRID: usize = 8;

/// Worker count used when none is given.
pub const DEFAULT_WORKERS: usize = 4;

/// One cell of the tile grid, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Grid column of the tile.
    pub col: usize,
    /// Grid row of the tile.
    pub row: usize,
    /// Left edge, in pixels.
    pub x: usize,
    /// Top edge, in pixels.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Tile {
    /// Number of pixels in the tile.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// True when the image was too small to give this tile any pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Start and length of cell `index` when `extent` pixels are split
/// into `TILE_GRID` cells.  The last cell absorbs the remainder.
fn span(index: usize, extent: usize) -> (usize, usize) {
    let size = extent / TILE_GRID;
    let start = index * size;
    if index == TILE_GRID - 1 {
        (start, extent - start)
    } else {
        (start, size)
    }
}

/// Cuts a `width` x `height` image into the 8x8 tile grid, column-major
/// like the walk inside each tile.
pub fn partition(width: usize, height: usize) -> Vec<Tile> {
    iproduct!(0..TILE_GRID, 0..TILE_GRID)
        .map(|(col, row)| {
            let (x, w) = span(col, width);
            let (y, h) = span(row, height);
            Tile {
                col,
                row,
                x,
                y,
                width: w,
                height: h,
            }
        })
        .collect()
}

/// One finished column of a tile.
#[derive(Debug)]
pub struct ColumnUpdate<'a> {
    /// The tile the column belongs to.
    pub tile: Tile,
    /// Absolute column of the pixels.
    pub x: usize,
    /// Absolute row of the first pixel.
    pub y: usize,
    /// Packed `0x00RRGGBB` colors, top to bottom.
    pub colors: &'a [u32],
}

/// What a render did, handed to the sink once at the end.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    /// Tiles in the grid.
    pub tiles: usize,
    /// Tiles whose every column reached the sink.
    pub completed: usize,
    /// Tiles abandoned because computing or writing them panicked.
    pub faulted: Vec<Tile>,
    /// True when the render was cancelled before every tile started.
    pub cancelled: bool,
    /// The first write the sink refused, if any.  Stops the render.
    pub sink_error: Option<SinkError>,
    /// Wall time from dispatch to completion.
    pub elapsed: Duration,
}

impl RenderSummary {
    /// True when every tile made it to the sink.
    pub fn is_complete(&self) -> bool {
        self.completed == self.tiles
    }
}

/// The destination of a render.  Both calls arrive on worker threads,
/// so implementations must be `Sync`; marshaling onto a display thread
/// is the sink's business.
pub trait FrameSink: Sync {
    /// Called once per render, before any tile is dispatched.  A
    /// refusal stops the render before it starts.
    fn on_render_start(&self, _config: &RenderConfig) -> Result<(), SinkError> {
        Ok(())
    }

    /// Receives one finished column.  Writes from different workers
    /// never overlap, but may arrive concurrently.
    fn on_partial_update(&self, update: &ColumnUpdate) -> Result<(), SinkError>;

    /// Called exactly once per render, after the last tile.
    fn on_render_complete(&self, summary: &RenderSummary);
}

/// Adapts a pair of closures into a `FrameSink`.
pub struct CallbackSink<P, C> {
    on_partial: P,
    on_complete: C,
}

impl<P, C> CallbackSink<P, C>
where
    P: Fn(&ColumnUpdate) -> Result<(), SinkError> + Sync,
    C: Fn(&RenderSummary) + Sync,
{
    /// Wraps the two callbacks.
    pub fn new(on_partial: P, on_complete: C) -> Self {
        CallbackSink {
            on_partial,
            on_complete,
        }
    }
}

impl<P, C> FrameSink for CallbackSink<P, C>
where
    P: Fn(&ColumnUpdate) -> Result<(), SinkError> + Sync,
    C: Fn(&RenderSummary) + Sync,
{
    fn on_partial_update(&self, update: &ColumnUpdate) -> Result<(), SinkError> {
        (self.on_partial)(update)
    }

    fn on_render_complete(&self, summary: &RenderSummary) {
        (self.on_complete)(summary)
    }
}

/// A cooperative cancellation flag, checked between tiles.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Asks the render to stop starting new tiles.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a cancel has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Holds the scheduler's "render in progress" flag; releases it on drop.
struct RenderGuard(Arc<AtomicBool>);

impl Drop for RenderGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs renders on a bounded pool of workers.  One render at a time.
pub struct TileScheduler {
    gradient: Arc<Gradient>,
    workers: usize,
    rendering: Arc<AtomicBool>,
    cancel: CancelToken,
}

/// A render running on a background thread.
pub struct RenderHandle {
    thread: JoinHandle<Result<RenderSummary, RenderError>>,
    cancel: CancelToken,
}

impl RenderHandle {
    /// Stops dispatching new tiles; tiles already running finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the render to finish.
    pub fn join(self) -> Result<RenderSummary, RenderError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(_) => Err(RenderError::WorkerPanicked),
        }
    }
}

impl TileScheduler {
    /// A scheduler with the default worker count.
    pub fn new(gradient: Arc<Gradient>) -> Self {
        TileScheduler::with_workers(gradient, DEFAULT_WORKERS)
    }

    /// A scheduler with `workers` threads; zero is treated as one.
    pub fn with_workers(gradient: Arc<Gradient>, workers: usize) -> Self {
        TileScheduler {
            gradient,
            workers: workers.max(1),
            rendering: Arc::new(AtomicBool::new(false)),
            cancel: CancelToken::default(),
        }
    }

    /// Number of worker threads per render.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// True while a render holds the scheduler.
    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    /// A token that cancels whichever render is running.  Starting a
    /// render clears any earlier request.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn begin(&self) -> Result<RenderGuard, RenderError> {
        if self
            .rendering
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RenderError::AlreadyRendering);
        }
        self.cancel.reset();
        Ok(RenderGuard(self.rendering.clone()))
    }

    /// Renders `config` into `sink`, blocking until every tile is done.
    pub fn render<S: FrameSink + ?Sized>(
        &self,
        config: RenderConfig,
        sink: &S,
    ) -> Result<RenderSummary, RenderError> {
        let _guard = self.begin()?;
        self.run(config, sink)
    }

    /// Renders `config` into `sink` on a background thread.  The
    /// in-progress check happens before this returns.
    pub fn spawn<S>(
        self: &Arc<Self>,
        config: RenderConfig,
        sink: Arc<S>,
    ) -> Result<RenderHandle, RenderError>
    where
        S: FrameSink + Send + 'static,
    {
        let guard = self.begin()?;
        let scheduler = Arc::clone(self);
        let thread = thread::Builder::new()
            .name("mandelbrot-render".to_string())
            .spawn(move || {
                let _guard = guard;
                scheduler.run(config, &*sink)
            })
            .map_err(RenderError::Spawn)?;
        Ok(RenderHandle {
            thread,
            cancel: self.cancel.clone(),
        })
    }

    fn run<S: FrameSink + ?Sized>(
        &self,
        config: RenderConfig,
        sink: &S,
    ) -> Result<RenderSummary, RenderError> {
        let start = Instant::now();
        let viewport = config.viewport;
        let tiles = partition(viewport.width(), viewport.height());
        let total = tiles.len();
        info!(
            "rendering {}x{} at ({}, {}) zoom {} with {} iterations on {} workers",
            viewport.width(),
            viewport.height(),
            viewport.center().re,
            viewport.center().im,
            viewport.zoom(),
            config.max_iterations,
            self.workers
        );

        let queue = Mutex::new(tiles.into_iter());
        let completed = AtomicUsize::new(0);
        let faulted: Mutex<Vec<Tile>> = Mutex::new(vec![]);
        let start_error = sink.on_render_start(&config).err();
        if let Some(ref err) = start_error {
            error!("sink refused to start the render: {}", err);
        }
        let abort = AtomicBool::new(start_error.is_some());
        let sink_error: Mutex<Option<SinkError>> = Mutex::new(start_error);

        let pool = crossbeam::scope(|spawner| {
            for _ in 0..self.workers.min(total) {
                spawner.spawn(|_| loop {
                    if abort.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
                        break;
                    }
                    let tile = match queue.lock() {
                        Ok(mut queue) => queue.next(),
                        Err(poisoned) => poisoned.into_inner().next(),
                    };
                    let tile = match tile {
                        Some(tile) => tile,
                        None => break,
                    };
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        render_tile(&tile, &config, &self.gradient, sink)
                    }));
                    match outcome {
                        Ok(Ok(())) => {
                            completed.fetch_add(1, Ordering::SeqCst);
                            debug!("tile ({}, {}) done", tile.col, tile.row);
                        }
                        Ok(Err(err)) => {
                            error!("tile ({}, {}) write failed: {}", tile.col, tile.row, err);
                            abort.store(true, Ordering::SeqCst);
                            let mut slot = lock_or_recover(&sink_error);
                            if slot.is_none() {
                                *slot = Some(err);
                            }
                        }
                        Err(_) => {
                            error!("tile ({}, {}) faulted and was skipped", tile.col, tile.row);
                            lock_or_recover(&faulted).push(tile);
                        }
                    }
                });
            }
        });
        if pool.is_err() {
            return Err(RenderError::WorkerPanicked);
        }

        let completed = completed.load(Ordering::SeqCst);
        let mut faulted = lock_or_recover(&faulted).clone();
        faulted.sort_by_key(|t| (t.col, t.row));
        let sink_error = lock_or_recover(&sink_error).clone();
        let cancelled = self.cancel.is_cancelled() && completed + faulted.len() < total;
        if cancelled {
            warn!("render cancelled after {} of {} tiles", completed, total);
        }

        let summary = RenderSummary {
            tiles: total,
            completed,
            faulted,
            cancelled,
            sink_error,
            elapsed: start.elapsed(),
        };
        info!(
            "render finished: {}/{} tiles in {:?}",
            summary.completed, summary.tiles, summary.elapsed
        );
        sink.on_render_complete(&summary);

        match summary.sink_error {
            Some(ref err) => Err(RenderError::Sink(err.clone())),
            None => Ok(summary),
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Fills one tile, a column at a time, pushing every column to the sink
/// as soon as it is done.
fn render_tile<S: FrameSink + ?Sized>(
    tile: &Tile,
    config: &RenderConfig,
    gradient: &Gradient,
    sink: &S,
) -> Result<(), SinkError> {
    let mut column = vec![0_u32; tile.height];
    for x in tile.x..tile.x + tile.width {
        for (offset, pixel) in column.iter_mut().enumerate() {
            let point = config.viewport.map(x, tile.y + offset);
            let result = evaluate(point, config.max_iterations);
            *pixel = gradient.color_for_iteration(result, config.max_iterations).packed();
        }
        sink.on_partial_update(&ColumnUpdate {
            tile: *tile,
            x,
            y: tile.y,
            colors: &column,
        })?;
    }
    Ok(())
}

/// Renders with a pair of callbacks instead of a sink: `on_partial`
/// sees every column, `on_complete` sees the summary once.  Blocks
/// until the last tile is done; to return as soon as the work is
/// dispatched, wrap the callbacks in a `CallbackSink` and hand it to
/// `TileScheduler::spawn`.
pub fn render_with<P, C>(
    config: RenderConfig,
    gradient: Arc<Gradient>,
    workers: usize,
    on_partial: P,
    on_complete: C,
) -> Result<RenderSummary, RenderError>
where
    P: Fn(&ColumnUpdate) -> Result<(), SinkError> + Sync,
    C: Fn(&RenderSummary) + Sync,
{
    let sink = CallbackSink::new(on_partial, on_complete);
    TileScheduler::with_workers(gradient, workers).render(config, &sink)
}
