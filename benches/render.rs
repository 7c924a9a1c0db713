#[macro_use]
extern crate criterion;

use criterion::Criterion;
use mandelbrot::{evaluate, Gradient, PixelSurface, RenderConfig, TileScheduler, Viewport};
use num::Complex;
use std::sync::Arc;

fn escape_time(c: &mut Criterion) {
    c.bench_function("evaluate seahorse point", |b| {
        b.iter(|| evaluate(Complex::new(-0.745_428, 0.113_009), 1000))
    });
}

fn tiled_render(c: &mut Criterion) {
    let viewport = Viewport::with_defaults(256, 256).unwrap();
    let config = RenderConfig::new(viewport, 1000).unwrap();
    let scheduler = TileScheduler::new(Arc::new(Gradient::spectrum()));
    let surface = PixelSurface::new(256, 256);
    c.bench_function("render 256x256 default view", move |b| {
        b.iter(|| scheduler.render(config, &surface).unwrap())
    });
}

criterion_group!(benches, escape_time, tiled_render);
criterion_main!(benches);
