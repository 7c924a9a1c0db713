// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use log::info;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use mandelbrot::export::write_image;
use mandelbrot::planes::{DEFAULT_CENTER_X, DEFAULT_CENTER_Y, DEFAULT_MAX_ITERATIONS, DEFAULT_ZOOM};
use mandelbrot::tiles::DEFAULT_WORKERS;
use mandelbrot::{Gradient, PixelSurface, RenderConfig, TileScheduler, Viewport};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";

fn args<'a>(
    default_center: &'a str,
    default_zoom: &'a str,
    default_iterations: &'a str,
    default_threads: &'a str,
) -> ArgMatches<'a> {
    let max_threads = num_cpus::get().max(DEFAULT_WORKERS);

    App::new("mandelbrot")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Tile-parallel Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (.png, or .ppm for a binary pixmap)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024x1024")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value(default_center)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Center of the view on the complex plane"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value(default_zoom)
                .validator(|s| match f64::from_str(&s) {
                    Ok(z) if z > 0.0 && z.is_finite() => Ok(()),
                    _ => Err("Zoom must be a positive number".to_string()),
                })
                .help("Width of the view on the complex plane"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(default_threads)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value(default_iterations)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum iterations per point"),
        )
        .get_matches()
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let default_center = format!("{},{}", DEFAULT_CENTER_X, DEFAULT_CENTER_Y);
    let default_zoom = DEFAULT_ZOOM.to_string();
    let default_iterations = DEFAULT_MAX_ITERATIONS.to_string();
    let default_threads = DEFAULT_WORKERS.to_string();
    let matches = args(
        &default_center,
        &default_zoom,
        &default_iterations,
        &default_threads,
    );

    // The validators have already vetted every value below.
    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE).unwrap_or_default(), 'x')
        .unwrap_or_else(|| fail("Error parsing image dimensions"));
    let (center_x, center_y) = parse_pair::<f64>(matches.value_of(CENTER).unwrap_or_default(), ',')
        .unwrap_or_else(|| fail("Error parsing center point"));
    let zoom = f64::from_str(matches.value_of(ZOOM).unwrap_or_default())
        .unwrap_or_else(|_| fail("Error parsing zoom"));
    let threads = usize::from_str(matches.value_of(THREADS).unwrap_or_default())
        .unwrap_or_else(|_| fail("Could not parse thread count."));
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap_or_default())
        .unwrap_or_else(|_| fail("Could not parse iteration count."));
    let output = matches.value_of(OUTPUT).unwrap_or_default().to_string();

    let config = Viewport::new(center_x, center_y, zoom, width, height)
        .and_then(|viewport| RenderConfig::new(viewport, iterations))
        .unwrap_or_else(|e| fail(&format!("Bad view: {}", e)));

    let surface = Arc::new(PixelSurface::new(width, height));
    let scheduler = Arc::new(TileScheduler::with_workers(
        Arc::new(Gradient::spectrum()),
        threads,
    ));

    let handle = scheduler
        .spawn(config, surface.clone())
        .unwrap_or_else(|e| fail(&format!("Render failure: {}", e)));
    info!("render dispatched on {} of {} cpus", threads, num_cpus::get());

    match handle.join() {
        Err(e) => fail(&format!("Render failure: {}", e)),
        Ok(summary) => {
            if !summary.faulted.is_empty() {
                eprintln!(
                    "Warning: {} tiles failed and were left black",
                    summary.faulted.len()
                );
            }
        }
    }

    if let Err(e) = write_image(Path::new(&output), &surface) {
        fail(&format!("Could not save {}: {}", output, e));
    }
    info!("wrote {}", output);
}
