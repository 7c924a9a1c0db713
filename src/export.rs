// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writes a finished surface to disk.  PNG by default; binary PPM when
//! the file name ends in `.ppm` or `.pnm`.

use image::png::PNGEncoder;
use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::ExportError;
use crate::surface::PixelSurface;

fn is_pnm(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case("ppm") || ext.eq_ignore_ascii_case("pnm"),
        None => false,
    }
}

/// Encodes `pixels` (tightly packed RGB bytes) and writes them to
/// `path`.  Any I/O failure is returned to the caller as is.
pub fn write_rgb(path: &Path, pixels: &[u8], bounds: (usize, usize)) -> Result<(), ExportError> {
    let expected = bounds.0 * bounds.1 * 3;
    if pixels.len() != expected {
        return Err(ExportError::SurfaceIncomplete(pixels.len() / 3, bounds.0 * bounds.1));
    }
    let mut output = BufWriter::new(File::create(path)?);
    if is_pnm(path) {
        let mut encoder =
            PNMEncoder::new(&mut output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
        encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::RGB(8))?;
    } else {
        let encoder = PNGEncoder::new(&mut output);
        encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::RGB(8))?;
    }
    output.flush()?;
    Ok(())
}

/// Writes the whole surface to `path`.
pub fn write_image(path: &Path, surface: &PixelSurface) -> Result<(), ExportError> {
    let pixels = surface.to_rgb_bytes()?;
    write_rgb(path, &pixels, (surface.width(), surface.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SinkError;
    use std::fs;
    use tempfile::tempdir;

    fn checkerboard() -> PixelSurface {
        let s = PixelSurface::new(4, 2);
        for x in 0..4 {
            s.write_column(x, 0, &[0x00ff_0000, 0x0000_00ff]).unwrap();
        }
        s
    }

    #[test]
    fn writes_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_image(&path, &checkerboard()).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn writes_binary_ppm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.ppm");
        write_image(&path, &checkerboard()).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"P6");
        assert_eq!(&bytes[bytes.len() - 3..], &[0, 0, 255]);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");
        match write_image(&path, &checkerboard()) {
            Err(ExportError::Io(_)) => (),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn poisoned_surface_keeps_its_cause() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        let surface = checkerboard();
        surface.poison();
        match write_image(&path, &surface) {
            Err(ExportError::Surface(SinkError::Poisoned)) => (),
            other => panic!("expected a poisoned surface, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn short_buffers_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        match write_rgb(&path, &[0; 6], (2, 2)) {
            Err(ExportError::SurfaceIncomplete(2, 4)) => (),
            other => panic!("expected an incomplete surface, got {:?}", other),
        }
    }
}
