//! Contains the Viewport struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a square window onto the complex plane described by its center
//! and its span (the "zoom").
use num::Complex;

use crate::errors::ViewportError;

/// Default real part of the viewport center: a spiral in the seahorse
/// valley.
pub const DEFAULT_CENTER_X: f64 = -0.745_428;
/// Default imaginary part of the viewport center.
pub const DEFAULT_CENTER_Y: f64 = 0.113_009;
/// Default span of the viewport on the complex plane.
pub const DEFAULT_ZOOM: f64 = 3.0e-5;
/// Default iteration budget per point.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// An immutable snapshot of the window being rendered.  The same span
/// is used on both axes, so a non-square image stretches the plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    center: Complex<f64>,
    zoom: f64,
    width: usize,
    height: usize,
}

impl Viewport {
    /// Constructor.  Takes the center of the window on the complex
    /// plane, the span of the window, and the size of the integral
    /// plane it is mapped onto.
    pub fn new(
        center_x: f64,
        center_y: f64,
        zoom: f64,
        width: usize,
        height: usize,
    ) -> Result<Viewport, ViewportError> {
        if !center_x.is_finite() || !center_y.is_finite() {
            return Err(ViewportError::BadCenter(center_x, center_y));
        }
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ViewportError::BadZoom(zoom));
        }
        if width == 0 || height == 0 {
            return Err(ViewportError::EmptyImage(width, height));
        }
        Ok(Viewport {
            center: Complex::new(center_x, center_y),
            zoom,
            width,
            height,
        })
    }

    /// The default seahorse-valley window at the given resolution.
    pub fn with_defaults(width: usize, height: usize) -> Result<Viewport, ViewportError> {
        Viewport::new(DEFAULT_CENTER_X, DEFAULT_CENTER_Y, DEFAULT_ZOOM, width, height)
    }

    /// Center of the window.
    pub fn center(&self) -> Complex<f64> {
        self.center
    }

    /// Span of the window on both axes.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Width of the integral plane.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the integral plane.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The corner that pixel 0,0 maps onto.
    pub fn origin(&self) -> Complex<f64> {
        Complex::new(
            self.center.re - self.zoom / 2.0,
            self.center.im - self.zoom / 2.0,
        )
    }

    /// How much of the complex plane a single pixel covers, per axis.
    pub fn pixel_span(&self) -> (f64, f64) {
        (
            self.zoom / (self.width as f64),
            self.zoom / (self.height as f64),
        )
    }

    /// Given the column and row of a pixel on the integral cartesian
    /// plane, return the complex number at the equivalent location.
    /// Pixels outside the image are not rejected; they simply map
    /// outside the window.
    pub fn map(&self, px: usize, py: usize) -> Complex<f64> {
        let origin = self.origin();
        Complex::new(
            origin.re + (px as f64) / (self.width as f64) * self.zoom,
            origin.im + (py as f64) / (self.height as f64) * self.zoom,
        )
    }
}

/// One render invocation: a viewport snapshot plus its iteration
/// budget.  Passed by value into the scheduler.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// The window being rendered.
    pub viewport: Viewport,
    /// Iterations allowed before a point is declared interior.
    pub max_iterations: usize,
}

impl RenderConfig {
    /// Pairs a viewport with an iteration budget, rejecting a zero budget.
    pub fn new(viewport: Viewport, max_iterations: usize) -> Result<RenderConfig, ViewportError> {
        if max_iterations == 0 {
            return Err(ViewportError::NoIterations);
        }
        Ok(RenderConfig {
            viewport,
            max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_fails_on_bad_zoom() {
        assert_eq!(
            Viewport::new(0.0, 0.0, 0.0, 4, 4),
            Err(ViewportError::BadZoom(0.0))
        );
        assert!(Viewport::new(0.0, 0.0, -1.0, 4, 4).is_err());
        assert!(Viewport::new(0.0, 0.0, std::f64::NAN, 4, 4).is_err());
    }

    #[test]
    fn viewport_fails_on_empty_image() {
        assert_eq!(
            Viewport::new(0.0, 0.0, 1.0, 0, 4),
            Err(ViewportError::EmptyImage(0, 4))
        );
        assert!(Viewport::new(0.0, 0.0, 1.0, 4, 0).is_err());
    }

    #[test]
    fn viewport_fails_on_infinite_center() {
        assert!(Viewport::new(std::f64::INFINITY, 0.0, 1.0, 4, 4).is_err());
    }

    #[test]
    fn render_config_needs_iterations() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 4, 4).unwrap();
        assert_eq!(RenderConfig::new(vp, 0), Err(ViewportError::NoIterations));
        assert!(RenderConfig::new(vp, 1).is_ok());
    }

    #[test]
    fn first_pixel_maps_to_origin_exactly() {
        let vp = Viewport::with_defaults(640, 480).unwrap();
        let p = vp.map(0, 0);
        assert_eq!(p.re, DEFAULT_CENTER_X - DEFAULT_ZOOM / 2.0);
        assert_eq!(p.im, DEFAULT_CENTER_Y - DEFAULT_ZOOM / 2.0);
    }

    #[test]
    fn map_on_positive_planes() {
        let vp = Viewport::new(2.5, 2.5, 5.0, 5, 5).unwrap();
        assert_eq!(vp.map(0, 0), Complex::new(0.0, 0.0));
        assert_eq!(vp.map(2, 2), Complex::new(2.0, 2.0));
        assert_eq!(vp.map(4, 4), Complex::new(4.0, 4.0));
    }

    #[test]
    fn map_on_mixed_planes() {
        let vp = Viewport::new(0.0, 0.0, 4.0, 4, 4).unwrap();
        assert_eq!(vp.map(2, 2), Complex::new(0.0, 0.0));
        assert_eq!(vp.map(0, 0), Complex::new(-2.0, -2.0));
        assert_eq!(vp.map(3, 1), Complex::new(1.0, -1.0));
    }

    #[test]
    fn map_is_affine_and_monotonic() {
        let vp = Viewport::new(-0.5, 0.0, 3.0, 100, 60).unwrap();
        let (dx, dy) = vp.pixel_span();
        for px in 1..100 {
            let (a, b) = (vp.map(px - 1, 7), vp.map(px, 7));
            assert!(b.re > a.re);
            assert_eq!(a.im, b.im);
            assert!((b.re - a.re - dx).abs() < 1e-12);
        }
        for py in 1..60 {
            let (a, b) = (vp.map(3, py - 1), vp.map(3, py));
            assert!(b.im > a.im);
            assert_eq!(a.re, b.re);
            assert!((b.im - a.im - dy).abs() < 1e-12);
        }
    }
}
