//! Resize policy: choose one resize mode from configuration, then apply it.
//!
//! Selection is evaluated once per run; every page task carries the same
//! [`ResizeSpec`]. Precedence is fixed:
//!
//! | # | Condition                   | Mode                  |
//! |---|-----------------------------|-----------------------|
//! | 1 | `scale ≠ 100`               | `ByPercent(scale)`    |
//! | 2 | `width ≠ 0 && height ≠ 0`   | `ByExactDimensions`   |
//! | 3 | `width ≠ 0`                 | `ByWidth` (keeps aspect)  |
//! | 4 | `height ≠ 0`                | `ByHeight` (keeps aspect) |
//! | 5 | otherwise                   | `None`                |

use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The resize applied to every page of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ResizeSpec {
    /// Keep the extracted page's native dimensions.
    #[default]
    None,
    /// Scale both axes by a percentage (never 100).
    ByPercent(f64),
    /// Stretch to exactly these dimensions.
    ByExactDimensions { width: u32, height: u32 },
    /// Fit to this width, preserving aspect ratio.
    ByWidth(u32),
    /// Fit to this height, preserving aspect ratio.
    ByHeight(u32),
}

/// Result of [`select_resize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSelection {
    pub spec: ResizeSpec,
    /// True when `scale` overrode an explicitly set width and/or height.
    /// Callers surface this as a non-fatal warning.
    pub dimensions_ignored: bool,
}

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("resize of a {src_width}x{src_height} image to {width}x{height} is not representable")]
    InvalidDimensions {
        src_width: u32,
        src_height: u32,
        width: f64,
        height: f64,
    },

    #[error("resize to {width}x{height} exceeds the budget of {max_pixels} pixels")]
    OverBudget {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

/// Pick the resize mode from the run configuration. Pure.
pub fn select_resize(scale: f64, width: u32, height: u32) -> ResizeSelection {
    if (scale - 100.0).abs() > f64::EPSILON {
        return ResizeSelection {
            spec: ResizeSpec::ByPercent(scale),
            dimensions_ignored: width != 0 || height != 0,
        };
    }

    let spec = match (width, height) {
        (0, 0) => ResizeSpec::None,
        (w, 0) => ResizeSpec::ByWidth(w),
        (0, h) => ResizeSpec::ByHeight(h),
        (w, h) => ResizeSpec::ByExactDimensions {
            width: w,
            height: h,
        },
    };

    ResizeSelection {
        spec,
        dimensions_ignored: false,
    }
}

/// Target dimensions for an image of `src_width` × `src_height` under `spec`.
///
/// Aspect-preserving modes round the derived side to the nearest pixel.
/// Targets whose area exceeds `max_pixels` are rejected before anything is
/// allocated.
pub fn target_dimensions(
    spec: &ResizeSpec,
    src_width: u32,
    src_height: u32,
    max_pixels: u64,
) -> Result<(u32, u32), ResizeError> {
    let (sw, sh) = (f64::from(src_width), f64::from(src_height));
    let (w, h) = match *spec {
        ResizeSpec::None => return Ok((src_width, src_height)),
        ResizeSpec::ByPercent(p) => ((sw * p / 100.0).round(), (sh * p / 100.0).round()),
        ResizeSpec::ByExactDimensions { width, height } => (f64::from(width), f64::from(height)),
        ResizeSpec::ByWidth(width) => {
            let width = f64::from(width);
            (width, (sh * width / sw).round().max(1.0))
        }
        ResizeSpec::ByHeight(height) => {
            let height = f64::from(height);
            ((sw * height / sh).round().max(1.0), height)
        }
    };

    let representable = |v: f64| v.is_finite() && v >= 1.0 && v <= f64::from(u32::MAX);
    if !representable(w) || !representable(h) {
        return Err(ResizeError::InvalidDimensions {
            src_width,
            src_height,
            width: w,
            height: h,
        });
    }

    let (w, h) = (w as u32, h as u32);
    if u64::from(w) * u64::from(h) > max_pixels {
        return Err(ResizeError::OverBudget {
            width: w,
            height: h,
            max_pixels,
        });
    }

    Ok((w, h))
}

/// Apply `spec` to `image`. `ResizeSpec::None` returns the image untouched.
pub fn apply_resize(
    image: DynamicImage,
    spec: &ResizeSpec,
    max_pixels: u64,
) -> Result<DynamicImage, ResizeError> {
    let (width, height) = target_dimensions(spec, image.width(), image.height(), max_pixels)?;
    if (width, height) == (image.width(), image.height()) {
        return Ok(image);
    }
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_PIXELS;
    use image::{Rgba, RgbaImage};

    const BUDGET: u64 = DEFAULT_MAX_PIXELS;

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn scale_takes_priority_over_dimensions() {
        let sel = select_resize(50.0, 100, 100);
        assert_eq!(sel.spec, ResizeSpec::ByPercent(50.0));
        assert!(sel.dimensions_ignored);
    }

    #[test]
    fn scale_without_dimensions_does_not_warn() {
        let sel = select_resize(200.0, 0, 0);
        assert_eq!(sel.spec, ResizeSpec::ByPercent(200.0));
        assert!(!sel.dimensions_ignored);
    }

    #[test]
    fn precedence_without_scale() {
        assert_eq!(
            select_resize(100.0, 300, 200).spec,
            ResizeSpec::ByExactDimensions {
                width: 300,
                height: 200
            }
        );
        assert_eq!(select_resize(100.0, 300, 0).spec, ResizeSpec::ByWidth(300));
        assert_eq!(select_resize(100.0, 0, 200).spec, ResizeSpec::ByHeight(200));
        assert_eq!(select_resize(100.0, 0, 0).spec, ResizeSpec::None);
    }

    #[test]
    fn percent_dimensions() {
        assert_eq!(
            target_dimensions(&ResizeSpec::ByPercent(50.0), 1240, 1754, BUDGET).unwrap(),
            (620, 877)
        );
    }

    #[test]
    fn width_preserves_aspect_ratio() {
        // 612x792 → width 300: height = round(792 * 300 / 612) = round(388.23) = 388
        assert_eq!(
            target_dimensions(&ResizeSpec::ByWidth(300), 612, 792, BUDGET).unwrap(),
            (300, 388)
        );
    }

    #[test]
    fn height_preserves_aspect_ratio() {
        assert_eq!(
            target_dimensions(&ResizeSpec::ByHeight(100), 400, 200, BUDGET).unwrap(),
            (200, 100)
        );
    }

    #[test]
    fn vanishing_percent_is_rejected() {
        let err = target_dimensions(&ResizeSpec::ByPercent(0.1), 100, 100, BUDGET).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidDimensions { .. }));
    }

    #[test]
    fn negative_percent_is_rejected() {
        assert!(target_dimensions(&ResizeSpec::ByPercent(-50.0), 100, 100, BUDGET).is_err());
    }

    #[test]
    fn apply_resizes_pixels() {
        let out = apply_resize(blank(40, 20), &ResizeSpec::ByWidth(10), BUDGET).unwrap();
        assert_eq!((out.width(), out.height()), (10, 5));

        let out = apply_resize(
            blank(40, 20),
            &ResizeSpec::ByExactDimensions {
                width: 7,
                height: 9,
            },
            BUDGET,
        )
        .unwrap();
        assert_eq!((out.width(), out.height()), (7, 9));
    }

    #[test]
    fn none_is_a_no_op() {
        let out = apply_resize(blank(13, 17), &ResizeSpec::None, BUDGET).unwrap();
        assert_eq!((out.width(), out.height()), (13, 17));
    }

    #[test]
    fn oversized_target_is_rejected_before_allocating() {
        let spec = ResizeSpec::ByExactDimensions {
            width: 1_000_000,
            height: 1_000_000,
        };
        let err = target_dimensions(&spec, 4, 4, BUDGET).unwrap_err();
        assert!(matches!(err, ResizeError::OverBudget { .. }), "{err}");

        let err = apply_resize(blank(4, 4), &ResizeSpec::ByPercent(1000.0), 100).unwrap_err();
        assert!(matches!(
            err,
            ResizeError::OverBudget {
                width: 40,
                height: 40,
                max_pixels: 100
            }
        ));
    }

    #[test]
    fn budget_is_inclusive() {
        assert_eq!(
            target_dimensions(&ResizeSpec::ByWidth(10), 10, 10, 100).unwrap(),
            (10, 10)
        );
    }
}
