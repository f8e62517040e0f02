//! Pixel-heuristic photo-quality scorer
//!
//! A cheap luminance-based stand-in for a real quality model, kept behind
//! the `QualityScorer` strategy trait so one can be substituted without
//! touching callers.

use std::path::Path;

use image::GrayImage;

use kizu_domain::{QualityBreakdown, QualityScorer, SUBCHECK_BUDGET};
use kizu_types::{CameraSlot, Result};

/// Laplacian variance that reads as fully crisp on 8-bit luma
const SHARPNESS_FULL_SCALE: f64 = 300.0;

/// Fraction of total edge energy inside the center window that earns full
/// framing marks
const FRAMING_FULL_SCALE: f64 = 0.6;

/// Luminance-statistics quality scorer
pub struct LumaQualityScorer;

impl QualityScorer for LumaQualityScorer {
    fn score(&self, image_path: &Path, expected: CameraSlot) -> Result<QualityBreakdown> {
        let gray = image::open(image_path)?.to_luma8();
        let (width, height) = gray.dimensions();

        // Exterior slots are shot in landscape; a portrait frame almost
        // always means the wrong angle or a cropped vehicle
        let angle_ok = !expected.is_exterior() || width >= height;

        Ok(QualityBreakdown {
            angle_ok,
            framing: score_framing(&gray),
            lighting: score_lighting(&gray),
            sharpness: score_sharpness(&gray),
        })
    }
}

/// Mean luminance near mid-gray scores best; crushed blacks or blown
/// highlights lose points linearly
fn score_lighting(gray: &GrayImage) -> u8 {
    let pixels = (gray.width() as u64 * gray.height() as u64).max(1);
    let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
    let mean = sum as f64 / pixels as f64;

    let deviation = (mean - 128.0).abs() / 128.0;
    (SUBCHECK_BUDGET as f64 * (1.0 - deviation)).round().clamp(0.0, 25.0) as u8
}

/// Variance of the 4-neighbour Laplacian, sampled on an interior grid
fn score_sharpness(gray: &GrayImage) -> u8 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0;
    }

    let step_x = (width / 64).max(1);
    let step_y = (height / 64).max(1);

    let mut sum_sq = 0.0f64;
    let mut count = 0u64;
    let mut y = 1;
    while y < height - 1 {
        let mut x = 1;
        while x < width - 1 {
            let center = gray.get_pixel(x, y).0[0] as f64;
            let up = gray.get_pixel(x, y - 1).0[0] as f64;
            let down = gray.get_pixel(x, y + 1).0[0] as f64;
            let left = gray.get_pixel(x - 1, y).0[0] as f64;
            let right = gray.get_pixel(x + 1, y).0[0] as f64;
            let laplacian = 4.0 * center - up - down - left - right;
            sum_sq += laplacian * laplacian;
            count += 1;
            x += step_x;
        }
        y += step_y;
    }

    let variance = sum_sq / count.max(1) as f64;
    ((variance / SHARPNESS_FULL_SCALE).min(1.0) * SUBCHECK_BUDGET as f64).round() as u8
}

/// Share of edge energy inside the central window; a centered subject
/// concentrates its contours there
fn score_framing(gray: &GrayImage) -> u8 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0;
    }

    let x_lo = width / 5;
    let x_hi = width - width / 5;
    let y_lo = height / 5;
    let y_hi = height - height / 5;

    let step_x = (width / 64).max(1);
    let step_y = (height / 64).max(1);

    let mut total = 0.0f64;
    let mut center = 0.0f64;
    let mut y = 1;
    while y < height - 1 {
        let mut x = 1;
        while x < width - 1 {
            let here = gray.get_pixel(x, y).0[0] as f64;
            let right = gray.get_pixel(x + 1, y).0[0] as f64;
            let down = gray.get_pixel(x, y + 1).0[0] as f64;
            let gradient = (here - right).abs() + (here - down).abs();
            total += gradient;
            if x >= x_lo && x < x_hi && y >= y_lo && y < y_hi {
                center += gradient;
            }
            x += step_x;
        }
        y += step_y;
    }

    if total <= f64::EPSILON {
        return 0;
    }

    let ratio = center / total;
    ((ratio / FRAMING_FULL_SCALE).min(1.0) * SUBCHECK_BUDGET as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn save_image(dir: &TempDir, name: &str, img: GrayImage) -> PathBuf {
        let path = dir.path().join(name);
        img.save(&path).expect("save test image");
        path
    }

    fn flat(width: u32, height: u32, value: u8) -> GrayImage {
        ImageBuffer::from_pixel(width, height, Luma([value]))
    }

    fn checkerboard(width: u32, height: u32, block: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            if ((x / block) + (y / block)) % 2 == 0 {
                Luma([230u8])
            } else {
                Luma([25u8])
            }
        })
    }

    /// Bright centered blob on a plain background
    fn centered_subject(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let cx = width as i64 / 2;
            let cy = height as i64 / 2;
            let dx = (x as i64 - cx).abs();
            let dy = (y as i64 - cy).abs();
            if dx < width as i64 / 5 && dy < height as i64 / 5 {
                Luma([(200 - ((dx + dy) % 60)) as u8])
            } else {
                Luma([120u8])
            }
        })
    }

    #[test]
    fn test_flat_midgray_scores_bright_but_blurry() {
        let dir = TempDir::new().expect("tempdir");
        let path = save_image(&dir, "flat.png", flat(256, 192, 128));

        let breakdown = LumaQualityScorer
            .score(&path, CameraSlot::Front)
            .expect("score");
        assert!(breakdown.angle_ok);
        assert_eq!(breakdown.lighting, 25);
        assert_eq!(breakdown.sharpness, 0);
        assert_eq!(breakdown.framing, 0);
        assert!(!breakdown.accepted());
    }

    #[test]
    fn test_dark_image_loses_lighting_points() {
        let dir = TempDir::new().expect("tempdir");
        let dark = save_image(&dir, "dark.png", flat(256, 192, 10));
        let bright = save_image(&dir, "bright.png", flat(256, 192, 128));

        let dark_score = LumaQualityScorer
            .score(&dark, CameraSlot::Front)
            .expect("score");
        let bright_score = LumaQualityScorer
            .score(&bright, CameraSlot::Front)
            .expect("score");
        assert!(dark_score.lighting < bright_score.lighting);
        assert!(dark_score.lighting < 10);
    }

    #[test]
    fn test_high_contrast_detail_scores_sharp() {
        let dir = TempDir::new().expect("tempdir");
        let crisp = save_image(&dir, "crisp.png", checkerboard(256, 192, 8));
        let blurry = save_image(&dir, "blurry.png", flat(256, 192, 128));

        let crisp_score = LumaQualityScorer
            .score(&crisp, CameraSlot::Front)
            .expect("score");
        let blurry_score = LumaQualityScorer
            .score(&blurry, CameraSlot::Front)
            .expect("score");
        assert!(crisp_score.sharpness > blurry_score.sharpness);
        assert!(crisp_score.sharpness >= 20);
    }

    #[test]
    fn test_centered_subject_scores_framing() {
        let dir = TempDir::new().expect("tempdir");
        let centered = save_image(&dir, "centered.png", centered_subject(256, 192));

        let breakdown = LumaQualityScorer
            .score(&centered, CameraSlot::Front)
            .expect("score");
        assert!(breakdown.framing >= 15);
    }

    #[test]
    fn test_portrait_exterior_fails_angle_gate() {
        let dir = TempDir::new().expect("tempdir");
        let portrait = save_image(&dir, "portrait.png", checkerboard(192, 256, 8));

        let exterior = LumaQualityScorer
            .score(&portrait, CameraSlot::Front)
            .expect("score");
        assert!(!exterior.angle_ok);
        assert!(!exterior.accepted());

        let interior = LumaQualityScorer
            .score(&portrait, CameraSlot::Dashboard)
            .expect("score");
        assert!(interior.angle_ok);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(LumaQualityScorer
            .score(Path::new("/nonexistent.png"), CameraSlot::Front)
            .is_err());
    }
}
