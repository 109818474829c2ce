use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tracing::info;

use crate::error::{RunError, RunResult};
use crate::report::glyphs::{glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::train::metric_history::MetricHistory;

/// Renders a run's metric histories to an artifact.
pub trait ResultReporter {
    /// Writes the artifact for `output_path` and returns the path written.
    fn render(&self, history: &MetricHistory, output_path: &Path) -> RunResult<PathBuf>;
}

/// `output_path` with `.png` appended. Labels contain dots (`SNR:8.4`), so
/// the extension is appended rather than substituted.
pub fn png_path(output_path: &Path) -> PathBuf {
    let mut name = OsString::from(output_path.as_os_str());
    name.push(".png");
    PathBuf::from(name)
}

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const LINE: Rgb<u8> = Rgb([31, 119, 180]);

/// Three side-by-side panels (training loss, validation loss, validation
/// SNR), each with axes, one polyline and a title.
#[derive(Debug, Clone, Copy)]
pub struct PngReporter {
    pub panel_width: u32,
    pub panel_height: u32,
}

impl Default for PngReporter {
    fn default() -> Self {
        PngReporter { panel_width: 400, panel_height: 320 }
    }
}

const MARGIN_LEFT: u32 = 24;
const MARGIN_RIGHT: u32 = 12;
const MARGIN_TOP: u32 = 32;
const MARGIN_BOTTOM: u32 = 20;
const TITLE_SCALE: u32 = 2;

impl PngReporter {
    pub fn draw(&self, history: &MetricHistory) -> RgbImage {
        let panels: [(&str, &[f64]); 3] = [
            ("Tr_Losses", history.train_loss()),
            ("Va_Losses", history.val_loss()),
            ("Va_SNRs", history.val_snr()),
        ];

        let mut img = RgbImage::from_pixel(self.panel_width * 3, self.panel_height, WHITE);
        for (i, (title, values)) in panels.iter().enumerate() {
            self.draw_panel(&mut img, i as u32 * self.panel_width, title, values);
        }
        img
    }

    fn draw_panel(&self, img: &mut RgbImage, x0: u32, title: &str, values: &[f64]) {
        let left = x0 + MARGIN_LEFT;
        let right = x0 + self.panel_width.saturating_sub(MARGIN_RIGHT);
        let top = MARGIN_TOP;
        let bottom = self.panel_height.saturating_sub(MARGIN_BOTTOM);

        // Title, centered over the panel.
        let title_width = title.chars().count() as u32 * (GLYPH_WIDTH + 1) * TITLE_SCALE;
        let title_x = x0 + self.panel_width.saturating_sub(title_width) / 2;
        draw_text(img, title_x, (MARGIN_TOP.saturating_sub(GLYPH_HEIGHT * TITLE_SCALE)) / 2, title);

        // Axes.
        draw_line(img, (left as i64, top as i64), (left as i64, bottom as i64), BLACK);
        draw_line(img, (left as i64, bottom as i64), (right as i64, bottom as i64), BLACK);

        let points: Vec<(usize, f64)> = values.iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .collect();
        if points.is_empty() {
            return;
        }

        let (mut lo, mut hi) = points.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
        if hi - lo < f64::EPSILON {
            lo -= 1.0;
            hi += 1.0;
        }

        let width = right.saturating_sub(left) as f64;
        let height = bottom.saturating_sub(top) as f64;
        let span = (values.len().max(2) - 1) as f64;
        let to_pixel = |(i, v): (usize, f64)| -> (i64, i64) {
            let x = left as f64 + width * i as f64 / span;
            let y = bottom as f64 - height * (v - lo) / (hi - lo);
            (x.round() as i64, y.round() as i64)
        };

        let pixels: Vec<(i64, i64)> = points.into_iter().map(to_pixel).collect();
        if let [only] = pixels.as_slice() {
            draw_line(img, *only, *only, LINE);
        }
        for pair in pixels.windows(2) {
            draw_line(img, pair[0], pair[1], LINE);
        }
    }
}

impl ResultReporter for PngReporter {
    fn render(&self, history: &MetricHistory, output_path: &Path) -> RunResult<PathBuf> {
        if self.panel_width <= MARGIN_LEFT + MARGIN_RIGHT || self.panel_height <= MARGIN_TOP + MARGIN_BOTTOM {
            return Err(RunError::Report(format!(
                "panel {}x{} leaves no room to plot",
                self.panel_width, self.panel_height
            )));
        }

        let path = png_path(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.draw(history).save(&path)?;
        info!(path = %path.display(), epochs = history.len(), "result plot written");
        Ok(path)
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str) {
    for (n, c) in text.chars().enumerate() {
        let cx = x + n as u32 * (GLYPH_WIDTH + 1) * TITLE_SCALE;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for sy in 0..TITLE_SCALE {
                    for sx in 0..TITLE_SCALE {
                        put(
                            img,
                            (cx + col * TITLE_SCALE + sx) as i64,
                            (y + row as u32 * TITLE_SCALE + sy) as i64,
                            BLACK,
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::epoch_stats::EpochStats;
    use tempfile::TempDir;

    fn history() -> MetricHistory {
        let mut history = MetricHistory::new();
        for epoch in 1..=5 {
            history.record(&EpochStats {
                epoch,
                total_epochs: 5,
                train_loss: 1.0 / epoch as f64,
                val_loss: 1.5 / epoch as f64,
                val_snr: epoch as f64 * 1.7,
                elapsed_ms: 1,
            });
        }
        history
    }

    #[test]
    fn test_png_path_appends_extension_after_dotted_label() {
        let path = png_path(Path::new("Saved_Results/10.16(14:05)_lr:0.001_SNR:8.4"));
        assert_eq!(path, PathBuf::from("Saved_Results/10.16(14:05)_lr:0.001_SNR:8.4.png"));
    }

    #[test]
    fn test_render_writes_three_panel_png() {
        let temp = TempDir::new().unwrap();
        let reporter = PngReporter::default();
        let written = reporter.render(&history(), &temp.path().join("results").join("run_SNR:8.5")).unwrap();

        assert!(written.ends_with("run_SNR:8.5.png"));
        let img = image::open(&written).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (reporter.panel_width * 3, reporter.panel_height));
        assert!(img.pixels().any(|p| *p == LINE));
    }

    #[test]
    fn test_render_rejects_degenerate_panels() {
        let temp = TempDir::new().unwrap();
        let reporter = PngReporter { panel_width: 10, panel_height: 10 };
        let err = reporter.render(&history(), &temp.path().join("run")).err().unwrap();
        assert!(matches!(err, RunError::Report(_)));
    }

    #[test]
    fn test_render_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("run");
        std::fs::write(png_path(&target), b"stale").unwrap();

        let written = PngReporter::default().render(&MetricHistory::new(), &target).unwrap();
        assert!(image::open(&written).is_ok());
    }
}
