//! Line + uncertainty-band chart for per-day series.
//!
//! Layout follows the usual figure shape for daily climate series: mean as
//! a solid green line, the mean±std band as a translucent fill, light
//! gridlines at the ticks, title on top, axis labels from the glyph table.

use super::{font, Canvas, Color};
use crate::errors::{ClimaPrepError, Result};
use chrono::NaiveDate;

const WIDTH: usize = 1000;
const HEIGHT: usize = 600;
const MARGIN_LEFT: i64 = 80;
const MARGIN_RIGHT: i64 = 30;
const MARGIN_TOP: i64 = 46;
const MARGIN_BOTTOM: i64 = 60;

const BACKGROUND: Color = [255, 255, 255, 255];
const AXIS: Color = [70, 70, 70, 255];
const GRID: Color = [222, 222, 222, 255];
const LINE: Color = [34, 139, 34, 255];
const TEXT: Color = [35, 35, 35, 255];
const BAND_ALPHA: f32 = 0.3;

/// One time series with its uncertainty bounds and labels
pub struct SeriesChart<'a> {
    /// X positions (days since epoch, or plain step indices)
    pub x: &'a [f64],
    /// Mean value per step
    pub mean: &'a [f32],
    /// Lower bound of the band (mean - std)
    pub lower: &'a [f32],
    /// Upper bound of the band (mean + std)
    pub upper: &'a [f32],
    /// Calendar dates for x tick labels; indices are used when absent
    pub dates: Option<&'a [NaiveDate]>,
    pub title: String,
    pub y_label: String,
    pub x_label: String,
    pub legend_line: String,
    pub legend_band: String,
}

impl<'a> SeriesChart<'a> {
    /// Rasterize the chart and return it as PNG bytes.
    ///
    /// # Errors
    ///
    /// `EmptyInput` when the series is empty or holds no finite value;
    /// `Generic` when the series lengths disagree.
    pub fn render(&self) -> Result<Vec<u8>> {
        let n = self.x.len();
        if n == 0 {
            return Err(ClimaPrepError::EmptyInput(
                "no time steps to plot".to_string(),
            ));
        }
        if self.mean.len() != n || self.lower.len() != n || self.upper.len() != n {
            return Err(ClimaPrepError::Generic(format!(
                "series length mismatch: x={}, mean={}, lower={}, upper={}",
                n,
                self.mean.len(),
                self.lower.len(),
                self.upper.len()
            )));
        }

        let (x_min, x_max) = span(self.x.iter().copied(), 0.5);
        let y_values = self
            .mean
            .iter()
            .chain(self.lower.iter())
            .chain(self.upper.iter())
            .filter(|v| v.is_finite())
            .map(|&v| f64::from(v));
        let (y_min, y_max) = span_checked(y_values).ok_or_else(|| {
            ClimaPrepError::EmptyInput("no finite values to plot".to_string())
        })?;

        let plot_w = WIDTH as i64 - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT as i64 - MARGIN_TOP - MARGIN_BOTTOM;

        let px = |x: f64| -> i64 {
            MARGIN_LEFT + ((x - x_min) / (x_max - x_min) * plot_w as f64).round() as i64
        };
        let py = |v: f64| -> i64 {
            MARGIN_TOP + ((1.0 - (v - y_min) / (y_max - y_min)) * plot_h as f64).round() as i64
        };

        let mut canvas = Canvas::new(WIDTH, HEIGHT, BACKGROUND);

        self.draw_grid_and_ticks(&mut canvas, y_min, y_max, &px, &py);
        self.draw_band(&mut canvas, &px, &py);
        self.draw_mean_line(&mut canvas, &px, &py);
        self.draw_frame_and_labels(&mut canvas);
        self.draw_legend(&mut canvas);

        canvas.encode_png()
    }

    fn draw_grid_and_ticks(
        &self,
        canvas: &mut Canvas,
        y_min: f64,
        y_max: f64,
        px: &dyn Fn(f64) -> i64,
        py: &dyn Fn(f64) -> i64,
    ) {
        let bottom = HEIGHT as i64 - MARGIN_BOTTOM;
        let right = WIDTH as i64 - MARGIN_RIGHT;

        // Horizontal gridlines + y tick labels
        const Y_TICKS: usize = 5;
        for k in 0..=Y_TICKS {
            let value = y_min + (y_max - y_min) * k as f64 / Y_TICKS as f64;
            let y = py(value);
            canvas.draw_line(MARGIN_LEFT, y, right, y, GRID);
            let label = format_tick(value);
            let tx = MARGIN_LEFT - 8 - font::text_width(&label) as i64;
            canvas.draw_text(tx, y - (font::GLYPH_HEIGHT as i64) / 2, &label, TEXT);
        }

        // Vertical gridlines + x tick labels at evenly spaced sample steps
        let n = self.x.len();
        let tick_count = n.min(6);
        for k in 0..tick_count {
            let idx = if tick_count == 1 {
                0
            } else {
                k * (n - 1) / (tick_count - 1)
            };
            let x = px(self.x[idx]);
            canvas.draw_line(x, MARGIN_TOP, x, bottom, GRID);

            let label = match self.dates {
                Some(dates) => dates[idx].format("%Y-%m-%d").to_string(),
                None => format_tick(self.x[idx]),
            };
            let tx = x - (font::text_width(&label) as i64) / 2;
            canvas.draw_text(tx, bottom + 8, &label, TEXT);
        }
    }

    fn draw_band(&self, canvas: &mut Canvas, px: &dyn Fn(f64) -> i64, py: &dyn Fn(f64) -> i64) {
        for i in 0..self.x.len().saturating_sub(1) {
            let (lo0, up0) = (self.lower[i], self.upper[i]);
            let (lo1, up1) = (self.lower[i + 1], self.upper[i + 1]);
            if !(lo0.is_finite() && up0.is_finite() && lo1.is_finite() && up1.is_finite()) {
                continue;
            }

            let (c0, c1) = (px(self.x[i]), px(self.x[i + 1]));
            for col in c0..=c1 {
                let t = if c1 == c0 {
                    0.0
                } else {
                    (col - c0) as f64 / (c1 - c0) as f64
                };
                let lo = f64::from(lo0) + (f64::from(lo1) - f64::from(lo0)) * t;
                let up = f64::from(up0) + (f64::from(up1) - f64::from(up0)) * t;
                let (y_top, y_bot) = (py(up), py(lo));
                for y in y_top..=y_bot {
                    canvas.blend_pixel(col, y, LINE, BAND_ALPHA);
                }
            }
        }
    }

    fn draw_mean_line(
        &self,
        canvas: &mut Canvas,
        px: &dyn Fn(f64) -> i64,
        py: &dyn Fn(f64) -> i64,
    ) {
        for i in 0..self.x.len().saturating_sub(1) {
            let (m0, m1) = (self.mean[i], self.mean[i + 1]);
            if !(m0.is_finite() && m1.is_finite()) {
                continue;
            }
            let (x0, y0) = (px(self.x[i]), py(f64::from(m0)));
            let (x1, y1) = (px(self.x[i + 1]), py(f64::from(m1)));
            // 2px stroke reads better at chart scale
            canvas.draw_line(x0, y0, x1, y1, LINE);
            canvas.draw_line(x0, y0 + 1, x1, y1 + 1, LINE);
        }

        if self.x.len() == 1 && self.mean[0].is_finite() {
            let (x, y) = (px(self.x[0]), py(f64::from(self.mean[0])));
            canvas.fill_rect(x - 2, y - 2, 4, 4, LINE);
        }
    }

    fn draw_frame_and_labels(&self, canvas: &mut Canvas) {
        let bottom = HEIGHT as i64 - MARGIN_BOTTOM;
        let right = WIDTH as i64 - MARGIN_RIGHT;

        canvas.draw_line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom, AXIS);
        canvas.draw_line(MARGIN_LEFT, bottom, right, bottom, AXIS);

        let title_x = (WIDTH as i64 - font::text_width(&self.title) as i64) / 2;
        canvas.draw_text(title_x, 12, &self.title, TEXT);

        canvas.draw_text(10, MARGIN_TOP - 16, &self.y_label, TEXT);

        let xlabel_x = (WIDTH as i64 - font::text_width(&self.x_label) as i64) / 2;
        canvas.draw_text(xlabel_x, HEIGHT as i64 - 18, &self.x_label, TEXT);
    }

    fn draw_legend(&self, canvas: &mut Canvas) {
        let sample_w = 18_i64;
        let entry_w = sample_w
            + 6
            + font::text_width(&self.legend_line).max(font::text_width(&self.legend_band)) as i64;
        let x = WIDTH as i64 - MARGIN_RIGHT - entry_w - 12;
        let mut y = MARGIN_TOP + 10;

        canvas.draw_line(x, y + 3, x + sample_w, y + 3, LINE);
        canvas.draw_line(x, y + 4, x + sample_w, y + 4, LINE);
        canvas.draw_text(x + sample_w + 6, y, &self.legend_line, TEXT);

        y += font::GLYPH_HEIGHT as i64 + 6;
        for yy in 0..font::GLYPH_HEIGHT as i64 {
            for xx in 0..sample_w {
                canvas.blend_pixel(x + xx, y + yy, LINE, BAND_ALPHA);
            }
        }
        canvas.draw_text(x + sample_w + 6, y, &self.legend_band, TEXT);
    }
}

/// Min/max of a sequence, widened by `pad` on each side when degenerate
fn span(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        (min - pad, max + pad)
    } else {
        (min, max)
    }
}

/// As [`span`], returning `None` when the sequence holds no finite value,
/// and padding the range 5% on each side
fn span_checked(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return None;
    }
    if (max - min).abs() < f64::EPSILON {
        return Some((min - 1.0, max + 1.0));
    }
    let pad = (max - min) * 0.05;
    Some((min - pad, max + pad))
}

/// Tick label with precision adapted to magnitude
fn format_tick(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else if value.abs() >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_png_bytes() {
        let x = [0.0, 1.0, 2.0];
        let mean = [1.0_f32, 2.0, 1.5];
        let lower = [0.5_f32, 1.5, 1.0];
        let upper = [1.5_f32, 2.5, 2.0];
        let chart = SeriesChart {
            x: &x,
            mean: &mean,
            lower: &lower,
            upper: &upper,
            dates: None,
            title: "test".to_string(),
            y_label: "value".to_string(),
            x_label: "step".to_string(),
            legend_line: "mean".to_string(),
            legend_band: "band".to_string(),
        };
        let png = chart.render().unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert!(png.len() > 100);
    }

    #[test]
    fn empty_series_is_an_error() {
        let chart = SeriesChart {
            x: &[],
            mean: &[],
            lower: &[],
            upper: &[],
            dates: None,
            title: String::new(),
            y_label: String::new(),
            x_label: String::new(),
            legend_line: String::new(),
            legend_band: String::new(),
        };
        assert!(matches!(
            chart.render(),
            Err(ClimaPrepError::EmptyInput(_))
        ));
    }

    #[test]
    fn all_nan_series_is_an_error() {
        let x = [0.0, 1.0];
        let nan = [f32::NAN, f32::NAN];
        let chart = SeriesChart {
            x: &x,
            mean: &nan,
            lower: &nan,
            upper: &nan,
            dates: None,
            title: String::new(),
            y_label: String::new(),
            x_label: String::new(),
            legend_line: String::new(),
            legend_band: String::new(),
        };
        assert!(chart.render().is_err());
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(1234.4), "1234");
        assert_eq!(format_tick(12.34), "12.3");
        assert_eq!(format_tick(0.1234), "0.123");
    }
}
