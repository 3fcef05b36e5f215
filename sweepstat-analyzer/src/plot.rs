use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use log::info;

use crate::{AnalysisError, AnalysisResult};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const POINT: Rgb<u8> = Rgb([220, 30, 30]);
const THRESHOLD: Rgb<u8> = Rgb([30, 60, 220]);

/// Подписи и оформление одного графика.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Горизонтальная линия порога
    pub threshold: Option<f64>,
}

/// Рендерер точечных графиков в PNG.
#[derive(Debug, Clone, Copy)]
pub struct PlotRenderer {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub point_radius: u32,
}

impl Default for PlotRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            margin: 48,
            point_radius: 2,
        }
    }
}

impl PlotSpec {
    pub fn new<T: Into<String>, X: Into<String>, Y: Into<String>>(
        title: T,
        x_label: X,
        y_label: Y,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            threshold: None,
        }
    }

    pub fn with_threshold(
        mut self,
        level: f64,
    ) -> Self {
        self.threshold = Some(level);
        self
    }

    /// Имя файла по умолчанию: `<title-slug>.png`.
    pub fn default_file_name(&self) -> String {
        format!("{}.png", slug(&self.title))
    }
}

impl PlotRenderer {
    /// Рисует ряд `(x, y)` и сохраняет PNG.
    ///
    /// Без `path` файл пишется в текущий каталог под
    /// [`PlotSpec::default_file_name`]. Возвращает путь записанного файла.
    pub fn render(
        &self,
        points: &[(f64, f64)],
        spec: &PlotSpec,
        path: Option<&Path>,
    ) -> AnalysisResult<PathBuf> {
        let image = self.draw(points, spec)?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(spec.default_file_name()));

        image.save_with_format(&path, ImageFormat::Png)?;

        info!(
            "{}: {} points ({} vs {}) saved to {}",
            spec.title,
            points.len(),
            spec.y_label,
            spec.x_label,
            path.display()
        );

        Ok(path)
    }

    /// Рисует график в памяти.
    pub fn draw(
        &self,
        points: &[(f64, f64)],
        spec: &PlotSpec,
    ) -> AnalysisResult<RgbImage> {
        let finite: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();

        if finite.is_empty() {
            return Err(AnalysisError::degenerate(format!(
                "{}: nothing to plot",
                spec.title
            )));
        }

        if self.width <= 2 * self.margin || self.height <= 2 * self.margin {
            return Err(AnalysisError::degenerate(format!(
                "plot area {}x{} is smaller than margins",
                self.width, self.height
            )));
        }

        let x_range = Range::of(finite.iter().map(|p| p.0));
        let y_range = Range::of(finite.iter().map(|p| p.1).chain(spec.threshold));

        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let area = self.area();

        // Сетка
        for i in 0..=4 {
            let x = area.left + (area.right - area.left) * i / 4;
            let y = area.top + (area.bottom - area.top) * i / 4;
            vline(&mut img, x, area.top, area.bottom, GRID);
            hline(&mut img, y, area.left, area.right, GRID);
        }

        // Оси
        vline(&mut img, area.left, area.top, area.bottom, AXIS);
        hline(&mut img, area.bottom, area.left, area.right, AXIS);

        for i in 0..=4 {
            let x = area.left + (area.right - area.left) * i / 4;
            let y = area.top + (area.bottom - area.top) * i / 4;
            vline(&mut img, x, area.bottom, area.bottom + 4, AXIS);
            hline(&mut img, y, area.left.saturating_sub(4), area.left, AXIS);
        }

        if let Some(level) = spec.threshold {
            let y = area.y_of(level, &y_range);
            hline(&mut img, y, area.left, area.right, THRESHOLD);
        }

        let r = self.point_radius;

        for (x, y) in finite {
            let px = area.x_of(x, &x_range);
            let py = area.y_of(y, &y_range);

            for dx in px.saturating_sub(r)..=px + r {
                for dy in py.saturating_sub(r)..=py + r {
                    if dx < self.width && dy < self.height {
                        img.put_pixel(dx, dy, POINT);
                    }
                }
            }
        }

        Ok(img)
    }

    fn area(&self) -> Area {
        Area {
            left: self.margin,
            right: self.width - self.margin,
            top: self.margin,
            bottom: self.height - self.margin,
        }
    }
}

/// Диапазон значений по оси; вырожденный расширяется на ±1.
#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of<I: Iterator<Item = f64>>(values: I) -> Self {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

        if max - min > f64::EPSILON * max.abs().max(1.0) {
            Self { min, max }
        } else {
            Self {
                min: min - 1.0,
                max: max + 1.0,
            }
        }
    }

    fn fraction(
        &self,
        v: f64,
    ) -> f64 {
        ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Area {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl Area {
    fn x_of(
        &self,
        v: f64,
        range: &Range,
    ) -> u32 {
        self.left + (range.fraction(v) * (self.right - self.left) as f64).round() as u32
    }

    fn y_of(
        &self,
        v: f64,
        range: &Range,
    ) -> u32 {
        self.bottom - (range.fraction(v) * (self.bottom - self.top) as f64).round() as u32
    }
}

fn hline(
    img: &mut RgbImage,
    y: u32,
    x0: u32,
    x1: u32,
    color: Rgb<u8>,
) {
    for x in x0..=x1.min(img.width() - 1) {
        if y < img.height() {
            img.put_pixel(x, y, color);
        }
    }
}

fn vline(
    img: &mut RgbImage,
    x: u32,
    y0: u32,
    y1: u32,
    color: Rgb<u8>,
) {
    for y in y0..=y1.min(img.height() - 1) {
        if x < img.width() {
            img.put_pixel(x, y, color);
        }
    }
}

/// `Avg 10 frames @ 2433 MHz` → `avg_10_frames_2433_mhz`.
fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }

    let trimmed = out.trim_end_matches('_');

    if trimmed.is_empty() {
        "plot".to_string()
    } else {
        trimmed.to_string()
    }
}
