//! Line chart of per-day nutrient totals.
//!
//! Drawing goes through the [`Canvas`] trait; [`SvgCanvas`] renders to a
//! standalone SVG document.

use std::fmt::Write;

use crate::models::AggregatedDay;
use crate::settings::Settings;

/// Series with more points than this never get value labels.
pub const MAX_LABELLED_POINTS: usize = 30;

const PAD_LEFT: f64 = 40.0;
const PAD_RIGHT: f64 = 10.0;
const PAD_TOP: f64 = 10.0;
const PAD_BOTTOM: f64 = 24.0;
const GRID_DIVISIONS: u32 = 4;
const POINT_RADIUS: f64 = 3.0;
const LINE_WIDTH: f64 = 2.0;
const VALUE_FONT_PX: f64 = 11.0;
const AXIS_FONT_PX: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
}

/// Minimal 2D drawing surface.
pub trait Canvas {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn clear(&mut self, background: &str);
    fn line(&mut self, from: Point, to: Point, color: &str, width: f64);
    fn polyline(&mut self, points: &[Point], color: &str, width: f64);
    fn circle(&mut self, center: Point, radius: f64, color: &str);
    fn text(&mut self, text: &str, at: Point, size_px: f64, color: &str, anchor: TextAnchor);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: String,
    pub border: String,
    pub foreground: String,
    pub muted: String,
    pub kcal: String,
    pub protein: String,
    pub fat: String,
    pub carb: String,
}

impl Palette {
    #[must_use]
    pub fn light() -> Self {
        Self {
            background: "#ffffff".into(),
            border: "#e5e7eb".into(),
            foreground: "#111827".into(),
            muted: "#6b7280".into(),
            kcal: "#ef4444".into(),
            protein: "#3b82f6".into(),
            fat: "#f59e0b".into(),
            carb: "#10b981".into(),
        }
    }

    #[must_use]
    pub fn dark() -> Self {
        Self {
            background: "#111827".into(),
            border: "#374151".into(),
            foreground: "#f9fafb".into(),
            muted: "#9ca3af".into(),
            kcal: "#f87171".into(),
            protein: "#60a5fa".into(),
            fat: "#fbbf24".into(),
            carb: "#34d399".into(),
        }
    }

    #[must_use]
    pub fn for_settings(settings: &Settings) -> Self {
        if settings.dark_theme {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesVisibility {
    pub kcal: bool,
    pub protein: bool,
    pub fat: bool,
    pub carb: bool,
}

impl Default for SeriesVisibility {
    fn default() -> Self {
        Self {
            kcal: true,
            protein: true,
            fat: true,
            carb: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartOptions {
    pub visible: SeriesVisibility,
    pub show_values: bool,
}

/// Largest value among the visible series, never below 1.
#[must_use]
pub fn scale_max(data: &[AggregatedDay], visible: SeriesVisibility) -> f64 {
    let series_max = |enabled: bool, pick: fn(&AggregatedDay) -> f64| {
        if enabled {
            data.iter().map(pick).fold(0.0, f64::max)
        } else {
            0.0
        }
    };
    [
        series_max(visible.kcal, |d| d.kcal),
        series_max(visible.protein, |d| d.prot),
        series_max(visible.fat, |d| d.fat),
        series_max(visible.carb, |d| d.carb),
    ]
    .into_iter()
    .fold(1.0, f64::max)
}

/// Maps data indices and values to canvas coordinates.
#[derive(Debug, Clone, Copy)]
struct Layout {
    plot_width: f64,
    plot_height: f64,
    step: f64,
    max: f64,
}

impl Layout {
    #[allow(clippy::cast_precision_loss)]
    fn new(width: f64, height: f64, points: usize, max: f64) -> Self {
        let plot_width = width - PAD_LEFT - PAD_RIGHT;
        let plot_height = height - PAD_TOP - PAD_BOTTOM;
        let gaps = points.saturating_sub(1).max(1) as f64;
        Self {
            plot_width,
            plot_height,
            step: plot_width / gaps,
            max,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn x(&self, index: usize) -> f64 {
        PAD_LEFT + index as f64 * self.step
    }

    fn y(&self, value: f64) -> f64 {
        PAD_TOP + self.plot_height - (value / self.max) * self.plot_height
    }

    fn point(&self, index: usize, value: f64) -> Point {
        Point {
            x: self.x(index),
            y: self.y(value),
        }
    }
}

/// Draws gridlines, one line per visible series and the date axis.
pub fn render_chart<C: Canvas>(
    canvas: &mut C,
    data: &[AggregatedDay],
    options: &ChartOptions,
    palette: &Palette,
) {
    canvas.clear(&palette.background);
    let layout = Layout::new(
        canvas.width(),
        canvas.height(),
        data.len(),
        scale_max(data, options.visible),
    );

    for i in 0..=GRID_DIVISIONS {
        let y = PAD_TOP + f64::from(i) * (layout.plot_height / f64::from(GRID_DIVISIONS));
        canvas.line(
            Point { x: PAD_LEFT, y },
            Point {
                x: PAD_LEFT + layout.plot_width,
                y,
            },
            &palette.border,
            1.0,
        );
    }

    let series: [(bool, &str, fn(&AggregatedDay) -> f64); 4] = [
        (options.visible.kcal, palette.kcal.as_str(), |d| d.kcal),
        (options.visible.protein, palette.protein.as_str(), |d| d.prot),
        (options.visible.fat, palette.fat.as_str(), |d| d.fat),
        (options.visible.carb, palette.carb.as_str(), |d| d.carb),
    ];
    let labelled = options.show_values && data.len() <= MAX_LABELLED_POINTS;
    for (visible, color, pick) in series {
        if !visible {
            continue;
        }
        let values: Vec<f64> = data.iter().map(pick).collect();
        draw_series(canvas, &layout, &values, color, labelled, palette);
    }

    for (i, day) in data.iter().enumerate() {
        let month_day = day.date.get(5..).unwrap_or(&day.date);
        canvas.text(
            month_day,
            Point {
                x: layout.x(i) - 14.0,
                y: PAD_TOP + layout.plot_height + 16.0,
            },
            AXIS_FONT_PX,
            &palette.muted,
            TextAnchor::Start,
        );
    }
}

fn draw_series<C: Canvas>(
    canvas: &mut C,
    layout: &Layout,
    values: &[f64],
    color: &str,
    labelled: bool,
    palette: &Palette,
) {
    let points: Vec<Point> = values
        .iter()
        .enumerate()
        .map(|(i, v)| layout.point(i, *v))
        .collect();
    canvas.polyline(&points, color, LINE_WIDTH);

    for (point, value) in points.iter().zip(values) {
        canvas.circle(*point, POINT_RADIUS, color);
        if labelled {
            canvas.text(
                &format!("{}", value.round() as i64),
                Point {
                    x: point.x,
                    y: point.y - 8.0,
                },
                VALUE_FONT_PX,
                &palette.foreground,
                TextAnchor::Middle,
            );
        }
    }
}

/// Canvas that accumulates SVG elements.
pub struct SvgCanvas {
    width: f64,
    height: f64,
    body: String,
}

impl SvgCanvas {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn finish(self) -> String {
        let (w, h) = (self.width, self.height);
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" \
             font-family=\"-apple-system, Segoe UI, Roboto, sans-serif\">\n{}</svg>\n",
            self.body
        )
    }
}

impl Canvas for SvgCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self, background: &str) {
        self.body.clear();
        let _ = writeln!(
            self.body,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{background}\"/>",
            self.width, self.height
        );
    }

    fn line(&mut self, from: Point, to: Point, color: &str, width: f64) {
        let _ = writeln!(
            self.body,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"{width}\"/>",
            from.x, from.y, to.x, to.y
        );
    }

    fn polyline(&mut self, points: &[Point], color: &str, width: f64) {
        if points.is_empty() {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, p.y))
            .collect();
        let _ = writeln!(
            self.body,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width}\"/>",
            coords.join(" ")
        );
    }

    fn circle(&mut self, center: Point, radius: f64, color: &str) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius}\" fill=\"{color}\"/>",
            center.x, center.y
        );
    }

    fn text(&mut self, text: &str, at: Point, size_px: f64, color: &str, anchor: TextAnchor) {
        let anchor = match anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
        };
        let _ = writeln!(
            self.body,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{size_px}\" fill=\"{color}\" text-anchor=\"{anchor}\">{}</text>",
            at.x,
            at.y,
            escape_xml(text)
        );
    }
}

/// Renders `data` into a complete SVG document of the given size.
#[must_use]
pub fn render_svg(
    data: &[AggregatedDay],
    options: &ChartOptions,
    palette: &Palette,
    width: f64,
    height: f64,
) -> String {
    let mut canvas = SvgCanvas::new(width, height);
    render_chart(&mut canvas, data, options, palette);
    canvas.finish()
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Line(Point, Point),
        Polyline(String, Vec<Point>),
        Circle(String, Point),
        Text(String, Point, String),
    }

    struct RecordingCanvas {
        ops: Vec<Op>,
    }

    impl RecordingCanvas {
        fn new() -> Self {
            Self { ops: Vec::new() }
        }

        fn polylines(&self) -> Vec<(&str, &[Point])> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Polyline(c, pts) => Some((c.as_str(), pts.as_slice())),
                    _ => None,
                })
                .collect()
        }

        fn texts_in(&self, color: &str) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(t, _, c) if c == color => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, f: fn(&Op) -> bool) -> usize {
            self.ops.iter().filter(|op| f(op)).count()
        }
    }

    impl Canvas for RecordingCanvas {
        fn width(&self) -> f64 {
            250.0
        }
        fn height(&self) -> f64 {
            134.0
        }
        fn clear(&mut self, _background: &str) {
            self.ops.push(Op::Clear);
        }
        fn line(&mut self, from: Point, to: Point, _color: &str, _width: f64) {
            self.ops.push(Op::Line(from, to));
        }
        fn polyline(&mut self, points: &[Point], color: &str, _width: f64) {
            self.ops.push(Op::Polyline(color.to_string(), points.to_vec()));
        }
        fn circle(&mut self, center: Point, _radius: f64, color: &str) {
            self.ops.push(Op::Circle(color.to_string(), center));
        }
        fn text(&mut self, text: &str, at: Point, _size_px: f64, color: &str, _anchor: TextAnchor) {
            self.ops.push(Op::Text(text.to_string(), at, color.to_string()));
        }
    }

    fn day(date: &str, kcal: f64, prot: f64, fat: f64, carb: f64) -> AggregatedDay {
        AggregatedDay {
            date: date.to_string(),
            kcal,
            prot,
            fat,
            carb,
        }
    }

    fn week() -> Vec<AggregatedDay> {
        vec![
            day("2024-06-10", 1800.0, 100.0, 60.0, 200.0),
            day("2024-06-11", 2000.0, 120.0, 70.0, 220.0),
            day("2024-06-13", 1500.0, 90.0, 50.0, 180.0),
        ]
    }

    #[test]
    fn test_scale_max_follows_visible_series() {
        let data = week();
        assert_eq!(scale_max(&data, SeriesVisibility::default()), 2000.0);

        let macros_only = SeriesVisibility {
            kcal: false,
            ..SeriesVisibility::default()
        };
        assert_eq!(scale_max(&data, macros_only), 220.0);

        let none = SeriesVisibility {
            kcal: false,
            protein: false,
            fat: false,
            carb: false,
        };
        assert_eq!(scale_max(&data, none), 1.0);
        assert_eq!(scale_max(&[], SeriesVisibility::default()), 1.0);
    }

    #[test]
    fn test_points_evenly_spaced_and_scaled() {
        let mut canvas = RecordingCanvas::new();
        let palette = Palette::light();
        render_chart(&mut canvas, &week(), &ChartOptions::default(), &palette);

        let lines = canvas.polylines();
        assert_eq!(lines.len(), 4);
        let (color, kcal) = lines[0];
        assert_eq!(color, palette.kcal);
        // plot is 200 x 100: three points spread over two equal gaps
        let xs: Vec<f64> = kcal.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![40.0, 140.0, 240.0]);
        assert_eq!(kcal[1].y, 10.0);
        assert_eq!(kcal[0].y, 10.0 + 100.0 - 90.0);
    }

    #[test]
    fn test_hiding_series_rescales_rest() {
        let mut canvas = RecordingCanvas::new();
        let palette = Palette::light();
        let options = ChartOptions {
            visible: SeriesVisibility {
                kcal: false,
                protein: false,
                fat: false,
                carb: true,
            },
            show_values: false,
        };
        render_chart(&mut canvas, &week(), &options, &palette);

        let lines = canvas.polylines();
        assert_eq!(lines.len(), 1);
        let (color, carb) = lines[0];
        assert_eq!(color, palette.carb);
        assert_eq!(carb[1].y, 10.0);
    }

    #[test]
    fn test_gridlines_divide_plot_into_quarters() {
        let mut canvas = RecordingCanvas::new();
        render_chart(&mut canvas, &week(), &ChartOptions::default(), &Palette::light());

        let ys: Vec<f64> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(from, to) if from.y == to.y => Some(from.y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![10.0, 35.0, 60.0, 85.0, 110.0]);
    }

    #[test]
    fn test_value_labels_only_when_enabled() {
        let palette = Palette::light();
        let mut canvas = RecordingCanvas::new();
        render_chart(&mut canvas, &week(), &ChartOptions::default(), &palette);
        assert!(canvas.texts_in(&palette.foreground).is_empty());

        let mut canvas = RecordingCanvas::new();
        let options = ChartOptions {
            show_values: true,
            ..ChartOptions::default()
        };
        render_chart(&mut canvas, &week(), &options, &palette);
        let labels = canvas.texts_in(&palette.foreground);
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[..3], ["1800", "2000", "1500"]);
    }

    #[test]
    fn test_no_value_labels_for_long_series() {
        let palette = Palette::light();
        let data: Vec<AggregatedDay> = (1..=31)
            .map(|d| day(&format!("2024-07-{d:02}"), 1000.0, 50.0, 40.0, 100.0))
            .collect();
        let options = ChartOptions {
            show_values: true,
            ..ChartOptions::default()
        };
        let mut canvas = RecordingCanvas::new();
        render_chart(&mut canvas, &data, &options, &palette);
        assert!(canvas.texts_in(&palette.foreground).is_empty());
        assert_eq!(canvas.count(|op| matches!(op, Op::Circle(..))), 31 * 4);
    }

    #[test]
    fn test_axis_labels_show_month_day() {
        let palette = Palette::light();
        let mut canvas = RecordingCanvas::new();
        render_chart(&mut canvas, &week(), &ChartOptions::default(), &palette);
        assert_eq!(canvas.texts_in(&palette.muted), vec!["06-10", "06-11", "06-13"]);
    }

    #[test]
    fn test_empty_series_draws_grid_only() {
        let mut canvas = RecordingCanvas::new();
        render_chart(&mut canvas, &[], &ChartOptions::default(), &Palette::light());
        assert_eq!(canvas.count(|op| matches!(op, Op::Line(..))), 5);
        assert_eq!(canvas.count(|op| matches!(op, Op::Circle(..))), 0);
        assert_eq!(canvas.count(|op| matches!(op, Op::Text(..))), 0);
        assert_eq!(canvas.ops[0], Op::Clear);
    }

    #[test]
    fn test_single_point_at_left_edge() {
        let mut canvas = RecordingCanvas::new();
        let data = vec![day("2024-06-10", 500.0, 0.0, 0.0, 0.0)];
        render_chart(&mut canvas, &data, &ChartOptions::default(), &Palette::light());
        let (_, kcal) = canvas.polylines()[0];
        assert_eq!(kcal[0].x, 40.0);
    }

    #[test]
    fn test_svg_output() {
        let mut canvas = SvgCanvas::new(250.0, 134.0);
        let options = ChartOptions {
            show_values: true,
            ..ChartOptions::default()
        };
        render_chart(&mut canvas, &week(), &options, &Palette::dark());
        let svg = canvas.finish();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 4);
        assert_eq!(svg.matches("<circle").count(), 12);
        assert!(svg.contains(">06-13</text>"));
        assert!(svg.contains(Palette::dark().background.as_str()));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
