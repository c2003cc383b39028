// Draw list primitives and label layout for overlay frames
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(r, g, b, 255)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub weight: f64,
}

impl Stroke {
    pub const fn new(color: Color, weight: f64) -> Self {
        Self { color, weight }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignH {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignV {
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawCommand {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    Point {
        x: f64,
        y: f64,
        stroke: Stroke,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        stop: f64,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<[f64; 2]>,
        fill: Color,
    },
    Text {
        x: f64,
        y: f64,
        size: f64,
        text: String,
        color: Color,
        align_h: AlignH,
        align_v: AlignV,
        bold: bool,
    },
}

/// One rendered overlay frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub time_ms: i64,
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

/// Coarse layout grid for labels; lengths are in ticks that scale with the
/// viewport width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelGrid {
    pub border_width: f64,
    pub ticks_horizontal: f64,
    pub ticks_vertical: f64,
    pub tick_width: f64,
}

impl LabelGrid {
    pub fn for_viewport(width: f64, height: f64) -> Self {
        let border_width = 20.0;
        let ticks_horizontal = (width / 1920.0 * 100.0).max(100.0);
        let tick_width = (width - 2.0 * border_width) / ticks_horizontal;
        let ticks_vertical = if width > 0.0 {
            height / width * ticks_horizontal
        } else {
            0.0
        };
        Self {
            border_width,
            ticks_horizontal,
            ticks_vertical,
            tick_width,
        }
    }

    pub fn to_x(&self, grid_x: f64) -> f64 {
        self.border_width + grid_x * self.tick_width
    }

    pub fn to_y(&self, grid_y: f64) -> f64 {
        self.border_width + grid_y * self.tick_width
    }

    pub fn to_length(&self, grid_length: f64) -> f64 {
        grid_length * self.tick_width
    }

    pub fn to_grid_x(&self, x: f64) -> f64 {
        (x - self.border_width) / self.tick_width
    }

    pub fn to_grid_y(&self, y: f64) -> f64 {
        (y - self.border_width) / self.tick_width
    }

    pub fn to_grid_length(&self, length: f64) -> f64 {
        length / self.tick_width
    }
}

/// Label description in grid units. A label can carry free text, a
/// left-aligned key and a right-aligned value, each optional.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelOptions {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub border: f64,
    pub text: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub text_color: Color,
    pub key_color: Color,
    pub value_color: Color,
    pub bg_color: Color,
    pub bold: bool,
    pub align_h: AlignH,
    pub align_v: AlignV,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 0.0,
            h: 0.0,
            border: 0.0,
            text: None,
            key: None,
            value: None,
            text_color: Color::TRANSPARENT,
            key_color: Color::TRANSPARENT,
            value_color: Color::TRANSPARENT,
            bg_color: Color::TRANSPARENT,
            bold: false,
            align_h: AlignH::Left,
            align_v: AlignV::Center,
        }
    }
}

pub fn layout_label(grid: &LabelGrid, label: &LabelOptions) -> Vec<DrawCommand> {
    let x = grid.to_x(label.x);
    let y = grid.to_y(label.y);
    let w = grid.to_length(label.w);
    let h = grid.to_length(label.h);
    let border = grid.to_length(label.border);
    let size = h - border * 2.0;

    let mut commands = Vec::with_capacity(4);
    if label.bg_color != Color::TRANSPARENT {
        commands.push(DrawCommand::Rect {
            x,
            y,
            w,
            h,
            fill: Some(label.bg_color),
            stroke: None,
        });
    }
    if let Some(text) = label.text.as_ref().filter(|t| !t.is_empty()) {
        commands.push(DrawCommand::Text {
            x,
            y,
            size,
            text: text.clone(),
            color: label.text_color,
            align_h: label.align_h,
            align_v: label.align_v,
            bold: label.bold,
        });
    }
    if let Some(key) = label.key.as_ref().filter(|k| !k.is_empty()) {
        commands.push(DrawCommand::Text {
            x: x + border,
            y: y + h / 2.0,
            size,
            text: key.clone(),
            color: label.key_color,
            align_h: AlignH::Left,
            align_v: AlignV::Center,
            bold: label.bold,
        });
    }
    if let Some(value) = label.value.as_ref().filter(|v| !v.is_empty()) {
        commands.push(DrawCommand::Text {
            x: x + w - border,
            y: y + h / 2.0,
            size,
            text: value.clone(),
            color: label.value_color,
            align_h: AlignH::Right,
            align_v: AlignV::Center,
            bold: label.bold,
        });
    }
    commands
}

/// Integer with thousands separators, e.g. `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_signed(value: f64) -> String {
    let rounded = value.round();
    if rounded < 0.0 {
        format!("-{}", format_count((-rounded) as u64))
    } else {
        format_count(rounded as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_signed(-1500.4), "-1,500");
    }

    #[test]
    fn test_label_grid_round_trip() {
        let grid = LabelGrid::for_viewport(1920.0, 1080.0);
        assert_eq!(grid.ticks_horizontal, 100.0);
        assert!((grid.to_grid_x(grid.to_x(12.5)) - 12.5).abs() < 1e-9);
        assert!((grid.to_length(grid.to_grid_length(300.0)) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_key_value_label() {
        let grid = LabelGrid::for_viewport(1920.0, 1080.0);
        let commands = layout_label(
            &grid,
            &LabelOptions {
                x: 2.0,
                y: 0.1,
                w: 5.0,
                h: 1.2,
                border: 0.2,
                key: Some("Zoom".to_string()),
                value: Some("5".to_string()),
                bg_color: Color(0, 0, 75, 125),
                ..LabelOptions::default()
            },
        );
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], DrawCommand::Rect { .. }));
        match &commands[2] {
            DrawCommand::Text { text, align_h, .. } => {
                assert_eq!(text, "5");
                assert_eq!(*align_h, AlignH::Right);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_frame_serializes_tagged_commands() {
        let frame = Frame {
            time_ms: 1,
            width: 10.0,
            height: 10.0,
            commands: vec![DrawCommand::Point {
                x: 1.0,
                y: 2.0,
                stroke: Stroke::new(Color::rgb(1, 2, 3), 4.0),
            }],
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["commands"][0]["kind"], "point");
        assert_eq!(json["timeMs"], 1);
    }
}
