// Angular gauges: quadrant sectors and pointer/value mapping
use std::f64::consts::PI;

/// Inset applied to both ends of every quadrant sector (3.6 degrees).
pub const QUADRANT_BORDER: f64 = PI * 0.02;

/// Horizontal margin, in pixels, outside of which pointer movement is ignored.
pub const POINTER_BORDER_PX: f64 = 100.0;

/// Quadrants around a generator circle, numbered clockwise from top-right.
/// Angles follow canvas orientation (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
    TopLeft = 4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub start: f64,
    pub stop: f64,
}

impl AngleRange {
    pub fn overlaps(&self, other: &AngleRange) -> bool {
        self.start < other.stop && other.start < self.stop
    }
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopRight,
        Quadrant::BottomRight,
        Quadrant::BottomLeft,
        Quadrant::TopLeft,
    ];

    pub fn angles(self) -> AngleRange {
        let start = (self as i32 - 2) as f64 * PI / 2.0;
        let stop = start + PI / 2.0;
        AngleRange {
            start: start + QUADRANT_BORDER,
            stop: stop - QUADRANT_BORDER,
        }
    }
}

/// Linear re-mapping of `value` from one range onto another, unclamped.
/// A degenerate input range maps everything onto `out_start`.
pub fn map_range(value: f64, in_start: f64, in_stop: f64, out_start: f64, out_stop: f64) -> f64 {
    let span = in_stop - in_start;
    if span == 0.0 {
        return out_start;
    }
    out_start + (value - in_start) / span * (out_stop - out_start)
}

/// Angle selected by a horizontal pointer position. The pointer is clamped to
/// the viewport minus a fixed margin on either side.
pub fn pointer_to_angle(pointer_x: f64, viewport_width: f64, range: AngleRange) -> f64 {
    let left = POINTER_BORDER_PX;
    let right = viewport_width - POINTER_BORDER_PX;
    if right <= left {
        return range.start;
    }
    let x = if pointer_x < left {
        left
    } else if pointer_x > right {
        right
    } else {
        pointer_x
    };
    map_range(x, left, right, range.start, range.stop)
}

/// Integer gauge value for `angle`, rounded and clamped to `[min, max]`.
pub fn map_angle_to_value(angle: f64, range: AngleRange, min: u32, max: u32) -> u32 {
    let max = max.max(min);
    let value = map_range(angle, range.start, range.stop, min as f64, max as f64).round();
    if value.is_nan() || value < min as f64 {
        min
    } else if value > max as f64 {
        max
    } else {
        value as u32
    }
}

/// Angle at which `value` sits on a gauge spanning `[min, max]`, unclamped.
pub fn value_to_angle(value: f64, min: f64, max: f64, range: AngleRange) -> f64 {
    map_range(value, min, max, range.start, range.stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrant_sectors_do_not_overlap() {
        for a in Quadrant::ALL {
            for b in Quadrant::ALL {
                if a != b {
                    assert!(!a.angles().overlaps(&b.angles()), "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_quadrant_top_left_sector() {
        let angles = Quadrant::TopLeft.angles();
        assert!((angles.start - (PI + QUADRANT_BORDER)).abs() < 1e-12);
        assert!((angles.stop - (1.5 * PI - QUADRANT_BORDER)).abs() < 1e-12);
    }

    #[test]
    fn test_pointer_to_angle_clamps_to_margins() {
        let range = Quadrant::BottomLeft.angles();
        assert_eq!(pointer_to_angle(0.0, 1920.0, range), range.start);
        assert_eq!(pointer_to_angle(1920.0, 1920.0, range), range.stop);
        let mid = pointer_to_angle(960.0, 1920.0, range);
        assert!((mid - (range.start + range.stop) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_pointer_to_angle_narrow_viewport() {
        let range = Quadrant::TopLeft.angles();
        assert_eq!(pointer_to_angle(50.0, 150.0, range), range.start);
    }

    #[test]
    fn test_map_angle_to_value_is_clamped() {
        let range = Quadrant::BottomLeft.angles();
        assert_eq!(map_angle_to_value(range.start - 1.0, range, 100, 1000), 100);
        assert_eq!(map_angle_to_value(range.stop + 1.0, range, 100, 1000), 1000);
        assert_eq!(map_angle_to_value((range.start + range.stop) / 2.0, range, 100, 1000), 550);
    }

    #[test]
    fn test_value_to_angle_inverts_map() {
        let range = Quadrant::TopLeft.angles();
        let angle = value_to_angle(550.0, 100.0, 1000.0, range);
        assert_eq!(map_angle_to_value(angle, range, 100, 1000), 550);
    }
}
