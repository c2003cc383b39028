// Stopwatch overlay toggled from the keyboard
use super::map_view::PixelPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Timer {
    Hidden,
    Running { started_ms: i64 },
    Stopped { elapsed_ms: i64 },
}

/// `s` shows and starts the watch, a second `s` stops it, `r` hides it.
/// While visible it tracks the pointer until a click pins it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Stopwatch {
    timer: Timer,
    location: PixelPoint,
    pinned: bool,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self {
            timer: Timer::Hidden,
            location: PixelPoint::default(),
            pinned: false,
        }
    }
}

impl Stopwatch {
    pub fn is_visible(&self) -> bool {
        self.timer != Timer::Hidden
    }

    pub fn toggle(&mut self, now_ms: i64) {
        self.timer = match self.timer {
            Timer::Hidden => Timer::Running { started_ms: now_ms },
            Timer::Running { started_ms } => Timer::Stopped {
                elapsed_ms: now_ms - started_ms,
            },
            stopped @ Timer::Stopped { .. } => stopped,
        };
    }

    pub fn hide(&mut self) {
        self.timer = Timer::Hidden;
        self.pinned = false;
    }

    pub fn pointer_moved(&mut self, pointer: PixelPoint) {
        if self.is_visible() && !self.pinned {
            self.location = pointer;
        }
    }

    pub fn click(&mut self) {
        if self.is_visible() {
            self.pinned = true;
        }
    }

    pub fn location(&self) -> PixelPoint {
        self.location
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        match self.timer {
            Timer::Hidden => 0,
            Timer::Running { started_ms } => (now_ms - started_ms).max(0),
            Timer::Stopped { elapsed_ms } => elapsed_ms,
        }
    }
}

/// `HH:MM:SS:mmm`
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let elapsed_ms = elapsed_ms.max(0);
    let hours = elapsed_ms / 3_600_000;
    let minutes = elapsed_ms / 60_000 % 60;
    let seconds = elapsed_ms / 1000 % 60;
    let millis = elapsed_ms % 1000;
    format!("{:02}:{:02}:{:02}:{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00:000");
        assert_eq!(format_elapsed(3_723_004), "01:02:03:004");
    }

    #[test]
    fn test_toggle_start_stop_hide() {
        let mut watch = Stopwatch::default();
        assert!(!watch.is_visible());

        watch.toggle(1_000);
        assert!(watch.is_visible());
        assert_eq!(watch.elapsed_ms(1_250), 250);

        watch.toggle(2_000);
        assert_eq!(watch.elapsed_ms(9_000), 1_000);
        watch.toggle(3_000);
        assert_eq!(watch.elapsed_ms(9_000), 1_000);

        watch.hide();
        assert!(!watch.is_visible());
    }

    #[test]
    fn test_pinned_by_click() {
        let mut watch = Stopwatch::default();
        watch.toggle(0);
        watch.pointer_moved(PixelPoint::new(10.0, 20.0));
        watch.click();
        watch.pointer_moved(PixelPoint::new(99.0, 99.0));
        assert_eq!(watch.location(), PixelPoint::new(10.0, 20.0));
    }
}
