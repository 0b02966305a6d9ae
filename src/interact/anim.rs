//! Host-clocked animation primitives.
//!
//! Nothing here owns a timer: callers pass the current time in milliseconds
//! and sample tweens and debouncers from their frame callback.

/// d3's `easeCubicInOut`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

pub trait Lerp: Clone {
    fn lerp(&self, to: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

/// Eased transition between two values over a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T> {
    from: T,
    to: T,
    start: f64,
    duration: f64,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, start: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    pub fn target(&self) -> &T {
        &self.to
    }

    /// Eased progress in `[0, 1]`.
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ease_cubic_in_out((now - self.start) / self.duration)
    }

    pub fn is_done(&self, now: f64) -> bool {
        now - self.start >= self.duration
    }

    /// Value at `now`; exactly the target once the duration has elapsed.
    pub fn sample(&self, now: f64) -> T {
        if self.is_done(now) {
            self.to.clone()
        } else {
            self.from.lerp(&self.to, self.progress(now))
        }
    }
}

/// Coalesces redraw requests into at most one per animation frame.
#[derive(Debug, Default, Clone)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// Returns true when this call scheduled a new frame.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Trailing-edge debounce: only the last value pushed within `delay`
/// milliseconds of quiet is released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: f64,
    pending: Option<(f64, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: f64) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn poll(&mut self, now: f64) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert_eq!(ease_cubic_in_out(2.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn test_tween_ends_on_target() {
        let t = Tween::new(146.0, 118.0, 1000.0, 260.0);
        assert_eq!(t.sample(1000.0), 146.0);
        assert_eq!(t.sample(1130.0), 132.0);
        assert_eq!(t.sample(1260.0), 118.0);
        assert_eq!(t.sample(5000.0), 118.0);
        assert!(t.is_done(1260.0) && !t.is_done(1259.0));
    }

    #[test]
    fn test_frame_gate() {
        let mut g = FrameGate::default();
        assert!(g.request());
        assert!(!g.request());
        assert!(g.take());
        assert!(!g.take());
    }

    #[test]
    fn test_debouncer_keeps_last() {
        let mut d = Debouncer::new(220.0);
        d.push("u", 0.0);
        d.push("us", 100.0);
        assert_eq!(d.poll(250.0), None);
        assert_eq!(d.poll(320.0), Some("us"));
        assert_eq!(d.poll(400.0), None);
        d.push("x", 500.0);
        d.cancel();
        assert_eq!(d.poll(1000.0), None);
    }
}
