//! Pointer gesture tracking for click/drag discrimination

use crate::foundation::math::Vec2;

/// One pointer gesture from down to up
///
/// Travel is the cumulative path length, so a pointer that wanders away and
/// comes back to its start still counts as a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    start: Vec2,
    last: Vec2,
    forwarded: Vec2,
    travelled: f32,
    threshold: f32,
    dragging: bool,
}

impl Gesture {
    /// Start a gesture at `start` (screen pixels)
    pub fn begin(start: Vec2, threshold: f32) -> Self {
        Self {
            start,
            last: start,
            forwarded: start,
            travelled: 0.0,
            threshold,
            dragging: false,
        }
    }

    /// Track a pointer move
    ///
    /// Returns the delta to forward as a drag. Nothing is forwarded until
    /// travel exceeds the threshold; the first forwarded delta then spans
    /// from the gesture start.
    pub fn update(&mut self, position: Vec2) -> Option<Vec2> {
        self.travelled += (position - self.last).norm();
        self.last = position;
        if !self.dragging && self.travelled > self.threshold {
            self.dragging = true;
        }
        if !self.dragging {
            return None;
        }

        let delta = position - self.forwarded;
        self.forwarded = position;
        (delta != Vec2::zeros()).then_some(delta)
    }

    /// Whether travel exceeded the threshold
    pub fn is_drag(&self) -> bool {
        self.dragging
    }

    /// Screen position where the gesture began
    pub fn start(&self) -> Vec2 {
        self.start
    }

    /// Cumulative path length so far
    pub fn travelled(&self) -> f32 {
        self.travelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_small_jitter_stays_a_click() {
        let mut gesture = Gesture::begin(Vec2::new(10.0, 10.0), 5.0);
        assert_eq!(gesture.update(Vec2::new(12.0, 10.0)), None);
        assert_eq!(gesture.update(Vec2::new(10.0, 10.0)), None);
        assert!(!gesture.is_drag());
        assert_relative_eq!(gesture.travelled(), 4.0);
    }

    #[test]
    fn test_first_drag_delta_spans_from_start() {
        let mut gesture = Gesture::begin(Vec2::zeros(), 5.0);
        assert_eq!(gesture.update(Vec2::new(3.0, 0.0)), None);
        assert_eq!(gesture.update(Vec2::new(6.0, 0.0)), Some(Vec2::new(6.0, 0.0)));
        assert_eq!(gesture.update(Vec2::new(6.0, 2.0)), Some(Vec2::new(0.0, 2.0)));
        assert_eq!(gesture.update(Vec2::new(6.0, 2.0)), None);
        assert!(gesture.is_drag());
    }

    #[test]
    fn test_round_trip_counts_path_length() {
        let mut gesture = Gesture::begin(Vec2::zeros(), 5.0);
        gesture.update(Vec2::new(4.0, 0.0));
        gesture.update(Vec2::new(0.0, 0.0));
        assert!(gesture.is_drag());
        assert_eq!(gesture.start(), Vec2::zeros());
    }

    #[test]
    fn test_exactly_threshold_is_not_a_drag() {
        let mut gesture = Gesture::begin(Vec2::zeros(), 5.0);
        assert_eq!(gesture.update(Vec2::new(3.0, 4.0)), None);
        assert!(!gesture.is_drag());
    }
}
