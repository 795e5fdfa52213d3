//! Measurement oracle — the host's "does it overflow?" capability.

/// One overflow question put to the oracle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureQuery<'a> {
    pub text: &'a str,
    pub font_size: f32,
    pub font_family: &'a str,
    /// Line-height multiplier the text is laid out with.
    pub line_height: f32,
    /// Width the text wraps at.
    pub box_width: f32,
    /// Allowed content height in pixels.
    pub max_height: f32,
}

/// Host capability that lays text out and reports overflow.
///
/// Calls are synchronous and must reflect the current layout. Answers may
/// be imprecise or non-monotonic in `font_size`; the controller tolerates
/// both.
pub trait MeasurementOracle {
    /// Whether the text rendered per `query` is taller than `max_height`.
    fn overflows(&mut self, query: &MeasureQuery<'_>) -> bool;

    /// Whether a layout surface exists at all. Checked once per session
    /// start.
    fn surface_ready(&self) -> bool {
        true
    }
}

impl<T: MeasurementOracle + ?Sized> MeasurementOracle for Box<T> {
    fn overflows(&mut self, query: &MeasureQuery<'_>) -> bool {
        (**self).overflows(query)
    }

    fn surface_ready(&self) -> bool {
        (**self).surface_ready()
    }
}

/// Oracle for hosts with no layout environment (headless, server side).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSurface;

impl MeasurementOracle for NoSurface {
    fn overflows(&mut self, _query: &MeasureQuery<'_>) -> bool {
        false
    }

    fn surface_ready(&self) -> bool {
        false
    }
}

/// Oracle with a fixed fit point: overflows for any size above
/// `max_fitting`. Useful for hosts with known fixed-size glyph boxes and
/// for tests.
#[derive(Clone, Debug)]
pub struct ThresholdOracle {
    pub max_fitting: f32,
    calls: usize,
}

impl ThresholdOracle {
    pub fn new(max_fitting: f32) -> Self {
        Self { max_fitting, calls: 0 }
    }

    /// Number of `overflows` calls answered so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl MeasurementOracle for ThresholdOracle {
    fn overflows(&mut self, query: &MeasureQuery<'_>) -> bool {
        self.calls += 1;
        query.font_size > self.max_fitting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(size: f32) -> MeasureQuery<'static> {
        MeasureQuery {
            text: "Hello",
            font_size: size,
            font_family: "sans-serif",
            line_height: 1.2,
            box_width: 200.0,
            max_height: 50.0,
        }
    }

    #[test]
    fn test_threshold_oracle() {
        let mut oracle = ThresholdOracle::new(40.0);
        assert!(!oracle.overflows(&query(40.0)));
        assert!(oracle.overflows(&query(41.0)));
        assert_eq!(oracle.calls(), 2);
        assert!(oracle.surface_ready());
    }

    #[test]
    fn test_no_surface() {
        assert!(!NoSurface.surface_ready());
    }

    #[test]
    fn test_boxed_oracle_delegates() {
        let mut boxed: Box<dyn MeasurementOracle> = Box::new(NoSurface);
        assert!(!boxed.surface_ready());
        assert!(!boxed.overflows(&query(10.0)));
    }
}
