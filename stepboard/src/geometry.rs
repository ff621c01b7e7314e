use async_trait::async_trait;

use crate::constants::DEFAULT_FIRST_SCREEN_COUNT;
use crate::models::Segment;

/// Rendered heights of a list container and of one of its rows, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub list_height: f64,
    pub row_height: f64,
}

/// Measures the rendered list for a segment. `None` means the host could
/// not measure (nothing rendered yet, surface detached).
#[async_trait]
pub trait GeometryProbe: Send + Sync {
    async fn measure(&self, segment: Segment) -> Option<Geometry>;
}

/// Probe with constant geometry, for hosts without a layout engine.
#[derive(Clone, Copy, Debug)]
pub struct FixedProbe(pub Option<Geometry>);

#[async_trait]
impl GeometryProbe for FixedProbe {
    async fn measure(&self, _segment: Segment) -> Option<Geometry> {
        self.0
    }
}

pub fn first_screen_count(geometry: Option<Geometry>) -> usize {
    match geometry {
        Some(Geometry {
            list_height,
            row_height,
        }) if row_height > 0.0 && row_height.is_finite() && list_height.is_finite() => {
            ((list_height / row_height).floor().max(1.0)) as usize
        }
        _ => DEFAULT_FIRST_SCREEN_COUNT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_that_fit_the_list() {
        let geometry = Geometry {
            list_height: 400.0,
            row_height: 50.0,
        };
        assert_eq!(first_screen_count(Some(geometry)), 8);
        let partial = Geometry {
            list_height: 420.0,
            row_height: 64.0,
        };
        assert_eq!(first_screen_count(Some(partial)), 6);
    }

    #[test]
    fn never_below_one_row() {
        let tiny = Geometry {
            list_height: 10.0,
            row_height: 50.0,
        };
        assert_eq!(first_screen_count(Some(tiny)), 1);
    }

    #[test]
    fn unmeasurable_falls_back() {
        let flat = Geometry {
            list_height: 400.0,
            row_height: 0.0,
        };
        assert_eq!(first_screen_count(Some(flat)), DEFAULT_FIRST_SCREEN_COUNT);
        assert_eq!(first_screen_count(None), DEFAULT_FIRST_SCREEN_COUNT);
    }
}
