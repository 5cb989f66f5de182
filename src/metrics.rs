use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{CourseRow, CourseWithDisplayInfo, DisplayMetrics};

/// Where a course is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsView {
    Listing,
    Detail,
}

/// Supplies the rating and student count shown next to a course.
///
/// The catalog has no ratings or enrollment analytics yet, so the only
/// implementation is [`MockMetricsProvider`]. A real provider can replace it
/// without touching the page loaders or renderers.
pub trait MetricsProvider {
    fn metrics_for(&mut self, row: &CourseRow, view: MetricsView) -> DisplayMetrics;

    fn decorate(&mut self, rows: Vec<CourseRow>, view: MetricsView) -> Vec<CourseWithDisplayInfo> {
        rows.into_iter()
            .map(|row| {
                let metrics = self.metrics_for(&row, view);
                CourseWithDisplayInfo { row, metrics }
            })
            .collect()
    }
}

pub const DETAIL_RATING: f64 = 4.7;
pub const MIN_STUDENTS: u32 = 50;
pub const MAX_STUDENTS: u32 = 1049;

/// Random placeholder metrics, regenerated on every fetch.
pub struct MockMetricsProvider {
    rng: StdRng,
}

impl MockMetricsProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for MockMetricsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for MockMetricsProvider {
    fn metrics_for(&mut self, _row: &CourseRow, view: MetricsView) -> DisplayMetrics {
        let rating = match view {
            MetricsView::Listing => 4.5 + self.rng.random_range(0.0..0.5),
            MetricsView::Detail => DETAIL_RATING,
        };
        let student_count = self.rng.random_range(MIN_STUDENTS..=MAX_STUDENTS);
        DisplayMetrics {
            rating,
            student_count,
        }
    }
}
