use crate::models::{DashboardStats, Enrollment};

pub fn summarize_enrollments(enrollments: &[Enrollment]) -> DashboardStats {
    let total_courses = enrollments.len();
    let completed_courses = enrollments
        .iter()
        .filter(|enrollment| enrollment.completed_at.is_some())
        .count();
    let total_hours = enrollments.iter().map(course_hours).sum();

    let avg_progress = if total_courses == 0 {
        0
    } else {
        let progress_sum: i64 = enrollments.iter().map(progress_of).sum();
        let mean = progress_sum as f64 / total_courses as f64;
        mean.round().clamp(0.0, 100.0) as u8
    };

    DashboardStats {
        total_courses,
        completed_courses,
        total_hours,
        avg_progress,
    }
}

pub fn progress_of(enrollment: &Enrollment) -> i64 {
    i64::from(enrollment.progress_percentage.unwrap_or(0).clamp(0, 100))
}

fn course_hours(enrollment: &Enrollment) -> f64 {
    let hours = enrollment
        .course
        .as_ref()
        .and_then(|course| course.duration_hours)
        .unwrap_or(0);
    f64::from(hours.max(0))
}
