use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(CourseLevel::Beginner),
            "intermediate" => Ok(CourseLevel::Intermediate),
            "advanced" => Ok(CourseLevel::Advanced),
            other => Err(format!("unknown course level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub level: Option<CourseLevel>,
    pub duration_hours: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub is_published: bool,
    pub instructor_id: Uuid,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A course row as returned by the catalog joins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRow {
    #[serde(flatten)]
    pub course: Course,
    pub instructor_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayMetrics {
    pub rating: f64,
    pub student_count: u32,
}

/// Presentation model for listing and detail output. The metrics are
/// placeholders and never leave the rendering path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseWithDisplayInfo {
    #[serde(flatten)]
    pub row: CourseRow,
    #[serde(flatten)]
    pub metrics: DisplayMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentCourse {
    pub id: Uuid,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_hours: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub progress_percentage: Option<i32>,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub course: Option<EnrollmentCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub short_description: String,
    pub description: String,
    pub price: f64,
    pub level: CourseLevel,
    pub duration_hours: i32,
    pub is_published: bool,
    pub instructor_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DashboardStats {
    pub total_courses: usize,
    pub completed_courses: usize,
    pub total_hours: f64,
    pub avg_progress: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<CourseLevel>(), Ok(CourseLevel::Advanced));
        assert_eq!(" beginner ".parse::<CourseLevel>(), Ok(CourseLevel::Beginner));
        assert!("expert".parse::<CourseLevel>().is_err());
    }

    #[test]
    fn level_display_matches_stored_value() {
        assert_eq!(CourseLevel::Intermediate.to_string(), "intermediate");
    }
}
