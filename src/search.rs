use crate::models::{CourseRow, CourseWithDisplayInfo};

/// Something the catalog search box can match against.
pub trait Searchable {
    fn title(&self) -> &str;
    fn short_description(&self) -> Option<&str>;
}

impl Searchable for CourseRow {
    fn title(&self) -> &str {
        &self.course.title
    }

    fn short_description(&self) -> Option<&str> {
        self.course.short_description.as_deref()
    }
}

impl Searchable for CourseWithDisplayInfo {
    fn title(&self) -> &str {
        self.row.title()
    }

    fn short_description(&self) -> Option<&str> {
        self.row.short_description()
    }
}

/// Keeps the courses whose title or short description contains `term`,
/// ignoring case. A blank term keeps everything. Order is preserved.
pub fn filter_courses<T: Searchable + Clone>(courses: &[T], term: &str) -> Vec<T> {
    if term.trim().is_empty() {
        return courses.to_vec();
    }

    let needle = term.to_lowercase();
    courses
        .iter()
        .filter(|course| contains_term(*course, &needle))
        .cloned()
        .collect()
}

fn contains_term<T: Searchable>(course: &T, needle: &str) -> bool {
    course.title().to_lowercase().contains(needle)
        || course
            .short_description()
            .map(|text| text.to_lowercase().contains(needle))
            .unwrap_or(false)
}
