use crate::db::{CatalogStore, CourseQuery};
use crate::error::{CatalogError, Result};
use crate::models::{Course, CourseLevel, CourseRow, NewCourse};
use crate::session::Session;

/// Course-creation form as entered, before any parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseForm {
    pub title: String,
    pub short_description: String,
    pub description: String,
    pub price: String,
    pub duration_hours: String,
    pub level: CourseLevel,
    pub is_published: bool,
}

impl Default for CourseForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            short_description: String::new(),
            description: String::new(),
            price: "0".to_string(),
            duration_hours: "1".to_string(),
            level: CourseLevel::Beginner,
            is_published: false,
        }
    }
}

/// Checked form values, still missing the instructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCourse {
    pub title: String,
    pub short_description: String,
    pub description: String,
    pub price: f64,
    pub duration_hours: i32,
    pub level: CourseLevel,
    pub is_published: bool,
}

impl CourseForm {
    pub fn validate(&self) -> Result<ValidCourse> {
        let title = self.title.trim();
        let short_description = self.short_description.trim();
        let description = self.description.trim();
        if title.is_empty() || description.is_empty() || short_description.is_empty() {
            return Err(CatalogError::validation(
                "Validation Error",
                "Please fill in all required fields.",
            ));
        }

        let price = self
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite() && *price >= 0.0)
            .ok_or_else(|| {
                CatalogError::validation("Invalid Price", "Price must be a non-negative number.")
            })?;

        let duration_hours = self
            .duration_hours
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or_else(|| {
                CatalogError::validation(
                    "Invalid Duration",
                    "Duration must be a positive number of hours.",
                )
            })?;

        Ok(ValidCourse {
            title: title.to_string(),
            short_description: short_description.to_string(),
            description: description.to_string(),
            price,
            duration_hours,
            level: self.level,
            is_published: self.is_published,
        })
    }
}

/// A committed course plus the listing refetched afterwards. The refetch
/// can fail on its own without undoing the insert.
#[derive(Debug)]
pub struct CreatedCourse {
    pub course: Course,
    pub listing: Result<Vec<CourseRow>>,
}

/// Every course, published or not, newest first.
pub async fn list_courses<S: CatalogStore>(store: &S) -> Result<Vec<CourseRow>> {
    store.fetch_courses(CourseQuery::all_newest_first()).await
}

/// Validates and inserts the form as a new course owned by the session user.
/// The form is reset only after the insert succeeds.
pub async fn create_course<S: CatalogStore>(
    store: &S,
    session: Option<&Session>,
    form: &mut CourseForm,
) -> Result<CreatedCourse> {
    let valid = form.validate()?;
    let session = session.ok_or_else(|| {
        CatalogError::NotAuthenticated("You must be logged in to create a course.".to_string())
    })?;

    let course = store
        .insert_course(NewCourse {
            title: valid.title,
            short_description: valid.short_description,
            description: valid.description,
            price: valid.price,
            level: valid.level,
            duration_hours: valid.duration_hours,
            is_published: valid.is_published,
            instructor_id: session.user_id(),
        })
        .await?;

    *form = CourseForm::default();
    let listing = list_courses(store).await;
    if let Err(err) = &listing {
        tracing::warn!(course_id = %course.id, error = %err, "course created but listing refresh failed");
    }

    Ok(CreatedCourse { course, listing })
}
