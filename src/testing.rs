//! In-memory catalog backend for unit tests.

use std::cell::{Cell, RefCell};

use chrono::Utc;
use uuid::Uuid;

use crate::db::{CatalogStore, CourseQuery};
use crate::error::{CatalogError, Result};
use crate::models::{Course, CourseRow, Enrollment, NewCourse, Profile, User};

#[derive(Default)]
pub struct MemoryStore {
    pub courses: RefCell<Vec<CourseRow>>,
    pub profiles: Vec<Profile>,
    pub enrollments: Vec<Enrollment>,
    pub users: Vec<User>,
    failure: Option<String>,
    listing_failure: Option<String>,
    inserts: Cell<usize>,
}

impl MemoryStore {
    pub fn with_courses(courses: Vec<CourseRow>) -> Self {
        Self {
            courses: RefCell::new(courses),
            ..Self::default()
        }
    }

    /// Every call fails as if the backend rejected it.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Only course listings fail; inserts and single-row reads still work.
    pub fn failing_listings(message: &str) -> Self {
        Self {
            listing_failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn stored_courses(&self) -> usize {
        self.courses.borrow().len()
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.get()
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(CatalogError::Backend(sqlx::Error::Protocol(message.clone()))),
            None => Ok(()),
        }
    }
}

impl CatalogStore for MemoryStore {
    async fn fetch_courses(&self, query: CourseQuery) -> Result<Vec<CourseRow>> {
        self.check()?;
        if let Some(message) = &self.listing_failure {
            return Err(CatalogError::Backend(sqlx::Error::Protocol(message.clone())));
        }
        let mut rows: Vec<CourseRow> = self
            .courses
            .borrow()
            .iter()
            .filter(|row| !query.published_only || row.course.is_published)
            .cloned()
            .collect();
        if query.newest_first {
            rows.sort_by(|a, b| b.course.created_at.cmp(&a.course.created_at));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    async fn fetch_course(&self, id: Uuid) -> Result<Option<CourseRow>> {
        self.check()?;
        Ok(self
            .courses
            .borrow()
            .iter()
            .find(|row| row.course.id == id)
            .cloned())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        self.check()?;
        Ok(self
            .profiles
            .iter()
            .find(|profile| profile.user_id == user_id)
            .cloned())
    }

    async fn fetch_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>> {
        self.check()?;
        Ok(self
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course> {
        self.inserts.set(self.inserts.get() + 1);
        self.check()?;
        let created = Course {
            id: Uuid::new_v4(),
            title: course.title,
            short_description: Some(course.short_description),
            description: Some(course.description),
            price: Some(course.price),
            level: Some(course.level),
            duration_hours: Some(course.duration_hours),
            thumbnail_url: None,
            is_published: course.is_published,
            instructor_id: course.instructor_id,
            category_id: None,
            created_at: Utc::now(),
        };
        self.courses.borrow_mut().push(CourseRow {
            course: created.clone(),
            instructor_name: None,
            category_name: None,
        });
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }
}
