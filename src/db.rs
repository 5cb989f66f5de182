#![allow(async_fn_in_trait)]

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::models::{
    Course, CourseLevel, CourseRow, Enrollment, EnrollmentCourse, NewCourse, Profile, User,
};

/// Shape of a course read: which rows, in what order, how many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseQuery {
    pub published_only: bool,
    pub newest_first: bool,
    pub limit: Option<i64>,
}

impl CourseQuery {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    pub fn featured(limit: i64) -> Self {
        Self {
            published_only: true,
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn all_newest_first() -> Self {
        Self {
            newest_first: true,
            ..Self::default()
        }
    }
}

/// Reads and writes against the catalog backend.
pub trait CatalogStore {
    async fn fetch_courses(&self, query: CourseQuery) -> Result<Vec<CourseRow>>;

    async fn fetch_course(&self, id: Uuid) -> Result<Option<CourseRow>>;

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;

    async fn fetch_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>>;

    async fn insert_course(&self, course: NewCourse) -> Result<Course>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COURSE_COLUMNS: &str = "c.id, c.title, c.short_description, c.description, c.price, \
     c.level, c.duration_hours, c.thumbnail_url, \
     COALESCE(c.is_published, false) AS is_published, \
     c.instructor_id, c.category_id, c.created_at, \
     p.full_name AS instructor_name, cat.name AS category_name";

const COURSE_JOINS: &str = " FROM learnsphere.courses c \
     LEFT JOIN learnsphere.profiles p ON p.user_id = c.instructor_id \
     LEFT JOIN learnsphere.categories cat ON cat.id = c.category_id";

fn course_select(query: CourseQuery) -> String {
    let mut sql = format!("SELECT {COURSE_COLUMNS}{COURSE_JOINS}");
    if query.published_only {
        sql.push_str(" WHERE c.is_published = true");
    }
    if query.newest_first {
        sql.push_str(" ORDER BY c.created_at DESC");
    } else {
        sql.push_str(" ORDER BY c.created_at ASC, c.title ASC");
    }
    if query.limit.is_some() {
        sql.push_str(" LIMIT $1");
    }
    sql
}

impl CatalogStore for PgStore {
    async fn fetch_courses(&self, query: CourseQuery) -> Result<Vec<CourseRow>> {
        let sql = course_select(query);
        let mut rows = sqlx::query(&sql);
        if let Some(limit) = query.limit {
            rows = rows.bind(limit.max(0));
        }

        let records = rows.fetch_all(&self.pool).await?;
        tracing::debug!(?query, rows = records.len(), "fetched courses");

        records.iter().map(decode_course_row).collect()
    }

    async fn fetch_course(&self, id: Uuid) -> Result<Option<CourseRow>> {
        let sql = format!("SELECT {COURSE_COLUMNS}{COURSE_JOINS} WHERE c.id = $1");
        let record = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        tracing::debug!(%id, found = record.is_some(), "fetched course");

        record.as_ref().map(decode_course_row).transpose()
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let record = sqlx::query(
            "SELECT user_id, full_name, role FROM learnsphere.profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        record
            .map(|row| -> Result<Profile> {
                Ok(Profile {
                    user_id: column(&row, "user_id")?,
                    full_name: column(&row, "full_name")?,
                    role: column(&row, "role")?,
                })
            })
            .transpose()
    }

    async fn fetch_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>> {
        let records = sqlx::query(
            r#"
            SELECT e.id, e.student_id, e.course_id, e.progress_percentage,
                   e.enrolled_at, e.completed_at,
                   c.id AS joined_course_id, c.title AS course_title,
                   c.thumbnail_url AS course_thumbnail_url,
                   c.duration_hours AS course_duration_hours
            FROM learnsphere.enrollments e
            LEFT JOIN learnsphere.courses c ON c.id = e.course_id
            WHERE e.student_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        tracing::debug!(%student_id, rows = records.len(), "fetched enrollments");

        records.iter().map(decode_enrollment).collect()
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course> {
        let row = sqlx::query(
            r#"
            INSERT INTO learnsphere.courses
            (id, title, short_description, description, price, level,
             duration_hours, is_published, instructor_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&course.title)
        .bind(&course.short_description)
        .bind(&course.description)
        .bind(course.price)
        .bind(course.level.as_str())
        .bind(course.duration_hours)
        .bind(course.is_published)
        .bind(course.instructor_id)
        .fetch_one(&self.pool)
        .await?;

        let id: Uuid = column(&row, "id")?;
        let created_at: DateTime<Utc> = column(&row, "created_at")?;
        tracing::info!(%id, title = %course.title, "course created");

        Ok(Course {
            id,
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
            created_at,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let record =
            sqlx::query("SELECT id, email FROM learnsphere.users WHERE lower(email) = lower($1)")
                .bind(email.trim())
                .fetch_optional(&self.pool)
                .await?;

        record
            .map(|row| -> Result<User> {
                Ok(User {
                    id: column(&row, "id")?,
                    email: column(&row, "email")?,
                })
            })
            .transpose()
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|err| CatalogError::Decode(format!("column {name}: {err}")))
}

fn decode_course_row(row: &PgRow) -> Result<CourseRow> {
    let id: Uuid = column(row, "id")?;
    let level_text: Option<String> = column(row, "level")?;
    let level = level_text.and_then(|text| match text.parse::<CourseLevel>() {
        Ok(level) => Some(level),
        Err(reason) => {
            tracing::warn!(%id, %reason, "ignoring course level");
            None
        }
    });

    Ok(CourseRow {
        course: Course {
            id,
            title: column(row, "title")?,
            short_description: column(row, "short_description")?,
            description: column(row, "description")?,
            price: column(row, "price")?,
            level,
            duration_hours: column(row, "duration_hours")?,
            thumbnail_url: column(row, "thumbnail_url")?,
            is_published: column(row, "is_published")?,
            instructor_id: column(row, "instructor_id")?,
            category_id: column(row, "category_id")?,
            created_at: column(row, "created_at")?,
        },
        instructor_name: column(row, "instructor_name")?,
        category_name: column(row, "category_name")?,
    })
}

fn decode_enrollment(row: &PgRow) -> Result<Enrollment> {
    let joined_course_id: Option<Uuid> = column(row, "joined_course_id")?;
    let course = match joined_course_id {
        Some(id) => Some(EnrollmentCourse {
            id,
            title: column(row, "course_title")?,
            thumbnail_url: column(row, "course_thumbnail_url")?,
            duration_hours: column(row, "course_duration_hours")?,
        }),
        None => None,
    };

    Ok(Enrollment {
        id: column(row, "id")?,
        student_id: column(row, "student_id")?,
        course_id: column(row, "course_id")?,
        progress_percentage: column(row, "progress_percentage")?,
        enrolled_at: column(row, "enrolled_at")?,
        completed_at: column(row, "completed_at")?,
        course,
    })
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Demo accounts as (id, email, full name, role): one of each role.
fn seed_users() -> anyhow::Result<Vec<(Uuid, &'static str, &'static str, &'static str)>> {
    Ok(vec![
        (
            Uuid::parse_str("b8e2c4d1-6a3f-4c9e-8d21-5f0a7e3b9c11")?,
            "dana.whitfield@learnsphere.dev",
            "Dana Whitfield",
            "instructor",
        ),
        (
            Uuid::parse_str("b8e2c4d1-6a3f-4c9e-8d21-5f0a7e3b9c12")?,
            "marisol.okafor@learnsphere.dev",
            "Marisol Okafor",
            "student",
        ),
        (
            Uuid::parse_str("b8e2c4d1-6a3f-4c9e-8d21-5f0a7e3b9c13")?,
            "theo.lindqvist@learnsphere.dev",
            "Theo Lindqvist",
            "admin",
        ),
    ])
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = seed_users()?;

    for (id, email, full_name, role) in &users {
        sqlx::query(
            r#"
            INSERT INTO learnsphere.users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email
            "#,
        )
        .bind(id)
        .bind(email)
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO learnsphere.profiles (id, user_id, full_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name, role = EXCLUDED.role, updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(full_name)
        .bind(role)
        .execute(pool)
        .await?;
    }

    let categories = vec![
        (
            Uuid::parse_str("9a4c3e61-5a0e-4d43-9a53-0f4bd6f0c101")?,
            "Programming",
            "Languages, tooling and software craft",
        ),
        (
            Uuid::parse_str("9a4c3e61-5a0e-4d43-9a53-0f4bd6f0c102")?,
            "Data Science",
            "Statistics, analysis and machine learning",
        ),
        (
            Uuid::parse_str("9a4c3e61-5a0e-4d43-9a53-0f4bd6f0c103")?,
            "Design",
            "Interfaces, typography and visual systems",
        ),
    ];

    for (id, name, description) in &categories {
        sqlx::query(
            r#"
            INSERT INTO learnsphere.categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, description = EXCLUDED.description
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    let instructor_id = users[0].0;
    let courses = vec![
        (
            "6f1e0c3a-7d52-4b8e-9a0f-1c2d3e4f5a01",
            "Intro to Go",
            "Write fast, simple services with Go",
            "Start from the toolchain and finish with a small HTTP service, covering goroutines, channels and testing along the way.",
            0.0,
            "beginner",
            8,
            true,
            0usize,
        ),
        (
            "6f1e0c3a-7d52-4b8e-9a0f-1c2d3e4f5a02",
            "Advanced Rust",
            "Lifetimes, traits and async in depth",
            "A practical tour of ownership patterns, trait design and async runtimes for engineers already shipping Rust.",
            89.0,
            "advanced",
            14,
            true,
            0,
        ),
        (
            "6f1e0c3a-7d52-4b8e-9a0f-1c2d3e4f5a03",
            "Practical Statistics",
            "Reason about data with confidence",
            "Distributions, sampling and hypothesis testing taught through real datasets.",
            49.0,
            "intermediate",
            10,
            true,
            1,
        ),
        (
            "6f1e0c3a-7d52-4b8e-9a0f-1c2d3e4f5a04",
            "Interface Typography",
            "Type systems for product designers",
            "Choosing, pairing and scaling type for dense product interfaces.",
            29.0,
            "beginner",
            4,
            true,
            2,
        ),
        (
            "6f1e0c3a-7d52-4b8e-9a0f-1c2d3e4f5a05",
            "Machine Learning Foundations",
            "Models from first principles",
            "Linear models, gradient descent and evaluation, built up without a framework.",
            119.0,
            "intermediate",
            20,
            false,
            1,
        ),
    ];

    for (id, title, short_description, description, price, level, hours, published, category) in
        &courses
    {
        sqlx::query(
            r#"
            INSERT INTO learnsphere.courses
            (id, title, short_description, description, price, level,
             duration_hours, is_published, instructor_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                short_description = EXCLUDED.short_description,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                level = EXCLUDED.level,
                duration_hours = EXCLUDED.duration_hours,
                is_published = EXCLUDED.is_published,
                category_id = EXCLUDED.category_id,
                updated_at = now()
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(title)
        .bind(short_description)
        .bind(description)
        .bind(price)
        .bind(level)
        .bind(hours)
        .bind(published)
        .bind(instructor_id)
        .bind(categories[*category].0)
        .execute(pool)
        .await?;
    }

    let student_id = users[1].0;
    let completed_on = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .context("invalid date")?
        .with_timezone(&Utc);
    let enrollments = vec![
        (courses[0].0, 40, None),
        (courses[2].0, 100, Some(completed_on)),
        (courses[3].0, 15, None),
    ];

    for (course_id, progress, completed_at) in enrollments {
        sqlx::query(
            r#"
            INSERT INTO learnsphere.enrollments
            (id, student_id, course_id, progress_percentage, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, course_id) DO UPDATE
            SET progress_percentage = EXCLUDED.progress_percentage,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(Uuid::parse_str(course_id)?)
        .bind(progress)
        .bind(completed_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}
