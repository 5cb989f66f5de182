use std::fmt::Write;

use serde::Serialize;

use crate::models::{CourseRow, CourseWithDisplayInfo, Enrollment};
use crate::pages::{DashboardView, DetailView, ListingView};

const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) if price > 0.0 => {
            if price.fract() == 0.0 {
                format!("${price:.0}")
            } else {
                format!("${price:.2}")
            }
        }
        _ => "Free".to_string(),
    }
}

pub fn progress_bar(progress: i32) -> String {
    let progress = progress.clamp(0, 100) as usize;
    let filled = progress * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {progress}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn write_card(output: &mut String, info: &CourseWithDisplayInfo) {
    let course = &info.row.course;
    let level = course
        .level
        .map(|level| level.to_string())
        .unwrap_or_else(|| "unrated".to_string());
    let _ = writeln!(output, "## {} [{}]", course.title, level);
    if let Some(blurb) = &course.short_description {
        let _ = writeln!(output, "{blurb}");
    }
    if let Some(instructor) = &info.row.instructor_name {
        let _ = writeln!(output, "by {instructor}");
    }
    let _ = writeln!(
        output,
        "* {:.1}  {}h  {} students  {}",
        info.metrics.rating,
        course.duration_hours.unwrap_or(0),
        info.metrics.student_count,
        format_price(course.price)
    );
    let _ = writeln!(output, "id: {}", course.id);
}

pub fn render_featured(courses: &[CourseWithDisplayInfo]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Featured Courses");
    let _ = writeln!(output, "Discover our most popular courses");
    let _ = writeln!(output);

    if courses.is_empty() {
        let _ = writeln!(output, "No published courses yet.");
    }
    for info in courses {
        write_card(&mut output, info);
        let _ = writeln!(output);
    }
    output
}

pub fn render_listing(view: &ListingView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Explore All Courses");
    if !view.search_term.trim().is_empty() {
        let _ = writeln!(
            output,
            "Showing {} of {} courses matching \"{}\"",
            view.courses.len(),
            view.total,
            view.search_term
        );
    }
    let _ = writeln!(output);

    if view.courses.is_empty() {
        let _ = writeln!(output, "No courses found");
        let _ = writeln!(output, "Try adjusting your search terms");
        return output;
    }

    for info in &view.courses {
        write_card(&mut output, info);
        let _ = writeln!(output);
    }
    output
}

pub fn render_detail(view: &DetailView) -> String {
    let mut output = String::new();
    let info = match view {
        DetailView::Found(info) => info,
        DetailView::NotFound(id) => {
            let _ = writeln!(output, "# Course not found");
            let _ = writeln!(
                output,
                "The course {id} doesn't exist or has been removed."
            );
            let _ = writeln!(output, "Browse all courses with `learnsphere courses`.");
            return output;
        }
    };
    let course = &info.row.course;

    let _ = writeln!(output, "# {}", course.title);
    if let Some(blurb) = &course.short_description {
        let _ = writeln!(output, "{blurb}");
    }
    let _ = writeln!(output);

    let mut badges = Vec::new();
    if let Some(level) = course.level {
        badges.push(level.to_string());
    }
    if let Some(category) = &info.row.category_name {
        badges.push(category.clone());
    }
    if !badges.is_empty() {
        let _ = writeln!(output, "Tags: {}", badges.join(", "));
    }
    if let Some(instructor) = &info.row.instructor_name {
        let _ = writeln!(output, "Instructor: {instructor}");
    }
    let hours = course.duration_hours.unwrap_or(0);
    let _ = writeln!(
        output,
        "Rating {:.1} | {hours} hours | {} students",
        info.metrics.rating, info.metrics.student_count
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## About This Course");
    let _ = writeln!(
        output,
        "{}",
        course.description.as_deref().unwrap_or("No description yet.")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## {}", format_price(course.price));
    let _ = writeln!(output, "This course includes:");
    let _ = writeln!(output, "- {hours} hours of content");
    let _ = writeln!(output, "- Access on all devices");
    let _ = writeln!(output, "- Certificate of completion");
    output
}

fn enrollment_title(enrollment: &Enrollment) -> &str {
    enrollment
        .course
        .as_ref()
        .and_then(|course| course.title.as_deref())
        .unwrap_or("Untitled course")
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut output = String::new();
    let stats = &view.stats;

    let _ = writeln!(output, "# Welcome back, {}!", view.greeting_name);
    let _ = writeln!(
        output,
        "Continue your learning journey and track your progress."
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Enrolled courses: {}", stats.total_courses);
    let _ = writeln!(output, "Completed:        {}", stats.completed_courses);
    let _ = writeln!(output, "Learning hours:   {}", stats.total_hours);
    let _ = writeln!(output, "Avg. progress:    {}%", stats.avg_progress);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Your Courses");

    if view.enrollments.is_empty() {
        let _ = writeln!(
            output,
            "Start your learning journey by enrolling in a course."
        );
        let _ = writeln!(output, "Browse courses with `learnsphere courses`.");
        return output;
    }

    for enrollment in &view.enrollments {
        let _ = writeln!(output, "- {}", enrollment_title(enrollment));
        let _ = writeln!(
            output,
            "  {}",
            progress_bar(enrollment.progress_percentage.unwrap_or(0))
        );
        if let Some(completed_at) = enrollment.completed_at {
            let _ = writeln!(output, "  completed {}", completed_at.date_naive());
        }
    }
    output
}

pub fn render_admin_listing(rows: &[CourseRow]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Existing Courses");

    if rows.is_empty() {
        let _ = writeln!(output, "No courses created yet.");
        return output;
    }

    for row in rows {
        let course = &row.course;
        let _ = writeln!(
            output,
            "- {} ({}, {}, {}h) {}",
            course.title,
            course
                .level
                .map(|level| level.as_str())
                .unwrap_or("unrated"),
            format_price(course.price),
            course.duration_hours.unwrap_or(0),
            if course.is_published { "published" } else { "draft" }
        );
        let _ = writeln!(output, "  id: {}", course.id);
    }
    output
}

/// Course detail in the requested format. A missing course has no CSV row,
/// so that combination is an error; JSON reports it as an object.
pub fn detail_output(view: &DetailView, format: OutputFormat) -> anyhow::Result<String> {
    match (view, format) {
        (_, OutputFormat::Text) => Ok(render_detail(view)),
        (DetailView::Found(info), OutputFormat::Json) => Ok(format!("{}\n", to_json(&**info)?)),
        (DetailView::Found(info), OutputFormat::Csv) => to_csv(std::slice::from_ref(&**info)),
        (DetailView::NotFound(id), OutputFormat::Json) => Ok(format!(
            "{}\n",
            to_json(&serde_json::json!({ "error": "not_found", "id": id }))?
        )),
        (DetailView::NotFound(id), OutputFormat::Csv) => {
            anyhow::bail!("course {id} not found")
        }
    }
}

pub fn dashboard_output(view: &DashboardView, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_dashboard(view)),
        OutputFormat::Json => Ok(format!(
            "{}\n",
            to_json(&serde_json::json!({
                "greeting_name": view.greeting_name,
                "profile": view.profile,
                "stats": view.stats,
                "enrollments": view.enrollments,
            }))?
        )),
        OutputFormat::Csv => anyhow::bail!("dashboard does not support --format csv"),
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[derive(Serialize)]
struct CsvCourse<'a> {
    id: String,
    title: &'a str,
    short_description: &'a str,
    level: &'a str,
    price: f64,
    duration_hours: i32,
    instructor_name: &'a str,
    category_name: &'a str,
    rating: String,
    student_count: u32,
}

pub fn to_csv(courses: &[CourseWithDisplayInfo]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for info in courses {
        let course = &info.row.course;
        writer.serialize(CsvCourse {
            id: course.id.to_string(),
            title: &course.title,
            short_description: course.short_description.as_deref().unwrap_or(""),
            level: course.level.map(|level| level.as_str()).unwrap_or(""),
            price: course.price.unwrap_or(0.0),
            duration_hours: course.duration_hours.unwrap_or(0),
            instructor_name: info.row.instructor_name.as_deref().unwrap_or(""),
            category_name: info.row.category_name.as_deref().unwrap_or(""),
            rating: format!("{:.1}", info.metrics.rating),
            student_count: info.metrics.student_count,
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv output: {}", err.error()))?;
    Ok(String::from_utf8(bytes)?)
}
