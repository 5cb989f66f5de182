use uuid::Uuid;

use crate::db::{CatalogStore, CourseQuery};
use crate::error::Result;
use crate::metrics::{MetricsProvider, MetricsView};
use crate::models::{CourseWithDisplayInfo, DashboardStats, Enrollment, Profile};
use crate::search;
use crate::session::{self, Session};
use crate::stats;

pub const FEATURED_LIMIT: i64 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ListingView {
    pub search_term: String,
    pub total: usize,
    pub courses: Vec<CourseWithDisplayInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Found(Box<CourseWithDisplayInfo>),
    NotFound(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub greeting_name: String,
    pub profile: Option<Profile>,
    pub enrollments: Vec<Enrollment>,
    pub stats: DashboardStats,
}

pub async fn load_featured<S: CatalogStore, M: MetricsProvider>(
    store: &S,
    metrics: &mut M,
) -> Result<Vec<CourseWithDisplayInfo>> {
    let rows = store
        .fetch_courses(CourseQuery::featured(FEATURED_LIMIT))
        .await?;
    Ok(metrics.decorate(rows, MetricsView::Listing))
}

pub async fn load_listing<S: CatalogStore, M: MetricsProvider>(
    store: &S,
    metrics: &mut M,
    search_term: &str,
) -> Result<ListingView> {
    let rows = store.fetch_courses(CourseQuery::published()).await?;
    let total = rows.len();
    let courses = metrics.decorate(rows, MetricsView::Listing);
    let courses = search::filter_courses(&courses, search_term);
    tracing::debug!(total, shown = courses.len(), "course listing filtered");

    Ok(ListingView {
        search_term: search_term.to_string(),
        total,
        courses,
    })
}

pub async fn load_detail<S: CatalogStore, M: MetricsProvider>(
    store: &S,
    metrics: &mut M,
    id: Uuid,
) -> Result<DetailView> {
    match store.fetch_course(id).await? {
        Some(row) => {
            let info = CourseWithDisplayInfo {
                metrics: metrics.metrics_for(&row, MetricsView::Detail),
                row,
            };
            Ok(DetailView::Found(Box::new(info)))
        }
        None => Ok(DetailView::NotFound(id)),
    }
}

pub async fn load_dashboard<S: CatalogStore>(
    store: &S,
    session: Option<&Session>,
) -> Result<DashboardView> {
    let session = session::require(session)?;
    let profile = store.fetch_profile(session.user_id()).await?;
    let enrollments = store.fetch_enrollments(session.user_id()).await?;
    let stats = stats::summarize_enrollments(&enrollments);

    let greeting_name = profile
        .as_ref()
        .and_then(|profile| profile.full_name.clone())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| session.email().to_string());

    Ok(DashboardView {
        greeting_name,
        profile,
        enrollments,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::metrics::tests::sample_row;
    use crate::metrics::{MockMetricsProvider, DETAIL_RATING};
    use crate::models::{EnrollmentCourse, User};
    use crate::testing::MemoryStore;
    use chrono::Utc;

    fn catalog() -> Vec<crate::models::CourseRow> {
        let mut hidden = sample_row("Machine Learning Foundations");
        hidden.course.is_published = false;
        vec![
            sample_row("Intro to Go"),
            sample_row("Advanced Rust"),
            hidden,
            sample_row("Practical Statistics"),
        ]
    }

    fn signed_in(email: &str) -> Session {
        Session {
            user: User {
                id: Uuid::new_v4(),
                email: email.to_string(),
            },
            established_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn listing_hides_unpublished_and_applies_search() {
        let store = MemoryStore::with_courses(catalog());
        let mut metrics = MockMetricsProvider::seeded(1);

        let view = load_listing(&store, &mut metrics, "go").await.unwrap();

        assert_eq!(view.total, 3);
        assert_eq!(view.courses.len(), 1);
        assert_eq!(view.courses[0].row.course.title, "Intro to Go");
    }

    #[tokio::test]
    async fn blank_search_shows_every_published_course() {
        let store = MemoryStore::with_courses(catalog());
        let mut metrics = MockMetricsProvider::seeded(2);

        let view = load_listing(&store, &mut metrics, "  ").await.unwrap();

        let titles: Vec<_> = view.courses.iter().map(|c| c.row.course.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro to Go", "Advanced Rust", "Practical Statistics"]);
    }

    #[tokio::test]
    async fn featured_is_capped() {
        let rows = (0..10).map(|i| sample_row(&format!("Course {i}"))).collect();
        let store = MemoryStore::with_courses(rows);
        let mut metrics = MockMetricsProvider::seeded(3);

        let featured = load_featured(&store, &mut metrics).await.unwrap();

        assert_eq!(featured.len(), FEATURED_LIMIT as usize);
    }

    #[tokio::test]
    async fn unknown_course_is_not_found_view() {
        let store = MemoryStore::with_courses(catalog());
        let mut metrics = MockMetricsProvider::seeded(4);
        let id = Uuid::new_v4();

        let view = load_detail(&store, &mut metrics, id).await.unwrap();

        assert_eq!(view, DetailView::NotFound(id));
    }

    #[tokio::test]
    async fn known_course_uses_detail_rating() {
        let rows = catalog();
        let id = rows[1].course.id;
        let store = MemoryStore::with_courses(rows);
        let mut metrics = MockMetricsProvider::seeded(5);

        match load_detail(&store, &mut metrics, id).await.unwrap() {
            DetailView::Found(info) => {
                assert_eq!(info.row.course.title, "Advanced Rust");
                assert_eq!(info.metrics.rating, DETAIL_RATING);
            }
            other => panic!("expected course, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn backend_error_propagates_from_listing() {
        let store = MemoryStore::failing("connection refused");
        let mut metrics = MockMetricsProvider::seeded(6);

        let result = load_listing(&store, &mut metrics, "").await;

        assert!(matches!(result, Err(CatalogError::Backend(_))));
    }

    #[tokio::test]
    async fn dashboard_requires_session() {
        let store = MemoryStore::default();
        let result = load_dashboard(&store, None).await;
        assert!(matches!(result, Err(CatalogError::NotAuthenticated(_))));
    }

    #[tokio::test]
    async fn dashboard_summarizes_only_the_users_enrollments() {
        let session = signed_in("marisol.okafor@learnsphere.dev");
        let mut store = MemoryStore::default();
        let enroll = |student_id, progress, completed: bool, hours| {
            let course_id = Uuid::new_v4();
            Enrollment {
                id: Uuid::new_v4(),
                student_id,
                course_id,
                progress_percentage: Some(progress),
                enrolled_at: Utc::now(),
                completed_at: completed.then(Utc::now),
                course: Some(EnrollmentCourse {
                    id: course_id,
                    title: Some("Intro to Go".to_string()),
                    thumbnail_url: None,
                    duration_hours: Some(hours),
                }),
            }
        };
        store.enrollments = vec![
            enroll(session.user_id(), 40, false, 2),
            enroll(session.user_id(), 100, true, 3),
            enroll(Uuid::new_v4(), 10, false, 50),
        ];
        store.profiles = vec![Profile {
            user_id: session.user_id(),
            full_name: Some("Marisol Okafor".to_string()),
            role: Some("student".to_string()),
        }];

        let view = load_dashboard(&store, Some(&session)).await.unwrap();

        assert_eq!(view.greeting_name, "Marisol Okafor");
        assert_eq!(view.enrollments.len(), 2);
        assert_eq!(
            view.stats,
            DashboardStats {
                total_courses: 2,
                completed_courses: 1,
                total_hours: 5.0,
                avg_progress: 70,
            }
        );
    }

    #[tokio::test]
    async fn dashboard_greets_by_email_without_profile_name() {
        let session = signed_in("theo.lindqvist@learnsphere.dev");
        let store = MemoryStore::default();

        let view = load_dashboard(&store, Some(&session)).await.unwrap();

        assert_eq!(view.greeting_name, "theo.lindqvist@learnsphere.dev");
        assert_eq!(view.stats, DashboardStats::default());
    }
}
