use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    CourseDetail, CourseListResponse, CourseSummary, GenerateCourseRequest, GenerateCourseResponse,
    GeneratedCourse, Lesson, ModuleDetail, Provider, QuizDetail,
};
use crate::services::generator::CourseGenerator;
use crate::services::tokens::TokenLifecycleManager;

#[derive(Clone)]
pub struct CourseService {
    db: SqlitePool,
    tokens: TokenLifecycleManager,
    generator: Arc<dyn CourseGenerator>,
}

impl CourseService {
    pub fn new(db: SqlitePool, tokens: TokenLifecycleManager, generator: Arc<dyn CourseGenerator>) -> Self {
        Self { db, tokens, generator }
    }

    pub async fn list_courses(&self, user_id: &str) -> Result<CourseListResponse, AppError> {
        let courses: Vec<CourseSummary> = repository::fetch_courses_by_user(&self.db, user_id)
            .await?
            .into_iter()
            .map(CourseSummary::from)
            .collect();

        Ok(CourseListResponse {
            total: courses.len(),
            courses,
        })
    }

    /// `None` when the course does not exist or belongs to someone else.
    pub async fn course_detail(&self, course_id: &str, user_id: &str) -> Result<Option<CourseDetail>, AppError> {
        let mut conn = self.db.acquire().await?;

        let Some(course) = repository::find_course(&mut conn, course_id, user_id).await? else {
            return Ok(None);
        };
        let modules = repository::fetch_modules(&mut conn, course_id).await?;

        let mut lessons_by_module: HashMap<String, Vec<Lesson>> = HashMap::new();
        for lesson in repository::fetch_lessons(&mut conn, course_id).await? {
            lessons_by_module.entry(lesson.module_id.clone()).or_default().push(lesson);
        }

        let mut quizzes_by_module: HashMap<String, Vec<QuizDetail>> = HashMap::new();
        for quiz in repository::fetch_quizzes(&mut conn, course_id).await? {
            quizzes_by_module
                .entry(quiz.module_id.clone())
                .or_default()
                .push(QuizDetail::from(quiz));
        }

        let modules = modules
            .into_iter()
            .map(|module| ModuleDetail {
                lessons: lessons_by_module.remove(&module.id).unwrap_or_default(),
                quizzes: quizzes_by_module.remove(&module.id).unwrap_or_default(),
                id: module.id,
                title: module.title,
                order_index: module.order_index,
                is_completed: module.is_completed,
                created_at: module.created_at,
                updated_at: module.updated_at,
            })
            .collect();

        Ok(Some(CourseDetail {
            course: CourseSummary::from(course),
            modules,
        }))
    }

    pub async fn save_generated_course(
        &self,
        user_id: &str,
        generated: &GeneratedCourse,
    ) -> Result<GenerateCourseResponse, AppError> {
        let course = repository::insert_generated_course(&self.db, user_id, generated).await?;
        info!(user_id, course_id = %course.id, modules = generated.modules.len(), "course saved");

        Ok(GenerateCourseResponse {
            course_id: course.id.clone(),
            course: CourseSummary::from(course),
        })
    }

    /// Generation proceeds without Drive access when no usable token exists.
    pub async fn generate_course(
        &self,
        user_id: &str,
        request: &GenerateCourseRequest,
    ) -> Result<GenerateCourseResponse, AppError> {
        let drive_token = self.tokens.get_valid_access_token(user_id, Provider::Drive).await?;
        if drive_token.is_none() {
            warn!(user_id, "no valid drive token, generating course without it");
        }

        let generated = self.generator.generate(request, drive_token.as_deref()).await?;
        self.save_generated_course(user_id, &generated).await
    }
}
