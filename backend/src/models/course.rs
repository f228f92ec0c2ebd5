use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub estimated_duration: Option<i64>,
    pub difficulty: Option<String>,
    /// JSON array as stored.
    pub learning_objectives: String,
    /// JSON array as stored.
    pub source_from: String,
    pub progress: f64,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Module {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub order_index: i64,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub content: String,
    pub lesson_index: i64,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: String,
    pub module_id: String,
    pub question: String,
    pub options: String,
    pub answer: Option<String>,
    pub is_completed: bool,
    pub is_correct: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Course as returned by the list and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub estimated_duration: Option<i64>,
    pub difficulty: Option<String>,
    pub learning_objectives: Vec<String>,
    pub source_from: Vec<String>,
    pub progress: f64,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        Self {
            learning_objectives: parse_string_list(&course.learning_objectives),
            source_from: parse_string_list(&course.source_from),
            id: course.id,
            title: course.title,
            description: course.description,
            estimated_duration: course.estimated_duration,
            difficulty: course.difficulty,
            progress: course.progress,
            is_completed: course.is_completed,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDetail {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub is_completed: bool,
    pub is_correct: bool,
}

impl From<Quiz> for QuizDetail {
    fn from(quiz: Quiz) -> Self {
        Self {
            options: parse_string_list(&quiz.options),
            id: quiz.id,
            question: quiz.question,
            is_completed: quiz.is_completed,
            is_correct: quiz.is_correct,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDetail {
    pub id: String,
    pub title: String,
    pub order_index: i64,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<QuizDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub modules: Vec<ModuleDetail>,
}

/// Structured course content produced by the course generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCourse {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_duration: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub source_from: Vec<String>,
    #[serde(default)]
    pub modules: Vec<GeneratedModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedModule {
    pub title: String,
    pub index: i64,
    #[serde(default)]
    pub lessons: Vec<GeneratedLesson>,
    #[serde(default)]
    pub quizzes: Vec<GeneratedQuiz>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLesson {
    pub title: String,
    pub content: String,
    pub index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCourseRequest {
    pub prompt: String,
    #[serde(default)]
    pub token_github: Option<String>,
    #[serde(default)]
    pub files_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCourseResponse {
    pub course_id: String,
    pub course: CourseSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub is_completed: bool,
    /// Only meaningful for quizzes.
    #[serde(default)]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCompletionResponse {
    pub success: bool,
    pub message: String,
    pub lesson_id: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizCompletionResponse {
    pub success: bool,
    pub message: String,
    pub quiz_id: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculateResponse {
    pub course_id: String,
    pub progress: f64,
    pub is_completed: bool,
}

fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
