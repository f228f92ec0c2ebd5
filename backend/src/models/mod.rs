pub mod course;
pub mod oauth;
pub mod progress;

pub use course::{
    CompletionRequest, Course, CourseDetail, CourseListResponse, CourseSummary,
    GenerateCourseRequest, GenerateCourseResponse, GeneratedCourse, GeneratedLesson,
    GeneratedModule, GeneratedQuiz, Lesson, LessonCompletionResponse, Module, ModuleDetail,
    Quiz, QuizCompletionResponse, QuizDetail, RecalculateResponse,
};
pub use oauth::{
    AuthUrlQuery, AuthUrlResponse, OAuthCallbackRequest, OAuthToken, OAuthTokenView, Provider,
    RefreshTokenResponse, TokenResponse,
};
pub use progress::{CompletionResult, CourseCounts, ItemKind, ModuleCounts, OwnedItem};
