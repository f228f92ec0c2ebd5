pub mod courses;
pub mod generator;
pub mod progress;
pub mod tokens;

pub use courses::CourseService;
pub use generator::{CourseGenerator, HttpCourseGenerator};
pub use progress::ProgressEngine;
pub use tokens::{TokenError, TokenLifecycleManager};
