use sqlx::FromRow;

/// Completable-item counts for one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct CourseCounts {
    pub modules_total: i64,
    pub modules_done: i64,
    pub lessons_total: i64,
    pub lessons_done: i64,
    pub quizzes_total: i64,
    pub quizzes_done: i64,
}

impl CourseCounts {
    pub fn total(&self) -> i64 {
        self.modules_total + self.lessons_total + self.quizzes_total
    }

    /// `(count, completed)` per item class: modules, lessons, quizzes.
    pub fn classes(&self) -> [(i64, i64); 3] {
        [
            (self.modules_total, self.modules_done),
            (self.lessons_total, self.lessons_done),
            (self.quizzes_total, self.quizzes_done),
        ]
    }
}

/// Child counts for one module, alongside its stored flag.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ModuleCounts {
    pub module_id: String,
    pub is_completed: bool,
    pub lessons_total: i64,
    pub lessons_done: i64,
    pub quizzes_total: i64,
    pub quizzes_done: i64,
}

impl ModuleCounts {
    /// A module is complete when it has at least one lesson or quiz and all of
    /// them are complete.
    pub fn should_be_completed(&self) -> bool {
        self.lessons_total + self.quizzes_total > 0
            && self.lessons_done >= self.lessons_total
            && self.quizzes_done >= self.quizzes_total
    }
}

/// Ownership-verified handle for a lesson or quiz.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OwnedItem {
    pub item_id: String,
    pub module_id: String,
    pub course_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Lesson,
    Quiz,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Lesson => "Lesson",
            ItemKind::Quiz => "Quiz",
        }
    }
}

/// Outcome of a completion toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub success: bool,
    pub message: String,
    pub item_id: String,
    pub is_completed: bool,
    pub course_progress: f64,
}

impl CompletionResult {
    pub fn new(kind: ItemKind, item_id: &str, is_completed: bool, course_progress: f64) -> Self {
        let state = if is_completed { "completed" } else { "incomplete" };
        Self {
            success: true,
            message: format!(
                "{} marked as {}. Course progress: {:.1}%",
                kind.label(),
                state,
                course_progress
            ),
            item_id: item_id.to_string(),
            is_completed,
            course_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(lessons: (i64, i64), quizzes: (i64, i64)) -> ModuleCounts {
        ModuleCounts {
            module_id: "m".to_string(),
            is_completed: false,
            lessons_total: lessons.0,
            lessons_done: lessons.1,
            quizzes_total: quizzes.0,
            quizzes_done: quizzes.1,
        }
    }

    #[test]
    fn empty_module_is_never_completed() {
        assert!(!module((0, 0), (0, 0)).should_be_completed());
    }

    #[test]
    fn module_needs_every_lesson_and_quiz() {
        assert!(!module((2, 1), (0, 0)).should_be_completed());
        assert!(!module((2, 2), (1, 0)).should_be_completed());
        assert!(module((2, 2), (1, 1)).should_be_completed());
        assert!(module((0, 0), (3, 3)).should_be_completed());
    }

    #[test]
    fn completion_message_has_one_decimal() {
        let result = CompletionResult::new(ItemKind::Lesson, "abc", true, 100.0 / 3.0);
        assert_eq!(result.message, "Lesson marked as completed. Course progress: 33.3%");
        assert!(result.success);

        let result = CompletionResult::new(ItemKind::Quiz, "q", false, 0.0);
        assert_eq!(result.message, "Quiz marked as incomplete. Course progress: 0.0%");
    }
}
