//! Course progress and the completion cascade.
//!
//! A lesson or quiz toggle runs three steps inside one transaction: write the
//! leaf flag, re-derive every module flag in the course, then recompute and
//! store the course progress. The transaction takes SQLite's write lock up
//! front, so overlapping toggles wait on the busy timeout instead of failing.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{CompletionResult, CourseCounts, ItemKind};

pub const FULL_PROGRESS: f64 = 100.0;

/// Weighted completion percentage for a course.
///
/// Each class (modules, lessons, quizzes) is weighted by its share of all
/// completable items and contributes `weight * 100 * completed / count`.
/// `weight * completed / count` reduces to `completed / total`, so the sum is
/// taken over completed items first; a fully completed course lands on exactly
/// 100.0 instead of drifting below it.
pub fn course_progress(counts: &CourseCounts) -> f64 {
    let total = counts.total();
    if total <= 0 {
        return FULL_PROGRESS;
    }

    let completed: i64 = counts
        .classes()
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, done)| (*done).clamp(0, *count))
        .sum();

    (completed as f64 * FULL_PROGRESS / total as f64).clamp(0.0, FULL_PROGRESS)
}

pub fn is_course_completed(progress: f64) -> bool {
    progress >= FULL_PROGRESS
}

#[derive(Clone)]
pub struct ProgressEngine {
    db: SqlitePool,
}

impl ProgressEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn set_lesson_completion(
        &self,
        lesson_id: &str,
        user_id: &str,
        is_completed: bool,
    ) -> Result<CompletionResult, AppError> {
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;

        let item = repository::find_owned_lesson(&mut tx, lesson_id, user_id)
            .await?
            .ok_or(AppError::NotFoundOrForbidden("Lesson"))?;

        repository::set_lesson_completed(&mut tx, &item.item_id, is_completed).await?;
        let progress = Self::cascade(&mut tx, &item.course_id, user_id).await?;

        tx.commit().await?;

        info!(lesson_id, course_id = %item.course_id, is_completed, progress, "lesson completion updated");
        Ok(CompletionResult::new(ItemKind::Lesson, lesson_id, is_completed, progress))
    }

    pub async fn set_quiz_completion(
        &self,
        quiz_id: &str,
        user_id: &str,
        is_completed: bool,
        is_correct: Option<bool>,
    ) -> Result<CompletionResult, AppError> {
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;

        let item = repository::find_owned_quiz(&mut tx, quiz_id, user_id)
            .await?
            .ok_or(AppError::NotFoundOrForbidden("Quiz"))?;

        repository::set_quiz_completed(&mut tx, &item.item_id, is_completed, is_correct).await?;
        let progress = Self::cascade(&mut tx, &item.course_id, user_id).await?;

        tx.commit().await?;

        info!(quiz_id, course_id = %item.course_id, is_completed, progress, "quiz completion updated");
        Ok(CompletionResult::new(ItemKind::Quiz, quiz_id, is_completed, progress))
    }

    /// Re-derives module flags and course progress without touching any leaf.
    pub async fn recalculate_course(&self, course_id: &str, user_id: &str) -> Result<f64, AppError> {
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;

        if repository::find_course(&mut tx, course_id, user_id).await?.is_none() {
            return Err(AppError::NotFoundOrForbidden("Course"));
        }
        let progress = Self::cascade(&mut tx, course_id, user_id).await?;

        tx.commit().await?;
        Ok(progress)
    }

    /// Returns how many module flags changed.
    pub async fn recompute_module_completion(&self, course_id: &str) -> Result<usize, AppError> {
        let mut conn = self.db.acquire().await?;
        Ok(Self::recompute_modules(&mut conn, course_id).await?)
    }

    pub async fn compute_course_progress(&self, course_id: &str, user_id: &str) -> Result<f64, AppError> {
        let mut conn = self.db.acquire().await?;
        Self::progress_for(&mut conn, course_id, user_id)
            .await?
            .ok_or(AppError::NotFoundOrForbidden("Course"))
    }

    /// Returns false, without failing, when the course row is missing or not
    /// owned by `user_id`.
    pub async fn apply_course_progress(
        &self,
        course_id: &str,
        user_id: &str,
        progress: f64,
    ) -> Result<bool, AppError> {
        let mut conn = self.db.acquire().await?;
        Ok(Self::store_progress(&mut conn, course_id, user_id, progress).await?)
    }

    async fn cascade(
        conn: &mut SqliteConnection,
        course_id: &str,
        user_id: &str,
    ) -> Result<f64, AppError> {
        let changed = Self::recompute_modules(conn, course_id).await?;
        debug!(course_id, changed, "module completion recomputed");

        let Some(progress) = Self::progress_for(conn, course_id, user_id).await? else {
            warn!(course_id, user_id, "course missing during cascade");
            return Err(AppError::NotFoundOrForbidden("Course"));
        };

        if !Self::store_progress(conn, course_id, user_id, progress).await? {
            warn!(course_id, user_id, "failed to update course progress");
        }
        Ok(progress)
    }

    async fn recompute_modules(conn: &mut SqliteConnection, course_id: &str) -> Result<usize, sqlx::Error> {
        let modules = repository::fetch_module_counts(conn, course_id).await?;

        let mut changed = 0;
        for module in modules {
            let should_be_completed = module.should_be_completed();
            if should_be_completed != module.is_completed {
                repository::set_module_completed(conn, &module.module_id, should_be_completed).await?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn progress_for(
        conn: &mut SqliteConnection,
        course_id: &str,
        user_id: &str,
    ) -> Result<Option<f64>, sqlx::Error> {
        let counts = repository::fetch_course_counts(conn, course_id, user_id).await?;
        Ok(counts.as_ref().map(course_progress))
    }

    async fn store_progress(
        conn: &mut SqliteConnection,
        course_id: &str,
        user_id: &str,
        progress: f64,
    ) -> Result<bool, sqlx::Error> {
        let progress = progress.clamp(0.0, FULL_PROGRESS);
        repository::update_course_progress(conn, course_id, user_id, progress, is_course_completed(progress)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(modules: (i64, i64), lessons: (i64, i64), quizzes: (i64, i64)) -> CourseCounts {
        CourseCounts {
            modules_total: modules.0,
            modules_done: modules.1,
            lessons_total: lessons.0,
            lessons_done: lessons.1,
            quizzes_total: quizzes.0,
            quizzes_done: quizzes.1,
        }
    }

    #[test]
    fn empty_course_is_fully_complete() {
        assert_eq!(course_progress(&CourseCounts::default()), 100.0);
    }

    #[test]
    fn weights_follow_class_share() {
        // 1 module + 2 lessons: one lesson done is 1/3 of all items.
        let p = course_progress(&counts((1, 0), (2, 1), (0, 0)));
        assert!((p - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(format!("{:.1}", p), "33.3");

        // Both lessons done but module not yet derived: 2/3.
        let p = course_progress(&counts((1, 0), (2, 2), (0, 0)));
        assert!((p - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn fully_completed_course_is_exactly_full() {
        let p = course_progress(&counts((1, 1), (2, 2), (0, 0)));
        assert_eq!(p, 100.0);
        assert!(is_course_completed(p));

        let p = course_progress(&counts((3, 3), (7, 7), (5, 5)));
        assert_eq!(p, 100.0);
    }

    #[test]
    fn empty_classes_do_not_block() {
        let p = course_progress(&counts((2, 2), (0, 0), (0, 0)));
        assert_eq!(p, 100.0);

        let p = course_progress(&counts((0, 0), (0, 0), (4, 1)));
        assert_eq!(p, 25.0);
    }

    #[test]
    fn progress_is_clamped() {
        // Inconsistent counts never escape [0, 100].
        let p = course_progress(&counts((1, 5), (1, 9), (0, 0)));
        assert_eq!(p, 100.0);
        let p = course_progress(&counts((1, -3), (1, 0), (0, 0)));
        assert_eq!(p, 0.0);
    }

    #[test]
    fn completion_is_exact_threshold() {
        assert!(!is_course_completed(99.99999999));
        assert!(is_course_completed(100.0));
    }
}
