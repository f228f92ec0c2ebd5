use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{
    Course, CourseCounts, GeneratedCourse, Lesson, Module, ModuleCounts, OwnedItem, Quiz,
};

const COURSE_COLUMNS: &str = "id, user_id, title, description, estimated_duration, difficulty, \
     learning_objectives, source_from, progress, is_completed, created_at, updated_at";

pub async fn fetch_courses_by_user(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE user_id = ?1 ORDER BY created_at DESC",
        COURSE_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_course(
    conn: &mut SqliteConnection,
    course_id: &str,
    user_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE id = ?1 AND user_id = ?2",
        COURSE_COLUMNS
    ))
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn fetch_modules(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(
        r#"
        SELECT id, course_id, title, order_index, is_completed, created_at, updated_at
        FROM modules
        WHERE course_id = ?1
        ORDER BY order_index ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn fetch_lessons(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(
        r#"
        SELECT l.id, l.module_id, l.title, l.content, l.lesson_index, l.is_completed,
               l.created_at, l.updated_at
        FROM lessons l
        JOIN modules m ON m.id = l.module_id
        WHERE m.course_id = ?1
        ORDER BY m.order_index ASC, l.lesson_index ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn fetch_quizzes(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT q.id, q.module_id, q.question, q.options, q.answer, q.is_completed,
               q.is_correct, q.created_at, q.updated_at
        FROM quizzes q
        JOIN modules m ON m.id = q.module_id
        WHERE m.course_id = ?1
        ORDER BY m.order_index ASC, q.created_at ASC, q.rowid ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

/// Inserts a course with its modules, lessons and quizzes in one transaction.
pub async fn insert_generated_course(
    db: &SqlitePool,
    user_id: &str,
    generated: &GeneratedCourse,
) -> Result<Course, sqlx::Error> {
    let course_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let learning_objectives = serde_json::to_string(&generated.learning_objectives)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let source_from = serde_json::to_string(&generated.source_from)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, user_id, title, description, estimated_duration, difficulty,
            learning_objectives, source_from, progress, is_completed, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0.0, 0, ?9, ?9)
        "#,
    )
    .bind(&course_id)
    .bind(user_id)
    .bind(&generated.title)
    .bind(&generated.description)
    .bind(generated.estimated_duration)
    .bind(&generated.difficulty)
    .bind(&learning_objectives)
    .bind(&source_from)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for module in &generated.modules {
        let module_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO modules (id, course_id, title, order_index, is_completed, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
            "#,
        )
        .bind(&module_id)
        .bind(&course_id)
        .bind(&module.title)
        .bind(module.index)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for lesson in &module.lessons {
            sqlx::query(
                r#"
                INSERT INTO lessons
                    (id, module_id, title, content, lesson_index, is_completed, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&module_id)
            .bind(&lesson.title)
            .bind(&lesson.content)
            .bind(lesson.index)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        for quiz in &module.quizzes {
            let options = serde_json::to_string(&quiz.options)
                .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            sqlx::query(
                r#"
                INSERT INTO quizzes
                    (id, module_id, question, options, answer, is_completed, is_correct,
                    created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&module_id)
            .bind(&quiz.question)
            .bind(&options)
            .bind(&quiz.answer)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
    }

    let course = find_course(&mut tx, &course_id, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    tx.commit().await?;
    Ok(course)
}

/// Resolves a lesson through module and course to its owner in one query.
pub async fn find_owned_lesson(
    conn: &mut SqliteConnection,
    lesson_id: &str,
    user_id: &str,
) -> Result<Option<OwnedItem>, sqlx::Error> {
    sqlx::query_as::<_, OwnedItem>(
        r#"
        SELECT l.id AS item_id, l.module_id AS module_id, m.course_id AS course_id
        FROM lessons l
        JOIN modules m ON m.id = l.module_id
        JOIN courses c ON c.id = m.course_id
        WHERE l.id = ?1 AND c.user_id = ?2
        "#,
    )
    .bind(lesson_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Resolves a quiz through module and course to its owner in one query.
pub async fn find_owned_quiz(
    conn: &mut SqliteConnection,
    quiz_id: &str,
    user_id: &str,
) -> Result<Option<OwnedItem>, sqlx::Error> {
    sqlx::query_as::<_, OwnedItem>(
        r#"
        SELECT q.id AS item_id, q.module_id AS module_id, m.course_id AS course_id
        FROM quizzes q
        JOIN modules m ON m.id = q.module_id
        JOIN courses c ON c.id = m.course_id
        WHERE q.id = ?1 AND c.user_id = ?2
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn set_lesson_completed(
    conn: &mut SqliteConnection,
    lesson_id: &str,
    is_completed: bool,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE lessons SET is_completed = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(is_completed)
    .bind(&now)
    .bind(lesson_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(result > 0)
}

/// `is_correct` is left untouched when `None`.
pub async fn set_quiz_completed(
    conn: &mut SqliteConnection,
    quiz_id: &str,
    is_completed: bool,
    is_correct: Option<bool>,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        UPDATE quizzes
        SET is_completed = ?1,
            is_correct = COALESCE(?2, is_correct),
            updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(is_completed)
    .bind(is_correct)
    .bind(&now)
    .bind(quiz_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_module_counts(
    conn: &mut SqliteConnection,
    course_id: &str,
) -> Result<Vec<ModuleCounts>, sqlx::Error> {
    sqlx::query_as::<_, ModuleCounts>(
        r#"
        SELECT
            m.id AS module_id,
            m.is_completed AS is_completed,
            (SELECT COUNT(*) FROM lessons l WHERE l.module_id = m.id) AS lessons_total,
            (SELECT COUNT(*) FROM lessons l WHERE l.module_id = m.id AND l.is_completed = 1) AS lessons_done,
            (SELECT COUNT(*) FROM quizzes q WHERE q.module_id = m.id) AS quizzes_total,
            (SELECT COUNT(*) FROM quizzes q WHERE q.module_id = m.id AND q.is_completed = 1) AS quizzes_done
        FROM modules m
        WHERE m.course_id = ?1
        ORDER BY m.order_index ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn set_module_completed(
    conn: &mut SqliteConnection,
    module_id: &str,
    is_completed: bool,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE modules SET is_completed = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(is_completed)
    .bind(&now)
    .bind(module_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(result > 0)
}

/// Item counts for a course owned by `user_id`; `None` when no such course.
pub async fn fetch_course_counts(
    conn: &mut SqliteConnection,
    course_id: &str,
    user_id: &str,
) -> Result<Option<CourseCounts>, sqlx::Error> {
    sqlx::query_as::<_, CourseCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM modules m WHERE m.course_id = c.id) AS modules_total,
            (SELECT COUNT(*) FROM modules m WHERE m.course_id = c.id AND m.is_completed = 1) AS modules_done,
            (SELECT COUNT(*) FROM lessons l JOIN modules m ON m.id = l.module_id
                WHERE m.course_id = c.id) AS lessons_total,
            (SELECT COUNT(*) FROM lessons l JOIN modules m ON m.id = l.module_id
                WHERE m.course_id = c.id AND l.is_completed = 1) AS lessons_done,
            (SELECT COUNT(*) FROM quizzes q JOIN modules m ON m.id = q.module_id
                WHERE m.course_id = c.id) AS quizzes_total,
            (SELECT COUNT(*) FROM quizzes q JOIN modules m ON m.id = q.module_id
                WHERE m.course_id = c.id AND q.is_completed = 1) AS quizzes_done
        FROM courses c
        WHERE c.id = ?1 AND c.user_id = ?2
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Returns false when no course matches `course_id` and `user_id`.
pub async fn update_course_progress(
    conn: &mut SqliteConnection,
    course_id: &str,
    user_id: &str,
    progress: f64,
    is_completed: bool,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        UPDATE courses
        SET progress = ?1,
            is_completed = ?2,
            updated_at = ?3
        WHERE id = ?4 AND user_id = ?5
        "#,
    )
    .bind(progress)
    .bind(is_completed)
    .bind(&now)
    .bind(course_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(result > 0)
}
