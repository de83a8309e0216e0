// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam_paper::{ExamPaper, ExamPaperFilter, NewExamPaper, UpdateExamPaperRequest},
        question::{Question, QuestionCriteria, QuestionExtras, QuestionImage, QuestionOption},
        reference::{ExamType, SchoolClass, Subject, Topic},
        section::{
            ExamPaperSection, GeneratedSection, NewSection, NewSectionQuestion, SectionQuestion,
        },
    },
    store::{ExamPaperStore, QuestionStore, ReferenceStore},
};

const QUESTION_COLUMNS: &str = "id, question_text, marks, difficulty_level, question_type, \
     subject_id, topic_id, class_id, created_at";

const PAPER_COLUMNS: &str = "id, title, exam_type_id, subject_id, class_id, total_marks, \
     duration_minutes, created_at, updated_at";

const SECTION_COLUMNS: &str = "id, exam_paper_id, section_number, title, instructions, \
     marks_per_question, questions_to_answer, total_questions, section_marks, created_at";

const SECTION_QUESTION_COLUMNS: &str = "id, section_id, question_id, question_number, is_optional";

/// Store backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_section<'c>(
    tx: &mut sqlx::Transaction<'c, Postgres>,
    exam_paper_id: Uuid,
    section: &NewSection,
) -> Result<ExamPaperSection, AppError> {
    let sql = format!(
        "INSERT INTO exam_paper_sections \
         (exam_paper_id, section_number, title, instructions, marks_per_question, \
          questions_to_answer, total_questions, section_marks) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {}",
        SECTION_COLUMNS
    );
    let row = sqlx::query_as::<_, ExamPaperSection>(&sql)
        .bind(exam_paper_id)
        .bind(section.section_number)
        .bind(&section.title)
        .bind(&section.instructions)
        .bind(section.marks_per_question)
        .bind(section.questions_to_answer)
        .bind(section.total_questions)
        .bind(section.section_marks())
        .fetch_one(&mut **tx)
        .await?;
    Ok(row)
}

async fn insert_associations<'c>(
    tx: &mut sqlx::Transaction<'c, Postgres>,
    section_id: Uuid,
    rows: &[NewSectionQuestion],
) -> Result<Vec<SectionQuestion>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO exam_paper_questions (section_id, question_id, question_number, is_optional) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(section_id)
            .push_bind(row.question_id)
            .push_bind(row.question_number)
            .push_bind(row.is_optional);
    });
    builder.push(" RETURNING ");
    builder.push(SECTION_QUESTION_COLUMNS);

    let inserted = builder
        .build_query_as::<SectionQuestion>()
        .fetch_all(&mut **tx)
        .await?;
    Ok(inserted)
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn filter_questions(
        &self,
        criteria: &QuestionCriteria,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Question>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(QUESTION_COLUMNS);
        builder.push(" FROM questions WHERE subject_id = ");
        builder.push_bind(criteria.subject_id);
        builder.push(" AND class_id = ");
        builder.push_bind(criteria.class_id);
        builder.push(" AND marks = ");
        builder.push_bind(criteria.marks);

        if let Some(question_type) = criteria.question_type {
            builder.push(" AND question_type = ");
            builder.push_bind(question_type);
        }

        if let Some(difficulty) = criteria.difficulty {
            builder.push(" AND difficulty_level = ");
            builder.push_bind(difficulty);
        }

        if !criteria.topic_ids.is_empty() {
            builder.push(" AND topic_id = ANY(");
            builder.push_bind(criteria.topic_ids.clone());
            builder.push(")");
        }

        if !criteria.exclude_ids.is_empty() {
            builder.push(" AND NOT (id = ANY(");
            builder.push_bind(criteria.exclude_ids.clone());
            builder.push("))");
        }

        // Random order so the bounded fetch does not always return the same rows.
        builder.push(" ORDER BY RANDOM() LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let questions = builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to filter questions: {:?}", e);
                AppError::from(e)
            })?;
        Ok(questions)
    }

    async fn options_and_images(&self, question_ids: &[Uuid]) -> Result<QuestionExtras, AppError> {
        let mut extras = QuestionExtras::default();
        if question_ids.is_empty() {
            return Ok(extras);
        }

        let options = sqlx::query_as::<_, QuestionOption>(
            "SELECT id, question_id, option_text, is_correct FROM question_options \
             WHERE question_id = ANY($1) ORDER BY created_at",
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        let images = sqlx::query_as::<_, QuestionImage>(
            "SELECT id, question_id, image_url FROM question_images \
             WHERE question_id = ANY($1) ORDER BY created_at",
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        for option in options {
            extras.options.entry(option.question_id).or_default().push(option);
        }
        for image in images {
            extras.images.entry(image.question_id).or_default().push(image);
        }
        Ok(extras)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {} FROM questions WHERE id = $1", QUESTION_COLUMNS);
        let question = sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    async fn find_questions(&self, ids: &[Uuid]) -> Result<Vec<Question>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM questions WHERE id = ANY($1)", QUESTION_COLUMNS);
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(questions)
    }
}

#[async_trait]
impl ReferenceStore for PgStore {
    async fn find_exam_type(&self, id: Uuid) -> Result<Option<ExamType>, AppError> {
        let row = sqlx::query_as::<_, ExamType>("SELECT id, name FROM exam_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, AppError> {
        let row = sqlx::query_as::<_, Subject>("SELECT id, name FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_class(&self, id: Uuid) -> Result<Option<SchoolClass>, AppError> {
        let row = sqlx::query_as::<_, SchoolClass>("SELECT id, name FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_topic(&self, id: Uuid) -> Result<Option<Topic>, AppError> {
        let row = sqlx::query_as::<_, Topic>("SELECT id, name, subject_id FROM topics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_exam_types(
        &self,
        name: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamType>, AppError> {
        let search_pattern = name.map(|n| format!("%{}%", n));
        let rows = sqlx::query_as::<_, ExamType>(
            "SELECT id, name FROM exam_types \
             WHERE ($1::TEXT IS NULL OR name ILIKE $1) \
             ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(search_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_exam_type(&self, name: &str) -> Result<ExamType, AppError> {
        let row = sqlx::query_as::<_, ExamType>(
            "INSERT INTO exam_types (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_exam_type(&self, id: Uuid, name: &str) -> Result<Option<ExamType>, AppError> {
        let row = sqlx::query_as::<_, ExamType>(
            "UPDATE exam_types SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_exam_type(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM exam_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // On delete the violating rows are papers still pointing at the type.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::Conflict(format!(
                            "Exam type with ID {} is still used by exam papers",
                            id
                        ));
                    }
                }
                AppError::from(e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ExamPaperStore for PgStore {
    async fn find_exam_paper(&self, id: Uuid) -> Result<Option<ExamPaper>, AppError> {
        let sql = format!("SELECT {} FROM exam_papers WHERE id = $1", PAPER_COLUMNS);
        let paper = sqlx::query_as::<_, ExamPaper>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(paper)
    }

    async fn list_exam_papers(
        &self,
        filter: &ExamPaperFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamPaper>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(PAPER_COLUMNS);
        builder.push(" FROM exam_papers WHERE TRUE");

        if let Some(title) = &filter.title {
            builder.push(" AND title ILIKE ").push_bind(format!("%{}%", title));
        }
        if let Some(id) = filter.exam_type_id {
            builder.push(" AND exam_type_id = ").push_bind(id);
        }
        if let Some(id) = filter.subject_id {
            builder.push(" AND subject_id = ").push_bind(id);
        }
        if let Some(id) = filter.class_id {
            builder.push(" AND class_id = ").push_bind(id);
        }
        if let Some(marks) = filter.min_total_marks {
            builder.push(" AND total_marks >= ").push_bind(marks);
        }
        if let Some(marks) = filter.max_total_marks {
            builder.push(" AND total_marks <= ").push_bind(marks);
        }
        if let Some(minutes) = filter.min_duration_minutes {
            builder.push(" AND duration_minutes >= ").push_bind(minutes);
        }
        if let Some(minutes) = filter.max_duration_minutes {
            builder.push(" AND duration_minutes <= ").push_bind(minutes);
        }

        builder.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let papers = builder
            .build_query_as::<ExamPaper>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list exam papers: {:?}", e);
                AppError::from(e)
            })?;
        Ok(papers)
    }

    async fn create_exam_paper_with_sections(
        &self,
        paper: NewExamPaper,
        sections: Vec<GeneratedSection>,
    ) -> Result<ExamPaper, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO exam_papers \
             (title, exam_type_id, subject_id, class_id, total_marks, duration_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            PAPER_COLUMNS
        );
        let created = sqlx::query_as::<_, ExamPaper>(&sql)
            .bind(&paper.title)
            .bind(paper.exam_type_id)
            .bind(paper.subject_id)
            .bind(paper.class_id)
            .bind(paper.total_marks)
            .bind(paper.duration_minutes)
            .fetch_one(&mut *tx)
            .await?;

        for generated in &sections {
            let section = insert_section(&mut tx, created.id, &generated.section).await?;
            insert_associations(&mut tx, section.id, &generated.questions).await?;
        }

        // Dropping `tx` on any early return rolls everything back.
        tx.commit().await?;
        Ok(created)
    }

    async fn update_exam_paper(
        &self,
        id: Uuid,
        changes: &UpdateExamPaperRequest,
    ) -> Result<Option<ExamPaper>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exam_papers SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = &changes.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }
        if let Some(exam_type_id) = changes.exam_type_id {
            separated.push("exam_type_id = ");
            separated.push_bind_unseparated(exam_type_id);
        }
        if let Some(subject_id) = changes.subject_id {
            separated.push("subject_id = ");
            separated.push_bind_unseparated(subject_id);
        }
        if let Some(class_id) = changes.class_id {
            separated.push("class_id = ");
            separated.push_bind_unseparated(class_id);
        }
        if let Some(total_marks) = changes.total_marks {
            separated.push("total_marks = ");
            separated.push_bind_unseparated(total_marks);
        }
        if let Some(duration_minutes) = changes.duration_minutes {
            separated.push("duration_minutes = ");
            separated.push_bind_unseparated(duration_minutes);
        }
        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(PAPER_COLUMNS);

        let paper = builder
            .build_query_as::<ExamPaper>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(paper)
    }

    async fn delete_exam_paper(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM exam_paper_questions WHERE section_id IN \
             (SELECT id FROM exam_paper_sections WHERE exam_paper_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM exam_paper_sections WHERE exam_paper_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM exam_papers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_section(
        &self,
        exam_paper_id: Uuid,
        section: NewSection,
    ) -> Result<ExamPaperSection, AppError> {
        let mut tx = self.pool.begin().await?;
        let created = insert_section(&mut tx, exam_paper_id, &section).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_section(
        &self,
        section_id: Uuid,
        section: NewSection,
    ) -> Result<Option<ExamPaperSection>, AppError> {
        let sql = format!(
            "UPDATE exam_paper_sections SET \
             section_number = $1, title = $2, instructions = $3, marks_per_question = $4, \
             questions_to_answer = $5, total_questions = $6, section_marks = $7 \
             WHERE id = $8 RETURNING {}",
            SECTION_COLUMNS
        );
        let updated = sqlx::query_as::<_, ExamPaperSection>(&sql)
            .bind(section.section_number)
            .bind(&section.title)
            .bind(&section.instructions)
            .bind(section.marks_per_question)
            .bind(section.questions_to_answer)
            .bind(section.total_questions)
            .bind(section.section_marks())
            .bind(section_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn sections_by_paper_id(&self, exam_paper_id: Uuid) -> Result<Vec<ExamPaperSection>, AppError> {
        let sql = format!(
            "SELECT {} FROM exam_paper_sections WHERE exam_paper_id = $1 ORDER BY section_number",
            SECTION_COLUMNS
        );
        let sections = sqlx::query_as::<_, ExamPaperSection>(&sql)
            .bind(exam_paper_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sections)
    }

    async fn find_section(&self, section_id: Uuid) -> Result<Option<ExamPaperSection>, AppError> {
        let sql = format!("SELECT {} FROM exam_paper_sections WHERE id = $1", SECTION_COLUMNS);
        let section = sqlx::query_as::<_, ExamPaperSection>(&sql)
            .bind(section_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(section)
    }

    async fn delete_section_cascade(&self, section_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM exam_paper_questions WHERE section_id = $1")
            .bind(section_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM exam_paper_sections WHERE id = $1")
            .bind(section_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn questions_in_section(&self, section_id: Uuid) -> Result<Vec<SectionQuestion>, AppError> {
        let sql = format!(
            "SELECT {} FROM exam_paper_questions WHERE section_id = $1 ORDER BY question_number",
            SECTION_QUESTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, SectionQuestion>(&sql)
            .bind(section_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_section_question(&self, id: Uuid) -> Result<Option<SectionQuestion>, AppError> {
        let sql = format!(
            "SELECT {} FROM exam_paper_questions WHERE id = $1",
            SECTION_QUESTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SectionQuestion>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn add_question_associations(
        &self,
        section_id: Uuid,
        rows: Vec<NewSectionQuestion>,
    ) -> Result<Vec<SectionQuestion>, AppError> {
        let mut tx = self.pool.begin().await?;
        let inserted = insert_associations(&mut tx, section_id, &rows).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn remove_question_from_section(
        &self,
        section_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<SectionQuestion>, AppError> {
        let sql = format!(
            "DELETE FROM exam_paper_questions WHERE section_id = $1 AND question_id = $2 RETURNING {}",
            SECTION_QUESTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SectionQuestion>(&sql)
            .bind(section_id)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn remove_section_question(&self, id: Uuid) -> Result<Option<SectionQuestion>, AppError> {
        let sql = format!(
            "DELETE FROM exam_paper_questions WHERE id = $1 RETURNING {}",
            SECTION_QUESTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SectionQuestion>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_section_question(
        &self,
        id: Uuid,
        question_number: i32,
        is_optional: bool,
    ) -> Result<Option<SectionQuestion>, AppError> {
        let sql = format!(
            "UPDATE exam_paper_questions SET question_number = $1, is_optional = $2 \
             WHERE id = $3 RETURNING {}",
            SECTION_QUESTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SectionQuestion>(&sql)
            .bind(question_number)
            .bind(is_optional)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn reassign_question_numbers(
        &self,
        section_id: Uuid,
        rows: Vec<(Uuid, i32)>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Swaps pass through transient duplicates; check uniqueness at commit.
        sqlx::query("SET CONSTRAINTS exam_paper_questions_section_number_key DEFERRED")
            .execute(&mut *tx)
            .await?;

        for (id, number) in rows {
            let result = sqlx::query(
                "UPDATE exam_paper_questions SET question_number = $1 \
                 WHERE id = $2 AND section_id = $3",
            )
            .bind(number)
            .bind(id)
            .bind(section_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::not_found("Section question", id));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
