
use super::models::{
    Experience, NewExperience, NewPersonalInfo, NewProject, NewSkill, PersonalInfo, Project, Skill,
};
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

pub struct ProjectQueries;

impl ProjectQueries {
    /// Insert or update a project keyed by its slug. Scalar fields are always
    /// refreshed; embedding bookkeeping is left untouched so the seeder can
    /// compare content hashes afterwards.
    #[inline]
    pub async fn upsert(pool: &SqlitePool, new_project: NewProject) -> Result<Project> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO projects (slug, title, overview, description, technologies, repo_url, live_url, created_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                title = excluded.title,
                overview = excluded.overview,
                description = excluded.description,
                technologies = excluded.technologies,
                repo_url = excluded.repo_url,
                live_url = excluded.live_url
            "#,
        )
        .bind(&new_project.slug)
        .bind(&new_project.title)
        .bind(&new_project.overview)
        .bind(&new_project.description)
        .bind(&new_project.technologies)
        .bind(&new_project.repo_url)
        .bind(&new_project.live_url)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert project")?;

        Self::get_by_slug(pool, &new_project.slug)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted project"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get project by id")
    }

    #[inline]
    pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("Failed to get project by slug")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY id")
            .fetch_all(pool)
            .await
            .context("Failed to list projects")
    }

    #[inline]
    pub async fn mark_embedded(
        pool: &SqlitePool,
        id: i64,
        content_hash: &str,
        vector_id: &str,
        embedded_date: NaiveDateTime,
    ) -> Result<()> {
        mark_embedded(pool, "projects", id, content_hash, vector_id, embedded_date).await
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        count_rows(pool, "projects").await
    }
}

pub struct SkillQueries;

impl SkillQueries {
    #[inline]
    pub async fn upsert(pool: &SqlitePool, new_skill: NewSkill) -> Result<Skill> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO skills (name, area, level, years, summary, created_date)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                area = excluded.area,
                level = excluded.level,
                years = excluded.years,
                summary = excluded.summary
            "#,
        )
        .bind(&new_skill.name)
        .bind(&new_skill.area)
        .bind(&new_skill.level)
        .bind(new_skill.years)
        .bind(&new_skill.summary)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert skill")?;

        Self::get_by_name(pool, &new_skill.name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted skill"))
    }

    #[inline]
    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Skill>> {
        sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
            .context("Failed to get skill by name")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Skill>> {
        sqlx::query_as::<_, Skill>("SELECT * FROM skills ORDER BY id")
            .fetch_all(pool)
            .await
            .context("Failed to list skills")
    }

    #[inline]
    pub async fn mark_embedded(
        pool: &SqlitePool,
        id: i64,
        content_hash: &str,
        vector_id: &str,
        embedded_date: NaiveDateTime,
    ) -> Result<()> {
        mark_embedded(pool, "skills", id, content_hash, vector_id, embedded_date).await
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        count_rows(pool, "skills").await
    }
}

pub struct ExperienceQueries;

impl ExperienceQueries {
    #[inline]
    pub async fn upsert(pool: &SqlitePool, new_experience: NewExperience) -> Result<Experience> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO experience (role, company, start_date, end_date, summary, technologies, created_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(company, role, start_date) DO UPDATE SET
                end_date = excluded.end_date,
                summary = excluded.summary,
                technologies = excluded.technologies
            "#,
        )
        .bind(&new_experience.role)
        .bind(&new_experience.company)
        .bind(&new_experience.start_date)
        .bind(&new_experience.end_date)
        .bind(&new_experience.summary)
        .bind(&new_experience.technologies)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert experience")?;

        Self::get_by_position(
            pool,
            &new_experience.company,
            &new_experience.role,
            &new_experience.start_date,
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted experience"))
    }

    #[inline]
    pub async fn get_by_position(
        pool: &SqlitePool,
        company: &str,
        role: &str,
        start_date: &str,
    ) -> Result<Option<Experience>> {
        sqlx::query_as::<_, Experience>(
            "SELECT * FROM experience WHERE company = ? AND role = ? AND start_date = ?",
        )
        .bind(company)
        .bind(role)
        .bind(start_date)
        .fetch_optional(pool)
        .await
        .context("Failed to get experience by position")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Experience>> {
        sqlx::query_as::<_, Experience>("SELECT * FROM experience ORDER BY start_date DESC, id")
            .fetch_all(pool)
            .await
            .context("Failed to list experience")
    }

    #[inline]
    pub async fn mark_embedded(
        pool: &SqlitePool,
        id: i64,
        content_hash: &str,
        vector_id: &str,
        embedded_date: NaiveDateTime,
    ) -> Result<()> {
        mark_embedded(
            pool,
            "experience",
            id,
            content_hash,
            vector_id,
            embedded_date,
        )
        .await
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        count_rows(pool, "experience").await
    }
}

pub struct PersonalInfoQueries;

impl PersonalInfoQueries {
    #[inline]
    pub async fn upsert(pool: &SqlitePool, new_info: NewPersonalInfo) -> Result<PersonalInfo> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO personal_info (name, title, location, summary, interests, created_date)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                title = excluded.title,
                location = excluded.location,
                summary = excluded.summary,
                interests = excluded.interests
            "#,
        )
        .bind(&new_info.name)
        .bind(&new_info.title)
        .bind(&new_info.location)
        .bind(&new_info.summary)
        .bind(&new_info.interests)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert personal info")?;

        sqlx::query_as::<_, PersonalInfo>("SELECT * FROM personal_info WHERE name = ?")
            .bind(&new_info.name)
            .fetch_optional(pool)
            .await
            .context("Failed to get personal info by name")?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted personal info"))
    }

    /// The primary (oldest) personal record; portfolios normally have one.
    #[inline]
    pub async fn get_primary(pool: &SqlitePool) -> Result<Option<PersonalInfo>> {
        sqlx::query_as::<_, PersonalInfo>("SELECT * FROM personal_info ORDER BY id LIMIT 1")
            .fetch_optional(pool)
            .await
            .context("Failed to get primary personal info")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<PersonalInfo>> {
        sqlx::query_as::<_, PersonalInfo>("SELECT * FROM personal_info ORDER BY id")
            .fetch_all(pool)
            .await
            .context("Failed to list personal info")
    }

    #[inline]
    pub async fn mark_embedded(
        pool: &SqlitePool,
        id: i64,
        content_hash: &str,
        vector_id: &str,
        embedded_date: NaiveDateTime,
    ) -> Result<()> {
        mark_embedded(
            pool,
            "personal_info",
            id,
            content_hash,
            vector_id,
            embedded_date,
        )
        .await
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        count_rows(pool, "personal_info").await
    }
}

async fn mark_embedded(
    pool: &SqlitePool,
    table: &str,
    id: i64,
    content_hash: &str,
    vector_id: &str,
    embedded_date: NaiveDateTime,
) -> Result<()> {
    // `table` is always one of this module's fixed table names, never input.
    let sql = format!(
        "UPDATE {} SET content_hash = ?, vector_id = ?, embedded_date = ? WHERE id = ?",
        table
    );
    let result = sqlx::query(&sql)
        .bind(content_hash)
        .bind(vector_id)
        .bind(embedded_date)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to mark {} row {} as embedded", table, id))?;

    if result.rows_affected() == 0 {
        return Err(anyhow::anyhow!("No {} row with id {}", table, id));
    }
    Ok(())
}

async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count {} rows", table))
}
