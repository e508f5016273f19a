use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{
    Experience, NewExperience, NewPersonalInfo, NewProject, NewSkill, PersonalInfo, Project, Skill,
};
use crate::database::sqlite::queries::{
    ExperienceQueries, PersonalInfoQueries, ProjectQueries, SkillQueries,
};


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// Per-category row counts, used by the status command and seeder output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentCounts {
    pub projects: i64,
    pub skills: i64,
    pub experience: i64,
    pub personal_info: i64,
}

impl DocumentCounts {
    #[inline]
    pub fn total(&self) -> i64 {
        self.projects + self.skills + self.experience + self.personal_info
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let database_path = database_path.as_ref();
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    // Project operations
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        ProjectQueries::list_all(&self.pool).await
    }

    pub async fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        ProjectQueries::get_by_slug(&self.pool, slug).await
    }

    pub async fn upsert_project(&self, project: NewProject) -> Result<Project> {
        ProjectQueries::upsert(&self.pool, project).await
    }

    // Skill operations
    pub async fn list_skills(&self) -> Result<Vec<Skill>> {
        SkillQueries::list_all(&self.pool).await
    }

    pub async fn upsert_skill(&self, skill: NewSkill) -> Result<Skill> {
        SkillQueries::upsert(&self.pool, skill).await
    }

    // Experience operations
    pub async fn list_experience(&self) -> Result<Vec<Experience>> {
        ExperienceQueries::list_all(&self.pool).await
    }

    pub async fn upsert_experience(&self, experience: NewExperience) -> Result<Experience> {
        ExperienceQueries::upsert(&self.pool, experience).await
    }

    // Personal info operations
    pub async fn list_personal_info(&self) -> Result<Vec<PersonalInfo>> {
        PersonalInfoQueries::list_all(&self.pool).await
    }

    pub async fn get_primary_personal_info(&self) -> Result<Option<PersonalInfo>> {
        PersonalInfoQueries::get_primary(&self.pool).await
    }

    pub async fn upsert_personal_info(&self, info: NewPersonalInfo) -> Result<PersonalInfo> {
        PersonalInfoQueries::upsert(&self.pool, info).await
    }

    pub async fn document_counts(&self) -> Result<DocumentCounts> {
        Ok(DocumentCounts {
            projects: ProjectQueries::count(&self.pool).await?,
            skills: SkillQueries::count(&self.pool).await?,
            experience: ExperienceQueries::count(&self.pool).await?,
            personal_info: PersonalInfoQueries::count(&self.pool).await?,
        })
    }
}
