#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub overview: String,
    pub description: String,
    pub technologies: String,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    #[serde(skip_serializing)]
    pub content_hash: Option<String>,
    #[serde(skip_serializing)]
    pub vector_id: Option<String>,
    pub embedded_date: Option<NaiveDateTime>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub slug: String,
    pub title: String,
    pub overview: String,
    pub description: String,
    pub technologies: String,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub area: String,
    pub level: Option<String>,
    pub years: i64,
    pub summary: String,
    #[serde(skip_serializing)]
    pub content_hash: Option<String>,
    #[serde(skip_serializing)]
    pub vector_id: Option<String>,
    pub embedded_date: Option<NaiveDateTime>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    pub area: String,
    pub level: Option<String>,
    pub years: i64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub id: i64,
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub summary: String,
    pub technologies: String,
    #[serde(skip_serializing)]
    pub content_hash: Option<String>,
    #[serde(skip_serializing)]
    pub vector_id: Option<String>,
    pub embedded_date: Option<NaiveDateTime>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExperience {
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub summary: String,
    pub technologies: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PersonalInfo {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub location: Option<String>,
    pub summary: String,
    pub interests: String,
    #[serde(skip_serializing)]
    pub content_hash: Option<String>,
    #[serde(skip_serializing)]
    pub vector_id: Option<String>,
    pub embedded_date: Option<NaiveDateTime>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPersonalInfo {
    pub name: String,
    pub title: String,
    pub location: Option<String>,
    pub summary: String,
    pub interests: String,
}

impl Project {
    #[inline]
    pub fn technology_list(&self) -> Vec<&str> {
        split_list(&self.technologies)
    }

    #[inline]
    pub fn is_embedded(&self) -> bool {
        self.embedded_date.is_some()
    }
}

impl Skill {
    #[inline]
    pub fn is_embedded(&self) -> bool {
        self.embedded_date.is_some()
    }
}

impl Experience {
    /// Human-readable employment period, e.g. "2021 - Present".
    #[inline]
    pub fn period(&self) -> String {
        match &self.end_date {
            Some(end) => format!("{} - {}", self.start_date, end),
            None => format!("{} - Present", self.start_date),
        }
    }

    #[inline]
    pub fn technology_list(&self) -> Vec<&str> {
        split_list(&self.technologies)
    }

    #[inline]
    pub fn is_embedded(&self) -> bool {
        self.embedded_date.is_some()
    }
}

impl PersonalInfo {
    #[inline]
    pub fn interest_list(&self) -> Vec<&str> {
        split_list(&self.interests)
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
