// Portfolio profile file
// The static document source: a TOML file describing the owner's projects,
// skills, experience, and personal info. Parsed once at seed time and
// normalized into the relational models at this boundary.


use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::database::sqlite::models::{NewExperience, NewPersonalInfo, NewProject, NewSkill};
use crate::{FolioError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub personal: PersonalEntry,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalEntry {
    pub name: String,
    pub title: String,
    pub location: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectEntry {
    pub slug: String,
    pub title: String,
    pub overview: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub area: String,
    pub level: Option<String>,
    #[serde(default)]
    pub years: i64,
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperienceEntry {
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl Profile {
    /// Read and validate a profile file.
    #[inline]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading profile from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            FolioError::Config(format!("Failed to read profile {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate profile TOML.
    #[inline]
    pub fn parse(contents: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(contents)
            .map_err(|e| FolioError::Config(format!("Failed to parse profile: {}", e)))?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(FolioError::Config(message));

        if self.personal.name.trim().is_empty() {
            return invalid("personal.name must not be empty".to_string());
        }
        if self.personal.summary.trim().is_empty() {
            return invalid("personal.summary must not be empty".to_string());
        }

        let mut slugs = std::collections::HashSet::new();
        for project in &self.projects {
            if project.slug.trim().is_empty() || project.title.trim().is_empty() {
                return invalid(format!(
                    "project \"{}\" needs a non-empty slug and title",
                    project.title
                ));
            }
            if !slugs.insert(project.slug.as_str()) {
                return invalid(format!("duplicate project slug \"{}\"", project.slug));
            }
        }

        let mut names = std::collections::HashSet::new();
        for skill in &self.skills {
            if skill.name.trim().is_empty() {
                return invalid("skill name must not be empty".to_string());
            }
            if skill.years < 0 {
                return invalid(format!("skill \"{}\" has negative years", skill.name));
            }
            if !names.insert(skill.name.as_str()) {
                return invalid(format!("duplicate skill name \"{}\"", skill.name));
            }
        }

        for exp in &self.experience {
            if exp.role.trim().is_empty()
                || exp.company.trim().is_empty()
                || exp.start_date.trim().is_empty()
            {
                return invalid(format!(
                    "experience at \"{}\" needs a role, company and start_date",
                    exp.company
                ));
            }
        }

        Ok(())
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        1 + self.projects.len() + self.skills.len() + self.experience.len()
    }
}

impl PersonalEntry {
    #[inline]
    pub fn to_new_personal_info(&self) -> NewPersonalInfo {
        NewPersonalInfo {
            name: self.name.clone(),
            title: self.title.clone(),
            location: self.location.clone(),
            summary: self.summary.clone(),
            interests: join_list(&self.interests),
        }
    }
}

impl ProjectEntry {
    #[inline]
    pub fn to_new_project(&self) -> NewProject {
        NewProject {
            slug: self.slug.clone(),
            title: self.title.clone(),
            overview: self.overview.clone(),
            description: self.description.clone(),
            technologies: join_list(&self.technologies),
            repo_url: self.repo_url.clone(),
            live_url: self.live_url.clone(),
        }
    }
}

impl SkillEntry {
    #[inline]
    pub fn to_new_skill(&self) -> NewSkill {
        NewSkill {
            name: self.name.clone(),
            area: self.area.clone(),
            level: self.level.clone(),
            years: self.years,
            summary: self.summary.clone(),
        }
    }
}

impl ExperienceEntry {
    #[inline]
    pub fn to_new_experience(&self) -> NewExperience {
        NewExperience {
            role: self.role.clone(),
            company: self.company.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            summary: self.summary.clone(),
            technologies: join_list(&self.technologies),
        }
    }
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
