// Pattern-matching fallback router
// Deterministic, ordered rule list evaluated on the lower-cased query.
// First matching rule wins; no scoring, no ambiguity resolution. Used
// whenever the generative provider is unavailable so the chat surface
// always answers something.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::debug;

use crate::database::sqlite::models::{PersonalInfo, Project, Skill};
use crate::knowledge::{Category, Document, KnowledgeBase};
use crate::openai::ChatMessage;

const GREETING_KEYWORDS: &[&str] = &["hello", "hi ", "hi!", "hey", "good morning", "good evening"];
const IDENTITY_KEYWORDS: &[&str] = &["who are you", "your name", "about yourself", "introduce"];
const SKILL_QUESTION_PREFIXES: &[&str] = &["do you know", "have you used", "are you familiar with"];
const FOLLOW_UP_PHRASES: &[&str] = &[
    "tell me more",
    "more about",
    "more detail",
    "explain",
    "similar",
    "compare",
    "what else",
];
const TOPIC_KEYWORDS: &[&str] = &[
    "why ",
    "what drives",
    "what motivates",
    "philosophy",
    "motivation",
    "passionate about",
];
const PROJECT_KEYWORDS: &[&str] = &["project", "portfolio", "built", "building", "app", "application"];
const SKILL_KEYWORDS: &[&str] = &[
    "skill",
    "technology",
    "technologies",
    "stack",
    "language",
    "framework",
    "tool",
];
const EXPERIENCE_KEYWORDS: &[&str] = &[
    "experience",
    "job",
    "career",
    "company",
    "companies",
    "role",
    "employment",
    "work history",
];

/// How many trailing history messages are scanned for follow-up references.
const HISTORY_SCAN_WINDOW: usize = 6;

pub struct FallbackRouter {
    knowledge: Arc<KnowledgeBase>,
}

impl FallbackRouter {
    #[inline]
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// Route a query through the ordered rules and produce a reply.
    /// Infallible: every path ends in a concrete string.
    #[inline]
    pub async fn route(&self, query: &str, history: &[ChatMessage]) -> String {
        let query_lower = query.to_lowercase();
        debug!("Routing query through fallback rules");

        if let Some(reply) = self.greeting_or_identity(&query_lower).await {
            return reply;
        }

        if let Some(reply) = self.skill_question(&query_lower).await {
            return reply;
        }

        let projects = self.knowledge.get_by_category(Category::Project).await;

        // Follow-up phrases resolve against a project named in the query
        // itself or, failing that, in the recent history, and answer with
        // that project's current data.
        if contains_any(&query_lower, FOLLOW_UP_PHRASES) {
            if let Some(project) = find_project_mention(&query_lower, &projects)
                .or_else(|| find_project_in_history(history, &projects))
            {
                return project_detail(project);
            }
        }

        if let Some(project) = find_project_mention(&query_lower, &projects) {
            return project_detail(project);
        }

        // Topic questions ("why do you...", "what drives you") get a longer
        // explanation built from the personal document.
        if contains_any(&query_lower, TOPIC_KEYWORDS) {
            let personal = self
                .knowledge
                .get_by_category(Category::PersonalInfo)
                .await
                .into_iter()
                .find_map(|doc| match doc {
                    Document::PersonalInfo(info) => Some(info),
                    _ => None,
                });
            return explain_motivation(personal.as_ref());
        }

        if contains_any(&query_lower, PROJECT_KEYWORDS) {
            return summarize_projects(&projects);
        }
        if contains_any(&query_lower, SKILL_KEYWORDS) {
            let skills = self.knowledge.get_by_category(Category::Skill).await;
            return summarize_skills(&skills);
        }
        if contains_any(&query_lower, EXPERIENCE_KEYWORDS) {
            let experience = self.knowledge.get_by_category(Category::Experience).await;
            return summarize_experience(&experience);
        }

        default_reply(query)
    }

    async fn greeting_or_identity(&self, query_lower: &str) -> Option<String> {
        let is_greeting = contains_any(query_lower, GREETING_KEYWORDS)
            || query_lower.trim() == "hi"
            || query_lower.trim() == "hey";
        let is_identity = contains_any(query_lower, IDENTITY_KEYWORDS);
        if !is_greeting && !is_identity {
            return None;
        }

        let personal = self
            .knowledge
            .get_by_category(Category::PersonalInfo)
            .await
            .into_iter()
            .find_map(|doc| match doc {
                Document::PersonalInfo(info) => Some(info),
                _ => None,
            });

        Some(match personal {
            Some(info) if is_identity => {
                format!("I'm {}, {}. {}", info.name, info.title, info.summary)
            }
            Some(info) => format!(
                "Hi, I'm {}! Ask me about my projects, skills, or experience.",
                info.name
            ),
            None => "Hi! Ask me about my projects, skills, or experience.".to_string(),
        })
    }

    async fn skill_question(&self, query_lower: &str) -> Option<String> {
        if !contains_any(query_lower, SKILL_QUESTION_PREFIXES) {
            return None;
        }

        let skills = self.knowledge.get_by_category(Category::Skill).await;
        let skill = skills.iter().find_map(|doc| match doc {
            Document::Skill(skill) if query_lower.contains(&skill.name.to_lowercase()) => {
                Some(skill)
            }
            _ => None,
        })?;

        Some(answer_skill_question(skill))
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Find the project whose title (or slug) appears in the lower-cased text.
/// Longest title wins so "folio search v2" beats "folio".
fn find_project_mention<'a>(text_lower: &str, projects: &'a [Document]) -> Option<&'a Project> {
    projects
        .iter()
        .filter_map(|doc| match doc {
            Document::Project(project) => {
                let title = project.title.to_lowercase();
                let slug_words = project.slug.replace('-', " ");
                if text_lower.contains(&title) || text_lower.contains(&slug_words) {
                    Some(project)
                } else {
                    None
                }
            }
            _ => None,
        })
        .max_by_key(|project| project.title.len())
}

fn find_project_in_history<'a>(
    history: &[ChatMessage],
    projects: &'a [Document],
) -> Option<&'a Project> {
    history
        .iter()
        .rev()
        .take(HISTORY_SCAN_WINDOW)
        .find_map(|message| find_project_mention(&message.content.to_lowercase(), projects))
}

fn project_detail(project: &Project) -> String {
    let mut detail = format!("{}: {}", project.title, project.description);

    let technologies = project.technology_list();
    if !technologies.is_empty() {
        detail.push_str(&format!("\n\nBuilt with: {}", technologies.join(", ")));
    }
    if let Some(repo) = &project.repo_url {
        detail.push_str(&format!("\nSource: {}", repo));
    }
    if let Some(live) = &project.live_url {
        detail.push_str(&format!("\nLive: {}", live));
    }
    detail
}

fn answer_skill_question(skill: &Skill) -> String {
    if skill.years > 0 {
        format!(
            "Yes, I've worked with {} for {} years. {}",
            skill.name, skill.years, skill.summary
        )
    } else {
        format!("Yes, I've worked with {}. {}", skill.name, skill.summary)
    }
}

fn explain_motivation(info: Option<&PersonalInfo>) -> String {
    let Some(info) = info else {
        return "Mostly, I like building things and understanding how they work. \
                Ask about a project and I'll walk you through the thinking behind it."
            .to_string();
    };

    let mut reply = info.summary.clone();
    let interests = info.interest_list();
    if !interests.is_empty() {
        reply.push_str(&format!(
            "\n\nOutside of work I'm into {}; a lot of that curiosity carries over \
             into what I build.",
            interests.join(", ")
        ));
    }
    reply.push_str(
        "\n\nIf you want specifics, ask about one of my projects and I'll walk you \
         through the thinking behind it.",
    );
    reply
}

fn summarize_projects(projects: &[Document]) -> String {
    let lines: Vec<String> = projects
        .iter()
        .filter_map(|doc| match doc {
            Document::Project(project) => {
                Some(format!("- {}: {}", project.title, project.overview))
            }
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        return "I don't have any projects on record yet.".to_string();
    }
    format!(
        "Here are my projects:\n{}\n\nAsk about any of them for details.",
        lines.join("\n")
    )
}

fn summarize_skills(skills: &[Document]) -> String {
    let lines: Vec<String> = skills
        .iter()
        .filter_map(|doc| match doc {
            Document::Skill(skill) => {
                if skill.years > 0 {
                    Some(format!("- {} ({} years, {})", skill.name, skill.years, skill.area))
                } else {
                    Some(format!("- {} ({})", skill.name, skill.area))
                }
            }
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        return "I don't have any skills on record yet.".to_string();
    }
    format!("Here's what I work with:\n{}", lines.join("\n"))
}

fn summarize_experience(experience: &[Document]) -> String {
    let lines: Vec<String> = experience
        .iter()
        .filter_map(|doc| match doc {
            Document::Experience(exp) => Some(format!(
                "- {} at {} ({}): {}",
                exp.role,
                exp.company,
                exp.period(),
                exp.summary
            )),
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        return "I don't have any work experience on record yet.".to_string();
    }
    format!("My work experience:\n{}", lines.join("\n"))
}

fn default_reply(query: &str) -> String {
    format!(
        "I'm not sure how to answer \"{}\" right now. You can ask me about my projects, \
         my skills, or my work experience.",
        query.trim()
    )
}
