use super::*;
use chrono::NaiveDate;

fn test_timestamp() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
}

fn project(id: i64, title: &str) -> Document {
    Document::Project(Project {
        id,
        slug: title.to_lowercase().replace(' ', "-"),
        title: title.to_string(),
        overview: format!("Overview of {}", title),
        description: format!("Full description of {}", title),
        technologies: "Rust, Postgres".to_string(),
        repo_url: Some(format!("https://example.com/{}", id)),
        live_url: None,
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: test_timestamp(),
    })
}

fn skill(id: i64, name: &str, years: i64) -> Document {
    Document::Skill(Skill {
        id,
        name: name.to_string(),
        area: "backend".to_string(),
        level: None,
        years,
        summary: format!("Summary of {}", name),
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: test_timestamp(),
    })
}

fn experience(id: i64, role: &str, company: &str) -> Document {
    Document::Experience(crate::database::sqlite::models::Experience {
        id,
        role: role.to_string(),
        company: company.to_string(),
        start_date: "2020".to_string(),
        end_date: Some("2023".to_string()),
        summary: "Shipped things".to_string(),
        technologies: String::new(),
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: test_timestamp(),
    })
}

fn personal_info(interests: &str) -> PersonalInfo {
    PersonalInfo {
        id: 1,
        name: "Jordan Doe".to_string(),
        title: "Software Engineer".to_string(),
        location: None,
        summary: "I build web services because I like making tools people rely on.".to_string(),
        interests: interests.to_string(),
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: test_timestamp(),
    }
}

#[test]
fn contains_any_matches_substrings() {
    assert!(contains_any("tell me more about folio", FOLLOW_UP_PHRASES));
    assert!(!contains_any("what do you do", FOLLOW_UP_PHRASES));
}

#[test]
fn find_project_mention_matches_title_case_insensitively() {
    let projects = vec![project(1, "Folio"), project(2, "Trail Mapper")];

    let found = find_project_mention("what is trail mapper built with", &projects);
    assert_eq!(found.map(|p| p.id), Some(2));

    assert!(find_project_mention("what is the weather", &projects).is_none());
}

#[test]
fn find_project_mention_matches_slug_words() {
    let projects = vec![project(1, "Trail Mapper")];
    // Slug "trail-mapper" matches when spelled with a space.
    let found = find_project_mention("show me trail mapper please", &projects);
    assert_eq!(found.map(|p| p.id), Some(1));
}

#[test]
fn find_project_mention_prefers_longest_title() {
    let projects = vec![project(1, "Folio"), project(2, "Folio Search")];
    let found = find_project_mention("tell me about folio search", &projects);
    assert_eq!(found.map(|p| p.id), Some(2));
}

#[test]
fn find_project_in_history_scans_recent_messages() {
    let projects = vec![project(1, "Folio")];
    let history = vec![
        ChatMessage::user("what projects have you built?"),
        ChatMessage::assistant("One of them is Folio, a portfolio site."),
    ];

    let found = find_project_in_history(&history, &projects);
    assert_eq!(found.map(|p| p.id), Some(1));

    assert!(find_project_in_history(&[], &projects).is_none());
}

#[test]
fn project_detail_includes_description_and_links() {
    let Document::Project(p) = project(1, "Folio") else {
        unreachable!()
    };
    let detail = project_detail(&p);
    assert!(detail.contains("Full description of Folio"));
    assert!(detail.contains("Built with: Rust, Postgres"));
    assert!(detail.contains("Source: https://example.com/1"));
    assert!(!detail.contains("Live:"));
}

#[test]
fn answer_skill_question_mentions_years_when_known() {
    let Document::Skill(s) = skill(1, "Rust", 5) else {
        unreachable!()
    };
    assert!(answer_skill_question(&s).contains("for 5 years"));

    let Document::Skill(s) = skill(1, "Rust", 0) else {
        unreachable!()
    };
    let answer = answer_skill_question(&s);
    assert!(answer.starts_with("Yes, I've worked with Rust."));
    assert!(!answer.contains("0 years"));
}

#[test]
fn summarize_projects_builds_from_live_documents() {
    let summary = summarize_projects(&[project(1, "Folio"), project(2, "Trail Mapper")]);
    assert!(summary.contains("- Folio: Overview of Folio"));
    assert!(summary.contains("- Trail Mapper"));

    let summary = summarize_projects(&[]);
    assert!(summary.contains("don't have any projects"));
}

#[test]
fn summarize_skills_includes_years_and_area() {
    let summary = summarize_skills(&[skill(1, "Rust", 5), skill(2, "Figma", 0)]);
    assert!(summary.contains("- Rust (5 years, backend)"));
    assert!(summary.contains("- Figma (backend)"));
}

#[test]
fn summarize_experience_lists_roles() {
    let summary = summarize_experience(&[experience(1, "Engineer", "Acme")]);
    assert!(summary.contains("- Engineer at Acme (2020 - 2023): Shipped things"));
}

#[test]
fn topic_keywords_match_motivation_phrasings() {
    assert!(contains_any("why do you build things", TOPIC_KEYWORDS));
    assert!(contains_any("what drives you", TOPIC_KEYWORDS));
    assert!(contains_any("what's your philosophy on testing", TOPIC_KEYWORDS));
    assert!(!contains_any("list your skills", TOPIC_KEYWORDS));
}

#[test]
fn explain_motivation_builds_from_personal_document() {
    let info = personal_info("climbing, synthesizers");
    let reply = explain_motivation(Some(&info));

    assert!(reply.contains("making tools people rely on"));
    assert!(reply.contains("climbing, synthesizers"));
    assert!(reply.contains("ask about one of my projects"));
}

#[test]
fn explain_motivation_without_interests_skips_that_paragraph() {
    let info = personal_info("");
    let reply = explain_motivation(Some(&info));
    assert!(!reply.contains("Outside of work"));
    assert!(reply.contains("making tools people rely on"));
}

#[test]
fn explain_motivation_has_a_generic_answer_without_a_document() {
    let reply = explain_motivation(None);
    assert!(!reply.is_empty());
    assert!(reply.contains("Ask about a project"));
}

#[test]
fn default_reply_echoes_query_with_menu() {
    let reply = default_reply("  what is the meaning of life  ");
    assert!(reply.contains("\"what is the meaning of life\""));
    assert!(reply.contains("projects"));
    assert!(reply.contains("skills"));
    assert!(reply.contains("experience"));
}
