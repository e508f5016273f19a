use super::*;
use chrono::Utc;

fn sample_project() -> Project {
    Project {
        id: 1,
        slug: "helios".to_string(),
        title: "Helios".to_string(),
        overview: "Solar monitoring dashboard".to_string(),
        description: "Long description".to_string(),
        technologies: "Rust, TypeScript, PostgreSQL".to_string(),
        repo_url: None,
        live_url: None,
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: Utc::now().naive_utc(),
    }
}

#[test]
fn technology_list_splits_and_trims() {
    let project = sample_project();
    assert_eq!(
        project.technology_list(),
        vec!["Rust", "TypeScript", "PostgreSQL"]
    );
}

#[test]
fn technology_list_skips_empty_entries() {
    let mut project = sample_project();
    project.technologies = "Rust, , ,TypeScript".to_string();
    assert_eq!(project.technology_list(), vec!["Rust", "TypeScript"]);

    project.technologies = String::new();
    assert!(project.technology_list().is_empty());
}

#[test]
fn is_embedded_tracks_embedded_date() {
    let mut project = sample_project();
    assert!(!project.is_embedded());
    project.embedded_date = Some(Utc::now().naive_utc());
    assert!(project.is_embedded());
}

#[test]
fn experience_period_formats_open_and_closed_ranges() {
    let mut experience = Experience {
        id: 1,
        role: "Engineer".to_string(),
        company: "Acme".to_string(),
        start_date: "2021".to_string(),
        end_date: None,
        summary: String::new(),
        technologies: String::new(),
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: Utc::now().naive_utc(),
    };
    assert_eq!(experience.period(), "2021 - Present");

    experience.end_date = Some("2023".to_string());
    assert_eq!(experience.period(), "2021 - 2023");
}

#[test]
fn personal_interest_list() {
    let personal = PersonalInfo {
        id: 1,
        name: "Jordan".to_string(),
        title: "Engineer".to_string(),
        location: None,
        summary: String::new(),
        interests: "distributed systems, climbing".to_string(),
        content_hash: None,
        vector_id: None,
        embedded_date: None,
        created_date: Utc::now().naive_utc(),
    };
    assert_eq!(
        personal.interest_list(),
        vec!["distributed systems", "climbing"]
    );
}
