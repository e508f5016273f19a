// Seeding job
// Administrative path that loads a profile file into SQLite, embeds every
// document whose content changed, and writes the vectors to LanceDB.
// Failures here are surfaced to the operator, never swallowed.


use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::database::lancedb::DocumentMetadata;
use crate::database::sqlite::queries::{
    ExperienceQueries, PersonalInfoQueries, ProjectQueries, SkillQueries,
};
use crate::database::{Database, EmbeddedDocument, VectorStore};
use crate::knowledge::{content_hash, Document};
use crate::openai::OpenAiClient;
use crate::profile::Profile;
use crate::{FolioError, Result};

/// LanceDB cannot train an IVF index on a corpus smaller than this; below
/// it the store stays on brute-force scan, which is fine at that size.
const MIN_ROWS_FOR_INDEX: u64 = 256;

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    /// Documents upserted into SQLite.
    pub documents: usize,
    /// Documents whose embeddings were (re)computed.
    pub embedded: usize,
    /// Documents skipped because their content was unchanged.
    pub skipped: usize,
}

pub struct Seeder {
    database: Database,
    vector_store: Arc<VectorStore>,
    openai: OpenAiClient,
    batch_size: usize,
}

impl Seeder {
    #[inline]
    pub fn new(
        config: &Config,
        database: Database,
        vector_store: Arc<VectorStore>,
        openai: OpenAiClient,
    ) -> Self {
        Self {
            database,
            vector_store,
            openai,
            batch_size: (config.openai.batch_size as usize).max(1),
        }
    }

    /// Seed the databases from a profile. With `recompute` every document
    /// is re-embedded regardless of its stored content hash.
    #[inline]
    pub async fn seed(&self, profile: &Profile, recompute: bool) -> Result<SeedStats> {
        info!(
            "Seeding {} documents from profile (recompute: {})",
            profile.document_count(),
            recompute
        );

        let documents = self.upsert_profile(profile).await?;
        let mut stats = SeedStats {
            documents: documents.len(),
            ..SeedStats::default()
        };

        let stale: Vec<Document> = documents
            .into_iter()
            .filter(|document| {
                if needs_embedding(document, recompute) {
                    true
                } else {
                    debug!("Skipping unchanged document {}", document.key());
                    stats.skipped += 1;
                    false
                }
            })
            .collect();

        for chunk in stale.chunks(self.batch_size) {
            stats.embedded += self.embed_chunk(chunk).await?;
        }

        self.maybe_create_index().await?;

        info!(
            "Seeding complete: {} documents, {} embedded, {} unchanged",
            stats.documents, stats.embedded, stats.skipped
        );
        Ok(stats)
    }

    /// Write every profile entry to SQLite and return the stored rows.
    async fn upsert_profile(&self, profile: &Profile) -> Result<Vec<Document>> {
        let map_err =
            |e: anyhow::Error| FolioError::Database(format!("Failed to upsert document: {}", e));

        let mut documents = Vec::with_capacity(profile.document_count());

        let info = self
            .database
            .upsert_personal_info(profile.personal.to_new_personal_info())
            .await
            .map_err(map_err)?;
        documents.push(Document::PersonalInfo(info));

        for entry in &profile.projects {
            let project = self
                .database
                .upsert_project(entry.to_new_project())
                .await
                .map_err(map_err)?;
            documents.push(Document::Project(project));
        }
        for entry in &profile.skills {
            let skill = self
                .database
                .upsert_skill(entry.to_new_skill())
                .await
                .map_err(map_err)?;
            documents.push(Document::Skill(skill));
        }
        for entry in &profile.experience {
            let experience = self
                .database
                .upsert_experience(entry.to_new_experience())
                .await
                .map_err(map_err)?;
            documents.push(Document::Experience(experience));
        }

        Ok(documents)
    }

    async fn embed_chunk(&self, documents: &[Document]) -> Result<usize> {
        let texts: Vec<String> = documents.iter().map(Document::embedding_text).collect();
        let embeddings = self.openai.embed_batch(&texts).await?;

        let now = Utc::now();
        let mut records = Vec::with_capacity(documents.len());
        let mut marks = Vec::with_capacity(documents.len());

        for ((document, text), vector) in documents.iter().zip(&texts).zip(embeddings) {
            let vector_id = Uuid::new_v4().to_string();
            records.push(EmbeddedDocument {
                id: vector_id.clone(),
                vector,
                metadata: DocumentMetadata {
                    key: document.key(),
                    category: document.category().as_str().to_string(),
                    record_id: document.id(),
                    title: document.title().to_string(),
                    content: text.clone(),
                    created_at: now.to_rfc3339(),
                },
            });
            marks.push((document, content_hash(text), vector_id));
        }

        self.vector_store.upsert(&records).await?;

        let embedded_date = now.naive_utc();
        let pool = self.database.pool();
        for (document, hash, vector_id) in marks {
            let marked = match document {
                Document::Project(p) => {
                    ProjectQueries::mark_embedded(pool, p.id, &hash, &vector_id, embedded_date)
                        .await
                }
                Document::Skill(s) => {
                    SkillQueries::mark_embedded(pool, s.id, &hash, &vector_id, embedded_date).await
                }
                Document::Experience(e) => {
                    ExperienceQueries::mark_embedded(pool, e.id, &hash, &vector_id, embedded_date)
                        .await
                }
                Document::PersonalInfo(p) => {
                    PersonalInfoQueries::mark_embedded(pool, p.id, &hash, &vector_id, embedded_date)
                        .await
                }
            };
            marked.map_err(|e| {
                FolioError::Database(format!(
                    "Failed to record embedding for {}: {}",
                    document.key(),
                    e
                ))
            })?;
        }

        Ok(documents.len())
    }

    async fn maybe_create_index(&self) -> Result<()> {
        let count = self.vector_store.count_embeddings().await?;
        if count >= MIN_ROWS_FOR_INDEX {
            self.vector_store.create_vector_index().await?;
        } else {
            debug!(
                "Skipping vector index: {} rows (need {})",
                count, MIN_ROWS_FOR_INDEX
            );
        }
        Ok(())
    }
}

/// A document needs (re)embedding when forced, never embedded before, or
/// its stored content hash no longer matches the current embedding text.
fn needs_embedding(document: &Document, recompute: bool) -> bool {
    if recompute {
        return true;
    }

    let (stored_hash, embedded_date) = match document {
        Document::Project(p) => (&p.content_hash, &p.embedded_date),
        Document::Skill(s) => (&s.content_hash, &s.embedded_date),
        Document::Experience(e) => (&e.content_hash, &e.embedded_date),
        Document::PersonalInfo(p) => (&p.content_hash, &p.embedded_date),
    };

    if embedded_date.is_none() {
        return true;
    }
    match stored_hash {
        Some(hash) => *hash != content_hash(&document.embedding_text()),
        None => true,
    }
}
