// Knowledge base index
// In-process snapshot of every portfolio document with a precomputed
// embedding. The snapshot is rebuilt wholesale and swapped atomically so
// readers never observe a partially populated index.


use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::sqlite::models::{Experience, PersonalInfo, Project, Skill};
use crate::database::Database;
use crate::openai::OpenAiClient;
use crate::{FolioError, Result};

/// Fixed reply when no document clears the similarity threshold.
pub const NO_MATCH_RESPONSE: &str = "I don't have specific information about that. \
    Try asking about my projects, skills, or experience.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Project,
    Skill,
    Experience,
    PersonalInfo,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Project,
        Category::Skill,
        Category::Experience,
        Category::PersonalInfo,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Project => "project",
            Category::Skill => "skill",
            Category::Experience => "experience",
            Category::PersonalInfo => "personal-info",
        }
    }

    #[inline]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "project" => Some(Category::Project),
            "skill" => Some(Category::Skill),
            "experience" => Some(Category::Experience),
            "personal-info" => Some(Category::PersonalInfo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of retrievable knowledge, one variant per category. The variants
/// carry the full SQLite row so callers get the scalar fields verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum Document {
    Project(Project),
    Skill(Skill),
    Experience(Experience),
    PersonalInfo(PersonalInfo),
}

impl Document {
    #[inline]
    pub fn category(&self) -> Category {
        match self {
            Document::Project(_) => Category::Project,
            Document::Skill(_) => Category::Skill,
            Document::Experience(_) => Category::Experience,
            Document::PersonalInfo(_) => Category::PersonalInfo,
        }
    }

    #[inline]
    pub fn id(&self) -> i64 {
        match self {
            Document::Project(p) => p.id,
            Document::Skill(s) => s.id,
            Document::Experience(e) => e.id,
            Document::PersonalInfo(p) => p.id,
        }
    }

    /// Composite index key, e.g. "project_3".
    #[inline]
    pub fn key(&self) -> String {
        format!("{}_{}", self.category().as_str(), self.id())
    }

    #[inline]
    pub fn title(&self) -> &str {
        match self {
            Document::Project(p) => &p.title,
            Document::Skill(s) => &s.name,
            Document::Experience(e) => &e.role,
            Document::PersonalInfo(p) => &p.name,
        }
    }

    /// The text handed to the embedding provider: the document's embeddable
    /// fields joined in a fixed order. Metadata fields (URLs, dates) are
    /// intentionally excluded.
    #[inline]
    pub fn embedding_text(&self) -> String {
        match self {
            Document::Project(p) => {
                let mut parts = vec![
                    p.title.as_str(),
                    p.overview.as_str(),
                    p.description.as_str(),
                ];
                if !p.technologies.is_empty() {
                    parts.push(p.technologies.as_str());
                }
                parts.join("\n")
            }
            Document::Skill(s) => {
                let years = format!("{} years of experience", s.years);
                let mut parts = vec![s.name.as_str(), s.area.as_str()];
                if let Some(level) = &s.level {
                    parts.push(level.as_str());
                }
                parts.push(s.summary.as_str());
                parts.push(years.as_str());
                parts.join("\n")
            }
            Document::Experience(e) => {
                let period = e.period();
                let mut parts = vec![e.role.as_str(), e.company.as_str(), period.as_str()];
                parts.push(e.summary.as_str());
                if !e.technologies.is_empty() {
                    parts.push(e.technologies.as_str());
                }
                parts.join("\n")
            }
            Document::PersonalInfo(p) => {
                let mut parts = vec![p.name.as_str(), p.title.as_str()];
                if let Some(location) = &p.location {
                    parts.push(location.as_str());
                }
                parts.push(p.summary.as_str());
                if !p.interests.is_empty() {
                    parts.push(p.interests.as_str());
                }
                parts.join("\n")
            }
        }
    }
}

/// One loaded index entry: key, embedding, and the document itself.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub key: String,
    pub embedding: Vec<f32>,
    pub document: Document,
}

/// A ranked match from the knowledge index.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeHit {
    pub key: String,
    pub category: Category,
    pub id: i64,
    pub similarity: f32,
    pub document: Document,
}

#[derive(Debug, Default)]
struct Snapshot {
    entries: HashMap<String, IndexEntry>,
}

/// The knowledge base index. Holds a disposable, fully rebuildable snapshot
/// of all documents; SQLite remains the source of truth.
pub struct KnowledgeBase {
    database: Database,
    openai: OpenAiClient,
    default_limit: usize,
    default_threshold: f32,
    batch_size: usize,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    refresh_guard: Mutex<()>,
}

impl KnowledgeBase {
    #[inline]
    pub fn new(config: &Config, database: Database, openai: OpenAiClient) -> Self {
        Self {
            database,
            openai,
            default_limit: config.search.default_limit,
            default_threshold: config.search.similarity_threshold,
            batch_size: config.openai.batch_size as usize,
            snapshot: RwLock::new(None),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Load the index if it has not been loaded yet. Idempotent: a second
    /// call without an intervening `refresh` is a no-op.
    #[inline]
    pub async fn load(&self) -> Result<usize> {
        if let Some(snapshot) = self.current_snapshot().await {
            debug!("Knowledge index already loaded, skipping load");
            return Ok(snapshot.entries.len());
        }
        self.refresh().await
    }

    /// Rebuild the index from the database and swap it in atomically.
    /// On failure the previous snapshot (if any) stays authoritative.
    #[inline]
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.refresh_guard.lock().await;

        let snapshot = self.build_snapshot().await?;
        let count = snapshot.entries.len();

        *self.snapshot.write().await = Some(Arc::new(snapshot));
        info!("Knowledge index loaded with {} documents", count);
        Ok(count)
    }

    async fn build_snapshot(&self) -> Result<Snapshot> {
        let documents = self.fetch_documents().await?;
        debug!("Building knowledge snapshot from {} documents", documents.len());

        let mut entries = HashMap::with_capacity(documents.len());
        for chunk in documents.chunks(self.batch_size.max(1)) {
            let texts: Vec<String> = chunk.iter().map(Document::embedding_text).collect();
            let embeddings = self.openai.embed_batch(&texts).await.map_err(|e| {
                FolioError::KnowledgeBaseLoad(format!(
                    "embedding provider failed during load: {}",
                    e
                ))
            })?;

            for (document, embedding) in chunk.iter().zip(embeddings) {
                let key = document.key();
                entries.insert(
                    key.clone(),
                    IndexEntry {
                        key,
                        embedding,
                        document: document.clone(),
                    },
                );
            }
        }

        Ok(Snapshot { entries })
    }

    async fn fetch_documents(&self) -> Result<Vec<Document>> {
        let map_db_err = |e: anyhow::Error| {
            FolioError::KnowledgeBaseLoad(format!("failed to read documents: {}", e))
        };

        let mut documents = Vec::new();
        documents.extend(
            self.database
                .list_projects()
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(Document::Project),
        );
        documents.extend(
            self.database
                .list_skills()
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(Document::Skill),
        );
        documents.extend(
            self.database
                .list_experience()
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(Document::Experience),
        );
        documents.extend(
            self.database
                .list_personal_info()
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(Document::PersonalInfo),
        );
        Ok(documents)
    }

    async fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().await.clone()
    }

    #[inline]
    pub async fn is_loaded(&self) -> bool {
        self.current_snapshot().await.is_some()
    }

    #[inline]
    pub async fn entry_count(&self) -> usize {
        self.current_snapshot()
            .await
            .map_or(0, |s| s.entries.len())
    }

    /// Semantic search across every cached document. Linear scan; the corpus
    /// is a personal portfolio, not a document warehouse.
    #[inline]
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<KnowledgeHit>> {
        let Some(snapshot) = self.current_snapshot().await else {
            warn!("Knowledge index searched before load, returning no hits");
            return Ok(Vec::new());
        };

        if snapshot.entries.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.openai.embed(query).await?;
        Ok(rank(&snapshot.entries, &query_embedding, limit, threshold))
    }

    #[inline]
    pub async fn get_document(&self, category: Category, id: i64) -> Option<Document> {
        let snapshot = self.current_snapshot().await?;
        let key = format!("{}_{}", category.as_str(), id);
        snapshot.entries.get(&key).map(|e| e.document.clone())
    }

    #[inline]
    pub async fn get_by_category(&self, category: Category) -> Vec<Document> {
        let Some(snapshot) = self.current_snapshot().await else {
            return Vec::new();
        };

        let mut documents: Vec<Document> = snapshot
            .entries
            .values()
            .filter(|e| e.document.category() == category)
            .map(|e| e.document.clone())
            .collect();
        documents.sort_by_key(Document::id);
        documents
    }

    /// Search with the configured defaults and format the top hits into a
    /// short human-readable answer.
    #[inline]
    pub async fn contextual_response(&self, query: &str) -> Result<String> {
        let limit = self.default_limit.clamp(1, 3);
        let hits = self.search(query, limit, self.default_threshold).await?;
        Ok(format_hits(&hits))
    }
}

/// Cosine similarity between two vectors; 0.0 when either has zero norm.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// FNV-1a hash of a document's embedding text, stored next to the embedding
/// so seeding can skip unchanged content. Stable across runs and versions.
#[inline]
pub fn content_hash(text: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{:016x}", hash)
}

fn rank(
    entries: &HashMap<String, IndexEntry>,
    query_embedding: &[f32],
    limit: usize,
    threshold: f32,
) -> Vec<KnowledgeHit> {
    let mut hits: Vec<KnowledgeHit> = entries
        .values()
        .filter_map(|entry| {
            let similarity = cosine_similarity(query_embedding, &entry.embedding);
            if similarity > threshold {
                Some(KnowledgeHit {
                    key: entry.key.clone(),
                    category: entry.document.category(),
                    id: entry.document.id(),
                    similarity,
                    document: entry.document.clone(),
                })
            } else {
                None
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    hits.truncate(limit);
    hits
}

fn format_hits(hits: &[KnowledgeHit]) -> String {
    let Some(top) = hits.first() else {
        return NO_MATCH_RESPONSE.to_string();
    };

    let mut response = match &top.document {
        Document::Project(p) => {
            let technologies = p.technology_list();
            if technologies.is_empty() {
                format!("One of my projects is {}: {}", p.title, p.overview)
            } else {
                format!(
                    "One of my projects is {}: {} (built with {})",
                    p.title,
                    p.overview,
                    technologies.join(", ")
                )
            }
        }
        Document::Skill(s) => {
            if s.years > 0 {
                format!(
                    "I've worked with {} for {} years. {}",
                    s.name, s.years, s.summary
                )
            } else {
                format!("I've worked with {}. {}", s.name, s.summary)
            }
        }
        Document::Experience(e) => {
            format!("{} at {} ({}): {}", e.role, e.company, e.period(), e.summary)
        }
        Document::PersonalInfo(p) => {
            format!("{}, {}. {}", p.name, p.title, p.summary)
        }
    };

    if hits.len() > 1 {
        let related: Vec<&str> = hits
            .iter()
            .skip(1)
            .map(|hit| hit.document.title())
            .collect();
        response.push_str(&format!("\n\nRelated: {}", related.join(", ")));
    }

    response
}
