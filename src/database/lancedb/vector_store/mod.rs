#[cfg(test)]
mod tests;

use super::EmbeddedDocument;
use crate::openai::OpenAiClient;
use crate::{FolioError, Result};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatchIterator, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "documents";

/// Vector store backed by LanceDB, one row per embedded portfolio document.
pub struct VectorStore {
    connection: Connection,
    dimension: usize,
}

/// A single nearest-neighbor hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VectorHit {
    pub key: String,
    pub category: String,
    pub record_id: i64,
    pub title: String,
    pub content: String,
    /// Cosine similarity, `1 - distance`, in [-1, 1].
    pub similarity: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Open (or create) the vector database at `db_path` with a fixed
    /// embedding dimension. An existing table with a different dimension is
    /// rejected rather than silently recreated.
    #[inline]
    pub async fn new<P: AsRef<Path>>(db_path: P, dimension: usize) -> Result<Self> {
        let db_path = db_path.as_ref();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FolioError::Database(format!(
                        "Failed to create vector database directory: {}",
                        e
                    ))
                })?;
            }
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let store = Self {
            connection,
            dimension,
        };
        store.initialize_table().await?;

        info!("Vector store initialized with {} dimensions", dimension);
        Ok(store)
    }

    async fn initialize_table(&self) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&TABLE_NAME.to_string()) {
            let existing = self.existing_vector_dimension().await?;
            if existing != self.dimension {
                return Err(FolioError::Database(format!(
                    "Existing vector table has dimension {} but configuration expects {}; \
                     re-seed with --recompute after clearing the vector directory",
                    existing, self.dimension
                )));
            }
            debug!("Documents table already exists with matching dimension");
            return Ok(());
        }

        let schema = self.create_schema();
        self.connection
            .create_empty_table(TABLE_NAME, schema)
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to create table: {}", e)))?;

        info!("Documents table created");
        Ok(())
    }

    async fn existing_vector_dimension(&self) -> Result<usize> {
        let table = self.open_table().await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(FolioError::Database(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("key", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("record_id", DataType::Int64, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to open table: {}", e)))
    }

    /// Insert or replace embeddings, keyed by each record's document key.
    /// Replacing deletes the prior row so a document never has two vectors.
    #[inline]
    pub async fn upsert(&self, records: &[EmbeddedDocument]) -> Result<()> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        for record in records {
            if record.vector.len() != self.dimension {
                return Err(FolioError::Database(format!(
                    "Embedding for {} has dimension {}, expected {}",
                    record.metadata.key,
                    record.vector.len(),
                    self.dimension
                )));
            }
        }

        debug!("Upserting batch of {} embeddings", records.len());

        let keys: Vec<String> = records.iter().map(|r| r.metadata.key.clone()).collect();
        self.delete_by_keys(&keys).await?;

        let record_batch = self.create_record_batch(records)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let table = self.open_table().await?;
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to insert embeddings: {}", e)))?;

        info!("Stored {} embeddings", records.len());
        Ok(())
    }

    fn create_record_batch(&self, records: &[EmbeddedDocument]) -> Result<RecordBatch> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut keys = Vec::with_capacity(len);
        let mut categories = Vec::with_capacity(len);
        let mut record_ids = Vec::with_capacity(len);
        let mut titles = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            keys.push(record.metadata.key.as_str());
            categories.push(record.metadata.category.as_str());
            record_ids.push(record.metadata.record_id);
            titles.push(record.metadata.title.as_str());
            contents.push(record.metadata.content.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let mut flat_values = Vec::with_capacity(len * self.dimension);
        for record in records {
            flat_values.extend_from_slice(&record.vector);
        }
        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| FolioError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(keys)),
            Arc::new(StringArray::from(categories)),
            Arc::new(Int64Array::from(record_ids)),
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(self.create_schema(), arrays)
            .map_err(|e| FolioError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Embed `query_text` and return the nearest documents by cosine
    /// similarity, strictly above `threshold`, capped at `limit`.
    #[inline]
    pub async fn nearest_neighbors(
        &self,
        openai: &OpenAiClient,
        query_text: &str,
        limit: usize,
        threshold: f32,
        category: Option<&str>,
    ) -> Result<Vec<VectorHit>> {
        let query_vector = openai.embed(query_text).await?;
        self.search(&query_vector, limit, threshold, category).await
    }

    /// Nearest-neighbor search with a precomputed query vector.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        threshold: f32,
        category: Option<&str>,
    ) -> Result<Vec<VectorHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if query_vector.len() != self.dimension {
            return Err(FolioError::Database(format!(
                "Query vector has dimension {}, expected {}",
                query_vector.len(),
                self.dimension
            )));
        }

        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self.open_table().await?;

        let mut query = table
            .vector_search(query_vector)
            .map_err(|e| FolioError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit);

        if let Some(category) = category {
            query = query.only_if(format!("category = '{}'", escape_predicate(category)));
        }

        let mut results = query
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to execute search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to read result stream: {}", e)))?
        {
            hits.extend(self.parse_search_batch(&batch)?);
        }

        hits.retain(|hit| hit.similarity > threshold);
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        debug!("Search produced {} hits above threshold", hits.len());
        Ok(hits)
    }

    fn parse_search_batch(&self, batch: &RecordBatch) -> Result<Vec<VectorHit>> {
        let keys = string_column(batch, "key")?;
        let categories = string_column(batch, "category")?;
        let titles = string_column(batch, "title")?;
        let contents = string_column(batch, "content")?;

        let record_ids = batch
            .column_by_name("record_id")
            .ok_or_else(|| FolioError::Database("Missing record_id column".to_string()))?
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| FolioError::Database("Invalid record_id column type".to_string()))?;

        let distances = distance_column(batch)?;

        let mut hits = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            if distances.is_null(row) {
                return Err(FolioError::Database(
                    "Null _distance in search result".to_string(),
                ));
            }
            let distance = distances.value(row);

            hits.push(VectorHit {
                key: keys.value(row).to_string(),
                category: categories.value(row).to_string(),
                record_id: record_ids.value(row),
                title: titles.value(row).to_string(),
                content: contents.value(row).to_string(),
                similarity: 1.0 - distance,
                distance,
            });
        }

        Ok(hits)
    }

    /// Delete the embeddings for the given document keys.
    #[inline]
    pub async fn delete_by_keys(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let quoted: Vec<String> = keys
            .iter()
            .map(|k| format!("'{}'", escape_predicate(k)))
            .collect();
        let predicate = format!("key IN ({})", quoted.join(", "));

        let table = self.open_table().await?;
        table
            .delete(&predicate)
            .await
            .map_err(|e| FolioError::Database(format!("Failed to delete embeddings: {}", e)))?;

        Ok(())
    }

    /// Total number of stored embeddings.
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64> {
        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| FolioError::Database(format!("Failed to count rows: {}", e)))?;
        Ok(count as u64)
    }

    /// Build an ANN index on the vector column. LanceDB picks an IVF-family
    /// index; callers should skip this for corpora too small to train one.
    #[inline]
    pub async fn create_vector_index(&self) -> Result<()> {
        debug!("Creating vector index");

        let table = self.open_table().await?;
        table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
            .map_err(|e| FolioError::Database(format!("Failed to create vector index: {}", e)))?;

        info!("Vector index created");
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| FolioError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FolioError::Database(format!("Invalid {} column type", name)))
}

// A search result without a usable distance must fail loudly: defaulting
// the distance would report similarity 1.0 and pass any threshold.
fn distance_column(batch: &RecordBatch) -> Result<&Float32Array> {
    batch
        .column_by_name("_distance")
        .ok_or_else(|| FolioError::Database("Missing _distance column in search result".to_string()))?
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| FolioError::Database("Invalid _distance column type".to_string()))
}

fn escape_predicate(value: &str) -> String {
    value.replace('\'', "''")
}
