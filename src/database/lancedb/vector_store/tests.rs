use super::*;
use crate::database::lancedb::DocumentMetadata;
use tempfile::TempDir;

const DIM: usize = 4;

async fn create_test_store() -> (TempDir, VectorStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = VectorStore::new(temp_dir.path().join("vectors"), DIM)
        .await
        .expect("Failed to create vector store");
    (temp_dir, store)
}

fn record(key: &str, category: &str, record_id: i64, vector: Vec<f32>) -> EmbeddedDocument {
    EmbeddedDocument {
        id: format!("vec-{}", key),
        vector,
        metadata: DocumentMetadata {
            key: key.to_string(),
            category: category.to_string(),
            record_id,
            title: format!("Title for {}", key),
            content: format!("Content for {}", key),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        },
    }
}

#[tokio::test]
async fn empty_store_returns_no_hits() {
    let (_temp_dir, store) = create_test_store().await;

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 5, 0.7, None)
        .await
        .expect("Search should succeed");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn search_orders_by_similarity_descending() {
    let (_temp_dir, store) = create_test_store().await;

    store
        .upsert(&[
            record("project_1", "project", 1, vec![1.0, 0.0, 0.0, 0.0]),
            record("project_2", "project", 2, vec![0.8, 0.6, 0.0, 0.0]),
            record("project_3", "project", 3, vec![0.0, 1.0, 0.0, 0.0]),
        ])
        .await
        .expect("Failed to upsert");

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 5, -1.0, None)
        .await
        .expect("Search should succeed");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].key, "project_1");
    assert_eq!(hits[1].key, "project_2");
    assert!(hits[0].similarity >= hits[1].similarity);
    assert!(hits[1].similarity >= hits[2].similarity);
    assert!(hits[0].similarity > 0.999);
}

#[tokio::test]
async fn threshold_is_strictly_greater_than() {
    let (_temp_dir, store) = create_test_store().await;

    // Orthogonal vector: cosine similarity exactly 0.0 against the query.
    store
        .upsert(&[record("skill_1", "skill", 1, vec![0.0, 1.0, 0.0, 0.0])])
        .await
        .expect("Failed to upsert");

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 5, 0.0, None)
        .await
        .expect("Search should succeed");
    assert!(hits.is_empty(), "similarity == threshold must be excluded");

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 5, -0.1, None)
        .await
        .expect("Search should succeed");
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn limit_caps_results() {
    let (_temp_dir, store) = create_test_store().await;

    store
        .upsert(&[
            record("project_1", "project", 1, vec![1.0, 0.0, 0.0, 0.0]),
            record("project_2", "project", 2, vec![0.9, 0.1, 0.0, 0.0]),
            record("project_3", "project", 3, vec![0.8, 0.2, 0.0, 0.0]),
        ])
        .await
        .expect("Failed to upsert");

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 2, -1.0, None)
        .await
        .expect("Search should succeed");
    assert_eq!(hits.len(), 2);

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 0, -1.0, None)
        .await
        .expect("Search should succeed");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn category_filter_restricts_hits() {
    let (_temp_dir, store) = create_test_store().await;

    store
        .upsert(&[
            record("project_1", "project", 1, vec![1.0, 0.0, 0.0, 0.0]),
            record("skill_1", "skill", 1, vec![0.99, 0.01, 0.0, 0.0]),
        ])
        .await
        .expect("Failed to upsert");

    let hits = store
        .search(&[1.0, 0.0, 0.0, 0.0], 5, -1.0, Some("project"))
        .await
        .expect("Search should succeed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].category, "project");
}

#[tokio::test]
async fn upsert_replaces_existing_key() {
    let (_temp_dir, store) = create_test_store().await;

    store
        .upsert(&[record("project_1", "project", 1, vec![1.0, 0.0, 0.0, 0.0])])
        .await
        .expect("Failed to upsert");
    store
        .upsert(&[record("project_1", "project", 1, vec![0.0, 1.0, 0.0, 0.0])])
        .await
        .expect("Failed to upsert");

    assert_eq!(
        store
            .count_embeddings()
            .await
            .expect("Failed to count rows"),
        1
    );

    let hits = store
        .search(&[0.0, 1.0, 0.0, 0.0], 5, 0.9, None)
        .await
        .expect("Search should succeed");
    assert_eq!(hits.len(), 1, "old vector should have been replaced");
}

#[tokio::test]
async fn rejects_wrong_dimension() {
    let (_temp_dir, store) = create_test_store().await;

    let result = store
        .upsert(&[record("project_1", "project", 1, vec![1.0, 0.0])])
        .await;
    assert!(result.is_err());

    let result = store.search(&[1.0, 0.0], 5, 0.0, None).await;
    assert!(result.is_err());
}

#[test]
fn result_batches_must_carry_a_float32_distance() {
    let columns: Vec<Arc<dyn Array>> = vec![Arc::new(Float32Array::from(vec![0.25_f32]))];
    let with_distance = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new(
            "_distance",
            DataType::Float32,
            true,
        )])),
        columns,
    )
    .expect("Failed to build batch");
    let distances = distance_column(&with_distance).expect("Column should be found");
    assert_eq!(distances.value(0), 0.25);

    let columns: Vec<Arc<dyn Array>> = vec![Arc::new(StringArray::from(vec!["project_1"]))];
    let missing = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new("key", DataType::Utf8, false)])),
        columns,
    )
    .expect("Failed to build batch");
    assert!(distance_column(&missing).is_err());

    let columns: Vec<Arc<dyn Array>> = vec![Arc::new(Int64Array::from(vec![0_i64]))];
    let wrong_type = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new(
            "_distance",
            DataType::Int64,
            false,
        )])),
        columns,
    )
    .expect("Failed to build batch");
    assert!(distance_column(&wrong_type).is_err());
}

#[tokio::test]
async fn reopen_validates_dimension() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("vectors");

    {
        let store = VectorStore::new(&path, DIM)
            .await
            .expect("Failed to create vector store");
        store
            .upsert(&[record("project_1", "project", 1, vec![1.0, 0.0, 0.0, 0.0])])
            .await
            .expect("Failed to upsert");
    }

    assert!(VectorStore::new(&path, DIM).await.is_ok());
    assert!(VectorStore::new(&path, 8).await.is_err());
}
