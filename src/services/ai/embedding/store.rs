//! LanceDB storage operations

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use arrow_array::builder::{FixedSizeListBuilder, Float32Builder};
use arrow_array::{
    Float32Array, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures_util::TryStreamExt;
use lancedb::arrow::SendableRecordBatchStream;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, DistanceType, Error as LanceError, Table};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Embedder;
use super::{
    COLUMN_CHUNK_ID, COLUMN_CHUNK_INDEX, COLUMN_CHUNK_TEXT, COLUMN_DISTANCE,
    COLUMN_EMBEDDING_HASH, COLUMN_EMBEDDING_MODEL, COLUMN_PAGE_NUMBER, COLUMN_SOURCE,
    COLUMN_VECTOR, COLUMN_VECTOR_ID,
};
use crate::error::{AppError, AppResult, ResultExt};
use crate::services::{DocumentChunk, VectorConfig};
use crate::utils::compute_sha256;

/// Internal representation of a chunk stored in LanceDB
#[derive(Debug, Clone)]
struct LanceChunk {
    vector_id: String,
    chunk_id: i64,
    source: String,
    page_number: i32,
    chunk_index: i32,
    chunk_text: String,
    embedding_hash: String,
    embedding_model: String,
    vector: Vec<f32>,
}

/// Search result from vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: i64,
    pub source: String,
    pub page_number: i32,
    pub chunk_index: i32,
    pub chunk_text: String,
    /// `1 - cosine distance`
    pub score: f64,
}

pub struct VectorStore {
    table: Table,
    schema: Arc<Schema>,
    embedder: Arc<dyn Embedder>,
    config: VectorConfig,
}

impl VectorStore {
    /// Open the table, creating it empty when missing. Used at ingest time.
    pub async fn open_or_create(
        config: VectorConfig,
        embedder: Arc<dyn Embedder>,
    ) -> AppResult<Self> {
        let schema = build_schema(embedder.dimension())?;
        let db = connect(&config.lancedb_path)
            .execute()
            .await
            .vector_err("failed to open vector store")?;

        let table = match db.open_table(&config.table_name).execute().await {
            Ok(table) => table,
            Err(LanceError::TableNotFound { .. }) => {
                tracing::info!(path = %config.lancedb_path, table = %config.table_name, "creating vector table");
                db.create_empty_table(&config.table_name, schema.clone())
                    .execute()
                    .await
                    .vector_err("failed to create vector table")?
            }
            Err(err) => return Err(AppError::VectorStore(err.to_string())),
        };

        Self::from_table(table, schema, embedder, config).await
    }

    /// Open an already ingested store. Used at query time.
    pub async fn open(config: VectorConfig, embedder: Arc<dyn Embedder>) -> AppResult<Self> {
        if !Path::new(&config.lancedb_path).exists() {
            return Err(not_ingested(&config));
        }

        let schema = build_schema(embedder.dimension())?;
        let db = connect(&config.lancedb_path)
            .execute()
            .await
            .vector_err("failed to open vector store")?;

        let table = match db.open_table(&config.table_name).execute().await {
            Ok(table) => table,
            Err(LanceError::TableNotFound { .. }) => return Err(not_ingested(&config)),
            Err(err) => return Err(AppError::VectorStore(err.to_string())),
        };

        Self::from_table(table, schema, embedder, config).await
    }

    /// Delete the whole on-disk store directory.
    pub fn destroy(config: &VectorConfig) -> AppResult<()> {
        let path = Path::new(&config.lancedb_path);
        if path.exists() {
            std::fs::remove_dir_all(path)?;
            tracing::info!(path = %config.lancedb_path, "vector store removed");
        }
        Ok(())
    }

    async fn from_table(
        table: Table,
        schema: Arc<Schema>,
        embedder: Arc<dyn Embedder>,
        config: VectorConfig,
    ) -> AppResult<Self> {
        let existing = table.schema().await.vector_err("failed to read table schema")?;
        let stored_dim = vector_dimension(&existing)?;
        if stored_dim != embedder.dimension() {
            return Err(AppError::Config(format!(
                "vector store at {} holds {}-dimensional vectors but {} produces {}; run `docqa reset --yes` and ingest again",
                config.lancedb_path,
                stored_dim,
                embedder.model_name(),
                embedder.dimension()
            )));
        }

        Ok(Self {
            table,
            schema,
            embedder,
            config,
        })
    }

    pub fn config(&self) -> &VectorConfig {
        &self.config
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embed and append chunks. Returns the number of rows written.
    pub async fn index(&self, chunks: &[DocumentChunk]) -> AppResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let rows = self.embed_chunks(chunks).await?;
        let batch = build_record_batch(self.schema.clone(), &rows)?;
        self.write_batch(batch).await?;
        tracing::info!(rows = rows.len(), table = %self.config.table_name, "chunks indexed");
        Ok(rows.len())
    }

    /// Replace the whole contents of the table with `chunks`.
    ///
    /// Rows are only deleted once every chunk is embedded and the batch is
    /// built, so an embedding failure keeps the previous contents.
    pub async fn rebuild(&self, chunks: &[DocumentChunk]) -> AppResult<usize> {
        let rows = self.embed_chunks(chunks).await?;
        let batch = if rows.is_empty() {
            None
        } else {
            Some(build_record_batch(self.schema.clone(), &rows)?)
        };

        self.clear().await?;
        if let Some(batch) = batch {
            self.write_batch(batch).await?;
        }
        tracing::info!(rows = rows.len(), table = %self.config.table_name, "vector table rebuilt");
        Ok(rows.len())
    }

    async fn embed_chunks(&self, chunks: &[DocumentChunk]) -> AppResult<Vec<LanceChunk>> {
        let batch_size = self.config.embed_batch_size.max(1);
        let model_name = self.embedder.model_name().to_string();
        let mut rows = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::AiService(format!(
                    "embedding result count mismatch: {} texts, {} vectors",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (chunk, vector) in batch.iter().zip(vectors) {
                rows.push(LanceChunk {
                    vector_id: Uuid::new_v4().to_string(),
                    chunk_id: chunk.chunk_id,
                    source: chunk.source.clone(),
                    page_number: chunk.page_number,
                    chunk_index: chunk.chunk_index,
                    chunk_text: chunk.text.clone(),
                    embedding_hash: compute_embedding_hash(&chunk.text),
                    embedding_model: model_name.clone(),
                    vector,
                });
            }
            tracing::debug!(embedded = rows.len(), total = chunks.len(), "embedding progress");
        }

        Ok(rows)
    }

    /// The `k` chunks nearest to `text`, best first.
    pub async fn query(&self, text: &str, k: usize) -> AppResult<Vec<SearchResult>> {
        if k == 0 {
            return Err(AppError::Validation("k must be at least 1".to_string()));
        }
        let vector = self.embedder.embed_query(text).await?;

        let stream = self
            .table
            .query()
            .nearest_to(vector)
            .vector_err("invalid query vector")?
            .column(COLUMN_VECTOR)
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .vector_err("vector search failed")?;

        let mut results = collect_search_results(stream).await?;
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }

    pub async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .vector_err("failed to count rows")
    }

    /// Remove every entry, keeping the table.
    pub async fn clear(&self) -> AppResult<()> {
        let predicate = format!("{} IS NOT NULL", COLUMN_VECTOR_ID);
        self.table
            .delete(&predicate)
            .await
            .vector_err("failed to clear vector table")?;
        Ok(())
    }

    async fn write_batch(&self, batch: RecordBatch) -> AppResult<()> {
        let batches = RecordBatchIterator::new(vec![Ok(batch)], self.schema.clone());
        self.table
            .add(batches)
            .execute()
            .await
            .vector_err("failed to write chunks")?;

        Ok(())
    }
}

fn not_ingested(config: &VectorConfig) -> AppError {
    AppError::NotFound {
        entity: "vector store",
        detail: format!(
            "{} (table {}); run `docqa ingest` first",
            config.lancedb_path, config.table_name
        ),
    }
}

fn build_schema(dimension: usize) -> AppResult<Arc<Schema>> {
    let dim = i32::try_from(dimension)
        .map_err(|_| AppError::Config("vector dimension overflow".to_string()))?;

    let vector = DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim);

    Ok(Arc::new(Schema::new(vec![
        Field::new(COLUMN_VECTOR_ID, DataType::Utf8, false),
        Field::new(COLUMN_CHUNK_ID, DataType::Int64, false),
        Field::new(COLUMN_SOURCE, DataType::Utf8, false),
        Field::new(COLUMN_PAGE_NUMBER, DataType::Int32, false),
        Field::new(COLUMN_CHUNK_INDEX, DataType::Int32, false),
        Field::new(COLUMN_CHUNK_TEXT, DataType::Utf8, false),
        Field::new(COLUMN_EMBEDDING_HASH, DataType::Utf8, false),
        Field::new(COLUMN_EMBEDDING_MODEL, DataType::Utf8, false),
        Field::new(COLUMN_VECTOR, vector, false),
    ])))
}

fn vector_dimension(schema: &Schema) -> AppResult<usize> {
    match schema
        .field_with_name(COLUMN_VECTOR)
        .vector_err("table has no vector column")?
        .data_type()
    {
        DataType::FixedSizeList(_, size) => Ok(*size as usize),
        _ => Err(AppError::VectorStore(
            "vector column is not a fixed size list".to_string(),
        )),
    }
}

fn build_record_batch(schema: Arc<Schema>, rows: &[LanceChunk]) -> AppResult<RecordBatch> {
    let vector_ids = StringArray::from_iter_values(rows.iter().map(|row| row.vector_id.as_str()));
    let chunk_ids = Int64Array::from_iter_values(rows.iter().map(|row| row.chunk_id));
    let sources = StringArray::from_iter_values(rows.iter().map(|row| row.source.as_str()));
    let page_numbers = Int32Array::from_iter_values(rows.iter().map(|row| row.page_number));
    let chunk_indices = Int32Array::from_iter_values(rows.iter().map(|row| row.chunk_index));
    let chunk_texts =
        StringArray::from_iter_values(rows.iter().map(|row| row.chunk_text.as_str()));
    let embedding_hashes =
        StringArray::from_iter_values(rows.iter().map(|row| row.embedding_hash.as_str()));
    let embedding_models =
        StringArray::from_iter_values(rows.iter().map(|row| row.embedding_model.as_str()));

    let dim = vector_dimension(&schema)?;
    let vectors = build_vector_column(rows, dim)?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(vector_ids),
            Arc::new(chunk_ids),
            Arc::new(sources),
            Arc::new(page_numbers),
            Arc::new(chunk_indices),
            Arc::new(chunk_texts),
            Arc::new(embedding_hashes),
            Arc::new(embedding_models),
            Arc::new(vectors),
        ],
    )
    .vector_err("failed to build record batch")
}

fn build_vector_column(
    rows: &[LanceChunk],
    dim: usize,
) -> AppResult<arrow_array::FixedSizeListArray> {
    let mut builder = FixedSizeListBuilder::with_capacity(
        Float32Builder::with_capacity(rows.len() * dim),
        dim as i32,
        rows.len(),
    );

    for row in rows {
        if row.vector.len() != dim {
            return Err(AppError::AiService(format!(
                "embedding vector size mismatch: expected {}, got {}",
                dim,
                row.vector.len()
            )));
        }
        builder.values().append_slice(&row.vector);
        builder.append(true);
    }

    Ok(builder.finish())
}

async fn collect_search_results(
    mut stream: SendableRecordBatchStream,
) -> AppResult<Vec<SearchResult>> {
    let mut results = Vec::new();

    while let Some(batch) = stream.try_next().await.vector_err("failed to read search results")? {
        if batch.num_rows() == 0 {
            continue;
        }

        let chunk_ids = int64_column(&batch, COLUMN_CHUNK_ID)?;
        let page_numbers = int32_column(&batch, COLUMN_PAGE_NUMBER)?;
        let chunk_indices = int32_column(&batch, COLUMN_CHUNK_INDEX)?;
        let sources = string_column(&batch, COLUMN_SOURCE)?;
        let chunk_texts = string_column(&batch, COLUMN_CHUNK_TEXT)?;

        let scores = if let Some(column) = batch.column_by_name(COLUMN_DISTANCE) {
            column
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| AppError::VectorStore("distance column type mismatch".to_string()))?
                .iter()
                .map(|value| 1.0 - value.unwrap_or(1.0) as f64)
                .collect::<Vec<f64>>()
        } else {
            vec![0.0; batch.num_rows()]
        };

        for row_idx in 0..batch.num_rows() {
            results.push(SearchResult {
                chunk_id: chunk_ids.value(row_idx),
                source: sources.value(row_idx).to_string(),
                page_number: page_numbers.value(row_idx),
                chunk_index: chunk_indices.value(row_idx),
                chunk_text: chunk_texts.value(row_idx).to_string(),
                score: scores.get(row_idx).copied().unwrap_or(0.0),
            });
        }
    }

    Ok(results)
}

fn int64_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a Int64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AppError::VectorStore(format!("search result missing {name}")))?
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| AppError::VectorStore(format!("{name} column type mismatch")))
}

fn int32_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a Int32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AppError::VectorStore(format!("search result missing {name}")))?
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| AppError::VectorStore(format!("{name} column type mismatch")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AppError::VectorStore(format!("search result missing {name}")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AppError::VectorStore(format!("{name} column type mismatch")))
}

pub fn compute_embedding_hash(text: &str) -> String {
    let hash = compute_sha256(text.as_bytes());
    hash.chars().take(16).collect()
}
