// file: src/database/client.rs
// description: LanceDB store for legal documents with cosine vector search
// reference: https://docs.rs/lancedb

use crate::config::RagConfig;
use crate::error::{AssistantError, Result};
use crate::models::{Jurisdiction, LegalDocument, SearchResult, SourceType};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table, connect};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct LegalStore {
    connection: Connection,
    table_name: String,
    embedding_dim: usize,
}

impl LegalStore {
    pub async fn new(config: &RagConfig) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| AssistantError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            table_name: config.table_name.clone(),
            embedding_dim: config.embedding_dim,
        })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        self.connection
            .table_names()
            .execute()
            .await
            .map(|_| true)
            .map_err(|e| AssistantError::Database(format!("LanceDB connection failed: {}", e)))
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AssistantError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                AssistantError::Database(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    pub async fn count(&self) -> Result<usize> {
        if !self.table_exists(&self.table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(&self.table_name).await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| AssistantError::Database(format!("Failed to count rows: {}", e)))
    }

    /// Nearest documents by cosine distance. The returned score is the raw
    /// similarity `1 - distance`; jurisdiction boosting happens in the retriever.
    /// A missing or non-finite distance scores 0.0.
    pub async fn vector_search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if !self.table_exists(&self.table_name).await? {
            warn!("Table does not exist, returning empty results");
            return Ok(Vec::new());
        }

        let table = self.get_table(&self.table_name).await?;

        debug!("Performing vector search with limit {}", limit);

        let mut results_stream = table
            .vector_search(query_embedding)
            .map_err(|e| AssistantError::Database(format!("Failed to create vector search: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AssistantError::Database(format!("Vector search failed: {}", e)))?;

        let mut search_results = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                AssistantError::Database(format!("Failed to read result batch: {}", e))
            })?;

            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for (i, document) in documents_from_batch(&batch)?.into_iter().enumerate() {
                let (score, distance) = match distances {
                    Some(dist_array) if dist_array.is_valid(i) && dist_array.value(i).is_finite() => {
                        let dist = dist_array.value(i);
                        (1.0 - dist, Some(dist))
                    }
                    _ => (0.0, None),
                };

                search_results.push(SearchResult::from_document(document, score, distance));
            }
        }

        debug!("Vector search returned {} results", search_results.len());
        Ok(search_results)
    }

    /// All stored documents, without their embeddings.
    pub async fn list_documents(&self) -> Result<Vec<LegalDocument>> {
        if !self.table_exists(&self.table_name).await? {
            return Ok(Vec::new());
        }

        let table = self.get_table(&self.table_name).await?;

        let mut stream = table
            .query()
            .select(Select::columns(&[
                "doc_id",
                "title",
                "content",
                "jurisdiction",
                "source_type",
                "content_hash",
            ]))
            .execute()
            .await
            .map_err(|e| AssistantError::Database(format!("Failed to scan table: {}", e)))?;

        let mut documents = Vec::new();
        while let Some(batch_result) = stream.next().await {
            let batch = batch_result.map_err(|e| {
                AssistantError::Database(format!("Failed to read result batch: {}", e))
            })?;
            documents.extend(documents_from_batch(&batch)?);
        }

        Ok(documents)
    }

    pub async fn existing_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .list_documents()
            .await?
            .into_iter()
            .map(|doc| doc.doc_id)
            .collect())
    }

    pub async fn existing_hashes(&self) -> Result<HashSet<String>> {
        Ok(self
            .list_documents()
            .await?
            .into_iter()
            .map(|doc| doc.content_hash)
            .collect())
    }

    /// Removes the rows of `doc_ids` that were not written by `keep_revision`.
    pub async fn delete_superseded(&self, doc_ids: &[String], keep_revision: &str) -> Result<()> {
        if doc_ids.is_empty() || !self.table_exists(&self.table_name).await? {
            return Ok(());
        }

        let quoted: Vec<String> = doc_ids.iter().map(|id| quote(id)).collect();
        let predicate = format!(
            "doc_id IN ({}) AND revision <> {}",
            quoted.join(", "),
            quote(keep_revision)
        );

        let table = self.get_table(&self.table_name).await?;
        table
            .delete(&predicate)
            .await
            .map_err(|e| AssistantError::Database(format!("Failed to delete documents: {}", e)))?;

        debug!("Deleted superseded rows for {} document ids", doc_ids.len());
        Ok(())
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AssistantError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AssistantError::Database(format!("Invalid '{}' column type", name)))
}

fn documents_from_batch(batch: &RecordBatch) -> Result<Vec<LegalDocument>> {
    let doc_ids = string_column(batch, "doc_id")?;
    let titles = string_column(batch, "title")?;
    let contents = string_column(batch, "content")?;
    let jurisdictions = string_column(batch, "jurisdiction")?;
    let source_types = string_column(batch, "source_type")?;
    let hashes = string_column(batch, "content_hash")?;

    Ok((0..batch.num_rows())
        .map(|i| LegalDocument {
            doc_id: doc_ids.value(i).to_string(),
            title: titles.value(i).to_string(),
            content: contents.value(i).to_string(),
            jurisdiction: Jurisdiction::parse(jurisdictions.value(i)),
            source_type: SourceType::parse(source_types.value(i)),
            content_hash: hashes.value(i).to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default_config().rag;
        config.uri = dir.path().to_string_lossy().to_string();

        let store = LegalStore::new(&config).await.unwrap();
        assert!(store.ping().await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_documents().await.unwrap().is_empty());
        assert!(store.vector_search(vec![0.0; 384], 5).await.unwrap().is_empty());
    }
}
