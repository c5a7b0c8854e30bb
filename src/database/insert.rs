// file: src/database/insert.rs
// description: LanceDB insertion of legal documents with vector embeddings
// reference: https://docs.rs/lancedb

use crate::database::client::LegalStore;
use crate::database::embeddings::Embedder;
use crate::database::schema::SchemaManager;
use crate::error::{AssistantError, Result};
use crate::models::LegalDocument;
use arrow_array::{FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt64Array};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct DocumentInserter<'a> {
    store: &'a LegalStore,
    embedder: &'a Embedder,
}

#[derive(Debug, Clone, Default)]
pub struct InsertStats {
    pub documents_inserted: usize,
    /// Revision tag stamped on every row of this insert.
    pub revision: String,
}

impl<'a> DocumentInserter<'a> {
    pub fn new(store: &'a LegalStore, embedder: &'a Embedder) -> Self {
        Self { store, embedder }
    }

    pub async fn insert_document(&self, document: &LegalDocument) -> Result<String> {
        let stats = self.insert_batch(std::slice::from_ref(document)).await?;
        if stats.documents_inserted == 0 {
            return Err(AssistantError::Database(format!(
                "Document {} was not inserted",
                document.doc_id
            )));
        }
        Ok(document.doc_id.clone())
    }

    /// Embeds every document and writes them in one append, creating the
    /// table on first use.
    pub async fn insert_batch(&self, documents: &[LegalDocument]) -> Result<InsertStats> {
        if documents.is_empty() {
            return Ok(InsertStats::default());
        }

        let mut embeddings = Vec::with_capacity(documents.len());
        for document in documents {
            embeddings.push(self.embedder.embed(&Self::embedding_text(document)).await);
        }

        self.insert_with_embeddings(documents, &embeddings).await
    }

    /// Text a document is embedded from: its title, then its content.
    pub fn embedding_text(document: &LegalDocument) -> String {
        format!("{}\n{}", document.title, document.content)
    }

    /// Writes documents whose embeddings were computed by the caller.
    pub async fn insert_with_embeddings(
        &self,
        documents: &[LegalDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<InsertStats> {
        if documents.is_empty() {
            return Ok(InsertStats::default());
        }

        if documents.len() != embeddings.len() {
            return Err(AssistantError::Database(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        let dim = self.store.embedding_dim();
        let schema = SchemaManager::get_documents_schema(dim);
        let revision = Uuid::new_v4().to_string();

        let record_batch =
            Self::create_record_batch(schema.clone(), documents, embeddings, &revision, dim)?;
        let table_name = self.store.table_name();

        if !self.store.table_exists(table_name).await? {
            self.store
                .get_connection()
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(record_batch)], schema.clone()),
                )
                .execute()
                .await
                .map_err(|e| AssistantError::Database(format!("Failed to create table: {}", e)))?;
            info!("Created new table: {}", table_name);
        } else {
            let table = self.store.get_table(table_name).await?;
            table
                .add(RecordBatchIterator::new(vec![Ok(record_batch)], schema))
                .execute()
                .await
                .map_err(|e| {
                    AssistantError::Database(format!("Failed to insert documents: {}", e))
                })?;
        }

        debug!("Inserted {} documents as revision {}", documents.len(), revision);
        Ok(InsertStats {
            documents_inserted: documents.len(),
            revision,
        })
    }

    fn create_record_batch(
        schema: Arc<arrow_schema::Schema>,
        documents: &[LegalDocument],
        embeddings: &[Vec<f32>],
        revision: &str,
        dim: usize,
    ) -> Result<RecordBatch> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        let doc_ids: StringArray = documents.iter().map(|d| Some(d.doc_id.as_str())).collect();
        let titles: StringArray = documents.iter().map(|d| Some(d.title.as_str())).collect();
        let contents: StringArray = documents.iter().map(|d| Some(d.content.as_str())).collect();
        let jurisdictions: StringArray = documents
            .iter()
            .map(|d| Some(d.jurisdiction.as_str()))
            .collect();
        let source_types: StringArray = documents
            .iter()
            .map(|d| Some(d.source_type.as_str()))
            .collect();
        let hashes: StringArray = documents
            .iter()
            .map(|d| Some(d.content_hash.as_str()))
            .collect();
        let revisions: StringArray = documents.iter().map(|_| Some(revision)).collect();
        let indexed_at: UInt64Array = documents.iter().map(|_| Some(now)).collect();

        let embedding_values: Float32Array = embeddings
            .iter()
            .flat_map(|emb| emb.iter().copied())
            .collect();

        let embedding_list = FixedSizeListArray::try_new(
            Arc::new(arrow_schema::Field::new("item", arrow_schema::DataType::Float32, true)),
            dim as i32,
            Arc::new(embedding_values),
            None,
        )
        .map_err(|e| AssistantError::Database(format!("Failed to create embedding array: {}", e)))?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(doc_ids),
                Arc::new(titles),
                Arc::new(contents),
                Arc::new(jurisdictions),
                Arc::new(source_types),
                Arc::new(hashes),
                Arc::new(revisions),
                Arc::new(indexed_at),
                Arc::new(embedding_list),
            ],
        )
        .map_err(|e| AssistantError::Database(format!("Failed to create record batch: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::embeddings::local_embedding;
    use crate::models::{Jurisdiction, SourceType};

    #[test]
    fn test_record_batch_shape() {
        let docs = vec![
            LegalDocument::new("a", "A", "rent", Jurisdiction::TamilNadu, SourceType::Statute),
            LegalDocument::new("b", "B", "wages", Jurisdiction::India, SourceType::CaseLaw),
        ];
        let embeddings = vec![local_embedding("rent", 8), local_embedding("wages", 8)];

        let batch = DocumentInserter::create_record_batch(
            SchemaManager::get_documents_schema(8),
            &docs,
            &embeddings,
            "rev-1",
            8,
        )
        .unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 9);
    }

    #[test]
    fn test_wrong_embedding_size_is_rejected() {
        let docs = vec![LegalDocument::new(
            "a",
            "A",
            "rent",
            Jurisdiction::TamilNadu,
            SourceType::Statute,
        )];

        let result = DocumentInserter::create_record_batch(
            SchemaManager::get_documents_schema(8),
            &docs,
            &[vec![0.0; 4]],
            "rev-1",
            8,
        );
        assert!(result.is_err());
    }
}
