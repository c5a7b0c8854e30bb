// file: src/database/schema.rs
// description: LanceDB schema for the legal corpus table
// reference: https://docs.rs/lancedb

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub struct SchemaManager;

impl SchemaManager {
    /// Arrow schema of the legal documents table. `revision` tags every row
    /// written by one insert so superseded rows can be told apart.
    pub fn get_documents_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("doc_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("jurisdiction", DataType::Utf8, false),
            Field::new("source_type", DataType::Utf8, false),
            Field::new("content_hash", DataType::Utf8, false),
            Field::new("revision", DataType::Utf8, false),
            Field::new("indexed_at", DataType::UInt64, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema = SchemaManager::get_documents_schema(384);
        assert_eq!(schema.fields().len(), 9);

        let embedding_field = schema.field_with_name("embedding").unwrap();
        assert!(matches!(embedding_field.data_type(), DataType::FixedSizeList(_, 384)));
        assert!(schema.field_with_name("jurisdiction").is_ok());
        assert!(schema.field_with_name("revision").is_ok());
    }
}
