// file: src/database/retriever.rs
// description: jurisdiction-aware retrieval over the legal corpus
// reference: https://docs.rs/lancedb

use crate::config::RagConfig;
use crate::database::client::LegalStore;
use crate::database::embeddings::Embedder;
use crate::database::insert::DocumentInserter;
use crate::error::Result;
use crate::models::{Jurisdiction, LegalDocument, SearchResult, SourceType};
use tracing::{debug, info};

/// Statutes indexed the first time an empty corpus is opened.
pub fn seed_documents() -> Vec<LegalDocument> {
    vec![
        LegalDocument::new(
            "tn_rent_control_act_2019",
            "Tamil Nadu Rent Control Act 2019",
            "The Tamil Nadu Rent Control Act, 2019 regulates rental agreements and tenant rights in Tamil Nadu. Section 4 provides for fair rent determination...",
            Jurisdiction::TamilNadu,
            SourceType::Statute,
        ),
        LegalDocument::new(
            "tn_shops_establishments_act",
            "Tamil Nadu Shops and Establishments Act",
            "This Act regulates working conditions in shops and commercial establishments. Section 12 mandates maximum working hours...",
            Jurisdiction::TamilNadu,
            SourceType::Statute,
        ),
        LegalDocument::new(
            "consumer_protection_act_2019",
            "Consumer Protection Act 2019",
            "The Consumer Protection Act, 2019 provides for consumer rights and remedies. Section 35 establishes consumer dispute redressal commissions...",
            Jurisdiction::India,
            SourceType::Statute,
        ),
    ]
}

pub struct LegalRetriever {
    store: LegalStore,
    embedder: Embedder,
}

impl LegalRetriever {
    pub async fn open(config: &RagConfig) -> Result<Self> {
        let store = LegalStore::new(config).await?;
        let retriever = Self {
            store,
            embedder: Embedder::new(config),
        };

        if config.seed_corpus {
            retriever.seed_if_empty().await?;
        }

        Ok(retriever)
    }

    pub fn store(&self) -> &LegalStore {
        &self.store
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub async fn seed_if_empty(&self) -> Result<usize> {
        if self.store.count().await? > 0 {
            return Ok(0);
        }

        let seed = seed_documents();
        let stats = DocumentInserter::new(&self.store, &self.embedder)
            .insert_batch(&seed)
            .await?;
        info!("Seeded legal corpus with {} statutes", stats.documents_inserted);
        Ok(stats.documents_inserted)
    }

    /// Vector search with each similarity multiplied by the jurisdiction boost,
    /// sorted by boosted score and cut to `top_k`. A query with no content
    /// tokens embeds to the zero vector and matches nothing.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query).await;
        if embedding.iter().all(|v| *v == 0.0) {
            debug!("Query {:?} has no searchable terms", query);
            return Ok(Vec::new());
        }

        let mut results = self.store.vector_search(embedding, top_k).await?;

        for result in &mut results {
            result.score *= result.jurisdiction.boost();
        }
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        Ok(results)
    }

    /// Missing ids become `doc_<n>`: n starts at the row count after insertion
    /// and moves past any id already stored.
    pub async fn index_document(&self, mut document: LegalDocument) -> Result<String> {
        document.ensure_hash();

        if document.doc_id.trim().is_empty() {
            let existing = self.store.existing_ids().await?;
            let mut next = existing.len() + 1;
            while existing.contains(&format!("doc_{}", next)) {
                next += 1;
            }
            document.doc_id = format!("doc_{}", next);
        }

        DocumentInserter::new(&self.store, &self.embedder)
            .insert_document(&document)
            .await
    }

    pub async fn list_documents(&self) -> Result<Vec<LegalDocument>> {
        self.store.list_documents().await
    }
}

/// Weighted mean of the scores using the jurisdiction boosts as weights,
/// capped at 1.0. Non-finite scores are left out.
pub fn calculate_confidence(results: &[SearchResult]) -> f32 {
    let (total_score, total_weight) = results
        .iter()
        .filter(|r| r.score.is_finite())
        .fold((0.0f32, 0.0f32), |(s, w), r| {
            let weight = r.jurisdiction.boost();
            (s + r.score * weight, w + weight)
        });

    if total_weight > 0.0 {
        (total_score / total_weight).min(1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(jurisdiction: Jurisdiction, score: f32) -> SearchResult {
        SearchResult::from_document(
            LegalDocument::new("d", "D", "c", jurisdiction, SourceType::Statute),
            score,
            None,
        )
    }

    #[test]
    fn test_confidence_empty() {
        assert_eq!(calculate_confidence(&[]), 0.0);
    }

    #[test]
    fn test_confidence_weighted_mean() {
        let results = vec![
            result(Jurisdiction::TamilNadu, 0.6),
            result(Jurisdiction::Web, 0.2),
        ];
        // (0.6 * 1.5 + 0.2 * 1.0) / 2.5
        let expected = (0.9 + 0.2) / 2.5;
        assert!((calculate_confidence(&results) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_capped() {
        let results = vec![result(Jurisdiction::TamilNadu, 1.4)];
        assert_eq!(calculate_confidence(&results), 1.0);
    }

    #[test]
    fn test_confidence_ignores_nan_scores() {
        let results = vec![
            result(Jurisdiction::TamilNadu, f32::NAN),
            result(Jurisdiction::Web, 0.2),
        ];
        assert!((calculate_confidence(&results) - 0.2).abs() < 1e-6);
        assert_eq!(calculate_confidence(&[result(Jurisdiction::India, f32::NAN)]), 0.0);
    }

    #[test]
    fn test_seed_documents() {
        let seed = seed_documents();
        assert_eq!(seed.len(), 3);
        assert_eq!(seed[0].doc_id, "tn_rent_control_act_2019");
        assert_eq!(seed[2].jurisdiction, Jurisdiction::India);
    }

    async fn open_temp() -> (tempfile::TempDir, LegalRetriever) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::config::Config::default_config().rag;
        config.uri = dir.path().to_string_lossy().to_string();
        config.nebius_api_key = None;
        let retriever = LegalRetriever::open(&config).await.unwrap();
        (dir, retriever)
    }

    #[tokio::test]
    async fn test_open_seeds_once() {
        let (_dir, retriever) = open_temp().await;
        assert_eq!(retriever.store().count().await.unwrap(), 3);
        assert_eq!(retriever.seed_if_empty().await.unwrap(), 0);
        assert_eq!(retriever.list_documents().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_prefers_matching_statute() {
        let (_dir, retriever) = open_temp().await;
        let results = retriever
            .search("tenant rent rental agreements", 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].doc_id, "tn_rent_control_act_2019");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_index_document_generates_id() {
        let (_dir, retriever) = open_temp().await;
        let doc = LegalDocument::new(
            "",
            "Tamil Nadu Apartment Ownership Act",
            "Apartment owners association rules",
            Jurisdiction::TamilNadu,
            SourceType::Statute,
        );

        let doc_id = retriever.index_document(doc).await.unwrap();
        assert_eq!(doc_id, "doc_4");
        assert_eq!(retriever.store().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_generated_id_skips_existing_after_delete() {
        let (_dir, retriever) = open_temp().await;
        let untitled = |content: &str| {
            LegalDocument::new("", "Untitled", content, Jurisdiction::India, SourceType::Statute)
        };

        assert_eq!(retriever.index_document(untitled("first")).await.unwrap(), "doc_4");
        retriever
            .store()
            .delete_superseded(&["tn_shops_establishments_act".to_string()], "")
            .await
            .unwrap();

        // three rows left, so doc_4 would be reused without the collision check
        let second = retriever.index_document(untitled("second")).await.unwrap();
        assert_eq!(second, "doc_5");

        let ids: Vec<String> = retriever
            .list_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.doc_id)
            .collect();
        assert_eq!(ids.iter().filter(|id| *id == "doc_4").count(), 1);
    }

    #[tokio::test]
    async fn test_stop_word_query_matches_nothing() {
        let (_dir, retriever) = open_temp().await;
        let results = retriever.search("what is it", 10).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(calculate_confidence(&results), 0.0);
    }
}
