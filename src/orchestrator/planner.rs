// file: src/orchestrator/planner.rs
// description: builds the task graph for a legal query
// reference: orchestrator planning and execution

use crate::models::{Task, TaskGraph, TaskType, UserPreferences};
use crate::parser::DocumentText;
use serde_json::{Map, Value, json};
use tracing::debug;

pub const PARSE_DOCUMENTS: &str = "parse_documents";
pub const RAG_RETRIEVAL: &str = "rag_retrieval";
pub const WEB_SEARCH: &str = "web_search";
pub const LLM_REASONING: &str = "llm_reasoning";
pub const GENERATE_OPTIONS: &str = "generate_options";
pub const DRAFT_DOCUMENTS: &str = "draft_documents";
pub const TTS_NARRATION: &str = "tts_narration";

pub struct TaskPlanner;

impl TaskPlanner {
    /// parse → rag → (web) → reasoning → options → draft → (tts)
    pub fn create_task_graph(
        query: &str,
        documents: &[DocumentText],
        preferences: &UserPreferences,
    ) -> TaskGraph {
        let has_documents = !documents.is_empty();
        let mut tasks = Vec::new();

        if has_documents {
            tasks.push(Task::new(
                PARSE_DOCUMENTS,
                TaskType::Parse,
                json!({ "documents": documents }),
            ));
        }

        let rag = Task::new(RAG_RETRIEVAL, TaskType::RagSearch, json!({ "query": query }));
        tasks.push(if has_documents {
            rag.depends_on(&[PARSE_DOCUMENTS])
        } else {
            rag
        });

        tasks.push(
            Task::new(WEB_SEARCH, TaskType::WebSearch, json!({ "query": query }))
                .depends_on(&[RAG_RETRIEVAL])
                .conditional(),
        );

        tasks.push(
            Task::new(LLM_REASONING, TaskType::LlmReasoning, json!({ "query": query }))
                .depends_on(&[RAG_RETRIEVAL, WEB_SEARCH]),
        );

        tasks.push(
            Task::new(GENERATE_OPTIONS, TaskType::LlmGeneration, json!({ "type": "options" }))
                .depends_on(&[LLM_REASONING]),
        );

        tasks.push(
            Task::new(DRAFT_DOCUMENTS, TaskType::LlmGeneration, json!({ "type": "draft" }))
                .depends_on(&[GENERATE_OPTIONS]),
        );

        if preferences.enable_audio {
            let mut input = Map::new();
            input.insert("allow_pii".to_string(), Value::Bool(preferences.allow_pii));
            if let Some(voice_id) = &preferences.voice_id {
                input.insert("voice_id".to_string(), Value::String(voice_id.clone()));
            }

            tasks.push(
                Task::new(TTS_NARRATION, TaskType::Tts, Value::Object(input))
                    .depends_on(&[DRAFT_DOCUMENTS]),
            );
        }

        debug!("Planned {} tasks", tasks.len());
        TaskGraph::new(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DocumentFormat;
    use pretty_assertions::assert_eq;

    fn ids(graph: &TaskGraph) -> Vec<&str> {
        graph.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_minimal_graph() {
        let graph = TaskPlanner::create_task_graph("q", &[], &UserPreferences::default());

        assert_eq!(
            ids(&graph),
            vec![RAG_RETRIEVAL, WEB_SEARCH, LLM_REASONING, GENERATE_OPTIONS, DRAFT_DOCUMENTS]
        );
        assert!(graph.get(RAG_RETRIEVAL).unwrap().dependencies.is_empty());
        assert!(graph.get(WEB_SEARCH).unwrap().conditional);
        assert_eq!(graph.get(LLM_REASONING).unwrap().input, json!({"query": "q"}));
        assert_eq!(graph.execution_waves().unwrap().len(), 5);
    }

    #[test]
    fn test_documents_and_audio() {
        let docs = vec![DocumentText::new("lease.txt", DocumentFormat::PlainText, "rent")];
        let prefs = UserPreferences {
            enable_audio: true,
            voice_id: Some("v2".to_string()),
            ..UserPreferences::default()
        };

        let graph = TaskPlanner::create_task_graph("q", &docs, &prefs);

        let parse = graph.tasks.first().unwrap();
        assert_eq!(parse.id, PARSE_DOCUMENTS);
        assert_eq!(
            parse.input,
            json!({"documents": [{"name": "lease.txt", "format": "plaintext", "text": "rent"}]})
        );
        assert_eq!(graph.get(RAG_RETRIEVAL).unwrap().dependencies, vec![PARSE_DOCUMENTS]);

        let tts = graph.get(TTS_NARRATION).unwrap();
        assert_eq!(tts.dependencies, vec![DRAFT_DOCUMENTS]);
        assert_eq!(tts.input, json!({"allow_pii": false, "voice_id": "v2"}));

        let order: Vec<&str> = graph
            .execution_order()
            .unwrap()
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(order.first(), Some(&PARSE_DOCUMENTS));
        assert_eq!(order.last(), Some(&TTS_NARRATION));
    }
}
