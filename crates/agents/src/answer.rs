//! Query execution with fallback answering

use crate::{translate, LlmClient, Result, Translator};
use graphloom_db::{GraphMatch, Repository};
use tracing::{info, instrument, warn};

/// Fixed terminal response when both the graph and the fallback fail
pub const NO_ANSWER: &str = "No answer available.";

/// Sentinel strings a model emits when the graph holds nothing useful
const NO_ANSWER_SENTINELS: &[&str] = &["no answer", "i don't know the answer."];

/// Terminal outcome of a question. Both variants are final per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Structured matches straight from the graph
    Graph(Vec<GraphMatch>),
    /// Free-text response from the direct backend call
    Fallback(String),
}

/// Answers questions against the graph, falling back to a direct model
/// response when the graph yields nothing usable.
pub struct Answerer {
    repo: Repository,
    translator: Translator,
    llm: LlmClient,
}

impl Answerer {
    /// Create a new answerer
    pub fn new(repo: Repository, llm: LlmClient) -> Self {
        Self {
            repo,
            translator: Translator::new(llm.clone()),
            llm,
        }
    }

    /// Answer a question.
    ///
    /// Schema introspection failure is the one fatal path here: translation
    /// cannot proceed without knowing what the graph contains. Everything
    /// after that resolves to an [`Answer`].
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let schema = self.repo.schema().await?;

        let query = match self.translator.translate(question, &schema).await {
            Ok(query) => query,
            Err(e) => {
                warn!("Query translation failed, using direct fallback: {}", e);
                return Ok(self.fallback(question).await);
            }
        };

        Ok(self.execute_with_fallback(&query, question).await)
    }

    /// Run a translated query against the store.
    ///
    /// A store-level error, a shape-invalid query, an empty result, or the
    /// no-answer sentinel all route to the fallback path. Never errors.
    #[instrument(skip(self, query))]
    pub async fn execute_with_fallback(&self, query: &str, question: &str) -> Answer {
        if !translate::validate_shape(query) {
            warn!("Generated query failed the shape check, falling back");
            return self.fallback(question).await;
        }

        match self.repo.run_graph_query(query).await {
            Ok(matches) if matches.is_empty() => {
                info!("Graph returned no rows, falling back");
                self.fallback(question).await
            }
            Ok(matches) if is_no_answer(&matches) => {
                info!("Graph returned the no-answer sentinel, falling back");
                self.fallback(question).await
            }
            Ok(matches) => Answer::Graph(matches),
            Err(e) => {
                warn!("Graph query failed ({}), falling back", e);
                self.fallback(question).await
            }
        }
    }

    /// Direct, schema-free model call. Must not error: a failed fallback
    /// resolves to the fixed no-answer text instead.
    async fn fallback(&self, question: &str) -> Answer {
        match self.llm.generate(question).await {
            Ok(text) if !text.trim().is_empty() => Answer::Fallback(text.trim().to_string()),
            Ok(_) => Answer::Fallback(NO_ANSWER.to_string()),
            Err(e) => {
                warn!("Fallback call failed: {}", e);
                Answer::Fallback(NO_ANSWER.to_string())
            }
        }
    }
}

fn is_no_answer(matches: &[GraphMatch]) -> bool {
    if matches.len() != 1 {
        return false;
    }
    let text = matches[0].node_text().trim().to_lowercase();
    NO_ANSWER_SENTINELS.contains(&text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphloom_core::Triple;
    use graphloom_db::init_memory;

    /// Answerer wired to a live in-memory store and a dead backend.
    async fn offline_answerer() -> (Answerer, Repository) {
        let db = init_memory().await.expect("Failed to init memory db");
        let repo = Repository::new(db);
        let llm = LlmClient::new("http://127.0.0.1:9", "none");
        (Answerer::new(repo.clone(), llm), repo)
    }

    #[tokio::test]
    async fn syntax_error_query_yields_fallback_not_error() {
        let (answerer, _repo) = offline_answerer().await;

        // Passes the shape check but the store rejects it.
        let answer = answerer
            .execute_with_fallback(
                "SELECT ??? FROM relation WHERE",
                "tell me about France",
            )
            .await;

        assert_eq!(answer, Answer::Fallback(NO_ANSWER.to_string()));
    }

    #[tokio::test]
    async fn shape_invalid_query_yields_fallback() {
        let (answerer, _repo) = offline_answerer().await;

        let answer = answerer
            .execute_with_fallback("DELETE node", "tell me about France")
            .await;

        assert_eq!(answer, Answer::Fallback(NO_ANSWER.to_string()));
    }

    #[tokio::test]
    async fn empty_result_yields_fallback() {
        let (answerer, _repo) = offline_answerer().await;

        let query = "SELECT from_node.name AS node, to_node.name AS related_node, \
                     relation_type AS relationship_type, \
                     { relationship: relationship } AS relationship_properties \
                     FROM relation";
        let answer = answerer
            .execute_with_fallback(query, "tell me about France")
            .await;

        assert_eq!(answer, Answer::Fallback(NO_ANSWER.to_string()));
    }

    #[tokio::test]
    async fn populated_graph_answers_without_fallback() {
        let (answerer, repo) = offline_answerer().await;

        repo.upsert_triple(
            &Triple::new("France", "Germany", "declared war on")
                .with_entity("Country")
                .with_importance(5)
                .with_category("Political"),
        )
        .await
        .unwrap();

        let query = "SELECT from_node.name AS node, to_node.name AS related_node, \
                     relation_type AS relationship_type, \
                     { relationship: relationship, importance: importance, category: category } \
                     AS relationship_properties FROM relation";
        let answer = answerer
            .execute_with_fallback(query, "tell me about France")
            .await;

        match answer {
            Answer::Graph(matches) => {
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].node_text(), "France");
                assert_eq!(matches[0].related_node_text(), "Germany");
                assert_eq!(matches[0].relationship_type, "declared war on");
            }
            other => panic!("Expected a graph answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn ask_with_dead_backend_resolves_to_no_answer() {
        let (answerer, _repo) = offline_answerer().await;

        // Translation fails (backend unreachable), the fallback fails too;
        // the caller still gets an answer value, never an error.
        let answer = answerer.ask("tell me about France").await.unwrap();
        assert_eq!(answer, Answer::Fallback(NO_ANSWER.to_string()));
    }

    #[test]
    fn sentinel_detection() {
        let sentinel = GraphMatch {
            node: serde_json::Value::String("No Answer".into()),
            ..Default::default()
        };
        assert!(is_no_answer(&[sentinel.clone()]));
        assert!(!is_no_answer(&[sentinel.clone(), sentinel]));

        let real = GraphMatch {
            node: serde_json::Value::String("France".into()),
            ..Default::default()
        };
        assert!(!is_no_answer(&[real]));
    }
}
