//! Recommendation pipeline
//!
//! A query goes through three stages, in order:
//!
//! 1. **Classify**: the classifier model decides whether the catalog must be
//!    searched and, if so, writes a filter expression.
//! 2. **Filter**: the expression runs against the catalog. A bad expression
//!    is logged and treated as an empty result.
//! 3. **Generate**: the generator model writes the ranked recommendation.
//!
//! Provider failures never escape [`Orchestrator::process`]: they become an
//! apology in the response and are recorded in the [`PipelineTrace`]. A
//! failed call leaves the session transcripts untouched. There are no
//! retries.

use super::prompts::{
    classifier_turn, format_current_time, generator_turn, CATALOG_QUERY_TAG,
    CLASSIFIER_PREAMBLE, GENERATOR_PREAMBLE, NO_CATALOG_QUERY_TAG,
};
use super::session::{Session, Transcript, DEFAULT_TRANSCRIPT_TOKENS};
use crate::catalog::{format_rows, Catalog};
use crate::config::Config;
use crate::llm::{extract_tagged, LLMProvider, Message, Sampling};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shown when the classification call fails
pub const CLASSIFIER_APOLOGY: &str = "Sorry, I couldn't process your query. Please try again.";

/// Shown when the generation call fails
pub const GENERATOR_APOLOGY: &str =
    "Sorry, I couldn't generate recommendations at this moment. Please try again.";

/// Sampling and transcript limits for both stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    pub classifier: Sampling,
    pub generator: Sampling,
    pub max_transcript_tokens: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            classifier: Sampling {
                temperature: 0.3,
                max_output_tokens: 1024,
            },
            generator: Sampling {
                temperature: 0.7,
                max_output_tokens: 2048,
            },
            max_transcript_tokens: DEFAULT_TRANSCRIPT_TOKENS,
        }
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            classifier: config.llm.classifier.into(),
            generator: config.llm.generator.into(),
            max_transcript_tokens: config.session.max_transcript_tokens,
        }
    }
}

/// What the classifier asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "expression", rename_all = "snake_case")]
pub enum Decision {
    /// Search the catalog with this expression
    CatalogQuery(String),
    /// Answer from memory context alone
    NoCatalogQuery,
    /// Neither tag was present; handled like `NoCatalogQuery`
    Untagged,
}

impl Decision {
    /// Read the decision out of a classifier reply. A non-empty
    /// `<catalog_query>` block wins over `<no_catalog_query>`.
    pub fn from_reply(reply: &str) -> Self {
        match extract_tagged(reply, CATALOG_QUERY_TAG) {
            Some(expression) if !expression.is_empty() => {
                Decision::CatalogQuery(expression.to_string())
            }
            _ if extract_tagged(reply, NO_CATALOG_QUERY_TAG).is_some() => Decision::NoCatalogQuery,
            _ => Decision::Untagged,
        }
    }
}

/// Pipeline stage that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    Generate,
}

/// Record of one trip through the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub classifier_response: Option<String>,
    pub decision: Option<Decision>,
    pub catalog_searched: bool,
    pub expression: Option<String>,
    pub row_count: usize,
    pub filter_error: Option<String>,
    pub final_response: Option<String>,
    pub failed_stage: Option<Stage>,
    pub duration_ms: u64,
}

impl PipelineTrace {
    fn new(session_id: Uuid, query: &str) -> Self {
        Self {
            query: query.to_string(),
            timestamp: Utc::now(),
            session_id,
            classifier_response: None,
            decision: None,
            catalog_searched: false,
            expression: None,
            row_count: 0,
            filter_error: None,
            final_response: None,
            failed_stage: None,
            duration_ms: 0,
        }
    }
}

/// Response text plus the trace that produced it
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub response: String,
    pub trace: PipelineTrace,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        self.trace.failed_stage.is_none()
    }
}

/// Runs queries through classification, filtering and generation
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    classifier: Arc<dyn LLMProvider>,
    generator: Arc<dyn LLMProvider>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<Catalog>,
        classifier: Arc<dyn LLMProvider>,
        generator: Arc<dyn LLMProvider>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            catalog,
            classifier,
            generator,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// A fresh session whose transcripts hold only the two preambles
    pub fn new_session(&self) -> Session {
        Session::new(
            Transcript::new(CLASSIFIER_PREAMBLE, self.settings.max_transcript_tokens),
            Transcript::new(GENERATOR_PREAMBLE, self.settings.max_transcript_tokens),
        )
    }

    /// Process one user query within `session`, stamped with the local time
    pub async fn process(
        &self,
        session: &mut Session,
        query: &str,
        memory_context: &str,
    ) -> QueryOutcome {
        self.process_at(session, query, memory_context, Local::now())
            .await
    }

    /// Process one user query, presenting `now` to both models
    pub async fn process_at(
        &self,
        session: &mut Session,
        query: &str,
        memory_context: &str,
        now: DateTime<Local>,
    ) -> QueryOutcome {
        let start = Instant::now();
        let current_time = format_current_time(&now);
        let mut trace = PipelineTrace::new(session.id(), query);

        info!(session = %session.id(), "Processing query: {}", query);

        // Stage 1: classify
        let classifier_input = Message::user(classifier_turn(&current_time, query, memory_context));
        let request = session.classifier.request(&classifier_input);
        let reply = match self
            .classifier
            .generate(&request, &self.settings.classifier)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("Classifier call failed ({}): {}", self.classifier.name(), e);
                trace.failed_stage = Some(Stage::Classify);
                return finish(trace, CLASSIFIER_APOLOGY.to_string(), start);
            }
        };
        session
            .classifier
            .commit(classifier_input, Message::assistant(reply.clone()));
        debug!("Classifier reply: {} chars", reply.len());

        let decision = Decision::from_reply(&reply);
        trace.classifier_response = Some(reply);

        // Stage 2: filter
        let catalog_rows = match &decision {
            Decision::CatalogQuery(expression) => {
                info!("Searching catalog: {}", expression);
                let outcome = self.catalog.filter(expression);
                trace.catalog_searched = true;
                trace.expression = Some(expression.clone());
                trace.row_count = outcome.dishes.len();
                trace.filter_error = outcome.error.as_ref().map(ToString::to_string);
                info!("Catalog search matched {} dishes", outcome.dishes.len());
                Some(format_rows(&outcome.dishes))
            }
            Decision::NoCatalogQuery => {
                info!("No catalog search needed");
                None
            }
            Decision::Untagged => {
                warn!("Classifier reply had no decision tag; skipping catalog search");
                None
            }
        };
        trace.decision = Some(decision);

        // Stage 3: generate
        let generator_input = Message::user(generator_turn(
            &current_time,
            query,
            memory_context,
            catalog_rows.as_deref(),
        ));
        debug!("Generator input: {} chars", generator_input.content.len());
        let request = session.generator.request(&generator_input);
        match self
            .generator
            .generate(&request, &self.settings.generator)
            .await
        {
            Ok(response) => {
                session
                    .generator
                    .commit(generator_input, Message::assistant(response.clone()));
                info!("Generated response: {} chars", response.len());
                trace.final_response = Some(response.clone());
                finish(trace, response, start)
            }
            Err(e) => {
                error!("Generator call failed ({}): {}", self.generator.name(), e);
                trace.failed_stage = Some(Stage::Generate);
                finish(trace, GENERATOR_APOLOGY.to_string(), start)
            }
        }
    }
}

fn finish(mut trace: PipelineTrace, response: String, start: Instant) -> QueryOutcome {
    trace.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    QueryOutcome { response, trace }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_from_reply() {
        assert_eq!(
            Decision::from_reply("<catalog_query>\ncategory == \"Dessert\"\n</catalog_query>"),
            Decision::CatalogQuery("category == \"Dessert\"".to_string())
        );
        assert_eq!(
            Decision::from_reply("<no_catalog_query>\nProceed.\n</no_catalog_query>"),
            Decision::NoCatalogQuery
        );
        assert_eq!(Decision::from_reply("I think you want dessert"), Decision::Untagged);
    }

    #[test]
    fn test_empty_catalog_query_is_not_a_search() {
        assert_eq!(
            Decision::from_reply("<catalog_query>  </catalog_query>"),
            Decision::Untagged
        );
    }

    #[test]
    fn test_decision_serializes_with_kind() {
        let json = serde_json::to_value(Decision::CatalogQuery("ALL".to_string())).unwrap();
        assert_eq!(json["kind"], "catalog_query");
        assert_eq!(json["expression"], "ALL");
        let json = serde_json::to_value(Decision::NoCatalogQuery).unwrap();
        assert_eq!(json["kind"], "no_catalog_query");
    }

    #[test]
    fn test_default_settings_match_stage_defaults() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.classifier.temperature, 0.3);
        assert_eq!(settings.generator.max_output_tokens, 2048);
        assert_eq!(
            OrchestratorSettings::from(&Config::default_config()),
            settings
        );
    }
}
