use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use cresta_core::{
    format_reply, narrative_prompt, resolve, ChatInput, ChatReply, FormatInput, QueryIntent,
    Resolution, Row,
};
use cresta_narrator::TextGenerator;
use cresta_observability::AppMetrics;
use cresta_storage::{PortfolioRepository, RowFetcher};
use tracing::{info, instrument, warn};

pub const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_millis(8_000);

#[derive(Clone)]
pub struct ChatAgent<W, G>
where
    W: RowFetcher + PortfolioRepository,
    G: TextGenerator,
{
    warehouse: Arc<W>,
    narrator: Arc<G>,
    metrics: Arc<AppMetrics>,
    narrative_timeout: Duration,
}

impl<W, G> ChatAgent<W, G>
where
    W: RowFetcher + PortfolioRepository,
    G: TextGenerator,
{
    pub fn new(warehouse: Arc<W>, narrator: Arc<G>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            warehouse,
            narrator,
            metrics,
            narrative_timeout: DEFAULT_NARRATIVE_TIMEOUT,
        }
    }

    pub fn with_narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn narrative_enabled(&self) -> bool {
        self.narrator.is_enabled()
    }

    pub fn resolve(&self, message: &str) -> Resolution {
        resolve(message)
    }

    #[instrument(skip(self, input))]
    pub async fn handle_chat(&self, input: ChatInput) -> Result<ChatReply> {
        let started = Instant::now();
        self.metrics.inc_request();

        let resolution = resolve(&input.message);
        let Some(query) = resolution.query.as_ref() else {
            self.metrics.inc_fallback();
            self.metrics.observe_latency(started.elapsed());
            info!(intent = resolution.intent.as_code(), rows = 0, "chat handled");
            return Ok(format_reply(&FormatInput {
                intent: QueryIntent::Fallback,
                filters: &resolution.filters,
                rows: &[],
                current_year: current_year(),
            }));
        };

        let rows = match self.warehouse.fetch_rows(query).await {
            Ok(rows) => rows,
            Err(error) => {
                self.metrics.inc_query_failure();
                self.metrics.observe_latency(started.elapsed());
                warn!(
                    intent = resolution.intent.as_code(),
                    error = %error,
                    "warehouse query failed"
                );
                return Err(error).with_context(|| {
                    format!("failed answering {} request", resolution.intent.as_code())
                });
            }
        };
        if rows.is_empty() {
            self.metrics.inc_empty_result();
        }

        let mut reply = format_reply(&FormatInput {
            intent: resolution.intent,
            filters: &resolution.filters,
            rows: &rows,
            current_year: current_year(),
        });

        let mut narrated = false;
        if resolution.intent.is_row_shaped() && !rows.is_empty() && self.narrator.is_enabled() {
            if let Some(text) = self.narrate(&input.message, &rows).await {
                reply.text = text;
                narrated = true;
            }
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            intent = resolution.intent.as_code(),
            rows = rows.len(),
            narrated,
            latency_ms = started.elapsed().as_millis() as u64,
            "chat handled"
        );

        Ok(reply)
    }

    pub async fn list_properties(&self, limit: u32) -> Result<Vec<Row>> {
        self.warehouse.list_properties(limit).await
    }

    pub async fn list_leases(&self, limit: u32) -> Result<Vec<Row>> {
        self.warehouse.list_leases(limit).await
    }

    pub async fn list_cities(&self) -> Result<Vec<Row>> {
        self.warehouse.list_cities().await
    }

    pub async fn property_columns(&self) -> Result<Vec<String>> {
        self.warehouse.property_columns().await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.warehouse.list_tables().await
    }

    async fn narrate(&self, message: &str, rows: &[Row]) -> Option<String> {
        let prompt = narrative_prompt(message, rows);
        match tokio::time::timeout(self.narrative_timeout, self.narrator.generate(&prompt)).await {
            Ok(Ok(text)) => {
                self.metrics.inc_narrative_generated();
                Some(text)
            }
            Ok(Err(error)) => {
                self.metrics.inc_narrative_fallback();
                warn!(error = %error, "narrative generation failed");
                None
            }
            Err(_) => {
                self.metrics.inc_narrative_fallback();
                warn!(
                    timeout_ms = self.narrative_timeout.as_millis() as u64,
                    "narrative generation timed out"
                );
                None
            }
        }
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}
