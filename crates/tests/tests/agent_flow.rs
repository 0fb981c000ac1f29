mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cresta_agents::ChatAgent;
use cresta_core::{ChatInput, QueryIntent};
use cresta_narrator::{NarratorError, TextGenerator};
use cresta_observability::AppMetrics;
use cresta_storage::{PortfolioImport, SqliteWarehouse};

use common::seeded_warehouse;

struct ScriptedNarrator {
    reply: Result<&'static str, ()>,
    prompts: AtomicUsize,
}

impl TextGenerator for ScriptedNarrator {
    async fn generate(&self, prompt: &str) -> Result<String, NarratorError> {
        assert!(prompt.contains("matching records"));
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.reply
            .map(str::to_string)
            .map_err(|_| NarratorError::EmptyResponse)
    }
}

fn agent(
    warehouse: SqliteWarehouse,
    reply: Result<&'static str, ()>,
) -> (ChatAgent<SqliteWarehouse, ScriptedNarrator>, Arc<ScriptedNarrator>) {
    let narrator = Arc::new(ScriptedNarrator {
        reply,
        prompts: AtomicUsize::new(0),
    });
    let agent = ChatAgent::new(Arc::new(warehouse), narrator.clone(), AppMetrics::shared())
        .with_narrative_timeout(Duration::from_secs(2));
    (agent, narrator)
}

fn input(message: &str) -> ChatInput {
    ChatInput {
        message: message.to_string(),
    }
}

#[tokio::test]
async fn property_detail_is_narrated() {
    let (agent, narrator) = agent(
        seeded_warehouse().await,
        Ok("Willis Tower anchors the Chicago skyline."),
    );

    let reply = agent
        .handle_chat(input("Tell me about the Willis Tower"))
        .await
        .expect("reply");
    assert_eq!(reply.text, "Willis Tower anchors the Chicago skyline.");
    assert_eq!(reply.count, 1);
    assert_eq!(reply.rows[0]["BUILDING NAME"], "Willis Tower");
    assert_eq!(narrator.prompts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn narrative_failure_keeps_rows_and_static_text() {
    let (agent, _) = agent(seeded_warehouse().await, Err(()));

    let reply = agent
        .handle_chat(input("Tell me about the Willis Tower"))
        .await
        .expect("reply");
    assert_eq!(
        reply.text,
        "Here's a comprehensive overview of Willis Tower, a premier commercial property."
    );
    assert!(!reply.rows.is_empty());
    assert_eq!(agent.metrics().snapshot().narrative_fallback_total, 1);
}

#[tokio::test]
async fn list_intents_skip_narration() {
    let (agent, narrator) = agent(seeded_warehouse().await, Ok("unused"));

    let reply = agent
        .handle_chat(input("Show me properties in New York"))
        .await
        .expect("reply");
    assert!(reply.text.starts_with("Here are 2 premium commercial properties in New York."));
    assert_eq!(narrator.prompts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn identical_requests_give_identical_replies() {
    let (agent, _) = agent(seeded_warehouse().await, Err(()));

    let first = agent
        .handle_chat(input("What building classes are available?"))
        .await
        .expect("reply");
    let second = agent
        .handle_chat(input("What building classes are available?"))
        .await
        .expect("reply");
    assert_eq!(first, second);
    assert!(first.text.ends_with("1. Class A\n\n2. Class B\n\n3. Class C"));
}

#[tokio::test]
async fn import_bundle_round_trips_through_resolution() {
    let warehouse = SqliteWarehouse::memory().await.expect("warehouse");
    let bundle: PortfolioImport = serde_json::from_value(serde_json::json!({
        "properties": [{
            "PROPERTY_ID": 7,
            "BUILDING_NAME": "Liberty Plaza",
            "CITY": "Denver",
            "STATE": "CO",
            "BUILDING_CLASS": "B",
            "BUILDING_SIZE": 640000
        }]
    }))
    .expect("bundle");
    let (properties, leases) = warehouse.import(&bundle).await.expect("import");
    assert_eq!((properties, leases), (1, 0));

    let resolution = agent(warehouse.clone(), Err(())).0.resolve("what is the size of Liberty Plaza");
    assert_eq!(resolution.intent, QueryIntent::PropertyField);

    let (agent, _) = agent(warehouse, Err(()));
    let reply = agent
        .handle_chat(input("what is the size of Liberty Plaza"))
        .await
        .expect("reply");
    assert_eq!(
        reply.text,
        "Liberty Plaza has a total building size of 640,000 sq ft."
    );
}
