pub mod extract;
pub mod format;
pub mod intent;
pub mod models;
pub mod templates;

pub use extract::{extract_filters, extract_from_normalized, normalize_text};
pub use format::{
    format_reply, narrative_prompt, no_data_message, FormatInput, CITY_MENU_PROMPT,
    FALLBACK_HELP, WELCOME_MESSAGE,
};
pub use intent::{classify_intent, matching_rule, DISCOVERY_VERBS, RULES};
pub use models::*;
pub use templates::{query_for, CITY_SUMMARY_SQL, LEASE_SAMPLE_SQL, PROPERTY_SAMPLE_SQL};

pub fn resolve(message: &str) -> Resolution {
    let normalized = normalize_text(message);
    let filters = extract_from_normalized(&normalized);
    let intent = classify_intent(&normalized, &filters);
    let query = query_for(intent, &filters);

    Resolution {
        normalized,
        filters,
        intent,
        query,
    }
}
