use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{BuildingClass, FilterSet, RequestedField};

const LOCATION_PREPOSITIONS: &[&str] = &["in", "from", "at", "for"];

const CITY_STOP_PHRASES: &[&str] = &[
    "show me",
    "give me",
    "list of",
    "all",
    "some",
    "any",
    "properties",
    "buildings",
    "the",
    "a",
    "an",
];

const DETAIL_WORDS: &[&str] = &["detail", "details", "information", "info"];

const BUILDING_SUFFIXES: &[&str] = &[
    "building", "tower", "center", "plaza", "complex", "avenue", "street", "ave", "st", "rd",
    "road", "blvd", "boulevard",
];

// Words that can precede a building name inside a greedy capture.
const NAME_FILLERS: &[&str] = &[
    "a", "about", "an", "are", "at", "build", "built", "class", "current", "detail", "details",
    "display", "do", "does", "everything", "find", "floors", "for", "give", "has", "have", "how",
    "in", "info", "information", "is", "landlord", "list", "many", "me", "of", "on", "owner",
    "please", "renovated", "show", "size", "tell", "the", "was", "what", "whats", "when",
    "which", "who", "year",
];

// Scanned in order; the first keyword present wins.
const FIELD_KEYWORDS: &[(&str, RequestedField)] = &[
    ("size", RequestedField::BuildingSize),
    ("building size", RequestedField::BuildingSize),
    ("square feet", RequestedField::BuildingSize),
    ("sqft", RequestedField::BuildingSize),
    ("floors", RequestedField::NumberOfFloors),
    ("floor", RequestedField::NumberOfFloors),
    ("stories", RequestedField::NumberOfFloors),
    ("story", RequestedField::NumberOfFloors),
    ("levels", RequestedField::NumberOfFloors),
    ("property subtype", RequestedField::PropertySubType),
    ("subtype", RequestedField::PropertySubType),
    ("sub type", RequestedField::PropertySubType),
    ("year renovated", RequestedField::YearRenovated),
    ("year of renovation", RequestedField::YearRenovated),
    ("renovated", RequestedField::YearRenovated),
    ("renovate", RequestedField::YearRenovated),
    ("renovation", RequestedField::YearRenovated),
    ("renovation year", RequestedField::YearRenovated),
    ("year built", RequestedField::YearBuilt),
    ("built", RequestedField::YearBuilt),
    ("build", RequestedField::YearBuilt),
    ("what year", RequestedField::YearBuilt),
    ("when was", RequestedField::YearBuilt),
    ("year was built", RequestedField::YearBuilt),
    ("was built", RequestedField::YearBuilt),
    ("landlord", RequestedField::CurrentLandlord),
    ("current landlord", RequestedField::CurrentLandlord),
    ("owner", RequestedField::CurrentLandlord),
];

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([abc])\b").expect("valid class regex"));

static CITY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:properties|list|buildings)\s+(?:of\s+properties\s+)?(?:in|from|at|for)\s+([a-z\s]+?)(?:\s+(?:city|properties|buildings)\b|\s*$)",
        r"\b(?:in|from|at|for)\s+([a-z\s]+?)(?:\s+(?:city|properties|buildings)\b|\s*$)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid city regex"))
    .collect()
});

static BUILDING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    let suffix = r"(?:building|tower|center|plaza|complex|avenue|street)";
    let landmark = r"(?:building|tower|center|plaza|complex)";
    let street = r"(?:ave|avenue|st|street|rd|road|blvd|boulevard)";

    [
        format!(r"\b(?:details|information|info)\s+(?:of|about|for|on)\s+(?:the\s+)?([a-z0-9 ]+\s+{suffix})\b"),
        format!(r"\b(?:year|built|renovated|size|floors)\b.*?\b(?:of|for)\s+(?:the\s+)?([a-z0-9 ]+\s+{suffix})\b"),
        format!(r"\b(?:year|built|renovated|size|floors)\b.*?\b(?:of|for)\s+([0-9]+(?:\s+[a-z]+)+)"),
        format!(r"\byear\s+([a-z0-9 ]+\s+{landmark})\s+(?:built|build)\b"),
        format!(r"\byear\s+(?:the\s+)?([a-z0-9 ]+\s+{landmark})\s+(?:was\s+)?(?:built|build|renovated|renovate)\b"),
        format!(r"\b([a-z0-9 ]+\s+{suffix})\s+(?:was|is)\b"),
        format!(r"\b(?:in|of|about|for)\s+(?:the\s+)?([a-z0-9 ]+\s+{suffix})\b"),
        format!(r"\b(?:the\s+)?([a-z0-9 ]+\s+{suffix})\b"),
        format!(r"\b(?:details|information|info)\s+(?:of|about|for)\s+([0-9]+(?:\s+[a-z]+)*?\s+{street}(?:\s+[a-z]{{1,2}})?)\b"),
        format!(r"\b([0-9]+(?:\s+[a-z]+)*?\s+{street})\b"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid building regex"))
    .collect()
});

pub fn normalize_text(input: &str) -> String {
    let cleaned = input
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect::<String>();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn extract_filters(message: &str) -> FilterSet {
    extract_from_normalized(&normalize_text(message))
}

pub fn extract_from_normalized(normalized: &str) -> FilterSet {
    FilterSet {
        building_class: extract_building_class(normalized),
        city: extract_city(normalized),
        building_name: extract_building_name(normalized),
        requested_field: extract_requested_field(normalized),
        is_detail_request: DETAIL_WORDS
            .iter()
            .any(|word| contains_phrase(normalized, word)),
    }
}

fn extract_building_class(text: &str) -> Option<BuildingClass> {
    CLASS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|letter| BuildingClass::parse(letter.as_str()))
}

fn extract_city(text: &str) -> Option<String> {
    if !LOCATION_PREPOSITIONS
        .iter()
        .any(|preposition| contains_phrase(text, preposition))
    {
        return None;
    }

    let candidate = CITY_RES
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|span| collapse_whitespace(span.as_str()))?;

    if candidate.len() < 2
        || CITY_STOP_PHRASES
            .iter()
            .any(|phrase| candidate.contains(phrase))
    {
        return None;
    }

    Some(candidate)
}

fn extract_building_name(text: &str) -> Option<String> {
    BUILDING_RES.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|span| clean_building_candidate(span.as_str()))
    })
}

fn clean_building_candidate(raw: &str) -> Option<String> {
    let tokens = raw.split_whitespace().collect::<Vec<_>>();
    let last = tokens.len().checked_sub(1)?;

    let start = tokens[..last]
        .iter()
        .rposition(|token| NAME_FILLERS.contains(token))
        .map(|index| index + 1)
        .unwrap_or(0);
    let kept = &tokens[start..];

    let has_name_part = kept
        .iter()
        .any(|token| !BUILDING_SUFFIXES.contains(token));
    if kept.len() < 2 || !has_name_part {
        return None;
    }

    Some(kept.join(" "))
}

fn extract_requested_field(text: &str) -> Option<RequestedField> {
    FIELD_KEYWORDS
        .iter()
        .find(|(keyword, _)| contains_phrase(text, keyword))
        .map(|(_, field)| *field)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Whole-word containment on normalized text.
pub(crate) fn contains_phrase(text: &str, phrase: &str) -> bool {
    format!(" {text} ").contains(&format!(" {phrase} "))
}
