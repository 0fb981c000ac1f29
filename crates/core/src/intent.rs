use crate::extract::contains_phrase;
use crate::models::{FilterSet, QueryIntent};

pub const DISCOVERY_VERBS: &[&str] = &[
    "show",
    "list",
    "give",
    "find",
    "tell",
    "what",
    "which",
    "all",
    "display",
    "available",
];

const DISCLOSURE_VERBS: &[&str] = &[
    "show", "tell", "find", "about", "who", "what", "give", "display", "list", "which",
];

const LANDLORD_WORDS: &[&str] = &["landlord", "landlords", "owner", "owners", "owns", "owned"];
const LEASE_WORDS: &[&str] = &["lease", "leases", "leasing"];
const RENT_WORDS: &[&str] = &["rent", "rental", "rents", "price", "pricing"];

pub struct Signals<'a> {
    pub text: &'a str,
    pub filters: &'a FilterSet,
}

impl Signals<'_> {
    fn has(&self, word: &str) -> bool {
        contains_phrase(self.text, word)
    }

    fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|word| self.has(word))
    }

    fn discovery(&self) -> bool {
        self.has_any(DISCOVERY_VERBS)
    }

    fn mentions_properties(&self) -> bool {
        self.has("properties")
    }

    fn lease_or_rent_topic(&self) -> bool {
        self.has_any(LEASE_WORDS) || self.has_any(RENT_WORDS)
    }
}

pub struct Rule {
    pub name: &'static str,
    pub resolve: fn(&Signals<'_>) -> Option<QueryIntent>,
}

// Evaluated top to bottom; the first rule that resolves wins.
pub const RULES: &[Rule] = &[
    Rule {
        name: "landlord_of_named_building",
        resolve: |s| {
            (s.filters.building_name.is_some()
                && s.has_any(LANDLORD_WORDS)
                && s.has_any(DISCLOSURE_VERBS))
            .then_some(QueryIntent::LandlordDetail)
        },
    },
    Rule {
        name: "available_cities",
        resolve: |s| (s.has("cities") && s.discovery()).then_some(QueryIntent::CityList),
    },
    Rule {
        name: "available_building_classes",
        resolve: |s| {
            ((s.has("building classes")
                || (s.has("building class") && s.filters.building_class.is_none()))
                && s.discovery())
            .then_some(QueryIntent::BuildingClassList)
        },
    },
    Rule {
        name: "properties_without_city",
        resolve: |s| {
            (s.mentions_properties()
                && s.filters.city.is_none()
                && s.filters.building_name.is_none()
                && s.filters.building_class.is_none()
                && s.discovery())
            .then_some(QueryIntent::PropertyListByCity)
        },
    },
    Rule {
        name: "properties_in_city",
        resolve: |s| {
            (s.mentions_properties() && s.filters.city.is_some() && s.discovery())
                .then_some(QueryIntent::CityPropertyList)
        },
    },
    Rule {
        name: "named_building",
        resolve: |s| {
            if s.filters.building_name.is_none() || s.lease_or_rent_topic() {
                return None;
            }
            Some(if s.filters.requested_field.is_some() {
                QueryIntent::PropertyField
            } else {
                QueryIntent::PropertyDetail
            })
        },
    },
    Rule {
        name: "building_class",
        resolve: |s| {
            (s.filters.building_class.is_some() && !s.lease_or_rent_topic())
                .then_some(QueryIntent::ClassPropertyList)
        },
    },
    Rule {
        name: "city",
        resolve: |s| {
            (s.filters.city.is_some() && !s.mentions_properties() && !s.lease_or_rent_topic())
                .then_some(QueryIntent::CityPropertyDetail)
        },
    },
    Rule {
        name: "leases_of_building",
        resolve: |s| {
            (s.has_any(LEASE_WORDS) && s.filters.building_name.is_some())
                .then_some(QueryIntent::LeaseByBuilding)
        },
    },
    Rule {
        name: "leases_in_city",
        resolve: |s| {
            (s.has_any(LEASE_WORDS) && s.filters.city.is_some())
                .then_some(QueryIntent::LeaseByCity)
        },
    },
    Rule {
        name: "recent_leases",
        resolve: |s| {
            (s.has_any(&["lease", "leases"]) && s.discovery()).then_some(QueryIntent::LeaseList)
        },
    },
    Rule {
        name: "average_rent",
        resolve: |s| {
            (s.has_any(&["rent", "rental", "price"]) && s.discovery())
                .then_some(QueryIntent::AverageRent)
        },
    },
];

pub fn classify_intent(normalized: &str, filters: &FilterSet) -> QueryIntent {
    matching_rule(normalized, filters)
        .map(|(_, intent)| intent)
        .unwrap_or(QueryIntent::Fallback)
}

pub fn matching_rule(normalized: &str, filters: &FilterSet) -> Option<(&'static str, QueryIntent)> {
    let signals = Signals {
        text: normalized,
        filters,
    };

    RULES
        .iter()
        .find_map(|rule| (rule.resolve)(&signals).map(|intent| (rule.name, intent)))
}
