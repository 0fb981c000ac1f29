use serde_json::Value;

use crate::models::{ChatReply, FilterSet, QueryIntent, RequestedField, Row};

pub const FALLBACK_HELP: &str = "I can help you search for specific buildings, cities, building classes (A, B, C), properties, leases, and rent information. Try: \"Show me Class A properties\", \"Properties in New York\", or \"What cities are available?\"";

pub const WELCOME_MESSAGE: &str = "Hello! I'm Cresta, your AI-powered commercial real estate assistant. I can provide you with a list of commercial properties and their details, all within the United States. What would you like to explore today?";

pub const CITY_MENU_PROMPT: &str = "What city would you like to see properties in?";

const GENERIC_NO_DATA: &str =
    "I apologize, but I don't have any property information available right now.";

// Renovation years at or below this are placeholders in the warehouse.
const RENOVATION_SENTINEL_YEAR: i64 = 1900;

const NARRATIVE_SAMPLE_ROWS: usize = 3;

pub struct FormatInput<'a> {
    pub intent: QueryIntent,
    pub filters: &'a FilterSet,
    pub rows: &'a [Row],
    pub current_year: i32,
}

pub fn format_reply(input: &FormatInput<'_>) -> ChatReply {
    match input.intent {
        QueryIntent::Fallback => return ChatReply::text_only(FALLBACK_HELP),
        QueryIntent::PropertyListByCity => return city_menu(input.rows),
        _ => {}
    }

    if input.rows.is_empty() {
        return ChatReply::text_only(no_data_message(input.filters));
    }

    let text = match input.intent {
        QueryIntent::CityList => numbered(
            "Here are all the cities available in our commercial real estate database:",
            input.rows,
        ),
        QueryIntent::BuildingClassList => numbered(
            "Our portfolio features premium commercial properties across multiple building classifications:",
            input.rows,
        ),
        QueryIntent::ClassPropertyList => {
            let class = input
                .filters
                .building_class
                .map(|class| class.as_letter())
                .unwrap_or_default();
            numbered(
                &format!("Here's our premium collection of Class {class} commercial properties:"),
                input.rows,
            )
        }
        QueryIntent::CityPropertyList => {
            let city = display_city(input.filters);
            let intro = match input.rows.len() {
                1 => format!("Here is 1 premium commercial property in {city}."),
                n => format!("Here are {n} premium commercial properties in {city}."),
            };
            numbered(&intro, input.rows)
        }
        QueryIntent::PropertyField | QueryIntent::LandlordDetail => {
            let field = match input.intent {
                QueryIntent::LandlordDetail => RequestedField::CurrentLandlord,
                _ => input
                    .filters
                    .requested_field
                    .unwrap_or(RequestedField::BuildingSize),
            };
            paragraphs(input.rows, |row| {
                describe_field(field, &row_name(row, input.filters), row, input.current_year)
            })
        }
        QueryIntent::AverageRent => return average_rent(input),
        _ => {
            let rows = humanize_rows(input.rows);
            return ChatReply {
                text: row_intro(input),
                count: rows.len(),
                rows,
                suggestions: None,
                show_city_popup: None,
            };
        }
    };

    ChatReply {
        text,
        count: input.rows.len(),
        rows: humanize_rows(input.rows),
        suggestions: None,
        show_city_popup: None,
    }
}

pub fn narrative_prompt(message: &str, rows: &[Row]) -> String {
    let sample = &rows[..rows.len().min(NARRATIVE_SAMPLE_ROWS)];
    let sample_json = serde_json::to_string_pretty(sample).unwrap_or_default();
    format!(
        "You are a commercial real estate assistant. A user asked: \"{message}\".\n\n\
         Here is a sample of the {total} matching records:\n{sample_json}\n\n\
         Write a professional 2-3 sentence introduction to these results. \
         Do not list every record and do not invent figures that are not in the data.",
        total = rows.len(),
    )
}

pub fn no_data_message(filters: &FilterSet) -> String {
    if let Some(name) = filters.building_name.as_deref() {
        return format!(
            "I couldn't find any information about {} in our current portfolio.",
            title_case(name)
        );
    }
    if let Some(city) = filters.city.as_deref() {
        return format!(
            "I apologize, but we currently don't have any properties available in {}.",
            title_case(city)
        );
    }
    if let Some(class) = filters.building_class {
        return format!(
            "I apologize, but Class {} properties are not currently available in our portfolio.",
            class.as_letter()
        );
    }
    GENERIC_NO_DATA.to_string()
}

fn city_menu(rows: &[Row]) -> ChatReply {
    let suggestions = rows
        .iter()
        .filter_map(|row| text_of(row, "CITY"))
        .collect::<Vec<_>>();

    ChatReply {
        text: CITY_MENU_PROMPT.to_string(),
        rows: Vec::new(),
        count: 0,
        suggestions: Some(suggestions),
        show_city_popup: Some(true),
    }
}

fn numbered(intro: &str, rows: &[Row]) -> String {
    let lines = rows
        .iter()
        .enumerate()
        .map(|(index, row)| format!("{}. {}", index + 1, list_line(row)))
        .collect::<Vec<_>>();
    format!("{intro}\n\n{}", lines.join("\n\n"))
}

fn list_line(row: &Row) -> String {
    let name = text_of(row, "BUILDING_NAME");
    let city = text_of(row, "CITY");
    let state = text_of(row, "STATE");

    if let Some(count) = row.get("PROPERTY_COUNT").and_then(integer_of) {
        let noun = if count == 1 { "property" } else { "properties" };
        let place = join_place(city.as_deref(), state.as_deref());
        return format!("{place} ({count} {noun})");
    }

    match (name, city) {
        (Some(name), Some(city)) => match state {
            Some(state) => format!("{name} - {city}, {state}"),
            None => format!("{name} - {city}"),
        },
        (Some(name), None) => name,
        (None, Some(city)) => join_place(Some(&city), state.as_deref()),
        (None, None) => match text_of(row, "BUILDING_CLASS") {
            Some(class) => format!("Class {class}"),
            None => "Unnamed property".to_string(),
        },
    }
}

fn join_place(city: Option<&str>, state: Option<&str>) -> String {
    match (city, state) {
        (Some(city), Some(state)) => format!("{city}, {state}"),
        (Some(city), None) => city.to_string(),
        (None, Some(state)) => state.to_string(),
        (None, None) => "Unknown location".to_string(),
    }
}

fn paragraphs(rows: &[Row], describe: impl Fn(&Row) -> String) -> String {
    rows.iter().map(describe).collect::<Vec<_>>().join("\n\n")
}

fn describe_field(field: RequestedField, name: &str, row: &Row, current_year: i32) -> String {
    let missing = || format!("No {} information available for {name}.", field.label());
    let value = row.get(field.column());

    match field {
        RequestedField::BuildingSize => match value.and_then(integer_of) {
            Some(size) => format!(
                "{name} has a total building size of {} sq ft.",
                thousands(size)
            ),
            None => missing(),
        },
        RequestedField::NumberOfFloors => match value.and_then(integer_of) {
            Some(floors) if floors >= 20 => format!(
                "{name} is an impressive {floors}-story high-rise, offering commanding views and substantial vertical presence in the market."
            ),
            Some(floors) if floors >= 10 => format!(
                "{name} features {floors} floors, representing a well-proportioned mid-rise structure."
            ),
            Some(floors) => format!(
                "{name} has {floors} floors, providing a more intimate, low-rise environment."
            ),
            None => missing(),
        },
        RequestedField::YearBuilt => match value.and_then(integer_of) {
            Some(year) => format!(
                "{name} was built in {year} ({}).",
                age_phrase(current_year, year)
            ),
            None => missing(),
        },
        RequestedField::YearRenovated => match value.and_then(integer_of) {
            Some(year) if year > RENOVATION_SENTINEL_YEAR => format!(
                "{name} was last renovated in {year} ({}).",
                age_phrase(current_year, year)
            ),
            Some(_) => {
                format!("{name} has not been renovated or renovation year is not available.")
            }
            None => missing(),
        },
        RequestedField::CurrentLandlord => match value.and_then(display_value) {
            Some(landlord) => format!("The current landlord of {name} is {landlord}."),
            None => missing(),
        },
        RequestedField::PropertySubType => match value.and_then(display_value) {
            Some(sub_type) => format!("{name} is classified as {sub_type}."),
            None => missing(),
        },
    }
}

fn age_phrase(current_year: i32, year: i64) -> String {
    match i64::from(current_year) - year {
        1 => "1 year ago".to_string(),
        age if age <= 0 => "this year".to_string(),
        age => format!("{age} years ago"),
    }
}

fn row_intro(input: &FormatInput<'_>) -> String {
    let first = &input.rows[0];
    match input.intent {
        QueryIntent::PropertyDetail => format!(
            "Here's a comprehensive overview of {}, a premier commercial property.",
            row_name(first, input.filters)
        ),
        QueryIntent::CityPropertyDetail => format!("Properties in {}:", display_city(input.filters)),
        QueryIntent::LeaseByBuilding => format!(
            "Here are the most recent leases at {}:",
            row_name(first, input.filters)
        ),
        QueryIntent::LeaseByCity => format!(
            "Here are the most recent leases in {}:",
            display_city(input.filters)
        ),
        _ => "Here are the most recent lease transactions in our portfolio:".to_string(),
    }
}

fn average_rent(input: &FormatInput<'_>) -> ChatReply {
    let sentences = input
        .rows
        .iter()
        .filter_map(|row| {
            let average = row.get("AVG_RENT_PSF").and_then(Value::as_f64)?;
            let leases = row.get("LEASE_COUNT").and_then(integer_of).unwrap_or(0);
            let noun = if leases == 1 { "lease" } else { "leases" };
            let scope = match text_of(row, "CITY") {
                Some(city) => format!(
                    "in {}",
                    join_place(Some(&city), text_of(row, "STATE").as_deref())
                ),
                None => "across our portfolio".to_string(),
            };
            Some(format!(
                "The average rent {scope} is ${average:.2} per sq ft, based on {leases} {noun}."
            ))
        })
        .collect::<Vec<_>>();

    if sentences.is_empty() {
        return ChatReply::text_only(no_data_message(input.filters));
    }

    ChatReply {
        text: sentences.join("\n\n"),
        count: input.rows.len(),
        rows: humanize_rows(input.rows),
        suggestions: None,
        show_city_popup: None,
    }
}

fn humanize_rows(rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| (key.replace('_', " "), value.clone()))
                .collect::<Row>()
        })
        .collect()
}

fn row_name(row: &Row, filters: &FilterSet) -> String {
    text_of(row, "BUILDING_NAME")
        .or_else(|| filters.building_name.as_deref().map(title_case))
        .unwrap_or_else(|| "this property".to_string())
}

fn display_city(filters: &FilterSet) -> String {
    filters
        .city
        .as_deref()
        .map(title_case)
        .unwrap_or_else(|| "this city".to_string())
}

fn text_of(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(display_value)
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(text) => text
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .map(|float| float.round() as i64),
        _ => None,
    }
}

fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
