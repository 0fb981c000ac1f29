use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingClass {
    A,
    B,
    C,
}

impl BuildingClass {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }

    pub fn as_letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestedField {
    BuildingSize,
    NumberOfFloors,
    YearBuilt,
    YearRenovated,
    CurrentLandlord,
    PropertySubType,
}

impl RequestedField {
    pub fn column(self) -> &'static str {
        match self {
            Self::BuildingSize => "BUILDING_SIZE",
            Self::NumberOfFloors => "NUMBER_OF_FLOORS",
            Self::YearBuilt => "YEAR_BUILT",
            Self::YearRenovated => "YEAR_RENOVATED",
            Self::CurrentLandlord => "CURRENT_LANDLORD",
            Self::PropertySubType => "PROPERTY_SUB_TYPE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BuildingSize => "building size",
            Self::NumberOfFloors => "number of floors",
            Self::YearBuilt => "year built",
            Self::YearRenovated => "year renovated",
            Self::CurrentLandlord => "current landlord",
            Self::PropertySubType => "property sub type",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub building_class: Option<BuildingClass>,
    pub city: Option<String>,
    pub building_name: Option<String>,
    pub requested_field: Option<RequestedField>,
    pub is_detail_request: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    LandlordDetail,
    CityList,
    BuildingClassList,
    PropertyListByCity,
    CityPropertyList,
    PropertyDetail,
    PropertyField,
    ClassPropertyList,
    CityPropertyDetail,
    LeaseByBuilding,
    LeaseByCity,
    LeaseList,
    AverageRent,
    Fallback,
}

impl QueryIntent {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::LandlordDetail => "landlord_detail",
            Self::CityList => "city_list",
            Self::BuildingClassList => "building_class_list",
            Self::PropertyListByCity => "property_list_by_city",
            Self::CityPropertyList => "city_property_list",
            Self::PropertyDetail => "property_detail",
            Self::PropertyField => "property_field",
            Self::ClassPropertyList => "class_property_list",
            Self::CityPropertyDetail => "city_property_detail",
            Self::LeaseByBuilding => "lease_by_building",
            Self::LeaseByCity => "lease_by_city",
            Self::LeaseList => "lease_list",
            Self::AverageRent => "average_rent",
            Self::Fallback => "fallback",
        }
    }

    pub fn is_row_shaped(self) -> bool {
        matches!(
            self,
            Self::PropertyDetail
                | Self::CityPropertyDetail
                | Self::LeaseByBuilding
                | Self::LeaseByCity
                | Self::LeaseList
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub normalized: String,
    pub filters: FilterSet,
    pub intent: QueryIntent,
    pub query: Option<QuerySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(rename = "response")]
    pub text: String,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(
        rename = "showCityPopup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub show_city_popup: Option<bool>,
}

impl ChatReply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
            count: 0,
            suggestions: None,
            show_city_popup: None,
        }
    }
}
