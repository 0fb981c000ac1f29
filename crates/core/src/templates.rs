//! Literal SQL for every intent. Text filters are matched with
//! `UPPER(col) LIKE UPPER(?)`; every statement carries a LIMIT and a
//! deterministic ORDER BY.

use crate::models::{FilterSet, QueryIntent, QuerySpec, RequestedField};

pub const CITY_SUMMARY_SQL: &str = "SELECT CITY, STATE, COUNT(*) AS PROPERTY_COUNT \
FROM PROPERTY WHERE CITY IS NOT NULL \
GROUP BY CITY, STATE \
ORDER BY PROPERTY_COUNT DESC, CITY ASC LIMIT 20";

const BUILDING_CLASSES_SQL: &str = "SELECT DISTINCT BUILDING_CLASS FROM PROPERTY \
WHERE BUILDING_CLASS IS NOT NULL \
ORDER BY BUILDING_CLASS ASC LIMIT 10";

const CITY_MENU_SQL: &str = "SELECT DISTINCT CITY FROM PROPERTY \
WHERE CITY IS NOT NULL \
ORDER BY CITY ASC LIMIT 15";

const CITY_PROPERTY_LIST_SQL: &str = "SELECT BUILDING_NAME, CITY, STATE FROM PROPERTY \
WHERE UPPER(CITY) LIKE UPPER(?) \
ORDER BY BUILDING_NAME ASC LIMIT 20";

const CLASS_PROPERTY_LIST_SQL: &str = "SELECT BUILDING_NAME FROM PROPERTY \
WHERE UPPER(BUILDING_CLASS) LIKE UPPER(?) \
ORDER BY BUILDING_NAME ASC LIMIT 20";

const PROPERTY_DETAIL_SQL: &str = "SELECT * FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) \
ORDER BY BUILDING_NAME ASC LIMIT 10";

const CITY_PROPERTY_DETAIL_SQL: &str = "SELECT * FROM PROPERTY \
WHERE UPPER(CITY) LIKE UPPER(?) \
ORDER BY BUILDING_NAME ASC LIMIT 10";

const LANDLORD_SQL: &str = "SELECT BUILDING_NAME, CURRENT_LANDLORD, CITY, STATE FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) \
ORDER BY BUILDING_NAME ASC LIMIT 10";

const FIELD_BUILDING_SIZE_SQL: &str = "SELECT BUILDING_NAME, BUILDING_SIZE FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) ORDER BY BUILDING_NAME ASC LIMIT 10";
const FIELD_NUMBER_OF_FLOORS_SQL: &str = "SELECT BUILDING_NAME, NUMBER_OF_FLOORS FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) ORDER BY BUILDING_NAME ASC LIMIT 10";
const FIELD_YEAR_BUILT_SQL: &str = "SELECT BUILDING_NAME, YEAR_BUILT FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) ORDER BY BUILDING_NAME ASC LIMIT 10";
const FIELD_YEAR_RENOVATED_SQL: &str = "SELECT BUILDING_NAME, YEAR_RENOVATED FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) ORDER BY BUILDING_NAME ASC LIMIT 10";
const FIELD_CURRENT_LANDLORD_SQL: &str = "SELECT BUILDING_NAME, CURRENT_LANDLORD FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) ORDER BY BUILDING_NAME ASC LIMIT 10";
const FIELD_PROPERTY_SUB_TYPE_SQL: &str = "SELECT BUILDING_NAME, PROPERTY_SUB_TYPE FROM PROPERTY \
WHERE UPPER(BUILDING_NAME) LIKE UPPER(?) ORDER BY BUILDING_NAME ASC LIMIT 10";

const LEASE_BY_BUILDING_SQL: &str = "SELECT P.BUILDING_NAME AS BUILDING_NAME, P.CITY AS CITY, \
P.STATE AS STATE, L.TENANT_NAME AS TENANT_NAME, L.EXECUTION_DATE AS EXECUTION_DATE, \
L.LEASED_SF AS LEASED_SF, L.RENT_PSF AS RENT_PSF, L.LEASE_TERM_MONTHS AS LEASE_TERM_MONTHS \
FROM LEASE L JOIN PROPERTY P ON P.PROPERTY_ID = L.PROPERTY_ID \
WHERE UPPER(P.BUILDING_NAME) LIKE UPPER(?) \
ORDER BY L.EXECUTION_DATE DESC, P.BUILDING_NAME ASC LIMIT 20";

const LEASE_BY_CITY_SQL: &str = "SELECT P.BUILDING_NAME AS BUILDING_NAME, P.CITY AS CITY, \
P.STATE AS STATE, L.TENANT_NAME AS TENANT_NAME, L.EXECUTION_DATE AS EXECUTION_DATE, \
L.LEASED_SF AS LEASED_SF, L.RENT_PSF AS RENT_PSF, L.LEASE_TERM_MONTHS AS LEASE_TERM_MONTHS \
FROM LEASE L JOIN PROPERTY P ON P.PROPERTY_ID = L.PROPERTY_ID \
WHERE UPPER(P.CITY) LIKE UPPER(?) \
ORDER BY L.EXECUTION_DATE DESC, P.BUILDING_NAME ASC LIMIT 20";

const RECENT_LEASES_SQL: &str = "SELECT P.BUILDING_NAME AS BUILDING_NAME, P.CITY AS CITY, \
P.STATE AS STATE, L.TENANT_NAME AS TENANT_NAME, L.EXECUTION_DATE AS EXECUTION_DATE, \
L.LEASED_SF AS LEASED_SF, L.RENT_PSF AS RENT_PSF, L.LEASE_TERM_MONTHS AS LEASE_TERM_MONTHS \
FROM LEASE L JOIN PROPERTY P ON P.PROPERTY_ID = L.PROPERTY_ID \
ORDER BY L.EXECUTION_DATE DESC, P.BUILDING_NAME ASC LIMIT 15";

// Aggregate over the whole table: a single row, so no ORDER BY is needed.
const AVERAGE_RENT_SQL: &str = "SELECT AVG(RENT_PSF) AS AVG_RENT_PSF, COUNT(RENT_PSF) AS LEASE_COUNT \
FROM LEASE WHERE RENT_PSF IS NOT NULL LIMIT 10";

const AVERAGE_RENT_BY_CITY_SQL: &str = "SELECT P.CITY AS CITY, P.STATE AS STATE, \
AVG(L.RENT_PSF) AS AVG_RENT_PSF, COUNT(L.RENT_PSF) AS LEASE_COUNT \
FROM LEASE L JOIN PROPERTY P ON P.PROPERTY_ID = L.PROPERTY_ID \
WHERE L.RENT_PSF IS NOT NULL AND UPPER(P.CITY) LIKE UPPER(?) \
GROUP BY P.CITY, P.STATE \
ORDER BY P.CITY ASC LIMIT 10";

pub const PROPERTY_SAMPLE_SQL: &str =
    "SELECT * FROM PROPERTY ORDER BY BUILDING_NAME ASC LIMIT ?";

pub const LEASE_SAMPLE_SQL: &str =
    "SELECT * FROM LEASE ORDER BY EXECUTION_DATE DESC, LEASE_ID ASC LIMIT ?";

pub fn query_for(intent: QueryIntent, filters: &FilterSet) -> Option<QuerySpec> {
    let building = || like(filters.building_name.as_deref());
    let city = || like(filters.city.as_deref());

    let (sql, params) = match intent {
        QueryIntent::CityList => (CITY_SUMMARY_SQL, Vec::new()),
        QueryIntent::BuildingClassList => (BUILDING_CLASSES_SQL, Vec::new()),
        QueryIntent::PropertyListByCity => (CITY_MENU_SQL, Vec::new()),
        QueryIntent::CityPropertyList => (CITY_PROPERTY_LIST_SQL, vec![city()]),
        QueryIntent::ClassPropertyList => (
            CLASS_PROPERTY_LIST_SQL,
            vec![filters
                .building_class
                .map(|class| class.as_letter().to_string())
                .unwrap_or_default()],
        ),
        QueryIntent::PropertyDetail => (PROPERTY_DETAIL_SQL, vec![building()]),
        QueryIntent::PropertyField => match filters.requested_field {
            Some(field) => (field_sql(field), vec![building()]),
            None => (PROPERTY_DETAIL_SQL, vec![building()]),
        },
        QueryIntent::LandlordDetail => (LANDLORD_SQL, vec![building()]),
        QueryIntent::CityPropertyDetail => (CITY_PROPERTY_DETAIL_SQL, vec![city()]),
        QueryIntent::LeaseByBuilding => (LEASE_BY_BUILDING_SQL, vec![building()]),
        QueryIntent::LeaseByCity => (LEASE_BY_CITY_SQL, vec![city()]),
        QueryIntent::LeaseList => (RECENT_LEASES_SQL, Vec::new()),
        QueryIntent::AverageRent => match filters.city {
            Some(_) => (AVERAGE_RENT_BY_CITY_SQL, vec![city()]),
            None => (AVERAGE_RENT_SQL, Vec::new()),
        },
        QueryIntent::Fallback => return None,
    };

    Some(QuerySpec {
        sql: sql.to_string(),
        params,
    })
}

fn field_sql(field: RequestedField) -> &'static str {
    match field {
        RequestedField::BuildingSize => FIELD_BUILDING_SIZE_SQL,
        RequestedField::NumberOfFloors => FIELD_NUMBER_OF_FLOORS_SQL,
        RequestedField::YearBuilt => FIELD_YEAR_BUILT_SQL,
        RequestedField::YearRenovated => FIELD_YEAR_RENOVATED_SQL,
        RequestedField::CurrentLandlord => FIELD_CURRENT_LANDLORD_SQL,
        RequestedField::PropertySubType => FIELD_PROPERTY_SUB_TYPE_SQL,
    }
}

fn like(value: Option<&str>) -> String {
    format!("%{}%", value.unwrap_or_default())
}
