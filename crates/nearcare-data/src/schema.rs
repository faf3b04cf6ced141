//! Column layout of the persisted facility collection and of the CSV uploads it is built from.

use polars::prelude::*;

pub const ID: &str = "id";
pub const COUNTRY: &str = "country";
pub const STATE: &str = "state";
pub const LGA_REGION: &str = "lga_region";
pub const TOWN: &str = "town";
pub const CITY: &str = "city";
pub const NEIGHBOURHOOD: &str = "neighbourhood";
pub const FACILITY_NAME: &str = "facility_name";
pub const ADDRESS: &str = "address";
pub const HOURS: &str = "hours";
pub const PHONE_NUMBER: &str = "phone_number";
pub const WEBSITE: &str = "website";
pub const CONTACT_NAME: &str = "contact_name";
pub const SERVICES: &str = "services";
pub const PLACE_ID: &str = "place_id";
pub const SOURCE: &str = "source";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// Computed by proximity queries, never persisted.
pub const DISTANCE: &str = "distance";

/// Free-text attributes, in storage order. Never null; absent values are empty strings.
pub const TEXT_COLUMNS: [&str; 15] = [
    COUNTRY,
    STATE,
    LGA_REGION,
    TOWN,
    CITY,
    NEIGHBOURHOOD,
    FACILITY_NAME,
    ADDRESS,
    HOURS,
    PHONE_NUMBER,
    WEBSITE,
    CONTACT_NAME,
    SERVICES,
    PLACE_ID,
    SOURCE,
];

/// Upload header -> storage column.
pub const CSV_TEXT_COLUMNS: [(&str, &str); 15] = [
    ("Country", COUNTRY),
    ("State", STATE),
    ("LGA/Region", LGA_REGION),
    ("Town", TOWN),
    ("City", CITY),
    ("Neighbourhood", NEIGHBOURHOOD),
    ("Facility_Name", FACILITY_NAME),
    ("Address", ADDRESS),
    ("Hours", HOURS),
    ("PhoneNumber", PHONE_NUMBER),
    ("Website", WEBSITE),
    ("Contact_Name", CONTACT_NAME),
    ("Services", SERVICES),
    ("PlaceID", PLACE_ID),
    ("Source", SOURCE),
];
pub const CSV_LATITUDE: &str = "Latitude";
pub const CSV_LONGITUDE: &str = "Longitude";

/// Every persisted column in storage order.
pub fn column_order() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(TEXT_COLUMNS.len() + 3);
    columns.push(ID);
    columns.extend(TEXT_COLUMNS);
    columns.push(LATITUDE);
    columns.push(LONGITUDE);
    columns
}

pub fn facility_schema() -> Schema {
    let mut fields = Vec::with_capacity(TEXT_COLUMNS.len() + 3);
    fields.push((PlSmallStr::from_static(ID), DataType::UInt64));
    fields.extend(
        TEXT_COLUMNS
            .iter()
            .map(|name| (PlSmallStr::from_static(name), DataType::String)),
    );
    fields.push((PlSmallStr::from_static(LATITUDE), DataType::Float64));
    fields.push((PlSmallStr::from_static(LONGITUDE), DataType::Float64));
    Schema::from_iter(fields)
}

/// A facility frame with no rows, used before the first upload.
pub fn empty_facility_frame() -> DataFrame {
    DataFrame::empty_with_schema(&facility_schema())
}

/// First persisted column absent from `df`, if any.
pub fn missing_column(df: &DataFrame) -> Option<&'static str> {
    column_order()
        .into_iter()
        .find(|name| df.column(name).is_err())
}
