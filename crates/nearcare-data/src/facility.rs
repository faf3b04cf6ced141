use itertools::izip;
use polars::prelude::*;
use serde::{Serialize, Serializer};

use crate::Result;
use crate::schema::{
    ADDRESS, CITY, CONTACT_NAME, COUNTRY, DISTANCE, FACILITY_NAME, HOURS, ID, LATITUDE, LGA_REGION,
    LONGITUDE, NEIGHBOURHOOD, PHONE_NUMBER, PLACE_ID, SERVICES, SOURCE, STATE, TOWN, WEBSITE,
};

/// A WGS84 point. Serialized as a GeoJSON `Point` with `[longitude, latitude]` coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Both coordinates are finite and within the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Serialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        GeoJsonPoint {
            kind: "Point",
            coordinates: [self.longitude, self.latitude],
        }
        .serialize(serializer)
    }
}

/// A hospital or clinic as returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    #[serde(rename = "_id")]
    pub id: u64,
    pub country: String,
    pub state: String,
    pub lga_region: String,
    pub town: String,
    pub city: String,
    pub neighbourhood: String,
    pub facility_name: String,
    pub address: String,
    pub hours: String,
    pub phone_number: String,
    pub website: String,
    pub contact_name: String,
    pub services: String,
    pub place_id: String,
    pub source: String,
    pub location: GeoPoint,
    /// Metres from the query point; only set by proximity queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Facility {
    /// Build facilities from a frame holding the persisted columns and, optionally, `distance`.
    pub fn from_df(df: &DataFrame) -> Result<Vec<Self>> {
        let text = |name: &str| text_column(df, name);
        let distance = match df.column(DISTANCE) {
            Ok(column) => Some(column.f64()?),
            Err(_) => None,
        };

        // izip! tops out well below the column count, so zip two groups.
        let rows = izip!(
            df.column(ID)?.u64()?,
            text(COUNTRY)?,
            text(STATE)?,
            text(LGA_REGION)?,
            text(TOWN)?,
            text(CITY)?,
            text(NEIGHBOURHOOD)?,
            text(FACILITY_NAME)?,
            text(ADDRESS)?,
        )
        .zip(izip!(
            text(HOURS)?,
            text(PHONE_NUMBER)?,
            text(WEBSITE)?,
            text(CONTACT_NAME)?,
            text(SERVICES)?,
            text(PLACE_ID)?,
            text(SOURCE)?,
            df.column(LATITUDE)?.f64()?,
            df.column(LONGITUDE)?.f64()?,
        ))
        .enumerate()
        .map(
            |(
                idx,
                (
                    (id, country, state, lga_region, town, city, neighbourhood, name, address),
                    (hours, phone, website, contact, services, place_id, source, lat, lon),
                ),
            )| Self {
                id: id.unwrap_or_default(),
                country: owned(country),
                state: owned(state),
                lga_region: owned(lga_region),
                town: owned(town),
                city: owned(city),
                neighbourhood: owned(neighbourhood),
                facility_name: owned(name),
                address: owned(address),
                hours: owned(hours),
                phone_number: owned(phone),
                website: owned(website),
                contact_name: owned(contact),
                services: owned(services),
                place_id: owned(place_id),
                source: owned(source),
                location: GeoPoint::new(lat.unwrap_or(f64::NAN), lon.unwrap_or(f64::NAN)),
                distance: distance.and_then(|d| d.get(idx)),
            },
        )
        .collect();
        Ok(rows)
    }
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    Ok(df.column(name)?.str()?)
}

fn owned(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::sample_facility_frame;

    #[test]
    fn test_from_df_reads_every_column() {
        let df = sample_facility_frame();
        let facilities = Facility::from_df(&df).unwrap();

        assert_eq!(facilities.len(), df.height());
        let first = &facilities[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.country, "Nigeria");
        assert_eq!(first.facility_name, "Lagos University Teaching Hospital");
        assert!(first.location.is_valid());
        assert_eq!(first.distance, None);
    }

    #[test]
    fn test_from_df_picks_up_distance() {
        let df = sample_facility_frame()
            .lazy()
            .with_column(lit(12.5).alias(DISTANCE))
            .collect()
            .unwrap();
        let facilities = Facility::from_df(&df).unwrap();
        assert!(facilities.iter().all(|f| f.distance == Some(12.5)));
    }

    #[test]
    fn test_serializes_to_frontend_shape() {
        let df = sample_facility_frame();
        let facility = Facility::from_df(&df).unwrap().remove(0);
        let json = serde_json::to_value(&facility).unwrap();

        assert_eq!(json["_id"], 1);
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(
            json["location"]["coordinates"][0].as_f64(),
            Some(facility.location.longitude)
        );
        assert_eq!(
            json["location"]["coordinates"][1].as_f64(),
            Some(facility.location.latitude)
        );
        assert!(json.get("distance").is_none());
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(6.5, 3.4).is_valid());
        assert!(!GeoPoint::new(91.0, 3.4).is_valid());
        assert!(!GeoPoint::new(6.5, -181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 3.4).is_valid());
    }
}
