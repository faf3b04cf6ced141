//! Small synthetic facility datasets for tests and local development.

use std::io::Write;

use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing::info;

use super::error::Result;
use crate::schema::{
    ADDRESS, CITY, CONTACT_NAME, COUNTRY, FACILITY_NAME, HOURS, ID, LATITUDE, LGA_REGION,
    LONGITUDE, NEIGHBOURHOOD, PHONE_NUMBER, PLACE_ID, SERVICES, SOURCE, STATE, TOWN, WEBSITE,
};

/// Six facilities across Nigeria, France and Ghana in persisted layout.
///
/// Country casing is deliberately mixed (`"Nigeria"` and `"nigeria"`) so
/// case-insensitive matching can be checked against it.
pub fn sample_facility_frame() -> DataFrame {
    df![
        ID => [1u64, 2, 3, 4, 5, 6],
        COUNTRY => ["Nigeria", "Nigeria", "nigeria", "France", "France", "Ghana"],
        STATE => ["Lagos", "Lagos", "FCT", "Ile-de-France", "Auvergne-Rhone-Alpes", "Greater Accra"],
        LGA_REGION => ["Surulere", "Ikeja", "Abuja Municipal", "", "", "Ablekuma South"],
        TOWN => ["Idi-Araba", "Ikeja", "Central Area", "", "", "Korle Gonno"],
        CITY => ["Lagos", "Ikeja", "Abuja", "Paris", "Lyon", "Accra"],
        NEIGHBOURHOOD => ["Idi-Araba", "Oba Akran", "Garki", "Montparnasse", "Grange Blanche", "Korle Bu"],
        FACILITY_NAME => [
            "Lagos University Teaching Hospital",
            "Lagos State University Teaching Hospital",
            "National Hospital Abuja",
            "Hopital Necker",
            "Hopital Edouard Herriot",
            "Korle Bu Teaching Hospital",
        ],
        ADDRESS => [
            "Ishaga Rd, Idi-Araba",
            "1-5 Oba Akinjobi Way, Ikeja",
            "Plot 132 Central Business District",
            "149 Rue de Sevres",
            "5 Place d'Arsonval",
            "Guggisberg Ave",
        ],
        HOURS => ["24/7", "24/7", "08:00-18:00", "24/7", "24/7", "24/7"],
        PHONE_NUMBER => ["+234 1 774 5454", "+234 1 496 3020", "+234 9 234 3361", "+33 1 44 49 40 00", "+33 4 72 11 73 11", "+233 30 266 7759"],
        WEBSITE => ["luth.gov.ng", "lasuth.org.ng", "nationalhospital.gov.ng", "", "chu-lyon.fr", "kbth.gov.gh"],
        CONTACT_NAME => ["", "", "Front Desk", "", "", ""],
        SERVICES => [
            "Emergency, Pediatrics, Surgery",
            "Maternity, Emergency",
            "Oncology, Cardiology",
            "Pediatrics, Emergency",
            "Emergency, Surgery",
            "General, Emergency",
        ],
        PLACE_ID => ["p-luth", "p-lasuth", "p-nha", "p-necker", "p-herriot", "p-korlebu"],
        SOURCE => ["survey", "survey", "survey", "osm", "osm", "survey"],
        LATITUDE => [6.5167f64, 6.5966, 9.0417, 48.8469, 45.7428, 5.5364],
        LONGITUDE => [3.3537f64, 3.3515, 7.4711, 2.3156, 4.8806, -0.2275],
    ]
    .expect("sample facility frame columns have equal length")
}

/// Upload-format CSV with three valid rows and three that must be rejected
/// (blank latitude, unparsable longitude, missing coordinates altogether).
pub fn sample_upload_csv() -> String {
    [
        "Country,State,LGA/Region,Town,City,Neighbourhood,Facility_Name,Address,Hours,PhoneNumber,Website,Contact_Name,Services,PlaceID,Source,Latitude,Longitude",
        "Kenya,Nairobi,Dagoretti,Upper Hill,Nairobi,Upper Hill,Kenyatta National Hospital,Hospital Rd,24/7,+254 20 272 6300,knh.or.ke,,\"Emergency, Oncology\",p-knh,survey,-1.3010,36.8073",
        "Kenya,Mombasa,Mvita,,Mombasa,Tudor,Coast General Hospital,Moi Ave,24/7,,,,Emergency,p-cgh,survey,-4.0543,39.6668",
        "Kenya,Kisumu,,,Kisumu,,Jaramogi Oginga Odinga Hospital,,,,,,\"Pediatrics, Maternity\",,survey,-0.0917,34.7680",
        "Kenya,Nakuru,,,Nakuru,,Nakuru Level 5 Hospital,,,,,,,,survey,,36.0667",
        "Kenya,Nyeri,,,Nyeri,,Nyeri County Referral Hospital,,,,,,,,survey,-0.4201,east",
        "Kenya,Kiambu,,,Thika,,Thika Level 5 Hospital,,,,,,,,survey,,",
    ]
    .join("\n")
}

/// Write [`sample_upload_csv`] to a temporary file.
pub fn create_sample_upload_file() -> Result<NamedTempFile> {
    info!("Creating sample facility upload file");
    let mut file = NamedTempFile::with_suffix(".csv")?;
    writeln!(file, "{}", sample_upload_csv())?;
    file.flush()?;
    Ok(file)
}
