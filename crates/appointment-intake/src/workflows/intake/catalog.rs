use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{City, CityId, Doctor, DoctorId, Specialty, SpecialtyId};
use crate::config::CatalogConfig;

/// The three read-only reference lists the intake form is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalogs {
    pub cities: Vec<City>,
    pub specialties: Vec<Specialty>,
    pub doctors: Vec<Doctor>,
}

impl ReferenceCatalogs {
    pub fn new(cities: Vec<City>, specialties: Vec<Specialty>, doctors: Vec<Doctor>) -> Self {
        Self {
            cities,
            specialties,
            doctors: dedupe_doctors(doctors),
        }
    }

    /// Fetch every catalog once. A catalog that cannot be fetched is replaced by
    /// an empty list so the form keeps working.
    pub async fn load<S>(source: &S) -> Self
    where
        S: CatalogSource + ?Sized,
    {
        let (cities, specialties, doctors) =
            tokio::join!(source.cities(), source.specialties(), source.doctors());

        Self::new(
            or_empty(CatalogKind::Cities, cities),
            or_empty(CatalogKind::Specialties, specialties),
            or_empty(CatalogKind::Doctors, doctors),
        )
    }

    pub fn doctor(&self, id: &DoctorId) -> Option<&Doctor> {
        self.doctors.iter().find(|doctor| &doctor.id == id)
    }

    pub fn city_name(&self, id: &CityId) -> Option<&str> {
        self.cities
            .iter()
            .find(|city| &city.id == id)
            .map(|city| city.name.as_str())
    }

    pub fn specialty_name(&self, id: &SpecialtyId) -> Option<&str> {
        self.specialties
            .iter()
            .find(|specialty| &specialty.id == id)
            .map(|specialty| specialty.name.as_str())
    }

    /// "Name Surname (Specialty)" as shown in the doctor picker.
    pub fn doctor_label(&self, doctor: &Doctor) -> String {
        match doctor
            .speciality_id
            .as_ref()
            .and_then(|id| self.specialty_name(id))
        {
            Some(specialty) => format!("{} ({})", doctor.display_name(), specialty),
            None => doctor.display_name(),
        }
    }
}

fn dedupe_doctors(doctors: Vec<Doctor>) -> Vec<Doctor> {
    let mut seen = HashSet::new();
    doctors
        .into_iter()
        .filter(|doctor| {
            let fresh = seen.insert(doctor.id.clone());
            if !fresh {
                warn!(doctor = %doctor.id, "duplicate doctor id in roster; keeping first entry");
            }
            fresh
        })
        .collect()
}

fn or_empty<T>(kind: CatalogKind, result: Result<Vec<T>, CatalogError>) -> Vec<T> {
    match result {
        Ok(records) => {
            info!(catalog = kind.label(), count = records.len(), "catalog loaded");
            records
        }
        Err(err) => {
            warn!(catalog = kind.label(), error = %err, "catalog unavailable, using an empty list");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Cities,
    Specialties,
    Doctors,
}

impl CatalogKind {
    pub fn label(self) -> &'static str {
        match self {
            CatalogKind::Cities => "cities",
            CatalogKind::Specialties => "specialties",
            CatalogKind::Doctors => "doctors",
        }
    }
}

/// Provider of the reference catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn cities(&self) -> Result<Vec<City>, CatalogError>;
    async fn specialties(&self) -> Result<Vec<Specialty>, CatalogError>;
    async fn doctors(&self) -> Result<Vec<Doctor>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} catalog must be a JSON array")]
    NotAnArray { kind: &'static str },
}

/// Where a single catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLocation {
    Http(String),
    File(PathBuf),
}

impl CatalogLocation {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            CatalogLocation::Http(trimmed.to_string())
        } else {
            CatalogLocation::File(PathBuf::from(trimmed))
        }
    }
}

/// Catalog source reading each list from a URL or a local JSON file.
pub struct ConfiguredCatalogSource {
    client: reqwest::Client,
    cities: CatalogLocation,
    specialties: CatalogLocation,
    doctors: CatalogLocation,
}

impl ConfiguredCatalogSource {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            cities: CatalogLocation::parse(&config.cities),
            specialties: CatalogLocation::parse(&config.specialties),
            doctors: CatalogLocation::parse(&config.doctors),
        })
    }

    async fn fetch<T>(&self, kind: CatalogKind, location: &CatalogLocation) -> Result<Vec<T>, CatalogError>
    where
        T: DeserializeOwned,
    {
        let value: Value = match location {
            CatalogLocation::Http(url) => {
                self.client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            CatalogLocation::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                serde_json::from_slice(&bytes)?
            }
        };

        decode_records(kind, value)
    }
}

#[async_trait]
impl CatalogSource for ConfiguredCatalogSource {
    async fn cities(&self) -> Result<Vec<City>, CatalogError> {
        self.fetch(CatalogKind::Cities, &self.cities).await
    }

    async fn specialties(&self) -> Result<Vec<Specialty>, CatalogError> {
        self.fetch(CatalogKind::Specialties, &self.specialties).await
    }

    async fn doctors(&self) -> Result<Vec<Doctor>, CatalogError> {
        self.fetch(CatalogKind::Doctors, &self.doctors).await
    }
}

/// Decode a JSON array record by record, dropping entries that do not fit.
pub(crate) fn decode_records<T>(kind: CatalogKind, value: Value) -> Result<Vec<T>, CatalogError>
where
    T: DeserializeOwned,
{
    let Value::Array(items) = value else {
        return Err(CatalogError::NotAnArray { kind: kind.label() });
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(catalog = kind.label(), index, error = %err, "skipping malformed catalog record")
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingSource;

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn cities(&self) -> Result<Vec<City>, CatalogError> {
            Ok(vec![City {
                id: CityId::new("1"),
                name: "Kyiv".to_string(),
            }])
        }

        async fn specialties(&self) -> Result<Vec<Specialty>, CatalogError> {
            Err(CatalogError::NotAnArray {
                kind: CatalogKind::Specialties.label(),
            })
        }

        async fn doctors(&self) -> Result<Vec<Doctor>, CatalogError> {
            Err(CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "gone",
            )))
        }
    }

    #[test]
    fn location_parse_distinguishes_urls_from_paths() {
        assert_eq!(
            CatalogLocation::parse(" https://example.org/cities "),
            CatalogLocation::Http("https://example.org/cities".to_string())
        );
        assert_eq!(
            CatalogLocation::parse("fixtures/cities.json"),
            CatalogLocation::File(PathBuf::from("fixtures/cities.json"))
        );
    }

    #[test]
    fn decode_skips_malformed_records() {
        let value = json!([
            { "id": "1", "name": "Anna", "cityId": "1", "specialityId": "4", "isPediatrician": false },
            { "name": "No id" },
            { "id": "3", "isPediatrician": "yes" },
            { "id": 4 }
        ]);

        let doctors: Vec<Doctor> = decode_records(CatalogKind::Doctors, value).expect("array decodes");

        let ids: Vec<_> = doctors.iter().map(|doctor| doctor.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn decode_rejects_non_arrays() {
        let err = decode_records::<City>(CatalogKind::Cities, json!({ "id": "1" }))
            .expect_err("object rejected");
        assert!(matches!(err, CatalogError::NotAnArray { kind: "cities" }));
    }

    #[test]
    fn duplicate_doctor_ids_keep_the_first_entry() {
        let first: Doctor = serde_json::from_value(json!({ "id": "1", "name": "First" })).expect("doctor");
        let second: Doctor = serde_json::from_value(json!({ "id": "1", "name": "Second" })).expect("doctor");

        let catalogs = ReferenceCatalogs::new(Vec::new(), Vec::new(), vec![first, second]);

        assert_eq!(catalogs.doctors.len(), 1);
        assert_eq!(catalogs.doctors[0].name, "First");
    }

    #[tokio::test]
    async fn load_degrades_failed_catalogs_to_empty() {
        let catalogs = ReferenceCatalogs::load(&FailingSource).await;

        assert_eq!(catalogs.cities.len(), 1);
        assert!(catalogs.specialties.is_empty());
        assert!(catalogs.doctors.is_empty());
    }

    #[tokio::test]
    async fn configured_source_reads_json_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cities = dir.path().join("cities.json");
        let specialties = dir.path().join("specialties.json");
        std::fs::write(&cities, r#"[{"id": 1, "name": "Lviv"}]"#).expect("write cities");
        std::fs::write(&specialties, r#"[{"id": "4", "name": "Neurology"}]"#).expect("write specialties");

        let config = CatalogConfig {
            cities: cities.display().to_string(),
            specialties: specialties.display().to_string(),
            doctors: dir.path().join("missing.json").display().to_string(),
            timeout_secs: 1,
        };
        let source = ConfiguredCatalogSource::new(&config).expect("source builds");

        let catalogs = ReferenceCatalogs::load(&source).await;

        assert_eq!(catalogs.city_name(&CityId::new("1")), Some("Lviv"));
        assert_eq!(catalogs.specialty_name(&SpecialtyId::new("4")), Some("Neurology"));
        assert!(catalogs.doctors.is_empty());
    }
}
