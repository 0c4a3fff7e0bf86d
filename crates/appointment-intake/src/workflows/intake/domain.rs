use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl IdentifierValue for $name {
            fn from_string(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                RawIdentifier::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

identifier!(
    /// Identifier of a city in the reference catalog.
    CityId
);
identifier!(
    /// Identifier of a medical specialty in the reference catalog.
    SpecialtyId
);
identifier!(
    /// Identifier of a doctor in the reference roster.
    DoctorId
);

/// Catalog feeds encode identifiers either as strings or as bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Text(String),
    Integer(i64),
}

impl RawIdentifier {
    fn into_string(self) -> String {
        match self {
            RawIdentifier::Text(value) => value.trim().to_string(),
            RawIdentifier::Integer(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: SpecialtyId,
    pub name: String,
}

/// Roster entry as published by the reference feed.
///
/// Only `id` is mandatory. Records missing any other field still load; the
/// eligibility rules treat the absent value as non-matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: DoctorId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub city_id: Option<CityId>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub speciality_id: Option<SpecialtyId>,
    #[serde(default)]
    pub is_pediatrician: Option<bool>,
}

impl Doctor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// The patient's in-progress answers. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCriteria {
    #[serde(default, deserialize_with = "optional_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_gender")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub city_id: Option<CityId>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub speciality_id: Option<SpecialtyId>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub selected_doctor_id: Option<DoctorId>,
}

impl PatientCriteria {
    /// True when none of the filtering criteria are set.
    pub fn is_unconstrained(&self) -> bool {
        self.birth_date.is_none()
            && self.gender.is_none()
            && self.city_id.is_none()
            && self.speciality_id.is_none()
    }
}

/// City and specialty derived from a directly selected doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaPatch {
    pub city_id: CityId,
    pub speciality_id: SpecialtyId,
}

/// Parse a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn optional_identifier<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: IdentifierValue,
{
    let raw = Option::<RawIdentifier>::deserialize(deserializer)?;
    Ok(raw
        .map(RawIdentifier::into_string)
        .filter(|value| !value.is_empty())
        .map(T::from_string))
}

pub(crate) fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub(crate) fn optional_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Gender::parse(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown gender '{value}'"))),
    }
}

/// Lets the optional-identifier helper build any of the identifier newtypes.
pub(crate) trait IdentifierValue {
    fn from_string(value: String) -> Self;
}
