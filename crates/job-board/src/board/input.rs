//! Typed request bodies. Each payload is decoded and validated before any store write.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use super::domain::{CompanyId, CompanySize, JobId, JobLevel, JobStatus, JobType, Role};
use super::workflow::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid request body: {0}")]
    Malformed(String),
}

/// Decodes a JSON body; every decode failure is reported as `InputError::Malformed`.
pub fn decode<T>(body: &[u8]) -> Result<T, InputError>
where
    T: serde::de::DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(InputError::Malformed("request body is empty".to_string()));
    }
    serde_json::from_slice(body).map_err(|err| InputError::Malformed(err.to_string()))
}

fn required(field: &'static str, value: &str) -> Result<String, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InputError::Missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn required_if_present(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, InputError> {
    value.map(|value| required(field, &value)).transpose()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|value| value.date_naive()))
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD or RFC 3339 ({err})"))
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Salaries arrive either as display strings ("$80k - $95k") or bare numbers.
fn deserialize_salary<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Salary {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Salary::deserialize(deserializer)? {
        Salary::Text(text) => text,
        Salary::Number(number) => number.to_string(),
    })
}

fn deserialize_optional_salary<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_salary")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}

/// Identity provider event. `data` stays raw until the event is known to be a user
/// sync (`user.created` / `user.updated`); other events carry unrelated payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl IdentityEvent {
    pub fn user_sync(kind: &str, data: &IdentityEventData) -> Self {
        let emails: Vec<serde_json::Value> = data
            .email_addresses
            .iter()
            .map(|entry| json!({ "email_address": entry.email_address }))
            .collect();
        Self {
            kind: kind.to_string(),
            data: Some(json!({
                "id": data.id,
                "email_addresses": emails,
                "first_name": data.first_name,
                "last_name": data.last_name,
                "image_url": data.image_url,
            })),
        }
    }

    pub fn is_user_sync(&self) -> bool {
        matches!(self.kind.as_str(), "user.created" | "user.updated")
    }

    /// Decodes the user payload of a sync event.
    pub fn user_data(self) -> Result<IdentityEventData, InputError> {
        let data = self.data.ok_or(InputError::Missing("data"))?;
        serde_json::from_value(data).map_err(|err| InputError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEventData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEmail>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEmail {
    pub email_address: String,
}

/// Validated identity fields ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub profile_image: String,
}

impl IdentityEventData {
    pub fn validate(self) -> Result<IdentityProfile, InputError> {
        let external_id = required("data.id", &self.id)?;
        let email = self
            .email_addresses
            .first()
            .map(|entry| entry.email_address.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .ok_or(InputError::Missing("data.email_addresses"))?;
        let name = format!(
            "{} {}",
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default()
        )
        .trim()
        .to_string();

        Ok(IdentityProfile {
            external_id,
            email,
            name,
            profile_image: self.image_url.unwrap_or_default(),
        })
    }
}

/// Profile edit; blank text values keep the previous value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub size: CompanySize,
}

impl NewCompany {
    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            name: required("name", &self.name)?,
            description: required("description", &self.description)?,
            location: required("location", &self.location)?,
            ..self
        })
    }
}

/// Company edit. `recruiter` and `jobs` are not editable, so unknown fields are refused.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub size: Option<CompanySize>,
}

impl CompanyUpdate {
    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            name: required_if_present("name", self.name)?,
            description: required_if_present("description", self.description)?,
            location: required_if_present("location", self.location)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_salary")]
    pub salary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub level: JobLevel,
    #[serde(default)]
    pub category: String,
    pub company: CompanyId,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub deadline: Option<NaiveDate>,
}

impl NewJob {
    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            salary: required("salary", &self.salary)?,
            location: required("location", &self.location)?,
            category: required("category", &self.category)?,
            ..self
        })
    }
}

/// Job edit. `company` and `recruiter` are fixed at creation, so unknown fields are refused.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_salary")]
    pub salary: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub level: Option<JobLevel>,
    pub category: Option<String>,
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub deadline: Option<NaiveDate>,
}

impl JobUpdate {
    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            title: required_if_present("title", self.title)?,
            description: required_if_present("description", self.description)?,
            salary: required_if_present("salary", self.salary)?,
            location: required_if_present("location", self.location)?,
            category: required_if_present("category", self.category)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_id: JobId,
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub cover_letter: String,
}

impl NewApplication {
    pub fn validate(self) -> Result<Self, InputError> {
        Ok(Self {
            resume: required("resume", &self.resume)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}
