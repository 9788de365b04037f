use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};

/// Location reported for any request that did not produce an export.
pub const FAILED_LOCATION: &str = "null";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SurveyPeriod {
    pub survey: String,
    pub period: String,
}

impl SurveyPeriod {
    pub fn new(survey: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            survey: survey.into(),
            period: period.into(),
        }
    }
}

/// Body of a message on the export input queue.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub snapshot_id: String,

    // Missing and null both mean "no pairs" so they reach validation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub surveyperiods: Vec<SurveyPeriod>,
}

impl ExportRequest {
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Message sent to the export output queue, one per inbound request.
#[derive(Builder, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportNotification {
    #[builder(into)]
    pub snapshot_id: String,
    #[builder(into, default = FAILED_LOCATION.to_string())]
    pub location: String,
    #[builder(default = false)]
    pub successful: bool,
}

impl ExportNotification {
    pub fn success(snapshot_id: &str, location: &str) -> Self {
        Self::builder()
            .snapshot_id(snapshot_id)
            .location(location)
            .successful(true)
            .build()
    }

    pub fn failure(snapshot_id: &str) -> Self {
        Self::builder().snapshot_id(snapshot_id).build()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
