use crate::error::ExportError;
use crate::model::SurveyPeriod;
use std::fmt;

const KEY_PREFIX: &str = "snapshot";

/// Object name an export payload is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey(String);

impl StorageKey {
    /// `snapshot-<survey>_<period>[-<survey>_<period>...]-<snapshot_id>`, pairs in input order.
    pub fn build(snapshot_id: &str, survey_periods: &[SurveyPeriod]) -> Result<Self, ExportError> {
        if survey_periods.is_empty() {
            return Err(ExportError::InvalidInput(
                "Survey Period Invalid".to_string(),
            ));
        }

        let combined = survey_periods
            .iter()
            .map(|pair| format!("{}_{}", pair.survey, pair.period))
            .collect::<Vec<_>>()
            .join("-");

        Ok(Self([KEY_PREFIX, combined.as_str(), snapshot_id].join("-")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn location(&self, bucket: &str) -> String {
        format!("s3://{}/{}", bucket, self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
