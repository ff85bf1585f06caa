use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DashboardError, DashboardResult};

pub const DEFAULT_SHEET_KEY: &str = "1f3gA4sIxLqBYQw7bk1igGGNaFtW7LHtO_7BCCmMS1IQ";
pub const DEFAULT_SURVEY_WORKSHEET: &str = "Survey Data";
pub const DEFAULT_ORG_WORKSHEET: &str = "Org Data";

/// Service-account fields as they appear in the hosting secret store.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
}

// Keeps the private key out of logs.
impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    pub fn from_toml_str(contents: &str) -> DashboardResult<Self> {
        let mut account: ServiceAccount = toml::from_str(contents)
            .map_err(|err| DashboardError::Config(format!("malformed secrets: {err}")))?;
        account.private_key = account.private_key.replace("\\n", "\n");

        if account.client_email.trim().is_empty() {
            return Err(DashboardError::Config("client_email is empty".to_string()));
        }
        if account.token_uri.trim().is_empty() {
            return Err(DashboardError::Config("token_uri is empty".to_string()));
        }
        Ok(account)
    }

    pub fn load(path: &Path) -> DashboardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            DashboardError::Config(format!("cannot read secrets {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, Clone)]
pub struct SheetSettings {
    pub sheet_key: String,
    pub survey_worksheet: String,
    pub org_worksheet: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    /// Rows below the column-key row that are not data.
    pub header_rows: usize,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            sheet_key: DEFAULT_SHEET_KEY.to_string(),
            survey_worksheet: DEFAULT_SURVEY_WORKSHEET.to_string(),
            org_worksheet: DEFAULT_ORG_WORKSHEET.to_string(),
            cache_ttl: Duration::from_secs(1100),
            request_timeout: Duration::from_secs(30),
            header_rows: 1,
        }
    }
}
