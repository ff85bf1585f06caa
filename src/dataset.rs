use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::SheetCache;
use crate::config::SheetSettings;
use crate::corrections::Correction;
use crate::error::{DashboardResult, DataQualityWarning};
use crate::models::{OrgTable, SurveyRecord};
use crate::sheets::SheetSource;
use crate::{normalize, recode};

/// Cleaned survey responses and organization metadata for one render pass.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub surveys: Vec<SurveyRecord>,
    pub orgs: OrgTable,
    pub warnings: Vec<DataQualityWarning>,
    pub fetched_at: DateTime<Utc>,
}

pub struct DatasetLoader {
    source: Arc<dyn SheetSource>,
    cache: SheetCache,
    settings: SheetSettings,
    corrections: Vec<Correction>,
}

impl DatasetLoader {
    pub fn new(
        source: Arc<dyn SheetSource>,
        settings: SheetSettings,
        corrections: Vec<Correction>,
    ) -> Self {
        Self {
            cache: SheetCache::new(settings.cache_ttl),
            source,
            settings,
            corrections,
        }
    }

    /// Fetches both worksheets through the cache and rebuilds the typed tables.
    pub async fn load(&self) -> DashboardResult<Dataset> {
        let survey = self
            .cache
            .get_or_fetch(
                self.source.as_ref(),
                &self.settings.sheet_key,
                &self.settings.survey_worksheet,
            )
            .await?;
        let org = self
            .cache
            .get_or_fetch(
                self.source.as_ref(),
                &self.settings.sheet_key,
                &self.settings.org_worksheet,
            )
            .await?;

        let text_rows =
            normalize::survey_table(&survey.rows, self.settings.header_rows, &self.corrections)?;
        let recoded = recode::recode(text_rows)?;
        let orgs = normalize::org_table(&org.rows, self.settings.header_rows);

        if !recoded.warnings.is_empty() {
            tracing::warn!(
                count = recoded.warnings.len(),
                "survey data has unrecognized rating responses"
            );
        }
        tracing::debug!(
            surveys = recoded.records.len(),
            orgs = orgs.rows.len(),
            "dataset ready"
        );

        Ok(Dataset {
            surveys: recoded.records,
            orgs,
            warnings: recoded.warnings,
            fetched_at: survey.fetched_at.min(org.fetched_at),
        })
    }
}
