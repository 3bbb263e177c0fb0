//! The per-file upload and submit loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::DuplicatePolicy;
use crate::history::{TriggerHistory, TriggerRecord};
use crate::metrics::{FILES_PER_REQUEST, TRIGGERS_TOTAL};
use crate::pipeline::{JobRequest, PipelineService};
use crate::storage::{stage_upload, ObjectStore, StagedObject};

use super::naming::{
    console_link, customer_name, job_display_name, pipeline_job_id,
    training_budget_milli_node_hours,
};
use super::{TriggerError, TriggerOptions, TriggerOutcome, TriggerSettings, Upload};

/// Stages uploads and launches one pipeline run per file.
///
/// The orchestrator holds no per-session state: the caller passes its
/// `TriggerHistory` in and receives the updated history back.
pub struct TriggerOrchestrator {
    settings: TriggerSettings,
    store: Arc<dyn ObjectStore>,
    pipelines: Arc<dyn PipelineService>,
}

impl TriggerOrchestrator {
    pub fn new(
        settings: TriggerSettings,
        store: Arc<dyn ObjectStore>,
        pipelines: Arc<dyn PipelineService>,
    ) -> Self {
        Self {
            settings,
            store,
            pipelines,
        }
    }

    pub fn settings(&self) -> &TriggerSettings {
        &self.settings
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn pipeline_service_name(&self) -> &str {
        self.pipelines.name()
    }

    /// Build the job request for a staged file.
    pub fn build_job_request(
        &self,
        customer_name: &str,
        staged: &StagedObject,
        options: &TriggerOptions,
        now: DateTime<Utc>,
    ) -> JobRequest {
        let trigger = &self.settings.trigger;
        let date = trigger.date_stamp.then(|| now.date_naive());
        let display_name = job_display_name(&trigger.job_name_prefix, customer_name, date);
        let job_id = pipeline_job_id(&display_name, now);

        let mut parameter_values = BTreeMap::new();
        parameter_values.insert("gcs_source_uri".to_string(), json!(staged.uri()));
        parameter_values.insert("project".to_string(), json!(self.settings.project_id));
        parameter_values.insert("region".to_string(), json!(self.settings.region));
        parameter_values.insert("customer_name".to_string(), json!(customer_name));
        parameter_values.insert("bucket_name".to_string(), json!(self.settings.bucket_name));
        parameter_values.insert(
            "training_budget_milli_node_hours".to_string(),
            json!(training_budget_milli_node_hours(options.training_budget_hours)),
        );
        if let Some(horizon) = options.forecast_horizon {
            parameter_values.insert("forecast_horizon".to_string(), json!(horizon));
        }

        JobRequest {
            job_id,
            display_name,
            template_uri: self.settings.template_uri.clone(),
            parameter_values,
            enable_caching: trigger.enable_caching,
            service_account: self.settings.service_account.clone(),
        }
    }

    /// Check the batch before any cloud call is made.
    pub fn validate(&self, uploads: &[Upload], options: &TriggerOptions) -> Result<(), TriggerError> {
        options.validate()?;

        if uploads.is_empty() {
            return Err(TriggerError::NoFiles);
        }

        for upload in uploads {
            let reject = |reason: &str| TriggerError::InvalidUpload {
                filename: upload.filename.clone(),
                reason: reason.to_string(),
            };

            if upload.filename.trim().is_empty() {
                return Err(reject("filename is empty"));
            }
            if upload.filename.contains(['/', '\\']) {
                return Err(reject("filename must not contain path separators"));
            }
            if self.settings.trigger.csv_only && !has_csv_extension(&upload.filename) {
                return Err(reject("only .csv files are accepted"));
            }
        }

        Ok(())
    }

    /// Stage every upload and submit its pipeline run, in order.
    ///
    /// Returns the updated history together with the per-file outcomes, or
    /// the first error. Records for files handled before an error stay in
    /// the returned history.
    pub async fn trigger(
        &self,
        mut history: TriggerHistory,
        uploads: Vec<Upload>,
        options: &TriggerOptions,
    ) -> (TriggerHistory, Result<Vec<TriggerOutcome>, TriggerError>) {
        if let Err(e) = self.validate(&uploads, options) {
            warn!("Rejected trigger request: {}", e);
            return (history, Err(e));
        }

        FILES_PER_REQUEST.observe(uploads.len() as f64);
        info!(
            "Triggering pipelines for {} file(s), budget {}h",
            uploads.len(),
            options.training_budget_hours
        );

        let mut outcomes = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.trigger_one(&mut history, upload, options).await {
                Ok(outcome) => {
                    TRIGGERS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
                    outcomes.push(outcome);
                }
                Err(e) => {
                    TRIGGERS_TOTAL.with_label_values(&["failed"]).inc();
                    error!("Trigger batch aborted: {}", e);
                    return (history, Err(e));
                }
            }
        }

        (history, Ok(outcomes))
    }

    async fn trigger_one(
        &self,
        history: &mut TriggerHistory,
        upload: Upload,
        options: &TriggerOptions,
    ) -> Result<TriggerOutcome, TriggerError> {
        let customer = customer_name(&upload.filename).to_string();

        if self.settings.trigger.duplicate_policy == DuplicatePolicy::Skip
            && history.contains(&customer)
        {
            info!("Skipping {}: already triggered in this session", customer);
            return Ok(TriggerOutcome::SkippedDuplicate {
                filename: upload.filename,
                customer_name: customer,
            });
        }

        let staged = stage_upload(self.store.as_ref(), &upload.filename, &upload.content)
            .await
            .map_err(|source| TriggerError::Storage {
                filename: upload.filename.clone(),
                source,
            })?;

        let request = self.build_job_request(&customer, &staged, options, Utc::now());
        let display_name = request.display_name.clone();

        let handle = self
            .pipelines
            .submit(request)
            .await
            .map_err(|source| TriggerError::Pipeline {
                customer_name: customer.clone(),
                source,
            })?;

        let link = console_link(&self.settings.region, &handle.job_id, &self.settings.project_id);
        info!("Triggered pipeline for {}: {}", customer, link);

        history.add(TriggerRecord::triggered(customer.clone(), link.clone()));

        Ok(TriggerOutcome::Triggered {
            filename: upload.filename,
            customer_name: customer,
            gcs_uri: staged.uri(),
            job_id: handle.job_id,
            display_name,
            link,
        })
    }
}

fn has_csv_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("csv"))
}
