//! Export coordination
//!
//! Selects the records an external writer should put in a file and moves
//! `approved` records to `exported`. Other selected records are included as
//! they are, so exporting is never exclusive and re-exporting an exported
//! record leaves it untouched.

use crate::service::ReviewService;
use crate::WorkflowError;
use reviewdesk_domain::api::{ExportManifest, ExportRequest, SUPPORTED_FORMATS};
use reviewdesk_domain::traits::RecordStore;
use reviewdesk_domain::{DomainEvent, ExtractionRecord, RecordStatus, ReviewAction};
use reviewdesk_store::StoreError;

/// Runs exports through a [`ReviewService`]
pub struct ExportCoordinator<'a, S> {
    service: &'a ReviewService<S>,
}

impl<'a, S> ExportCoordinator<'a, S>
where
    S: RecordStore<Error = StoreError>,
{
    /// Create a coordinator bound to a service
    pub fn new(service: &'a ReviewService<S>) -> Self {
        Self { service }
    }

    fn select(&self, request: &ExportRequest) -> Result<Vec<ExtractionRecord>, WorkflowError> {
        let store = self.service.lock_store()?;

        match &request.record_ids {
            Some(ids) if !ids.is_empty() => {
                let mut records = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(record) = store.get_record(*id)? {
                        records.push(record);
                    }
                }
                records.sort_by_key(|r| (r.created_at, r.id));
                Ok(records)
            }
            _ => {
                let mut statuses = vec![
                    RecordStatus::Approved,
                    RecordStatus::Edited,
                    RecordStatus::Exported,
                ];
                if request.include_rejected {
                    statuses.push(RecordStatus::Rejected);
                }
                Ok(store.records_with_status(&statuses)?)
            }
        }
    }

    /// Run one export
    pub fn export(
        &self,
        request: &ExportRequest,
        actor: Option<&str>,
    ) -> Result<ExportManifest, WorkflowError> {
        let format = request.format.to_lowercase();
        if !SUPPORTED_FORMATS.contains(&format.as_str()) {
            return Err(WorkflowError::ValidationFailed(format!(
                "Unsupported export format: {}",
                request.format
            )));
        }

        let selected = self.select(request)?;
        if selected.is_empty() {
            return Err(WorkflowError::ValidationFailed(
                "No records to export".to_string(),
            ));
        }

        let mut records = Vec::with_capacity(selected.len());
        let mut exported_ids = Vec::new();

        for record in selected {
            if record.status != RecordStatus::Approved {
                records.push(record);
                continue;
            }

            match self.service.apply_transition(
                record.id,
                Some(RecordStatus::Approved),
                &ReviewAction::Export,
                actor,
            ) {
                Ok(outcome) => {
                    exported_ids.push(outcome.record.id);
                    records.push(outcome.record);
                }
                Err(WorkflowError::Conflict { .. }) => {
                    // Changed since selection; export what is stored now
                    tracing::warn!("Record {} changed during export", record.id);
                    records.push(self.service.get_record(record.id)?);
                }
                Err(e) => return Err(e),
            }
        }

        self.service.with_metrics(|m| m.record_export());
        tracing::info!(
            "Export to {} finished: {} records, {} newly exported",
            format,
            records.len(),
            exported_ids.len()
        );

        self.service.publish(DomainEvent::export_complete(
            &format,
            records.len(),
            &exported_ids,
        ));

        Ok(ExportManifest {
            format,
            records,
            exported_ids,
        })
    }
}
