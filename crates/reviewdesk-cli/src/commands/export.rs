//! Export command implementation.

use crate::cli::ExportArgs;
use crate::error::Result;
use crate::output::Formatter;
use reviewdesk_client::ReviewApiClient;
use reviewdesk_domain::api::ExportRequest;
use std::fs;

/// Execute the export command.
///
/// The server only selects records and marks approved ones exported. With
/// `--output` the selection is written as JSON for a spreadsheet tool.
pub async fn execute_export(
    args: ExportArgs,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let request = ExportRequest {
        record_ids: (!args.ids.is_empty()).then_some(args.ids),
        include_rejected: args.include_rejected,
        format: args.export_format,
    };

    let manifest = client.export(&request).await?;

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&manifest.records)?)?;
        println!(
            "{}",
            formatter.info(&format!("Wrote {} record(s) to {}", manifest.records.len(), path.display()))
        );
    }

    println!("{}", formatter.format_export(&manifest)?);
    Ok(())
}
