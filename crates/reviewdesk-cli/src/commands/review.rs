//! Approve, reject and edit commands.
//!
//! A single id goes through the per-record endpoint; several ids go through
//! the batch endpoint so each item succeeds or fails on its own.

use crate::cli::{ApproveArgs, EditArgs, RejectArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reviewdesk_client::ReviewApiClient;
use reviewdesk_domain::record::FieldMap;

/// Execute the approve command.
pub async fn execute_approve(
    args: ApproveArgs,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    if let [id] = args.ids.as_slice() {
        let record = client.approve(*id, args.notes).await?;
        println!("{}", formatter.format_updated("Approved", &record)?);
    } else {
        let result = client.approve_batch(args.ids, args.notes).await?;
        println!("{}", formatter.format_batch(&result)?);
    }
    Ok(())
}

/// Execute the reject command.
pub async fn execute_reject(
    args: RejectArgs,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    if args.reason.trim().is_empty() {
        return Err(CliError::InvalidInput(
            "A rejection reason is required".to_string(),
        ));
    }

    if let [id] = args.ids.as_slice() {
        let record = client.reject(*id, &args.reason).await?;
        println!("{}", formatter.format_updated("Rejected", &record)?);
    } else {
        let result = client.reject_batch(args.ids, &args.reason).await?;
        println!("{}", formatter.format_batch(&result)?);
    }
    Ok(())
}

/// Execute the edit command.
pub async fn execute_edit(
    args: EditArgs,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let data = parse_data(&args.data)?;
    let record = client.edit(args.id, data, args.notes).await?;
    println!("{}", formatter.format_updated("Edited", &record)?);
    Ok(())
}

/// Parse `--data` into a field map; anything but a JSON object is rejected.
fn parse_data(raw: &str) -> Result<FieldMap> {
    match serde_json::from_str(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(CliError::InvalidInput(format!(
            "Edit data must be a JSON object, got {}",
            other
        ))),
    }
}
