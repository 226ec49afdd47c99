//! Read-only record commands.

use crate::cli::ListArgs;
use crate::error::Result;
use crate::output::Formatter;
use reviewdesk_client::ReviewApiClient;
use reviewdesk_domain::traits::RecordQuery;
use reviewdesk_domain::RecordId;

/// Execute the list command.
pub async fn execute_list(
    args: ListArgs,
    page_size: usize,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let query = RecordQuery {
        status: args.status,
        record_type: args.record_type,
        offset: args.offset,
        limit: Some(args.limit.unwrap_or(page_size)),
    };

    let page = client.list_records(&query).await?;
    println!("{}", formatter.format_page(&page)?);
    Ok(())
}

/// Execute the stats command.
pub async fn execute_stats(client: &ReviewApiClient, formatter: &Formatter) -> Result<()> {
    let stats = client.stats().await?;
    println!("{}", formatter.format_stats(&stats)?);
    Ok(())
}

/// Execute the show command.
pub async fn execute_show(
    id: RecordId,
    client: &ReviewApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let record = client.get_record(id).await?;
    let trail = client.audit_trail(id).await?;
    println!("{}", formatter.format_record(&record, &trail)?);
    Ok(())
}
