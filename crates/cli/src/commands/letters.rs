//! Letter and email commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use agent_portal_client::api::Letter;
use agent_portal_client::{HOME_ROUTE, PortalClient};

use super::{guard, parse_pairs};
use crate::error::CliError;
use crate::output;

#[derive(Args)]
pub struct LetterArgs {
    /// Template name, e.g. `offer_letter` or `confirmation_letter`
    template: String,

    /// Template field as key=value (repeatable)
    #[arg(short, long = "field")]
    fields: Vec<String>,

    /// Where to save a document letter (default: the server's file name)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
pub struct EmailArgs {
    /// Recipient address
    #[arg(long)]
    to: String,

    #[arg(short, long)]
    subject: String,

    /// Message body
    #[arg(short, long)]
    body: String,
}

pub async fn letter(client: &PortalClient, args: LetterArgs) -> Result<(), CliError> {
    guard(client, HOME_ROUTE)?;
    let fields: BTreeMap<String, String> = parse_pairs(&args.fields)?.into_iter().collect();

    match client.api().generate_letter(&args.template, &fields).await? {
        Letter::Text(content) => output::line(content),
        Letter::Document { filename, bytes } => {
            let path = args.output.unwrap_or_else(|| PathBuf::from(filename));
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|source| CliError::Write {
                    path: path.clone(),
                    source,
                })?;
            output::line(format!("saved {} ({} bytes)", path.display(), bytes.len()));
        }
    }
    Ok(())
}

pub async fn email(client: &PortalClient, args: EmailArgs) -> Result<(), CliError> {
    guard(client, HOME_ROUTE)?;
    client
        .api()
        .send_email(&args.to, &args.subject, &args.body)
        .await?;
    output::line(format!("sent to {}", args.to));
    Ok(())
}
