use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List rows of a table")]
    List {
        #[arg(help = "Table name")]
        table: String,
        #[arg(long, help = "Maximum rows")]
        limit: Option<i32>,
        #[arg(long, help = "Order, e.g. \"created_at desc\"")]
        order: Option<String>,
        #[arg(long = "where", help = "JSON filter, sent to /api/find")]
        where_clause: Option<String>,
    },

    #[command(about = "Fetch one row")]
    Get {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Row id")]
        id: String,
    },

    #[command(about = "Create a row from a JSON object")]
    Create {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "JSON object with column values")]
        json: String,
    },

    #[command(about = "Delete a row")]
    Delete {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Row id")]
        id: String,
    },
}

pub async fn handle(cmd: DataCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated().await?;

    match cmd {
        DataCommands::List { table, limit, order, where_clause } => {
            let rows = match where_clause {
                Some(raw) => {
                    let conditions: Value = serde_json::from_str(&raw).context("--where must be valid JSON")?;
                    let mut filter = serde_json::json!({ "where": conditions });
                    if let Some(limit) = limit {
                        filter["limit"] = limit.into();
                    }
                    if let Some(order) = order {
                        filter["order"] = order.into();
                    }
                    client.post(&format!("/api/find/{}", table), &filter).await?
                }
                None => {
                    let mut path = format!("/api/data/{}", table);
                    let mut params = Vec::new();
                    if let Some(limit) = limit {
                        params.push(format!("limit={}", limit));
                    }
                    if let Some(order) = order {
                        params.push(format!("order={}", url::form_urlencoded::byte_serialize(order.as_bytes()).collect::<String>()));
                    }
                    if !params.is_empty() {
                        path = format!("{}?{}", path, params.join("&"));
                    }
                    client.get(&path).await?
                }
            };
            output_value(output_format, &rows)
        }
        DataCommands::Get { table, id } => {
            output_value(output_format, &client.get(&format!("/api/data/{}/{}", table, id)).await?)
        }
        DataCommands::Create { table, json } => {
            let body: Value = serde_json::from_str(&json).context("Row must be valid JSON")?;
            let row = client.post(&format!("/api/data/{}", table), &body).await?;
            let message = format!("Created {} row {}", table, row["id"].as_str().unwrap_or_default());
            output_success(output_format, &message, Some(row))
        }
        DataCommands::Delete { table, id } => {
            client.delete(&format!("/api/data/{}/{}", table, id)).await?;
            output_success(output_format, &format!("Deleted {} row {}", table, id), None)
        }
    }
}
