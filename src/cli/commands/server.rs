use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_server_config, save_server_config, ServerConfig};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at an API server")]
    Set {
        #[arg(help = "Server URL, e.g. https://campus.example.com")]
        url: String,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Check server health via /health")]
    Health,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let server = ServerConfig::new(&url)?;
            save_server_config(&server)?;
            output_success(output_format, &format!("Server set to {}", server.url), Some(json!({ "url": server.url })))
        }
        ServerCommands::Show => {
            let server = load_server_config()?;
            output_value(output_format, &serde_json::to_value(&server)?)
        }
        ServerCommands::Health => {
            let client = ApiClient::anonymous()?;
            let (status, body) = client.health().await?;
            match output_format {
                OutputFormat::Json => output_value(output_format, &body)?,
                OutputFormat::Text => println!("{} -> {}", client.base_url(), status),
            }
            if !status.is_success() {
                anyhow::bail!("Server reported {}", status);
            }
            Ok(())
        }
    }
}
