use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::client::ApiClient;
use crate::cli::utils::write_output;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum CalendarCommands {
    #[command(about = "Download exams, assignments and hosted sessions as .ics")]
    Export {
        #[arg(long, help = "Output file (stdout when omitted)")]
        out: Option<PathBuf>,
    },
}

pub async fn handle(cmd: CalendarCommands, _output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        CalendarCommands::Export { out } => {
            let ics = ApiClient::authenticated().await?.get_text("/api/calendar.ics").await?;
            write_output(out.as_deref(), &ics)
        }
    }
}
