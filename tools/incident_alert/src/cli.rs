use clap::{Args, Parser, Subcommand, ValueEnum};
use incident_alert_core::state::UrlKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "incident-alert",
    version,
    about = "Builds CDN incident alert documents from a form snapshot"
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "INCIDENT_ALERT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Block every outbound request.
    #[arg(long, global = true)]
    pub offline: bool,
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the incident alert `.docx`.
    Generate(GenerateArgs),
    /// Summarize a PDF report into the snapshot's incident description.
    Summarize(SummarizeArgs),
    /// Merge URL records from a Google Sheet into a URL list file.
    Sheets(SheetsArgs),
    /// Run a sheets service job directly on a shared Google Sheet.
    SheetJob(SheetJobArgs),
    /// Export the snapshot's observables as CSV.
    Observables(ObservablesArgs),
    /// Print the structure of a produced `.docx` as JSON.
    Inspect(InspectArgs),
    /// Manage the cached summarizer API key.
    ApiKey(ApiKeyArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Form snapshot (JSON).
    #[arg(long)]
    pub form: PathBuf,
    /// Navigator layer export to import objectives and TTPs from.
    #[arg(long, conflicts_with = "picker_events")]
    pub navigator: Option<PathBuf>,
    /// Technique picker events, one JSON object per line.
    #[arg(long)]
    pub picker_events: Option<PathBuf>,
    #[arg(long)]
    pub logo: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Also write the HTML preview.
    #[arg(long)]
    pub html: bool,
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// PDF report URL.
    #[arg(long)]
    pub url: String,
    /// Snapshot to update in place.
    #[arg(long)]
    pub form: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Trusted,
    Malicious,
}

impl From<KindArg> for UrlKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Trusted => UrlKind::Trusted,
            KindArg::Malicious => UrlKind::Malicious,
        }
    }
}

#[derive(Debug, Args)]
pub struct SheetsArgs {
    #[arg(long)]
    pub sheet_url: String,
    #[arg(long, value_enum, default_value_t = KindArg::Trusted)]
    pub kind: KindArg,
    /// URL list file to merge into; defaults to `<kind>-urls.json`.
    #[arg(long)]
    pub urls: Option<PathBuf>,
    /// Derive empty domains or channels from each URL after merging.
    #[arg(long)]
    pub fill_unspecified: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SheetJob {
    /// Report whether the service account can write to the sheet.
    CheckPermission,
    /// Fill empty domain or channel cells.
    Extract,
    /// Archive URLs that have no archive link yet.
    Archive,
}

#[derive(Debug, Args)]
pub struct SheetJobArgs {
    #[arg(value_enum)]
    pub job: SheetJob,
    #[arg(long)]
    pub sheet_url: String,
    #[arg(long, value_enum, default_value_t = KindArg::Trusted)]
    pub kind: KindArg,
    /// Ask the archive job to check each URL before submitting it.
    #[arg(long)]
    pub pre_validation: bool,
}

#[derive(Debug, Args)]
pub struct ObservablesArgs {
    #[arg(long)]
    pub form: PathBuf,
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ApiKeyArgs {
    #[command(subcommand)]
    pub command: ApiKeyCommand,
}

#[derive(Debug, Subcommand)]
pub enum ApiKeyCommand {
    Set { key: String },
    Show,
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_navigator_and_picker_conflict() {
        let r = Cli::try_parse_from([
            "incident-alert",
            "generate",
            "--form",
            "f.json",
            "--navigator",
            "n.json",
            "--picker-events",
            "p.ndjson",
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["incident-alert", "inspect", "a.docx", "--offline"]).unwrap();
        assert!(cli.offline);
        assert!(matches!(cli.command, Command::Inspect(_)));
    }
}
