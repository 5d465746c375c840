use crate::cli::{
    ApiKeyCommand, Cli, Command, GenerateArgs, ObservablesArgs, SheetJob, SheetJobArgs, SheetsArgs,
    SummarizeArgs,
};
use crate::progress::{SpinnerObserver, TerminalEditor};
use anyhow::{Context, Result};
use incident_alert_core::config::AppConfig;
use incident_alert_core::docx::inspect_docx;
use incident_alert_core::form::validate::validate_sheets_url;
use incident_alert_core::form::FormSnapshot;
use incident_alert_core::generate::{generate_report, GenerateOptions};
use incident_alert_core::keycache::KeyCache;
use incident_alert_core::policy::egress::EgressClient;
use incident_alert_core::render::{observables_file_name, render_observables_csv};
use incident_alert_core::sheets::{import_sheet, SheetsClient, NO_WRITE_ACCESS};
use incident_alert_core::state::{AppState, ImageLogo, UrlKind, UrlList};
use incident_alert_core::summarizer::{Summarizer, DESCRIPTION_FIELD};
use incident_alert_core::techniques::picker::parse_events;
use incident_alert_core::techniques::{import_navigator, PickerSession, TechniqueClient};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;

pub fn run(cli: Cli) -> Result<()> {
    let mut cfg = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.offline {
        cfg.network.offline = true;
    }
    match cli.command {
        Command::Generate(args) => generate(&cfg, args),
        Command::Summarize(args) => summarize(&cfg, args),
        Command::Sheets(args) => sheets(&cfg, args),
        Command::SheetJob(args) => sheet_job(&cfg, args),
        Command::Observables(args) => observables(args),
        Command::Inspect(args) => {
            let bytes = read(&args.file)?;
            let report = inspect_docx(&bytes)
                .with_context(|| format!("inspecting {}", args.file.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::ApiKey(args) => api_key(&cfg, args.command),
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn read_snapshot(path: &Path) -> Result<(FormSnapshot, String)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshot = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid form snapshot", path.display()))?;
    Ok((snapshot, text))
}

fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Writes a temp file beside `path` and renames it into place, so the old
/// content stays intact until the new content is complete.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating a temporary file in {}", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn generate(cfg: &AppConfig, args: GenerateArgs) -> Result<()> {
    let client = EgressClient::from_config(&cfg.network)?;
    let (snapshot, snapshot_text) = read_snapshot(&args.form)?;
    let mut state = AppState::new();

    if let Some(path) = &args.navigator {
        let titles = TechniqueClient::new(&client, &cfg.network);
        let summary = import_navigator(&mut state, &read(path)?, &titles)?;
        eprintln!(
            "Imported {} objectives and {} TTPs ({} unscored techniques skipped)",
            summary.objectives, summary.ttps, summary.skipped
        );
    }
    if let Some(path) = &args.picker_events {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let events = parse_events(&text)?;
        let mut session = PickerSession::open(&mut state)?;
        for event in &events {
            session.apply(event);
        }
        let info = session.finish();
        eprintln!("{}", info);
        if info.at_cap() {
            eprintln!("Recommended limits reached: at most 2 objectives and 4 TTPs");
        }
    }
    if let Some(path) = &args.logo {
        state.set_logo(ImageLogo::from_path(path)?);
    }

    let report = generate_report(
        &mut state,
        &client,
        cfg,
        GenerateOptions {
            snapshot: &snapshot,
            snapshot_text: &snapshot_text,
            today: OffsetDateTime::now_utc().date(),
            with_html: args.html,
        },
    )
    .context("generating the incident alert")?;

    for w in &report.warnings {
        eprintln!("warning: {} ({}): {}", w.field, w.value, w.message);
    }
    let path = write_output(&args.out, &report.docx.file_name, &report.docx.bytes)?;
    println!("{} sha256={}", path.display(), report.docx.sha256);
    if let Some(html) = &report.html {
        let path = write_output(&args.out, &html.file_name, html.html.as_bytes())?;
        println!("{}", path.display());
    }
    Ok(())
}

fn summarize(cfg: &AppConfig, args: SummarizeArgs) -> Result<()> {
    let client = EgressClient::from_config(&cfg.network)?;
    let (mut snapshot, text) = read_snapshot(&args.form)?;
    let api_key = KeyCache::new(&cfg.storage.state_dir).get()?;
    let state = AppState::new();
    let summarizer = Summarizer::new(&client, &cfg.network, &cfg.summarizer, api_key);

    let mut observer = SpinnerObserver::new();
    let outcome = summarizer.run(&state, &mut snapshot, &args.url, &mut observer)?;

    replace_file(&args.form, patch_description(&text, &snapshot.incident_description)?.as_bytes())?;
    info!(
        source = outcome.source.as_str(),
        pages = outcome.pages,
        skipped = outcome.skipped_pages.len(),
        "incident description updated"
    );
    println!("{}", outcome.summary);
    Ok(())
}

/// Rewrites only the description field; unknown fields in the file survive.
fn patch_description(text: &str, description: &str) -> Result<String> {
    let mut doc: serde_json::Value = serde_json::from_str(text)?;
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(
            DESCRIPTION_FIELD.to_string(),
            serde_json::Value::String(description.to_string()),
        );
    }
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn sheets(cfg: &AppConfig, args: SheetsArgs) -> Result<()> {
    let kind: UrlKind = args.kind.into();
    let path = args
        .urls
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}-urls.json", kind)));
    let mut state = AppState::new();
    if path.exists() {
        let list: UrlList = serde_json::from_slice(&read(&path)?)
            .with_context(|| format!("{} is not a URL list", path.display()))?;
        *state.urls_mut(kind) = UrlList { kind, ..list };
    }

    let client = EgressClient::from_config(&cfg.network)?;
    let sheets = SheetsClient::new(&client, &cfg.network);
    let mut editor = TerminalEditor;
    match import_sheet(&mut state, &sheets, &mut editor, kind, &args.sheet_url)? {
        Some(report) => {
            if args.fill_unspecified {
                let filled = state.urls_mut(kind).fill_unspecified();
                info!(kind = %kind, filled, "unspecified labels filled");
            }
            replace_file(&path, &serde_json::to_vec_pretty(state.urls(kind))?)?;
            println!("{}", report.message(kind));
        }
        None => eprintln!("Cancelled"),
    }
    Ok(())
}

fn sheet_job(cfg: &AppConfig, args: SheetJobArgs) -> Result<()> {
    let kind: UrlKind = args.kind.into();
    let sheet_url = validate_sheets_url(&args.sheet_url)?;
    let client = EgressClient::from_config(&cfg.network)?;
    let sheets = SheetsClient::new(&client, &cfg.network);
    match args.job {
        SheetJob::CheckPermission => {
            if sheets.check_write_permission(&sheet_url)? {
                println!("The sheets service can edit this sheet");
            } else {
                println!("{}", NO_WRITE_ACCESS);
            }
        }
        SheetJob::Extract => {
            let summary = sheets.extract_unspecified(kind, &sheet_url)?;
            println!("{}", summary.report(kind));
        }
        SheetJob::Archive => {
            let summary = sheets.archive_unarchived(
                &sheet_url,
                args.pre_validation,
                cfg.network.archive_timeout(),
            )?;
            println!("{}", summary.report());
        }
    }
    Ok(())
}

fn observables(args: ObservablesArgs) -> Result<()> {
    let (snapshot, _) = read_snapshot(&args.form)?;
    let csv = render_observables_csv(&snapshot.observables)?;
    let path = write_output(&args.out, &observables_file_name(&snapshot.title), csv.as_bytes())?;
    println!("{}", path.display());
    Ok(())
}

fn api_key(cfg: &AppConfig, command: ApiKeyCommand) -> Result<()> {
    let cache = KeyCache::new(&cfg.storage.state_dir);
    match command {
        ApiKeyCommand::Set { key } => {
            cache.set(&key)?;
            println!("API key saved to {}", cache.path().display());
        }
        ApiKeyCommand::Show => match cache.show_masked()? {
            Some(masked) => println!("{}", masked),
            None => println!("No API key cached"),
        },
        ApiKeyCommand::Clear => {
            if cache.clear()? {
                println!("API key cleared");
            } else {
                println!("No API key cached");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keeps_unknown_fields() {
        let text = r#"{"title": "Wave 2", "draftNotes": "keep me", "incidentDescription": "old"}"#;
        let out: serde_json::Value =
            serde_json::from_str(&patch_description(text, "new summary").unwrap()).unwrap();
        assert_eq!(out["incidentDescription"], "new summary");
        assert_eq!(out["draftNotes"], "keep me");
        assert_eq!(out["title"], "Wave 2");
    }

    #[test]
    fn test_replace_file_swaps_content_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let form = dir.path().join("form.json");
        std::fs::write(&form, r#"{"incidentDescription": "old"}"#).unwrap();

        let patched = patch_description(&std::fs::read_to_string(&form).unwrap(), "new").unwrap();
        replace_file(&form, patched.as_bytes()).unwrap();

        let out: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&form).unwrap()).unwrap();
        assert_eq!(out["incidentDescription"], "new");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("form.json")]);
    }

    #[test]
    fn test_observables_written_next_to_title() {
        let dir = tempfile::tempdir().unwrap();
        let form = dir.path().join("form.json");
        std::fs::write(
            &form,
            r#"{"title": "Bot Wave", "observables": [{"platform": "X", "type": "account",
                "identifier": "@bot", "details": "line one\nline two", "evidenceLink": ""}]}"#,
        )
        .unwrap();
        let out = dir.path().join("out");

        observables(ObservablesArgs {
            form,
            out: out.clone(),
        })
        .unwrap();

        let csv = std::fs::read_to_string(out.join(observables_file_name("Bot Wave"))).unwrap();
        assert!(csv.contains("\"line one line two\""));
    }
}
