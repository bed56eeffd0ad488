use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use worklist::model::{DicomCatalog, StudyRow};
use worklist::publisher::MemoryNavigator;
use worklist::session::MemorySessionStorage;
use worklist::utils::truncate_cell;
use worklist::{Environment, Message, WorkList, WorklistConfig};

/// Lists the studies found in a directory of DICOM files.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Directory scanned recursively for DICOM instances.
    dir: PathBuf,

    /// Worklist query string, e.g. "?patientname=Doe&modalities=CT,MR".
    #[arg(long, default_value = "")]
    query: String,

    /// TOML file overriding the worklist defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Row keys to expand (repeatable).
    #[arg(long = "expand")]
    expand: Vec<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> worklist::Result<()> {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => WorklistConfig::load(path)?,
        None => WorklistConfig::default(),
    };

    let catalog = Arc::new(DicomCatalog::scan(&args.dir)?);
    let navigator = Arc::new(MemoryNavigator::new());
    let environment = Environment {
        data_source: catalog,
        session_storage: Arc::new(MemorySessionStorage::new()),
        navigator: navigator.clone(),
    };

    let mut worklist = WorkList::mount(config, &args.query, environment);
    worklist.refresh_studies().await;

    for row_key in args.expand {
        if let Some(fetch) = worklist.update(Message::ToggleRow(row_key)) {
            if let Err(err) = fetch.await {
                log::warn!("Series fetch for row {row_key} did not complete: {err}");
            }
        }
    }

    println!(
        "{} studies{}",
        worklist.displayed_total(),
        if worklist.can_sort() { "" } else { " (unsorted)" }
    );
    for row in worklist.visible_rows() {
        print_row(&row);
    }

    worklist.settled().await;
    if let Some(location) = navigator.current() {
        println!("location: {}", location.href());
    }
    worklist.unload();

    Ok(())
}

fn print_row(row: &StudyRow) {
    let arrow = if row.is_expanded { "▼" } else { "▶" };
    println!(
        "{arrow} {:>3}  {:<24} {:<12} {:<11} {:<8} {:<24} {:<8} {:<12} {}",
        row.row_key,
        row.patient_name.as_deref().unwrap_or_default(),
        row.mrn.as_deref().unwrap_or_default(),
        row.study_date.as_deref().unwrap_or_default(),
        row.study_time.as_deref().unwrap_or_default(),
        truncate_cell(row.description.as_deref().unwrap_or_default()),
        row.modalities.join("/"),
        row.accession.as_deref().unwrap_or_default(),
        row.instances,
    );
    for series in &row.series {
        println!(
            "        {:>4}  {:<6} {:<40} {}",
            series.series_number,
            series.modality,
            truncate_cell(&series.description),
            series.instances
        );
    }
}
