//! CLI execution runner.
//!
//! Wires settings, providers, history, and the coordinator together, runs
//! the requested passes against one image file, and renders the final
//! session.

use std::path::Path;
use std::sync::Arc;

use crate::analysis::{GeminiClient, TavilyCorroborator};
use crate::error::{GeolensError, Result};
use crate::history::{HistoryCache, HistoryStore};
use crate::image::ImagePayload;
use crate::model::AnalysisResult;
use crate::pipeline::{PipelineCoordinator, SessionView};
use crate::settings;

use super::args::Args;

pub async fn run(args: Args) -> Result<()> {
    init_logging(&args);
    load_env_file();

    let settings_path = settings::settings_path();
    if let Err(e) = settings::ensure_settings_file(&settings_path) {
        tracing::warn!("Failed to create settings template: {e}");
    }

    let mut settings = settings::load_from_path(&settings_path)?;
    // CLI argument takes precedence over settings and env vars
    if args.api_key.is_some() {
        settings.api_keys.gemini = args.api_key.clone();
    }

    if args.verbose {
        eprintln!("[cli] Settings loaded from {}", settings_path.display());
        eprintln!("[cli] Quick model: {}", settings.analysis.quick_model);
        eprintln!("[cli] Deep model: {}", settings.analysis.deep_model);
    }

    let analysis = Arc::new(GeminiClient::from_settings(&settings)?);
    let corroboration = if args.no_search || !settings.analysis.corroboration {
        Arc::new(TavilyCorroborator::new(None))
    } else {
        Arc::new(TavilyCorroborator::from_settings(&settings))
    };
    if args.verbose && !corroboration.is_available() {
        eprintln!("[cli] No Tavily key, corroboration will use the fallback text");
    }

    let history_path = match &settings.history.dir {
        Some(dir) => Path::new(dir).join("history.json"),
        None => HistoryStore::default_path(),
    };
    let history = Arc::new(HistoryCache::open(HistoryStore::new(history_path)));
    let coordinator = Arc::new(PipelineCoordinator::new(analysis, corroboration, history));

    let image = read_image(&args.image)?;
    coordinator.submit_image(image);

    let progress_task = if args.quiet || args.json {
        None
    } else {
        let mut rx = coordinator.progress().subscribe();
        Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                if !snapshot.message.is_empty() {
                    eprintln!("[{:>3}%] {}", snapshot.percent, snapshot.message);
                }
            }
        }))
    };

    let run_outcome = async {
        coordinator.start_quick_analysis().await?;
        if args.deep {
            coordinator.start_deep_analysis().await?;
        }
        Ok::<(), GeolensError>(())
    }
    .await;

    if let Some(task) = progress_task {
        task.abort();
    }

    let view = coordinator.view();
    if let Err(e) = run_outcome {
        // The session error carries the user-facing stage message
        if let Some(message) = &view.error {
            eprintln!("{message}");
        }
        if e.is_retryable() {
            eprintln!("This failure may be transient; rerunning the same command can succeed.");
        }
        return Err(e);
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view)
                .map_err(|e| GeolensError::Validation(format!("Failed to render session: {e}")))?
        );
    } else {
        print_human(&view);
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let log_level = if args.verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("geolens={log_level}").parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_env_file() {
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {e}");
        }
    }
}

/// Read an image file into a payload, inferring the MIME type from the
/// extension.
fn read_image(path: &Path) -> Result<ImagePayload> {
    let mime = mime_for(path).ok_or_else(|| {
        GeolensError::Config(format!(
            "Unsupported image type: {} (expected jpg, png, webp, gif, or heic)",
            path.display()
        ))
    })?;

    let bytes = std::fs::read(path)?;
    ImagePayload::from_bytes(mime, &bytes)
        .ok_or_else(|| GeolensError::Validation(format!("Not an image payload: {}", path.display())))
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

fn print_human(view: &SessionView) {
    let Some(result) = &view.result else {
        println!("No result.");
        return;
    };

    println!("Location:   {}", result.location_name);
    println!("Region:     {}", result.region);
    println!("Address:    {}", result.address_guess);
    if result.has_coordinates() {
        if let (Some(lat), Some(lon)) = (result.latitude, result.longitude) {
            println!("Coordinates: {lat:.5}, {lon:.5}");
        }
    } else {
        println!("Coordinates: not pinned");
    }
    println!("Confidence: {}%", result.clamped_confidence());

    print_evidence(result);

    if !result.description.is_empty() {
        println!("\nReasoning:\n{}", result.description);
    }

    if let Some(corroboration) = &view.corroboration {
        println!("\nCorroboration:\n{}", corroboration.text);
        for source in &corroboration.sources {
            println!("  - {} <{}>", source.title, source.uri);
        }
    }

    if let Some(deep) = &result.deep_context {
        println!("\nForensic detail:");
        println!("  Architecture:   {}", deep.architecture);
        println!("  Infrastructure: {}", deep.infrastructure);
        println!("  Vegetation:     {}", deep.vegetation);
        println!("  Signage:        {}", deep.signage);
        println!("  Conclusion:     {}", deep.forensic_conclusion);
    }
}

fn print_evidence(result: &AnalysisResult) {
    if result.visual_evidence.is_empty() {
        return;
    }
    println!("\nEvidence:");
    for clue in &result.visual_evidence {
        println!("  - {} ({}): {}", clue.element, clue.area, clue.observation);
    }
}
