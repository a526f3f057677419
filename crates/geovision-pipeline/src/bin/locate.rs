//! GeoVision Locate
//!
//! Run the two-stage geolocation pipeline against a local photograph.
//!
//! Usage:
//!   cargo run --bin geovision-locate -- photo.jpg
//!   cargo run --bin geovision-locate -- photo.jpg --lat 48.85 --lng 2.29
//!   cargo run --bin geovision-locate -- photo.png --json
//!
//! Environment:
//!   GEMINI_API_KEY  - service key (falls back to API_KEY)
//!   RUST_LOG        - tracing filter (default: "geovision=info")
//!   LOG_FORMAT      - "json" or "text" (default: "text")

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use geovision_core::{AnalysisState, AnalysisStep, Image, UserCoordinates};
use geovision_inference::GeminiBackend;
use geovision_pipeline::{fetch_greeting, AnalysisPipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default)]
struct Args {
    image_path: Option<PathBuf>,
    lat: Option<f64>,
    lng: Option<f64>,
    json: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--lat" => {
                i += 1;
                result.lat = Some(parse_degrees(args.get(i), "--lat")?);
            }
            "--lng" | "--lon" => {
                i += 1;
                result.lng = Some(parse_degrees(args.get(i), "--lng")?);
            }
            "--json" => result.json = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            path => {
                if result.image_path.is_some() {
                    return Err(format!("Unexpected argument: {}", path));
                }
                result.image_path = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    if result.lat.is_some() != result.lng.is_some() {
        return Err("--lat and --lng must be given together".to_string());
    }
    Ok(result)
}

fn parse_degrees(value: Option<&String>, flag: &str) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("{} expects a number, got {}", flag, value))
}

fn print_help() {
    println!(
        r#"GeoVision Locate

USAGE:
    geovision-locate <IMAGE> [OPTIONS]

OPTIONS:
    --lat <DEG>     Latitude of the user's current position (hint)
    --lng <DEG>     Longitude of the user's current position (hint)
    --json          Print the final state as JSON
    -h, --help      Print help information
"#
    );
}

/// Mime type from the file extension; empty lets the image sniff its bytes.
fn mime_from_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "",
    }
}

fn init_tracing() {
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "geovision=info".into());

    // Logs go to stderr so stdout stays clean for --json.
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_state(state: &AnalysisState) {
    match state.step {
        AnalysisStep::Done => {
            let Some(result) = &state.location_result else {
                return;
            };
            println!("\n== Description ==\n{}", state.description);
            println!("\n== Location ==\n{}", result.text.trim());
            match &result.coordinates {
                Some(coords) => println!("\nCoordinates: {}, {}", coords.lat, coords.lng),
                None => println!("\nCoordinates: not found"),
            }
            if let Some(link) = result.map_link() {
                println!("Map: {}", link);
            }
            for citation in &result.citations {
                println!("  [{}] {}", citation.display_title(), citation.uri());
            }
        }
        AnalysisStep::Error => {
            if !state.description.is_empty() {
                println!("\n== Description ==\n{}", state.description);
            }
            eprintln!("\n{}", state.error.as_deref().unwrap_or_default());
        }
        _ => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_help();
            return ExitCode::FAILURE;
        }
    };
    let Some(image_path) = args.image_path else {
        print_help();
        return ExitCode::FAILURE;
    };

    let backend = match GeminiBackend::from_env() {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to create Gemini backend: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let bytes = match tokio::fs::read(&image_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", image_path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let image = match Image::from_bytes(&bytes, mime_from_extension(&image_path)) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Unusable image {}: {}", image_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = AnalysisPipeline::new(Arc::new(backend));
    if !args.json {
        println!("{}", fetch_greeting(pipeline.gateway().as_ref()).await);
    }

    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        pipeline
            .set_user_coordinates(UserCoordinates::new(lat, lng))
            .await;
    }
    pipeline.select_image(image).await;

    let progress = if args.json {
        None
    } else {
        let mut rx = pipeline.subscribe();
        Some(tokio::spawn(async move {
            while let Ok(change) = rx.recv().await {
                match change.step() {
                    AnalysisStep::Analyzing => println!("Analyzing image..."),
                    AnalysisStep::Locating => println!("Searching maps..."),
                    AnalysisStep::Done | AnalysisStep::Error => break,
                    AnalysisStep::Idle => {}
                }
            }
        }))
    };

    let state = match pipeline.start().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(progress) = progress {
        let _ = progress.await;
    }

    if args.json {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_state(&state);
    }

    if state.step == AnalysisStep::Done {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
