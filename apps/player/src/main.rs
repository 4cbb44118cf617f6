use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use shared::{domain::DeviceClass, protocol::TourEvent};
use speech_integration::{SimulatedSynthesizer, SpeechSynthesizer};
use tokio_stream::wrappers::BroadcastStream;
use tour_engine::{load_config, ControlSurface, DocumentSurface, TourController, Viewport};
use tracing::info;

mod document;

use document::{parse_sections, LoggingControls, SimulatedPage, SimulatedViewport};

/// Plays an autoplaying guided tour over a plain-text document, printing
/// tour events as JSON lines.
#[derive(Parser, Debug)]
struct Args {
    /// Document to tour; sections are blank-line separated blocks.
    document: PathBuf,
    /// Skip the countdown and start narrating immediately.
    #[arg(long)]
    sound: bool,
    /// Simulated viewport width; narrow widths pick the compact pacing profile.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,
    /// Compress every pause tenfold, for quick demos.
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.document)
        .with_context(|| format!("failed to read document '{}'", args.document.display()))?;
    let sections = parse_sections(&raw).context("document is not tourable")?;
    info!(sections = sections.len(), "document loaded");

    let device = DeviceClass::from_viewport_width(args.width);
    let mut config = load_config(device);
    if args.fast {
        compress_pacing(&mut config);
    }
    let attention_delay = config.quick_menu_attention_delay;
    let footer_glide = config.footer_scroll_duration;

    let page = SimulatedPage::new(sections);
    let viewport = SimulatedViewport::new(device, page.content_height());
    let controller = TourController::new(
        config,
        page as Arc<dyn DocumentSurface>,
        viewport as Arc<dyn Viewport>,
        Arc::new(LoggingControls) as Arc<dyn ControlSurface>,
        Arc::new(SimulatedSynthesizer::default()) as Arc<dyn SpeechSynthesizer>,
    );

    let mut events = BroadcastStream::new(controller.subscribe_events());
    if args.sound {
        controller.start(true).await;
    } else {
        controller.begin_countdown().await;
    }

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(_lagged) => continue,
        };
        println!("{}", serde_json::to_string(&event)?);
        if event == TourEvent::RunCompleted {
            break;
        }
    }

    // let the footer glide finish and the quick menu demand its attention
    tokio::time::sleep(footer_glide + attention_delay + Duration::from_millis(200)).await;
    Ok(())
}

fn compress_pacing(config: &mut tour_engine::TourConfig) {
    config.min_pause /= 10;
    config.max_pause /= 10;
    config.scroll_duration /= 10;
    config.post_scroll_settle /= 10;
    config.footer_scroll_duration /= 10;
    config.restart_settle /= 10;
    config.quick_menu_attention_delay /= 10;
}
