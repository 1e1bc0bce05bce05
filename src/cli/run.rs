use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use focus_engine::{FocusCommand, LifecycleController, MetricSnapshot, ToggleOutcome};
use page_port::{DocumentPort, ElementSpec, InMemoryDocument, PageFixture};
use serde::Serialize;
use tokio::fs;
use topic_embedder::EmbedderHandle;
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::cli::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Page fixture (YAML) to load
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Focus topic; derived from the page when omitted
    #[arg(long)]
    pub topic: Option<String>,

    /// Navigate in-page to this URL after the first pass settles
    #[arg(long, requires = "fixture_after")]
    pub navigate: Option<String>,

    /// Body content shown after navigating
    #[arg(long, value_name = "FILE", requires = "navigate")]
    pub fixture_after: Option<PathBuf>,

    /// Longest time to wait for the pipeline to settle, in milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub settle_ms: u64,

    /// Deactivate at the end and report the restored page
    #[arg(long)]
    pub deactivate: bool,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub topic: Option<String>,
    pub location: String,
    pub active: bool,
    pub degraded: bool,
    pub settled: bool,
    pub metrics: MetricSnapshot,
    pub page: Option<ElementSpec>,
}

async fn load_fixture(path: &Path) -> Result<PageFixture> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    config
        .validate()
        .with_context(|| format!("validating {}", ctx.config_path().display()))?;

    let fixture = load_fixture(&args.page).await?;
    let document = Arc::new(
        InMemoryDocument::from_fixture(&fixture)
            .with_context(|| format!("loading {}", args.page.display()))?,
    );
    let embedder = EmbedderHandle::new(Arc::new(config.embedder.build()));
    let port: Arc<dyn DocumentPort> = document.clone();
    let controller = LifecycleController::new(port, embedder, config.engine_config());
    let settle = Duration::from_millis(args.settle_ms);

    let topic = match args.topic.as_deref() {
        Some(topic) => {
            controller.activate(topic).await?;
            controller.session().map(|session| session.topic)
        }
        None => match controller.handle(FocusCommand::ToggleFocusMode).await? {
            ToggleOutcome::Activated(topic) => Some(topic),
            ToggleOutcome::NoTopic => {
                warn!("No topic given and none could be derived from {}", fixture.url);
                None
            }
            ToggleOutcome::Deactivated => bail!("focus mode was unexpectedly active"),
        },
    };

    let mut settled = controller.wait_until_settled(settle).await;

    if let (Some(url), Some(after)) = (args.navigate.as_ref(), args.fixture_after.as_ref()) {
        let next = load_fixture(after).await?;
        info!(to = %url, "navigating in-page");
        document
            .navigate(url.clone(), &next.body)
            .with_context(|| format!("navigating to {url}"))?;
        // give the watcher a chance to notice the new location
        tokio::time::sleep(config.navigation.poll_interval() * 2).await;
        settled = controller.wait_until_settled(settle).await && settled;
    }

    let session = controller.session();
    if args.deactivate {
        controller.deactivate();
    }
    let report = RunReport {
        topic,
        location: document.location(),
        active: controller.is_active(),
        degraded: session.as_ref().is_some_and(|s| s.degraded),
        settled,
        metrics: controller.metrics(),
        page: document.outline(document.body()),
    };
    print_report(&report, output)
}

fn print_report(report: &RunReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(report)?),
        OutputFormat::Human => {
            let metrics = &report.metrics;
            println!("Location: {}", report.location);
            match &report.topic {
                Some(topic) => println!("Topic:    {topic}"),
                None => println!("Topic:    (none)"),
            }
            if report.degraded {
                println!("Model:    unavailable; unscored items hidden");
            }
            println!(
                "Items:    {} relevant, {} filtered, {} without text",
                metrics.relevant, metrics.filtered, metrics.skipped_empty
            );
            println!(
                "Sections purged: {}, scans: {}, navigations: {}",
                metrics.sections_purged, metrics.scans, metrics.navigations
            );
            if !report.settled {
                println!("Warning: pipeline did not settle before the deadline");
            }
        }
    }
    Ok(())
}
