//! `mailsling-replay` - headless replay of recorded pointer traces
//! through the triage engine.
//!
//! Target geometry is product-tuned by feel; this tool is how the tuning
//! happens without a device in hand. It drives the engine frame by frame
//! from a captured trace, prints every activation and dispatch outcome,
//! and ends with the session summary. The default backend is scripted
//! (with injectable failures to watch the rollback), `--base-url`
//! switches to the real one.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod scripted;
mod trace;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsling_api::{ApiClient, ApiConfig};
use mailsling_core::{EmailId, EmailRow, NoticeStream, TriageBackend, TriageEngine};
use mailsling_gesture::TriageConfig;

use scripted::{ScriptedBackend, ScriptedVoice};
use trace::{TraceKind, parse_trace};

#[derive(Debug, Parser)]
#[command(name = "mailsling-replay", about = "Replay a pointer trace through the triage engine")]
struct Args {
    /// Geometry and tuning as JSON; product defaults when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rows as a JSON array of emails; a demo inbox when omitted.
    #[arg(long, value_name = "FILE")]
    rows: Option<PathBuf>,

    /// Email ids the scripted backend rejects, to exercise rollback.
    #[arg(long, value_delimiter = ',', value_name = "ID")]
    fail: Vec<String>,

    /// Real backend base URL; the dry-run scripted backend when omitted.
    #[arg(long, value_name = "URL", requires = "token")]
    base_url: Option<String>,

    /// Bearer token for `--base-url`.
    #[arg(long, requires = "base_url")]
    token: Option<String>,

    /// Request timeout in seconds for `--base-url`.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Pointer trace to replay, one JSON event per line.
    trace: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsling=info,mailsling_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    run(Args::parse()).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let rows = load_rows(args.rows.as_deref())?;
    let events = parse_trace(&args.trace)?;
    info!(
        events = events.len(),
        rows = rows.len(),
        "Replay loaded"
    );

    let (backend, scripted) = build_backend(&args)?;
    let voice = Arc::new(ScriptedVoice::new());
    let (mut engine, mut notices) = TriageEngine::builder(backend, voice)
        .config(config)
        .rows(rows)
        .build()
        .context("engine geometry rejected")?;

    for event in &events {
        match event.event {
            TraceKind::Down => engine.touch_down(event.x),
            TraceKind::Move => engine.touch_move(event.x),
            TraceKind::Up => engine.touch_up(),
        }
        if let Some(activation) = engine.process() {
            let ball_x = engine.current_frame().ball_x;
            match engine.dispatch(&activation).await {
                Ok(outcome) => println!(
                    "[{:>6} ms] fired {:<11} row {} (ball {ball_x:>7.1}) -> {outcome:?}",
                    event.t_ms, activation.kind, activation.row,
                ),
                Err(e) => println!(
                    "[{:>6} ms] fired {:<11} row {} -> dispatch error: {e}",
                    event.t_ms, activation.kind, activation.row,
                ),
            }
        }
        drain_notices(&mut notices);
    }

    // Give spawned side channels a moment to settle before the summary.
    tokio::time::sleep(Duration::from_millis(100)).await;
    drain_notices(&mut notices);
    print_summary(&engine);
    if let Some(scripted) = scripted {
        println!("backend calls ({}):", scripted.calls().len());
        for call in scripted.calls() {
            println!("  {call}");
        }
    }
    Ok(())
}

type BackendPick = (Arc<dyn TriageBackend>, Option<Arc<ScriptedBackend>>);

fn build_backend(args: &Args) -> anyhow::Result<BackendPick> {
    match (&args.base_url, &args.token) {
        (Some(base_url), Some(token)) => {
            let client = ApiClient::new(ApiConfig {
                base_url: base_url.clone(),
                bearer_token: token.clone(),
                timeout: Duration::from_secs(args.timeout),
            })
            .context("cannot build API client")?;
            info!(base_url, "Using the real backend");
            Ok((Arc::new(client), None))
        }
        _ => {
            let fail = args.fail.iter().map(EmailId::new);
            info!(failing = args.fail.len(), "Using the scripted backend");
            let scripted = Arc::new(ScriptedBackend::new(fail));
            Ok((scripted.clone(), Some(scripted)))
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<TriageConfig> {
    let Some(path) = path else {
        return Ok(TriageConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn load_rows(path: Option<&std::path::Path>) -> anyhow::Result<Vec<EmailRow>> {
    let Some(path) = path else {
        return Ok(demo_rows());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read rows {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid rows {}", path.display()))
}

fn demo_rows() -> Vec<EmailRow> {
    [
        ("m1", "Quarterly numbers", "cfo@example.com", "inbox"),
        ("m2", "Lunch on Thursday?", "sam@example.com", "inbox"),
        ("m3", "Your order shipped", "shop@example.com", "updates"),
        ("m4", "Weekly digest", "news@example.com", "updates"),
        ("m5", "Standup moved to 9:30", "team@example.com", "inbox"),
        ("m6", "20% off this weekend", "promo@example.com", "updates"),
    ]
    .into_iter()
    .map(|(id, subject, sender, category)| EmailRow {
        id: EmailId::new(id),
        subject: subject.to_owned(),
        sender: sender.to_owned(),
        category: category.to_owned(),
    })
    .collect()
}

fn drain_notices(notices: &mut NoticeStream) {
    while let Some(notice) = notices.try_next() {
        println!("  notice [{:?}]: {notice:?}", notice.severity());
    }
}

fn print_summary(engine: &TriageEngine) {
    let snapshot = engine.session().snapshot();
    println!("\n--- session summary ---");
    println!("active row index: {}", engine.row_index().active_index());

    let mut triaged: Vec<_> = snapshot
        .triaged
        .iter()
        .map(|(id, kind)| (id.to_string(), *kind))
        .collect();
    triaged.sort();
    println!("triaged ({}):", triaged.len());
    for (id, kind) in triaged {
        println!("  {id} -> {kind}");
    }

    let mut punted: Vec<_> = snapshot.punted.iter().map(ToString::to_string).collect();
    punted.sort();
    println!("punted: {}", if punted.is_empty() { "none".to_owned() } else { punted.join(", ") });
    println!("in flight: {}", snapshot.in_flight.len());
    println!("undo depth: {}", snapshot.undo_depth);
}
