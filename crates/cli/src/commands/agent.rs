//! `shellsmith agent` — Interactive or single-message mode.

use shellsmith_agent::AgentLoop;
use shellsmith_config::AppConfig;
use shellsmith_core::event::{DomainEvent, EventBus};
use shellsmith_core::message::{History, Turn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

pub const PROMPT: &str = "Ask me anything: ";
pub const FAREWELL: &str = "Goodbye!";

pub async fn run(
    message: Option<String>,
    workdir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| shellsmith_core::Error::Config {
        message: format!("failed to load config: {e}"),
    })?;
    if let Some(dir) = workdir {
        config.agent.working_dir = Some(dir);
    }

    let provider = match shellsmith_providers::build_from_config(&config) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set one of these environment variables (or put it in .env):");
            eprintln!("    SHELLSMITH_API_KEY, GENAI_API_KEY, GEMINI_API_KEY, OPENAI_API_KEY");
            eprintln!();
            eprintln!("  Or add api_key to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err("No usable provider. See above for setup instructions.".into());
        }
    };

    let tools = Arc::new(shellsmith_tools::registry_for(&config.tools.enabled));
    let event_bus = Arc::new(EventBus::default());
    spawn_status_printer(&event_bus);

    let agent = AgentLoop::from_config(&config, provider, tools, event_bus);
    info!(
        provider = %config.default_provider,
        model = %config.model(),
        workdir = %agent.working_dir().display(),
        "Agent session started"
    );
    let mut history = History::new();

    if let Some(msg) = message {
        history.push(Turn::human(msg));
        let answer = agent.process(&mut history).await?;
        println!("{answer}");
        return Ok(());
    }

    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.model());
    println!("  Tools:     {}", config.tools.enabled.join(", "));
    println!("  Workdir:   {}", agent.working_dir().display());
    println!();
    println!("  Type 'exit' to quit.");
    println!();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_repl(&agent, &mut history, stdin, &mut std::io::stdout()).await?;
    Ok(())
}

/// Read questions from `input` until `exit` or end of input.
///
/// Each question is appended to `history` and answered by `agent`. A failed
/// request is reported and the next question is read.
pub async fn run_repl<R, W>(
    agent: &AgentLoop,
    history: &mut History,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();

        if is_exit(line) {
            writeln!(out, "{FAREWELL}")?;
            break;
        }
        if line.is_empty() {
            continue;
        }

        history.push(Turn::human(line));
        match agent.process(history).await {
            Ok(answer) => writeln!(out, "{answer}")?,
            Err(e) => writeln!(out, "[Error] {e}")?,
        }
    }

    Ok(())
}

/// `exit` in any letter case ends the session.
pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Echo loop progress: tool output to stdout, timings and waits to stderr.
fn spawn_status_printer(bus: &EventBus) {
    let rx = bus.subscribe();
    tokio::spawn(async move {
        let (mut out, mut err) = (std::io::stdout(), std::io::stderr());
        print_status(rx, &mut out, &mut err).await;
    });
}

/// Print events until the bus closes. Events missed while lagging are
/// skipped.
async fn print_status<O: Write, E: Write>(
    mut rx: broadcast::Receiver<Arc<DomainEvent>>,
    out: &mut O,
    err: &mut E,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = echo_event(&event, out, err) {
                    warn!(error = %e, "Failed to print status");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Status printer fell behind, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Print one loop event for the operator.
fn echo_event<O: Write, E: Write>(
    event: &DomainEvent,
    out: &mut O,
    err: &mut E,
) -> std::io::Result<()> {
    match event {
        DomainEvent::ToolExecuted {
            tool_name,
            duration_ms,
            output,
            ..
        } => {
            writeln!(out, "{output}")?;
            out.flush()?;
            writeln!(err, "  [{tool_name}] finished in {duration_ms} ms")
        }
        DomainEvent::RateLimited { wait_ms, .. } => writeln!(
            err,
            "  Request limit reached, waited {:.1}s",
            *wait_ms as f64 / 1000.0
        ),
        DomainEvent::ModelRequested { .. } | DomainEvent::AnswerProduced { .. } => Ok(()),
    }
}
