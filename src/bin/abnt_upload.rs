use abnt_formatter::client::{
    DirectorySink, HttpTransport, NotificationKind, Panel, SessionEvent, UploadSession,
};
use abnt_formatter::config::ClientConfig;
use abnt_formatter::models::{DocumentMime, FileCandidate};
use abnt_formatter::utils::validation::format_file_size;
use anyhow::{Context, anyhow};
use bytes::Bytes;
use clap::Parser;
use dotenvy::dotenv;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Send a PDF or DOCX document to the ABNT formatter and save the result.
#[derive(Parser, Debug)]
#[command(name = "abnt-upload", version)]
struct Args {
    /// Document to format (.pdf or .docx)
    file: PathBuf,

    /// Upload endpoint (overrides ABNT_UPLOAD_URL)
    #[arg(long)]
    url: Option<String>,

    /// Directory the formatted document is saved to
    #[arg(long, short, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abnt_upload=info,abnt_formatter=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = args.url {
        config.upload_url = url;
    }

    let candidate = read_candidate(&args.file).await?;
    info!(
        "📄 {} ({})",
        candidate.name,
        format_file_size(candidate.size_bytes)
    );

    let transport = Arc::new(HttpTransport::new(&config.upload_url, config.chunk_size)?);
    let mut session = UploadSession::new(config);
    let renderer = tokio::spawn(render(session.subscribe()));

    let outcome = run(&mut session, transport, candidate, args.output_dir).await;

    // Closing the session ends the event stream
    drop(session);
    let _ = renderer.await;

    outcome
}

async fn run(
    session: &mut UploadSession,
    transport: Arc<HttpTransport>,
    candidate: FileCandidate,
    output_dir: PathBuf,
) -> anyhow::Result<()> {
    if let Some(Err(e)) = session.pick_file(candidate) {
        return Err(anyhow!(e.user_message()));
    }

    info!("⬆️  Sending to {}", transport.url());
    session
        .submit(transport)
        .await
        .map_err(|e| anyhow!("{} ({})", e.user_message(), e))?;

    let sink = DirectorySink::new(output_dir);
    let saved = session
        .download(&sink)
        .await
        .map_err(|e| anyhow!("{} ({})", e.user_message(), e))?;

    if let Some(path) = saved {
        info!("💾 Saved to {}", path.display());
    }
    session.start_over();
    Ok(())
}

/// Reads a file the way a browser picker reports it: name, size and a MIME
/// type guessed from the extension.
async fn read_candidate(path: &Path) -> anyhow::Result<FileCandidate> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("documento")
        .to_string();

    let mime_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentMime::from_extension)
        .map(|m| m.as_str())
        .unwrap_or("application/octet-stream");

    Ok(FileCandidate::new(name, mime_type, Bytes::from(content)))
}

async fn render(mut events: UnboundedReceiver<SessionEvent>) {
    const WIDTH: usize = 30;
    let mut stderr = std::io::stderr();

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Progress { percent, label } => {
                let filled = WIDTH * percent as usize / 100;
                let _ = write!(
                    stderr,
                    "\r[{}{}] {:>3}% {:<24}",
                    "#".repeat(filled),
                    "-".repeat(WIDTH - filled),
                    percent,
                    label
                );
                let _ = stderr.flush();
            }
            SessionEvent::Notified(notification) => {
                let marker = match notification.kind {
                    NotificationKind::Success => "✔",
                    NotificationKind::Error => "✖",
                };
                let _ = writeln!(stderr, "\n{} {}", marker, notification.message);
            }
            SessionEvent::PanelChanged(Panel::Success) => {
                let _ = writeln!(stderr, "\nYour document is ready for download.");
            }
            SessionEvent::PanelChanged(_) => {}
        }
    }
}
