use clap::Parser;
use tower_lsp::{LspService, Server};

use labels_finder_language_server::backend::LabelsBackend;
use labels_finder_language_server::logging::init_logger;

#[derive(Debug, Parser)]
#[command(
    name = "labels-finder-language-server",
    version,
    about = "LSP server providing label-path completions from a JSON label tree"
)]
struct Args {
    /// Override the stderr log level (otherwise RUST_LOG or "info")
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Disable the per-session debug log file in the user cache directory
    #[arg(long)]
    no_file_log: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)?;

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(LabelsBackend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
