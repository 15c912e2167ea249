use anyhow::Result;
use rollcall::{Config, Session, StudentRepository};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    // logs go to stderr so they never corrupt the alternate screen
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    log::info!("student API at {}", config.base_url);

    let repository = StudentRepository::new(&config);
    let session = Session::new();

    run_shell(session, repository).await
}

#[cfg(feature = "tui")]
async fn run_shell(session: Session, repository: StudentRepository) -> Result<()> {
    rollcall::ui::run_ui(session, repository).await
}

#[cfg(not(feature = "tui"))]
async fn run_shell(_session: Session, _repository: StudentRepository) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
