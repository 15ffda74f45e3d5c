use anyhow::Result;
use timetable::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
