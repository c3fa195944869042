mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use lien_ledger::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
