mod cli;
mod infra;
mod report;
mod routes;
mod server;

use activity_points::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
