/*
 * Responsibility
 * - tokio runtime
 * - app::run() (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    jwt_gate::app::run().await
}
