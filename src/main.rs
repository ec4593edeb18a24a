pub mod api;
pub mod config;
pub mod db;
pub mod token;

use crate::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    api::server::start_server(config).await;
}
