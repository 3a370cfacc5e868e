use timetable_solver::{config, server};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(config::logger_env()).init();

    let config = config::ServerConfig::from_env();
    server::run_server(config).await
}
