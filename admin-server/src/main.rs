use admin_server::{Config, Server, ServerState, print_banner, setup_environment};
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment();

    print_banner();

    // 2. 加载配置
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "🦀 Admin Server starting..."
    );

    // 3. 初始化服务器状态
    let state = ServerState::initialize(&config)
        .await
        .context("Failed to initialize server state")?;

    // 4. 启动 HTTP 服务器
    Server::with_state(config, state)
        .run()
        .await
        .context("Server error")?;

    Ok(())
}
