use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ogs_client::{ClientConfig, GameSession, ReqwestTransport, RestClient};
use ogs_protocol::{parse_game_id, GameId, UserId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// OGS 命令行客户端
#[derive(Parser, Debug)]
#[command(name = "ogs-client", version)]
#[command(about = "Inspect and watch games on online-go.com")]
struct Cli {
    /// OAuth access token
    #[arg(long, env = "OGS_ACCESS_TOKEN", hide_env_values = true, default_value = "")]
    token: String,

    /// 配置文件路径，默认 <config dir>/ogs-client/config.json
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List active games of the authenticated user
    Overview,
    /// Show status and clocks of a game
    Game {
        /// Game id or game URL
        game: String,
    },
    /// Poll a game until it finishes
    Watch {
        /// Game id or game URL
        game: String,
    },
    /// GET an API path and print the JSON response
    Rest {
        /// Path such as /api/v1/me
        uri: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load(),
    };

    // 初始化日志，RUST_LOG 优先于配置
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let rest = RestClient::new(ReqwestTransport::new(&config)?, cli.token);

    match cli.command {
        Command::Overview => {
            if !rest.is_authenticated() {
                bail!("overview requires --token or OGS_ACCESS_TOKEN");
            }
            let overview = rest.overview().await.context("failed to fetch overview")?;
            if overview.active_games.is_empty() {
                println!("No active games");
            }
            for entry in &overview.active_games {
                println!("{}", entry.game.overview());
            }
        }
        Command::Game { game } => {
            let game_id = parse_game_id(&game)?;
            let viewer = viewer(&rest).await?;
            let session = GameSession::open(&rest, game_id, viewer).await?;
            println!("{}", session.game().url());
            println!("{}", session.render(Utc::now()));
        }
        Command::Watch { game } => {
            let game_id = parse_game_id(&game)?;
            let viewer = viewer(&rest).await?;
            watch(&rest, &config, game_id, viewer).await?;
        }
        Command::Rest { uri } => {
            let value = rest.get_json(&uri).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// 已认证时返回当前用户 ID
async fn viewer(rest: &RestClient<ReqwestTransport>) -> Result<Option<UserId>> {
    if !rest.is_authenticated() {
        return Ok(None);
    }
    let me = rest.about_me().await.context("failed to fetch current user")?;
    info!("Authenticated as {} ({})", me.username, me.id);
    Ok(Some(me.id))
}

/// 定期刷新对局，状态变化时输出，直到对局结束或 Ctrl-C
async fn watch(
    rest: &RestClient<ReqwestTransport>,
    config: &ClientConfig,
    game_id: GameId,
    viewer: Option<UserId>,
) -> Result<()> {
    let mut session = GameSession::open(rest, game_id, viewer).await?;
    println!("{}", session.game().overview());

    let mut last_status = String::new();
    loop {
        let status = session.status();
        if status != last_status {
            println!("{}", status);
            last_status = status;
        }
        let [black, white] = session.clock_lines(Utc::now());
        println!("  {} | {}", black, white);

        if session.is_finished() {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = tokio::time::sleep(config.poll_interval()) => {}
        }

        if let Err(e) = session.refresh(rest).await {
            tracing::warn!("Refresh failed: {}", e);
        }
    }

    Ok(())
}
