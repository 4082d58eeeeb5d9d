use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lyric_contracts::session::MemorySessionStore;
use lyric_engine::{AgentConfig, LyricsAgent, PipelineResult, ProviderKind};
use lyric_web::AppState;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lyric-studio",
    version,
    about = "Lyric analysis, card prompts and cover images over an OpenAI-compatible API"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the browser front end.
    Serve(ServeArgs),
    /// Run the whole pipeline once on song info read from stdin.
    Run(RunArgs),
}

#[derive(Debug, Parser)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,
    #[arg(long, default_value = "static/outputs")]
    output_dir: PathBuf,
    #[arg(long, default_value_t = ProviderKind::OpenAi)]
    provider: ProviderKind,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value_t = ProviderKind::OpenAi)]
    provider: ProviderKind,
}

const END_MARKER: &str = "END";
const RULE: &str = "====================";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("lyric-studio error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = AgentConfig::from_env();
    match cli.command {
        Command::Serve(args) => run_serve(args, &config),
        Command::Run(args) => run_pipeline_once(args, &config),
    }
}

fn run_serve(args: ServeArgs, config: &AgentConfig) -> Result<i32> {
    // The blocking HTTP client must be created and dropped outside the async
    // runtime; `agent` keeps the providers alive until the runtime is gone.
    let agent = LyricsAgent::from_config(config, args.provider)?;
    let provider = agent.provider_name().to_string();
    let state = AppState::new(
        agent.clone(),
        Arc::new(MemorySessionStore::new()),
        &args.output_dir,
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let served = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(args.bind)
            .await
            .with_context(|| format!("failed to bind {}", args.bind))?;
        tracing::info!(
            bind = %args.bind,
            provider,
            output_dir = %args.output_dir.display(),
            "serving lyric studio"
        );
        axum::serve(listener, lyric_web::router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")
    });
    drop(runtime);
    drop(agent);
    served?;
    Ok(0)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn run_pipeline_once(args: RunArgs, config: &AgentConfig) -> Result<i32> {
    let agent = LyricsAgent::from_config(config, args.provider)?;

    println!("=== 小红书歌词赏析智能体 (Auto-Mode) ===");
    println!("请直接粘贴包含歌名、歌手、歌词的完整内容 (输入 '{END_MARKER}' 结束):");
    let raw_content = read_until_end(io::stdin().lock())?;
    if raw_content.is_empty() {
        println!("未输入内容，程序退出。");
        return Ok(0);
    }

    let result = agent.run_pipeline(&raw_content, args.out.as_deref(), agent.defaults())?;
    print_result(&result);
    Ok(if result.images.iter().all(|image| image.saved) {
        0
    } else {
        2
    })
}

/// Lines up to a line that is `END` (any case) or EOF, joined with `\n`.
fn read_until_end(reader: impl BufRead) -> io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().eq_ignore_ascii_case(END_MARKER) {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

fn print_result(result: &PipelineResult) {
    println!("\n{RULE} [小红书文案] {RULE}");
    println!("{}", result.post);
    println!("{}", "=".repeat(50));
    println!(
        "\n📋 识别信息: 歌名 [{}], 歌手 [{}]",
        result.song_name, result.artist
    );
    println!("\n🎨 生成的生图提示词: {}", result.visual_prompt);
    for image in &result.images {
        let status = if image.saved { "✅" } else { "❌" };
        println!(
            "{status} {} → {}{}",
            image.slot.suffix(),
            image.path.display(),
            image
                .source_url
                .as_deref()
                .map(|url| format!(" ({url})"))
                .unwrap_or_default()
        );
    }
    println!("\n✨ 任务全部完成！请查看生成的小红书文案与封面图。");
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reading_stops_at_end_marker() -> anyhow::Result<()> {
        let input = Cursor::new("晴天\n周杰伦\n  end \nignored\n");
        assert_eq!(read_until_end(input)?, "晴天\n周杰伦");
        Ok(())
    }

    #[test]
    fn reading_stops_at_eof() -> anyhow::Result<()> {
        assert_eq!(read_until_end(Cursor::new("a\nb"))?, "a\nb");
        assert_eq!(read_until_end(Cursor::new(""))?, "");
        Ok(())
    }

    #[test]
    fn serve_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["lyric-studio", "serve"])?;
        let Command::Serve(args) = cli.command else {
            anyhow::bail!("expected serve");
        };
        assert_eq!(args.bind.to_string(), "127.0.0.1:5000");
        assert_eq!(args.output_dir, PathBuf::from("static/outputs"));
        assert_eq!(args.provider, ProviderKind::OpenAi);
        Ok(())
    }

    #[test]
    fn run_accepts_dryrun_provider() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "lyric-studio",
            "run",
            "--provider",
            "dryrun",
            "--out",
            "covers",
        ])?;
        let Command::Run(args) = cli.command else {
            anyhow::bail!("expected run");
        };
        assert_eq!(args.provider, ProviderKind::Dryrun);
        assert_eq!(args.out, Some(PathBuf::from("covers")));
        Ok(())
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["lyric-studio", "run", "--provider", "fal"]).is_err());
    }
}
