use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{debug, info};

use tadasana_coach::coach::CoachSession;
use tadasana_coach::config::Config;
use tadasana_coach::replay::{frame_times, read_frames, SecondClock};

const CONFIG_PATH: &str = "config.toml";

/// 記録したキーポイントを山のポーズのコーチで再生する
#[derive(Debug, Parser)]
#[command(name = "tadasana-coach", version = env!("GIT_VERSION"))]
struct Args {
    /// キーポイント記録 (JSON Lines)
    #[arg(short, long)]
    input: PathBuf,

    /// TOML 設定ファイル (省略時は config.toml、なければデフォルト)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 再生終了時にセッション記録 (JSON) を書き出す先
    #[arg(long)]
    record_out: Option<PathBuf>,

    /// 読み上げメッセージを表示する
    #[arg(long)]
    speech: bool,

    /// ログレベル (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config = Config::resolve(args.config.as_deref(), CONFIG_PATH)?;

    println!("Tadasana Coach {}", env!("GIT_VERSION"));
    println!("Input: {}", args.input.display());
    println!(
        "Windows: smoothing={}, stabilizer={}, held>={}",
        config.smoothing.window, config.stabilizer.window, config.session.held_threshold
    );
    println!();

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let frames = read_frames(BufReader::new(file))?;
    info!(frames = frames.len(), "recording loaded");

    let mut session = CoachSession::new(&config);
    if args.speech {
        session.set_speech_enabled(true);
    }

    let frame_ms = 1000.0 / config.replay.fps;
    let times = frame_times(&frames, frame_ms);
    let mut clock = SecondClock::new();

    for (i, (frame, &t_ms)) in frames.iter().zip(&times).enumerate() {
        let report = session.process(frame.pose.as_ref());
        debug!(
            frame = i,
            score = report.analysis.score,
            smoothed = report.smoothed,
            status = report.analysis.status.label(),
            "frame"
        );

        if report.suggestion.changed {
            println!("[{:>5}] {}", i, report.suggestion.suggestion.message());
        }
        if let Some(text) = report.speech {
            println!("        (say) {}", text);
        }

        for _ in 0..clock.advance(t_ms) {
            let m = session.tick_second();
            debug!(held = m.held_seconds, best = m.best_score, "second");
        }
    }

    let m = session.metrics();
    println!();
    println!("Session: {}s", m.elapsed_seconds);
    println!("  best:    {}", m.best_score);
    println!("  average: {:.1}", m.average_score);
    println!("  attempts: {}", m.attempts);

    if let Some(path) = args.record_out {
        let json = serde_json::to_string_pretty(&session.record())?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("session record written to {}", path.display());
    }

    Ok(())
}
