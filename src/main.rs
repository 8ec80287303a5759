use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yukki::audio::wav::{pcm_to_wav, write_wav_file};
use yukki::cli::{Cli, Command};
use yukki::integration::{AppConfig, TutorSession, UserTurn};
use yukki::messages::ImageData;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command() {
        Command::Gui => {
            info!("Starting Yukki");
            yukki::ui::run(config).map_err(|e| anyhow::anyhow!("GUI error: {}", e))
        }
        Command::Ask {
            text,
            image,
            speak,
            out,
        } => ask(config, text, image.as_deref(), speak, out.as_deref()),
        Command::Wav { input, rate, out } => {
            let pcm = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let wav = pcm_to_wav(&pcm, rate)?;
            write_wav_file(&out, &wav)?;
            info!("Wrote {} ({} bytes)", out.display(), wav.len());
            Ok(())
        }
    }
}

/// One question from the command line, answered without the window
fn ask(
    config: AppConfig,
    text: String,
    image: Option<&Path>,
    speak: bool,
    out: Option<&Path>,
) -> Result<()> {
    let mut turn = UserTurn::text(text);
    if let Some(path) = image {
        turn = turn.with_attachment(load_image(path)?.into());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let mut session = TutorSession::new(&config)?;
    let outcome = runtime
        .block_on(session.handle_turn(turn))
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("{}", outcome.reply);

    let Some(audio) = outcome.audio else {
        if speak || out.is_some() {
            eprintln!("(no speech available for this reply)");
        }
        return Ok(());
    };

    let wav = audio.to_wav()?;
    if let Some(path) = out {
        write_wav_file(path, &wav)?;
        info!("Saved reply audio to {}", path.display());
    }
    if speak {
        play(&wav)?;
    }
    Ok(())
}

fn load_image(path: &Path) -> Result<ImageData> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let Some(mime) = ImageData::mime_for_extension(&ext) else {
        bail!("Unsupported image type: {}", path.display());
    };
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ImageData::new(data, mime))
}

#[cfg(feature = "audio-io")]
fn play(wav: &[u8]) -> Result<()> {
    let mut player = yukki::audio::AudioPlayer::new()?;
    let duration = player.play_wav(wav)?;
    std::thread::sleep(duration);
    Ok(())
}

#[cfg(not(feature = "audio-io"))]
fn play(_wav: &[u8]) -> Result<()> {
    bail!("Built without audio output")
}
