use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use voxgate::audio::capture::{CpalFrameSource, list_devices, suppress_audio_warnings};
use voxgate::audio::source::FrameSource;
use voxgate::broadcast::StdoutSubscriber;
use voxgate::cli::{Cli, Commands};
use voxgate::config::Config;
use voxgate::pipeline::PipelineController;
use voxgate::scorer::EnergyScorer;
use voxgate::stt::transcriber::{NoopTranscriber, Transcriber};
use voxgate::stt::whisper::{WhisperConfig, WhisperTranscriber};
use voxgate::sys;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Devices) => list_audio_devices(),
        None => run_live(cli),
    }
}

fn list_audio_devices() -> Result<()> {
    suppress_audio_warnings();
    let devices = list_devices()?;
    if devices.is_empty() {
        eprintln!("No audio input devices found");
    } else {
        println!("Audio input devices:");
        for device in devices {
            println!("  {}", device);
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load_or_default(&path)?,
        None => Config::default(),
    };
    let mut config = config.with_env_overrides();

    // CLI flags override both file and environment
    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }
    if let Some(model) = &cli.model {
        config.stt.model_path = Some(model.clone());
    }
    if let Some(language) = &cli.language {
        config.stt.language = language.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.detector.speech_threshold = threshold;
    }
    if let Some(timeout) = cli.silence_timeout {
        config.detector.silence_timeout_ms = timeout;
    }
    if let Some(pre_roll) = cli.pre_roll {
        config.detector.pre_roll_ms = pre_roll;
    }
    if let Some(post_roll) = cli.post_roll {
        config.detector.post_roll_ms = post_roll;
    }
    config.validate()?;
    Ok(config)
}

fn build_transcriber(config: &Config, quiet: bool) -> Result<Arc<dyn Transcriber>> {
    match &config.stt.model_path {
        Some(path) => {
            let whisper = WhisperTranscriber::new(WhisperConfig {
                model_path: path.clone(),
                threads: None,
            })?;
            Ok(Arc::new(whisper))
        }
        None => {
            if !quiet {
                eprintln!("voxgate: no model configured — transcription disabled");
                eprintln!("  Pass --model <path-to-ggml-model.bin> to enable it");
            }
            Ok(Arc::new(NoopTranscriber))
        }
    }
}

fn run_live(cli: Cli) -> Result<()> {
    suppress_audio_warnings();

    let config = load_config(&cli)?;
    let mut pipeline_config = config.pipeline_config();
    pipeline_config.quiet = cli.quiet;

    let transcriber = build_transcriber(&config, cli.quiet)?;
    let device = config.audio.device.clone();
    let controller = PipelineController::new(
        pipeline_config,
        Box::new(move || {
            let source = CpalFrameSource::new(device.as_deref())?;
            Ok(Box::new(source) as Box<dyn FrameSource>)
        }),
        Arc::new(EnergyScorer::default()),
        transcriber,
    );

    controller.hub().register(Arc::new(
        StdoutSubscriber::new()
            .with_probabilities(cli.verbose)
            .with_json(cli.json),
    ));

    sys::install_sigint_handler();
    controller.start()?;
    if !cli.quiet {
        eprintln!("voxgate: listening (Ctrl+C to stop)");
    }

    while !sys::sigint_received() && controller.is_running() {
        thread::sleep(Duration::from_millis(100));
    }

    controller.stop();
    if !cli.quiet {
        eprintln!("voxgate: stopped");
    }
    Ok(())
}
