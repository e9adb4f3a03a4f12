use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use video_qa::api::ApiServer;
use video_qa::config::Config;
use video_qa::logging;
use video_qa::sampler::{
    classify, extract_frames, FfmpegSource, FileKind, FrameSource, ProxyClient, Session,
    SubmitOutcome, SubtitleTrack, transcribe_video,
};

fn cli() -> Command {
    Command::new("Video Q&A")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ask questions about a video using sampled frames and subtitles")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (TOML)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the Gemini request proxy")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Port to listen on (overrides PORT)")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(
                    Arg::new("static-dir")
                        .long("static-dir")
                        .value_name("DIR")
                        .help("Directory holding index.html"),
                ),
        )
        .subcommand(
            Command::new("ask")
                .about("Sample a video and ask a question through the proxy")
                .arg(
                    Arg::new("video")
                        .long("video")
                        .value_name("FILE")
                        .help("Video file")
                        .required(true),
                )
                .arg(
                    Arg::new("subtitles")
                        .short('s')
                        .long("subtitles")
                        .value_name("FILE")
                        .help("Subtitle file (.srt or .vtt)"),
                )
                .arg(
                    Arg::new("question")
                        .short('q')
                        .long("question")
                        .value_name("TEXT")
                        .help("Question about the video")
                        .required(true),
                )
                .arg(
                    Arg::new("proxy-url")
                        .long("proxy-url")
                        .value_name("URL")
                        .help("Base URL of the proxy"),
                )
                .arg(
                    Arg::new("transcribe")
                        .long("transcribe")
                        .help("Transcribe the audio with Whisper when no subtitle file is given")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("play-captions")
                        .long("play-captions")
                        .help("Play the whole caption track before asking")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("frames")
                .about("Extract the sampled frames to a directory")
                .arg(
                    Arg::new("video")
                        .long("video")
                        .value_name("FILE")
                        .help("Video file")
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Output directory for frames")
                        .default_value("./frames"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let matches = cli().get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    logging::init(&config.logging.level, matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("serve", sub)) => serve(config, sub).await,
        Some(("ask", sub)) => ask(config, sub).await,
        Some(("frames", sub)) => frames(config, sub).await,
        _ => Err(anyhow!("No command given")),
    }
}

async fn serve(mut config: Config, matches: &ArgMatches) -> Result<()> {
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    if let Some(dir) = matches.get_one::<String>("static-dir") {
        config.server.static_dir = PathBuf::from(dir);
    }

    config.validate()?;
    info!("{}", config.summary());

    if !config.gemini.has_api_key() {
        warn!("GEMINI_API_KEY is not set; /api/gemini will answer 500 until it is");
    }

    ApiServer::new(Arc::new(config)).start().await
}

async fn ask(mut config: Config, matches: &ArgMatches) -> Result<()> {
    if let Some(url) = matches.get_one::<String>("proxy-url") {
        config.sampler.proxy_url = url.clone();
    }
    config.validate()?;

    let video_path = required_path(matches, "video")?;
    if classify(&video_path) != FileKind::Video {
        return Err(anyhow!("{} is a subtitle file, not a video", video_path.display()));
    }

    let mut session = Session::new(config.sampler.jpeg_quality);
    session.load_video(Box::new(FfmpegSource::open(&video_path, &config.sampler).await?));

    let track = match matches.get_one::<String>("subtitles") {
        Some(subtitles) => Some(SubtitleTrack::load(Path::new(subtitles)).await?),
        None if matches.get_flag("transcribe") => {
            Some(transcribe_video(&video_path, &config.sampler).await?)
        }
        None => None,
    };

    if let Some(track) = track {
        session.load_subtitles(track);
        if matches.get_flag("play-captions") {
            let changes = session.play_captions();
            info!("💬 Played caption track ({} cue changes)", changes);
        }
    }

    if let Some(question) = matches.get_one::<String>("question") {
        session.set_question(question.clone());
    }

    let client = ProxyClient::new(config.sampler.proxy_url.clone());
    match session.submit(&client).await {
        SubmitOutcome::Rejected(notice) => Err(anyhow!(notice)),
        SubmitOutcome::Answered(_) | SubmitOutcome::Failed(_) => {
            println!("{}", session.result());
            Ok(())
        }
    }
}

async fn frames(config: Config, matches: &ArgMatches) -> Result<()> {
    config.validate()?;

    let video_path = required_path(matches, "video")?;
    let output_dir = required_path(matches, "output")?;
    tokio::fs::create_dir_all(&output_dir).await?;

    let mut source = FfmpegSource::open(&video_path, &config.sampler).await?;
    let source: &mut dyn FrameSource = &mut source;
    let frames = extract_frames(source, config.sampler.jpeg_quality, |_| {}).await?;

    for frame in &frames {
        let path = output_dir.join(format!("frame_{:05}.jpg", frame.timestamp.as_secs()));
        tokio::fs::write(&path, &frame.jpeg).await?;
    }

    info!("📂 Wrote {} frames to {}", frames.len(), output_dir.display());
    Ok(())
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<String>(name)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Missing --{}", name))
}
