use anyhow::{Context, Result, bail};
use asciireel::{
    FrameGenerator, FrameSettings, HttpChatClient, LlmOverrides, LlmSettings, PlaybackSettings,
    StoryGenerator,
    story::{create_movie_directory, debug_dir, latest_movie_dir, list_movies, load_story, save_movie},
    play::{play_movie, select_movie},
    types::{
        generate_args::GenerateArgs, play_args::PlayArgs, run_args::RunArgs,
        terminal_guard::TerminalGuard,
    },
};
use clap::{Parser, Subcommand};
use std::{
    fs,
    io::stdin,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

static PLAYING: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(author, version, about = "Generates ASCII-art movies with an LLM and plays them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a story and its frames (or resume an unfinished movie)
    Generate(GenerateArgs),
    /// Play a generated movie
    Play(PlayArgs),
    /// Generate a movie, then play it
    Run(RunArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    ctrlc::set_handler(|| {
        TerminalGuard::restore();
        if PLAYING.load(Ordering::SeqCst) {
            eprintln!("\nPlayback interrupted. Exiting...");
        } else {
            eprintln!("\nGeneration interrupted. Saved frames can be continued with --resume.");
        }
        std::process::exit(0);
    })
    .with_context(|| "Failed to set Ctrl+C handler")?;

    let cli = Cli::parse();
    let start_time = Instant::now();

    match cli.command {
        Commands::Generate(args) => {
            let movie_dir = run_generation(&args)?;
            info!("Movie generation complete. The movie is saved in: {movie_dir:?}");
        }
        Commands::Play(args) => {
            let Some(movie_dir) = resolve_movie(&args)? else {
                info!("Movie selection cancelled.");
                return Ok(());
            };
            let settings = PlaybackSettings::new(args.delay, args.width, args.height)?;
            play(&movie_dir, settings)?;
        }
        Commands::Run(args) => {
            let movie_dir = run_generation(&args.generate)?;
            let settings =
                PlaybackSettings::new(args.delay, args.generate.width, args.generate.height)?;
            info!("Starting movie playback...");
            thread::sleep(Duration::from_secs(2));
            play(&movie_dir, settings)?;
        }
    }

    let duration = start_time.elapsed();
    info!("Command completed in: {duration:.2?}");
    Ok(())
}

fn play(movie_dir: &Path, settings: PlaybackSettings) -> Result<()> {
    info!("Playing movie: {movie_dir:?}");
    PLAYING.store(true, Ordering::SeqCst);
    let result = play_movie(movie_dir, settings);
    PLAYING.store(false, Ordering::SeqCst);
    Ok(result?)
}

fn resolve_movie(args: &PlayArgs) -> Result<Option<PathBuf>> {
    if let Some(dir) = &args.movie_dir {
        return Ok(Some(dir.clone()));
    }
    let movies = list_movies(&args.output_dir)?;
    if movies.is_empty() {
        bail!("No movies found in {:?}", args.output_dir);
    }
    let picked = select_movie(&movies, &mut stdin().lock(), &mut std::io::stdout())?;
    Ok(picked.map(|name| args.output_dir.join(name)))
}

fn run_generation(args: &GenerateArgs) -> Result<PathBuf> {
    if !args.request_delay.is_finite() || args.request_delay < 0.0 {
        bail!("--request-delay must be a non-negative number of seconds");
    }
    let frame_settings = FrameSettings::new(args.width, args.height)?;
    let settings = LlmSettings::from_env(
        args.provider,
        LlmOverrides {
            model: args.model.clone(),
            base_url: args.base_url.clone(),
            temperature: Some(args.temperature),
        },
    )?;
    let client = HttpChatClient::new(settings)?;
    info!(
        "Using LLM provider: {}, Model: {}",
        client.settings().provider,
        client.settings().model
    );

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", args.output_dir))?;

    let (story, movie_dir) = if args.resume {
        let movie_dir = match &args.movie_dir {
            Some(dir) => dir.clone(),
            None => latest_movie_dir(&args.output_dir)
                .context("No existing movie found to resume")?,
        };
        if !movie_dir.is_dir() {
            bail!("Movie directory to resume does not exist: {movie_dir:?}");
        }
        let story = load_story(&movie_dir)?;
        info!("Resuming movie generation for: {}", story.title);
        (story, movie_dir)
    } else {
        info!("Generating new story...");
        let generated = StoryGenerator::new(&client, debug_dir(&args.output_dir))
            .json_mode(args.json_mode)
            .generate(args.topic.as_deref())?;
        let movie_dir = create_movie_directory(&args.output_dir, &generated.story.title)?;
        save_movie(&movie_dir, &generated)?;
        (generated.story, movie_dir)
    };

    info!("Generating frames...");
    FrameGenerator::new(&client, frame_settings)
        .request_delay(Duration::from_secs_f64(args.request_delay))
        .generate(&story, &movie_dir, args.resume)?;
    info!("All frames generated.");

    Ok(movie_dir)
}
