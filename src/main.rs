use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lyrics_canon::dataset::{read_canonical_records, write_canonical_records, write_raw_records};
use lyrics_canon::fetch::{GeniusClient, JsonFileSource, SongSource, DEFAULT_TIMEOUT_SECS};
use lyrics_canon::game::{Game, GameMode, GuessOutcome};
use lyrics_canon::models::RawRecord;
use lyrics_canon::pipeline::canonicalize;
use lyrics_canon::progress::{finish_phase, format_duration, phase_spinner, set_log_only, Phase};
use lyrics_canon::safety::{validate_output_path, CLEANED_MARKER};

#[derive(Parser)]
#[command(name = "lyrics-canon")]
#[command(about = "Fetch an artist's lyrics and reduce them to a deduplicated canonical dataset")]
struct Cli {
    /// Hide progress bars and print periodic log lines instead
    #[arg(long, global = true)]
    log_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch raw {title, lyrics} records for one artist
    Fetch {
        artist: String,

        output: PathBuf,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Canonicalize a raw dataset
    Clean {
        source: PathBuf,

        output: PathBuf,

        #[command(flatten)]
        clean: CleanArgs,
    },

    /// Fetch, then canonicalize
    Run {
        artist: String,

        output: PathBuf,

        /// Also keep the raw fetched dataset here
        #[arg(long)]
        raw: Option<PathBuf>,

        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        clean: CleanArgs,
    },

    /// Guess song titles from their opening lines
    Play {
        dataset: PathBuf,

        /// 30sec, 1min or 5min
        #[arg(long, default_value = "1min")]
        mode: GameMode,

        /// Seed for song selection
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// Stop after this many songs (default: all)
    #[arg(long)]
    max_songs: Option<usize>,

    #[arg(long, env = "GENIUS_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Pause between song page requests
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[derive(Args)]
struct CleanArgs {
    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Allow an output name without the "cleaned" marker
    #[arg(long)]
    force: bool,
}

fn fetch_records(artist: &str, args: &FetchArgs) -> Result<Vec<RawRecord>> {
    let client = GeniusClient::with_token(
        &args.token,
        Duration::from_secs(args.timeout_secs),
        Duration::from_millis(args.delay_ms),
    )?;
    let records = client
        .fetch_artist_songs(artist, args.max_songs)
        .with_context(|| format!("Failed to fetch songs for '{}'", artist))?;
    for record in &records {
        println!("Fetched: {}", record.title);
    }
    Ok(records)
}

fn load_saved_records(path: &Path) -> Result<Vec<RawRecord>> {
    println!("Reading raw dataset: {:?}", path);
    let source = JsonFileSource {
        path: path.to_path_buf(),
    };
    // Saved datasets hold a single artist already
    source
        .fetch_artist_songs("", None)
        .with_context(|| format!("Failed to read raw dataset {}", path.display()))
}

fn clean_records(records: &[RawRecord], output: &Path, args: &CleanArgs) -> Result<()> {
    let spinner = phase_spinner(Phase::Canonicalize);
    let (canonical, stats) = canonicalize(records);
    finish_phase(
        &spinner,
        Phase::Canonicalize,
        &format!(
            "{} groups, {} excluded, {} canonical records ({} dropped with empty lyrics)",
            stats.groups,
            stats.excluded(),
            canonical.len(),
            stats.dropped_empty_lyrics
        ),
    );

    write_canonical_records(output, &canonical)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    stats.log_phase(Phase::Canonicalize.label());
    if let Some(path) = &args.stats {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    println!(
        "Cleaned data saved. Original count: {}, Cleaned count: {}",
        records.len(),
        canonical.len()
    );
    Ok(())
}

fn play(dataset: &Path, mode: GameMode, seed: Option<u64>) -> Result<()> {
    let songs = read_canonical_records(dataset)
        .with_context(|| format!("Failed to read dataset {}", dataset.display()))?;
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::new(&songs, mode, rng)?;

    println!("Guessing game: {} mode, {} songs. Empty line quits.", game.mode(), songs.len());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        for line in game.revealed_lines() {
            println!("  {}", line);
        }
        print!(
            "[score {} | lives {} | {} left] > ",
            game.score(),
            game.lives(),
            format_duration(game.remaining())
        );
        io::stdout().flush()?;

        let asked = Instant::now();
        let input = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        if input.trim().is_empty() {
            break;
        }

        // Time spent typing counts against the clock
        if game.tick(asked.elapsed()) {
            println!("Time's up! It was '{}'.", game.answer());
            break;
        }

        let answer = game.answer();
        match game.guess(&input) {
            GuessOutcome::Correct { score } => println!("Correct! Score: {}", score),
            GuessOutcome::Wrong { lives, .. } => println!("Wrong. {} lives left.", lives),
            GuessOutcome::GameOver => {
                println!("Out of lives! It was '{}'.", answer);
                break;
            }
            GuessOutcome::Ignored => break,
        }
    }

    println!("Game over! Your final score: {}", game.score());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    set_log_only(cli.log_only);

    let start = Instant::now();

    match cli.command {
        Command::Fetch { artist, output, fetch } => {
            let records = fetch_records(&artist, &fetch)?;
            write_raw_records(&output, &records)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Successfully saved data for {} songs.", records.len());
        }
        Command::Clean { source, output, clean } => {
            validate_output_path(&output, CLEANED_MARKER, &[&source], clean.force)?;
            let records = load_saved_records(&source)?;
            clean_records(&records, &output, &clean)?;
        }
        Command::Run {
            artist,
            output,
            raw,
            fetch,
            clean,
        } => {
            let sources: Vec<&Path> = raw.iter().map(PathBuf::as_path).collect();
            validate_output_path(&output, CLEANED_MARKER, &sources, clean.force)?;

            let records = fetch_records(&artist, &fetch)?;
            if let Some(raw) = &raw {
                write_raw_records(raw, &records)
                    .with_context(|| format!("Failed to write {}", raw.display()))?;
                println!("Raw data saved to {:?}", raw);
            }
            clean_records(&records, &output, &clean)?;
        }
        Command::Play { dataset, mode, seed } => {
            return play(&dataset, mode, seed);
        }
    }

    eprintln!("Elapsed: {}", format_duration(start.elapsed()));
    Ok(())
}
