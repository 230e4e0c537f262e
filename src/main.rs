use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use shakmaty::Color;

use moonbot::book::OpeningBook;
use moonbot::cache::{self, PositionCache};
use moonbot::play::{self, PlayOptions};
use moonbot::rules::Game;
use moonbot::search::{detect_backend, validate_depth};
use moonbot::selector::MoveSelector;
use moonbot::types::{
    EngineConfig, DEFAULT_BOOK_PATH, DEFAULT_CACHE_PATH, DEFAULT_DEPTH, DEFAULT_MAX_POSITIONS,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Side {
    White,
    Black,
}

#[derive(Parser, Debug)]
#[command(name = "moonbot")]
#[command(about = "Play chess against MoonBot or precompute its position cache")]
struct Cli {
    /// Search depth in plies
    #[arg(long, default_value_t = DEFAULT_DEPTH as u32)]
    depth: u32,

    #[arg(long, value_enum, default_value_t = Side::White)]
    play_as: Side,

    /// Engine plays both sides
    #[arg(long)]
    bot_vs_bot: bool,

    /// Build the position cache and exit
    #[arg(long)]
    generate_cache: bool,

    /// Cap on positions processed by --generate-cache
    #[arg(long, default_value_t = DEFAULT_MAX_POSITIONS)]
    max_positions: usize,

    #[arg(long, default_value = DEFAULT_CACHE_PATH)]
    cache: PathBuf,

    /// PGN corpus for the opening book
    #[arg(long, default_value = DEFAULT_BOOK_PATH)]
    book: PathBuf,

    /// Use the built-in repertoire instead of a PGN corpus
    #[arg(long)]
    builtin_book: bool,

    /// Start from this position instead of the initial one
    #[arg(long)]
    fen: Option<String>,

    /// Force the portable search backend
    #[arg(long)]
    reference_search: bool,
}

impl Cli {
    fn config(&self) -> Result<EngineConfig> {
        Ok(EngineConfig {
            depth: validate_depth(self.depth)?,
            book_path: self.book.clone(),
            builtin_book: self.builtin_book,
            cache_path: self.cache.clone(),
            max_positions: self.max_positions,
            prefer_reference: self.reference_search,
        })
    }

    fn start(&self) -> Result<Game> {
        match &self.fen {
            Some(fen) => Game::from_fen(fen).context("bad --fen"),
            None => Ok(Game::default()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = cli.config()?;
    let mut game = cli.start()?;

    if cli.generate_cache {
        let run = cache::generate(&game, config.depth, config.max_positions);
        run.cache
            .save(&config.cache_path)
            .with_context(|| format!("writing {}", config.cache_path.display()))?;
        println!(
            "Move cache generated for {} positions at depth {}.",
            run.processed, config.depth
        );
        return Ok(());
    }

    let book = if config.builtin_book {
        OpeningBook::builtin()
    } else {
        OpeningBook::load_or_empty(&config.book_path)
    };
    let cache = PositionCache::load_or_empty(&config.cache_path);
    let mut selector = MoveSelector::new(book, cache, detect_backend(config.prefer_reference));

    let human = match (cli.bot_vs_bot, cli.play_as) {
        (true, _) => None,
        (false, Side::White) => Some(Color::White),
        (false, Side::Black) => Some(Color::Black),
    };
    let opts = PlayOptions {
        depth: config.depth,
        human,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let summary = play::run(&mut game, &mut selector, opts, stdin.lock(), &mut stdout)?;
    info!("{:?}", summary);
    Ok(())
}
