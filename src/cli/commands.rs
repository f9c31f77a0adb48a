use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::app::App;
use crate::catalog::{Conte, Devinette, Difficulty};
use crate::cli::{Cli, ConteCommand, DevinetteCommand};
use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::outcome::Fold;
use crate::storage::{CatalogRepository, RepositoryStats, RiddleRepository};
use crate::usecases::{
    ConteRepo, DownloadConte, GetAllContes, GetAllDevinettes, GetConteById, GetContesByCategory,
    GetFreeContes, GetHint, GetPremiumContes, HintParams, NoParams, RiddleRepo, SearchContes,
    SubmitAnswer, SubmitAnswerParams, UseCase,
};

/// Write a default configuration file
pub fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        warn!("Configuration file already exists: {}", config_path.display());
        println!("Configuration already exists: {}", config_path.display());
        println!("   Use --force to overwrite it.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(config_path, create_default_config())?;
    info!("Created default configuration: {}", config_path.display());

    println!("✅ Zirin initialized");
    println!("   Config file: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("   1. Warm the cache: zirin sync");
    println!("   2. Browse stories: zirin contes list");

    Ok(())
}

pub async fn contes(app: &App, action: ConteCommand) -> Result<()> {
    let repo: ConteRepo = app.contes.clone();

    match action {
        ConteCommand::List { free, premium } => {
            let contes = if free {
                GetFreeContes::new(repo).call(NoParams).await?
            } else if premium {
                GetPremiumContes::new(repo).call(NoParams).await?
            } else {
                GetAllContes::new(repo).call(NoParams).await?
            };
            print_contes(&contes);
        }
        ConteCommand::Show { id } => {
            let conte = GetConteById::new(repo).call(id).await?;
            print_conte(&conte);
        }
        ConteCommand::Search { query } => {
            let contes = SearchContes::new(repo).call(query).await?;
            print_contes(&contes);
        }
        ConteCommand::Category { name } => {
            let contes = GetContesByCategory::new(repo).call(name).await?;
            print_contes(&contes);
        }
        ConteCommand::Download { id } => {
            DownloadConte::new(repo).call(id.clone()).await?;
            println!("📥 Conte {} disponible hors ligne", id);
        }
    }

    log_stats("contes", &app.contes.stats());
    Ok(())
}

pub async fn devinettes(app: &App, action: DevinetteCommand) -> Result<()> {
    let repo: RiddleRepo = app.devinettes.clone();

    match action {
        DevinetteCommand::List { difficulty } => {
            let riddles = match difficulty {
                Some(level) => {
                    let level: Difficulty = level.parse()?;
                    repo.get_by_difficulty(level).await?
                }
                None => GetAllDevinettes::new(repo).call(NoParams).await?,
            };
            print_devinettes(&riddles);
        }
        DevinetteCommand::Hint { id, index } => {
            let hint = GetHint::new(repo)
                .call(HintParams { devinette_id: id, index })
                .await?;
            println!("💡 {}", hint);
        }
        DevinetteCommand::Answer { id, answer } => {
            let result = SubmitAnswer::new(repo)
                .call(SubmitAnswerParams { devinette_id: id, user_answer: answer })
                .await?;
            if result.is_correct {
                println!("✅ Bonne réponse ! +{} points", result.points_earned);
            } else {
                println!("❌ Mauvaise réponse, essaie encore.");
            }
        }
    }

    log_stats("devinettes", &app.devinettes.stats());
    Ok(())
}

/// Populate both caches concurrently. A failure on one side does not stop
/// the other; the first failure is returned once both have settled.
pub async fn sync(app: &App) -> Result<()> {
    let contes = Arc::clone(&app.contes);
    let devinettes = Arc::clone(&app.devinettes);

    let (contes, devinettes) = futures::future::join(contes.get_all(), devinettes.get_all()).await;

    let contes = contes.fold(
        |failure| {
            println!("❌ Contes: {}", failure);
            Some(failure)
        },
        |items| {
            println!("✅ Contes: {} en cache", items.len());
            None
        },
    );
    let devinettes = devinettes.fold(
        |failure| {
            println!("❌ Devinettes: {}", failure);
            Some(failure)
        },
        |items| {
            println!("✅ Devinettes: {} en cache", items.len());
            None
        },
    );

    log_stats("contes", &app.contes.stats());
    log_stats("devinettes", &app.devinettes.stats());

    match contes.or(devinettes) {
        Some(failure) => Err(Error::from(failure)),
        None => Ok(()),
    }
}

fn log_stats(collection: &str, stats: &RepositoryStats) {
    debug!(
        collection,
        hits = stats.cache_hits,
        misses = stats.cache_misses,
        hit_rate = stats.hit_rate(),
        remote_fetches = stats.remote_fetches,
        remote_failures = stats.remote_failures,
        write_back_failures = stats.write_back_failures,
        "Repository stats"
    );
}

pub async fn clear_cache(app: &App) -> Result<()> {
    app.contes.clear_cache().await?;
    app.devinettes.clear_cache().await?;
    println!("🗑️  Cache vidé");
    Ok(())
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "zirin", &mut io::stdout());
}

/// Initialize logging from the config, with CLI flags taking precedence.
///
/// The returned guard must live as long as logging is needed when a log
/// file is configured.
pub fn init_logging(config: &LoggingConfig, debug: bool, verbose: bool) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let (writer, guard) = if config.log_to_file {
        let path = Config::config_dir()?.join(&config.log_file);
        let dir = path
            .parent()
            .ok_or_else(|| Error::Config(format!("Invalid log file path: {}", path.display())))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Config(format!("Invalid log file path: {}", path.display())))?;
        fs::create_dir_all(dir)?;
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(writer), Some(guard))
    } else {
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(io::stderr), None)
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(writer);

    // A subscriber may already be installed (tests, embedding); keep it.
    let installed = if config.json_format {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        debug!("Logging initialized");
    }
    Ok(guard)
}

fn create_default_config() -> String {
    format!(
        r#"# Zirin configuration
# Generated on {}

[api]
# Catalog API (can be overridden with ZIRIN_API_URL)
base_url = "https://api.zirin.app"

# HTTP timeout in seconds
timeout_secs = 30

[cache]
# Directory for cached catalogs (defaults to the platform cache directory)
# dir = "/path/to/cache"

# Keep the cache in memory only
in_memory = false

[logging]
# Log level: error, warn, info, debug, trace
level = "info"

# Log to file (relative to the config directory)
log_to_file = false
log_file = "logs/zirin.log"

# Emit JSON log lines
json_format = false
"#,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn print_contes(contes: &[Conte]) {
    if contes.is_empty() {
        println!("Aucun conte.");
        return;
    }
    for conte in contes {
        let badge = if conte.is_premium { "⭐" } else { "  " };
        println!("{} {:<12} {:<40} [{}]", badge, conte.id, conte.title, conte.category);
    }
}

fn print_conte(conte: &Conte) {
    println!("📖 {}{}", conte.title, if conte.is_premium { " ⭐" } else { "" });
    println!("   {}", conte.description);
    println!("   Catégorie: {}", conte.category);
    for page in conte.ordered_pages() {
        println!();
        println!("   [page {}]", page.page_number);
        println!("   {}", page.text);
    }
    if let Some(moral) = &conte.moral {
        println!();
        println!("   Morale: {}", moral);
    }
    for track in &conte.audio_tracks {
        println!("   🔊 {:?} ({}s): {}", track.language, track.duration, track.url);
    }
}

fn print_devinettes(riddles: &[Devinette]) {
    if riddles.is_empty() {
        println!("Aucune devinette.");
        return;
    }
    for riddle in riddles {
        println!(
            "{:<12} {:<10} {:>3} pts  {}",
            riddle.id, riddle.difficulty, riddle.points, riddle.question
        );
    }
}
