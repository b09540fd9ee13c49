// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use studyme::app_config::{self, Config};
use studyme::database::models::{QueryOutcome, ResultSet, display_value};
use studyme::document;
use studyme::views;
use studyme::{AppError, MarkPreferences, NewQuestion, StudySession};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage boards
    #[command(subcommand)]
    Board(BoardCommand),

    /// Add and list questions
    #[command(subcommand)]
    Question(QuestionCommand),

    /// Manage playlists
    #[command(subcommand)]
    Playlist(PlaylistCommand),

    /// Generate a mock test paper
    Paper {
        /// Number of questions to draw
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Preferred mark values, comma separated (e.g. '5,3')
        #[arg(long)]
        marks: Option<String>,
    },

    /// Export the whole store as a SQLite file
    Export {
        /// Output file or directory (current directory by default)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// Replace the whole store with an exported SQLite file
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Split a text document (or every document in a directory) into questions
    Ingest {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Run an ad hoc read-only SQL query against the store
    Query {
        #[arg(value_name = "SQL")]
        sql: String,
    },

    /// Show row counts for every table
    Stats,

    /// Generate shell completions for studyme
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum BoardCommand {
    /// Create a board
    Add { name: String },
    /// List boards, newest first
    List,
    /// Show one board with its subjects
    Show { id: i64 },
}

#[derive(Subcommand, Debug)]
enum QuestionCommand {
    /// Add a single question
    Add {
        /// Question text
        text: String,

        /// Marks
        #[arg(short, long)]
        marks: Option<i64>,

        /// Subject name (needs --board)
        #[arg(short, long)]
        subject: Option<String>,

        /// Chapter name (needs --subject)
        #[arg(long, requires = "subject")]
        chapter: Option<String>,

        /// Exam year
        #[arg(short, long)]
        year: Option<i64>,

        /// Free-form tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Add questions in quick-add format: marks|subject|chapter|year|text
    Quick {
        /// File to read, or '-' for stdin (the default)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// List questions of the active board (or all boards)
    List,
}

#[derive(Subcommand, Debug)]
enum PlaylistCommand {
    /// Create a playlist
    Create { name: String },
    /// List playlists with item counts
    List {
        /// Show only the most recently created playlists
        #[arg(long)]
        recent: bool,
    },
    /// Show the questions in a playlist
    Show { id: i64 },
    /// Delete a playlist and its items
    Delete { id: i64 },
    /// Add a question to a playlist
    Add { id: i64, question_id: i64 },
    /// Remove a question from a playlist
    Remove { id: i64, question_id: i64 },
}

/// StudyMe - exam question organizer
///
/// Collects past exam questions by board, subject and chapter, groups them
/// into playlists and draws mock test papers from them.
#[derive(Parser, Debug)]
#[command(name = "studyme")]
#[command(version)]
#[command(about = "Exam question organizer and mock test paper generator")]
#[command(long_about = "StudyMe keeps exam questions in a local SQLite store and draws mock test papers from them.

EXAMPLES:
    studyme board add CBSE                         # Create a board
    studyme --board 1 question quick questions.txt # Bulk add under board 1
    echo '5|Physics|Motion|2021|What is velocity?' | studyme --board 1 question quick
    studyme --board 1 paper -n 10 --marks 5,3      # Draw 10 questions, favouring 5 and 3 marks
    studyme playlist list --recent                 # Most recently created playlists
    studyme export backup/                         # Write the store to backup/studyme-db.sqlite
    studyme import backup/studyme-db.sqlite        # Replace the store
    studyme completions bash > studyme.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Active board for this invocation
    #[arg(short, long, global = true, env = "STUDYME_BOARD")]
    board: Option<i64>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is narrowed once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "studyme", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    config
        .validate()
        .context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));

    let mut session = StudySession::open(config)?;
    if cli.board.is_some() {
        session.select_board(cli.board)?;
    }

    if let Err(e) = run_command(&mut session, cli.command).await {
        let e = AppError::from(e);
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run_command(session: &mut StudySession, command: Commands) -> Result<()> {
    match command {
        Commands::Board(cmd) => run_board(session, cmd),
        Commands::Question(cmd) => run_question(session, cmd),
        Commands::Playlist(cmd) => run_playlist(session, cmd),
        Commands::Paper { count, marks } => {
            let count = count.unwrap_or(session.config().paper.default_count);
            let preferences = marks
                .as_deref()
                .map(MarkPreferences::parse)
                .unwrap_or_else(MarkPreferences::none);

            let paper = session.generate_paper(count, &preferences)?;
            if paper.len() < count {
                warn!(
                    "Only {} distinct question(s) available, {} requested",
                    paper.len(),
                    count
                );
            }
            print!("{}", views::render_paper(&paper));
            Ok(())
        }
        Commands::Export { path } => {
            let target = path.unwrap_or_else(|| PathBuf::from("."));
            let written = session.export_to_file(&target)?;
            println!("{}", written.display());
            Ok(())
        }
        Commands::Import { path } => {
            let outcome = session.import_file(&path).await?;
            info!("Imported {} bytes", outcome.bytes);
            println!("{}", session.stats()?);
            Ok(())
        }
        Commands::Ingest { path } => ingest_path(session, &path).await,
        Commands::Query { sql } => {
            match session.query(&sql, &[]) {
                QueryOutcome::Rows(rows) => print!("{}", render_result_set(&rows)),
                QueryOutcome::Failed(reason) => return Err(anyhow!("SQL error: {}", reason)),
            }
            Ok(())
        }
        Commands::Stats => {
            println!("{}", session.stats()?);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn run_board(session: &mut StudySession, cmd: BoardCommand) -> Result<()> {
    match cmd {
        BoardCommand::Add { name } => {
            let id = session.create_board(&name)?;
            println!("{}", id);
        }
        BoardCommand::List => print!("{}", views::render_boards(&session.boards()?)),
        BoardCommand::Show { id } => {
            let board = session
                .board(id)?
                .ok_or_else(|| anyhow!("Board {} does not exist", id))?;
            println!("[{}] {}", board.id, board.name);
            for subject in session.subjects(id)? {
                println!("    {}", subject.name);
            }
        }
    }
    Ok(())
}

fn run_question(session: &mut StudySession, cmd: QuestionCommand) -> Result<()> {
    match cmd {
        QuestionCommand::Add {
            text,
            marks,
            subject,
            chapter,
            year,
            tags,
        } => {
            if subject.is_some() && session.active_board().is_none() {
                warn!("No active board, the subject and chapter are ignored");
            }
            let id = session.add_question(NewQuestion {
                text,
                marks,
                subject,
                chapter,
                year,
                tags,
            })?;
            println!("{}", id);
        }
        QuestionCommand::Quick { file } => {
            let text = match file {
                Some(path) if path != Path::new("-") => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read quick-add file {:?}", path))?,
                _ => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read quick-add text from stdin")?;
                    buffer
                }
            };

            let ids = session.quick_add(&text)?;
            println!("Added {} question(s)", ids.len());
        }
        QuestionCommand::List => print!("{}", views::render_questions(&session.questions()?)),
    }
    Ok(())
}

fn run_playlist(session: &mut StudySession, cmd: PlaylistCommand) -> Result<()> {
    match cmd {
        PlaylistCommand::Create { name } => {
            let id = session.create_playlist(&name)?;
            println!("{}", id);
        }
        PlaylistCommand::List { recent: true } => {
            print!("{}", views::render_recent_playlists(&session.recent_playlists()?))
        }
        PlaylistCommand::List { recent: false } => {
            print!("{}", views::render_playlists(&session.playlists()?))
        }
        PlaylistCommand::Show { id } => {
            print!(
                "{}",
                views::render_playlist_contents(&session.playlist_contents(id)?)
            );
        }
        PlaylistCommand::Delete { id } => {
            let removed = session.delete_playlist(id)?;
            println!("Deleted playlist {} ({} item(s))", id, removed);
        }
        PlaylistCommand::Add { id, question_id } => {
            session.add_to_playlist(id, question_id)?;
        }
        PlaylistCommand::Remove { id, question_id } => {
            session.remove_from_playlist(id, question_id)?;
        }
    }
    Ok(())
}

async fn ingest_path(session: &mut StudySession, path: &Path) -> Result<()> {
    if path.is_file() {
        let ids = session.ingest_file(path).await?;
        println!("Ingested {} question(s)", ids.len());
        return Ok(());
    }

    if !path.is_dir() {
        return Err(anyhow!("Input path does not exist: {:?}", path));
    }

    info!("Ingesting documents from directory: {:?}", path);
    let mut total = 0;
    let mut processed_count = 0;
    for file in document::collect_documents(path) {
        match session.ingest_file(&file).await {
            Ok(ids) => {
                total += ids.len();
                processed_count += 1;
            }
            Err(e) => error!("Error ingesting {:?}: {}", file, e),
        }
    }

    info!("Finished processing {} files", processed_count);
    println!("Ingested {} question(s)", total);
    Ok(())
}

fn render_result_set(rows: &ResultSet) -> String {
    let mut out = String::new();
    if !rows.columns.is_empty() {
        out.push_str(&rows.columns.join(" | "));
        out.push('\n');
    }
    for row in &rows.rows {
        let cells: Vec<String> = row.iter().map(display_value).collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out
}
