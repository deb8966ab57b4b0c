use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use path_finder::accounts::{AccountError, AccountService, GoogleIdentityVerifier};
use path_finder::assessment::{AssessmentError, AssessmentService};
use path_finder::chat::{ChatError, Conversation, TogetherChat};
use path_finder::config::{Config, StorageBackend};
use path_finder::quiz::{Answer, QuizConfig, Recommendation};
use path_finder::storage::{self, Session, StorageError, UserRepository};
use path_finder::transcribe::{TogetherTranscriber, Transcriber, TranscriptionError};
use path_finder::{credentials, output, wizard};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_IO: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_INVALID: i32 = 5;

#[derive(Debug, thiserror::Error)]
#[error("Not logged in. Run `path-finder login` or `path-finder signup` first.")]
struct NotLoggedIn;

#[derive(Debug, thiserror::Error)]
#[error("Identity login is not configured. Add an `identity` section with your client_id to the config file.")]
struct IdentityNotConfigured;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the questions and their options
    Questions,
    /// Take the quiz interactively
    Take,
    /// Submit answers from a JSON file: [{"question_id": 1, "answer": "..."}, ...]
    Submit {
        #[arg(long)]
        answers: PathBuf,
    },
    /// Show your latest recommendations (default if no subcommand)
    Results {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Clear your answers and recommendations
    Reset,
    /// Create an account and log in
    Signup {
        username: Option<String>,
    },
    /// Log in with a password, or with a Google ID token
    Login {
        username: Option<String>,
        #[arg(long, conflicts_with = "username")]
        id_token: Option<String>,
    },
    /// Forget the logged-in user on this machine
    Logout,
    /// Ask a guide about a tradition (interactive unless --message or --audio is given)
    Chat {
        /// Tradition key or name, e.g. "buddhism" or "New Age Spirituality"
        #[arg(short, long)]
        tradition: String,
        #[arg(short, long)]
        message: Option<String>,
        /// Audio file whose transcript is sent as the message
        #[arg(long, conflicts_with = "message")]
        audio: Option<PathBuf>,
    },
    /// Print the transcript of an audio file
    Transcribe {
        file: PathBuf,
    },
    /// Validate the configuration and quiz data, then exit
    CheckConfig,
}

#[derive(Parser, Debug)]
#[command(name = "path-finder")]
#[command(about = "Find the spiritual path that fits you", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/path-finder/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Collaborators shared by every command
struct App {
    config: Config,
    quiz: Arc<QuizConfig>,
    repo: Arc<dyn UserRepository>,
    session_path: PathBuf,
    use_colors: bool,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    path_finder::logging::init_logging(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Results {
        format: OutputFormat::Table,
    });

    let config_path = cli.config;
    let config = match path_finder::config::load_config(config_path.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let mut quiz = config.quiz.clone().unwrap_or_default();
    if let Some(path) = &config.chat.reference_file {
        match path_finder::config::load_references(path) {
            Ok(references) => {
                for name in quiz.apply_references(references) {
                    tracing::warn!(%name, "reference notes match no tradition");
                }
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    // Validate quiz data at startup
    let quiz = Arc::new(quiz);
    if let Err(errors) = path_finder::quiz::validate_quiz(&quiz) {
        eprintln!("Quiz config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    for key in path_finder::quiz::unmapped_keys(&quiz) {
        tracing::warn!(%key, "tradition has no descriptor and will never be recommended");
    }

    if config.storage.backend == StorageBackend::Memory {
        tracing::warn!("in-memory user store: accounts and results are lost when the command exits");
    }

    let app = App {
        repo: storage::open_repository(&config.storage),
        config,
        quiz,
        session_path: storage::get_session_path(),
        use_colors: output::should_use_colors(),
    };

    let code = match run(&app, command, config_path.as_deref()).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code(&e)
        }
    };

    std::process::exit(code);
}

async fn run(app: &App, command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Questions => {
            println!("{}", output::format_questions(&app.quiz, app.use_colors));
        }
        Commands::Take => {
            let username = require_session(app)?.username;
            let assessment = AssessmentService::new(app.quiz.clone(), app.repo.clone());

            if !assessment.results(&username)?.is_empty()
                && !wizard::prompt_yes_no(
                    "You already have results. Retake the quiz? (replaces them)",
                    false,
                )?
            {
                return Ok(());
            }

            if let Some(answers) = wizard::run_quiz_wizard(&app.quiz)? {
                let recs = assessment.submit(&username, answers)?;
                print_fresh_results(&recs, app.use_colors);
            }
        }
        Commands::Submit { answers } => {
            let username = require_session(app)?.username;
            let answers = read_answers(&answers)?;

            let recs = AssessmentService::new(app.quiz.clone(), app.repo.clone())
                .submit(&username, answers)?;
            print_fresh_results(&recs, app.use_colors);
        }
        Commands::Results { format } => {
            let username = require_session(app)?.username;
            let recs = AssessmentService::new(app.quiz.clone(), app.repo.clone()).results(&username)?;

            match format {
                OutputFormat::Table => {
                    println!("{}", output::format_recommendations(&recs, app.use_colors))
                }
                OutputFormat::Tsv => {
                    let tsv = output::format_tsv(&recs);
                    if !tsv.is_empty() {
                        println!("{}", tsv);
                    }
                }
                OutputFormat::Json => println!(
                    "{}",
                    output::format_json(&recs).context("Failed to serialize results")?
                ),
            }
        }
        Commands::Reset => {
            let username = require_session(app)?.username;
            AssessmentService::new(app.quiz.clone(), app.repo.clone()).reset(&username)?;
            println!("Your answers and results have been cleared.");
        }
        Commands::Signup { username } => {
            let username = match username {
                Some(name) => name,
                None => credentials::prompt_username()?,
            };
            let password = credentials::prompt_new_password()?;

            let username = AccountService::new(app.repo.clone()).signup(&username, &password)?;
            storage::save_session(&app.session_path, &Session::new(username.clone()))?;
            println!("Account created. Logged in as {}.", username);
        }
        Commands::Login { username, id_token } => {
            let accounts = AccountService::new(app.repo.clone());

            let username = match id_token {
                Some(token) => {
                    let identity = app.config.identity.as_ref().ok_or(IdentityNotConfigured)?;
                    let verifier = GoogleIdentityVerifier::new(identity);
                    accounts.login_with_identity(&verifier, &token).await?
                }
                None => {
                    let (username, password) = credentials::prompt_login(username)?;
                    accounts.login(&username, &password)?
                }
            };

            storage::save_session(&app.session_path, &Session::new(username.clone()))?;
            println!("Logged in as {}.", username);
        }
        Commands::Logout => {
            if storage::clear_session(&app.session_path)? {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
        }
        Commands::Chat {
            tradition,
            message,
            audio,
        } => {
            require_session(app)?;
            run_chat(app, &tradition, message, audio).await?;
        }
        Commands::Transcribe { file } => {
            let transcriber = transcriber(app)?;
            println!("{}", transcriber.transcribe(&file).await?);
        }
        Commands::CheckConfig => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(path_finder::config::get_config_path);
            println!("Config OK ({})", path.display());
            println!(
                "  quiz: {} questions, {} traditions, {} aliases{}",
                app.quiz.questions.len(),
                app.quiz.traditions.len(),
                app.quiz.aliases.len(),
                if app.config.quiz.is_some() { "" } else { " (built-in)" }
            );
            println!("  storage: {:?}", app.config.storage.backend);
            if let Some(references) = &app.config.chat.reference_file {
                println!("  chat references: {}", references.display());
            }
            println!(
                "  identity login: {}",
                if app.config.identity.is_some() { "enabled" } else { "disabled" }
            );
            println!(
                "  chat: {}",
                if credentials::get_api_key_from_env().is_some() {
                    "API key found"
                } else {
                    "no API key (set TOGETHER_API_KEY)"
                }
            );
        }
    }

    Ok(())
}

async fn run_chat(
    app: &App,
    tradition: &str,
    message: Option<String>,
    audio: Option<PathBuf>,
) -> Result<()> {
    let api_key = credentials::get_api_key_from_env().ok_or(ChatError::NotConfigured)?;
    let client = TogetherChat::new(&app.config.chat, api_key)?;
    let mut conversation = Conversation::start(
        &app.quiz,
        tradition,
        Arc::new(client),
        app.config.chat.history_limit,
    )?;

    let first = match audio {
        Some(path) => {
            let text = transcriber(app)?.transcribe(&path).await?;
            println!("You said: {}", text);
            Some(text)
        }
        None => message,
    };

    if let Some(first) = first {
        let reply = conversation.send(&first).await?;
        println!("{}", output::format_reply(&reply));
        return Ok(());
    }

    println!(
        "Chatting about {}. Empty line or /quit to leave.",
        conversation.tradition()
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line == "/quit" {
            break;
        }

        match conversation.send(line).await {
            Ok(reply) => println!("{}\n", output::format_reply(&reply)),
            // Keep the session going; the next question may succeed
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

fn transcriber(app: &App) -> Result<TogetherTranscriber> {
    let api_key = credentials::get_api_key_from_env().ok_or(TranscriptionError::NotConfigured)?;
    Ok(TogetherTranscriber::new(&app.config.transcription, api_key)?)
}

fn require_session(app: &App) -> Result<Session> {
    storage::load_session(&app.session_path)?.ok_or_else(|| NotLoggedIn.into())
}

fn read_answers(path: &Path) -> Result<Vec<Answer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers file at {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid answers file {}", path.display()))
}

fn print_fresh_results(recs: &[Recommendation], use_colors: bool) {
    if recs.is_empty() {
        println!("None of the traditions matched your answers.");
    } else {
        println!("Your top matches:\n");
        println!("{}", output::format_recommendations(recs, use_colors));
    }
}

/// Map a failure to the process exit code, using the first domain error in the chain
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<NotLoggedIn>() {
            return EXIT_AUTH;
        }
        if cause.is::<IdentityNotConfigured>() {
            return EXIT_CONFIG;
        }
        if let Some(e) = cause.downcast_ref::<AccountError>() {
            return match e {
                AccountError::IdentityUnavailable(_) => EXIT_NETWORK,
                AccountError::Hashing(_) | AccountError::Storage(_) => EXIT_IO,
                AccountError::MissingCredentials
                | AccountError::UsernameTaken
                | AccountError::InvalidCredentials
                | AccountError::IdentityRejected(_) => EXIT_AUTH,
            };
        }
        if let Some(e) = cause.downcast_ref::<AssessmentError>() {
            return match e {
                AssessmentError::Submission(_) => EXIT_INVALID,
                AssessmentError::UnknownUser(_) => EXIT_AUTH,
                AssessmentError::Storage(_) => EXIT_IO,
            };
        }
        if let Some(e) = cause.downcast_ref::<ChatError>() {
            return match e {
                ChatError::NotConfigured | ChatError::InvalidTimeout(_) => EXIT_CONFIG,
                ChatError::MissingInput | ChatError::UnknownTradition(_) => EXIT_INVALID,
                ChatError::Http(_) | ChatError::Status { .. } | ChatError::EmptyResponse => {
                    EXIT_NETWORK
                }
            };
        }
        if let Some(e) = cause.downcast_ref::<TranscriptionError>() {
            return match e {
                TranscriptionError::NotConfigured | TranscriptionError::InvalidTimeout(_) => {
                    EXIT_CONFIG
                }
                TranscriptionError::Read { .. } | TranscriptionError::Empty(_) => EXIT_INVALID,
                TranscriptionError::Http(_) | TranscriptionError::Status { .. } => EXIT_NETWORK,
            };
        }
        if cause.is::<StorageError>() {
            return EXIT_IO;
        }
        if cause.is::<serde_json::Error>() {
            // Only the answers file is parsed without a storage wrapper
            return EXIT_INVALID;
        }
    }
    EXIT_IO
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_finder::assessment::SubmissionError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&anyhow::Error::new(NotLoggedIn)), EXIT_AUTH);
        assert_eq!(
            exit_code(&anyhow::Error::new(AccountError::InvalidCredentials)),
            EXIT_AUTH
        );
        assert_eq!(
            exit_code(&anyhow::Error::new(AssessmentError::Submission(
                SubmissionError::Incomplete {
                    expected: 8,
                    got: 7
                }
            ))),
            EXIT_INVALID
        );
        assert_eq!(
            exit_code(&anyhow::Error::new(ChatError::NotConfigured)),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code(&anyhow::Error::new(ChatError::Status {
                status: 502,
                body: String::new()
            })),
            EXIT_NETWORK
        );
        assert_eq!(exit_code(&anyhow::anyhow!("disk on fire")), EXIT_IO);
    }

    #[test]
    fn test_exit_code_looks_through_context() {
        let err = anyhow::Error::new(AccountError::UsernameTaken).context("Signup failed");
        assert_eq!(exit_code(&err), EXIT_AUTH);
    }

    #[test]
    fn test_read_answers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(
            &path,
            r#"[{"question_id": 1, "answer": "Uncertain or unknowable"}]"#,
        )
        .unwrap();
        assert_eq!(
            read_answers(&path).unwrap(),
            vec![Answer::new(1, "Uncertain or unknowable")]
        );

        std::fs::write(&path, "not json").unwrap();
        let err = read_answers(&path).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_INVALID);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["path-finder", "results", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Results {
                format: OutputFormat::Json
            })
        ));

        let cli = Cli::try_parse_from([
            "path-finder",
            "-v",
            "chat",
            "--tradition",
            "zen",
            "--message",
            "What is a koan?",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Chat { .. })));

        assert!(Cli::try_parse_from([
            "path-finder",
            "chat",
            "-t",
            "zen",
            "-m",
            "hi",
            "--audio",
            "q.wav"
        ])
        .is_err());
    }
}
