use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Import from redline-core (re-exported by the CLI crate)
use redline_cli::templates::{find_template, PROMPT_TEMPLATES};
use redline_cli::{
    markup, AnalysisResult, ApiClient, ChangeLogger, ChatMessage, EditorConfig, EditorSession,
    FileSessionStore, HeuristicClassifier, MessageKind, NoOpChangeLogger, PromptClassifier,
    SessionStore, SuggestionApplier,
};

// Import CLI utilities
use redline_cli::profile::ANONYMOUS;
use redline_cli::ProfileStore;

#[derive(Parser)]
#[command(name = "redline")]
#[command(about = "Upload documents, ask for AI analysis and apply suggested edits")]
struct Cli {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "REDLINE_API_URL")]
    api_url: Option<String>,

    /// Where the editing session is kept between invocations
    #[arg(long, global = true, default_value = ".redline/session.json")]
    session: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record the username that uploads and edits are attributed to
    Login { username: String },

    /// Forget the logged-in username
    Logout,

    /// Show the logged-in username and the open document
    Whoami,

    /// Upload a PDF or DOCX and start a new session with its text
    Open {
        file: PathBuf,
        /// Document name (defaults to the name the backend reports)
        #[arg(long)]
        name: Option<String>,
    },

    /// Start a new session from a local text or HTML file, without the backend
    Load {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Treat the file as markup instead of plain text
        #[arg(long)]
        html: bool,
    },

    /// Ask a question or request an analysis of the open document
    Prompt {
        /// Prompt text; empty means "analyze the whole document"
        #[arg(num_args = 0..)]
        words: Vec<String>,
        /// Use a built-in prompt template instead (see `templates`)
        #[arg(short, long, conflicts_with = "words")]
        template: Option<String>,
    },

    /// List the built-in prompt templates
    Templates,

    /// Show where a prompt would be routed, without sending it
    Classify {
        #[arg(num_args = 0..)]
        words: Vec<String>,
    },

    /// Print the current document markup
    Show {
        /// Strip tags and decode entities
        #[arg(long)]
        plain: bool,
    },

    /// List issues from the latest analysis
    Issues,

    /// Apply the suggestion of one or more issues, by index
    Apply {
        #[arg(required = true)]
        indices: Vec<usize>,
        /// Do not send the change to the backend log
        #[arg(long)]
        no_log: bool,
    },

    /// Replace the document markup with the contents of a file
    Edit { file: PathBuf },

    /// Write the current document to a file (or stdout)
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        plain: bool,
    },

    /// Print the conversation so far
    Transcript,

    /// Show change logs (global by default)
    Logs {
        /// List the logged-in user's documents with change logs
        #[arg(long)]
        user: bool,
        /// Show the logged-in user's change log for one document
        #[arg(long)]
        document: Option<String>,
    },

    /// Browse stored projects of the logged-in user
    Projects {
        #[arg(long)]
        document: Option<String>,
        /// Show the document's activity log
        #[arg(long, requires = "document")]
        activity: bool,
        /// Print one stored file of the document
        #[arg(long, requires = "document")]
        file: Option<String>,
    },
}

/// Everything a command needs, resolved once from flags, env and config
struct App {
    config: EditorConfig,
    store: FileSessionStore,
}

impl App {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = EditorConfig::load_with_fallback(cli.config.as_deref());
        if let Some(api_url) = &cli.api_url {
            config.api_url = api_url.clone();
        }

        Ok(Self {
            config,
            store: FileSessionStore::new(&cli.session),
        })
    }

    /// Resolved on demand so offline commands work without a data directory
    fn profile(&self) -> Result<ProfileStore> {
        ProfileStore::new()
    }

    fn username(&self) -> String {
        match self.profile() {
            Ok(profile) => profile.username(),
            Err(e) => {
                tracing::warn!("No login profile available: {e:#}");
                ANONYMOUS.to_string()
            }
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::from_config(&self.config)
    }

    fn applier(&self) -> SuggestionApplier {
        SuggestionApplier::from_config(&self.config)
    }

    fn session(&self) -> Result<EditorSession> {
        self.store.load()?.ok_or_else(|| {
            anyhow!("No document open. Run `redline open <file>` or `redline load <file>` first.")
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("redline_core=info,redline_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let app = App::from_cli(&cli)?;

    match cli.command {
        Command::Login { username } => {
            let record = app.profile()?.login(&username)?;
            if let Some(mut session) = app.store.load()? {
                session.username = record.username.clone();
                app.store.save(&session)?;
            }
            println!("✅ Logged in as {}", record.username);
        }
        Command::Logout => {
            if app.profile()?.logout()? {
                println!("👋 Logged out");
            } else {
                println!("⚠️  Nobody was logged in");
            }
        }
        Command::Whoami => whoami(&app)?,
        Command::Open { file, name } => open(&app, &file, name)?,
        Command::Load { file, name, html } => load(&app, &file, name, html)?,
        Command::Prompt { words, template } => {
            let prompt = match template {
                Some(name) => find_template(&name)
                    .map(|t| t.prompt.to_string())
                    .ok_or_else(|| anyhow!("Unknown template '{name}'. Run `redline templates`."))?,
                None => words.join(" "),
            };
            prompt_command(&app, &prompt)?;
        }
        Command::Templates => {
            let classifier = HeuristicClassifier::new();
            println!("📝 Prompt templates:");
            for template in PROMPT_TEMPLATES {
                println!(
                    "  {:<26} → {:?}",
                    template.name,
                    classifier.classify(template.prompt)
                );
                println!("      {}", template.prompt);
            }
        }
        Command::Classify { words } => {
            let kind = HeuristicClassifier::new().classify(&words.join(" "));
            println!("🧭 {kind:?}");
        }
        Command::Show { plain } => {
            let session = app.session()?;
            if plain {
                println!("{}", markup::plain_text(session.markup()));
            } else {
                println!("{}", session.markup());
            }
        }
        Command::Issues => {
            let session = app.session()?;
            if session.analysis().is_none() {
                println!("⚠️  No analysis yet. Run `redline prompt` first.");
            } else {
                print_issues(&session);
            }
        }
        Command::Apply { indices, no_log } => apply(&app, &indices, no_log)?,
        Command::Edit { file } => {
            let mut session = app.session()?;
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            session.set_markup(content);
            app.store.save(&session)?;
            println!("✏️  Markup replaced from {}", file.display());
        }
        Command::Export { output, plain } => {
            let session = app.session()?;
            let content = if plain {
                markup::plain_text(session.markup())
            } else {
                session.markup().to_string()
            };
            match output {
                Some(path) => {
                    fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("💾 Document saved to: {}", path.display());
                }
                None => println!("{content}"),
            }
        }
        Command::Transcript => {
            let session = app.session()?;
            if session.transcript().is_empty() {
                println!("💬 No messages yet");
            }
            for message in session.transcript() {
                print_message(message);
            }
        }
        Command::Logs { user, document } => logs(&app, user, document)?,
        Command::Projects {
            document,
            activity,
            file,
        } => projects(&app, document, activity, file)?,
    }

    Ok(())
}

fn whoami(app: &App) -> Result<()> {
    match app.profile()?.current()? {
        Some(record) => println!(
            "👤 {} (logged in {})",
            record.username,
            record.login_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("👤 {} (not logged in)", ANONYMOUS),
    }
    if let Some(session) = app.store.load()? {
        println!("📄 Open document: {}", session.document_name_or_default());
    }
    Ok(())
}

fn open(app: &App, file: &Path, name: Option<String>) -> Result<()> {
    let username = app.username();
    println!("📤 Uploading: {}", file.display());

    let uploaded = app.client().upload_document(file, &username)?;
    let name = name
        .or(uploaded.document_name)
        .unwrap_or_else(|| file_stem(file));

    let mut session = EditorSession::new(username);
    session.load_document(name, &uploaded.text);
    app.store.save(&session)?;

    if let Some(message) = uploaded.message {
        println!("   {message}");
    }
    println!(
        "✅ Opened '{}' ({} characters)",
        session.document_name_or_default(),
        uploaded.text.chars().count()
    );
    Ok(())
}

fn load(app: &App, file: &Path, name: Option<String>, html: bool) -> Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let name = name.unwrap_or_else(|| file_stem(file));

    let mut session = EditorSession::new(app.username());
    if html {
        session.load_markup(name, &content);
    } else {
        session.load_document(name, &content);
    }
    app.store.save(&session)?;

    println!("📄 Loaded '{}' from {}", session.document_name_or_default(), file.display());
    Ok(())
}

fn prompt_command(app: &App, prompt: &str) -> Result<()> {
    let mut session = app.session()?;
    let classifier = HeuristicClassifier::new();
    println!("🧭 Routing as {:?}", classifier.classify(prompt));

    let result = session.submit_prompt(prompt, &classifier, &app.client());
    // Keep the transcript, including the error message on failure
    app.store.save(&session)?;
    let reply = result?;

    match &reply.analysis_data {
        Some(analysis) => {
            print_analysis(analysis);
            print_issues(&session);
        }
        None => println!("🤖 {}", reply.content),
    }
    Ok(())
}

fn apply(app: &App, indices: &[usize], no_log: bool) -> Result<()> {
    let mut session = app.session()?;
    let applier = app.applier();
    let client = app.client();
    let logger: &dyn ChangeLogger = if no_log { &NoOpChangeLogger } else { &client };

    let mut failed = 0;
    for &index in indices {
        match session.apply_suggestion(index, &applier, logger) {
            Ok(outcome) => {
                let how = outcome
                    .strategy
                    .map(|s| format!("{s:?}"))
                    .unwrap_or_default();
                println!("✅ Applied #{index} ({how})");
            }
            Err(e) => {
                eprintln!("❌ #{index}: {e}");
                failed += 1;
            }
        }
    }
    app.store.save(&session)?;

    if failed > 0 {
        return Err(anyhow!(
            "{failed} of {} suggestions could not be applied",
            indices.len()
        ));
    }
    Ok(())
}

fn logs(app: &App, user: bool, document: Option<String>) -> Result<()> {
    let client = app.client();
    let username = app.username();

    if let Some(document) = document {
        let log = client.get_user_document_log(&username, &document)?;
        println!("📜 {document} ({} entries)", log.total_entries);
        print_log_content(&log.log_content, log.message.as_deref());
    } else if user {
        let logs = client.get_user_logs(&username)?;
        println!("📚 {} documents with change logs for {username}", logs.total_documents);
        for doc in &logs.documents {
            println!(
                "  {:<30} {:>4} entries   last change {}",
                doc.document_name,
                doc.total_entries,
                format_epoch(doc.last_modified)
            );
        }
    } else {
        let log = client.get_log()?;
        println!("📜 Change log ({} entries)", log.total_entries);
        print_log_content(&log.log_content, log.message.as_deref());
    }
    Ok(())
}

fn projects(
    app: &App,
    document: Option<String>,
    activity: bool,
    file: Option<String>,
) -> Result<()> {
    let client = app.client();
    let username = app.username();

    match (document, file) {
        (Some(document), Some(file)) => {
            print!("{}", client.project_file(&username, &document, &file)?);
        }
        (Some(document), None) if activity => {
            let log = client.document_activity(&username, &document)?;
            println!("🕑 Activity for {document} ({} entries)", log.total_entries);
            for entry in &log.log_entries {
                println!("  {}  {:<10} {}", entry.timestamp, entry.action, entry.description);
            }
        }
        (Some(document), None) => {
            let listing = client.list_projects(&username)?;
            let project = listing
                .projects
                .iter()
                .find(|p| p.document_name == document)
                .ok_or_else(|| anyhow!("No project named '{document}' for {username}"))?;
            println!("📁 {} (created {})", project.document_name, project.created);
            for file in &project.files {
                println!(
                    "  {:<40} {:>10} bytes  {:<10} {}",
                    file.name, file.size, file.file_type, file.modified
                );
            }
        }
        (None, _) => {
            let listing = client.list_projects(&username)?;
            println!("📁 {} projects for {username}", listing.total_projects);
            for project in &listing.projects {
                println!(
                    "  {:<30} {} files   created {}",
                    project.document_name,
                    project.files.len(),
                    project.created
                );
            }
        }
    }
    Ok(())
}

// ============================================================================
// Output helpers
// ============================================================================

fn print_analysis(analysis: &AnalysisResult) {
    if let Some(colleague) = &analysis.colleague_analysis {
        println!("🤖 {colleague}");
    }
    if let Some(intel) = &analysis.document_intelligence {
        println!("📑 {} for {}: {}", intel.document_type, intel.audience, intel.purpose);
        if !intel.assessment.is_empty() {
            println!("   {}", intel.assessment);
        }
    }
    if let Some(appeal) = &analysis.appeal_score {
        println!("⭐ Appeal: {}", appeal.rating);
        for improvement in &appeal.key_improvements {
            println!("   + {improvement}");
        }
    }
    for (label, items) in [
        ("💡 Insights", &analysis.contextual_insights),
        ("🎯 Recommendations", &analysis.strategic_recommendations),
        ("🛠️  Suggestions", &analysis.actionable_suggestions),
    ] {
        if !items.is_empty() {
            println!("{label}:");
            for item in items {
                println!("   - {item}");
            }
        }
    }
}

fn print_issues(session: &EditorSession) {
    let entries = session.issues();
    println!("📊 Issues found: {}", entries.len());
    for entry in entries {
        match &entry.issue {
            Some(issue) => {
                let status = if entry.applied { "✅" } else { "🔸" };
                println!(
                    "  {status} [{}] {}: \"{}\" → \"{}\"",
                    entry.index, issue.category, issue.original_text, issue.suggested_text
                );
                if let Some(reason) = &issue.reason {
                    println!("        {reason}");
                }
            }
            None => println!("  💬 [{}] {}", entry.index, entry.raw),
        }
    }
}

fn print_message(message: &ChatMessage) {
    let icon = match message.kind {
        MessageKind::User => "👤",
        MessageKind::Ai => "🤖",
        MessageKind::Error => "❌",
    };
    println!(
        "{icon} [{}] {}",
        message.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        message.content
    );
}

fn print_log_content(content: &str, message: Option<&str>) {
    if content.trim().is_empty() {
        println!("   {}", message.unwrap_or("No changes logged yet"));
    } else {
        println!("{content}");
    }
}

fn format_epoch(seconds: f64) -> String {
    DateTime::<Utc>::from_timestamp(seconds.trunc() as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}
