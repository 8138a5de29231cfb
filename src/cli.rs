use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, ApiVersion, AppConfig, FailurePolicy, FieldKeys};
use crate::error::{ImportError, Outcome};
use crate::model::credentials::Credentials;
use crate::model::table::columns;
use crate::preview::preview_tickets;
use crate::prompt;
use crate::providers::jira::JiraTracker;
use crate::providers::IssueTracker;
use crate::reader::read_table;
use crate::submit::submit_tickets;

/// Create Jira issues from the rows of a CSV file.
///
/// Every row is previewed first; nothing is created until you answer "yes".
#[derive(Debug, Parser)]
#[command(name = "jira-import", version)]
pub struct Cli {
    /// CSV file with a header row (Project Key, Summary, Description, Issue Type,
    /// Product Owner, Team ID, Epic, AC)
    pub csv: PathBuf,

    /// Config file (default: ~/.localpipeline/jira-import.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Jira server URL, overriding the config file
    #[arg(long, env = "JIRA_SERVER")]
    pub server: Option<String>,

    /// What to do with the remaining rows after one fails
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicy>,

    /// Preview the tickets and exit without prompting or creating anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Effective options for one run: config file values with command-line overrides applied.
#[derive(Debug)]
pub struct Settings {
    pub csv: PathBuf,
    pub server: String,
    pub username: Option<String>,
    pub issue_type_id: String,
    pub api_version: ApiVersion,
    pub fields: FieldKeys,
    pub on_error: FailurePolicy,
    pub dry_run: bool,
}

impl Settings {
    pub fn resolve(cli: Cli, config: AppConfig) -> Self {
        let jira = config.jira;
        Self {
            csv: cli.csv,
            server: cli.server.unwrap_or(jira.server),
            username: jira.username,
            issue_type_id: jira.issue_type_id,
            api_version: jira.api_version,
            fields: jira.fields,
            on_error: cli.on_error.unwrap_or(config.import.on_error),
            dry_run: cli.dry_run,
        }
    }
}

/// The person at the keyboard: answers the confirmation and supplies credentials.
pub trait Operator {
    fn confirm(&mut self) -> io::Result<bool>;
    fn credentials(&mut self, username: Option<&str>) -> Result<Credentials, ImportError>;
}

pub struct Console;

impl Operator for Console {
    fn confirm(&mut self) -> io::Result<bool> {
        prompt::confirm(&mut io::stdin().lock(), &mut io::stdout())
    }

    fn credentials(&mut self, username: Option<&str>) -> Result<Credentials, ImportError> {
        prompt::collect_credentials(username)
    }
}

pub async fn run(cli: Cli) -> Result<Outcome, ImportError> {
    let config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .map_err(|e| ImportError::Config(format!("{e:#}")))?;

    let settings = Settings::resolve(cli, config);
    tracing::debug!(?settings, "resolved settings");

    let server = settings.server.clone();
    let api_version = settings.api_version;
    let fields = settings.fields.clone();
    import(&settings, &mut Console, &mut io::stdout(), move |creds| {
        Box::new(JiraTracker::new(&server, creds, api_version, fields))
    })
    .await
}

/// Read, preview, confirm, authenticate, submit. Fatal errors stop the run before anything
/// is created; per-row failures are summarised instead.
pub async fn import<W, F>(
    settings: &Settings,
    operator: &mut dyn Operator,
    out: &mut W,
    connect: F,
) -> Result<Outcome, ImportError>
where
    W: Write,
    F: FnOnce(&Credentials) -> Box<dyn IssueTracker>,
{
    let table = read_table(&settings.csv)?;
    tracing::info!(path = %settings.csv.display(), rows = table.len(), "loaded tickets");
    let missing = table.missing_columns(&columns::ALL);
    if !missing.is_empty() {
        tracing::warn!(?missing, "input has no column for some fields; they will be sent empty");
    }
    if table.is_empty() {
        tracing::warn!("input has no data rows");
    }

    let table = preview_tickets(&table, out)?;
    out.flush()?;

    if settings.dry_run {
        tracing::info!("dry run, nothing submitted");
        return Ok(Outcome::DryRun);
    }

    let confirmed = operator
        .confirm()
        .map_err(|e| ImportError::Input(e.to_string()))?;
    if !confirmed {
        writeln!(out, "Jira ticket creation cancelled.")?;
        return Ok(Outcome::Cancelled);
    }

    let credentials = operator.credentials(settings.username.as_deref())?;
    let tracker = connect(&credentials);

    let report = submit_tickets(
        table,
        tracker.as_ref(),
        &settings.issue_type_id,
        settings.on_error,
        out,
    )
    .await?;

    if let Some(err) = report.credentials_rejected() {
        return Err(ImportError::Authentication(err.to_string()));
    }
    if report.has_failures() {
        Ok(Outcome::CompletedWithFailures)
    } else {
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::credentials::Secret;
    use crate::providers::tests::MockTracker;

    struct Scripted {
        answer: &'static str,
        confirm_calls: usize,
        username: Option<String>,
    }

    impl Scripted {
        fn answering(answer: &'static str) -> Self {
            Self {
                answer,
                confirm_calls: 0,
                username: None,
            }
        }
    }

    impl Operator for Scripted {
        fn confirm(&mut self) -> io::Result<bool> {
            self.confirm_calls += 1;
            Ok(prompt::is_affirmative(self.answer))
        }

        fn credentials(&mut self, username: Option<&str>) -> Result<Credentials, ImportError> {
            self.username = username.map(String::from);
            Ok(Credentials {
                username: username.unwrap_or("alice").to_string(),
                secret: Secret::new("hunter2"),
            })
        }
    }

    const TWO_ROWS: &str = "\
Project Key,Summary,Description,Issue Type,Product Owner,Team ID,Epic,AC
PROJ,Fix login,,Task,alice,42,EPIC-1,Step1;Step2
PROJ,Add logout,,Task,,,,
";

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn settings(csv: PathBuf) -> Settings {
        Settings::resolve(
            Cli {
                csv,
                config: None,
                server: None,
                on_error: None,
                dry_run: false,
            },
            AppConfig::default(),
        )
    }

    #[tokio::test]
    async fn confirmed_run_creates_every_row() {
        let file = csv_file(TWO_ROWS);
        let tracker = MockTracker::new();
        let created = tracker.created.clone();
        let mut operator = Scripted::answering("yes");
        let mut out = Vec::new();

        let outcome = import(&settings(file.path().into()), &mut operator, &mut out, |_| {
            Box::new(tracker)
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Completed);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(
            "Project Key: PROJ, Summary: Fix login, Description: None, Issue Type: Task"
        ));
        assert!(text.contains(
            "Project Key: PROJ, Summary: Add logout, Description: None, Issue Type: Task"
        ));
        assert!(text.contains("Created issue PROJ-1"));
        assert!(text.contains("Created issue PROJ-2"));

        let created = created.lock().unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].checklist.len(), 2);
        assert_eq!(created[0].product_owner.as_deref(), Some("alice"));
        assert_eq!(created[0].team_id.as_deref(), Some("42"));
        assert_eq!(created[0].epic.as_deref(), Some("EPIC-1"));
        assert_eq!(created[0].issue_type_id, "7");
        assert!(created[1].checklist.is_empty());
        assert_eq!(created[1].product_owner, None);
    }

    #[tokio::test]
    async fn declined_run_creates_nothing() {
        let file = csv_file(TWO_ROWS);
        let tracker = MockTracker::new();
        let created = tracker.created.clone();
        let mut operator = Scripted::answering("y");
        let mut out = Vec::new();

        let outcome = import(&settings(file.path().into()), &mut operator, &mut out, |_| {
            Box::new(tracker)
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert!(created.lock().unwrap().is_empty());
        assert!(String::from_utf8(out)
            .unwrap()
            .ends_with("Jira ticket creation cancelled.\n"));
    }

    #[tokio::test]
    async fn dry_run_never_prompts() {
        let file = csv_file(TWO_ROWS);
        let mut operator = Scripted::answering("yes");
        let mut opts = settings(file.path().into());
        opts.dry_run = true;

        let outcome = import(&opts, &mut operator, &mut Vec::<u8>::new(), |_| {
            Box::new(MockTracker::new())
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::DryRun);
        assert_eq!(operator.confirm_calls, 0);
    }

    #[tokio::test]
    async fn missing_file_fails_before_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let mut operator = Scripted::answering("yes");
        let mut out = Vec::<u8>::new();

        let err = import(
            &settings(dir.path().join("missing.csv")),
            &mut operator,
            &mut out,
            |_| Box::new(MockTracker::new()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ImportError::File { .. }));
        assert_eq!(operator.confirm_calls, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn rejected_credentials_fail_the_run() {
        let file = csv_file(TWO_ROWS);
        let tracker = MockTracker::new().unauthorized();
        let created = tracker.created.clone();

        let err = import(
            &settings(file.path().into()),
            &mut Scripted::answering("Yes"),
            &mut Vec::<u8>::new(),
            |_| Box::new(tracker),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ImportError::Authentication(_)));
        assert!(created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_expiring_mid_run_is_an_authentication_failure() {
        let file = csv_file(TWO_ROWS);
        let tracker = MockTracker::new().expiring_after(1);
        let created = tracker.created.clone();
        let mut out = Vec::new();

        let err = import(
            &settings(file.path().into()),
            &mut Scripted::answering("yes"),
            &mut out,
            |_| Box::new(tracker),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ImportError::Authentication(_)));
        assert_eq!(err.exit_code(), std::process::ExitCode::from(5));
        assert_eq!(created.lock().unwrap().len(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("Created 1 issue(s), 1 failed (rows 2)\n"));
    }

    #[tokio::test]
    async fn failed_row_marks_outcome() {
        let file = csv_file(TWO_ROWS);
        let tracker = MockTracker::new().rejecting("Fix login");

        let outcome = import(
            &settings(file.path().into()),
            &mut Scripted::answering("yes"),
            &mut Vec::<u8>::new(),
            |_| Box::new(tracker),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::CompletedWithFailures);
    }

    #[tokio::test]
    async fn configured_username_is_passed_to_operator() {
        let file = csv_file(TWO_ROWS);
        let mut opts = settings(file.path().into());
        opts.username = Some("alice@example.com".into());
        let mut operator = Scripted::answering("yes");

        import(&opts, &mut operator, &mut Vec::<u8>::new(), |creds| {
            assert_eq!(creds.username, "alice@example.com");
            Box::new(MockTracker::new())
        })
        .await
        .unwrap();

        assert_eq!(operator.username.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn flags_override_config() {
        let config = config::parse_config(
            "[jira]\nserver = \"https://config.example\"\n[import]\non_error = \"halt\"\n",
        )
        .unwrap();
        let cli = Cli::parse_from([
            "jira-import",
            "tickets.csv",
            "--server",
            "https://flag.example",
            "--on-error",
            "continue",
        ]);

        let settings = Settings::resolve(cli, config);
        assert_eq!(settings.server, "https://flag.example");
        assert_eq!(settings.on_error, FailurePolicy::Continue);
        assert_eq!(settings.csv, PathBuf::from("tickets.csv"));
    }

    #[test]
    fn config_applies_without_flags() {
        let config = config::parse_config("[import]\non_error = \"halt\"\n").unwrap();
        let cli = Cli {
            csv: "tickets.csv".into(),
            config: None,
            server: None,
            on_error: None,
            dry_run: false,
        };

        let settings = Settings::resolve(cli, config);
        assert_eq!(settings.on_error, FailurePolicy::Halt);
        assert_eq!(settings.server, "https://yourdomain.atlassian.net");
    }
}
