//! Line-oriented SQL console.
//!
//! Each input line is either a statement, run as-is against the embedded
//! engine, or a dot-command. Every reply is written as JSON (or an `error:`
//! line) followed by a newline.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use medtrack_adapter_storage_sqlite_sqlx::Database;
use medtrack_app::change_notifier::NotifierHandle;
use medtrack_app::data_layer::DataLayer;
use medtrack_domain::error::MedTrackError;
use medtrack_domain::patient::NewPatient;
use medtrack_domain::query::{EXAMPLE_QUERIES, ExampleQuery};

/// The data layer as wired by this daemon.
pub type Store = DataLayer<Database, NotifierHandle>;

const HELP: &str = "\
.patients        list patients, newest first
.search <text>   patients whose name, email or phone contains <text>
.stats           aggregate counts
.add <json>      register a patient from a JSON object
.examples        list example queries
.example <n>     run example query <n>
.quit            leave the console
anything else is executed as a statement";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Blank,
    Quit,
    Help,
    Patients,
    Search(&'a str),
    Stats,
    Examples,
    Example(&'static ExampleQuery),
    Add(&'a str),
    Statement(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Blank;
        }
        let Some(command) = line.strip_prefix('.') else {
            return Self::Statement(line);
        };
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));

        match (name, arg) {
            ("quit" | "exit", "") => Self::Quit,
            ("help", "") => Self::Help,
            ("patients", "") => Self::Patients,
            ("stats", "") => Self::Stats,
            ("examples", "") => Self::Examples,
            ("example", n) => n
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| EXAMPLE_QUERIES.get(idx))
                .map_or(Self::Unknown(line), Self::Example),
            ("search", text) if !text.is_empty() => Self::Search(text),
            ("add", json) if !json.is_empty() => Self::Add(json),
            _ => Self::Unknown(line),
        }
    }
}

fn render<T: Serialize>(result: Result<T, MedTrackError>) -> String {
    match result.map(|value| serde_json::to_string_pretty(&value)) {
        Ok(Ok(json)) => json,
        Ok(Err(err)) => format!("error: {err}"),
        Err(err) => format!("error: {err}"),
    }
}

async fn respond(store: &Store, command: Command<'_>) -> String {
    match command {
        Command::Blank | Command::Quit => String::new(),
        Command::Help => HELP.to_string(),
        Command::Patients => render(store.get_patients().await),
        Command::Search(text) => render(store.get_patients().await.map(|patients| {
            patients
                .into_iter()
                .filter(|patient| patient.matches_search(text))
                .collect::<Vec<_>>()
        })),
        Command::Stats => render(store.get_patient_stats().await),
        Command::Examples => EXAMPLE_QUERIES
            .iter()
            .enumerate()
            .map(|(idx, query)| format!("{}. {}: {}", idx + 1, query.name, query.statement))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Example(query) => render(store.execute(query.statement, Vec::new()).await),
        Command::Add(json) => match serde_json::from_str::<NewPatient>(json) {
            Ok(patient) => render(
                store
                    .add_patient(patient.normalized())
                    .await
                    .map(|id| serde_json::json!({ "id": id })),
            ),
            Err(err) => format!("error: invalid patient: {err}"),
        },
        Command::Statement(statement) => render(store.execute(statement, Vec::new()).await),
        Command::Unknown(line) => format!("error: unknown command `{line}`, try .help"),
    }
}

/// Serve the console until `.quit` or end of input.
///
/// # Errors
///
/// Returns an error only when reading input or writing a reply fails;
/// statement failures are reported inline.
pub async fn run<R, W>(store: &Store, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let reply = match Command::parse(&line) {
            Command::Blank => continue,
            Command::Quit => break,
            command => respond(store, command).await,
        };
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    tracing::debug!("console closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medtrack_adapter_storage_sqlite_sqlx::Config;
    use medtrack_app::change_notifier::ChangeNotifier;
    use std::time::Duration;
    use tokio::io::BufReader;

    fn store(notifier: &ChangeNotifier) -> Store {
        DataLayer::new(notifier.attach(), Some(Duration::from_secs(5)))
    }

    async fn ready_store(notifier: &ChangeNotifier) -> Store {
        let store = store(notifier);
        store.start(&Config::in_memory()).await.unwrap();
        store
    }

    async fn session(store: &Store, input: &str) -> String {
        let mut output = Vec::new();
        run(store, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn should_parse_dot_commands() {
        assert_eq!(Command::parse("  "), Command::Blank);
        assert_eq!(Command::parse(".quit"), Command::Quit);
        assert_eq!(Command::parse(".stats "), Command::Stats);
        assert_eq!(Command::parse(".patients"), Command::Patients);
        assert_eq!(
            Command::parse(".example 2"),
            Command::Example(&EXAMPLE_QUERIES[1])
        );
        assert_eq!(Command::parse(".add {}"), Command::Add("{}"));
        assert_eq!(Command::parse(".search  Ada L "), Command::Search("Ada L"));
    }

    #[test]
    fn should_treat_other_lines_as_statements() {
        assert_eq!(
            Command::parse(" SELECT 1 "),
            Command::Statement("SELECT 1")
        );
    }

    #[test]
    fn should_reject_out_of_range_or_malformed_commands() {
        assert_eq!(Command::parse(".example 0"), Command::Unknown(".example 0"));
        assert_eq!(Command::parse(".example 99"), Command::Unknown(".example 99"));
        assert_eq!(Command::parse(".example x"), Command::Unknown(".example x"));
        assert_eq!(Command::parse(".add"), Command::Unknown(".add"));
        assert_eq!(Command::parse(".search "), Command::Unknown(".search"));
        assert_eq!(Command::parse(".drop"), Command::Unknown(".drop"));
    }

    #[tokio::test]
    async fn should_register_and_summarize_patients() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = ready_store(&notifier).await;

        let output = session(
            &store,
            r#"
.add {"first_name": "Ada", "last_name": "Lovelace", "gender": "Female", "date_of_birth": "1990-01-01", "email": "  "}
.stats
"#,
        )
        .await;

        assert!(output.contains(r#""id": 1"#), "{output}");
        assert!(output.contains(r#""total": 1"#), "{output}");
        assert!(output.contains(r#""femaleCount": 1"#), "{output}");

        let patients = store.get_patients().await.unwrap();
        assert_eq!(patients[0].email, None);
    }

    #[tokio::test]
    async fn should_run_statements_and_examples() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = ready_store(&notifier).await;
        store
            .add_patient(NewPatient::new("Alan", "Turing", "Male", "1912-06-23"))
            .await
            .unwrap();

        let output = session(&store, "SELECT first_name FROM patients\n.example 2\n").await;

        assert!(output.contains(r#""first_name""#), "{output}");
        assert_eq!(output.matches(r#""Alan""#).count(), 2, "{output}");
    }

    #[tokio::test]
    async fn should_search_patients_case_insensitively() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = ready_store(&notifier).await;
        store
            .add_patient(
                NewPatient::new("Ada", "Lovelace", "Female", "1990-01-01")
                    .email("ada@example.com"),
            )
            .await
            .unwrap();
        store
            .add_patient(
                NewPatient::new("Alan", "Turing", "Male", "1912-06-23").phone("555-0142"),
            )
            .await
            .unwrap();

        let by_name = session(&store, ".search ADA LOVE\n").await;
        let by_phone = session(&store, ".search 0142\n").await;
        let none = session(&store, ".search grace\n").await;

        assert!(by_name.contains(r#""first_name": "Ada""#), "{by_name}");
        assert!(!by_name.contains("Alan"), "{by_name}");
        assert!(by_phone.contains(r#""first_name": "Alan""#), "{by_phone}");
        assert!(!by_phone.contains("Ada"), "{by_phone}");
        assert_eq!(none.trim(), "[]");
    }

    #[tokio::test]
    async fn should_report_errors_inline_and_keep_going() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = ready_store(&notifier).await;

        let output = session(&store, "SELEC nonsense\n.bogus\n.add {\nSELECT 7 AS n\n").await;
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("error: query failed"), "{output}");
        assert!(lines[1].starts_with("error: unknown command"), "{output}");
        assert!(lines[2].starts_with("error: invalid patient"), "{output}");
        assert!(output.contains(r#""n""#), "{output}");
    }

    #[tokio::test]
    async fn should_stop_reading_at_quit() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = ready_store(&notifier).await;

        let output = session(&store, ".quit\nSELECT 1\n").await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn should_report_not_initialized_before_start() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = store(&notifier);

        let output = session(&store, ".patients\n").await;
        assert!(
            output.starts_with("error: data layer is not initialized"),
            "{output}"
        );
    }

    #[tokio::test]
    async fn should_list_examples() {
        let notifier = ChangeNotifier::new("test", 16);
        let store = store(&notifier);

        let output = session(&store, ".examples\n").await;
        assert_eq!(output.lines().count(), EXAMPLE_QUERIES.len());
        assert!(output.starts_with("1. All Patients: "));
    }
}
