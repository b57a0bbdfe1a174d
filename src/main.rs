use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use todostore::{
    Command, DEFAULT_KEY, FileStorage, Filter, Frame, NotificationKind, Session, Task, TaskStore,
};

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "todostore CLI - newest-first task list with filtered views")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the task data (default: the platform data directory)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage key the task list is saved under
    #[arg(short, long, default_value = DEFAULT_KEY)]
    key: String,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task to the top of the list
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Mark a task done, or undone
    Toggle { id: String },

    /// Replace a task's text
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a task
    Delete { id: String },

    /// Delete every completed task
    ClearCompleted,

    /// Show tasks
    List {
        /// all, active or completed
        #[arg(short, long, default_value = "all")]
        filter: Filter,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let store_path = cli.store_path.unwrap_or_else(default_store_path);
    let storage = FileStorage::open(&store_path)
        .wrap_err_with(|| format!("Failed to open store directory {}", store_path.display()))?;
    let mut session = Session::new(TaskStore::open(storage, cli.key));

    let commands = match resolve_command(session.store().tasks(), cli.command) {
        Ok(commands) => commands,
        Err(message) => {
            println!("{}", message.blue());
            print_frame(&session.render());
            std::process::exit(1);
        }
    };

    let mut failed = false;
    for command in commands {
        let frame = session.handle(command);
        failed |= frame
            .notification
            .as_ref()
            .is_some_and(|n| n.kind == NotificationKind::Error);
        print_notification(&frame);
    }
    print_frame(&session.render());

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("todostore"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Map a subcommand to the session commands it stands for
fn resolve_command(tasks: &[Task], command: Commands) -> Result<Vec<Command>, String> {
    let commands = match command {
        Commands::Add { text } => vec![Command::Add(text.join(" "))],
        Commands::Toggle { id } => vec![Command::Toggle(resolve_id(tasks, &id)?)],
        Commands::Edit { id, text } => {
            let id = resolve_id(tasks, &id)?;
            vec![
                Command::BeginEdit(id.clone()),
                Command::Edit {
                    id,
                    text: text.join(" "),
                },
            ]
        }
        Commands::Delete { id } => vec![Command::Delete(resolve_id(tasks, &id)?)],
        Commands::ClearCompleted => vec![Command::ClearCompleted],
        Commands::List { filter } => vec![Command::SetFilter(filter)],
    };
    Ok(commands)
}

/// Accept a full id or any unambiguous prefix of one
fn resolve_id(tasks: &[Task], input: &str) -> Result<String, String> {
    if tasks.iter().any(|t| t.id == input) {
        return Ok(input.to_string());
    }

    let matches: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(input)).collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(format!("No task matches {}", input)),
        _ => Err(format!(
            "{} matches {} tasks, use a longer prefix",
            input,
            matches.len()
        )),
    }
}

fn print_notification(frame: &Frame<'_>) {
    let Some(notification) = &frame.notification else {
        return;
    };

    let line = match notification.kind {
        NotificationKind::Success => notification.message.green(),
        NotificationKind::Error => notification.message.red(),
        NotificationKind::Info => notification.message.blue(),
    };
    println!("{}", line);
}

fn print_frame(frame: &Frame<'_>) {
    if frame.view.is_empty() {
        println!("{}", format!("No {} tasks", frame.filter).dimmed());
    }

    for task in &frame.view {
        let mark = if task.completed { "[x]" } else { "[ ]" };
        let text = if task.completed {
            task.text.strikethrough().dimmed()
        } else {
            task.text.normal()
        };
        println!("{} {}  {}", mark, text, task.id.dimmed());
    }

    println!(
        "{} active, {} completed",
        frame.counts.active.to_string().bold(),
        frame.counts.completed.to_string().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            text: format!("task {}", id),
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
            updated_at: None,
        }
    }

    fn tasks() -> Vec<Task> {
        vec![task("0192a1-aaaa"), task("0192a1-bbbb"), task("0192b7-cccc")]
    }

    #[test]
    fn test_resolve_id_exact_and_prefix() {
        let tasks = tasks();
        assert_eq!(resolve_id(&tasks, "0192a1-bbbb").unwrap(), "0192a1-bbbb");
        assert_eq!(resolve_id(&tasks, "0192b").unwrap(), "0192b7-cccc");
        assert_eq!(resolve_id(&tasks, "0192a1-a").unwrap(), "0192a1-aaaa");
    }

    #[test]
    fn test_resolve_id_unknown() {
        let err = resolve_id(&tasks(), "ffff").unwrap_err();
        assert_eq!(err, "No task matches ffff");
        assert!(resolve_id(&[], "0192").is_err());
    }

    #[test]
    fn test_resolve_id_ambiguous() {
        let err = resolve_id(&tasks(), "0192a1").unwrap_err();
        assert_eq!(err, "0192a1 matches 2 tasks, use a longer prefix");
    }

    #[test]
    fn test_resolve_command_rejects_unknown_id() {
        let tasks = tasks();
        let err = resolve_command(&tasks, Commands::Delete { id: "zz".to_string() }).unwrap_err();
        assert_eq!(err, "No task matches zz");

        let commands = resolve_command(
            &tasks,
            Commands::Edit {
                id: "0192b".to_string(),
                text: vec!["Walk".to_string(), "dog".to_string()],
            },
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                Command::BeginEdit("0192b7-cccc".to_string()),
                Command::Edit {
                    id: "0192b7-cccc".to_string(),
                    text: "Walk dog".to_string(),
                },
            ]
        );
    }
}
