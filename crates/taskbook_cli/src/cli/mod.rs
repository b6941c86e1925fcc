use clap::{Parser, Subcommand, ValueEnum};
use taskbook_core::config::DisplayMode;
use taskbook_core::error::AppError;
use taskbook_core::model::TaskState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskbook add "Buy milk"
    /// Example: taskbook add "Pay rent" --deadline 2024-03-01 --state doing
    Add {
        title: Option<String>,
        /// Longer description of the task
        #[arg(long)]
        summary: Option<String>,
        /// Initial state (defaults to not-done)
        #[arg(long, value_enum)]
        state: Option<StateArg>,
        /// Deadline as an ISO date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Edit fields of an existing task
    ///
    /// Example: taskbook edit task-17 --state done
    /// Example: taskbook edit task-17 --title "Buy organic milk" --clear-deadline
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        /// Remove the summary
        #[arg(long, conflicts_with = "summary")]
        clear_summary: bool,
        #[arg(long, value_enum)]
        state: Option<StateArg>,
        #[arg(long)]
        deadline: Option<String>,
        /// Remove the deadline
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
    },
    /// Delete a task
    ///
    /// Example: taskbook delete task-17
    Delete {
        id: String,
    },
    /// Show details of a task
    ///
    /// Example: taskbook show task-17
    Show {
        id: String,
    },
    /// List tasks
    ///
    /// Example: taskbook list
    /// Example: taskbook list --state doing
    List {
        /// Only show tasks in this state
        #[arg(long, value_enum)]
        state: Option<StateArg>,
    },
    /// Reorder the stored list
    ///
    /// Example: taskbook sort state done
    /// Example: taskbook sort deadline
    Sort {
        #[command(subcommand)]
        by: SortCommand,
    },
    /// Keep only tasks in one state, deleting the rest
    ///
    /// Example: taskbook filter done
    Filter {
        #[arg(value_enum)]
        state: StateArg,
    },
    /// Switch between the light and dark display modes
    ///
    /// Example: taskbook theme dark
    /// Example: taskbook theme (toggles the current mode)
    Theme {
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SortCommand {
    /// Move tasks in the given state to the top, keeping their order
    ///
    /// Example: taskbook sort state done
    State {
        #[arg(value_enum)]
        state: StateArg,
    },
    /// Order tasks by deadline, earliest first
    ///
    /// Example: taskbook sort deadline
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Done,
    NotDone,
    Doing,
}

impl From<StateArg> for TaskState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Done => TaskState::Done,
            StateArg::NotDone => TaskState::NotDone,
            StateArg::Doing => TaskState::Doing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Light,
    Dark,
}

impl From<ModeArg> for DisplayMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Light => DisplayMode::Light,
            ModeArg::Dark => DisplayMode::Dark,
        }
    }
}

/// Reduce a clap parse failure to its first line, without the `error: `
/// prefix clap adds.
pub fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

/// Split an interactive input line into arguments, honoring double quotes
/// and backslash escapes inside them.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}
