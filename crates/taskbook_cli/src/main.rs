use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskbook_cli::cli::{Cli, Command, SortCommand, normalize_parse_error, split_command_line};
use taskbook_core::config::{self, Config, Palette, palette_for_mode};
use taskbook_core::error::AppError;
use taskbook_core::model::{Task, TaskState};
use taskbook_core::store::{NewTask, TaskPatch, TaskStore, local_today};

/// Everything a command needs: the open store plus the display config.
/// One instance lives for the whole process, so interactive sessions
/// keep working on the same list.
struct App {
    store: TaskStore,
    config: Config,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Summary")]
    summary: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
}

fn state_cell(task: &Task) -> String {
    if task.is_overdue(local_today()) {
        format!("{} (overdue)", task.state.label())
    } else {
        task.state.label().to_string()
    }
}

fn task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        summary: task.summary.clone().unwrap_or_else(|| "-".to_string()),
        state: state_cell(task),
        deadline: task.deadline.clone().unwrap_or_else(|| "-".to_string()),
    }
}

fn print_tasks_table(tasks: &[&Task], palette: &Palette) {
    if tasks.is_empty() {
        println!("{}", palette.mutedize("You have no tasks"));
        return;
    }

    let rows: Vec<TaskRow> = tasks.iter().map(|task| task_row(task)).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

fn print_tasks_json(tasks: &[&Task]) {
    let mut payload = Vec::with_capacity(tasks.len());
    for task in tasks {
        payload.push(serde_json::json!({
            "id": task.id,
            "title": task.title,
            "summary": task.summary,
            "state": state_cell(task),
            "deadline": task.deadline,
        }));
    }
    println!("{}", serde_json::Value::Array(payload));
}

fn print_task_json(task: &Task) {
    let json = serde_json::json!({
        "id": task.id,
        "title": task.title,
        "summary": task.summary,
        "state": task.state,
        "deadline": task.deadline,
    });
    println!("{}", json);
}

fn print_task_detail(task: &Task, palette: &Palette) {
    println!("{} ({})", palette.accentize(&task.title), task.id);
    match &task.summary {
        Some(summary) => println!("  {summary}"),
        None => println!("  {}", palette.mutedize("No summary provided")),
    }
    println!("  State: {}", state_cell(task));
    match &task.deadline {
        Some(deadline) => println!("  Deadline: {deadline}"),
        None => println!("  {}", palette.mutedize("No deadline set")),
    }
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn open_app() -> Result<App, AppError> {
    let opened = TaskStore::open()?;
    if let Some(warning) = &opened.warning {
        eprintln!("WARN: could not read saved tasks ({warning}); starting with an empty list");
    }

    let config_load = config::load_config_with_fallback(&config::config_path()?);
    if let Some(warning) = &config_load.error {
        eprintln!("WARN: could not read config ({warning}); using defaults");
    }

    Ok(App {
        store: opened.store,
        config: config_load.config,
    })
}

fn run_command(app: &mut App, cli: Cli) -> Result<(), AppError> {
    let palette = palette_for_mode(app.config.mode);

    match cli.command {
        Command::Add {
            title,
            summary,
            state,
            deadline,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let task = app.store.create(NewTask {
                title,
                summary,
                state: state.map(TaskState::from),
                deadline,
            })?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit {
            id,
            title,
            summary,
            clear_summary,
            state,
            deadline,
            clear_deadline,
        } => {
            let task = app.store.update(
                &id,
                TaskPatch {
                    title,
                    summary,
                    clear_summary,
                    state: state.map(TaskState::from),
                    deadline,
                    clear_deadline,
                },
            )?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = app.store.delete(&id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Show { id } => {
            let task = app
                .store
                .get(&id)
                .ok_or_else(|| AppError::invalid_input(format!("no task with id {id}")))?;
            if cli.json {
                print_task_json(task);
            } else {
                print_task_detail(task, &palette);
            }
        }
        Command::List { state } => {
            let tasks: Vec<&Task> = match state {
                Some(state) => app.store.filtered(state.into()),
                None => app.store.tasks().iter().collect(),
            };
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                print_tasks_table(&tasks, &palette);
            }
        }
        Command::Sort { by } => {
            match by {
                SortCommand::State { state } => app.store.sort_by_state(state.into())?,
                SortCommand::Deadline => app.store.sort_by_deadline()?,
            }
            let tasks: Vec<&Task> = app.store.tasks().iter().collect();
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                print_tasks_table(&tasks, &palette);
            }
        }
        Command::Filter { state } => {
            let removed = app.store.retain_state(state.into())?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "removed": removed, "remaining": app.store.len() })
                );
            } else {
                println!("Removed {} tasks; {} remain", removed, app.store.len());
            }
        }
        Command::Theme { mode } => {
            app.config.mode = match mode {
                Some(arg) => arg.into(),
                None => app.config.mode.toggle(),
            };
            let path = config::config_path()?;
            config::save_config(&path, &app.config)?;
            if cli.json {
                println!("{}", serde_json::json!({ "mode": app.config.mode.label() }));
            } else {
                println!("Display mode: {}", app.config.mode.label());
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut app = open_app()?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::storage(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskbook".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                    err.print().ok();
                } else {
                    eprintln!("ERROR: {}", normalize_parse_error(err));
                }
                continue;
            }
        };

        if let Err(err) = run_command(&mut app, cli) {
            if matches!(err, AppError::Storage(_)) {
                eprintln!("WARN: {err}; the change is kept for this session only");
            } else {
                eprintln!("ERROR: {}", err);
            }
        }
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.print().ok();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let mut app = match open_app() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(&mut app, cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
