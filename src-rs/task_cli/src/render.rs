use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::cli::CLIConfig;
use crate::models::{TaskInfo, TaskStatus};
use crate::status::DerivedStatus;

pub fn banner(cfg: &CLIConfig) {
    println!("Task Manager");
    println!("API: {}", cfg.base_url);
    println!("Type /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn field_prompt(label: &str, current: Option<&str>) {
    match current {
        Some(value) => print!("{} [{}]: ", label, value),
        None => print!("{}: ", label),
    }
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /list                  Show tasks");
    println!("  /add                   Add a new task");
    println!("  /edit <row|id>         Edit title, description, deadline");
    println!("  /done <row|id>         Mark a task as done");
    println!("  /delete <row|id>       Delete a task");
    println!("  /download <row|id> [path]  Save the linked file");
    println!("  /refresh               Re-fetch tasks now");
    println!("  /config                Show current config");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
}

pub fn table(rows: &[(TaskInfo, DerivedStatus)]) {
    print!("{}", format_table(rows));
}

pub fn format_table(rows: &[(TaskInfo, DerivedStatus)]) -> String {
    if rows.is_empty() {
        return "No tasks found!\n".to_string();
    }
    let mut out = String::new();
    out.push_str(&format!(
        "{:>3}  {:<24} {:<32} {:<10} {:<12} {}\n",
        "#", "Title", "Description", "Deadline", "Status", "Actions"
    ));
    for (idx, (task, status)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<24} {:<32} {:<10} {:<12} {}\n",
            idx + 1,
            truncate(&task.title, 24),
            truncate(&task.description, 32),
            format_date(task.deadline),
            status.label(),
            actions(task),
        ));
    }
    out
}

fn actions(task: &TaskInfo) -> String {
    let mut actions = Vec::new();
    if task.status != TaskStatus::Done {
        actions.push("done");
    }
    actions.push("edit");
    actions.push("delete");
    if task.linked_file.is_some() {
        actions.push("download");
    }
    actions.join(",")
}

fn format_date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn truncate(value: &str, width: usize) -> String {
    let line = value.lines().next().unwrap_or("");
    if line.chars().count() <= width {
        return line.to_string();
    }
    let mut out: String = line.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  poll: {}s", cfg.poll_secs);
    println!("  timeout: {}s", cfg.timeout_secs);
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
