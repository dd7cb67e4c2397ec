use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use chrono::Utc;

use crate::board::TaskBoard;
use crate::cli::CLIConfig;
use crate::models::{TaskForm, TaskStatus};
use crate::render;

pub struct REPL<R: BufRead> {
    pub config: CLIConfig,
    pub board: TaskBoard,
    input: R,
}

impl<R: BufRead> REPL<R> {
    pub fn new(config: CLIConfig, board: TaskBoard, input: R) -> Self {
        Self {
            config,
            board,
            input,
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        if let Err(err) = self.board.refresh() {
            render::error(&err.to_string());
        }
        self.show();
        let poller = self.board.start_polling(self.config.poll_interval());
        loop {
            render::prompt();
            let line = match self.read_line() {
                Some(line) => line,
                None => break,
            };
            if line.is_empty() {
                continue;
            }
            if self.handle_command(&line) {
                break;
            }
        }
        poller.stop();
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "list" | "ls" => self.show(),
            "refresh" => match self.board.refresh() {
                Ok(_) => self.show(),
                Err(err) => render::error(&err.to_string()),
            },
            "add" => self.add(),
            "edit" => self.edit(rest),
            "done" => self.mark_done(rest),
            "delete" | "rm" => self.delete(rest),
            "download" => self.download(rest),
            "config" => render::config(&self.config),
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    fn show(&self) {
        render::table(&self.board.rows(Utc::now()));
    }

    fn add(&mut self) {
        let form = match self.read_form(&TaskForm::default(), true) {
            Some(form) => form,
            None => return,
        };
        match self.board.create(&form) {
            Ok(task) => {
                render::info(&format!("created {}", task.id));
                self.show();
            }
            Err(err) => render::error(&err.to_string()),
        }
    }

    fn edit(&mut self, key: &str) {
        let task = match self.board.resolve(key) {
            Some(task) => task,
            None => return render::error("no such task"),
        };
        let current = TaskForm::from_task(&task);
        let form = match self.read_form(&current, false) {
            Some(form) => form,
            None => return,
        };
        match self.board.edit(&task.id, &form) {
            Ok(_) => self.show(),
            Err(err) => render::error(&err.to_string()),
        }
    }

    fn mark_done(&mut self, key: &str) {
        let task = match self.board.resolve(key) {
            Some(task) => task,
            None => return render::error("no such task"),
        };
        if task.status == TaskStatus::Done {
            return render::info("task is already done");
        }
        match self.board.mark_done(&task.id) {
            Ok(_) => self.show(),
            Err(err) => render::error(&err.to_string()),
        }
    }

    fn delete(&mut self, key: &str) {
        let task = match self.board.resolve(key) {
            Some(task) => task,
            None => return render::error("no such task"),
        };
        match self.board.delete(&task.id) {
            Ok(()) => self.show(),
            Err(err) => render::error(&err.to_string()),
        }
    }

    fn download(&mut self, rest: &str) {
        let mut parts = rest.splitn(2, ' ');
        let key = parts.next().unwrap_or("");
        let target = parts.next().map(str::trim).filter(|p| !p.is_empty());
        let task = match self.board.resolve(key) {
            Some(task) => task,
            None => return render::error("no such task"),
        };
        if task.linked_file.is_none() {
            return render::error("task has no linked file");
        }
        let file = match self.board.download(&task.id) {
            Ok(file) => file,
            Err(err) => return render::error(&err.to_string()),
        };
        let path = target
            .map(PathBuf::from)
            .unwrap_or_else(|| file.local_name());
        match fs::write(&path, &file.bytes) {
            Ok(()) => render::info(&format!(
                "saved {} bytes ({}) to {}",
                file.bytes.len(),
                file.content_type,
                path.display()
            )),
            Err(err) => render::error(&err.to_string()),
        }
    }

    /// Prompts for each form field. On edit an empty answer keeps the
    /// current value; the file prompt is only shown when creating.
    fn read_form(&mut self, current: &TaskForm, with_file: bool) -> Option<TaskForm> {
        let mut form = current.clone();
        let editing = !with_file;
        form.title = self.read_field("Title", editing.then_some(current.title.as_str()))?;
        form.description =
            self.read_field("Description", editing.then_some(current.description.as_str()))?;
        form.deadline = self.read_field(
            "Deadline (YYYY-MM-DD)",
            editing.then_some(current.deadline.as_str()),
        )?;
        if with_file {
            let path = self.read_field("File (optional)", None)?;
            form.file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        Some(form)
    }

    fn read_field(&mut self, label: &str, current: Option<&str>) -> Option<String> {
        render::field_prompt(label, current);
        let answer = self.read_line()?;
        if answer.is_empty() {
            return Some(current.unwrap_or_default().to_string());
        }
        Some(answer)
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl REPL<io::StdinLock<'static>> {
    pub fn stdin(config: CLIConfig, board: TaskBoard) -> Self {
        Self::new(config, board, io::stdin().lock())
    }
}
