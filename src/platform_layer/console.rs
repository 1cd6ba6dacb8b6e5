/*
 * A line-oriented `UserInteraction` for terminal hosts. Pickers print their title
 * and read paths, one per line; an empty line (or end of input) cancels. Confirm
 * prompts accept "y" or "yes".
 */
use super::interaction::UserInteraction;
use super::types::{FilePickerRequest, PickerMode};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

pub struct ConsoleInteraction<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl ConsoleInteraction<io::BufReader<io::Stdin>, io::Stderr> {
    pub fn stdio() -> Self {
        ConsoleInteraction::new(io::BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsoleInteraction<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsoleInteraction {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    fn prompt(&self, text: &str) {
        let Ok(mut output) = self.output.lock() else {
            return;
        };
        if let Err(e) = write!(output, "{text}").and_then(|_| output.flush()) {
            log::warn!("ConsoleInteraction: Failed to write prompt: {e}");
        }
    }

    // `None` on end of input or read failure.
    fn read_line(&self) -> Option<String> {
        let mut input = self.input.lock().ok()?;
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                log::warn!("ConsoleInteraction: Failed to read input: {e}");
                None
            }
        }
    }

    fn describe(request: &FilePickerRequest) -> String {
        let verb = match request.mode {
            PickerMode::Open => "open",
            PickerMode::Save => "save to",
        };
        let mut text = format!("{} (path to {verb}", request.title);
        if let Some(name) = &request.default_filename {
            text.push_str(&format!(", e.g. {name}"));
        }
        text.push_str(", empty to cancel): ");
        text
    }

    // Relative answers are taken relative to the request's initial directory.
    fn resolve(request: &FilePickerRequest, line: &str) -> PathBuf {
        let path = PathBuf::from(line);
        match &request.initial_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}

impl<R, W> UserInteraction for ConsoleInteraction<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn pick_file(&self, request: &FilePickerRequest) -> Option<PathBuf> {
        self.prompt(&Self::describe(request));
        let line = self.read_line()?;
        if line.is_empty() {
            return None;
        }
        Some(Self::resolve(request, &line))
    }

    fn pick_files(&self, request: &FilePickerRequest) -> Vec<PathBuf> {
        self.prompt(&format!(
            "{} (one path per line, empty line to finish):\n",
            request.title
        ));
        let mut paths = Vec::new();
        while let Some(line) = self.read_line() {
            if line.is_empty() {
                break;
            }
            paths.push(Self::resolve(request, &line));
        }
        paths
    }

    fn confirm(&self, message: &str) -> bool {
        self.prompt(&format!("{message} [y/N]: "));
        self.read_line()
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    fn alert(&self, message: &str) {
        self.prompt(&format!("{message}\n"));
    }
}
