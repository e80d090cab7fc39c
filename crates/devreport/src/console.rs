use std::io::{self, BufRead, StdinLock, Write};

use devreport_core::console::{Console, parse_answer};

/// Operator prompts on the controlling terminal.
pub struct StdinConsole {
    input: StdinLock<'static>,
}

impl StdinConsole {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }

    fn read_line(&mut self) -> Option<String> {
        io::stdout().flush().ok();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                log::warn!("Could not read from stdin: {err}");
                None
            }
        }
    }
}

impl Default for StdinConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdinConsole {
    fn confirm(&mut self, question: &str) -> bool {
        loop {
            print!("{question} (Y/N): ");
            // End of input declines rather than looping forever.
            let Some(line) = self.read_line() else {
                println!();
                return false;
            };
            if let Some(answer) = parse_answer(&line) {
                return answer;
            }
        }
    }

    fn prompt_line(&mut self, question: &str) -> String {
        print!("{question}");
        self.read_line().unwrap_or_default()
    }

    fn wait_for_enter(&mut self, message: &str) {
        println!("{message}");
        self.read_line();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_console_is_usable() {
        fn takes_console(_console: &mut dyn Console) {}
        let mut console = StdinConsole::default();
        takes_console(&mut console);
    }
}
