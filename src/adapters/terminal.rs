//! Terminal-backed user input

use std::io::{self, BufRead, Write};

use zeroize::Zeroizing;

use crate::ports::SecretInput;

/// Reads passwords without echo and plain lines from stdin.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl SecretInput for TerminalInput {
    fn read_password(&mut self, prompt: &str) -> io::Result<Zeroizing<String>> {
        rpassword::prompt_password(prompt).map(Zeroizing::new)
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{prompt}")?;
            stdout.flush()?;
        }

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Pre-recorded answers for provisioning flows.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedInput {
    passwords: std::collections::VecDeque<String>,
    lines: std::collections::VecDeque<String>,
    prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn with_password(mut self, password: &str) -> Self {
        self.passwords.push_back(password.to_string());
        self
    }

    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines.extend(lines.iter().map(|l| l.to_string()));
        self
    }

    /// Prompts shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[cfg(test)]
impl SecretInput for ScriptedInput {
    fn read_password(&mut self, prompt: &str) -> io::Result<Zeroizing<String>> {
        self.prompts.push(prompt.to_string());
        self.passwords
            .pop_front()
            .map(Zeroizing::new)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no password scripted"))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}
