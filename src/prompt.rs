use std::io::{self, BufRead, Write};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};

use crate::{
    error::{Error, Result},
    record::{Record, DEFAULT_PORT},
};

pub const DEFAULT_USER: &str = "root";

/// Source of answers for fields the cache could not provide.
pub trait Prompter {
    fn ask(&mut self, label: &str) -> Result<String>;

    /// Like [`Prompter::ask`], but the answer should not be echoed.
    fn ask_secret(&mut self, label: &str) -> Result<String> {
        self.ask(label)
    }
}

/// Asks for every empty field of `record`.
pub fn fill_missing(record: &mut Record, prompter: &mut impl Prompter) -> Result<()> {
    if record.alias.is_empty() {
        record.alias = required(prompter.ask("Enter Host like \"node1\": ")?, "Host")?;
    }
    if record.hostname.is_empty() {
        record.hostname = required(
            prompter.ask("Enter HostName like \"127.0.0.1\": ")?,
            "HostName",
        )?;
    }
    if record.user.is_empty() {
        record.user = or_default(
            prompter.ask(&format!("Enter User (default \"{DEFAULT_USER}\"): "))?,
            DEFAULT_USER,
        );
    }
    if record.secret.is_empty() {
        record.secret = required(prompter.ask_secret("Enter Password: ")?, "Password")?;
    }
    if record.port.is_empty() {
        record.port = or_default(
            prompter.ask(&format!("Enter Port (default {DEFAULT_PORT}): "))?,
            DEFAULT_PORT,
        );
    }
    Ok(())
}

fn required(answer: String, field: &'static str) -> Result<String> {
    if answer.is_empty() {
        Err(Error::EmptyField(field))
    } else {
        Ok(answer)
    }
}

fn or_default(answer: String, default: &str) -> String {
    if answer.is_empty() {
        default.to_string()
    } else {
        answer
    }
}

/// Line based prompter over any reader and writer. Secrets are echoed.
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.writer, "{label}")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
        }
        Ok(line.trim().to_string())
    }
}

/// Prompter for an interactive terminal; passwords are read without echo.
pub struct TerminalPrompter {
    lines: LinePrompter<io::StdinLock<'static>, io::Stdout>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            lines: LinePrompter::new(io::stdin().lock(), io::stdout()),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, label: &str) -> Result<String> {
        self.lines.ask(label)
    }

    fn ask_secret(&mut self, label: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{label}")?;
        stdout.flush()?;

        enable_raw_mode()?;
        let secret = read_hidden();
        disable_raw_mode()?;
        writeln!(stdout)?;

        Ok(secret?.trim().to_string())
    }
}

fn read_hidden() -> io::Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => return Ok(secret),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
            }
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char(ch) => secret.push(ch),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn prompter(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn fills_everything_with_defaults() {
        let mut record = Record::default();
        let mut prompter = prompter("node1\n10.0.0.1\n\n  hunter2 \n\n");

        fill_missing(&mut record, &mut prompter).unwrap();

        assert_eq!(
            record,
            Record {
                alias: "node1".into(),
                hostname: "10.0.0.1".into(),
                user: "root".into(),
                port: "22".into(),
                secret: "hunter2".into(),
                ..Default::default()
            }
        );
        let transcript = String::from_utf8(prompter.into_writer()).unwrap();
        assert!(transcript.starts_with("Enter Host"));
        assert!(transcript.contains("Enter Password: "));
    }

    #[test]
    fn asks_only_for_missing_fields() {
        let mut record = Record::for_hostname("10.0.0.1", Some("admin".into()));
        record.alias = "db".into();
        let mut prompter = prompter("pw\n2222\n");

        fill_missing(&mut record, &mut prompter).unwrap();

        assert_eq!(record.user, "admin");
        assert_eq!(record.secret, "pw");
        assert_eq!(record.port, "2222");
        let transcript = String::from_utf8(prompter.into_writer()).unwrap();
        assert!(!transcript.contains("Enter Host"));
    }

    #[test]
    fn empty_required_field_fails() {
        let mut record = Record::default();
        let err = fill_missing(&mut record, &mut prompter("node1\n\n")).unwrap_err();
        assert!(matches!(err, Error::EmptyField("HostName")));
    }

    #[test]
    fn closed_input_fails() {
        let mut record = Record::default();
        let err = fill_missing(&mut record, &mut prompter("")).unwrap_err();
        assert!(matches!(err, Error::Terminal(_)));
    }
}
