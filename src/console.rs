//! Line-oriented prompts and output for the interactive resolver

use std::fmt::Display;
use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};

use crossterm::style::{Color, Stylize};

use crate::error::ResolveError;

/// What the user picked at a selection prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index into the offered list (RETURN picks the first entry)
    Pick(usize),
    /// RETURN with nothing listed
    Accept,
    /// One of the extra letters the caller offered
    Action(char),
    Skip,
}

pub struct Console<R, W> {
    input: R,
    output: W,
    styled: bool,
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let output = io::stdout();
        let styled = output.is_terminal();
        Self {
            input: io::stdin().lock(),
            output,
            styled,
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Plain, unstyled console over arbitrary streams
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            styled: false,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn header(&mut self, label: &str, value: impl Display) -> io::Result<()> {
        let label = self.paint(label, Color::Cyan);
        writeln!(self.output, "{label} {value}")
    }

    /// Header preceded by a blank line, used to separate files
    pub fn section(&mut self, label: &str, value: impl Display) -> io::Result<()> {
        writeln!(self.output)?;
        self.header(label, value)
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        let message = self.paint(message, Color::Yellow);
        writeln!(self.output, "{message}")
    }

    pub fn print_candidates<T: Display>(&mut self, candidates: &[T]) -> io::Result<()> {
        for (index, candidate) in candidates.iter().enumerate() {
            let number = self.paint(&format!("[{}]", index + 1), Color::Green);
            if index == 0 {
                writeln!(self.output, "{number} {candidate} (default)")?;
            } else {
                writeln!(self.output, "{number} {candidate}")?;
            }
        }
        Ok(())
    }

    pub fn print_options(&mut self, options: &str) -> io::Result<()> {
        let options = self.paint(options, Color::DarkGrey);
        writeln!(self.output, "{options}")
    }

    /// Reads a choice until it is valid.
    ///
    /// `q` always quits and `s` always skips; `actions` lists the extra
    /// letters the caller handles itself.
    pub fn parse_selection(&mut self, count: usize, actions: &[char]) -> Result<Selection, ResolveError> {
        loop {
            let answer = self.read_answer("> ")?.to_lowercase();

            if answer.is_empty() {
                return Ok(if count > 0 { Selection::Pick(0) } else { Selection::Accept });
            }
            if let Ok(number) = answer.parse::<usize>() {
                if (1..=count).contains(&number) {
                    return Ok(Selection::Pick(number - 1));
                }
            }

            let mut chars = answer.chars();
            if let (Some(letter), None) = (chars.next(), chars.next()) {
                match letter {
                    'q' => return Err(ResolveError::Quit),
                    's' => return Ok(Selection::Skip),
                    letter if actions.contains(&letter) => return Ok(Selection::Action(letter)),
                    _ => {}
                }
            }

            self.info(&format!("Invalid selection: {answer}"))?;
        }
    }

    /// Asks for one field.
    ///
    /// RETURN yields `default`; a necessary field without a default is asked
    /// again until something is typed.
    pub fn get_field(
        &mut self,
        name: &str,
        necessary: bool,
        default: Option<&str>,
    ) -> Result<Option<String>, ResolveError> {
        let prompt = match default {
            Some(default) => format!("{name} [{default}]: "),
            None => format!("{name}: "),
        };

        loop {
            let answer = self.read_answer(&prompt)?;
            if !answer.is_empty() {
                return Ok(Some(answer));
            }
            if let Some(default) = default {
                return Ok(Some(default.to_string()));
            }
            if !necessary {
                return Ok(None);
            }
            self.info(&format!("{name} is required"))?;
        }
    }

    /// Free-text prompt falling back to `default` on RETURN
    pub fn inline_prompt(&mut self, prompt: &str, default: &str) -> Result<String, ResolveError> {
        let answer = self.read_answer(prompt)?;
        Ok(if answer.is_empty() { default.to_string() } else { answer })
    }

    fn read_answer(&mut self, prompt: &str) -> Result<String, ResolveError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Err(ResolveError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.styled {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn printed(console: &Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(console.output()).to_string()
    }

    #[test]
    fn test_return_picks_default() {
        let mut c = console("\n");
        assert_eq!(c.parse_selection(3, &['e']).unwrap(), Selection::Pick(0));

        let mut c = console("\n");
        assert_eq!(c.parse_selection(0, &['e']).unwrap(), Selection::Accept);
    }

    #[test]
    fn test_numbers_and_letters() {
        let mut c = console("2\nE\ns\n");
        assert_eq!(c.parse_selection(3, &['e', 'm']).unwrap(), Selection::Pick(1));
        assert_eq!(c.parse_selection(3, &['e', 'm']).unwrap(), Selection::Action('e'));
        assert_eq!(c.parse_selection(3, &['e', 'm']).unwrap(), Selection::Skip);
    }

    #[test]
    fn test_quit() {
        let mut c = console("q\n");
        assert!(matches!(c.parse_selection(1, &[]), Err(ResolveError::Quit)));
    }

    #[test]
    fn test_invalid_answers_are_asked_again() {
        let mut c = console("9\nx\nhello\n1\n");
        assert_eq!(c.parse_selection(2, &['e']).unwrap(), Selection::Pick(0));
        assert_eq!(printed(&c).matches("Invalid selection").count(), 3);
    }

    #[test]
    fn test_closed_input() {
        let mut c = console("");
        assert!(matches!(c.parse_selection(1, &[]), Err(ResolveError::InputClosed)));
    }

    #[test]
    fn test_get_field_defaults_and_required() {
        let mut c = console("\n\nFoo\n\n");
        assert_eq!(c.get_field("season", false, Some("1")).unwrap().as_deref(), Some("1"));
        assert_eq!(c.get_field("title", true, None).unwrap().as_deref(), Some("Foo"));
        assert_eq!(c.get_field("year", false, None).unwrap(), None);
        assert!(printed(&c).contains("title is required"));
    }

    #[test]
    fn test_inline_prompt_keeps_default() {
        let mut c = console("\nNew Name\n");
        assert_eq!(c.inline_prompt("New Linkname: ", "Old").unwrap(), "Old");
        assert_eq!(c.inline_prompt("New Linkname: ", "Old").unwrap(), "New Name");
    }

    #[test]
    fn test_candidates_are_numbered() {
        let mut c = console("");
        c.print_candidates(&["Alien (1979)", "Aliens (1986)"]).unwrap();
        assert_eq!(printed(&c), "[1] Alien (1979) (default)\n[2] Aliens (1986)\n");
    }
}
