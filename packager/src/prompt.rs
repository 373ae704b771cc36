//! Interactive selection of missing inputs.
//!
//! Answers are read as plain lines. Surrounding whitespace and one pair of
//! matching quotes are removed, since terminals quote paths that are dragged
//! and dropped into them; nothing else is interpreted. Invalid answers are
//! re-asked in place. End of input is fatal.

use crate::boards::{BOARD_CATALOG, is_plausible_board_id};
use crate::error::{PackagerError, Result};
use crate::locator::{BinaryArtifact, validate_binary};
use crate::output::rule;
use crate::sketch::Sketch;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{BufRead, Write};

/// Where the binary to package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Package a binary that already exists.
    ExistingBinary,
    /// Compile a sketch first, then package its binary.
    Build,
}

/// Strip whitespace and one pair of matching surrounding quotes.
///
/// # Examples
///
/// ```
/// use ota_packager::prompt::clean_input;
///
/// assert_eq!(clean_input("  '/tmp/my sketch/blink.bin'\n"), "/tmp/my sketch/blink.bin");
/// assert_eq!(clean_input("\"a\""), "a");
/// assert_eq!(clean_input("'a\""), "'a\"");
/// ```
#[must_use]
pub fn clean_input(line: &str) -> String {
    let trimmed = line.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_owned();
        }
    }
    trimmed.to_owned()
}

/// Asks the user for anything the command line left out.
pub struct Prompter<'a> {
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

impl<'a> Prompter<'a> {
    /// Create a prompter reading answers from `input` and writing questions
    /// to `output`.
    pub fn new(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        Self { input, output }
    }

    /// Write one line of text.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the output cannot be written.
    pub fn say(&mut self, text: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn ask(&mut self, topic: &'static str, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PackagerError::InputClosed { prompt: topic });
        }
        Ok(clean_input(&line))
    }

    /// Ask until the answer names an existing regular file, starting from
    /// `initial` when given.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ArtifactTooLarge`] for an oversized file and
    /// [`PackagerError::InputClosed`] if input ends.
    pub fn binary_path(&mut self, initial: Option<Utf8PathBuf>) -> Result<BinaryArtifact> {
        let mut candidate = initial;
        loop {
            if let Some(path) = candidate.as_deref() {
                match validate_binary(path) {
                    Err(PackagerError::FileNotFound { .. }) => {}
                    result => return result,
                }
            }

            let shown = candidate.as_ref().map_or("(none)".to_owned(), ToString::to_string);
            self.say(format!(
                "File {shown} doesn't exist or cannot be accessed, please provide a correct file path."
            ))?;
            self.say(rule('-'))?;
            let answer = self.ask(
                "binary path",
                "Drag and drop the compiled binary file here:\n",
            )?;
            candidate = Some(Utf8PathBuf::from(answer));
        }
    }

    /// Confirm `proposed` as the destination or ask for another directory.
    ///
    /// An empty answer accepts the proposal.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InputClosed`] if input ends.
    pub fn destination(&mut self, proposed: &Utf8Path) -> Result<Utf8PathBuf> {
        loop {
            self.say(rule('-'))?;
            let answer = self.ask(
                "destination confirmation",
                &format!("Output directory:\n{proposed}\nContinue? [y/n]: "),
            )?;
            match answer.to_ascii_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(proposed.to_owned()),
                "n" | "no" => break,
                _ => self.say("Invalid response")?,
            }
        }

        loop {
            self.say(rule('-'))?;
            let answer = self.ask(
                "destination directory",
                "Drag and drop the destination directory here:\n",
            )?;
            let path = Utf8PathBuf::from(answer);
            if path.is_dir() {
                return Ok(path);
            }
            self.say(format!(
                "Directory {path} doesn't exist, please enter a correct destination path."
            ))?;
        }
    }

    /// Ask whether to package an existing binary or build one.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InputClosed`] if input ends.
    pub fn mode(&mut self) -> Result<Mode> {
        loop {
            self.say(rule('-'))?;
            self.say("  1) Package an existing compiled binary")?;
            self.say("  2) Build a sketch, then package it")?;
            match self.ask("mode", "Choose [1-2]: ")?.as_str() {
                "1" => return Ok(Mode::ExistingBinary),
                "2" => return Ok(Mode::Build),
                _ => self.say("Invalid selection")?,
            }
        }
    }

    /// Ask for a sketch file or directory until the answer exists.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InputClosed`] if input ends.
    pub fn sketch_location(&mut self) -> Result<Utf8PathBuf> {
        loop {
            self.say(rule('-'))?;
            let answer = self.ask(
                "sketch location",
                "Drag and drop the sketch file or sketch folder here:\n",
            )?;
            let path = Utf8PathBuf::from(answer);
            if path.exists() {
                return Ok(path);
            }
            self.say(format!("{path} doesn't exist."))?;
        }
    }

    /// Choose one of several sketches. A single sketch is returned without
    /// asking.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::NoSketchFound`] for an empty list and
    /// [`PackagerError::InputClosed`] if input ends.
    pub fn sketch(&mut self, sketches: &[Sketch]) -> Result<Sketch> {
        match sketches {
            [] => {
                return Err(PackagerError::NoSketchFound {
                    path: Utf8PathBuf::from("."),
                });
            }
            [only] => return Ok(only.clone()),
            _ => {}
        }

        loop {
            self.say(rule('-'))?;
            self.say("Several sketch files were found:")?;
            for (index, sketch) in sketches.iter().enumerate() {
                self.say(format!("  {}) {}", index + 1, sketch.path()))?;
            }
            let answer = self.ask("sketch", &format!("Choose [1-{}]: ", sketches.len()))?;
            if let Some(sketch) = menu_pick(&answer, sketches) {
                return Ok(sketch.clone());
            }
            self.say("Invalid selection")?;
        }
    }

    /// Choose a board from the catalog or enter an identifier by hand.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InputClosed`] if input ends.
    pub fn board(&mut self) -> Result<String> {
        let boards: Vec<_> = BOARD_CATALOG
            .iter()
            .flat_map(|family| family.boards.iter())
            .collect();
        let other = boards.len() + 1;

        loop {
            self.say(rule('-'))?;
            let mut number = 0;
            for family in BOARD_CATALOG {
                self.say(format!("{}:", family.name))?;
                for board in family.boards {
                    number += 1;
                    self.say(format!("  {number:>2}) {}", board.name))?;
                }
            }
            self.say(format!("  {other:>2}) Other (enter a board identifier)"))?;

            let answer = self.ask("board", &format!("Choose board [1-{other}]: "))?;
            if let Some(board) = menu_pick(&answer, &boards) {
                return Ok(board.id.to_owned());
            }
            if answer.parse::<usize>().ok() == Some(other) {
                return self.free_form_board();
            }
            self.say("Invalid selection")?;
        }
    }

    fn free_form_board(&mut self) -> Result<String> {
        loop {
            let answer = self.ask(
                "board identifier",
                "Board identifier (e.g. esp32:esp32:esp32): ",
            )?;
            if is_plausible_board_id(&answer) {
                return Ok(answer);
            }
            self.say("Invalid board identifier")?;
        }
    }
}

/// Map a 1-based menu answer onto `items`.
fn menu_pick<'t, T>(answer: &str, items: &'t [T]) -> Option<&'t T> {
    let index = answer.parse::<usize>().ok()?.checked_sub(1)?;
    items.get(index)
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
