//! Interactive session: file selection, table bootstrap and the command loop

use crate::prompt::Prompter;
use asciitab_core::{
    check_key, check_value, parse_cell_index, parse_dimensions, parse_number, CellEdit,
    EditField, Error, Result, SortOrder, Storage, TableService,
};
use rand::Rng;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::debug;

const MENU: &str = "[ search ] - Search\n\
                    [ edit ] - Edit\n\
                    [ add_row ] - Add Row\n\
                    [ sort ] - Sort\n\
                    [ print ] - Print\n\
                    [ reset ] - Reset\n\
                    [ history ] - History\n\
                    [ x ] - Exit\n\
                    Enter the function you want to do: ";

/// A menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Search,
    Edit,
    AddRow,
    Sort,
    Print,
    Reset,
    History,
    Exit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "search" => Ok(Command::Search),
            "edit" => Ok(Command::Edit),
            "add_row" => Ok(Command::AddRow),
            "sort" => Ok(Command::Sort),
            "print" => Ok(Command::Print),
            "reset" => Ok(Command::Reset),
            "history" => Ok(Command::History),
            "x" => Ok(Command::Exit),
            other => Err(Error::Validation(format!("unknown command '{}'", other))),
        }
    }
}

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Pick the table file for the session, creating it when asked to.
///
/// With `requested` naming an existing file that file is used. A missing
/// file leads to a prompt for another existing name, or a blank answer to
/// create a new one. Without `requested` a new file name is asked for.
/// Returns `None` at end of input.
pub fn select_file<I, O, S>(
    prompt: &mut Prompter<I, O>,
    storage: &mut S,
    requested: Option<&str>,
) -> Result<Option<String>>
where
    I: BufRead,
    O: Write,
    S: Storage,
{
    let requested = requested.map(str::trim).filter(|name| !name.is_empty());

    let Some(requested) = requested else {
        return create_named_file(prompt, storage);
    };

    let name = storage.ensure_extension(requested);
    if storage.exists(&name) {
        prompt.say(format!("Found existing file: {}\n", name))?;
        return Ok(Some(name));
    }

    prompt.say(format!("File '{}' not found.", name))?;
    loop {
        let Some(answer) =
            prompt.ask("Enter a valid filename (or leave blank to create a new file): ")?
        else {
            return Ok(None);
        };

        let answer = answer.trim();
        if answer.is_empty() {
            return create_named_file(prompt, storage);
        }

        let name = storage.ensure_extension(answer);
        if storage.exists(&name) {
            prompt.say(format!("Found existing file: {}\n", name))?;
            return Ok(Some(name));
        }
        prompt.say("File not found. Try again.")?;
    }
}

fn create_named_file<I, O, S>(prompt: &mut Prompter<I, O>, storage: &mut S) -> Result<Option<String>>
where
    I: BufRead,
    O: Write,
    S: Storage,
{
    let Some(name) = prompt.ask_until("Enter new filename: ", |answer| {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::Validation("file name cannot be blank".to_string()));
        }
        Ok(storage.ensure_extension(answer))
    })?
    else {
        return Ok(None);
    };

    if storage.create(&name)? {
        prompt.say(format!("Created new file: {}\n", name))?;
    } else {
        prompt.say(format!("Found existing file: {}\n", name))?;
    }
    Ok(Some(name))
}

/// Drives a [`TableService`] from user input
pub struct Driver<I, O, S, R> {
    prompt: Prompter<I, O>,
    service: TableService<S, R>,
}

impl<I, O, S, R> Driver<I, O, S, R>
where
    I: BufRead,
    O: Write,
    S: Storage,
    R: Rng,
{
    pub fn new(prompt: Prompter<I, O>, service: TableService<S, R>) -> Self {
        Self { prompt, service }
    }

    pub fn service(&self) -> &TableService<S, R> {
        &self.service
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (Prompter<I, O>, TableService<S, R>) {
        (self.prompt, self.service)
    }

    /// Load or generate the table, then run commands until exit
    pub fn run(&mut self) -> Result<()> {
        if self.start()? == Flow::Exit {
            return Ok(());
        }

        loop {
            let Some(choice) = self.prompt.ask(MENU)? else {
                return Ok(());
            };
            self.prompt.say("")?;

            let flow = match choice.parse::<Command>() {
                Ok(command) => self.dispatch(command)?,
                Err(_) => {
                    self.prompt.say("Invalid Input\n")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Fill the table from its file, generating a new one when the file
    /// holds no table data
    pub fn start(&mut self) -> Result<Flow> {
        let lines = self.service.storage().read_lines(self.service.file_name())?;

        if lines.iter().all(|line| line.trim().is_empty()) {
            self.prompt.say("Creating new table...")?;
            if self.create_table()? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        } else {
            let loaded = self.service.load();
            self.report(loaded.map(|_| ()))?;
            if self.service.table().cell_count() == 0 {
                self.prompt.say("No valid table data found in file.\n")?;
                if self.create_table()? == Flow::Exit {
                    return Ok(Flow::Exit);
                }
            } else {
                self.prompt.say("File loaded successfully.\n")?;
            }
        }

        self.print()?;
        Ok(Flow::Continue)
    }

    /// Run one command to completion
    pub fn dispatch(&mut self, command: Command) -> Result<Flow> {
        debug!(?command, "dispatching command");
        match command {
            Command::Search => {
                self.prompt.say("Searching...")?;
                self.search()
            }
            Command::Edit => {
                self.prompt.say("Editing...")?;
                self.edit()
            }
            Command::AddRow => {
                self.prompt.say("Adding Row...")?;
                self.add_row()
            }
            Command::Sort => {
                self.prompt.say("Sorting...")?;
                self.sort()
            }
            Command::Print => {
                self.prompt.say("Printing...")?;
                self.print()?;
                Ok(Flow::Continue)
            }
            Command::Reset => {
                self.prompt.say("Resetting...")?;
                self.reset()
            }
            Command::History => {
                self.history()?;
                Ok(Flow::Continue)
            }
            Command::Exit => {
                self.prompt.say("Exiting...")?;
                Ok(Flow::Exit)
            }
        }
    }

    /// Print the outcome of an operation. Errors from the operation are
    /// shown to the user, the session carries on.
    fn report(&mut self, result: Result<()>) -> Result<()> {
        if let Err(e) = result {
            let message = match e {
                Error::EmptyTable => {
                    "Table is empty. Please load or generate a table first.".to_string()
                }
                other => format!("Error: {}", other),
            };
            self.prompt.say(format!("{}\n", message))?;
        }
        Ok(())
    }

    /// Whether there is data to work on; prints a notice when there is not
    fn has_data(&mut self) -> Result<bool> {
        if self.service.table().is_empty() {
            self.report(Err(Error::EmptyTable))?;
            return Ok(false);
        }
        Ok(true)
    }

    fn ask_dimensions(&mut self) -> Result<Option<(usize, usize)>> {
        let dims = self.prompt.ask_until(
            "Enter the dimension of the table. Please use the format rowxcol (ex. 3x3): ",
            parse_dimensions,
        )?;
        self.prompt.say("")?;
        Ok(dims)
    }

    fn create_table(&mut self) -> Result<Flow> {
        let Some((rows, cols)) = self.ask_dimensions()? else {
            return Ok(Flow::Exit);
        };
        let created = self.service.create_new_table(rows, cols);
        self.saved(created)?;
        Ok(Flow::Continue)
    }

    /// Report the result of a mutation, mentioning the file on success
    fn saved(&mut self, result: Result<()>) -> Result<()> {
        if result.is_ok() {
            let message = format!("Saved to {}", self.service.file_name());
            self.prompt.say(message)?;
        }
        self.report(result)
    }

    fn print(&mut self) -> Result<()> {
        let dump = self.service.print_table();
        self.prompt.say(format!("{}\n", dump.trim_end()))
    }

    fn search(&mut self) -> Result<Flow> {
        if !self.has_data()? {
            return Ok(Flow::Continue);
        }
        let Some(query) = self.prompt.ask("Enter character/s you want to search: ")? else {
            return Ok(Flow::Exit);
        };

        match self.service.search(&query) {
            Ok(report) => self.prompt.say(format!("{}\n", report))?,
            Err(e) => self.report(Err(e))?,
        }
        Ok(Flow::Continue)
    }

    fn edit(&mut self) -> Result<Flow> {
        if !self.has_data()? {
            return Ok(Flow::Continue);
        }

        let table = self.service.table();
        let Some((row, col)) = self.prompt.ask_until(
            "Enter cell index to edit (rowxcol, ex. 0x0): ",
            |answer| {
                let (row, col) = parse_cell_index(answer)?;
                table.cell(row, col)?;
                Ok((row, col))
            },
        )?
        else {
            return Ok(Flow::Exit);
        };

        let Some(field) = self.prompt.ask_until(
            "Do you want to edit the key, value, or both? (key/value/both): ",
            EditField::from_str,
        )?
        else {
            return Ok(Flow::Exit);
        };

        let old = table.cell(row, col)?.clone();

        let mut key = String::new();
        if field.edits_key() {
            let service = &self.service;
            let question = format!("Enter new key (leave blank to keep '{}'): ", old.key());
            let Some(answer) = self.prompt.ask_until(&question, |answer| {
                if !answer.is_empty() && answer != old.key() {
                    check_key(answer)?;
                    service.check_key_available(row, col, answer)?;
                }
                Ok(answer.to_string())
            })?
            else {
                return Ok(Flow::Exit);
            };
            key = answer;
        }

        let mut value = String::new();
        if field.edits_value() {
            let question = format!("Enter new value (leave blank to keep '{}'): ", old.value());
            let Some(answer) = self.prompt.ask_until(&question, |answer| {
                if !answer.is_empty() && answer != old.value() {
                    check_value(answer)?;
                }
                Ok(answer.to_string())
            })?
            else {
                return Ok(Flow::Exit);
            };
            value = answer;
        }

        match self.service.edit(row, col, CellEdit::new(field, key, value)) {
            Ok(outcome) => {
                self.prompt.say(format!(
                    "\nCell updated:\nOld value -> {}\nNew value -> {}\n",
                    outcome.old, outcome.new
                ))?;
                let message = format!("Saved to {}", self.service.file_name());
                self.prompt.say(message)?;
            }
            Err(e) => self.report(Err(e))?,
        }
        Ok(Flow::Continue)
    }

    fn add_row(&mut self) -> Result<Flow> {
        if !self.has_data()? {
            return Ok(Flow::Continue);
        }

        let Some(cells) = self.prompt.ask_until(
            "Enter the number of cells for the new row: ",
            |answer| match parse_number(answer)? {
                0 => Err(Error::Validation(
                    "number of cells must be greater than 0".to_string(),
                )),
                n => Ok(n),
            },
        )?
        else {
            return Ok(Flow::Exit);
        };

        let len = self.service.table().len();
        let question = format!(
            "Insert the new row after which row? (0 to {}, 0 = before first row): ",
            len
        );
        let Some(index) = self.prompt.ask_until(&question, |answer| {
            let index = parse_number(answer)?;
            if index > len {
                return Err(Error::Validation(format!("row number {} out of range", index)));
            }
            Ok(index)
        })?
        else {
            return Ok(Flow::Exit);
        };

        let added = self.service.add_row(cells, index);
        if added.is_ok() {
            self.prompt.say("\nNew row added successfully!\n")?;
        }
        self.saved(added)?;
        self.print()?;
        Ok(Flow::Continue)
    }

    fn sort(&mut self) -> Result<Flow> {
        if self.service.table().is_empty() {
            self.prompt
                .say("No data to sort. Please load or generate a table first.\n")?;
            return Ok(Flow::Continue);
        }

        let len = self.service.table().len();
        let question = format!("Enter the row number to sort (1-{}): ", len);
        let Some(row) = self.prompt.ask_until(&question, |answer| {
            let row = parse_number(answer)?;
            if row == 0 || row > len {
                return Err(Error::Validation(format!("row number {} out of range", row)));
            }
            Ok(row)
        })?
        else {
            return Ok(Flow::Exit);
        };

        let Some(order) = self
            .prompt
            .ask_until("Sort order <asc/desc>: ", SortOrder::from_str)?
        else {
            return Ok(Flow::Exit);
        };

        let sorted = self.service.sort_row(row, order);
        if sorted.is_ok() {
            self.prompt
                .say(format!("\nRow {} sorted in {} order.\n", row, order))?;
        }
        self.saved(sorted)?;
        self.print()?;
        Ok(Flow::Continue)
    }

    fn reset(&mut self) -> Result<Flow> {
        if !self.service.storage().exists(self.service.file_name()) {
            self.prompt.say("No file associated with this table.\n")?;
            return Ok(Flow::Continue);
        }

        let Some((rows, cols)) = self.ask_dimensions()? else {
            return Ok(Flow::Exit);
        };
        let reset = self.service.reset_table(rows, cols);
        self.saved(reset)?;
        self.print()?;
        Ok(Flow::Continue)
    }

    fn history(&mut self) -> Result<()> {
        let history = self.service.history();
        if history.is_empty() {
            return self.prompt.say("No changes recorded yet.\n");
        }

        let mut lines = format!("History ({} change/s):", history.len());
        for (i, entry) in history.entries().iter().enumerate() {
            lines.push_str(&format!("\n  {}. {}", i + 1, entry));
        }
        self.prompt.say(format!("{}\n", lines))
    }
}
