/// Vim-style command line (`:q`, `:help`, ...).
///
/// ## States
///   inactive ──':'──▶ active ──Enter/Esc──▶ inactive
///
/// `CommandMode` only buffers text and dispatches through a `CommandTable`.
/// It does not gate `add_char`/`backspace` on being active: the owner
/// decides who gets keystrokes (see `Focus` in the coordinator).
///
/// Handlers are verb-keyed trait objects. A handler's own error is
/// downgraded to `CommandResult::Failed` here and never reaches the
/// key-handling call site.

use std::error::Error;
use std::fmt;

/// What the owner should do after a successful command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CommandAction {
    /// Leave the current game for the main menu.
    Quit,
    NewGame,
    ContinueGame,
    ShowHelp,
    /// Close the application.
    Exit,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CommandResult {
    Ok {
        action: Option<CommandAction>,
        message: Option<String>,
    },
    Failed(String),
}

impl CommandResult {
    pub fn message(text: impl Into<String>) -> Self {
        CommandResult::Ok { action: None, message: Some(text.into()) }
    }

    pub fn action(action: CommandAction, text: impl Into<String>) -> Self {
        CommandResult::Ok { action: Some(action), message: Some(text.into()) }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CommandResult::Failed(error.into())
    }

    #[allow(dead_code)]
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Ok { .. })
    }

    #[allow(dead_code)]
    pub fn get_action(&self) -> Option<CommandAction> {
        match self {
            CommandResult::Ok { action, .. } => *action,
            CommandResult::Failed(_) => None,
        }
    }

    /// The message on success, the error on failure.
    #[allow(dead_code)]
    pub fn text(&self) -> Option<&str> {
        match self {
            CommandResult::Ok { message, .. } => message.as_deref(),
            CommandResult::Failed(e) => Some(e),
        }
    }
}

pub type HandlerResult = Result<CommandResult, Box<dyn Error>>;

pub trait Command {
    /// `table` is the table the verb was found in, for commands that
    /// describe their siblings.
    fn execute(&self, args: &[String], table: &CommandTable) -> HandlerResult;
    fn description(&self) -> &str;
}

// ══════════════════════════════════════════════════════════════
// Command table
// ══════════════════════════════════════════════════════════════

/// Ordered verb → handler map. Built once per mode, never mutated after.
#[derive(Default)]
pub struct CommandTable {
    entries: Vec<(String, Box<dyn Command>)>,
}

impl CommandTable {
    pub fn new() -> Self {
        CommandTable { entries: Vec::new() }
    }

    /// Registering an existing verb replaces its handler in place.
    pub fn register(mut self, verb: &str, command: impl Command + 'static) -> Self {
        let boxed: Box<dyn Command> = Box::new(command);
        match self.entries.iter_mut().find(|(v, _)| v == verb) {
            Some(entry) => entry.1 = boxed,
            None => self.entries.push((verb.to_string(), boxed)),
        }
        self
    }

    pub fn get(&self, verb: &str) -> Option<&dyn Command> {
        self.entries.iter().find(|(v, _)| v == verb).map(|(_, c)| c.as_ref())
    }

    #[allow(dead_code)]
    pub fn has(&self, verb: &str) -> bool {
        self.get(verb).is_some()
    }

    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(v, _)| v.as_str())
    }

    pub fn descriptions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(v, c)| (v.as_str(), c.description()))
    }

    /// In-game table: `q`, `quit`, `help`.
    pub fn builtin() -> Self {
        CommandTable::new()
            .register("q", QuitCommand::new("quit to main menu"))
            .register("quit", QuitCommand::new("Quit to main menu (alias for :q)"))
            .register("help", HelpCommand::new("Show help for available commands"))
    }

    /// Main-menu table. `has_save` is consulted every time `:edit` runs.
    pub fn menu(has_save: impl Fn() -> bool + 'static) -> Self {
        CommandTable::new()
            .register("new", FnCommand::new("Start a new game", |_| {
                Ok(CommandResult::action(CommandAction::NewGame, "Starting new game..."))
            }))
            .register("edit", FnCommand::new("Continue from saved game", move |_| {
                if !has_save() {
                    return Ok(CommandResult::failed("No saved game found"));
                }
                Ok(CommandResult::action(CommandAction::ContinueGame, "Loading saved game..."))
            }))
            .register("help", HelpCommand::new("Show help documentation"))
            .register("q", FnCommand::new("Quit the game", |_| {
                Ok(CommandResult::action(CommandAction::Exit, "Close game?"))
            }))
            .register("quit", FnCommand::new("Quit the game (alias for :q)", |_| {
                Ok(CommandResult::action(CommandAction::Exit, "Close game?"))
            }))
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.verbs()).finish()
    }
}

// ── Handlers ──

pub struct QuitCommand {
    description: String,
}

impl QuitCommand {
    pub fn new(description: &str) -> Self {
        QuitCommand { description: description.to_string() }
    }
}

impl Command for QuitCommand {
    fn execute(&self, _args: &[String], _table: &CommandTable) -> HandlerResult {
        Ok(CommandResult::action(CommandAction::Quit, "Returning to main menu..."))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// `:help` lists the table it lives in; `:help verb` describes one verb.
pub struct HelpCommand {
    description: String,
}

impl HelpCommand {
    pub fn new(description: &str) -> Self {
        HelpCommand { description: description.to_string() }
    }
}

impl Command for HelpCommand {
    fn execute(&self, args: &[String], table: &CommandTable) -> HandlerResult {
        if let Some(verb) = args.first() {
            return Ok(match table.get(verb) {
                Some(cmd) => CommandResult::message(format!(":{} - {}", verb, cmd.description())),
                None => CommandResult::failed(format!("Unknown command: {}", verb)),
            });
        }

        let listing: Vec<String> = table
            .descriptions()
            .map(|(verb, desc)| format!("  :{} - {}", verb, desc))
            .collect();
        Ok(CommandResult::Ok {
            action: Some(CommandAction::ShowHelp),
            message: Some(format!("Available commands:\n{}", listing.join("\n"))),
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

type Handler = Box<dyn Fn(&[String]) -> HandlerResult>;

/// Closure-backed command for one-off verbs.
pub struct FnCommand {
    description: String,
    run: Handler,
}

impl FnCommand {
    pub fn new(description: &str, run: impl Fn(&[String]) -> HandlerResult + 'static) -> Self {
        FnCommand { description: description.to_string(), run: Box::new(run) }
    }
}

impl Command for FnCommand {
    fn execute(&self, args: &[String], _table: &CommandTable) -> HandlerResult {
        (self.run)(args)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

// ══════════════════════════════════════════════════════════════
// CommandMode
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParsedCommand {
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug)]
pub struct CommandMode {
    active: bool,
    buffer: String,
    table: CommandTable,
}

impl CommandMode {
    pub fn new(table: CommandTable) -> Self {
        CommandMode { active: false, buffer: String::new(), table }
    }

    pub fn with_builtins() -> Self {
        CommandMode::new(CommandTable::builtin())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[allow(dead_code)]
    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Only `:` activates.
    pub fn try_activate(&mut self, key: char) -> bool {
        if key == ':' {
            self.activate();
            return true;
        }
        false
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.buffer.clear();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.buffer.clear();
    }

    pub fn add_char(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn parse_command(input: &str) -> ParsedCommand {
        let mut parts = input.split_whitespace().map(str::to_string);
        match parts.next() {
            Some(command) => ParsedCommand { command, args: parts.collect() },
            None => ParsedCommand { command: String::new(), args: vec![] },
        }
    }

    pub fn execute_command(&self, input: &str) -> CommandResult {
        let parsed = CommandMode::parse_command(input);
        if parsed.command.is_empty() {
            return CommandResult::failed("No command entered");
        }

        let Some(cmd) = self.table.get(&parsed.command) else {
            return CommandResult::failed(format!(
                "Unknown command: {}. Type :help for available commands.",
                parsed.command
            ));
        };

        match cmd.execute(&parsed.args, &self.table) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("command :{} failed: {}", parsed.command, e);
                CommandResult::failed(format!("Command failed: {}", e))
            }
        }
    }

    /// Execute the buffer. The buffer is cleared whatever the outcome;
    /// activation is left to the caller.
    pub fn submit(&mut self) -> CommandResult {
        let input = std::mem::take(&mut self.buffer);
        self.execute_command(&input)
    }

    pub fn cancel(&mut self) {
        self.deactivate();
    }
}
