//! Option grammar: raw switches from clap resolved into a [`CommandRequest`].

use crate::error::CredsError;
use crate::models::credential_type::CredentialType;
use clap::{ArgAction, Args};
use tracing::debug;

/// Switches as tokenized by clap, before any grammar rule is applied.
#[derive(Args, Debug, Default, Clone)]
pub struct RawOptions {
    /// List credentials (secrets are never shown)
    #[arg(short = 'l', action = ArgAction::Count)]
    pub list: u8,

    /// Show a credential including its secret
    #[arg(short = 's', action = ArgAction::Count)]
    pub show: u8,

    /// Add or replace a credential
    #[arg(short = 'a', action = ArgAction::Count)]
    pub add: u8,

    /// Delete a credential
    #[arg(short = 'd', action = ArgAction::Count)]
    pub delete: u8,

    /// Treat the target name as a wildcard filter
    #[arg(short = 'g', action = ArgAction::Count)]
    pub filter: u8,

    /// Target name
    #[arg(short = 't', value_name = "target", action = ArgAction::Append, allow_hyphen_values = true)]
    pub target: Vec<String>,

    /// Credential type (Generic, DomainPassword, ...)
    #[arg(short = 'y', value_name = "type", action = ArgAction::Append, allow_hyphen_values = true)]
    pub credential_type: Vec<String>,

    /// Secret as a hex string
    #[arg(
        short = 'p',
        value_name = "hexBlob",
        action = ArgAction::Append,
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub secret: Vec<String>,

    /// Target name, when -t is not given
    #[arg(value_name = "target")]
    pub bare: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Show,
    Add,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: Command,
    pub credential_type: Option<CredentialType>,
    pub target_name: Option<String>,
    pub secret_hex: Option<String>,
    pub use_filter: bool,
}

impl CommandRequest {
    /// The requested type, or `Generic` when none was given.
    pub fn effective_type(&self) -> CredentialType {
        self.credential_type.unwrap_or(CredentialType::Generic)
    }
}

/// Resolves [`RawOptions`], consuming bare arguments through an explicit cursor.
pub struct OptionParser {
    raw: RawOptions,
    cursor: usize,
}

impl OptionParser {
    pub fn new(raw: RawOptions) -> Self {
        Self { raw, cursor: 0 }
    }

    fn next_bare(&mut self) -> Option<String> {
        let arg = self.raw.bare.get(self.cursor).cloned();
        if arg.is_some() {
            self.cursor += 1;
        }
        arg
    }

    fn has_bare(&self) -> bool {
        self.cursor < self.raw.bare.len()
    }

    pub fn parse(mut self) -> Result<CommandRequest, CredsError> {
        let mut command = self.selected_command()?;

        let mut target_name = single(
            &mut self.raw.target,
            "The TargetName option (-t) cannot be given twice",
        )?;
        let credential_type = single(
            &mut self.raw.credential_type,
            "The credential type option (-y) cannot be given twice",
        )?
        .map(|name| resolve_type(&name))
        .transpose()?;
        let secret_hex = single(
            &mut self.raw.secret,
            "The password option (-p) cannot be given more than once",
        )?;

        if command.is_none() {
            if self.has_bare() {
                command = Some(Command::Show);
                if target_name.is_none() {
                    target_name = self.next_bare();
                }
            } else {
                command = Some(Command::List);
            }
        }
        let command = command.unwrap_or(Command::List);

        if credential_type.is_some() && command == Command::List {
            return Err(CredsError::usage("Cannot give -y switch for -l command"));
        }

        if command != Command::List && target_name.is_none() {
            target_name = Some(self.next_bare().ok_or_else(|| {
                CredsError::usage("Must specify TargetName parameter (-t switch)")
            })?);
        }

        if self.has_bare() {
            return Err(CredsError::usage("Too many arguments"));
        }

        let request = CommandRequest {
            command,
            credential_type,
            target_name,
            secret_hex,
            use_filter: self.raw.filter > 0,
        };
        debug!(command = ?request.command, target_name = ?request.target_name, use_filter = request.use_filter, "parsed request");
        Ok(request)
    }

    fn selected_command(&self) -> Result<Option<Command>, CredsError> {
        let selected: Vec<Command> = [
            (self.raw.list, Command::List),
            (self.raw.show, Command::Show),
            (self.raw.add, Command::Add),
            (self.raw.delete, Command::Delete),
        ]
        .into_iter()
        .flat_map(|(count, cmd)| std::iter::repeat(cmd).take(count as usize))
        .collect();
        match selected.as_slice() {
            [] => Ok(None),
            [cmd] => Ok(Some(*cmd)),
            _ => Err(CredsError::usage(
                "Multiple command options given, only one is accepted",
            )),
        }
    }
}

fn single(values: &mut Vec<String>, duplicate: &str) -> Result<Option<String>, CredsError> {
    if values.len() > 1 {
        return Err(CredsError::usage(duplicate));
    }
    Ok(values.pop())
}

fn resolve_type(name: &str) -> Result<CredentialType, CredsError> {
    CredentialType::from_name(name).map_err(|e| {
        let mut msg = format!("{}\nValid credential types are:", e);
        for t in CredentialType::selectable() {
            msg.push_str("\n    ");
            msg.push_str(t.name());
        }
        CredsError::Usage(msg)
    })
}
