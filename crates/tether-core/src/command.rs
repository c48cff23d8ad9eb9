//! Slash command specifications.
//!
//! A [`SlashCommand`] is the declarative spec registered with the platform:
//! name, description, typed options, and optional guild scoping. Specs are
//! validated when they are registered with the
//! [`HookRegistry`](crate::registry::HookRegistry), so a malformed command
//! fails before `run()` instead of on first invocation.

use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, RegistrationResult};

/// Platform limit on command and option name length.
const MAX_NAME_LEN: usize = 32;
/// Platform limit on description length.
const MAX_DESCRIPTION_LEN: usize = 100;

/// The type of value a command option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Free-form text.
    String,
    /// A whole number.
    Integer,
    /// A floating-point number.
    Number,
    /// True/false.
    Boolean,
    /// A platform user reference.
    User,
    /// A platform channel reference.
    Channel,
}

/// A single typed option on a slash command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    /// Option name, same shape rules as command names.
    pub name: String,
    /// Short description shown by the platform.
    pub description: String,
    /// The value type the platform enforces.
    pub kind: OptionKind,
    /// Whether the user must supply this option.
    pub required: bool,
}

impl CommandOption {
    /// Creates a required option.
    pub fn required(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: OptionKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
        }
    }

    /// Creates an optional option.
    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: OptionKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
        }
    }
}

/// A named, described, typed-option command registered with the platform.
///
/// # Example
///
/// ```rust
/// use tether_core::{CommandOption, OptionKind, SlashCommand};
///
/// let cmd = SlashCommand::new("greet", "Greet a user")
///     .option(CommandOption::required("who", "Who to greet", OptionKind::String))
///     .option(CommandOption::optional("times", "Repeat count", OptionKind::Integer));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Unique command name within one bot instance.
    pub name: String,
    /// Description shown by the platform.
    pub description: String,
    /// Typed options, in declaration order.
    #[serde(default)]
    pub options: Vec<CommandOption>,
    /// Guilds the command is scoped to; empty means global.
    #[serde(default)]
    pub guild_ids: Vec<u64>,
}

impl SlashCommand {
    /// Creates a command spec with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            guild_ids: Vec::new(),
        }
    }

    /// Appends an option (builder pattern).
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Scopes the command to a guild (builder pattern).
    pub fn guild(mut self, guild_id: u64) -> Self {
        self.guild_ids.push(guild_id);
        self
    }

    /// Validates the spec against the platform's shape rules.
    ///
    /// Checked here so bad registrations fail immediately:
    /// - name: non-empty, at most 32 chars, lowercase alphanumerics with
    ///   `-` or `_`
    /// - description: non-empty, at most 100 chars
    /// - option names: same shape rules, unique within the command
    /// - required options must precede optional ones
    pub fn validate(&self) -> RegistrationResult<()> {
        if let Err(reason) = check_name(&self.name) {
            return Err(RegistrationError::InvalidCommandName {
                name: self.name.clone(),
                reason,
            });
        }
        check_description(&self.description).map_err(|reason| {
            RegistrationError::InvalidDescription {
                command: self.name.clone(),
                reason,
            }
        })?;

        let mut seen_optional = false;
        for (i, option) in self.options.iter().enumerate() {
            if let Err(reason) = check_name(&option.name) {
                return Err(self.option_error(&option.name, reason));
            }
            if let Err(reason) = check_description(&option.description) {
                return Err(self.option_error(&option.name, reason));
            }
            if self.options[..i].iter().any(|o| o.name == option.name) {
                return Err(self.option_error(&option.name, "duplicate option name".into()));
            }
            if option.required && seen_optional {
                return Err(self.option_error(
                    &option.name,
                    "required options must precede optional ones".into(),
                ));
            }
            seen_optional |= !option.required;
        }
        Ok(())
    }

    fn option_error(&self, option: &str, reason: String) -> RegistrationError {
        RegistrationError::InvalidOption {
            command: self.name.clone(),
            option: option.to_string(),
            reason,
        }
    }
}

fn check_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("name exceeds {MAX_NAME_LEN} characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("only lowercase ASCII letters, digits, '-' and '_' are allowed".into());
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), String> {
    if description.is_empty() {
        return Err("description must not be empty".into());
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(format!("description exceeds {MAX_DESCRIPTION_LEN} characters"));
    }
    Ok(())
}
