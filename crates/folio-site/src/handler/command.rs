use std::process::Command;

use super::{Handler, HandlerError, has_extension};
use crate::node::Node;

/// Placeholder replaced by the source path in converter arguments.
const INPUT_PLACEHOLDER: &str = "{input}";

/// Runs an external converter that prints HTML to stdout.
///
/// `{input}` in any argument is replaced by the source path. Without a
/// placeholder the source path is appended as the last argument.
pub struct CommandHandler {
    name: String,
    extensions: Vec<String>,
    program: String,
    args: Vec<String>,
}

impl CommandHandler {
    /// Create a handler for `extensions` running `command` (program first).
    ///
    /// Returns `None` when `command` is empty.
    pub fn new(extensions: Vec<String>, command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            name: program.clone(),
            extensions,
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command_for(&self, node: &Node) -> Command {
        let input = node.source_path().to_string_lossy();
        let mut command = Command::new(&self.program);
        if self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            command.args(self.args.iter().map(|a| a.replace(INPUT_PLACEHOLDER, &input)));
        } else {
            command.args(&self.args).arg(node.source_path());
        }
        command
    }
}

impl Handler for CommandHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, node: &Node) -> bool {
        has_extension(node, &self.extensions)
    }

    fn interpret(&self, node: &Node) -> Result<String, HandlerError> {
        let output = self
            .command_for(node)
            .output()
            .map_err(|source| HandlerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(HandlerError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|source| HandlerError::Utf8 {
            program: self.program.clone(),
            source,
        })
    }
}
