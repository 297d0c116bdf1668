use crate::domain::entities::{Command, CommandRegistry, Content, Message, Reply};

/// Service for managing and executing commands
pub struct CommandService {
    registry: CommandRegistry,
}

impl CommandService {
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
        }
    }

    pub fn register(&mut self, command: Command) {
        tracing::debug!("Registered command /{}", command.name);
        self.registry.register(command);
    }

    /// Run the handler bound to the message's command.
    ///
    /// Returns `None` for non-command messages and for commands nothing is registered for.
    pub fn handle(&self, message: &Message) -> Option<Reply> {
        let Content::Command { name, .. } = &message.content else {
            return None;
        };

        let Some(cmd) = self.registry.find(name) else {
            tracing::debug!("[{}] No handler for /{}", message.chat_id, name);
            return None;
        };

        match &cmd.handler {
            Some(handler) => Some(handler(message)),
            None => {
                tracing::warn!("Command /{} has no handler", cmd.name);
                None
            }
        }
    }

    /// `(name, description)` pairs for publishing the command menu
    pub fn menu(&self) -> Vec<(String, String)> {
        let mut menu: Vec<(String, String)> = self
            .registry
            .all()
            .map(|cmd| (cmd.name.clone(), cmd.description.clone().unwrap_or_default()))
            .collect();
        menu.sort();
        menu
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }
}
