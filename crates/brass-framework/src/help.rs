//! The built-in `help [command]` command.

use std::sync::Arc;

use brass_core::HostError;

use crate::context::CommandContext;
use crate::dispatcher::{Dispatcher, WeakDispatcher};
use crate::error::CommandResult;
use crate::registry::{CommandEntry, CommandRegistry};

pub const HELP_COMMAND: &str = "help";
const HELP_MAP: &str = "[command]";
const HELP_TEXT: &str = "Views help for a command, or views the list of commands.";
const NO_HELP: &str = "No help specified.";

pub(crate) fn install(dispatcher: &Dispatcher) -> CommandResult<()> {
    let weak = dispatcher.downgrade();
    dispatcher.register(
        HELP_COMMAND,
        HELP_MAP,
        move |ctx: Arc<CommandContext>| help(weak.clone(), ctx),
        Some(HELP_TEXT),
    )
}

async fn help(dispatcher: WeakDispatcher, ctx: Arc<CommandContext>) -> Result<(), HostError> {
    let Some(dispatcher) = dispatcher.upgrade() else {
        return Ok(());
    };

    let Some(name) = ctx.arg::<String>("command") else {
        let text = command_list(&dispatcher.commands());
        return ctx.send(&text).await;
    };

    let entry = dispatcher.commands().get(&name).cloned();
    match entry {
        Some(entry) => {
            let text = command_help(&dispatcher.options().prefix, &name, &entry);
            ctx.send(&text).await
        }
        None => ctx.reply("Unknown command.").await,
    }
}

/// Usage block for one command.
pub fn command_help(prefix: &str, name: &str, entry: &CommandEntry) -> String {
    let help = entry.help.as_deref().unwrap_or(NO_HELP);
    let usage = entry.usage();
    if usage.is_empty() {
        format!("```\n{prefix}{name}\n\n{help}\n```")
    } else {
        format!("```\n{prefix}{name} {usage}\n\n{help}\n```")
    }
}

/// Every command as `name :: help`, names padded to the longest.
pub fn command_list(registry: &CommandRegistry) -> String {
    let entries = registry.entries();
    let width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0);

    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            let help = e.help.as_deref().unwrap_or(NO_HELP);
            format!("{:<width$} :: {help}", e.name)
        })
        .collect();

    format!("```asciidoc\n{}```", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use brass_core::{Channel, IncomingMessage, MemoryHost, User};

    use super::*;
    use crate::dispatcher::DispatcherOptions;

    fn setup() -> (Arc<MemoryHost>, Dispatcher) {
        let host = Arc::new(MemoryHost::new());
        let dispatcher = Dispatcher::new(host.clone(), DispatcherOptions::default().with_prefix("!"))
            .with_default_help()
            .unwrap();
        dispatcher
            .register("greet", "<name> [times:int]", || async {}, Some("Greets someone."))
            .unwrap();
        dispatcher.register("ping", "", || async {}, None).unwrap();
        (host, dispatcher)
    }

    fn say(content: &str) -> IncomingMessage {
        IncomingMessage::new("m", content, User::new("1", "ada"), Channel::new("c", "c"))
    }

    #[test]
    fn test_command_list_format() {
        let (_, dispatcher) = setup();
        let text = command_list(&dispatcher.commands());
        assert_eq!(
            text,
            "```asciidoc\n\
             greet :: Greets someone.\n\
             help  :: Views help for a command, or views the list of commands.\n\
             ping  :: No help specified.```"
        );
    }

    #[tokio::test]
    async fn test_help_for_one_command() {
        let (host, dispatcher) = setup();
        dispatcher.dispatch(say("!help greet")).await;
        assert_eq!(
            host.sent()[0].content,
            "```\n!greet <name> [times:int]\n\nGreets someone.\n```"
        );
    }

    #[tokio::test]
    async fn test_help_for_command_without_arguments() {
        let (host, dispatcher) = setup();
        dispatcher.dispatch(say("!help ping")).await;
        assert_eq!(host.sent()[0].content, "```\n!ping\n\nNo help specified.\n```");
    }

    #[tokio::test]
    async fn test_help_lists_commands() {
        let (host, dispatcher) = setup();
        dispatcher.dispatch(say("!help")).await;
        assert!(host.sent()[0].content.starts_with("```asciidoc\ngreet :: "));
    }

    #[tokio::test]
    async fn test_help_unknown_command() {
        let (host, dispatcher) = setup();
        dispatcher.dispatch(say("!help nope")).await;
        assert_eq!(host.sent()[0].content, "<@1>, Unknown command.");
    }
}
