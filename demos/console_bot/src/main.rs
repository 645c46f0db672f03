//! Console Bot
//!
//! Every line typed on stdin is delivered to the bot as a chat message in
//! `#general` of a guild called `console`; whatever the bot sends back is
//! printed. The host is an in-memory directory seeded with a few users.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot
//! cargo run --package console-bot -- --config brass.toml --dm
//! ```
//!
//! Then try `?help`, `?add 2 3`, `?whois ada#0001`, `?say <#11> hi there`
//! or `<@0> roll`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, Result, ensure};
use brass::prelude::*;
use clap::Parser;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const BOT_ID: &str = "0";
const GUILD_ID: &str = "console";

#[derive(Parser, Debug)]
#[command(about = "Chat with a Brass bot from the terminal")]
struct Cli {
    /// Configuration file to load instead of searching for brass.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile
    #[arg(short, long)]
    profile: Option<String>,

    /// Display name to chat as
    #[arg(short, long, default_value = "you")]
    name: String,

    /// Chat in a direct message instead of the guild
    #[arg(long)]
    dm: bool,
}

// ============================================================================
// Handler Functions
// ============================================================================

async fn ping() -> &'static str {
    "Pong!"
}

async fn echo(args: Arguments) -> Option<String> {
    args.get("text")
}

async fn add(args: Arguments) -> Result<String> {
    let a: i64 = args.get("a").context("missing a")?;
    let b: i64 = args.get("b").context("missing b")?;
    let sum = a.checked_add(b).context("that sum does not fit")?;
    Ok(sum.to_string())
}

async fn whois(args: Arguments) -> Option<String> {
    let member: Member = args.get("who")?;
    let kind = if member.user.bot { "bot" } else { "user" };
    Some(format!(
        "{} is {} ({kind}, id {})",
        member.display_name(),
        member.user.tag(),
        member.user.id
    ))
}

async fn whereami(channel: Channel, guild: Option<Guild>) -> String {
    match guild {
        Some(guild) => format!("{} in {}", channel.mention(), guild.name),
        None => format!("{} (direct message)", channel.mention()),
    }
}

async fn say(ctx: Arc<CommandContext>) -> Result<()> {
    let channel: Channel = ctx.arg("where").context("missing channel")?;
    let text: String = ctx.arg("text").unwrap_or_default();
    ensure!(!text.is_empty(), "nothing to say");
    ctx.send_to(&channel, &text).await?;
    Ok(())
}

// ============================================================================
// Dice Plugin
// ============================================================================

#[derive(serde::Deserialize)]
#[serde(default)]
struct DiceSettings {
    sides: i64,
}

impl Default for DiceSettings {
    fn default() -> Self {
        Self { sides: 6 }
    }
}

fn install_dice(ctx: &mut PluginContext<'_>) -> CommandResult<()> {
    let settings = ctx.get_config::<DiceSettings>()?;
    let default_sides = settings.sides.max(1);

    ctx.command(
        "roll",
        "[sides:int]",
        move |args: Arguments| async move {
            let sides = args.get::<i64>("sides").unwrap_or(default_sides).max(1);
            format!("rolled {} (d{sides})", roll(sides))
        },
        Some("Rolls a die."),
    )?;
    Ok(())
}

submit_plugin!(DICE = PluginDescriptor::new("dice", "Dice rolling", install_dice));

fn roll(sides: i64) -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::from(d.subsec_nanos()))
        .unwrap_or_default();
    nanos % sides + 1
}

// ============================================================================
// Console Host
// ============================================================================

fn seed(host: &MemoryHost) {
    host.add_user(User::new(BOT_ID, "brass").with_bot(true));
    for (id, name, tag) in [("5", "ada", "0001"), ("6", "grace", "0002")] {
        host.add_member(Member::new(
            User::new(id, name).with_discriminator(tag),
            GUILD_ID,
        ));
    }
    host.add_channel(Channel::new("10", "general").in_guild(GUILD_ID));
    host.add_channel(Channel::new("11", "random").in_guild(GUILD_ID));
}

fn print_outbox(host: &MemoryHost) {
    for sent in host.drain() {
        println!("[#{}] brass: {}", sent.channel_id, sent.content);
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// The speaker and where they speak.
#[derive(Clone)]
struct Console {
    host: Arc<MemoryHost>,
    author: User,
    channel: Channel,
    guild: Option<Guild>,
}

impl Console {
    fn message(&self, id: u64, content: String) -> IncomingMessage {
        let message = IncomingMessage::new(
            id.to_string(),
            content,
            self.author.clone(),
            self.channel.clone(),
        );
        match &self.guild {
            Some(guild) => message.in_guild(guild.clone()),
            None => message,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let host = Arc::new(MemoryHost::new());
    seed(&host);

    let mut builder = BrassRuntime::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build(host.clone())?;

    let dispatcher = runtime.dispatcher();
    dispatcher.set_self_id(BOT_ID);
    dispatcher.register("ping", "", ping, Some("Checks that the bot is alive."))?;
    dispatcher.register("echo", "<text...>", echo, Some("Repeats the text back."))?;
    dispatcher.register("add", "<a:int> <b:int>", add, Some("Adds two numbers."))?;
    dispatcher.register("whois", "<who:member>", whois, Some("Describes a member."))?;
    dispatcher.register("where", "", whereami, None)?;
    dispatcher.register(
        "say",
        "<where:channel> <text...>",
        say,
        Some("Posts text to another channel."),
    )?;
    dispatcher.on_error(|entry, ctx, err| {
        println!("! {err}");
        if !entry.spec.is_empty() {
            println!("  usage: {}{} {}", ctx.prefix(), entry.name, entry.usage());
        }
    });

    let author = User::new("42", cli.name.as_str()).with_discriminator("4242");
    let guild = (!cli.dm).then(|| Guild::new(GUILD_ID, "console"));
    if guild.is_some() {
        host.add_member(Member::new(author.clone(), GUILD_ID));
    }
    let console = Console {
        host: host.clone(),
        author,
        channel: Channel::new("10", "general"),
        guild,
    };

    info!(
        prefix = %runtime.config().commands.prefix,
        commands = dispatcher.commands().len(),
        "Console bot ready"
    );

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let messages = stream::unfold((lines, 0u64, console), |(mut lines, n, console)| async move {
        print_outbox(&console.host);
        prompt();
        let line = lines.next_line().await.ok().flatten()?;
        let message = console.message(n, line);
        Some((message, (lines, n + 1, console)))
    });

    let stats = runtime.run(messages).await;
    print_outbox(&host);
    println!();
    info!(messages = stats.total(), "Bye");

    Ok(())
}
