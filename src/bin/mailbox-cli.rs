#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for reading the most recent messages of an IMAP mailbox

use clap::{Parser, Subcommand};
use mailbox_reader::{Folder, ImapConfig, MailReader, MailboxCredentials, NormalizedMessage};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailbox-cli")]
#[command(about = "Read recent messages from an IMAP mailbox")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the most recent messages, newest first
    Recent {
        /// Folder to read from (defaults to IMAP_FOLDER or INBOX)
        #[arg(long)]
        folder: Option<String>,

        /// Number of messages to read (defaults to IMAP_FETCH_LIMIT or 5)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a single message by sequence number
    Show {
        /// Message sequence number
        seq: u32,

        /// Folder containing the message
        #[arg(long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = ImapConfig::from_env()?;
    let credentials = MailboxCredentials::from_env()?;

    match &args.command {
        Command::Recent { folder, limit } => {
            if let Some(folder) = folder {
                config.folder = Folder::from(folder.as_str());
            }
            if let Some(limit) = limit {
                config.limit = *limit;
            }
            let reader = MailReader::new(config);
            cmd_recent(&reader, &args, credentials).await?;
        }
        Command::Show { seq, folder } => {
            if let Some(folder) = folder {
                config.folder = Folder::from(folder.as_str());
            }
            let reader = MailReader::new(config);
            cmd_show(&reader, &args, credentials, *seq).await?;
        }
    }

    Ok(())
}

async fn cmd_recent(
    reader: &MailReader,
    args: &Args,
    credentials: MailboxCredentials,
) -> anyhow::Result<()> {
    let messages = reader.fetch_recent(credentials).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else {
        print_message_table(&messages);
    }

    Ok(())
}

async fn cmd_show(
    reader: &MailReader,
    args: &Args,
    credentials: MailboxCredentials,
    seq: u32,
) -> anyhow::Result<()> {
    let message = reader.fetch_message(credentials, seq).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        print_message_detail(&message);
    }

    Ok(())
}

fn print_message_table(messages: &[NormalizedMessage]) {
    if messages.is_empty() {
        println!("No messages found.");
        return;
    }

    let header = format!("{:<6} {:<20} {:<30} {}", "Seq", "Received", "From", "Subject");
    println!("{header}");
    println!("{}", "-".repeat(100));

    for message in messages {
        let attachment = if message.has_attachments { " [+]" } else { "" };
        println!(
            "{:<6} {:<20} {:<30} {}{}",
            message.seq,
            message.received_at.format("%Y-%m-%d %H:%M"),
            truncate(&message.sender, 28),
            truncate(&message.subject, 40),
            attachment,
        );
    }

    println!("\n{} message(s)", messages.len());
}

fn print_message_detail(message: &NormalizedMessage) {
    println!("Seq:         {}", message.seq);
    println!("From:        {}", message.sender);
    println!("Date:        {}", message.date.as_deref().unwrap_or("-"));
    println!(
        "Received:    {}",
        message.received_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("Subject:     {}", message.subject);
    println!(
        "Attachments: {}",
        if message.has_attachments { "yes" } else { "no" }
    );

    println!("\n--- Body ---\n");
    println!("{}", message.body);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
