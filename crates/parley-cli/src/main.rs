mod config;

use std::sync::Arc;

use chrono::Local;
use parley_feed::{ChatClient, Directory, FixedIdentity, render};
use parley_store::MemoryStore;
use parley_types::{Feed, FeedChange, FeedStatus, User};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{Config, StartIn};

const HELP: &str = "\
/users              list contacts
/chats              list conversations
/invite <id> [name] add a contact
/open <id>          chat with a contact
/global             back to the global room
/quit               sign out and exit
anything else is sent to the open conversation";

enum Command<'a> {
    Users,
    Chats,
    Invite { id: &'a str, name: &'a str },
    Open(&'a str),
    Global,
    Help,
    Quit,
    Send(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Send(line);
        };
        let (cmd, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let arg = arg.trim();
        match cmd {
            "users" => Self::Users,
            "chats" => Self::Chats,
            "invite" if !arg.is_empty() => {
                let (id, name) = arg.split_once(' ').unwrap_or((arg, arg));
                Self::Invite {
                    id,
                    name: name.trim(),
                }
            }
            "open" if !arg.is_empty() => Self::Open(arg),
            "global" => Self::Global,
            "quit" | "exit" => Self::Quit,
            _ => Self::Help,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info,parley_feed=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(MemoryStore::new());
    let directory = Directory::new(store.clone());
    let mut client = ChatClient::new(store, FixedIdentity::new(config.user.clone()));

    let me = client.sign_in(config.provider).await?;
    info!("Parley ready as {} ({})", me.display_name, me.id);

    let printer = tokio::spawn(print_feed(client.feed(), me.id.clone()));

    match config.start_in {
        StartIn::Global => client.open_global().await?,
        StartIn::Direct(other) => {
            directory.ensure_user(&User::new(other.as_str(), other.as_str(), "")).await?;
            client.open_direct_with(&other).await?
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(line.trim_end()) {
            Command::Users => match client.contacts().await {
                Ok(users) if users.is_empty() => println!("no contacts yet, try /invite"),
                Ok(users) => {
                    for user in users {
                        println!("  {:<16} {}", user.id, user.display_name);
                    }
                }
                Err(e) => warn!("Could not list contacts: {}", e),
            },
            Command::Chats => match client.conversations().await {
                Ok(chats) => {
                    for chat in chats {
                        let names: Vec<_> =
                            chat.members.iter().map(|m| m.display_name.as_str()).collect();
                        println!("  {:<24} {}", chat.id, names.join(", "));
                    }
                }
                Err(e) => warn!("Could not list conversations: {}", e),
            },
            Command::Invite { id, name } => {
                match directory.ensure_user(&User::new(id, name, "")).await {
                    Ok(user) => println!("{} added, reach them with /open {}", user.display_name, user.id),
                    Err(e) => warn!("Could not add {}: {}", id, e),
                }
            }
            Command::Open(id) => {
                if let Err(e) = client.open_direct_with(id).await {
                    warn!("Could not open conversation with {}: {}", id, e);
                }
            }
            Command::Global => {
                if let Err(e) = client.open_global().await {
                    warn!("Could not open the global room: {}", e);
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Send(text) => {
                client.composer_mut().set_draft(text);
                if let Err(e) = client.send().await {
                    warn!("Message not sent: {}", e);
                }
            }
        }
    }

    client.sign_out().await?;
    printer.abort();
    Ok(())
}

/// Print each published feed as it arrives. Appends only print the new tail.
async fn print_feed(mut feed: watch::Receiver<Feed>, viewer: String) {
    while feed.changed().await.is_ok() {
        let current = feed.borrow_and_update().clone();
        let bubbles = render(&current, Some(&viewer));

        let fresh = match current.change {
            FeedChange::Unchanged => &bubbles[bubbles.len()..],
            FeedChange::Appended { count } => &bubbles[bubbles.len().saturating_sub(count)..],
            FeedChange::Reset | FeedChange::Replaced => {
                if let Some(conversation) = &current.conversation {
                    println!("--- {} ---", conversation);
                }
                &bubbles[..]
            }
        };

        for bubble in fresh {
            let side = if bubble.owned { ">" } else { "<" };
            println!(
                "{} [{}] {}: {}",
                side,
                bubble.time_label(&Local),
                bubble.author_name,
                bubble.contents
            );
        }

        if current.status == FeedStatus::Degraded {
            println!("(connection lost, showing the last messages received)");
        }
    }
}
