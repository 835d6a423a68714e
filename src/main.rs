use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use realchat_client::config::normalize_base_url;
use realchat_client::state::FetchStatus;
use realchat_client::{ApiError, AppContext, ClientConfig, ConfigError, Locale, NavigationError, StoreError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),
    #[error("not logged in; run `realchat login` first")]
    NotLoggedIn,
    #[error("could not refresh {what}: {reason}")]
    Fetch { what: &'static str, reason: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "realchat", about = "Realchat client CLI")]
struct Cli {
    #[arg(long, env = "REALCHAT_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "REALCHAT_STATE_PATH")]
    state_path: Option<PathBuf>,

    #[arg(long, env = "REALCHAT_LOCALE")]
    locale: Option<String>,

    #[arg(long, env = "REALCHAT_HISTORY_LIMIT")]
    history_limit: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        username: String,
        #[arg(long, env = "REALCHAT_PASSWORD")]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    Login {
        username: String,
        #[arg(long, env = "REALCHAT_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami,
    Users {
        #[arg(long, default_value_t = false)]
        online: bool,
    },
    /// Show a profile; defaults to the signed-in user.
    Profile {
        username: Option<String>,
    },
    History {
        peer: String,
        /// Page size for this request; defaults to the configured history limit.
        #[arg(long)]
        limit: Option<u32>,
    },
    Send {
        to: String,
        content: String,
    },
    Unread,
    MarkRead {
        message_id: String,
    },
    Rooms(RoomsCommand),
    /// Run the navigation guard for a path and print where it lands.
    Open {
        path: String,
    },
}

#[derive(Args, Debug)]
struct RoomsCommand {
    #[command(subcommand)]
    command: RoomsSubcommand,
}

#[derive(Subcommand, Debug)]
enum RoomsSubcommand {
    List,
    Mine,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "member")]
        members: Vec<String>,
    },
    Join {
        room_id: String,
    },
    Leave {
        room_id: String,
    },
    History {
        room_id: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    Send {
        room_id: String,
        content: String,
    },
    Invite {
        room_id: String,
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },
    Invites {
        room_id: String,
    },
    DisableInvite {
        room_id: String,
        invite_code: String,
    },
    ValidateInvite {
        invite_code: String,
    },
    JoinInvite {
        invite_code: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let ctx = AppContext::from_config(&config)?;
    ctx.bootstrap();

    run_command(&ctx, cli.command).await
}

fn build_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = normalize_base_url(base_url)?;
    }
    if let Some(state_path) = &cli.state_path {
        config.state_path.clone_from(state_path);
    }
    if let Some(locale) = &cli.locale {
        config.locale = Locale::parse(locale)?;
    }
    if let Some(limit) = page_size(cli.history_limit) {
        config.history_limit = limit;
    }
    Ok(config)
}

async fn run_command(ctx: &AppContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Register { username, password, email } => {
            let user = ctx.session().register(&username, &password, email.as_deref()).await?;
            print_json(&user)
        }
        Command::Login { username, password } => {
            let resp = ctx.session().login(&username, &password).await?;
            print_json(&resp.user)
        }
        Command::Logout => {
            ctx.logout().await;
            print_json(&json!({ "logged_out": true }))
        }
        Command::Whoami => {
            require_user(ctx)?;
            print_json(&ctx.session().user())
        }
        Command::Users { online } => {
            let store = ctx.conversations();
            if online {
                check_fetch("online users", store.load_online_users().await)?;
                print_json(&store.online_users())
            } else {
                check_fetch("users", store.load_users().await)?;
                print_json(&store.users())
            }
        }
        Command::Profile { username } => {
            let username = match username {
                Some(username) => username,
                None => require_user(ctx)?,
            };
            let user = ctx.api().user_profile(&username).await?;
            print_json(&user)
        }
        Command::History { peer, limit } => {
            let me = require_user(ctx)?;
            let store = ctx.conversations();
            let messages = match page_size(limit) {
                Some(limit) => store.load_messages_with_limit(&me, &peer, limit).await?,
                None => store.load_messages(&me, &peer).await?,
            };
            print_json(&messages)
        }
        Command::Send { to, content } => {
            let me = require_user(ctx)?;
            let message = ctx.conversations().send_message(&me, &content, &to).await?;
            print_json(&message)
        }
        Command::Unread => {
            let me = require_user(ctx)?;
            let store = ctx.conversations();
            check_fetch("unread messages", store.load_unread(&me).await)?;
            let summary: Vec<_> = store
                .snapshot()
                .inbox
                .conversations()
                .into_iter()
                .map(|(conversation, unread)| json!({ "conversation": conversation.to_string(), "unread": unread }))
                .collect();
            print_json(&summary)
        }
        Command::MarkRead { message_id } => {
            require_user(ctx)?;
            ctx.conversations().mark_read(&message_id).await?;
            print_json(&json!({ "marked_read": message_id }))
        }
        Command::Open { path } => {
            let route = ctx.guard().navigate(&path)?;
            print_json(&json!({ "requested": path, "route": route.path() }))
        }
        Command::Rooms(rooms) => run_rooms(ctx, rooms).await,
    }
}

async fn run_rooms(ctx: &AppContext, rooms: RoomsCommand) -> Result<(), CliError> {
    let store = ctx.rooms();
    match rooms.command {
        RoomsSubcommand::List => {
            check_fetch("rooms", store.load_rooms().await)?;
            print_json(&store.rooms())
        }
        RoomsSubcommand::Mine => {
            let me = require_user(ctx)?;
            check_fetch("your rooms", store.load_user_rooms(&me).await)?;
            print_json(&store.my_rooms())
        }
        RoomsSubcommand::Create { name, description, members } => {
            let me = require_user(ctx)?;
            let room = store.create_room(&me, &name, description.as_deref(), members).await?;
            print_json(&room)
        }
        RoomsSubcommand::Join { room_id } => {
            let me = require_user(ctx)?;
            store.join_room(&room_id, &me).await?;
            print_json(&json!({ "joined": room_id }))
        }
        RoomsSubcommand::Leave { room_id } => {
            let me = require_user(ctx)?;
            store.leave_room(&room_id, &me).await?;
            print_json(&json!({ "left": room_id }))
        }
        RoomsSubcommand::History { room_id, limit } => {
            let me = require_user(ctx)?;
            let conversations = ctx.conversations();
            let messages = match page_size(limit) {
                Some(limit) => conversations.load_room_messages_with_limit(&me, &room_id, limit).await?,
                None => conversations.load_room_messages(&me, &room_id).await?,
            };
            print_json(&messages)
        }
        RoomsSubcommand::Send { room_id, content } => {
            let me = require_user(ctx)?;
            let message = ctx.conversations().send_room_message(&me, &room_id, &content).await?;
            print_json(&message)
        }
        RoomsSubcommand::Invite { room_id, hours } => {
            let me = require_user(ctx)?;
            let invite = store.create_invite(&room_id, &me, hours).await?;
            print_json(&invite)
        }
        RoomsSubcommand::Invites { room_id } => {
            let me = require_user(ctx)?;
            let invites = store.list_invites(&room_id, &me).await?;
            print_json(&invites)
        }
        RoomsSubcommand::DisableInvite { room_id, invite_code } => {
            let me = require_user(ctx)?;
            store.disable_invite(&room_id, &invite_code, &me).await?;
            print_json(&json!({ "disabled": invite_code }))
        }
        RoomsSubcommand::ValidateInvite { invite_code } => {
            let invite = store.validate_invite(&invite_code).await?;
            print_json(&invite)
        }
        RoomsSubcommand::JoinInvite { invite_code } => {
            let me = require_user(ctx)?;
            let joined = store.join_via_invite(&invite_code, &me).await?;
            print_json(&joined)
        }
    }
}

/// Protected commands go through the guard like a `/chat` navigation.
fn require_user(ctx: &AppContext) -> Result<String, CliError> {
    ctx.authenticated_user().ok_or(CliError::NotLoggedIn)
}

/// A zero limit falls back to the configured page size.
fn page_size(limit: Option<u32>) -> Option<u32> {
    limit.filter(|n| *n > 0)
}

fn check_fetch(what: &'static str, status: FetchStatus) -> Result<(), CliError> {
    match status {
        FetchStatus::Failed(reason) => Err(CliError::Fetch { what, reason }),
        FetchStatus::Idle | FetchStatus::Loaded => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
