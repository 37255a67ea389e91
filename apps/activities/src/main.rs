use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{ActivityStore, HttpAgent, RemoteError, Session};
use shared::{
    domain::ActivityId,
    error::ErrorCode,
    protocol::{ActivityDelta, ActivityFormValues, UserFormValues},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, normalize_api_url};

#[derive(Parser, Debug)]
#[command(name = "activities", about = "Browse and manage activities")]
struct Cli {
    /// Config file (defaults to ./activities.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true, requires = "password")]
    email: Option<String>,
    #[arg(long, global = true, requires = "email")]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every activity grouped by day.
    List,
    Show {
        id: ActivityId,
    },
    Create(CreateArgs),
    Update {
        id: ActivityId,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    Delete {
        id: ActivityId,
    },
    /// Join or leave an activity.
    Attend {
        id: ActivityId,
    },
    /// Cancel or reactivate an activity you host.
    Cancel {
        id: ActivityId,
    },
    Whoami,
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    date: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    venue: String,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    venue: Option<String>,
}

impl UpdateArgs {
    fn into_delta(self, id: ActivityId) -> ActivityDelta {
        ActivityDelta {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            date: self.date,
            city: self.city,
            venue: self.venue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_url) = &cli.api_url {
        settings.api_url = normalize_api_url(api_url);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let session = Arc::new(Session::new());
    let agent = Arc::new(HttpAgent::with_timeout(
        &settings.api_url,
        session.clone(),
        settings.request_timeout_secs.map(Duration::from_secs),
    )?);
    info!(api_url = %agent.base_url(), "using activities api");

    if let (Some(email), Some(password)) = (cli.email, cli.password) {
        let form = UserFormValues {
            email,
            password,
            ..UserFormValues::default()
        };
        session
            .sign_in(agent.as_ref(), &form)
            .await
            .map_err(|err| explain_auth_failure(err, "sign in failed"))?;
    } else if let Some(token) = &settings.token {
        session
            .restore(agent.as_ref(), token)
            .await
            .map_err(|err| explain_auth_failure(err, "could not restore the session"))?;
    }

    let store = ActivityStore::new(agent, session.clone());
    run(cli.command, &store, &session).await
}

fn explain_auth_failure(err: RemoteError, context: &'static str) -> anyhow::Error {
    match err.code() {
        ErrorCode::Unauthorized => anyhow!("{context}: credentials or token were rejected"),
        ErrorCode::Validation => anyhow!("{context}: {err}"),
        _ => anyhow::Error::new(err).context(context),
    }
}

async fn run(command: Command, store: &ActivityStore, session: &Session) -> Result<()> {
    match command {
        Command::List => {
            store.list_all().await;
            print!("{}", render::grouped(&store.grouped_by_date().await));
        }
        Command::Show { id } => {
            let Some(activity) = store.load_one(id).await else {
                bail!("activity {id} could not be loaded");
            };
            print!("{}", render::activity_detail(&activity));
        }
        Command::Create(args) => {
            let form = ActivityFormValues {
                id: None,
                title: args.title,
                description: args.description,
                category: args.category,
                date: args.date,
                city: args.city,
                venue: args.venue,
            };
            let Some(activity) = store.create(form).await else {
                bail!("activity was not created");
            };
            println!("created {}", render::activity_line(&activity));
        }
        Command::Update { id, fields } => {
            let delta = fields.into_delta(id);
            if delta.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            // Merging needs the full entity in the cache first.
            if store.load_one(id).await.is_none() {
                bail!("activity {id} could not be loaded");
            }
            let Some(activity) = store.update(delta).await else {
                bail!("activity {id} was not updated");
            };
            println!("updated {}", render::activity_line(&activity));
        }
        Command::Delete { id } => {
            if !store.remove(id).await {
                bail!("activity {id} was not deleted");
            }
            println!("deleted {id}");
        }
        Command::Attend { id } => {
            if session.current_user().await.is_none() {
                bail!("sign in with --email/--password or configure a token first");
            }
            store.load_one(id).await;
            let Some(activity) = store.toggle_attendance(id).await else {
                bail!("attendance for {id} was not changed");
            };
            let verb = if activity.is_going { "joined" } else { "left" };
            println!("{verb} {}", render::activity_line(&activity));
        }
        Command::Cancel { id } => {
            store.load_one(id).await;
            let Some(activity) = store.toggle_cancelled(id).await else {
                bail!("activity {id} was not changed");
            };
            let verb = if activity.is_cancelled {
                "cancelled"
            } else {
                "reactivated"
            };
            println!("{verb} {}", render::activity_line(&activity));
        }
        Command::Whoami => match session.current_user().await {
            Some(user) => println!("{} ({})", user.display_name, user.username),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
