use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storynest_client::config::{
    CliConfig, ClientConfig, FileConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SEC,
};
use storynest_client::{
    ApiClient, FileSessionStore, ProfilePatch, SessionManager, Story, StoryDraft, StoryId,
    StoryList, StoryPatch,
};

const NOT_LOGGED_IN: &str = "Not logged in. Run 'storynest login <username> <password>' first.";

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(
    name = "storynest",
    about = "Command-line client for the Storynest story-sharing service"
)]
struct CliArgs {
    /// Base URL of the Storynest service.
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Timeout in seconds for service requests.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SEC)]
    timeout_sec: u64,

    /// Path of the session file. Defaults to ~/.storynest/session.json.
    #[clap(long, value_parser = parse_path)]
    session_file: Option<PathBuf>,

    /// Path to a TOML config file; its values override the other flags.
    #[clap(long, value_parser = parse_path)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in as it.
    Signup {
        username: String,
        password: String,
        /// Display name for the new account.
        name: String,
    },

    /// Log in with an existing account.
    Login { username: String, password: String },

    /// Log out and forget the stored session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// Show the current story feed.
    Stories,

    /// Post a new story.
    Post {
        /// Byline shown for the story.
        author: String,
        title: String,
        url: String,
    },

    /// Edit fields of a story you own.
    Edit {
        story_id: String,
        #[clap(long)]
        author: Option<String>,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        url: Option<String>,
    },

    /// Delete a story you own.
    Delete { story_id: String },

    /// Add a story to your favorites.
    Favorite { story_id: String },

    /// Remove a story from your favorites.
    Unfavorite { story_id: String },

    /// Show your favorite stories.
    Favorites,

    /// Show the stories you posted.
    Mine,

    /// Change your display name.
    SetName { name: String },

    /// Permanently delete your account and its stories.
    DeleteAccount,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        base_url: cli_args.base_url.clone(),
        timeout_sec: cli_args.timeout_sec,
        session_file: cli_args.session_file.clone(),
    };
    let config = ClientConfig::resolve(&cli_config, file_config);

    let api = Arc::new(ApiClient::new(config.base_url.clone(), config.timeout_sec));
    let store = Arc::new(FileSessionStore::new(config.session_file.clone()));
    let mut manager = SessionManager::new(api, store);

    run_command(cli_args.command, &mut manager).await
}

async fn run_command(command: Command, manager: &mut SessionManager) -> Result<()> {
    let api = manager.api();

    match command {
        Command::Signup {
            username,
            password,
            name,
        } => {
            manager.sign_up(&username, &password, &name).await?;
            println!("Account created. Logged in as {}.", username);
        }

        Command::Login { username, password } => {
            manager.log_in(&username, &password).await?;
            println!("Logged in as {}.", username);
        }

        Command::Logout => {
            manager.log_out();
            println!("Logged out.");
        }

        Command::Whoami => {
            manager.restore_session().await;
            match manager.current_user() {
                Some(user) => {
                    println!("{} ({})", user.username(), user.name());
                    println!("member since {}", user.created_at().format("%Y-%m-%d"));
                    println!(
                        "{} favorites, {} stories posted",
                        user.favorites().len(),
                        user.own_stories().len()
                    );
                }
                None => println!("Not logged in."),
            }
        }

        Command::Stories => {
            let list = StoryList::fetch_all(&api).await?;
            // The feed is public; a session only adds favorite markers
            manager.restore_session().await;
            if list.is_empty() {
                println!("No stories yet.");
            }
            for story in list.stories() {
                let favorite = manager
                    .current_user()
                    .map(|user| user.is_favorite(story.story_id()))
                    .unwrap_or(false);
                print_story(story, favorite);
            }
        }

        Command::Post { author, title, url } => {
            manager.restore_session().await;
            let mut list = StoryList::fetch_all(&api).await?;
            let user = manager.current_user_mut().context(NOT_LOGGED_IN)?;
            let story = list
                .create_story(&api, user, &StoryDraft::new(author, title, url))
                .await?;
            println!("Posted story {} ({}).", story.story_id(), story.host());
        }

        Command::Edit {
            story_id,
            author,
            title,
            url,
        } => {
            manager.restore_session().await;
            let token = manager
                .current_user()
                .context(NOT_LOGGED_IN)?
                .token()
                .clone();
            let mut list = StoryList::fetch_all(&api).await?;
            let id = StoryId(story_id);
            let story = list
                .get_mut(&id)
                .with_context(|| format!("Story {} not found in the feed", id))?;
            let patch = StoryPatch { author, title, url };
            story.update(&api, &token, &patch).await?;
            println!("Updated story {}.", id);
        }

        Command::Delete { story_id } => {
            manager.restore_session().await;
            let mut list = StoryList::fetch_all(&api).await?;
            let user = manager.current_user_mut().context(NOT_LOGGED_IN)?;
            let id = StoryId(story_id);
            list.delete_story(&api, user, &id).await?;
            println!("Deleted story {}.", id);
        }

        Command::Favorite { story_id } => {
            manager.restore_session().await;
            let user = manager.current_user_mut().context(NOT_LOGGED_IN)?;
            let id = StoryId(story_id);
            user.add_favorite(&api, &id).await?;
            println!("Favorited {}. {} favorites total.", id, user.favorites().len());
        }

        Command::Unfavorite { story_id } => {
            manager.restore_session().await;
            let user = manager.current_user_mut().context(NOT_LOGGED_IN)?;
            let id = StoryId(story_id);
            user.remove_favorite(&api, &id).await?;
            println!(
                "Removed {} from favorites. {} favorites total.",
                id,
                user.favorites().len()
            );
        }

        Command::Favorites => {
            manager.restore_session().await;
            let user = manager.current_user().context(NOT_LOGGED_IN)?;
            if user.favorites().is_empty() {
                println!("No favorites yet.");
            }
            for story in user.favorites() {
                print_story(story, true);
            }
        }

        Command::Mine => {
            manager.restore_session().await;
            let user = manager.current_user().context(NOT_LOGGED_IN)?;
            if user.own_stories().is_empty() {
                println!("You have not posted any stories yet.");
            }
            for story in user.own_stories() {
                print_story(story, user.is_favorite(story.story_id()));
            }
        }

        Command::SetName { name } => {
            manager.restore_session().await;
            let user = manager.current_user_mut().context(NOT_LOGGED_IN)?;
            user.update_profile(&api, &ProfilePatch { name }).await?;
            println!("Name updated to {}.", user.name());
        }

        Command::DeleteAccount => {
            manager.restore_session().await;
            let user = manager.current_user().context(NOT_LOGGED_IN)?;
            let username = user.username().to_string();
            user.delete_account(&api).await?;
            manager.log_out();
            println!("Account {} deleted.", username);
        }
    }

    Ok(())
}

fn print_story(story: &Story, favorite: bool) {
    let marker = if favorite { "*" } else { " " };
    println!(
        "{} [{}] {} ({})",
        marker,
        story.story_id(),
        story.title(),
        story.host()
    );
    println!("      by {}, posted by {}", story.author(), story.username());
}
