use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use photofeed::config::{Cli, Command, Config};
use photofeed::db;
use photofeed::db::serialize::{CommentResponse, PostResponse};
use photofeed::error::ModelError;
use photofeed::repository::{DynSocialRepository, SqliteSocialRepository};

#[derive(Serialize)]
struct PostWithComments {
    post: PostResponse,
    comments: Vec<CommentResponse>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Database: {}", config.db_path().display());
    let pool = db::create_pool(config.db_path(), config.database.pool_size)?;
    db::run_migrations(&pool)?;

    let repo: DynSocialRepository = Arc::new(
        SqliteSocialRepository::new(pool).with_password_cost(config.auth.bcrypt_cost),
    );

    match cli.command {
        Command::Migrate => {}
        Command::User { username } => {
            let user = repo
                .user_by_username(&username)
                .await?
                .ok_or_else(|| ModelError::NotFound(format!("user {}", username)))?;
            print_json(&repo.user_response(&user).await?)?;
        }
        Command::Post { id } => {
            let post = repo
                .post(id)
                .await?
                .ok_or_else(|| ModelError::NotFound(format!("post {}", id)))?;

            let mut comments = Vec::new();
            for comment in repo.comments_on_post(post.id).await? {
                comments.push(repo.comment_response(&comment).await?);
            }

            print_json(&PostWithComments {
                post: repo.post_response(&post).await?,
                comments,
            })?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
