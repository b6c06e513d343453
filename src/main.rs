use anyhow::{Context, Result};
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ETAG};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use selcdn_storage::config::{expand_tilde, CliArgs, Command};
use selcdn_storage::StorageClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load arguments first (for log level)
    let args = CliArgs::load();

    // Initialize logging with a configured level; stdout is reserved for object data
    let log_level = args.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = args.storage_config();
    config.validate()?;

    let client = StorageClient::with_config(config, args.user.clone(), args.key.clone())
        .await
        .context("Authentication failed")?;

    let credential = client.credential().await;
    tracing::info!(
        "✅ Authenticated as {} (token valid until {})",
        client.auth().user(),
        credential.expires_at().to_rfc3339()
    );

    run(&client, args.command).await
}

async fn run(client: &StorageClient, command: Command) -> Result<()> {
    match command {
        Command::Ls { container, path } => {
            let objects = client
                .list(&container, &path)
                .await
                .with_context(|| format!("Failed to list {}/{}", container, path))?;

            let mut entries: Vec<_> = objects.into_values().collect();
            entries.sort_by(|a, b| a.name().cmp(b.name()));

            for entry in entries {
                println!(
                    "{:>12}  {:<26}  {}",
                    entry.bytes().map(|b| b.to_string()).unwrap_or_default(),
                    entry.last_modified().unwrap_or("-"),
                    entry.name()
                );
            }
        }

        Command::Get {
            container,
            path,
            output,
        } => {
            let (_headers, mut stream) = client
                .get_stream(&container, &path, None)
                .await
                .with_context(|| format!("Failed to download {}/{}", container, path))?;

            let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match output {
                Some(ref file) => {
                    let file = expand_tilde(file);
                    Box::new(
                        tokio::fs::File::create(&file)
                            .await
                            .with_context(|| format!("Failed to create {}", file.display()))?,
                    )
                }
                None => Box::new(tokio::io::stdout()),
            };

            let mut written: u64 = 0;
            while let Some(chunk) = stream.try_next().await? {
                writer.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            writer.flush().await?;

            tracing::info!("✅ Downloaded {}/{} ({} bytes)", container, path, written);
        }

        Command::Put {
            container,
            path,
            file,
            content_type,
        } => {
            let mut headers = HeaderMap::new();
            if let Some(content_type) = content_type {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_str(&content_type).context("Invalid content type")?,
                );
            }

            let file = expand_tilde(&file);
            let response = client
                .save_file(&container, &path, &file, Some(headers))
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;

            let etag = response
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info!("✅ Uploaded {}/{} (etag: {})", container, path, etag);
        }

        Command::Rm {
            container,
            path,
            force,
        } => {
            client
                .remove(&container, &path, force)
                .await
                .with_context(|| format!("Failed to delete {}/{}", container, path))?;
            tracing::info!("✅ Deleted {}/{}", container, path);
        }

        Command::Cp {
            container,
            src,
            dst,
        } => {
            client
                .copy(&container, &src, &dst, None)
                .await
                .with_context(|| format!("Failed to copy {} to {}", src, dst))?;
            tracing::info!("✅ Copied {}/{} to {}/{}", container, src, container, dst);
        }
    }

    Ok(())
}
