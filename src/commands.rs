use console::style;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::database::{Database, VectorStore};
use crate::knowledge::KnowledgeBase;
use crate::openai::OpenAiClient;
use crate::profile::Profile;
use crate::responder::Responder;
use crate::seeder::Seeder;
use crate::server::{self, AppState};
use crate::Result;

/// Start the HTTP server, loading the knowledge index first.
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    let (database, vector_store, openai) = build_components(&config).await?;

    let knowledge = Arc::new(KnowledgeBase::new(&config, database.clone(), openai.clone()));
    match knowledge.load().await {
        Ok(count) => info!("Knowledge index ready with {} documents", count),
        Err(e) => {
            // Serve anyway: search endpoints return empty results and chat
            // uses the fallback router until a refresh succeeds.
            error!("Knowledge index load failed, serving degraded: {}", e);
            println!(
                "{} knowledge index failed to load: {}",
                style("Warning:").yellow().bold(),
                e
            );
        }
    }

    let responder = Arc::new(Responder::new(
        &config,
        openai.clone(),
        Arc::clone(&knowledge),
    ));

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = Arc::new(AppState {
        config,
        database,
        vector_store,
        openai,
        knowledge,
        responder,
    });

    println!(
        "{} folio-kb listening on http://{}:{}",
        style("Serving:").green().bold(),
        host,
        port
    );
    server::serve(state, &host, port).await
}

/// Seed the databases from a profile file.
#[inline]
pub async fn seed(config: Config, profile_path: &Path, recompute: bool) -> Result<()> {
    let profile = Profile::load(profile_path)?;
    println!(
        "Loaded profile with {} documents from {}",
        profile.document_count(),
        profile_path.display()
    );

    let (database, vector_store, openai) = build_components(&config).await?;
    let seeder = Seeder::new(&config, database, vector_store, openai);
    let stats = seeder.seed(&profile, recompute).await?;

    println!("{}", style("Seeding complete").green().bold());
    println!("  Documents upserted: {}", stats.documents);
    println!("  Embeddings computed: {}", stats.embedded);
    println!("  Unchanged (skipped): {}", stats.skipped);
    Ok(())
}

/// Print stored document counts, embedding counts, and provider reachability.
#[inline]
pub async fn status(config: Config) -> Result<()> {
    let (database, vector_store, openai) = build_components(&config).await?;

    if let Some(info) = database.get_primary_personal_info().await? {
        println!("{}", style("Profile").bold());
        println!("  {}, {}", info.name, info.title);
    }

    let counts = database.document_counts().await?;
    println!("{}", style("Documents").bold());
    println!("  Projects: {}", counts.projects);
    println!("  Skills: {}", counts.skills);
    println!("  Experience: {}", counts.experience);
    println!("  Personal info: {}", counts.personal_info);
    println!("  Total: {}", counts.total());

    let embeddings = vector_store.count_embeddings().await?;
    println!("{}", style("Vector store").bold());
    println!("  Embedded documents: {}", embeddings);
    if embeddings < counts.total() as u64 {
        println!(
            "  {} {} documents have no embedding yet; run `folio-kb seed`",
            style("Note:").yellow(),
            counts.total() as u64 - embeddings
        );
    }

    println!("{}", style("Embedding provider").bold());
    match openai.ping().await {
        Ok(()) => println!("  {} {}", style("Reachable:").green(), config.openai.base_url),
        Err(e) => {
            warn!("Provider ping failed: {}", e);
            println!("  {} {}", style("Unreachable:").red(), e);
        }
    }

    Ok(())
}

/// Print the active configuration as TOML.
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| crate::FolioError::Config(format!("Failed to render config: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Write a default configuration file unless one already exists.
#[inline]
pub fn init_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!(
            "Configuration already exists at {}; use --show to print it",
            config_path.display()
        );
        return Ok(());
    }

    let config = Config::default();
    config
        .save(config_path)
        .map_err(|e| crate::FolioError::Config(e.to_string()))?;
    println!(
        "{} default configuration at {}",
        style("Wrote").green().bold(),
        config_path.display()
    );
    Ok(())
}

async fn build_components(
    config: &Config,
) -> Result<(Database, Arc<VectorStore>, OpenAiClient)> {
    let database = Database::new(config.database_path()).await?;
    let vector_store = Arc::new(
        VectorStore::new(
            config.vector_database_path(),
            config.openai.embedding_dimension as usize,
        )
        .await?,
    );
    let openai = OpenAiClient::new(&config.openai)?;
    Ok((database, vector_store, openai))
}
