use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use facultyscope_core::{
    AppConfig, AuthorId, FacultyRecord, FacultyStore, NameOrder, Resolution, SqliteIdentityCache,
};
use facultyscope_science::directory::{DirectoryScraper, DirectorySource};
use facultyscope_science::sources::{OpenAlexClient, ScholarlyApi, SortDirection, WorkSort};
use facultyscope_science::{AuthorResolver, MetadataAggregator};

const UNRESOLVED_MESSAGE: &str = "No bibliographic profile found for this faculty member.";

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "facultyscope",
    about = "Faculty profiles merged with bibliographic metadata",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting FACULTYSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List faculty members.
    List {
        /// Case-insensitive name filter.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        desc: bool,
        /// 1-based page number.
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "25")]
        page_size: usize,
    },

    /// Resolve a faculty member to an external author identity.
    Resolve {
        name: String,
        /// Ignore and do not update the identity cache.
        #[arg(long)]
        no_cache: bool,
    },

    /// Citation metrics and research tags.
    Stats { name: String },

    /// Recent works.
    Works {
        name: String,
        #[arg(long, default_value = "50")]
        count: usize,
        /// Sort key; repeat for secondary keys.
        #[arg(long, default_value = "publication_date", action = clap::ArgAction::Append)]
        sort: Vec<String>,
        #[arg(long)]
        asc: bool,
    },

    /// Most frequent co-authors over recent works.
    Collaborators { name: String },

    /// Journals published in most often.
    Venues {
        name: String,
        #[arg(long, default_value = "200")]
        count: usize,
    },

    /// Research interests from the directory profile.
    Interests { name: String },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config.
    Show,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

struct Pipeline {
    resolver: AuthorResolver,
    aggregator: MetadataAggregator,
    directory: Arc<DirectoryScraper>,
    config: AppConfig,
}

impl Pipeline {
    fn new(config: AppConfig) -> Result<Self> {
        let api: Arc<dyn ScholarlyApi> = Arc::new(
            OpenAlexClient::new(&config.openalex).context("building bibliographic API client")?,
        );
        let directory = Arc::new(
            DirectoryScraper::new(config.directory.clone(), &config.openalex)
                .context("building directory client")?,
        );

        let resolver = AuthorResolver::new(api.clone(), directory.clone(), config.resolver.clone());
        let aggregator = MetadataAggregator::new(api, config.aggregator.clone());

        Ok(Self {
            resolver,
            aggregator,
            directory,
            config,
        })
    }

    async fn identify(&self, record: &FacultyRecord, use_cache: bool) -> Result<Resolution> {
        if !use_cache {
            return Ok(self.resolver.resolve(record).await?);
        }

        let path = self.config.cache_path();
        let cache = SqliteIdentityCache::open(&path)
            .with_context(|| format!("opening identity cache {}", path.display()))?;
        Ok(self.resolver.resolve_cached(record, &cache).await?)
    }

    /// Author id of a faculty member, or `None` after printing the neutral
    /// empty state.
    async fn author_for(&self, record: &FacultyRecord, out: &Output) -> Result<Option<AuthorId>> {
        match self.identify(record, true).await? {
            Resolution::Resolved(identity) => Ok(Some(identity.author_id)),
            Resolution::Unresolved => {
                out.unresolved(record)?;
                Ok(None)
            }
        }
    }
}

// ─── Output ──────────────────────────────────────────────────────────────────

struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn emit<T: Serialize>(&self, data: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            let dur = self.start.elapsed().as_millis();
            print_json(&serde_json::json!({"status":"ok","data":data,"meta":{"duration_ms":dur}}))
        } else {
            human();
            Ok(())
        }
    }

    fn unresolved(&self, record: &FacultyRecord) -> Result<()> {
        if self.json {
            let dur = self.start.elapsed().as_millis();
            print_json(&serde_json::json!({
                "status":"ok",
                "data":{"faculty":record.name,"resolution":Resolution::Unresolved},
                "meta":{"duration_ms":dur}
            }))
        } else {
            println!("{}: {UNRESOLVED_MESSAGE}", record.name);
            Ok(())
        }
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn load_store(config: &AppConfig) -> Result<FacultyStore> {
    let path = config.faculty_csv_path();
    let store = FacultyStore::from_csv_path(&path)
        .with_context(|| format!("reading faculty table {}", path.display()))?;
    debug!(path = %path.display(), rows = store.len(), "loaded faculty table");
    Ok(store)
}

fn lookup<'a>(store: &'a FacultyStore, name: &str) -> &'a FacultyRecord {
    match store.find_by_name(name) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(
                    "facultyscope=info,facultyscope_core=info,facultyscope_science=info,warn",
                )
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json || std::env::var("FACULTYSCOPE_JSON").as_deref() == Ok("1");
    let out = Output { json, start };
    let config = AppConfig::load().context("loading config")?;

    match cli.command {
        Commands::List {
            search,
            desc,
            page,
            page_size,
        } => {
            let store = load_store(&config)?;
            let mut rows = match search.as_deref() {
                Some(term) => store.search(term),
                None => store.all().iter().collect(),
            };
            let order = if desc {
                NameOrder::Descending
            } else {
                NameOrder::Ascending
            };
            FacultyStore::sort_by_name(&mut rows, order);

            let pages = FacultyStore::page_count(rows.len(), page_size);
            let shown = FacultyStore::page(&rows, page.saturating_sub(1), page_size);
            out.emit(
                &serde_json::json!({"faculty":shown,"total":rows.len(),"pages":pages}),
                || {
                    for record in shown {
                        match &record.email {
                            Some(email) => println!("{}  <{email}>", record.name),
                            None => println!("{}", record.name),
                        }
                    }
                    let current = page.max(1).min(pages.max(1));
                    println!("-- page {current} of {pages} ({} total)", rows.len());
                },
            )?;
        }

        Commands::Resolve { name, no_cache } => {
            let store = load_store(&config)?;
            let record = lookup(&store, &name);
            let pipeline = Pipeline::new(config)?;
            match pipeline.identify(record, !no_cache).await? {
                Resolution::Resolved(identity) => out.emit(&identity, || {
                    println!("{}: {} (via {})", record.name, identity.author_id, identity.method);
                    println!("  {}", identity.author_id.url());
                })?,
                Resolution::Unresolved => out.unresolved(record)?,
            }
        }

        Commands::Stats { name } => {
            let store = load_store(&config)?;
            let record = lookup(&store, &name);
            let pipeline = Pipeline::new(config)?;
            if let Some(author_id) = pipeline.author_for(record, &out).await? {
                let stats = pipeline
                    .aggregator
                    .fetch_stats(&author_id)
                    .await
                    .with_context(|| format!("fetching summary for {author_id}"))?;
                out.emit(&stats, || {
                    println!("{} ({})", stats.display_name, stats.author_id);
                    if let Some(inst) = &stats.institution {
                        println!("  Institution: {inst}");
                    }
                    if let Some(orcid) = &stats.orcid {
                        println!("  ORCID:       {orcid}");
                    }
                    println!("  h-index:     {}", stats.h_index);
                    println!("  i10-index:   {}", stats.i10_index);
                    println!("  Works:       {}", stats.works_count);
                    println!("  Citations:   {}", stats.cited_by_count);
                    if let Some(updated) = stats.last_updated {
                        println!("  Updated:     {}", updated.format("%Y-%m-%d"));
                    }
                    for year in &stats.counts_by_year {
                        println!(
                            "  {}: {} works, {} citations",
                            year.year, year.works_count, year.cited_by_count
                        );
                    }
                    if !stats.tags.is_empty() {
                        let tags = stats.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
                        println!("  Tags:        {}", tags.join(", "));
                    }
                })?;
            }
        }

        Commands::Works {
            name,
            count,
            sort,
            asc,
        } => {
            let store = load_store(&config)?;
            let record = lookup(&store, &name);
            let pipeline = Pipeline::new(config)?;
            if let Some(author_id) = pipeline.author_for(record, &out).await? {
                let direction = if asc {
                    SortDirection::Asc
                } else {
                    SortDirection::Desc
                };
                let works = pipeline
                    .aggregator
                    .fetch_works(&author_id, count, &WorkSort::new(sort, direction))
                    .await;
                out.emit(&works, || {
                    if works.is_empty() {
                        println!("No works found.");
                    }
                    for work in &works {
                        let year = work
                            .publication_year
                            .map(|y| y.to_string())
                            .unwrap_or_else(|| "----".to_string());
                        println!("{year}  [{:>5}]  {}", work.cited_by_count, work.title_text());
                    }
                })?;
            }
        }

        Commands::Collaborators { name } => {
            let store = load_store(&config)?;
            let record = lookup(&store, &name);
            let pipeline = Pipeline::new(config)?;
            if let Some(author_id) = pipeline.author_for(record, &out).await? {
                let collaborators = pipeline.aggregator.collaborators(&author_id).await;
                out.emit(&collaborators, || {
                    if collaborators.is_empty() {
                        println!("No collaborators found.");
                    }
                    for c in &collaborators {
                        match &c.institution {
                            Some(inst) => println!("{:>3}  {} ({inst})", c.count, c.name),
                            None => println!("{:>3}  {}", c.count, c.name),
                        }
                    }
                })?;
            }
        }

        Commands::Venues { name, count } => {
            let store = load_store(&config)?;
            let record = lookup(&store, &name);
            let pipeline = Pipeline::new(config)?;
            if let Some(author_id) = pipeline.author_for(record, &out).await? {
                let venues = pipeline.aggregator.venues(&author_id, count).await;
                out.emit(&venues, || {
                    if venues.is_empty() {
                        println!("No journal venues found.");
                    }
                    for v in &venues {
                        println!("{:>3}  {}", v.count, v.name);
                    }
                })?;
            }
        }

        Commands::Interests { name } => {
            let store = load_store(&config)?;
            let record = lookup(&store, &name);
            let interests = match record.profile_url.as_deref() {
                Some(url) => {
                    let pipeline = Pipeline::new(config)?;
                    pipeline
                        .directory
                        .research_interests(url)
                        .await
                        .with_context(|| format!("reading directory profile {url}"))?
                }
                None => Vec::new(),
            };
            out.emit(&interests, || {
                if interests.is_empty() {
                    println!("No research interests listed.");
                }
                for interest in &interests {
                    println!("  {interest}");
                }
            })?;
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                let path = AppConfig::config_path();
                if path.exists() && !force {
                    eprintln!(
                        "Config already exists: {} (use --force to overwrite)",
                        path.display()
                    );
                    std::process::exit(8);
                }
                AppConfig::default()
                    .save()
                    .with_context(|| format!("writing {}", path.display()))?;
                out.emit(&serde_json::json!({"path":path}), || {
                    println!("Wrote default config to {}", path.display());
                })?;
            }
            ConfigAction::Show => {
                let text = toml::to_string_pretty(&config).context("rendering config")?;
                out.emit(&config, || {
                    println!("# {}", AppConfig::config_path().display());
                    print!("{text}");
                })?;
            }
        },
    }

    Ok(())
}
