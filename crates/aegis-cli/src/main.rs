mod display;

use std::path::PathBuf;
use std::sync::Arc;

use aegis_core::{
    Action, AdjudicationStatus, AegisConfig, ExportFormat, FilterCriteria, FunctionTag, SortField,
    SortSpec,
};
use aegis_review::{NoticeLevel, ReviewContext, RoleSource};
use aegis_sync::{BoardFormat, HttpBackend};
use aegis_view::{PreferenceStore, RenderContext, RenderPipeline, ViewMode};
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::info;

const ROLES_AREA: &str = "roles";

#[derive(Parser)]
#[command(name = "aegis", version, about = "Review extracted roles against an AEGIS server")]
struct Cli {
    /// Server root, e.g. http://localhost:5050
    #[arg(long, global = true, env = "AEGIS_URL")]
    base_url: Option<String>,

    /// TOML config file
    #[arg(long, global = true, env = "AEGIS_CONFIG")]
    config: Option<PathBuf>,

    /// CSRF token to send until the server issues a fresh one
    #[arg(long, global = true, env = "AEGIS_CSRF_TOKEN")]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List roles, filtered and sorted
    Roles {
        #[command(flatten)]
        filter: FilterArgs,
        /// Print the rendered markup instead of a table
        #[arg(long)]
        html: bool,
        /// View mode for --html (defaults to the saved preference)
        #[arg(long)]
        view: Option<ViewMode>,
    },
    /// Show one role as a card
    Role { name: String },
    /// Set the adjudication status of one role
    Adjudicate {
        role: String,
        status: AdjudicationStatus,
    },
    /// Set one status on many roles in a single request
    Bulk {
        status: AdjudicationStatus,
        /// Roles to update; when omitted, every role matching the filters
        roles: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Assign a function tag to a role
    Tag {
        role: String,
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        color: String,
    },
    /// Remove a function tag from a role
    Untag { role: String, code: String },
    /// Review progress counts
    Stats,
    /// Recent document scans
    History,
    /// Export roles matching the filters as CSV or JSON
    Export {
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Output file (defaults to a dated file name in the current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Download the server-rendered role board
    Board {
        #[arg(long, default_value = "html")]
        format: BoardFormat,
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Show or save the preferred view mode of a feature area
    ViewMode {
        #[arg(long, default_value = ROLES_AREA)]
        area: String,
        mode: Option<ViewMode>,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Substring match on name, category, description, aliases, documents
    #[arg(long, short)]
    search: Option<String>,
    #[arg(long = "status")]
    statuses: Vec<AdjudicationStatus>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long = "source")]
    sources: Vec<String>,
    /// Function-tag code
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long = "document")]
    documents: Vec<String>,
    /// Only roles with at least one function tag
    #[arg(long, conflicts_with = "untagged")]
    tagged: bool,
    /// Only roles without function tags
    #[arg(long)]
    untagged: bool,
    /// Only roles with confidence below this value
    #[arg(long)]
    confidence_below: Option<f64>,
    #[arg(long)]
    sort: Option<SortField>,
    /// Reverse the sort field's natural direction
    #[arg(long, requires = "sort")]
    reverse: bool,
    /// Review the role dictionary instead of aggregated roles
    #[arg(long)]
    dictionary: bool,
}

impl FilterArgs {
    fn apply(&self, criteria: &mut FilterCriteria) {
        if let Some(search) = &self.search {
            criteria.search = search.clone();
        }
        for status in &self.statuses {
            criteria.statuses.insert(*status);
        }
        for (selection, values) in [
            (&mut criteria.categories, &self.categories),
            (&mut criteria.sources, &self.sources),
            (&mut criteria.tags, &self.tags),
            (&mut criteria.documents, &self.documents),
        ] {
            for value in values {
                selection.insert(value.clone());
            }
        }
        if self.tagged {
            criteria.has_tags = Some(true);
        } else if self.untagged {
            criteria.has_tags = Some(false);
        }
        criteria.confidence_below = self.confidence_below;
        criteria.sort = self.sort.map(|field| {
            let direction = field.natural_direction();
            SortSpec::new(
                field,
                if self.reverse { direction.toggled() } else { direction },
            )
        });
    }

    fn source(&self) -> RoleSource {
        if self.dictionary {
            RoleSource::Dictionary
        } else {
            RoleSource::Aggregated
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = AegisConfig::load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if cli.csrf_token.is_some() {
        config.csrf_token = cli.csrf_token;
    }
    info!(version = env!("CARGO_PKG_VERSION"), base_url = %config.base_url, "aegis");

    let backend = HttpBackend::from_config(&config).context("building HTTP client")?;
    let mut ctx = ReviewContext::create(config, Arc::new(backend));
    let result = run(&mut ctx, cli.command).await;
    ctx.dispose().await;
    result
}

async fn run(ctx: &mut ReviewContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Roles { filter, html, view } => {
            load_filtered(ctx, &filter).await;
            let roles = ctx.visible();
            let badges = ctx.badges().await;
            if html {
                let mode = match view {
                    Some(mode) => mode,
                    None => preferences(ctx.config())?.view_mode(ROLES_AREA),
                };
                let mut pipeline = RenderPipeline::new(mode);
                pipeline.mount(ROLES_AREA);
                let render_ctx = RenderContext {
                    badges: Some(&badges),
                    selection: Some(ctx.dispatcher().selection()),
                    filter_active: ctx.criteria().is_active(),
                    total: ctx.dispatcher().roles().len(),
                };
                pipeline.render(ROLES_AREA, &roles, &render_ctx);
                if let Some(container) = pipeline.container(ROLES_AREA) {
                    println!("{}", container.markup());
                }
            } else {
                display::print_role_table(&roles, |r| {
                    badges.get(&r.name).copied().unwrap_or(r.status)
                });
                eprintln!("{} of {} roles", roles.len(), ctx.dispatcher().roles().len());
            }
        }
        Command::Role { name } => {
            ctx.load(false).await;
            let Some(role) = ctx.dispatcher().role(&name).cloned() else {
                bail!("no role named {name:?}");
            };
            let status = ctx.caches().lookup.status_of(&role.name).await.unwrap_or(role.status);
            display::print_role_card(&role, status);
        }
        Command::Adjudicate { role, status } => {
            ctx.load(false).await;
            require_role(ctx, &role)?;
            write(ctx, Action::SetStatus {
                role_name: role.clone(),
                status,
            })
            .await?;
            println!("{role}: {}", status.label());
        }
        Command::Bulk {
            status,
            roles,
            filter,
        } => {
            load_filtered(ctx, &filter).await;
            if roles.is_empty() {
                ctx.select_visible();
            } else {
                for role in &roles {
                    require_role(ctx, role)?;
                }
                ctx.dispatch(Action::SelectAll { role_names: roles });
            }
            let count = ctx.dispatcher().selection().len();
            if count == 0 {
                bail!("no roles selected");
            }
            write(ctx, Action::BulkSetStatus { status }).await?;
            println!("{count} roles: {}", status.label());
        }
        Command::Tag {
            role,
            code,
            name,
            color,
        } => {
            ctx.load(false).await;
            require_role(ctx, &role)?;
            let tag = FunctionTag {
                name: name.unwrap_or_else(|| code.clone()),
                code,
                color,
            };
            println!("{role}: +{}", tag.code);
            write(ctx, Action::AssignTag {
                role_name: role,
                tag,
            })
            .await?;
        }
        Command::Untag { role, code } => {
            ctx.load(false).await;
            require_role(ctx, &role)?;
            println!("{role}: -{code}");
            write(ctx, Action::RemoveTag {
                role_name: role,
                code,
            })
            .await?;
        }
        Command::Stats => {
            ctx.load(false).await;
            display::print_stats(&ctx.stats().await);
        }
        Command::History => {
            display::print_history(&ctx.scan_history().await);
        }
        Command::Export {
            format,
            out,
            filter,
        } => {
            load_filtered(ctx, &filter).await;
            let roles = ctx.visible();
            let body = format.render(&roles)?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(aegis_core::export_filename(
                    format,
                    chrono::Local::now().date_naive(),
                ))
            });
            std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "exported {} roles to {} ({})",
                roles.len(),
                path.display(),
                format.mime_type()
            );
        }
        Command::Board { format, out } => {
            let bytes = ctx.export_board(format).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(format!("role_board.{}", format.as_str())));
            std::fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
            println!("saved {} bytes to {}", bytes.len(), path.display());
        }
        Command::ViewMode { area, mode } => view_mode(ctx.config(), &area, mode)?,
    }
    Ok(())
}

// ── Helpers ──

async fn load_filtered(ctx: &mut ReviewContext, filter: &FilterArgs) {
    ctx.set_source(filter.source());
    ctx.load(false).await;
    filter.apply(ctx.criteria_mut());
}

fn require_role(ctx: &ReviewContext, name: &str) -> anyhow::Result<()> {
    if ctx.dispatcher().role(name).is_none() {
        bail!("no role named {name:?}");
    }
    Ok(())
}

/// Dispatch a mutation, wait for its write, and fail on any error notice.
async fn write(ctx: &mut ReviewContext, action: Action) -> anyhow::Result<()> {
    let mut notices = ctx.subscribe();
    ctx.dispatch(action);
    ctx.flush().await;
    loop {
        match notices.try_recv() {
            Ok(notice) if notice.level == NoticeLevel::Error => bail!("{}", notice.message),
            Ok(notice) => eprintln!("{}", notice.message),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return Ok(()),
        }
    }
}

fn preferences(config: &AegisConfig) -> anyhow::Result<PreferenceStore> {
    let path = match &config.preferences_path {
        Some(path) => path.clone(),
        None => PreferenceStore::default_path()?,
    };
    Ok(PreferenceStore::open(path))
}

fn view_mode(config: &AegisConfig, area: &str, mode: Option<ViewMode>) -> anyhow::Result<()> {
    let mut store = preferences(config)?;
    match mode {
        Some(mode) => {
            store.set_view_mode(area, mode)?;
            println!("{area}: {mode} (saved to {})", store.path().display());
        }
        None => println!("{area}: {}", store.view_mode(area)),
    }
    Ok(())
}
