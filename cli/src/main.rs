use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubescope_extractor_api::{
    ExtractionContext, FixedWidthWrapper, Item, ListExtractor, Locale, PageKind, PageResult,
    TitleLayout,
};
use tubescope_extractor_youtube::nsig::NsigSolver;
use tubescope_extractor_youtube::{extractor_for, YoutubeChannelLE, YoutubeSearchLE};
use url::Url;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Interface language sent to the site, defaults to the system locale
    #[arg(long, global = true, env = "TUBESCOPE_HL")]
    hl: Option<String>,

    /// Content region sent to the site, defaults to the system locale
    #[arg(long, global = true, env = "TUBESCOPE_GL")]
    gl: Option<String>,

    /// Wrap titles to this many pixels instead of printing them on one line
    #[arg(long, global = true)]
    wrap_width: Option<f32>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a channel, playlist or search results URL
    Extract {
        url: String,

        /// Continuation pages to load after the first one
        #[arg(long, default_value_t = 0)]
        pages: usize,

        /// Also load the playlists tab of a channel
        #[arg(long)]
        playlists: bool,

        #[arg(long)]
        json: bool,
    },
    /// Search for videos, channels and playlists
    Search {
        query: String,

        #[arg(long, default_value_t = 0)]
        pages: usize,

        #[arg(long)]
        json: bool,
    },
    /// Transform an n parameter, or rewrite the one of a media URL
    Nsig {
        /// n value, or a media URL carrying one
        value: String,

        /// Player script URL
        #[arg(long, conflicts_with_all = ["script", "video"])]
        player: Option<String>,

        /// Player script saved locally
        #[arg(long, conflicts_with = "video")]
        script: Option<PathBuf>,

        /// Video whose watch page names the current player
        #[arg(long)]
        video: Option<String>,
    },
}

fn locale(args: &Args) -> Locale {
    let mut locale = Locale::from_system();
    if let Some(hl) = &args.hl {
        locale.hl = hl.clone();
    }
    if let Some(gl) = &args.gl {
        locale.gl = gl.clone();
    }
    locale
}

async fn continue_pages(
    ctx: &ExtractionContext,
    extractor: &dyn ListExtractor,
    page: &mut PageResult,
    pages: usize,
) {
    for _ in 0..pages {
        match extractor.extract_list_continuation(ctx, page).await {
            Ok(appended) => info!(appended, total = page.items().len(), "page loaded"),
            Err(e) if e.is_exhausted() => {
                info!("no more pages");
                break;
            }
            Err(e) => {
                warn!(error = %e, "stopping after failed continuation");
                break;
            }
        }
    }
}

fn print_page(page: &PageResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
    } else {
        println!("{} <{}>", page.name, page.url);
        if !page.subscriber_count_text.is_empty() {
            println!("{}", page.subscriber_count_text);
        }
        for (item, lines) in page.items().iter().zip(page.wrapped_titles()) {
            let kind = match item {
                Item::Video(_) => "video",
                Item::Channel(_) => "channel",
                Item::Playlist(_) => "playlist",
            };
            println!("[{kind}] {}", item.url());
            for line in lines {
                println!("    {line}");
            }
        }
        for playlist in &page.playlists {
            println!("[channel playlist] {} {}", playlist.url, playlist.title);
        }
        if page.has_continuation() {
            println!("(more pages available)");
        }
    }
    match &page.error {
        Some(e) => bail!("{e}"),
        None => Ok(()),
    }
}

async fn extract(
    ctx: &ExtractionContext,
    url: &str,
    pages: usize,
    playlists: bool,
    json: bool,
) -> Result<()> {
    let url = Url::parse(url)?;
    let Some(extractor) = extractor_for(&url) else {
        bail!("no extractor matches {url}");
    };
    info!(url = %url, "extracting");
    let mut page = extractor.extract_list_initial(ctx, &url).await;
    if !page.is_failed() {
        continue_pages(ctx, extractor, &mut page, pages).await;
    }
    if playlists && page.kind == PageKind::Channel && !page.is_failed() {
        if let Err(e) = (YoutubeChannelLE {}).load_playlists(ctx, &mut page).await {
            warn!(error = %e, "could not load playlists");
        }
    }
    print_page(&page, json)
}

async fn search(ctx: &ExtractionContext, query: &str, pages: usize, json: bool) -> Result<()> {
    let extractor = YoutubeSearchLE {};
    let mut page = extractor.search(ctx, query).await;
    if !page.is_failed() {
        continue_pages(ctx, &extractor, &mut page, pages).await;
    }
    print_page(&page, json)
}

async fn nsig(
    ctx: &ExtractionContext,
    value: &str,
    player: Option<String>,
    script: Option<PathBuf>,
    video: Option<String>,
) -> Result<()> {
    let solver = match (player, script, video) {
        (Some(player), _, _) => NsigSolver::from_player_url(ctx, &player).await?,
        (_, Some(path), _) => NsigSolver::from_script(&std::fs::read_to_string(path)?)?,
        (_, _, Some(video)) => NsigSolver::for_video(ctx, &video).await?,
        _ => bail!("one of --player, --script or --video is required"),
    };
    info!(name = %solver.function().name, "n function located");
    if value.contains("://") {
        println!("{}", solver.descramble_url(value)?);
    } else {
        println!("{}", solver.transform(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "tubescope=debug"
    } else {
        "tubescope=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut ctx = ExtractionContext::new_with_locale(locale(&args))?;
    if let Some(max_width) = args.wrap_width {
        ctx = ctx.with_title_wrapper(
            Arc::new(FixedWidthWrapper::default()),
            TitleLayout {
                max_width,
                ..Default::default()
            },
        );
    }

    match args.command {
        Command::Extract {
            url,
            pages,
            playlists,
            json,
        } => extract(&ctx, &url, pages, playlists, json).await,
        Command::Search { query, pages, json } => search(&ctx, &query, pages, json).await,
        Command::Nsig {
            value,
            player,
            script,
            video,
        } => nsig(&ctx, &value, player, script, video).await,
    }
}
