use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wikibot_core::api::{MediaWikiClient, MediaWikiClientConfig, NS_MAIN, WikiWriteApi};
use wikibot_core::bots::{
    run_add_category, run_infobox, run_retarget, run_strip_category, run_unsourced,
};
use wikibot_core::config::{DEFAULT_CONFIG_FILE, WikiConfig, derive_wiki_url, load_config};
use wikibot_core::crosswiki::{ARTICLE_SAMPLE, CategoryComparison, CrossWiki, SyncPlan, sorted_targets};
use wikibot_core::intersect::{fetch_intersection, unix_timestamp, write_export};
use wikibot_core::mutation::BatchStats;
use wikibot_core::pagelist::{PageSource, read_page_list, resolve_pages, split_titles};
use wikibot_core::runner::{BatchReport, PageStatus, RunOptions};
use wikibot_core::wikiproject::{TransferLog, WikiProjectTransfer, write_log};

const SEARCH_LIMIT: usize = 500;

#[derive(Debug, Parser)]
#[command(
    name = "wikibot",
    version,
    about = "Maintenance bots for Turkish Wikipedia categories, infoboxes and talk pages"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print planned edits as diffs instead of saving")]
    dry_run: bool,
    #[arg(
        short = 'y',
        long,
        global = true,
        visible_alias = "force",
        help = "Skip the confirmation prompt before saving"
    )]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "List pages that are in both categories")]
    Intersect(IntersectArgs),
    #[command(name = "strip-category", about = "Remove a category from pages in two categories")]
    StripCategory(StripCategoryArgs),
    #[command(name = "sync-category", about = "Add a category to articles whose English counterpart has it")]
    SyncCategory(SyncCategoryArgs),
    #[command(
        name = "compare-categories",
        about = "List English subcategories with no Turkish counterpart"
    )]
    CompareCategories(CompareCategoriesArgs),
    #[command(about = "Normalize football infobox parameter names")]
    Infobox(PageArgs),
    #[command(about = "Move footballers to the footballer maintenance category")]
    Retarget(PageArgs),
    #[command(about = "Remove unsourced templates from drafts and cited pages")]
    Unsourced(PageArgs),
    #[command(about = "Copy WikiProject banners from English talk pages")]
    Wikiproject(WikiprojectArgs),
}

#[derive(Debug, Clone, Args)]
struct PageArgs {
    #[arg(long, value_name = "TITLES", help = "Comma-separated page titles")]
    pages: Option<String>,
    #[arg(long, value_name = "PATH", help = "Page list file, one title per line")]
    file: Option<PathBuf>,
    #[arg(long, value_name = "NAME", help = "Use the articles of this category")]
    category: Option<String>,
    #[arg(long, value_name = "QUERY", help = "Use full-text search results")]
    search: Option<String>,
    #[arg(long, value_name = "N", help = "Process at most N pages")]
    limit: Option<usize>,
    #[arg(long, value_name = "MS", help = "Pause between saved edits")]
    delay: Option<u64>,
}

#[derive(Debug, Args)]
struct IntersectArgs {
    first: String,
    second: String,
    #[arg(long, value_name = "PATH", help = "Write the intersection as JSON")]
    export: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct StripCategoryArgs {
    first: String,
    second: String,
    #[arg(help = "Category to remove from the shared pages")]
    remove: String,
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,
}

#[derive(Debug, Args)]
struct SyncCategoryArgs {
    categories: Vec<String>,
    #[arg(long, value_name = "PATH", help = "Category list file, one name per line")]
    file: Option<PathBuf>,
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,
}

#[derive(Debug, Args)]
struct CompareCategoriesArgs {
    category: String,
    #[arg(long, default_value_t = ARTICLE_SAMPLE, help = "Articles sampled per subcategory")]
    sample: usize,
    #[arg(long, help = "Print the comparison as JSON")]
    json: bool,
}

#[derive(Debug, Args)]
struct WikiprojectArgs {
    #[command(flatten)]
    pages: PageArgs,
    #[arg(long, help = "Report banners without editing")]
    test: bool,
    #[arg(long, value_name = "DIR", default_value = ".")]
    log_dir: PathBuf,
}

#[derive(Debug, Clone, Copy)]
struct RuntimeOptions {
    dry_run: bool,
    yes: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let runtime = RuntimeOptions {
        dry_run: cli.dry_run,
        yes: cli.yes,
    };
    let config = load_runtime_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Intersect(args) => run_intersect(&config, args),
        Commands::StripCategory(args) => run_strip(&config, runtime, args),
        Commands::SyncCategory(args) => run_sync(&config, runtime, args),
        Commands::CompareCategories(args) => run_compare(&config, args),
        Commands::Infobox(args) => run_page_bot(&config, runtime, &args, PageBot::Infobox),
        Commands::Retarget(args) => run_page_bot(&config, runtime, &args, PageBot::Retarget),
        Commands::Unsourced(args) => run_page_bot(&config, runtime, &args, PageBot::Unsourced),
        Commands::Wikiproject(args) => run_wikiproject(&config, runtime, args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wikibot=info,wikibot_core=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_runtime_config(path: Option<&Path>) -> Result<WikiConfig> {
    dotenvy::dotenv().ok();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    load_config(path)
}

fn target_client(config: &WikiConfig) -> Result<MediaWikiClient> {
    MediaWikiClient::new(MediaWikiClientConfig::from_config(config))
}

fn clients_for(config: &WikiConfig) -> Result<(MediaWikiClient, MediaWikiClient, MediaWikiClient)> {
    let base = MediaWikiClientConfig::from_config(config);
    Ok((
        MediaWikiClient::new(base.clone())?,
        MediaWikiClient::new(base.for_api(&config.source_api_url()))?,
        MediaWikiClient::new(base.for_api(&config.wikidata_api_url()))?,
    ))
}

fn login<A: WikiWriteApi>(api: &mut A, config: &WikiConfig) -> Result<()> {
    let Some(credentials) = config.credentials() else {
        bail!("no credentials configured; set WIKI_USERNAME and WIKI_PASSWORD or [auth] in the config");
    };
    api.login(&credentials.username, &credentials.password)
        .with_context(|| format!("failed to log in as {}", credentials.username))
}

fn run_options(config: &WikiConfig, runtime: RuntimeOptions, delay: Option<u64>, minor: bool) -> RunOptions {
    RunOptions {
        dry_run: runtime.dry_run,
        delay: delay.map(Duration::from_millis).unwrap_or_else(|| config.edit_delay()),
        minor,
        ..RunOptions::default()
    }
}

fn page_sources(args: &PageArgs) -> Vec<PageSource> {
    let mut sources = Vec::new();
    if let Some(pages) = &args.pages {
        sources.push(PageSource::Titles(split_titles(pages)));
    }
    if let Some(file) = &args.file {
        sources.push(PageSource::File(file.clone()));
    }
    if let Some(category) = &args.category {
        sources.push(PageSource::Category {
            name: category.clone(),
            namespace: Some(NS_MAIN),
        });
    }
    if let Some(query) = &args.search {
        sources.push(PageSource::Search {
            query: query.clone(),
            namespace: NS_MAIN,
            limit: args.limit.unwrap_or(SEARCH_LIMIT),
        });
    }
    sources
}

/// Asks before saving unless `--yes` was given. Dry runs never ask.
fn confirm(runtime: RuntimeOptions, count: usize) -> Result<bool> {
    if runtime.dry_run || runtime.yes {
        return Ok(true);
    }
    print!("{count} sayfa düzenlenecek. Devam edilsin mi? (evet/hayır): ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "evet" | "e" | "y" | "yes"
    ))
}

#[derive(Debug, Clone, Copy)]
enum PageBot {
    Infobox,
    Retarget,
    Unsourced,
}

impl PageBot {
    fn name(self) -> &'static str {
        match self {
            Self::Infobox => "infobox",
            Self::Retarget => "retarget",
            Self::Unsourced => "unsourced",
        }
    }

    /// Page source used when no flag selects one.
    fn default_source(self, config: &WikiConfig) -> Option<PageSource> {
        match self {
            Self::Retarget => Some(PageSource::Category {
                name: config.retarget_rules().from,
                namespace: Some(NS_MAIN),
            }),
            Self::Infobox | Self::Unsourced => None,
        }
    }
}

fn run_page_bot(config: &WikiConfig, runtime: RuntimeOptions, args: &PageArgs, bot: PageBot) -> Result<()> {
    let mut sources = page_sources(args);
    if sources.is_empty() {
        match bot.default_source(config) {
            Some(source) => sources.push(source),
            None => bail!("no pages selected; use --pages, --file, --category or --search"),
        }
    }

    let mut api = target_client(config)?;
    let titles = resolve_pages(&mut api, &sources, args.limit)?;
    println!("{}", bot.name());
    println!("api_url: {}", config.api_url());
    println!("pages: {}", titles.len());
    if titles.is_empty() || !confirm(runtime, titles.len())? {
        println!("edits: none");
        return Ok(());
    }
    if !runtime.dry_run {
        login(&mut api, config)?;
    }

    let report = match bot {
        PageBot::Infobox => {
            let rules = config.infobox_rules()?;
            run_infobox(&mut api, &titles, &rules, &run_options(config, runtime, args.delay, true))
        }
        PageBot::Retarget => run_retarget(
            &mut api,
            &titles,
            &config.retarget_rules(),
            &run_options(config, runtime, args.delay, false),
        ),
        PageBot::Unsourced => run_unsourced(
            &mut api,
            &titles,
            &config.unsourced_rules(),
            &run_options(config, runtime, args.delay, false),
        ),
    };
    print_batch_report(&report)
}

fn run_intersect(config: &WikiConfig, args: IntersectArgs) -> Result<()> {
    let mut first = target_client(config)?;
    let mut second = target_client(config)?;
    let intersection = fetch_intersection(&mut first, &mut second, &args.first, &args.second)?;

    println!("intersect");
    println!("category1: {} ({})", intersection.first, intersection.first_count);
    println!("category2: {} ({})", intersection.second, intersection.second_count);
    println!("common: {}", intersection.common.len());
    for member in &intersection.common {
        println!("  - {}", member.title);
    }

    if let Some(path) = &args.export {
        let base_url = config
            .wiki_url()
            .or_else(|| derive_wiki_url(&config.api_url()))
            .unwrap_or_default();
        let export = intersection.to_export(&base_url, &config.article_path(), unix_timestamp()?);
        write_export(path, &export)?;
        println!("export: {}", path.display());
    }
    Ok(())
}

fn run_strip(config: &WikiConfig, runtime: RuntimeOptions, args: StripCategoryArgs) -> Result<()> {
    let mut api = target_client(config)?;
    let mut second = target_client(config)?;
    let intersection = fetch_intersection(&mut api, &mut second, &args.first, &args.second)?;
    let mut titles = intersection.titles();
    if let Some(limit) = args.limit {
        titles.truncate(limit);
    }

    println!("strip-category");
    println!("category1: {} ({})", intersection.first, intersection.first_count);
    println!("category2: {} ({})", intersection.second, intersection.second_count);
    println!("remove: {}", args.remove);
    println!("pages: {}", titles.len());
    if titles.is_empty() || !confirm(runtime, titles.len())? {
        println!("edits: none");
        return Ok(());
    }
    if !runtime.dry_run {
        login(&mut api, config)?;
    }

    let report = run_strip_category(
        &mut api,
        &titles,
        &config.category_namespace(),
        &args.remove,
        &run_options(config, runtime, args.delay, false),
    );
    print_batch_report(&report)
}

fn run_sync(config: &WikiConfig, runtime: RuntimeOptions, args: SyncCategoryArgs) -> Result<()> {
    let mut categories = args.categories.clone();
    if let Some(file) = &args.file {
        categories.extend(read_page_list(file)?);
    }
    if categories.is_empty() {
        bail!("no categories given; pass names or --file");
    }

    let (mut target, mut source, mut wikidata) = clients_for(config)?;
    let options = run_options(config, runtime, args.delay, false);
    let namespace = config.category_namespace();
    let mut logged_in = false;
    let mut totals = BatchStats::default();

    for (index, category) in categories.iter().enumerate() {
        println!("category: {category} ({}/{})", index + 1, categories.len());
        let plan = {
            let mut wiki = CrossWiki {
                target: &mut target,
                source: &mut source,
                wikidata: &mut wikidata,
                source_site: config.source_site(),
                target_site: config.target_site(),
                pause: options.delay,
            };
            match wiki.plan_sync(category) {
                Ok(plan) => plan,
                Err(error) => {
                    tracing::warn!(category = %category, error = %format!("{error:#}"), "category skipped");
                    println!("error: {error:#}");
                    totals.errors += 1;
                    continue;
                }
            }
        };
        print_sync_plan(&plan);

        let titles = sorted_targets(&plan);
        if titles.is_empty() || !confirm(runtime, titles.len())? {
            continue;
        }
        if !runtime.dry_run && !logged_in {
            login(&mut target, config)?;
            logged_in = true;
        }
        let report = run_add_category(&mut target, &titles, &namespace, category, &options);
        print_pages(&report);
        print_stats("stats", &report.stats);
        add_totals(&mut totals, &report.stats);
        if let Some(reason) = report.aborted {
            bail!("batch aborted: {reason}");
        }
    }

    print_stats("total", &totals);
    Ok(())
}

fn run_compare(config: &WikiConfig, args: CompareCategoriesArgs) -> Result<()> {
    let (mut target, mut source, mut wikidata) = clients_for(config)?;
    let comparison = CrossWiki {
        target: &mut target,
        source: &mut source,
        wikidata: &mut wikidata,
        source_site: config.source_site(),
        target_site: config.target_site(),
        pause: Duration::ZERO,
    }
    .compare(&args.category, args.sample)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_comparison(&comparison);
    }
    Ok(())
}

fn run_wikiproject(config: &WikiConfig, runtime: RuntimeOptions, args: WikiprojectArgs) -> Result<()> {
    let sources = page_sources(&args.pages);
    if sources.is_empty() {
        bail!("no pages selected; use --pages, --file, --category or --search");
    }
    let test_mode = args.test || runtime.dry_run;

    let (mut target, mut source, mut wikidata) = clients_for(config)?;
    let titles = resolve_pages(&mut target, &sources, args.pages.limit)?;
    println!("wikiproject");
    println!("pages: {}", titles.len());
    println!("test_mode: {test_mode}");
    if titles.is_empty() {
        return Ok(());
    }
    if !test_mode {
        if !confirm(runtime, titles.len())? {
            println!("edits: none");
            return Ok(());
        }
        login(&mut target, config)?;
    }

    let mut log = WikiProjectTransfer {
        target: &mut target,
        source: &mut source,
        wikidata: &mut wikidata,
        source_site: config.source_site(),
        test_mode,
        delay: args
            .pages
            .delay
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.edit_delay()),
    }
    .run(&titles);

    let path = write_log(&args.log_dir, &mut log)?;
    print_transfer_log(&log);
    println!("log: {}", path.display());
    if let Some(reason) = &log.aborted {
        bail!("run aborted: {reason}");
    }
    Ok(())
}

fn print_batch_report(report: &BatchReport) -> Result<()> {
    print_pages(report);
    print_stats("stats", &report.stats);
    if let Some(reason) = &report.aborted {
        bail!("batch aborted: {reason}");
    }
    Ok(())
}

fn print_pages(report: &BatchReport) {
    for page in &report.pages {
        match &page.status {
            PageStatus::WouldEdit { diff } => {
                println!("--- {}", page.title);
                print!("{diff}");
            }
            PageStatus::Failed { message } => println!("failed: {} ({message})", page.title),
            PageStatus::Edited => println!("edited: {}", page.title),
            PageStatus::Unchanged | PageStatus::Missing => {}
        }
    }
}

fn print_stats(label: &str, stats: &BatchStats) {
    println!("{label}.total: {}", stats.total);
    println!("{label}.processed: {}", stats.processed);
    println!("{label}.edited: {}", stats.edited);
    println!("{label}.skipped: {}", stats.skipped);
    println!("{label}.declined: {}", stats.declined);
    println!("{label}.missing: {}", stats.missing);
    println!("{label}.errors: {}", stats.errors);
    for (reason, count) in &stats.reasons {
        println!("{label}.reason.{reason}: {count}");
    }
    for (change, count) in &stats.changes {
        println!("{label}.change: {change} ({count})");
    }
}

fn add_totals(totals: &mut BatchStats, stats: &BatchStats) {
    totals.total += stats.total;
    totals.processed += stats.processed;
    totals.edited += stats.edited;
    totals.skipped += stats.skipped;
    totals.declined += stats.declined;
    totals.missing += stats.missing;
    totals.errors += stats.errors;
    for (reason, count) in &stats.reasons {
        *totals.reasons.entry(reason.clone()).or_default() += count;
    }
    for (change, count) in &stats.changes {
        *totals.changes.entry(change.clone()).or_default() += count;
    }
}

fn print_sync_plan(plan: &SyncPlan) {
    println!("source_category: {}", plan.source_category);
    println!("source_members: {}", plan.source_count);
    println!("target_members: {}", plan.target_count);
    println!("missing: {}", plan.missing.len());
    println!("failed_batches: {}", plan.failed_batches);
    for member in &plan.missing {
        println!("  - {} ({}, {})", member.target_title, member.source_title, member.item);
    }
}

fn print_comparison(comparison: &CategoryComparison) {
    println!("compare-categories");
    println!("category: {}", comparison.category);
    println!("source_category: {}", comparison.source_category);
    println!("subcategories: {}", comparison.total);
    println!("existing: {}", comparison.existing.len());
    println!("missing: {}", comparison.missing.len());
    println!("no_wikidata: {}", comparison.no_wikidata.len());
    for uncovered in &comparison.missing {
        println!(
            "  - {} [{}] subcategories {}/{} ({}%) articles {}/{} ({}%)",
            uncovered.source,
            uncovered.item,
            uncovered.subcategories_with_target,
            uncovered.subcategory_count,
            uncovered.subcategory_percentage(),
            uncovered.articles_with_target,
            uncovered.article_count,
            uncovered.article_percentage(),
        );
    }
    if !comparison.existing.is_empty() {
        println!("existing_categories:");
        for covered in &comparison.existing {
            println!("  - {} -> {}", covered.source, covered.target);
        }
    }
    if !comparison.no_wikidata.is_empty() {
        println!("without_wikidata:");
        for name in &comparison.no_wikidata {
            println!("  - {name}");
        }
    }
}

fn print_transfer_log(log: &TransferLog) {
    for entry in &log.entries {
        if !entry.banners.is_empty() {
            println!("{}: {}", entry.title, entry.banners.join(" "));
        }
    }
    println!("processed: {}", log.summary.processed);
    println!("added: {}", log.summary.added);
    println!("skipped: {}", log.summary.skipped);
    println!("no_english: {}", log.summary.no_english);
    println!("no_wikiproject: {}", log.summary.no_wikiproject);
    println!("errors: {}", log.summary.errors);
}
