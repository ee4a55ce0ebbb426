use clap::Parser;
use directories::ProjectDirs;
use facedex::api::FacedexApi;
use facedex::commands::browse::Collection;
use facedex::commands::MutationResult;
use facedex::config::{FacedexConfig, CONFIG_FILENAME};
use facedex::error::{FacedexError, Result};
use facedex::model::{Action, ReplaceRule, Session};
use facedex::store::fs::FsBackend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

const EXIT_NOT_FOUND: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "facedex=debug" } else { "facedex=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

struct AppContext {
    api: FacedexApi<FsBackend>,
    session: Session,
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli)?;
    let api = FacedexApi::new(FsBackend::new(), &config)?;
    let mut ctx = AppContext {
        api,
        session: Session::default(),
    };
    ctx.api.select_source(&mut ctx.session, cli.source_index);

    let code = match cli.command {
        Commands::Categories { page } => handle_categories(&mut ctx, page),
        Commands::List {
            collection,
            page,
            seed,
        } => handle_list(&mut ctx, collection, page, seed),
        Commands::Like { paths } => handle_mutation(&mut ctx, &paths, Action::Like),
        Commands::Unlike { paths } => handle_mutation(&mut ctx, &paths, Action::Unlike),
        Commands::Resolve { category, filename } => handle_resolve(&mut ctx, &category, &filename),
    };

    // drain pending writes before the process exits
    ctx.api.shutdown();
    code
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "facedex", "facedex")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

fn load_config(cli: &Cli) -> Result<FacedexConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = match path {
        Some(path) => FacedexConfig::load(path)?,
        None => FacedexConfig::default(),
    };

    if !cli.sources.is_empty() {
        config.sources = cli.sources.clone();
    }
    if let Some(per_page) = cli.per_page {
        config.per_page = per_page;
    }
    if cli.replace.len() % 2 != 0 {
        return Err(FacedexError::Config(
            "--replace takes OLD and NEW".to_string(),
        ));
    }
    config.replace.extend(
        cli.replace
            .chunks_exact(2)
            .map(|pair| ReplaceRule::new(pair[0].as_str(), pair[1].as_str())),
    );
    Ok(config)
}

fn handle_categories(ctx: &mut AppContext, page: usize) -> Result<i32> {
    let result = ctx.api.categories(&mut ctx.session, page);
    for category in &result.categories {
        let thumbnail = category
            .thumbnail
            .as_ref()
            .map(|r| r.absolute_path.display().to_string())
            .unwrap_or_default();
        println!("{}\t{}\t{}", category.name, category.count, thumbnail);
    }
    println!("page {}/{}", result.page, result.total_pages);
    Ok(0)
}

fn handle_list(
    ctx: &mut AppContext,
    collection: Option<String>,
    page: usize,
    seed: Option<String>,
) -> Result<i32> {
    let collection = collection
        .as_deref()
        .map(Collection::from_name)
        .unwrap_or(Collection::All);
    let result = ctx
        .api
        .images(&mut ctx.session, collection, page, seed.as_deref());

    for image in &result.images {
        let marker = if image.like { "*" } else { " " };
        println!("{} {}", marker, image.absolute_path.display());
    }
    match result.seed {
        Some(seed) => println!(
            "page {}/{} seed {}",
            result.page, result.total_pages, seed
        ),
        None => println!("page {}/{}", result.page, result.total_pages),
    }
    Ok(0)
}

fn handle_mutation(ctx: &mut AppContext, paths: &[String], action: Action) -> Result<i32> {
    let result = ctx.api.set_liked(&mut ctx.session, paths, action)?;
    print_mutation(&result);
    Ok(if result.is_success() { 0 } else { EXIT_NOT_FOUND })
}

fn print_mutation(result: &MutationResult) {
    let verb = match result.action {
        Some(Action::Unlike) => "unliked",
        _ => "liked",
    };
    for path in &result.found {
        println!("{}: {}", verb, path);
    }
    for path in &result.not_found {
        println!("not found: {}", path);
    }
}

fn handle_resolve(ctx: &mut AppContext, category: &str, filename: &str) -> Result<i32> {
    match ctx
        .api
        .resolve_image_path(&mut ctx.session, category, filename)
    {
        Some(path) => {
            println!("{}", path.display());
            Ok(0)
        }
        None => {
            eprintln!("not found: {}/{}", category, filename);
            Ok(EXIT_NOT_FOUND)
        }
    }
}
