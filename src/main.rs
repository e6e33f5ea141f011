use std::process;

use folio::{
    ContentCache,
    cache::{CacheConfig, ResourceKey},
    config::{self, Command, ListArgs, RevalidateArgs, Settings},
    fetch::{ContentClient, FetchError},
    list::{ListItem, ListOutcome, PaginatedListController},
    revalidate::{RevalidateClient, RevalidateError},
    telemetry::{self, TelemetryError},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Revalidate(#[from] RevalidateError),
    #[error("{0}")]
    Content(String),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let client = content_client(&settings)?;
    let cache = ContentCache::new(CacheConfig::from(&settings.cache), client.clone());
    let max_age = Some(cache.config().max_age());

    match cli_args.command {
        Command::Posts(args) => {
            let list = cache.blog_list(args.category.clone());
            run_list(list, &args).await
        }
        Command::Photos(args) => {
            let list = cache.photo_gallery(args.category.clone());
            run_list(list, &args).await
        }
        Command::Post(args) => {
            let key = ResourceKey::Post { slug: args.slug };
            let post = cache
                .post()
                .resolve(&key, max_age)
                .await
                .map_err(AppError::Content)?;
            print_json(&post)
        }
        Command::Projects => {
            let projects = cache
                .projects()
                .resolve(&ResourceKey::Projects, max_age)
                .await
                .map_err(AppError::Content)?;
            print_json(&projects)
        }
        Command::Education => {
            let education = cache
                .education()
                .resolve(&ResourceKey::Education, max_age)
                .await
                .map_err(AppError::Content)?;
            print_json(&education)
        }
        Command::Experience => {
            let experience = cache
                .experience()
                .resolve(&ResourceKey::Experience, max_age)
                .await
                .map_err(AppError::Content)?;
            print_json(&experience)
        }
        Command::Revalidate(args) => run_revalidate(&cache, client, &settings, args).await,
    }
}

fn content_client(settings: &Settings) -> Result<ContentClient, FetchError> {
    let base = settings.content.base_url.as_str();
    match settings.content.user_agent.as_deref() {
        Some(agent) => ContentClient::with_user_agent(base, agent),
        None => ContentClient::new(base),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOutput<'a, T> {
    items: &'a [T],
    loaded: usize,
    has_more: bool,
    current_page: u32,
    total_count: u64,
    category: Option<&'a str>,
    query: Option<&'a str>,
}

async fn run_list<T>(list: PaginatedListController<T>, args: &ListArgs) -> Result<(), AppError>
where
    T: ListItem + Serialize,
{
    expect_loaded(list.mount().await, &list)?;
    for _ in 1..args.pages {
        if !list.snapshot().can_load_more {
            break;
        }
        expect_loaded(list.load_more().await, &list)?;
    }
    if let Some(query) = args.query.as_deref() {
        list.set_query(query);
    }

    let snapshot = list.snapshot();
    print_json(&ListOutput {
        items: &snapshot.visible,
        loaded: snapshot.items.len(),
        has_more: snapshot.has_more,
        current_page: snapshot.current_page,
        total_count: snapshot.total_count,
        category: snapshot.filter.category.as_deref(),
        query: snapshot.filter.query.as_deref(),
    })
}

fn expect_loaded<T: ListItem>(
    outcome: ListOutcome,
    list: &PaginatedListController<T>,
) -> Result<(), AppError> {
    match outcome {
        ListOutcome::Failed => Err(AppError::Content(
            list.snapshot()
                .error
                .unwrap_or_else(|| format!("Could not load {}.", list.kind().as_str())),
        )),
        _ => Ok(()),
    }
}

async fn run_revalidate(
    cache: &ContentCache,
    client: ContentClient,
    settings: &Settings,
    args: RevalidateArgs,
) -> Result<(), AppError> {
    let target = args.target();

    let revalidator = RevalidateClient::new(client, settings.revalidate.secret.clone())?;
    let response = revalidator.revalidate(&target).await?;
    if response.revalidated {
        cache.invalidate_all();
        info!(now = response.now, "Content store revalidated");
    }
    print_json(&response)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
