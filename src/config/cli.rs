use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use folio_api_types::RevalidateTarget;

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Read and revalidate portfolio content"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FOLIO_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the content store base URL.
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Override the staleness window in milliseconds.
    #[arg(long = "cache-max-age-ms", value_name = "MS", global = true)]
    pub cache_max_age_ms: Option<u64>,

    /// Override the blog page size.
    #[arg(long = "cache-page-size", value_name = "COUNT", global = true)]
    pub cache_page_size: Option<u32>,

    /// Override the photo page size.
    #[arg(long = "cache-photo-page-size", value_name = "COUNT", global = true)]
    pub cache_photo_page_size: Option<u32>,

    /// Drop appended list items whose id is already loaded.
    #[arg(
        long = "cache-dedupe-by-id",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_dedupe_by_id: Option<bool>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Page through published blog posts.
    Posts(ListArgs),
    /// Page through gallery photos.
    Photos(ListArgs),
    /// Fetch one blog post by slug.
    Post(SlugArgs),
    /// List portfolio projects.
    Projects,
    /// List education entries.
    Education,
    /// List work experience entries.
    Experience,
    /// Ask the content store to revalidate a path or tag.
    Revalidate(RevalidateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Server-side category filter.
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Client-side search over the loaded pages.
    #[arg(long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Number of pages to load before printing.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
}

#[derive(Debug, Args, Clone)]
pub struct SlugArgs {
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["path", "tag"])))]
pub struct RevalidateArgs {
    /// Page path to revalidate, e.g. `/blog`.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Cache tag to revalidate.
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Shared secret; overrides `revalidate.secret`.
    #[arg(long, env = "FOLIO_REVALIDATE_SECRET", value_name = "SECRET")]
    pub secret: Option<String>,
}

impl RevalidateArgs {
    /// The requested target. The required `target` group admits exactly one
    /// of `--path` or `--tag`, so a missing path means a tag was given.
    pub fn target(&self) -> RevalidateTarget {
        match (&self.path, &self.tag) {
            (Some(path), _) => RevalidateTarget::Path(path.clone()),
            (None, tag) => RevalidateTarget::Tag(tag.clone().unwrap_or_default()),
        }
    }
}
