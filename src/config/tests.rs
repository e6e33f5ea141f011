use std::io::Write;

use folio_api_types::RevalidateTarget;
use serial_test::serial;

use super::*;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write tmp");
    file
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.content.base_url.as_str(), DEFAULT_BASE_URL);
    assert_eq!(settings.cache.max_age, Duration::from_millis(300_000));
    assert_eq!(settings.cache.page_size.get(), 10);
    assert_eq!(settings.cache.photo_page_size.get(), 24);
    assert!(!settings.cache.dedupe_by_id);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.revalidate.secret.is_none());
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.cache.page_size = Some(20);
    raw.logging.level = Some("info".to_string());

    let overrides = GlobalOverrides {
        cache_page_size: Some(5),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.page_size.get(), 5);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_page_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.photo_page_size = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.photo_page_size",
            ..
        }
    ));
}

#[test]
fn zero_max_age_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.max_age_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn non_http_base_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.content.base_url = Some("ftp://example.com/".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp scheme");
    assert!(err.to_string().contains("content.base_url"));
}

#[test]
fn blank_secret_counts_as_unset() {
    let mut raw = RawSettings::default();
    raw.revalidate.secret = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.revalidate.secret.is_none());
}

#[test]
#[serial]
fn config_file_is_layered_under_cli_flags() {
    let file = config_file(
        r#"
[content]
base_url = "https://content.example.com/site"

[cache]
max_age_ms = 60000
page_size = 12
dedupe_by_id = true

[revalidate]
secret = "from-file"
"#,
    );
    let path = file.path().to_str().expect("utf-8 path");

    let args = CliArgs::parse_from([
        "folio",
        "--config-file",
        path,
        "--cache-page-size",
        "4",
        "revalidate",
        "--path",
        "/blog",
        "--secret",
        "from-cli",
    ]);
    let settings = load(&args).expect("settings");

    assert_eq!(
        settings.content.base_url.as_str(),
        "https://content.example.com/site"
    );
    assert_eq!(settings.cache.max_age, Duration::from_secs(60));
    assert_eq!(settings.cache.page_size.get(), 4);
    assert!(settings.cache.dedupe_by_id);
    assert_eq!(settings.revalidate.secret.as_deref(), Some("from-cli"));
}

#[test]
#[serial]
fn missing_explicit_config_file_is_an_error() {
    let args = CliArgs::parse_from([
        "folio",
        "--config-file",
        "/nonexistent/folio-test.toml",
        "projects",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
#[serial]
fn environment_sits_between_file_and_cli() {
    let file = config_file(
        r#"
[cache]
page_size = 12
photo_page_size = 30
"#,
    );
    let path = file.path().to_str().expect("utf-8 path");

    // SAFETY: serialized with every other test that reads the environment.
    unsafe {
        std::env::set_var("FOLIO__CACHE__PAGE_SIZE", "7");
        std::env::set_var("FOLIO__CACHE__PHOTO_PAGE_SIZE", "8");
    }
    let args = CliArgs::parse_from([
        "folio",
        "--config-file",
        path,
        "--cache-photo-page-size",
        "9",
        "photos",
    ]);
    let result = load(&args);
    unsafe {
        std::env::remove_var("FOLIO__CACHE__PAGE_SIZE");
        std::env::remove_var("FOLIO__CACHE__PHOTO_PAGE_SIZE");
    }

    let settings = result.expect("settings");
    assert_eq!(settings.cache.page_size.get(), 7);
    assert_eq!(settings.cache.photo_page_size.get(), 9);
}

#[test]
fn parse_posts_arguments() {
    let args = CliArgs::parse_from([
        "folio",
        "posts",
        "--category",
        "Travel",
        "--query",
        "kyoto",
        "--pages",
        "3",
    ]);

    match args.command {
        Command::Posts(list) => {
            assert_eq!(list.category.as_deref(), Some("Travel"));
            assert_eq!(list.query.as_deref(), Some("kyoto"));
            assert_eq!(list.pages, 3);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn global_flags_are_accepted_after_subcommand() {
    let args = CliArgs::parse_from(["folio", "photos", "--base-url", "http://localhost:4000"]);

    assert_eq!(
        args.overrides.base_url.as_deref(),
        Some("http://localhost:4000")
    );
    match args.command {
        Command::Photos(list) => assert_eq!(list.pages, 1),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn revalidate_requires_exactly_one_target() {
    assert!(CliArgs::try_parse_from(["folio", "revalidate"]).is_err());
    assert!(
        CliArgs::try_parse_from(["folio", "revalidate", "--path", "/", "--tag", "blog"]).is_err()
    );

    let args = CliArgs::parse_from(["folio", "revalidate", "--tag", "blog"]);
    match args.command {
        Command::Revalidate(rev) => {
            assert_eq!(rev.tag.as_deref(), Some("blog"));
            assert!(rev.path.is_none());
            assert_eq!(rev.target(), RevalidateTarget::Tag("blog".to_string()));
        }
        _ => panic!("wrong command parsed"),
    }

    let args = CliArgs::parse_from(["folio", "revalidate", "--path", "/blog"]);
    match args.command {
        Command::Revalidate(rev) => {
            assert_eq!(rev.target(), RevalidateTarget::Path("/blog".to_string()));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn zero_pages_is_rejected_by_the_parser() {
    assert!(CliArgs::try_parse_from(["folio", "posts", "--pages", "0"]).is_err());
}
