use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use folio_build::{BuildError, NodeError, SiteBuilder};
use folio_cache::{CacheError, FileContentCache};
use folio_config::{CliSettings, Config};
use folio_site::{Handler, HandlerError, HandlerRegistry, IndexError, Node};
use folio_theme::{STAMP_FILE, StaticInstall};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Markdown-ish handler that counts invocations and fails on "broken" files.
struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl Handler for CountingHandler {
    fn name(&self) -> &str {
        "counting"
    }

    fn can_handle(&self, node: &Node) -> bool {
        node.extension() == Some("md")
    }

    fn interpret(&self, node: &Node) -> Result<String, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if node.file_name().starts_with("broken") {
            return Err(HandlerError::Io {
                path: node.source_path().to_path_buf(),
                source: io::Error::other("unparseable"),
            });
        }
        let text = fs::read_to_string(node.source_path()).map_err(|source| HandlerError::Io {
            path: node.source_path().to_path_buf(),
            source,
        })?;
        let title = text.trim_start_matches("# ").trim();
        Ok(format!("<h1>{title}</h1>"))
    }
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn site(files: &[(&str, &str)], toml: &str) -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        write(temp_dir.path(), &format!("docs/{path}"), content);
    }
    let config_path = temp_dir.path().join("folio.toml");
    fs::write(&config_path, toml).unwrap();
    let config = Config::load(Some(&config_path), None).unwrap();
    (temp_dir, config)
}

fn counting_builder(config: Config) -> (SiteBuilder, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = HandlerRegistry::new().with(CountingHandler {
        calls: Arc::clone(&calls),
    });
    let cache = FileContentCache::open(&config.cache_resolved.dir).unwrap();
    (
        SiteBuilder::with_parts(config, registry, Box::new(cache)),
        calls,
    )
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

const GUIDE: &[(&str, &str)] = &[
    ("index.md", "# Welcome\n\nStart here."),
    ("guide/index.md", "# Guide\n\nOverview."),
    ("guide/setup.md", "# Setup\n\nInstall it."),
];

#[test]
fn test_fresh_build_renders_every_document() {
    let (temp_dir, config) = site(GUIDE, "");

    let report = SiteBuilder::new(config).unwrap().run().unwrap();

    assert!(report.is_success());
    assert_eq!(report.indexed, 4);
    assert_eq!(report.interpreted, 3);
    assert_eq!(report.reused, 0);
    assert_eq!(report.rendered, 3);
    assert_eq!(report.static_assets, StaticInstall::Copied(1));

    let root = temp_dir.path();
    for (page, title) in [
        ("build/index.html", "Welcome"),
        ("build/guide/index.html", "Guide"),
        ("build/guide/setup.html", "Setup"),
    ] {
        let html = read(root, page);
        assert!(html.contains(&format!("<title>{title}</title>")), "{page}");
    }
    let setup = read(root, "build/guide/setup.html");
    assert!(setup.contains("<h1>Setup</h1>"));
    assert!(setup.contains(">Welcome</a>"));
    assert!(setup.contains(">Guide</a>"));
    assert!(root.join("build/_static/folio.css").is_file());
    assert!(root.join("build/_static").join(STAMP_FILE).is_file());
}

#[test]
fn test_section_index_breadcrumbs_skip_own_directory() {
    let (temp_dir, config) = site(GUIDE, "");

    SiteBuilder::new(config).unwrap().run().unwrap();

    let guide = read(temp_dir.path(), "build/guide/index.html");
    let breadcrumbs = guide
        .split("<ol class=\"breadcrumbs\">")
        .nth(1)
        .and_then(|rest| rest.split("</ol>").next())
        .unwrap();
    assert!(breadcrumbs.contains(">Welcome</a>"));
    assert!(!breadcrumbs.contains(">Guide</a>"));
}

#[test]
fn test_second_run_reuses_cache() {
    let (_temp_dir, config) = site(GUIDE, "");
    let (builder, calls) = counting_builder(config);

    let first = builder.run().unwrap();
    assert_eq!(first.interpreted, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let second = builder.run().unwrap();

    assert!(second.is_success());
    assert_eq!(second.interpreted, 0);
    assert_eq!(second.reused, 3);
    assert_eq!(second.rendered, 3);
    assert_eq!(second.static_assets, StaticInstall::AlreadyInstalled);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

fn reload(temp_dir: &TempDir, settings: &CliSettings) -> Config {
    Config::load(Some(&temp_dir.path().join("folio.toml")), Some(settings)).unwrap()
}

#[test]
fn test_cache_disabled_reinterprets_everything() {
    let (temp_dir, config) = site(GUIDE, "[cache]\nenabled = false\n");
    let (builder, calls) = counting_builder(config);

    builder.run().unwrap();
    let second = builder.run().unwrap();

    assert_eq!(second.interpreted, 3);
    assert_eq!(second.reused, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert!(read(temp_dir.path(), "build/guide/setup.html").contains("<h1>Setup</h1>"));
}

#[test]
fn test_uncached_run_keeps_cache_current() {
    let (temp_dir, config) = site(&[("index.md", "# First")], "");
    let (cached, _calls) = counting_builder(config);
    cached.run().unwrap();

    let source = temp_dir.path().join("docs/index.md");
    fs::write(&source, "# Second").unwrap();
    fs::File::options()
        .write(true)
        .open(&source)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
        .unwrap();

    let no_cache = CliSettings {
        cache_enabled: Some(false),
        ..CliSettings::default()
    };
    let (uncached, _calls) = counting_builder(reload(&temp_dir, &no_cache));
    uncached.run().unwrap();
    assert!(read(temp_dir.path(), "build/index.html").contains("<h1>Second</h1>"));

    let (cached, calls) = counting_builder(reload(&temp_dir, &CliSettings::default()));
    let report = cached.run().unwrap();

    assert_eq!(report.interpreted, 0);
    assert_eq!(report.reused, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let html = read(temp_dir.path(), "build/index.html");
    assert!(html.contains("<h1>Second</h1>"));
    assert!(!html.contains("<h1>First</h1>"));
}

#[test]
fn test_default_builder_without_cache_stores_interpretations() {
    let (temp_dir, _config) = site(GUIDE, "");
    let no_cache = CliSettings {
        cache_enabled: Some(false),
        ..CliSettings::default()
    };
    SiteBuilder::new(reload(&temp_dir, &no_cache))
        .unwrap()
        .run()
        .unwrap();

    let report = SiteBuilder::new(reload(&temp_dir, &CliSettings::default()))
        .unwrap()
        .run()
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.reused, 3);
}

#[test]
fn test_handler_failure_is_confined_to_node() {
    let mut files = GUIDE.to_vec();
    files.push(("guide/broken.md", "# Broken"));
    let (temp_dir, config) = site(&files, "");
    let (builder, _calls) = counting_builder(config);

    let report = builder.run().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].reference_path, "guide/broken.md");
    assert!(matches!(report.failures[0].error, NodeError::Handler(_)));
    assert_eq!(report.rendered, 3);
    assert!(!temp_dir.path().join("build/guide/broken.html").exists());
    assert!(temp_dir.path().join("build/guide/setup.html").is_file());
}

#[test]
fn test_render_failure_is_confined_to_node() {
    let toml = "[[override]]\npattern = \"guide/setup\\\\.md\"\nlayout = \"missing.html\"\n";
    let (temp_dir, config) = site(GUIDE, toml);

    let report = SiteBuilder::new(config).unwrap().run().unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].reference_path, "guide/setup.md");
    assert!(matches!(report.failures[0].error, NodeError::Render(_)));
    assert_eq!(report.rendered, 2);
    assert!(temp_dir.path().join("build/index.html").is_file());
}

#[test]
fn test_cleared_cache_with_fresh_outputs_is_fatal() {
    let (_temp_dir, config) = site(GUIDE, "");
    let cache_dir = config.cache_resolved.dir.clone();
    let (builder, _calls) = counting_builder(config);
    builder.run().unwrap();

    for entry in fs::read_dir(&cache_dir).unwrap() {
        fs::remove_file(entry.unwrap().path()).unwrap();
    }
    let err = builder.run().unwrap_err();

    assert!(matches!(err, BuildError::CacheMiss { .. }));
}

#[test]
fn test_foreign_static_folder_is_not_overwritten() {
    let (temp_dir, config) = site(GUIDE, "");
    write(temp_dir.path(), "build/_static/custom.css", "body {}");

    let err = SiteBuilder::new(config).unwrap().run().unwrap_err();

    assert!(matches!(err, BuildError::StaticAssetConflict(_)));
    assert_eq!(read(temp_dir.path(), "build/_static/custom.css"), "body {}");
    assert!(!temp_dir.path().join("build/_static/folio.css").exists());
}

#[test]
fn test_unhandled_files_are_copied_once() {
    let mut files = GUIDE.to_vec();
    files.push(("guide/diagram.svg", "<svg/>"));
    let (temp_dir, config) = site(&files, "");
    let builder = SiteBuilder::new(config).unwrap();

    let first = builder.run().unwrap();
    let second = builder.run().unwrap();

    assert_eq!(first.copied, 1);
    assert_eq!(second.copied, 0);
    assert_eq!(read(temp_dir.path(), "build/guide/diagram.svg"), "<svg/>");
}

#[test]
fn test_hidden_and_private_sources_are_ignored() {
    let mut files = GUIDE.to_vec();
    files.push((".draft.md", "# Draft"));
    files.push(("_partials/footer.md", "# Footer"));
    let (temp_dir, config) = site(&files, "");

    let report = SiteBuilder::new(config).unwrap().run().unwrap();

    assert_eq!(report.indexed, 4);
    assert!(!temp_dir.path().join("build/.draft.html").exists());
    assert!(!temp_dir.path().join("build/_partials").exists());
}

#[test]
fn test_missing_source_root_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("folio.toml");
    fs::write(&config_path, "[source]\npath = \"nowhere\"\n").unwrap();
    let config = Config::load(Some(&config_path), None).unwrap();

    let err = SiteBuilder::new(config).unwrap().run().unwrap_err();

    assert!(matches!(
        err,
        BuildError::Index(IndexError::InvalidTarget(_))
    ));
}

#[test]
fn test_cache_error_display_names_key() {
    let key = folio_cache::CacheKey::for_reference_path("index.md");
    let err = CacheError::Miss(key.clone());

    assert!(err.to_string().contains(key.as_str()));
}
