//! End-to-end build orchestration.
//!
//! [`SiteBuilder::run`] drives three stages over the same node list, each
//! completing before the next starts:
//!
//! 1. Index the source tree and bind handlers.
//! 2. Interpret stale documents (or read fresh ones back from the cache).
//! 3. Assemble the document tree and emit every entry through the renderer.
//!
//! Stages 2 and 3 fan out over a rayon pool. Per-node failures are collected
//! into the [`BuildReport`]; structural problems abort with a [`BuildError`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use folio_cache::{CacheError, ContentCache, FileContentCache};
use folio_config::Config;
use folio_site::{
    CommandHandler, DocId, DocTree, HandlerRegistry, MarkdownHandler, Node, PathIndexer,
    StalenessOracle, TreeAssembler, extract_title,
};
use folio_theme::{PageContext, Renderer, TemplateRenderer, install_static, static_path};
use rayon::prelude::*;

use crate::error::{BuildError, NodeError, NodeFailure};
use crate::fs::ensure_dir;
use crate::nav;
use crate::report::BuildReport;

/// Result of stage 2 for one node.
enum Interpretation {
    Page { html: String, interpreted: bool },
    PassThrough { stale: bool },
    Directory,
    Failed(NodeError),
}

/// Result of stage 3 for one entry.
enum Emission {
    Rendered,
    Copied,
    Unchanged,
}

/// One renderer per theme directory, plus the built-in theme.
struct Renderers<'a> {
    builtin: Box<dyn Renderer>,
    themes: HashMap<&'a Path, Box<dyn Renderer>>,
}

impl Renderers<'_> {
    fn get(&self, theme_dir: Option<&Path>) -> &dyn Renderer {
        theme_dir
            .and_then(|dir| self.themes.get(dir))
            .map_or(&*self.builtin, |renderer| &**renderer)
    }
}

/// Incremental site builder.
pub struct SiteBuilder {
    config: Config,
    registry: HandlerRegistry,
    cache: Box<dyn ContentCache>,
    oracle: StalenessOracle,
}

impl SiteBuilder {
    /// Create a builder from configuration.
    ///
    /// Opens the file cache and registers the configured converters followed
    /// by the Markdown handler.
    pub fn new(config: Config) -> Result<Self, BuildError> {
        let dir = &config.cache_resolved.dir;
        let cache = FileContentCache::open(dir).map_err(|source| BuildError::Io {
            path: dir.clone(),
            source,
        })?;
        let registry = registry_from_config(&config);
        Ok(Self::with_parts(config, registry, Box::new(cache)))
    }

    /// Create a builder with an explicit handler registry and cache.
    ///
    /// With caching disabled every node is interpreted again, but results are
    /// still stored so a later cached run never reads content older than the
    /// output it finds on disk.
    pub fn with_parts(
        config: Config,
        registry: HandlerRegistry,
        cache: Box<dyn ContentCache>,
    ) -> Self {
        let oracle = if config.cache_resolved.enabled {
            StalenessOracle::new()
        } else {
            StalenessOracle::always_stale()
        };
        Self {
            config,
            registry,
            cache,
            oracle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Index the source tree and bind handlers.
    pub fn index(&self) -> Result<Vec<Node>, BuildError> {
        let mut nodes = PathIndexer::new(
            &self.config.source_resolved.path,
            &self.config.output_resolved.path,
        )
        .walk()?;
        let bound = self.registry.assign(&mut nodes);
        tracing::info!(nodes = nodes.len(), documents = bound, "Indexed sources");
        Ok(nodes)
    }

    /// Build the site.
    ///
    /// Returns a report even when some nodes failed; check
    /// [`BuildReport::is_success`].
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.build.threads)
            .build()?;

        // Stage 1
        let nodes = self.index()?;
        let indexed = nodes.len();
        let output_root = &self.config.output_resolved.path;
        ensure_dir(output_root).map_err(|source| BuildError::Io {
            path: output_root.clone(),
            source,
        })?;

        // Stage 2
        let interpretations: Vec<Interpretation> = pool.install(|| {
            nodes
                .par_iter()
                .map(|node| self.interpret(node))
                .collect::<Result<_, _>>()
        })?;

        let mut failures = Vec::new();
        let mut titles = HashMap::new();
        let mut results = HashMap::with_capacity(nodes.len());
        let (mut interpreted, mut reused) = (0, 0);
        for (node, interpretation) in nodes.iter().zip(interpretations) {
            let reference_path = node.reference_path().to_owned();
            if let Interpretation::Failed(error) = interpretation {
                tracing::warn!(path = %reference_path, error = %error, "Interpretation failed");
                failures.push(NodeFailure {
                    reference_path,
                    error,
                });
                continue;
            }
            if let Interpretation::Page { html, interpreted: fresh } = &interpretation {
                if *fresh {
                    interpreted += 1;
                } else {
                    reused += 1;
                }
                if let Some(title) = extract_title(html) {
                    titles.insert(reference_path.clone(), title);
                }
            }
            results.insert(reference_path, interpretation);
        }
        tracing::info!(interpreted, reused, failed = failures.len(), "Interpreted documents");

        // Stage 3
        let tree = TreeAssembler::new()
            .with_index_name(self.config.source_resolved.index_name.clone())
            .with_titles(titles)
            .assemble(nodes);
        let renderers = self.renderers(&tree);
        let ids: Vec<DocId> = tree.ids().collect();
        let emissions: Vec<Result<Emission, NodeFailure>> = pool.install(|| {
            ids.into_par_iter()
                .map(|id| self.emit(&tree, id, &results, &renderers))
                .collect()
        });

        let (mut rendered, mut copied) = (0, 0);
        for emission in emissions {
            match emission {
                Ok(Emission::Rendered) => rendered += 1,
                Ok(Emission::Copied) => copied += 1,
                Ok(Emission::Unchanged) => {}
                Err(failure) => {
                    tracing::warn!(
                        path = %failure.reference_path,
                        error = %failure.error,
                        "Emission failed"
                    );
                    failures.push(failure);
                }
            }
        }
        tracing::info!(rendered, copied, "Emitted output");

        let static_assets = install_static(
            self.config.theme_resolved.path.as_deref(),
            &self.config.output_resolved.static_path(),
        )?;

        failures.sort_by(|a, b| a.reference_path.cmp(&b.reference_path));
        Ok(BuildReport {
            indexed,
            interpreted,
            reused,
            rendered,
            copied,
            skipped: tree.skipped().to_vec(),
            static_assets,
            failures,
        })
    }

    fn interpret(&self, node: &Node) -> Result<Interpretation, BuildError> {
        if !node.is_file() {
            return Ok(Interpretation::Directory);
        }

        let stale = self.oracle.is_stale(node);
        let Some(handler) = self.registry.handler_for(node) else {
            return Ok(Interpretation::PassThrough { stale });
        };

        if !stale {
            return match self.cache.get(node.cache_key()) {
                Ok(html) => {
                    tracing::debug!(path = %node.reference_path(), "Up to date");
                    Ok(Interpretation::Page {
                        html,
                        interpreted: false,
                    })
                }
                Err(CacheError::Miss(key)) => Err(BuildError::CacheMiss {
                    reference_path: node.reference_path().to_owned(),
                    key,
                }),
                Err(source) => Err(BuildError::Cache {
                    reference_path: node.reference_path().to_owned(),
                    source,
                }),
            };
        }

        let html = match handler.interpret(node) {
            Ok(html) => html,
            Err(e) => return Ok(Interpretation::Failed(e.into())),
        };
        if let Err(e) = self.cache.put(node.cache_key(), &html) {
            return Ok(Interpretation::Failed(e.into()));
        }

        tracing::debug!(
            path = %node.reference_path(),
            handler = handler.name(),
            "Interpreted"
        );
        Ok(Interpretation::Page {
            html,
            interpreted: true,
        })
    }

    /// One renderer per distinct theme used by a page.
    fn renderers(&self, tree: &DocTree) -> Renderers<'_> {
        let contexts = &self.config.theme_resolved.contexts;
        let mut themes: HashMap<&Path, Box<dyn Renderer>> = HashMap::new();

        for id in tree.documents().filter(|&id| tree.is_page(id)) {
            let Some(node) = tree.node(id) else { continue };
            if let Some(dir) = self.config.theme_for(node.reference_path()).path {
                themes
                    .entry(dir)
                    .or_insert_with(|| Box::new(TemplateRenderer::from_theme(dir, contexts)));
            }
        }

        Renderers {
            builtin: Box::new(TemplateRenderer::builtin(contexts)),
            themes,
        }
    }

    fn emit(
        &self,
        tree: &DocTree,
        id: DocId,
        results: &HashMap<String, Interpretation>,
        renderers: &Renderers<'_>,
    ) -> Result<Emission, NodeFailure> {
        let Some(node) = tree.node(id) else {
            return Ok(Emission::Unchanged);
        };
        let failure = |error: NodeError| NodeFailure {
            reference_path: node.reference_path().to_owned(),
            error,
        };

        match results.get(node.reference_path()) {
            Some(Interpretation::Directory) => {
                ensure_dir(node.output_path())
                    .map_err(|e| failure(io_error(node.output_path(), e)))?;
                Ok(Emission::Unchanged)
            }
            Some(Interpretation::PassThrough { stale: true }) => {
                copy_file(node.source_path(), node.output_path()).map_err(failure)?;
                tracing::debug!(path = %node.reference_path(), "Copied");
                Ok(Emission::Copied)
            }
            Some(Interpretation::Page { html, .. }) => {
                self.render_page(tree, id, node, html, renderers)
                    .map_err(failure)?;
                Ok(Emission::Rendered)
            }
            _ => Ok(Emission::Unchanged),
        }
    }

    fn render_page(
        &self,
        tree: &DocTree,
        id: DocId,
        node: &Node,
        html: &str,
        renderers: &Renderers<'_>,
    ) -> Result<(), NodeError> {
        let theme = self.config.theme_for(node.reference_path());
        let renderer = renderers.get(theme.path);

        let depth = tree.level(id).saturating_sub(1);
        let link = node.link_path();
        let context = PageContext {
            title: nav::display_title(tree, id),
            content: html.to_owned(),
            ancestors: nav::ancestors(tree, id, link),
            neighbours: nav::neighbours(tree, id, link),
            static_path: static_path(depth, &self.config.output_resolved.static_dir),
            level: depth,
        };

        let bytes = renderer.render(theme.layout, &context)?;
        write_file(node.output_path(), &bytes)?;
        tracing::debug!(path = %node.reference_path(), layout = theme.layout, "Rendered");
        Ok(())
    }
}

/// Handler registry for `config`: converters in file order, then Markdown.
pub fn registry_from_config(config: &Config) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for converter in &config.converters {
        if let Some(handler) = CommandHandler::new(converter.extensions.clone(), &converter.command)
        {
            registry.register(handler);
        }
    }
    registry.register(MarkdownHandler::new());
    registry
}

fn io_error(path: &Path, source: std::io::Error) -> NodeError {
    NodeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn ensure_parent(path: &Path) -> Result<(), NodeError> {
    match path.parent() {
        Some(parent) => ensure_dir(parent).map_err(|e| io_error(parent, e)),
        None => Ok(()),
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<(), NodeError> {
    ensure_parent(to)?;
    fs::copy(from, to).map_err(|e| io_error(to, e))?;
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), NodeError> {
    ensure_parent(path)?;
    fs::write(path, bytes).map_err(|e| io_error(path, e))
}
