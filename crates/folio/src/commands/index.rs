//! `folio index` command implementation.

use std::path::PathBuf;

use clap::Args;
use console::Term;
use folio_build::{BuildError, registry_from_config};
use folio_config::{CliSettings, Config};
use folio_site::{HandlerRegistry, Node, PathIndexer};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the index command.
#[derive(Args)]
pub(crate) struct IndexArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,
}

impl IndexArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let registry = registry_from_config(&config);
        let mut nodes =
            PathIndexer::new(&config.source_resolved.path, &config.output_resolved.path)
                .walk()
                .map_err(BuildError::from)?;
        let documents = registry.assign(&mut nodes);

        let term = Term::stdout();
        for node in &nodes {
            term.write_line(&format!(
                "{:<48} {}",
                node.reference_path(),
                describe(node, &registry)
            ))?;
        }

        Output::new().detail(&format!(
            "{} nodes, {documents} documents",
            nodes.len()
        ));
        Ok(())
    }
}

/// Handler name for documents, `copy` for other files, `dir` for directories.
fn describe<'a>(node: &Node, registry: &'a HandlerRegistry) -> &'a str {
    if !node.is_file() {
        return "dir";
    }
    registry.handler_for(node).map_or("copy", |handler| handler.name())
}

#[cfg(test)]
mod tests {
    use folio_site::{MarkdownHandler, NodeKind};
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(path: &str, kind: NodeKind) -> Node {
        Node::new(
            PathBuf::from("/docs").join(path),
            path.to_owned(),
            std::path::Path::new("/build"),
            kind,
        )
    }

    #[test]
    fn test_describe_nodes() {
        let registry = HandlerRegistry::new().with(MarkdownHandler::new());
        let mut nodes = vec![
            node("guide", NodeKind::Directory),
            node("guide.md", NodeKind::File),
            node("logo.png", NodeKind::File),
        ];
        registry.assign(&mut nodes);

        let described: Vec<&str> = nodes.iter().map(|n| describe(n, &registry)).collect();

        assert_eq!(described, vec!["dir", "markdown", "copy"]);
    }
}
