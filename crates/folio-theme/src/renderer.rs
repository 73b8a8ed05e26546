//! Template rendering.
//!
//! [`TemplateRenderer`] renders pages with minijinja. Templates are loaded from
//! the theme's `templates/` folder; names the theme does not provide fall back
//! to the built-in theme. Values from `theme.contexts` are registered as
//! template globals.

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::{Environment, Value};

use crate::PageContext;

/// Built-in page template.
pub const DEFAULT_LAYOUT: &str = "default.html";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(
    DEFAULT_LAYOUT,
    include_str!("../theme/templates/default.html"),
)];

/// Template rendering error.
#[derive(Debug, thiserror::Error)]
#[error("Failed to render template {template}: {source}")]
pub struct RenderError {
    /// Template name.
    pub template: String,
    /// Underlying minijinja error.
    #[source]
    pub source: minijinja::Error,
}

/// Renders a named template with a page context.
pub trait Renderer: Send + Sync {
    /// Render `template` into bytes ready to be written to disk.
    fn render(&self, template: &str, context: &PageContext) -> Result<Vec<u8>, RenderError>;
}

/// minijinja-backed [`Renderer`].
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Renderer using only the built-in templates.
    pub fn builtin(contexts: &BTreeMap<String, serde_json::Value>) -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| Ok(builtin_template(name).map(str::to_owned)));
        Self::with_globals(env, contexts)
    }

    /// Renderer loading templates from `<theme_dir>/templates`.
    pub fn from_theme(theme_dir: &Path, contexts: &BTreeMap<String, serde_json::Value>) -> Self {
        let fs_loader = minijinja::path_loader(theme_dir.join("templates"));
        let mut env = Environment::new();
        env.set_loader(move |name| match fs_loader(name)? {
            Some(source) => Ok(Some(source)),
            None => Ok(builtin_template(name).map(str::to_owned)),
        });
        tracing::debug!(theme = %theme_dir.display(), "Loaded theme");
        Self::with_globals(env, contexts)
    }

    fn with_globals(
        mut env: Environment<'static>,
        contexts: &BTreeMap<String, serde_json::Value>,
    ) -> Self {
        for (name, value) in contexts {
            env.add_global(name.clone(), Value::from_serialize(value));
        }
        Self { env }
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: &PageContext) -> Result<Vec<u8>, RenderError> {
        let render_err = |source| RenderError {
            template: template.to_owned(),
            source,
        };
        let html = self
            .env
            .get_template(template)
            .and_then(|t| t.render(context))
            .map_err(render_err)?;
        Ok(html.into_bytes())
    }
}

fn builtin_template(name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, source)| *source)
}
