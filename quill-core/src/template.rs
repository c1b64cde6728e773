use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Templates compiled into the binary. A theme directory can replace any
/// of them by providing a file with the same name.
const BUILTIN_TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("post.html", include_str!("../templates/post.html")),
    ("materials.html", include_str!("../templates/materials.html")),
];

pub struct TemplateRenderer {
    tera: Tera,
    globals: Context,
}

impl TemplateRenderer {
    pub fn new(theme_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut templates: Vec<(String, String)> = BUILTIN_TEMPLATES
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect();

        if let Some(dir) = theme_dir.filter(|dir| dir.is_dir()) {
            let themed = theme_templates(dir)?;
            log::info!("Using theme {} ({} templates)", dir.display(), themed.len());
            // Added after the built-ins so a theme file replaces its namesake
            templates.extend(themed);
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;

        Ok(Self {
            tera,
            globals: Context::new(),
        })
    }

    /// Value available to every template rendered afterwards.
    pub fn set_global<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        self.globals.insert(key, value);
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        let mut full = self.globals.clone();
        full.extend(context.clone());
        Ok(self.tera.render(template, &full)?)
    }

    /// Render a template and write it directly to a file
    pub fn render_to_file(
        &self,
        template: &str,
        context: &Context,
        output_path: &Path,
    ) -> Result<(), TemplateError> {
        let rendered = self.render(template, context)?;

        // Ensure parent directory exists
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(output_path, rendered)?;
        Ok(())
    }
}

fn theme_templates(dir: &Path) -> Result<Vec<(String, String)>, TemplateError> {
    let mut templates = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()).filter(|e| {
        e.file_type().is_file() && e.path().extension().map(|ext| ext == "html").unwrap_or(false)
    }) {
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        templates.push((name, std::fs::read_to_string(entry.path())?));
    }

    Ok(templates)
}
