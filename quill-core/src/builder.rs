use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;
use crate::highlight::Highlighter;
use crate::locale::Locale;
use crate::markdown::{PostRenderer, RenderError, parse_markdown, table_of_contents};
use crate::pages::{self, ROUTE_HOME, ROUTE_MATERIALS};
use crate::posts::{self, LoadError, PostMeta};
use crate::seo;
use crate::template::{TemplateError, TemplateRenderer};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Posts directory not specified")]
    MissingPostsDir,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Failed to render post `{post}`: {source}")]
    Render {
        post: String,
        #[source]
        source: RenderError,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read static files: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Summary of a finished build.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildReport {
    pub posts: usize,
    pub pages: usize,
    pub static_files: usize,
    pub elapsed: Duration,
}

pub struct SiteBuilder {
    posts_dir: Option<PathBuf>,
    output_dir: PathBuf,
    theme_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
    config: Config,
    include_drafts: bool,
    livereload: Option<String>,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            posts_dir: None,
            output_dir: PathBuf::from("./out"),
            theme_dir: None,
            static_dir: None,
            config: Config::default(),
            include_drafts: false,
            livereload: None,
        }
    }

    // Required configuration
    pub fn posts_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.posts_dir = Some(path.as_ref().to_path_buf());
        self
    }

    // Optional paths
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn theme_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.theme_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn static_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.static_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn include_drafts(mut self, include: bool) -> Self {
        self.include_drafts = include;
        self
    }

    /// Injects the websocket reload script pointing at `host:port`.
    pub fn livereload(mut self, host: &str, port: u16) -> Self {
        self.livereload = Some(format!("{}:{}", host, port));
        self
    }

    pub fn build(self) -> Result<Site, BuildError> {
        let posts_dir = self.posts_dir.ok_or(BuildError::MissingPostsDir)?;

        let mut posts = posts::load_posts(&posts_dir)?;
        let total = posts.len();
        if !self.include_drafts {
            posts.retain(|post| !post.draft);
        }
        if posts.len() < total {
            log::info!("Skipping {} draft post(s)", total - posts.len());
        }

        let mut renderer = TemplateRenderer::new(self.theme_dir.as_deref())?;
        renderer.set_global("site", &self.config.site);
        renderer.set_global("livereload", &self.livereload.unwrap_or_default());

        let highlighter = Highlighter::new(&self.config.site.syntax_theme);

        Ok(Site {
            posts,
            config: self.config,
            renderer,
            highlighter,
            output_dir: self.output_dir,
            static_dir: self.static_dir,
        })
    }
}

pub struct Site {
    posts: Vec<PostMeta>,
    config: Config,
    renderer: TemplateRenderer,
    highlighter: Highlighter,
    output_dir: PathBuf,
    static_dir: Option<PathBuf>,
}

impl Site {
    pub fn posts(&self) -> &[PostMeta] {
        &self.posts
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Renders the post body for `locale` into HTML, with its table of
    /// contents.
    pub fn render_post_body(
        &self,
        meta: &PostMeta,
        locale: Locale,
    ) -> Result<(String, Vec<crate::markdown::TocEntry>), BuildError> {
        let body = meta.read_body(locale)?;
        let wrap = |source| BuildError::Render {
            post: meta.path.clone(),
            source,
        };

        let elements = parse_markdown(&body).map_err(wrap)?;
        let toc = table_of_contents(&elements);
        let html = PostRenderer::new(meta.demo_map(), &self.highlighter)
            .render(&elements)
            .map_err(wrap)?;
        Ok((html, toc))
    }

    fn render_page(
        &self,
        template: &str,
        context: &tera::Context,
        locale: Locale,
        route: &str,
    ) -> Result<(), BuildError> {
        let output_path = self.output_dir.join(pages::route_file(locale, route));
        log::debug!("Writing {}", output_path.display());
        self.renderer.render_to_file(template, context, &output_path)?;
        Ok(())
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<(), BuildError> {
        let path = self.output_dir.join(name);
        std::fs::write(&path, contents).map_err(|source| BuildError::Io { path, source })
    }

    fn copy_static(&self, static_dir: &Path) -> Result<usize, BuildError> {
        let mut copied = 0;
        for entry in WalkDir::new(static_dir).min_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(static_dir) else {
                continue;
            };

            let target = self.output_dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::copy(entry.path(), &target).map_err(|source| BuildError::Io {
                path: target.clone(),
                source,
            })?;
            copied += 1;
        }
        Ok(copied)
    }

    pub fn render_all(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let mut report = BuildReport {
            posts: self.posts.len(),
            ..BuildReport::default()
        };

        std::fs::create_dir_all(&self.output_dir).map_err(|source| BuildError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        for locale in Locale::ALL {
            let context = pages::home_context(&self.config, &self.posts, locale);
            self.render_page("home.html", &context, locale, ROUTE_HOME)?;

            let context = pages::materials_context(&self.config, locale);
            self.render_page("materials.html", &context, locale, ROUTE_MATERIALS)?;
            report.pages += 2;

            for meta in &self.posts {
                let (content, toc) = self.render_post_body(meta, locale)?;
                let context = pages::post_context(&self.config, meta, locale, &content, &toc);
                self.render_page("post.html", &context, locale, &pages::post_route(meta))?;
                report.pages += 1;
            }
        }

        let host = &self.config.site.host;
        let today = chrono::Local::now().date_naive();
        self.write_file("sitemap.xml", &seo::sitemap_xml(host, &self.posts, today))?;
        self.write_file("robots.txt", &seo::robots_txt(host))?;

        if let Some(static_dir) = self.static_dir.as_deref().filter(|dir| dir.is_dir()) {
            report.static_files = self.copy_static(static_dir)?;
        }

        report.elapsed = started.elapsed();
        log::info!(
            "Built {} pages from {} posts in {:.2?}",
            report.pages,
            report.posts,
            report.elapsed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_post(posts: &Path, dir: &str, meta: &str, body: &str) {
        let post_dir = posts.join(dir);
        std::fs::create_dir_all(&post_dir).unwrap();
        std::fs::write(post_dir.join("meta.yaml"), meta).unwrap();
        std::fs::write(post_dir.join("index.md"), body).unwrap();
    }

    #[test]
    fn test_missing_posts_dir() {
        let result = SiteBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingPostsDir)));
    }

    #[test]
    fn test_drafts_are_skipped_by_default() {
        let posts = TempDir::new().unwrap();
        write_post(posts.path(), "a", "title: A\ndate: 2023-01-01\n", "# A");
        write_post(posts.path(), "b", "title: B\ndate: 2023-01-02\ndraft: true\n", "# B");

        let site = SiteBuilder::new().posts_dir(posts.path()).build().unwrap();
        assert_eq!(site.posts().len(), 1);

        let site = SiteBuilder::new()
            .posts_dir(posts.path())
            .include_drafts(true)
            .build()
            .unwrap();
        assert_eq!(site.posts().len(), 2);
    }

    #[test]
    fn test_unknown_demo_names_the_post() {
        let posts = TempDir::new().unwrap();
        write_post(
            posts.path(),
            "demo",
            "title: Demo\ndate: 2023-01-01\n",
            "```yaml:codeDemo\nkey: missing\n```\n",
        );
        let out = TempDir::new().unwrap();

        let site = SiteBuilder::new()
            .posts_dir(posts.path())
            .output_dir(out.path())
            .build()
            .unwrap();
        match site.render_all() {
            Err(BuildError::Render { post, source }) => {
                assert_eq!(post, "demo");
                assert!(matches!(source, RenderError::UnknownDemo { .. }));
            }
            other => panic!("expected render error, got {other:?}"),
        }
    }

    #[test]
    fn test_livereload_script_injected() {
        let posts = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let site = SiteBuilder::new()
            .posts_dir(posts.path())
            .output_dir(out.path())
            .livereload("127.0.0.1", 3000)
            .build()
            .unwrap();
        site.render_all().unwrap();

        let home = std::fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(home.contains("__livereload"));
    }
}
