pub mod builder;
pub mod config;
pub mod highlight;
pub mod locale;
pub mod markdown;
pub mod pages;
pub mod posts;
pub mod seo;
pub mod template;

// Re-export main types
pub use builder::{BuildError, BuildReport, Site, SiteBuilder};
pub use config::{Config, ConfigError};
pub use locale::Locale;
pub use markdown::{PageElement, PostRenderer, RenderError, parse_markdown};
pub use posts::{LoadError, Post, PostMeta, load_post, load_posts};
pub use template::{TemplateError, TemplateRenderer};
