use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locale::Locale;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

/// Contents of `quill.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub tags: BTreeMap<String, TagName>,
    pub materials: Vec<MaterialGroup>,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }

    /// Display name of a tag key. Keys without an entry are shown as-is.
    pub fn tag_name(&self, key: &str, locale: Locale) -> String {
        match self.tags.get(key) {
            Some(name) => match locale {
                Locale::Cn => name.cn.clone(),
                Locale::En => name.en.clone(),
            },
            None => key.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub description_en: String,
    /// Bare host name, used for absolute URLs in the sitemap and robots.txt
    pub host: String,
    pub syntax_theme: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Quill".into(),
            description: String::new(),
            description_en: String::new(),
            host: "localhost".into(),
            syntax_theme: "InspiredGitHub".into(),
        }
    }
}

impl SiteConfig {
    pub fn description_for(&self, locale: Locale) -> &str {
        if locale == Locale::En && !self.description_en.is_empty() {
            &self.description_en
        } else {
            &self.description
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TagName {
    pub cn: String,
    pub en: String,
}

/// One titled block on the materials page, e.g. "Tools".
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct MaterialGroup {
    pub title: String,
    pub subtitle: String,
    pub subtitle_en: String,
    pub sections: Vec<MaterialSection>,
}

impl MaterialGroup {
    pub fn subtitle_for(&self, locale: Locale) -> &str {
        if locale == Locale::En && !self.subtitle_en.is_empty() {
            &self.subtitle_en
        } else {
            &self.subtitle
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MaterialSection {
    pub section: String,
    #[serde(default)]
    pub items: Vec<MaterialItem>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MaterialItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_en: String,
    pub link: String,
}

impl MaterialItem {
    pub fn description_for(&self, locale: Locale) -> &str {
        if locale == Locale::En && !self.description_en.is_empty() {
            &self.description_en
        } else {
            &self.description
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[site]
title = "Notes"
host = "blog.example.com"
description = "随笔"
description_en = "Notes"

[tags.fe]
cn = "前端"
en = "FrontEnd"

[[materials]]
title = "Tools"
subtitle = "一些工具"
subtitle_en = "Some useful tools"

[[materials.sections]]
section = "Web Tools"

[[materials.sections.items]]
title = "Image Online Tools"
description = "图片在线处理工具"
link = "https://image.example.com/"
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.site.title, "Notes");
        assert_eq!(config.site.host, "blog.example.com");
        // Unset fields keep their defaults
        assert_eq!(config.site.syntax_theme, "InspiredGitHub");
        assert_eq!(config.materials.len(), 1);
        assert_eq!(config.materials[0].sections[0].items[0].title, "Image Online Tools");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.site.title, "Quill");
        assert!(config.tags.is_empty());
        assert!(config.materials.is_empty());
    }

    #[test]
    fn test_tag_name_localized() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.tag_name("fe", Locale::Cn), "前端");
        assert_eq!(config.tag_name("fe", Locale::En), "FrontEnd");
        assert_eq!(config.tag_name("rust", Locale::En), "rust");
    }

    #[test]
    fn test_english_falls_back_when_missing() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let item = &config.materials[0].sections[0].items[0];
        assert_eq!(item.description_for(Locale::En), "图片在线处理工具");
        assert_eq!(config.materials[0].subtitle_for(Locale::En), "Some useful tools");
        assert_eq!(config.site.description_for(Locale::En), "Notes");
    }

    #[test]
    fn test_bundled_sample_config() {
        let config = Config::read(concat!(env!("CARGO_MANIFEST_DIR"), "/../quill.toml")).unwrap();
        assert_eq!(config.tag_name("fe", Locale::Cn), "前端");
        assert_eq!(config.tag_name("fe", Locale::En), "FrontEnd");

        let titles: Vec<_> = config.materials.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, ["Recommend Materials", "Tools", "My Materials"]);
        let mine = &config.materials[2];
        assert_eq!(mine.subtitle_for(Locale::En), "Some projects by myself");
        assert_eq!(mine.sections[1].section, "Lib");
        assert_eq!(mine.sections[1].items[0].link, "https://github.com/hpp2334/misty-vm");
    }

    #[test]
    fn test_read_missing_file() {
        let err = Config::read("/definitely/not/here/quill.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
