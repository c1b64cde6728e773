//! Template contexts for every generated page.
//!
//! Each function is a pure transform from loaded data to a tera
//! [`Context`]; writing the result to disk is left to the builder.

use std::path::PathBuf;

use serde::Serialize;
use tera::Context;

use crate::config::Config;
use crate::locale::{Locale, fmt_date};
use crate::markdown::TocEntry;
use crate::posts::PostMeta;

pub const ROUTE_HOME: &str = "";
pub const ROUTE_MATERIALS: &str = "materials";

#[derive(Debug, Serialize)]
pub struct NavItem {
    pub text: String,
    pub link: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
struct Seo {
    title: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct Alternate {
    lang: &'static str,
    href: String,
    label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub href: String,
    pub date: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Reference<'a> {
    text: &'a str,
    href: &'a str,
}

#[derive(Debug, Serialize)]
struct Environment<'a> {
    name: &'a str,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct PostHeader<'a> {
    date: String,
    title: &'a str,
    tags: Vec<String>,
    references: Vec<Reference<'a>>,
    requirements: &'a [String],
    environment: Vec<Environment<'a>>,
}

#[derive(Debug, Serialize)]
struct MaterialGroupView<'a> {
    title: &'a str,
    subtitle: &'a str,
    sections: Vec<MaterialSectionView<'a>>,
}

#[derive(Debug, Serialize)]
struct MaterialSectionView<'a> {
    section: &'a str,
    items: Vec<MaterialItemView<'a>>,
}

#[derive(Debug, Serialize)]
struct MaterialItemView<'a> {
    title: &'a str,
    description: &'a str,
    link: &'a str,
}

/// Public URL of `route` (e.g. `""`, `"materials"`, `"blog/a/b"`).
pub fn route_url(locale: Locale, route: &str) -> String {
    let route = route.trim_matches('/');
    match (locale.prefix(), route.is_empty()) {
        ("", true) => "/".to_string(),
        (prefix, true) => prefix.to_string(),
        (prefix, false) => format!("{}/{}", prefix, route),
    }
}

/// Output file of `route`, relative to the output directory.
pub fn route_file(locale: Locale, route: &str) -> PathBuf {
    let mut path = PathBuf::new();
    let prefix = locale.prefix().trim_start_matches('/');
    if !prefix.is_empty() {
        path.push(prefix);
    }
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join("index.html")
}

pub fn navigation(locale: Locale, route: &str) -> Vec<NavItem> {
    let route = route.trim_matches('/');
    vec![
        NavItem {
            text: "Posts".into(),
            link: route_url(locale, ROUTE_HOME),
            active: route.is_empty() || route.starts_with("blog"),
        },
        NavItem {
            text: "Materials".into(),
            link: route_url(locale, ROUTE_MATERIALS),
            active: route.starts_with(ROUTE_MATERIALS),
        },
    ]
}

pub fn seo_title(sub_title: Option<&str>, site_title: &str) -> String {
    match sub_title {
        Some(sub) if !sub.is_empty() => format!("{} | {}", sub, site_title),
        _ => site_title.to_string(),
    }
}

fn page_context(
    config: &Config,
    locale: Locale,
    route: &str,
    sub_title: Option<&str>,
    description: &str,
) -> Context {
    let other = match locale {
        Locale::Cn => Locale::En,
        Locale::En => Locale::Cn,
    };

    let mut context = Context::new();
    context.insert("locale", locale.code());
    context.insert("lang", locale.html_lang());
    context.insert("route", route);
    context.insert("home_href", &route_url(locale, ROUTE_HOME));
    context.insert("nav", &navigation(locale, route));
    context.insert(
        "alternate",
        &Alternate {
            lang: other.html_lang(),
            href: route_url(other, route),
            label: match other {
                Locale::Cn => "中文",
                Locale::En => "EN",
            },
        },
    );
    context.insert(
        "seo",
        &Seo {
            title: seo_title(sub_title, &config.site.title),
            description: description.to_string(),
        },
    );
    context
}

pub fn post_summaries(config: &Config, posts: &[PostMeta], locale: Locale) -> Vec<PostSummary> {
    posts
        .iter()
        .map(|meta| PostSummary {
            href: meta.href(locale),
            date: fmt_date(&meta.date, locale.date_format()),
            title: meta.title_for(locale).to_string(),
            summary: meta.summary_for(locale).to_string(),
            tags: meta.tags.iter().map(|t| config.tag_name(t, locale)).collect(),
        })
        .collect()
}

pub fn home_context(config: &Config, posts: &[PostMeta], locale: Locale) -> Context {
    let mut context = page_context(
        config,
        locale,
        ROUTE_HOME,
        None,
        config.site.description_for(locale),
    );
    context.insert("posts", &post_summaries(config, posts, locale));
    context
}

pub fn post_route(meta: &PostMeta) -> String {
    format!("blog/{}", meta.slug().join("/"))
}

pub fn post_context(
    config: &Config,
    meta: &PostMeta,
    locale: Locale,
    content: &str,
    toc: &[TocEntry],
) -> Context {
    let title = meta.title_for(locale);
    let mut context = page_context(
        config,
        locale,
        &post_route(meta),
        Some(title),
        meta.summary_for(locale),
    );

    let header = PostHeader {
        date: fmt_date(&meta.date, locale.date_format()),
        title,
        tags: meta.tags.iter().map(|t| config.tag_name(t, locale)).collect(),
        references: meta
            .references
            .iter()
            .map(|(text, href)| Reference { text, href })
            .collect(),
        requirements: &meta.requirements,
        environment: meta
            .environment
            .iter()
            .map(|(name, version)| Environment { name, version })
            .collect(),
    };
    context.insert("post", &header);
    context.insert("toc", toc);
    context.insert("content", content);
    context
}

pub fn materials_context(config: &Config, locale: Locale) -> Context {
    let mut context = page_context(
        config,
        locale,
        ROUTE_MATERIALS,
        Some("Materials"),
        config.site.description_for(locale),
    );

    let groups: Vec<MaterialGroupView> = config
        .materials
        .iter()
        .map(|group| MaterialGroupView {
            title: &group.title,
            subtitle: group.subtitle_for(locale),
            sections: group
                .sections
                .iter()
                .map(|section| MaterialSectionView {
                    section: &section.section,
                    items: section
                        .items
                        .iter()
                        .map(|item| MaterialItemView {
                            title: &item.title,
                            description: item.description_for(locale),
                            link: &item.link,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    context.insert("groups", &groups);
    context
}
