use chrono::NaiveDate;

use crate::locale::Locale;
use crate::posts::PostMeta;

/// Pages that exist independently of the posts, relative to a locale root.
const FIXED_ROUTES: [&str; 2] = ["", "/materials"];

#[derive(Debug, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
}

impl SitemapEntry {
    fn to_xml(&self) -> String {
        format!(
            "    <url>\n        <loc>{}</loc>\n        <lastmod>{}</lastmod>\n    </url>\n",
            escape_xml(&self.loc),
            self.lastmod.format("%Y-%m-%d")
        )
    }
}

/// Fixed pages in both locales dated `today`, then every post dated by
/// its publish date. English post URLs are only listed for posts that
/// have an English body.
pub fn sitemap_entries(host: &str, posts: &[PostMeta], today: NaiveDate) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();

    for locale in Locale::ALL {
        for route in FIXED_ROUTES {
            entries.push(SitemapEntry {
                loc: format!("https://{}{}{}", host, locale.prefix(), route),
                lastmod: today,
            });
        }
    }

    for post in posts {
        let lastmod = post.date.date();
        entries.push(SitemapEntry {
            loc: format!("https://{}{}", host, post.href(Locale::Cn)),
            lastmod,
        });
        if post.has_en {
            entries.push(SitemapEntry {
                loc: format!("https://{}{}", host, post.href(Locale::En)),
                lastmod,
            });
        }
    }

    entries
}

pub fn sitemap_xml(host: &str, posts: &[PostMeta], today: NaiveDate) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in sitemap_entries(host, posts, today) {
        xml.push_str(&entry.to_xml());
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn robots_txt(host: &str) -> String {
    format!("User-agent: *\n\nSitemap: https://{}/sitemap.xml\n", host)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
