use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_THEME: &str = "InspiredGitHub";

pub struct Highlighter {
    theme: &'static Theme,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl Highlighter {
    pub fn new(theme_name: &str) -> Self {
        let theme = match THEME_SET.themes.get(theme_name) {
            Some(theme) => theme,
            None => {
                log::warn!("Unknown syntax theme `{theme_name}`, using {DEFAULT_THEME}");
                &THEME_SET.themes[DEFAULT_THEME]
            }
        };

        Self { theme }
    }

    /// Highlights `code` as `language`, one `<span class="line">` per line
    /// with a line number gutter. Anything syntect fails on comes out as
    /// escaped plain text.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        let syntax = find_syntax(language, code);

        let mut lines = String::new();
        let mut h = HighlightLines::new(syntax, self.theme);
        for (number, line) in LinesWithEndings::from(code).enumerate() {
            let html = h
                .highlight_line(line, &SYNTAX_SET)
                .ok()
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()
                })
                .unwrap_or_else(|| html_escape::encode_text(line).to_string());

            lines.push_str(&format!(
                "<span class=\"line\"><span class=\"line-number\">{}</span>{}</span>",
                number + 1,
                html
            ));
        }

        format!(
            "<pre class=\"highlight\" data-language=\"{}\"><code>{}</code></pre>\n",
            html_escape::encode_double_quoted_attribute(language),
            lines
        )
    }
}

fn find_syntax(language: &str, code: &str) -> &'static SyntaxReference {
    let ss: &'static SyntaxSet = &SYNTAX_SET;
    ss.find_syntax_by_token(language)
        .or_else(|| ss.find_syntax_by_name(language))
        .or_else(|| ss.find_syntax_by_extension(language))
        .or_else(|| {
            // Fallback mappings for languages missing from the default set
            match language {
                "ts" | "tsx" | "jsx" | "mjs" | "typescript" => ss.find_syntax_by_name("JavaScript"),
                "toml" => ss.find_syntax_by_name("YAML"),
                _ => None,
            }
        })
        .or_else(|| ss.find_syntax_by_first_line(code))
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}
