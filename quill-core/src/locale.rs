use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

/// Languages the site is generated in. `Cn` lives at the site root,
/// every other locale under its own prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Cn,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Cn, Locale::En];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Cn => "cn",
            Locale::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "cn" | "zh" => Some(Locale::Cn),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// URL prefix, without a trailing slash.
    pub fn prefix(&self) -> &'static str {
        match self {
            Locale::Cn => "",
            Locale::En => "/en",
        }
    }

    /// Value for `<html lang>`.
    pub fn html_lang(&self) -> &'static str {
        match self {
            Locale::Cn => "zh-CN",
            Locale::En => "en",
        }
    }

    pub fn date_format(&self) -> &'static str {
        match self {
            Locale::Cn => "YYYY年MM月DD日",
            Locale::En => "YYYY-MM-DD",
        }
    }
}

/// Substitutes `YYYY`, `MM`, `DD`, `hh`, `mm` and `ss` in `fmt` with the
/// matching component of `date`. Components are not zero padded.
pub fn fmt_date(date: &NaiveDateTime, fmt: &str) -> String {
    fmt.replace("YYYY", &date.year().to_string())
        .replace("MM", &date.month().to_string())
        .replace("DD", &date.day().to_string())
        .replace("hh", &date.hour().to_string())
        .replace("mm", &date.minute().to_string())
        .replace("ss", &date.second().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 5)
            .unwrap()
            .and_hms_opt(9, 7, 3)
            .unwrap()
    }

    #[test]
    fn test_fmt_date_unpadded() {
        assert_eq!(fmt_date(&date(), "YYYY-MM-DD"), "2023-1-5");
        assert_eq!(fmt_date(&date(), "hh:mm:ss"), "9:7:3");
    }

    #[test]
    fn test_fmt_date_locale_formats() {
        assert_eq!(fmt_date(&date(), Locale::Cn.date_format()), "2023年1月5日");
        assert_eq!(fmt_date(&date(), Locale::En.date_format()), "2023-1-5");
    }

    #[test]
    fn test_locale_codes() {
        assert_eq!(Locale::from_code("en"), Some(Locale::En));
        assert_eq!(Locale::from_code("zh"), Some(Locale::Cn));
        assert_eq!(Locale::from_code("fr"), None);
        assert_eq!(Locale::En.prefix(), "/en");
        assert_eq!(Locale::Cn.prefix(), "");
    }
}
