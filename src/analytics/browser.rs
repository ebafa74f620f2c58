//! Coarse browser classification from user agent strings

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    Other,
}

/// Marker tokens in precedence order
///
/// Chromium-based browsers also advertise `Chrome` and `Safari`, and
/// Chrome advertises `Safari`, so the more specific tokens come first.
const MARKERS: &[(Browser, &[&str])] = &[
    (Browser::Edge, &["Edg"]),
    (Browser::Opera, &["OPR", "Opera"]),
    (Browser::Firefox, &["Firefox", "FxiOS"]),
    (Browser::Chrome, &["Chrome", "CriOS"]),
    (Browser::Safari, &["Safari"]),
];

impl Browser {
    /// Classify a user agent by case-sensitive substring matching
    pub fn classify(user_agent: &str) -> Self {
        MARKERS
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|t| user_agent.contains(t)))
            .map(|(browser, _)| *browser)
            .unwrap_or(Browser::Other)
    }

    /// SQL `CASE` expression with the same precedence as [`Browser::classify`]
    ///
    /// `contains` renders a case-sensitive substring test for one token,
    /// which differs per database. Rows for which no test is true (including
    /// NULL user agents) fall through to `Other`.
    pub fn sql_case(contains: impl Fn(&str) -> String) -> String {
        let mut sql = String::from("CASE");
        for (browser, tokens) in MARKERS {
            let tests: Vec<String> = tokens.iter().map(|t| contains(t)).collect();
            sql.push_str(&format!(
                " WHEN {} THEN '{}'",
                tests.join(" OR "),
                browser.as_str()
            ));
        }
        sql.push_str(&format!(" ELSE '{}' END", Browser::Other.as_str()));
        sql
    }

    /// Inverse of [`Browser::as_str`]; unknown names map to `Other`
    pub fn from_name(name: &str) -> Self {
        MARKERS
            .iter()
            .map(|(browser, _)| *browser)
            .find(|browser| browser.as_str() == name)
            .unwrap_or(Browser::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Edge => "Edge",
            Browser::Opera => "Opera",
            Browser::Other => "Other",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
