//! Notice table extraction
//!
//! Pulls notice rows out of the board's HTML. The board renders one `<tr>`
//! per notice with four cells: serial, title, date, and a download link.

use std::sync::LazyLock;

use coordination::notice::Notice;
use regex::Regex;
use tracing::{debug, info};

/// Class carried by notice rows in the board's current layout
pub const NOTICE_ROW_CLASS: &str = "hover:bg-gray-50";

/// Cells a row needs to be read as a notice
const MIN_CELLS: usize = 4;

static TABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").unwrap());

static ROW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b([^>]*)>(.*?)</tr\s*>").unwrap());

static CELL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").unwrap());

static CLASS_ATTR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

static SPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turns a fetched page into notices. An empty result means the page
/// did not have the expected shape.
pub trait NoticeParser {
    fn parse(&self, html: &str) -> Vec<Notice>;
}

/// Table-row parser with a layout-independent fallback.
///
/// First looks for rows tagged with [`NOTICE_ROW_CLASS`]. If there are none,
/// takes the first table that has at least one row with four cells.
#[derive(Debug, Clone, Default)]
pub struct TableParser;

impl TableParser {
    pub fn new() -> Self {
        Self
    }

    /// Row bodies (inner HTML) from the class-tagged layout
    fn tagged_rows(html: &str) -> Vec<&str> {
        ROW_PATTERN
            .captures_iter(html)
            .filter(|caps| {
                CLASS_ATTR_PATTERN
                    .captures(&caps[1])
                    .and_then(|c| c.get(1).or_else(|| c.get(2)))
                    .is_some_and(|class| {
                        class
                            .as_str()
                            .split_whitespace()
                            .any(|c| c == NOTICE_ROW_CLASS)
                    })
            })
            .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
            .collect()
    }

    /// Row bodies from the first table that looks like a notice table
    fn fallback_rows(html: &str) -> Vec<&str> {
        for table in TABLE_PATTERN.captures_iter(html) {
            let Some(body) = table.get(1) else { continue };
            let rows: Vec<&str> = ROW_PATTERN
                .captures_iter(body.as_str())
                .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
                .collect();
            if rows
                .iter()
                .any(|row| CELL_PATTERN.captures_iter(row).count() >= MIN_CELLS)
            {
                info!(rows = rows.len(), "Notice rows found through table fallback");
                return rows;
            }
        }
        Vec::new()
    }

    fn notice_from_row(row: &str) -> Option<Notice> {
        let cells: Vec<&str> = CELL_PATTERN
            .captures_iter(row)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        if cells.len() < MIN_CELLS {
            return None;
        }

        let link = HREF_PATTERN
            .captures(cells[3])
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| decode_entities(m.as_str().trim()))
            .unwrap_or_default();

        Some(Notice::new(
            cell_text(cells[0]),
            cell_text(cells[1]),
            cell_text(cells[2]),
            link,
        ))
    }
}

impl NoticeParser for TableParser {
    fn parse(&self, html: &str) -> Vec<Notice> {
        let mut rows = Self::tagged_rows(html);
        if rows.is_empty() {
            rows = Self::fallback_rows(html);
        }

        let notices: Vec<Notice> = rows.into_iter().filter_map(Self::notice_from_row).collect();
        debug!(count = notices.len(), "Parsed notices");
        notices
    }
}

/// Visible text of a cell: tags dropped, entities decoded, whitespace collapsed.
pub fn cell_text(html: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(html, " ");
    let decoded = decode_entities(&stripped);
    SPACE_PATTERN.replace_all(decoded.trim(), " ").into_owned()
}

/// Decode named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    ENTITY_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
