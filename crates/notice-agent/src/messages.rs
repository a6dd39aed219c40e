//! Chat message rendering (Telegram HTML parse mode).

use std::sync::LazyLock;

use chrono::{DateTime, Local};
use coordination::escalation::{Alert, ErrorCategory, Resolution};
use coordination::notice::Notice;
use regex::Regex;

use crate::notifier::Message;
use crate::runner::RunnerContext;

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Telegram's `sendMessage` text limit, in characters.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

static NOC_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bnoc\b").unwrap());

fn notice_block(index: usize, notice: &Notice) -> String {
    let mut block = format!("<b>{}. {}</b>\n", index, escape_html(&notice.title));
    block.push_str(&format!("📅 Date: {}\n", escape_html(&notice.date)));
    if let Some(url) = notice.attachment() {
        block.push_str(&format!("📎 <a href=\"{}\">Download PDF</a>\n", escape_html(url)));
    }
    block.push('\n');
    block
}

/// Digest of newly published notices, split into messages that each fit
/// within [`MESSAGE_CHAR_LIMIT`].
///
/// Splits fall only between whole notice blocks and numbering runs across
/// the parts. The header opens the first part and the footer closes the
/// last. A single block longer than the limit still gets a part of its own.
///
/// A lone NOC notice (no-objection certificates, posted in bulk) is
/// delivered silently.
pub fn notice_digest(
    notices: &[Notice],
    source_url: &str,
    checked_at: DateTime<Local>,
) -> Vec<Message> {
    let header = "🔔 <b>New Notice(s) from Dhaka College!</b>\n\n";
    let footer = format!(
        "🕐 Checked at: {}\n🌐 <a href=\"{}\">View All Notices</a>",
        checked_at.format("%Y-%m-%d %H:%M:%S"),
        escape_html(source_url)
    );
    let footer_len = footer.chars().count();

    let mut parts = Vec::new();
    let mut text = String::from(header);
    let mut len = header.chars().count();
    let mut blocks_in_part = 0;

    for (i, notice) in notices.iter().enumerate() {
        let block = notice_block(i + 1, notice);
        let block_len = block.chars().count();
        // Every part keeps room for the footer, since any part may be the last.
        if blocks_in_part > 0 && len + block_len + footer_len > MESSAGE_CHAR_LIMIT {
            parts.push(std::mem::take(&mut text));
            len = 0;
            blocks_in_part = 0;
        }
        text.push_str(&block);
        len += block_len;
        blocks_in_part += 1;
    }
    text.push_str(&footer);
    parts.push(text);

    let silent = notices.len() == 1 && NOC_WORD.is_match(&notices[0].title);
    parts
        .into_iter()
        .map(|text| Message { text, silent })
        .collect()
}

/// What to check when a category keeps failing.
fn category_hint(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Structure => "Please check and update the parser.",
        ErrorCategory::Timeout | ErrorCategory::Network => "Could not fetch the notice page.",
        ErrorCategory::RunnerFailure => "The scheduled run could not execute.",
        _ => "Please check the monitor logs.",
    }
}

/// Alert for a streak that crossed the threshold. Sent silently.
pub fn alert_message(alert: &Alert, runner: Option<&RunnerContext>) -> Message {
    let mut text = match (alert.category, runner) {
        (ErrorCategory::RunnerFailure, Some(ctx)) => format!(
            "🚨 <b>GitHub Action Failed!</b>\n\
             Repo: {}\n\
             Workflow: {}\n\
             Occurred {} times consecutively.\n\
             View logs: {}\n",
            escape_html(&ctx.repository),
            escape_html(&ctx.workflow),
            alert.count,
            escape_html(&ctx.run_url()),
        ),
        (category, _) => format!(
            "⚠️ <b>{}!</b>\n\
             Error details: <code>{}</code>\n\
             Occurred {} times consecutively.\n\
             {}\n",
            category.label(),
            escape_html(&alert.detail),
            alert.count,
            category_hint(category),
        ),
    };

    if let Some(prior) = alert.prior {
        text.push_str(&format!(
            "\n📋 <b>Note:</b> Previous <b>{}</b> error had occurred {} times before this.",
            prior.category, prior.count
        ));
    }

    Message::silent(text)
}

/// Recovery notice after a streak that had alerted. Sent silently.
pub fn resolution_message(resolution: &Resolution) -> Message {
    let text = match resolution {
        Resolution::RunnerRecovered { count } => format!(
            "✅ <b>GitHub Action Recovered</b>\n\
             The monitor ran successfully after {} failed runs.",
            count
        ),
        Resolution::Recovered { category, count } => format!(
            "✅ <b>{} Resolved</b>\n\
             The notice page is being read normally again after {} consecutive failures.",
            category.label(),
            count
        ),
    };
    Message::silent(text)
}
