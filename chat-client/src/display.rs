//! Text transforms applied to bot answers before they are shown.
//!
//! Both transforms are pure and idempotent, so they can be reapplied to a
//! growing answer on every update.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Label that replaces a bare URL used as its own link text.
pub const SEE_DETAILS_LABEL: &str = "ดูรายละเอียดเพิ่มเติม";

/// Shown instead of the illustration while its answer is still arriving.
pub const IMAGE_PENDING_NOTICE: &str = "(รูปภาพประกอบจะแสดงเมื่อคำตอบเสร็จสมบูรณ์)";

// Opening of a link whose label is a URL. `regex` has no backreferences, so
// the target is compared against the label in code.
static URL_LINK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(https?://[^\]]+)\]\(").unwrap_or_else(|e| panic!("URL_LINK_OPEN: {e}"))
});

static LIST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.?\s+(.+)$").unwrap_or_else(|e| panic!("LIST_LINE: {e}"))
});

/// Rewrites `[URL](URL)` into `[ดูรายละเอียดเพิ่มเติม](URL)`.
///
/// Links whose label differs from their target are left alone.
pub fn clean_markdown_links(text: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut copied = 0;
    let mut from = 0;
    while let Some(caps) = URL_LINK_OPEN.captures_at(text, from) {
        let (Some(open), Some(label)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        // The target must be the label verbatim, closed by `)`. A URL may
        // itself contain parentheses.
        let Some(after) = text[open.end()..]
            .strip_prefix(label.as_str())
            .and_then(|rest| rest.strip_prefix(')'))
        else {
            // `[` is one byte; retry just past it.
            from = open.start() + 1;
            continue;
        };
        out.push_str(&text[copied..open.start()]);
        out.push_str(&format!("[{SEE_DETAILS_LABEL}]({})", label.as_str()));
        copied = text.len() - after.len();
        from = copied;
    }
    if copied == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

/// Normalizes numbered-list lines to `"<n>. <text>"`.
///
/// Only lines matching `^\d+\.?\s+.+` change; the line count never does.
pub fn ensure_proper_list_format(text: &str) -> String {
    text.split('\n')
        .map(|line| match LIST_LINE.captures(line) {
            Some(caps) => Cow::Owned(format!("{}. {}", &caps[1], &caps[2])),
            None => Cow::Borrowed(line),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Both transforms, in display order.
pub fn render_content(text: &str) -> String {
    ensure_proper_list_format(&clean_markdown_links(text))
}

/// What to show in place of a message's illustration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageView<'a> {
    /// No image chosen.
    Hidden,
    /// Image chosen, answer still arriving.
    Pending,
    /// Answer settled; show this file.
    Show(&'a str),
}

impl ImageView<'_> {
    /// Terminal-friendly one-liner, if anything should be shown.
    pub fn notice(&self) -> Option<Cow<'_, str>> {
        match self {
            ImageView::Hidden => None,
            ImageView::Pending => Some(Cow::Borrowed(IMAGE_PENDING_NOTICE)),
            ImageView::Show(file) => Some(Cow::Owned(format!("[รูปภาพประกอบ: {file}]"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_labelled_links_are_collapsed() {
        let text = "ดูที่ [https://www.kku.ac.th](https://www.kku.ac.th) ครับ";
        assert_eq!(
            clean_markdown_links(text),
            "ดูที่ [ดูรายละเอียดเพิ่มเติม](https://www.kku.ac.th) ครับ"
        );
    }

    #[test]
    fn urls_with_parentheses_are_collapsed() {
        let url = "https://en.wikipedia.org/wiki/Khon_Kaen_(city)";
        assert_eq!(
            clean_markdown_links(&format!("ดู [{url}]({url}) นะ")),
            format!("ดู [ดูรายละเอียดเพิ่มเติม]({url}) นะ")
        );
        // Target is the label plus more text before `)`: not the same link.
        let text = format!("[{url}]({url}_x)");
        assert_eq!(clean_markdown_links(&text), text);
    }

    #[test]
    fn link_inside_a_rejected_label_is_still_found() {
        assert_eq!(
            clean_markdown_links("[http://a [http://b](http://b)"),
            "[http://a [ดูรายละเอียดเพิ่มเติม](http://b)"
        );
    }

    #[test]
    fn other_links_are_untouched() {
        let text = "[KKU](https://www.kku.ac.th) and [https://a.th](https://b.th)";
        assert_eq!(clean_markdown_links(text), text);
    }

    #[test]
    fn link_cleanup_is_idempotent() {
        for text in [
            "",
            "[https://a.th](https://a.th)",
            "x [http://a.th/p?q=1](http://a.th/p?q=1) y [http://b](http://c)",
            "[ดูรายละเอียดเพิ่มเติม](https://a.th)",
            "[https://a.th](https://a.th)[https://a.th](https://a.th)",
            "[https://w.org/K_(city)](https://w.org/K_(city)) [https://w.org/(](https://w.org/()",
        ] {
            let once = clean_markdown_links(text).into_owned();
            assert_eq!(clean_markdown_links(&once), once, "{text}");
        }
    }

    #[test]
    fn list_lines_are_normalized() {
        let text = "หัวข้อ\n1 ข้อแรก\n2.   ข้อสอง\n3.ไม่มีช่องว่าง\n  4. indented";
        assert_eq!(
            ensure_proper_list_format(text),
            "หัวข้อ\n1. ข้อแรก\n2. ข้อสอง\n3.ไม่มีช่องว่าง\n  4. indented"
        );
    }

    #[test]
    fn list_format_keeps_line_count_and_is_idempotent() {
        for text in [
            "",
            "\n\n",
            "1.\n2. \n3.  x\r\n10 y",
            "1.5 kg\n2024 was fine\n- bullet",
            "a\n1   b\n\n",
        ] {
            let once = ensure_proper_list_format(text);
            assert_eq!(once.split('\n').count(), text.split('\n').count(), "{text:?}");
            assert_eq!(ensure_proper_list_format(&once), once, "{text:?}");
        }
    }

    #[test]
    fn non_matching_lines_are_byte_identical() {
        let text = "1.5 kg\n- bullet\n 1. leading space\n1.";
        assert_eq!(ensure_proper_list_format(text), text);
    }

    #[test]
    fn image_notice_per_state() {
        assert_eq!(ImageView::Hidden.notice(), None);
        assert_eq!(
            ImageView::Pending.notice().as_deref(),
            Some(IMAGE_PENDING_NOTICE)
        );
        assert!(ImageView::Show("a.png").notice().unwrap().contains("a.png"));
    }
}
