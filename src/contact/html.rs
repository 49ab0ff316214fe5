//! HTML sanitization for free-text fields
//!
//! `sanitize_html` turns user text into a constrained markup fragment safe to embed
//! in an email body; `strip_html` turns that fragment back into plain text.

use regex::Regex;
use std::sync::OnceLock;

/// Marker that replaces line breaks in sanitized text
pub const LINE_BREAK: &str = "<br />";

const HEART: &str = "\u{2661}";
const ELLIPSIS: &str = "\u{2026}";
const LINK_TEXT_LIMIT: usize = 60;

const ALLOWED_TAGS: &[&str] = &["br", "b", "i", "em", "strong", "a", "iframe"];
const VOID_TAGS: &[&str] = &["br"];
const NON_TEXT_TAGS: &[&str] = &["style", "script", "textarea", "noscript"];
const IFRAME_HOSTS: &[&str] = &["www.youtube.com"];
const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto", "tel"];

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn newline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\r\n|\n\r|\r|\n")
}

fn whitespace_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\s{2,}")
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(
        &RE,
        concat!(
            r#"(?i)\b(?:(?:https?|ftp)://[^\s<>"']+|www\.[^\s<>"']+\.[^\s<>"']+|[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,})"#,
            r"|(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)\s?|\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
        ),
    )
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z][a-zA-Z0-9]{1,31});")
}

/// Sanitize free text into the allowed markup subset.
///
/// Steps run in order: keep `<3` as a heart, line breaks to `<br />`, collapse
/// whitespace runs, auto-link URLs and addresses, filter markup, trim.
pub fn sanitize_html(input: &str) -> String {
    let text = input.replace("<3", HEART);
    let text = newline_re().replace_all(&text, LINE_BREAK);
    let text = whitespace_run_re().replace_all(&text, " ");
    let text = autolink(&text);
    let text = filter_markup(&text);
    text.trim().to_string()
}

/// Plain-text rendering of sanitized markup: breaks become newlines, every tag is
/// dropped and entities are decoded.
pub fn strip_html(input: &str) -> String {
    let text = input.replace(LINE_BREAK, "\n");
    let mut out = String::with_capacity(text.len());
    let mut skip = SkipState::default();

    for token in tokenize(&text) {
        if skip.consume(&token) {
            continue;
        }
        if let Token::Text(t) = token {
            out.push_str(&decode_entities(t));
        }
    }
    out
}

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        raw: &'a str,
    },
    Close {
        name: String,
        raw: &'a str,
    },
    Comment(&'a str),
}

/// Split markup into text, tags and comments. Anything that does not form a
/// complete tag is text.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(offset) = input[pos..].find('<') else {
            tokens.push(Token::Text(&input[pos..]));
            break;
        };
        let start = pos + offset;
        if start > pos {
            tokens.push(Token::Text(&input[pos..start]));
        }

        match bytes.get(start + 1) {
            Some(b'!') | Some(b'?') => {
                let end = if input[start..].starts_with("<!--") {
                    input[start + 4..].find("-->").map(|i| start + 4 + i + 3)
                } else {
                    input[start..].find('>').map(|i| start + i + 1)
                };
                let end = end.unwrap_or(bytes.len());
                tokens.push(Token::Comment(&input[start..end]));
                pos = end;
            }
            Some(b'/') if bytes.get(start + 2).is_some_and(u8::is_ascii_alphabetic) => {
                let name_end = scan_name(bytes, start + 2);
                match input[name_end..].find('>') {
                    Some(i) => {
                        let end = name_end + i + 1;
                        tokens.push(Token::Close {
                            name: input[start + 2..name_end].to_ascii_lowercase(),
                            raw: &input[start..end],
                        });
                        pos = end;
                    }
                    None => {
                        tokens.push(Token::Text(&input[start..]));
                        pos = bytes.len();
                    }
                }
            }
            Some(c) if c.is_ascii_alphabetic() => match parse_open_tag(input, start) {
                Some((token, end)) => {
                    tokens.push(token);
                    pos = end;
                }
                None => {
                    tokens.push(Token::Text(&input[start..]));
                    pos = bytes.len();
                }
            },
            _ => {
                tokens.push(Token::Text(&input[start..start + 1]));
                pos = start + 1;
            }
        }
    }

    tokens
}

fn scan_name(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
        pos += 1;
    }
    pos
}

/// Parse `<name attr="v" ...>` starting at `start`; returns the token and the index
/// after `>`, or `None` when the tag never closes.
fn parse_open_tag(input: &str, start: usize) -> Option<(Token<'_>, usize)> {
    let bytes = input.as_bytes();
    let name_end = scan_name(bytes, start + 1);
    let name = input[start + 1..name_end].to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut self_closing = false;
    let mut pos = name_end;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos)? {
            b'>' => break,
            b'/' => {
                self_closing = bytes.get(pos + 1) == Some(&b'>');
                pos += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b'>' | b'/') && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let attr_name = input[attr_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let close = input[pos + 1..].find(*quote as char)?;
                    value = decode_entities(&input[pos + 1..pos + 1 + close]);
                    pos += close + 2;
                }
                _ => {
                    let value_start = pos;
                    while pos < bytes.len() && bytes[pos] != b'>' && !bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    value = decode_entities(&input[value_start..pos]);
                }
            }
        }
        if !attr_name.is_empty() {
            attrs.push((attr_name, value));
        }
    }

    let end = pos + 1;
    Some((
        Token::Open {
            name,
            attrs,
            self_closing,
            raw: &input[start..end],
        },
        end,
    ))
}

/// Tracks whether we are inside a tag whose content is dropped entirely
#[derive(Default)]
struct SkipState {
    tag: Option<String>,
    depth: usize,
}

impl SkipState {
    /// Returns true when `token` belongs to (or opens/closes) skipped content
    fn consume(&mut self, token: &Token<'_>) -> bool {
        if let Some(tag) = self.tag.clone() {
            match token {
                Token::Open { name, self_closing: false, .. } if *name == tag => self.depth += 1,
                Token::Close { name, .. } if *name == tag => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.tag = None;
                    }
                }
                _ => {}
            }
            return true;
        }

        match token {
            Token::Open { name, self_closing, .. } if NON_TEXT_TAGS.contains(&name.as_str()) => {
                if !*self_closing {
                    self.tag = Some(name.clone());
                    self.depth = 1;
                }
                true
            }
            Token::Close { name, .. } => NON_TEXT_TAGS.contains(&name.as_str()),
            _ => false,
        }
    }
}

/// Wrap bare URLs and email addresses in anchors, leaving existing markup and
/// anchor contents alone
fn autolink(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut anchor_depth = 0usize;

    for token in tokenize(input) {
        match token {
            Token::Text(t) if anchor_depth == 0 => out.push_str(&link_text(t)),
            Token::Text(raw) | Token::Comment(raw) => out.push_str(raw),
            Token::Open { name, self_closing, raw, .. } => {
                if name == "a" && !self_closing {
                    anchor_depth += 1;
                }
                out.push_str(raw);
            }
            Token::Close { name, raw } => {
                if name == "a" {
                    anchor_depth = anchor_depth.saturating_sub(1);
                }
                out.push_str(raw);
            }
        }
    }
    out
}

fn link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in link_re().find_iter(text) {
        let matched = trim_trailing_punctuation(m.as_str());
        if matched.is_empty() {
            continue;
        }
        let (href, display) = if matched.contains("://") || matched.to_ascii_lowercase().starts_with("www.") {
            let href = if matched.contains("://") {
                matched.to_string()
            } else {
                format!("http://{}", matched)
            };
            (href, display_url(matched))
        } else if matched.contains('@') {
            (format!("mailto:{}", matched), matched.to_string())
        } else {
            // Digits glued to a word or a longer number are not a phone number
            if text[..m.start()].chars().next_back().is_some_and(char::is_alphanumeric) {
                continue;
            }
            (phone_href(matched), matched.to_string())
        };
        out.push_str(&text[last..m.start()]);

        out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            href,
            truncate_middle(&display, LINK_TEXT_LIMIT)
        ));
        last = m.start() + matched.len();
    }
    out.push_str(&text[last..]);
    out
}

/// `tel:` target keeping only the leading `+` and the digits
fn phone_href(phone: &str) -> String {
    let mut href = String::from("tel:");
    if phone.starts_with('+') {
        href.push('+');
    }
    href.extend(phone.chars().filter(char::is_ascii_digit));
    href
}

/// Drop sentence punctuation that trails a URL; keep a closing paren only when balanced
fn trim_trailing_punctuation(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let trimmed = if trimmed.ends_with(')') && trimmed.matches('(').count() < trimmed.matches(')').count() {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

/// Visible link text: no scheme, no `www.`, no trailing slash
fn display_url(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let without_www = if without_scheme.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
        &without_scheme[4..]
    } else {
        without_scheme
    };
    without_www.strip_suffix('/').unwrap_or(without_www).to_string()
}

/// Shorten to `limit` characters by cutting from the middle, keeping the host-side
/// head slightly longer than the tail
fn truncate_middle(text: &str, limit: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return text.to_string();
    }
    let available = limit.saturating_sub(ELLIPSIS.chars().count());
    let head = available.div_ceil(2);
    let tail = available / 2;

    let mut out: String = chars[..head].iter().collect();
    out.push_str(ELLIPSIS);
    out.extend(&chars[chars.len() - tail..]);
    out
}

/// Keep only the allowed tag set; everything else is escaped or removed
fn filter_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut open: Vec<String> = Vec::new();
    let mut skip = SkipState::default();

    for token in tokenize(input) {
        if skip.consume(&token) {
            continue;
        }
        match token {
            Token::Text(t) => out.push_str(&escape_text(t)),
            Token::Comment(_) => {}
            Token::Open { name, attrs, raw, .. } => {
                if !ALLOWED_TAGS.contains(&name.as_str()) {
                    out.push_str(&escape_text_strict(raw));
                    continue;
                }
                out.push_str(&render_open_tag(&name, &attrs));
                if !VOID_TAGS.contains(&name.as_str()) {
                    open.push(name);
                }
            }
            Token::Close { name, raw } => {
                if !ALLOWED_TAGS.contains(&name.as_str()) {
                    out.push_str(&escape_text_strict(raw));
                    continue;
                }
                if let Some(index) = open.iter().rposition(|tag| *tag == name) {
                    for tag in open.drain(index..).rev() {
                        out.push_str(&format!("</{}>", tag));
                    }
                }
            }
        }
    }

    for tag in open.into_iter().rev() {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

fn render_open_tag(name: &str, attrs: &[(String, String)]) -> String {
    if VOID_TAGS.contains(&name) {
        return format!("<{} />", name);
    }

    let mut tag = format!("<{}", name);
    for (attr, value) in attrs {
        let keep = match (name, attr.as_str()) {
            ("a", "href") => is_allowed_url(value),
            ("iframe", "src") => is_allowed_url(value) && is_allowed_iframe_host(value),
            _ => false,
        };
        if keep {
            tag.push_str(&format!(" {}=\"{}\"", attr, escape_attr(value)));
        }
    }
    tag.push('>');
    tag
}

/// Relative URLs pass; absolute ones must use an allowed scheme
fn is_allowed_url(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    let scheme_end = compact.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if compact[i..].starts_with(':') => {
            let scheme = compact[..i].to_ascii_lowercase();
            URL_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

fn is_allowed_iframe_host(value: &str) -> bool {
    let value = value.trim();
    let rest = match value.split_once("//") {
        Some((scheme, rest)) if scheme.is_empty() || scheme.ends_with(':') => rest,
        _ => return false,
    };
    let host_end = rest.find(['/', '?', '#', ':']).unwrap_or(rest.len());
    let host = rest[..host_end].to_ascii_lowercase();
    IFRAME_HOSTS.contains(&host.as_str())
}

/// Escape `<` and `>`, and `&` unless it starts an entity
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if !entity_re().is_match(&text[i..]) => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape for display of rejected markup: every `&` is escaped too
fn escape_text_strict(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text_strict(value).replace('"', "&quot;")
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let decoded = entity_re().find(rest).and_then(|m| {
            let body = &rest[1..m.end() - 1];
            decode_entity(body).map(|c| (c, m.end()))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "hellip" => Some('\u{2026}'),
        _ => None,
    }
}
