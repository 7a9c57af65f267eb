//! Route table entity - the shared reverse-proxy document as structured blocks
//!
//! The routing document is a Caddyfile shared by every application on the
//! host. It is parsed into top-level blocks (global options, snippets, sites)
//! and each block keeps its exact source text, so a mutation touches only the
//! block it targets and every other block is re-emitted byte-for-byte.
//!
//! A domain that appears in two site blocks (or twice in one header) makes the
//! document unusable: parsing fails instead of guessing which one is meant.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::value_objects::DomainName;

/// Directive that carries a site's upstream.
const PROXY_DIRECTIVE: &str = "reverse_proxy";

/// Problems found in the routing document itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("routing document is malformed at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("domain '{domain}' is routed twice (lines {first_line} and {second_line})")]
    DuplicateDomain {
        domain: String,
        first_line: usize,
        second_line: usize,
    },

    #[error("routing document is not valid UTF-8 at line {line}")]
    NotUtf8 { line: usize },

    #[error("domain '{domain}' shares a site block with {others:?}; edit that block by hand")]
    SharedBlock { domain: String, others: Vec<String> },
}

/// What a mutation did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChange {
    Added,
    Updated { previous: Option<String> },
    Removed { previous: Option<String> },
    Unchanged,
}

impl RouteChange {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RouteChange::Unchanged)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RouteChange::Added => "added",
            RouteChange::Updated { .. } => "updated",
            RouteChange::Removed { .. } => "removed",
            RouteChange::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlockKind {
    Global,
    Snippet,
    Site { addresses: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    /// Whitespace and comments preceding the block
    lead: String,
    /// From the first header character through the closing brace
    body: String,
    line: usize,
    kind: BlockKind,
}

impl Block {
    fn raw_len(&self) -> usize {
        self.lead.len() + self.body.len()
    }

    fn addresses(&self) -> &[String] {
        match &self.kind {
            BlockKind::Site { addresses } => addresses,
            _ => &[],
        }
    }

    fn upstream(&self) -> Option<String> {
        proxy_line(&self.body).map(|(_, upstream)| upstream)
    }
}

/// Parsed routing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    blocks: Vec<Block>,
    trailing: String,
}

impl RouteTable {
    /// An empty document.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            trailing: String::new(),
        }
    }

    /// A fresh document carrying only a global options block with the ACME contact.
    pub fn with_acme_email(email: &str) -> Self {
        let mut table = Self::new();
        table.blocks.push(Block {
            lead: String::new(),
            body: format!("{{\n\temail {}\n}}", email),
            line: 1,
            kind: BlockKind::Global,
        });
        table.trailing = "\n".to_string();
        table
    }

    /// Parse a document, rejecting unbalanced braces and duplicate domains.
    pub fn parse(text: &str) -> Result<Self, RouteTableError> {
        let blocks = split_blocks(text)?;
        let consumed: usize = blocks.iter().map(Block::raw_len).sum();
        let table = Self {
            blocks,
            trailing: text[consumed..].to_string(),
        };
        table.check_duplicates()?;
        Ok(table)
    }

    /// Render back to text. Untouched blocks come out exactly as parsed.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.blocks.iter().map(Block::raw_len).sum::<usize>() + self.trailing.len(),
        );
        for block in &self.blocks {
            out.push_str(&block.lead);
            out.push_str(&block.body);
        }
        out.push_str(&self.trailing);
        out
    }

    /// Domains with a site block, in document order.
    pub fn domains(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|b| b.addresses().iter().map(String::as_str))
            .collect()
    }

    pub fn contains(&self, domain: &DomainName) -> bool {
        self.find(domain).is_some()
    }

    /// Upstream of the site block for `domain`, if that block proxies anywhere.
    pub fn upstream(&self, domain: &DomainName) -> Option<String> {
        self.find(domain).and_then(|i| self.blocks[i].upstream())
    }

    /// Point `domain` at `upstream`, appending a block if none exists.
    pub fn upsert(
        &mut self,
        domain: &DomainName,
        upstream: &str,
    ) -> Result<RouteChange, RouteTableError> {
        let Some(index) = self.find(domain) else {
            self.append(render_site(domain, upstream));
            return Ok(RouteChange::Added);
        };

        self.ensure_exclusive(index, domain)?;

        let block = &mut self.blocks[index];
        let previous = block.upstream();
        if previous.as_deref() == Some(upstream) {
            return Ok(RouteChange::Unchanged);
        }

        block.body = match proxy_line(&block.body) {
            // Keep hand-added directives; only the upstream changes.
            Some((range, _)) => {
                let line = &block.body[range.clone()];
                let indent_len = line.len() - line.trim_start().len();
                let mut body = String::with_capacity(block.body.len());
                body.push_str(&block.body[..range.start]);
                body.push_str(&line[..indent_len]);
                body.push_str(PROXY_DIRECTIVE);
                body.push(' ');
                body.push_str(upstream);
                body.push_str(&block.body[range.end..]);
                body
            }
            None => render_site(domain, upstream),
        };

        Ok(RouteChange::Updated { previous })
    }

    /// Drop the site block for `domain`; absence is not an error.
    pub fn remove(&mut self, domain: &DomainName) -> Result<RouteChange, RouteTableError> {
        let Some(index) = self.find(domain) else {
            return Ok(RouteChange::Unchanged);
        };

        self.ensure_exclusive(index, domain)?;

        let removed = self.blocks.remove(index);
        if index == 0 {
            if let Some(first) = self.blocks.first_mut() {
                first.lead = first.lead.trim_start_matches(['\n', '\r']).to_string();
            } else if self.trailing.trim().is_empty() {
                self.trailing.clear();
            }
        }

        Ok(RouteChange::Removed {
            previous: removed.upstream(),
        })
    }

    fn find(&self, domain: &DomainName) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.addresses().iter().any(|a| a == domain.as_str()))
    }

    fn ensure_exclusive(&self, index: usize, domain: &DomainName) -> Result<(), RouteTableError> {
        let addresses = self.blocks[index].addresses();
        if addresses.len() > 1 {
            return Err(RouteTableError::SharedBlock {
                domain: domain.to_string(),
                others: addresses
                    .iter()
                    .filter(|a| a.as_str() != domain.as_str())
                    .cloned()
                    .collect(),
            });
        }
        Ok(())
    }

    fn append(&mut self, body: String) {
        let pending = std::mem::take(&mut self.trailing);
        let pending = pending.trim_end();
        let lead = if self.blocks.is_empty() && pending.is_empty() {
            String::new()
        } else if pending.is_empty() {
            "\n\n".to_string()
        } else {
            format!("{}\n\n", pending)
        };

        let line = self.render().lines().count() + lead.matches('\n').count();
        self.blocks.push(Block {
            lead,
            kind: BlockKind::Site {
                addresses: vec![site_key(body.split_whitespace().next().unwrap_or_default())],
            },
            body,
            line,
        });
        self.trailing = "\n".to_string();
    }

    fn check_duplicates(&self) -> Result<(), RouteTableError> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for block in &self.blocks {
            for address in block.addresses() {
                if let Some(first_line) = seen.insert(address.as_str(), block.line) {
                    return Err(RouteTableError::DuplicateDomain {
                        domain: address.clone(),
                        first_line,
                        second_line: block.line,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

fn render_site(domain: &DomainName, upstream: &str) -> String {
    format!("{} {{\n\t{} {}\n}}", domain, PROXY_DIRECTIVE, upstream)
}

/// Normalize a site address to its bare lowercase host.
fn site_key(address: &str) -> String {
    let host = address
        .strip_prefix("https://")
        .or_else(|| address.strip_prefix("http://"))
        .unwrap_or(address);
    let host = host.split('/').next().unwrap_or(host);
    let host = match host.rsplit_once(':') {
        Some((h, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Locate the single-line `reverse_proxy <upstream>` directive of a site body.
///
/// Only depth-1 lines count, and a directive that opens its own sub-block is
/// not treated as editable.
fn proxy_line(body: &str) -> Option<(std::ops::Range<usize>, String)> {
    let mut depth = 0usize;
    let mut offset = 0usize;
    for line in body.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);
        let code = strip_comment(content);
        let (opens, closes) = count_braces(code);

        if depth == 1 {
            let mut tokens = code.split_whitespace();
            if tokens.next() == Some(PROXY_DIRECTIVE) {
                let rest: Vec<&str> = tokens.collect();
                if !rest.is_empty() && rest.last() != Some(&"{") {
                    return Some((start..start + content.len(), rest.join(" ")));
                }
            }
        }

        depth = (depth + opens).saturating_sub(closes);
    }
    None
}

fn strip_comment(line: &str) -> &str {
    let mut prev_ws = true;
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if c == '#' && prev_ws => return &line[..i],
            None => {}
        }
        prev_ws = c.is_whitespace();
    }
    line
}

/// Count braces outside quoted strings.
fn count_braces(code: &str) -> (usize, usize) {
    let mut quote: Option<char> = None;
    let (mut opens, mut closes) = (0, 0);
    for c in code.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if c == '{' => opens += 1,
            None if c == '}' => closes += 1,
            None => {}
        }
    }
    (opens, closes)
}

fn classify(header: &str) -> BlockKind {
    let tokens: Vec<&str> = header
        .lines()
        .map(strip_comment)
        .flat_map(|l| l.split(|c: char| c.is_whitespace() || c == ','))
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.first() {
        None => BlockKind::Global,
        Some(t) if t.starts_with('(') => BlockKind::Snippet,
        Some(_) => BlockKind::Site {
            addresses: tokens.iter().map(|t| site_key(t)).collect(),
        },
    }
}

/// Split a document into top-level blocks.
///
/// A `{` opens a block only when it stands alone as a token, so placeholders
/// such as `{$DOMAIN}` in a site header stay part of the header.
fn split_blocks(text: &str) -> Result<Vec<Block>, RouteTableError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    let mut blocks = Vec::new();
    let mut segment_start = 0usize;
    let mut header_start: Option<(usize, usize)> = None;
    let mut header_braces = 0usize;
    let mut open_at = 0usize;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut line = 1usize;
    let mut prev: Option<char> = None;
    let mut skip_next = false;

    for (i, &(idx, c)) in chars.iter().enumerate() {
        let next = chars.get(i + 1).map(|&(_, n)| n);

        if skip_next {
            skip_next = false;
            prev = Some(c);
            continue;
        }

        if c == '\n' {
            line += 1;
            in_comment = false;
            prev = Some(c);
            continue;
        }
        if in_comment {
            prev = Some(c);
            continue;
        }
        if let Some(q) = quote {
            if c == q && prev != Some('\\') {
                quote = None;
            }
            prev = Some(c);
            continue;
        }

        match c {
            '#' if prev.map_or(true, char::is_whitespace) => in_comment = true,
            '"' | '`' => {
                quote = Some(c);
                if depth == 0 && header_start.is_none() {
                    header_start = Some((idx, line));
                }
            }
            // `site {}`: a block without directives
            '{' if depth == 0
                && header_braces == 0
                && next == Some('}')
                && prev.map_or(true, char::is_whitespace)
                && chars
                    .get(i + 2)
                    .map_or(true, |&(_, after)| after.is_whitespace()) =>
            {
                let (start, start_line) = header_start.take().unwrap_or((idx, line));
                let end = idx + 2;
                blocks.push(Block {
                    lead: text[segment_start..start].to_string(),
                    body: text[start..end].to_string(),
                    line: start_line,
                    kind: classify(&text[start..idx]),
                });
                segment_start = end;
                skip_next = true;
            }
            '{' if depth == 0 => {
                let standalone = prev.map_or(true, char::is_whitespace)
                    && next.map_or(true, char::is_whitespace);
                if standalone && header_braces == 0 {
                    depth = 1;
                    open_at = idx;
                    if header_start.is_none() {
                        header_start = Some((idx, line));
                    }
                } else {
                    header_braces += 1;
                    if header_start.is_none() {
                        header_start = Some((idx, line));
                    }
                }
            }
            '{' => depth += 1,
            '}' if depth == 0 => {
                if header_braces == 0 {
                    return Err(RouteTableError::Malformed {
                        line,
                        message: "unexpected '}'".to_string(),
                    });
                }
                header_braces -= 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let (start, start_line) = header_start.take().unwrap_or((open_at, line));
                    let end = idx + c.len_utf8();
                    blocks.push(Block {
                        lead: text[segment_start..start].to_string(),
                        body: text[start..end].to_string(),
                        line: start_line,
                        kind: classify(&text[start..open_at]),
                    });
                    segment_start = end;
                }
            }
            c if c.is_whitespace() => {}
            _ => {
                if depth == 0 && header_start.is_none() {
                    header_start = Some((idx, line));
                }
            }
        }
        prev = Some(c);
    }

    if quote.is_some() {
        return Err(RouteTableError::Malformed {
            line,
            message: "unterminated quoted string".to_string(),
        });
    }
    if depth > 0 {
        return Err(RouteTableError::Malformed {
            line: header_start.map(|(_, l)| l).unwrap_or(line),
            message: "block is never closed".to_string(),
        });
    }
    if let Some((_, start_line)) = header_start {
        return Err(RouteTableError::Malformed {
            line: start_line,
            message: "site address without a block".to_string(),
        });
    }

    Ok(blocks)
}
