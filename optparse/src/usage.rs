//! Usage/help rendering.
//!
//! Layout:
//!
//! ```text
//! usage: pk create <fields>
//!    or: pk create --db-path <file>
//!
//!     -u, --username <name>  identification used to login
//!     --[no-]confirm         ask before writing
//! ```
//!
//! Help text starts at `usage_width`; a left column reaching past it pushes
//! the help onto the next line. Help lines are word-wrapped so that no line
//! exceeds `max_width` where a space allows it.

use std::io::{self, Write};

use crate::option::{Opt, OptionTable};

pub const DEFAULT_USAGE_WIDTH: usize = 26;
pub const DEFAULT_MAX_WIDTH: usize = 79;

const USAGE_PREFIX: &str = "usage: ";
const OR_PREFIX: &str = "   or: ";
const INDENT: &str = "    ";
/// Narrowest help column before wrapping gives up on `max_width`.
const MIN_HELP_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageConfig {
    /// Column where help text starts.
    pub usage_width: usize,
    /// Line width help text is wrapped to.
    pub max_width: usize,
}

impl Default for UsageConfig {
    fn default() -> Self {
        UsageConfig {
            usage_width: DEFAULT_USAGE_WIDTH,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

impl UsageConfig {
    fn help_width(&self) -> usize {
        self.max_width
            .saturating_sub(self.usage_width)
            .max(MIN_HELP_WIDTH)
    }
}

/// Render the usage block: templates, then one line per option.
pub fn write_usage<W: Write + ?Sized>(
    out: &mut W,
    usages: &[&str],
    table: &OptionTable,
    config: &UsageConfig,
) -> io::Result<()> {
    let mut prefix = USAGE_PREFIX;
    for usage in usages {
        let lines: Vec<&str> = if usage.is_empty() {
            vec![""]
        } else {
            usage.lines().collect()
        };
        for (i, line) in lines.into_iter().enumerate() {
            if i == 0 {
                writeln!(out, "{}{}", prefix, line)?;
            } else {
                writeln!(out, "{:width$}{}", "", line, width = USAGE_PREFIX.len())?;
            }
        }
        prefix = OR_PREFIX;
    }

    let mut need_newline = true;
    for opt in table.entries() {
        if opt.is_group() {
            writeln!(out)?;
            need_newline = false;
            if !opt.description.is_empty() {
                writeln!(out, "{}", opt.description)?;
            }
            continue;
        }

        if need_newline {
            writeln!(out)?;
            need_newline = false;
        }

        let (left, positive) = option_left_column(opt);
        out.write_all(left.as_bytes())?;
        write_help_column(out, &opt.description, left.chars().count(), config)?;
        writeln!(out)?;

        // `no-x` declared without an `x` counterpart
        if let Some(positive) = positive {
            if !table.has_long(positive) {
                let left = format!("{}--{}", INDENT, positive);
                out.write_all(left.as_bytes())?;
                let help = format!("opposite of --no-{}", positive);
                write_help_column(out, &help, left.chars().count(), config)?;
                writeln!(out)?;
            }
        }
    }

    writeln!(out)
}

/// `write_usage` into a string.
pub fn render_usage(usages: &[&str], table: &OptionTable, config: &UsageConfig) -> String {
    let mut buf = Vec::new();
    // writing to a Vec cannot fail
    let _ = write_usage(&mut buf, usages, table, config);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Write `help` starting at the usage column, given that `pos` columns of
/// the current line are already used. No trailing newline is written.
pub fn write_help_column<W: Write + ?Sized>(
    out: &mut W,
    help: &str,
    pos: usize,
    config: &UsageConfig,
) -> io::Result<()> {
    let mut pos = pos;
    let mut first = true;
    for line in help.lines() {
        for piece in wrap_line(line, config.help_width()) {
            if !first {
                writeln!(out)?;
            }
            pad_usage(out, pos, config.usage_width)?;
            out.write_all(piece.as_bytes())?;
            pos = 0;
            first = false;
        }
    }
    Ok(())
}

fn pad_usage<W: Write + ?Sized>(out: &mut W, pos: usize, width: usize) -> io::Result<()> {
    if pos < width {
        write!(out, "{:pad$}", "", pad = width - pos)
    } else {
        write!(out, "\n{:pad$}", "", pad = width)
    }
}

/// Left column of an option line, plus the positive name of a negatable
/// option declared as `no-x`.
fn option_left_column<'o>(opt: &'o Opt) -> (String, Option<&'o str>) {
    let mut left = String::from(INDENT);
    let mut positive = None;

    if let Some(c) = opt.short_name {
        left.push('-');
        left.push(c);
    }
    if opt.short_name.is_some() && !opt.long_name.is_empty() {
        left.push_str(", ");
    }
    if !opt.long_name.is_empty() {
        if !opt.flags_negatable {
            left.push_str("--");
        } else if let Some(rest) = opt.long_name.strip_prefix("no-") {
            left.push_str("--");
            positive = Some(rest);
        } else {
            left.push_str("--[no-]");
        }
        left.push_str(&opt.long_name);
    }
    if opt.flags_raw_argh || !opt.flags_noarg {
        left.push_str(&format_argh(opt));
    }

    (left, positive)
}

fn format_argh(opt: &Opt) -> String {
    let argh = opt.arg_description.as_deref();
    let raw = opt.flags_raw_argh || argh.map_or(true, |a| a.contains(['(', ')', '<', '>', '[', ']', '|']));
    let argh = argh.unwrap_or("...");
    let has_long = !opt.long_name.is_empty();

    match (opt.flags_optional, has_long, raw) {
        (true, true, true) => format!("[={}]", argh),
        (true, true, false) => format!("[=<{}>]", argh),
        (true, false, true) => format!("[{}]", argh),
        (true, false, false) => format!("[<{}>]", argh),
        (false, _, true) => format!(" {}", argh),
        (false, _, false) => format!(" <{}>", argh),
    }
}

/// Split `line` at spaces so each piece fits `limit` characters. A word
/// longer than `limit` is left whole.
fn wrap_line(line: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;

    while rest.chars().count() > limit {
        let end = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(i, c)| i + c.len_utf8());
        let brk = match rest[..end].rfind(' ') {
            Some(pos) if pos > 0 => pos,
            _ => break,
        };
        pieces.push(rest[..brk].trim_end_matches(' '));
        rest = rest[brk..].trim_start_matches(' ');
    }

    if !rest.is_empty() || pieces.is_empty() {
        pieces.push(rest);
    }
    pieces
}
