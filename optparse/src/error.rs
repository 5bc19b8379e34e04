use std::io::{self, Write};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("unknown switch '{0}'")]
    UnknownSwitch(char),

    #[error("unknown non-ascii option in string: '{0}'")]
    UnknownNonAscii(String),

    #[error("{0} requires a value")]
    RequiresValue(String),

    #[error("{0} takes no value")]
    TakesNoValue(String),

    #[error("{0} isn't available")]
    NotAvailable(String),

    #[error("ambiguous option: {} (could be {})", .token, join_candidates(.candidates))]
    Ambiguous {
        token: String,
        candidates: Vec<String>,
    },

    #[error("bad option table: {0}")]
    BadTable(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Render `a`, `b`, `c` as `--a, --b or --c`.
fn join_candidates(candidates: &[String]) -> String {
    let mut out = String::new();
    for (i, name) in candidates.iter().enumerate() {
        if i > 0 {
            out.push_str(if i + 1 == candidates.len() { " or " } else { ", " });
        }
        out.push_str("--");
        out.push_str(name);
    }
    out
}

/// Write one diagnostic line (`error: <message>`) to `err`.
pub fn report<W: Write + ?Sized>(err: &mut W, e: &Error) -> io::Result<()> {
    writeln!(err, "error: {}", e)
}
