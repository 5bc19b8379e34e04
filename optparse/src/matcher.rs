//! Resolution of option tokens against the table.

use log::{debug, trace};

use crate::assign::Form;
use crate::error::Error;
use crate::option::OptionTable;

#[derive(Debug)]
pub(crate) enum LongMatch {
    Found {
        index: usize,
        form: Form,
        inline: Option<String>,
    },
    Ambiguous(Error),
    Unknown,
}

/// Index of the option whose alias is `c`.
pub(crate) fn match_short(table: &OptionTable, c: char) -> Option<usize> {
    let found = table
        .entries()
        .iter()
        .position(|o| !o.is_group() && o.short_name == Some(c));
    trace!("-{} -> {:?}", c, found);
    found
}

/// Resolve the text after `--`, which may carry an `=value` suffix.
///
/// An exact name wins at once. Otherwise every option whose name (or, when
/// negatable, `no-` name) starts with the text is a candidate; one candidate
/// resolves, several are ambiguous.
pub(crate) fn match_long(table: &OptionTable, arg: &str) -> LongMatch {
    let (text, inline) = match arg.find('=') {
        Some(pos) => (&arg[..pos], Some(&arg[pos + 1..])),
        None => (arg, None),
    };
    // `--=value` names nothing
    if text.is_empty() {
        return LongMatch::Unknown;
    }
    let found = |index: usize, form: Form| LongMatch::Found {
        index,
        form,
        inline: inline.map(str::to_string),
    };

    let mut candidates: Vec<(usize, Form)> = Vec::new();

    for (idx, opt) in table.entries().iter().enumerate() {
        if opt.is_group() || opt.long_name.is_empty() {
            continue;
        }

        // `--x` on an option declared as `no-x` is its negation, unless `x`
        // is declared on its own.
        let mut name = opt.long_name.as_str();
        let mut declared_negative = false;
        if opt.flags_negatable && !text.starts_with("no-") {
            if let Some(positive) = name.strip_prefix("no-") {
                if !table.has_long(positive) {
                    name = positive;
                    declared_negative = true;
                }
            }
        }
        let form = |negated: bool| {
            if negated != declared_negative {
                Form::Negated
            } else {
                Form::Long
            }
        };

        if text == name {
            debug!("--{} matched exactly", opt.long_name);
            return found(idx, form(false));
        }
        if name.starts_with(text) {
            candidates.push((idx, form(false)));
            continue;
        }
        if !opt.flags_negatable {
            // resolved so the assigner can refuse it
            if text.strip_prefix("no-") == Some(name) {
                return found(idx, Form::Negated);
            }
            continue;
        }
        // `--n`, `--no`, `--no-` abbreviate every negated form
        if "no-".starts_with(text) {
            candidates.push((idx, form(true)));
            continue;
        }
        let Some(rest) = text.strip_prefix("no-") else {
            continue;
        };
        if rest == name {
            debug!("--{} matched exactly as negation", opt.long_name);
            return found(idx, form(true));
        }
        if name.starts_with(rest) {
            candidates.push((idx, form(true)));
        }
    }

    match candidates.as_slice() {
        [] => LongMatch::Unknown,
        [(idx, form)] => {
            debug!(
                "--{} abbreviates --{}",
                text,
                table.entries()[*idx].invoked_name(*form == Form::Negated)
            );
            found(*idx, *form)
        }
        _ => {
            let names = candidates
                .iter()
                .map(|&(idx, form)| table.entries()[idx].invoked_name(form == Form::Negated))
                .collect::<Vec<_>>();
            debug!("--{} is ambiguous between {:?}", text, names);
            LongMatch::Ambiguous(Error::Ambiguous {
                token: arg.to_string(),
                candidates: names,
            })
        }
    }
}
