use std::path::Path;

use log::debug;

use crate::context::ParseContext;
use crate::error::{Error, Result};
use crate::option::{Opt, OptionKind, Slot};

/// How a resolved option was spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    Long,
    Short,
    Negated,
}

/// The option as invoked, for diagnostics: `switch 'c'`, `option 'name'`
/// or `option 'no-name'`.
pub(crate) fn detailed_option(opt: &Opt, form: Form) -> String {
    match (form, opt.short_name) {
        (Form::Short, Some(c)) => format!("switch '{}'", c),
        (Form::Negated, _) => format!("option '{}'", opt.invoked_name(true)),
        _ => format!("option '{}'", opt.long_name),
    }
}

/// Validate the invocation of `opt` and write its slot.
///
/// A string value comes from the pending inline value first, then from the
/// next whole token. Nothing is written when an error is returned.
pub(crate) fn assign_value(
    ctx: &mut ParseContext,
    opt: &mut Opt,
    form: Form,
    prefix: Option<&Path>,
) -> Result<()> {
    let negated = form == Form::Negated;

    if negated && ctx.has_pending() {
        return Err(Error::TakesNoValue(detailed_option(opt, form)));
    }
    if negated && !opt.flags_negatable {
        return Err(Error::NotAvailable(detailed_option(opt, form)));
    }
    if form != Form::Short && ctx.has_pending() && opt.flags_noarg {
        return Err(Error::TakesNoValue(detailed_option(opt, form)));
    }

    let value = if opt.takes_value() && !negated {
        string_value(ctx, opt, form)?
    } else {
        None
    };
    let value = if opt.kind == OptionKind::Filename {
        value.map(|v| fix_filename(prefix, v))
    } else {
        value
    };

    debug!("{} = {:?}", detailed_option(opt, form), value);

    let on_value = opt.on_value;
    match opt.slot.as_mut() {
        Some(Slot::Switch(v)) => **v = if negated { 0 } else { on_value },
        Some(Slot::Flag(b)) => **b = !negated,
        Some(Slot::Str(s)) => **s = value,
        // groups never resolve
        None => {}
    }

    Ok(())
}

fn string_value(ctx: &mut ParseContext, opt: &Opt, form: Form) -> Result<Option<String>> {
    if let Some(v) = ctx.take_pending() {
        return Ok(Some(v));
    }
    if opt.flags_optional {
        return Ok(opt.default_value.clone());
    }
    match ctx.take_following() {
        Some(v) => Ok(Some(v)),
        None => Err(Error::RequiresValue(detailed_option(opt, form))),
    }
}

/// Resolve a relative path against the caller's working directory.
fn fix_filename(prefix: Option<&Path>, value: String) -> String {
    match prefix {
        Some(prefix) if value != "-" && Path::new(&value).is_relative() => {
            prefix.join(&value).to_string_lossy().into_owned()
        }
        _ => value,
    }
}
