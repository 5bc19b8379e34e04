//! The step driver and the `Parser` entry points.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use log::{debug, trace};

use crate::assign::{assign_value, Form};
use crate::context::{ParseContext, ParserFlags};
use crate::error::{report, Error};
use crate::matcher::{match_long, match_short, LongMatch};
use crate::option::OptionTable;
use crate::usage::{write_usage, UsageConfig};

/// Exit status for any fatal parse error.
pub const EXIT_USAGE: i32 = 129;

/// Outcome of examining one token.
#[derive(Debug)]
pub(crate) enum Step {
    Done,
    /// `--` consumed.
    Complete,
    /// Non-option reached with `STOP_AT_NON_OPTION`; left unconsumed.
    NonOption,
    Help,
    Unknown(Error),
    Failed(Error),
}

/// Why a parse ended without a residual vector.
#[derive(Debug)]
pub enum Termination {
    /// Usage was written to the output stream.
    Help,
    /// Diagnostic and usage were written to the error stream.
    Fatal(Error),
}

impl Termination {
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Help => 0,
            Termination::Fatal(_) => EXIT_USAGE,
        }
    }
}

impl From<Error> for Termination {
    fn from(e: Error) -> Self {
        Termination::Fatal(e)
    }
}

impl From<io::Error> for Termination {
    fn from(e: io::Error) -> Self {
        Termination::Fatal(Error::Io(e))
    }
}

pub struct Parser<'t, 'a> {
    table: &'t mut OptionTable<'a>,
    usages: &'t [&'t str],
    flags: ParserFlags,
    config: UsageConfig,
    prefix: Option<PathBuf>,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(table: &'t mut OptionTable<'a>, usages: &'t [&'t str]) -> Self {
        Parser {
            table,
            usages,
            flags: ParserFlags::NONE,
            config: UsageConfig::default(),
            prefix: None,
        }
    }

    pub fn flags(mut self, flags: ParserFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn usage_config(mut self, config: UsageConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory relative filename values are resolved against.
    pub fn prefix<P: Into<PathBuf>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Parse `argv`, writing matched values into the table's slots.
    ///
    /// On success `argv` is replaced by the residual arguments and their
    /// count is returned. On termination `argv` is left as it was handed in.
    pub fn try_parse<O, E>(
        &mut self,
        argv: &mut Vec<String>,
        out: &mut O,
        err: &mut E,
    ) -> Result<usize, Termination>
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        if let Err(e) = self.table.validate() {
            report(err, &e)?;
            return Err(Termination::Fatal(e));
        }

        let mut ctx = ParseContext::new(std::mem::take(argv), self.flags);

        while ctx.current().is_some() {
            let step = match self.step(&mut ctx, err) {
                Ok(step) => step,
                Err(e) => {
                    *argv = ctx.into_args();
                    return Err(e.into());
                }
            };
            trace!("step: {:?}", step);

            match step {
                Step::Done => ctx.advance(),
                Step::Complete | Step::NonOption => break,
                Step::Help => {
                    *argv = ctx.into_args();
                    write_usage(out, self.usages, self.table, &self.config)?;
                    return Err(Termination::Help);
                }
                Step::Unknown(e) | Step::Failed(e) => {
                    *argv = ctx.into_args();
                    write_usage(err, self.usages, self.table, &self.config)?;
                    return Err(Termination::Fatal(e));
                }
            }
        }

        *argv = ctx.finish();
        debug!("{} residual argument(s)", argv.len());
        Ok(argv.len())
    }

    /// `try_parse` against stdout/stderr; exits the process on termination.
    pub fn parse(&mut self, argv: &mut Vec<String>) -> usize {
        let mut out = io::stdout().lock();
        let mut err = io::stderr().lock();
        match self.try_parse(argv, &mut out, &mut err) {
            Ok(n) => n,
            Err(t) => {
                let _ = out.flush();
                let _ = err.flush();
                process::exit(t.exit_code())
            }
        }
    }

    /// Examine the token under the cursor. Diagnostics are reported to
    /// `err` before an error step is returned.
    fn step<E: Write + ?Sized>(&mut self, ctx: &mut ParseContext, err: &mut E) -> io::Result<Step> {
        let arg = match ctx.current() {
            Some(arg) => arg.to_string(),
            None => return Ok(Step::Complete),
        };

        if !arg.starts_with('-') || arg == "-" {
            if ctx.flags().contains(ParserFlags::STOP_AT_NON_OPTION) {
                debug!("stopping at non-option '{}'", arg);
                return Ok(Step::NonOption);
            }
            ctx.push_positional(arg);
            return Ok(Step::Done);
        }

        if ctx.raw_count() == 1 && arg == "-h" {
            return Ok(Step::Help);
        }

        if !arg[1..].starts_with('-') {
            return self.short_cluster(ctx, &arg, err);
        }

        if arg == "--" {
            debug!("terminator");
            ctx.advance();
            return Ok(Step::Complete);
        }

        if arg == "--help" {
            return Ok(Step::Help);
        }

        let rest = &arg[2..];
        match match_long(self.table, rest) {
            LongMatch::Found {
                index,
                form,
                inline,
            } => {
                ctx.set_pending(inline);
                let prefix = self.prefix.as_deref();
                let opt = self.table.entry_mut(index);
                Self::assigned(assign_value(ctx, opt, form, prefix), err)
            }
            LongMatch::Ambiguous(e) => {
                report(err, &e)?;
                Ok(Step::Failed(e))
            }
            LongMatch::Unknown => {
                let e = Error::UnknownOption(rest.to_string());
                report(err, &e)?;
                Ok(Step::Unknown(e))
            }
        }
    }

    /// `-abc`: every character is a switch until one takes a value, which
    /// then owns the rest of the cluster or the next token.
    fn short_cluster<E: Write + ?Sized>(
        &mut self,
        ctx: &mut ParseContext,
        arg: &str,
        err: &mut E,
    ) -> io::Result<Step> {
        let cluster = &arg[1..];

        for (pos, c) in cluster.char_indices() {
            let Some(index) = match_short(self.table, c) else {
                if c == 'h' {
                    return Ok(Step::Help);
                }
                let e = if c.is_ascii() {
                    Error::UnknownSwitch(c)
                } else {
                    Error::UnknownNonAscii(arg.to_string())
                };
                report(err, &e)?;
                return Ok(Step::Unknown(e));
            };

            let prefix = self.prefix.as_deref();
            let opt = self.table.entry_mut(index);
            if opt.takes_value() {
                let packed = &cluster[pos + c.len_utf8()..];
                if !packed.is_empty() {
                    ctx.set_pending(Some(packed.to_string()));
                }
                return Self::assigned(assign_value(ctx, opt, Form::Short, prefix), err);
            }

            if let Step::Failed(e) = Self::assigned(assign_value(ctx, opt, Form::Short, prefix), err)? {
                return Ok(Step::Failed(e));
            }
        }

        Ok(Step::Done)
    }

    fn assigned<E: Write + ?Sized>(result: Result<(), Error>, err: &mut E) -> io::Result<Step> {
        match result {
            Ok(()) => Ok(Step::Done),
            Err(e) => {
                report(err, &e)?;
                Ok(Step::Failed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::Opt;

    const USAGE: &[&str] = &["pk create [<options>]"];

    struct Slots {
        sitename: Option<String>,
        siteurl: Option<String>,
        username: Option<String>,
        password: Option<String>,
        comment: Option<String>,
        verbose: i32,
        all: i32,
        batch: bool,
        confirm: bool,
        format: Option<String>,
        db_path: Option<String>,
    }

    fn slots() -> Slots {
        Slots {
            sitename: None,
            siteurl: None,
            username: None,
            password: None,
            comment: None,
            verbose: 0,
            all: 0,
            batch: false,
            confirm: true,
            format: None,
            db_path: None,
        }
    }

    fn table(s: &mut Slots) -> OptionTable<'_> {
        OptionTable::new()
            .group("Record fields")
            .option(Opt::string("sitename", &mut s.sitename).arg_description("name"))
            .option(Opt::string("siteurl", &mut s.siteurl).arg_description("url"))
            .option(Opt::string("username", &mut s.username).short('u'))
            .option(Opt::string("password", &mut s.password).short('p'))
            .option(Opt::string("comment", &mut s.comment).negatable())
            .group("Options")
            .option(Opt::switch("verbose", &mut s.verbose).short('v'))
            .option(Opt::switch("all", &mut s.all).short('a'))
            .option(Opt::flag("batch", &mut s.batch).short('b'))
            .option(Opt::flag("confirm", &mut s.confirm).negatable())
            .option(
                Opt::string("format", &mut s.format)
                    .short('f')
                    .optional()
                    .default_val("plain"),
            )
            .option(Opt::filename("db-path", &mut s.db_path).short('d'))
    }

    struct Outcome {
        result: Result<usize, Termination>,
        argv: Vec<String>,
        out: String,
        err: String,
    }

    fn run_with(s: &mut Slots, flags: ParserFlags, args: &[&str]) -> Outcome {
        let mut table = table(s);
        let mut argv: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = Parser::new(&mut table, USAGE)
            .flags(flags)
            .prefix("/home/pk")
            .try_parse(&mut argv, &mut out, &mut err);
        Outcome {
            result,
            argv,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    fn run(s: &mut Slots, args: &[&str]) -> Outcome {
        run_with(s, ParserFlags::NONE, args)
    }

    fn fatal_message(o: &Outcome) -> String {
        match &o.result {
            Err(Termination::Fatal(e)) => e.to_string(),
            other => panic!("expected a fatal termination, got {:?}", other),
        }
    }

    #[test]
    fn empty_input() {
        let mut s = slots();
        let o = run(&mut s, &[]);
        assert_eq!(o.result.unwrap(), 0);
        assert!(o.argv.is_empty());
        assert_eq!(o.out, "");
        assert_eq!(o.err, "");
    }

    #[test]
    fn options_and_positionals_interleave() {
        let mut s = slots();
        let o = run(&mut s, &["a", "--sitename", "example", "b", "-v"]);
        assert_eq!(o.result.unwrap(), 2);
        assert_eq!(o.argv, vec!["a", "b"]);
        assert_eq!(s.sitename.as_deref(), Some("example"));
        assert_eq!(s.verbose, 1);
    }

    #[test]
    fn inline_value_equals_separate_value() {
        let mut inline = slots();
        let mut separate = slots();
        run(&mut inline, &["--sitename=example"]).result.unwrap();
        run(&mut separate, &["--sitename", "example"]).result.unwrap();
        assert_eq!(inline.sitename, separate.sitename);
        assert_eq!(inline.sitename.as_deref(), Some("example"));
    }

    #[test]
    fn unique_prefix_resolves() {
        let mut s = slots();
        run(&mut s, &["--user", "alice", "--siteu=https://example.org"])
            .result
            .unwrap();
        assert_eq!(s.username.as_deref(), Some("alice"));
        assert_eq!(s.siteurl.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn ambiguity_fails_without_writing() {
        let mut s = slots();
        let o = run(&mut s, &["--site", "x"]);
        assert_eq!(
            fatal_message(&o),
            "ambiguous option: site (could be --sitename or --siteurl)"
        );
        assert!(o
            .err
            .starts_with("error: ambiguous option: site (could be --sitename or --siteurl)\nusage: pk create"));
        assert_eq!(o.out, "");
        assert_eq!(o.argv, vec!["--site", "x"]);
        assert_eq!(s.sitename, None);
        assert_eq!(s.siteurl, None);
    }

    #[test]
    fn negatable_flag() {
        let mut s = slots();
        run(&mut s, &["--no-confirm"]).result.unwrap();
        assert!(!s.confirm);
        run(&mut s, &["--confirm"]).result.unwrap();
        assert!(s.confirm);
        let o = run(&mut s, &["--no-confirm=x"]);
        assert_eq!(fatal_message(&o), "option 'no-confirm' takes no value");
        assert!(s.confirm);
    }

    #[test]
    fn negated_string_clears() {
        let mut s = slots();
        run(&mut s, &["--comment", "old", "--no-comment"]).result.unwrap();
        assert_eq!(s.comment, None);
    }

    #[test]
    fn negation_not_available() {
        let mut s = slots();
        let o = run(&mut s, &["--no-sitename"]);
        assert_eq!(fatal_message(&o), "option 'no-sitename' isn't available");
        assert!(o.err.starts_with("error: option 'no-sitename' isn't available\n"));
    }

    #[test]
    fn cluster_with_trailing_value_option() {
        let mut s = slots();
        let o = run(&mut s, &["-vau", "alice", "rest"]);
        assert_eq!(o.result.unwrap(), 1);
        assert_eq!(o.argv, vec!["rest"]);
        assert_eq!(s.verbose, 1);
        assert_eq!(s.all, 1);
        assert_eq!(s.username.as_deref(), Some("alice"));
    }

    #[test]
    fn packed_short_value() {
        let mut s = slots();
        run(&mut s, &["-ualice", "-vbp=secret"]).result.unwrap();
        assert_eq!(s.username.as_deref(), Some("alice"));
        assert_eq!(s.password.as_deref(), Some("=secret"));
        assert!(s.batch);
        assert_eq!(s.verbose, 1);
    }

    #[test]
    fn short_value_missing() {
        let mut s = slots();
        let o = run(&mut s, &["-vu"]);
        assert_eq!(fatal_message(&o), "switch 'u' requires a value");
        assert_eq!(s.verbose, 1);
    }

    #[test]
    fn long_value_missing() {
        let mut s = slots();
        let o = run(&mut s, &["--sitename"]);
        assert_eq!(fatal_message(&o), "option 'sitename' requires a value");
        assert_eq!(o.result.unwrap_err().exit_code(), EXIT_USAGE);
    }

    #[test]
    fn switch_rejects_inline_value() {
        let mut s = slots();
        let o = run(&mut s, &["--verbose=1"]);
        assert_eq!(fatal_message(&o), "option 'verbose' takes no value");
        assert_eq!(s.verbose, 0);
    }

    #[test]
    fn terminator_makes_rest_positional() {
        let mut s = slots();
        let o = run(&mut s, &["x", "--", "-v", "--sitename", "--"]);
        assert_eq!(o.result.unwrap(), 4);
        assert_eq!(o.argv, vec!["x", "-v", "--sitename", "--"]);
        assert_eq!(s.verbose, 0);
        assert_eq!(s.sitename, None);
    }

    #[test]
    fn lone_dash_is_positional() {
        let mut s = slots();
        let o = run(&mut s, &["-", "-v"]);
        assert_eq!(o.argv, vec!["-"]);
        assert_eq!(s.verbose, 1);
    }

    #[test]
    fn stop_at_non_option() {
        let mut s = slots();
        let o = run_with(&mut s, ParserFlags::STOP_AT_NON_OPTION, &["-v", "cmd", "-a"]);
        assert_eq!(o.result.unwrap(), 2);
        assert_eq!(o.argv, vec!["cmd", "-a"]);
        assert_eq!(s.verbose, 1);
        assert_eq!(s.all, 0);
    }

    #[test]
    fn keep_argv0() {
        let mut s = slots();
        let o = run_with(&mut s, ParserFlags::KEEP_ARGV0, &["-a", "-v", "x"]);
        assert_eq!(o.argv, vec!["-a", "x"]);
        assert_eq!(s.all, 0);
        assert_eq!(s.verbose, 1);
    }

    #[test]
    fn keep_argv0_with_stop() {
        let mut s = slots();
        let flags = ParserFlags::KEEP_ARGV0 | ParserFlags::STOP_AT_NON_OPTION;
        let o = run_with(&mut s, flags, &["pk", "create", "-v"]);
        assert_eq!(o.result.unwrap(), 3);
        assert_eq!(o.argv, vec!["pk", "create", "-v"]);
        assert_eq!(s.verbose, 0);
    }

    #[test]
    fn last_write_wins() {
        let mut s = slots();
        run(&mut s, &["-u", "a", "--username=b", "-uc"]).result.unwrap();
        assert_eq!(s.username.as_deref(), Some("c"));
    }

    #[test]
    fn optional_argument() {
        let mut s = slots();
        run(&mut s, &["--format"]).result.unwrap();
        assert_eq!(s.format.as_deref(), Some("plain"));
        run(&mut s, &["--format=json"]).result.unwrap();
        assert_eq!(s.format.as_deref(), Some("json"));
        run(&mut s, &["-fcsv"]).result.unwrap();
        assert_eq!(s.format.as_deref(), Some("csv"));
        let o = run(&mut s, &["--format", "json"]);
        assert_eq!(o.argv, vec!["json"]);
        assert_eq!(s.format.as_deref(), Some("plain"));
    }

    #[test]
    fn filename_is_prefixed() {
        let mut s = slots();
        run(&mut s, &["-d", "creds.db"]).result.unwrap();
        assert_eq!(s.db_path.as_deref(), Some("/home/pk/creds.db"));
        run(&mut s, &["--db-path=-"]).result.unwrap();
        assert_eq!(s.db_path.as_deref(), Some("-"));
    }

    #[test]
    fn help_requests() {
        for args in [&["-h"][..], &["--help"], &["-v", "--help"], &["-vh"]] {
            let mut s = slots();
            let o = run(&mut s, args);
            assert!(matches!(o.result, Err(Termination::Help)), "{:?}", args);
            assert!(o.out.starts_with("usage: pk create [<options>]\n\nRecord fields\n"));
            assert!(o.out.ends_with("\n\n"));
            assert_eq!(o.err, "");
            assert_eq!(o.argv, args.to_vec());
        }
        assert_eq!(Termination::Help.exit_code(), 0);
    }

    #[test]
    fn lone_dash_h_wins_over_declared_switch() {
        let mut host = None;
        let mut table = OptionTable::new().option(Opt::string("host", &mut host).short('h'));
        let mut argv = vec!["-h".to_string()];
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = Parser::new(&mut table, USAGE).try_parse(&mut argv, &mut out, &mut err);
        assert!(matches!(result, Err(Termination::Help)));

        let mut argv = vec!["-h".to_string(), "example.org".to_string()];
        let result = Parser::new(&mut table, USAGE).try_parse(&mut argv, &mut out, &mut err);
        assert_eq!(result.unwrap(), 0);
        drop(table);
        assert_eq!(host.as_deref(), Some("example.org"));
    }

    #[test]
    fn unknown_long_option() {
        let mut s = slots();
        let o = run(&mut s, &["-v", "--bogus=1"]);
        assert_eq!(fatal_message(&o), "unknown option 'bogus=1'");
        assert!(o.err.starts_with("error: unknown option 'bogus=1'\nusage: pk create [<options>]\n"));
        assert_eq!(o.out, "");
        assert_eq!(o.argv, vec!["-v", "--bogus=1"]);
    }

    #[test]
    fn unknown_switch() {
        let mut s = slots();
        let o = run(&mut s, &["-vx"]);
        assert_eq!(fatal_message(&o), "unknown switch 'x'");
        assert!(o.err.starts_with("error: unknown switch 'x'\n"));
    }

    #[test]
    fn unknown_non_ascii_switch() {
        let mut s = slots();
        let o = run(&mut s, &["-vé"]);
        assert_eq!(fatal_message(&o), "unknown non-ascii option in string: '-vé'");
    }

    #[test]
    fn bad_table_is_reported_before_parsing() {
        let mut a = None;
        let mut b = None;
        let mut table = OptionTable::new()
            .option(Opt::string("username", &mut a).short('u'))
            .option(Opt::string("url", &mut b).short('u'));
        let mut argv = vec!["-u".to_string(), "x".to_string()];
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = Parser::new(&mut table, USAGE).try_parse(&mut argv, &mut out, &mut err);
        assert!(matches!(result, Err(Termination::Fatal(Error::BadTable(_)))));
        assert_eq!(argv, vec!["-u", "x"]);
        assert!(String::from_utf8(err).unwrap().starts_with("error: bad option table: "));
    }

    #[test]
    fn empty_long_name_is_unknown() {
        let mut sitename = None;
        let mut table = OptionTable::new().option(Opt::string("sitename", &mut sitename));
        let mut argv = vec!["--=evil".to_string()];
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = Parser::new(&mut table, USAGE).try_parse(&mut argv, &mut out, &mut err);
        assert!(matches!(result, Err(Termination::Fatal(Error::UnknownOption(ref n))) if n == "=evil"));
        assert!(String::from_utf8(err).unwrap().starts_with("error: unknown option '=evil'\n"));
        drop(table);
        assert_eq!(sitename, None);

        let mut s = slots();
        let o = run(&mut s, &["--=x"]);
        assert_eq!(fatal_message(&o), "unknown option '=x'");
        assert_eq!(s.sitename, None);
        assert_eq!(s.siteurl, None);
    }
}
