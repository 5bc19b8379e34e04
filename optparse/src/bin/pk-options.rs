//! Parses its arguments against the PassKeeper `create` record table and
//! prints what landed in each field, followed by the residual arguments.
//!
//! `RUST_LOG=debug` shows how each token was resolved.
//! `OPTPARSE_USAGE_WIDTH` moves the help column.

use std::env;

use env_logger::Builder;
use log::{warn, LevelFilter};

use optparse::{Opt, OptionTable, Parser, UsageConfig};

const USAGES: &[&str] = &[
    "pk-options <fields> [<options>] [--] [<args>...]",
    "pk-options --sitename <name> --username <name>\n--password <pwd>",
];

#[derive(Debug, Default)]
struct Record {
    sitename: Option<String>,
    siteurl: Option<String>,
    username: Option<String>,
    password: Option<String>,
    authtext: Option<String>,
    bakcode: Option<String>,
    comment: Option<String>,
}

#[derive(Debug)]
struct Settings {
    verbose: i32,
    confirm: bool,
    db_path: Option<String>,
    format: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: 0,
            confirm: true,
            db_path: None,
            format: None,
        }
    }
}

fn build_table<'a>(record: &'a mut Record, settings: &'a mut Settings) -> OptionTable<'a> {
    OptionTable::new()
        .group("Record fields")
        .option(
            Opt::string("sitename", &mut record.sitename)
                .arg_description("name")
                .description("human readable name of a website"),
        )
        .option(
            Opt::string("siteurl", &mut record.siteurl)
                .arg_description("url")
                .description("url that used for disambiguation"),
        )
        .option(
            Opt::string("username", &mut record.username)
                .short('u')
                .arg_description("name")
                .description("identification that can be used to login"),
        )
        .option(
            Opt::string("password", &mut record.password)
                .short('p')
                .arg_description("pwd")
                .description("secret phrase that can be used to login"),
        )
        .option(
            Opt::string("authtext", &mut record.authtext)
                .arg_description("ans")
                .description("predefined question selected during account creation"),
        )
        .option(
            Opt::string("bakcode", &mut record.bakcode)
                .arg_description("code")
                .description("backup code used for account recovery purposes"),
        )
        .option(
            Opt::string("comment", &mut record.comment)
                .negatable()
                .arg_description("text")
                .description("free-form note kept with the record"),
        )
        .group("Options")
        .option(
            Opt::switch("verbose", &mut settings.verbose)
                .short('v')
                .description("be verbose"),
        )
        .option(
            Opt::flag("confirm", &mut settings.confirm)
                .negatable()
                .description("ask before writing the record"),
        )
        .option(
            Opt::filename("db-path", &mut settings.db_path)
                .short('d')
                .arg_description("file")
                .description("credential database, relative to the working directory"),
        )
        .option(
            Opt::string("format", &mut settings.format)
                .optional()
                .default_val("plain")
                .arg_description("fmt")
                .description("output format\n(plain when given without a value)"),
        )
}

fn init_logging() {
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn usage_config() -> UsageConfig {
    let mut config = UsageConfig::default();
    if let Ok(width) = env::var("OPTPARSE_USAGE_WIDTH") {
        match width.parse() {
            Ok(w) => config.usage_width = w,
            Err(_) => warn!("ignoring OPTPARSE_USAGE_WIDTH={:?}", width),
        }
    }
    config
}

fn field(name: &str, value: &Option<String>) {
    println!("{}: {}", name, value.as_deref().unwrap_or("(null)"));
}

fn main() {
    init_logging();

    let mut argv: Vec<String> = env::args().skip(1).collect();
    let mut record = Record::default();
    let mut settings = Settings::default();

    let argc = {
        let mut table = build_table(&mut record, &mut settings);
        let mut parser = Parser::new(&mut table, USAGES).usage_config(usage_config());
        match env::current_dir() {
            Ok(dir) => parser = parser.prefix(dir),
            Err(e) => warn!("no working directory, filenames stay relative: {}", e),
        }
        parser.parse(&mut argv)
    };

    field("sitename", &record.sitename);
    field("siteurl", &record.siteurl);
    field("username", &record.username);
    field("password", &record.password);
    field("authtext", &record.authtext);
    field("bakcode", &record.bakcode);
    field("comment", &record.comment);
    println!("verbose: {}", settings.verbose);
    println!("confirm: {}", settings.confirm);
    field("db-path", &settings.db_path);
    field("format", &settings.format);

    println!("argc: {}", argc);
    for (i, arg) in argv.iter().enumerate() {
        println!("argv[{}]: {}", i, arg);
    }
}
