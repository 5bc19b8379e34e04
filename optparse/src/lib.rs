//! Declarative command-line option parsing.
//!
//! A caller describes its options once in an [`OptionTable`] whose entries
//! borrow the variables they fill in, then hands the table and the argument
//! vector to a [`Parser`]:
//!
//! - unique-prefix matching of long options (`--user` for `--username`)
//! - short-option clusters (`-vu alice`, `-ualice`)
//! - `--[no-]name` negation, `--name=value` inline values
//! - `--` terminator, optional stop at the first non-option
//! - aligned usage/help output, written on `-h`/`--help` and on every error
//!
//! ```no_run
//! use optparse::{Opt, OptionTable, Parser};
//!
//! let mut verbose = 0;
//! let mut username = None;
//! let mut argv: Vec<String> = std::env::args().skip(1).collect();
//! {
//!     let mut table = OptionTable::new()
//!         .option(Opt::switch("verbose", &mut verbose).short('v'))
//!         .option(Opt::string("username", &mut username).short('u'));
//!     Parser::new(&mut table, &["pk create [<options>]"]).parse(&mut argv);
//! }
//! println!("{} {:?} {:?}", verbose, username, argv);
//! ```

mod assign;
mod context;
mod error;
mod matcher;
mod option;
mod parser;
mod usage;

pub use context::ParserFlags;
pub use error::{report, Error, Result};
pub use option::{Opt, OptionKind, OptionTable, Slot};
pub use parser::{Parser, Termination, EXIT_USAGE};
pub use usage::{
    render_usage, write_help_column, write_usage, UsageConfig, DEFAULT_MAX_WIDTH,
    DEFAULT_USAGE_WIDTH,
};
