use std::ops::BitOr;

/// Parser behaviour switches, combinable with `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserFlags(u32);

impl ParserFlags {
    pub const NONE: ParserFlags = ParserFlags(0);
    /// Copy the first argument to the output without examining it.
    pub const KEEP_ARGV0: ParserFlags = ParserFlags(1 << 0);
    /// Stop at the first non-option and leave it and the rest untouched.
    pub const STOP_AT_NON_OPTION: ParserFlags = ParserFlags(1 << 1);

    pub fn contains(self, other: ParserFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ParserFlags {
    type Output = ParserFlags;

    fn bitor(self, rhs: ParserFlags) -> ParserFlags {
        ParserFlags(self.0 | rhs.0)
    }
}

/// Cursor state for one parse invocation.
pub(crate) struct ParseContext {
    args: Vec<String>,
    next: usize,
    /// Tokens under parse, excluding a kept first argument.
    raw_count: usize,
    out: Vec<String>,
    pending: Option<String>,
    flags: ParserFlags,
}

impl ParseContext {
    pub(crate) fn new(args: Vec<String>, flags: ParserFlags) -> Self {
        let mut out = Vec::with_capacity(args.len());
        let mut next = 0;
        if flags.contains(ParserFlags::KEEP_ARGV0) {
            if let Some(first) = args.first() {
                out.push(first.clone());
                next = 1;
            }
        }

        ParseContext {
            raw_count: args.len() - next,
            args,
            next,
            out,
            pending: None,
            flags,
        }
    }

    pub(crate) fn flags(&self) -> ParserFlags {
        self.flags
    }

    pub(crate) fn raw_count(&self) -> usize {
        self.raw_count
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.args.get(self.next).map(String::as_str)
    }

    pub(crate) fn advance(&mut self) {
        if self.next < self.args.len() {
            self.next += 1;
        }
    }

    /// Consume the token after the current one as a value.
    pub(crate) fn take_following(&mut self) -> Option<String> {
        let value = self.args.get(self.next + 1)?.clone();
        self.next += 1;
        Some(value)
    }

    pub(crate) fn push_positional(&mut self, arg: String) {
        self.out.push(arg);
    }

    pub(crate) fn set_pending(&mut self, value: Option<String>) {
        debug_assert!(self.pending.is_none(), "pending value left unconsumed");
        self.pending = value;
    }

    pub(crate) fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Residual arguments: collected positionals, then every token from the
    /// cursor on.
    pub(crate) fn finish(self) -> Vec<String> {
        let mut out = self.out;
        out.extend(self.args.into_iter().skip(self.next));
        out
    }

    /// The argument vector as it was handed in.
    pub(crate) fn into_args(self) -> Vec<String> {
        self.args
    }
}
