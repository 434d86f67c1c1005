/// Log tags identifying which subsystem produced a message
///
/// Each tag maps to a `--debug-<tag>` command-line flag so diagnostic output
/// can be enabled per module without flooding the console.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    Fleet,
    Funding,
    Worker,
    Pool,
    Quote,
    Wallet,
    Ledger,
    System,
}

impl LogTag {
    /// Plain uppercase name used in file logs (no colors)
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::Fleet => "FLEET",
            LogTag::Funding => "FUNDING",
            LogTag::Worker => "WORKER",
            LogTag::Pool => "POOL",
            LogTag::Quote => "QUOTE",
            LogTag::Wallet => "WALLET",
            LogTag::Ledger => "LEDGER",
            LogTag::System => "SYSTEM",
        }
    }

    /// Key used for --debug-<key> / --verbose-<key> flag matching
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::Fleet => "fleet",
            LogTag::Funding => "funding",
            LogTag::Worker => "worker",
            LogTag::Pool => "pool",
            LogTag::Quote => "quote",
            LogTag::Wallet => "wallet",
            LogTag::Ledger => "ledger",
            LogTag::System => "system",
        }
    }

    /// All known tags (used when expanding --debug-all)
    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::Fleet,
            LogTag::Funding,
            LogTag::Worker,
            LogTag::Pool,
            LogTag::Quote,
            LogTag::Wallet,
            LogTag::Ledger,
            LogTag::System,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
