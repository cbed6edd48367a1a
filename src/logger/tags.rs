/// Module tags for log filtering and display

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    Sync,
    Parser,
    Fifo,
    Summary,
    Profiler,
    Follow,
    Database,
    Provider,
    Wallet,
    System,
}

impl LogTag {
    /// Display name shown in the log prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::Sync => "SYNC",
            LogTag::Parser => "PARSER",
            LogTag::Fifo => "FIFO",
            LogTag::Summary => "SUMMARY",
            LogTag::Profiler => "PROFILER",
            LogTag::Follow => "FOLLOW",
            LogTag::Database => "DATABASE",
            LogTag::Provider => "PROVIDER",
            LogTag::Wallet => "WALLET",
            LogTag::System => "SYSTEM",
        }
    }

    /// Key used in --debug-<key> command-line flags
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::Sync => "sync",
            LogTag::Parser => "parser",
            LogTag::Fifo => "fifo",
            LogTag::Summary => "summary",
            LogTag::Profiler => "profiler",
            LogTag::Follow => "follow",
            LogTag::Database => "database",
            LogTag::Provider => "provider",
            LogTag::Wallet => "wallet",
            LogTag::System => "system",
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
