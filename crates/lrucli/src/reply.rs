//! Replies printed by the command shell

use std::fmt;

use lrucache::CacheStats;

/// Result of one shell command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Command succeeded with nothing to report
    Ok,
    /// Looked-up value, `None` when the key is not cached
    Value(Option<String>),
    /// Count or flag
    Integer(usize),
    /// Keys from most to least recently used
    Keys(Vec<String>),
    /// Cache counters plus current fill
    Stats {
        stats: CacheStats,
        len: usize,
        capacity: usize,
    },
    /// Command reference
    Help,
    /// Malformed or unknown command
    Error(String),
}

const HELP: &str = "\
GET key          read a value and mark it most recently used
SET key value    insert or overwrite a value
PEEK key         read a value without touching recency
EXISTS key       1 if the key is cached, else 0
LEN              number of cached entries
KEYS             keys from most to least recently used
STATS            hit/miss/eviction counters
HELP             this text";

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Value(Some(value)) => write!(f, "{}", value),
            Reply::Value(None) => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Keys(keys) if keys.is_empty() => write!(f, "(empty)"),
            Reply::Keys(keys) => write!(f, "{}", keys.join("\n")),
            Reply::Stats {
                stats,
                len,
                capacity,
            } => write!(
                f,
                "len:{}\ncapacity:{}\nhits:{}\nmisses:{}\ninserts:{}\nupdates:{}\nevictions:{}\nhit_ratio:{:.2}",
                len,
                capacity,
                stats.hits(),
                stats.misses(),
                stats.inserts(),
                stats.updates(),
                stats.evictions(),
                stats.hit_ratio(),
            ),
            Reply::Help => write!(f, "{}", HELP),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}
