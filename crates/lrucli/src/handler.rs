//! Command handler for the cache shell

use std::io::{BufRead, Write};

use anyhow::Result;
use lrucache::LruCache;
use tracing::{debug, warn};

use crate::reply::Reply;

pub struct CommandHandler {
    cache: LruCache<String, String>,
}

impl CommandHandler {
    pub fn new(cache: LruCache<String, String>) -> Self {
        Self { cache }
    }

    /// Run one command line. Blank lines and `#` comments yield `None`.
    pub fn handle(&mut self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next()?.to_uppercase();
        let args: Vec<&str> = parts.collect();

        let reply = match command.as_str() {
            "GET" => self.handle_get(&args),
            "SET" => self.handle_set(&args),
            "PEEK" => self.handle_peek(&args),
            "EXISTS" => self.handle_exists(&args),
            "LEN" => self.handle_len(&args),
            "KEYS" => self.handle_keys(&args),
            "STATS" => self.handle_stats(&args),
            "HELP" => Reply::Help,
            _ => Reply::Error(format!("unknown command '{}'", command)),
        };

        if let Reply::Error(msg) = &reply {
            warn!(line, "command failed: {}", msg);
        }
        Some(reply)
    }

    /// Read commands until EOF, writing one reply per command
    pub fn run<R, W>(&mut self, input: R, mut output: W, echo: bool) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for line in input.lines() {
            let line = line?;
            if let Some(reply) = self.handle(&line) {
                if echo {
                    writeln!(output, "> {}", line.trim())?;
                }
                writeln!(output, "{}", reply)?;
            }
        }
        output.flush()?;

        let stats = self.cache.stats();
        debug!(
            hits = stats.hits(),
            misses = stats.misses(),
            evictions = stats.evictions(),
            "session finished"
        );
        Ok(())
    }

    fn handle_get(&mut self, args: &[&str]) -> Reply {
        match args {
            [key] => Reply::Value(self.cache.get(*key).cloned()),
            _ => wrong_arity("get"),
        }
    }

    fn handle_set(&mut self, args: &[&str]) -> Reply {
        match args {
            [key, value] => {
                self.cache.set(key.to_string(), value.to_string());
                Reply::Ok
            }
            _ => wrong_arity("set"),
        }
    }

    fn handle_peek(&self, args: &[&str]) -> Reply {
        match args {
            [key] => Reply::Value(self.cache.peek(*key).cloned()),
            _ => wrong_arity("peek"),
        }
    }

    fn handle_exists(&self, args: &[&str]) -> Reply {
        match args {
            [key] => Reply::Integer(usize::from(self.cache.contains(*key))),
            _ => wrong_arity("exists"),
        }
    }

    fn handle_len(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("len");
        }
        Reply::Integer(self.cache.len())
    }

    fn handle_keys(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("keys");
        }
        Reply::Keys(self.cache.iter().map(|(k, _)| k.clone()).collect())
    }

    fn handle_stats(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return wrong_arity("stats");
        }
        Reply::Stats {
            stats: *self.cache.stats(),
            len: self.cache.len(),
            capacity: self.cache.capacity(),
        }
    }
}

fn wrong_arity(command: &str) -> Reply {
    Reply::Error(format!("wrong number of arguments for '{}' command", command))
}
