//! Command handler for the line protocol

use cachecore::{Cache, Policy};
use tracing::debug;

use crate::reply::Reply;

/// Cache driven by text commands
pub type DynCache = Box<dyn Cache<String, String> + Send>;

pub struct CommandHandler {
    cache: DynCache,
}

impl CommandHandler {
    pub fn new(cache: DynCache) -> Self {
        Self { cache }
    }

    /// Handle one input line. Blank lines and `#` comments yield no reply.
    pub fn handle(&mut self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut tokens = line.split_whitespace();
        let command = tokens.next()?.to_uppercase();
        let args: Vec<&str> = tokens.collect();
        debug!(command = %command, args = args.len(), "handling command");

        let reply = match command.as_str() {
            "PING" => self.handle_ping(&args),
            "GET" => self.handle_get(&args),
            "PUT" | "SET" => self.handle_put(&args),
            "DEL" => self.handle_del(&args),
            "EXISTS" => self.handle_exists(&args),
            "FREQ" => self.handle_freq(&args),
            "SIZE" => Reply::Integer(self.cache.len() as i64),
            "CAPACITY" => Reply::Integer(self.cache.capacity() as i64),
            "INFO" => self.handle_info(),
            "CLEAR" => {
                self.cache.clear();
                Reply::ok()
            }
            _ => Reply::error(format!("unknown command '{}'", command)),
        };
        Some(reply)
    }

    fn handle_ping(&self, args: &[&str]) -> Reply {
        match args {
            [] => Reply::Simple("PONG".to_string()),
            _ => Reply::Value(args.join(" ")),
        }
    }

    fn handle_get(&mut self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("get");
        };

        match self.cache.get(&key.to_string()) {
            Some(value) => Reply::Value(value.clone()),
            None => Reply::Nil,
        }
    }

    fn handle_put(&mut self, args: &[&str]) -> Reply {
        let [key, value @ ..] = args else {
            return wrong_arity("put");
        };
        if value.is_empty() {
            return wrong_arity("put");
        }

        self.cache.put(key.to_string(), value.join(" "));
        Reply::ok()
    }

    fn handle_del(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return wrong_arity("del");
        }

        let deleted = args
            .iter()
            .filter(|key| self.cache.remove(&key.to_string()).is_some())
            .count();
        Reply::Integer(deleted as i64)
    }

    fn handle_exists(&self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return wrong_arity("exists");
        }

        let count = args
            .iter()
            .filter(|key| self.cache.contains(&key.to_string()))
            .count();
        Reply::Integer(count as i64)
    }

    fn handle_freq(&self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("freq");
        };
        if self.cache.policy() != Policy::Lfu {
            return Reply::error(format!(
                "FREQ needs the lfu policy (running {})",
                self.cache.policy()
            ));
        }

        match self.cache.frequency(&key.to_string()) {
            Some(freq) => Reply::Integer(freq as i64),
            None => Reply::Nil,
        }
    }

    fn handle_info(&self) -> Reply {
        let stats = self.cache.stats();
        Reply::Fields(vec![
            ("policy".into(), self.cache.policy().to_string()),
            ("size".into(), self.cache.len().to_string()),
            ("capacity".into(), self.cache.capacity().to_string()),
            ("hits".into(), stats.hits().to_string()),
            ("misses".into(), stats.misses().to_string()),
            ("hit_ratio".into(), format!("{:.2}", stats.hit_ratio())),
            ("inserts".into(), stats.inserts().to_string()),
            ("updates".into(), stats.updates().to_string()),
            ("evictions".into(), stats.evictions().to_string()),
        ])
    }
}

fn wrong_arity(command: &str) -> Reply {
    Reply::error(format!(
        "wrong number of arguments for '{}' command",
        command
    ))
}
