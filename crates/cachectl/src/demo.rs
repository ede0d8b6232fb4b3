//! Built-in walkthroughs of both eviction policies

use std::io::Write;

use anyhow::Result;
use cachecore::{LfuCache, LruCache};
use tracing::info;

/// Run every scenario, printing one line per check. Returns true if all pass.
pub fn run<W: Write>(out: &mut W) -> Result<bool> {
    let lru = lru_scenario(out)?;
    let lfu = lfu_scenario(out)?;
    info!(lru, lfu, "demo finished");
    Ok(lru && lfu)
}

fn check<W: Write>(out: &mut W, label: &str, passed: bool) -> Result<bool> {
    writeln!(out, "  {:<40} {}", label, if passed { "ok" } else { "FAILED" })?;
    Ok(passed)
}

fn lru_scenario<W: Write>(out: &mut W) -> Result<bool> {
    writeln!(out, "LRU, capacity 2")?;
    let mut cache = LruCache::new(2);
    let mut passed = true;

    cache.put("a", 1);
    cache.put("b", 2);
    passed &= check(out, "get(a) == 1", cache.get(&"a") == Some(&1))?;
    cache.put("c", 3);
    passed &= check(out, "get(b) is evicted", cache.get(&"b").is_none())?;
    cache.put("c", 4);
    passed &= check(out, "get(c) == 4", cache.get(&"c") == Some(&4))?;

    Ok(passed)
}

fn lfu_scenario<W: Write>(out: &mut W) -> Result<bool> {
    writeln!(out, "LFU, capacity 2")?;
    let mut cache = LfuCache::new(2);
    let mut passed = true;

    cache.put("a", 1);
    cache.put("a", 2);
    passed &= check(out, "get(a) == 2", cache.get(&"a") == Some(&2))?;
    cache.put("b", 3);
    cache.put("c", 4);
    passed &= check(out, "get(c) == 4", cache.get(&"c") == Some(&4))?;
    passed &= check(out, "get(b) is evicted", cache.get(&"b").is_none())?;
    passed &= check(out, "freq(a) == 3", cache.frequency(&"a") == Some(3))?;

    Ok(passed)
}
