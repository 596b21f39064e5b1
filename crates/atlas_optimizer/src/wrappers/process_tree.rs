use std::fs;

use fxhash::{FxHashMap, FxHashSet};

/// Parent pid of every live process, read from `/proc`.
fn parent_table() -> FxHashMap<u32, u32> {
    let Ok(entries) = fs::read_dir("/proc") else {
        return FxHashMap::default();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pid: u32 = entry.file_name().to_str()?.parse().ok()?;
            let stat = fs::read_to_string(entry.path().join("stat")).ok()?;
            Some((pid, parse_parent(&stat)?))
        })
        .collect()
}

/// The command name may hold spaces and parentheses, fields start after the
/// last `)`: state then parent pid.
fn parse_parent(stat: &str) -> Option<u32> {
    let (_, fields) = stat.rsplit_once(')')?;
    fields.split_whitespace().nth(1)?.parse().ok()
}

/// Transitive children of `roots`, roots excluded, sorted.
pub fn collect_descendants(parents: &FxHashMap<u32, u32>, roots: &[u32]) -> Vec<u32> {
    let mut children: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
    for (&pid, &parent) in parents {
        children.entry(parent).or_default().push(pid);
    }

    let mut seen: FxHashSet<u32> = roots.iter().copied().collect();
    let mut stack = roots.to_vec();
    let mut descendants = Vec::new();

    while let Some(pid) = stack.pop() {
        for &child in children.get(&pid).into_iter().flatten() {
            if seen.insert(child) {
                descendants.push(child);
                stack.push(child);
            }
        }
    }

    descendants.sort_unstable();
    descendants
}

/// Live descendants of `roots`, empty where `/proc` is not available.
pub fn descendants(roots: &[u32]) -> Vec<u32> {
    collect_descendants(&parent_table(), roots)
}
