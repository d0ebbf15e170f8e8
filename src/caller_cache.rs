//! Process-wide cache of module-qualified caller file names.
//!
//! A call site reports its source file as the compiler sees it (`src/core.rs`, or an absolute
//! path for dependencies). Log lines instead show the file qualified by the crate it belongs
//! to, keeping its directory under `src/` (`bytelog/net/conn.rs`), which needs a little string
//! work; the result is computed once per
//! source file and leaked so every later entry can hold it as a `&'static str`.
//!
//! The number of entries is bounded by the number of source files that log, so the leaked
//! memory stays small for the life of the process.

use std::collections::HashMap;

use lazy_static::lazy_static;
use parking_lot::RwLock;

lazy_static! {
    /// Maps a raw source path to its crate-qualified name.
    static ref CALLER_CACHE: RwLock<HashMap<&'static str, &'static str>> =
        RwLock::new(HashMap::new());
}

/// Returns `file` qualified by the crate named at the head of `module_path`.
///
/// The part of the path after its last `src` directory is kept; a file outside any `src`
/// directory keeps only its name.
///
/// # Examples
///
/// ```
/// # use bytelog::caller_cache::qualified_file;
/// assert_eq!(qualified_file("src/core.rs", "bytelog::core"), "bytelog/core.rs");
/// assert_eq!(qualified_file("src/net/mod.rs", "bytelog::net"), "bytelog/net/mod.rs");
/// assert_eq!(qualified_file("C:\\dev\\src\\bin\\main.rs", "app"), "app/bin/main.rs");
/// assert_eq!(qualified_file("tests/smoke.rs", "smoke"), "smoke/smoke.rs");
/// ```
///
/// # Thread Safety
///
/// Lookups take a shared lock. Two threads missing on the same file at once both compute the
/// name, but only the first insert is kept.
pub fn qualified_file(file: &'static str, module_path: &str) -> &'static str {
    if let Some(&name) = CALLER_CACHE.read().get(file) {
        return name;
    }

    let crate_name = module_path.split("::").next().unwrap_or(module_path);
    let mut cache = CALLER_CACHE.write();
    *cache.entry(file).or_insert_with(|| {
        let name = format!("{}/{}", crate_name, source_relative(file).replace('\\', "/"));
        Box::leak(name.into_boxed_str())
    })
}

/// Returns the cached qualified name for `file`, if one was computed.
pub fn cached(file: &str) -> Option<&'static str> {
    CALLER_CACHE.read().get(file).copied()
}

/// Number of cached files.
pub fn len() -> usize {
    CALLER_CACHE.read().len()
}

/// The part of `path` below its last `src` directory, or its final component when there is
/// none.
fn source_relative(path: &str) -> &str {
    let mut start = 0;
    let mut below = None;
    for (i, _) in path.match_indices(['/', '\\']) {
        if &path[start..i] == "src" {
            below = Some(i + 1);
        }
        start = i + 1;
    }
    match below {
        Some(i) => &path[i..],
        None => short_file(path),
    }
}

/// The final path component of `path`, accepting both `/` and `\` as separators.
pub fn short_file(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}
