use std::thread;

use bytelog::caller_cache::{cached, len, qualified_file, short_file};
use bytelog::{CallSite, EntryCaller};

#[test]
fn test_qualified_file_uses_crate_name() {
    assert_eq!(
        qualified_file("src/storage/page.rs", "pagestore::storage::page"),
        "pagestore/storage/page.rs"
    );
    assert_eq!(qualified_file("lib.rs", "tiny"), "tiny/lib.rs");
    assert_eq!(
        qualified_file(
            "/home/ci/.cargo/registry/src/index/hyper-1.4.0/src/proto/h1/io.rs",
            "hyper::proto::h1::io"
        ),
        "hyper/proto/h1/io.rs"
    );
    assert_eq!(qualified_file(r"D:\work\src\net\mod.rs", "wire::net"), "wire/net/mod.rs");
    assert_eq!(qualified_file("benches/src_like.rs", "benches"), "benches/src_like.rs");
}

#[test]
fn test_qualified_file_is_cached() {
    let file = "src/cached/once.rs";
    assert_eq!(cached(file), None);

    let first = qualified_file(file, "first::once");
    assert!(len() >= 1);
    assert_eq!(cached(file), Some("first/cached/once.rs"));

    // The first module seen for a file wins.
    let second = qualified_file(file, "other::once");
    assert_eq!(second, "first/cached/once.rs");
    assert!(std::ptr::eq(first, second));
}

#[test]
fn test_short_file() {
    assert_eq!(short_file("a/b/c.rs"), "c.rs");
    assert_eq!(short_file(r"C:\work\main.rs"), "main.rs");
    assert_eq!(short_file("plain.rs"), "plain.rs");
    assert_eq!(short_file("dir/"), "");
}

#[test]
fn test_concurrent_lookups_agree() {
    let file: &'static str = "src/cached/threads.rs";
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(move || qualified_file(file, "threads::worker")))
        .collect();
    let names: Vec<&'static str> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(names.iter().all(|n| *n == "threads/cached/threads.rs"));
    assert!(names.windows(2).all(|w| std::ptr::eq(w[0], w[1])));
}

#[test]
fn test_call_site_resolution() {
    let site = CallSite::new("src/net/conn.rs", 42, Some("wire::net::conn"));
    let caller = site.resolve();
    assert!(caller.defined);
    assert_eq!(caller.file, "wire/net/conn.rs");
    assert_eq!(caller.line, 42);
    assert_eq!(caller.short_file(), "conn.rs");

    let raw = CallSite::new("src/net/raw.rs", 7, None).resolve();
    assert_eq!(raw.file, "src/net/raw.rs");

    assert_eq!(CallSite::unknown().resolve(), EntryCaller::unknown());

    let here = CallSite::here();
    assert_eq!(here.file, file!());
    assert_eq!(here.line, line!() - 2);
}
