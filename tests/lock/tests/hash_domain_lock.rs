//! Hash domain governance lock tests.
//!
//! Proves:
//! 1. Canonical domain set has the expected count
//! 2. All domain byte strings are unique
//! 3. All domains are null-terminated and follow `LEVELCERT::*::V1\0`
//! 4. No raw `LEVELCERT::` literals in production source outside `hash_domain.rs`
//! 5. Digests under different domains never coincide

use std::collections::BTreeSet;
use std::path::Path;

use levelcert_kernel::proof::hash::{canonical_hash, HashDomain};
use lock_tests::crossproc::workspace_root;

// ---------------------------------------------------------------------------
// 1. Canonical set count
// ---------------------------------------------------------------------------

#[test]
fn hash_domain_canonical_set_count() {
    assert_eq!(
        HashDomain::ALL.len(),
        7,
        "expected 7 domain variants; if you added a new domain, update this count"
    );
}

// ---------------------------------------------------------------------------
// 2. Unique bytes
// ---------------------------------------------------------------------------

#[test]
fn hash_domain_all_unique_bytes() {
    let mut seen = BTreeSet::new();
    for domain in HashDomain::ALL {
        assert!(seen.insert(domain.as_bytes()), "duplicate domain bytes: {domain}");
    }
}

// ---------------------------------------------------------------------------
// 3. Wire format
// ---------------------------------------------------------------------------

#[test]
fn hash_domain_wire_format() {
    for domain in HashDomain::ALL {
        let bytes = domain.as_bytes();
        assert!(bytes.ends_with(b"::V1\0"), "{domain} is not ::V1\\0 terminated");
        assert!(bytes.starts_with(b"LEVELCERT::"), "{domain} has wrong prefix");
        assert_eq!(
            bytes.iter().filter(|&&b| b == 0).count(),
            1,
            "{domain} has an interior null"
        );
    }
}

// ---------------------------------------------------------------------------
// 4. No raw domain literals outside hash_domain.rs
// ---------------------------------------------------------------------------

fn rust_sources(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            rust_sources(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }
}

#[test]
fn no_raw_domain_literals_in_production_source() {
    let root = workspace_root();
    let mut files = Vec::new();
    for krate in ["kernel", "search", "harness"] {
        rust_sources(&root.join(krate).join("src"), &mut files);
    }
    assert!(!files.is_empty());
    let needle = concat!("b\"LEVEL", "CERT::");
    for file in files {
        if file.ends_with("hash_domain.rs") {
            continue;
        }
        let text = std::fs::read_to_string(&file).unwrap();
        assert!(
            !text.contains(needle),
            "{} contains a raw domain literal",
            file.display()
        );
    }
}

// ---------------------------------------------------------------------------
// 5. Domain separation
// ---------------------------------------------------------------------------

#[test]
fn same_bytes_hash_differently_per_domain() {
    let digests: BTreeSet<String> = HashDomain::ALL
        .iter()
        .map(|d| canonical_hash(*d, b"{}").to_string())
        .collect();
    assert_eq!(digests.len(), HashDomain::ALL.len());
}
