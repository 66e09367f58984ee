//! Binary that generates levels for every reference domain and prints
//! deterministic output lines for cross-process verification.
//!
//! Usage: `generate_fixture`
//!
//! Output: `key=value` lines, one block per domain.

use levelcert_harness::level_io::LevelDocument;
use levelcert_harness::worlds::{domain_by_id, DOMAIN_IDS};
use levelcert_harness::{generate_valid, RetryPolicy};
use levelcert_kernel::carrier::quantize::Precision;
use lock_tests::scenarios::FIXTURE_SEEDS;

fn main() {
    let policy = RetryPolicy::default();
    let snapshot = policy.snapshot().expect("policy snapshot");
    println!("policy_digest={}", snapshot.digest());

    for id in DOMAIN_IDS {
        let domain = domain_by_id(id).expect("listed domain resolves");
        let template = domain.default_template();
        println!("{id}.template_digest={}", template.digest().expect("template digest"));

        for seed in FIXTURE_SEEDS {
            let level = generate_valid(domain.as_ref(), &template, &policy, seed).expect("generation succeeds");
            let doc = LevelDocument::from_level(id, &level).expect("level document");
            let prefix = format!("{id}.{seed}");
            println!(
                "{prefix}.world_digest={}",
                level.world.digest(Precision::DEFAULT).expect("world digest")
            );
            println!(
                "{prefix}.provenance={}",
                serde_json::to_string(&level.provenance).expect("provenance json")
            );
            println!("{prefix}.attempts_used={}", level.attempts_used);
            println!("{prefix}.solution_depth={:?}", level.report.solution_depth);
            println!(
                "{prefix}.search_report_digest={}",
                level.report.search_report_digest.as_deref().unwrap_or("-")
            );
            println!("{prefix}.document_digest={}", doc.digest().expect("document digest"));
        }
    }
}
