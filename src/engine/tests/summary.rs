//! Rendering contract for the fixed-structure chat summary.

use std::sync::Arc;

use super::common;
use crate::engine::format_summary;
use crate::stores::memory::{MemoryAdmissionStore, MemoryCacheStore};

#[tokio::test]
async fn summary_keeps_its_fixed_line_structure() {
    let store = Arc::new(MemoryAdmissionStore::default());
    store.insert_facility(common::facility("fac-1", 60, ""));
    common::seed_monthly_history(&store, "fac-1", &[1, 3, 5, 7, 9, 11]);
    let engine = common::engine(store, Arc::new(MemoryCacheStore::default()));

    let result = engine
        .calculate(&common::input("fac-1", Some(5)))
        .await
        .expect("scoring succeeds");
    let summary = format_summary(&result);
    let lines: Vec<&str> = summary.lines().collect();

    assert!(lines[0].starts_with("Admission probability within 6 months:"));
    assert!(lines[0].contains(&format!("grade {}", result.grade.as_str())));
    assert!(lines[0].contains(&format!("score {}", result.score)));
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "Evidence:");

    let bullets = lines.iter().filter(|l| l.starts_with("• ")).count();
    assert_eq!(bullets, result.evidence_cards.len());

    let tail_blank = 3 + result.evidence_cards.len();
    assert_eq!(lines[tail_blank], "");
    assert!(lines[tail_blank + 1].starts_with("Estimated wait:"));
    assert_eq!(
        lines[tail_blank + 2],
        format!("Effective waiting position: {}", result.effective_waiting)
    );
}

#[tokio::test]
async fn summary_reports_certainty_for_the_front_of_the_queue() {
    let store = Arc::new(MemoryAdmissionStore::default());
    store.insert_facility(common::facility("fac-1", 60, ""));
    let engine = common::engine(store, Arc::new(MemoryCacheStore::default()));

    let mut input = common::input("fac-1", Some(1));
    input.priority_type = crate::engine::domain::PriorityType::Disability;
    let result = engine.calculate(&input).await.expect("scoring succeeds");

    let summary = format_summary(&result);
    assert!(summary.starts_with("Admission probability within 6 months: 100%"));
    assert!(summary.ends_with("Effective waiting position: 0"));
}
