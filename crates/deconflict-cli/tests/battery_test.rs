//! Scenario battery integration tests.

use deconflict_cli::output::{render_outcome, render_tally, write_report};
use deconflict_cli::scenarios::{all_scenarios, brief_encounter, temporal_separation};
use deconflict_cli::Config;
use deconflict_core::MissionStatus;

#[test]
fn every_scenario_matches_expected_status() {
    let config = Config::default();
    for scenario in all_scenarios().unwrap() {
        let outcome = scenario.run(&config).unwrap();
        assert!(
            outcome.passed(),
            "{}: expected {}, got {}",
            outcome.name,
            outcome.expected,
            outcome.report.status
        );
    }
}

#[tokio::test]
async fn concurrent_runner_agrees_with_sequential() {
    let config = Config::default();
    for scenario in all_scenarios().unwrap() {
        let sequential = scenario.run(&config).unwrap();
        let concurrent = scenario.run_concurrent(&config).await.unwrap();
        assert_eq!(sequential.report, concurrent.report, "{}", scenario.name);
    }
}

#[test]
fn brief_encounter_conflicts_stay_inside_other_window() {
    let scenario = brief_encounter().unwrap();
    let outcome = scenario.run(&Config::default()).unwrap();
    let other = &scenario.others[0];

    assert!(!outcome.report.conflicts.is_empty());
    for conflict in &outcome.report.conflicts {
        assert!(other.covers(conflict.time));
    }
}

#[test]
fn temporal_separation_has_no_overlapping_pairs() {
    let outcome = temporal_separation().unwrap().run(&Config::default()).unwrap();
    assert_eq!(outcome.report.status, MissionStatus::Clear);
    assert!(outcome.report.pairs.is_empty());
}

#[test]
fn console_output_follows_runner_format() {
    let outcome = brief_encounter().unwrap().run(&Config::default()).unwrap();
    let text = render_outcome(&outcome);
    assert!(text.starts_with("\n=== Testing Brief Encounter ===\nMission safety status: conflict detected\n"));
    assert!(text.contains("Conflict 3:"));
    assert!(!text.contains("Conflict 4:"));
    assert!(!text.contains("UNEXPECTED"));
    assert_eq!(render_tally(&[outcome]), "\n1/1 scenarios matched their expected status\n");
}

#[test]
fn buffer_override_changes_verdicts() {
    let config = Config::default().with_overrides(Some(500.0), None);
    let outcome = all_scenarios()
        .unwrap()
        .into_iter()
        .find(|s| s.name == "Altitude Separation")
        .unwrap()
        .run(&config)
        .unwrap();
    assert_eq!(outcome.report.status, MissionStatus::ConflictDetected);
    assert!(render_outcome(&outcome).contains("UNEXPECTED"));
}

#[test]
fn json_reports_are_written_per_scenario() {
    let dir = std::env::temp_dir().join(format!("deconflict-reports-{}", std::process::id()));
    let outcome = brief_encounter().unwrap().run(&Config::default()).unwrap();

    let path = write_report(&dir, &outcome.name, &outcome.report).unwrap();
    assert_eq!(path.file_name().unwrap(), "brief_encounter.json");

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["status"], "conflict detected");
    assert_eq!(json["primary_drone_id"], "primary");

    std::fs::remove_dir_all(&dir).unwrap();
}
