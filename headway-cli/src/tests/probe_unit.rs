//! Unit tests for the single-buffer `probe` command.

use super::helpers::{Workspace, single_route_document};
use super::*;
use crate::probe::{ProbeConfig, ProbeOutput, execute_probe, run_probe_with};
use headway_core::{BuildError, SolveStatus, SolverBackend};
use rstest::{fixture, rstest};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn probe_at(workspace: &Workspace, backend: SolverBackend, buffer: f64) -> ProbeConfig {
    let dataset_path = workspace.write_json("city.json", &single_route_document(1_200.0, 60, 10));
    ProbeConfig {
        dataset_path,
        backend,
        buffer,
        output: None,
    }
}

#[rstest]
fn probe_requires_a_buffer() {
    let args = ProbeArgs {
        dataset_path: Some("city.json".into()),
        ..ProbeArgs::default()
    };
    match ProbeConfig::try_from(args) {
        Err(CliError::MissingArgument { field, env }) => {
            assert_eq!(field, ARG_BUFFER);
            assert_eq!(env, ENV_PROBE_BUFFER);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn probe_requires_a_dataset() {
    let args = ProbeArgs {
        buffer: Some(0.0),
        ..ProbeArgs::default()
    };
    match ProbeConfig::try_from(args) {
        Err(CliError::MissingArgument { field, .. }) => assert_eq!(field, ARG_PROBE_DATASET),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn infeasible_probes_report_status_only(workspace: Workspace) {
    let output = execute_probe(&probe_at(&workspace, SolverBackend::Lp, 0.0)).expect("probe");
    assert_eq!(output.status, SolveStatus::Infeasible);
    assert_eq!(output.objective, None);
    assert!(output.report.is_none());
}

#[rstest]
#[case(SolverBackend::Lp)]
#[case(SolverBackend::Integer)]
fn feasible_probes_include_a_report(workspace: Workspace, #[case] backend: SolverBackend) {
    let output = execute_probe(&probe_at(&workspace, backend, 600.0)).expect("probe");
    assert!(output.status.is_feasible(), "status {:?}", output.status);
    let report = output.report.expect("report for a feasible probe");
    assert!((report.buffer - 600.0).abs() < f64::EPSILON);
    assert!((report.total_trips - 10.0).abs() < 1e-6);
}

#[rstest]
fn negative_buffers_fail_to_build(workspace: Workspace) {
    let err = execute_probe(&probe_at(&workspace, SolverBackend::Lp, -5.0)).expect_err("buffer");
    match err {
        CliError::Build(BuildError::InvalidBuffer(buffer)) => {
            assert!((buffer + 5.0).abs() < f64::EPSILON);
        }
        other => panic!("expected Build, found {other:?}"),
    }
}

#[rstest]
fn probe_command_prints_json(workspace: Workspace) {
    let config = probe_at(&workspace, SolverBackend::Integer, 600.0);
    let args = ProbeArgs {
        dataset_path: Some(config.dataset_path),
        backend: Some("integer".to_owned()),
        buffer: Some(600.0),
        output: None,
    };
    let mut stdout = Vec::new();
    run_probe_with(args, &mut stdout).expect("probe should succeed");

    let printed = String::from_utf8(stdout).expect("stdout utf-8");
    let output: ProbeOutput = serde_json::from_str(&printed).expect("probe output JSON");
    assert_eq!(output.backend, SolverBackend::Integer);
    assert_eq!(output.status, SolveStatus::Optimal);
}
