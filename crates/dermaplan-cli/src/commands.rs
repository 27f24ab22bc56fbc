//! Subcommand handlers. Each returns the rendered document for stdout.

use crate::input::{load, render, Format};
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::ArgMatches;
use dermaplan_core::profile::{derive_profile, Questionnaire};
use dermaplan_core::progress::summarize;
use dermaplan_core::{
    EngineConfig, PlanRequest, RawMetricVector, RoutineEngine, RoutinePlan, ScanId, SkinMetricSet,
    SkinProfile, UserId,
};
use serde::Serialize;
use std::path::PathBuf;

/// Engine from the configured file, or defaults
pub(crate) fn engine(config: Option<&PathBuf>) -> Result<RoutineEngine> {
    let config = match config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    Ok(RoutineEngine::new(config)?)
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))
}

fn today(args: &ArgMatches) -> NaiveDate {
    args.get_one::<NaiveDate>("today")
        .copied()
        .unwrap_or_else(|| Utc::now().date_naive())
}

fn scan(engine: &RoutineEngine, args: &ArgMatches, name: &str) -> Result<SkinMetricSet> {
    let file = path(args, name)?;
    let raw: RawMetricVector = load(file)?;
    Ok(engine.normalizer().normalize(ScanId::new(), raw)?)
}

pub(crate) fn generate(engine: &RoutineEngine, args: &ArgMatches, format: Format) -> Result<String> {
    let metrics = scan(engine, args, "scan")?;
    let profile: SkinProfile = load(path(args, "profile")?)?;
    let history: Vec<RoutinePlan> = match args.get_one::<PathBuf>("history") {
        Some(file) => load(file)?,
        None => Vec::new(),
    };

    let user_id = match (args.get_one::<uuid::Uuid>("user"), history.first()) {
        (Some(id), _) => UserId(*id),
        (None, Some(plan)) => plan.user_id,
        (None, None) => UserId::new(),
    };
    let mut request = PlanRequest::new(user_id, today(args));
    if let Some(days) = args.get_one::<u32>("lock-days") {
        request = request.with_lock_days(*days);
    }
    if args.get_flag("supersede") {
        request = request.superseding();
    }

    let mut plan = engine.generate_routine(&metrics, &profile, &history, &request)?;
    if let Some(mut live) = history.into_iter().find(RoutinePlan::is_live) {
        engine.lock_manager().supersede(&mut live, &mut plan, request.today)?;
        tracing::info!(retired = %live.id, successor = %plan.id, "live plan in history retired");
    } else if args.get_flag("activate") {
        engine.lock_manager().activate(&mut plan)?;
    }
    render(&plan, format)
}

pub(crate) fn profile(engine: &RoutineEngine, args: &ArgMatches, format: Format) -> Result<String> {
    let metrics = scan(engine, args, "scan")?;
    let answers: Questionnaire = match args.get_one::<PathBuf>("answers") {
        Some(file) => load(file)?,
        None => Questionnaire::default(),
    };
    render(&derive_profile(&metrics, &answers), format)
}

#[derive(Serialize)]
struct ProgressReport {
    deltas: Vec<dermaplan_core::ScoreDelta>,
    summary: dermaplan_core::ProgressSummary,
    highlights: Vec<String>,
}

pub(crate) fn progress(engine: &RoutineEngine, args: &ArgMatches, format: Format) -> Result<String> {
    let previous = scan(engine, args, "previous")?;
    let current = scan(engine, args, "current")?;
    let deltas = engine.evaluate_progress(&previous, &current)?;
    let report = ProgressReport {
        summary: summarize(&deltas),
        highlights: deltas.iter().filter(|d| d.is_significant).map(|d| d.describe()).collect(),
        deltas,
    };
    render(&report, format)
}

pub(crate) fn decide(engine: &RoutineEngine, args: &ArgMatches, format: Format) -> Result<String> {
    let plan: RoutinePlan = load(path(args, "plan")?)?;
    let deltas = match (args.get_one::<PathBuf>("previous"), args.get_one::<PathBuf>("current")) {
        (Some(_), Some(_)) => {
            let previous = scan(engine, args, "previous")?;
            let current = scan(engine, args, "current")?;
            engine.evaluate_progress(&previous, &current)?
        }
        (None, None) => Vec::new(),
        _ => bail!("--previous and --current must be given together"),
    };
    let decision = engine.decide_adjustment(&plan, &deltas, today(args), args.get_flag("user-request"));
    render(&decision, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;
    use dermaplan_core::{AdjustmentDecision, Ingredient, PlanStatus, ReasonCode};
    use std::io::Write;
    use tempfile::TempDir;

    const SCAN: &str = r#"
scores:
  acne: 72
  redness: 20
  oiliness: 55
  dryness: 10
  texture: 30
confidence: 88
captured_at: 2025-04-07T09:30:00Z
"#;

    const PROFILE: &str = "skin_type: oily\nprimary_concern: acne\nsensitivity: high\n";

    fn write(dir: &TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn run(argv: &[&str]) -> Result<String> {
        let matches = cli().try_get_matches_from(argv)?;
        let engine = engine(None)?;
        let (name, args) = matches.subcommand().context("subcommand")?;
        match name {
            "generate" => generate(&engine, args, Format::Json),
            "decide" => decide(&engine, args, Format::Json),
            "progress" => progress(&engine, args, Format::Json),
            _ => unreachable!(),
        }
    }

    #[test]
    fn generate_from_yaml_inputs() {
        let dir = TempDir::new().unwrap();
        let scan = write(&dir, "scan.yaml", SCAN);
        let profile = write(&dir, "profile.yml", PROFILE);

        let out = run(&[
            "dermaplan", "generate", "--scan", &scan, "--profile", &profile, "--today", "2025-04-07",
            "--activate",
        ])
        .unwrap();
        let plan: RoutinePlan = serde_json::from_str(&out).unwrap();

        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.lock.start_date, NaiveDate::from_ymd_opt(2025, 4, 7).unwrap());
        assert!(plan.selection(Ingredient::SalicylicAcid).is_some());
    }

    #[test]
    fn decide_on_a_fresh_plan_is_denied() {
        let dir = TempDir::new().unwrap();
        let scan = write(&dir, "scan.yaml", SCAN);
        let profile = write(&dir, "profile.yaml", PROFILE);
        let plan_json = run(&[
            "dermaplan", "generate", "--scan", &scan, "--profile", &profile, "--today", "2025-04-07",
            "--activate",
        ])
        .unwrap();
        let plan = write(&dir, "plan.json", &plan_json);

        let out = run(&["dermaplan", "decide", "--plan", &plan, "--today", "2025-04-09", "--user-request"]).unwrap();
        let decision: AdjustmentDecision = serde_json::from_str(&out).unwrap();

        assert!(!decision.allow);
        assert_eq!(decision.reason, ReasonCode::LockInForce);
    }

    #[test]
    fn supersede_of_a_locked_history_plan_is_refused() {
        let dir = TempDir::new().unwrap();
        let scan = write(&dir, "scan.yaml", SCAN);
        let profile = write(&dir, "profile.yaml", PROFILE);
        let plan_json = run(&[
            "dermaplan", "generate", "--scan", &scan, "--profile", &profile, "--today", "2025-04-07",
            "--activate",
        ])
        .unwrap();
        let history = write(&dir, "history.json", &format!("[{plan_json}]"));

        let err = run(&[
            "dermaplan", "generate", "--scan", &scan, "--profile", &profile, "--history", &history,
            "--today", "2025-04-08", "--supersede", "--activate",
        ])
        .unwrap_err();

        let engine_err = err.downcast_ref::<dermaplan_core::EngineError>().unwrap();
        assert_eq!(engine_err.kind(), dermaplan_core::ErrorKind::InvariantViolation);
    }

    #[test]
    fn low_confidence_scan_is_a_retake() {
        let dir = TempDir::new().unwrap();
        let scan = write(&dir, "scan.yaml", &SCAN.replace("confidence: 88", "confidence: 12"));
        let profile = write(&dir, "profile.yaml", PROFILE);

        let err = run(&["dermaplan", "generate", "--scan", &scan, "--profile", &profile]).unwrap_err();

        assert_eq!(crate::exit_status(&err), crate::EXIT_RETAKE);
    }
}
