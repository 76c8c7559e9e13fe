use std::fs;

use tadasana_coach::coach::{CoachSession, FrameAnalyzer};
use tadasana_coach::config::Config;
use tempfile::TempDir;

mod common;

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.engine.check_arms = true;
    config.penalties.critical = 25;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[smoothing]\nwindow = 0\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("smoothing window must be at least 1"));
    assert_eq!(Config::load_or_default(&path), Config::default());
}

#[test]
fn test_missing_file_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(dir.path().join("absent.toml"));
    assert_eq!(config, Config::default());
}

#[test]
fn test_explicit_config_must_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[smoothing]\nwindow = 0\n").unwrap();

    let err = Config::resolve(Some(path.as_path()), dir.path().join("config.toml")).unwrap_err();
    assert!(format!("{:#}", err).contains("smoothing window must be at least 1"));

    let absent = dir.path().join("absent.toml");
    assert!(Config::resolve(Some(absent.as_path()), dir.path().join("config.toml")).is_err());
}

#[test]
fn test_implicit_config_falls_back() {
    let dir = TempDir::new().unwrap();
    let fallback = dir.path().join("config.toml");
    assert_eq!(Config::resolve(None, &fallback).unwrap(), Config::default());

    fs::write(&fallback, "[smoothing]\nwindow = 0\n").unwrap();
    assert_eq!(Config::resolve(None, &fallback).unwrap(), Config::default());

    fs::write(&fallback, "[stabilizer]\nwindow = 5\n").unwrap();
    assert_eq!(Config::resolve(None, &fallback).unwrap().stabilizer.window, 5);
}

#[test]
fn test_penalty_override_changes_score() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[penalties]\ncritical = 25\n").unwrap();
    let config = Config::load(&path).unwrap();

    let pose = common::with_dropped_hip(common::upright_pose());
    let analysis = FrameAnalyzer::from_config(&config).analyze(Some(&pose));
    assert_eq!(analysis.score, 75);

    let mut session = CoachSession::new(&config);
    assert_eq!(session.process(Some(&pose)).smoothed, 75);
}

#[test]
fn test_arm_rule_toggle() {
    let mut pose = common::upright_pose();
    pose.get_mut(tadasana_coach::pose::KeypointIndex::LeftWrist).x = 200.0;
    pose.get_mut(tadasana_coach::pose::KeypointIndex::LeftWrist).y = 230.0;

    let mut config = Config::default();
    assert_eq!(FrameAnalyzer::from_config(&config).analyze(Some(&pose)).score, 100);

    config.engine.check_arms = true;
    let analysis = FrameAnalyzer::from_config(&config).analyze(Some(&pose));
    assert_eq!(analysis.score, 93);
    assert_eq!(analysis.top().unwrap().message, "Extend your left arm down");
}
