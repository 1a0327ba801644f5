use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cell::BadgeId;
use crate::cli::autopilot::Autopilot;
use crate::clock::{Clock, SystemClock};
use crate::config::content::ContentCatalog;
use crate::config::game::GameConfig;
use crate::persistence::{self, SaveData};
use crate::session::{GameOver, Session, TickReport};
use crate::simulation::statistics::compute_vitals;

/// Seconds of simulated time between vitals log lines.
const VITALS_EVERY_S: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seed: u64,
    pub save_path: Option<PathBuf>,
    pub max_seconds: Option<f64>,
    pub time_scale: f64,
    pub accuracy: f64,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            seed: 0,
            save_path: None,
            max_seconds: None,
            time_scale: 1.0,
            accuracy: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub survived_ms: f64,
    pub game_over: Option<GameOver>,
    pub badges_earned: Vec<BadgeId>,
    pub progress: SaveData,
}

/// Load saved progress, treating anything unusable as a fresh start.
fn load_or_default(path: &Path) -> SaveData {
    match persistence::load_progress(path) {
        Ok(Some(data)) => data,
        Ok(None) => SaveData::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable save file");
            SaveData::default()
        }
    }
}

fn write_progress(path: &Path, progress: &SaveData) {
    if let Err(e) = persistence::save_progress(path, progress) {
        warn!(path = %path.display(), error = %e, "Progress save failed");
    }
}

/// Run the badge evaluator and write progress as soon as a badge is earned.
fn evaluate_badges_and_save(session: &mut Session, save_path: Option<&Path>) -> Vec<BadgeId> {
    let earned = session.evaluate_badges();
    if !earned.is_empty() {
        if let Some(path) = save_path {
            write_progress(path, &session.progress());
        }
    }
    earned
}

/// Play one headless game with the autopilot until the cell dies, the time
/// limit is reached, or Ctrl-C.
pub async fn run_game(
    config: Arc<GameConfig>,
    content: Arc<ContentCatalog>,
    options: &RunOptions,
) -> Result<RunOutcome, String> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut session = Session::new(Arc::clone(&config), content, clock, options.seed)
        .map_err(|e| format!("Cannot start session: {}", e))?;

    if let Some(path) = &options.save_path {
        session.restore_progress(load_or_default(path));
    }

    let autopilot = Autopilot::new(options.accuracy);
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed.wrapping_add(1));

    session.start();
    session.set_time_scale(options.time_scale);

    let mut tick_timer = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    let mut badge_timer = tokio::time::interval(Duration::from_millis(config.badge_interval_ms));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut badges_earned = Vec::new();
    let mut game_over = None;
    let mut next_vitals_s = VITALS_EVERY_S;

    info!(
        seed = options.seed,
        time_scale = session.state().time_scale,
        tick_interval_ms = config.tick_interval_ms,
        "Headless run started"
    );

    loop {
        tokio::select! {
            _ = tick_timer.tick() => {
                if let TickReport::Advanced(summary) = session.tick() {
                    if let Some(over) = summary.game_over {
                        badges_earned.extend(over.final_badges.iter().copied());
                        game_over = Some(over);
                        break;
                    }
                }

                let state = session.state();
                if let Some(event) = &state.active_event {
                    let choice = autopilot.choose_option(event, &mut rng);
                    if let Some(report) = session.choose_option(choice) {
                        if let Some(feedback) = report.feedback {
                            info!(event = %report.event_id, correct = report.correct, %feedback, "Event feedback");
                        }
                    }
                }

                let state = session.state();
                if let Some(m) = autopilot.next_move(&state, &config) {
                    if m.target.is_some() {
                        session.select_organelle(m.target);
                    }
                    session.perform_action(m.action);
                }

                let elapsed_s = session.state().elapsed_seconds();
                if elapsed_s >= next_vitals_s {
                    let v = compute_vitals(&session.state());
                    info!(
                        elapsed_s = v.elapsed_seconds,
                        atp = v.atp,
                        waste = v.waste,
                        stress = v.stress,
                        protein = v.protein,
                        mean_organelle = v.mean_organelle_health,
                        ready_actions = v.ready_actions,
                        effects_active = v.effects_active,
                        "Vitals"
                    );
                    next_vitals_s = elapsed_s + VITALS_EVERY_S;
                }

                if options.max_seconds.is_some_and(|max| elapsed_s >= max) {
                    info!(elapsed_s, "Time limit reached");
                    session.stop();
                    break;
                }
            }
            _ = badge_timer.tick() => {
                badges_earned.extend(evaluate_badges_and_save(
                    &mut session,
                    options.save_path.as_deref(),
                ));
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                session.stop();
                break;
            }
        }
    }

    let progress = session.progress();
    if let Some(path) = &options.save_path {
        write_progress(path, &progress);
    }

    let survived_ms = game_over
        .as_ref()
        .map_or(session.state().elapsed_millis, |o| o.survived_ms);
    Ok(RunOutcome {
        survived_ms,
        game_over,
        badges_earned,
        progress,
    })
}

pub fn print_run_outcome(outcome: &RunOutcome, content: &ContentCatalog) {
    println!("=== Run finished ===");
    println!("Survived: {:.1}s", outcome.survived_ms / 1000.0);
    match &outcome.game_over {
        Some(over) => {
            println!("Game over:");
            for reason in &over.reasons {
                println!("  - {}", reason);
            }
        }
        None => println!("Stopped before the cell failed"),
    }
    if outcome.badges_earned.is_empty() {
        println!("No new badges");
    } else {
        println!("Badges earned:");
        for id in &outcome.badges_earned {
            println!("  * {}", content.badge_name(*id));
        }
    }
}

/// Print cumulative statistics and badge progress from the save file.
pub fn status(save_path: &Path) -> Result<(), String> {
    let data = persistence::load_progress(save_path)
        .map_err(|e| format!("Cannot read {}: {}", save_path.display(), e))?;
    let Some(data) = data else {
        println!("No saved progress at {}", save_path.display());
        return Ok(());
    };

    let s = &data.stats;
    println!("=== Progress ===");
    println!("Total play time: {:.1}s", s.total_play_time_ms / 1000.0);
    println!("Best survival: {:.1}s", s.best_survival_time_ms / 1000.0);
    println!("Events handled: {}", s.events_handled);
    println!("Correct choices: {}", s.correct_event_choices);
    println!("Actions taken: {}", s.actions_taken);
    println!();
    println!("--- Badge progress ---");
    if data.badge_progress.is_empty() {
        println!("  (none)");
    } else {
        for (id, value) in &data.badge_progress {
            let mark = if data.earned_badges.contains(id) { "x" } else { " " };
            println!("  [{}] {:<20} {:.1}", mark, id.name(), value);
        }
    }
    Ok(())
}

/// List every badge with its earned mark.
pub fn list_badges(content: &ContentCatalog, save_path: &Path) -> Result<(), String> {
    let earned = load_or_default(save_path).earned_badges;
    println!("{:<4}{:<22}{}", "", "Badge", "Description");
    println!("{}", "-".repeat(60));
    for id in BadgeId::ALL {
        let mark = if earned.contains(&id) { "[x]" } else { "[ ]" };
        let (name, description) = match content.badge(id) {
            Some(b) => (b.name.as_str(), b.description.as_str()),
            None => (id.name(), ""),
        };
        println!("{:<4}{:<22}{}", mark, name, description);
    }
    println!("\n{} of {} earned", earned.len(), BadgeId::ALL.len());
    Ok(())
}

pub fn reset(save_path: &Path) -> Result<(), String> {
    persistence::clear_progress(save_path)
        .map_err(|e| format!("Cannot delete {}: {}", save_path.display(), e))?;
    println!("Progress cleared ({})", save_path.display());
    Ok(())
}

/// Load and validate both files, reporting every problem found.
pub fn check(config_path: &Path, content_path: &Path) -> Result<(), String> {
    let mut problems = Vec::new();

    match GameConfig::from_file(config_path) {
        Ok(config) => println!(
            "{}: ok ({} organelles, events every {}-{}ms)",
            config_path.display(),
            config.initial_values.organelles.len(),
            config.events.min_interval_ms,
            config.events.max_interval_ms
        ),
        Err(e) => problems.push(e.to_string()),
    }

    match ContentCatalog::from_file(content_path) {
        Ok(content) => println!(
            "{}: ok ({} events, {} badges)",
            content_path.display(),
            content.events.len(),
            content.badges.len()
        ),
        Err(e) => problems.push(e.to_string()),
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::content::tests::{sample_catalog, SAMPLE as CONTENT};
    use crate::config::game::tests::{sample_config, SAMPLE as CONFIG};
    use crate::clock::ManualClock;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn short_run_saves_progress() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("progress.json");
        let mut config = sample_config();
        config.tick_interval_ms = 50;
        config.badge_interval_ms = 100;

        let options = RunOptions {
            seed: 9,
            save_path: Some(save.clone()),
            max_seconds: Some(0.4),
            time_scale: 2.0,
            ..Default::default()
        };
        let outcome = run_game(Arc::new(config), Arc::new(sample_catalog()), &options)
            .await
            .unwrap();

        assert!(outcome.game_over.is_none());
        assert!(outcome.survived_ms >= 400.0);
        let saved = persistence::load_progress(&save).unwrap().unwrap();
        assert_eq!(saved, outcome.progress);
        assert!(saved.stats.total_play_time_ms >= 400.0);
    }

    #[test]
    fn earned_badge_is_saved_immediately() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("progress.json");
        let mut config = sample_config();
        config.badges.survivor_seconds = 1.0;
        let clock = Arc::new(ManualClock::new(10_000));
        let mut session = Session::new(
            Arc::new(config),
            Arc::new(sample_catalog()),
            clock.clone(),
            4,
        )
        .unwrap();
        session.start();

        clock.advance(500);
        session.tick();
        assert!(evaluate_badges_and_save(&mut session, Some(&save)).is_empty());
        assert!(!save.exists());

        clock.advance(500);
        session.tick();
        let earned = evaluate_badges_and_save(&mut session, Some(&save));
        assert_eq!(earned, vec![BadgeId::Survivor3Min]);
        let saved = persistence::load_progress(&save).unwrap().unwrap();
        assert!(saved.earned_badges.contains(&BadgeId::Survivor3Min));
    }

    #[test]
    fn check_accepts_valid_files() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let content = dir.path().join("content.json");
        fs::write(&config, CONFIG).unwrap();
        fs::write(&content, CONTENT).unwrap();
        assert!(check(&config, &content).is_ok());
    }

    #[test]
    fn check_reports_both_files() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let content = dir.path().join("content.json");
        fs::write(&config, "tick_interval_ms = 500\n").unwrap();
        fs::write(&content, "[").unwrap();
        let err = check(&config, &content).unwrap_err();
        assert!(err.contains("config.toml"));
        assert!(err.contains("content.json"));
    }

    #[test]
    fn status_and_reset_handle_missing_save() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("progress.json");
        assert!(status(&save).is_ok());
        assert!(reset(&save).is_ok());
        assert!(list_badges(&sample_catalog(), &save).is_ok());
    }

    #[test]
    fn reset_removes_save() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("progress.json");
        persistence::save_progress(&save, &SaveData::default()).unwrap();
        reset(&save).unwrap();
        assert!(!save.exists());
    }
}
