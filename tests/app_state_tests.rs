//! Application-root wiring: first-run defaults, settings, profile updates
//! and the forced shutdown save.

use std::path::Path;
use std::time::Duration;

use studypet_core::config::Config;
use studypet_core::pet::{PetStage, PetType};
use studypet_core::state::AppState;
use studypet_core::store::SaveStore;

fn test_config(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        log_level: "info".to_string(),
        file_logs: false,
        log_dir: data_dir.join("logs"),
        backup_retention: 3,
        confirmation_window: Duration::from_secs(300),
        tick_interval: Duration::from_secs(1),
        mastery_per_study_minute: 1,
        smoothing_window: 10,
        camera_interval: Duration::from_millis(200),
        camera_join_timeout: Duration::from_secs(2),
    }
}

#[test]
fn test_first_run_starts_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppState::load(test_config(dir.path()));

    assert!(app.is_first_time_user());
    assert_eq!(app.user_profile().username, "Player");
    assert_eq!(app.pet().stage(), PetStage::Egg);
    assert_eq!(app.theme(), "soft_pink");
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let app = AppState::load(test_config(dir.path()));
        app.pet().choose_pet(PetType::Raccoon, "Bandit");
        app.pet().grant_mastery(75);
        app.set_theme("midnight");
        app.record_answers(8, 6);
        app.flush().unwrap();
    }

    let app = AppState::load(test_config(dir.path()));
    assert!(!app.is_first_time_user());
    assert_eq!(app.pet().mastery(), 75);
    assert_eq!(app.theme(), "midnight");

    let profile = app.user_profile();
    assert_eq!(profile.total_questions_answered, 8);
    assert_eq!(profile.correct_answers, 6);
    assert_eq!(profile.experience, 60);
}

#[test]
fn test_reset_all_wipes_disk_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let app = AppState::load(config.clone());

    app.pet().choose_pet(PetType::Cat, "Miso");
    app.pet().grant_mastery(500);
    assert_eq!(app.pet().stage(), PetStage::Baby);

    app.reset_all().unwrap();

    assert!(app.is_first_time_user());
    assert_eq!(app.pet().stage(), PetStage::Egg);
    assert_eq!(app.pet().mastery(), 0);
    assert!(!dir.path().join("backups").exists());

    // Whatever is on disk after the reset must describe a fresh egg.
    match SaveStore::read_document(&config.save_file_path()) {
        Ok(doc) => {
            assert_eq!(doc.pet_state.stage, PetStage::Egg);
            assert!(doc.pet.is_none());
        }
        Err(_) => {} // an absent file is an equally valid fresh state
    }
}

#[test]
fn test_settings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppState::load(test_config(dir.path()));

    app.set_setting("music_volume", serde_json::json!(0.4));
    assert_eq!(app.setting("music_volume"), Some(serde_json::json!(0.4)));
    assert_eq!(app.setting("missing"), None);
}
