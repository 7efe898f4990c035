//! Loading difficulty presets from disk.

use cavecrawl::{CrawlError, CrawlResult, Difficulty, GameState, GenerationConfig, Settings};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_settings(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_saved_settings_load_back() -> CrawlResult<()> {
    let mut settings = Settings::builtin()?;
    settings.hard.player.coins = 99;
    settings.hard.caves.min = 4;
    let file = write_settings(&settings.to_json()?);

    let loaded = Settings::load_from_path(file.path())?;
    assert_eq!(loaded.hard.player.coins, 99);
    assert_eq!(loaded.hard.caves.min, 4);
    assert_eq!(loaded.normal.weapons.len(), settings.normal.weapons.len());

    let state = GameState::new_session(&loaded, Difficulty::Hard, GenerationConfig::new(8))?;
    assert_eq!(state.player.coins, 99);
    Ok(())
}

#[test]
fn test_malformed_file_is_a_serde_error() {
    let file = write_settings("{ \"easy\": ");
    assert!(matches!(
        Settings::load_from_path(file.path()),
        Err(CrawlError::Serde(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Settings::load_from_path(dir.path().join("missing.json")),
        Err(CrawlError::Io(_))
    ));
}

#[test]
fn test_unknown_archetype_is_rejected() -> CrawlResult<()> {
    let mut settings = Settings::builtin()?;
    settings.easy.caves_setup.fight[0].archetype = "Dragon".to_string();
    let file = write_settings(&settings.to_json()?);

    match Settings::load_from_path(file.path()) {
        Err(CrawlError::InvalidConfig(reason)) => {
            assert!(reason.contains("easy"));
            assert!(reason.contains("Dragon"));
        }
        other => panic!("expected a configuration error, got {other:?}"),
    }
    Ok(())
}
