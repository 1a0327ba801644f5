use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::cell::{BadgeId, Stats};

/// Bumped whenever the save layout changes. Older files are discarded.
pub const SAVE_VERSION: u32 = 1;

/// Progress that outlives a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub earned_badges: BTreeSet<BadgeId>,
    pub stats: Stats,
    pub badge_progress: BTreeMap<BadgeId, f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveEnvelope {
    version: u32,
    timestamp: u64,
    data: SaveData,
}

/// Only the version, so a newer or older layout can be recognised without
/// parsing its payload.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Write progress with an atomic temp-file rename, so a crash mid-write never
/// leaves a truncated save behind.
pub fn save_progress(path: &Path, data: &SaveData) -> Result<(), SaveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        timestamp: unix_timestamp_ms(),
        data: data.clone(),
    };
    let encoded = serde_json::to_vec_pretty(&envelope)
        .map_err(|e| SaveError::Serialize(e.to_string()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "progress".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(SaveError::Io(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(SaveError::Io(e));
    }

    info!(
        path = %path.display(),
        badges = data.earned_badges.len(),
        "Progress saved"
    );
    Ok(())
}

/// Load saved progress.
///
/// A missing file is `Ok(None)`. A file from another save version is removed
/// and also yields `Ok(None)`. Unreadable or corrupt data is an error.
pub fn load_progress(path: &Path) -> Result<Option<SaveData>, SaveError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SaveError::Io(e)),
    };

    let probe: VersionProbe =
        serde_json::from_slice(&raw).map_err(|e| SaveError::Deserialize(e.to_string()))?;
    if probe.version != SAVE_VERSION {
        warn!(
            path = %path.display(),
            found = probe.version,
            expected = SAVE_VERSION,
            "Save version mismatch; discarding saved progress"
        );
        clear_progress(path)?;
        return Ok(None);
    }

    let envelope: SaveEnvelope =
        serde_json::from_slice(&raw).map_err(|e| SaveError::Deserialize(e.to_string()))?;
    Ok(Some(envelope.data))
}

/// Delete the save file. Deleting a file that is not there is not an error.
pub fn clear_progress(path: &Path) -> Result<(), SaveError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SaveError::Io(e)),
    }
}
