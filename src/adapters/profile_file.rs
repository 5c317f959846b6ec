//! JSON profile file adapter.
//!
//! Profiles live one per file in a directory:
//!
//! ```json
//! { "name": "cone-05", "data": [[0, 20], [3600, 200], [14400, 1050]] }
//! ```
//!
//! Each `data` entry is `[seconds, temperature]` with temperatures in the
//! configured display scale. Points are sorted by time before validation,
//! so authoring order does not matter; duplicate times are still rejected.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::app::ports::ProfileSource;
use crate::config::TempScale;
use crate::profile::{Profile, ProfileError, ProfilePoint};

#[derive(Debug, Deserialize)]
struct ProfileDoc {
    name: String,
    data: Vec<(f32, f32)>,
}

/// Parse one profile document, converting temperatures from `scale` to °C.
pub fn parse_profile(json: &str, scale: TempScale) -> Result<Profile, ProfileError> {
    let doc: ProfileDoc = serde_json::from_str(json).map_err(|e| {
        debug!("Profile: parse failed: {e}");
        ProfileError::Unreadable
    })?;
    let mut points: Vec<ProfilePoint> = doc
        .data
        .into_iter()
        .map(|(secs, temp)| ProfilePoint::new(secs, scale.to_celsius(temp)))
        .collect();
    points.sort_by(|a, b| a.offset_secs.total_cmp(&b.offset_secs));
    Profile::new(doc.name, points)
}

pub struct JsonProfileFile {
    dir: PathBuf,
    scale: TempScale,
}

impl JsonProfileFile {
    pub fn new(dir: impl Into<PathBuf>, scale: TempScale) -> Self {
        Self {
            dir: dir.into(),
            scale,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_path(&self, path: &Path) -> Result<Profile, ProfileError> {
        let text = fs::read_to_string(path).map_err(|e| {
            warn!("Profile: read {} failed: {e}", path.display());
            ProfileError::Unreadable
        })?;
        parse_profile(&text, self.scale)
    }

    /// Every profile in the directory that parses, sorted by name.
    /// Files that fail to parse are skipped with a warning.
    pub fn list(&self) -> Vec<Profile> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            warn!("Profile: cannot read directory {}", self.dir.display());
            return Vec::new();
        };
        let mut out: Vec<Profile> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| match self.load_path(&p) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!("Profile: skipping {}: {e}", p.display());
                    None
                }
            })
            .collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }
}

impl ProfileSource for JsonProfileFile {
    /// Looks up `name` as a profile name in the directory, then as a file
    /// path. The name match wins so a profile can be renamed without
    /// renaming its file.
    fn load_profile(&self, name: &str) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.list().into_iter().find(|p| p.name() == name) {
            info!("Profile: loaded '{}' from {}", name, self.dir.display());
            return Ok(profile);
        }
        let path = Path::new(name);
        if path.is_file() {
            let profile = self.load_path(path)?;
            info!("Profile: loaded '{}' from {}", profile.name(), path.display());
            return Ok(profile);
        }
        warn!("Profile: '{}' not found", name);
        Err(ProfileError::Unreadable)
    }
}
