use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::warn;

use super::profile::DeviceProfile;
use crate::types::Args;

/// One JSON file per [`DeviceProfile`], named after the profile id
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Open the store, creating `dir` if needed
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).context("Failed to create profile directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, profile: &DeviceProfile) -> Result<()> {
        let path = self.profile_path(&profile.id)?;
        let json = serde_json::to_string_pretty(profile).context("Failed to serialize device profile")?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).with_context(|| format!("Failed to write profile to {:?}", temp_path))?;
        fs::rename(&temp_path, &path).with_context(|| format!("Failed to replace profile at {:?}", path))?;
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<DeviceProfile> {
        let path = self.profile_path(id)?;
        let json = fs::read_to_string(&path).with_context(|| format!("Failed to read profile from {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse profile {:?}", path))
    }

    /// Remove a profile; missing profiles are not an error
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.profile_path(id)?;
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to delete profile at {:?}", path))?;
        }
        Ok(())
    }

    /// Every readable profile, sorted by id. Unparseable files are skipped.
    pub fn list_all(&self) -> Result<Vec<DeviceProfile>> {
        let mut profiles = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            match serde_json::from_str::<DeviceProfile>(&json) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!("Skipping profile {:?}: {}", path, e),
            }
        }

        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }

    /// Profiles whose construction args are all present in `device`, as returned by enumerate
    pub fn find_matching(&self, device: &Args) -> Result<Vec<DeviceProfile>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|p| p.args.iter().all(|(k, v)| device.get(k) == Some(v)))
            .collect())
    }

    fn profile_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            bail!("Invalid profile id {:?}", id);
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamFormat;
    use tempfile::tempdir;

    fn profile(id: &str, serial: &str) -> DeviceProfile {
        let mut args = Args::new();
        args.insert("driver".to_string(), "sim".to_string());
        args.insert("serial".to_string(), serial.to_string());
        DeviceProfile::new(id, format!("Device {}", id), args)
    }

    #[test]
    fn test_save_and_load_profile() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().to_path_buf()).unwrap();

        let mut saved = profile("test-1", "A1");
        saved.stream.format = StreamFormat::CS8;
        saved.stream.sample_rate = Some(2.4e6);
        store.save(&saved).unwrap();

        assert_eq!(store.load("test-1").unwrap(), saved);
        assert!(!dir.path().join("test-1.tmp").exists());
    }

    #[test]
    fn test_list_all_profiles_sorted() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().to_path_buf()).unwrap();

        for i in [2, 0, 1] {
            store.save(&profile(&format!("device-{}", i), "A1")).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let ids: Vec<String> = store.list_all().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["device-0", "device-1", "device-2"]);
    }

    #[test]
    fn test_delete_profile() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().to_path_buf()).unwrap();

        store.save(&profile("gone", "A1")).unwrap();
        store.delete("gone").unwrap();
        store.delete("gone").unwrap();

        assert!(store.load("gone").is_err());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().to_path_buf()).unwrap();

        assert!(store.load("../escape").is_err());
        assert!(store.save(&profile("", "A1")).is_err());
    }

    #[test]
    fn test_find_matching_by_enumerated_args() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().to_path_buf()).unwrap();
        store.save(&profile("a", "A1")).unwrap();
        store.save(&profile("b", "B2")).unwrap();

        let mut found = Args::new();
        found.insert("driver".to_string(), "sim".to_string());
        found.insert("label".to_string(), "Simulated SDR :: B2".to_string());
        found.insert("serial".to_string(), "B2".to_string());

        let matching = store.find_matching(&found).unwrap();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, "b");
    }
}
