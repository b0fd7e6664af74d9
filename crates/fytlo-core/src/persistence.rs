use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use super::error::PersistenceError;
use super::state::AutoSavePreference;

pub const AUTO_SAVE_PREFERENCE_KEY: &str = "fytlo.autoSavePreference";

/// Integer-valued key-value persistence. Writes are synchronous.
pub trait PreferenceStore {
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    values: BTreeMap<String, i64>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object of integer values on disk, rewritten whole on every set.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl FilePreferenceStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let values = load_values(&path);
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), PersistenceError> {
        let mut next = self.values.clone();
        next.insert(key.to_string(), value);
        let encoded = serde_json::to_vec_pretty(&next)?;
        write_private(&self.path, &encoded)?;
        self.values = next;
        Ok(())
    }
}

/// Unknown codes and a missing key both restore as `Unknown`.
pub fn load_auto_save_preference(store: &dyn PreferenceStore) -> AutoSavePreference {
    store
        .get_i64(AUTO_SAVE_PREFERENCE_KEY)
        .and_then(AutoSavePreference::from_code)
        .unwrap_or(AutoSavePreference::Unknown)
}

pub fn store_auto_save_preference(
    store: &mut dyn PreferenceStore,
    preference: AutoSavePreference,
) -> Result<(), PersistenceError> {
    store.set_i64(AUTO_SAVE_PREFERENCE_KEY, preference.code())
}

fn load_values(path: &Path) -> BTreeMap<String, i64> {
    let Ok(bytes) = std::fs::read(path) else {
        return BTreeMap::new();
    };
    match serde_json::from_slice::<BTreeMap<String, i64>>(&bytes) {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable preference file");
            BTreeMap::new()
        }
    }
}

fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::load_auto_save_preference;
    use super::store_auto_save_preference;
    use super::FilePreferenceStore;
    use super::MemoryPreferenceStore;
    use super::PreferenceStore;
    use super::AUTO_SAVE_PREFERENCE_KEY;
    use crate::state::AutoSavePreference;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_restores_unknown() {
        let dir = tempdir().expect("tmpdir");
        let store = FilePreferenceStore::open(dir.path().join("prefs.json")).expect("open");
        assert_eq!(load_auto_save_preference(&store), AutoSavePreference::Unknown);
    }

    #[test]
    fn preference_survives_reopen() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("nested").join("prefs.json");
        let mut store = FilePreferenceStore::open(&path).expect("open");
        store_auto_save_preference(&mut store, AutoSavePreference::Disabled).expect("store");

        let reopened = FilePreferenceStore::open(&path).expect("reopen");
        assert_eq!(load_auto_save_preference(&reopened), AutoSavePreference::Disabled);
    }

    #[test]
    fn out_of_range_code_restores_unknown() {
        let mut store = MemoryPreferenceStore::new();
        store.set_i64(AUTO_SAVE_PREFERENCE_KEY, 42).expect("set");
        assert_eq!(load_auto_save_preference(&store), AutoSavePreference::Unknown);
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").expect("write");
        let mut store = FilePreferenceStore::open(&path).expect("open");
        assert_eq!(load_auto_save_preference(&store), AutoSavePreference::Unknown);

        store_auto_save_preference(&mut store, AutoSavePreference::Enabled).expect("store");
        let reopened = FilePreferenceStore::open(&path).expect("reopen");
        assert_eq!(reopened.get_i64(AUTO_SAVE_PREFERENCE_KEY), Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn preference_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("prefs.json");
        let mut store = FilePreferenceStore::open(&path).expect("open");
        store_auto_save_preference(&mut store, AutoSavePreference::Enabled).expect("store");
        let mode = std::fs::metadata(&path).expect("meta").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
