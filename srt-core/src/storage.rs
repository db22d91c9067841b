use anyhow::{Context, Result};
use fs2::FileExt;
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::TemplateLibrary;
use crate::source::TemplateSource;

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// On-disk encoding of a template file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    Yaml,
    Json,
}

impl StorageFormat {
    /// Infers the format from the file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => StorageFormat::Yaml,
            _ => StorageFormat::Json,
        }
    }
}

impl std::fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageFormat::Yaml => write!(f, "YAML"),
            StorageFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Loads and saves a template file, using a lock file so concurrent
/// callers get read-modify-write atomicity
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
    format: StorageFormat,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let mut lock_name = file_path.as_os_str().to_os_string();
        lock_name.push(".lock");
        let format = StorageFormat::from_path(&file_path);
        Self {
            file_path,
            lock_file_path: PathBuf::from(lock_name),
            format,
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    /// Acquire an exclusive lock for writing.
    /// The returned handle must be held for the duration of the operation.
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_exclusive(f))?;
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading, if a lock file exists
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_shared(f))?;
        Ok(Some(lock_file))
    }

    fn wait_for_lock(
        &self,
        lock_file: &File,
        try_lock: impl Fn(&File) -> std::io::Result<()>,
    ) -> Result<()> {
        let start = std::time::Instant::now();

        loop {
            match try_lock(lock_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another process may be writing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    fn read_library(&self) -> Result<TemplateLibrary> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let mut library: TemplateLibrary = match self.format {
            StorageFormat::Yaml => serde_yaml::from_reader(reader)
                .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))?,
            StorageFormat::Json => serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path))?,
        };

        // Stored checklists are caches; recompute from content.
        library.refresh();
        Ok(library)
    }

    fn write_library(&self, library: &TemplateLibrary) -> Result<()> {
        let content = match self.format {
            StorageFormat::Yaml => serde_yaml::to_string(library)?,
            StorageFormat::Json => serde_json::to_string_pretty(library)?,
        };
        fs::write(&self.file_path, content)
            .with_context(|| format!("Failed to write {:?}", self.file_path))?;
        Ok(())
    }

    /// Loads the template library, creating an empty file if none exists
    pub fn load(&self) -> Result<TemplateLibrary> {
        if !self.file_path.exists() {
            warn!(
                "Template file {:?} does not exist; creating an empty one",
                self.file_path
            );
            let library = TemplateLibrary::new();
            self.save(&library)?;
            return Ok(library);
        }

        let _lock = self.acquire_read_lock()?;
        let library = self.read_library()?;
        debug!(
            "Loaded {} template(s) from {:?} ({})",
            library.srts.len(),
            self.file_path,
            self.format
        );
        Ok(library)
    }

    /// Saves the template library with an exclusive lock held
    pub fn save(&self, library: &TemplateLibrary) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = self.acquire_write_lock()?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        self.write_library(library)
        // Lock is released when lock_file is dropped
    }

    /// Reloads under an exclusive lock, applies `update_fn`, refreshes every
    /// requirement and saves. Concurrent writers are serialized; the last
    /// one wins.
    pub fn update_atomically<F, T>(&self, update_fn: F) -> Result<(TemplateLibrary, T)>
    where
        F: FnOnce(&mut TemplateLibrary) -> T,
    {
        if !self.file_path.exists() {
            self.save(&TemplateLibrary::new())?;
        }

        let mut lock_file = self.acquire_write_lock()?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let mut library = self.read_library()?;
        let outcome = update_fn(&mut library);
        library.refresh();
        self.write_library(&library)?;

        Ok((library, outcome))
    }
}

impl TemplateSource for Storage {
    fn load_library(&self) -> Result<TemplateLibrary> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChecklistStatus, Feature, Requirement, Template};
    use tempfile::tempdir;

    fn library() -> TemplateLibrary {
        let mut template = Template::new("SRT-1", "Family plan");
        let mut req = Requirement::new("BR01", "Remove phone line");
        req.features.push(Feature::new("F001", "Line removal"));
        req.refresh();
        template.business_requirements.push(req);
        TemplateLibrary {
            srts: vec![template],
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(StorageFormat::from_path(Path::new("a.yaml")), StorageFormat::Yaml);
        assert_eq!(StorageFormat::from_path(Path::new("a.yml")), StorageFormat::Yaml);
        assert_eq!(StorageFormat::from_path(Path::new("a.json")), StorageFormat::Json);
        assert_eq!(StorageFormat::from_path(Path::new("srts")), StorageFormat::Json);
    }

    #[test]
    fn test_save_and_load_yaml_and_json() -> Result<()> {
        let dir = tempdir()?;
        for name in ["srts.yaml", "srts.json"] {
            let storage = Storage::new(dir.path().join(name));
            storage.save(&library())?;
            let loaded = storage.load()?;
            assert_eq!(loaded, library());
        }
        Ok(())
    }

    #[test]
    fn test_load_missing_creates_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = Storage::new(dir.path().join("nested").join("srts.json"));
        let loaded = storage.load()?;
        assert!(loaded.srts.is_empty());
        assert!(storage.path().exists());
        Ok(())
    }

    #[test]
    fn test_load_recomputes_stale_checklist() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("srts.json");
        fs::write(
            &path,
            r#"{"srts":[{"srt_id":"SRT-1","business_requirements":[
                {"br_id":"BR01","title":"T","checklist":{"owners":"✔️"},"missing_info":[]}
            ]}]}"#,
        )?;

        let loaded = Storage::new(&path).load()?;
        let req = &loaded.srts[0].business_requirements[0];
        assert_eq!(req.checklist.owners, ChecklistStatus::Unsatisfied);
        assert_eq!(req.missing_info.len(), 5);
        Ok(())
    }

    #[test]
    fn test_load_accepts_both_template_id_keys() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("srts.json");
        fs::write(
            &path,
            r#"{"srts":[
                {"id":"SRT-1","srt_id":"SRT-1","title":"Both keys"},
                {"id":"SRT-2","title":"Only id"}
            ]}"#,
        )?;

        let storage = Storage::new(&path);
        let loaded = storage.load()?;
        assert_eq!(loaded.srts[0].srt_id, "SRT-1");
        assert_eq!(loaded.srts[1].srt_id, "SRT-2");
        assert!(storage.find_template("SRT-2")?.is_some());

        storage.save(&loaded)?;
        assert_eq!(storage.load()?, loaded);
        Ok(())
    }

    #[test]
    fn test_load_ignores_unreadable_derived_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("srts.yaml");
        fs::write(
            &path,
            "srts:\n- srt_id: SRT-1\n  business_requirements:\n  - br_id: BR01\n    title: T\n    checklist:\n      owners: done\n    missing_info:\n    - item: risks\n      prompt: old\n",
        )?;

        let loaded = Storage::new(&path).load()?;
        let req = &loaded.srts[0].business_requirements[0];
        assert_eq!(req.checklist.title, ChecklistStatus::Satisfied);
        assert_eq!(req.checklist.owners, ChecklistStatus::Unsatisfied);
        assert!(req.missing_info.iter().all(|m| m.prompt != "old"));
        assert_eq!(req.missing_info.len(), 5);
        Ok(())
    }

    #[test]
    fn test_update_atomically_refreshes() -> Result<()> {
        let dir = tempdir()?;
        let storage = Storage::new(dir.path().join("srts.yaml"));
        storage.save(&library())?;

        let (updated, applied) = storage.update_atomically(|lib| {
            lib.template_mut("SRT-1")
                .and_then(|t| t.requirement_mut("BR01"))
                .map(|r| {
                    r.features[0].acceptance_criteria.push("ok".to_string());
                })
                .is_some()
        })?;
        assert!(applied);

        let req = &updated.srts[0].business_requirements[0];
        assert_eq!(req.checklist.acceptance_criteria, ChecklistStatus::Satisfied);

        let reloaded = storage.load()?;
        assert_eq!(reloaded, updated);
        Ok(())
    }

    #[test]
    fn test_storage_is_a_template_source() -> Result<()> {
        let dir = tempdir()?;
        let storage = Storage::new(dir.path().join("srts.json"));
        storage.save(&library())?;
        assert!(storage.find_template("SRT-1")?.is_some());
        assert!(storage.find_template("SRT-2")?.is_none());
        Ok(())
    }
}
