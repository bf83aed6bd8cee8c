use crate::error::DriveError;
use std::path::{Path, PathBuf};

/// Backend that accepts disk images as drives.
pub trait DriveManager {
    /// Whether drives may still be added.
    fn is_configurable(&self) -> bool;

    fn add_drive(&mut self, path: &Path) -> Result<(), DriveError>;
}

/// A registered drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drive {
    pub index: usize,
    pub path: PathBuf,
    /// Logical length of the image when it was added.
    pub size: u64,
}

/// In-process drive manager.
///
/// Drives can be added until [`DriveRegistry::launch`] closes the
/// configuration phase.
#[derive(Debug, Default)]
pub struct DriveRegistry {
    drives: Vec<Drive>,
    launched: bool,
}

impl DriveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    /// Close the configuration phase.
    pub fn launch(&mut self) -> Result<(), DriveError> {
        if self.launched {
            return Err(DriveError::AlreadyLaunched);
        }
        if self.drives.is_empty() {
            return Err(DriveError::NoDrives);
        }
        self.launched = true;
        log::info!("Launched with {} drive(s)", self.drives.len());
        Ok(())
    }
}

impl DriveManager for DriveRegistry {
    fn is_configurable(&self) -> bool {
        !self.launched
    }

    fn add_drive(&mut self, path: &Path) -> Result<(), DriveError> {
        if self.launched {
            return Err(DriveError::AlreadyLaunched);
        }

        let metadata = match path.metadata() {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriveError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(DriveError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if !metadata.is_file() {
            return Err(DriveError::NotAFile(path.to_path_buf()));
        }

        let drive = Drive {
            index: self.drives.len(),
            path: path.to_path_buf(),
            size: metadata.len(),
        };
        log::debug!("Added drive #{}: {}", drive.index, drive.path.display());
        self.drives.push(drive);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn image(dir: &TempDir, name: &str, len: u64) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().set_len(len).unwrap();
        path
    }

    #[test]
    fn adds_drives_in_order() {
        let dir = TempDir::new().unwrap();
        let mut registry = DriveRegistry::new();

        registry.add_drive(&image(&dir, "a.img", 512)).unwrap();
        registry.add_drive(&image(&dir, "b.img", 1024)).unwrap();

        let drives = registry.drives();
        assert_eq!(drives.len(), 2);
        assert_eq!(drives[0].index, 0);
        assert_eq!(drives[1].index, 1);
        assert_eq!(drives[1].size, 1024);
    }

    #[test]
    fn rejects_missing_and_directory_paths() {
        let dir = TempDir::new().unwrap();
        let mut registry = DriveRegistry::new();

        let missing = registry.add_drive(&dir.path().join("missing.img"));
        assert!(matches!(missing, Err(DriveError::NotFound(_))));

        let directory = registry.add_drive(dir.path());
        assert!(matches!(directory, Err(DriveError::NotAFile(_))));
        assert!(registry.drives().is_empty());
    }

    #[test]
    fn same_image_can_back_two_drives() {
        let dir = TempDir::new().unwrap();
        let path = image(&dir, "a.img", 512);
        let mut registry = DriveRegistry::new();

        registry.add_drive(&path).unwrap();
        registry.add_drive(&path).unwrap();

        let drives = registry.drives();
        assert_eq!(drives.len(), 2);
        assert_eq!(drives[0].path, drives[1].path);
        assert_eq!(drives[1].index, 1);
    }

    #[test]
    fn launch_closes_configuration() {
        let dir = TempDir::new().unwrap();
        let mut registry = DriveRegistry::new();

        assert!(matches!(registry.launch(), Err(DriveError::NoDrives)));

        registry.add_drive(&image(&dir, "a.img", 512)).unwrap();
        assert!(registry.is_configurable());
        registry.launch().unwrap();
        assert!(!registry.is_configurable());
        assert!(matches!(registry.launch(), Err(DriveError::AlreadyLaunched)));
        assert!(matches!(
            registry.add_drive(&image(&dir, "b.img", 512)),
            Err(DriveError::AlreadyLaunched)
        ));
    }
}
