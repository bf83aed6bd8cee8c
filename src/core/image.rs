//! The `alloc` and `sparse` commands.
//!
//! Both create a disk image of a parsed size and hand it to a
//! [`DriveManager`]. Once the file exists, any failure removes it again.

use crate::{
    core::{
        allocator::{Allocator, SparseAllocator},
        drive::DriveManager,
    },
    error::{CommandError, CommandResult},
    utils::{self, SizeMode},
};
use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

pub const ALLOC_USAGE: &str = "use 'alloc file size' to create an image";
pub const SPARSE_USAGE: &str = "use 'sparse file size' to create a sparse image";

/// Create a fully allocated image: `alloc <file> <size>`.
pub fn alloc(
    drives: &mut dyn DriveManager,
    allocator: &dyn Allocator,
    sizes: SizeMode,
    args: &[&str],
) -> CommandResult<()> {
    let [path, size] = args else {
        return Err(CommandError::ArgumentCount(ALLOC_USAGE));
    };
    let size = sizes.parse(size)?;
    create_image(drives, allocator, Path::new(*path), size)
}

/// Create a sparse image: `sparse <file> <size>`.
pub fn sparse(drives: &mut dyn DriveManager, sizes: SizeMode, args: &[&str]) -> CommandResult<()> {
    let [path, size] = args else {
        return Err(CommandError::ArgumentCount(SPARSE_USAGE));
    };
    let size = sizes.parse(size)?;
    create_image(drives, &SparseAllocator, Path::new(*path), size)
}

fn create_image(
    drives: &mut dyn DriveManager,
    allocator: &dyn Allocator,
    path: &Path,
    size: u64,
) -> CommandResult<()> {
    if !drives.is_configurable() {
        return Err(CommandError::PreconditionFailed);
    }

    log::info!(
        "Creating {} image {} ({})",
        allocator.name(),
        path.display(),
        utils::format_size(size)
    );

    let mut file = open_image(path).map_err(|e| CommandError::io("open", path, e))?;
    let pending = PendingImage::new(path);

    allocator
        .allocate(&mut file, size)
        .map_err(|e| CommandError::io("allocate", path, e))?;

    close_image(file).map_err(|e| CommandError::io("close", path, e))?;

    drives.add_drive(path)?;
    pending.commit();

    log::debug!("Registered {} as a drive", path.display());
    Ok(())
}

fn open_image(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o666);
    }

    options.open(path)
}

// Dropping a File swallows close(2) errors, so flush explicitly to surface
// deferred write failures before the image is registered.
fn close_image(file: File) -> io::Result<()> {
    file.sync_all()
}

/// Newly created image that is deleted on drop unless committed.
struct PendingImage {
    path: PathBuf,
    committed: bool,
}

impl PendingImage {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            committed: false,
        }
    }

    /// The drive manager owns the file now.
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingImage {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::debug!("Failed to remove {}: {}", self.path.display(), e);
        } else {
            log::debug!("Removed incomplete image {}", self.path.display());
        }
    }
}
