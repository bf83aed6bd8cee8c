use clap::ValueEnum;
use fastrace::prelude::*;
use std::{
    fs::File,
    io::{self, ErrorKind, Seek, SeekFrom, Write},
};

/// Zero chunk written per call by the portable allocator (glibc `BUFSIZ`).
pub const ZERO_CHUNK_SIZE: usize = 8 * 1024;

/// Gives a freshly truncated file its final length.
pub trait Allocator {
    fn name(&self) -> &'static str;

    /// Extend `file`, currently empty and positioned at offset 0, to `len` bytes.
    fn allocate(&self, file: &mut File, len: u64) -> io::Result<()>;
}

/// Which full-allocation strategy to use.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AllocatorKind {
    /// Platform fast path, falling back to writing zeros when unsupported
    #[default]
    Auto,
    /// Platform fast path only
    Native,
    /// Write zero-filled chunks
    Portable,
}

impl AllocatorKind {
    pub fn build(self) -> Box<dyn Allocator> {
        match self {
            AllocatorKind::Auto => Box::new(AdaptiveAllocator),
            AllocatorKind::Native => Box::new(NativeAllocator),
            AllocatorKind::Portable => Box::new(PortableAllocator),
        }
    }
}

/// Reserves real, zeroed blocks with the OS primitive (`posix_fallocate` and friends).
pub struct NativeAllocator;

impl Allocator for NativeAllocator {
    fn name(&self) -> &'static str {
        "native"
    }

    fn allocate(&self, file: &mut File, len: u64) -> io::Result<()> {
        // posix_fallocate rejects a zero length, and there is nothing to reserve.
        if len == 0 {
            return Ok(());
        }
        let _span = LocalSpan::enter_with_local_parent("native_allocate");
        fast_allocate(file, len)
    }
}

// posix_fallocate reports failure through its return value, not errno.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn fast_allocate(file: &File, len: u64) -> io::Result<()> {
    use nix::{errno::Errno, fcntl::posix_fallocate, libc::off_t};

    // Lengths past off_t come out negative in C, which the kernel rejects.
    let len = off_t::try_from(len).map_err(|_| io::Error::from(Errno::EINVAL))?;
    posix_fallocate(file, 0, len).map_err(io::Error::from)
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn fast_allocate(file: &File, len: u64) -> io::Result<()> {
    fs2::FileExt::allocate(file, len)
}

/// Whether a fast-allocate failure means the primitive is missing
/// rather than that the allocation itself failed.
fn is_unsupported(err: &io::Error) -> bool {
    if err.kind() == ErrorKind::Unsupported {
        return true;
    }
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        if let Some(code) = err.raw_os_error() {
            return matches!(Errno::from_raw(code), Errno::EOPNOTSUPP | Errno::ENOSYS);
        }
    }
    false
}

/// Writes zero-filled chunks until `len` bytes are on disk.
pub struct PortableAllocator;

impl Allocator for PortableAllocator {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn allocate(&self, file: &mut File, len: u64) -> io::Result<()> {
        let _span = LocalSpan::enter_with_local_parent("portable_allocate");
        write_zeros(file, len)
    }
}

fn write_zeros<W: Write>(out: &mut W, len: u64) -> io::Result<()> {
    let buffer = [0u8; ZERO_CHUNK_SIZE];

    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(ZERO_CHUNK_SIZE as u64) as usize;
        match out.write(&buffer[..n]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "failed to write zero-filled block",
                ));
            }
            // Short writes only advance by what actually landed.
            Ok(written) => remaining -= written as u64,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Native allocation with a runtime fallback to the portable write loop.
pub struct AdaptiveAllocator;

impl Allocator for AdaptiveAllocator {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn allocate(&self, file: &mut File, len: u64) -> io::Result<()> {
        allocate_or_fall_back(&NativeAllocator, file, len)
    }
}

fn allocate_or_fall_back(primary: &dyn Allocator, file: &mut File, len: u64) -> io::Result<()> {
    match primary.allocate(file, len) {
        Err(e) if is_unsupported(&e) => {
            log::debug!(
                "{} allocation unsupported ({e}), writing zeros instead",
                primary.name()
            );
            // A failed attempt may have moved the length; start over.
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            PortableAllocator.allocate(file, len)
        }
        result => result,
    }
}

/// Sets the logical length by writing one zero byte at `len - 1`.
///
/// Preceding bytes are left as a hole where the file system supports it.
/// A zero length is an error since the seek target would be negative.
pub struct SparseAllocator;

impl Allocator for SparseAllocator {
    fn name(&self) -> &'static str {
        "sparse"
    }

    fn allocate(&self, file: &mut File, len: u64) -> io::Result<()> {
        let last = len.checked_sub(1).ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidInput,
                "invalid seek to a negative offset",
            )
        })?;

        file.seek(SeekFrom::Start(last))?;
        if file.write(&[0])? != 1 {
            return Err(io::Error::new(
                ErrorKind::WriteZero,
                "failed to write final byte",
            ));
        }
        Ok(())
    }
}
