use memmap2::{Mmap, MmapMut};
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use crate::cleanup::defer;

/// A writable region, owned by the process that created it.
///
/// Creation fails if the name is already taken; the creator may ask for
/// the name to be removed again when the handle drops.
pub struct ShmRegionMut {
    _file: File,
    mmap: MmapMut,
    path: PathBuf,
    remove_on_close: bool,
}

/// A read-only view of an existing region.
pub struct ShmRegion {
    _file: File,
    mmap: Mmap,
}

impl ShmRegionMut {
    /// Create a new region of `size_bytes` at `path` and map it read-write.
    ///
    /// Fails with `AlreadyExists` if the name is taken, or with the
    /// underlying OS error if the file cannot be sized or mapped. When
    /// `remove_on_close` is set, dropping the handle removes the name;
    /// mappings other processes already hold stay valid.
    pub fn create_rw<P: AsRef<Path>>(
        path: P,
        size_bytes: u64,
        remove_on_close: bool,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(&path)?;

        // The name exists from here on; take it back if sizing or mapping fails.
        let unlink = defer(|| {
            let _ = fs::remove_file(&path);
        });

        file.set_len(size_bytes)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        unlink.dismiss();
        Ok(Self {
            _file: file,
            mmap,
            path,
            remove_on_close,
        })
    }

    /// Raw pointer to the start of the region.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ShmRegionMut {
    fn drop(&mut self) {
        if self.remove_on_close {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl ShmRegion {
    /// Open an existing region at `path` and map it read-only.
    ///
    /// Fails with `NotFound` if no region was created under that name.
    pub fn open_ro<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { _file: file, mmap })
    }

    /// Raw pointer to the start of the region.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }
}
