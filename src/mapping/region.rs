//! Mapped region lifecycle: open, grow, shrink, flush, close

use std::{
    fs::{File, OpenOptions},
    path::PathBuf,
    sync::{Arc, RwLock},
};

use log::{debug, trace};
use memmap2::{Mmap, MmapMut, MmapOptions};
use serde::{Deserialize, Serialize};

use crate::error::{MapStructError, Result};

use super::config::{AccessMode, BackingKind, MappingConfig};

/// The live OS mapping, or its absence
#[derive(Debug)]
enum MapState {
    ReadWrite(MmapMut),
    ReadOnly(Mmap),
    /// No mapping: length zero after `shrink(0)`, or closed
    Empty,
}

impl MapState {
    fn bytes(&self) -> &[u8] {
        match self {
            MapState::ReadWrite(map) => map,
            MapState::ReadOnly(map) => map,
            MapState::Empty => &[],
        }
    }

    /// Writable base pointer into the mapping
    ///
    /// # Safety
    /// Caller must only call this on a `ReadWrite` mapping, must hold the
    /// region lock for the duration of every write through the pointer, and
    /// must stay within the mapped length. Overlapping concurrent writes are
    /// the caller's synchronization obligation, same as for any shared
    /// mapped memory.
    unsafe fn base_ptr_for_write(&self) -> *mut u8 {
        self.bytes().as_ptr() as *mut u8
    }
}

#[derive(Debug)]
struct RegionState {
    map: MapState,
    /// Backing file; also present for anonymous regions on Linux (memfd)
    file: Option<File>,
    len: usize,
    generation: u64,
    closed: bool,
}

/// Shared region internals; views hold a `Weak` reference to this
#[derive(Debug)]
pub(crate) struct RegionInner {
    state: RwLock<RegionState>,
    mode: AccessMode,
    backing: BackingKind,
    path: Option<PathBuf>,
}

/// Handle to one memory-mapped region
///
/// Exactly one live OS mapping exists per region; `grow`/`shrink` replace it
/// in place and bump the remap generation. The handle is cheap to clone; the
/// last clone dropped (or an explicit [`close`](MappedRegion::close)) unmaps
/// the region and invalidates every outstanding view.
#[derive(Debug, Clone)]
pub struct MappedRegion {
    inner: Arc<RegionInner>,
}

/// Snapshot of a region's observable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionStats {
    pub backing: BackingKind,
    pub mode: AccessMode,
    pub len: usize,
    pub generation: u64,
    pub path: Option<PathBuf>,
}

impl MappedRegion {
    /// Open or create a region per the configuration
    pub fn open(config: MappingConfig) -> Result<Self> {
        config.validate()?;

        let (file, map) = match &config.path {
            Some(path) => Self::open_file_backing(&config, path)?,
            None => Self::open_anonymous_backing(&config)?,
        };

        debug!(
            "opened {} region of {} bytes ({:?})",
            config.backing_kind().name(),
            config.initial_size,
            config.mode
        );

        Ok(Self {
            inner: Arc::new(RegionInner {
                state: RwLock::new(RegionState {
                    map,
                    file,
                    len: config.initial_size,
                    generation: 0,
                    closed: false,
                }),
                mode: config.mode,
                backing: config.backing_kind(),
                path: config.path.clone(),
            }),
        })
    }

    fn open_file_backing(
        config: &MappingConfig,
        path: &std::path::Path,
    ) -> Result<(Option<File>, MapState)> {
        let writable = config.mode.is_writable();
        let mut options = OpenOptions::new();
        options
            .read(true)
            .write(writable)
            .create(config.mode == AccessMode::CreateReadWrite)
            .truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(config.permissions);
        }
        let file = options
            .open(path)
            .map_err(|e| MapStructError::from_io(e, "Failed to open backing file"))?;

        let file_len = file
            .metadata()
            .map_err(|e| MapStructError::from_io(e, "Failed to stat backing file"))?
            .len();
        if (file_len as usize) < config.initial_size {
            if writable {
                // Extend with zero bytes up to the requested length
                file.set_len(config.initial_size as u64)
                    .map_err(|e| MapStructError::from_io(e, "Failed to extend backing file"))?;
            } else {
                return Err(MapStructError::size(
                    config.initial_size,
                    format!("read-only file is only {} bytes", file_len),
                ));
            }
        }

        let map = if writable {
            MapState::ReadWrite(Self::map_writable(&file, config.initial_size)?)
        } else {
            let map = unsafe { MmapOptions::new().len(config.initial_size).map(&file) }
                .map_err(|e| MapStructError::from_io(e, "Failed to map file read-only"))?;
            MapState::ReadOnly(map)
        };
        Ok((Some(file), map))
    }

    #[cfg(target_os = "linux")]
    fn open_anonymous_backing(config: &MappingConfig) -> Result<(Option<File>, MapState)> {
        use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
        use nix::unistd::ftruncate;

        // memfd gives anonymous regions a real descriptor, so grow/shrink go
        // through the same ftruncate-and-remap path as file-backed regions
        let fd = memfd_create(c"mapstruct", MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| MapStructError::mapping(format!("Failed to create memfd: {}", e)))?;
        ftruncate(&fd, config.initial_size as i64)
            .map_err(|e| MapStructError::mapping(format!("Failed to size memfd: {}", e)))?;
        let file = File::from(fd);
        let map = Self::map_writable(&file, config.initial_size)?;
        Ok((Some(file), MapState::ReadWrite(map)))
    }

    #[cfg(not(target_os = "linux"))]
    fn open_anonymous_backing(config: &MappingConfig) -> Result<(Option<File>, MapState)> {
        let map = MmapMut::map_anon(config.initial_size)
            .map_err(|e| MapStructError::from_io(e, "Failed to map anonymous memory"))?;
        Ok((None, MapState::ReadWrite(map)))
    }

    fn map_writable(file: &File, len: usize) -> Result<MmapMut> {
        unsafe { MmapOptions::new().len(len).map_mut(file) }
            .map_err(|e| MapStructError::from_io(e, "Failed to create memory mapping"))
    }

    /// Current mapping length in bytes
    pub fn len(&self) -> usize {
        self.inner.state.read().unwrap().len
    }

    /// Whether the region holds no mapped bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the region has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.state.read().unwrap().closed
    }

    /// Remap generation, bumped by every grow/shrink/close
    pub fn generation(&self) -> u64 {
        self.inner.state.read().unwrap().generation
    }

    /// Access mode the region was opened with
    pub fn mode(&self) -> AccessMode {
        self.inner.mode
    }

    /// Backing kind of the region
    pub fn backing(&self) -> BackingKind {
        self.inner.backing
    }

    /// Snapshot of the region's observable state
    pub fn stats(&self) -> RegionStats {
        let state = self.inner.state.read().unwrap();
        RegionStats {
            backing: self.inner.backing,
            mode: self.inner.mode,
            len: state.len,
            generation: state.generation,
            path: self.inner.path.clone(),
        }
    }

    /// Extend the region to `new_size` bytes
    ///
    /// All-or-nothing: on failure the region keeps its prior mapping. Bytes
    /// `[0, old_len)` are preserved, `[old_len, new_size)` read as zero. The
    /// caller must not access the region concurrently with a resize through
    /// cached state of its own; views re-derive the mapping on every access.
    pub fn grow(&self, new_size: usize) -> Result<()> {
        let mut state = self.inner.state.write().unwrap();
        if state.closed {
            return Err(MapStructError::Closed);
        }
        if !self.inner.mode.is_writable() {
            return Err(MapStructError::ReadOnlyRegion);
        }
        if new_size < state.len {
            return Err(MapStructError::size(
                new_size,
                format!("grow target below current length {}", state.len),
            ));
        }
        if new_size == state.len {
            return Ok(());
        }

        let old_len = state.len;
        let new_map = if let Some(file) = state.file.as_ref() {
            file.set_len(new_size as u64)
                .map_err(|e| MapStructError::resize(format!("file extension failed: {}", e)))?;
            match Self::map_writable(file, new_size) {
                Ok(map) => MapState::ReadWrite(map),
                Err(e) => {
                    // Roll the file back so the old mapping stays consistent
                    let _ = file.set_len(old_len as u64);
                    return Err(MapStructError::resize(format!("remap failed: {}", e)));
                }
            }
        } else {
            let mut map = MmapMut::map_anon(new_size)
                .map_err(|e| MapStructError::resize(format!("remap failed: {}", e)))?;
            map[..old_len].copy_from_slice(&state.map.bytes()[..old_len]);
            MapState::ReadWrite(map)
        };

        state.map = new_map;
        state.len = new_size;
        state.generation += 1;
        trace!("grew region {} -> {} bytes", old_len, new_size);
        Ok(())
    }

    /// Truncate the region to `new_size` bytes (0 is allowed)
    ///
    /// The region does not track its views; a view whose range ends beyond
    /// `new_size` keeps failing with a bounds error at its next access.
    pub fn shrink(&self, new_size: usize) -> Result<()> {
        let mut state = self.inner.state.write().unwrap();
        if state.closed {
            return Err(MapStructError::Closed);
        }
        if !self.inner.mode.is_writable() {
            return Err(MapStructError::ReadOnlyRegion);
        }
        if new_size > state.len {
            return Err(MapStructError::size(
                new_size,
                format!("shrink target above current length {}", state.len),
            ));
        }
        if new_size == state.len {
            return Ok(());
        }

        let old_len = state.len;
        let new_map = if new_size == 0 {
            MapState::Empty
        } else if let Some(file) = state.file.as_ref() {
            let map = Self::map_writable(file, new_size)
                .map_err(|e| MapStructError::resize(format!("remap failed: {}", e)))?;
            MapState::ReadWrite(map)
        } else {
            let mut map = MmapMut::map_anon(new_size)
                .map_err(|e| MapStructError::resize(format!("remap failed: {}", e)))?;
            map.copy_from_slice(&state.map.bytes()[..new_size]);
            MapState::ReadWrite(map)
        };

        // Swap in the shorter mapping before truncating the file; if the
        // truncation fails the region is still valid at new_size, just with a
        // longer file behind it.
        state.map = new_map;
        state.len = new_size;
        state.generation += 1;
        if let Some(file) = state.file.as_ref() {
            file.set_len(new_size as u64)
                .map_err(|e| MapStructError::resize(format!("file truncation failed: {}", e)))?;
        }

        trace!("shrank region {} -> {} bytes", old_len, new_size);
        Ok(())
    }

    /// Flush the whole region's dirty pages to the backing file
    pub fn flush(&self) -> Result<()> {
        let len = self.len();
        self.flush_range(0, len)
    }

    /// Flush dirty pages in `[offset, offset + len)` to the backing file
    ///
    /// No-op for anonymous and read-only regions.
    pub fn flush_range(&self, offset: usize, len: usize) -> Result<()> {
        let state = self.inner.state.read().unwrap();
        if state.closed {
            return Err(MapStructError::Closed);
        }
        let end = offset
            .checked_add(len)
            .ok_or_else(|| MapStructError::size(len, "flush range overflows"))?;
        if end > state.len {
            return Err(MapStructError::bounds(offset, len, state.len));
        }
        if self.inner.backing == BackingKind::Anonymous {
            return Ok(());
        }
        match &state.map {
            MapState::ReadWrite(map) => map
                .flush_range(offset, len)
                .map_err(|e| MapStructError::from_io(e, "Failed to flush mapping")),
            MapState::ReadOnly(_) | MapState::Empty => Ok(()),
        }
    }

    /// Unmap the region and release the backing descriptor
    ///
    /// Idempotent: a second close is a no-op. Every outstanding view and any
    /// further region operation fails with a closed error afterwards.
    pub fn close(&self) -> Result<()> {
        let mut state = self.inner.state.write().unwrap();
        if state.closed {
            return Ok(());
        }
        state.map = MapState::Empty;
        state.file = None;
        state.len = 0;
        state.generation += 1;
        state.closed = true;
        debug!("closed {} region", self.inner.backing.name());
        Ok(())
    }

    /// Read `buf.len()` bytes starting at `offset`
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        self.inner.read_at(offset, buf)
    }

    /// Write `bytes` starting at `offset`
    pub fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.inner.write_at(offset, bytes)
    }

    pub(crate) fn inner(&self) -> &Arc<RegionInner> {
        &self.inner
    }
}

impl RegionInner {
    fn check_range(state: &RegionState, offset: usize, len: usize) -> Result<()> {
        if state.closed {
            return Err(MapStructError::Closed);
        }
        let end = offset
            .checked_add(len)
            .ok_or_else(|| MapStructError::bounds(offset, len, state.len))?;
        if end > state.len {
            return Err(MapStructError::bounds(offset, len, state.len));
        }
        Ok(())
    }

    pub(crate) fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let state = self.state.read().unwrap();
        Self::check_range(&state, offset, buf.len())?;
        buf.copy_from_slice(&state.map.bytes()[offset..offset + buf.len()]);
        Ok(())
    }

    pub(crate) fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<()> {
        let state = self.state.read().unwrap();
        Self::check_range(&state, offset, bytes.len())?;
        if matches!(state.map, MapState::ReadOnly(_)) {
            return Err(MapStructError::ReadOnlyRegion);
        }
        if bytes.is_empty() {
            return Ok(());
        }
        // Safety: the mapping is ReadWrite (checked above), the range is
        // bounds-checked and the read lock pins the mapping for the duration
        // of the copy.
        unsafe {
            let base = state.map.base_ptr_for_write();
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), base.add(offset), bytes.len());
        }
        Ok(())
    }
}
