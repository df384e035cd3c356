use crate::types::{TerrainError, TerrainResult};
use std::ffi::CString;
use std::os::raw::c_uchar;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A file in GDAL's `/vsimem/` filesystem, unlinked when dropped.
///
/// Decoded uploads and exported rasters pass through these instead of the
/// disk, and the buffer is released on every exit path.
pub struct VsiMemFile {
    path: String,
    c_path: CString,
    // Backing storage GDAL reads from; must outlive the VSI entry
    _data: Option<Vec<u8>>,
}

impl VsiMemFile {
    /// Reserve a unique in-memory path. GDAL creates the file on first write.
    pub fn reserve(stem: &str, extension: &str) -> TerrainResult<Self> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let path = format!("/vsimem/hillside_{}_{}_{}.{}", std::process::id(), id, stem, extension);
        let c_path = CString::new(path.clone())
            .map_err(|e| TerrainError::Format(format!("Invalid in-memory path {}: {}", path, e)))?;
        Ok(Self { path, c_path, _data: None })
    }

    /// Expose `bytes` to GDAL under a fresh `/vsimem/` path
    pub fn from_bytes(stem: &str, extension: &str, mut bytes: Vec<u8>) -> TerrainResult<Self> {
        let mut file = Self::reserve(stem, extension)?;
        log::debug!("Mapping {} bytes to {}", bytes.len(), file.path);

        unsafe {
            let handle = gdal_sys::VSIFileFromMemBuffer(
                file.c_path.as_ptr(),
                bytes.as_mut_ptr() as *mut c_uchar,
                bytes.len() as gdal_sys::vsi_l_offset,
                0, // don't take ownership
            );
            if handle.is_null() {
                return Err(TerrainError::Format(format!(
                    "GDAL refused in-memory buffer {}",
                    file.path
                )));
            }
            gdal_sys::VSIFCloseL(handle);
        }

        file._data = Some(bytes);
        Ok(file)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Copy the current contents out of GDAL's buffer
    pub fn read_all(&self) -> TerrainResult<Vec<u8>> {
        let mut len: gdal_sys::vsi_l_offset = 0;
        let ptr = unsafe { gdal_sys::VSIGetMemFileBuffer(self.c_path.as_ptr(), &mut len, 0) };
        if ptr.is_null() {
            return Err(TerrainError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No in-memory file at {}", self.path),
            )));
        }
        let bytes = unsafe { std::slice::from_raw_parts(ptr as *const u8, len as usize) };
        Ok(bytes.to_vec())
    }
}

impl Drop for VsiMemFile {
    fn drop(&mut self) {
        // Fails harmlessly when nothing was ever written to a reserved path
        unsafe {
            gdal_sys::VSIUnlink(self.c_path.as_ptr());
        }
    }
}

impl std::fmt::Debug for VsiMemFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VsiMemFile").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_unique() {
        let a = VsiMemFile::reserve("dem", "tif").unwrap();
        let b = VsiMemFile::reserve("dem", "tif").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with("/vsimem/"));
    }

    #[test]
    fn test_bytes_round_trip_and_release() {
        let file = VsiMemFile::from_bytes("blob", "bin", vec![1, 2, 3, 4]).unwrap();
        assert_eq!(file.read_all().unwrap(), vec![1, 2, 3, 4]);

        let c_path = CString::new(file.path()).unwrap();
        drop(file);

        let mut len: gdal_sys::vsi_l_offset = 0;
        let ptr = unsafe { gdal_sys::VSIGetMemFileBuffer(c_path.as_ptr(), &mut len, 0) };
        assert!(ptr.is_null());
    }

    #[test]
    fn test_reserved_path_has_no_contents() {
        let file = VsiMemFile::reserve("empty", "tif").unwrap();
        assert!(file.read_all().is_err());
    }
}
