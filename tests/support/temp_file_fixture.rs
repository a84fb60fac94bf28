use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

pub(crate) fn write_png_file(prefix: &str) -> TestFile {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(&[0u8; 24]);
    write_bytes_file(prefix, "png", &bytes)
}

pub(crate) fn write_jpeg_file(prefix: &str) -> TestFile {
    let mut bytes = JPEG_MAGIC.to_vec();
    bytes.extend_from_slice(&[0u8; 24]);
    write_bytes_file(prefix, "jpg", &bytes)
}

pub(crate) fn write_sized_jpeg_file(prefix: &str, size_bytes: usize) -> TestFile {
    let mut bytes = vec![0u8; size_bytes];
    bytes[..JPEG_MAGIC.len()].copy_from_slice(JPEG_MAGIC);
    write_bytes_file(prefix, "jpg", &bytes)
}

pub(crate) fn write_oversized_png_file(prefix: &str, size_bytes: usize) -> TestFile {
    let mut bytes = vec![0u8; size_bytes];
    bytes[..PNG_MAGIC.len()].copy_from_slice(PNG_MAGIC);
    write_bytes_file(prefix, "png", &bytes)
}

pub(crate) fn write_bytes_file(prefix: &str, extension: &str, bytes: &[u8]) -> TestFile {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after UNIX_EPOCH")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}-{nanos}-{id}.{extension}"));

    fs::write(&path, bytes).expect("test fixture file must be writable");
    TestFile { path }
}

pub(crate) struct TestFile {
    path: PathBuf,
}

impl TestFile {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn path_str(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

impl Drop for TestFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
