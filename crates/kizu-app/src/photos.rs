//! Photo intake: validation, slot scanning, thumbnails

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use walkdir::WalkDir;

use kizu_domain::VehicleRecordRepository;
use kizu_store::VehicleStore;
use kizu_types::{CameraSlot, Error, Result};

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Longest edge of the report thumbnail
const THUMBNAIL_EDGE: u32 = 160;

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate an image file exists and is readable
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a file",
            path.display()
        )));
    }

    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }

    // Header parse is enough to reject non-images cheaply
    image::image_dimensions(path)?;

    Ok(())
}

/// Render the report thumbnail for a photo as base64 PNG
pub fn make_thumbnail(path: &Path) -> Result<String> {
    let img = image::open(path)?;
    let thumb = img.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);

    let mut buf = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(BASE64.encode(&buf))
}

/// Scan a directory for slot photos by canonical file stem
/// (front.jpg, rear.png, interior-front.jpg, ...)
///
/// Returns the found photos in slot order; missing slots are simply absent.
pub fn scan_slot_photos(dir: &Path) -> Result<Vec<(CameraSlot, PathBuf)>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut found: Vec<Option<PathBuf>> = vec![None; CameraSlot::COUNT];

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_supported_image(path) {
            continue;
        }

        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_lowercase(),
            None => continue,
        };

        for slot in CameraSlot::all() {
            if stem == slot.file_stem() && found[slot.index()].is_none() {
                found[slot.index()] = Some(path.to_path_buf());
            }
        }
    }

    Ok(CameraSlot::all()
        .iter()
        .zip(found)
        .filter_map(|(slot, path)| path.map(|p| (*slot, p)))
        .collect())
}

/// Validate and attach a photo set to a record, refreshing its thumbnail
pub fn attach_photos(store: &mut VehicleStore, id: &str, photos: &[PathBuf]) -> Result<usize> {
    for photo in photos {
        validate_image(photo)?;
    }

    let thumbnail = photos.first().and_then(|p| make_thumbnail(p).ok());
    let refs: Vec<String> = photos.iter().map(|p| p.display().to_string()).collect();

    store.set_photos(id, refs)?;
    store.set_thumbnail(id, thumbnail)?;
    Ok(photos.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use tempfile::TempDir;

    fn write_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(32, 24, Luma([128u8]));
        img.save(&path).expect("save test image");
        path
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_validate_image_rejects_missing_file() {
        assert!(matches!(
            validate_image(Path::new("/nonexistent/front.jpg")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_scan_finds_slot_photos_in_order() {
        let dir = TempDir::new().expect("tempdir");
        write_image(dir.path(), "rear.png");
        write_image(dir.path(), "front.png");
        write_image(dir.path(), "dashboard.png");
        write_image(dir.path(), "holiday-snapshot.png");

        let photos = scan_slot_photos(dir.path()).expect("scan");
        let slots: Vec<CameraSlot> = photos.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(
            slots,
            vec![CameraSlot::Front, CameraSlot::Rear, CameraSlot::Dashboard]
        );
    }

    #[test]
    fn test_make_thumbnail_produces_base64() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_image(dir.path(), "front.png");

        let thumb = make_thumbnail(&path).expect("thumbnail");
        assert!(!thumb.is_empty());
        assert!(BASE64.decode(thumb.as_bytes()).is_ok());
    }

    #[test]
    fn test_attach_photos_sets_refs_and_thumbnail() {
        let dir = TempDir::new().expect("tempdir");
        let front = write_image(dir.path(), "front.png");
        let rear = write_image(dir.path(), "rear.png");

        let mut store = VehicleStore::in_memory();
        let id = store.create("Toyota", "Camry", "ABC123").expect("create");

        let count = attach_photos(&mut store, &id, &[front.clone(), rear]).expect("attach");
        assert_eq!(count, 2);

        let record = store.get(&id).expect("record");
        assert_eq!(record.photos.len(), 2);
        assert_eq!(record.photos[0], front.display().to_string());
        assert!(record.thumbnail_base64.is_some());
    }
}
