use std::fs;
use std::io::Cursor;

use beer_tracker::{
    import_from, Beer, CollectionStore, DataDirs, ExchangeError, ImageStore, StoreError,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

fn setup() -> (TempDir, DataDirs, ImageStore) {
    let temp = tempfile::tempdir().unwrap();
    let dirs = DataDirs::at(temp.path());
    dirs.ensure().unwrap();
    let images = ImageStore::new(dirs.images_dir());
    (temp, dirs, images)
}

fn photo_bytes() -> Vec<u8> {
    let image = RgbImage::from_fn(16, 12, |x, y| Rgb([(x * 15) as u8, (y * 20) as u8, 90]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut cursor, ImageFormat::Png)
        .unwrap();
    cursor.into_inner()
}

#[test]
fn record_survives_encode_and_decode() {
    let beer = Beer::new("Saison", Some("photo.jpg".to_string()), Some("peppery".to_string()), 4);
    let decoded = Beer::decode(&beer.encode().unwrap()).unwrap();

    assert_eq!(decoded.name, beer.name);
    assert_eq!(decoded.rating, beer.rating);
    assert_eq!(decoded.image_path, beer.image_path);
    assert_eq!(decoded.note, beer.note);
}

#[test]
fn exported_ipa_imports_into_empty_store() {
    let (_temp, dirs, images) = setup();
    let mut store = CollectionStore::load(dirs.archive_path());
    assert!(store.is_empty());

    let path = Beer::new("IPA", None, Some("hoppy".to_string()), 4)
        .export_to_file(&dirs, &images)
        .unwrap();
    import_from(&path, &mut store, &images).unwrap();

    assert_eq!(
        store.beers(),
        [Beer::new("IPA", None, Some("hoppy".to_string()), 4)]
    );
}

#[test]
fn export_then_import_carries_note_and_photo() {
    let (_temp, dirs, images) = setup();
    let mut original = Beer::new("Brown Ale", None, Some("nutty".to_string()), 3);
    original.save_image(&images, &photo_bytes()).unwrap();

    let path = original.export_to_file(&dirs, &images).unwrap();
    let mut store = CollectionStore::load(dirs.archive_path());
    let index = import_from(&path, &mut store, &images).unwrap();

    let imported = store.get(index).unwrap();
    assert_eq!(imported.name, "Brown Ale");
    assert_eq!(imported.rating, 3);
    assert_eq!(imported.note.as_deref(), Some("nutty"));
    assert_ne!(imported.image_path, original.image_path);

    let photo = imported.load_image(&images).unwrap();
    assert_eq!((photo.width(), photo.height()), (16, 12));
    assert!(!path.exists());

    let reloaded = CollectionStore::load(dirs.archive_path());
    assert_eq!(reloaded.beers(), store.beers());
}

#[test]
fn remove_middle_then_reload() {
    let (_temp, dirs, _images) = setup();
    let mut store = CollectionStore::load(dirs.archive_path());
    for name in ["A", "B", "C"] {
        store.append(Beer::new(name, None, None, 2));
    }
    store.save().unwrap();

    store.remove(1);
    store.save().unwrap();

    let names: Vec<String> = CollectionStore::load(dirs.archive_path())
        .beers()
        .iter()
        .map(|beer| beer.name.clone())
        .collect();
    assert_eq!(names, ["A", "C"]);
}

#[test]
fn archive_entry_missing_rating_falls_back_to_empty() {
    let (_temp, dirs, _images) = setup();
    fs::write(
        dirs.archive_path(),
        br#"{"beers":[{"name":"Fine","rating":5,"image":null,"note":null},{"name":"Broken","image":null,"note":"no rating"}]}"#,
    )
    .unwrap();

    assert!(CollectionStore::load(dirs.archive_path()).is_empty());
    assert!(matches!(
        CollectionStore::try_load(dirs.archive_path()),
        Err(StoreError::Decode { .. })
    ));
}

#[test]
fn failed_image_save_keeps_prior_reference() {
    let (temp, _dirs, _images) = setup();
    let unwritable = ImageStore::new(temp.path().join("no").join("such").join("dir"));

    let mut beer = Beer::default();
    assert!(beer.save_image(&unwritable, &photo_bytes()).is_err());
    assert_eq!(beer.image_path, None);
}

#[test]
fn malformed_exchange_file_is_a_no_op() {
    let (_temp, dirs, images) = setup();
    let mut store = CollectionStore::load(dirs.archive_path());
    let path = dirs.inbox_dir().join("empty.btkr");
    fs::write(&path, b"").unwrap();

    let err = import_from(&path, &mut store, &images).unwrap_err();
    assert!(matches!(err, ExchangeError::Decode { .. }));
    assert!(store.is_empty());
    assert!(path.exists());
}
