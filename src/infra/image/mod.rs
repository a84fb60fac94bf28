mod loader;

pub use loader::{ImageLoadError, ImageSourceData, encode_image_source, load_image_source};
