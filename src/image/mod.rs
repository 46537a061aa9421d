pub mod loader;
pub mod overlay;

pub use loader::ImageLoader;
pub use overlay::{draw_overlay, encode_data_url};
