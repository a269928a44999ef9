//! Image handling stages.
//!
//! - **fetch**: Download catalogue images to scratch files
//! - **validate**: Size and magic-byte checks before decoding
//! - **decode**: Decode images with dimension limits and a timeout
//! - **discovery**: Find image files and category folders on disk
//! - **processor**: Validate, decode and embed in one call

pub mod decode;
pub mod discovery;
pub mod fetch;
pub mod processor;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use fetch::{DownloadedImage, HttpFetcher, ImageFetcher};
pub use processor::ImageProcessor;
pub use validate::Validator;
