//! Input processing module
//! Handles file detection, text extraction, and loading of job descriptions and candidate uploads

pub mod file_detector;
pub mod text_extractor;
pub mod manager;

pub use manager::InputManager;
