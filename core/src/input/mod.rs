pub mod file;
pub mod selector;

pub use file::SelectedFile;
pub use selector::{FileSelector, IMAGE_EXTENSIONS};
