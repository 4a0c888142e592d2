use crate::input::file::SelectedFile;

/// Extensions offered by the native picker. Advisory only; nothing is
/// rejected locally.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// Hands the first file of a user selection to its registered callback.
pub struct FileSelector<F>
where
    F: FnMut(SelectedFile),
{
    on_select: F,
}

impl<F> FileSelector<F>
where
    F: FnMut(SelectedFile),
{
    pub fn new(on_select: F) -> Self {
        Self { on_select }
    }

    /// Returns whether the callback fired. A cancelled (empty) selection is a no-op.
    pub fn pick<I>(&mut self, selection: I) -> bool
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        match selection.into_iter().next() {
            Some(file) => {
                (self.on_select)(file);
                true
            }
            None => false,
        }
    }
}
