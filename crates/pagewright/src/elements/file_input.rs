use super::TypedElement;
use crate::result::PagewrightResult;
use std::path::{Path, PathBuf};
use tracing::info;

crate::typed_element! {
    /// `<input type="file">`
    FileInput
}

impl FileInput {
    /// Type the absolute form of `path` into the control
    pub fn set_file_to_upload(&self, path: impl AsRef<Path>) -> PagewrightResult<()> {
        let path = path.as_ref();
        let absolute: PathBuf = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        info!(
            "Set file '{}' to upload with '{}'",
            absolute.display(),
            self.name()
        );
        self.element().send_keys(&absolute.to_string_lossy())
    }

    pub fn submit(&self) -> PagewrightResult<()> {
        self.element().submit()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::by::By;
    use crate::elements::test_support::{mock_with, typed};
    use crate::mock::{Interaction, MockElement};

    #[test]
    fn test_relative_path_is_made_absolute() {
        let mock = mock_with(MockElement::new("input").attr("type", "file").id("upload"));
        let upload: FileInput = typed(&mock, By::id("upload"), "Upload");
        upload.set_file_to_upload("fixtures/report.pdf").unwrap();

        let typed_path = mock
            .interactions()
            .into_iter()
            .find_map(|i| match i {
                Interaction::SendKeys(_, keys) => Some(keys),
                _ => None,
            })
            .unwrap();
        let typed_path = PathBuf::from(typed_path);
        assert!(typed_path.is_absolute());
        assert!(typed_path.ends_with("fixtures/report.pdf"));
    }
}
