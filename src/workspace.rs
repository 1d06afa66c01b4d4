use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::domain::require_non_empty;
use crate::error::CidError;
use crate::formats::FormatRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Result<Self, CidError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join("bioimageit").join("workspace"))
                    .ok()
            })
            .ok_or_else(|| {
                CidError::Filesystem("unable to resolve workspace directory".to_string())
            })?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn data_path(&self, name: &str, extension: &str) -> Utf8PathBuf {
        self.root.join(format!("{name}.{extension}"))
    }

    pub fn locate(
        &self,
        formats: &dyn FormatRegistry,
        name: &str,
        format: &str,
    ) -> Result<Utf8PathBuf, CidError> {
        require_non_empty("name", name)?;
        let extension = formats.require_extension(format)?;
        Ok(self.data_path(name, &extension))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::formats::FormatTable;

    #[test]
    fn data_path_layout() {
        let workspace = Workspace::new_with_root("/data/ws");
        assert_eq!(workspace.data_path("cell1", "tif"), "/data/ws/cell1.tif");
    }

    #[test]
    fn locate_uses_registry() {
        let workspace = Workspace::new_with_root("/data/ws");
        let mut formats = FormatTable::new();
        formats.insert("tif", ".tif");

        let path = workspace.locate(&formats, "cell1", "tif").unwrap();
        assert_eq!(path, "/data/ws/cell1.tif");
        assert_matches!(
            workspace.locate(&formats, "cell1", "hdf5"),
            Err(CidError::UnknownFormat(_))
        );
        assert_matches!(
            workspace.locate(&formats, "", "tif"),
            Err(CidError::InvalidArgument { field: "name", .. })
        );
    }
}
