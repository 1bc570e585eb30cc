//! Writing generated modules to disk.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::error::{GeneratorError, Result};

/// A rendered module ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: String,
    pub content: String,
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> GeneratorError + '_ {
    move |source| GeneratorError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes through a temporary sibling file and a rename so readers never see a
/// partially written module.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, content).map_err(write_error(&tmp_path))?;
    fs::rename(&tmp_path, path).map_err(write_error(path))?;
    Ok(())
}

/// Writes every file into `output_dir`, creating it if needed. Existing files with the
/// same names are replaced, nothing else in the directory is touched.
pub fn write_modules(files: &[GeneratedFile], output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(write_error(output_dir))?;
    let paths = files
        .iter()
        .map(|file| {
            let path = output_dir.join(&file.file_name);
            write_atomic(&path, &file.content)?;
            debug!("Wrote {}", path.display());
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;
    info!("Wrote {} files to {}", paths.len(), output_dir.display());
    Ok(paths)
}
