use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hcl::Body;
use tracing::{debug, info};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unable to inspect directory {0}: {1}")]
    StatError(String, String),

    #[error("{0} exists but is not a directory")]
    NotADirectory(String),

    #[error("Unable to create directory {0}: {1}")]
    CreateDirError(String, String),

    #[error("Unable to create file {0}: {1}")]
    CreateFileError(String, String),

    #[error("Unable to render {0}: {1}")]
    RenderError(String, String),

    #[error("Unable to write file {0}: {1}")]
    WriteError(String, String),
}

/// Creates `path` if it is missing. Calling it on an existing directory does nothing.
pub fn ensure_dir(path: &Path) -> Result<(), Error> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => return Ok(()),
        Ok(_) => return Err(Error::NotADirectory(path.display().to_string())),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(Error::StatError(
                path.display().to_string(),
                error.to_string(),
            ))
        }
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    match builder.create(path) {
        Ok(_) => (),
        Err(error) => {
            return Err(Error::CreateDirError(
                path.display().to_string(),
                error.to_string(),
            ))
        }
    }

    debug!(path = %path.display(), "created output directory");
    return Ok(());
}

/// Creates `dir/name`, truncating whatever was there before.
pub fn create_output_file(dir: &Path, name: &str) -> Result<(File, PathBuf), Error> {
    let path = dir.join(name);
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(error) => {
            return Err(Error::CreateFileError(
                path.display().to_string(),
                error.to_string(),
            ))
        }
    };

    return Ok((file, path));
}

pub fn write_body(dir: &Path, name: &str, body: &Body) -> Result<PathBuf, Error> {
    let contents = match hcl::to_string(body) {
        Ok(contents) => contents,
        Err(error) => return Err(Error::RenderError(name.to_string(), error.to_string())),
    };

    let (mut file, path) = create_output_file(dir, name)?;
    match file.write_all(contents.as_bytes()) {
        Ok(_) => (),
        Err(error) => {
            return Err(Error::WriteError(
                path.display().to_string(),
                error.to_string(),
            ))
        }
    }

    info!(path = %path.display(), bytes = contents.len(), "wrote terraform file");
    return Ok(path);
}
