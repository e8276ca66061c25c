use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepsError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Toolchain {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("cargo metadata failed: {0}")]
    Metadata(#[from] cargo_metadata::Error),
}
