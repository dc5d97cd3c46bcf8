//! Resolution of command-line arguments into a validated run configuration.
//!
//! Every check here happens before the batch starts; a [`ConfigError`] is
//! process-fatal.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fmt;
use std::path::{Path, PathBuf};

use pxdgen_common::diagnostics::diagnostic_codes;
use pxdgen_common::{GeneratorOptions, UnknownOptionError};

use crate::args::{CliArgs, SourceLanguage};

/// Discovery pattern used by directory mode when `-H` is not given.
pub const DEFAULT_HEADER_GLOB: &str = "**/*.{h,hpp}";

#[derive(Debug)]
pub enum ConfigError {
    UnknownOption(UnknownOptionError),
    DirectoryWithoutOutput,
    HeadersWithoutRecursive,
    InputNotFound(PathBuf),
    ExpectedDirectory(PathBuf),
    ExpectedFile(PathBuf),
    InvalidGlob { pattern: String, message: String },
}

impl ConfigError {
    pub fn code(&self) -> u32 {
        diagnostic_codes::INVALID_CONFIGURATION
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption(err) => write!(f, "{err}"),
            ConfigError::DirectoryWithoutOutput => write!(
                f,
                "directory mode writes a tree of files; specify the output directory with '-o'"
            ),
            ConfigError::HeadersWithoutRecursive => write!(
                f,
                "'-H' only selects included headers together with '-r' (or selects inputs with '-D')"
            ),
            ConfigError::InputNotFound(path) => {
                write!(f, "unable to find input '{}'", path.display())
            }
            ConfigError::ExpectedDirectory(path) => write!(
                f,
                "'{}' is not a directory; drop '-D' to convert a single header",
                path.display()
            ),
            ConfigError::ExpectedFile(path) => write!(
                f,
                "'{}' is a directory; pass '-D' to convert a directory tree",
                path.display()
            ),
            ConfigError::InvalidGlob { pattern, message } => {
                write!(f, "invalid header glob '{pattern}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::UnknownOption(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnknownOptionError> for ConfigError {
    fn from(err: UnknownOptionError) -> Self {
        ConfigError::UnknownOption(err)
    }
}

#[derive(Debug)]
pub enum InputMode {
    SingleFile {
        header: PathBuf,
    },
    Directory {
        root: PathBuf,
        /// Matched against paths relative to `root`.
        pattern: GlobSet,
    },
}

/// Which of a unit's origin headers contribute declarations.
#[derive(Debug)]
pub enum HeaderSelection {
    MainHeader,
    AllHeaders,
    /// The main header plus included headers matching the glob.
    Matching(GlobSet),
}

#[derive(Debug, Clone)]
pub struct ParserSettings {
    pub program: PathBuf,
    pub language: Option<SourceLanguage>,
    pub include_dirs: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct RunConfig {
    pub mode: InputMode,
    pub output: Option<PathBuf>,
    pub selection: HeaderSelection,
    pub parser: ParserSettings,
    pub generator: GeneratorOptions,
    pub warning_level: u8,
}

impl RunConfig {
    pub fn is_directory_mode(&self) -> bool {
        matches!(self.mode, InputMode::Directory { .. })
    }

    /// Roots emitted `cdef extern from` labels are made relative to: the
    /// include path first, then the input's own directory.
    pub fn label_roots(&self) -> Vec<PathBuf> {
        let mut roots = self.parser.include_dirs.clone();
        match &self.mode {
            InputMode::Directory { root, .. } => roots.push(root.clone()),
            InputMode::SingleFile { header } => {
                if let Some(parent) = header.parent().filter(|p| !p.as_os_str().is_empty()) {
                    roots.push(parent.to_path_buf());
                }
            }
        }
        roots
    }
}

pub fn resolve_run_config(args: &CliArgs) -> Result<RunConfig, ConfigError> {
    let generator = GeneratorOptions::from_keys(&args.flags)?;

    let (mode, selection) = if args.directory {
        if args.output.is_none() {
            return Err(ConfigError::DirectoryWithoutOutput);
        }
        check_kind(&args.path, true)?;
        let pattern = build_glob(args.headers.as_deref().unwrap_or(DEFAULT_HEADER_GLOB))?;
        (
            InputMode::Directory {
                root: args.path.clone(),
                pattern,
            },
            HeaderSelection::MainHeader,
        )
    } else {
        check_kind(&args.path, false)?;
        let selection = match (&args.headers, args.recursive_includes) {
            (Some(_), false) => return Err(ConfigError::HeadersWithoutRecursive),
            (Some(pattern), true) => HeaderSelection::Matching(build_glob(pattern)?),
            (None, true) => HeaderSelection::AllHeaders,
            (None, false) => HeaderSelection::MainHeader,
        };
        (
            InputMode::SingleFile {
                header: args.path.clone(),
            },
            selection,
        )
    };

    Ok(RunConfig {
        mode,
        output: args.output.clone(),
        selection,
        parser: ParserSettings {
            program: args.parser_path.clone(),
            language: args.language,
            include_dirs: args.include.clone(),
        },
        generator,
        warning_level: args.warning_level,
    })
}

fn check_kind(path: &Path, want_directory: bool) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::InputNotFound(path.to_path_buf()));
    }
    match (want_directory, path.is_dir()) {
        (true, false) => Err(ConfigError::ExpectedDirectory(path.to_path_buf())),
        (false, true) => Err(ConfigError::ExpectedFile(path.to_path_buf())),
        _ => Ok(()),
    }
}

pub fn build_glob(pattern: &str) -> Result<GlobSet, ConfigError> {
    let invalid = |err: globset::Error| ConfigError::InvalidGlob {
        pattern: pattern.to_string(),
        message: err.to_string(),
    };
    let glob = GlobBuilder::new(pattern)
        .literal_separator(false)
        .build()
        .map_err(invalid)?;
    let mut builder = GlobSetBuilder::new();
    builder.add(glob);
    builder.build().map_err(invalid)
}
