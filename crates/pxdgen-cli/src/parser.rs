//! Parser backends: where node streams come from.
//!
//! Headers are handed to an external parser program, invoked as
//! `<parser> [-x LANG] [-I DIR]... <header>`, which prints one node stream on
//! stdout. Inputs ending in `.json` are node streams dumped earlier and are
//! read directly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use pxdgen_common::diagnostics::diagnostic_codes;
use pxdgen_model::{Language, NODE_STREAM_VERSION, NodeStream};
use tracing::{debug, trace};

use crate::args::SourceLanguage;
use crate::config::ParserSettings;

/// Argument the external parser answers with its node stream version.
pub const VERSION_PROBE_ARG: &str = "--node-stream-version";

#[derive(Debug)]
pub enum ParseError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The parser ran but rejected the header.
    Failed {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },
    Unavailable {
        program: PathBuf,
        reason: String,
    },
    IncompatibleVersion {
        program: PathBuf,
        found: u32,
    },
}

impl ParseError {
    /// Fatal errors stop the whole batch; the rest only fail one input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ParseError::Unavailable { .. } | ParseError::IncompatibleVersion { .. }
        )
    }

    pub fn code(&self) -> u32 {
        if self.is_fatal() {
            diagnostic_codes::PARSER_UNAVAILABLE
        } else {
            diagnostic_codes::PARSE_ERROR
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Io { path, source } => {
                write!(f, "could not read '{}': {source}", path.display())
            }
            ParseError::Malformed { path, source } => {
                write!(f, "'{}' is not a valid node stream: {source}", path.display())
            }
            ParseError::Failed {
                path,
                status,
                stderr,
            } => {
                let status = match status {
                    Some(code) => code.to_string(),
                    None => "signal".to_string(),
                };
                write!(f, "parser failed on '{}' (exit {status})", path.display())?;
                let first_line = stderr.lines().find(|line| !line.trim().is_empty());
                if let Some(line) = first_line {
                    write!(f, ": {}", line.trim())?;
                }
                Ok(())
            }
            ParseError::Unavailable { program, reason } => {
                write!(f, "external parser '{}' is unavailable: {reason}", program.display())
            }
            ParseError::IncompatibleVersion { program, found } => write!(
                f,
                "external parser '{}' produces node stream version {found}, expected {NODE_STREAM_VERSION}",
                program.display()
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io { source, .. } => Some(source),
            ParseError::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub trait HeaderParser: Sync {
    fn parse(&self, header: &Path) -> Result<NodeStream, ParseError>;
}

pub fn is_node_stream_dump(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Reads pre-dumped node streams.
#[derive(Debug, Clone, Default)]
pub struct DumpParser {
    /// Overrides the language recorded in the dump.
    pub language: Option<SourceLanguage>,
}

impl HeaderParser for DumpParser {
    fn parse(&self, header: &Path) -> Result<NodeStream, ParseError> {
        let text = std::fs::read_to_string(header).map_err(|source| ParseError::Io {
            path: header.to_path_buf(),
            source,
        })?;
        let mut stream = NodeStream::from_json(&text).map_err(|source| ParseError::Malformed {
            path: header.to_path_buf(),
            source,
        })?;
        if let Some(language) = self.language {
            stream.language = Some(model_language(language));
        }
        trace!(path = %header.display(), nodes = stream.nodes.len(), "read node stream dump");
        Ok(stream)
    }
}

#[derive(Debug, Clone)]
pub struct ExternalParser {
    settings: ParserSettings,
}

impl ExternalParser {
    /// Check that the program runs and speaks the supported node stream
    /// version before any header is handed to it.
    pub fn probe(settings: &ParserSettings) -> Result<Self, ParseError> {
        let program = settings.program.clone();
        let output = Command::new(&program)
            .arg(VERSION_PROBE_ARG)
            .output()
            .map_err(|err| ParseError::Unavailable {
                program: program.clone(),
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ParseError::Unavailable {
                program,
                reason: format!("'{VERSION_PROBE_ARG}' exited with {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let found = stdout
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseError::Unavailable {
                program: program.clone(),
                reason: format!("unexpected version answer '{}'", stdout.trim()),
            })?;
        if found != NODE_STREAM_VERSION {
            return Err(ParseError::IncompatibleVersion { program, found });
        }

        debug!(program = %settings.program.display(), version = found, "external parser ready");
        Ok(ExternalParser {
            settings: settings.clone(),
        })
    }

    fn command(&self, header: &Path) -> Command {
        let mut command = Command::new(&self.settings.program);
        if let Some(language) = self.settings.language {
            command.arg("-x").arg(language.parser_name());
        }
        for dir in &self.settings.include_dirs {
            command.arg("-I").arg(dir);
        }
        command.arg(header);
        command
    }
}

impl HeaderParser for ExternalParser {
    fn parse(&self, header: &Path) -> Result<NodeStream, ParseError> {
        let output = self
            .command(header)
            .output()
            .map_err(|err| ParseError::Unavailable {
                program: self.settings.program.clone(),
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ParseError::Failed {
                path: header.to_path_buf(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let stream = NodeStream::from_json(&text).map_err(|source| ParseError::Malformed {
            path: header.to_path_buf(),
            source,
        })?;
        if stream.version != NODE_STREAM_VERSION {
            return Err(ParseError::IncompatibleVersion {
                program: self.settings.program.clone(),
                found: stream.version,
            });
        }
        Ok(stream)
    }
}

/// Dispatches each input to the dump reader or the external parser.
#[derive(Debug, Clone)]
pub struct ParserBackend {
    dumps: DumpParser,
    external: Option<ExternalParser>,
}

impl ParserBackend {
    /// The external parser is probed only when some input needs it.
    pub fn for_inputs(settings: &ParserSettings, inputs: &[PathBuf]) -> Result<Self, ParseError> {
        let external = if inputs.iter().any(|input| !is_node_stream_dump(input)) {
            Some(ExternalParser::probe(settings)?)
        } else {
            None
        };
        Ok(ParserBackend {
            dumps: DumpParser {
                language: settings.language,
            },
            external,
        })
    }
}

impl HeaderParser for ParserBackend {
    fn parse(&self, header: &Path) -> Result<NodeStream, ParseError> {
        if is_node_stream_dump(header) {
            return self.dumps.parse(header);
        }
        match &self.external {
            Some(external) => external.parse(header),
            None => Err(ParseError::Unavailable {
                program: PathBuf::from(header),
                reason: "no external parser was configured".to_string(),
            }),
        }
    }
}

fn model_language(language: SourceLanguage) -> Language {
    match language {
        SourceLanguage::C => Language::C,
        SourceLanguage::Cpp => Language::Cpp,
    }
}
