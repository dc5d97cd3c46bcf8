use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the pxdgen binary.
#[derive(Parser, Debug)]
#[command(
    name = "pxdgen",
    version,
    about = "Converts C/C++ headers into Cython .pxd declaration files"
)]
pub struct CliArgs {
    /// Path to a C/C++ header (or a pre-dumped .json node stream), or a directory with -D.
    pub path: PathBuf,

    // ==================== Output ====================
    /// Output file, or the output directory in directory mode. Prints to stdout when omitted.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Parse a whole directory tree and write one .pxd file per header.
    #[arg(short = 'D', long)]
    pub directory: bool,

    /// Set a generator flag to tune the output (autodefine, noimport, defines).
    #[arg(short = 'f', long = "flag", action = ArgAction::Append)]
    pub flags: Vec<String>,

    // ==================== Header Selection ====================
    /// Also emit declarations read from headers the input includes.
    #[arg(short = 'r', long = "recursive-includes")]
    pub recursive_includes: bool,

    /// Glob selecting headers: discovery pattern with -D (default `**/*.{h,hpp}`),
    /// otherwise the included headers -r may emit from.
    #[arg(short = 'H', long)]
    pub headers: Option<String>,

    // ==================== External Parser ====================
    /// Force the parser to interpret headers as the given language.
    #[arg(short = 'x', long, value_enum, ignore_case = true)]
    pub language: Option<SourceLanguage>,

    /// Add a directory to the parser's include path.
    #[arg(short = 'I', long = "include", action = ArgAction::Append)]
    pub include: Vec<PathBuf>,

    /// External parser program that prints a node stream for a header.
    #[arg(short = 'L', long = "parser-path", default_value = "pxdgen-clang-dump")]
    pub parser_path: PathBuf,

    // ==================== Diagnostics ====================
    /// Warning level: 0 reports errors only, 1 adds warnings, 2 adds notes.
    #[arg(
        short = 'W',
        long = "warning-level",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub warning_level: u8,

    /// Log progress to stderr; repeat for more detail.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceLanguage {
    C,
    #[value(name = "c++", alias = "cpp", alias = "cxx")]
    Cpp,
}

impl SourceLanguage {
    /// Spelling passed to the external parser's `-x`.
    pub fn parser_name(self) -> &'static str {
        match self {
            SourceLanguage::C => "c",
            SourceLanguage::Cpp => "c++",
        }
    }
}
