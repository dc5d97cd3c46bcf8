//! Generator options.
//!
//! The `-f` flags form a closed set. Each recognised key has one documented
//! effect; any other key is rejected with [`UnknownOptionError`] before the
//! batch starts.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GeneratorFlags: u8 {
        /// Emit opaque stub declarations for types that cannot be resolved.
        const AUTODEFINE = 1 << 0;
        /// Suppress the import section.
        const NO_IMPORT = 1 << 1;
        /// Emit preprocessor macro definitions as constants.
        const DEFINES = 1 << 2;
    }
}

impl GeneratorFlags {
    /// Recognised option keys, in documentation order.
    pub const KEYS: &'static [(&'static str, GeneratorFlags)] = &[
        ("autodefine", GeneratorFlags::AUTODEFINE),
        ("noimport", GeneratorFlags::NO_IMPORT),
        ("defines", GeneratorFlags::DEFINES),
    ];

    pub fn from_key(key: &str) -> Result<Self, UnknownOptionError> {
        let normalized = key.trim().to_ascii_lowercase();
        Self::KEYS
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, flag)| *flag)
            .ok_or_else(|| UnknownOptionError {
                key: key.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOptionError {
    pub key: String,
}

impl fmt::Display for UnknownOptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = GeneratorFlags::KEYS.iter().map(|(name, _)| *name).collect();
        write!(
            f,
            "unknown generator option '{}' (expected one of: {})",
            self.key,
            known.join(", ")
        )
    }
}

impl std::error::Error for UnknownOptionError {}

/// Options shared by every phase of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub flags: GeneratorFlags,
}

impl GeneratorOptions {
    pub fn from_keys<I, S>(keys: I) -> Result<Self, UnknownOptionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = GeneratorFlags::empty();
        for key in keys {
            flags |= GeneratorFlags::from_key(key.as_ref())?;
        }
        Ok(Self { flags })
    }

    pub fn autodefine(&self) -> bool {
        self.flags.contains(GeneratorFlags::AUTODEFINE)
    }

    pub fn emit_imports(&self) -> bool {
        !self.flags.contains(GeneratorFlags::NO_IMPORT)
    }

    pub fn emit_defines(&self) -> bool {
        self.flags.contains(GeneratorFlags::DEFINES)
    }
}

#[cfg(test)]
#[path = "tests/options.rs"]
mod tests;
