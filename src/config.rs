//! Run configuration and command-line handling
//!
//! [`SpaceConfig`] sizes the per-process regions. [`Cli::parse`] turns the
//! program arguments into a [`Cli`]; any argument count other than zero or
//! three sources is a [`UsageError`].

use crate::memory::layout::{Region, DEFAULT_HEAP_SIZE, DEFAULT_STACK_SIZE, MAX_HEAP_SIZE};
use crate::memory::MemoryError;
use thiserror::Error;

/// Sources loaded when no paths are given on the command line
pub const DEFAULT_SOURCES: [&str; 3] = [
    "programs/programA.txt",
    "programs/programB.txt",
    "programs/programB.txt",
];

/// Per-address-space sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceConfig {
    /// Number of stack slots
    pub stack_capacity: usize,
    /// Heap arena size in bytes; must be a power of two
    pub heap_size: usize,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        SpaceConfig {
            stack_capacity: DEFAULT_STACK_SIZE,
            heap_size: DEFAULT_HEAP_SIZE,
        }
    }
}

impl SpaceConfig {
    /// Check that the stack and heap fit their logical regions
    pub fn validate(&self) -> Result<(), MemoryError> {
        let stack_max = Region::Stack.capacity();
        if self.stack_capacity as u64 > stack_max {
            return Err(MemoryError::RegionTooLarge {
                region: Region::Stack,
                len: self.stack_capacity as u64,
                max: stack_max,
            });
        }
        if self.heap_size > MAX_HEAP_SIZE {
            return Err(MemoryError::RegionTooLarge {
                region: Region::Dynamic,
                len: self.heap_size as u64,
                max: MAX_HEAP_SIZE as u64,
            });
        }
        Ok(())
    }
}

/// Bad command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("please specify 3 .txt files to be loaded (got {0})")]
    SourceCount(usize),

    #[error("option '{0}' expects a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub sources: Vec<String>,
    pub interactive: bool,
    pub space: SpaceConfig,
}

impl Cli {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut sources = Vec::new();
        let mut interactive = false;
        let mut space = SpaceConfig::default();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--tui" => interactive = true,
                "--stack" => space.stack_capacity = option_value(&arg, args.next())?,
                "--heap" => space.heap_size = option_value(&arg, args.next())?,
                opt if opt.starts_with("--") => {
                    return Err(UsageError::UnknownOption(opt.to_string()));
                }
                _ => sources.push(arg),
            }
        }

        if !space.heap_size.is_power_of_two() {
            return Err(UsageError::InvalidValue {
                option: "--heap".to_string(),
                value: space.heap_size.to_string(),
            });
        }
        if let Err(MemoryError::RegionTooLarge { region, len, .. }) = space.validate() {
            let option = if region == Region::Stack { "--stack" } else { "--heap" };
            return Err(UsageError::InvalidValue {
                option: option.to_string(),
                value: len.to_string(),
            });
        }

        let sources = match sources.len() {
            0 => DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            3 => sources,
            n => return Err(UsageError::SourceCount(n)),
        };

        Ok(Cli {
            sources,
            interactive,
            space,
        })
    }
}

fn option_value(option: &str, value: Option<String>) -> Result<usize, UsageError> {
    let value = value.ok_or_else(|| UsageError::MissingValue(option.to_string()))?;
    value.parse().map_err(|_| UsageError::InvalidValue {
        option: option.to_string(),
        value,
    })
}
