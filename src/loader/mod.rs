//! Segment loader
//!
//! Turns declaration text into an [`AddressSpace`]:
//! - [`lexer`]: Tokenization (line text → literal tokens)
//! - [`declaration`]: The five-line format and its typed images
//!
//! The first load of a source parses all five lines and registers a new
//! [`SharedSegment`]. While that segment is alive, further loads of the same
//! source only parse the stack and dynamic lines and attach to it.
//!
//! [`SharedSegment`]: crate::memory::SharedSegment

pub mod declaration;
pub mod lexer;

use crate::config::SpaceConfig;
use crate::memory::{AddressSpace, MemoryError, SegmentRegistry, SharedSegment};
use declaration::{Lines, PrivateImage, SharedImage};
use lexer::LexError;
use log::info;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Failure while loading one program
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Load a program from declaration text. `source_id` identifies the backing
/// source for segment sharing.
pub fn load_str(
    source_id: &str,
    text: &str,
    registry: &mut SegmentRegistry,
    config: &SpaceConfig,
) -> Result<AddressSpace, LoadError> {
    let lines = Lines::split(text);
    let private = PrivateImage::parse(&lines)?;

    let segment = registry.attach_with(source_id, || -> Result<_, LoadError> {
        let shared = SharedImage::parse(&lines)?;
        Ok(SharedSegment::new(
            source_id,
            &shared.bss,
            &shared.data,
            shared.text,
        ))
    })?;

    let pid = registry.next_process_id();
    let space = AddressSpace::new(pid, config, &private.stack, &private.dynamic, segment)?;
    info!(
        "loaded {} from '{}' (segment use count {})",
        pid,
        source_id,
        space.segment().use_count()
    );
    Ok(space)
}

/// Read and load a declaration file, keyed by its path
pub fn load_file(
    path: impl AsRef<Path>,
    registry: &mut SegmentRegistry,
    config: &SpaceConfig,
) -> Result<AddressSpace, LoadError> {
    let path = path.as_ref();
    let key = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: key.clone(),
        source,
    })?;
    load_str(&key, &text, registry, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ProcessId, Value};

    const PROGRAM: &str = "30, -5\n64\n1, 2, 3\n'd', \"e\"\n\\x10, \\xA4\n";

    #[test]
    fn test_first_load_builds_segment() {
        let mut registry = SegmentRegistry::new();
        let space = load_str("a", PROGRAM, &mut registry, &SpaceConfig::default()).unwrap();

        assert_eq!(space.pid(), ProcessId(1));
        assert_eq!(space.stack().values(), &[Value::Int(30), Value::Int(-5)]);
        assert_eq!(space.bss().len(), 3);
        assert_eq!(space.data(), &[Value::Char('d'), Value::Str("e".to_string())]);
        assert_eq!(space.text(), &[0x10, 0xA4]);
        assert_eq!(space.heap().allocated().len(), 1);
    }

    #[test]
    fn test_second_load_ignores_shared_lines() {
        let mut registry = SegmentRegistry::new();
        let config = SpaceConfig::default();
        let first = load_str("a", PROGRAM, &mut registry, &config).unwrap();
        // Lines 3-5 are malformed but never lexed while the segment is live.
        let second = load_str("a", "7\n\n@@\n@@\n@@", &mut registry, &config).unwrap();

        assert!(std::rc::Rc::ptr_eq(first.segment(), second.segment()));
        assert_eq!(second.bss().len(), 3);
        assert_eq!(second.stack().values(), &[Value::Int(7)]);
        assert_eq!(first.shared_with(), vec![ProcessId(2)]);
    }

    #[test]
    fn test_errors_are_wrapped() {
        let mut registry = SegmentRegistry::new();
        let config = SpaceConfig::default();

        let err = load_str("bad", "1, ?", &mut registry, &config).unwrap_err();
        assert!(matches!(err, LoadError::Lex(_)));

        let err = load_str("neg", "\n-3", &mut registry, &config).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Memory(MemoryError::InvalidAllocationSize { requested: -3 })
        ));
        // The segment built for the failed load is already released.
        assert!(!registry.is_resident("neg"));
    }

    #[test]
    fn test_missing_file() {
        let mut registry = SegmentRegistry::new();
        let err = load_file(
            "definitely/not/here.txt",
            &mut registry,
            &SpaceConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("definitely/not/here.txt"));
    }
}
