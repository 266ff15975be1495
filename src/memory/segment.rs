//! Shared segment descriptors
//!
//! A [`SharedSegment`] holds the text, BSS and DATA images parsed from one
//! backing source. Every [`AddressSpace`] loaded from that source holds an
//! `Rc` to the same descriptor and registers itself as an owner, so the use
//! count is the number of live owners.
//!
//! The [`SegmentRegistry`] keeps only weak references. When the last owning
//! address space is dropped the descriptor, and with it the text buffer, is
//! released exactly once; a later load of the same source parses it again.
//!
//! [`AddressSpace`]: super::address_space::AddressSpace

use super::value::{terminated, Value};
use log::debug;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity of a simulated process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PROCESS{}", self.0)
    }
}

/// Text, BSS and DATA images shared by every process loaded from one source
#[derive(Debug)]
pub struct SharedSegment {
    source: String,
    text: Box<[u8]>,
    bss: Vec<Value>,
    data: Vec<Value>,
    owners: RefCell<Vec<ProcessId>>,
}

impl SharedSegment {
    /// Build a descriptor. `bss` and `data` are `None`-terminated arrays;
    /// anything after the terminator is dropped.
    pub fn new(source: impl Into<String>, bss: &[Value], data: &[Value], text: Vec<u8>) -> Self {
        SharedSegment {
            source: source.into(),
            text: text.into_boxed_slice(),
            bss: terminated(bss).to_vec(),
            data: terminated(data).to_vec(),
            owners: RefCell::new(Vec::new()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Initial BSS image
    pub fn bss(&self) -> &[Value] {
        &self.bss
    }

    /// Initial DATA image
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// Register `pid` as an owner
    pub fn attach(&self, pid: ProcessId) {
        self.owners.borrow_mut().push(pid);
        debug!(
            "{} attached to segment '{}' (use count {})",
            pid,
            self.source,
            self.use_count()
        );
    }

    /// Remove `pid` from the owners. Frees nothing: the payload goes away
    /// with the last `Rc`.
    pub fn detach(&self, pid: ProcessId) {
        let mut owners = self.owners.borrow_mut();
        if let Some(pos) = owners.iter().position(|&p| p == pid) {
            owners.remove(pos);
        }
        debug!(
            "{} detached from segment '{}' (use count {})",
            pid,
            self.source,
            owners.len()
        );
    }

    /// Number of address spaces currently registered
    pub fn use_count(&self) -> usize {
        self.owners.borrow().len()
    }

    /// Owners in attach order
    pub fn owners(&self) -> Vec<ProcessId> {
        self.owners.borrow().clone()
    }

    /// Owners other than `pid`
    pub fn shared_with(&self, pid: ProcessId) -> Vec<ProcessId> {
        self.owners
            .borrow()
            .iter()
            .copied()
            .filter(|&p| p != pid)
            .collect()
    }
}

/// Registry of loaded sources, keyed by source identity (e.g. a file path)
#[derive(Debug, Default)]
pub struct SegmentRegistry {
    segments: FxHashMap<String, Weak<SharedSegment>>,
    next_pid: u32,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live descriptor for `key`, building one with `build` if the
    /// source has never been loaded or all of its owners are gone.
    pub fn attach_with<F, E>(&mut self, key: &str, build: F) -> Result<Rc<SharedSegment>, E>
    where
        F: FnOnce() -> Result<SharedSegment, E>,
    {
        if let Some(segment) = self.get(key) {
            debug!("reusing segment '{}'", key);
            return Ok(segment);
        }
        let segment = Rc::new(build()?);
        self.segments
            .insert(key.to_string(), Rc::downgrade(&segment));
        debug!("created segment '{}'", key);
        Ok(segment)
    }

    /// Live descriptor for `key`, if any
    pub fn get(&self, key: &str) -> Option<Rc<SharedSegment>> {
        self.segments.get(key).and_then(Weak::upgrade)
    }

    /// Whether `key` currently has a live descriptor
    pub fn is_resident(&self, key: &str) -> bool {
        self.segments
            .get(key)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Drop entries whose descriptors have been released
    pub fn purge(&mut self) {
        self.segments.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Number of entries, including released ones not yet purged
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Issue the next process id, starting at 1
    pub fn next_process_id(&mut self) -> ProcessId {
        self.next_pid += 1;
        ProcessId(self.next_pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn segment(source: &str) -> SharedSegment {
        SharedSegment::new(
            source,
            &[Value::Int(1), Value::None],
            &[Value::None],
            vec![0x10, 0xA4],
        )
    }

    #[test]
    fn test_attach_reuses_live_segment() {
        let mut registry = SegmentRegistry::new();
        let first = registry
            .attach_with("a.txt", || Ok::<_, Infallible>(segment("a.txt")))
            .unwrap();
        let second = registry
            .attach_with("a.txt", || -> Result<SharedSegment, Infallible> {
                panic!("source parsed twice")
            })
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.bss(), &[Value::Int(1)]);
        assert!(first.data().is_empty());
    }

    #[test]
    fn test_released_segment_is_rebuilt() {
        let mut registry = SegmentRegistry::new();
        let first = registry
            .attach_with("a.txt", || Ok::<_, Infallible>(segment("a.txt")))
            .unwrap();
        drop(first);
        assert!(!registry.is_resident("a.txt"));
        assert_eq!(registry.len(), 1);
        registry.purge();
        assert!(registry.is_empty());

        let mut built = false;
        registry
            .attach_with("a.txt", || {
                built = true;
                Ok::<_, Infallible>(segment("a.txt"))
            })
            .unwrap();
        assert!(built);
    }

    #[test]
    fn test_owner_bookkeeping() {
        let seg = segment("a.txt");
        seg.attach(ProcessId(1));
        seg.attach(ProcessId(2));
        seg.attach(ProcessId(3));
        assert_eq!(seg.use_count(), 3);
        assert_eq!(seg.shared_with(ProcessId(2)), vec![ProcessId(1), ProcessId(3)]);

        seg.detach(ProcessId(1));
        seg.detach(ProcessId(1));
        assert_eq!(seg.owners(), vec![ProcessId(2), ProcessId(3)]);
    }

    #[test]
    fn test_process_ids_are_sequential() {
        let mut registry = SegmentRegistry::new();
        assert_eq!(registry.next_process_id().to_string(), "PROCESS1");
        assert_eq!(registry.next_process_id(), ProcessId(2));
    }
}
