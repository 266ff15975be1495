// Integration tests for the address-space simulator

use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use memsim::config::SpaceConfig;
use memsim::dump;
use memsim::loader::{load_file, load_str, LoadError};
use memsim::memory::buddy::BuddyAllocator;
use memsim::memory::layout::{Region, DATA_START, DYNAMIC_START, STACK_START};
use memsim::memory::{
    AddressSpace, MemoryError, ProcessId, SegmentRegistry, SharedSegment, Slot, Value, ValueKind,
};

const END_TO_END: &str = "30, -5, 'a', 3.6, \"ciao\"\n900,50,10\n\n\n\\x10,\\xA4\n";

fn load(registry: &mut SegmentRegistry, source: &str, text: &str) -> AddressSpace {
    load_str(source, text, registry, &SpaceConfig::default()).expect("Load failed")
}

#[test]
fn test_end_to_end_declaration() {
    let mut registry = SegmentRegistry::new();
    let space = load(&mut registry, "demo", END_TO_END);

    let kinds: Vec<ValueKind> = space.stack().values().iter().map(Value::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ValueKind::Int,
            ValueKind::Int,
            ValueKind::Char,
            ValueKind::Float,
            ValueKind::String
        ]
    );

    let sizes: Vec<u32> = space
        .addresses(Region::Dynamic)
        .into_iter()
        .map(|addr| space.requested_size(addr).unwrap())
        .collect();
    assert_eq!(sizes, vec![900, 50, 10]);

    assert_eq!(space.text().len(), 2);
    assert!(space.bss().is_empty());
    assert!(space.data().is_empty());
    assert_eq!(space.load(STACK_START + 4).unwrap().value(), Some(&Value::Str("ciao".into())));
}

#[test]
fn test_arena_exhaustion() {
    let mut heap = BuddyAllocator::new(1024).unwrap();
    for size in [512, 256, 128, 128] {
        heap.allocate(size).unwrap();
    }
    assert_eq!(
        heap.allocate(1),
        Err(MemoryError::OutOfMemory { requested: 1 })
    );
    assert_eq!(heap.free_bytes(), 0);
}

#[test]
fn test_small_request_in_default_arena() {
    let mut heap = BuddyAllocator::default();
    let offset = heap.allocate(100).unwrap();
    assert_eq!(offset, 0);

    let used = heap.allocated();
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].size, 128);
    // Siblings left by the splits: 128, 256, ..., 8192
    assert_eq!(heap.free_bytes(), 16384 - 128);
    for level in 7..14 {
        let free: Vec<_> = heap.level(level).filter(|b| b.is_available()).collect();
        assert_eq!(free.len(), 1, "level {}", level);
        assert_eq!(free[0].offset, 1 << level);
    }
}

#[test]
fn test_invalid_sizes_leave_allocator_untouched() {
    let mut heap = BuddyAllocator::new(64).unwrap();
    assert_eq!(
        heap.allocate(0),
        Err(MemoryError::InvalidAllocationSize { requested: 0 })
    );
    assert!(heap.allocate(-8).is_err());
    assert_eq!(heap.free_bytes(), 64);
    assert_eq!(heap.level(6).count(), 1);
}

#[test]
fn test_allocations_are_disjoint_and_in_bounds() {
    let mut heap = BuddyAllocator::new(4096).unwrap();
    let mut ranges = Vec::new();
    for size in [1i64, 3, 17, 100, 64, 513, 5, 200] {
        let offset = heap.allocate(size).unwrap();
        let end = offset + (size as usize).next_power_of_two();
        assert!(end <= 4096);
        ranges.push((offset, end));
    }
    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            assert!(a.1 <= b.0 || b.1 <= a.0, "{:?} overlaps {:?}", a, b);
        }
    }
}

#[test]
fn test_shared_segment_released_once() {
    let mut registry = SegmentRegistry::new();
    let a = load(&mut registry, "shared", END_TO_END);
    let b = load(&mut registry, "shared", "1\n\n\n\n\n");

    assert!(Rc::ptr_eq(a.segment(), b.segment()));
    assert_eq!(a.segment().use_count(), 2);
    assert_eq!(a.shared_with(), vec![ProcessId(2)]);
    assert_eq!(b.text(), &[0x10, 0xA4]);

    let weak = Rc::downgrade(a.segment());
    drop(a);
    assert_eq!(weak.upgrade().map(|s| s.use_count()), Some(1));
    drop(b);
    assert!(weak.upgrade().is_none());
    assert!(!registry.is_resident("shared"));
}

#[test]
fn test_stack_bounds() {
    let segment = Rc::new(SharedSegment::new("s", &[], &[], Vec::new()));
    let config = SpaceConfig {
        stack_capacity: 4,
        ..SpaceConfig::default()
    };
    let mut space = AddressSpace::new(ProcessId(1), &config, &[], &[], segment).unwrap();

    assert_eq!(space.pop(), Err(MemoryError::StackUnderflow));
    for i in 0..4 {
        space.push(Value::Int(i)).unwrap();
    }
    assert_eq!(
        space.push(Value::Int(4)),
        Err(MemoryError::StackOverflow { capacity: 4 })
    );
    assert_eq!(space.pop().unwrap(), Value::Int(3));
}

#[test]
fn test_data_follows_bss_in_private_array() {
    let mut registry = SegmentRegistry::new();
    let space = load(&mut registry, "statics", "\n\n1, 2, 3\n'x', 'y'\n");

    assert_eq!(space.load(DATA_START + 1).unwrap(), Slot::Data(&Value::Char('y')));
    assert!(matches!(
        space.load(DATA_START + 2),
        Err(MemoryError::IndexOutOfBounds {
            region: Region::Data,
            ..
        })
    ));
}

#[test]
fn test_text_longer_than_its_region_is_rejected() {
    let text = vec!["\\x00"; 0x10000].join(",");
    let declaration = format!("\n\n7\n\n{}\n", text);

    let mut registry = SegmentRegistry::new();
    let err = load_str("long", &declaration, &mut registry, &SpaceConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Memory(MemoryError::RegionTooLarge {
            region: Region::Text,
            len: 0x10000,
            max: 0xFFFE,
        })
    ));
    assert!(!registry.is_resident("long"));
}

#[test]
fn test_heap_beyond_dynamic_region_is_rejected() {
    let config = SpaceConfig {
        heap_size: 1 << 31,
        ..SpaceConfig::default()
    };
    let mut registry = SegmentRegistry::new();
    let err = load_str("huge", "\n1\n", &mut registry, &config).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Memory(MemoryError::RegionTooLarge {
            region: Region::Dynamic,
            ..
        })
    ));
}

#[test]
fn test_free_through_address_space() {
    let mut registry = SegmentRegistry::new();
    let mut space = load(&mut registry, "heap", "\n900, 50\n");

    let addr = space.allocate(10).unwrap();
    assert!(addr > DYNAMIC_START);
    space.free(addr).unwrap();
    assert_eq!(
        space.requested_size(addr),
        Err(MemoryError::NotAllocated {
            offset: (addr - DYNAMIC_START) as usize
        })
    );
    assert_eq!(space.addresses(Region::Dynamic).len(), 2);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", END_TO_END).unwrap();

    let mut registry = SegmentRegistry::new();
    let config = SpaceConfig::default();
    let first = load_file(file.path(), &mut registry, &config).unwrap();
    let second = load_file(file.path(), &mut registry, &config).unwrap();

    assert_eq!(first.segment().use_count(), 2);
    assert_eq!(second.stack().len(), 5);

    let report = dump::render(&first).unwrap();
    assert!(report.contains("(SHARED WITH PROCESS2)"));
    assert!(report.contains("[0x3fffc] - [ALLOCATED TO ALLOW 900 BYTES AT THIS ADDRESS]"));
}

#[test]
fn test_lex_error_reports_position() {
    let mut registry = SegmentRegistry::new();
    let err = load_str("bad", "1\n2\n3\n4\n\\x10, 32", &mut registry, &SpaceConfig::default())
        .unwrap_err();
    match err {
        LoadError::Lex(e) => {
            assert_eq!(e.location.line, 5);
            assert_eq!(e.location.column, 7);
        }
        other => panic!("Expected lex error, got {:?}", other),
    }
}

#[test]
fn test_bundled_programs_share_segment() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("programs");
    let mut registry = SegmentRegistry::new();
    let config = SpaceConfig::default();

    let a = load_file(dir.join("programA.txt"), &mut registry, &config).unwrap();
    let b = load_file(dir.join("programB.txt"), &mut registry, &config).unwrap();
    let c = load_file(dir.join("programB.txt"), &mut registry, &config).unwrap();

    assert_eq!(a.segment().use_count(), 1);
    assert!(Rc::ptr_eq(b.segment(), c.segment()));
    assert_eq!(b.shared_with(), vec![c.pid()]);
    assert!(b.text().is_empty());

    for space in [&a, &b, &c] {
        dump::render(space).unwrap();
    }
}
