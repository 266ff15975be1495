//! Simulated process address space
//!
//! An [`AddressSpace`] composes the five backing stores behind a single
//! logical address range (see [`layout`](super::layout)):
//!
//! - TEXT: bytes owned by the [`SharedSegment`], shared with every process
//!   loaded from the same source
//! - BSS / DATA: one private value array, BSS first, partitioned at `bss_end`
//! - DYNAMIC: a [`BuddyAllocator`] arena
//! - STACK: a [`BoundedStack`]
//!
//! [`AddressSpace::load`] and [`AddressSpace::store`] are the only ways to
//! reach region contents by logical address.

use super::buddy::BuddyAllocator;
use super::errors::MemoryError;
use super::layout::{translate, Address, Region, DYNAMIC_START};
use super::segment::{ProcessId, SharedSegment};
use super::stack::BoundedStack;
use super::value::{terminated, Value};
use crate::config::SpaceConfig;
use log::debug;
use std::rc::Rc;

/// A typed view of the memory behind one logical address
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    Text(u8),
    Bss(&'a Value),
    Data(&'a Value),
    /// Arena bytes from the address to the end of the dynamic region
    Dynamic(&'a [u8]),
    Stack(&'a Value),
}

impl Slot<'_> {
    pub fn region(&self) -> Region {
        match self {
            Slot::Text(_) => Region::Text,
            Slot::Bss(_) => Region::Bss,
            Slot::Data(_) => Region::Data,
            Slot::Dynamic(_) => Region::Dynamic,
            Slot::Stack(_) => Region::Stack,
        }
    }

    /// The value held by a BSS, DATA or stack slot
    pub fn value(&self) -> Option<&Value> {
        match self {
            Slot::Bss(v) | Slot::Data(v) | Slot::Stack(v) => Some(v),
            Slot::Text(_) | Slot::Dynamic(_) => None,
        }
    }
}

/// One simulated process
#[derive(Debug)]
pub struct AddressSpace {
    pid: ProcessId,
    stack: BoundedStack,
    heap: BuddyAllocator,
    statics: Vec<Value>, // BSS then DATA
    bss_end: usize,
    segment: Rc<SharedSegment>,
}

impl AddressSpace {
    /// Build an address space and register it with `segment`.
    ///
    /// `stack` is a `None`-terminated array pushed bottom first; each entry of
    /// `dynamic` is allocated in order. Every region must fit its logical
    /// range. On error nothing is registered.
    pub fn new(
        pid: ProcessId,
        config: &SpaceConfig,
        stack: &[Value],
        dynamic: &[i64],
        segment: Rc<SharedSegment>,
    ) -> Result<Self, MemoryError> {
        config.validate()?;
        check_fits(Region::Text, segment.text().len())?;
        check_fits(Region::Bss, segment.bss().len())?;
        check_fits(Region::Data, segment.data().len())?;

        let mut bounded = BoundedStack::new(config.stack_capacity);
        for value in terminated(stack) {
            bounded.push(value.clone())?;
        }

        let bss_end = segment.bss().len();
        let mut statics = Vec::with_capacity(bss_end + segment.data().len());
        statics.extend_from_slice(segment.bss());
        statics.extend_from_slice(segment.data());

        let mut heap = BuddyAllocator::new(config.heap_size)?;
        for &size in dynamic {
            heap.allocate(size)?;
        }

        segment.attach(pid);
        debug!(
            "{} built: {} stack, {} bss, {} data, {} dynamic, {} text",
            pid,
            bounded.len(),
            bss_end,
            statics.len() - bss_end,
            dynamic.len(),
            segment.text().len()
        );

        Ok(AddressSpace {
            pid,
            stack: bounded,
            heap,
            statics,
            bss_end,
            segment,
        })
    }

    /// Resolve a logical address to the memory behind it
    pub fn load(&self, address: Address) -> Result<Slot<'_>, MemoryError> {
        let (region, index) = self.locate(address)?;
        match region {
            Region::Text => Ok(Slot::Text(self.segment.text()[index])),
            Region::Bss => Ok(Slot::Bss(&self.statics[index])),
            Region::Data => Ok(Slot::Data(&self.statics[self.bss_end + index])),
            Region::Dynamic => self.heap.tail(index).map(Slot::Dynamic),
            Region::Stack => self.stack.get(index).map(Slot::Stack),
        }
    }

    /// Replace the value at a BSS, DATA or stack address
    pub fn store(&mut self, address: Address, value: Value) -> Result<(), MemoryError> {
        let (region, index) = self.locate(address)?;
        let slot = match region {
            Region::Bss => &mut self.statics[index],
            Region::Data => &mut self.statics[self.bss_end + index],
            Region::Stack => self.stack.get_mut(index)?,
            Region::Text => return Err(MemoryError::ReadOnlyRegion { region }),
            Region::Dynamic => {
                return Err(MemoryError::RegionMismatch {
                    region,
                    expected: "value",
                })
            }
        };
        *slot = value;
        Ok(())
    }

    /// Write one byte of the dynamic region
    pub fn store_byte(&mut self, address: Address, byte: u8) -> Result<(), MemoryError> {
        let (region, index) = self.locate(address)?;
        match region {
            Region::Dynamic => {
                self.heap.bytes_mut(index, 1)?[0] = byte;
                Ok(())
            }
            Region::Text => Err(MemoryError::ReadOnlyRegion { region }),
            _ => Err(MemoryError::RegionMismatch {
                region,
                expected: "byte",
            }),
        }
    }

    /// Translate and bounds-check an address against the current extents
    fn locate(&self, address: Address) -> Result<(Region, usize), MemoryError> {
        let (region, index) =
            translate(address).ok_or(MemoryError::NullPointerAccess { address })?;
        let extent = self.extent(region);
        if index >= extent {
            return Err(MemoryError::IndexOutOfBounds {
                region,
                index,
                extent,
            });
        }
        Ok((region, index))
    }

    /// Number of addressable units currently in `region`
    pub fn extent(&self, region: Region) -> usize {
        match region {
            Region::Text => self.segment.text().len(),
            Region::Bss => self.bss_end,
            Region::Data => self.statics.len() - self.bss_end,
            Region::Dynamic => self.heap.size(),
            Region::Stack => self.stack.len(),
        }
    }

    /// Logical addresses of every unit in `region`; for DYNAMIC, the start
    /// of every allocated block
    pub fn addresses(&self, region: Region) -> Vec<Address> {
        match region {
            Region::Dynamic => self
                .heap
                .allocated()
                .iter()
                .map(|block| region.address_of(block.offset))
                .collect(),
            _ => (0..self.extent(region))
                .map(|index| region.address_of(index))
                .collect(),
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), MemoryError> {
        self.stack.push(value)
    }

    pub fn pop(&mut self) -> Result<Value, MemoryError> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Result<&Value, MemoryError> {
        self.stack.peek()
    }

    /// Allocate dynamic memory and return its logical address
    pub fn allocate(&mut self, size: i64) -> Result<Address, MemoryError> {
        let offset = self.heap.allocate(size)?;
        Ok(Region::Dynamic.address_of(offset))
    }

    /// Free the dynamic block starting at a logical address
    pub fn free(&mut self, address: Address) -> Result<(), MemoryError> {
        let (region, index) = self.locate(address)?;
        if region != Region::Dynamic {
            return Err(MemoryError::InvalidFree {
                offset: address.wrapping_sub(DYNAMIC_START) as usize,
            });
        }
        self.heap.free(index)
    }

    /// Requested size recorded at the start of the block at `address`
    pub fn requested_size(&self, address: Address) -> Result<u32, MemoryError> {
        let (region, index) = self.locate(address)?;
        if region != Region::Dynamic {
            return Err(MemoryError::RegionMismatch {
                region,
                expected: "dynamic block",
            });
        }
        self.heap.requested_size(index)
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn stack(&self) -> &BoundedStack {
        &self.stack
    }

    pub fn heap(&self) -> &BuddyAllocator {
        &self.heap
    }

    pub fn text(&self) -> &[u8] {
        self.segment.text()
    }

    /// Private BSS values
    pub fn bss(&self) -> &[Value] {
        &self.statics[..self.bss_end]
    }

    /// Private DATA values
    pub fn data(&self) -> &[Value] {
        &self.statics[self.bss_end..]
    }

    pub fn segment(&self) -> &Rc<SharedSegment> {
        &self.segment
    }

    /// Other processes attached to the same segment
    pub fn shared_with(&self) -> Vec<ProcessId> {
        self.segment.shared_with(self.pid)
    }
}

impl Drop for AddressSpace {
    fn drop(&mut self) {
        // The private statics are owned copies; only the segment is shared,
        // and it is released with the last Rc.
        let last = Rc::strong_count(&self.segment) == 1;
        self.segment.detach(self.pid);
        debug!(
            "{} released{}",
            self.pid,
            if last { " (last handle, freeing shared text)" } else { "" }
        );
    }
}

/// Reject region contents that would spill into the next region
fn check_fits(region: Region, len: usize) -> Result<(), MemoryError> {
    let max = region.capacity();
    if len as u64 > max {
        return Err(MemoryError::RegionTooLarge {
            region,
            len: len as u64,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::layout::{BSS_START, DATA_START, STACK_START, TEXT_START};

    fn segment() -> Rc<SharedSegment> {
        Rc::new(SharedSegment::new(
            "test",
            &[Value::Int(1), Value::Int(2), Value::Int(3), Value::None],
            &[Value::Char('x'), Value::Str("y".to_string()), Value::None],
            vec![0x10, 0xA4, 0x30],
        ))
    }

    fn space() -> AddressSpace {
        AddressSpace::new(
            ProcessId(1),
            &SpaceConfig::default(),
            &[Value::Int(30), Value::Float(3.6), Value::None],
            &[900, 50],
            segment(),
        )
        .unwrap()
    }

    #[test]
    fn test_data_address_maps_past_bss() {
        let space = space();
        assert_eq!(
            space.load(DATA_START + 1).unwrap(),
            Slot::Data(&Value::Str("y".to_string()))
        );
        assert!(std::ptr::eq(
            space.load(DATA_START + 1).unwrap().value().unwrap(),
            &space.statics[4]
        ));
        assert_eq!(
            space.load(DATA_START + 2),
            Err(MemoryError::IndexOutOfBounds {
                region: Region::Data,
                index: 2,
                extent: 2
            })
        );
    }

    #[test]
    fn test_each_region_resolves() {
        let space = space();
        assert_eq!(space.load(TEXT_START + 1).unwrap(), Slot::Text(0xA4));
        assert_eq!(space.load(BSS_START + 2).unwrap(), Slot::Bss(&Value::Int(3)));
        assert_eq!(space.load(STACK_START + 1).unwrap(), Slot::Stack(&Value::Float(3.6)));
        match space.load(DYNAMIC_START).unwrap() {
            Slot::Dynamic(bytes) => assert_eq!(&bytes[..4], &900u32.to_le_bytes()),
            other => panic!("Expected dynamic slot, got {:?}", other),
        }
        assert!(space.load(STACK_START + 2).is_err());
        assert!(space.load(TEXT_START + 3).is_err());
    }

    #[test]
    fn test_null_pointer_access() {
        let space = space();
        assert_eq!(
            space.load(0),
            Err(MemoryError::NullPointerAccess { address: 0 })
        );
    }

    #[test]
    fn test_store_is_private() {
        let seg = segment();
        let config = SpaceConfig::default();
        let mut a = AddressSpace::new(ProcessId(1), &config, &[], &[], seg.clone()).unwrap();
        let b = AddressSpace::new(ProcessId(2), &config, &[], &[], seg.clone()).unwrap();

        a.store(BSS_START, Value::Int(99)).unwrap();
        assert_eq!(a.bss()[0], Value::Int(99));
        assert_eq!(b.bss()[0], Value::Int(1));
        assert_eq!(seg.bss()[0], Value::Int(1));
    }

    #[test]
    fn test_store_rejects_wrong_region() {
        let mut space = space();
        assert_eq!(
            space.store(TEXT_START, Value::Int(1)),
            Err(MemoryError::ReadOnlyRegion { region: Region::Text })
        );
        assert!(matches!(
            space.store(DYNAMIC_START, Value::Int(1)),
            Err(MemoryError::RegionMismatch { .. })
        ));
        assert!(matches!(
            space.store_byte(BSS_START, 1),
            Err(MemoryError::RegionMismatch { .. })
        ));
        space.store_byte(DYNAMIC_START + 10, 0x7F).unwrap();
        match space.load(DYNAMIC_START + 10).unwrap() {
            Slot::Dynamic(bytes) => assert_eq!(bytes[0], 0x7F),
            other => panic!("Expected dynamic slot, got {:?}", other),
        }
    }

    #[test]
    fn test_heap_and_stack_forwarding() {
        let mut space = space();
        let addr = space.allocate(10).unwrap();
        assert_eq!(space.requested_size(addr).unwrap(), 10);
        assert_eq!(space.addresses(Region::Dynamic).len(), 3);
        space.free(addr).unwrap();
        assert_eq!(space.addresses(Region::Dynamic).len(), 2);

        space.push(Value::Byte(7)).unwrap();
        assert_eq!(space.peek().unwrap(), &Value::Byte(7));
        assert_eq!(space.pop().unwrap(), Value::Byte(7));
        assert_eq!(space.stack().len(), 2);
    }

    #[test]
    fn test_failed_construction_registers_nothing() {
        let seg = segment();
        let result = AddressSpace::new(
            ProcessId(1),
            &SpaceConfig::default(),
            &[],
            &[0],
            seg.clone(),
        );
        assert_eq!(
            result.unwrap_err(),
            MemoryError::InvalidAllocationSize { requested: 0 }
        );
        assert_eq!(seg.use_count(), 0);
    }

    #[test]
    fn test_oversized_text_is_rejected() {
        let text = vec![0u8; Region::Text.capacity() as usize + 1];
        let seg = Rc::new(SharedSegment::new("big", &[Value::Int(7)], &[], text));
        let result = AddressSpace::new(ProcessId(1), &SpaceConfig::default(), &[], &[], seg.clone());
        assert_eq!(
            result.unwrap_err(),
            MemoryError::RegionTooLarge {
                region: Region::Text,
                len: 0xFFFF,
                max: 0xFFFE
            }
        );
        assert_eq!(seg.use_count(), 0);
    }

    #[test]
    fn test_full_text_region_stays_in_text() {
        let text = vec![0xAB; Region::Text.capacity() as usize];
        let seg = Rc::new(SharedSegment::new("full", &[Value::Int(7)], &[], text));
        let space = AddressSpace::new(ProcessId(1), &SpaceConfig::default(), &[], &[], seg).unwrap();

        let last = *space.addresses(Region::Text).last().unwrap();
        assert_eq!(last, BSS_START - 1);
        assert_eq!(space.load(last).unwrap(), Slot::Text(0xAB));
        assert_eq!(space.load(BSS_START).unwrap(), Slot::Bss(&Value::Int(7)));
    }

    #[test]
    fn test_oversized_heap_config_is_rejected() {
        let config = SpaceConfig {
            heap_size: 1 << 31,
            ..SpaceConfig::default()
        };
        let seg = segment();
        let result = AddressSpace::new(ProcessId(1), &config, &[], &[], seg.clone());
        assert!(matches!(
            result,
            Err(MemoryError::RegionTooLarge {
                region: Region::Dynamic,
                ..
            })
        ));
        assert_eq!(seg.use_count(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let seg = segment();
        let config = SpaceConfig::default();
        let a = AddressSpace::new(ProcessId(1), &config, &[], &[], seg.clone()).unwrap();
        let b = AddressSpace::new(ProcessId(2), &config, &[], &[], seg.clone()).unwrap();
        assert_eq!(seg.use_count(), 2);
        assert_eq!(a.shared_with(), vec![ProcessId(2)]);
        drop(a);
        assert_eq!(seg.use_count(), 1);
        assert!(b.shared_with().is_empty());
    }
}
