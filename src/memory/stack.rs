//! Bounded value stack
//!
//! [`BoundedStack`] simulates the stack segment: a fixed number of [`Value`]
//! slots with a head index. Popping only retreats the head; the slot keeps
//! its value but is no longer addressable.

use super::errors::MemoryError;
use super::layout::{Region, DEFAULT_STACK_SIZE};
use super::value::Value;

/// Fixed-capacity last-in-first-out store of values
#[derive(Debug, Clone)]
pub struct BoundedStack {
    slots: Vec<Value>,
    len: usize,
}

impl BoundedStack {
    /// Create a stack with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        BoundedStack {
            slots: vec![Value::None; capacity],
            len: 0,
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: Value) -> Result<(), MemoryError> {
        if self.len >= self.slots.len() {
            return Err(MemoryError::StackOverflow {
                capacity: self.slots.len(),
            });
        }
        self.slots[self.len] = value;
        self.len += 1;
        Ok(())
    }

    /// Pop the top value. The slot is left in place, only the head moves.
    pub fn pop(&mut self) -> Result<Value, MemoryError> {
        if self.len == 0 {
            return Err(MemoryError::StackUnderflow);
        }
        self.len -= 1;
        Ok(self.slots[self.len].clone())
    }

    /// Get the top value
    pub fn peek(&self) -> Result<&Value, MemoryError> {
        self.len
            .checked_sub(1)
            .map(|top| &self.slots[top])
            .ok_or(MemoryError::StackUnderflow)
    }

    /// Get the value at `index`, counting from the bottom of the stack
    pub fn get(&self, index: usize) -> Result<&Value, MemoryError> {
        if index >= self.len {
            return Err(self.out_of_bounds(index));
        }
        Ok(&self.slots[index])
    }

    /// Get a mutable reference to the value at `index`
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Value, MemoryError> {
        if index >= self.len {
            return Err(self.out_of_bounds(index));
        }
        Ok(&mut self.slots[index])
    }

    /// Live values, bottom first
    pub fn values(&self) -> &[Value] {
        &self.slots[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn out_of_bounds(&self, index: usize) -> MemoryError {
        MemoryError::IndexOutOfBounds {
            region: Region::Stack,
            index,
            extent: self.len,
        }
    }
}

impl Default for BoundedStack {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_at_capacity() {
        let mut stack = BoundedStack::new(4);
        for i in 0..4 {
            stack.push(Value::Int(i)).unwrap();
        }
        assert_eq!(
            stack.push(Value::Int(4)),
            Err(MemoryError::StackOverflow { capacity: 4 })
        );
        assert_eq!(stack.len(), 4);
    }

    #[test]
    fn test_underflow_when_empty() {
        let mut stack = BoundedStack::default();
        assert_eq!(stack.capacity(), DEFAULT_STACK_SIZE);
        assert_eq!(stack.pop(), Err(MemoryError::StackUnderflow));
        assert_eq!(stack.peek(), Err(MemoryError::StackUnderflow));
    }

    #[test]
    fn test_pop_keeps_slot_but_hides_it() {
        let mut stack = BoundedStack::new(2);
        stack.push(Value::Char('a')).unwrap();
        stack.push(Value::Int(7)).unwrap();

        assert_eq!(stack.pop().unwrap(), Value::Int(7));
        assert_eq!(stack.peek().unwrap(), &Value::Char('a'));
        assert!(matches!(
            stack.get(1),
            Err(MemoryError::IndexOutOfBounds { index: 1, extent: 1, .. })
        ));
        // The old slot is still physically present
        assert_eq!(stack.slots[1], Value::Int(7));
    }

    #[test]
    fn test_get_mut_overwrites() {
        let mut stack = BoundedStack::new(2);
        stack.push(Value::Int(1)).unwrap();
        *stack.get_mut(0).unwrap() = Value::Float(2.5);
        assert_eq!(stack.values(), &[Value::Float(2.5)]);
    }
}
