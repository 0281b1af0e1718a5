use heapless::Deque;

/// Fixed-capacity FIFO queue. It never grows and never overwrites: a push
/// into a full queue hands the value back, a pop from an empty one yields
/// nothing, and neither touches the stored elements.
#[derive(Debug)]
pub struct RingBuffer<T, const N: usize> {
    items: Deque<T, N>,
}

impl<T, const N: usize> RingBuffer<T, N> {
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    pub fn push(&mut self, value: T) -> Result<(), T> {
        self.items.push_back(value)
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Oldest element.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Newest element.
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Free slots left before a push is rejected.
    pub fn free(&self) -> usize {
        N - self.items.len()
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
