//! 定长环形缓冲区，满了以后覆盖最旧的元素

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    /// 最旧元素的位置
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// 容量至少为 1
    pub fn new(size: usize) -> Self {
        RingBuffer {
            buf: vec![T::default(); size.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn push_overwrite(&mut self, item: T) {
        let write = (self.head + self.len) % self.buf.len();
        self.buf[write] = item;
        if self.len == self.buf.len() {
            self.head = (self.head + 1) % self.buf.len();
        } else {
            self.len += 1;
        }
    }

    /// 从旧到新遍历
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |i| &self.buf[(self.head + i) % self.buf.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(rb: &RingBuffer<u8>) -> Vec<u8> {
        rb.iter().copied().collect()
    }

    #[test]
    fn test_new() {
        let rb: RingBuffer<u8> = RingBuffer::new(10);
        assert!(contents(&rb).is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let mut rb: RingBuffer<u8> = RingBuffer::new(0);
        rb.push_overwrite(7);
        rb.push_overwrite(8);
        assert_eq!(contents(&rb), vec![8]);
    }

    #[test]
    fn test_push_before_full() {
        let mut rb = RingBuffer::new(3);
        rb.push_overwrite(1);
        rb.push_overwrite(2);
        assert_eq!(contents(&rb), vec![1, 2]);
    }

    #[test]
    fn test_push_overwrite() {
        let mut rb = RingBuffer::new(3);
        rb.push_overwrite(1);
        rb.push_overwrite(2);
        rb.push_overwrite(3);
        rb.push_overwrite(4);
        assert_eq!(contents(&rb), vec![2, 3, 4]);
        rb.push_overwrite(5);
        rb.push_overwrite(6);
        assert_eq!(contents(&rb), vec![4, 5, 6]);
    }
}
