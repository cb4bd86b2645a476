//! Dense `(total, sum)` accumulator table shared by concurrent trainers.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::context::{ContextKey, KEY_SPACE};

/// Elements converted per read/write call when streaming a table.
const IO_CHUNK: usize = 1 << 16;

/// Byte order of a serialized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    /// Host order and word width, as in the legacy model files.
    Native,
    Little,
}

impl ByteOrder {
    #[inline]
    fn encode(self, value: u64) -> u64 {
        match self {
            ByteOrder::Native => value,
            ByteOrder::Little => value.to_le(),
        }
    }

    #[inline]
    fn decode(self, value: u64) -> u64 {
        match self {
            ByteOrder::Native => value,
            ByteOrder::Little => u64::from_le(value),
        }
    }
}

/// Per-index occurrence count and accumulated target value.
///
/// All mutation goes through `&self` with relaxed atomic adds: accumulation
/// is commutative, so concurrent updates to the same bin need no ordering.
/// Readers must be sequenced after the writers (e.g. by a rayon join).
pub struct LutTable {
    totals: Vec<AtomicU64>,
    sums: Vec<AtomicU64>,
}

fn zeroed(len: usize) -> Vec<AtomicU64> {
    std::iter::repeat_with(|| AtomicU64::new(0))
        .take(len)
        .collect()
}

impl LutTable {
    /// Zero-initialised table with `len` bins.
    pub fn new(len: usize) -> Self {
        Self {
            totals: zeroed(len),
            sums: zeroed(len),
        }
    }

    /// Full-size table where every context carries one pseudo-observation of
    /// its own center sample, so an untrained table maps a context to its
    /// noisy center pixel.
    pub fn with_uniform_prior() -> Self {
        let table = Self::new(KEY_SPACE);
        (0..KEY_SPACE).into_par_iter().for_each(|index| {
            let center = ContextKey::from_index(index).center();
            table.update_weighted(index, center as u64, 1);
        });
        table
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    #[inline]
    pub fn update(&self, index: usize, value: u64) {
        self.totals[index].fetch_add(1, Ordering::Relaxed);
        self.sums[index].fetch_add(value, Ordering::Relaxed);
    }

    #[inline]
    pub fn update_weighted(&self, index: usize, value: u64, weight: u64) {
        self.totals[index].fetch_add(weight, Ordering::Relaxed);
        self.sums[index].fetch_add(value * weight, Ordering::Relaxed);
    }

    #[inline]
    pub fn total(&self, index: usize) -> u64 {
        self.totals[index].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sum(&self, index: usize) -> u64 {
        self.sums[index].load(Ordering::Relaxed)
    }

    /// Expected target value for a bin.
    ///
    /// # Panics
    /// If the bin was never observed. The uniform prior makes that
    /// unreachable for any table built or validated by this crate.
    #[inline]
    pub fn mean(&self, index: usize) -> f64 {
        let total = self.total(index);
        assert!(total != 0, "lookup of unobserved bin {index}");
        self.sum(index) as f64 / total as f64
    }

    /// Rounded expected sample value for a bin.
    #[inline]
    pub fn estimate(&self, index: usize) -> u8 {
        let mean = self.mean(index);
        debug_assert!(
            (0.0..=255.0).contains(&mean),
            "bin {index} mean {mean} outside sample range"
        );
        mean.round() as u8
    }

    /// First bin with a zero total, if any.
    pub fn first_unobserved(&self) -> Option<usize> {
        self.totals
            .par_iter()
            .position_first(|t| t.load(Ordering::Relaxed) == 0)
    }

    pub(crate) fn write_to<W: Write>(&self, writer: &mut W, order: ByteOrder) -> io::Result<()> {
        write_array(&self.totals, writer, order)?;
        write_array(&self.sums, writer, order)
    }

    pub(crate) fn read_from<R: Read>(&self, reader: &mut R, order: ByteOrder) -> io::Result<()> {
        read_array(&self.totals, reader, order)?;
        read_array(&self.sums, reader, order)
    }

    /// Legacy layout: `totals` then `sums`, native-endian `u64`, no framing.
    pub fn write_raw<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_to(writer, ByteOrder::Native)
    }

    /// Counterpart of [`LutTable::write_raw`]; fills this table in place.
    pub fn read_raw<R: Read>(&self, reader: &mut R) -> io::Result<()> {
        self.read_from(reader, ByteOrder::Native)
    }

    /// Serialized size in bytes of a table with `len` bins.
    pub const fn byte_len(len: usize) -> usize {
        2 * len * std::mem::size_of::<u64>()
    }
}

fn write_array<W: Write>(values: &[AtomicU64], writer: &mut W, order: ByteOrder) -> io::Result<()> {
    let mut buf = vec![0u64; IO_CHUNK.min(values.len())];
    for chunk in values.chunks(IO_CHUNK) {
        let out = &mut buf[..chunk.len()];
        for (dst, src) in out.iter_mut().zip(chunk) {
            *dst = order.encode(src.load(Ordering::Relaxed));
        }
        writer.write_all(bytemuck::cast_slice(out))?;
    }
    Ok(())
}

fn read_array<R: Read>(values: &[AtomicU64], reader: &mut R, order: ByteOrder) -> io::Result<()> {
    let mut buf = vec![0u64; IO_CHUNK.min(values.len())];
    for chunk in values.chunks(IO_CHUNK) {
        let inp = &mut buf[..chunk.len()];
        reader.read_exact(bytemuck::cast_slice_mut(inp))?;
        for (dst, src) in chunk.iter().zip(inp.iter()) {
            dst.store(order.decode(*src), Ordering::Relaxed);
        }
    }
    Ok(())
}

impl PartialEq for LutTable {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &[AtomicU64], b: &[AtomicU64]) -> bool {
            a.len() == b.len()
                && a.par_iter()
                    .zip(b.par_iter())
                    .all(|(x, y)| x.load(Ordering::Relaxed) == y.load(Ordering::Relaxed))
        }
        same(&self.totals, &other.totals) && same(&self.sums, &other.sums)
    }
}

impl std::fmt::Debug for LutTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LutTable").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn snapshot(table: &LutTable) -> Vec<(u64, u64)> {
        (0..table.len())
            .map(|i| (table.total(i), table.sum(i)))
            .collect()
    }

    #[test]
    fn test_update_and_weighted_update() {
        let table = LutTable::new(4);
        table.update(1, 10);
        table.update(1, 20);
        table.update_weighted(2, 7, 3);
        assert_eq!((table.total(1), table.sum(1)), (2, 30));
        assert_eq!((table.total(2), table.sum(2)), (3, 21));
        assert_eq!(table.total(0), 0);
        assert_eq!(table.estimate(1), 15);
        assert_eq!(table.estimate(2), 7);
    }

    #[test]
    fn test_estimate_rounds_to_nearest() {
        let table = LutTable::new(2);
        table.update(0, 10);
        table.update(0, 11);
        table.update(0, 11);
        // 32 / 3 = 10.67
        assert_eq!(table.estimate(0), 11);
        table.update(1, 10);
        table.update(1, 10);
        table.update(1, 11);
        // 31 / 3 = 10.33
        assert_eq!(table.estimate(1), 10);
    }

    #[test]
    #[should_panic(expected = "unobserved bin")]
    fn test_zero_total_lookup_panics() {
        LutTable::new(3).estimate(2);
    }

    #[test]
    fn test_update_order_does_not_matter() {
        let mut rng = StdRng::seed_from_u64(7);
        let updates: Vec<(usize, u64)> = (0..20_000)
            .map(|_| (rng.random_range(0..64), rng.random_range(0..=255)))
            .collect();

        let sequential = LutTable::new(64);
        for &(i, v) in &updates {
            sequential.update(i, v);
        }

        let mut shuffled = updates.clone();
        shuffled.shuffle(&mut rng);
        let reordered = LutTable::new(64);
        for &(i, v) in &shuffled {
            reordered.update(i, v);
        }

        let concurrent = LutTable::new(64);
        updates
            .par_iter()
            .for_each(|&(i, v)| concurrent.update(i, v));

        assert_eq!(snapshot(&sequential), snapshot(&reordered));
        assert_eq!(snapshot(&sequential), snapshot(&concurrent));
    }

    #[test]
    fn test_first_unobserved() {
        let table = LutTable::new(3);
        assert_eq!(table.first_unobserved(), Some(0));
        table.update(0, 1);
        table.update(2, 1);
        assert_eq!(table.first_unobserved(), Some(1));
        table.update(1, 1);
        assert_eq!(table.first_unobserved(), None);
    }

    #[test]
    fn test_raw_layout() {
        let table = LutTable::new(2);
        table.update_weighted(0, 3, 2);
        table.update(1, 9);

        let mut bytes = Vec::new();
        table.write_raw(&mut bytes).unwrap();
        assert_eq!(bytes.len(), LutTable::byte_len(2));

        let words: Vec<u64> = bytes
            .chunks_exact(8)
            .map(|b| u64::from_ne_bytes(b.try_into().unwrap()))
            .collect();
        assert_eq!(words, vec![2, 1, 6, 9]);
    }

    #[test]
    fn test_little_endian_layout() {
        let table = LutTable::new(1);
        table.update(0, 0x0102);

        let mut bytes = Vec::new();
        table.write_to(&mut bytes, ByteOrder::Little).unwrap();
        assert_eq!(&bytes[..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..], &0x0102u64.to_le_bytes());

        let back = LutTable::new(1);
        back.read_from(&mut bytes.as_slice(), ByteOrder::Little).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_raw_round_trip_spanning_chunks() {
        let len = IO_CHUNK + 123;
        let table = LutTable::new(len);
        for i in (0..len).step_by(17) {
            table.update_weighted(i, (i % 256) as u64, (i % 5) as u64 + 1);
        }

        let mut bytes = Vec::new();
        table.write_raw(&mut bytes).unwrap();

        let back = LutTable::new(len);
        back.read_raw(&mut bytes.as_slice()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_short_read_fails() {
        let table = LutTable::new(8);
        let bytes = vec![0u8; LutTable::byte_len(8) - 1];
        let err = table.read_raw(&mut bytes.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_uniform_prior() {
        let _tables = crate::testing::full_tables();
        let table = LutTable::with_uniform_prior();
        assert_eq!(table.len(), KEY_SPACE);
        assert_eq!(table.first_unobserved(), None);
        let mismatched = (0..KEY_SPACE).into_par_iter().find_any(|&i| {
            let key = ContextKey::from_index(i);
            table.total(i) != 1 || table.estimate(i) != key.center()
        });
        assert_eq!(mismatched, None);
    }
}
