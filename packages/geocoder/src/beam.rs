//! Fixed-capacity container keeping the best-scoring candidates.

/// A scored key held by a [`Beam`].
#[derive(Debug, Clone, PartialEq)]
pub struct BeamEntry<K, V> {
    pub key: K,
    pub value: V,
}

/// Keeps at most `capacity` entries ordered by descending value.
///
/// Entries with equal values stay in insertion order.
#[derive(Debug, Clone)]
pub struct Beam<K, V> {
    capacity: usize,
    entries: Vec<BeamEntry<K, V>>,
}

impl<K, V: PartialOrd + Copy> Beam<K, V> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Offers a candidate. It is dropped if the beam is full and the
    /// candidate does not beat the current worst entry.
    pub fn add(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity
            && self.entries.last().is_some_and(|worst| worst.value >= value)
        {
            return;
        }

        let pos = self.entries.partition_point(|e| e.value >= value);
        self.entries.insert(pos, BeamEntry { key, value });
        self.entries.truncate(self.capacity);
    }

    /// Entries ordered by descending value.
    #[must_use]
    pub fn entries(&self) -> &[BeamEntry<K, V>] {
        &self.entries
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(beam: &Beam<&'static str, f64>) -> Vec<&'static str> {
        beam.entries().iter().map(|e| e.key).collect()
    }

    #[test]
    fn keeps_descending_order() {
        let mut beam = Beam::new(10);
        beam.add("b", 2.0);
        beam.add("c", 1.0);
        beam.add("a", 3.0);
        assert_eq!(keys(&beam), ["a", "b", "c"]);
    }

    #[test]
    fn evicts_worst_when_full() {
        let mut beam = Beam::new(2);
        beam.add("low", 1.0);
        beam.add("mid", 2.0);
        beam.add("high", 3.0);
        beam.add("lowest", 0.5);
        assert_eq!(keys(&beam), ["high", "mid"]);
        assert_eq!(beam.len(), beam.capacity());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut beam = Beam::new(3);
        beam.add("first", 1.0);
        beam.add("second", 1.0);
        beam.add("third", 1.0);
        beam.add("fourth", 1.0);
        assert_eq!(keys(&beam), ["first", "second", "third"]);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut beam = Beam::new(0);
        beam.add("x", 1.0);
        assert!(beam.is_empty());
    }
}
