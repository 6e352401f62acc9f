//! Weight-proportional sampling with replacement
//!
//! Items are stored together with the running total of the weights inserted
//! so far. A draw picks a uniform value in `[0, total)` and binary-searches
//! the running totals, so the selection probability of an item is its weight
//! divided by the total weight, independent of how many items were inserted.

use log::warn;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct WeightedSampler<T> {
    items: Vec<T>,
    cumulative_weights: Vec<f64>,
}

impl<T> WeightedSampler<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cumulative_weights: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            cumulative_weights: Vec::with_capacity(capacity),
        }
    }

    /// Insert an item. Zero weights are stored but can never be drawn;
    /// negative or non-finite weights are treated as zero.
    pub fn add_item(&mut self, item: T, weight: f64) {
        let weight = if weight.is_finite() && weight >= 0.0 {
            weight
        } else {
            warn!("WeightedSampler: ignoring invalid weight {}", weight);
            0.0
        };

        let total = self.total_weight() + weight;
        self.items.push(item);
        self.cumulative_weights.push(total);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cumulative_weights.clear();
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.cumulative_weights.last().copied().unwrap_or(0.0)
    }

    /// Weight the item at `index` was inserted with
    pub fn weight(&self, index: usize) -> Option<f64> {
        let upper = *self.cumulative_weights.get(index)?;
        let lower = if index == 0 {
            0.0
        } else {
            self.cumulative_weights[index - 1]
        };
        Some(upper - lower)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Draw one item with probability proportional to its weight.
    /// Returns `None` when the total weight is zero.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        self.sample_index(rng).map(|index| &self.items[index])
    }

    /// Index of a weighted random draw
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }

        let target = rng.gen_range(0.0..total);
        // First item whose running total exceeds the target
        let index = self.cumulative_weights.partition_point(|&c| c <= target);
        Some(index.min(self.items.len() - 1))
    }

    /// `count` independent draws with replacement
    pub fn sample_n<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&T> {
        (0..count).filter_map(|_| self.sample(rng)).collect()
    }
}

impl<T> Default for WeightedSampler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_add_and_clear() {
        let mut sampler = WeightedSampler::new();
        sampler.add_item("a", 1.0);
        sampler.add_item("b", 3.0);

        assert_eq!(sampler.size(), 2);
        assert!((sampler.total_weight() - 4.0).abs() < 1e-12);
        assert_eq!(sampler.weight(1), Some(3.0));
        assert_eq!(sampler.get(0), Some(&"a"));

        sampler.clear();
        assert!(sampler.is_empty());
        assert_eq!(sampler.total_weight(), 0.0);
    }

    #[test]
    fn test_empty_sampler_returns_none() {
        let sampler: WeightedSampler<u32> = WeightedSampler::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(sampler.sample(&mut rng).is_none());
        assert!(sampler.sample_n(10, &mut rng).is_empty());
    }

    #[test]
    fn test_zero_weight_items_are_never_drawn() {
        let mut sampler = WeightedSampler::new();
        sampler.add_item(0, 0.0);
        sampler.add_item(1, 1.0);
        sampler.add_item(2, 0.0);
        sampler.add_item(3, -5.0);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            assert_eq!(sampler.sample(&mut rng), Some(&1));
        }
    }

    #[test]
    fn test_draws_follow_weights() {
        let mut sampler = WeightedSampler::new();
        sampler.add_item('x', 1.0);
        sampler.add_item('y', 9.0);

        let mut rng = StdRng::seed_from_u64(1234);
        let draws = sampler.sample_n(20_000, &mut rng);
        let y_count = draws.iter().filter(|&&&c| c == 'y').count();
        let ratio = y_count as f64 / draws.len() as f64;

        assert_eq!(draws.len(), 20_000);
        assert!((ratio - 0.9).abs() < 0.02, "ratio = {}", ratio);
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let mut sampler = WeightedSampler::new();
        for i in 0..50 {
            sampler.add_item(i, (i % 7 + 1) as f64);
        }

        let first: Vec<usize> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..100).filter_map(|_| sampler.sample_index(&mut rng)).collect()
        };
        let second: Vec<usize> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..100).filter_map(|_| sampler.sample_index(&mut rng)).collect()
        };
        assert_eq!(first, second);
    }
}
