//! Presentation-order randomization.

use rand::Rng;

/// Returns a new sequence holding exactly the elements of `items` in random order.
///
/// Each element is paired with an independent uniform key in `[0, 1)` and the
/// sequence is ordered by that key. The input is left untouched.
#[must_use]
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut keyed: Vec<(f64, &T)> = items
        .iter()
        .map(|item| (rng.random::<f64>(), item))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, item)| item.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn preserves_the_multiset() {
        let items = vec!["a", "b", "b", "c", "d", "e", "f"];
        let mut rng = StdRng::seed_from_u64(42);

        let mut out = shuffled(&items, &mut rng);
        assert_eq!(out.len(), items.len());

        out.sort_unstable();
        let mut expected = items.clone();
        expected.sort_unstable();
        assert_eq!(out, expected);
    }

    #[test]
    fn leaves_input_untouched() {
        let items = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut rng = StdRng::seed_from_u64(1);
        let _ = shuffled(&items, &mut rng);
        assert_eq!(items, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn empty_and_single_inputs() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(shuffled::<u8, _>(&[], &mut rng).is_empty());
        assert_eq!(shuffled(&["only"], &mut rng), vec!["only"]);
    }

    #[test]
    fn same_seed_same_order() {
        let items: Vec<u32> = (0..32).collect();
        let a = shuffled(&items, &mut StdRng::seed_from_u64(9));
        let b = shuffled(&items, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
