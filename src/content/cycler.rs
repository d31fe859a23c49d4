//! Per-client label rotation.
//!
//! A [`Cycler`] hands out the labels of one category in a uniformly random
//! order, never repeating a label until every label has been handed out once.
//! When the last label of a permutation is popped the cycler reports
//! `cycle_completed` on that draw and immediately refills itself with a fresh
//! shuffle, so the following call never sees an empty queue.
//!
//! The label that closes one cycle may legitimately open the next one; the
//! two permutations are independent.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;

use super::{Category, ContentTable};

/// Result of a single [`Cycler::next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub label: String,
    /// True on the draw that exhausted the current permutation.
    pub cycle_completed: bool,
}

#[derive(Debug, Clone)]
pub struct Cycler {
    labels: Vec<String>,
    queue: VecDeque<String>,
    rng: StdRng,
}

impl Cycler {
    /// Create a cycler over `labels` seeded from OS entropy.
    pub fn new(labels: &[String]) -> Self {
        Self::with_rng(labels, StdRng::from_entropy())
    }

    /// Create a cycler with a caller-supplied generator (deterministic in tests).
    pub fn with_rng(labels: &[String], rng: StdRng) -> Self {
        let mut cycler = Cycler {
            labels: labels.to_vec(),
            queue: VecDeque::with_capacity(labels.len()),
            rng,
        };
        cycler.refill();
        cycler
    }

    /// Pop the next label, refilling eagerly once the permutation runs out.
    ///
    /// A [`ContentTable`] never yields an empty label set; a cycler built over
    /// one anyway returns an empty label with `cycle_completed` set.
    pub fn next(&mut self) -> Draw {
        if self.queue.is_empty() {
            self.refill();
        }
        let label = self.queue.pop_front().unwrap_or_default();
        let cycle_completed = self.queue.is_empty();
        if cycle_completed {
            self.refill();
        }
        Draw {
            label,
            cycle_completed,
        }
    }

    /// Labels still pending in the current permutation.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn cycle_len(&self) -> usize {
        self.labels.len()
    }

    fn refill(&mut self) {
        let mut order = self.labels.clone();
        // SliceRandom::shuffle is a Fisher-Yates shuffle: uniform over all permutations.
        order.shuffle(&mut self.rng);
        self.queue.clear();
        self.queue.extend(order);
    }
}

/// The two cyclers owned by one client session.
#[derive(Debug, Clone)]
pub struct SessionCyclers {
    joke: Cycler,
    proverb: Cycler,
}

impl SessionCyclers {
    pub fn new(table: &ContentTable) -> Self {
        SessionCyclers {
            joke: Cycler::new(table.labels(Category::Joke)),
            proverb: Cycler::new(table.labels(Category::Proverb)),
        }
    }

    pub fn with_seed(table: &ContentTable, seed: u64) -> Self {
        SessionCyclers {
            joke: Cycler::with_rng(table.labels(Category::Joke), StdRng::seed_from_u64(seed)),
            proverb: Cycler::with_rng(
                table.labels(Category::Proverb),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
        }
    }

    pub fn next(&mut self, category: Category) -> Draw {
        self.cycler_mut(category).next()
    }

    pub fn cycler(&self, category: Category) -> &Cycler {
        match category {
            Category::Joke => &self.joke,
            Category::Proverb => &self.proverb,
        }
    }

    fn cycler_mut(&mut self, category: Category) -> &mut Cycler {
        match category {
            Category::Joke => &mut self.joke,
            Category::Proverb => &mut self.proverb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> ContentTable {
        let jokes: BTreeMap<String, String> = ["JA", "JB", "JC", "JD"]
            .iter()
            .map(|l| (l.to_string(), format!("joke {l}")))
            .collect();
        let proverbs: BTreeMap<String, String> = ["PA", "PB", "PC"]
            .iter()
            .map(|l| (l.to_string(), format!("proverb {l}")))
            .collect();
        ContentTable::new(jokes, proverbs).unwrap()
    }

    #[test]
    fn every_window_of_one_cycle_is_distinct() {
        let set = labels(&["JA", "JB", "JC", "JD"]);
        for seed in 0..50 {
            let mut cycler = Cycler::with_rng(&set, StdRng::seed_from_u64(seed));
            for _ in 0..5 {
                let cycle: HashSet<String> = (0..set.len()).map(|_| cycler.next().label).collect();
                assert_eq!(cycle.len(), set.len(), "seed {seed} repeated within a cycle");
                assert!(cycle.iter().all(|l| set.contains(l)));
            }
        }
    }

    #[test]
    fn cycle_completed_fires_once_per_exhaustion() {
        let set = labels(&["JA", "JB", "JC", "JD"]);
        let mut cycler = Cycler::with_rng(&set, StdRng::seed_from_u64(7));
        let flags: Vec<bool> = (0..12).map(|_| cycler.next().cycle_completed).collect();
        let fired: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fired, vec![3, 7, 11]);
    }

    #[test]
    fn refill_is_eager() {
        let set = labels(&["A", "B"]);
        let mut cycler = Cycler::with_rng(&set, StdRng::seed_from_u64(1));
        assert_eq!(cycler.remaining(), 2);
        cycler.next();
        assert_eq!(cycler.remaining(), 1);
        let draw = cycler.next();
        assert!(draw.cycle_completed);
        assert_eq!(cycler.remaining(), 2);
    }

    #[test]
    fn single_label_completes_every_draw() {
        let set = labels(&["ONLY"]);
        let mut cycler = Cycler::with_rng(&set, StdRng::seed_from_u64(3));
        for _ in 0..3 {
            let draw = cycler.next();
            assert_eq!(draw.label, "ONLY");
            assert!(draw.cycle_completed);
        }
    }

    #[test]
    fn shuffle_reaches_every_permutation() {
        // 3 labels -> 6 permutations; 600 fresh cyclers should hit each of them.
        let set = labels(&["A", "B", "C"]);
        let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
        for seed in 0..600 {
            let mut cycler = Cycler::with_rng(&set, StdRng::seed_from_u64(seed));
            let perm: Vec<String> = (0..3).map(|_| cycler.next().label).collect();
            *seen.entry(perm).or_default() += 1;
        }
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|n| *n > 50), "skewed distribution: {seen:?}");
    }

    #[test]
    fn session_cyclers_keep_categories_independent() {
        let table = table();
        let mut cyclers = SessionCyclers::with_seed(&table, 42);
        let first_joke = cyclers.next(Category::Joke);
        assert!(first_joke.label.starts_with('J'));
        // Proverb draws must not advance the joke queue.
        for _ in 0..3 {
            assert!(cyclers.next(Category::Proverb).label.starts_with('P'));
        }
        assert_eq!(cyclers.cycler(Category::Joke).remaining(), 3);
        assert_eq!(cyclers.cycler(Category::Proverb).remaining(), 3);
        assert_eq!(cyclers.cycler(Category::Proverb).cycle_len(), 3);
    }
}
