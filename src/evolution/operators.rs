//! Variation operators working on `Build` values.

use crate::data::catalog::Catalog;
use crate::data::Category;
use crate::evolution::build::Build;
use rand::prelude::IndexedRandom;
use rand::Rng;

/// Probability of each category being the one a mutation replaces. CPU and GPU
/// dominate performance, so they are resampled three times as often as the rest.
pub const MUTATION_WEIGHTS: [(Category, f64); 8] = [
    (Category::Cpu, 0.30),
    (Category::Motherboard, 0.10),
    (Category::Gpu, 0.30),
    (Category::Ram, 0.10),
    (Category::Storage, 0.10),
    (Category::PowerSupply, 0.10),
    (Category::Casing, 0.10),
    (Category::FanCpu, 0.10),
];

/// Uniform per-slot crossover producing a single child.
///
/// Each slot is taken from `parent_b` with probability `rate`, otherwise from
/// `parent_a`. The parents are untouched.
pub fn crossover<'a, R: Rng + ?Sized>(
    parent_a: &Build<'a>,
    parent_b: &Build<'a>,
    rate: f64,
    rng: &mut R,
) -> Build<'a> {
    let mut child = *parent_a;
    for category in Category::ALL {
        if rng.random::<f64>() < rate {
            child.set(category, parent_b.get(category));
        }
    }
    child
}

/// With probability `rate`, replaces the component of one weighted-random category
/// with a fresh draw from the catalog. An empty partition leaves the build as it was.
pub fn mutate<'a, R: Rng + ?Sized>(
    build: Build<'a>,
    catalog: &'a Catalog,
    rate: f64,
    rng: &mut R,
) -> Build<'a> {
    if rng.random::<f64>() >= rate {
        return build;
    }

    let category = pick_mutation_category(rng);
    match catalog.sample(category, rng) {
        Some(component) => {
            let mut mutated = build;
            mutated.set(category, Some(component));
            mutated
        }
        None => build,
    }
}

fn pick_mutation_category<R: Rng + ?Sized>(rng: &mut R) -> Category {
    MUTATION_WEIGHTS
        .choose_weighted(rng, |(_, weight)| *weight)
        .map(|(category, _)| *category)
        // the table is constant and valid; this arm is unreachable in practice
        .unwrap_or(Category::Cpu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Component;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn full_catalog(tag: &str, price: f64) -> Catalog {
        let components = Category::ALL
            .into_iter()
            .map(|category| {
                Component::new(category, price, 1.0)
                    .with_name(format!("{}-{}", tag, category))
                    .with_socket("AM5")
                    .with_power(100.0)
            })
            .collect();
        Catalog::new(components).unwrap()
    }

    fn full_build(catalog: &Catalog) -> Build<'_> {
        Category::ALL.into_iter().fold(Build::default(), |build, c| {
            build.with(&catalog.candidates(c)[0])
        })
    }

    fn differing_slots(a: &Build<'_>, b: &Build<'_>) -> usize {
        Category::ALL
            .into_iter()
            .filter(|c| a.get(*c) != b.get(*c))
            .count()
    }

    #[test]
    fn test_mutation_weights_sum_to_one() {
        let total: f64 = MUTATION_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_crossover_rate_zero_returns_first_parent() {
        let catalog_a = full_catalog("a", 1.0);
        let catalog_b = full_catalog("b", 2.0);
        let parent_a = full_build(&catalog_a);
        let parent_b = full_build(&catalog_b);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            assert_eq!(crossover(&parent_a, &parent_b, 0.0, &mut rng), parent_a);
        }
    }

    #[test]
    fn test_crossover_rate_one_returns_second_parent() {
        let catalog_a = full_catalog("a", 1.0);
        let catalog_b = full_catalog("b", 2.0);
        let parent_a = full_build(&catalog_a);
        let parent_b = full_build(&catalog_b);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            assert_eq!(crossover(&parent_a, &parent_b, 1.0, &mut rng), parent_b);
        }
    }

    #[test]
    fn test_crossover_mixes_parent_material_only() {
        let catalog_a = full_catalog("a", 1.0);
        let catalog_b = full_catalog("b", 2.0);
        let parent_a = full_build(&catalog_a);
        let parent_b = full_build(&catalog_b);
        let mut rng = StdRng::seed_from_u64(11);

        let mut from_b = 0;
        for _ in 0..200 {
            let child = crossover(&parent_a, &parent_b, 0.4, &mut rng);
            for category in Category::ALL {
                let slot = child.get(category);
                assert!(slot == parent_a.get(category) || slot == parent_b.get(category));
                if slot == parent_b.get(category) {
                    from_b += 1;
                }
            }
        }
        // 1600 slots at rate 0.4: expect roughly 640 from the second parent
        assert!(from_b > 500 && from_b < 780, "from_b = {}", from_b);
        // Parents are values; they are never touched
        assert_eq!(parent_a, full_build(&catalog_a));
    }

    #[test]
    fn test_mutation_rate_zero_is_identity() {
        let catalog = full_catalog("a", 1.0);
        let other = full_catalog("b", 2.0);
        let build = full_build(&catalog);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            assert_eq!(mutate(build, &other, 0.0, &mut rng), build);
        }
    }

    #[test]
    fn test_mutation_rate_one_changes_exactly_one_slot() {
        let catalog = full_catalog("a", 1.0);
        let other = full_catalog("b", 2.0);
        let build = full_build(&catalog);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let mutated = mutate(build, &other, 1.0, &mut rng);
            assert_eq!(differing_slots(&build, &mutated), 1);
        }
    }

    #[test]
    fn test_mutation_skips_empty_partition() {
        let catalog = full_catalog("a", 1.0);
        let build = full_build(&catalog);
        let empty = Catalog::default();
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            assert_eq!(mutate(build, &empty, 1.0, &mut rng), build);
        }
    }

    #[test]
    fn test_mutation_favours_cpu_and_gpu() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut counts = [0usize; 8];
        for _ in 0..10_000 {
            counts[pick_mutation_category(&mut rng).index()] += 1;
        }
        let cpu = counts[Category::Cpu.index()];
        let gpu = counts[Category::Gpu.index()];
        let ram = counts[Category::Ram.index()];
        assert!(cpu > 2 * ram, "cpu={} ram={}", cpu, ram);
        assert!(gpu > 2 * ram, "gpu={} ram={}", gpu, ram);
    }
}
