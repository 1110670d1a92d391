use crate::data::catalog::Catalog;
use crate::data::{Category, Component};
use rand::Rng;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One candidate configuration: a slot per category, each either a borrowed catalog
/// component or absent.
///
/// Builds are `Copy`. Crossover, mutation and elitism all work on values, so an elite
/// that is also a crossover parent can never be altered through another handle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Build<'a> {
    slots: [Option<&'a Component>; 8],
}

impl<'a> Build<'a> {
    /// Reads one slot.
    ///
    /// # Arguments
    /// * `category` - The slot to read
    ///
    /// # Returns
    /// * `Option<&Component>` - the component in that slot, or `None` if it is absent
    pub fn get(&self, category: Category) -> Option<&'a Component> {
        self.slots[category.index()]
    }

    /// Overwrites one slot. Passing `None` marks it absent.
    ///
    /// # Arguments
    /// * `category` - The slot to write
    /// * `component` - The new occupant, expected to belong to `category`
    pub fn set(&mut self, category: Category, component: Option<&'a Component>) {
        self.slots[category.index()] = component;
    }

    /// Places `component` in the slot of its own category.
    pub fn with(mut self, component: &'a Component) -> Self {
        self.set(component.category, Some(component));
        self
    }

    /// Present components, in slot order.
    pub fn components(&self) -> impl Iterator<Item = &'a Component> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// True when all eight slots hold a component, the precondition for scoring above 0.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// # Returns
    /// * `Vec<Category>` - categories whose slot is absent, in category order
    pub fn missing_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_none())
            .collect()
    }

    /// Sum of prices over present slots.
    pub fn total_price(&self) -> f64 {
        self.components().map(|c| c.price).sum()
    }

    /// Sum of normalized performance over present slots.
    pub fn total_performance(&self) -> f64 {
        self.components().map(|c| c.normalized_performance).sum()
    }
}

/// Serialized as a map from category name to the full component record (or `null`).
impl Serialize for Build<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for category in Category::ALL {
            map.serialize_entry(category.name(), &self.get(category))?;
        }
        map.end()
    }
}

/// Draws one component per category, independently. Slots of empty categories stay absent.
pub fn create_individual<'a, R: Rng + ?Sized>(catalog: &'a Catalog, rng: &mut R) -> Build<'a> {
    let mut build = Build::default();
    for category in Category::ALL {
        build.set(category, catalog.sample(category, rng));
    }
    build
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn get_test_catalog() -> Catalog {
        Catalog::new(vec![
            Component::new(Category::Cpu, 200.0, 10.0)
                .with_socket("AM5")
                .with_power(65.0)
                .with_normalized_performance(0.5),
            Component::new(Category::Motherboard, 100.0, 1.0)
                .with_socket("AM5")
                .with_normalized_performance(0.25),
            Component::new(Category::Ram, 40.0, 1.0).with_normalized_performance(0.125),
        ])
        .unwrap()
    }

    #[test]
    fn test_create_individual_leaves_empty_categories_absent() {
        let catalog = get_test_catalog();
        let mut rng = StdRng::seed_from_u64(1);

        let build = create_individual(&catalog, &mut rng);

        assert!(build.get(Category::Cpu).is_some());
        assert!(build.get(Category::Motherboard).is_some());
        assert!(build.get(Category::Ram).is_some());
        assert!(!build.is_complete());
        assert_eq!(
            build.missing_categories(),
            vec![
                Category::Gpu,
                Category::Storage,
                Category::PowerSupply,
                Category::Casing,
                Category::FanCpu
            ]
        );
    }

    #[test]
    fn test_totals_skip_absent_slots() {
        let catalog = get_test_catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let build = create_individual(&catalog, &mut rng);

        assert_eq!(build.total_price(), 340.0);
        assert_eq!(build.total_performance(), 0.875);
        assert_eq!(Build::default().total_price(), 0.0);
    }

    #[test]
    fn test_serializes_every_slot_by_name() {
        let catalog = get_test_catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let build = create_individual(&catalog, &mut rng);

        let json = serde_json::to_value(build).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 8);
        assert_eq!(map["CPU"]["socket"], "AM5");
        assert_eq!(map["CPU"]["category"], 1);
        assert!(map["Power Supply"].is_null());
        assert!(map["Fan CPU"].is_null());
    }
}
