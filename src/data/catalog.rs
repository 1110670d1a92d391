use crate::data::{Category, Component, DataError};
use log::{info, warn};
use rand::prelude::IndexedRandom;
use rand::Rng;

/// Read-only view of the catalog, partitioned by category.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    partitions: [Vec<Component>; 8],
}

impl Catalog {
    /// Validates every component and groups them by category.
    ///
    /// # Arguments
    /// * `components` - Components that already went through normalization
    ///
    /// # Returns
    /// * `Result<Self, DataError>` - the catalog, or the first malformed record with its row
    pub fn new(components: Vec<Component>) -> Result<Self, DataError> {
        let mut partitions: [Vec<Component>; 8] = Default::default();
        for (row, component) in components.into_iter().enumerate() {
            component
                .validate()
                .map_err(|reason| DataError::ValidationError { row, reason })?;
            partitions[component.category.index()].push(component);
        }

        let catalog = Self { partitions };
        for category in Category::ALL {
            let count = catalog.candidates(category).len();
            if count == 0 {
                warn!("No components available for category {}", category);
            } else {
                info!("{}: {} candidates", category, count);
            }
        }
        Ok(catalog)
    }

    /// Uniformly draws one component of `category`, or `None` if that partition is empty.
    /// Draws are independent: the same component can come back on the next call.
    pub fn sample<R: Rng + ?Sized>(&self, category: Category, rng: &mut R) -> Option<&Component> {
        self.partitions[category.index()].choose(rng)
    }

    /// All components of one category.
    ///
    /// # Arguments
    /// * `category` - The partition to read
    ///
    /// # Returns
    /// * `&[Component]` - the partition, empty if the catalog has none of that category
    pub fn candidates(&self, category: Category) -> &[Component] {
        &self.partitions[category.index()]
    }

    /// Categories with no candidate at all; any build will have an absent slot there.
    pub fn empty_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.partitions[c.index()].is_empty())
            .collect()
    }

    /// Total number of components across every category.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
