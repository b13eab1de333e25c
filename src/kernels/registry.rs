//! Kernel registry for looking up exported entry points by name.

use crate::core::error::{ExportError, ExportResult};
use crate::export::entry::EntryPoint;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Factory function for building an entry point.
pub type EntryFactory = Arc<dyn Fn() -> ExportResult<EntryPoint> + Send + Sync>;

/// Kernel category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Per-pixel colour transforms.
    Color,
    /// Geometric transforms.
    Transform,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Color => write!(f, "Color"),
            Category::Transform => write!(f, "Transform"),
        }
    }
}

/// Registry entry containing the factory and a description.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to build the entry point.
    pub factory: EntryFactory,
    pub category: Category,
    /// One-line description for listings.
    pub description: String,
}

/// Registry of named entry points, in registration order.
pub struct KernelRegistry {
    /// Entries indexed by entry point name.
    entries: IndexMap<String, RegistryEntry>,
    /// Names grouped by category.
    categories: IndexMap<Category, Vec<String>>,
}

impl KernelRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            categories: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in kernels.
    pub fn with_builtins() -> Self {
        use crate::kernels::{color, rotate};

        let mut registry = Self::new();
        registry.register(
            "grayscale",
            Category::Color,
            "Fixed-point luma, alpha preserved",
            color::export_grayscale,
        );
        registry.register(
            "contrast",
            Category::Color,
            "Contrast around mid-grey, factor clamped to [0, 1]",
            color::export_contrast,
        );
        registry.register(
            "split",
            Category::Color,
            "Isolate red, green and blue into three outputs",
            color::export_split,
        );
        registry.register(
            "rotate90",
            Category::Transform,
            "Quarter turn clockwise, transposed output",
            rotate::export_rotate90,
        );
        registry.register(
            "rotate180",
            Category::Transform,
            "Half turn",
            rotate::export_rotate180,
        );
        registry.register(
            "rotate270",
            Category::Transform,
            "Quarter turn counter-clockwise, transposed output",
            rotate::export_rotate270,
        );
        log::debug!("Registered {} built-in kernels", registry.len());
        registry
    }

    /// Register an entry point factory. A name registered twice keeps its
    /// position and takes the new factory.
    pub fn register<F>(&mut self, name: &str, category: Category, description: &str, factory: F)
    where
        F: Fn() -> ExportResult<EntryPoint> + Send + Sync + 'static,
    {
        let entry = RegistryEntry {
            factory: Arc::new(factory),
            category,
            description: description.to_string(),
        };

        if let Some(old) = self.entries.insert(name.to_string(), entry) {
            if let Some(names) = self.categories.get_mut(&old.category) {
                names.retain(|n| n != name);
            }
        }

        // Add to category index
        self.categories
            .entry(category)
            .or_default()
            .push(name.to_string());
    }

    /// Build the entry point registered under `name`.
    pub fn create(&self, name: &str) -> ExportResult<EntryPoint> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ExportError::KernelNotFound(name.to_string()))?;
        (entry.factory)()
    }

    /// Get a registry entry.
    pub fn get_entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// Check if a kernel is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Get names by category.
    pub fn by_category(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|names| names.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Get entries grouped by category for listings.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<(&str, &RegistryEntry)>> {
        let mut grouped: IndexMap<Category, Vec<(&str, &RegistryEntry)>> = IndexMap::new();
        for (name, entry) in &self.entries {
            grouped
                .entry(entry.category)
                .or_default()
                .push((name.as_str(), entry));
        }
        grouped
    }

    /// Get the total number of registered kernels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
