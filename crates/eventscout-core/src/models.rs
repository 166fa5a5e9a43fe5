use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use eventscout_cache::ItemRow;

/// One venue/event as we cache it
///
/// Identity is `item_id` and nothing else. Two searches from different
/// places give different `distance` values for the same event, and they
/// still compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub name: String,
    pub rating: f64,
    pub address: String,
    pub categories: HashSet<String>,
    pub image_url: String,
    pub url: String,
    pub distance: f64,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.item_id == other.item_id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item_id.hash(state);
    }
}

impl Item {
    pub fn builder(item_id: impl Into<String>) -> ItemBuilder {
        ItemBuilder::new(item_id)
    }

    /// Descriptive columns for the `items` table
    pub fn to_row(&self) -> ItemRow {
        ItemRow {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            rating: self.rating,
            address: self.address.clone(),
            image_url: self.image_url.clone(),
            url: self.url.clone(),
            distance: self.distance,
        }
    }

    /// Rebuild an item from its cached row plus its category set
    pub fn from_row(row: ItemRow, categories: HashSet<String>) -> Self {
        Self {
            item_id: row.item_id,
            name: row.name,
            rating: row.rating,
            address: row.address,
            categories,
            image_url: row.image_url,
            url: row.url,
            distance: row.distance,
        }
    }
}

/// Builder so providers don't have to spell out every field
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item: Item {
                item_id: item_id.into(),
                name: String::new(),
                rating: 0.0,
                address: String::new(),
                categories: HashSet::new(),
                image_url: String::new(),
                url: String::new(),
                distance: 0.0,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.item.name = name.into();
        self
    }

    pub fn rating(mut self, rating: f64) -> Self {
        self.item.rating = rating;
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.item.address = address.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.item.categories.insert(category.into());
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.item
            .categories
            .extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.item.image_url = image_url.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.item.url = url.into();
        self
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.item.distance = distance;
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_id_only() {
        let near = Item::builder("tm-1").name("Jazz").distance(0.5).build();
        let far = Item::builder("tm-1").name("Jazz!").distance(30.0).build();
        let other = Item::builder("tm-2").name("Jazz").distance(0.5).build();

        assert_eq!(near, far);
        assert_ne!(near, other);

        let set: HashSet<Item> = [near, far, other].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_categories_collapse_duplicates() {
        let item = Item::builder("tm-1")
            .category("music")
            .categories(["music", "outdoor"])
            .build();
        assert_eq!(item.categories.len(), 2);
    }

    #[test]
    fn test_row_round_trip_keeps_fields() {
        let item = Item::builder("tm-1")
            .name("Jazz Night")
            .rating(4.0)
            .address("131 W 3rd St, New York")
            .image_url("https://img.example.com/j.jpg")
            .url("https://tm.example.com/j")
            .distance(2.5)
            .category("music")
            .build();

        let rebuilt = Item::from_row(item.to_row(), item.categories.clone());
        assert_eq!(rebuilt.name, "Jazz Night");
        assert_eq!(rebuilt.rating, 4.0);
        assert_eq!(rebuilt.distance, 2.5);
        assert_eq!(rebuilt.url, item.url);
        assert!(rebuilt.categories.contains("music"));
    }

    #[test]
    fn test_serializes_to_json() {
        let item = Item::builder("tm-1").name("Jazz").category("music").build();
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"item_id\":\"tm-1\""));
        assert!(json.contains("music"));
    }
}
