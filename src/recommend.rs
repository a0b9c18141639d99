use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::models::ItemWithStats;

/// Maximum number of items suggested on the home page
pub const MAX_RECOMMENDATIONS: usize = 3;

/// One entry of a user's review history, as needed by the affinity engine
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ReviewedItem {
    pub item_id: i64,
    pub category: String,
    pub rating: i64,
}

/// Result of the affinity computation
///
/// `favorite_category` is `None` only for a user without reviews. A favorite
/// category whose items were all reviewed already yields an empty `items` list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Recommendation {
    #[serde(rename = "recommendedForCategory")]
    pub favorite_category: Option<String>,
    #[serde(rename = "recommendations")]
    pub items: Vec<ItemWithStats>,
}

#[derive(Default)]
struct CategoryTally {
    total: i64,
    count: i64,
}

impl CategoryTally {
    fn mean(&self) -> f64 {
        self.total as f64 / self.count as f64
    }
}

/// Pick the category the user rates highest on average
///
/// Categories are visited in name order and only a strictly greater mean
/// replaces the current best, so ties resolve to the lowest category name.
pub fn favorite_category(history: &[ReviewedItem]) -> Option<String> {
    let mut tallies: BTreeMap<&str, CategoryTally> = BTreeMap::new();
    for review in history {
        let tally = tallies.entry(review.category.as_str()).or_default();
        tally.total += review.rating;
        tally.count += 1;
    }

    let mut best: Option<(&str, f64)> = None;
    for (category, tally) in &tallies {
        let mean = tally.mean();
        match best {
            Some((_, best_mean)) if mean <= best_mean => {}
            _ => best = Some((category, mean)),
        }
    }

    best.map(|(category, _)| category.to_string())
}

/// Compute the favorite category and up to three unseen items in it
///
/// Pure function of its inputs: the same history and catalog always produce the
/// same result. Candidates are ranked by average rating (best first), then by
/// name and id so equal ratings keep a stable order.
pub fn recommend(history: &[ReviewedItem], catalog: &[ItemWithStats]) -> Recommendation {
    let Some(category) = favorite_category(history) else {
        return Recommendation::default();
    };

    let reviewed: HashSet<i64> = history.iter().map(|review| review.item_id).collect();

    let mut items: Vec<ItemWithStats> = catalog
        .iter()
        .filter(|entry| entry.item.category == category && !reviewed.contains(&entry.item.id))
        .cloned()
        .collect();

    items.sort_by(|a, b| {
        b.stats
            .avg_rating
            .total_cmp(&a.stats.avg_rating)
            .then_with(|| a.item.name.cmp(&b.item.name))
            .then_with(|| a.item.id.cmp(&b.item.id))
    });
    items.truncate(MAX_RECOMMENDATIONS);

    Recommendation {
        favorite_category: Some(category),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, ItemStats};
    use chrono::Utc;

    fn reviewed(item_id: i64, category: &str, rating: i64) -> ReviewedItem {
        ReviewedItem {
            item_id,
            category: category.to_string(),
            rating,
        }
    }

    fn catalog_item(id: i64, name: &str, category: &str, avg_rating: f64) -> ItemWithStats {
        ItemWithStats {
            item: Item {
                id,
                name: name.to_string(),
                category: category.to_string(),
                description: None,
                image_url: String::new(),
                created_at: Utc::now(),
            },
            stats: ItemStats {
                avg_rating,
                review_count: 1,
                avg_sentiment: 0.0,
            },
        }
    }

    fn ids(recommendation: &Recommendation) -> Vec<i64> {
        recommendation.items.iter().map(|entry| entry.item.id).collect()
    }

    #[test]
    fn cold_start_user_gets_nothing() {
        let catalog = vec![catalog_item(1, "Veg Samosa", "Snack", 4.5)];
        let result = recommend(&[], &catalog);
        assert_eq!(result, Recommendation::default());
        assert!(result.favorite_category.is_none());
        assert!(result.items.is_empty());
    }

    #[test]
    fn highest_mean_category_wins() {
        let history = vec![
            reviewed(1, "Lunch", 5),
            reviewed(2, "Lunch", 3),
            reviewed(3, "Snack", 2),
        ];
        let catalog = vec![
            catalog_item(1, "Paneer Butter Masala", "Lunch", 5.0),
            catalog_item(2, "Chicken Biryani", "Lunch", 3.0),
            catalog_item(3, "Veg Samosa", "Snack", 4.5),
            catalog_item(4, "Veg Thali", "Lunch", 4.0),
            catalog_item(5, "Pav Bhaji", "Snack", 5.0),
        ];

        let result = recommend(&history, &catalog);
        assert_eq!(result.favorite_category.as_deref(), Some("Lunch"));
        assert_eq!(ids(&result), vec![4]);
    }

    #[test]
    fn mean_is_used_rather_than_total() {
        // Snack totals 8 over four reviews, Lunch 5 over one.
        let history = vec![
            reviewed(1, "Snack", 2),
            reviewed(2, "Snack", 2),
            reviewed(3, "Snack", 2),
            reviewed(4, "Snack", 2),
            reviewed(5, "Lunch", 5),
        ];
        assert_eq!(favorite_category(&history).as_deref(), Some("Lunch"));
    }

    #[test]
    fn ties_resolve_to_lowest_category_name() {
        let history = vec![reviewed(1, "Snack", 4), reviewed(2, "Beverage", 4)];
        assert_eq!(favorite_category(&history).as_deref(), Some("Beverage"));

        let reversed = vec![reviewed(2, "Beverage", 4), reviewed(1, "Snack", 4)];
        assert_eq!(favorite_category(&reversed).as_deref(), Some("Beverage"));
    }

    #[test]
    fn results_are_ranked_and_truncated() {
        let history = vec![reviewed(10, "Lunch", 5)];
        let catalog = vec![
            catalog_item(1, "A", "Lunch", 3.0),
            catalog_item(2, "B", "Lunch", 4.8),
            catalog_item(3, "C", "Lunch", 4.1),
            catalog_item(4, "D", "Lunch", 0.0),
            catalog_item(5, "E", "Lunch", 4.1),
            catalog_item(10, "Reviewed", "Lunch", 5.0),
        ];

        let result = recommend(&history, &catalog);
        assert_eq!(ids(&result), vec![2, 3, 5]);
        assert!(result.items.len() <= MAX_RECOMMENDATIONS);
        assert!(result.items.iter().all(|entry| entry.item.id != 10));
    }

    #[test]
    fn favorite_category_survives_when_everything_was_reviewed() {
        let history = vec![reviewed(1, "Breakfast", 4)];
        let catalog = vec![
            catalog_item(1, "Masala Dosa", "Breakfast", 4.0),
            catalog_item(2, "Cold Coffee", "Beverage", 2.0),
        ];

        let result = recommend(&history, &catalog);
        assert_eq!(result.favorite_category.as_deref(), Some("Breakfast"));
        assert!(result.items.is_empty());
    }

    #[test]
    fn recomputing_gives_identical_output() {
        let history = vec![reviewed(1, "Lunch", 4), reviewed(2, "Snack", 4)];
        let catalog = vec![
            catalog_item(3, "X", "Lunch", 4.0),
            catalog_item(4, "Y", "Lunch", 4.0),
            catalog_item(5, "Z", "Snack", 1.0),
        ];

        let first = recommend(&history, &catalog);
        let second = recommend(&history, &catalog);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec![3, 4]);
    }
}
