use crate::{
    db::{DBClient, FavoriteExt, ItemExt, ReviewExt, UserExt},
    models::UserRole,
    sentiment::SentimentScorer,
    utils::password,
};

struct DemoItem {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    image_url: &'static str,
}

const DEMO_ITEMS: [DemoItem; 5] = [
    DemoItem {
        name: "Veg Samosa",
        category: "Snack",
        description: "Classic crispy samosa with potato filling.",
        image_url: "https://images.unsplash.com/photo-1625709372223-9807de738531?fit=crop&w=800&q=80",
    },
    DemoItem {
        name: "Paneer Butter Masala",
        category: "Lunch",
        description: "Creamy and rich paneer curry.",
        image_url: "https://images.unsplash.com/photo-1631452180539-96aca7d4062a?fit=crop&w=800&q=80",
    },
    DemoItem {
        name: "Cold Coffee",
        category: "Beverage",
        description: "Refreshing and strong cold coffee.",
        image_url: "https://images.unsplash.com/photo-1551030173-17d6a1ae25c3?fit=crop&w=800&q=80",
    },
    DemoItem {
        name: "Chicken Biryani",
        category: "Lunch",
        description: "Aromatic rice dish with tender chicken pieces.",
        image_url: "https://images.unsplash.com/photo-1589302168068-964664d93dc0?fit=crop&w=800&q=80",
    },
    DemoItem {
        name: "Masala Dosa",
        category: "Breakfast",
        description: "A South Indian classic, crispy and savory.",
        image_url: "https://images.unsplash.com/photo-1626501237233-31c0a7f134c2?fit=crop&w=800&q=80",
    },
];

/// Fill an empty database with two accounts, a small menu, reviews and favorites
///
/// Does nothing (and returns `false`) as soon as any user exists. Review
/// sentiment goes through `scorer`, like a review posted over HTTP.
pub async fn seed_demo_data(db: &DBClient, scorer: &SentimentScorer) -> Result<bool, sqlx::Error> {
    if db.get_user_count().await? > 0 {
        tracing::info!("Database already has users, skipping demo data");
        return Ok(false);
    }

    let hash = |raw: &str| {
        password::hash(raw).map_err(|e| sqlx::Error::Protocol(format!("demo password: {}", e)))
    };

    let admin = db
        .save_user(
            "admin",
            &hash("password")?,
            UserRole::Admin,
            Some("The original Canteen Crusader. Finding the best food on campus."),
        )
        .await?;
    let troy = db
        .save_user(
            "Troy",
            &hash("1234")?,
            UserRole::User,
            Some("Just a student looking for a good lunch."),
        )
        .await?;

    let mut items = Vec::with_capacity(DEMO_ITEMS.len());
    for demo in &DEMO_ITEMS {
        let item = db
            .create_item(
                demo.name,
                demo.category,
                Some(demo.description),
                Some(demo.image_url),
            )
            .await?;
        items.push(item);
    }
    let [samosa, paneer, coffee, biryani, _dosa] = &items[..] else {
        return Err(sqlx::Error::Protocol("demo menu is incomplete".to_string()));
    };

    let reviews = [
        (admin.id, samosa.id, 5, "Absolutely the best samosa on campus!"),
        (troy.id, samosa.id, 4, "Really good, but a bit too oily sometimes."),
        (troy.id, paneer.id, 5, "The Paneer Butter Masala is creamy and delicious."),
        (admin.id, coffee.id, 2, "The cold coffee was terrible and watery."),
        (troy.id, biryani.id, 3, "The biryani was just average."),
    ];
    for (user_id, item_id, rating, text) in reviews {
        let sentiment = scorer.score(text).await;
        db.create_review(user_id, item_id, rating, text, sentiment)
            .await?;
    }

    db.add_favorite(troy.id, samosa.id).await?;
    db.add_favorite(troy.id, paneer.id).await?;
    db.add_favorite(admin.id, biryani.id).await?;

    tracing::info!(
        users = 2,
        items = items.len(),
        "Demo data seeded (admin/password, Troy/1234)"
    );

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_client;

    #[tokio::test]
    async fn seeds_once_into_an_empty_database() {
        let db = test_client().await;

        assert!(seed_demo_data(&db, &SentimentScorer::Lexicon).await.unwrap());
        assert!(!seed_demo_data(&db, &SentimentScorer::Lexicon).await.unwrap());

        assert_eq!(db.get_user_count().await.unwrap(), 2);
        assert_eq!(db.get_catalog().await.unwrap().len(), 5);
        assert_eq!(db.get_all_reviews().await.unwrap().len(), 5);

        let troy = db.get_user(None, Some("Troy")).await.unwrap().unwrap();
        let favorites: Vec<String> = db
            .get_favorites(troy.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.item.name)
            .collect();
        assert_eq!(favorites, vec!["Paneer Butter Masala", "Veg Samosa"]);

        let admin = db.get_user(None, Some("admin")).await.unwrap().unwrap();
        assert!(admin.is_admin());
        assert!(password::compare("password", &admin.password).unwrap());
    }

    #[tokio::test]
    async fn seeded_samosa_has_expected_stats() {
        let db = test_client().await;
        seed_demo_data(&db, &SentimentScorer::Lexicon).await.unwrap();

        let samosa = db
            .get_catalog()
            .await
            .unwrap()
            .into_iter()
            .find(|i| i.item.name == "Veg Samosa")
            .unwrap();
        assert_eq!(samosa.stats.review_count, 2);
        assert_eq!(samosa.stats.avg_rating, 4.5);
    }
}
