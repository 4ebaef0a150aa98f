//! Repository tests against a real Postgres; `DATABASE_URL` must point at a
//! server where the test user may create databases.

use axum::http::StatusCode;
use foodgram::importer::{
    parse::{IngredientRecord, TagRecord},
    repo::{upsert_ingredients, upsert_tags},
};
use foodgram::ingredients::repo::search;
use foodgram::recipes::{repo, repo_types::RecipeChanges};
use foodgram::relations::{services as relations, PgRelationStore, RelationKind, RelationStore};
use foodgram::shopping_list::{aggregate, render_report, repo::cart_ingredients, REPORT_HEADER};
use sqlx::PgPool;

mod common;

#[sqlx::test(migrations = "./migrations")]
async fn cart_report_sums_ingredients_across_recipes(pool: PgPool) {
    let cook = common::user(&pool, "cook").await;
    let buyer = common::user(&pool, "buyer").await;
    let lunch = common::tag(&pool, "Обед", "lunch", "#49B64E").await;
    let salt = common::ingredient(&pool, "salt", "g").await;
    let pepper = common::ingredient(&pool, "pepper", "g").await;

    let a = common::recipe(&pool, cook.id, "a", vec![lunch], vec![(salt, 2), (pepper, 1)]).await;
    let b = common::recipe(&pool, cook.id, "b", vec![lunch], vec![(salt, 3)]).await;
    let not_in_cart = common::recipe(&pool, cook.id, "c", vec![lunch], vec![(salt, 100)]).await;

    let store = PgRelationStore::new(pool.clone());
    for id in [a, b] {
        relations::add(&store, RelationKind::ShoppingCart, buyer.id, id)
            .await
            .expect("add to cart");
    }
    relations::add(&store, RelationKind::ShoppingCart, cook.id, not_in_cart)
        .await
        .expect("other user's cart");

    let rows = cart_ingredients(&pool, buyer.id).await.unwrap();
    let report = render_report(&aggregate(rows));
    assert_eq!(report, format!("{REPORT_HEADER}\npepper - 1 g\nsalt - 5 g\n"));

    let empty = render_report(&aggregate(cart_ingredients(&pool, 9999).await.unwrap()));
    assert_eq!(empty, format!("{REPORT_HEADER}\n"));
}

#[sqlx::test(migrations = "./migrations")]
async fn favorite_twice_conflicts_and_remove_twice_is_bad_request(pool: PgPool) {
    let cook = common::user(&pool, "cook").await;
    let fan = common::user(&pool, "fan").await;
    let tag = common::tag(&pool, "Ужин", "dinner", "#8775D2").await;
    let salt = common::ingredient(&pool, "salt", "g").await;
    let recipe = common::recipe(&pool, cook.id, "soup", vec![tag], vec![(salt, 1)]).await;

    let store = PgRelationStore::new(pool.clone());
    relations::add(&store, RelationKind::Favorite, fan.id, recipe)
        .await
        .expect("first add");
    let err = relations::add(&store, RelationKind::Favorite, fan.id, recipe)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    // The raw insert relies on the unique constraint alone.
    assert!(!store
        .insert(RelationKind::Favorite, fan.id, recipe)
        .await
        .unwrap());

    relations::remove(&store, RelationKind::Favorite, fan.id, recipe)
        .await
        .expect("first remove");
    let err = relations::remove(&store, RelationKind::Favorite, fan.id, recipe)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = relations::add(&store, RelationKind::Favorite, fan.id, recipe + 1000)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn following_twice_conflicts(pool: PgPool) {
    let cook = common::user(&pool, "cook").await;
    let fan = common::user(&pool, "fan").await;

    let store = PgRelationStore::new(pool.clone());
    relations::add(&store, RelationKind::Follow, fan.id, cook.id)
        .await
        .expect("follow");
    let err = relations::add(&store, RelationKind::Follow, fan.id, cook.id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_replaces_tags_and_ingredients(pool: PgPool) {
    let cook = common::user(&pool, "cook").await;
    let breakfast = common::tag(&pool, "Завтрак", "breakfast", "#E26C2D").await;
    let dinner = common::tag(&pool, "Ужин", "dinner", "#8775D2").await;
    let salt = common::ingredient(&pool, "salt", "g").await;
    let pepper = common::ingredient(&pool, "pepper", "g").await;
    let sugar = common::ingredient(&pool, "sugar", "g").await;
    let id = common::recipe(
        &pool,
        cook.id,
        "porridge",
        vec![breakfast],
        vec![(salt, 2), (pepper, 1)],
    )
    .await;

    let mut tx = pool.begin().await.unwrap();
    repo::update_tx(
        &mut tx,
        id,
        &RecipeChanges {
            name: Some("sweet porridge".into()),
            text: None,
            cooking_time: None,
            tags: vec![dinner],
            ingredients: vec![(sugar, 5)],
        },
        None,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let lines: Vec<_> = repo::ingredients_for(&pool, &[id])
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.id, r.amount))
        .collect();
    assert_eq!(lines, vec![(sugar, 5)]);

    let tags: Vec<_> = repo::tags_for(&pool, &[id])
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(tags, vec![dinner]);

    let row = repo::find(&pool, id).await.unwrap().expect("recipe");
    assert_eq!(row.name, "sweet porridge");
    assert_eq!(row.text, "Mix and serve.");
    assert_eq!(row.image_key, format!("recipes/{}/porridge.png", cook.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn ingredient_prefix_search(pool: PgPool) {
    for (name, unit) in [
        ("томаты", "г"),
        ("томатная паста", "г"),
        ("картофель томлёный", "г"),
        ("Tomato juice", "мл"),
        ("50% cream", "мл"),
        ("500 g flour", "г"),
        ("a_b", "г"),
        ("axb", "г"),
    ] {
        common::ingredient(&pool, name, unit).await;
    }

    let names = |rows: Vec<foodgram::ingredients::Ingredient>| {
        let mut names: Vec<String> = rows.into_iter().map(|i| i.name).collect();
        names.sort();
        names
    };

    assert_eq!(
        names(search(&pool, Some("Тома")).await.unwrap()),
        vec!["томатная паста", "томаты"]
    );
    assert_eq!(
        names(search(&pool, Some("TOMA")).await.unwrap()),
        vec!["Tomato juice"]
    );
    assert_eq!(
        names(search(&pool, Some("50%")).await.unwrap()),
        vec!["50% cream"]
    );
    assert_eq!(names(search(&pool, Some("a_")).await.unwrap()), vec!["a_b"]);
    assert_eq!(search(&pool, None).await.unwrap().len(), 8);
}

#[sqlx::test(migrations = "./migrations")]
async fn reimport_counts_existing_rows_as_skipped(pool: PgPool) {
    let ingredients = vec![
        IngredientRecord {
            name: "соль".into(),
            measurement_unit: "г".into(),
        },
        IngredientRecord {
            name: "соль".into(),
            measurement_unit: "щепотка".into(),
        },
    ];
    let first = upsert_ingredients(&pool, &ingredients).await.unwrap();
    assert_eq!((first.inserted, first.skipped), (2, 0));
    let second = upsert_ingredients(&pool, &ingredients).await.unwrap();
    assert_eq!((second.inserted, second.skipped), (0, 2));

    let tag = |color: &str| TagRecord {
        name: "Завтрак".into(),
        slug: "breakfast".into(),
        color: color.into(),
    };
    let first = upsert_tags(&pool, &[tag("#E26C2D")]).await.unwrap();
    assert_eq!(first.inserted, 1);
    let second = upsert_tags(&pool, &[tag("#000000")]).await.unwrap();
    assert_eq!((second.inserted, second.skipped), (0, 1));

    let color: String = sqlx::query_scalar("SELECT color FROM tags WHERE slug = 'breakfast'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(color, "#000000");
}
