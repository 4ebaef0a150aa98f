//! Favorite, shopping-cart and follow relations.
//!
//! All three are `(subject, object)` pairs guarded by a unique constraint.
//! Adding an existing pair is a conflict, removing a missing pair is a bad
//! request.

use async_trait::async_trait;

pub mod repo;
pub mod services;

pub use repo::PgRelationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
    Follow,
}

impl RelationKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping_cart",
            RelationKind::Follow => "follows",
        }
    }

    pub(crate) fn object_column(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "recipe_id",
            RelationKind::Follow => "author_id",
        }
    }

    /// Table holding the relation's object.
    pub(crate) fn target_table(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "recipes",
            RelationKind::Follow => "users",
        }
    }

    pub(crate) fn already_exists(self) -> &'static str {
        match self {
            RelationKind::Favorite => "Recipe is already in favorites.",
            RelationKind::ShoppingCart => "Recipe is already in the shopping cart.",
            RelationKind::Follow => "You are already subscribed to this user.",
        }
    }

    pub(crate) fn missing(self) -> &'static str {
        match self {
            RelationKind::Favorite => "Recipe is not in favorites.",
            RelationKind::ShoppingCart => "Recipe is not in the shopping cart.",
            RelationKind::Follow => "You are not subscribed to this user.",
        }
    }

    pub(crate) fn target_not_found(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "Recipe not found.",
            RelationKind::Follow => "User not found.",
        }
    }
}

/// Persistence for relation pairs.
#[async_trait]
pub trait RelationStore: Send + Sync {
    async fn target_exists(&self, kind: RelationKind, target: i64) -> anyhow::Result<bool>;
    async fn contains(&self, kind: RelationKind, actor: i64, target: i64) -> anyhow::Result<bool>;
    /// Returns `false` when the pair was already present.
    async fn insert(&self, kind: RelationKind, actor: i64, target: i64) -> anyhow::Result<bool>;
    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, kind: RelationKind, actor: i64, target: i64) -> anyhow::Result<bool>;
}
