//! Store gateway: one long-lived MongoDB client exposing the five bistro
//! collections as typed handles.
//!
//! Every method is a single driver call; the driver owns connection pooling
//! and request multiplexing. The unique index on `user.email` turns user
//! creation into one conditional insert instead of a racy check-then-insert.

use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::results::InsertOneResult;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::debug;

use crate::models::{CartItem, MenuItem, Payment, Review, User};

/// Duplicate-key server error raised by the unique email index.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct Store {
    users: Collection<User>,
    menu: Collection<MenuItem>,
    reviews: Collection<Review>,
    carts: Collection<CartItem>,
    payments: Collection<Payment>,
}

/// Outcome of a conditional user insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    Created(ObjectId),
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Collection cardinalities plus summed payment revenue. Counts are the
/// store's fast estimates and may be stale relative to concurrent writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub users: u64,
    pub menu_items: u64,
    pub orders: u64,
    pub revenue: f64,
}

impl Store {
    /// Parse the connection string and build collection handles. The driver
    /// connects lazily on first operation.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, Error> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_database(&client.database(database)))
    }

    pub fn from_database(database: &Database) -> Self {
        Self {
            users: database.collection("user"),
            menu: database.collection("menu"),
            reviews: database.collection("reviews"),
            carts: database.collection("carts"),
            payments: database.collection("payments"),
        }
    }

    /// Create the unique index backing the email-uniqueness invariant.
    pub async fn ensure_indexes(&self) -> Result<(), Error> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let created = self.users.create_index(index).await?;
        debug!(index = %created.index_name, "user email index ready");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.find(doc! {}).await?.try_collect().await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.users.find_one(doc! { "email": email }).await
    }

    /// Insert unless a record with the same email already exists. The unique
    /// index makes this a single atomic operation.
    pub async fn create_user(&self, user: &User) -> Result<UserInsert, Error> {
        match self.users.insert_one(user).await {
            Ok(result) => Ok(UserInsert::Created(inserted_object_id(result)?)),
            Err(error) if is_duplicate_key(&error) => Ok(UserInsert::AlreadyExists),
            Err(error) => Err(error),
        }
    }

    pub async fn delete_user(&self, id: ObjectId) -> Result<u64, Error> {
        Ok(self.users.delete_one(doc! { "_id": id }).await?.deleted_count)
    }

    /// Set the admin role on a user by id.
    pub async fn promote_user(&self, id: ObjectId) -> Result<UpdateOutcome, Error> {
        let result = self
            .users
            .update_one(doc! { "_id": id }, doc! { "$set": { "role": "admin" } })
            .await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    pub async fn list_menu(&self) -> Result<Vec<MenuItem>, Error> {
        self.menu.find(doc! {}).await?.try_collect().await
    }

    pub async fn insert_menu_item(&self, item: &MenuItem) -> Result<ObjectId, Error> {
        let result = self.menu.insert_one(item).await?;
        inserted_object_id(result)
    }

    pub async fn delete_menu_item(&self, id: ObjectId) -> Result<u64, Error> {
        Ok(self.menu.delete_one(doc! { "_id": id }).await?.deleted_count)
    }

    pub async fn list_reviews(&self) -> Result<Vec<Review>, Error> {
        self.reviews.find(doc! {}).await?.try_collect().await
    }

    pub async fn carts_for(&self, email: &str) -> Result<Vec<CartItem>, Error> {
        self.carts
            .find(doc! { "email": email })
            .await?
            .try_collect()
            .await
    }

    pub async fn insert_cart_item(&self, item: &CartItem) -> Result<ObjectId, Error> {
        let result = self.carts.insert_one(item).await?;
        inserted_object_id(result)
    }

    pub async fn delete_cart_item(&self, id: ObjectId) -> Result<u64, Error> {
        Ok(self.carts.delete_one(doc! { "_id": id }).await?.deleted_count)
    }

    pub async fn stats(&self) -> Result<Stats, Error> {
        let users = self.users.estimated_document_count().await?;
        let menu_items = self.menu.estimated_document_count().await?;
        let orders = self.payments.estimated_document_count().await?;
        let revenue = self.total_revenue().await?;
        Ok(Stats {
            users,
            menu_items,
            orders,
            revenue,
        })
    }

    /// Sum the `price` field across all payments inside the store's
    /// aggregation layer; no payment document is loaded into memory here.
    async fn total_revenue(&self) -> Result<f64, Error> {
        let pipeline = [doc! {
            "$group": { "_id": null, "total": { "$sum": "$price" } }
        }];
        let mut cursor = self.payments.aggregate(pipeline).await?;
        let Some(group) = cursor.try_next().await? else {
            return Ok(0.0);
        };
        Ok(numeric(group.get("total")))
    }
}

fn inserted_object_id(result: InsertOneResult) -> Result<ObjectId, Error> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::custom("insert did not return an object id"))
}

fn is_duplicate_key(error: &Error) -> bool {
    match *error.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

fn numeric(value: Option<&Bson>) -> f64 {
    match value {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}
