use anyhow::Result;
use chrono::{DateTime, Utc};
use mealforge::models::RecipeNutrition;
use mealforge::wire::RecipeWire;
use rusqlite::params;

use crate::database::{Database, FromRow};

pub fn sqlite_current_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a JSON text column inside a `FromRow` impl.
fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row,
    column: &str,
) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub created_on: String,
}

impl FromRow for User {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            password_digest: row.get("password_digest")?,
            created_on: row.get("created_on")?,
        })
    }
}

impl User {
    pub fn find_by_email(db: &Database, email: &str) -> Result<Option<User>> {
        Ok(db
            .collect_rows("SELECT * FROM User WHERE email = ?", params![email])?
            .pop())
    }

    pub fn get_by_id(db: &Database, user_id: i64) -> Result<Option<User>> {
        Ok(db
            .collect_rows("SELECT * FROM User WHERE user_id = ?", params![user_id])?
            .pop())
    }

    /// Add a new user; the caller is responsible for checking the email
    /// is not already taken and for digesting the password.
    pub fn push(db: &Database, name: &str, email: &str, password_digest: &str) -> Result<i64> {
        let conn = db.pool.get()?;
        conn.execute(
            "INSERT INTO User (name, email, password_digest, created_on) VALUES (?, ?, ?, ?)",
            params![name, email, password_digest, sqlite_current_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

/// Result of an ownership-gated lookup or update.
#[derive(Debug)]
pub enum FetchOutcome {
    Found(RecipeDoc),
    NotFound,
    NotOwner,
}

/// A stored recipe document, owned by a user.
#[derive(Debug, Clone)]
pub struct RecipeDoc {
    pub recipe_id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub prep_time: i64,
    pub cook_time: i64,
    pub servings: i64,
    pub nutrition: RecipeNutrition,
    pub image_url: Option<String>,
    pub created_on: String,
}

impl FromRow for RecipeDoc {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            recipe_id: row.get("recipe_id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            ingredients: json_column(row, "ingredients")?,
            instructions: json_column(row, "instructions")?,
            prep_time: row.get("prep_time")?,
            cook_time: row.get("cook_time")?,
            servings: row.get("servings")?,
            nutrition: json_column(row, "nutrition")?,
            image_url: row.get("image_url").ok(),
            created_on: row.get("created_on")?,
        })
    }
}

/// Leading-digits coercion for the wire's "minutes as a string" fields,
/// so "30" and "30 minutes" both store as 30.
fn minutes(text: &str) -> i64 {
    text.trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

impl RecipeDoc {
    /// All recipes owned by a user, newest first.
    pub fn list_for_user(db: &Database, user_id: i64) -> Result<Vec<RecipeDoc>> {
        db.collect_rows(
            "SELECT * FROM Recipe WHERE user_id = ? ORDER BY created_on DESC, recipe_id DESC",
            params![user_id],
        )
    }

    pub fn get_by_id(db: &Database, recipe_id: i64) -> Result<Option<RecipeDoc>> {
        Ok(db
            .collect_rows(
                "SELECT * FROM Recipe WHERE recipe_id = ?",
                params![recipe_id],
            )?
            .pop())
    }

    /// Store an uploaded recipe for a user. Identifier and owner fields
    /// on the upload are ignored; the store assigns its own.
    pub fn push(db: &Database, user_id: i64, upload: &RecipeWire) -> Result<RecipeDoc> {
        let conn = db.pool.get()?;
        conn.execute(
            "INSERT INTO Recipe (user_id, title, description, ingredients, instructions,
                                 prep_time, cook_time, servings, nutrition, image_url, created_on)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user_id,
                upload.title,
                upload.description,
                serde_json::to_string(&upload.ingredients)?,
                serde_json::to_string(&upload.instructions)?,
                minutes(&upload.prep_time),
                minutes(&upload.cook_time),
                upload.servings,
                serde_json::to_string(&upload.nutrition)?,
                upload.image_url,
                sqlite_current_timestamp(),
            ],
        )?;
        let recipe_id = conn.last_insert_rowid();
        drop(conn);
        Self::get_by_id(db, recipe_id)?
            .ok_or_else(|| anyhow::anyhow!("Recipe vanished after insert"))
    }

    /// Fetch a recipe on behalf of a user, enforcing ownership.
    pub fn get_owned(db: &Database, recipe_id: i64, user_id: i64) -> Result<FetchOutcome> {
        match Self::get_by_id(db, recipe_id)? {
            None => Ok(FetchOutcome::NotFound),
            Some(doc) if doc.user_id != user_id => Ok(FetchOutcome::NotOwner),
            Some(doc) => Ok(FetchOutcome::Found(doc)),
        }
    }

    /// Rewrite an owned recipe's content from an upload, enforcing
    /// ownership. Identifier and owner fields on the upload are ignored,
    /// same as `push`; returns the stored document after the rewrite.
    pub fn update_owned(
        db: &Database,
        recipe_id: i64,
        user_id: i64,
        upload: &RecipeWire,
    ) -> Result<FetchOutcome> {
        let doc = match Self::get_owned(db, recipe_id, user_id)? {
            FetchOutcome::Found(doc) => doc,
            miss => return Ok(miss),
        };
        let conn = db.pool.get()?;
        conn.execute(
            "UPDATE Recipe SET title = ?, description = ?, ingredients = ?, instructions = ?,
                               prep_time = ?, cook_time = ?, servings = ?, nutrition = ?, image_url = ?
             WHERE recipe_id = ?",
            params![
                upload.title,
                upload.description,
                serde_json::to_string(&upload.ingredients)?,
                serde_json::to_string(&upload.instructions)?,
                minutes(&upload.prep_time),
                minutes(&upload.cook_time),
                upload.servings,
                serde_json::to_string(&upload.nutrition)?,
                upload.image_url,
                doc.recipe_id,
            ],
        )?;
        drop(conn);
        Self::get_by_id(db, doc.recipe_id)?
            .map(FetchOutcome::Found)
            .ok_or_else(|| anyhow::anyhow!("Recipe vanished during update"))
    }

    pub fn delete(db: &Database, recipe_id: i64) -> Result<()> {
        let conn = db.pool.get()?;
        conn.execute("DELETE FROM Recipe WHERE recipe_id = ?", params![recipe_id])?;
        Ok(())
    }

    /// Delete a recipe on behalf of a user, enforcing ownership.
    pub fn delete_owned(db: &Database, recipe_id: i64, user_id: i64) -> Result<DeleteOutcome> {
        match Self::get_by_id(db, recipe_id)? {
            None => Ok(DeleteOutcome::NotFound),
            Some(doc) if doc.user_id != user_id => Ok(DeleteOutcome::NotOwner),
            Some(doc) => {
                Self::delete(db, doc.recipe_id)?;
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    /// The transport form: store id on both legacy identifier fields.
    pub fn to_wire(&self) -> RecipeWire {
        let id = self.recipe_id.to_string();
        RecipeWire {
            id: Some(id.clone()),
            store_id: Some(id),
            title: self.title.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
            nutrition: self.nutrition.clone(),
            prep_time: self.prep_time.to_string(),
            cook_time: self.cook_time.to_string(),
            servings: self.servings as u32,
            image_url: self.image_url.clone(),
            created_at: DateTime::parse_from_rfc3339(&self.created_on)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            user_id: Some(self.user_id.to_string()),
        }
    }
}
