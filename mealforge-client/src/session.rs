//! Session-local client state: the current recipe, the saved-recipe
//! collection, and the single-entry TTL cache over the list fetch.
//!
//! The cache is owned by the session object and torn down with it; there
//! is no process-wide state. It is a per-session UI optimization, not a
//! consistency mechanism: nothing here coordinates multiple sessions.

use chrono::{DateTime, Duration, Utc};
use mealforge::models::{Recipe, RecipeParams};

use crate::api::{ApiError, RecipeApi};
use crate::generation::{self, GenerateError};

/// How long a successful list fetch keeps serving the local collection.
const STALENESS_WINDOW_SECS: i64 = 300;

/// The closed set of client-side failure kinds. Constructed at the point
/// of failure, never inferred from message text.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error(transparent)]
    Generation(#[from] GenerateError),
    #[error("Recipe already exists in your collection")]
    DuplicateRecipe,
    #[error("Recipe has no identifier to delete by")]
    MissingIdentifier,
    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for ClientError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthorized => ClientError::NotAuthenticated,
            other => ClientError::Api(other),
        }
    }
}

pub struct RecipeSession<A: RecipeApi> {
    api: A,
    recipes: Vec<Recipe>,
    current: Option<Recipe>,
    /// Time of the last successful list fetch; `None` forces the next
    /// fetch to hit the network.
    fetched_at: Option<DateTime<Utc>>,
}

impl<A: RecipeApi> RecipeSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            recipes: Vec::new(),
            current: None,
            fetched_at: None,
        }
    }

    pub fn current(&self) -> Option<&Recipe> {
        self.current.as_ref()
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Record a server-fetched recipe as the current one, normalizing its
    /// identifier pair on the way in.
    pub fn set_current(&mut self, recipe: mealforge::wire::RecipeWire) {
        self.current = Some(recipe.normalize().into());
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    fn validate(params: &RecipeParams) -> Result<(), ClientError> {
        if params.main_ingredients.iter().all(|i| i.trim().is_empty()) {
            return Err(ClientError::InvalidInput(
                "Please enter at least one main ingredient",
            ));
        }
        if params.calories == Some(0) {
            return Err(ClientError::InvalidInput(
                "Target calories must be a positive number",
            ));
        }
        Ok(())
    }

    /// Generate a recipe from the given preferences and hold it as the
    /// current recipe. Input validation happens before any network call.
    pub async fn generate(&mut self, params: &RecipeParams) -> Result<&Recipe, ClientError> {
        Self::validate(params)?;
        let recipe = generation::generate_recipe(params).await?;
        Ok(self.current.insert(recipe))
    }

    /// Persist the current recipe.
    pub async fn save_current(&mut self) -> Result<&Recipe, ClientError> {
        let recipe = self
            .current
            .clone()
            .ok_or(ClientError::InvalidInput("No recipe to save"))?;
        self.save(recipe).await
    }

    /// Persist a recipe, guarding against duplicates first: an entry with
    /// the same title and description is already saved, so the request is
    /// never sent. A successful save invalidates the staleness window.
    pub async fn save(&mut self, recipe: Recipe) -> Result<&Recipe, ClientError> {
        if self.recipes.iter().any(|r| r.is_same_dish(&recipe)) {
            return Err(ClientError::DuplicateRecipe);
        }
        let stored: Recipe = self.api.save(&recipe.to_wire()).await?.normalize().into();
        tracing::info!("Saved recipe {:?}", stored.id);
        self.recipes.insert(0, stored);
        self.fetched_at = None;
        Ok(&self.recipes[0])
    }

    /// Fetch the saved-recipe collection, served locally when the last
    /// successful fetch is within the staleness window and the local
    /// collection is non-empty.
    pub async fn list(&mut self) -> Result<&[Recipe], ClientError> {
        self.list_at(Utc::now()).await
    }

    async fn list_at(&mut self, now: DateTime<Utc>) -> Result<&[Recipe], ClientError> {
        if let Some(fetched_at) = self.fetched_at {
            let fresh = now - fetched_at < Duration::seconds(STALENESS_WINDOW_SECS);
            if fresh && !self.recipes.is_empty() {
                tracing::debug!("Serving recipe list from the session cache");
                return Ok(&self.recipes);
            }
        }
        let wires = self.api.list().await?;
        self.recipes = wires.into_iter().map(|w| w.normalize().into()).collect();
        self.fetched_at = Some(now);
        Ok(&self.recipes)
    }

    /// Delete a saved recipe. Refused before any network call when the
    /// recipe carries no identifier.
    pub async fn delete_recipe(&mut self, recipe: &Recipe) -> Result<String, ClientError> {
        let id = recipe.id.clone().ok_or(ClientError::MissingIdentifier)?;
        self.delete(&id).await
    }

    /// Delete by id and drop the matching entry from the local collection.
    /// A successful delete invalidates the staleness window.
    pub async fn delete(&mut self, id: &str) -> Result<String, ClientError> {
        let deleted = self.api.delete(id).await?;
        self.recipes.retain(|r| r.id.as_deref() != Some(deleted.as_str()));
        if let Some(current) = &self.current {
            if current.id.as_deref() == Some(deleted.as_str()) {
                self.current = None;
            }
        }
        self.fetched_at = None;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mealforge::models::RecipeNutrition;
    use mealforge::wire::RecipeWire;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn sample(title: &str, description: &str) -> Recipe {
        Recipe {
            id: None,
            title: title.into(),
            description: description.into(),
            ingredients: vec!["1 cup rice".into()],
            instructions: vec!["Cook it".into()],
            nutrition: RecipeNutrition {
                calories: 600.0,
                protein: 30.0,
                fat: 12.0,
                carbohydrates: 70.0,
                sugar: None,
                cholesterol: None,
                fiber: None,
            },
            prep_time: "10".into(),
            cook_time: "20".into(),
            servings: 2,
            image_url: Some("https://example.com/dish.png".into()),
            created_at: None,
            user_id: None,
        }
    }

    /// In-memory store that counts network calls, so tests can assert
    /// which operations avoided the network entirely.
    #[derive(Default)]
    struct MockApi {
        stored: Mutex<Vec<RecipeWire>>,
        next_id: AtomicUsize,
        list_calls: AtomicUsize,
        save_calls: AtomicUsize,
        delete_calls: AtomicUsize,
    }

    #[async_trait]
    impl RecipeApi for &MockApi {
        async fn list(&self) -> Result<Vec<RecipeWire>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let mut recipes = self.stored.lock().unwrap().clone();
            recipes.reverse(); // newest first
            Ok(recipes)
        }

        async fn save(&self, recipe: &RecipeWire) -> Result<RecipeWire, ApiError> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let mut stored = recipe.clone();
            // The store assigns its own id; the client id is not kept
            stored.id = None;
            stored.store_id = Some(id.to_string());
            self.stored.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn delete(&self, id: &str) -> Result<String, ApiError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.stored.lock().unwrap();
            let before = stored.len();
            stored.retain(|r| r.store_id.as_deref() != Some(id));
            if stored.len() == before {
                return Err(ApiError::Server("Recipe not found".into()));
            }
            Ok(id.to_string())
        }
    }

    #[tokio::test]
    async fn duplicate_save_is_rejected_without_a_network_call() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        session.save(sample("T", "D")).await.unwrap();
        assert_eq!(api.save_calls.load(Ordering::SeqCst), 1);

        let mut duplicate = sample("T", "D");
        duplicate.servings = 8; // other fields are irrelevant to identity
        duplicate.id = Some("recipe_999".into());
        let err = session.save(duplicate).await.unwrap_err();
        assert!(matches!(err, ClientError::DuplicateRecipe));
        assert_eq!(api.save_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn save_response_is_normalized_into_the_collection() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        let mut draft = sample("T", "D");
        draft.id = Some("recipe_123_4".into());
        let stored = session.save(draft).await.unwrap();
        // The store id replaced the client id and is now canonical
        assert_eq!(stored.id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn list_within_window_serves_the_cached_collection() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        session.save(sample("T", "D")).await.unwrap();

        let t0 = Utc::now();
        session.list_at(t0).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);

        // 4:59 later, non-empty collection: no network call
        session.list_at(t0 + Duration::seconds(299)).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);

        // 5:01 later: the window has lapsed
        session.list_at(t0 + Duration::seconds(301)).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn save_and_delete_invalidate_the_staleness_window() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        session.save(sample("A", "a")).await.unwrap();

        let t0 = Utc::now();
        session.list_at(t0).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);

        // A save right after forces the next fetch to the network
        session.save(sample("B", "b")).await.unwrap();
        session.list_at(t0 + Duration::seconds(1)).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);

        // Same for a delete
        let id = session.recipes()[0].id.clone().unwrap();
        session.delete(&id).await.unwrap();
        session.list_at(t0 + Duration::seconds(2)).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_matching_entry() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        session.save(sample("A", "a")).await.unwrap();
        session.save(sample("B", "b")).await.unwrap();
        session.save(sample("C", "c")).await.unwrap();
        assert_eq!(session.recipes().len(), 3);

        let target = session.recipes()[1].clone();
        let deleted = session.delete_recipe(&target).await.unwrap();
        assert_eq!(Some(deleted), target.id);
        assert_eq!(session.recipes().len(), 2);
        assert!(session.recipes().iter().all(|r| r.title != "B"));
    }

    #[tokio::test]
    async fn deleting_without_an_identifier_is_refused_locally() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        let err = session.delete_recipe(&sample("T", "D")).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingIdentifier));
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_main_ingredients_fail_before_any_network_call() {
        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        let params = RecipeParams {
            main_ingredients: vec!["  ".into()],
            ..Default::default()
        };
        let err = session.generate(&params).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn generated_recipe_survives_save_list_delete_round_trip() {
        // End-to-end over canned model output: parse, fall back on the
        // image, save, list exactly once, delete, gone.
        let response = r#"{
            "title": "Chicken and Rice Skillet",
            "description": "One-pan comfort food",
            "ingredients": ["1 lb chicken", "2 cups rice"],
            "instructions": ["Brown the chicken", "Add rice and simmer"],
            "nutrition": {"calories": 600, "protein": 40, "fat": 15, "carbohydrates": 60},
            "prepTime": "10", "cookTime": "25", "servings": 4
        }"#;
        let mut recipe = crate::generation::parse::parse_recipe(Some(response)).unwrap();
        assert!(!recipe.ingredients.is_empty());
        assert!(!recipe.instructions.is_empty());
        assert_eq!(recipe.nutrition.calories, 600.0);

        // Simulate an image failure resolving to the fallback
        recipe.image_url = Some(fallback_url_for(&recipe));
        assert!(recipe.image_url.is_some());

        let api = MockApi::default();
        let mut session = RecipeSession::new(&api);
        let stored_id = session.save(recipe.clone()).await.unwrap().id.clone().unwrap();

        let listed = session.list().await.unwrap();
        assert_eq!(
            listed.iter().filter(|r| r.is_same_dish(&recipe)).count(),
            1
        );

        session.delete(&stored_id).await.unwrap();
        let listed = session.list().await.unwrap();
        assert!(listed.iter().all(|r| !r.is_same_dish(&recipe)));
    }

    fn fallback_url_for(recipe: &Recipe) -> String {
        crate::generation::fallback_image_url(&recipe.title).to_string()
    }
}
