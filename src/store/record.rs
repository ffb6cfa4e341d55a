use serde::{Deserialize, Serialize};

/// Externally assigned recipe identifier
pub type RecipeId = u64;

/// Read access to recipe metadata, independent of how the record is held
///
/// Implemented by the owned [`RecipeRecord`] and by
/// [`RecipeView`](super::RecipeView), which borrows its fields straight from
/// the memory-mapped data file.
pub trait RecipeMetadata {
    fn recipe_id(&self) -> RecipeId;

    fn name(&self) -> &str;

    fn slug(&self) -> &str;

    fn crawl_url(&self) -> &str;

    fn site_name(&self) -> &str;

    /// Instruction steps, in order
    fn instructions(&self) -> Vec<&str>;

    /// Ingredient lines, in order
    fn ingredients(&self) -> Vec<&str>;

    fn num_ingredients(&self) -> u32;

    /// Total time in minutes
    fn total_time(&self) -> Option<u32>;

    fn calories(&self) -> Option<u32>;

    /// Copy every field into an owned record
    fn to_record(&self) -> RecipeRecord {
        RecipeRecord {
            recipe_id: self.recipe_id(),
            name: self.name().to_string(),
            slug: self.slug().to_string(),
            crawl_url: self.crawl_url().to_string(),
            site_name: self.site_name().to_string(),
            instructions: self.instructions().into_iter().map(String::from).collect(),
            ingredients: self.ingredients().into_iter().map(String::from).collect(),
            num_ingredients: self.num_ingredients(),
            total_time: self.total_time(),
            calories: self.calories(),
        }
    }
}

/// Owned recipe metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub recipe_id: RecipeId,
    pub name: String,
    pub slug: String,
    pub crawl_url: String,
    pub site_name: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub num_ingredients: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
}

impl RecipeRecord {
    /// Create a record with the required fields; the ingredient count follows the ingredient list
    pub fn new(
        recipe_id: RecipeId,
        name: impl Into<String>,
        slug: impl Into<String>,
        crawl_url: impl Into<String>,
        site_name: impl Into<String>,
    ) -> Self {
        Self {
            recipe_id,
            name: name.into(),
            slug: slug.into(),
            crawl_url: crawl_url.into(),
            site_name: site_name.into(),
            instructions: Vec::new(),
            ingredients: Vec::new(),
            num_ingredients: 0,
            total_time: None,
            calories: None,
        }
    }

    pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions = instructions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ingredients<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = ingredients.into_iter().map(Into::into).collect();
        self.num_ingredients = self.ingredients.len() as u32;
        self
    }

    pub fn with_num_ingredients(mut self, num_ingredients: u32) -> Self {
        self.num_ingredients = num_ingredients;
        self
    }

    pub fn with_total_time(mut self, minutes: u32) -> Self {
        self.total_time = Some(minutes);
        self
    }

    pub fn with_calories(mut self, calories: u32) -> Self {
        self.calories = Some(calories);
        self
    }
}

impl RecipeMetadata for RecipeRecord {
    fn recipe_id(&self) -> RecipeId {
        self.recipe_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn crawl_url(&self) -> &str {
        &self.crawl_url
    }

    fn site_name(&self) -> &str {
        &self.site_name
    }

    fn instructions(&self) -> Vec<&str> {
        self.instructions.iter().map(String::as_str).collect()
    }

    fn ingredients(&self) -> Vec<&str> {
        self.ingredients.iter().map(String::as_str).collect()
    }

    fn num_ingredients(&self) -> u32 {
        self.num_ingredients
    }

    fn total_time(&self) -> Option<u32> {
        self.total_time
    }

    fn calories(&self) -> Option<u32> {
        self.calories
    }

    fn to_record(&self) -> RecipeRecord {
        self.clone()
    }
}
