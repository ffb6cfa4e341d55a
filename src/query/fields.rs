//! Index field names shared by the compiler and executors

/// Recipe id stored with every indexed document
pub const RECIPE_ID: &str = "recipe_id";
/// Name, ingredients and instructions, analyzed
pub const FULLTEXT: &str = "fulltext";
/// Ingredient lines, analyzed
pub const INGREDIENTS: &str = "ingredients";
/// Everything about a recipe, used for similarity probes
pub const FULL_RECIPE: &str = "full_recipe";

pub const NUM_INGREDIENTS: &str = "num_ingredients";
pub const PREP_TIME: &str = "prep_time";
pub const COOK_TIME: &str = "cook_time";
pub const TOTAL_TIME: &str = "total_time";
pub const CALORIES: &str = "calories";
pub const FAT_CONTENT: &str = "fat_content";
pub const PROTEIN_CONTENT: &str = "protein_content";
pub const CARBOHYDRATE_CONTENT: &str = "carbohydrate_content";

/// Facet dimension holding diet labels
pub const FACET_DIET: &str = "diet";

/// Field holding the confidence score of a diet
pub fn diet_field(diet: &str) -> String {
    format!("diet_{}", diet)
}
