//! End-to-end: store, in-memory index, compiled queries, hydration

use larder::search::IndexedRecipe;
use larder::{
    AnalyzerConfig, FacetConfig, MemoryIndex, QueryCompiler, RecipeMetadata, RecipeRecord,
    SearchRequest, Searcher, StandardAnalyzer, StoreReader, StoreWriter,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

struct Env {
    _tmp: TempDir,
    reader: StoreReader,
    searcher: Searcher<MemoryIndex>,
}

fn recipes() -> Vec<(RecipeRecord, Option<(&'static str, f32)>)> {
    vec![
        (
            RecipeRecord::new(1, "Garlic Bread", "garlic-bread", "https://a.example/1", "a.example")
                .with_ingredients(["1 baguette", "4 cloves garlic", "butter"])
                .with_instructions(["Spread garlic butter.", "Bake."])
                .with_total_time(20)
                .with_calories(350),
            Some(("vegetarian", 1.0)),
        ),
        (
            RecipeRecord::new(2, "Garlic Shrimp", "garlic-shrimp", "https://a.example/2", "a.example")
                .with_ingredients(["shrimp", "garlic", "olive oil", "lemon", "parsley", "chili"])
                .with_instructions(["Saute everything."])
                .with_total_time(15)
                .with_calories(280),
            Some(("keto", 1.0)),
        ),
        (
            RecipeRecord::new(3, "Tomato Soup", "tomato-soup", "https://b.example/3", "b.example")
                .with_ingredients(["tomatoes", "onion", "garlic", "stock"])
                .with_instructions(["Simmer for an hour.", "Blend."])
                .with_total_time(75),
            Some(("vegan", 1.0)),
        ),
        (
            RecipeRecord::new(4, "Lemon Cake", "lemon-cake", "https://b.example/4", "b.example")
                .with_ingredients(["flour", "sugar", "eggs", "lemon", "butter"])
                .with_instructions(["Mix.", "Bake for 45 minutes."])
                .with_calories(420),
            None,
        ),
    ]
}

fn setup() -> Env {
    let tmp = TempDir::new().unwrap();
    let data = recipes();

    let mut writer = StoreWriter::open(tmp.path()).unwrap();
    for (record, _) in &data {
        writer.append(record).unwrap();
    }
    writer.close().unwrap();
    let reader = StoreReader::open(tmp.path()).unwrap();

    let analyzer = Arc::new(StandardAnalyzer::new(&AnalyzerConfig::default()));
    let mut index = MemoryIndex::new(analyzer.clone(), FacetConfig::default());
    for (view, (_, diet)) in reader.iter().zip(&data) {
        let mut doc = IndexedRecipe::from_metadata(&view.unwrap());
        if let Some((name, score)) = diet {
            doc = doc.with_diet(name, *score);
        }
        index.add(doc).unwrap();
    }

    let searcher = Searcher::new(QueryCompiler::new(analyzer, FacetConfig::default()), index);
    Env {
        _tmp: tmp,
        reader,
        searcher,
    }
}

fn run(env: &Env, value: serde_json::Value) -> larder::SearchResult {
    let request: SearchRequest = serde_json::from_value(value).unwrap();
    env.searcher.search_request(request).unwrap()
}

#[test]
fn test_fulltext_and_hydration() {
    let env = setup();
    let result = run(&env, json!({ "fulltext": "garlic" }));

    assert_eq!(result.total_hits, 3);
    let names: Vec<String> = env
        .searcher
        .hydrate(&result, &env.reader)
        .unwrap()
        .iter()
        .map(|view| view.name().to_string())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"Tomato Soup".to_string()));
}

#[test]
fn test_excluded_ingredient() {
    let env = setup();
    let result = run(
        &env,
        json!({ "fulltext": "garlic", "without_ingredients": ["shrimp"] }),
    );
    assert_eq!(result.total_hits, 2);
    assert!(!result.recipe_ids.contains(&2));
}

#[test]
fn test_stopword_only_terms_find_nothing() {
    let env = setup();
    let result = run(&env, json!({ "fulltext": "the and of" }));
    assert_eq!(result.total_hits, 0);
    assert!(result.recipe_ids.is_empty());

    let result = run(&env, json!({ "with_ingredients": ["the"] }));
    assert_eq!(result.total_hits, 0);
}

#[test]
fn test_sort_by_total_time_missing_last() {
    let env = setup();
    let result = run(&env, json!({ "sort": "total_time" }));
    assert_eq!(result.recipe_ids, vec![2, 1, 3, 4]);
}

#[test]
fn test_pagination_window() {
    let env = setup();
    let result = run(
        &env,
        json!({ "sort": "total_time", "offset": 1, "max_results": 2 }),
    );
    assert_eq!(result.total_hits, 4);
    assert_eq!(result.recipe_ids, vec![1, 3]);
}

#[test]
fn test_calorie_range_and_diet_threshold() {
    let env = setup();
    let result = run(&env, json!({ "calories": [300, 500] }));
    assert_eq!(result.total_hits, 2);

    let result = run(&env, json!({ "diet_threshold": { "keto": 0.8 } }));
    assert_eq!(result.recipe_ids, vec![2]);
}

#[test]
fn test_facets_and_drill_down() {
    let env = setup();
    let result = run(&env, json!({ "max_facets": 10 }));

    let diets = &result.facets["diet"].children;
    assert_eq!(diets["keto"], 1);
    assert_eq!(diets["vegan"], 1);
    assert_eq!(diets["vegetarian"], 1);
    assert_eq!(result.facets["num_ingredients"].children["5-10"], 2);

    let result = run(
        &env,
        json!({ "drill_down": [["diet", "vegan"], ["diet", "keto"]] }),
    );
    assert_eq!(result.total_hits, 2);

    let result = run(
        &env,
        json!({ "fulltext": "garlic", "drill_down": [["total_time", "60+"]] }),
    );
    assert_eq!(result.recipe_ids, vec![3]);
}

#[test]
fn test_no_facets_unless_requested() {
    let env = setup();
    let result = run(&env, json!({ "fulltext": "lemon" }));
    assert_eq!(result.total_hits, 2);
    assert!(result.facets.is_empty());
}

#[test]
fn test_find_similar() {
    let env = setup();
    let result = env
        .searcher
        .find_similar("lemon and butter cake with flour and sugar", 3)
        .unwrap();

    assert_eq!(result.recipe_ids.first(), Some(&4));
}
