use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use larder::search::IndexedRecipe;
use larder::{
    LarderSettings, MemoryIndex, OpenMode, QueryCompiler, RecipeMetadata, RecipeRecord,
    SearchRequest, Searcher, StandardAnalyzer, StoreReader, StoreWriter,
};
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Recipe metadata store and search query compiler", long_about = None)]
struct Args {
    /// Settings file (JSON); defaults apply to anything it leaves out
    #[arg(long, env = "LARDER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write recipes from a JSON-lines file into a store
    Build {
        /// One recipe record per line
        #[arg(long)]
        input: PathBuf,
        /// Store directory
        #[arg(long, env = "LARDER_STORE")]
        store: PathBuf,
        #[arg(long, value_enum, default_value = "create-new")]
        mode: Mode,
    },
    /// Print stored recipes by id
    Get {
        #[arg(long, env = "LARDER_STORE")]
        store: PathBuf,
        ids: Vec<u64>,
    },
    /// Compile a search request (JSON file, `-` for stdin) and print the plan
    Compile { request: PathBuf },
    /// Index a store in memory and run a search request against it
    Search {
        #[arg(long, env = "LARDER_STORE")]
        store: PathBuf,
        request: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    CreateNew,
    Create,
    Append,
    CreateOrAppend,
}

impl From<Mode> for OpenMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::CreateNew => OpenMode::CreateNew,
            Mode::Create => OpenMode::Create,
            Mode::Append => OpenMode::Append,
            Mode::CreateOrAppend => OpenMode::CreateOrAppend,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => LarderSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => LarderSettings::default(),
    };

    match args.command {
        Command::Build { input, store, mode } => build(&settings, &input, &store, mode.into()),
        Command::Get { store, ids } => get(&store, &ids),
        Command::Compile { request } => compile(&settings, &request),
        Command::Search { store, request } => search(&settings, &store, &request),
    }
}

fn build(settings: &LarderSettings, input: &Path, store: &Path, mode: OpenMode) -> Result<()> {
    let file = fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut writer = StoreWriter::open_with(store, mode, settings.store.clone())?;

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RecipeRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid recipe on line {}", lineno + 1))?;
        writer.append(&record)?;
    }

    let count = writer.close()?;
    info!("Store at {} holds {} recipes", store.display(), count);
    Ok(())
}

fn get(store: &Path, ids: &[u64]) -> Result<()> {
    let reader = StoreReader::open(store)?;
    for view in reader.find_all_by_id(ids.iter().copied())? {
        println!("{}", serde_json::to_string(&view.to_record())?);
    }
    Ok(())
}

fn read_request(path: &Path) -> Result<SearchRequest> {
    let text = if path == Path::new("-") {
        io::read_to_string(io::stdin())?
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    Ok(serde_json::from_str(&text)?)
}

fn compiler(settings: &LarderSettings, analyzer: Arc<StandardAnalyzer>) -> QueryCompiler {
    QueryCompiler::new(analyzer, settings.facets.clone())
}

fn analyzer(settings: &LarderSettings) -> Result<Arc<StandardAnalyzer>> {
    Ok(Arc::new(StandardAnalyzer::try_new(&settings.analyzer)?))
}

fn compile(settings: &LarderSettings, request: &Path) -> Result<()> {
    let model = read_request(request)?.into_model(&settings.facets, &settings.limits)?;
    let plan = compiler(settings, analyzer(settings)?).compile(&model)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn search(settings: &LarderSettings, store: &Path, request: &Path) -> Result<()> {
    let request = read_request(request)?;
    let reader = StoreReader::open(store)?;

    let analyzer = analyzer(settings)?;
    let mut index = MemoryIndex::new(analyzer.clone(), settings.facets.clone());
    for view in reader.iter() {
        index.add(IndexedRecipe::from_metadata(&view?))?;
    }
    info!("Indexed {} recipes", index.len());

    let searcher = Searcher::new(compiler(settings, analyzer), index).with_limits(settings.limits.clone());
    let result = searcher.search_request(request)?;
    let recipes: Vec<RecipeRecord> = searcher
        .hydrate(&result, &reader)?
        .iter()
        .map(|view| view.to_record())
        .collect();

    let output = serde_json::json!({
        "total_hits": result.total_hits,
        "recipes": recipes,
        "facets": result.facets,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
