// Command-line runner: decode an image, run the census, print the result.

use clap::Parser;
use pixel_census::core_modules::utils::image_helper::image_helper;
use pixel_census::{
    AnalysisResult, AppError, ClassificationPipeline, ClassificationPolicy, FrameBuffer,
    ParallelPipeline, PipelineConfig,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pixel_census", version, about = "Classify image pixels into colour categories")]
struct Cli {
    /// Image to analyse (any format the `image` crate decodes).
    image: PathBuf,

    /// JSON policy file; the built-in palette is used when omitted.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Classify horizontal bands on worker threads.
    #[arg(long)]
    parallel: bool,

    /// Worker count for --parallel (defaults to the number of CPUs).
    #[arg(long, requires = "parallel")]
    workers: Option<usize>,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn load_policy(path: Option<&PathBuf>) -> Result<ClassificationPolicy, AppError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|error| AppError::Read(error, path.display().to_string()))?;
            Ok(ClassificationPolicy::from_json_str(&text)?)
        }
        None => Ok(ClassificationPolicy::default()),
    }
}

fn print_table(result: &AnalysisResult) {
    println!("Image: {}x{}", result.width, result.height);
    println!(
        "Pixels: {} total, {} excluded, {} processed",
        result.total_pixels, result.excluded_pixels, result.processed_pixels
    );
    println!(
        "Excluded: {} translucent, {} background, {} border",
        result.exclusions.translucent, result.exclusions.background, result.exclusions.border
    );
    for stat in &result.categories {
        println!(
            "  {:<12} {:>8}  {:>7.2}%  {}",
            stat.name, stat.count, stat.percentage, stat.display_color
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let cli = Cli::parse();

    let policy = load_policy(cli.policy.as_ref())?;
    let pipeline = ClassificationPipeline::new(&policy)?;
    let image = image_helper::load(&cli.image)?;

    let result = if cli.parallel {
        let mut config = PipelineConfig::default();
        if let Some(workers) = cli.workers {
            config.worker_count = workers.max(1);
        }
        let frame = FrameBuffer::new(image.width, image.height, image.data)?;
        ParallelPipeline::from_pipeline(&pipeline, config)
            .classify(&frame)
            .await?
    } else {
        pipeline.classify(&image.as_bitmap())?
    };

    info!(
        path = %cli.image.display(),
        processed = result.processed_pixels,
        excluded = result.excluded_pixels,
        "census complete"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_table(&result);
    }
    Ok(())
}
