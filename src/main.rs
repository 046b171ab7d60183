use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use onnx_age_gender::{
    config::{Config, PipelineConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_LABEL_SCALE, DEFAULT_PADDING},
    image::{ImageLoader, ResultFormatter},
    models::ModelManager,
    web::serve,
    AnnotationPipeline,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onnx-age-gender")]
#[command(about = "Face detection with age and gender annotation, powered by ONNX Runtime")]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Server bind address
        #[arg(long, default_value = "0.0.0.0:5005")]
        bind: String,

        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Enable development mode
        #[arg(long)]
        dev: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Annotate a single image file
    Annotate {
        /// Input image path
        input: PathBuf,

        /// Where to write the annotated PNG
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Result format printed to stdout
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Face detection confidence threshold, in (0, 1]
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    threshold: f32,

    /// Padding in pixels added around each face before classification
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    padding: u32,

    /// TTF/OTF font used for labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Label text height in pixels
    #[arg(long, default_value_t = DEFAULT_LABEL_SCALE)]
    label_scale: f32,
}

impl PipelineArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            confidence_threshold: self.threshold,
            padding: self.padding,
            font_path: self.font.clone(),
            label_scale: self.label_scale,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            bind,
            workers,
            dev,
            pipeline,
        } => {
            tracing::info!("Starting ONNX age & gender service...");
            tracing::info!("Bind address: {}", bind);
            tracing::info!("Models directory: {}", pipeline.models_dir);

            let config = Config::new(
                bind,
                pipeline.models_dir.clone(),
                workers,
                dev,
                pipeline.pipeline_config(),
            )?;

            runtime(config.workers)?.block_on(serve(config))?;
        }
        Command::Annotate {
            input,
            output,
            format,
            pipeline,
        } => {
            let config = Config::new(
                String::new(),
                pipeline.models_dir.clone(),
                None,
                false,
                pipeline.pipeline_config(),
            )?;
            annotate_file(config, &input, output, format)?;
        }
    }

    Ok(())
}

/// 按配置的工作线程数构建 tokio 运行时
fn runtime(workers: usize) -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}

fn annotate_file(
    config: Config,
    input: &Path,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let manager = ModelManager::load(config)?;
    let pipeline = AnnotationPipeline::from_manager(&manager)?;

    let start_time = Instant::now();
    let image = ImageLoader::from_path(input)
        .with_context(|| format!("Failed to load image {}", input.display()))?;
    let result = pipeline.annotate_dynamic(image)?;

    if let Some(path) = &output {
        result
            .image
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Annotated image written to {}", path.display());
    }

    let rendered = match format {
        OutputFormat::Text => ResultFormatter::format_plain_text(&result.faces),
        OutputFormat::Csv => ResultFormatter::format_csv(&result.faces),
        OutputFormat::Json => {
            let report = ResultFormatter::build_report(
                &result,
                start_time.elapsed(),
                false,
                Some(pipeline.model_info()),
            )?;
            ResultFormatter::format_json(&report)?
        }
    };
    println!("{}", rendered);

    Ok(())
}
