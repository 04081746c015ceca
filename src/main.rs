use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use mirai_genesis::display::{compose_preview, to_rgba_image, PreviewMode};
use mirai_genesis::{EvolutionContext, Phenotype, Population, RunSettings, TargetImage};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to approximate
    image: PathBuf,

    /// Settings JSON file (missing fields, or an unreadable file, take defaults)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to this JSON file before running
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Number of generations to run
    #[arg(short, long, default_value_t = 1000)]
    generations: u64,

    /// Override the drawing style (lines, bezier, dots, circles, mixed)
    #[arg(long)]
    phenotype: Option<Phenotype>,

    /// Override the population size
    #[arg(long)]
    population: Option<usize>,

    /// Override the rng seed
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate offspring on all cores
    #[arg(long)]
    parallel: bool,

    /// Where to write the preview of the fittest
    #[arg(short, long, default_value = "fittest.png")]
    output: PathBuf,

    /// centered, side-by-side or overlay
    #[arg(long, default_value = "centered")]
    preview: PreviewMode,

    /// Preview canvas width (centered and overlay modes)
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Preview canvas height (centered and overlay modes)
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Also write the preview every N generations (0 = only at the end)
    #[arg(long, default_value_t = 0)]
    snapshot_every: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // name rayon workers once so they are recognizable in profiles
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let mut settings = match &args.settings {
        Some(path) => RunSettings::load_or_default(path),
        None => RunSettings::default(),
    };
    if let Some(phenotype) = args.phenotype {
        settings.phenotype = phenotype;
    }
    if let Some(n) = args.population {
        settings.population_size = n;
    }
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    settings.parallel |= args.parallel;
    settings.validate().context("invalid settings")?;

    if let Some(path) = &args.save_settings {
        settings.save(path).with_context(|| format!("saving settings to {}", path.display()))?;
        log::info!("saved settings to {}", path.display());
    }

    let target = TargetImage::open(&args.image, settings.downscale_ratio)
        .with_context(|| format!("loading target image {}", args.image.display()))?;
    log::info!(
        "target {} downscaled {}x{} -> {}x{}",
        args.image.display(),
        target.source_dims().0,
        target.source_dims().1,
        target.width(),
        target.height()
    );
    let target = Arc::new(target);

    let ctx = EvolutionContext::new(Arc::clone(&target), settings)?;
    let mut population = Population::new(ctx)?;

    for _ in 0..args.generations {
        let fittest = population.iterate();
        if args.snapshot_every > 0 && population.generation() % args.snapshot_every == 0 {
            write_preview(&args, &population, &target, &fittest)?;
        }
    }

    let fittest = population.fittest().clone();
    write_preview(&args, &population, &target, &fittest)?;
    log::info!(
        "done after {} generations: best fitness {:.6} (individual {}), preview at {}",
        population.generation(),
        fittest.fitness,
        fittest.id,
        args.output.display()
    );
    Ok(())
}

fn write_preview(
    args: &Args,
    population: &Population,
    target: &TargetImage,
    fittest: &mirai_genesis::FittestSnapshot,
) -> anyhow::Result<()> {
    let renderer = population.context().renderer();
    let pix = compose_preview(fittest, renderer.as_ref(), target, args.preview, (args.width, args.height))
        .context("preview canvas must not be empty")?;
    let img = to_rgba_image(&pix).context("preview buffer size mismatch")?;
    img.save(&args.output)
        .with_context(|| format!("writing preview to {}", args.output.display()))?;
    log::debug!("wrote preview of generation {} to {}", fittest.generation, args.output.display());
    Ok(())
}
