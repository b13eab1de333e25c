//! pixkern CLI - Scheduled RGBA Image Kernels
//!
//! Lists the built-in entry points, prints their C headers and manifests,
//! and runs them on PNG files through the reference evaluator.

use anyhow::{anyhow, bail, Context, Result};
use pixkern::export::target::Os;
use pixkern::prelude::*;
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line args
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pixkern");

    if args.len() < 2 {
        print_usage(program);
        return;
    }

    let result = match args[1].as_str() {
        "list" => {
            list_kernels();
            Ok(())
        }
        "info" => with_kernel(&args, |name| kernel_info(name, &args[3..])),
        "header" => with_kernel(&args, |name| print_header(name, &args[3..])),
        "manifest" => with_kernel(&args, |name| print_manifest(name, &args[3..])),
        "process" => process_image(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        other => Err(anyhow!("Unknown command: {}", other)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        if let Some(ExecutionError::InvalidInvocation { errors, .. }) = e
            .downcast_ref::<PixkernError>()
            .and_then(|e| match e {
                PixkernError::Execution(inner) => Some(inner),
                _ => None,
            })
        {
            for error in errors {
                eprintln!("   {}", error);
                if let Some(fix) = error.suggested_fix() {
                    eprintln!("     hint: {}", fix);
                }
            }
        }
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("pixkern v{}", pixkern::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                           List all entry points");
    println!("  info <kernel> [--config file]  Show arguments and schedules");
    println!("  header <kernel> [--target os]  Print the C header");
    println!("  manifest <kernel> [--target os] [--config file] [--out file]");
    println!("                                 Print or write the JSON manifest");
    println!("  process <kernel> <in> <out...> [--factor f] [--config file]");
    println!("                                 Run a kernel on a PNG");
    println!("  help                           Show this help message");
}

fn with_kernel(args: &[String], f: impl FnOnce(&str) -> Result<()>) -> Result<()> {
    match args.get(2) {
        Some(name) => f(name),
        None => bail!("Please specify a kernel name"),
    }
}

fn create_entry(name: &str) -> Result<EntryPoint> {
    let registry = KernelRegistry::with_builtins();
    registry
        .create(name)
        .with_context(|| format!("Cannot create '{}'; use 'list' to see available kernels", name))
}

/// Value following `flag`, if present.
fn option<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Configuration from `--config`, or the defaults.
fn load_config(args: &[String]) -> Result<PixkernConfig> {
    match option(args, "--config") {
        Some(path) => PixkernConfig::load(path).with_context(|| format!("Failed to load {}", path)),
        None => Ok(PixkernConfig::default()),
    }
}

fn target_from(args: &[String], config: &PixkernConfig) -> Result<Target> {
    let mut config = config.clone();
    if let Some(os) = option(args, "--target") {
        config.os = os.parse::<Os>().map_err(|e| anyhow!(e))?;
    }
    Ok(config.target())
}

fn list_kernels() {
    let registry = KernelRegistry::with_builtins();
    let grouped = registry.grouped_by_category();

    println!("Available kernels ({} total):", registry.len());
    println!();

    for (category, kernels) in grouped {
        println!("  {}", category);
        for (name, entry) in kernels {
            println!("      • {} - {}", name, entry.description);
        }
        println!();
    }
}

fn kernel_info(name: &str, args: &[String]) -> Result<()> {
    let entry = create_entry(name)?;
    let defaults = load_config(args)?.params_for(&entry);

    println!("Entry point: {}", entry.name());
    println!("Kind: {}", entry.kind());
    println!("Output extent: {:?}", entry.output_extent());
    println!();

    println!("Arguments:");
    for arg in entry.arguments() {
        match (arg.scalar_type(), defaults.get(&arg.name)) {
            (Some(ty), Some(default)) => {
                println!("  • {} [{:?}] = {:?}", arg.name, ty, default)
            }
            _ => println!("  • {} [buffer]", arg.name),
        }
    }
    println!();

    println!("Outputs:");
    for kernel in entry.outputs() {
        println!("  • {}", kernel.name());
        match kernel.schedule() {
            Some(schedule) => {
                for directive in schedule.directives() {
                    println!("      {}", directive);
                }
                let updates: Vec<_> = schedule.unscheduled_updates().collect();
                if !updates.is_empty() {
                    println!("      unscheduled updates {:?}", updates);
                }
            }
            None => println!("      (default schedule)"),
        }
    }
    Ok(())
}

fn print_header(name: &str, args: &[String]) -> Result<()> {
    let entry = create_entry(name)?;
    let target = target_from(args, &PixkernConfig::default())?;
    let paths = ArtifactPaths::for_entry(entry.name(), target.os);
    println!("// {} for {}", paths.header.display(), target);
    print!("{}", emit_header(&entry));
    Ok(())
}

fn print_manifest(name: &str, args: &[String]) -> Result<()> {
    let entry = create_entry(name)?;
    let config = load_config(args)?;
    let target = target_from(args, &config)?;
    let manifest =
        EntryManifest::from_entry(&entry, &target).with_defaults(&config.params_for(&entry));
    match option(args, "--out") {
        Some(path) => {
            manifest.save(path)?;
            log::info!("Wrote manifest for '{}' to {}", entry.name(), path);
        }
        None => println!("{}", manifest.to_json()?),
    }
    Ok(())
}

fn process_image(args: &[String]) -> Result<()> {
    if args.len() < 3 {
        bail!("Usage: pixkern process <kernel> <in.png> <out.png...> [--factor f] [--config file]");
    }
    let entry = create_entry(&args[0])?;
    let input_path = PathBuf::from(&args[1]);

    // Positional outputs run until the first flag
    let output_paths: Vec<PathBuf> = args[2..]
        .iter()
        .take_while(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .collect();
    if output_paths.len() != entry.outputs().len() {
        bail!(
            "'{}' writes {} output(s), {} path(s) given",
            entry.name(),
            entry.outputs().len(),
            output_paths.len()
        );
    }

    let config = load_config(args)?;
    let factor = match option(args, "--factor") {
        Some(f) => f
            .parse::<f32>()
            .with_context(|| format!("Invalid factor: {}", f))?,
        None => config.factor,
    };

    let mut overrides: Vec<(&str, ScalarValue)> = Vec::new();
    if entry.scalar_arguments().any(|a| a.name == "factor") {
        overrides.push(("factor", ScalarValue::Float32(factor)));
    }

    let image = image::open(&input_path)
        .with_context(|| format!("Failed to load {}", input_path.display()))?
        .to_rgba8();

    log::info!(
        "Processing {} with '{}' ({}x{})",
        input_path.display(),
        entry.name(),
        image.width(),
        image.height()
    );
    let engine = ExecutionEngine::new().with_default_options(config.execution.clone());
    let outputs = host::apply(&engine, &entry, &image, &overrides)?;

    for (output, path) in outputs.iter().zip(&output_paths) {
        output
            .save(path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        println!("✅ Saved {}", path.display());
    }
    Ok(())
}
