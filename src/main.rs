use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sketchc::errors::SourceText;
use sketchc::{compile_with, CompileOptions, Compilation, Config, Subsystems};

/// Compile kid-friendly hardware commands into an Arduino sketch
#[derive(Parser)]
#[command(name = "sketchc", version)]
#[command(about = "Compile kid-friendly hardware commands into an Arduino sketch")]
struct Args {
    /// Source program to compile
    input: PathBuf,

    /// Output sketch path (defaults to the config file value, then sketch.ino)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show the generated code, pin usage and required libraries
    #[arg(short, long)]
    verbose: bool,

    /// Print the sketch to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Print the compilation summary as JSON
    #[arg(long)]
    json: bool,

    /// Serial baud rate used in setup()
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    input: &'a str,
    output: Option<String>,
    pins: &'a [i64],
    subsystems: Subsystems,
    libraries: Vec<&'static str>,
    diagnostics: Vec<String>,
    dropped_diagnostics: usize,
}

fn required_libraries(subsystems: &Subsystems) -> Vec<&'static str> {
    let mut libraries = Vec::new();
    if subsystems.servo {
        libraries.push("Servo library (built-in)");
    }
    if subsystems.display {
        libraries.push("LiquidCrystal library (built-in)");
    }
    if subsystems.temperature {
        libraries.push("DHT sensor library (install from Library Manager)");
    }
    libraries
}

fn print_diagnostics(result: &Compilation, source: &SourceText) {
    if result.diagnostics.is_empty() {
        return;
    }
    eprintln!("Parsing errors in {}:", source.name);
    for diagnostic in &result.diagnostics {
        eprint!("{}", diagnostic.render(source));
    }
    if result.dropped_diagnostics > 0 {
        eprintln!("... and {} more", result.dropped_diagnostics);
    }
    eprintln!();
}

fn print_report(result: &Compilation, output: Option<&PathBuf>) {
    println!("Generated Arduino code:");
    println!("=======================");
    print!("{}", result.code);
    println!("=======================\n");

    if let Some(path) = output {
        println!("Sketch saved as '{}'", path.display());
        println!("Upload this file to your Arduino using the Arduino IDE!\n");
    }

    println!("Pin usage:");
    for pin in &result.pins {
        println!("   Pin {}: used in program", pin);
    }
    println!();

    println!("Required libraries:");
    let libraries = required_libraries(&result.subsystems);
    if libraries.is_empty() {
        println!("   - No additional libraries needed!");
    }
    for library in libraries {
        println!("   - {}", library);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load()?;
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(baud_rate) = args.baud_rate {
        config.generator.baud_rate = baud_rate;
    }

    let input_name = args.input.display().to_string();
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("could not read '{}'", input_name))?;

    info!("compiling {}", input_name);
    let options = CompileOptions {
        verbose: args.verbose,
        generator: config.generator,
    };
    let result = compile_with(&source, &options);

    if !args.json {
        print_diagnostics(&result, &SourceText::new(&input_name, &source));
    }

    let written = if args.stdout {
        if !args.json {
            print!("{}", result.code);
        }
        None
    } else {
        fs::write(&config.output, &result.code)
            .with_context(|| format!("could not write '{}'", config.output.display()))?;
        Some(&config.output)
    };

    if args.json {
        let summary = Summary {
            input: &input_name,
            output: written.map(|p| p.display().to_string()),
            pins: &result.pins,
            subsystems: result.subsystems,
            libraries: required_libraries(&result.subsystems),
            diagnostics: result.diagnostic_messages(),
            dropped_diagnostics: result.dropped_diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if args.verbose {
        print_report(&result, written);
    } else if let Some(path) = written {
        println!("Arduino code generated successfully!");
        println!("Saved as: {}", path.display());
    }

    Ok(())
}
