use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, PoisonError};

use arrayscope_core::error::ScopeResult;
use arrayscope_core::formatters::illegal_array::{ILLEGAL_ARRAY_CATEGORY, ILLEGAL_ARRAY_PATTERN};
use arrayscope_core::formatters::{global_registry, initialize_session, FormatterConfig};
use arrayscope_core::memory::MemoryReader;
use arrayscope_core::symbols::BinaryImage;
use arrayscope_core::types::Address;
use arrayscope_core::ValueObject;
use arrayscope_utils::{format_from_env, info, init_logging, init_logging_with_level, LogLevel};
use clap::{Args, Parser, Subcommand};

mod render;

use render::{render_layout, render_value, RenderOptions};

/// Inspect contiguous dynamic arrays in a stopped process.
#[derive(Parser, Debug)]
#[command(name = "arrayscope")]
#[command(version)]
#[command(about = "Inspect contiguous dynamic arrays through debugger visualizers", long_about = None)]
struct Cli
{
    #[command(flatten)]
    registration: Registration,

    /// Log verbosity (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

/// How the built-in visualizer is registered
#[derive(Args, Debug)]
struct Registration
{
    /// Category to register the IllegalArray formatters under
    #[arg(long, global = true, default_value = ILLEGAL_ARRAY_CATEGORY)]
    category: String,
    /// Type-name regex the formatters match
    #[arg(long, global = true, default_value = ILLEGAL_ARRAY_PATTERN)]
    pattern: String,
    /// Register the formatters but leave their category disabled
    #[arg(long, global = true, default_value_t = false)]
    disable_category: bool,
}

impl Registration
{
    fn config(&self) -> FormatterConfig
    {
        FormatterConfig::default()
            .with_category(&self.category)
            .with_pattern(&self.pattern)
            .enabled(!self.disable_category)
    }
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print a container's summary and children from a live process
    Inspect
    {
        /// Process ID (PID) whose memory is read
        #[arg(long)]
        pid: u32,
        /// Executable (or debug file) holding the DWARF for the type
        #[arg(long)]
        binary: PathBuf,
        /// Type of the value, e.g. `cmn::IllegalArray<int>`
        #[arg(long = "type")]
        type_name: String,
        /// Address of the value (hex format: 0x1000 or decimal)
        #[arg(long)]
        address: Address,
        /// Name to print for the value
        #[arg(long, default_value = "value")]
        name: String,
        /// Children printed per container before eliding the rest
        #[arg(long, default_value_t = 64)]
        max_children: u64,
        /// Container levels to expand
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },
    /// Print a type's layout as described by the binary's DWARF
    Layout
    {
        /// Executable (or debug file) holding the DWARF for the type
        #[arg(long)]
        binary: PathBuf,
        /// Type to describe
        #[arg(long = "type")]
        type_name: String,
    },
    /// List registered formatters and categories
    Formatters,
}

fn main()
{
    let cli = Cli::parse();

    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, format_from_env()),
        None => init_logging(),
    };
    let _guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> ScopeResult<()>
{
    let config = cli.registration.config();
    initialize_session(&config)?;
    info!(category = %config.category, enabled = config.enable, "session initialized");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Inspect {
            pid,
            binary,
            type_name,
            address,
            name,
            max_children,
            depth,
        } => {
            let image = BinaryImage::open(&binary)?;
            let ty = image.resolve_type(&type_name)?;
            let memory = open_process(pid)?;
            let value = ValueObject::new(name, address, ty, memory);
            let options = RenderOptions { max_children, depth };

            let registry = global_registry().read().unwrap_or_else(PoisonError::into_inner);
            render_value(&mut out, &registry, &value, &options)?;
        }
        Commands::Layout { binary, type_name } => {
            let image = BinaryImage::open(&binary)?;
            let ty = image.resolve_type(&type_name)?;
            render_layout(&mut out, &ty)?;
        }
        Commands::Formatters => {
            let registry = global_registry().read().unwrap_or_else(PoisonError::into_inner);
            writeln!(out, "Categories:")?;
            for (category, enabled) in registry.categories() {
                let state = if enabled { "enabled" } else { "disabled" };
                writeln!(out, "  {category} ({state})")?;
            }
            writeln!(out, "Formatters:")?;
            for formatter in registry.describe() {
                writeln!(out, "  {:<9} {}  [{}]", formatter.kind, formatter.pattern, formatter.category)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_process(pid: u32) -> ScopeResult<Arc<dyn MemoryReader>>
{
    use arrayscope_core::memory::ProcMemory;

    Ok(Arc::new(ProcMemory::open(pid)?))
}

#[cfg(not(target_os = "linux"))]
fn open_process(pid: u32) -> ScopeResult<Arc<dyn MemoryReader>>
{
    Err(arrayscope_core::error::ScopeError::InvalidArgument(format!(
        "cannot read memory of process {pid}: live inspection needs /proc/<pid>/mem (Linux)"
    )))
}
