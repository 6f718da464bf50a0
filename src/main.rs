//! Command-line front end for the component runner.

use std::path::PathBuf ;
use anyhow::{ bail, Context };
use clap::{ Args, Parser, Subcommand, ValueEnum };
use component_runner::{ ComponentRunner, Example, RunnerConfig };

#[derive( Parser )]
#[command( name = "component-runner" )]
#[command( about = "Load, transpile and invoke WebAssembly components" )]
#[command( version )]
struct Cli {
	#[command( subcommand )]
	command: Commands,

	/// Enable verbose logging
	#[arg( short, long, global = true )]
	verbose: bool,

	/// Read runner settings from a TOML file
	#[arg( long, global = true )]
	config: Option<PathBuf>,
}

#[derive( Subcommand )]
enum Commands {
	/// Transpile a component and list its callable exports
	Inspect {
		#[command( flatten )]
		source: Source,
	},

	/// Call one export of a component
	Call {
		#[command( flatten )]
		source: Source,

		/// Export path or display name, e.g. `add`
		export: String,

		/// Arguments as a JSON array, a single JSON value, or plain text
		args: Option<String>,
	},

	/// Run the component's `run`, `main` or `start` export
	Run {
		#[command( flatten )]
		source: Source,
	},
}

#[derive( Args )]
#[group( required = true, multiple = false )]
struct Source {
	/// Path to a .wasm component
	#[arg( long )]
	file: Option<PathBuf>,

	/// Bundled example to load
	#[arg( long, value_enum )]
	example: Option<ExampleArg>,
}

#[derive( Clone, Copy, ValueEnum )]
enum ExampleArg {
	Add,
	StringReverse,
}

impl From<ExampleArg> for Example {
	fn from( example: ExampleArg ) -> Self { match example {
		ExampleArg::Add => Self::Add,
		ExampleArg::StringReverse => Self::StringReverse,
	}}
}

fn main() -> anyhow::Result<()> {

	let cli = Cli::parse();

	let filter = if cli.verbose {
		tracing_subscriber::EnvFilter::from_default_env().add_directive( tracing::Level::DEBUG.into() )
	} else {
		tracing_subscriber::EnvFilter::from_default_env().add_directive( tracing::Level::WARN.into() )
	};
	tracing_subscriber::fmt()
		.with_env_filter( filter )
		.with_target( false )
		.with_writer( std::io::stderr )
		.init();

	let config = match &cli.config {
		Some( path ) => RunnerConfig::load( path )
			.with_context(|| format!( "Failed to load config {}", path.display() ))?,
		None => RunnerConfig::default(),
	};

	let mut runner = ComponentRunner::new( config );
	let outcome = execute( &mut runner, cli.command );
	runner.log().entries().iter().for_each(| entry | println!( "{}", entry ));
	outcome?.iter().for_each(| line | println!( "{}", line ));
	Ok(())

}

/// Runs `command`, returning lines to print after the activity log.
fn execute( runner: &mut ComponentRunner, command: Commands ) -> anyhow::Result<Vec<String>> {
	match command {
		Commands::Inspect { source } => {
			prepare( runner, source )?;
			Ok( runner.exports().iter()
				.map(| descriptor | format!( "{}\t{}", descriptor.display_name(), descriptor.path() ))
				.collect() )
		}
		Commands::Call { source, export, args } => {
			prepare( runner, source )?;
			let result = runner.call( &export, args.as_deref().unwrap_or_default() );
			if !result.is_success() { bail!( "{}", result ) }
			Ok( Vec::new() )
		}
		Commands::Run { source } => {
			prepare( runner, source )?;
			match runner.run() {
				Some( result ) if result.is_success() => Ok( Vec::new() ),
				Some( result ) => bail!( "{}", result ),
				None => bail!( "The component has no runnable entry point" ),
			}
		}
	}
}

fn prepare( runner: &mut ComponentRunner, source: Source ) -> anyhow::Result<()> {
	match ( source.file, source.example ) {
		( Some( path ), _ ) => runner.load_file( &path )?,
		( None, Some( example )) => runner.load_example( example.into() )?,
		( None, None ) => bail!( "No component given" ),
	}
	runner.transpile()?;
	Ok(())
}
