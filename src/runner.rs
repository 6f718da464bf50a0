use std::path::Path ;
use std::sync::Arc ;
use pipe_trait::Pipe ;
use serde_json::Value as JsonValue ;
use wasmtime::Engine ;

use crate::activity_log::ActivityLog ;
use crate::component::{ Example, IngestError, RawComponent };
use crate::config::RunnerConfig ;
use crate::invoke::{ format_arguments, invoke_with, parse_arguments, InvocationError, InvocationResult };
use crate::loader::{ LoadedModule, ModuleLoader };
use crate::pipeline::{ self, find_entry_point, Phase, PipelineError, PipelineState, StageContext };
use crate::resources::ResourceTable ;
use crate::status::Status ;
use crate::transpile::{ Transpiler, TranspileOptions, WasmtimeTranspiler };
use crate::walker::ExportDescriptor ;



/// Which actions are currently available.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct Controls {
	pub transpile: bool,
	pub run: bool,
	pub call: bool,
}

impl From<Phase> for Controls {
	fn from( phase: Phase ) -> Self { match phase {
		Phase::Empty | Phase::Transpiling => Self::default(),
		Phase::Loaded => Self { transpile: true, run: false, call: false },
		Phase::Runnable => Self { transpile: true, run: true, call: true },
	}}
}

/// Drives components through the load → transpile → run pipeline.
///
/// The runner owns the pipeline state, the resource table, the status line and
/// the activity log. Every mutating operation takes `&mut self`, so a second
/// request can't start until the first has finished.
///
/// ```no_run
/// # use component_runner::{ ComponentRunner, RunnerConfig, Example };
/// let mut runner = ComponentRunner::new( RunnerConfig::default() );
/// runner.load_example( Example::Add ).unwrap();
/// runner.transpile().unwrap();
/// assert_eq!( runner.call( "add", "[5, 3]" ).to_string(), "Result: 8" );
/// ```
pub struct ComponentRunner {
	config: RunnerConfig,
	transpiler: Box<dyn Transpiler>,
	options: TranspileOptions,
	loader: ModuleLoader,
	resources: ResourceTable,
	state: PipelineState,
	status: Status,
	log: ActivityLog,
}

impl ComponentRunner {

	/// Creates a runner that transpiles with a [`WasmtimeTranspiler`].
	pub fn new( config: RunnerConfig ) -> Self {
		let engine = Engine::default();
		let transpiler = WasmtimeTranspiler::new( engine.clone() );
		Self::build( config, engine, Box::new( transpiler ))
	}

	/// Creates a runner backed by a custom transpiler.
	pub fn with_transpiler( config: RunnerConfig, transpiler: impl Transpiler + 'static ) -> Self {
		Self::build( config, Engine::default(), Box::new( transpiler ))
	}

	fn build( config: RunnerConfig, engine: Engine, transpiler: Box<dyn Transpiler> ) -> Self {
		let loader = ModuleLoader::new( engine ).pipe(| loader | match config.max_memory_bytes {
			Some( max ) => loader.with_memory_limit( max ),
			None => loader,
		});
		let mut log = ActivityLog::new();
		log.success( "WebAssembly Component Runner initialized" );
		log.info( "Select a .wasm component file or load an example to begin" );
		Self {
			config,
			transpiler,
			options: TranspileOptions::default(),
			loader,
			resources: ResourceTable::new(),
			state: PipelineState::Empty,
			status: Status::NoComponent,
			log,
		}
	}

	/// Loads component bytes obtained elsewhere.
	///
	/// # Errors
	/// Fails if `bytes` is empty; the previous component stays loaded.
	pub fn load_bytes( &mut self, bytes: impl Into<Arc<[u8]>>, filename: impl Into<String> ) -> Result<(), IngestError> {
		let filename = filename.into();
		self.begin_load( &filename );
		let outcome = RawComponent::new( bytes, filename );
		self.finish_load( outcome )
	}

	/// Loads a component picked from the filesystem.
	///
	/// # Errors
	/// Fails if the file can't be read or is empty.
	pub fn load_file( &mut self, path: &Path ) -> Result<(), IngestError> {
		self.begin_load( &path.display().to_string() );
		let outcome = RawComponent::from_file( path );
		self.finish_load( outcome )
	}

	/// Loads a dropped file. Files without the `.wasm` suffix are ignored with a
	/// warning and leave the runner untouched.
	///
	/// # Errors
	/// Fails for unsupported or unreadable files.
	pub fn load_dropped( &mut self, path: &Path ) -> Result<(), IngestError> {
		match RawComponent::from_dropped_file( path ) {
			Err( err @ IngestError::UnsupportedFile( _ )) => {
				self.log.warning( err.to_string() );
				Err( err )
			}
			outcome => {
				self.begin_load( &path.display().to_string() );
				self.finish_load( outcome )
			}
		}
	}

	/// Loads a bundled example from the configured examples directory.
	///
	/// # Errors
	/// Fails if the example file is missing or unreadable.
	pub fn load_example( &mut self, example: Example ) -> Result<(), IngestError> {
		self.log.info( format!( "Loading example: {}", example ));
		self.begin_load( example.file_name() );
		let outcome = RawComponent::from_example( example, &self.config.examples_dir );
		let failed = outcome.is_err();
		let result = self.finish_load( outcome );
		if failed { self.log.info( "Make sure the example file exists in the examples directory" ); }
		result
	}

	fn begin_load( &mut self, name: &str ) {
		self.log.info( format!( "Loading component: {}", name ));
		self.status = Status::LoadingComponent ;
	}

	fn finish_load( &mut self, outcome: Result<RawComponent, IngestError> ) -> Result<(), IngestError> {
		match outcome {
			Ok( component ) => {
				self.log.success( format!( "Component loaded successfully ({:.2} KB)", component.size_kib() ));
				let state = std::mem::take( &mut self.state );
				self.state = pipeline::load( state, component, &mut self.resources );
				self.status = Status::ComponentLoaded ;
				Ok(())
			}
			Err( err ) => {
				self.log.error( format!( "Error loading component: {}", err ));
				self.status = Status::LoadFailed ;
				Err( err )
			}
		}
	}

	/// Transpiles and loads the current component, replacing any previously
	/// loaded module. Returns the number of discovered exports.
	///
	/// # Errors
	/// Fails if nothing is loaded, or if transpiling or loading fails. The raw
	/// component stays loaded either way.
	pub fn transpile( &mut self ) -> Result<usize, PipelineError> {

		let state = std::mem::take( &mut self.state );
		self.state = pipeline::begin_transpile( state, &mut self.resources );
		if self.state.phase() != Phase::Transpiling {
			self.log.error( format!( "Transpilation failed: {}", PipelineError::NoComponent ));
			return Err( PipelineError::NoComponent );
		}

		self.status = Status::Transpiling ;
		self.log.info( "Starting transpilation..." );

		let state = std::mem::take( &mut self.state );
		let mut context = StageContext {
			transpiler: self.transpiler.as_ref(),
			loader: &self.loader,
			options: &self.options,
			resources: &mut self.resources,
			log: &mut self.log,
		};
		let ( state, outcome ) = pipeline::finish_transpile( state, &mut context );
		self.state = state ;

		match outcome {
			Ok( count ) => {
				self.status = Status::TranspilationComplete ;
				Ok( count )
			}
			Err( err ) => {
				self.log.error( format!( "Transpilation failed: {}", err ));
				if let Some( hint ) = err.hint() { self.log.error( hint ); }
				self.status = Status::TranspilationFailed ;
				Err( err )
			}
		}

	}

	/// Finds an export by path, falling back to its display name. A display name
	/// shared by several exports resolves to the first of them.
	pub fn find_export( &self, name: &str ) -> Option<&ExportDescriptor> {
		let exports = self.state.exports();
		exports.iter().find(| descriptor | descriptor.path() == name )
			.or_else(|| exports.iter().find(| descriptor | descriptor.display_name() == name ))
	}

	/// Calls an export with argument text: a JSON array of arguments, a single
	/// JSON value, or anything else as one string argument.
	pub fn call( &mut self, name: &str, args: &str ) -> InvocationResult {
		let args = parse_arguments( args );
		self.call_with( name, &args )
	}

	/// Calls an export with already parsed arguments.
	pub fn call_with( &mut self, name: &str, args: &[JsonValue] ) -> InvocationResult {
		let Some( descriptor ) = self.find_export( name ).cloned() else {
			let result = InvocationResult::from( Err::<JsonValue, _>( InvocationError::UnknownExport( name.to_string() )));
			if let Some( message ) = result.message() { self.log.error( format!( "Error calling {}: {}", name, message )); }
			return result;
		};
		if descriptor.path() != name {
			let matches = self.exports().iter().filter(| export | export.display_name() == name ).count();
			if matches > 1 { self.log.warning( format!(
				"\"{}\" matches {} exports, calling {}. Use the full path to call another one.",
				name, matches, descriptor.path(),
			)); }
		}
		self.log.info( format!( "Calling {}({})", descriptor.display_name(), format_arguments( args )));
		let result = invoke_with( &descriptor, args );
		match &result {
			InvocationResult::Success { .. } => self.log.success( result.to_string() ),
			InvocationResult::Failure { message } => self.log.error( format!( "Error calling {}: {}", descriptor.display_name(), message )),
		}
		result
	}

	/// Runs the first zero-argument `run`, `main` or `start` export.
	///
	/// Returns `None` when no module is loaded or no such export exists.
	pub fn run( &mut self ) -> Option<InvocationResult> {
		self.log.info( "Attempting to run component..." );
		let Some( runnable ) = self.state.runnable() else {
			self.log.warning( "No component has been transpiled yet" );
			return None;
		};
		let Some(( name, entry_point )) = find_entry_point( runnable.root() ) else {
			self.log.warning( "No standard entry point found. Use the function call interface to call specific exports." );
			return None;
		};
		self.log.info( format!( "Found \"{}\" export, executing...", name ));
		let result = InvocationResult::from( entry_point.call( &[] ));
		match &result {
			InvocationResult::Success { value } => self.log.success( format!( "{} completed: {}", capitalise( name ), value )),
			InvocationResult::Failure { message } => self.log.error( format!( "Execution error: {}", message )),
		}
		Some( result )
	}

	/// Empties the activity log, leaving only the clear notice.
	pub fn clear_log( &mut self ) { self.log.clear() }

	#[inline] pub fn config( &self ) -> &RunnerConfig { &self.config }
	#[inline] pub fn status( &self ) -> Status { self.status }
	#[inline] pub fn log( &self ) -> &ActivityLog { &self.log }
	#[inline] pub fn state( &self ) -> &PipelineState { &self.state }
	#[inline] pub fn phase( &self ) -> Phase { self.state.phase() }
	#[inline] pub fn controls( &self ) -> Controls { Controls::from( self.phase() )}
	#[inline] pub fn resources( &self ) -> &ResourceTable { &self.resources }
	#[inline] pub fn component( &self ) -> Option<&RawComponent> { self.state.component() }
	#[inline] pub fn exports( &self ) -> &[ExportDescriptor] { self.state.exports() }

	pub fn module( &self ) -> Option<&LoadedModule> {
		self.state.runnable().map( pipeline::Runnable::module )
	}

}

impl std::fmt::Debug for ComponentRunner {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ComponentRunner" )
			.field( "status", &self.status )
			.field( "state", &self.state )
			.field( "resources", &self.resources.len() )
			.finish_non_exhaustive()
	}
}

fn capitalise( name: &str ) -> String {
	let mut chars = name.chars();
	chars.next()
		.map(| first | first.to_uppercase().chain( chars ).collect() )
		.unwrap_or_default()
}

#[cfg( test )]
mod tests {

	use serde_json::json ;

	use super::* ;
	use crate::transpile::{ GeneratedFileSet, TranspileError, TranspileOptions, Transpiled };

	/// Emits a fixed entry point around the input bytes.
	struct Fixed( &'static str );

	impl Transpiler for Fixed {
		fn transpile( &self, bytes: &[u8], _: &TranspileOptions ) -> Result<Transpiled, TranspileError> {
			let files: GeneratedFileSet = [
				( "component.js", self.0.as_bytes().to_vec() ),
				( "component.core.wasm", bytes.to_vec() ),
			].into_iter().collect();
			Ok( Transpiled { files, exports: Vec::new() })
		}
	}

	const ENTRY: &str = "import core from './component.core.wasm';\nexport * from core;\n" ;

	const RUNNABLE: &str = r#"(component
		(core module $m
			(func (export "run") (result i32) i32.const 7)
			(func (export "double") (param i32) (result i32) local.get 0 local.get 0 i32.add))
		(core instance $i (instantiate $m))
		(func (export "run") (result s32) (canon lift (core func $i "run")))
		(func (export "double") (param "x" s32) (result s32) (canon lift (core func $i "double")))
	)"#;

	fn runner_with( entry: &'static str ) -> ComponentRunner {
		ComponentRunner::with_transpiler( RunnerConfig::default(), Fixed( entry ))
	}

	#[test]
	fn starts_empty_with_greeting() {
		let runner = runner_with( ENTRY );
		assert_eq!( runner.phase(), Phase::Empty );
		assert_eq!( runner.status(), Status::NoComponent );
		assert_eq!( runner.controls(), Controls::default() );
		assert_eq!( runner.log().len(), 2 );
		assert!( runner.log().contains( "WebAssembly Component Runner initialized" ));
	}

	#[test]
	fn transpile_without_component_is_rejected() {
		let mut runner = runner_with( ENTRY );
		assert!( matches!( runner.transpile(), Err( PipelineError::NoComponent )));
		assert_eq!( runner.phase(), Phase::Empty );
	}

	#[test]
	fn full_cycle_runs_and_calls_exports() {
		let mut runner = runner_with( ENTRY );
		runner.load_bytes( RUNNABLE.as_bytes().to_vec(), "runnable.wasm" ).unwrap();
		assert_eq!( runner.controls(), Controls { transpile: true, run: false, call: false });

		assert_eq!( runner.transpile().unwrap(), 2 );
		assert_eq!( runner.status(), Status::TranspilationComplete );
		assert_eq!( runner.resources().len(), 1 );
		assert!( runner.log().contains( "Created resource handle for component.core.wasm" ));
		assert!( runner.log().contains( "Available functions: run, double" ));

		let result = runner.run().unwrap();
		assert_eq!( result.value(), Some( &json!( 7 )));
		assert!( runner.log().contains( "Run completed: 7" ));

		assert_eq!( runner.call( "double", "21" ).value(), Some( &json!( 42 )));
		assert!( runner.log().contains( "Calling double(21)" ));
	}

	#[test]
	fn retranspiling_releases_previous_handles() {
		let mut runner = runner_with( ENTRY );
		runner.load_bytes( RUNNABLE.as_bytes().to_vec(), "runnable.wasm" ).unwrap();
		runner.transpile().unwrap();
		let first = runner.state().runnable().unwrap().handles().to_vec();
		runner.transpile().unwrap();
		assert_eq!( runner.resources().len(), 1 );
		assert!( first.iter().all(| handle | runner.resources().resolve( handle.as_str() ).is_none() ));
	}

	#[test]
	fn loading_a_new_component_discards_the_module() {
		let mut runner = runner_with( ENTRY );
		runner.load_bytes( RUNNABLE.as_bytes().to_vec(), "runnable.wasm" ).unwrap();
		runner.transpile().unwrap();
		runner.load_bytes( RUNNABLE.as_bytes().to_vec(), "again.wasm" ).unwrap();
		assert_eq!( runner.phase(), Phase::Loaded );
		assert!( runner.exports().is_empty() );
		assert!( runner.resources().is_empty() );
		assert_eq!( runner.component().map( RawComponent::filename ), Some( "again.wasm" ));
	}

	#[test]
	fn unknown_exports_fail_without_panicking() {
		let mut runner = runner_with( ENTRY );
		let result = runner.call( "missing", "1" );
		assert_eq!( result.message(), Some( "Function not found: missing" ));
		assert!( runner.log().contains( "Error calling missing" ));
	}

	#[test]
	fn shared_display_names_warn_and_pick_the_first() {
		const TWO_SOURCES: &str = r#"(component
			(core module $m
				(func (export "one") (result i32) i32.const 1)
				(func (export "two") (result i32) i32.const 2))
			(core instance $i (instantiate $m))
			(func $one (result s32) (canon lift (core func $i "one")))
			(func $two (result s32) (canon lift (core func $i "two")))
			(instance $first (export "get" (func $one)))
			(instance $second (export "get" (func $two)))
			(export "example:first/source@0.1.0" (instance $first))
			(export "example:second/source@0.1.0" (instance $second))
		)"#;
		let mut runner = runner_with( ENTRY );
		runner.load_bytes( TWO_SOURCES.as_bytes().to_vec(), "sources.wasm" ).unwrap();
		runner.transpile().unwrap();

		assert_eq!( runner.call( "get", "" ).value(), Some( &json!( 1 )));
		assert!( runner.log().contains( "\"get\" matches 2 exports, calling example:first/source@0.1.0.get" ));

		runner.clear_log();
		assert_eq!( runner.call( "example:second/source@0.1.0.get", "" ).value(), Some( &json!( 2 )));
		assert!( !runner.log().contains( "matches 2 exports" ));
	}

	#[test]
	fn run_without_entry_point_warns() {
		const NO_RUN: &str = r#"(component
			(core module $m (func (export "f") (param i32) (result i32) local.get 0))
			(core instance $i (instantiate $m))
			(func (export "run") (param "x" s32) (result s32) (canon lift (core func $i "f")))
		)"#;
		let mut runner = runner_with( ENTRY );
		runner.load_bytes( NO_RUN.as_bytes().to_vec(), "no-run.wasm" ).unwrap();
		runner.transpile().unwrap();
		assert!( runner.run().is_none() );
		assert!( runner.log().contains( "No standard entry point found" ));
	}

	#[test]
	fn empty_bytes_fail_the_load() {
		let mut runner = runner_with( ENTRY );
		assert!( runner.load_bytes( Vec::new(), "empty.wasm" ).is_err() );
		assert_eq!( runner.status(), Status::LoadFailed );
		assert_eq!( runner.phase(), Phase::Empty );
	}

	#[test]
	fn capitalises_entry_point_names() {
		assert_eq!( capitalise( "main" ), "Main" );
		assert_eq!( capitalise( "" ), "" );
	}

}
