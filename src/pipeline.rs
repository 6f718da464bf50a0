//! The load → transpile → relink → load → discover state machine.
//!
//! Pipeline state is a single owned [`PipelineState`] value. Stage functions
//! take the current state by value and hand back the next one, so the only
//! way to change it is through the owner, the
//! [`ComponentRunner`]( crate::ComponentRunner ).

use std::collections::BTreeMap ;
use std::sync::Arc ;
use std::time::Instant ;
use itertools::Itertools ;
use thiserror::Error ;

use crate::activity_log::ActivityLog ;
use crate::component::RawComponent ;
use crate::loader::{ LoadError, LoadedModule, ModuleLoader };
use crate::resources::{ ResourceHandle, ResourceTable };
use crate::rewrite::rewrite_references ;
use crate::transpile::{ TranspileError, TranspileOptions, Transpiler, ENTRY_POINT };
use crate::value::{ Callable, Namespace, Value };
use crate::walker::{ walk_exports, ExportDescriptor };



/// Names tried, in order, when running a component without picking an export.
pub const ENTRY_POINT_NAMES: [&str; 3] = [ "run", "main", "start" ];

/// Errors that abort a transpile run. The raw component stays loaded.
#[derive( Error, Debug )]
pub enum PipelineError {
	/// There is nothing to transpile.
	#[error( "No component loaded" )] NoComponent,
	#[error( transparent )] Transpile( #[from] TranspileError ),
	#[error( transparent )] Load( #[from] LoadError ),
}

impl PipelineError {

	/// An advisory follow-up for transpiler failures with well-known messages.
	pub fn hint( &self ) -> Option<&'static str> {
		let Self::Transpile( err ) = self else { return None };
		let message = match err {
			TranspileError::InvalidComponent( cause ) => format!( "{:#}", cause ),
			other => other.to_string(),
		}.to_lowercase();
		if [ "webassembly", "magic header", "binary" ].iter().any(| keyword | message.contains( keyword )) {
			Some( "Make sure the file is a valid WebAssembly component" )
		} else if message.contains( "memory" ) {
			Some( "The component might be too large for the configured memory limit" )
		} else {
			None
		}
	}

}

/// Coarse pipeline position.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum Phase {
	Empty,
	Loaded,
	Transpiling,
	Runnable,
}

/// A transpiled, loaded component and its discovered exports.
pub struct Runnable {
	component: RawComponent,
	module: LoadedModule,
	root: Value,
	exports: Vec<ExportDescriptor>,
	handles: Vec<ResourceHandle>,
}

impl Runnable {

	#[inline] pub fn component( &self ) -> &RawComponent { &self.component }
	#[inline] pub fn module( &self ) -> &LoadedModule { &self.module }
	/// The namespace exports were discovered in.
	#[inline] pub fn root( &self ) -> &Value { &self.root }
	#[inline] pub fn exports( &self ) -> &[ExportDescriptor] { &self.exports }
	/// Resource handles created for this module.
	#[inline] pub fn handles( &self ) -> &[ResourceHandle] { &self.handles }

	/// Drops the module and releases its handles, keeping the raw component.
	fn discard( self, resources: &mut ResourceTable ) -> RawComponent {
		let released = resources.revoke_all( &self.handles );
		tracing::debug!( "Discarded module for {}, released {} resource handle(s)", self.component.filename(), released );
		self.component
	}

}

impl std::fmt::Debug for Runnable {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Runnable" )
			.field( "component", &self.component.filename() )
			.field( "exports", &self.exports )
			.field( "handles", &self.handles )
			.finish_non_exhaustive()
	}
}

/// The single current pipeline state.
#[derive( Debug, Default )]
pub enum PipelineState {
	#[default] Empty,
	Loaded( RawComponent ),
	Transpiling( RawComponent ),
	Runnable( Runnable ),
}

impl PipelineState {

	pub fn phase( &self ) -> Phase { match self {
		Self::Empty => Phase::Empty,
		Self::Loaded( _ ) => Phase::Loaded,
		Self::Transpiling( _ ) => Phase::Transpiling,
		Self::Runnable( _ ) => Phase::Runnable,
	}}

	/// The current raw component, if any.
	pub fn component( &self ) -> Option<&RawComponent> { match self {
		Self::Empty => None,
		Self::Loaded( component ) | Self::Transpiling( component ) => Some( component ),
		Self::Runnable( runnable ) => Some( &runnable.component ),
	}}

	pub fn runnable( &self ) -> Option<&Runnable> { match self {
		Self::Runnable( runnable ) => Some( runnable ),
		_ => None,
	}}

	/// Discovered exports; empty unless runnable.
	pub fn exports( &self ) -> &[ExportDescriptor] {
		self.runnable().map_or( &[], Runnable::exports )
	}

}

/// Everything a transpile run reads or writes besides the state itself.
pub struct StageContext<'a> {
	pub transpiler: &'a dyn Transpiler,
	pub loader: &'a ModuleLoader,
	pub options: &'a TranspileOptions,
	pub resources: &'a mut ResourceTable,
	pub log: &'a mut ActivityLog,
}

/// `* → Loaded`: replaces whatever was loaded with `component`.
pub fn load( state: PipelineState, component: RawComponent, resources: &mut ResourceTable ) -> PipelineState {
	if let PipelineState::Runnable( runnable ) = state { runnable.discard( resources ); }
	PipelineState::Loaded( component )
}

/// `Loaded | Runnable → Transpiling`. A runnable state's module is discarded.
/// `Empty` stays `Empty`.
pub fn begin_transpile( state: PipelineState, resources: &mut ResourceTable ) -> PipelineState {
	match state {
		PipelineState::Empty => PipelineState::Empty,
		PipelineState::Loaded( component ) | PipelineState::Transpiling( component ) => PipelineState::Transpiling( component ),
		PipelineState::Runnable( runnable ) => PipelineState::Transpiling( runnable.discard( resources )),
	}
}

/// `Transpiling → Runnable` on success, `Transpiling → Loaded` on failure.
///
/// Returns the number of discovered exports. Handles allocated by a failed
/// run are released before returning.
pub fn finish_transpile( state: PipelineState, context: &mut StageContext<'_> ) -> ( PipelineState, Result<usize, PipelineError> ) {
	let component = match state {
		PipelineState::Transpiling( component ) => component,
		other => return ( other, Err( PipelineError::NoComponent )),
	};
	let mut handles = Vec::new();
	match build( &component, context, &mut handles ) {
		Ok(( module, root, exports )) => {
			let count = exports.len();
			( PipelineState::Runnable( Runnable { component, module, root, exports, handles }), Ok( count ))
		}
		Err( err ) => {
			context.resources.revoke_all( &handles );
			( PipelineState::Loaded( component ), Err( err ))
		}
	}
}

fn build(
	component: &RawComponent,
	context: &mut StageContext<'_>,
	handles: &mut Vec<ResourceHandle>,
) -> Result<( LoadedModule, Value, Vec<ExportDescriptor> ), PipelineError> {

	let started = Instant::now();
	let transpiled = context.transpiler.transpile( component.bytes(), context.options )?;
	context.log.success( format!( "Transpilation completed in {:.2}s", started.elapsed().as_secs_f64() ));
	context.log.info( format!( "Generated files: {}", transpiled.files.filenames().join( ", " )));
	if !transpiled.exports.is_empty() {
		context.log.info( format!( "Component exports: {}", transpiled.exports.iter().map(|( name, _ )| name ).join( ", " )));
	}

	let source = transpiled.files.entry_source( ENTRY_POINT )?;

	let mapping = transpiled.files.binary_resources()
		.map(|( filename, bytes )| {
			let handle = context.resources.create( filename, Arc::<[u8]>::from( bytes ));
			handles.push( handle.clone() );
			context.log.info( format!( "Created resource handle for {}", filename ));
			( filename.to_string(), handle )
		})
		.collect::<BTreeMap<_,_>>();
	let rewritten = rewrite_references( source, &mapping );

	context.log.info( "Loading transpiled module..." );
	let module = context.loader.load( &rewritten, context.resources )?;

	let ( root, is_default ) = module.export_root();
	let keys = root.as_namespace().map( Namespace::keys ).unwrap_or_default();
	if !is_default && !keys.is_empty() {
		context.log.success( format!( "Module loaded with exports: {}", keys.join( ", " )));
	} else {
		context.log.info( "Module loaded (checking for default export)" );
		if is_default { context.log.success( format!( "Using default export with keys: {}", keys.join( ", " ))); }
	}

	let exports = walk_exports( &root, None );
	match exports.is_empty() {
		false => {
			context.log.success( format!( "Discovered {} callable function(s)", exports.len() ));
			context.log.info( format!( "Available functions: {}", exports.iter().map( ExportDescriptor::display_name ).join( ", " )));
		}
		true => context.log.warning( "No callable functions found in the component exports" ),
	}

	Ok(( module, root, exports ))

}

/// Finds the first zero-argument member of `root` named after
/// [`ENTRY_POINT_NAMES`].
pub fn find_entry_point( root: &Value ) -> Option<( &'static str, Arc<dyn Callable> )> {
	let namespace = root.as_namespace()?;
	ENTRY_POINT_NAMES.iter().find_map(| name | match namespace.get( name ) {
		Some( Ok( Value::Callable( callable ))) if matches!( callable.arity(), None | Some( 0 )) => Some(( *name, callable )),
		_ => None,
	})
}

#[cfg( test )]
mod tests {

	use serde_json::{ json, Value as JsonValue };

	use super::* ;
	use crate::invoke::InvocationError ;
	use crate::transpile::{ GeneratedFileSet, Transpiled };

	struct NoEntryPoint ;

	impl Transpiler for NoEntryPoint {
		fn transpile( &self, bytes: &[u8], _: &TranspileOptions ) -> Result<Transpiled, TranspileError> {
			let files: GeneratedFileSet = [( "component.core.wasm", bytes.to_vec() )].into_iter().collect();
			Ok( Transpiled { files, exports: Vec::new() })
		}
	}

	struct Arity( usize );

	impl Callable for Arity {
		fn call( &self, _: &[JsonValue] ) -> Result<JsonValue, InvocationError> { Ok( json!( self.0 ))}
		fn arity( &self ) -> Option<usize> { Some( self.0 ) }
	}

	#[test]
	fn missing_entry_point_returns_to_loaded_and_releases_handles() {
		let loader = ModuleLoader::new( wasmtime::Engine::default() );
		let mut resources = ResourceTable::new();
		let mut log = ActivityLog::new();
		let options = TranspileOptions::default();
		let component = RawComponent::new( vec![ 1, 2, 3 ], "broken.wasm" ).unwrap();

		let state = begin_transpile( PipelineState::Loaded( component.clone() ), &mut resources );
		assert_eq!( state.phase(), Phase::Transpiling );
		let mut context = StageContext { transpiler: &NoEntryPoint, loader: &loader, options: &options, resources: &mut resources, log: &mut log };
		let ( state, outcome ) = finish_transpile( state, &mut context );

		assert!( matches!( outcome, Err( PipelineError::Transpile( TranspileError::MissingEntryPoint( _ )))));
		assert_eq!( state.phase(), Phase::Loaded );
		assert_eq!( state.component(), Some( &component ));
		assert!( resources.is_empty() );
	}

	#[test]
	fn entry_point_name_does_not_follow_options() {
		let loader = ModuleLoader::new( wasmtime::Engine::default() );
		let mut resources = ResourceTable::new();
		let mut log = ActivityLog::new();
		let options = TranspileOptions { name: "app".to_string(), ..TranspileOptions::default() };
		let component = RawComponent::new( vec![ 1, 2, 3 ], "app.wasm" ).unwrap();
		let emits_default = | _: &[u8], _: &TranspileOptions | -> Result<Transpiled, TranspileError> {
			let files: GeneratedFileSet = [( ENTRY_POINT, b"// nothing exported\n".to_vec() )].into_iter().collect();
			Ok( Transpiled { files, exports: Vec::new() })
		};

		let state = begin_transpile( PipelineState::Loaded( component ), &mut resources );
		let mut context = StageContext { transpiler: &emits_default, loader: &loader, options: &options, resources: &mut resources, log: &mut log };
		let ( state, outcome ) = finish_transpile( state, &mut context );

		assert_eq!( outcome.unwrap(), 0 );
		assert_eq!( state.phase(), Phase::Runnable );
	}

	#[test]
	fn empty_state_cannot_transpile() {
		let mut resources = ResourceTable::new();
		assert_eq!( begin_transpile( PipelineState::Empty, &mut resources ).phase(), Phase::Empty );
	}

	#[test]
	fn entry_points_follow_priority_and_arity() {
		let root = Namespace::new();
		root.insert( "start", Value::Callable( Arc::new( Arity( 0 ))));
		root.insert( "run", Value::Callable( Arc::new( Arity( 1 ))));
		root.insert( "main", Value::Callable( Arc::new( Arity( 0 ))));
		let ( name, _ ) = find_entry_point( &Value::Namespace( root.clone() )).unwrap();
		assert_eq!( name, "main" );

		root.insert( "main", Value::Opaque( json!( "not callable" )));
		assert_eq!( find_entry_point( &Value::Namespace( root.clone() )).map(|( name, _ )| name ), Some( "start" ));

		root.insert( "start", Value::Opaque( JsonValue::Null ));
		assert!( find_entry_point( &Value::Namespace( root )).is_none() );
	}

	#[test]
	fn hints_follow_message_keywords() {
		let invalid = PipelineError::Transpile( TranspileError::Failed( "not a WebAssembly binary".into() ));
		assert_eq!( invalid.hint(), Some( "Make sure the file is a valid WebAssembly component" ));
		let memory = PipelineError::Transpile( TranspileError::Failed( "out of memory".into() ));
		assert_eq!( memory.hint(), Some( "The component might be too large for the configured memory limit" ));
		assert_eq!( PipelineError::NoComponent.hint(), None );
	}

	#[test]
	fn hints_read_the_transpiler_message_only() {
		let unrelated = PipelineError::Transpile( TranspileError::InvalidComponent( wasmtime::Error::msg( "expected `(`" )));
		assert_eq!( unrelated.hint(), None );
		let rejected = PipelineError::Transpile( TranspileError::InvalidComponent( wasmtime::Error::msg( "unknown binary version" )));
		assert_eq!( rejected.hint(), Some( "Make sure the file is a valid WebAssembly component" ));
		let load = PipelineError::Load( LoadError::UnresolvedReference( "./memory.wasm".into() ));
		assert_eq!( load.hint(), None );
	}

}
