//! Evaluates rewritten entry-point source into a [`LoadedModule`].
//!
//! Entry-point source is a short list of statements, one per line. Blank lines
//! and `//` comments are ignored.
//!
//! ```text
//! import <binding> from '<locator>';
//! const <binding> = await import('<locator>');
//! const <binding> = new URL('<locator>'[, import.meta.url]);
//! export * from <binding>;
//! export default <binding>;
//! ```
//!
//! Each binding names a component resource, which is compiled and instantiated
//! when the binding is declared. Locators must be live resource handles: the
//! loader has no filesystem to fall back on.

use std::collections::HashMap ;
use std::sync::{ Arc, LazyLock, Mutex };
use regex::Regex ;
use serde_json::{ json, Value as JsonValue };
use thiserror::Error ;
use wasmtime::{ Engine, Store, StoreLimits, StoreLimitsBuilder };
use wasmtime::component::{ Component, ComponentExportIndex, Instance, Linker, Val };
use wasmtime::component::types::{ ComponentFunc, ComponentItem };

use crate::invoke::InvocationError ;
use crate::marshal ;
use crate::resources::ResourceTable ;
use crate::transpile::ExportKind ;
use crate::value::{ Callable, Namespace, Value };



const IDENT: &str = r"[A-Za-z_$][\w$]*" ;

static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!(
	r#"^import\s+({IDENT})\s+from\s+['"]([^'"]+)['"]\s*;?$"#
)).expect( "static import statement pattern is valid" ));

static DEFERRED_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!(
	r#"^const\s+({IDENT})\s*=\s*await\s+import\s*\(\s*['"]([^'"]+)['"]\s*\)\s*;?$"#
)).expect( "deferred import statement pattern is valid" ));

static LOCATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!(
	r#"^const\s+({IDENT})\s*=\s*new\s+URL\s*\(\s*['"]([^'"]+)['"]\s*(?:,\s*import\.meta\.url\s*)?\)\s*;?$"#
)).expect( "locator statement pattern is valid" ));

static EXPORT_ALL: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!(
	r"^export\s+\*\s+from\s+({IDENT})\s*;?$"
)).expect( "export statement pattern is valid" ));

static EXPORT_DEFAULT: LazyLock<Regex> = LazyLock::new(|| Regex::new( &format!(
	r"^export\s+default\s+({IDENT})\s*;?$"
)).expect( "default export statement pattern is valid" ));

/// Errors raised while loading rewritten source.
#[derive( Error, Debug )]
pub enum LoadError {
	/// A line that isn't a recognised statement.
	#[error( "Syntax error on line {line}: {text}" )] Syntax { line: usize, text: String },
	/// A locator that doesn't name a live resource handle.
	#[error( "Unresolved reference: {0}" )] UnresolvedReference( String ),
	/// An export names a binding that was never declared.
	#[error( "Undefined binding: {0}" )] UndefinedBinding( String ),
	/// A binding was declared twice.
	#[error( "Duplicate binding: {0}" )] DuplicateBinding( String ),
	/// The referenced component failed to compile or instantiate.
	#[error( "Instantiation failed for {filename}: {error}" )] Instantiation { filename: String, error: wasmtime::Error },
}

/// Statement of the entry-point source.
#[derive( Debug, Clone, PartialEq, Eq )]
pub(crate) enum Statement {
	Bind { binding: String, locator: String },
	ExportAll { binding: String },
	ExportDefault { binding: String },
}

/// Splits entry-point source into statements.
pub(crate) fn parse_source( source: &str ) -> Result<Vec<Statement>, LoadError> {
	source.lines()
		.enumerate()
		.map(|( index, line )| ( index + 1, line.trim() ))
		.filter(|( _, line )| !line.is_empty() && !line.starts_with( "//" ))
		.map(|( line_number, line )| {
			if let Some( caps ) = STATIC_IMPORT.captures( line )
				.or_else(|| DEFERRED_IMPORT.captures( line ))
				.or_else(|| LOCATOR.captures( line ))
			{
				return Ok( Statement::Bind { binding: caps[1].to_string(), locator: caps[2].to_string() });
			}
			if let Some( caps ) = EXPORT_ALL.captures( line ) {
				return Ok( Statement::ExportAll { binding: caps[1].to_string() });
			}
			if let Some( caps ) = EXPORT_DEFAULT.captures( line ) {
				return Ok( Statement::ExportDefault { binding: caps[1].to_string() });
			}
			Err( LoadError::Syntax { line: line_number, text: line.to_string() })
		})
		.collect()
}

/// Store data for every instance the loader creates.
pub(crate) struct InstanceState {
	limits: StoreLimits,
}

/// A store paired with the instance living in it.
pub(crate) struct LiveInstance {
	store: Store<InstanceState>,
	instance: Instance,
}

/// The evaluated entry point: a root namespace of classified exports.
pub struct LoadedModule {
	namespace: Namespace,
	source: String,
	instance_count: usize,
}

impl LoadedModule {

	/// The module's root namespace.
	#[inline] pub fn namespace( &self ) -> &Namespace { &self.namespace }

	/// The rewritten source the module was loaded from.
	#[inline] pub fn source( &self ) -> &str { &self.source }

	/// Number of component instances backing the module.
	#[inline] pub fn instance_count( &self ) -> usize { self.instance_count }

	/// The namespace exports should be discovered in, and whether it is the
	/// `default` member.
	///
	/// The root namespace is used whenever it has own members besides `default`;
	/// only a root holding nothing else falls back to its `default` member.
	pub fn export_root( &self ) -> ( Value, bool ) {
		if self.namespace.keys().iter().any(| key | key != "default" ) {
			return ( Value::Namespace( self.namespace.clone() ), false )
		}
		match self.namespace.get( "default" ) {
			Some( Ok( value )) => ( value, true ),
			_ => ( Value::Namespace( self.namespace.clone() ), false ),
		}
	}

}

impl std::fmt::Debug for LoadedModule {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "LoadedModule" )
			.field( "namespace", &self.namespace )
			.field( "instance_count", &self.instance_count )
			.finish_non_exhaustive()
	}
}

/// Instantiates components referenced by entry-point source.
///
/// Components are linked against an empty [`Linker`], so components that
/// import anything fail to instantiate.
pub struct ModuleLoader {
	engine: Engine,
	linker: Linker<InstanceState>,
	max_memory_bytes: Option<usize>,
}

impl ModuleLoader {

	pub fn new( engine: Engine ) -> Self {
		let linker = Linker::new( &engine );
		Self { engine, linker, max_memory_bytes: None }
	}

	/// Caps the linear memory each instance may grow to.
	pub fn with_memory_limit( mut self, max_memory_bytes: usize ) -> Self {
		self.max_memory_bytes = Some( max_memory_bytes );
		self
	}

	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }

	/// Evaluates `source`, resolving locators through `resources`.
	///
	/// # Errors
	/// Returns a [`LoadError`] on unrecognised statements, unresolved locators,
	/// undefined bindings, or components that fail to instantiate.
	pub fn load( &self, source: &str, resources: &ResourceTable ) -> Result<LoadedModule, LoadError> {

		let statements = parse_source( source )?;
		let namespace = Namespace::new();
		let mut bindings = HashMap::<String, Namespace>::new();

		for statement in statements { match statement {
			Statement::Bind { binding, locator } => {
				if bindings.contains_key( &binding ) { return Err( LoadError::DuplicateBinding( binding )) }
				let resource = resources.resolve( &locator )
					.ok_or_else(|| LoadError::UnresolvedReference( locator.clone() ))?;
				let exports = self.instantiate( resource.filename(), resource.bytes() )?;
				bindings.insert( binding, exports );
			}
			Statement::ExportAll { binding } => {
				let exports = bindings.get( &binding ).ok_or_else(|| LoadError::UndefinedBinding( binding.clone() ))?;
				exports.own_members().into_iter().for_each(|( key, member )| match member.get() {
					Ok( value ) => namespace.insert( key, value ),
					Err( err ) => tracing::warn!( "Skipping export \"{}\": {}", key, err ),
				});
			}
			Statement::ExportDefault { binding } => {
				let exports = bindings.get( &binding ).ok_or_else(|| LoadError::UndefinedBinding( binding.clone() ))?;
				namespace.insert( "default", Value::Namespace( exports.clone() ));
			}
		}}

		Ok( LoadedModule { namespace, source: source.to_string(), instance_count: bindings.len() })

	}

	fn instantiate( &self, filename: &str, bytes: &[u8] ) -> Result<Namespace, LoadError> {

		let failed = | error: wasmtime::Error | LoadError::Instantiation { filename: filename.to_string(), error };

		let component = Component::new( &self.engine, bytes ).map_err( failed )?;
		let limits = match self.max_memory_bytes {
			Some( max ) => StoreLimitsBuilder::new().memory_size( max ).build(),
			None => StoreLimits::default(),
		};
		let mut store = Store::new( &self.engine, InstanceState { limits });
		store.limiter(| state | &mut state.limits );
		let instance = self.linker.instantiate( &mut store, &component ).map_err( failed )?;

		let tree = component.component_type()
			.exports( &self.engine )
			.filter_map(| ( name, item ) | ExportNode::resolve( &self.engine, &mut store, &instance, None, name, item ))
			.collect::<Vec<_>>();

		let live = Arc::new( Mutex::new( LiveInstance { store, instance }));
		let namespace = Namespace::new();
		tree.into_iter().for_each(| node | {
			let ( name, value ) = node.into_value( &live );
			namespace.insert( name, value );
		});
		Ok( namespace )

	}

}

/// Exports of an instance, resolved to export indices before the store is shared.
enum ExportNode {
	Function { name: String, index: ComponentExportIndex, ty: ComponentFunc },
	Instance { name: String, children: Vec<ExportNode> },
	Other { name: String, kind: ExportKind },
}

impl ExportNode {

	fn resolve(
		engine: &Engine,
		store: &mut Store<InstanceState>,
		instance: &Instance,
		parent: Option<&ComponentExportIndex>,
		name: &str,
		item: ComponentItem,
	) -> Option<Self> {
		let kind = ExportKind::from( &item );
		Some( match item {
			ComponentItem::ComponentFunc( ty ) => {
				let index = instance.get_export_index( &mut *store, parent, name )?;
				Self::Function { name: name.to_string(), index, ty }
			}
			ComponentItem::ComponentInstance( nested ) => {
				let index = instance.get_export_index( &mut *store, parent, name )?;
				let children = nested.exports( engine )
					.filter_map(|( child_name, child )| Self::resolve( engine, store, instance, Some( &index ), child_name, child ))
					.collect();
				Self::Instance { name: name.to_string(), children }
			}
			_ => Self::Other { name: name.to_string(), kind },
		})
	}

	fn into_value( self, live: &Arc<Mutex<LiveInstance>> ) -> ( String, Value ) { match self {
		Self::Function { name, index, ty } => {
			let function = ComponentFunction { name: name.clone(), index, ty, live: Arc::clone( live ) };
			( name, Value::Callable( Arc::new( function )))
		}
		Self::Instance { name, children } => {
			let namespace = Namespace::new();
			children.into_iter().for_each(| child | {
				let ( child_name, value ) = child.into_value( live );
				namespace.insert( child_name, value );
			});
			( name, Value::Namespace( namespace ))
		}
		Self::Other { name, kind } => ( name, Value::Opaque( json!({ "kind": kind.to_string() }))),
	}}

}

/// A component function exported by a live instance.
pub(crate) struct ComponentFunction {
	name: String,
	index: ComponentExportIndex,
	ty: ComponentFunc,
	live: Arc<Mutex<LiveInstance>>,
}

impl Callable for ComponentFunction {

	fn arity( &self ) -> Option<usize> { Some( self.ty.params().len() ) }

	fn call( &self, args: &[JsonValue] ) -> Result<JsonValue, InvocationError> {

		let params = self.ty.params().map(|( _, ty )| ty ).collect::<Vec<_>>();
		if params.len() != args.len() {
			return Err( InvocationError::ArgumentCount { expected: params.len(), found: args.len() });
		}
		let data = args.iter().zip( &params ).enumerate()
			.map(|( index, ( arg, ty ))| marshal::to_val( index, arg, ty ))
			.collect::<Result<Vec<_>,_>>()?;
		let mut results = self.ty.results().map(|_| Val::Bool( false )).collect::<Vec<_>>();

		let mut lock = self.live.lock().map_err(|_| InvocationError::LockRejected )?;
		let LiveInstance { store, instance } = &mut *lock ;
		let func = instance.get_func( &mut *store, self.index )
			.ok_or_else(|| InvocationError::InvalidFunction( self.name.clone() ))?;
		func.call( &mut *store, &data, &mut results ).map_err( InvocationError::RuntimeException )?;
		let _ = func.post_return( &mut *store );
		drop( lock );

		match results.len() {
			0 => Ok( JsonValue::Null ),
			1 => match results.pop() {
				// An `err` result raises, the way generated bindings throw it.
				Some( Val::Result( Err( payload ))) => Err( InvocationError::Raised( match payload {
					Some( payload ) => marshal::from_val( *payload )?.to_string(),
					None => "err".to_string(),
				})),
				Some( Val::Result( Ok( payload ))) => payload.map_or( Ok( JsonValue::Null ), | payload | marshal::from_val( *payload )),
				Some( val ) => marshal::from_val( val ),
				None => Ok( JsonValue::Null ),
			},
			_ => Ok( JsonValue::Array( results.into_iter().map( marshal::from_val ).collect::<Result<_,_>>()? )),
		}

	}

}

#[cfg( test )]
mod tests {

	use super::* ;
	use crate::resources::ResourceHandle ;

	const ADDER: &str = r#"(component
		(core module $m (func (export "add") (param i32 i32) (result i32) local.get 0 local.get 1 i32.add))
		(core instance $i (instantiate $m))
		(func $add (param "a" s32) (param "b" s32) (result s32) (canon lift (core func $i "add")))
		(instance $inst (export "add" (func $add)))
		(export "example:add/add@0.1.0" (instance $inst))
	)"#;

	fn table_with_adder() -> ( ResourceTable, ResourceHandle ) {
		let mut table = ResourceTable::new();
		let handle = table.create( "component.core.wasm", ADDER.as_bytes().to_vec() );
		( table, handle )
	}

	#[test]
	fn parses_every_statement_shape() {
		let source = "\
			// header\n\
			\n\
			import a from 'blob:component-runner/1';\n\
			const b = await import('blob:component-runner/2');\n\
			const c = new URL('./c.wasm', import.meta.url);\n\
			const d = new URL(\"blob:component-runner/4\")\n\
			export * from a;\n\
			export default b;\n";
		let statements = parse_source( source ).unwrap();
		assert_eq!( statements.len(), 6 );
		assert_eq!( statements[2], Statement::Bind { binding: "c".into(), locator: "./c.wasm".into() });
		assert_eq!( statements[5], Statement::ExportDefault { binding: "b".into() });
	}

	#[test]
	fn rejects_unknown_statements_with_line_numbers() {
		let error = parse_source( "export * from a;\nconsole.log(1);\n" ).unwrap_err();
		assert!( matches!( error, LoadError::Syntax { line: 2, .. }));
	}

	#[test]
	fn spreads_component_exports_into_the_root() {
		let ( table, handle ) = table_with_adder();
		let source = format!( "import core from '{}';\nexport * from core;\n", handle );
		let module = ModuleLoader::new( Engine::default() ).load( &source, &table ).unwrap();

		assert_eq!( module.namespace().keys(), vec![ "example:add/add@0.1.0" ]);
		let Some( Ok( Value::Namespace( interface ))) = module.namespace().get( "example:add/add@0.1.0" ) else { panic!( "expected interface namespace" ) };
		let Some( Ok( Value::Callable( add ))) = interface.get( "add" ) else { panic!( "expected add function" ) };
		assert_eq!( add.arity(), Some( 2 ));
		assert_eq!( add.call( &[ json!( 2 ), json!( 40 )]).unwrap(), json!( 42 ));
	}

	#[test]
	fn default_export_is_used_when_root_is_empty() {
		let ( table, handle ) = table_with_adder();
		let source = format!( "const core = await import('{}');\nexport default core;\n", handle );
		let module = ModuleLoader::new( Engine::default() ).load( &source, &table ).unwrap();
		assert_eq!( module.namespace().keys(), vec![ "default" ]);
		let ( root, is_default ) = module.export_root();
		assert!( is_default );
		assert_eq!( root.as_namespace().map( Namespace::keys ), Some( vec![ "example:add/add@0.1.0".to_string() ]));
	}

	#[test]
	fn relative_locators_do_not_resolve() {
		let ( table, _ ) = table_with_adder();
		let source = "const core = new URL('./component.core.wasm', import.meta.url);\n";
		let error = ModuleLoader::new( Engine::default() ).load( source, &table ).unwrap_err();
		assert!( matches!( error, LoadError::UnresolvedReference( locator ) if locator == "./component.core.wasm" ));
	}

	#[test]
	fn revoked_handles_do_not_resolve() {
		let ( mut table, handle ) = table_with_adder();
		table.revoke( &handle );
		let source = format!( "import core from '{}';\n", handle );
		let error = ModuleLoader::new( Engine::default() ).load( &source, &table ).unwrap_err();
		assert!( matches!( error, LoadError::UnresolvedReference( _ )));
	}

	#[test]
	fn exports_need_a_declared_binding() {
		let error = ModuleLoader::new( Engine::default() ).load( "export * from nothing;\n", &ResourceTable::new() ).unwrap_err();
		assert!( matches!( error, LoadError::UndefinedBinding( name ) if name == "nothing" ));
	}

	#[test]
	fn argument_count_is_checked() {
		let ( table, handle ) = table_with_adder();
		let source = format!( "import core from '{}';\nexport * from core;\n", handle );
		let module = ModuleLoader::new( Engine::default() ).load( &source, &table ).unwrap();
		let Some( Ok( Value::Namespace( interface ))) = module.namespace().get( "example:add/add@0.1.0" ) else { panic!() };
		let Some( Ok( Value::Callable( add ))) = interface.get( "add" ) else { panic!() };
		assert!( matches!( add.call( &[ json!( 1 )]), Err( InvocationError::ArgumentCount { expected: 2, found: 1 })));
	}

}
