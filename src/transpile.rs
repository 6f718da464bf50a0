//! The transpiler seam and the bundled Wasmtime-backed transpiler.
//!
//! A transpiler turns component bytes into a [`GeneratedFileSet`]: one textual
//! entry point plus auxiliary binary resources the entry point refers to by
//! relative path. The pipeline treats transpilers as black boxes behind the
//! [`Transpiler`] trait.

use itertools::Itertools ;
use thiserror::Error ;
use wasmtime::Engine ;
use wasmtime::component::Component ;
use wasmtime::component::types::ComponentItem ;



/// File name of the entry point every transpile run must produce.
pub const ENTRY_POINT: &str = "component.js" ;

/// Suffix marking a generated file as a binary resource.
pub const BINARY_RESOURCE_SUFFIX: &str = ".wasm" ;

/// Options passed to the transpiler. The runner always uses the defaults.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct TranspileOptions {
	/// Base name for generated files. The entry point is `<name>.js`.
	pub name: String,
	/// Skip generating type declarations.
	pub no_typescript: bool,
	/// Allow the transpiler's lifting optimization.
	pub valid_lifting_optimization: bool,
}

impl TranspileOptions {
	/// File name of the entry point these options produce.
	pub fn entry_point( &self ) -> String { format!( "{}.js", self.name )}
}

impl Default for TranspileOptions {
	fn default() -> Self {
		Self {
			name: "component".to_string(),
			no_typescript: true,
			valid_lifting_optimization: false,
		}
	}
}

/// Errors raised while transpiling.
#[derive( Error, Debug )]
pub enum TranspileError {
	/// The transpiler rejected the component.
	#[error( "Invalid WebAssembly component: {0}" )] InvalidComponent( wasmtime::Error ),
	/// A transpiler failure that carries only a message.
	#[error( "{0}" )] Failed( String ),
	/// The generated file set lacks the entry point.
	#[error( "No loadable module was produced: missing {0}" )] MissingEntryPoint( String ),
	/// The entry point isn't UTF-8 text.
	#[error( "Entry point {0} is not valid UTF-8" )] InvalidEntryPoint( String ),
}

/// Generated files in the order the transpiler produced them.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct GeneratedFileSet {
	files: Vec<( String, Vec<u8> )>,
}

impl GeneratedFileSet {

	pub fn new() -> Self { Self::default() }

	/// Adds a file, replacing an earlier file with the same name.
	pub fn insert( &mut self, filename: impl Into<String>, bytes: impl Into<Vec<u8>> ) {
		let filename = filename.into();
		let bytes = bytes.into();
		match self.files.iter_mut().find(|( existing, _ )| *existing == filename ) {
			Some(( _, slot )) => *slot = bytes,
			None => self.files.push(( filename, bytes )),
		}
	}

	pub fn get( &self, filename: &str ) -> Option<&[u8]> {
		self.files.iter().find(|( name, _ )| name == filename ).map(|( _, bytes )| bytes.as_slice() )
	}

	pub fn filenames( &self ) -> impl Iterator<Item = &str> {
		self.files.iter().map(|( name, _ )| name.as_str() )
	}

	/// Files the entry point loads as binary resources.
	pub fn binary_resources( &self ) -> impl Iterator<Item = ( &str, &[u8] )> {
		self.files.iter()
			.filter(|( name, _ )| name.ends_with( BINARY_RESOURCE_SUFFIX ))
			.map(|( name, bytes )| ( name.as_str(), bytes.as_slice() ))
	}

	/// The entry point decoded as source text.
	///
	/// # Errors
	/// Fails if the entry point is missing or isn't UTF-8.
	pub fn entry_source( &self, entry_point: &str ) -> Result<&str, TranspileError> {
		let bytes = self.get( entry_point ).ok_or_else(|| TranspileError::MissingEntryPoint( entry_point.to_string() ))?;
		std::str::from_utf8( bytes ).map_err(|_| TranspileError::InvalidEntryPoint( entry_point.to_string() ))
	}

	#[inline] pub fn len( &self ) -> usize { self.files.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.files.is_empty() }

}

impl<N: Into<String>, B: Into<Vec<u8>>> FromIterator<( N, B )> for GeneratedFileSet {
	fn from_iter<I: IntoIterator<Item = ( N, B )>>( iter: I ) -> Self {
		let mut files = Self::new();
		iter.into_iter().for_each(|( name, bytes )| files.insert( name, bytes ));
		files
	}
}

/// Kind of an item a component exports.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum ExportKind {
	Function,
	Instance,
	Component,
	Module,
	CoreFunction,
	Type,
	Resource,
}

impl std::fmt::Display for ExportKind {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.write_str( match self {
			Self::Function => "function",
			Self::Instance => "instance",
			Self::Component => "component",
			Self::Module => "module",
			Self::CoreFunction => "core-function",
			Self::Type => "type",
			Self::Resource => "resource",
		})
	}
}

impl From<&ComponentItem> for ExportKind {
	fn from( item: &ComponentItem ) -> Self { match item {
		ComponentItem::ComponentFunc( _ ) => Self::Function,
		ComponentItem::ComponentInstance( _ ) => Self::Instance,
		ComponentItem::Component( _ ) => Self::Component,
		ComponentItem::Module( _ ) => Self::Module,
		ComponentItem::CoreFunc( _ ) => Self::CoreFunction,
		ComponentItem::Type( _ ) => Self::Type,
		ComponentItem::Resource( _ ) => Self::Resource,
	}}
}

/// The result of a transpile run.
#[derive( Debug, Clone, Default )]
pub struct Transpiled {
	pub files: GeneratedFileSet,
	/// Top-level exports as reported by the transpiler. May be empty.
	pub exports: Vec<( String, ExportKind )>,
}

/// Converts component bytes into a loadable file set.
pub trait Transpiler {

	/// # Errors
	/// Returns a [`TranspileError`] if the bytes can't be transpiled.
	fn transpile( &self, bytes: &[u8], options: &TranspileOptions ) -> Result<Transpiled, TranspileError> ;

}

impl<F> Transpiler for F
where
	F: Fn( &[u8], &TranspileOptions ) -> Result<Transpiled, TranspileError>,
{
	fn transpile( &self, bytes: &[u8], options: &TranspileOptions ) -> Result<Transpiled, TranspileError> {
		self( bytes, options )
	}
}

/// Transpiler backed by Wasmtime's component compiler.
///
/// Accepts both the binary and the text component format. The component is
/// compiled once to validate it and read its export list, then emitted as
/// `<name>.core.wasm` next to an entry point `<name>.js` that imports it. With
/// `no_typescript` unset, `<name>.d.ts` lists the exports as well.
///
/// This transpiler performs no lifting optimization, so
/// `valid_lifting_optimization` has no effect on its output.
#[derive( Clone )]
pub struct WasmtimeTranspiler {
	engine: Engine,
}

impl WasmtimeTranspiler {

	pub fn new( engine: Engine ) -> Self { Self { engine }}

	fn entry_source( filename: &str, core_file: &str ) -> String {
		format!( "\
			// Generated from {filename}\n\
			import component from './{core_file}';\n\
			export * from component;\n" )
	}

	fn declarations( exports: &[( String, ExportKind )] ) -> String {
		exports.iter()
			.map(|( name, kind )| format!( "export declare const '{}': {};\n", name, kind ))
			.join( "" )
	}

}

impl std::fmt::Debug for WasmtimeTranspiler {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "WasmtimeTranspiler" ).finish_non_exhaustive()
	}
}

impl Transpiler for WasmtimeTranspiler {

	fn transpile( &self, bytes: &[u8], options: &TranspileOptions ) -> Result<Transpiled, TranspileError> {

		let component = Component::new( &self.engine, bytes ).map_err( TranspileError::InvalidComponent )?;
		let exports = component.component_type()
			.exports( &self.engine )
			.map(|( name, item )| ( name.to_string(), ExportKind::from( &item )))
			.collect::<Vec<_>>();

		let core_file = format!( "{}.core{}", options.name, BINARY_RESOURCE_SUFFIX );
		let mut files = GeneratedFileSet::new();
		files.insert( options.entry_point(), Self::entry_source( &options.name, &core_file ));
		files.insert( core_file, bytes );
		if !options.no_typescript {
			files.insert( format!( "{}.d.ts", options.name ), Self::declarations( &exports ));
		}

		Ok( Transpiled { files, exports })

	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	const ADDER: &str = r#"(component
		(core module $m (func (export "add") (param i32 i32) (result i32) local.get 0 local.get 1 i32.add))
		(core instance $i (instantiate $m))
		(func $add (param "a" s32) (param "b" s32) (result s32) (canon lift (core func $i "add")))
		(export "add" (func $add))
	)"#;

	#[test]
	fn emits_entry_point_and_core_resource() {
		let transpiler = WasmtimeTranspiler::new( Engine::default() );
		let transpiled = transpiler.transpile( ADDER.as_bytes(), &TranspileOptions::default() ).unwrap();

		assert_eq!( transpiled.files.filenames().collect::<Vec<_>>(), vec![ "component.js", "component.core.wasm" ]);
		assert_eq!( transpiled.exports, vec![( "add".to_string(), ExportKind::Function )]);
		let source = transpiled.files.entry_source( ENTRY_POINT ).unwrap();
		assert!( source.contains( "from './component.core.wasm'" ));
		assert_eq!( transpiled.files.binary_resources().count(), 1 );
	}

	#[test]
	fn declarations_follow_no_typescript() {
		let transpiler = WasmtimeTranspiler::new( Engine::default() );
		let options = TranspileOptions { no_typescript: false, ..TranspileOptions::default() };
		let transpiled = transpiler.transpile( ADDER.as_bytes(), &options ).unwrap();
		let declarations = transpiled.files.get( "component.d.ts" ).unwrap();
		assert_eq!( std::str::from_utf8( declarations ).unwrap(), "export declare const 'add': function;\n" );
	}

	#[test]
	fn rejects_bytes_that_are_not_a_component() {
		let transpiler = WasmtimeTranspiler::new( Engine::default() );
		let result = transpiler.transpile( b"\0asm\x01\0\0\0garbage", &TranspileOptions::default() );
		assert!( matches!( result, Err( TranspileError::InvalidComponent( _ ))));
	}

	#[test]
	fn missing_entry_point_is_reported() {
		let files: GeneratedFileSet = [( "other.js", "export {}" )].into_iter().collect();
		assert!( matches!( files.entry_source( ENTRY_POINT ), Err( TranspileError::MissingEntryPoint( name )) if name == ENTRY_POINT ));
	}

}
