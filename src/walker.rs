//! Discovers every invocable member of a loaded module.

use std::collections::HashMap ;
use std::sync::Arc ;

use crate::value::{ Callable, Namespace, Value };



/// Keys that never name an export.
const SKIPPED_KEYS: [&str; 2] = [ "constructor", "__proto__" ];

/// A discovered invocable member.
#[derive( Clone )]
pub struct ExportDescriptor {
	path: String,
	display_name: String,
	invoke: Arc<dyn Callable>,
}

impl ExportDescriptor {

	pub fn new( path: impl Into<String>, display_name: impl Into<String>, invoke: Arc<dyn Callable> ) -> Self {
		Self { path: path.into(), display_name: display_name.into(), invoke }
	}

	/// Dotted access chain from the walk root, e.g. `example:add/add@0.1.0.add`.
	#[inline] pub fn path( &self ) -> &str { &self.path }

	/// Short human-readable name, e.g. `add`.
	#[inline] pub fn display_name( &self ) -> &str { &self.display_name }

	#[inline] pub fn invoke( &self ) -> &Arc<dyn Callable> { &self.invoke }

}

impl std::fmt::Debug for ExportDescriptor {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ExportDescriptor" )
			.field( "path", &self.path )
			.field( "display_name", &self.display_name )
			.finish_non_exhaustive()
	}
}

/// Derives the display name for a member key.
///
/// Namespaced keys such as `example:string-reverse/reverse@0.1.0` shorten to
/// their last `/` segment without the `@` version (`reverse`). Other keys are
/// returned unchanged.
pub fn display_name( key: &str ) -> &str {
	match key.rsplit_once( '/' ) {
		Some(( _, last )) => last.split( '@' ).next().unwrap_or( last ),
		None => key,
	}
}

/// Lists every callable reachable from `root`, depth first, in declaration order.
///
/// Only own members are visited. Namespaces reached more than once (through
/// aliasing or cycles) are walked once. Lists are data and are not searched.
/// Members whose access fails are skipped with a warning. `prefix` is prepended
/// to every path.
pub fn walk_exports( root: &Value, prefix: Option<&str> ) -> Vec<ExportDescriptor> {
	let mut visited = HashMap::new();
	let mut found = Vec::new();
	if let Value::Namespace( namespace ) = root {
		walk_namespace( namespace, prefix.unwrap_or_default(), &mut visited, &mut found );
	}
	found
}

fn walk_namespace(
	namespace: &Namespace,
	path: &str,
	visited: &mut HashMap<usize, Namespace>,
	found: &mut Vec<ExportDescriptor>,
) {

	// Visited namespaces are held until the walk ends so their addresses can't be reused.
	if visited.insert( namespace.id(), namespace.clone() ).is_some() { return }

	for ( key, member ) in namespace.own_members() {

		if SKIPPED_KEYS.contains( &key.as_str() ) { continue }

		let member_path = match path.is_empty() {
			true => key.clone(),
			false => format!( "{}.{}", path, key ),
		};

		match member.get() {
			Ok( Value::Callable( callable )) => found.push( ExportDescriptor::new(
				member_path,
				display_name( &key ),
				callable,
			)),
			Ok( Value::Namespace( nested )) => walk_namespace( &nested, &member_path, visited, found ),
			Ok( Value::List( _ ) | Value::Opaque( _ )) => {}
			Err( err ) => tracing::warn!( "Could not access member \"{}\": {}", member_path, err ),
		}

	}

}

#[cfg( test )]
mod tests {

	use serde_json::{ json, Value as JsonValue };

	use super::* ;

	fn function() -> Value { Value::function(| _: &[JsonValue] | Ok( JsonValue::Null ))}

	fn paths( descriptors: &[ExportDescriptor] ) -> Vec<&str> {
		descriptors.iter().map( ExportDescriptor::path ).collect()
	}

	#[test]
	fn display_names_strip_namespace_and_version() {
		assert_eq!( display_name( "example:string-reverse/reverse@0.1.0" ), "reverse" );
		assert_eq!( display_name( "wasi:cli/run" ), "run" );
		assert_eq!( display_name( "add" ), "add" );
		assert_eq!( display_name( "add@0.1.0" ), "add@0.1.0" );
	}

	#[test]
	fn walks_depth_first_in_declaration_order() {
		let inner = Namespace::new();
		inner.insert( "reverse", function() );
		let root = Namespace::new();
		root.insert( "first", function() );
		root.insert( "example:string-reverse/reverse@0.1.0", Value::Namespace( inner ));
		root.insert( "last", function() );

		let found = walk_exports( &Value::Namespace( root ), None );

		assert_eq!( paths( &found ), vec![ "first", "example:string-reverse/reverse@0.1.0.reverse", "last" ]);
		assert_eq!( found[1].display_name(), "reverse" );
	}

	#[test]
	fn namespaced_function_keys_get_short_display_names() {
		let root = Namespace::new();
		root.insert( "example:adder/add@0.1.0", function() );
		let found = walk_exports( &Value::Namespace( root ), Some( "exports" ));
		assert_eq!( paths( &found ), vec![ "exports.example:adder/add@0.1.0" ]);
		assert_eq!( found[0].display_name(), "add" );
	}

	#[test]
	fn cycles_terminate_and_report_each_function_once() {
		let a = Namespace::new();
		let b = Namespace::new();
		a.insert( "f", function() );
		a.insert( "b", Value::Namespace( b.clone() ));
		b.insert( "g", function() );
		b.insert( "a", Value::Namespace( a.clone() ));
		b.insert( "again", Value::Namespace( b.clone() ));

		let found = walk_exports( &Value::Namespace( a.clone() ), None );

		assert_eq!( paths( &found ), vec![ "f", "b.g" ]);
		// break the cycle so the test doesn't leak
		b.insert( "a", Value::Opaque( JsonValue::Null ));
		b.insert( "again", Value::Opaque( JsonValue::Null ));
	}

	#[test]
	fn lists_are_not_searched() {
		let root = Namespace::new();
		root.insert( "handlers", Value::List( vec![ function(), function() ]));
		root.insert( "data", Value::Opaque( json!([ 1, 2 ])));
		assert!( walk_exports( &Value::Namespace( root ), None ).is_empty() );
	}

	#[test]
	fn inherited_and_constructor_members_are_skipped() {
		let prototype = Namespace::new();
		prototype.insert( "inherited", function() );
		let root = Namespace::with_prototype( prototype );
		root.insert( "constructor", function() );
		root.insert( "__proto__", function() );
		root.insert( "own", function() );
		assert_eq!( paths( &walk_exports( &Value::Namespace( root ), None )), vec![ "own" ]);
	}

	#[test]
	fn failing_accessors_are_skipped() {
		let root = Namespace::new();
		root.insert( "before", function() );
		root.insert_accessor( "broken", || Err( "access denied".to_string() ));
		root.insert_accessor( "lazy", || Ok( function() ));
		root.insert( "after", function() );
		assert_eq!( paths( &walk_exports( &Value::Namespace( root ), None )), vec![ "before", "lazy", "after" ]);
	}

	#[test]
	fn namespaces_built_on_access_are_all_walked() {
		let root = Namespace::new();
		for ( key, function_key ) in [( "a", "f" ), ( "b", "g" ), ( "c", "h" )] {
			root.insert_accessor( key, move || {
				let nested = Namespace::new();
				nested.insert( function_key, function() );
				Ok( Value::Namespace( nested ))
			});
		}
		assert_eq!( paths( &walk_exports( &Value::Namespace( root ), None )), vec![ "a.f", "b.g", "c.h" ]);
	}

	#[test]
	fn walking_leaves_the_graph_untouched() {
		let root = Namespace::new();
		root.insert( "f", function() );
		let before = root.keys();
		walk_exports( &Value::Namespace( root.clone() ), None );
		walk_exports( &Value::Namespace( root.clone() ), None );
		assert_eq!( root.keys(), before );
	}

	#[test]
	fn non_namespace_roots_have_no_exports() {
		assert!( walk_exports( &function(), None ).is_empty() );
		assert!( walk_exports( &Value::Opaque( json!({ "f": 1 })), None ).is_empty() );
	}

}
