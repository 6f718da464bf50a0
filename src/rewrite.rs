//! Relinks generated entry-point source against in-memory resource handles.

use std::collections::BTreeMap ;
use std::sync::LazyLock ;
use regex::{ Captures, Regex };

use crate::resources::ResourceHandle ;



static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(
	r#"from\s+['"](?:\./)?([^'"]+)['"]"#
).expect( "static import pattern is valid" ));

static DEFERRED_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(
	r#"import\s*\(\s*['"](?:\./)?([^'"]+)['"]\s*\)"#
).expect( "deferred import pattern is valid" ));

static RELATIVE_LOCATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(
	r#"new\s+URL\s*\(\s*['"](?:\./)?([^'"]+)['"]\s*,\s*import\.meta\.url\s*\)"#
).expect( "relative locator pattern is valid" ));

/// Rewrites every reference to a file in `handles` so it points at the file's handle.
///
/// Three reference shapes are recognised, each with or without a leading `./`:
/// - `from './core.wasm'` becomes `from '<handle>'`
/// - `import('./core.wasm')` becomes `import('<handle>')`
/// - `new URL('./core.wasm', import.meta.url)` becomes `new URL('<handle>')`
///
/// All occurrences are replaced. References to files missing from `handles` are
/// left as they are.
pub fn rewrite_references( source: &str, handles: &BTreeMap<String, ResourceHandle> ) -> String {

	if handles.is_empty() { return source.to_string() }

	let lookup = | caps: &Captures<'_> | handles.get( &caps[1] ).map( ResourceHandle::as_str );

	let source = STATIC_IMPORT.replace_all( source, | caps: &Captures<'_> | match lookup( caps ) {
		Some( handle ) => format!( "from '{}'", handle ),
		None => caps[0].to_string(),
	});
	let source = DEFERRED_IMPORT.replace_all( &source, | caps: &Captures<'_> | match lookup( caps ) {
		Some( handle ) => format!( "import('{}')", handle ),
		None => caps[0].to_string(),
	});
	let source = RELATIVE_LOCATOR.replace_all( &source, | caps: &Captures<'_> | match lookup( caps ) {
		Some( handle ) => format!( "new URL('{}')", handle ),
		None => caps[0].to_string(),
	});

	source.into_owned()

}

#[cfg( test )]
mod tests {

	use super::* ;
	use crate::resources::ResourceTable ;

	fn handles_for( names: &[&str] ) -> ( ResourceTable, BTreeMap<String, ResourceHandle> ) {
		let mut table = ResourceTable::new();
		let handles = names.iter()
			.map(| name | ( (*name).to_string(), table.create( *name, Vec::new() )))
			.collect();
		( table, handles )
	}

	#[test]
	fn replaces_every_shape_with_and_without_prefix() {
		let ( _table, handles ) = handles_for( &[ "component.core.wasm" ]);
		let handle = handles["component.core.wasm"].as_str();
		let source = "\
			import a from './component.core.wasm';\n\
			import b from \"component.core.wasm\";\n\
			const c = await import('./component.core.wasm');\n\
			const d = await import( \"component.core.wasm\" );\n\
			const e = new URL('./component.core.wasm', import.meta.url);\n\
			const f = new URL( 'component.core.wasm' , import.meta.url );\n";

		let rewritten = rewrite_references( source, &handles );

		assert!( !rewritten.contains( "component.core.wasm" ), "left a reference behind:\n{}", rewritten );
		assert_eq!( rewritten.matches( &format!( "from '{}'", handle )).count(), 2 );
		assert_eq!( rewritten.matches( &format!( "import('{}')", handle )).count(), 2 );
		assert_eq!( rewritten.matches( &format!( "new URL('{}')", handle )).count(), 2 );
	}

	#[test]
	fn leaves_unknown_files_alone() {
		let ( _table, handles ) = handles_for( &[ "a.wasm" ]);
		let source = "import x from './ba.wasm';\nimport y from './a.wasm';\n";
		let rewritten = rewrite_references( source, &handles );
		assert!( rewritten.contains( "from './ba.wasm'" ));
		assert!( rewritten.contains( &format!( "from '{}'", handles["a.wasm"] )));
	}

	#[test]
	fn rewrites_each_resource_independently() {
		let ( _table, handles ) = handles_for( &[ "one.wasm", "two.wasm" ]);
		let source = "import a from './one.wasm';\nconst b = await import('./two.wasm');\n";
		let rewritten = rewrite_references( source, &handles );
		assert!( rewritten.contains( &format!( "from '{}'", handles["one.wasm"] )));
		assert!( rewritten.contains( &format!( "import('{}')", handles["two.wasm"] )));
	}

	#[test]
	fn passes_through_without_resources() {
		let source = "import a from './core.wasm';\n";
		assert_eq!( rewrite_references( source, &BTreeMap::new() ), source );
	}

}
