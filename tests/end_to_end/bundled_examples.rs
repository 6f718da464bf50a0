use serde_json::json ;
use component_runner::{ Example, Status };
use crate::fixtures ;

#[test]
fn end_to_end_bundled_examples() {

	let dir = fixtures::examples_dir();
	let mut runner = fixtures::runner_for( &dir );

	runner.load_example( Example::Add ).expect( "Failed to load example" );
	assert_eq!( runner.status(), Status::ComponentLoaded );
	assert_eq!( runner.component().map(| component | component.filename() ), Some( "add.wasm" ));
	runner.transpile().expect( "Failed to transpile example" );
	assert_eq!( runner.call( "add", "[1, 2]" ).value(), Some( &json!( 3 )));

	// Loading another example replaces the first one entirely.
	runner.load_example( Example::StringReverse ).expect( "Failed to load example" );
	assert!( runner.exports().is_empty() );
	runner.transpile().expect( "Failed to transpile example" );
	assert_eq!( runner.call( "reverse", r#"["abc"]"# ).value(), Some( &json!( "cba" )));
	assert!( runner.find_export( "add" ).is_none() );

}

#[test]
fn end_to_end_bundled_examples_from_dropped_file() {

	let dir = fixtures::examples_dir();
	let mut runner = fixtures::runner_for( &dir );

	runner.load_dropped( &dir.path().join( "add.wasm" )).expect( "Failed to load dropped file" );
	runner.transpile().expect( "Failed to transpile dropped file" );
	assert_eq!( runner.call( "add", "[2, 2]" ).value(), Some( &json!( 4 )));

}
