use serde_json::json ;
use component_runner::{ Phase, Status };
use crate::fixtures ;

#[test]
fn end_to_end_add_component() {

	let mut runner = fixtures::transpiled( fixtures::ADD );

	assert_eq!( runner.phase(), Phase::Runnable );
	assert_eq!( runner.status(), Status::TranspilationComplete );
	let names = runner.exports().iter().map(| descriptor | descriptor.display_name() ).collect::<Vec<_>>();
	assert_eq!( names, vec![ "add" ]);
	assert_eq!( runner.exports()[0].path(), "example:add/add@0.1.0.add" );

	let result = runner.call( "add", "[5, 3]" );
	assert_eq!( result.value(), Some( &json!( 8 )));
	assert_eq!( result.to_string(), "Result: 8" );
	assert_logged!( runner, "Calling add(5, 3)" );

	let result = runner.call( "example:add/add@0.1.0.add", "[10, 25]" );
	assert_eq!( result.value(), Some( &json!( 35 )));

}

#[test]
fn end_to_end_add_component_logs_each_stage() {

	let runner = fixtures::transpiled( fixtures::ADD );

	assert_logged!( runner, "Component loaded successfully" );
	assert_logged!( runner, "Starting transpilation..." );
	assert_logged!( runner, "Generated files: component.js, component.core.wasm" );
	assert_logged!( runner, "Component exports: example:add/add@0.1.0" );
	assert_logged!( runner, "Created resource handle for component.core.wasm" );
	assert_logged!( runner, "Module loaded with exports: example:add/add@0.1.0" );
	assert_logged!( runner, "Available functions: add" );

}

#[test]
fn end_to_end_add_component_rewrites_relative_references() {

	let runner = fixtures::transpiled( fixtures::ADD );
	let module = runner.module().expect( "Expected a loaded module" );
	assert!( !module.source().contains( "./component.core.wasm" ));
	assert!( module.source().contains( "blob:component-runner/" ));
	assert_eq!( module.instance_count(), 1 );

}
