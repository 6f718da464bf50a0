use serde_json::json ;
use component_runner::Phase ;
use crate::fixtures ;

#[test]
fn end_to_end_entry_point_priority() {

	let mut runner = fixtures::transpiled( fixtures::ENTRY_POINTS );

	// `run` takes an argument, so `main` is next in line.
	let result = runner.run().expect( "Expected an entry point to run" );
	assert_eq!( result.value(), Some( &json!( 2 )));
	assert_logged!( runner, "Found \"main\" export, executing..." );
	assert_logged!( runner, "Main completed: 2" );

	// The other exports stay callable directly.
	assert_eq!( runner.call( "run", "41" ).value(), Some( &json!( 41 )));
	assert_eq!( runner.call( "start", "" ).value(), Some( &json!( 3 )));

}

#[test]
fn end_to_end_entry_point_missing() {

	let mut runner = fixtures::transpiled( fixtures::ADD );

	assert!( runner.run().is_none() );
	assert_logged!( runner, "No standard entry point found. Use the function call interface to call specific exports." );
	assert_eq!( runner.phase(), Phase::Runnable );

}

#[test]
fn end_to_end_entry_point_before_transpile() {

	let mut runner = component_runner::ComponentRunner::new( component_runner::RunnerConfig::default() );
	runner.load_bytes( fixtures::bytes( fixtures::ENTRY_POINTS ), "entry-points.wasm" ).unwrap();

	assert!( runner.run().is_none() );
	assert!( !runner.controls().run );

}
