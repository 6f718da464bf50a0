use component_runner::{ ComponentRunner, RunnerConfig, Example, IngestError, Phase, Status };
use crate::fixtures ;

#[test]
fn ingest_failure_missing_example() {

	let dir = tempfile::tempdir().unwrap();
	let mut runner = fixtures::runner_for( &dir );

	match runner.load_example( Example::StringReverse ) {
		Err( IngestError::ExampleUnavailable { example: Example::StringReverse, .. }) => {}
		value => panic!( "Expected ExampleUnavailable error, found: {:#?}", value ),
	}
	assert_eq!( runner.phase(), Phase::Empty );
	assert_eq!( runner.status(), Status::LoadFailed );
	assert_logged!( runner, "Make sure the example file exists in the examples directory" );

}

#[test]
fn ingest_failure_keeps_previous_component() {

	let mut runner = ComponentRunner::new( RunnerConfig::default() );
	runner.load_bytes( fixtures::bytes( fixtures::ADD ), "add.wasm" ).unwrap();

	assert!( matches!( runner.load_bytes( Vec::new(), "empty.wasm" ), Err( IngestError::Empty( _ ))));
	assert!( matches!( runner.load_file( &fixtures::path( "missing.wat" )), Err( IngestError::Io { .. })));
	assert_eq!( runner.component().map(| component | component.filename() ), Some( "add.wasm" ));

	// Nothing was lost, so the pipeline carries on.
	runner.transpile().unwrap();
	assert_eq!( runner.exports().len(), 1 );

}

#[test]
fn ingest_failure_dropped_file_with_wrong_suffix() {

	let mut runner = ComponentRunner::new( RunnerConfig::default() );

	assert!( matches!( runner.load_dropped( &fixtures::path( fixtures::ADD )), Err( IngestError::UnsupportedFile( _ ))));
	assert_eq!( runner.status(), Status::NoComponent );
	assert_eq!( runner.phase(), Phase::Empty );

}
