use component_runner::{ ComponentRunner, RunnerConfig, LoadError, Phase, PipelineError };
use crate::fixtures ;

#[test]
fn memory_limit_rejects_large_instances() {

	let config = RunnerConfig { max_memory_bytes: Some( 1024 ), ..RunnerConfig::default() };
	let mut runner = ComponentRunner::new( config );
	runner.load_bytes( fixtures::bytes( fixtures::STRING_REVERSE ), "string-reverse.wasm" ).unwrap();

	match runner.transpile() {
		Err( PipelineError::Load( LoadError::Instantiation { filename, .. })) => assert_eq!( filename, "component.core.wasm" ),
		value => panic!( "Expected Instantiation error, found: {:#?}", value ),
	}
	assert_eq!( runner.phase(), Phase::Loaded );
	assert!( runner.resources().is_empty() );

}

#[test]
fn memory_limit_allows_small_instances() {

	let config = RunnerConfig { max_memory_bytes: Some( 1024 ), ..RunnerConfig::default() };
	let mut runner = ComponentRunner::new( config );
	runner.load_bytes( fixtures::bytes( fixtures::ADD ), "add.wasm" ).unwrap();

	assert_eq!( runner.transpile().unwrap(), 1 );

}
