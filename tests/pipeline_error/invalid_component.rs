use component_runner::{ ComponentRunner, RunnerConfig, Phase, PipelineError, TranspileError, Status, LogLevel };

#[test]
fn pipeline_error_invalid_component() {

	let mut runner = ComponentRunner::new( RunnerConfig::default() );
	runner.load_bytes( b"definitely not a component".to_vec(), "garbage.wasm" ).unwrap();

	match runner.transpile() {
		Err( PipelineError::Transpile( TranspileError::InvalidComponent( _ ))) => {}
		value => panic!( "Expected InvalidComponent error, found: {:#?}", value ),
	}
	assert_eq!( runner.phase(), Phase::Loaded );
	assert_eq!( runner.status(), Status::TranspilationFailed );
	assert_logged!( runner, "Transpilation failed: Invalid WebAssembly component" );

}

#[test]
fn pipeline_error_unknown_binary_version_gets_a_hint() {

	let mut runner = ComponentRunner::new( RunnerConfig::default() );
	runner.load_bytes( b"\0asm\xff\x00\x00\x00".to_vec(), "future.wasm" ).unwrap();

	assert!( matches!( runner.transpile(), Err( PipelineError::Transpile( TranspileError::InvalidComponent( _ )))));
	let hint = runner.log().entries().iter()
		.find(| entry | entry.message() == "Make sure the file is a valid WebAssembly component" )
		.unwrap_or_else(|| panic!( "Expected a hint, found: {:#?}", runner.log().entries() ));
	assert_eq!( hint.level(), LogLevel::Error );

}

#[test]
fn pipeline_error_core_module_is_not_a_component() {

	let mut runner = ComponentRunner::new( RunnerConfig::default() );
	runner.load_bytes( b"(module (func (export \"f\")))".to_vec(), "core.wasm" ).unwrap();

	assert!( matches!( runner.transpile(), Err( PipelineError::Transpile( TranspileError::InvalidComponent( _ )))));
	assert_eq!( runner.phase(), Phase::Loaded );

}

#[test]
fn pipeline_error_nothing_loaded() {

	let mut runner = ComponentRunner::new( RunnerConfig::default() );
	assert!( matches!( runner.transpile(), Err( PipelineError::NoComponent )));
	assert_eq!( runner.phase(), Phase::Empty );
	assert_eq!( runner.status(), Status::NoComponent );

}
