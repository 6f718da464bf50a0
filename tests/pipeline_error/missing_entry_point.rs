use component_runner::{
	ComponentRunner, RunnerConfig, Phase, PipelineError, Status,
	Transpiler, Transpiled, TranspileError, TranspileOptions, WasmtimeTranspiler,
};
use crate::fixtures ;

/// Drops the entry point from the first run only.
struct FlakyTranspiler {
	inner: WasmtimeTranspiler,
	failed: std::cell::Cell<bool>,
}

impl Transpiler for FlakyTranspiler {
	fn transpile( &self, bytes: &[u8], options: &TranspileOptions ) -> Result<Transpiled, TranspileError> {
		let mut transpiled = self.inner.transpile( bytes, options )?;
		if !self.failed.replace( true ) {
			transpiled.files = transpiled.files.filenames()
				.filter(| name | *name != "component.js" )
				.map(| name | ( name.to_string(), transpiled.files.get( name ).unwrap_or_default().to_vec() ))
				.collect();
		}
		Ok( transpiled )
	}
}

#[test]
fn pipeline_error_missing_entry_point() {

	let transpiler = FlakyTranspiler {
		inner: WasmtimeTranspiler::new( component_runner::Engine::default() ),
		failed: std::cell::Cell::new( false ),
	};
	let mut runner = ComponentRunner::with_transpiler( RunnerConfig::default(), transpiler );
	runner.load_bytes( fixtures::bytes( fixtures::ADD ), "add.wasm" ).unwrap();

	match runner.transpile() {
		Err( PipelineError::Transpile( TranspileError::MissingEntryPoint( name ))) => assert_eq!( name, "component.js" ),
		value => panic!( "Expected MissingEntryPoint error, found: {:#?}", value ),
	}
	assert_eq!( runner.phase(), Phase::Loaded );
	assert_eq!( runner.status(), Status::TranspilationFailed );
	assert!( runner.resources().is_empty() );
	assert!( runner.controls().transpile );
	assert_logged!( runner, "Transpilation failed: No loadable module was produced: missing component.js" );

	// The component survived, so a retry goes through.
	assert_eq!( runner.transpile().unwrap(), 1 );
	assert_eq!( runner.phase(), Phase::Runnable );

}
