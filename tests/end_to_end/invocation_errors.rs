use component_runner::Phase ;
use crate::fixtures ;

#[test]
fn invocation_error_runtime_exception() {

	let mut runner = fixtures::transpiled( fixtures::FAILING );

	let result = runner.call( "trap", "" );
	assert!( !result.is_success() );
	assert_logged!( runner, "Error calling trap" );

	// A trapped instance doesn't take the pipeline down with it.
	assert_eq!( runner.phase(), Phase::Runnable );

}

#[test]
fn invocation_error_err_result_raises() {

	let mut runner = fixtures::transpiled( fixtures::FAILING );

	let result = runner.call( "checked", "" );
	assert_eq!( result.message(), Some( "7" ));
	assert_eq!( result.to_string(), "Error: 7" );

}

#[test]
fn invocation_error_argument_mismatch() {

	let mut runner = fixtures::transpiled( fixtures::ADD );

	let result = runner.call( "add", "[1]" );
	assert!( !result.is_success() );
	let result = runner.call( "add", r#"["one", "two"]"# );
	assert!( !result.is_success() );
	let result = runner.call( "add", "[4294967296, 1]" );
	assert!( !result.is_success() );

	// Failures leave the export callable.
	assert!( runner.call( "add", "[1, 1]" ).is_success() );

}

#[test]
fn invocation_error_unknown_export() {

	let mut runner = fixtures::transpiled( fixtures::ADD );
	assert_eq!( runner.call( "subtract", "[1, 1]" ).message(), Some( "Function not found: subtract" ));

}
