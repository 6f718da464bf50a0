use std::process::Command ;
use crate::fixtures ;

#[test]
fn command_line_prints_each_log_entry_once() {

	let output = Command::new( env!( "CARGO_BIN_EXE_component-runner" ))
		.args([ "call", "--file" ])
		.arg( fixtures::path( fixtures::FAILING ))
		.arg( "checked" )
		.env_remove( "RUST_LOG" )
		.output()
		.expect( "Failed to start component-runner" );

	assert!( !output.status.success() );
	let stdout = String::from_utf8_lossy( &output.stdout );
	let stderr = String::from_utf8_lossy( &output.stderr );
	assert_eq!( stdout.matches( "Error calling checked: 7" ).count(), 1, "stdout: {}", stdout );
	assert!( stderr.contains( "Error calling checked: 7" ), "stderr: {}", stderr );

}
