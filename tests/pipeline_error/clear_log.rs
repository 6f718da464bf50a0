use component_runner::{ ActivityLog, LogLevel };
use crate::fixtures ;

#[test]
fn clear_log_after_failures() {

	let mut runner = fixtures::transpiled( fixtures::ADD );
	let _ = runner.call( "missing", "" );
	assert!( runner.log().len() > 1 );

	runner.clear_log();

	assert_eq!( runner.log().len(), 1 );
	let entry = &runner.log().entries()[0];
	assert_eq!( entry.message(), ActivityLog::CLEARED );
	assert_eq!( entry.level(), LogLevel::Info );

	// Clearing touches nothing but the log.
	assert!( runner.call( "add", "[1, 2]" ).is_success() );

}
