include!( "test_utils/fixtures.rs" );
include!( "test_utils/assert_logged.rs" );

#[path = "end_to_end"] mod end_to_end {
	mod add_component ;
	mod string_reverse ;
	mod entry_point ;
	mod bundled_examples ;
	mod invocation_errors ;
	mod command_line ;
}
