include!( "test_utils/fixtures.rs" );
include!( "test_utils/assert_logged.rs" );

#[path = "pipeline_error"] mod pipeline_error {
	mod missing_entry_point ;
	mod invalid_component ;
	mod ingest_failure ;
	mod handle_revocation ;
	mod memory_limit ;
	mod clear_log ;
}
