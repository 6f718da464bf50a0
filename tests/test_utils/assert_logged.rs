#[macro_export]
macro_rules! assert_logged {
	( $runner:expr, $needle:expr ) => {
		if !$runner.log().contains( $needle ) {
			panic!( "Expected a log entry containing {:?}, found: {:#?}", $needle, $runner.log().entries() )
		}
	};
}
