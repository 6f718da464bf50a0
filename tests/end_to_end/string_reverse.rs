use serde_json::json ;
use crate::fixtures ;

#[test]
fn end_to_end_string_reverse() {

	let mut runner = fixtures::transpiled( fixtures::STRING_REVERSE );

	assert_eq!( runner.exports().len(), 1 );
	let descriptor = &runner.exports()[0];
	assert_eq!( descriptor.display_name(), "reverse" );
	assert_eq!( descriptor.path(), "example:string-reverse/reverse@0.1.0.reverse" );

	let result = runner.call( "reverse", r#"["hello world"]"# );
	assert_eq!( result.value(), Some( &json!( "dlrow olleh" )));

}

#[test]
fn end_to_end_string_reverse_accepts_bare_text() {

	let mut runner = fixtures::transpiled( fixtures::STRING_REVERSE );

	// Not JSON, so the whole text is one string argument.
	let result = runner.call( "reverse", "stressed" );
	assert_eq!( result.value(), Some( &json!( "desserts" )));

	let result = runner.call( "reverse", r#""""# );
	assert_eq!( result.value(), Some( &json!( "" )));

}
