use component_runner::ResourceHandle ;
use crate::fixtures ;

#[test]
fn handle_revocation_on_retranspile() {

	let mut runner = fixtures::transpiled( fixtures::ADD );
	let first = runner.state().runnable().expect( "Expected a runnable state" ).handles().to_vec();
	assert_eq!( first.len(), 1 );
	assert!( first.iter().all(| handle | ResourceHandle::is_handle_locator( handle.as_str() )));

	runner.transpile().unwrap();
	let second = runner.state().runnable().expect( "Expected a runnable state" ).handles().to_vec();

	assert_eq!( runner.resources().len(), 1 );
	assert!( first.iter().all(| handle | runner.resources().resolve( handle.as_str() ).is_none() ));
	assert!( second.iter().all(| handle | runner.resources().resolve( handle.as_str() ).is_some() ));
	assert_ne!( first, second );

}

#[test]
fn handle_revocation_on_new_component() {

	let mut runner = fixtures::transpiled( fixtures::ADD );
	runner.load_bytes( fixtures::bytes( fixtures::STRING_REVERSE ), "string-reverse.wasm" ).unwrap();

	assert!( runner.resources().is_empty() );
	assert!( runner.exports().is_empty() );

}
