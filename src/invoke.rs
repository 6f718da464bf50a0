//! Turns free-form argument text into a call and normalizes the outcome.

use serde_json::Value as JsonValue ;
use thiserror::Error ;

use crate::walker::ExportDescriptor ;



/// Errors raised while invoking an export.
///
/// These never escape the bridge: [`invoke`] converts them into an
/// [`InvocationResult::Failure`].
#[derive( Error, Debug )]
pub enum InvocationError {
	/// No export is known under this name.
	#[error( "Function not found: {0}" )] UnknownExport( String ),
	/// The instance behind the export is already in use.
	#[error( "Lock Rejected" )] LockRejected,
	/// The export disappeared from its instance.
	#[error( "Invalid Function: {0}" )] InvalidFunction( String ),
	/// The argument count doesn't match the function signature.
	#[error( "Expected {expected} argument(s), found {found}" )] ArgumentCount { expected: usize, found: usize },
	/// An argument doesn't fit the parameter type.
	#[error( "Argument {index}: expected {expected}, found {found}" )] ArgumentType { index: usize, expected: String, found: String },
	/// A parameter or result type that can't be expressed as JSON.
	#[error( "Unsupported type: {0}" )] UnsupportedType( String ),
	/// The WASM function trapped during execution.
	#[error( "Runtime Exception: {0}" )] RuntimeException( wasmtime::Error ),
	/// The target reported an error value.
	#[error( "{0}" )] Raised( String ),
}

/// Outcome of one call, shown once and not retained.
#[derive( Debug, Clone, PartialEq )]
pub enum InvocationResult {
	Success { value: JsonValue },
	Failure { message: String },
}

impl InvocationResult {

	#[inline] pub fn is_success( &self ) -> bool { matches!( self, Self::Success { .. })}

	pub fn value( &self ) -> Option<&JsonValue> { match self {
		Self::Success { value } => Some( value ),
		Self::Failure { .. } => None,
	}}

	pub fn message( &self ) -> Option<&str> { match self {
		Self::Success { .. } => None,
		Self::Failure { message } => Some( message ),
	}}

}

impl std::fmt::Display for InvocationResult {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { match self {
		Self::Success { value } => write!( f, "Result: {}", value ),
		Self::Failure { message } => write!( f, "Error: {}", message ),
	}}
}

impl From<Result<JsonValue, InvocationError>> for InvocationResult {
	fn from( result: Result<JsonValue, InvocationError> ) -> Self { match result {
		Ok( value ) => Self::Success { value },
		Err( err ) => Self::Failure { message: err.to_string() },
	}}
}

/// Interprets argument text as a positional argument list.
///
/// - blank text means no arguments
/// - a JSON array supplies one argument per element
/// - any other JSON value is a single argument
/// - text that isn't JSON is passed through as a single string argument
pub fn parse_arguments( text: &str ) -> Vec<JsonValue> {
	if text.trim().is_empty() { return Vec::new() }
	match serde_json::from_str::<JsonValue>( text ) {
		Ok( JsonValue::Array( items )) => items,
		Ok( value ) => vec![ value ],
		Err( _ ) => vec![ JsonValue::String( text.to_string() )],
	}
}

/// Calls `descriptor` with arguments parsed from `text`.
pub fn invoke( descriptor: &ExportDescriptor, text: &str ) -> InvocationResult {
	invoke_with( descriptor, &parse_arguments( text ))
}

/// Calls `descriptor` with already parsed arguments.
pub fn invoke_with( descriptor: &ExportDescriptor, args: &[JsonValue] ) -> InvocationResult {
	descriptor.invoke().call( args ).into()
}

/// Renders arguments the way calls are logged: `5, 3` or `"hello"`.
pub fn format_arguments( args: &[JsonValue] ) -> String {
	args.iter().map( JsonValue::to_string ).collect::<Vec<_>>().join( ", " )
}

#[cfg( test )]
mod tests {

	use std::sync::{ Arc, Mutex };
	use serde_json::json ;

	use super::* ;
	use crate::value::Value ;

	fn recording() -> ( ExportDescriptor, Arc<Mutex<Vec<Vec<JsonValue>>>> ) {
		let calls = Arc::new( Mutex::new( Vec::new() ));
		let recorded = Arc::clone( &calls );
		let value = Value::function( move | args: &[JsonValue] | {
			recorded.lock().unwrap().push( args.to_vec() );
			Ok( json!( args.len() ))
		});
		let Value::Callable( callable ) = value else { unreachable!() };
		( ExportDescriptor::new( "probe", "probe", callable ), calls )
	}

	#[test]
	fn blank_text_calls_without_arguments() {
		let ( descriptor, calls ) = recording();
		assert_eq!( invoke( &descriptor, "" ), InvocationResult::Success { value: json!( 0 ) });
		assert_eq!( invoke( &descriptor, "   \t" ), InvocationResult::Success { value: json!( 0 ) });
		assert!( calls.lock().unwrap().iter().all( Vec::is_empty ));
	}

	#[test]
	fn json_array_spreads_into_positional_arguments() {
		let ( descriptor, calls ) = recording();
		invoke( &descriptor, "[5, 3]" );
		assert_eq!( calls.lock().unwrap()[0], vec![ json!( 5 ), json!( 3 )]);
	}

	#[test]
	fn json_scalar_is_a_single_argument() {
		let ( descriptor, calls ) = recording();
		invoke( &descriptor, "{\"a\": 1}" );
		invoke( &descriptor, "\"quoted\"" );
		let calls = calls.lock().unwrap();
		assert_eq!( calls[0], vec![ json!({ "a": 1 })]);
		assert_eq!( calls[1], vec![ json!( "quoted" )]);
	}

	#[test]
	fn unparsable_text_becomes_a_string_argument() {
		let ( descriptor, calls ) = recording();
		assert!( invoke( &descriptor, "hello" ).is_success() );
		assert_eq!( calls.lock().unwrap()[0], vec![ json!( "hello" )]);
	}

	#[test]
	fn failures_are_reported_not_raised() {
		let Value::Callable( callable ) = Value::function(| _: &[JsonValue] | Err( InvocationError::Raised( "boom".into() ))) else { unreachable!() };
		let descriptor = ExportDescriptor::new( "explode", "explode", callable );
		let result = invoke( &descriptor, "[]" );
		assert_eq!( result.message(), Some( "boom" ));
		assert_eq!( result.to_string(), "Error: boom" );
	}

	#[test]
	fn success_renders_as_json() {
		assert_eq!( InvocationResult::Success { value: json!( "dlrow olleh" ) }.to_string(), "Result: \"dlrow olleh\"" );
		assert_eq!( format_arguments( &[ json!( 5 ), json!( 3 )]), "5, 3" );
	}

}
