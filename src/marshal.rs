//! Conversion between JSON and component model values.
//!
//! Arguments arrive as JSON and are shaped by the parameter types declared by
//! the component. Conventions follow the ones JavaScript bindings use:
//! variants and results are `{ "tag": ..., "val": ... }` objects, enums are
//! strings, `option` is the payload or `null`, flags are a list of set names.

use serde_json::{ Map, Number, Value as JsonValue };
use wasmtime::component::{ Type, Val };

use crate::invoke::InvocationError ;



/// Converts the JSON `value` for parameter `index` into a [`Val`] of type `ty`.
pub(crate) fn to_val( index: usize, value: &JsonValue, ty: &Type ) -> Result<Val, InvocationError> {

	let mismatch = | expected: &str | InvocationError::ArgumentType {
		index,
		expected: expected.to_string(),
		found: describe( value ).to_string(),
	};

	Ok( match ty {
		Type::Bool => Val::Bool( value.as_bool().ok_or_else(|| mismatch( "bool" ))? ),
		Type::S8 => Val::S8( signed( value ).and_then(| n | i8::try_from( n ).ok() ).ok_or_else(|| mismatch( "s8" ))? ),
		Type::S16 => Val::S16( signed( value ).and_then(| n | i16::try_from( n ).ok() ).ok_or_else(|| mismatch( "s16" ))? ),
		Type::S32 => Val::S32( signed( value ).and_then(| n | i32::try_from( n ).ok() ).ok_or_else(|| mismatch( "s32" ))? ),
		Type::S64 => Val::S64( signed( value ).ok_or_else(|| mismatch( "s64" ))? ),
		Type::U8 => Val::U8( unsigned( value ).and_then(| n | u8::try_from( n ).ok() ).ok_or_else(|| mismatch( "u8" ))? ),
		Type::U16 => Val::U16( unsigned( value ).and_then(| n | u16::try_from( n ).ok() ).ok_or_else(|| mismatch( "u16" ))? ),
		Type::U32 => Val::U32( unsigned( value ).and_then(| n | u32::try_from( n ).ok() ).ok_or_else(|| mismatch( "u32" ))? ),
		Type::U64 => Val::U64( unsigned( value ).ok_or_else(|| mismatch( "u64" ))? ),
		#[allow( clippy::cast_possible_truncation )]
		Type::Float32 => Val::Float32( value.as_f64().ok_or_else(|| mismatch( "f32" ))? as f32 ),
		Type::Float64 => Val::Float64( value.as_f64().ok_or_else(|| mismatch( "f64" ))? ),
		Type::Char => {
			let text = value.as_str().ok_or_else(|| mismatch( "char" ))?;
			let mut chars = text.chars();
			match ( chars.next(), chars.next() ) {
				( Some( c ), None ) => Val::Char( c ),
				_ => return Err( mismatch( "char" )),
			}
		}
		Type::String => Val::String( value.as_str().ok_or_else(|| mismatch( "string" ))?.to_string() ),
		Type::List( list ) => {
			let items = value.as_array().ok_or_else(|| mismatch( "list" ))?;
			let item_type = list.ty();
			Val::List( items.iter().map(| item | to_val( index, item, &item_type )).collect::<Result<_,_>>()? )
		}
		Type::Record( record ) => {
			let object = value.as_object().ok_or_else(|| mismatch( "record" ))?;
			Val::Record( record.fields()
				.map(| field | {
					let field_value = object.get( field.name ).unwrap_or( &JsonValue::Null );
					Ok(( field.name.to_string(), to_val( index, field_value, &field.ty )? ))
				})
				.collect::<Result<_, InvocationError>>()? )
		}
		Type::Tuple( tuple ) => {
			let items = value.as_array().ok_or_else(|| mismatch( "tuple" ))?;
			if items.len() != tuple.types().len() { return Err( mismatch( "tuple" )) }
			Val::Tuple( items.iter().zip( tuple.types() )
				.map(|( item, item_type )| to_val( index, item, &item_type ))
				.collect::<Result<_,_>>()? )
		}
		Type::Variant( variant ) => {
			let ( tag, payload ) = tagged( value ).ok_or_else(|| mismatch( "variant" ))?;
			let case = variant.cases().find(| case | case.name == tag ).ok_or_else(|| mismatch( "variant" ))?;
			let payload = match ( case.ty, payload ) {
				( Some( payload_type ), Some( payload )) => Some( Box::new( to_val( index, payload, &payload_type )? )),
				( None, _ ) => None,
				( Some( _ ), None ) => return Err( mismatch( "variant payload" )),
			};
			Val::Variant( tag.to_string(), payload )
		}
		Type::Enum( enum_type ) => {
			let name = value.as_str().ok_or_else(|| mismatch( "enum" ))?;
			if !enum_type.names().any(| case | case == name ) { return Err( mismatch( "enum" )) }
			Val::Enum( name.to_string() )
		}
		Type::Option( option ) => match value {
			JsonValue::Null => Val::Option( None ),
			value => Val::Option( Some( Box::new( to_val( index, value, &option.ty() )? ))),
		},
		Type::Result( result ) => {
			let ( tag, payload ) = tagged( value ).ok_or_else(|| mismatch( "result" ))?;
			let convert = | payload_type: Option<Type> | -> Result<Option<Box<Val>>, InvocationError> {
				match ( payload_type, payload ) {
					( Some( payload_type ), Some( payload )) => Ok( Some( Box::new( to_val( index, payload, &payload_type )? ))),
					( None, _ ) => Ok( None ),
					( Some( _ ), None ) => Err( mismatch( "result payload" )),
				}
			};
			match tag {
				"ok" => Val::Result( Ok( convert( result.ok() )? )),
				"err" => Val::Result( Err( convert( result.err() )? )),
				_ => return Err( mismatch( "result" )),
			}
		}
		Type::Flags( flags ) => {
			let set = match value {
				JsonValue::Array( names ) => names.iter()
					.map(| name | name.as_str().map( str::to_string ).ok_or_else(|| mismatch( "flags" )))
					.collect::<Result<Vec<_>,_>>()?,
				JsonValue::Object( entries ) => entries.iter()
					.filter(|( _, enabled )| enabled.as_bool().unwrap_or( false ))
					.map(|( name, _ )| name.clone() )
					.collect(),
				_ => return Err( mismatch( "flags" )),
			};
			if let Some( unknown ) = set.iter().find(| name | !flags.names().any(| flag | flag == name.as_str() )) {
				return Err( mismatch( &format!( "flags (unknown flag {})", unknown )));
			}
			Val::Flags( set )
		}
		Type::Own( _ ) | Type::Borrow( _ ) => return Err( InvocationError::UnsupportedType( "resource".to_string() )),
		other => return Err( InvocationError::UnsupportedType( format!( "{:?}", other ))),
	})

}

/// Converts a returned [`Val`] into JSON.
pub(crate) fn from_val( val: Val ) -> Result<JsonValue, InvocationError> {
	Ok( match val {
		Val::Bool( b ) => JsonValue::Bool( b ),
		Val::S8( n ) => n.into(),
		Val::S16( n ) => n.into(),
		Val::S32( n ) => n.into(),
		Val::S64( n ) => n.into(),
		Val::U8( n ) => n.into(),
		Val::U16( n ) => n.into(),
		Val::U32( n ) => n.into(),
		Val::U64( n ) => n.into(),
		Val::Float32( n ) => float( f64::from( n )),
		Val::Float64( n ) => float( n ),
		Val::Char( c ) => JsonValue::String( c.to_string() ),
		Val::String( s ) => JsonValue::String( s ),
		Val::List( items ) | Val::Tuple( items ) => JsonValue::Array( items.into_iter().map( from_val ).collect::<Result<_,_>>()? ),
		Val::Record( fields ) => JsonValue::Object( fields.into_iter()
			.map(|( name, value )| Ok(( name, from_val( value )? )))
			.collect::<Result<Map<_,_>, InvocationError>>()? ),
		Val::Variant( tag, payload ) => tag_object( tag, payload )?,
		Val::Enum( name ) => JsonValue::String( name ),
		Val::Option( None ) => JsonValue::Null,
		Val::Option( Some( payload )) => from_val( *payload )?,
		Val::Result( Ok( payload )) => tag_object( "ok".to_string(), payload )?,
		Val::Result( Err( payload )) => tag_object( "err".to_string(), payload )?,
		Val::Flags( names ) => JsonValue::Array( names.into_iter().map( JsonValue::String ).collect() ),
		Val::Resource( _ ) => return Err( InvocationError::UnsupportedType( "resource".to_string() )),
		other => return Err( InvocationError::UnsupportedType( format!( "{:?}", other ))),
	})
}

fn tag_object( tag: String, payload: Option<Box<Val>> ) -> Result<JsonValue, InvocationError> {
	let mut object = Map::new();
	object.insert( "tag".to_string(), JsonValue::String( tag ));
	if let Some( payload ) = payload { object.insert( "val".to_string(), from_val( *payload )? ); }
	Ok( JsonValue::Object( object ))
}

/// Splits `{ "tag": t, "val": v }` (or a bare `"t"`) into its parts.
fn tagged( value: &JsonValue ) -> Option<( &str, Option<&JsonValue> )> {
	match value {
		JsonValue::String( tag ) => Some(( tag.as_str(), None )),
		JsonValue::Object( object ) => Some(( object.get( "tag" )?.as_str()?, object.get( "val" ))),
		_ => None,
	}
}

fn float( n: f64 ) -> JsonValue {
	Number::from_f64( n ).map_or( JsonValue::Null, JsonValue::Number )
}

fn signed( value: &JsonValue ) -> Option<i64> { value.as_i64() }

fn unsigned( value: &JsonValue ) -> Option<u64> { value.as_u64() }

fn describe( value: &JsonValue ) -> &'static str { match value {
	JsonValue::Null => "null",
	JsonValue::Bool( _ ) => "bool",
	JsonValue::Number( _ ) => "number",
	JsonValue::String( _ ) => "string",
	JsonValue::Array( _ ) => "array",
	JsonValue::Object( _ ) => "object",
}}

#[cfg( test )]
mod tests {

	use serde_json::json ;

	use super::* ;

	#[test]
	fn integers_respect_their_range() {
		assert!( matches!( to_val( 0, &json!( 5 ), &Type::S32 ), Ok( Val::S32( 5 ))));
		assert!( matches!( to_val( 0, &json!( 300 ), &Type::U8 ), Err( InvocationError::ArgumentType { .. })));
		assert!( matches!( to_val( 1, &json!( -1 ), &Type::U32 ), Err( InvocationError::ArgumentType { index: 1, .. })));
	}

	#[test]
	fn strings_and_chars() {
		assert!( matches!( to_val( 0, &json!( "hello world" ), &Type::String ), Ok( Val::String( s )) if s == "hello world" ));
		assert!( matches!( to_val( 0, &json!( "x" ), &Type::Char ), Ok( Val::Char( 'x' ))));
		assert!( to_val( 0, &json!( "xy" ), &Type::Char ).is_err() );
		assert!( to_val( 0, &json!( 1 ), &Type::String ).is_err() );
	}

	#[test]
	fn results_render_as_tagged_objects() {
		let ok = Val::Result( Ok( Some( Box::new( Val::U32( 8 )))));
		assert_eq!( from_val( ok ).unwrap(), json!({ "tag": "ok", "val": 8 }));
		let variant = Val::Variant( "empty".to_string(), None );
		assert_eq!( from_val( variant ).unwrap(), json!({ "tag": "empty" }));
	}

	#[test]
	fn composite_values_render_structurally() {
		let record = Val::Record( vec![
			( "name".to_string(), Val::String( "x".to_string() )),
			( "tags".to_string(), Val::List( vec![ Val::Enum( "a".to_string() )])),
			( "extra".to_string(), Val::Option( None )),
		]);
		assert_eq!( from_val( record ).unwrap(), json!({ "name": "x", "tags": [ "a" ], "extra": null }));
		assert_eq!( from_val( Val::Float64( f64::NAN )).unwrap(), JsonValue::Null );
	}

}
