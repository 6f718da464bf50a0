//! The value model loaded modules are expressed in.
//!
//! A loaded module is an arbitrary graph of namespaces, some of whose members
//! are callable. Instead of inspecting runtime types ad hoc, every member is
//! classified into the closed set of [`Value`] variants up front, so consumers
//! such as the [export walker]( crate::walk_exports ) only ever match on those.

use std::sync::{ Arc, PoisonError, RwLock };
use serde_json::Value as JsonValue ;

use crate::invoke::InvocationError ;



/// Something that can be invoked with JSON arguments.
pub trait Callable: Send + Sync {

	/// Calls the target with positional arguments.
	///
	/// # Errors
	/// Returns an [`InvocationError`] if the arguments don't fit the target or
	/// the target itself fails.
	fn call( &self, args: &[JsonValue] ) -> Result<JsonValue, InvocationError> ;

	/// Number of parameters, when the target declares it.
	fn arity( &self ) -> Option<usize> { None }

}

impl<F> Callable for F
where
	F: Fn( &[JsonValue] ) -> Result<JsonValue, InvocationError> + Send + Sync,
{
	fn call( &self, args: &[JsonValue] ) -> Result<JsonValue, InvocationError> { self( args ) }
}

/// A classified member of a loaded module.
#[derive( Clone )]
pub enum Value {
	/// An invocable member.
	Callable( Arc<dyn Callable> ),
	/// A nested namespace of further members.
	Namespace( Namespace ),
	/// A sequence. Treated as data: its elements are never searched for callables.
	List( Vec<Value> ),
	/// Plain data.
	Opaque( JsonValue ),
}

impl Value {

	/// Wraps a closure as a callable value.
	pub fn function(
		function: impl Fn( &[JsonValue] ) -> Result<JsonValue, InvocationError> + Send + Sync + 'static,
	) -> Self {
		Self::Callable( Arc::new( function ))
	}

	pub fn as_namespace( &self ) -> Option<&Namespace> { match self {
		Self::Namespace( namespace ) => Some( namespace ),
		_ => None,
	}}

	pub fn as_callable( &self ) -> Option<&Arc<dyn Callable>> { match self {
		Self::Callable( callable ) => Some( callable ),
		_ => None,
	}}

}

impl std::fmt::Debug for Value {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { match self {
		Self::Callable( _ ) => f.write_str( "Callable(<function>)" ),
		Self::Namespace( namespace ) => f.debug_tuple( "Namespace" ).field( &namespace.keys() ).finish(),
		Self::List( items ) => f.debug_tuple( "List" ).field( items ).finish(),
		Self::Opaque( value ) => f.debug_tuple( "Opaque" ).field( value ).finish(),
	}}
}

/// Reads a member's value on demand; may fail.
pub type Accessor = Arc<dyn Fn() -> Result<Value, String> + Send + Sync> ;

/// How a namespace stores one of its members.
#[derive( Clone )]
pub enum Member {
	/// A plain stored value.
	Value( Value ),
	/// A computed member whose access can fail.
	Accessor( Accessor ),
}

impl Member {

	/// Reads the member.
	///
	/// # Errors
	/// Returns the accessor's failure message.
	pub fn get( &self ) -> Result<Value, String> { match self {
		Self::Value( value ) => Ok( value.clone() ),
		Self::Accessor( accessor ) => accessor(),
	}}

}

struct NamespaceInner {
	members: RwLock<Vec<( String, Member )>>,
	prototype: Option<Namespace>,
}

/// A shared, ordered collection of named members.
///
/// Cloning yields another handle to the same namespace; identity is preserved,
/// which lets graphs contain cycles. Members keep insertion order. A namespace
/// may inherit from a prototype whose members are visible through
/// [`Namespace::get`] but are not its own.
#[derive( Clone )]
pub struct Namespace( Arc<NamespaceInner> );

impl Namespace {

	pub fn new() -> Self { Self::build( None )}

	/// Creates a namespace inheriting from `prototype`.
	pub fn with_prototype( prototype: Namespace ) -> Self { Self::build( Some( prototype ))}

	fn build( prototype: Option<Namespace> ) -> Self {
		Self( Arc::new( NamespaceInner { members: RwLock::new( Vec::new() ), prototype }))
	}

	/// Sets an own member, replacing any previous member under the same key in place.
	pub fn insert( &self, key: impl Into<String>, value: Value ) {
		self.insert_member( key.into(), Member::Value( value ));
	}

	/// Sets an own member computed on access.
	pub fn insert_accessor(
		&self,
		key: impl Into<String>,
		accessor: impl Fn() -> Result<Value, String> + Send + Sync + 'static,
	) {
		self.insert_member( key.into(), Member::Accessor( Arc::new( accessor )));
	}

	fn insert_member( &self, key: String, member: Member ) {
		let mut members = self.0.members.write().unwrap_or_else( PoisonError::into_inner );
		match members.iter_mut().find(|( existing, _ )| *existing == key ) {
			Some(( _, slot )) => *slot = member,
			None => members.push(( key, member )),
		}
	}

	/// Snapshot of the own members in declaration order.
	pub fn own_members( &self ) -> Vec<( String, Member )> {
		self.0.members.read().unwrap_or_else( PoisonError::into_inner ).clone()
	}

	/// Own member keys in declaration order.
	pub fn keys( &self ) -> Vec<String> {
		self.0.members.read().unwrap_or_else( PoisonError::into_inner )
			.iter()
			.map(|( key, _ )| key.clone() )
			.collect()
	}

	pub fn is_empty( &self ) -> bool {
		self.0.members.read().unwrap_or_else( PoisonError::into_inner ).is_empty()
	}

	/// Returns `true` if `key` is an own member.
	pub fn has_own( &self, key: &str ) -> bool {
		self.0.members.read().unwrap_or_else( PoisonError::into_inner )
			.iter()
			.any(|( existing, _ )| existing == key )
	}

	/// Looks up a member, own first, then along the prototype chain.
	pub fn get( &self, key: &str ) -> Option<Result<Value, String>> {
		let own = self.0.members.read().unwrap_or_else( PoisonError::into_inner )
			.iter()
			.find(|( existing, _ )| existing == key )
			.map(|( _, member )| member.clone() );
		match own {
			Some( member ) => Some( member.get() ),
			None => self.0.prototype.as_ref().and_then(| prototype | prototype.get( key )),
		}
	}

	pub fn prototype( &self ) -> Option<&Namespace> { self.0.prototype.as_ref() }

	/// Identity of the underlying namespace, stable for its lifetime.
	pub fn id( &self ) -> usize { Arc::as_ptr( &self.0 ) as usize }

	pub fn ptr_eq( &self, other: &Namespace ) -> bool { Arc::ptr_eq( &self.0, &other.0 ) }

}

impl Default for Namespace {
	fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for Namespace {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Namespace" )
			.field( "keys", &self.keys() )
			.field( "prototype", &self.0.prototype.as_ref().map(| _ | "<namespace>" ))
			.finish()
	}
}

#[cfg( test )]
mod tests {

	use super::* ;
	use serde_json::json ;

	#[test]
	fn insert_replaces_in_place() {
		let namespace = Namespace::new();
		namespace.insert( "a", Value::Opaque( json!( 1 )));
		namespace.insert( "b", Value::Opaque( json!( 2 )));
		namespace.insert( "a", Value::Opaque( json!( 3 )));
		assert_eq!( namespace.keys(), vec![ "a", "b" ]);
		assert!( matches!( namespace.get( "a" ), Some( Ok( Value::Opaque( v ))) if v == json!( 3 )));
	}

	#[test]
	fn prototype_members_are_visible_but_not_own() {
		let prototype = Namespace::new();
		prototype.insert( "inherited", Value::Opaque( json!( true )));
		let namespace = Namespace::with_prototype( prototype );
		assert!( !namespace.has_own( "inherited" ));
		assert!( namespace.get( "inherited" ).is_some() );
		assert!( namespace.is_empty() );
	}

	#[test]
	fn clones_share_identity() {
		let namespace = Namespace::new();
		let alias = namespace.clone();
		alias.insert( "x", Value::Opaque( JsonValue::Null ));
		assert!( namespace.ptr_eq( &alias ));
		assert_eq!( namespace.id(), alias.id() );
		assert!( namespace.has_own( "x" ));
		assert!( !namespace.ptr_eq( &Namespace::new() ));
	}

}
