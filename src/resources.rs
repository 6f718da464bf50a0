//! In-memory resource handles.
//!
//! A transpiled component ships its binary parts as separate files that the
//! entry point refers to by relative path. Since nothing is written to disk,
//! each binary file is registered in a [`ResourceTable`] and the entry point is
//! rewritten to reference the returned [`ResourceHandle`] instead.

use std::collections::HashMap ;
use std::sync::Arc ;
use uuid::Uuid ;



/// An opaque locator standing in for a resource file.
///
/// Renders as `blob:component-runner/<uuid>`. Handles are never reused, even
/// when two resources carry identical bytes.
#[derive( Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord )]
pub struct ResourceHandle( String );

impl ResourceHandle {

	/// Prefix shared by every handle locator.
	pub const SCHEME: &'static str = "blob:component-runner/" ;

	fn fresh() -> Self { Self( format!( "{}{}", Self::SCHEME, Uuid::new_v4() ))}

	/// The locator text substituted into rewritten source.
	#[inline] pub fn as_str( &self ) -> &str { &self.0 }

	/// Returns `true` if `locator` has the shape of a handle (live or not).
	#[inline] pub fn is_handle_locator( locator: &str ) -> bool { locator.starts_with( Self::SCHEME ) }

}

impl std::fmt::Display for ResourceHandle {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { f.write_str( &self.0 )}
}

/// A registered resource: the logical filename and its bytes.
#[derive( Debug, Clone )]
pub struct Resource {
	filename: String,
	bytes: Arc<[u8]>,
}

impl Resource {
	/// Logical filename the resource was generated under.
	#[inline] pub fn filename( &self ) -> &str { &self.filename }
	/// Resource contents.
	#[inline] pub fn bytes( &self ) -> &[u8] { &self.bytes }
}

/// Process-local table binding handles to in-memory buffers.
///
/// Owned by the [`ComponentRunner`]( crate::ComponentRunner ); nothing else
/// mutates it.
#[derive( Debug, Default )]
pub struct ResourceTable {
	entries: HashMap<ResourceHandle, Resource>,
}

impl ResourceTable {

	pub fn new() -> Self { Self::default() }

	/// Registers `bytes` under a fresh handle.
	pub fn create( &mut self, filename: impl Into<String>, bytes: impl Into<Arc<[u8]>> ) -> ResourceHandle {
		let handle = ResourceHandle::fresh();
		self.entries.insert( handle.clone(), Resource { filename: filename.into(), bytes: bytes.into() });
		handle
	}

	/// Looks up a live handle by its locator text.
	pub fn resolve( &self, locator: &str ) -> Option<&Resource> {
		self.entries.get( &ResourceHandle( locator.to_string() ))
	}

	/// Releases a handle. Returns `false` if it was not live.
	pub fn revoke( &mut self, handle: &ResourceHandle ) -> bool {
		self.entries.remove( handle ).is_some()
	}

	/// Releases every handle in `handles`, returning how many were live.
	pub fn revoke_all<'a>( &mut self, handles: impl IntoIterator<Item = &'a ResourceHandle> ) -> usize {
		handles.into_iter().filter(| handle | self.revoke( handle )).count()
	}

	/// Number of live handles.
	#[inline] pub fn len( &self ) -> usize { self.entries.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.entries.is_empty() }

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn identical_bytes_get_distinct_handles() {
		let mut table = ResourceTable::new();
		let first = table.create( "a.wasm", vec![ 0, 1, 2 ]);
		let second = table.create( "a.wasm", vec![ 0, 1, 2 ]);
		assert_ne!( first, second );
		assert_eq!( table.len(), 2 );
		assert!( ResourceHandle::is_handle_locator( first.as_str() ));
	}

	#[test]
	fn revoked_handles_no_longer_resolve() {
		let mut table = ResourceTable::new();
		let handle = table.create( "core.wasm", vec![ 42 ]);
		assert_eq!( table.resolve( handle.as_str() ).map( Resource::bytes ), Some( &[ 42u8 ][..] ));
		assert!( table.revoke( &handle ));
		assert!( table.resolve( handle.as_str() ).is_none() );
		assert!( !table.revoke( &handle ));
	}

}
