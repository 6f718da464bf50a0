//! Raw component bytes and the ways they are ingested.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use thiserror::Error ;



/// Suffix accepted for dropped files.
pub const COMPONENT_SUFFIX: &str = ".wasm" ;

/// Errors raised while ingesting component bytes.
#[derive( Error, Debug )]
pub enum IngestError {
	/// The source yielded no bytes.
	#[error( "Component {0} is empty" )] Empty( String ),
	/// The file could not be read.
	#[error( "Failed to read {}: {source}", path.display() )] Io { path: PathBuf, source: std::io::Error },
	/// A dropped file without the `.wasm` suffix.
	#[error( "Unsupported file: {0} (expected a .wasm file)" )] UnsupportedFile( String ),
	/// A bundled example could not be fetched.
	#[error( "Failed to load example component {example}: {source}" )] ExampleUnavailable { example: Example, source: std::io::Error },
}

/// Component bytes with the name they were loaded under.
///
/// Immutable; a new load replaces it wholesale.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct RawComponent {
	bytes: Arc<[u8]>,
	filename: String,
}

impl RawComponent {

	/// Wraps `bytes`.
	///
	/// # Errors
	/// Fails with [`IngestError::Empty`] if `bytes` is empty.
	pub fn new( bytes: impl Into<Arc<[u8]>>, filename: impl Into<String> ) -> Result<Self, IngestError> {
		let bytes = bytes.into();
		let filename = filename.into();
		match bytes.is_empty() {
			true => Err( IngestError::Empty( filename )),
			false => Ok( Self { bytes, filename }),
		}
	}

	/// Reads a component picked from the filesystem.
	///
	/// # Errors
	/// Fails if the file can't be read or is empty.
	pub fn from_file( path: &Path ) -> Result<Self, IngestError> {
		let bytes = std::fs::read( path ).map_err(| source | IngestError::Io { path: path.to_path_buf(), source })?;
		Self::new( bytes, file_name( path ))
	}

	/// Reads a dropped file, accepting only `.wasm` files.
	///
	/// # Errors
	/// Fails with [`IngestError::UnsupportedFile`] for other suffixes, otherwise
	/// as [`RawComponent::from_file`].
	pub fn from_dropped_file( path: &Path ) -> Result<Self, IngestError> {
		let name = file_name( path );
		match name.ends_with( COMPONENT_SUFFIX ) {
			true => Self::from_file( path ),
			false => Err( IngestError::UnsupportedFile( name )),
		}
	}

	/// Fetches a bundled example from `examples_dir`.
	///
	/// # Errors
	/// Fails with [`IngestError::ExampleUnavailable`] if the file is missing or
	/// unreadable.
	pub fn from_example( example: Example, examples_dir: &Path ) -> Result<Self, IngestError> {
		let bytes = std::fs::read( examples_dir.join( example.file_name() ))
			.map_err(| source | IngestError::ExampleUnavailable { example, source })?;
		Self::new( bytes, example.file_name() )
	}

	#[inline] pub fn bytes( &self ) -> &[u8] { &self.bytes }
	#[inline] pub fn filename( &self ) -> &str { &self.filename }
	#[inline] pub fn len( &self ) -> usize { self.bytes.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.bytes.is_empty() }

	/// Size in KiB, as shown in load messages.
	#[allow( clippy::cast_precision_loss )]
	pub fn size_kib( &self ) -> f64 { self.bytes.len() as f64 / 1024.0 }

}

fn file_name( path: &Path ) -> String {
	path.file_name()
		.map_or_else(|| path.display().to_string(), | name | name.to_string_lossy().into_owned() )
}

/// The example components bundled with the runner.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum Example {
	/// Reverses a string.
	StringReverse,
	/// Adds two integers.
	Add,
}

impl Example {

	pub const ALL: [Example; 2] = [ Self::StringReverse, Self::Add ];

	/// Fixed file name under the examples directory.
	pub fn file_name( self ) -> &'static str { match self {
		Self::StringReverse => "string-reverse.wasm",
		Self::Add => "add.wasm",
	}}

}

impl std::fmt::Display for Example {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { f.write_str( self.file_name() )}
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn empty_bytes_are_rejected() {
		assert!( matches!( RawComponent::new( Vec::new(), "empty.wasm" ), Err( IngestError::Empty( name )) if name == "empty.wasm" ));
	}

	#[test]
	fn dropped_files_need_the_wasm_suffix() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join( "notes.txt" );
		std::fs::write( &path, b"not a component" ).unwrap();
		assert!( matches!( RawComponent::from_dropped_file( &path ), Err( IngestError::UnsupportedFile( _ ))));

		let path = dir.path().join( "thing.wasm" );
		std::fs::write( &path, b"\0asm" ).unwrap();
		let component = RawComponent::from_dropped_file( &path ).unwrap();
		assert_eq!( component.filename(), "thing.wasm" );
		assert_eq!( component.len(), 4 );
	}

	#[test]
	fn missing_examples_are_reported() {
		let dir = tempfile::tempdir().unwrap();
		let result = RawComponent::from_example( Example::Add, dir.path() );
		assert!( matches!( result, Err( IngestError::ExampleUnavailable { example: Example::Add, .. })));
	}

	#[test]
	fn unreadable_files_are_reported() {
		let result = RawComponent::from_file( Path::new( "/definitely/not/here.wasm" ));
		assert!( matches!( result, Err( IngestError::Io { .. })));
	}

}
