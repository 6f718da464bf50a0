//! Runner configuration.

use std::path::{ Path, PathBuf };
use serde::Deserialize ;
use thiserror::Error ;



#[derive( Error, Debug )]
pub enum ConfigError {
	#[error( "IO error: {0}" )] Io( #[from] std::io::Error ),
	#[error( "TOML parse error: {0}" )] Toml( #[from] toml::de::Error ),
}

/// Settings for a [`ComponentRunner`]( crate::ComponentRunner ).
///
/// Transpiler options are not configurable; every run uses
/// [`TranspileOptions::default`]( crate::TranspileOptions ).
///
/// ```toml
/// examples_dir = "public"
/// max_memory_bytes = 67108864
/// ```
#[derive( Debug, Clone, PartialEq, Eq, Deserialize )]
#[serde( default, deny_unknown_fields )]
pub struct RunnerConfig {
	/// Directory the bundled examples are fetched from.
	pub examples_dir: PathBuf,
	/// Linear memory cap per component instance.
	pub max_memory_bytes: Option<usize>,
}

impl Default for RunnerConfig {
	fn default() -> Self {
		Self {
			examples_dir: PathBuf::from( "public" ),
			max_memory_bytes: None,
		}
	}
}

impl RunnerConfig {

	/// Parses a TOML document. Missing keys keep their defaults.
	///
	/// # Errors
	/// Fails on malformed TOML or mistyped keys.
	pub fn from_toml( text: &str ) -> Result<Self, ConfigError> {
		Ok( toml::from_str( text )? )
	}

	/// Reads and parses a TOML file.
	///
	/// # Errors
	/// Fails if the file can't be read or parsed.
	pub fn load( path: &Path ) -> Result<Self, ConfigError> {
		Self::from_toml( &std::fs::read_to_string( path )? )
	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn missing_keys_keep_defaults() {
		let config = RunnerConfig::from_toml( "max_memory_bytes = 1048576\n" ).unwrap();
		assert_eq!( config.max_memory_bytes, Some( 1_048_576 ));
		assert_eq!( config.examples_dir, PathBuf::from( "public" ));
	}

	#[test]
	fn transpile_options_cannot_be_overridden() {
		assert!( matches!( RunnerConfig::from_toml( "[transpile]\nname = \"app\"\n" ), Err( ConfigError::Toml( _ ))));
	}

	#[test]
	fn mistyped_keys_are_rejected() {
		assert!( matches!( RunnerConfig::from_toml( "examples_dir = 3\n" ), Err( ConfigError::Toml( _ ))));
	}

}
