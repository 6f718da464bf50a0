mod fixtures {

	use std::path::PathBuf ;
	use component_runner::{ ComponentRunner, Example, RunnerConfig };

	pub const ADD: &str = "add.wat" ;
	pub const STRING_REVERSE: &str = "string-reverse.wat" ;
	pub const ENTRY_POINTS: &str = "entry-points.wat" ;
	pub const FAILING: &str = "failing.wat" ;

	pub fn path( name: &str ) -> PathBuf {
		PathBuf::from( env!( "CARGO_MANIFEST_DIR" )).join( "tests" ).join( "fixtures" ).join( name )
	}

	pub fn bytes( name: &str ) -> Vec<u8> {
		std::fs::read( path( name )).unwrap_or_else(| err | panic!( "Failed to read fixture {}: {}", name, err ))
	}

	/// A temporary examples directory holding every bundled example.
	pub fn examples_dir() -> tempfile::TempDir {
		let dir = tempfile::tempdir().expect( "Failed to create examples directory" );
		Example::ALL.iter().for_each(| example | {
			let source = match example {
				Example::Add => ADD,
				Example::StringReverse => STRING_REVERSE,
			};
			std::fs::write( dir.path().join( example.file_name() ), bytes( source ))
				.expect( "Failed to write example" );
		});
		dir
	}

	/// A runner whose examples directory is `dir`.
	pub fn runner_for( dir: &tempfile::TempDir ) -> ComponentRunner {
		ComponentRunner::new( RunnerConfig { examples_dir: dir.path().to_path_buf(), ..RunnerConfig::default() })
	}

	/// A runner with `name` loaded and transpiled.
	pub fn transpiled( name: &str ) -> ComponentRunner {
		let mut runner = ComponentRunner::new( RunnerConfig::default() );
		runner.load_bytes( bytes( name ), name.replace( ".wat", ".wasm" )).expect( "Failed to load fixture" );
		runner.transpile().expect( "Failed to transpile fixture" );
		runner
	}

}
