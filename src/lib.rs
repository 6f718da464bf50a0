//! Loads WebAssembly components, transpiles them into a directly loadable
//! module, and exposes their functions for ad-hoc invocation.
//!
//! A component goes through a fixed pipeline:
//!
//! 1. **Load**: raw bytes are read from a file, a dropped file, or a bundled
//! 	[`Example`], producing a [`RawComponent`].
//! 2. **Transpile**: a [`Transpiler`] turns the bytes into a [`GeneratedFileSet`]
//! 	made of a textual entry point (`component.js`) and binary resources.
//! 3. **Relink**: every binary resource is registered in the [`ResourceTable`]
//! 	under a fresh [`ResourceHandle`], and [`rewrite_references`] points the entry
//! 	point at those handles instead of relative file names.
//! 4. **Load module**: the [`ModuleLoader`] evaluates the rewritten entry point,
//! 	instantiating each referenced component with Wasmtime.
//! 5. **Discover**: [`walk_exports`] traverses the resulting namespace graph and
//! 	yields one [`ExportDescriptor`] per callable member.
//!
//! The [`ComponentRunner`] owns the whole pipeline, records progress in an
//! [`ActivityLog`], and invokes discovered exports with JSON arguments.
//!
//! # Re-exports
//!
//! `component_runner` re-exports a small set of types from `wasmtime` for
//! convenience (`Engine`, `Component`, `Val`). See the
//! [wasmtime docs](https://docs.rs/wasmtime/latest/wasmtime/) for details.
//!
//! # Example
//!
//! ```
//! use component_runner::{ ComponentRunner, RunnerConfig, Phase };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Components may be given in the component text format.
//! let adder = r#"(component
//! 	(core module $m (func (export "add") (param i32 i32) (result i32) local.get 0 local.get 1 i32.add))
//! 	(core instance $i (instantiate $m))
//! 	(func $add (param "a" s32) (param "b" s32) (result s32) (canon lift (core func $i "add")))
//! 	(instance $inst (export "add" (func $add)))
//! 	(export "example:add/add@0.1.0" (instance $inst))
//! )"#;
//!
//! let mut runner = ComponentRunner::new( RunnerConfig::default() );
//! runner.load_bytes( adder.as_bytes().to_vec(), "add.wasm" )?;
//! runner.transpile()?;
//! assert_eq!( runner.phase(), Phase::Runnable );
//!
//! // Exports are found by path or by their short display name.
//! let add = runner.find_export( "add" ).unwrap();
//! assert_eq!( add.path(), "example:add/add@0.1.0.add" );
//!
//! // Argument text is a JSON array, a single JSON value, or a bare string.
//! let result = runner.call( "add", "[5, 3]" );
//! assert_eq!( result.to_string(), "Result: 8" );
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Transpilers
//!
//! Anything implementing [`Transpiler`] can replace the built-in
//! [`WasmtimeTranspiler`]. The runner only requires that the produced file set
//! contains the entry point; binary resources are any files ending in `.wasm`.
//!
//! ```
//! use component_runner::{
//! 	ComponentRunner, RunnerConfig, Transpiler, Transpiled, TranspileError,
//! 	TranspileOptions, GeneratedFileSet, PipelineError,
//! };
//!
//! struct NothingUseful ;
//!
//! impl Transpiler for NothingUseful {
//! 	fn transpile( &self, _: &[u8], _: &TranspileOptions ) -> Result<Transpiled, TranspileError> {
//! 		Ok( Transpiled { files: GeneratedFileSet::new(), exports: Vec::new() })
//! 	}
//! }
//!
//! let mut runner = ComponentRunner::with_transpiler( RunnerConfig::default(), NothingUseful );
//! runner.load_bytes( b"(component)".to_vec(), "empty.wasm" ).unwrap();
//! assert!( matches!( runner.transpile(), Err( PipelineError::Transpile( TranspileError::MissingEntryPoint( _ )))));
//! // The raw component survives the failure, so another attempt is possible.
//! assert!( runner.controls().transpile );
//! ```

mod activity_log ;
mod component ;
mod config ;
mod invoke ;
mod loader ;
mod marshal ;
mod pipeline ;
mod resources ;
mod rewrite ;
mod runner ;
mod status ;
mod transpile ;
mod value ;
mod walker ;

#[doc( no_inline )]
pub use wasmtime::Engine ;
#[doc( no_inline )]
pub use wasmtime::component::{ Component, Val };

pub use activity_log::{ ActivityLog, LogEntry, LogLevel };
pub use component::{ RawComponent, Example, IngestError, COMPONENT_SUFFIX };
pub use config::{ RunnerConfig, ConfigError };
pub use invoke::{ InvocationError, InvocationResult, parse_arguments, invoke, invoke_with, format_arguments };
pub use loader::{ ModuleLoader, LoadedModule, LoadError };
pub use pipeline::{ PipelineState, Phase, Runnable, PipelineError, ENTRY_POINT_NAMES, find_entry_point };
pub use resources::{ ResourceHandle, ResourceTable, Resource };
pub use rewrite::rewrite_references ;
pub use runner::{ ComponentRunner, Controls };
pub use status::{ Status, StatusKind };
pub use transpile::{
	Transpiler, WasmtimeTranspiler, TranspileOptions, TranspileError, Transpiled,
	GeneratedFileSet, ExportKind, ENTRY_POINT, BINARY_RESOURCE_SUFFIX,
};
pub use value::{ Callable, Value, Namespace, Member, Accessor };
pub use walker::{ ExportDescriptor, walk_exports, display_name };
