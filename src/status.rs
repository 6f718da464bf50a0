//! The runner's status line.

/// Visual category of a status.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum StatusKind {
	Ready,
	Loading,
	Error,
}

impl std::fmt::Display for StatusKind {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.write_str( match self {
			Self::Ready => "ready",
			Self::Loading => "loading",
			Self::Error => "error",
		})
	}
}

/// Every status the runner reports.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum Status {
	#[default] NoComponent,
	ComponentLoaded,
	LoadingComponent,
	Transpiling,
	TranspilationComplete,
	TranspilationFailed,
	LoadFailed,
}

impl Status {

	pub fn text( self ) -> &'static str { match self {
		Self::NoComponent => "No component loaded",
		Self::ComponentLoaded => "Component loaded",
		Self::LoadingComponent => "Loading component...",
		Self::Transpiling => "Transpiling...",
		Self::TranspilationComplete => "Transpilation complete",
		Self::TranspilationFailed => "Transpilation failed",
		Self::LoadFailed => "Error loading component",
	}}

	pub fn kind( self ) -> StatusKind { match self {
		Self::NoComponent | Self::ComponentLoaded | Self::TranspilationComplete => StatusKind::Ready,
		Self::LoadingComponent | Self::Transpiling => StatusKind::Loading,
		Self::TranspilationFailed | Self::LoadFailed => StatusKind::Error,
	}}

}

impl std::fmt::Display for Status {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result { f.write_str( self.text() )}
}
