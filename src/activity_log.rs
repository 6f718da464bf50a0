//! The runner's append-only activity log.

use chrono::{ DateTime, Local };



/// Category of a log entry.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum LogLevel {
	Info,
	Success,
	Warning,
	Error,
}

impl std::fmt::Display for LogLevel {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.write_str( match self {
			Self::Info => "info",
			Self::Success => "success",
			Self::Warning => "warning",
			Self::Error => "error",
		})
	}
}

/// One timestamped entry.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct LogEntry {
	timestamp: DateTime<Local>,
	level: LogLevel,
	message: String,
}

impl LogEntry {
	#[inline] pub fn timestamp( &self ) -> DateTime<Local> { self.timestamp }
	#[inline] pub fn level( &self ) -> LogLevel { self.level }
	#[inline] pub fn message( &self ) -> &str { &self.message }
}

impl std::fmt::Display for LogEntry {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		write!( f, "[{}] {}", self.timestamp.format( "%H:%M:%S" ), self.message )
	}
}

/// Append-only log, cleared only on request.
///
/// Every entry is mirrored to `tracing`.
#[derive( Debug, Clone, Default )]
pub struct ActivityLog {
	entries: Vec<LogEntry>,
}

impl ActivityLog {

	/// Message recorded after [`ActivityLog::clear`].
	pub const CLEARED: &'static str = "Output cleared" ;

	pub fn new() -> Self { Self::default() }

	pub fn push( &mut self, level: LogLevel, message: impl Into<String> ) {
		let message = message.into();
		match level {
			LogLevel::Info | LogLevel::Success => tracing::info!( level = %level, "{}", message ),
			LogLevel::Warning => tracing::warn!( "{}", message ),
			LogLevel::Error => tracing::error!( "{}", message ),
		}
		self.entries.push( LogEntry { timestamp: Local::now(), level, message });
	}

	#[inline] pub fn info( &mut self, message: impl Into<String> ) { self.push( LogLevel::Info, message )}
	#[inline] pub fn success( &mut self, message: impl Into<String> ) { self.push( LogLevel::Success, message )}
	#[inline] pub fn warning( &mut self, message: impl Into<String> ) { self.push( LogLevel::Warning, message )}
	#[inline] pub fn error( &mut self, message: impl Into<String> ) { self.push( LogLevel::Error, message )}

	/// Drops every entry, then records the clear itself.
	pub fn clear( &mut self ) {
		self.entries.clear();
		self.info( Self::CLEARED );
	}

	#[inline] pub fn entries( &self ) -> &[LogEntry] { &self.entries }
	#[inline] pub fn len( &self ) -> usize { self.entries.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.entries.is_empty() }

	/// Returns `true` if any entry's message contains `needle`.
	pub fn contains( &self, needle: &str ) -> bool {
		self.entries.iter().any(| entry | entry.message.contains( needle ))
	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn clearing_leaves_exactly_the_clear_entry() {
		let mut log = ActivityLog::new();
		log.info( "one" );
		log.error( "two" );
		log.clear();
		assert_eq!( log.len(), 1 );
		assert_eq!( log.entries()[0].message(), ActivityLog::CLEARED );
		assert_eq!( log.entries()[0].level(), LogLevel::Info );

		log.clear();
		assert_eq!( log.len(), 1 );
	}

	#[test]
	fn entries_render_with_a_timestamp() {
		let mut log = ActivityLog::new();
		log.success( "Result: 8" );
		let rendered = log.entries()[0].to_string();
		assert!( rendered.starts_with( '[' ));
		assert!( rendered.ends_with( "] Result: 8" ));
		assert!( log.contains( "Result" ));
	}

}
