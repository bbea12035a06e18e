//! An in-process log sink that streams structured records to a browser
//! dashboard served from inside the application.
//!
//! A [`Logger`] starts a small HTTP server on the loopback interface. The
//! dashboard at `/` subscribes to `/logs`, a server-sent event stream of
//! JSON records. While the viewer cannot be reached, records are kept in a
//! bounded [`BackupBuffer`] and forwarded once it recovers.
//!
//! ```no_run
//! use webview_logger::{LogOptions, Logger, LoggerConfig};
//!
//! let logger = Logger::new(LoggerConfig::default());
//! logger.initialize();
//! logger.info("service started", LogOptions::new().source("Main"));
//! println!("open {}", logger.viewer_url());
//! logger.shutdown();
//! ```
#[macro_use]
mod macros;

pub mod buffer;
pub mod channel;
pub mod collector;
pub mod config;
pub mod error;
pub mod fallback;
pub mod logger;
pub mod record;
pub mod server;

pub use buffer::BackupBuffer;
pub use channel::{ChannelFactory, ChannelState, LogChannel};
pub use collector::ViewerLayer;
pub use config::LoggerConfig;
pub use error::{ChannelError, ConfigError, DeliveryError};
pub use fallback::Fallback;
pub use logger::{LogOptions, Logger};
pub use record::{CallSite, LogLevel, LogRecord};
pub use server::ViewerServer;
