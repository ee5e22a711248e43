// wweb Plugin: WhatsApp Web session lifecycle, event handlers, command
// dispatch and outbound sends.
//
// Layers:
//   atoms : constants, payload types, EngineError
//   engine: session runtime and its components

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{Content, Event, GroupNotification, Message, MessageAck, SendOptions};
pub use engine::config::{load_config, validate_config, PluginConfig};
pub use engine::driver::{DriverSession, SessionDriver};
pub use engine::gateway::{SendGateway, SendOutcome};
pub use engine::handler::{invoke_handler_or_default, PassthroughHandler, SessionHandler};
pub use engine::phone::{normalize, PhoneNormalizer};
pub use engine::runtime::{bootstrap, initialize, SessionHandle};
pub use engine::session::{SessionSnapshot, SessionState};
pub use engine::sidecar::SidecarDriver;
