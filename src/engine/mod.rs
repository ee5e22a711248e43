// wweb Engine: WhatsApp Web session plugin
// One session per process: the driver feeds events through a single pump
// into the lifecycle (connection state) and the dispatcher (messages and
// groups); handlers decide per event whether the defaults run.
//
// Module layout:
//   config    : PluginConfig, load_config, validate_config
//   session   : Session state machine, SessionSnapshot
//   handler   : SessionHandler trait, invoke_handler_or_default
//   driver    : SessionDriver trait (browser/protocol boundary)
//   sidecar   : SidecarDriver (REST + webhook bridge)
//   lifecycle : ConnectionLifecycle
//   dispatcher: MessageDispatcher
//   commands  : default command table
//   phone     : PhoneNormalizer
//   gateway   : SendGateway
//   pump      : EventPump
//   watchdog  : startup watchdog
//   qr        : terminal QR rendering
//   runtime   : initialize, bootstrap, SessionHandle

pub mod config;
pub mod session;
pub mod handler;
pub mod driver;
pub mod sidecar;
pub mod lifecycle;
pub mod dispatcher;
pub mod commands;
pub mod phone;
pub mod gateway;
pub mod pump;
pub mod watchdog;
pub mod qr;
pub mod runtime;
