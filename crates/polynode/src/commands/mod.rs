mod environment;
mod install;
mod lifecycle;
mod maintenance;

pub use environment::{check, init, shell};
pub use install::run as install;
pub use lifecycle::{list, uninstall, use_version, version};
pub use maintenance::{backup, proxy};
