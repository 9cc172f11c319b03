//! 駆動ポート（出力インターフェース）。
//!
//! ドメインが外部に求める機能を定義する。
//! インフラ層のアダプタが実装する。

mod backup_store;
mod clock;
mod command_runner;
mod config_repository;
mod operation_lock;
mod registry_store;
mod service_control;
mod system_probe;

pub use backup_store::*;
pub use clock::*;
pub use command_runner::*;
pub use config_repository::*;
pub use operation_lock::*;
pub use registry_store::*;
pub use service_control::*;
pub use system_probe::*;
