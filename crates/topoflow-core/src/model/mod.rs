//! リソースモデル
//!
//! トポロジーが宣言できる全リソースと、リソース間の参照に使う
//! 型付きハンドルおよびキー。

mod compute;
mod firewall;
mod handle;
mod network;
mod resource;
mod tags;

// 再エクスポート
pub use compute::*;
pub use firewall::*;
pub use handle::*;
pub use network::*;
pub use resource::*;
pub use tags::*;
